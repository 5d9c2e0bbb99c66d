//! Status effect instances and potion colour mixing

use crate::error::{Error, Result};
use mobtick_core::{DefId, FieldReader, Value, ValueMap};
use mobtick_script::{EffectKind, PotionEffect, TypeTable};
use serde::{Deserialize, Serialize};

/// Colour of a potion that carries no visible effect
pub const DEFAULT_POTION_COLOR: i32 = 3_694_022;

/// An effect applied to, or carried by, something for a number of ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectInstance {
    pub effect: DefId,
    pub duration: i32,
    pub amplifier: i32,
    pub ambient: bool,
    pub visible: bool,
}

impl EffectInstance {
    pub fn new(effect: impl Into<DefId>, duration: i32, amplifier: i32) -> Self {
        Self {
            effect: effect.into(),
            duration,
            amplifier,
            ambient: false,
            visible: true,
        }
    }

    pub fn from_potion(entry: &PotionEffect) -> Self {
        Self::new(entry.effect.clone(), entry.duration, entry.amplifier)
    }

    /// Copy with the duration passed through `f`
    pub fn map_duration(&self, f: impl Fn(i32) -> i32) -> Self {
        Self {
            duration: f(self.duration),
            ..self.clone()
        }
    }

    /// Fold a newly applied instance of the same effect into this one
    ///
    /// A stronger amplifier replaces both amplifier and duration; an equal
    /// amplifier only extends the duration. Returns whether anything changed.
    pub fn update(&mut self, other: &EffectInstance) -> bool {
        if other.amplifier > self.amplifier {
            self.amplifier = other.amplifier;
            self.duration = other.duration;
            self.ambient = other.ambient;
            self.visible = other.visible;
            true
        } else if other.amplifier == self.amplifier && self.duration < other.duration {
            self.duration = other.duration;
            true
        } else {
            false
        }
    }

    /// Count down one tick; false once the effect has run out
    pub fn tick(&mut self) -> bool {
        if self.duration > 0 {
            self.duration -= 1;
        }
        self.duration > 0
    }

    pub fn save(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("id".into(), self.effect.as_str().into());
        map.insert("duration".into(), self.duration.into());
        map.insert("amplifier".into(), self.amplifier.into());
        map.insert("ambient".into(), self.ambient.into());
        map.insert("show_particles".into(), self.visible.into());
        Value::Map(map)
    }

    /// `None` when the descriptor has no effect id
    pub fn load(input: &FieldReader<'_>) -> Option<Self> {
        let effect = input.string("id")?;
        Some(Self {
            effect: DefId::new(effect),
            duration: input.int32("duration", 0),
            amplifier: input.int32("amplifier", 0).clamp(0, 255),
            ambient: input.bool("ambient", false),
            visible: input.bool("show_particles", true),
        })
    }
}

/// The effects a potion grants, as fresh instances
pub fn potion_effects(types: &TypeTable, potion: &DefId) -> Result<Vec<EffectInstance>> {
    let def = types.potion(potion).ok_or_else(|| Error::UnknownDefinition {
        kind: "potion",
        id: potion.clone(),
    })?;
    Ok(def.effects.iter().map(EffectInstance::from_potion).collect())
}

/// Kind of a known effect
pub fn effect_kind(types: &TypeTable, effect: &DefId) -> Result<EffectKind> {
    types
        .effect(effect)
        .map(|def| def.kind)
        .ok_or_else(|| Error::UnknownDefinition {
            kind: "effect",
            id: effect.clone(),
        })
}

/// Blend the colours of visible effects, weighted by amplifier + 1
///
/// Effects missing from the type table are ignored. Returns
/// [`DEFAULT_POTION_COLOR`] when no effect is visible.
pub fn mix_colors<'a>(
    types: &TypeTable,
    effects: impl IntoIterator<Item = &'a EffectInstance>,
) -> i32 {
    let mut any = false;
    let (mut r, mut g, mut b) = (0.0f32, 0.0f32, 0.0f32);
    let mut weight = 0i32;
    for instance in effects {
        if !instance.visible {
            continue;
        }
        let Some(def) = types.effect(&instance.effect) else {
            continue;
        };
        any = true;
        let w = instance.amplifier + 1;
        r += (w * ((def.color >> 16) & 0xFF)) as f32 / 255.0;
        g += (w * ((def.color >> 8) & 0xFF)) as f32 / 255.0;
        b += (w * (def.color & 0xFF)) as f32 / 255.0;
        weight += w;
    }
    if !any {
        return DEFAULT_POTION_COLOR;
    }
    if weight == 0 {
        return 0;
    }
    let scale = |c: f32| (c / weight as f32 * 255.0) as i32;
    scale(r) << 16 | scale(g) << 8 | scale(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> TypeTable {
        TypeTable::builtin().unwrap()
    }

    #[test]
    fn test_update_rules() {
        let mut current = EffectInstance::new("speed", 100, 0);
        assert!(!current.update(&EffectInstance::new("speed", 50, 0)));
        assert!(current.update(&EffectInstance::new("speed", 200, 0)));
        assert_eq!(current.duration, 200);
        assert!(current.update(&EffectInstance::new("speed", 20, 1)));
        assert_eq!((current.amplifier, current.duration), (1, 20));
        assert!(!current.update(&EffectInstance::new("speed", 400, 0)));
    }

    #[test]
    fn test_tick_runs_out() {
        let mut e = EffectInstance::new("poison", 2, 0);
        assert!(e.tick());
        assert!(!e.tick());
        assert_eq!(e.duration, 0);
    }

    #[test]
    fn test_single_effect_color() {
        let types = types();
        let color = mix_colors(&types, &[EffectInstance::new("speed", 1, 0)]);
        for shift in [16, 8, 0] {
            let got = (color >> shift) & 0xFF;
            let want = (3_402_751 >> shift) & 0xFF;
            assert!((got - want).abs() <= 1, "channel {shift}: {got} vs {want}");
        }
    }

    #[test]
    fn test_no_visible_effects_uses_default() {
        let types = types();
        assert_eq!(mix_colors(&types, &[]), DEFAULT_POTION_COLOR);
        let mut hidden = EffectInstance::new("speed", 1, 0);
        hidden.visible = false;
        assert_eq!(mix_colors(&types, &[hidden]), DEFAULT_POTION_COLOR);
    }

    #[test]
    fn test_mixing_weights_amplifier() {
        let types = types();
        let a = EffectInstance::new("speed", 1, 0);
        let b = EffectInstance::new("poison", 1, 2);
        let mixed = mix_colors(&types, &[a, b]);
        let channel = |c: i32, shift: i32| (c >> shift) & 0xFF;
        // poison has three times the weight of speed
        let expected_r = ((channel(3_402_751, 16) + 3 * channel(8_889_187, 16)) as f32 / 4.0) as i32;
        assert!((channel(mixed, 16) - expected_r).abs() <= 1);
    }

    #[test]
    fn test_potion_effects_lookup() {
        let types = types();
        let effects = potion_effects(&types, &DefId::new("poison")).unwrap();
        assert_eq!(effects, vec![EffectInstance::new("poison", 900, 0)]);
        assert!(potion_effects(&types, &DefId::new("elixir")).is_err());
        assert_eq!(
            effect_kind(&types, &DefId::new("instant_health")).unwrap(),
            EffectKind::InstantHeal
        );
    }

    #[test]
    fn test_save_load() {
        let mut e = EffectInstance::new("regeneration", 120, 1);
        e.ambient = true;
        let saved = e.save();
        let map = saved.as_map().unwrap();
        let loaded = EffectInstance::load(&FieldReader::new(map, "test")).unwrap();
        assert_eq!(loaded, e);
    }

    #[test]
    fn test_load_without_id() {
        let map = ValueMap::new();
        assert!(EffectInstance::load(&FieldReader::new(&map, "test")).is_none());
    }
}
