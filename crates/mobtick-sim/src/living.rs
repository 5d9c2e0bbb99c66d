//! Health and active effects shared by mobs and players

use crate::effect::EffectInstance;
use indexmap::IndexMap;
use mobtick_core::{DefId, FieldReader, Value, ValueMap};
use mobtick_script::EffectKind;

/// Health pool and active effect instances of a living entity
#[derive(Debug, Clone)]
pub struct LivingBody {
    health: f32,
    max_health: f32,
    affected_by_potions: bool,
    effects: IndexMap<DefId, EffectInstance>,
}

impl LivingBody {
    pub fn new(max_health: f32, affected_by_potions: bool) -> Self {
        let max_health = max_health.max(1.0);
        Self {
            health: max_health,
            max_health,
            affected_by_potions,
            effects: IndexMap::new(),
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Clamped to `[0, max_health]`
    pub fn set_health(&mut self, health: f32) {
        self.health = health.clamp(0.0, self.max_health);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn affected_by_potions(&self) -> bool {
        self.affected_by_potions
    }

    pub fn heal(&mut self, amount: f32) {
        if !self.is_dead() && amount > 0.0 {
            self.set_health(self.health + amount);
        }
    }

    /// Apply damage; returns true when this blow killed
    pub fn hurt(&mut self, amount: f32) -> bool {
        if self.is_dead() || amount <= 0.0 {
            return false;
        }
        self.set_health(self.health - amount);
        self.is_dead()
    }

    /// Add or fold in a durable effect; returns whether it took hold
    pub fn add_effect(&mut self, instance: EffectInstance) -> bool {
        if !self.affected_by_potions {
            return false;
        }
        match self.effects.get_mut(&instance.effect) {
            Some(existing) => existing.update(&instance),
            None => {
                self.effects.insert(instance.effect.clone(), instance);
                true
            }
        }
    }

    pub fn effect(&self, id: &DefId) -> Option<&EffectInstance> {
        self.effects.get(id)
    }

    pub fn has_effect(&self, id: &DefId) -> bool {
        self.effects.contains_key(id)
    }

    pub fn effects(&self) -> impl Iterator<Item = &EffectInstance> {
        self.effects.values()
    }

    /// Apply an instantaneous effect scaled by `proximity` in `[0, 1]`
    pub fn apply_instant(&mut self, kind: EffectKind, amplifier: i32, proximity: f64) {
        let strength = 2f64.powi(amplifier.clamp(0, 24));
        match kind {
            EffectKind::InstantHeal => {
                self.heal((proximity * 4.0 * strength + 0.5) as i32 as f32);
            }
            EffectKind::InstantHarm => {
                self.hurt((proximity * 6.0 * strength + 0.5) as i32 as f32);
            }
            EffectKind::Durable => {}
        }
    }

    /// Count every effect down one tick, dropping expired ones
    pub fn tick_effects(&mut self) {
        self.effects.retain(|_, instance| instance.tick());
    }

    pub fn save(&self, out: &mut ValueMap) {
        out.insert("Health".into(), self.health.into());
        if !self.effects.is_empty() {
            let list = self.effects.values().map(EffectInstance::save).collect();
            out.insert("active_effects".into(), Value::List(list));
        }
    }

    pub fn load(&mut self, input: &FieldReader<'_>) {
        if input.contains("Health") {
            self.set_health(input.float32("Health", self.max_health));
        }
        self.effects.clear();
        for entry in input.list("active_effects").unwrap_or_default() {
            match entry.as_map().and_then(|m| EffectInstance::load(&FieldReader::new(m, "effect"))) {
                Some(instance) => {
                    self.effects.insert(instance.effect.clone(), instance);
                }
                None => input.corrupt("active_effects", "malformed effect entry"),
            }
        }
    }
}

/// Something with a health pool that area effects can reach
pub trait Living {
    fn body(&self) -> &LivingBody;

    fn body_mut(&mut self) -> &mut LivingBody;

    fn is_affected_by_potions(&self) -> bool {
        let body = self.body();
        body.affected_by_potions() && !body.is_dead()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hurt_and_heal() {
        let mut body = LivingBody::new(10.0, true);
        assert!(!body.hurt(4.0));
        assert_eq!(body.health(), 6.0);
        body.heal(100.0);
        assert_eq!(body.health(), 10.0);
        assert!(body.hurt(12.0));
        assert!(body.is_dead());
        body.heal(5.0);
        assert!(body.is_dead());
        assert!(!body.hurt(1.0));
    }

    #[test]
    fn test_instant_effects_at_half_proximity() {
        let mut body = LivingBody::new(20.0, true);
        body.apply_instant(EffectKind::InstantHarm, 0, 0.5);
        assert_eq!(body.health(), 17.0);
        body.apply_instant(EffectKind::InstantHarm, 1, 0.5);
        assert_eq!(body.health(), 11.0);
        body.apply_instant(EffectKind::InstantHeal, 0, 0.5);
        assert_eq!(body.health(), 13.0);
    }

    #[test]
    fn test_effects_merge_and_expire() {
        let mut body = LivingBody::new(20.0, true);
        assert!(body.add_effect(EffectInstance::new("speed", 2, 0)));
        assert!(!body.add_effect(EffectInstance::new("speed", 1, 0)));
        body.tick_effects();
        assert!(body.has_effect(&DefId::new("speed")));
        body.tick_effects();
        assert!(!body.has_effect(&DefId::new("speed")));
    }

    #[test]
    fn test_immune_body_rejects_effects() {
        let mut body = LivingBody::new(20.0, false);
        assert!(!body.add_effect(EffectInstance::new("poison", 100, 0)));
        assert_eq!(body.effects().count(), 0);
    }

    #[test]
    fn test_save_load() {
        let mut body = LivingBody::new(20.0, true);
        body.hurt(5.0);
        body.add_effect(EffectInstance::new("slowness", 60, 1));
        let mut map = ValueMap::new();
        body.save(&mut map);

        let mut restored = LivingBody::new(20.0, true);
        restored.load(&FieldReader::new(&map, "test"));
        assert_eq!(restored.health(), 15.0);
        assert_eq!(
            restored.effect(&DefId::new("slowness")),
            Some(&EffectInstance::new("slowness", 60, 1))
        );
    }
}
