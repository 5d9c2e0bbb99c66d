//! The closed set of simulated entity variants

use crate::cloud::AreaEffectCloud;
use crate::context::TickContext;
use crate::effect::EffectInstance;
use crate::error::{Error, Result};
use crate::living::Living;
use crate::mob::Mob;
use crate::orb::ExperienceOrb;
use crate::player::Player;
use mobtick_core::{DataValue, EntityBase, EntityId, FieldReader, ValueMap};
use mobtick_render::{DisplayEntity, DisplayKind};
use mobtick_script::{EffectKind, EntityCategory, EntityTypeDef, TypeTable};

/// Any entity a region can hold
#[derive(Debug)]
pub enum Entity {
    Mob(Mob),
    Player(Player),
    Cloud(AreaEffectCloud),
    Orb(ExperienceOrb),
    Display(DisplayEntity),
}

impl Entity {
    /// Build the variant `def` calls for around a fresh base
    pub fn create(def: &EntityTypeDef, base: EntityBase) -> Result<Self> {
        Ok(match def.category {
            EntityCategory::Mob => Entity::Mob(Mob::new(base, def)?),
            EntityCategory::Player => Entity::Player(Player::new(base, def)?),
            EntityCategory::AreaEffectCloud => Entity::Cloud(AreaEffectCloud::new(base)?),
            EntityCategory::ExperienceOrb => Entity::Orb(ExperienceOrb::new(base)?),
            EntityCategory::BlockDisplay => {
                Entity::Display(DisplayEntity::new(base, DisplayKind::Block)?)
            }
            EntityCategory::ItemDisplay => {
                Entity::Display(DisplayEntity::new(base, DisplayKind::Item)?)
            }
            EntityCategory::TextDisplay => {
                Entity::Display(DisplayEntity::new(base, DisplayKind::Text)?)
            }
        })
    }

    pub fn base(&self) -> &EntityBase {
        match self {
            Entity::Mob(e) => &e.base,
            Entity::Player(e) => &e.base,
            Entity::Cloud(e) => &e.base,
            Entity::Orb(e) => &e.base,
            Entity::Display(e) => &e.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut EntityBase {
        match self {
            Entity::Mob(e) => &mut e.base,
            Entity::Player(e) => &mut e.base,
            Entity::Cloud(e) => &mut e.base,
            Entity::Orb(e) => &mut e.base,
            Entity::Display(e) => &mut e.base,
        }
    }

    pub fn id(&self) -> EntityId {
        self.base().id
    }

    /// Variant name used in errors and logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Entity::Mob(_) => "mob",
            Entity::Player(_) => "player",
            Entity::Cloud(_) => "area effect cloud",
            Entity::Orb(_) => "experience orb",
            Entity::Display(_) => "display",
        }
    }

    pub fn as_living(&self) -> Option<&dyn Living> {
        match self {
            Entity::Mob(e) => Some(e as &dyn Living),
            Entity::Player(e) => Some(e as &dyn Living),
            _ => None,
        }
    }

    pub fn as_living_mut(&mut self) -> Option<&mut dyn Living> {
        match self {
            Entity::Mob(e) => Some(e as &mut dyn Living),
            Entity::Player(e) => Some(e as &mut dyn Living),
            _ => None,
        }
    }

    pub fn as_mob(&self) -> Option<&Mob> {
        match self {
            Entity::Mob(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_mob_mut(&mut self) -> Option<&mut Mob> {
        match self {
            Entity::Mob(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match self {
            Entity::Player(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Entity::Player(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_cloud(&self) -> Option<&AreaEffectCloud> {
        match self {
            Entity::Cloud(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_cloud_mut(&mut self) -> Option<&mut AreaEffectCloud> {
        match self {
            Entity::Cloud(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_orb(&self) -> Option<&ExperienceOrb> {
        match self {
            Entity::Orb(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_orb_mut(&mut self) -> Option<&mut ExperienceOrb> {
        match self {
            Entity::Orb(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_display(&self) -> Option<&DisplayEntity> {
        match self {
            Entity::Display(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_display_mut(&mut self) -> Option<&mut DisplayEntity> {
        match self {
            Entity::Display(e) => Some(e),
            _ => None,
        }
    }

    /// Live, living and not immune; spectators are skipped
    pub fn is_affected_by_potions(&self) -> bool {
        if self.base().is_removed() {
            return false;
        }
        match self {
            Entity::Player(p) => p.is_present() && p.is_affected_by_potions(),
            Entity::Mob(m) => m.is_affected_by_potions(),
            _ => false,
        }
    }

    /// Apply one effect delivered by an area source
    pub fn receive_effect(
        &mut self,
        kind: EffectKind,
        instance: &EffectInstance,
        proximity: f64,
    ) -> Result<()> {
        let Some(living) = self.as_living_mut() else {
            return Ok(());
        };
        let body = living.body_mut();
        match kind {
            EffectKind::Durable => {
                body.add_effect(instance.clone());
            }
            instant => body.apply_instant(instant, instance.amplifier, proximity),
        }
        match self {
            Entity::Mob(m) => m.finish_tick(),
            Entity::Player(p) => p.sync(),
            _ => Ok(()),
        }
    }

    /// Close attribute registration; repeated calls are no-ops
    pub fn lock_attributes(&mut self) {
        match self {
            Entity::Mob(e) => e.store_mut().lock(),
            Entity::Player(e) => e.store_mut().lock(),
            Entity::Cloud(e) => e.store_mut().lock(),
            Entity::Orb(e) => e.store_mut().lock(),
            Entity::Display(e) => e.store_mut().lock(),
        }
    }

    pub fn tick(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        match self {
            Entity::Mob(e) => e.tick(),
            Entity::Player(e) => e.tick(),
            Entity::Cloud(e) => e.tick(ctx),
            Entity::Orb(e) => e.tick(ctx),
            Entity::Display(e) => Ok(e.tick()?),
        }
    }

    /// Reduced update for entities outside the activation range
    pub fn inactive_tick(&mut self) -> Result<()> {
        match self {
            Entity::Mob(e) => e.inactive_tick(),
            Entity::Player(e) => e.tick(),
            Entity::Cloud(e) => {
                e.inactive_tick();
                Ok(())
            }
            Entity::Orb(e) => {
                e.inactive_tick();
                Ok(())
            }
            Entity::Display(e) => Ok(e.tick()?),
        }
    }

    /// Replication delta of the entity's synchronized attributes
    pub fn pack_dirty(&mut self) -> Option<Vec<DataValue>> {
        match self {
            Entity::Mob(e) => e.store_mut().pack_dirty(),
            Entity::Player(e) => e.store_mut().pack_dirty(),
            Entity::Cloud(e) => e.store_mut().pack_dirty(),
            Entity::Orb(e) => e.store_mut().pack_dirty(),
            Entity::Display(e) => e.store_mut().pack_dirty(),
        }
    }

    pub fn save(&self, out: &mut ValueMap) -> Result<()> {
        match self {
            Entity::Mob(e) => e.save(out),
            Entity::Player(e) => e.save(out),
            Entity::Cloud(e) => e.save(out),
            Entity::Orb(e) => e.save(out),
            Entity::Display(e) => e.save(out)?,
        }
        Ok(())
    }

    pub fn load(&mut self, input: &FieldReader<'_>, types: &TypeTable) -> Result<()> {
        match self {
            Entity::Mob(e) => e.load(input),
            Entity::Player(e) => e.load(input),
            Entity::Cloud(e) => e.load(input, types),
            Entity::Orb(e) => e.load(input),
            Entity::Display(e) => Ok(e.load(input)?),
        }
    }

    /// `Err(WrongEntityKind)` unless `check` accepts this variant
    pub(crate) fn require<'a, T: ?Sized>(
        &'a mut self,
        expected: &'static str,
        check: impl FnOnce(&'a mut Entity) -> Option<&'a mut T>,
    ) -> Result<&'a mut T> {
        let id = self.id();
        check(self).ok_or(Error::WrongEntityKind { id, expected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{default_rng_factory, Spawner};
    use mobtick_core::{DVec3, DefId, RemovalReason};

    fn create(kind: &str) -> Entity {
        let types = TypeTable::builtin().unwrap();
        Spawner::new(1, default_rng_factory())
            .create(&types, &DefId::new(kind), DVec3::ZERO)
            .unwrap()
    }

    #[test]
    fn test_categories_map_to_variants() {
        assert!(matches!(create("sheep"), Entity::Mob(_)));
        assert!(matches!(create("player"), Entity::Player(_)));
        assert!(matches!(create("area_effect_cloud"), Entity::Cloud(_)));
        assert!(matches!(create("experience_orb"), Entity::Orb(_)));
        assert!(matches!(create("text_display"), Entity::Display(_)));
    }

    #[test]
    fn test_only_living_are_affected() {
        assert!(create("cow").is_affected_by_potions());
        assert!(create("player").is_affected_by_potions());
        assert!(!create("area_effect_cloud").is_affected_by_potions());
        assert!(!create("experience_orb").is_affected_by_potions());

        let mut spectator = create("player");
        spectator.as_player_mut().unwrap().spectator = true;
        assert!(!spectator.is_affected_by_potions());
    }

    #[test]
    fn test_instant_harm_can_kill() {
        let mut chicken = create("chicken");
        let harm = EffectInstance::new("instant_damage", 1, 2);
        chicken
            .receive_effect(EffectKind::InstantHarm, &harm, 0.5)
            .unwrap();
        assert_eq!(chicken.base().removal_reason(), Some(RemovalReason::Killed));
    }

    #[test]
    fn test_durable_effect_is_added() {
        let mut cow = create("cow");
        let speed = EffectInstance::new("speed", 100, 0);
        cow.receive_effect(EffectKind::Durable, &speed, 0.5).unwrap();
        let living = cow.as_living().unwrap();
        assert!(living.body().has_effect(&DefId::new("speed")));
    }

    #[test]
    fn test_lock_is_idempotent() {
        let mut sheep = create("sheep");
        sheep.lock_attributes();
        sheep.lock_attributes();
        assert!(sheep.as_mob().unwrap().store().is_locked());
    }

    #[test]
    fn test_require_reports_kind() {
        let mut orb = create("experience_orb");
        assert!(orb.require("mob", Entity::as_mob_mut).is_err());
        assert!(orb.require("experience orb", Entity::as_orb_mut).is_ok());
    }
}
