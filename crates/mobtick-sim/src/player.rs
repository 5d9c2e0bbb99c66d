//! Players: the collectors experience orbs drift toward

use crate::error::Result;
use crate::living::{Living, LivingBody};
use mobtick_core::{EntityBase, FieldReader, RandomSource, SyncedStore, Value, ValueMap};
use mobtick_script::EntityTypeDef;
use serde::{Deserialize, Serialize};

mobtick_core::attribute_keys! {
    /// Synchronized attributes of players
    pub enum PlayerKey {
        Health => "Health",
        Experience => "Experience",
    }
}

/// Ticks a collector waits between two orb pickups
pub const PICKUP_DELAY: i32 = 2;

/// An equipped item that experience can repair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MendableItem {
    pub slot: usize,
    pub damage: i32,
    pub max_damage: i32,
}

impl MendableItem {
    pub fn new(slot: usize, damage: i32, max_damage: i32) -> Self {
        Self {
            slot,
            damage: damage.clamp(0, max_damage.max(0)),
            max_damage: max_damage.max(0),
        }
    }

    pub fn is_damaged(&self) -> bool {
        self.damage > 0
    }
}

/// Experience total, pickup cooldown and mendable equipment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collector {
    pub experience: i32,
    pub pickup_delay: i32,
    items: Vec<MendableItem>,
}

impl Collector {
    pub fn equip(&mut self, item: MendableItem) {
        self.items.retain(|existing| existing.slot != item.slot);
        self.items.push(item);
    }

    pub fn item(&self, slot: usize) -> Option<&MendableItem> {
        self.items.iter().find(|item| item.slot == slot)
    }

    /// A random damaged item, if any
    pub fn random_damaged_slot(&self, rng: &mut dyn RandomSource) -> Option<usize> {
        let damaged: Vec<usize> = self
            .items
            .iter()
            .filter(|item| item.is_damaged())
            .map(|item| item.slot)
            .collect();
        if damaged.is_empty() {
            return None;
        }
        Some(damaged[rng.next_int(damaged.len() as i32) as usize])
    }

    /// Remove up to `amount` damage from `slot`; returns the repair done
    pub fn repair(&mut self, slot: usize, amount: i32) -> i32 {
        let Some(item) = self.items.iter_mut().find(|item| item.slot == slot) else {
            return 0;
        };
        let repaired = amount.clamp(0, item.damage);
        item.damage -= repaired;
        repaired
    }

    pub fn give_experience(&mut self, amount: i32) {
        self.experience = self.experience.saturating_add(amount).max(0);
    }

    pub fn tick(&mut self) {
        if self.pickup_delay > 0 {
            self.pickup_delay -= 1;
        }
    }
}

/// A player entity
#[derive(Debug)]
pub struct Player {
    pub base: EntityBase,
    store: SyncedStore<PlayerKey>,
    body: LivingBody,
    pub collector: Collector,
    /// Spectators are ignored by orbs
    pub spectator: bool,
}

impl Player {
    pub fn new(base: EntityBase, def: &EntityTypeDef) -> Result<Self> {
        let body = LivingBody::new(def.max_health, def.affected_by_potions);
        let mut store = SyncedStore::new();
        store.define(PlayerKey::Health, body.health())?;
        store.define(PlayerKey::Experience, 0i32)?;
        Ok(Self {
            base,
            store,
            body,
            collector: Collector::default(),
            spectator: false,
        })
    }

    pub fn store(&self) -> &SyncedStore<PlayerKey> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SyncedStore<PlayerKey> {
        &mut self.store
    }

    /// Valid target for orbs and area clouds
    pub fn is_present(&self) -> bool {
        !self.spectator && !self.body.is_dead() && !self.base.is_removed()
    }

    pub fn tick(&mut self) -> Result<()> {
        self.body.tick_effects();
        self.collector.tick();
        self.sync()
    }

    /// Mirror health and experience into the store
    pub fn sync(&mut self) -> Result<()> {
        self.store.set(PlayerKey::Health, self.body.health())?;
        self.store.set(PlayerKey::Experience, self.collector.experience)?;
        Ok(())
    }

    pub fn save(&self, out: &mut ValueMap) {
        self.base.save(out);
        self.body.save(out);
        out.insert("XpTotal".into(), self.collector.experience.into());
        let items = self
            .collector
            .items
            .iter()
            .map(|item| {
                let mut map = ValueMap::new();
                map.insert("Slot".into(), (item.slot as i64).into());
                map.insert("Damage".into(), item.damage.into());
                map.insert("MaxDamage".into(), item.max_damage.into());
                Value::Map(map)
            })
            .collect();
        out.insert("Mending".into(), Value::List(items));
        if self.spectator {
            out.insert("Spectator".into(), true.into());
        }
    }

    pub fn load(&mut self, input: &FieldReader<'_>) -> Result<()> {
        self.base.load(input);
        self.body.load(input);
        self.collector.experience = input.int32("XpTotal", 0).max(0);
        for entry in input.list("Mending").unwrap_or_default() {
            let Some(map) = entry.as_map() else {
                input.corrupt("Mending", "expected item map");
                continue;
            };
            let item = FieldReader::new(map, "mending item");
            let slot = item.int("Slot", -1);
            if slot < 0 {
                input.corrupt("Mending", "item without slot");
                continue;
            }
            self.collector.equip(MendableItem::new(
                slot as usize,
                item.int32("Damage", 0),
                item.int32("MaxDamage", 0),
            ));
        }
        self.spectator = input.bool("Spectator", false);
        self.sync()
    }
}

impl Living for Player {
    fn body(&self) -> &LivingBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut LivingBody {
        &mut self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobtick_core::{DefId, EntityId, GameRng};
    use mobtick_script::TypeTable;
    use uuid::Uuid;

    fn player() -> Player {
        let types = TypeTable::builtin().unwrap();
        let def = types.entity_type(&DefId::new("player")).unwrap();
        let base = EntityBase::new(
            EntityId(1),
            Uuid::new_v4(),
            "player",
            def.width,
            def.height,
            Box::new(GameRng::new(1)),
        );
        Player::new(base, def).unwrap()
    }

    #[test]
    fn test_pickup_delay_counts_down() {
        let mut p = player();
        p.collector.pickup_delay = PICKUP_DELAY;
        p.tick().unwrap();
        p.tick().unwrap();
        p.tick().unwrap();
        assert_eq!(p.collector.pickup_delay, 0);
    }

    #[test]
    fn test_repair_clamps_to_damage() {
        let mut c = Collector::default();
        c.equip(MendableItem::new(0, 10, 100));
        assert_eq!(c.repair(0, 25), 10);
        assert!(!c.item(0).unwrap().is_damaged());
        assert_eq!(c.repair(3, 5), 0);
    }

    #[test]
    fn test_random_damaged_slot_skips_intact() {
        let mut c = Collector::default();
        c.equip(MendableItem::new(0, 0, 100));
        c.equip(MendableItem::new(2, 4, 100));
        let mut rng = GameRng::new(3);
        for _ in 0..10 {
            assert_eq!(c.random_damaged_slot(&mut rng), Some(2));
        }
        c.repair(2, 4);
        assert_eq!(c.random_damaged_slot(&mut rng), None);
    }

    #[test]
    fn test_experience_is_synced() {
        let mut p = player();
        p.collector.give_experience(12);
        p.tick().unwrap();
        assert_eq!(p.store().get_int(PlayerKey::Experience).unwrap(), 12);
    }

    #[test]
    fn test_spectator_is_not_present() {
        let mut p = player();
        assert!(p.is_present());
        p.spectator = true;
        assert!(!p.is_present());
    }

    #[test]
    fn test_save_load() {
        let mut p = player();
        p.collector.give_experience(30);
        p.collector.equip(MendableItem::new(1, 7, 250));
        let mut map = ValueMap::new();
        p.save(&mut map);

        let mut restored = player();
        restored.load(&FieldReader::new(&map, "player")).unwrap();
        assert_eq!(restored.collector.experience, 30);
        assert_eq!(restored.collector.item(1), Some(&MendableItem::new(1, 7, 250)));
    }
}
