//! Mobs: living entities that may grow up and ride vehicles

use crate::ageable::{AgeRecord, Ageable};
use crate::error::Result;
use crate::living::{Living, LivingBody};
use mobtick_core::{
    EntityBase, EntityEvent, EntityId, FieldReader, RemovalReason, SyncedStore, ValueMap,
};
use mobtick_script::EntityTypeDef;
use tracing::debug;

mobtick_core::attribute_keys! {
    /// Synchronized attributes of mobs
    pub enum MobKey {
        Health => "Health",
        Baby => "Baby",
    }
}

/// Where a mob is riding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seat {
    pub vehicle: EntityId,
    /// Whether the vehicle has room for an adult passenger
    pub fits_adults: bool,
}

/// A living, possibly ageable, non-player entity
#[derive(Debug)]
pub struct Mob {
    pub base: EntityBase,
    store: SyncedStore<MobKey>,
    body: LivingBody,
    ageable: bool,
    age: AgeRecord,
    seat: Option<Seat>,
}

impl Mob {
    pub fn new(base: EntityBase, def: &EntityTypeDef) -> Result<Self> {
        let body = LivingBody::new(def.max_health, def.affected_by_potions);
        let mut store = SyncedStore::new();
        store.define(MobKey::Health, body.health())?;
        store.define(MobKey::Baby, false)?;
        Ok(Self {
            base,
            store,
            body,
            ageable: def.is_ageable(),
            age: AgeRecord::default(),
            seat: None,
        })
    }

    pub fn store(&self) -> &SyncedStore<MobKey> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SyncedStore<MobKey> {
        &mut self.store
    }

    pub fn is_ageable(&self) -> bool {
        self.ageable
    }

    pub fn seat(&self) -> Option<Seat> {
        self.seat
    }

    pub fn mount(&mut self, vehicle: EntityId, fits_adults: bool) {
        self.seat = Some(Seat {
            vehicle,
            fits_adults,
        });
    }

    pub fn dismount(&mut self) -> Option<Seat> {
        self.seat.take()
    }

    pub fn tick(&mut self) -> Result<()> {
        self.body.tick_effects();
        if self.ageable && !self.body.is_dead() {
            self.tick_age()?;
        }
        self.finish_tick()
    }

    /// Reduced update: ageing only
    pub fn inactive_tick(&mut self) -> Result<()> {
        if self.ageable && !self.body.is_dead() {
            self.tick_age()?;
        }
        Ok(())
    }

    /// Mirror health into the store and remove the mob once it has died
    pub fn finish_tick(&mut self) -> Result<()> {
        self.store.set(MobKey::Health, self.body.health())?;
        if self.body.is_dead() {
            self.base.discard(RemovalReason::Killed);
        }
        Ok(())
    }

    pub fn save(&self, out: &mut ValueMap) {
        self.base.save(out);
        self.body.save(out);
        if self.ageable {
            self.age.save(out);
        }
    }

    pub fn load(&mut self, input: &FieldReader<'_>) -> Result<()> {
        self.base.load(input);
        self.body.load(input);
        self.store.set(MobKey::Health, self.body.health())?;
        if self.ageable {
            let record = AgeRecord::load(input);
            self.age.forced_age = record.forced_age;
            self.age.locked = record.locked;
            self.set_age(record.age)?;
        }
        Ok(())
    }
}

impl Ageable for Mob {
    fn age_record(&self) -> &AgeRecord {
        &self.age
    }

    fn age_record_mut(&mut self) -> &mut AgeRecord {
        &mut self.age
    }

    fn write_baby_flag(&mut self, baby: bool) -> Result<()> {
        Ok(self.store.set(MobKey::Baby, baby)?)
    }

    fn age_boundary_reached(&mut self) {
        let baby = self.is_baby();
        debug!(entity = %self.base.id, baby, "age boundary");
        self.base.emit(EntityEvent::AgeBoundary {
            entity: self.base.id,
            baby,
        });
        if baby {
            return;
        }
        if let Some(seat) = self.seat.filter(|s| !s.fits_adults) {
            self.seat = None;
            self.base.emit(EntityEvent::Dismounted {
                entity: self.base.id,
                vehicle: seat.vehicle,
            });
        }
    }
}

impl Living for Mob {
    fn body(&self) -> &LivingBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut LivingBody {
        &mut self.body
    }
}
