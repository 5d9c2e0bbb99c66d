//! Juvenile/adult lifecycle
//!
//! Age is a signed tick counter: negative while juvenile, counting up toward
//! zero; zero or positive once adult, counting down (breeding cooldown). The
//! sign maps one to one onto the synchronized `Baby` flag, and every change of
//! sign runs the boundary hook exactly once.

use crate::error::Result;
use mobtick_core::{FieldReader, RandomSource, ValueMap, TICKS_PER_SECOND};
use serde::{Deserialize, Serialize};

/// Age a freshly made juvenile starts at
pub const BABY_START_AGE: i32 = -24_000;

/// Ticks the accelerated-growth feedback lasts after overgrowth
pub const FORCED_AGE_TIMER_TICKS: i32 = 40;

/// Chance that a later member of a spawn group is forced juvenile
pub const DEFAULT_BABY_CHANCE: f32 = 0.05;

/// Lifecycle stage derived from the age sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeStage {
    Juvenile,
    Adult,
}

impl AgeStage {
    pub fn of(age: i32) -> Self {
        if age < 0 {
            AgeStage::Juvenile
        } else {
            AgeStage::Adult
        }
    }
}

/// Persisted age state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgeRecord {
    pub age: i32,
    /// Accumulated overgrowth, applied when age reaches zero
    pub forced_age: i32,
    pub forced_age_timer: i32,
    /// Frozen: the age no longer steps or grows
    pub locked: bool,
}

impl AgeRecord {
    pub fn is_juvenile(&self) -> bool {
        self.age < 0
    }

    pub fn save(&self, out: &mut ValueMap) {
        out.insert("Age".into(), self.age.into());
        out.insert("ForcedAge".into(), self.forced_age.into());
        out.insert("AgeLocked".into(), self.locked.into());
    }

    /// Fields come back verbatim; the caller re-applies `age` through `set_age`
    pub fn load(input: &FieldReader<'_>) -> Self {
        Self {
            age: input.int32("Age", 0),
            forced_age: input.int32("ForcedAge", 0),
            forced_age_timer: 0,
            locked: input.bool("AgeLocked", false),
        }
    }
}

/// Ticks of juvenile age skipped when a juvenile is fed
pub fn speed_up_seconds_when_feeding(ticks_until_adult: i32) -> i32 {
    ((ticks_until_adult / TICKS_PER_SECOND) as f32 * 0.1) as i32
}

/// Capability of entities that grow up
///
/// Implementors provide storage and the two reactions; the state machine is
/// written once here.
pub trait Ageable {
    fn age_record(&self) -> &AgeRecord;

    fn age_record_mut(&mut self) -> &mut AgeRecord;

    /// Mirror the juvenile flag into the synchronized store
    fn write_baby_flag(&mut self, baby: bool) -> Result<()>;

    /// Runs once per sign change, after the flag is written
    fn age_boundary_reached(&mut self);

    fn age(&self) -> i32 {
        self.age_record().age
    }

    fn is_baby(&self) -> bool {
        self.age_record().is_juvenile()
    }

    fn stage(&self) -> AgeStage {
        AgeStage::of(self.age())
    }

    fn set_age(&mut self, age: i32) -> Result<()> {
        let old = self.age_record().age;
        self.age_record_mut().age = age;
        if (old < 0) != (age < 0) {
            self.write_baby_flag(age < 0)?;
            self.age_boundary_reached();
        }
        Ok(())
    }

    fn set_baby(&mut self, baby: bool) -> Result<()> {
        self.set_age(if baby { BABY_START_AGE } else { 0 })
    }

    /// One step toward adulthood (or toward the end of the adult cooldown)
    fn tick_age(&mut self) -> Result<()> {
        let record = self.age_record_mut();
        if record.forced_age_timer > 0 {
            record.forced_age_timer -= 1;
        }
        if record.locked {
            return Ok(());
        }
        let age = record.age;
        if age < 0 {
            self.set_age(age + 1)
        } else if age > 0 {
            self.set_age(age - 1)
        } else {
            Ok(())
        }
    }

    /// Grow by `seconds`; `overgrow` banks the excess for after the boundary
    fn age_up(&mut self, seconds: i32, overgrow: bool) -> Result<()> {
        if self.age_record().locked {
            return Ok(());
        }
        let old = self.age();
        let grown = old
            .saturating_add(seconds.saturating_mul(TICKS_PER_SECOND))
            .min(0);
        let delta = grown - old;
        self.set_age(grown)?;
        if overgrow {
            let record = self.age_record_mut();
            record.forced_age = record.forced_age.saturating_add(delta);
            if record.forced_age_timer == 0 {
                record.forced_age_timer = FORCED_AGE_TIMER_TICKS;
            }
        }
        if self.age() == 0 {
            let forced = self.age_record().forced_age;
            self.set_age(forced)?;
        }
        Ok(())
    }
}

/// Shared state of one group spawn
///
/// The first member is never forced juvenile; later members are, with
/// `baby_chance`.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeableGroupData {
    should_spawn_baby: bool,
    baby_chance: f32,
    group_size: u32,
}

impl AgeableGroupData {
    pub fn new(should_spawn_baby: bool) -> Self {
        Self {
            should_spawn_baby,
            baby_chance: DEFAULT_BABY_CHANCE,
            group_size: 0,
        }
    }

    pub fn with_baby_chance(mut self, chance: f32) -> Self {
        self.baby_chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn group_size(&self) -> u32 {
        self.group_size
    }

    pub fn baby_chance(&self) -> f32 {
        self.baby_chance
    }

    /// Decide the next member's age and count it into the group
    pub fn finalize_spawn<A: Ageable + ?Sized>(
        &mut self,
        member: &mut A,
        rng: &mut dyn RandomSource,
    ) -> Result<()> {
        if self.should_spawn_baby && self.group_size > 0 && rng.next_f32() <= self.baby_chance {
            member.set_age(BABY_START_AGE)?;
        }
        self.group_size += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobtick_core::GameRng;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Calf {
        record: AgeRecord,
        baby_flag: bool,
        crossings: u32,
    }

    impl Ageable for Calf {
        fn age_record(&self) -> &AgeRecord {
            &self.record
        }

        fn age_record_mut(&mut self) -> &mut AgeRecord {
            &mut self.record
        }

        fn write_baby_flag(&mut self, baby: bool) -> Result<()> {
            self.baby_flag = baby;
            Ok(())
        }

        fn age_boundary_reached(&mut self) {
            self.crossings += 1;
        }
    }

    #[derive(Debug)]
    struct Always(u64);

    impl RandomSource for Always {
        fn next_u64(&mut self) -> u64 {
            self.0
        }
    }

    #[test]
    fn test_baby_grows_up_once() {
        let mut calf = Calf::default();
        calf.set_baby(true).unwrap();
        assert!(calf.baby_flag);
        assert_eq!(calf.crossings, 1);
        for _ in 0..24_000 {
            calf.tick_age().unwrap();
        }
        assert_eq!(calf.age(), 0);
        assert!(!calf.is_baby());
        assert!(!calf.baby_flag);
        assert_eq!(calf.crossings, 2);
    }

    #[test]
    fn test_adult_cooldown_counts_down() {
        let mut calf = Calf::default();
        calf.set_age(3).unwrap();
        calf.tick_age().unwrap();
        assert_eq!(calf.age(), 2);
        assert_eq!(calf.crossings, 0);
    }

    #[test]
    fn test_locked_age_does_not_step() {
        let mut calf = Calf::default();
        calf.set_age(-10).unwrap();
        calf.age_record_mut().locked = true;
        calf.age_record_mut().forced_age_timer = 3;
        calf.tick_age().unwrap();
        assert_eq!(calf.age(), -10);
        assert_eq!(calf.age_record().forced_age_timer, 2);
        calf.age_up(100, false).unwrap();
        assert_eq!(calf.age(), -10);
    }

    #[test]
    fn test_age_up_stops_at_zero() {
        let mut calf = Calf::default();
        calf.set_age(-100).unwrap();
        calf.age_up(2, false).unwrap();
        assert_eq!(calf.age(), -60);
        calf.age_up(60, false).unwrap();
        assert_eq!(calf.age(), 0);
    }

    #[test]
    fn test_forced_growth_snaps_to_forced_age() {
        let mut calf = Calf::default();
        calf.set_age(-100).unwrap();
        calf.age_record_mut().forced_age = 250;
        calf.age_up(10, true).unwrap();
        // delta 100 banked on top, then the adult age jumps to the bank
        assert_eq!(calf.age(), 350);
        assert_eq!(calf.age_record().forced_age_timer, FORCED_AGE_TIMER_TICKS);
    }

    #[test]
    fn test_feeding_speed_up() {
        assert_eq!(speed_up_seconds_when_feeding(24_000), 120);
        assert_eq!(speed_up_seconds_when_feeding(199), 0);
        assert_eq!(speed_up_seconds_when_feeding(0), 0);
    }

    #[test]
    fn test_group_first_member_never_baby() {
        let mut group = AgeableGroupData::new(true).with_baby_chance(1.0);
        let mut rng = Always(0);
        let mut first = Calf::default();
        group.finalize_spawn(&mut first, &mut rng).unwrap();
        assert!(!first.is_baby());

        let mut second = Calf::default();
        group.finalize_spawn(&mut second, &mut rng).unwrap();
        assert_eq!(second.age(), BABY_START_AGE);
        assert_eq!(group.group_size(), 2);
    }

    #[test]
    fn test_group_without_babies() {
        let mut group = AgeableGroupData::new(false);
        let mut rng = GameRng::new(9);
        for _ in 0..20 {
            let mut calf = Calf::default();
            group.finalize_spawn(&mut calf, &mut rng).unwrap();
            assert!(!calf.is_baby());
        }
    }

    #[test]
    fn test_record_save_load() {
        let record = AgeRecord {
            age: -500,
            forced_age: 20,
            forced_age_timer: 7,
            locked: true,
        };
        let mut map = ValueMap::new();
        record.save(&mut map);
        let loaded = AgeRecord::load(&FieldReader::new(&map, "test"));
        assert_eq!(loaded.age, -500);
        assert_eq!(loaded.forced_age, 20);
        assert!(loaded.locked);
    }

    proptest! {
        #[test]
        fn prop_juvenile_iff_negative(age in any::<i32>()) {
            let mut calf = Calf::default();
            calf.set_age(age).unwrap();
            prop_assert_eq!(calf.is_baby(), age < 0);
            prop_assert_eq!(calf.baby_flag, age < 0);
        }

        #[test]
        fn prop_age_up_never_positive(start in -50_000i32..=0, seconds in 0i32..5_000) {
            let mut calf = Calf::default();
            calf.set_age(start).unwrap();
            calf.age_up(seconds, false).unwrap();
            prop_assert!(calf.age() <= 0);
        }

        #[test]
        fn prop_crossing_fires_once(start in -1_000i32..0, target in 0i32..1_000) {
            let mut calf = Calf::default();
            calf.set_age(start).unwrap();
            let before = calf.crossings;
            calf.set_age(target).unwrap();
            calf.set_age(target).unwrap();
            prop_assert_eq!(calf.crossings, before + 1);
        }
    }
}
