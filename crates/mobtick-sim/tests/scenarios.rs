use mobtick_core::{
    BincodeCodec, DVec3, DefId, EntityEvent, EntityId, PersistenceCodec, RemovalReason, RonCodec,
};
use mobtick_script::TypeTable;
use mobtick_sim::{
    can_merge, decompose, experience_value, AreaEffectSource, Ageable, ExpData, Region,
    RegionConfig, SpawnReason, TickReport, BABY_START_AGE,
};
use proptest::prelude::*;
use std::sync::Arc;

fn types() -> Arc<TypeTable> {
    Arc::new(TypeTable::builtin().unwrap())
}

fn region(seed: u64) -> (Region, Arc<TypeTable>) {
    let types = types();
    (
        Region::new(RegionConfig::with_seed(seed), Arc::clone(&types)),
        types,
    )
}

fn run(region: &mut Region, ticks: usize) -> Vec<TickReport> {
    (0..ticks).map(|_| region.tick()).collect()
}

#[test]
fn test_baby_grows_up_exactly_once() {
    let (mut region, _) = region(1);
    let lamb = region.spawn("sheep", DVec3::ZERO).unwrap();
    region.mob_mut(lamb).unwrap().set_age(BABY_START_AGE).unwrap();

    let reports = run(&mut region, 24_000);
    let grown: Vec<_> = reports
        .iter()
        .flat_map(|r| &r.events)
        .filter(|e| matches!(e, EntityEvent::AgeBoundary { baby: false, .. }))
        .collect();
    assert_eq!(grown.len(), 1);

    let mob = region.entity(lamb).and_then(|e| e.as_mob()).unwrap();
    assert_eq!(mob.age(), 0);
    assert!(!mob.is_baby());
}

#[test]
fn test_cloud_waits_then_expires() {
    let (mut region, _) = region(2);
    let cloud = region.spawn("area_effect_cloud", DVec3::ZERO).unwrap();

    let mut woke = None;
    let mut removed = None;
    for _ in 0..700 {
        let report = region.tick();
        for event in &report.events {
            if let EntityEvent::CloudPhaseChanged { waiting: false, .. } = event {
                woke = Some(report.tick);
            }
        }
        if report.removed.contains(&(cloud, RemovalReason::Expired)) {
            removed = Some(report.tick);
            break;
        }
        if report.tick < 20 {
            let c = region.entity(cloud).and_then(|e| e.as_cloud()).unwrap();
            assert!(c.is_waiting());
        }
    }
    assert_eq!(woke, Some(20));
    assert_eq!(removed, Some(620));
    assert!(region.entity(cloud).is_none());
}

#[test]
fn test_cloud_reapplies_after_cooldown() {
    let (mut region, types) = region(3);
    let cloud = region.spawn("area_effect_cloud", DVec3::ZERO).unwrap();
    let cow = region.spawn("cow", DVec3::new(1.0, 0.0, 0.0)).unwrap();
    region
        .cloud_mut(cloud)
        .unwrap()
        .set_potion(&types, Some(DefId::new("poison")))
        .unwrap();

    let mut hits = Vec::new();
    for report in run(&mut region, 65) {
        for event in &report.events {
            if let EntityEvent::EffectApplied { target, .. } = event {
                if *target == cow {
                    hits.push(report.tick);
                }
            }
        }
    }
    assert_eq!(hits, vec![20, 40, 60]);

    let living = region.entity(cow).and_then(|e| e.as_living()).unwrap();
    assert!(living.body().has_effect(&DefId::new("poison")));
}

#[test]
fn test_decompose_small_amounts() {
    assert_eq!(decompose(0), Vec::<i32>::new());
    assert_eq!(decompose(10), vec![7, 3]);
    assert_eq!(decompose(20), vec![17, 3]);
}

proptest! {
    #[test]
    fn prop_decompose_sums_to_amount(amount in 0i32..200_000) {
        let chunks = decompose(amount);
        prop_assert_eq!(chunks.iter().sum::<i32>(), amount);
        prop_assert!(chunks.windows(2).all(|w| w[0] >= w[1]));
        let mut remaining = amount;
        for chunk in chunks {
            prop_assert_eq!(chunk, experience_value(remaining));
            remaining -= chunk;
        }
    }
}

#[test]
fn test_merge_bucket_uses_orb_id() {
    let (mut region, _) = region(4);
    let id = region.spawn("experience_orb", DVec3::ZERO).unwrap();
    region.orb_mut(id).unwrap().set_value(3).unwrap();

    let orb = region.entity(id).and_then(|e| e.as_orb()).unwrap();
    let own = id.as_i64();
    assert!(can_merge(orb, own, 3));
    assert!(can_merge(orb, own + 40, 3));
    assert!(!can_merge(orb, own + 1, 3));
    assert!(!can_merge(orb, own, 7));
}

fn round_trip(codec: &dyn PersistenceCodec) {
    let (mut region, types) = region(5);
    let lamb = region.spawn("sheep", DVec3::new(3.0, 64.0, -2.0)).unwrap();
    region.mob_mut(lamb).unwrap().set_age(-1200).unwrap();
    let cloud = region.spawn("area_effect_cloud", DVec3::ZERO).unwrap();
    {
        let c = region.cloud_mut(cloud).unwrap();
        c.set_radius(5.0).unwrap();
        c.set_potion(&types, Some(DefId::new("poison"))).unwrap();
    }

    let blob = region.save_entity(lamb, codec).unwrap();
    let copy = region.load_entity(&blob, codec).unwrap();
    assert_ne!(copy, lamb);
    let mob = region.entity(copy).and_then(|e| e.as_mob()).unwrap();
    assert_eq!(mob.age(), -1200);
    assert!(mob.is_baby());
    assert_eq!(mob.base.pos, DVec3::new(3.0, 64.0, -2.0));

    let blob = region.save_entity(cloud, codec).unwrap();
    let copy = region.load_entity(&blob, codec).unwrap();
    let c = region.entity(copy).and_then(|e| e.as_cloud()).unwrap();
    assert_eq!(c.radius(), 5.0);
    assert_eq!(c.potion(), Some(&DefId::new("poison")));
}

#[test]
fn test_ron_round_trip() {
    round_trip(&RonCodec);
}

#[test]
fn test_bincode_round_trip() {
    round_trip(&BincodeCodec);
}

#[test]
fn test_player_picks_up_awarded_orb() {
    let (mut region, _) = region(6);
    let player = region.spawn("player", DVec3::ZERO).unwrap();
    let touched = region
        .award_experience(DVec3::ZERO, 7, &ExpData::new(SpawnReason::EntityDeath))
        .unwrap();
    assert_eq!(touched.len(), 1);
    let orb: EntityId = touched[0];

    let report = region.tick();
    assert!(report.removed.contains(&(orb, RemovalReason::Consumed)));
    let p = region.entity(player).and_then(|e| e.as_player()).unwrap();
    assert_eq!(p.collector.experience, 7);
}
