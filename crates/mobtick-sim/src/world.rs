//! Multi-region world
//!
//! Regions never share entity state, so a world steps them side by side on
//! scoped worker threads. Each region's own order stays serial.

use crate::config::WorldConfig;
use crate::region::{Region, TickReport};
use std::thread;
use tracing::debug;

/// Owns the regions and steps them together
///
/// ```
/// use mobtick_sim::{Region, RegionConfig, World, WorldConfig};
/// use mobtick_script::TypeTable;
/// use std::sync::Arc;
///
/// let types = Arc::new(TypeTable::builtin().unwrap());
/// let mut world = World::new(WorldConfig::with_worker_count(2));
/// world.add_region(Region::new(RegionConfig::with_seed(1), Arc::clone(&types)));
/// world.add_region(Region::new(RegionConfig::with_seed(2), types));
///
/// let reports = world.tick();
/// assert_eq!(reports.len(), 2);
/// assert!(reports.iter().all(|r| r.tick == 1));
/// ```
#[derive(Debug, Default)]
pub struct World {
    config: WorldConfig,
    regions: Vec<Region>,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            regions: Vec::new(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Change the worker count; takes effect on the next tick
    pub fn set_worker_count(&mut self, n: usize) {
        self.config.set_worker_count(n);
    }

    /// Returns the region's index
    pub fn add_region(&mut self, region: Region) -> usize {
        self.regions.push(region);
        self.regions.len() - 1
    }

    pub fn region(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub fn region_mut(&mut self, index: usize) -> Option<&mut Region> {
        self.regions.get_mut(index)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Step every region once; reports come back in region order
    pub fn tick(&mut self) -> Vec<TickReport> {
        let workers = self.config.worker_count().min(self.regions.len());
        if workers <= 1 {
            return self.regions.iter_mut().map(Region::tick).collect();
        }

        let chunk = self.regions.len().div_ceil(workers);
        debug!(regions = self.regions.len(), workers, "parallel world tick");
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .regions
                .chunks_mut(chunk)
                .map(|regions| {
                    scope.spawn(move || regions.iter_mut().map(Region::tick).collect::<Vec<_>>())
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionConfig;
    use mobtick_core::{DVec3, EntityEvent};
    use mobtick_script::TypeTable;
    use std::sync::Arc;

    fn world(workers: usize, regions: usize) -> World {
        let types = Arc::new(TypeTable::builtin().unwrap());
        let mut world = World::new(WorldConfig::with_worker_count(workers));
        for i in 0..regions {
            let config = RegionConfig::with_seed(i as u64).with_name(format!("region-{i}"));
            world.add_region(Region::new(config, Arc::clone(&types)));
        }
        world
    }

    #[test]
    fn test_empty_world_ticks() {
        let mut w = world(4, 0);
        assert!(w.tick().is_empty());
    }

    #[test]
    fn test_reports_keep_region_order() {
        let mut w = world(4, 5);
        for i in 0..5 {
            let region = w.region_mut(i).unwrap();
            for _ in 0..=i {
                region.spawn("cow", DVec3::ZERO).unwrap();
            }
        }
        let reports = w.tick();
        let active: Vec<usize> = reports.iter().map(|r| r.active).collect();
        assert_eq!(active, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let mut serial = world(1, 3);
        let mut parallel = world(3, 3);
        for w in [&mut serial, &mut parallel] {
            for i in 0..3 {
                let region = w.region_mut(i).unwrap();
                region
                    .spawn_group("sheep", &[DVec3::ZERO; 8], true)
                    .unwrap();
            }
        }
        let collect = |w: &mut World| -> Vec<Vec<EntityEvent>> {
            (0..50).flat_map(|_| w.tick()).map(|r| r.events).collect()
        };
        assert_eq!(collect(&mut serial), collect(&mut parallel));
    }
}
