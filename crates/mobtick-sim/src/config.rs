//! Region and world configuration
//!
//! Both configs are plain serde structs with defaults, so a host can keep
//! them in RON next to its entity definitions.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Settings for one region
///
/// # Example
///
/// ```
/// use mobtick_sim::RegionConfig;
///
/// let config = RegionConfig::from_ron("(seed: 7, activation_range: Some(32.0))").unwrap();
/// assert_eq!(config.seed, 7);
/// assert_eq!(config.activation_range(), Some(32.0));
///
/// // without a range every entity is always active
/// assert_eq!(RegionConfig::default().activation_range(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Label used in log output
    pub name: String,
    /// Base seed for the region and per-entity random sources
    pub seed: u64,
    /// Entities farther than this from every player tick inactive
    activation_range: Option<f64>,
}

impl RegionConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Negative ranges are clamped to zero
    pub fn with_activation_range(mut self, range: Option<f64>) -> Self {
        self.set_activation_range(range);
        self
    }

    pub fn set_activation_range(&mut self, range: Option<f64>) {
        self.activation_range = range.map(|r| r.max(0.0));
    }

    pub fn activation_range(&self) -> Option<f64> {
        self.activation_range
    }

    /// Parse from RON; missing fields take their defaults
    pub fn from_ron(source: &str) -> Result<Self> {
        let mut config: RegionConfig = ron::from_str(source)?;
        config.set_activation_range(config.activation_range);
        Ok(config)
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            name: "region".to_string(),
            seed: 0,
            activation_range: None,
        }
    }
}

/// Settings for a multi-region world
///
/// # Example
///
/// ```
/// use mobtick_sim::WorldConfig;
///
/// let config = WorldConfig::default();
/// assert!(config.is_single_worker());
///
/// let config = WorldConfig::with_worker_count(4);
/// assert_eq!(config.worker_count(), 4.min(mobtick_sim::max_cores()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Threads used to step regions, clamped to `[1, max_cores()]`
    worker_count: usize,
}

impl WorldConfig {
    pub fn with_worker_count(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.clamp(1, max_cores()),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// The value is clamped to `[1, max_cores()]`
    pub fn set_worker_count(&mut self, n: usize) {
        self.worker_count = n.clamp(1, max_cores());
    }

    pub fn is_single_worker(&self) -> bool {
        self.worker_count == 1
    }

    pub fn from_ron(source: &str) -> Result<Self> {
        let config: WorldConfig = ron::from_str(source)?;
        Ok(Self::with_worker_count(config.worker_count))
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { worker_count: 1 }
    }
}

/// Logical CPUs available to the world
pub fn max_cores() -> usize {
    num_cpus::get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_defaults() {
        let config = RegionConfig::default();
        assert_eq!(config.seed, 0);
        assert_eq!(config.name, "region");
        assert!(config.activation_range().is_none());
    }

    #[test]
    fn test_region_from_ron_partial() {
        let config = RegionConfig::from_ron("(name: \"spawn\")").unwrap();
        assert_eq!(config.name, "spawn");
        assert_eq!(config.seed, 0);
    }

    #[test]
    fn test_negative_range_clamped() {
        let config = RegionConfig::from_ron("(activation_range: Some(-4.0))").unwrap();
        assert_eq!(config.activation_range(), Some(0.0));
        let config = RegionConfig::with_seed(1).with_activation_range(Some(-1.0));
        assert_eq!(config.activation_range(), Some(0.0));
    }

    #[test]
    fn test_region_from_bad_ron() {
        assert!(RegionConfig::from_ron("(seed: \"many\")").is_err());
    }

    #[test]
    fn test_worker_count_clamped() {
        assert_eq!(WorldConfig::with_worker_count(0).worker_count(), 1);
        assert_eq!(WorldConfig::with_worker_count(10_000).worker_count(), max_cores());

        let mut config = WorldConfig::default();
        config.set_worker_count(2);
        assert_eq!(config.worker_count(), 2.min(max_cores()));
        config.set_worker_count(1);
        assert!(config.is_single_worker());
    }

    #[test]
    fn test_world_from_ron() {
        let config = WorldConfig::from_ron("(worker_count: 0)").unwrap();
        assert_eq!(config.worker_count(), 1);
    }
}
