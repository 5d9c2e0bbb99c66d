//! External veto hook
//!
//! The host can inspect, edit or refuse selected state transitions before the
//! core applies them. A veto is not an error: the caller leaves every entity
//! involved exactly as it was.

use crate::EntityId;
use thiserror::Error;

/// A refused transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("vetoed: {reason}")]
pub struct Veto {
    pub reason: String,
}

impl Veto {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A transition offered to the gate
///
/// Variants carrying `&mut` fields let the host adjust the outcome in place.
#[derive(Debug)]
pub enum GateRequest<'a> {
    /// An area cloud is about to affect `targets`
    AreaEffectApply {
        cloud: EntityId,
        targets: &'a mut Vec<EntityId>,
    },
    /// An orb is about to switch the collector it follows
    OrbTarget {
        orb: EntityId,
        target: Option<EntityId>,
    },
    /// A collector touched an orb
    ExperiencePickup { orb: EntityId, collector: EntityId },
    /// An orb is about to repair a collector's item by `repair` durability
    ItemMend {
        orb: EntityId,
        collector: EntityId,
        slot: usize,
        repair: &'a mut i32,
    },
    /// A collector is about to gain `amount` experience
    ExperienceGain {
        orb: EntityId,
        collector: EntityId,
        amount: &'a mut i32,
    },
}

/// Host hook consulted before gated transitions
pub trait EventGate: Send + Sync {
    fn check(&self, request: &mut GateRequest<'_>) -> Result<(), Veto>;
}

/// Gate that never vetoes or edits anything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl EventGate for AllowAll {
    fn check(&self, _request: &mut GateRequest<'_>) -> Result<(), Veto> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let mut targets = vec![EntityId(1)];
        let mut request = GateRequest::AreaEffectApply {
            cloud: EntityId(9),
            targets: &mut targets,
        };
        assert!(AllowAll.check(&mut request).is_ok());
        assert_eq!(targets, vec![EntityId(1)]);
    }

    struct DoubleExperience;

    impl EventGate for DoubleExperience {
        fn check(&self, request: &mut GateRequest<'_>) -> Result<(), Veto> {
            if let GateRequest::ExperienceGain { amount, .. } = request {
                **amount *= 2;
            }
            Ok(())
        }
    }

    struct NoPickups;

    impl EventGate for NoPickups {
        fn check(&self, request: &mut GateRequest<'_>) -> Result<(), Veto> {
            match request {
                GateRequest::ExperiencePickup { .. } => Err(Veto::new("creative")),
                _ => Ok(()),
            }
        }
    }

    #[test]
    fn test_gate_can_edit() {
        let mut amount = 7;
        DoubleExperience
            .check(&mut GateRequest::ExperienceGain {
                orb: EntityId(1),
                collector: EntityId(2),
                amount: &mut amount,
            })
            .unwrap();
        assert_eq!(amount, 14);
    }

    #[test]
    fn test_gate_can_veto() {
        let err = NoPickups
            .check(&mut GateRequest::ExperiencePickup {
                orb: EntityId(1),
                collector: EntityId(2),
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "vetoed: creative");
    }
}
