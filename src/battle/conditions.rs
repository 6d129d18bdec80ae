use serde::{Deserialize, Serialize};

use crate::actions::ActionId;
use crate::field::FieldSlot;
use std::collections::BTreeMap;

/// When a marker's lapse pass runs. Exactly one pass per timing category
/// runs per turn for each combatant.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LapseTiming {
    /// Removed after the owner's action attempt resolves.
    PreAction,
    /// Consumed when the owner's action effect actually applies.
    OnActionEffect,
    /// Counted down (or expired outright) during the end-of-turn pipeline.
    EndOfTurn,
}

/// A lapsing state attached to a combatant. Markers with the same kind
/// replace each other; a combatant never carries two of a kind.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ConditionMarker {
    Flinched,
    Confused {
        turns_remaining: u8,
    },
    Disabled {
        action: ActionId,
        turns_remaining: u8,
    },
    HealBlocked {
        turns_remaining: u8,
    },
    Silenced {
        turns_remaining: u8,
    },
    Taunted {
        turns_remaining: u8,
    },
    Imprisoned {
        blocked: Vec<ActionId>,
    },
    Infatuated {
        source: FieldSlot,
    },
    MustRepeat {
        action: ActionId,
        turns_remaining: u8,
    },
    Trapped {
        turns_remaining: u8,
    },
    /// Draws all single-target actions to the owner for the rest of the turn.
    CenterOfAttention {
        powder_based: bool,
    },
    /// Detonates on the owner when it attempts an action that ignites powder.
    PowderCoated,
    /// The owner is mid charge-up and releases `action` next turn.
    Charging {
        action: ActionId,
        targets: Vec<FieldSlot>,
    },
}

/// Marker kind without the data payload, for lookups and removal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkerKind {
    Flinched,
    Confused,
    Disabled,
    HealBlocked,
    Silenced,
    Taunted,
    Imprisoned,
    Infatuated,
    MustRepeat,
    Trapped,
    CenterOfAttention,
    PowderCoated,
    Charging,
}

impl ConditionMarker {
    pub fn kind(&self) -> MarkerKind {
        match self {
            ConditionMarker::Flinched => MarkerKind::Flinched,
            ConditionMarker::Confused { .. } => MarkerKind::Confused,
            ConditionMarker::Disabled { .. } => MarkerKind::Disabled,
            ConditionMarker::HealBlocked { .. } => MarkerKind::HealBlocked,
            ConditionMarker::Silenced { .. } => MarkerKind::Silenced,
            ConditionMarker::Taunted { .. } => MarkerKind::Taunted,
            ConditionMarker::Imprisoned { .. } => MarkerKind::Imprisoned,
            ConditionMarker::Infatuated { .. } => MarkerKind::Infatuated,
            ConditionMarker::MustRepeat { .. } => MarkerKind::MustRepeat,
            ConditionMarker::Trapped { .. } => MarkerKind::Trapped,
            ConditionMarker::CenterOfAttention { .. } => MarkerKind::CenterOfAttention,
            ConditionMarker::PowderCoated => MarkerKind::PowderCoated,
            ConditionMarker::Charging { .. } => MarkerKind::Charging,
        }
    }

    pub fn lapse_timing(&self) -> LapseTiming {
        match self.kind() {
            MarkerKind::Flinched => LapseTiming::PreAction,
            MarkerKind::Charging => LapseTiming::OnActionEffect,
            _ => LapseTiming::EndOfTurn,
        }
    }
}

/// The markers currently attached to one combatant. Keyed by kind in a
/// fixed order, so lapse output and serialization never depend on
/// insertion history.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionSet {
    markers: BTreeMap<MarkerKind, ConditionMarker>,
}

impl ConditionSet {
    pub fn insert(&mut self, marker: ConditionMarker) {
        self.markers.insert(marker.kind(), marker);
    }

    pub fn contains(&self, kind: MarkerKind) -> bool {
        self.markers.contains_key(&kind)
    }

    pub fn get(&self, kind: MarkerKind) -> Option<&ConditionMarker> {
        self.markers.get(&kind)
    }

    pub fn remove(&mut self, kind: MarkerKind) -> Option<ConditionMarker> {
        self.markers.remove(&kind)
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConditionMarker> {
        self.markers.values()
    }

    /// Run one lapse pass for the given timing category. Counted markers
    /// tick down; anything that expires is removed and reported.
    pub fn lapse(&mut self, timing: LapseTiming) -> Vec<MarkerKind> {
        let mut expired = Vec::new();
        for marker in self.markers.values_mut() {
            if marker.lapse_timing() != timing {
                continue;
            }
            let done = match marker {
                ConditionMarker::Flinched => true,
                ConditionMarker::Charging { .. } => true,
                ConditionMarker::CenterOfAttention { .. } => true,
                ConditionMarker::PowderCoated => true,
                ConditionMarker::Confused { turns_remaining }
                | ConditionMarker::Disabled { turns_remaining, .. }
                | ConditionMarker::HealBlocked { turns_remaining }
                | ConditionMarker::Silenced { turns_remaining }
                | ConditionMarker::Taunted { turns_remaining }
                | ConditionMarker::MustRepeat { turns_remaining, .. }
                | ConditionMarker::Trapped { turns_remaining } => {
                    *turns_remaining = turns_remaining.saturating_sub(1);
                    *turns_remaining == 0
                }
                // Persist until their owner or source leaves the field.
                ConditionMarker::Imprisoned { .. } | ConditionMarker::Infatuated { .. } => false,
            };
            if done {
                expired.push(marker.kind());
            }
        }
        for kind in &expired {
            self.markers.remove(kind);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_kind_replaces() {
        let mut set = ConditionSet::default();
        set.insert(ConditionMarker::Confused { turns_remaining: 2 });
        set.insert(ConditionMarker::Confused { turns_remaining: 5 });
        match set.get(MarkerKind::Confused) {
            Some(ConditionMarker::Confused { turns_remaining }) => assert_eq!(*turns_remaining, 5),
            other => panic!("unexpected marker: {:?}", other),
        }
    }

    #[test]
    fn end_of_turn_lapse_counts_down_and_expires() {
        let mut set = ConditionSet::default();
        set.insert(ConditionMarker::Taunted { turns_remaining: 2 });
        set.insert(ConditionMarker::PowderCoated);
        set.insert(ConditionMarker::Flinched);

        let expired = set.lapse(LapseTiming::EndOfTurn);
        assert!(expired.contains(&MarkerKind::PowderCoated));
        assert!(!expired.contains(&MarkerKind::Taunted));
        // Flinched lapses pre-action, not end-of-turn.
        assert!(set.contains(MarkerKind::Flinched));

        let expired = set.lapse(LapseTiming::EndOfTurn);
        assert!(expired.contains(&MarkerKind::Taunted));
        assert!(!set.contains(MarkerKind::Taunted));
    }

    #[test]
    fn simultaneous_expiries_come_out_in_kind_order() {
        // Insertion order deliberately scrambled; expiry order must not
        // follow it.
        let mut set = ConditionSet::default();
        set.insert(ConditionMarker::Taunted { turns_remaining: 1 });
        set.insert(ConditionMarker::HealBlocked { turns_remaining: 1 });
        set.insert(ConditionMarker::Silenced { turns_remaining: 1 });

        let expired = set.lapse(LapseTiming::EndOfTurn);
        assert_eq!(
            expired,
            vec![
                MarkerKind::HealBlocked,
                MarkerKind::Silenced,
                MarkerKind::Taunted
            ]
        );
        assert!(set.is_empty());
    }

    #[test]
    fn flinch_is_a_one_shot() {
        let mut set = ConditionSet::default();
        set.insert(ConditionMarker::Flinched);
        let expired = set.lapse(LapseTiming::PreAction);
        assert_eq!(expired, vec![MarkerKind::Flinched]);
        assert!(set.is_empty());
    }

    #[test]
    fn infatuation_never_lapses_on_its_own() {
        let mut set = ConditionSet::default();
        set.insert(ConditionMarker::Infatuated {
            source: crate::field::FieldSlot::FOE_LEFT,
        });
        for _ in 0..10 {
            assert!(set.lapse(LapseTiming::EndOfTurn).is_empty());
        }
        assert!(set.contains(MarkerKind::Infatuated));
    }
}
