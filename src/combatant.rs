use crate::actions::{ActionId, Element};
use crate::battle::conditions::{ConditionSet, MarkerKind};
use crate::field::FieldSlot;
use crate::hooks::{ItemId, TraitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stats the engine itself reads. Attack and defense exist for effect hooks;
/// the turn engine only ever consults speed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub attack: u16,
    pub defense: u16,
    pub speed: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatKind {
    Attack,
    Defense,
    Speed,
    Accuracy,
    Evasion,
}

/// Major status ailments. At most one at a time, unlike condition markers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAilment {
    Sleep { turns_remaining: u8 },
    Freeze,
    Paralysis,
    Poison,
    Burn,
}

/// A known action and its remaining uses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActionInstance {
    pub action: ActionId,
    pub pp: u8,
    pub max_pp: u8,
}

impl ActionInstance {
    pub fn new(action: ActionId, max_pp: u8) -> ActionInstance {
        ActionInstance {
            action,
            pp: max_pp,
            max_pp,
        }
    }

    /// Deduct one use. Returns false if nothing was left to spend.
    pub fn spend(&mut self) -> bool {
        if self.pp == 0 {
            return false;
        }
        self.pp -= 1;
        true
    }
}

/// What a combatant did (or tried to do) this turn. Reset when a new turn
/// starts; other systems key off `failed_flee` and `last_action`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnRecord {
    pub acted: bool,
    pub failed_flee: bool,
    pub last_action: Option<ActionId>,
}

impl TurnRecord {
    pub fn reset(&mut self) {
        *self = TurnRecord::default();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Combatant {
    pub name: String,
    pub max_hp: u16,
    current_hp: u16,
    pub stats: Stats,
    pub stat_stages: BTreeMap<StatKind, i8>,
    pub status: Option<StatusAilment>,
    pub markers: ConditionSet,
    pub actions: Vec<ActionInstance>,
    pub traits: Vec<TraitId>,
    pub held_item: Option<ItemId>,
    pub element: Element,
    pub grounded: bool,
    pub last_attacker: Option<FieldSlot>,
    pub turn_record: TurnRecord,
}

impl Combatant {
    pub fn new(name: impl Into<String>, max_hp: u16, stats: Stats) -> Combatant {
        Combatant {
            name: name.into(),
            max_hp,
            current_hp: max_hp,
            stats,
            stat_stages: BTreeMap::new(),
            status: None,
            markers: ConditionSet::default(),
            actions: Vec::new(),
            traits: Vec::new(),
            held_item: None,
            element: Element::default(),
            grounded: true,
            last_attacker: None,
            turn_record: TurnRecord::default(),
        }
    }

    pub fn current_hp(&self) -> u16 {
        self.current_hp
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    pub fn set_hp(&mut self, hp: u16) {
        self.current_hp = hp.min(self.max_hp);
    }

    /// Apply damage, returning true if this faints the combatant.
    pub fn take_damage(&mut self, amount: u16) -> bool {
        self.current_hp = self.current_hp.saturating_sub(amount);
        self.current_hp == 0
    }

    pub fn heal(&mut self, amount: u16) -> u16 {
        let healed = amount.min(self.max_hp - self.current_hp);
        self.current_hp += healed;
        healed
    }

    pub fn action_instance(&self, action: ActionId) -> Option<&ActionInstance> {
        self.actions.iter().find(|inst| inst.action == action)
    }

    pub fn action_instance_mut(&mut self, action: ActionId) -> Option<&mut ActionInstance> {
        self.actions.iter_mut().find(|inst| inst.action == action)
    }

    pub fn has_marker(&self, kind: MarkerKind) -> bool {
        self.markers.contains(kind)
    }

    // === Stat stage management ===

    pub fn stat_stage(&self, stat: StatKind) -> i8 {
        self.stat_stages.get(&stat).copied().unwrap_or(0)
    }

    pub fn set_stat_stage(&mut self, stat: StatKind, stage: i8) {
        let clamped = stage.clamp(-6, 6);
        if clamped == 0 {
            self.stat_stages.remove(&stat);
        } else {
            self.stat_stages.insert(stat, clamped);
        }
    }

    pub fn modify_stat_stage(&mut self, stat: StatKind, delta: i8) {
        self.set_stat_stage(stat, self.stat_stage(stat).saturating_add(delta));
    }

    /// Clear everything that does not survive leaving the field: markers,
    /// stat stages, attacker memory, and the per-turn record. Major status
    /// ailments persist across switches.
    pub fn clear_volatile_state(&mut self) {
        self.markers.clear();
        self.stat_stages.clear();
        self.last_attacker = None;
        self.turn_record.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Combatant {
        Combatant::new("Bramblin", 40, Stats { attack: 12, defense: 10, speed: 20 })
    }

    #[test]
    fn damage_saturates_at_zero_and_reports_faint() {
        let mut c = sample();
        assert!(!c.take_damage(39));
        assert_eq!(c.current_hp(), 1);
        assert!(c.take_damage(100));
        assert!(c.is_fainted());
    }

    #[test]
    fn heal_never_exceeds_max() {
        let mut c = sample();
        c.take_damage(10);
        assert_eq!(c.heal(25), 10);
        assert_eq!(c.current_hp(), c.max_hp);
    }

    #[test]
    fn stat_stages_clamp_and_drop_at_zero() {
        let mut c = sample();
        c.modify_stat_stage(StatKind::Speed, 4);
        c.modify_stat_stage(StatKind::Speed, 4);
        assert_eq!(c.stat_stage(StatKind::Speed), 6);
        c.set_stat_stage(StatKind::Speed, 0);
        assert!(c.stat_stages.is_empty());
    }

    #[test]
    fn extreme_stage_deltas_saturate_before_the_clamp() {
        let mut c = sample();
        c.set_stat_stage(StatKind::Attack, 6);
        c.modify_stat_stage(StatKind::Attack, i8::MAX);
        assert_eq!(c.stat_stage(StatKind::Attack), 6);

        c.set_stat_stage(StatKind::Attack, -6);
        c.modify_stat_stage(StatKind::Attack, i8::MIN);
        assert_eq!(c.stat_stage(StatKind::Attack), -6);
    }

    #[test]
    fn spend_fails_when_empty() {
        let mut inst = ActionInstance::new(ActionId(7), 1);
        assert!(inst.spend());
        assert!(!inst.spend());
        assert_eq!(inst.pp, 0);
    }
}
