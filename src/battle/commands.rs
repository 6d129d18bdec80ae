use crate::actions::ActionId;
use crate::field::FieldSlot;
use crate::hooks::ItemId;
use serde::{Deserialize, Serialize};

/// A target reference as written at command-collection time. The placeholder
/// is resolved (or the action cancelled) when the action actually runs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRef {
    Slot(FieldSlot),
    /// Whoever last damaged the user, resolved at execution time.
    LastAttacker,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    UseAction {
        action: ActionId,
        targets: Vec<TargetRef>,
    },
    Switch {
        roster_index: usize,
    },
    Flee,
    UseItem {
        item: ItemId,
    },
}

impl CommandKind {
    /// Non-action commands always precede action commands in turn order.
    pub fn is_use_action(&self) -> bool {
        matches!(self, CommandKind::UseAction { .. })
    }
}

/// One slot's chosen command for the turn, populated during collection and
/// consumed by the order resolver and executor. `skip` lets an earlier task
/// void this command without removing it from the table (a partner's action
/// may have already consumed both turn slots).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TurnCommand {
    pub slot: FieldSlot,
    pub kind: CommandKind,
    pub skip: bool,
}

impl TurnCommand {
    pub fn use_action(slot: FieldSlot, action: ActionId, targets: Vec<TargetRef>) -> TurnCommand {
        TurnCommand {
            slot,
            kind: CommandKind::UseAction { action, targets },
            skip: false,
        }
    }

    pub fn switch(slot: FieldSlot, roster_index: usize) -> TurnCommand {
        TurnCommand {
            slot,
            kind: CommandKind::Switch { roster_index },
            skip: false,
        }
    }

    pub fn flee(slot: FieldSlot) -> TurnCommand {
        TurnCommand {
            slot,
            kind: CommandKind::Flee,
            skip: false,
        }
    }

    pub fn use_item(slot: FieldSlot, item: ItemId) -> TurnCommand {
        TurnCommand {
            slot,
            kind: CommandKind::UseItem { item },
            skip: false,
        }
    }
}

/// Whether an action was picked by its user or invoked from elsewhere
/// (copied, forced, reflected, called by another action). Indirect
/// invocations run a reduced legality check.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    Direct,
    Indirect,
}

/// A use-action attempt ready for the legality cascade and executor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QueuedAction {
    pub user: FieldSlot,
    pub action: ActionId,
    pub targets: Vec<TargetRef>,
    pub mode: InvocationMode,
}

impl QueuedAction {
    pub fn direct(user: FieldSlot, action: ActionId, targets: Vec<TargetRef>) -> QueuedAction {
        QueuedAction {
            user,
            action,
            targets,
            mode: InvocationMode::Direct,
        }
    }

    pub fn indirect(user: FieldSlot, action: ActionId, targets: Vec<TargetRef>) -> QueuedAction {
        QueuedAction {
            user,
            action,
            targets,
            mode: InvocationMode::Indirect,
        }
    }
}
