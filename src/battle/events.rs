use crate::actions::{ActionId, Element};
use crate::battle::conditions::MarkerKind;
use crate::battle::state::{BattleContext, EncounterOutcome, TerrainKind, WeatherKind};
use crate::combatant::StatusAilment;
use crate::field::{FieldSlot, Side};
use crate::hooks::{Catalogs, ItemId};
use serde::{Deserialize, Serialize};

/// Why a queued action was withdrawn before its cost was paid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    Asleep,
    Frozen,
    OutOfResource,
    UnknownAction,
    MustRepeatOther,
    Interrupted,
    Flinched,
    ActionDisabled,
    HealingBlocked,
    Silenced,
    GravityBound,
    Taunted,
    Imprisoned,
    ConfusionSelfHit,
    FullyParalyzed,
    Infatuated,
    CounterTargetGone,
    UserNotActive,
    Trapped,
    SkippedByPartner,
}

/// Why an announced action's effect was withheld. Message selection is
/// ordered: an action-specific message wins over terrain/weather text, and
/// the generic fallback is used only when nothing more specific applies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    ActionSpecific(String),
    WeatherBlocked(WeatherKind),
    TerrainBlocked(TerrainKind),
    PriorityBlocked,
    Generic,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum BattleEvent {
    // Turn management
    TurnStarted {
        turn_number: u32,
    },
    TurnEnded,

    // Action resolution
    ActionAnnounced {
        slot: FieldSlot,
        action: ActionId,
    },
    ActionCancelled {
        slot: FieldSlot,
        reason: CancelReason,
    },
    ActionFailed {
        slot: FieldSlot,
        reason: FailureReason,
    },
    ChargingBegan {
        slot: FieldSlot,
        action: ActionId,
    },
    PowderIgnited {
        slot: FieldSlot,
        damage: u16,
    },
    ElementAdapted {
        slot: FieldSlot,
        element: Element,
    },

    // State changes
    DamageDealt {
        target: FieldSlot,
        amount: u16,
        remaining_hp: u16,
    },
    Healed {
        target: FieldSlot,
        amount: u16,
        new_hp: u16,
    },
    CombatantFainted {
        slot: FieldSlot,
    },
    SwitchedIn {
        slot: FieldSlot,
        roster_index: usize,
    },
    ItemUsed {
        slot: FieldSlot,
        item: ItemId,
    },
    StatusApplied {
        target: FieldSlot,
        status: StatusAilment,
    },
    StatusCleared {
        target: FieldSlot,
        status: StatusAilment,
    },
    MarkerApplied {
        target: FieldSlot,
        marker: MarkerKind,
    },
    MarkerExpired {
        target: FieldSlot,
        marker: MarkerKind,
    },

    // End-of-turn pipeline
    WeatherDamage {
        target: FieldSlot,
        weather: WeatherKind,
        damage: u16,
    },
    WeatherEnded {
        weather: WeatherKind,
    },
    StatusDamage {
        target: FieldSlot,
        status: StatusAilment,
        damage: u16,
    },
    TrapDamage {
        target: FieldSlot,
        damage: u16,
    },
    TerrainHeal {
        target: FieldSlot,
        terrain: TerrainKind,
        amount: u16,
    },
    TerrainEnded {
        terrain: TerrainKind,
    },

    // Escape
    FledSuccessfully {
        slot: FieldSlot,
    },
    EscapeFailed {
        slot: FieldSlot,
        attempts: u32,
    },

    // Encounter end
    SideDefeated {
        side: Side,
    },
    ReplacementsRequired {
        sides: Vec<Side>,
    },
    EncounterEnded {
        outcome: EncounterOutcome,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string. Returns None for
    /// silent events that produce no user-visible text.
    pub fn format(&self, ctx: &BattleContext, catalogs: &Catalogs) -> Option<String> {
        let name_at = |slot: FieldSlot| -> String {
            ctx.combatant(slot)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| slot.to_string())
        };
        match self {
            BattleEvent::TurnStarted { turn_number } => {
                Some(format!("=== Turn {} ===", turn_number))
            }
            BattleEvent::TurnEnded => None,

            BattleEvent::ActionAnnounced { slot, action } => Some(format!(
                "{} used {}!",
                name_at(*slot),
                catalogs.actions.name_of(*action)
            )),
            BattleEvent::ActionCancelled { slot, reason } => {
                let name = name_at(*slot);
                match reason {
                    CancelReason::Asleep => Some(format!("{} is fast asleep.", name)),
                    CancelReason::Frozen => Some(format!("{} is frozen solid!", name)),
                    CancelReason::OutOfResource => {
                        Some(format!("{} has no strength left for that!", name))
                    }
                    CancelReason::Flinched => {
                        Some(format!("{} flinched and couldn't move!", name))
                    }
                    CancelReason::ActionDisabled => Some(format!("{}'s move is disabled!", name)),
                    CancelReason::FullyParalyzed => {
                        Some(format!("{} is paralyzed! It can't move!", name))
                    }
                    CancelReason::ConfusionSelfHit => {
                        Some(format!("{} hurt itself in its confusion!", name))
                    }
                    CancelReason::Infatuated => {
                        Some(format!("{} is immobilized by love!", name))
                    }
                    CancelReason::Trapped => Some(format!("{} can't escape!", name)),
                    // Silent cancellations: the omission itself is the signal.
                    CancelReason::UnknownAction
                    | CancelReason::MustRepeatOther
                    | CancelReason::Interrupted
                    | CancelReason::HealingBlocked
                    | CancelReason::Silenced
                    | CancelReason::GravityBound
                    | CancelReason::Taunted
                    | CancelReason::Imprisoned
                    | CancelReason::CounterTargetGone
                    | CancelReason::UserNotActive
                    | CancelReason::SkippedByPartner => None,
                }
            }
            BattleEvent::ActionFailed { reason, .. } => match reason {
                FailureReason::ActionSpecific(message) => Some(message.clone()),
                FailureReason::WeatherBlocked(weather) => {
                    Some(format!("The {} prevented the move!", weather))
                }
                FailureReason::TerrainBlocked(terrain) => {
                    Some(format!("The {} prevented the move!", terrain))
                }
                FailureReason::PriorityBlocked => Some("It was blocked!".to_string()),
                FailureReason::Generic => Some("But it failed!".to_string()),
            },
            BattleEvent::ChargingBegan { slot, .. } => {
                Some(format!("{} is gathering power!", name_at(*slot)))
            }
            BattleEvent::PowderIgnited { slot, .. } => {
                Some(format!("The powder on {} ignited!", name_at(*slot)))
            }
            BattleEvent::ElementAdapted { slot, .. } => {
                Some(format!("{} changed its type!", name_at(*slot)))
            }

            BattleEvent::DamageDealt { target, amount, .. } => {
                Some(format!("{} took {} damage!", name_at(*target), amount))
            }
            BattleEvent::Healed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", name_at(*target), amount))
            }
            BattleEvent::CombatantFainted { slot } => {
                Some(format!("{} fainted!", name_at(*slot)))
            }
            BattleEvent::SwitchedIn { slot, .. } => {
                Some(format!("{} was sent out!", name_at(*slot)))
            }
            BattleEvent::ItemUsed { slot, item } => Some(format!(
                "{} used its {}!",
                name_at(*slot),
                catalogs
                    .items
                    .get(*item)
                    .map(|spec| spec.name)
                    .unwrap_or("item")
            )),
            BattleEvent::StatusApplied { target, status } => Some(format!(
                "{} {}",
                name_at(*target),
                match status {
                    StatusAilment::Sleep { .. } => "fell asleep!",
                    StatusAilment::Freeze => "was frozen solid!",
                    StatusAilment::Paralysis => "is paralyzed!",
                    StatusAilment::Poison => "was poisoned!",
                    StatusAilment::Burn => "was burned!",
                }
            )),
            BattleEvent::StatusCleared { target, status } => Some(format!(
                "{} {}",
                name_at(*target),
                match status {
                    StatusAilment::Sleep { .. } => "woke up!",
                    StatusAilment::Freeze => "thawed out!",
                    StatusAilment::Paralysis => "is no longer paralyzed.",
                    StatusAilment::Poison => "was cured of its poison.",
                    StatusAilment::Burn => "'s burn healed.",
                }
            )),
            BattleEvent::MarkerApplied { .. } => None,
            BattleEvent::MarkerExpired { target, marker } => {
                Some(format!("{}'s {:?} wore off.", name_at(*target), marker))
            }

            BattleEvent::WeatherDamage { target, weather, damage } => Some(format!(
                "{} is buffeted by the {}! ({} damage)",
                name_at(*target),
                weather,
                damage
            )),
            BattleEvent::WeatherEnded { weather } => Some(format!("The {} subsided.", weather)),
            BattleEvent::StatusDamage { target, status, damage } => Some(format!(
                "{} is hurt by its {}! ({} damage)",
                name_at(*target),
                match status {
                    StatusAilment::Poison => "poison",
                    StatusAilment::Burn => "burn",
                    _ => "condition",
                },
                damage
            )),
            BattleEvent::TrapDamage { target, damage } => Some(format!(
                "{} is hurt by the trap! ({} damage)",
                name_at(*target),
                damage
            )),
            BattleEvent::TerrainHeal { target, amount, .. } => Some(format!(
                "{} was healed by the terrain! (+{} HP)",
                name_at(*target),
                amount
            )),
            BattleEvent::TerrainEnded { terrain } => {
                Some(format!("The {} faded away.", terrain))
            }

            BattleEvent::FledSuccessfully { slot } => {
                Some(format!("{} got away safely!", name_at(*slot)))
            }
            BattleEvent::EscapeFailed { slot, .. } => {
                Some(format!("{} couldn't get away!", name_at(*slot)))
            }

            BattleEvent::SideDefeated { side } => Some(format!(
                "The {} side is out of usable combatants!",
                match side {
                    Side::Ally => "ally",
                    Side::Foe => "opposing",
                }
            )),
            BattleEvent::ReplacementsRequired { .. } => None,
            BattleEvent::EncounterEnded { outcome } => Some(match outcome {
                EncounterOutcome::AllyVictory => "The battle is won!".to_string(),
                EncounterOutcome::FoeVictory => "The battle is lost...".to_string(),
                EncounterOutcome::Draw => "The battle ended in a draw.".to_string(),
                EncounterOutcome::Fled => "The encounter is over.".to_string(),
            }),
        }
    }
}

/// Ordered log of everything that happened during resolution. Tasks push
/// events as they run; the presentation layer consumes them afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Print all events in debug format with indentation.
    pub fn print_debug(&self) {
        for event in &self.events {
            println!("  {:?}", event);
        }
    }

    /// Print all events using their formatted text, falling back to debug
    /// format for silent events.
    pub fn print_formatted(&self, ctx: &BattleContext, catalogs: &Catalogs) {
        for event in &self.events {
            match event.format(ctx, catalogs) {
                Some(formatted) => println!("  {}", formatted),
                None => println!("  {:?} (silent)", event),
            }
        }
    }
}

impl std::fmt::Display for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}
