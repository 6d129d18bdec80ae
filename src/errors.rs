use crate::field::FieldSlot;
use std::fmt;

/// Main error type for the turn-resolution engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Error related to the submitted turn commands
    Command(CommandError),
    /// Error related to the encounter's lifecycle state
    Encounter(EncounterError),
    /// A headless resolve was asked to wait on a presentation that will
    /// never complete
    PresentationStalled,
}

/// Errors related to turn command validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A command names a slot with no living occupant
    VacantSlot(FieldSlot),
    /// Two commands were submitted for the same slot
    DuplicateSlot(FieldSlot),
    /// A switch names a roster index that does not exist
    InvalidRosterIndex(usize),
    /// A switch names a fainted roster member
    FaintedReplacement(usize),
    /// A switch names a member that is already on the field
    AlreadyOnField(usize),
}

/// Errors related to the encounter lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncounterError {
    /// The encounter has already ended
    EncounterOver,
    /// Replacements must be sent in before the next turn can run
    ReplacementsPending,
    /// A replacement was submitted for a side that does not need one
    NoReplacementDue(FieldSlot),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Command(err) => write!(f, "Command error: {}", err),
            EngineError::Encounter(err) => write!(f, "Encounter error: {}", err),
            EngineError::PresentationStalled => {
                write!(f, "Presentation stalled during a headless resolve")
            }
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::VacantSlot(slot) => write!(f, "No living combatant at {}", slot),
            CommandError::DuplicateSlot(slot) => {
                write!(f, "More than one command submitted for {}", slot)
            }
            CommandError::InvalidRosterIndex(index) => {
                write!(f, "Invalid roster index: {}", index)
            }
            CommandError::FaintedReplacement(index) => {
                write!(f, "Roster member {} has fainted", index)
            }
            CommandError::AlreadyOnField(index) => {
                write!(f, "Roster member {} is already on the field", index)
            }
        }
    }
}

impl fmt::Display for EncounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncounterError::EncounterOver => write!(f, "The encounter has already ended"),
            EncounterError::ReplacementsPending => {
                write!(f, "Replacements are pending; submit them before the next turn")
            }
            EncounterError::NoReplacementDue(slot) => {
                write!(f, "No replacement is due at {}", slot)
            }
        }
    }
}

impl std::error::Error for EngineError {}
impl std::error::Error for CommandError {}
impl std::error::Error for EncounterError {}

impl From<CommandError> for EngineError {
    fn from(err: CommandError) -> Self {
        EngineError::Command(err)
    }
}

impl From<EncounterError> for EngineError {
    fn from(err: EncounterError) -> Self {
        EngineError::Encounter(err)
    }
}

/// Type alias for Results using EngineError
pub type EngineResult<T> = Result<T, EngineError>;
