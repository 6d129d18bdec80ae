// In: src/lib.rs

//! Creature Combat Turn Engine
//!
//! A deterministic turn-resolution engine for creature battles: command
//! collection feeds a scheduled task queue that resolves ordering, action
//! legality, targeting, effects, and the end-of-turn pipeline, emitting an
//! ordered event log the presentation layer replays at its own pace.

// --- MODULE DECLARATIONS ---
// This declares the module hierarchy for the crate.
pub mod actions;
pub mod battle;
pub mod combatant;
pub mod errors;
pub mod field;
pub mod hooks;

// --- PUBLIC API RE-EXPORTS ---
// This section defines the public-facing API of the `creature-combat` crate,
// making it easy for users to import the most important types directly.

// Core battle engine entry points and state.
pub use battle::engine::{resolve_turn, submit_replacements, TurnRunner, TurnStatus};
pub use battle::state::{
    BattleContext, EncounterLayout, EncounterOutcome, EncounterStatus, FieldState, Roster,
    TerrainKind, TerrainState, WeatherKind, WeatherState,
};

// Commands going in and events coming out.
pub use battle::commands::{CommandKind, InvocationMode, QueuedAction, TargetRef, TurnCommand};
pub use battle::events::{BattleEvent, CancelReason, EventBus, FailureReason};

// Core runtime types for an encounter.
pub use battle::conditions::{ConditionMarker, ConditionSet, LapseTiming, MarkerKind};
pub use battle::rng::TurnRng;
pub use battle::scheduler::{
    CompletionHandle, CueKind, EffectCue, NullPresenter, Presenter, Task,
};
pub use combatant::{ActionInstance, Combatant, StatKind, Stats, StatusAilment, TurnRecord};
pub use field::{FieldSlot, Position, Side};

// Content registries and the hook surface.
pub use actions::{ActionCatalog, ActionId, ActionSpec, Element, RedirectBypass};
pub use hooks::{
    Catalogs, EffectEnv, HookFault, HookResult, ItemCatalog, ItemId, ItemSpec, TraitCatalog,
    TraitId, TraitSpec, ValueHolder,
};

// Crate-specific error and result types.
pub use errors::{CommandError, EncounterError, EngineError, EngineResult};
