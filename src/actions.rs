use crate::battle::state::{TerrainKind, WeatherKind};
use crate::hooks::{ActionGate, EffectHook, PreUseInterrupt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque identifier for an action registered with the catalog. The engine
/// never interprets the value; content assigns them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(pub u16);

/// Opaque element tag. Same-type-adaptation traits rewrite a combatant's
/// element to its action's element; the engine compares tags, nothing more.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Element(pub u8);

/// How an action interacts with redirection effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectBypass {
    /// Redirection applies normally.
    No,
    /// The original target is always restored.
    Always,
    /// The original target is restored only when a trait (not a decoy
    /// marker) caused the redirection.
    TraitRedirectsOnly,
}

/// Everything the turn engine needs to know about an action. The actual
/// gameplay effect lives behind `effect`; the catalog is the plugin boundary
/// and this crate ships no content.
pub struct ActionSpec {
    pub name: &'static str,
    /// Priority bracket. Higher brackets act first within the move phase.
    pub priority: i8,
    /// Whether the action deals damage (taunt blocks non-damaging actions).
    pub damaging: bool,
    /// Whether the action restores health (blocked by heal-block markers).
    pub healing: bool,
    /// Whether the action is sound-based (blocked by silence markers).
    pub sound_based: bool,
    /// Whether the action is unusable while gravity is intensified.
    pub gravity_bound: bool,
    /// Charge-type actions spend a turn charging and release on the next.
    pub charge_up: bool,
    /// Whether a powder coating detonates when this action is attempted.
    pub ignites_powder: bool,
    pub bypass_redirect: RedirectBypass,
    pub element: Element,
    /// Weather-based veto, checked after announcement.
    pub weather_blocked: Option<fn(WeatherKind) -> bool>,
    /// Terrain-based veto, checked immediately before the effect.
    pub terrain_blocked: Option<fn(TerrainKind) -> bool>,
    /// Pre-announcement interrupt (loss-of-focus style effects).
    pub pre_use_interrupt: Option<PreUseInterrupt>,
    /// Custom condition checked right after announcement (Stage B).
    pub condition_post_announce: Option<ActionGate>,
    /// Custom condition checked immediately before the effect (Stage C).
    pub condition_pre_effect: Option<ActionGate>,
    /// Action-specific failure text; takes precedence over terrain/weather
    /// messages and the generic fallback.
    pub failure_message: Option<&'static str>,
    pub effect: Option<EffectHook>,
}

impl ActionSpec {
    pub fn new(name: &'static str) -> ActionSpec {
        ActionSpec {
            name,
            priority: 0,
            damaging: true,
            healing: false,
            sound_based: false,
            gravity_bound: false,
            charge_up: false,
            ignites_powder: false,
            bypass_redirect: RedirectBypass::No,
            element: Element::default(),
            weather_blocked: None,
            terrain_blocked: None,
            pre_use_interrupt: None,
            condition_post_announce: None,
            condition_pre_effect: None,
            failure_message: None,
            effect: None,
        }
    }
}

#[derive(Default)]
pub struct ActionCatalog {
    specs: HashMap<ActionId, ActionSpec>,
}

impl ActionCatalog {
    pub fn new() -> ActionCatalog {
        ActionCatalog::default()
    }

    pub fn register(&mut self, id: ActionId, spec: ActionSpec) {
        self.specs.insert(id, spec);
    }

    pub fn get(&self, id: ActionId) -> Option<&ActionSpec> {
        self.specs.get(&id)
    }

    pub fn name_of(&self, id: ActionId) -> &'static str {
        self.get(id).map(|spec| spec.name).unwrap_or("unknown action")
    }
}
