//! The plugin boundary: move/trait/item catalogs register plain-function
//! hooks keyed by extension point, and the engine rebuilds the applicable
//! hook list at every invocation site instead of dispatching virtually.

use crate::actions::{ActionCatalog, ActionId};
use crate::battle::events::{BattleEvent, EventBus};
use crate::battle::rng::TurnRng;
use crate::battle::scheduler::TaskSink;
use crate::battle::state::{BattleContext, WeatherKind};
use crate::combatant::StatusAilment;
use crate::field::FieldSlot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraitId(pub u16);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub u16);

/// Extension points a trait or item may plug into. Used for fault reporting
/// and for rebuilding hook lists per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    PreLegalityVeto,
    PreUseInterrupt,
    Redirect,
    SpeedBypass,
    PriorityImmunity,
    PostTurn,
    PreWeatherDamage,
    EscapeChance,
    OnActionEffect,
    ActionCondition,
    ItemUse,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::PreLegalityVeto => "pre-legality-veto",
            HookKind::PreUseInterrupt => "pre-use-interrupt",
            HookKind::Redirect => "redirect",
            HookKind::SpeedBypass => "speed-bypass",
            HookKind::PriorityImmunity => "priority-immunity",
            HookKind::PostTurn => "post-turn",
            HookKind::PreWeatherDamage => "pre-weather-damage",
            HookKind::EscapeChance => "escape-chance",
            HookKind::OnActionEffect => "on-action-effect",
            HookKind::ActionCondition => "action-condition",
            HookKind::ItemUse => "item-use",
        };
        write!(f, "{}", name)
    }
}

/// Non-fatal fault raised by a hook. The offending hook is treated as a
/// no-op; the turn keeps draining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFault {
    pub message: String,
}

impl HookFault {
    pub fn new(message: impl Into<String>) -> HookFault {
        HookFault {
            message: message.into(),
        }
    }
}

impl fmt::Display for HookFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook fault: {}", self.message)
    }
}

impl std::error::Error for HookFault {}

pub type HookResult = Result<(), HookFault>;

/// Mutable cancel/value holder handed to hooks, mirroring the holder types
/// the hook authors expect at every extension point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueHolder<T> {
    pub value: T,
}

impl<T> ValueHolder<T> {
    pub fn new(value: T) -> ValueHolder<T> {
        ValueHolder { value }
    }
}

// --- Hook signatures, one per extension point ---

pub type RedirectHook = fn(
    ctx: &BattleContext,
    owner: FieldSlot,
    user: FieldSlot,
    action: ActionId,
    target: &mut ValueHolder<FieldSlot>,
) -> HookResult;

pub type SpeedBypassHook =
    fn(ctx: &BattleContext, owner: FieldSlot, rng: &mut TurnRng) -> Result<bool, HookFault>;

pub type PreLegalityHook = fn(
    ctx: &BattleContext,
    owner: FieldSlot,
    user: FieldSlot,
    action: ActionId,
    cancel: &mut ValueHolder<bool>,
) -> HookResult;

pub type PriorityImmunityHook = fn(
    ctx: &BattleContext,
    owner: FieldSlot,
    user: FieldSlot,
    action: ActionId,
    block: &mut ValueHolder<bool>,
) -> HookResult;

pub type PostTurnHook = fn(env: &mut EffectEnv<'_>, owner: FieldSlot) -> HookResult;

pub type PreWeatherDamageHook = fn(
    ctx: &BattleContext,
    owner: FieldSlot,
    weather: WeatherKind,
    cancel: &mut ValueHolder<bool>,
) -> HookResult;

pub type EscapeChanceHook =
    fn(ctx: &BattleContext, owner: FieldSlot, chance: &mut ValueHolder<u8>) -> HookResult;

pub type ItemUseHook = fn(env: &mut EffectEnv<'_>, user: FieldSlot) -> HookResult;

pub type EffectHook =
    fn(env: &mut EffectEnv<'_>, user: FieldSlot, targets: &[FieldSlot]) -> HookResult;

/// Per-action legality condition. `Ok(true)` lets the action proceed.
pub type ActionGate =
    fn(ctx: &BattleContext, user: FieldSlot, targets: &[FieldSlot]) -> Result<bool, HookFault>;

/// Pre-announcement interrupt. `Ok(true)` cancels the action.
pub type PreUseInterrupt =
    fn(ctx: &BattleContext, user: FieldSlot, targets: &[FieldSlot]) -> Result<bool, HookFault>;

/// An innate trait's contribution to the engine's extension points.
pub struct TraitSpec {
    pub name: &'static str,
    pub redirect: Option<RedirectHook>,
    /// Restores the original target of the owner's actions unconditionally.
    pub blocks_redirect: bool,
    /// Powder-flagged decoy markers do not draw this owner's actions, and
    /// powder coatings never detonate on it.
    pub grants_powder_immunity: bool,
    /// Rewrites the owner's element to its action's element on attempted use.
    pub adapts_element: bool,
    pub speed_bypass: Option<SpeedBypassHook>,
    pub pre_legality: Option<PreLegalityHook>,
    pub priority_immunity: Option<PriorityImmunityHook>,
    pub post_turn: Option<PostTurnHook>,
    pub pre_weather_damage: Option<PreWeatherDamageHook>,
    pub escape_chance: Option<EscapeChanceHook>,
}

impl TraitSpec {
    pub fn new(name: &'static str) -> TraitSpec {
        TraitSpec {
            name,
            redirect: None,
            blocks_redirect: false,
            grants_powder_immunity: false,
            adapts_element: false,
            speed_bypass: None,
            pre_legality: None,
            priority_immunity: None,
            post_turn: None,
            pre_weather_damage: None,
            escape_chance: None,
        }
    }
}

/// A held item's contribution. Items are cleared from fleeing opponents and
/// may be consumed by their own hooks.
pub struct ItemSpec {
    pub name: &'static str,
    /// Percent chance to act first within the owner's priority bracket.
    pub speed_bypass_chance: Option<u8>,
    pub on_use: Option<ItemUseHook>,
    pub end_of_turn: Option<PostTurnHook>,
}

impl ItemSpec {
    pub fn new(name: &'static str) -> ItemSpec {
        ItemSpec {
            name,
            speed_bypass_chance: None,
            on_use: None,
            end_of_turn: None,
        }
    }
}

#[derive(Default)]
pub struct TraitCatalog {
    specs: HashMap<TraitId, TraitSpec>,
}

impl TraitCatalog {
    pub fn register(&mut self, id: TraitId, spec: TraitSpec) {
        self.specs.insert(id, spec);
    }

    pub fn get(&self, id: TraitId) -> Option<&TraitSpec> {
        self.specs.get(&id)
    }
}

#[derive(Default)]
pub struct ItemCatalog {
    specs: HashMap<ItemId, ItemSpec>,
}

impl ItemCatalog {
    pub fn register(&mut self, id: ItemId, spec: ItemSpec) {
        self.specs.insert(id, spec);
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemSpec> {
        self.specs.get(&id)
    }
}

/// Content registries handed into turn resolution by reference. Game state
/// never owns these; they carry function pointers and are not serialized.
#[derive(Default)]
pub struct Catalogs {
    pub actions: ActionCatalog,
    pub traits: TraitCatalog,
    pub items: ItemCatalog,
}

/// Rebuild the list of trait specs a combatant currently exposes. Hook
/// invocation points call this rather than caching dispatch tables, so a
/// combatant that left the field stops contributing immediately.
pub fn trait_specs<'c>(
    ctx: &BattleContext,
    catalogs: &'c Catalogs,
    slot: FieldSlot,
) -> Vec<&'c TraitSpec> {
    let Some(combatant) = ctx.combatant(slot) else {
        return Vec::new();
    };
    combatant
        .traits
        .iter()
        .filter_map(|id| {
            let spec = catalogs.traits.get(*id);
            if spec.is_none() {
                tracing::debug!(trait_id = id.0, %slot, "unregistered trait id ignored");
            }
            spec
        })
        .collect()
}

pub fn is_powder_immune(ctx: &BattleContext, catalogs: &Catalogs, slot: FieldSlot) -> bool {
    trait_specs(ctx, catalogs, slot)
        .iter()
        .any(|spec| spec.grants_powder_immunity)
}

/// Log a faulting hook and move on. Faults never abort the turn.
pub fn report_fault(kind: HookKind, owner: FieldSlot, fault: &HookFault) {
    tracing::warn!(hook = %kind, %owner, "{}", fault);
}

/// Mutable view handed to effect hooks. Hooks may schedule follow-up tasks
/// through `tasks` but can never drain the queue themselves.
pub struct EffectEnv<'a> {
    pub ctx: &'a mut BattleContext,
    pub rng: &'a mut TurnRng,
    pub bus: &'a mut EventBus,
    pub tasks: TaskSink<'a>,
}

impl EffectEnv<'_> {
    /// Deal damage to the occupant of `target`, recording `source` as its
    /// last attacker for counter-retargeting.
    pub fn deal_damage(&mut self, source: Option<FieldSlot>, target: FieldSlot, amount: u16) {
        let Some(combatant) = self.ctx.combatant_mut(target) else {
            return;
        };
        let dealt = amount.min(combatant.current_hp());
        let fainted = combatant.take_damage(amount);
        if let Some(src) = source {
            if src != target {
                combatant.last_attacker = Some(src);
            }
        }
        let remaining_hp = combatant.current_hp();
        self.bus.push(BattleEvent::DamageDealt {
            target,
            amount: dealt,
            remaining_hp,
        });
        if fainted {
            self.bus.push(BattleEvent::CombatantFainted { slot: target });
        }
    }

    pub fn heal(&mut self, target: FieldSlot, amount: u16) {
        let Some(combatant) = self.ctx.combatant_mut(target) else {
            return;
        };
        let healed = combatant.heal(amount);
        if healed > 0 {
            let new_hp = combatant.current_hp();
            self.bus.push(BattleEvent::Healed {
                target,
                amount: healed,
                new_hp,
            });
        }
    }

    /// Apply a major status ailment if the target has none.
    pub fn apply_status(&mut self, target: FieldSlot, status: StatusAilment) -> bool {
        let Some(combatant) = self.ctx.combatant_mut(target) else {
            return false;
        };
        if combatant.status.is_some() {
            return false;
        }
        combatant.status = Some(status);
        self.bus.push(BattleEvent::StatusApplied { target, status });
        true
    }

    pub fn apply_marker(&mut self, target: FieldSlot, marker: crate::battle::conditions::ConditionMarker) {
        let Some(combatant) = self.ctx.combatant_mut(target) else {
            return;
        };
        let kind = marker.kind();
        combatant.markers.insert(marker);
        self.bus.push(BattleEvent::MarkerApplied { target, marker: kind });
    }
}
