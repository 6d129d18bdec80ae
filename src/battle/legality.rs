//! The action legality cascade: a strictly ordered, short-circuiting
//! sequence of checks run once per queued action. Stage A runs before the
//! announcement and cancels for free; Stages B and C run after the cost is
//! paid and withhold the effect instead.

use crate::actions::ActionSpec;
use crate::battle::commands::{InvocationMode, QueuedAction};
use crate::battle::conditions::{ConditionMarker, MarkerKind};
use crate::battle::events::{BattleEvent, CancelReason, FailureReason};
use crate::battle::rng::TurnRng;
use crate::battle::state::BattleContext;
use crate::combatant::StatusAilment;
use crate::field::FieldSlot;
use crate::hooks::{
    is_powder_immune, report_fault, trait_specs, Catalogs, HookKind, ValueHolder,
};

const FREEZE_THAW_CHANCE: u8 = 25;
const FULL_PARALYSIS_CHANCE: u8 = 25;
const CONFUSION_SELF_HIT_CHANCE: u8 = 50;
const INFATUATION_IMMOBILIZE_CHANCE: u8 = 50;

/// Pre-announcement checks. A hit here withdraws the action with no cost
/// paid; the first triggered check wins and the rest never run. Indirectly
/// invoked actions only run the reduced subset (heal-block, silence,
/// gravity), since whatever invoked them already passed the full gauntlet.
pub fn stage_a(
    ctx: &mut BattleContext,
    catalogs: &Catalogs,
    action: &QueuedAction,
    targets: &[FieldSlot],
    rng: &mut TurnRng,
    bus: &mut crate::battle::events::EventBus,
) -> Option<CancelReason> {
    let user = action.user;
    if !ctx.is_alive(user) {
        return Some(CancelReason::UserNotActive);
    }

    if action.mode == InvocationMode::Direct {
        // Sleep and freeze come before the resource check so a sleeping
        // combatant never wastes the action's cost.
        match ctx.combatant(user).and_then(|c| c.status) {
            Some(StatusAilment::Sleep { turns_remaining }) => {
                if turns_remaining > 1 {
                    let c = ctx.combatant_mut(user).expect("checked alive above");
                    c.status = Some(StatusAilment::Sleep {
                        turns_remaining: turns_remaining - 1,
                    });
                    return Some(CancelReason::Asleep);
                }
                let c = ctx.combatant_mut(user).expect("checked alive above");
                c.status = None;
                bus.push(BattleEvent::StatusCleared {
                    target: user,
                    status: StatusAilment::Sleep { turns_remaining: 0 },
                });
            }
            Some(StatusAilment::Freeze) => {
                if rng.next_outcome("freeze thaw check") <= FREEZE_THAW_CHANCE {
                    let c = ctx.combatant_mut(user).expect("checked alive above");
                    c.status = None;
                    bus.push(BattleEvent::StatusCleared {
                        target: user,
                        status: StatusAilment::Freeze,
                    });
                } else {
                    return Some(CancelReason::Frozen);
                }
            }
            _ => {}
        }

        let combatant = ctx.combatant(user).expect("checked alive above");
        if let Some(instance) = combatant.action_instance(action.action) {
            if instance.pp == 0 {
                return Some(CancelReason::OutOfResource);
            }
        }
        if catalogs.actions.get(action.action).is_none() {
            return Some(CancelReason::UnknownAction);
        }
        if let Some(ConditionMarker::MustRepeat { action: forced, .. }) =
            combatant.markers.get(MarkerKind::MustRepeat)
        {
            if *forced != action.action {
                return Some(CancelReason::MustRepeatOther);
            }
        }

        let spec = catalogs.actions.get(action.action).expect("checked above");
        if let Some(interrupt) = spec.pre_use_interrupt {
            match interrupt(ctx, user, targets) {
                Ok(true) => return Some(CancelReason::Interrupted),
                Ok(false) => {}
                Err(fault) => report_fault(HookKind::PreUseInterrupt, user, &fault),
            }
        }
        if pre_legality_veto(ctx, catalogs, action) {
            return Some(CancelReason::Interrupted);
        }

        let combatant = ctx.combatant(user).expect("checked alive above");
        if combatant.has_marker(MarkerKind::Flinched) {
            return Some(CancelReason::Flinched);
        }
        if let Some(ConditionMarker::Disabled { action: disabled, .. }) =
            combatant.markers.get(MarkerKind::Disabled)
        {
            if *disabled == action.action {
                return Some(CancelReason::ActionDisabled);
            }
        }
    }

    let spec = catalogs.actions.get(action.action)?;
    let combatant = ctx.combatant(user)?;
    if combatant.has_marker(MarkerKind::HealBlocked) && spec.healing {
        return Some(CancelReason::HealingBlocked);
    }
    if combatant.has_marker(MarkerKind::Silenced) && spec.sound_based {
        return Some(CancelReason::Silenced);
    }
    if ctx.field.gravity_intensified() && spec.gravity_bound {
        return Some(CancelReason::GravityBound);
    }

    if action.mode == InvocationMode::Indirect {
        return None;
    }

    let combatant = ctx.combatant(user)?;
    if combatant.has_marker(MarkerKind::Taunted) && !spec.damaging {
        return Some(CancelReason::Taunted);
    }
    if let Some(ConditionMarker::Imprisoned { blocked }) =
        combatant.markers.get(MarkerKind::Imprisoned)
    {
        if blocked.contains(&action.action) {
            return Some(CancelReason::Imprisoned);
        }
    }

    if combatant.has_marker(MarkerKind::Confused)
        && rng.next_outcome("confusion self hit check") <= CONFUSION_SELF_HIT_CHANCE
    {
        confusion_self_hit(ctx, user, bus);
        return Some(CancelReason::ConfusionSelfHit);
    }

    let combatant = ctx.combatant(user)?;
    if matches!(combatant.status, Some(StatusAilment::Paralysis))
        && rng.next_outcome("full paralysis check") <= FULL_PARALYSIS_CHANCE
    {
        return Some(CancelReason::FullyParalyzed);
    }

    if let Some(ConditionMarker::Infatuated { source }) = ctx
        .combatant(user)
        .and_then(|c| c.markers.get(MarkerKind::Infatuated))
        .cloned()
    {
        if ctx.is_alive(source)
            && rng.next_outcome("infatuation immobilize check") <= INFATUATION_IMMOBILIZE_CHANCE
        {
            return Some(CancelReason::Infatuated);
        }
    }

    None
}

/// Any active combatant's pre-legality trait hook may veto the action.
fn pre_legality_veto(ctx: &BattleContext, catalogs: &Catalogs, action: &QueuedAction) -> bool {
    for slot in ctx.active_slots() {
        for spec in trait_specs(ctx, catalogs, slot) {
            let Some(hook) = spec.pre_legality else { continue };
            let mut cancel = ValueHolder::new(false);
            match hook(ctx, slot, action.user, action.action, &mut cancel) {
                Ok(()) => {
                    if cancel.value {
                        return true;
                    }
                }
                Err(fault) => report_fault(HookKind::PreLegalityVeto, slot, &fault),
            }
        }
    }
    false
}

/// Self-inflicted confusion hit: typeless, unmodified eighth of max health.
fn confusion_self_hit(
    ctx: &mut BattleContext,
    user: FieldSlot,
    bus: &mut crate::battle::events::EventBus,
) {
    let Some(combatant) = ctx.combatant_mut(user) else {
        return;
    };
    let damage = (combatant.max_hp / 8).max(1);
    let fainted = combatant.take_damage(damage);
    let remaining_hp = combatant.current_hp();
    bus.push(BattleEvent::DamageDealt {
        target: user,
        amount: damage,
        remaining_hp,
    });
    if fainted {
        bus.push(BattleEvent::CombatantFainted { slot: user });
    }
}

/// Post-announcement, pre-effect checks. The powder check is deliberately
/// trailing: it still detonates after an earlier Stage-B veto, since its
/// damage and message do not depend on the rest of the action.
pub fn stage_b(
    ctx: &mut BattleContext,
    catalogs: &Catalogs,
    action: &QueuedAction,
    targets: &[FieldSlot],
    bus: &mut crate::battle::events::EventBus,
) -> Option<FailureReason> {
    let spec = catalogs.actions.get(action.action)?;
    let mut failure: Option<FailureReason> = None;

    if let Some(gate) = spec.condition_post_announce {
        match gate(ctx, action.user, targets) {
            Ok(true) => {}
            Ok(false) => failure = Some(specific_or_generic(spec)),
            Err(fault) => report_fault(HookKind::ActionCondition, action.user, &fault),
        }
    }

    if failure.is_none() {
        if let (Some(blocked), Some(weather)) = (spec.weather_blocked, ctx.field.weather_kind()) {
            if blocked(weather) {
                failure = Some(match &spec.failure_message {
                    Some(message) => FailureReason::ActionSpecific((*message).to_string()),
                    None => FailureReason::WeatherBlocked(weather),
                });
            }
        }
    }

    // Trailing powder self-combustion, always last.
    if spec.ignites_powder
        && ctx
            .combatant(action.user)
            .is_some_and(|c| c.has_marker(MarkerKind::PowderCoated))
        && !is_powder_immune(ctx, catalogs, action.user)
    {
        let user = action.user;
        if let Some(combatant) = ctx.combatant_mut(user) {
            combatant.markers.remove(MarkerKind::PowderCoated);
            let damage = (combatant.max_hp / 4).max(1);
            let fainted = combatant.take_damage(damage);
            let remaining_hp = combatant.current_hp();
            bus.push(BattleEvent::PowderIgnited { slot: user, damage });
            bus.push(BattleEvent::DamageDealt {
                target: user,
                amount: damage,
                remaining_hp,
            });
            if fainted {
                bus.push(BattleEvent::CombatantFainted { slot: user });
            }
        }
        failure.get_or_insert(FailureReason::Generic);
    }

    failure
}

/// Final checks immediately before the effect applies: the remaining
/// per-action condition, the terrain veto, and defensive priority-immunity
/// traits on the targets' side.
pub fn stage_c(
    ctx: &BattleContext,
    catalogs: &Catalogs,
    action: &QueuedAction,
    targets: &[FieldSlot],
) -> Option<FailureReason> {
    let spec = catalogs.actions.get(action.action)?;

    if let Some(gate) = spec.condition_pre_effect {
        match gate(ctx, action.user, targets) {
            Ok(true) => {}
            Ok(false) => return Some(specific_or_generic(spec)),
            Err(fault) => report_fault(HookKind::ActionCondition, action.user, &fault),
        }
    }

    if let (Some(blocked), Some(terrain)) = (spec.terrain_blocked, ctx.field.terrain_kind()) {
        if blocked(terrain) {
            return Some(match &spec.failure_message {
                Some(message) => FailureReason::ActionSpecific((*message).to_string()),
                None => FailureReason::TerrainBlocked(terrain),
            });
        }
    }

    if spec.priority > 0 {
        for slot in targets {
            if !ctx.is_alive(*slot) || slot.side == action.user.side {
                continue;
            }
            for trait_spec in trait_specs(ctx, catalogs, *slot) {
                let Some(hook) = trait_spec.priority_immunity else {
                    continue;
                };
                let mut block = ValueHolder::new(false);
                match hook(ctx, *slot, action.user, action.action, &mut block) {
                    Ok(()) => {
                        if block.value {
                            return Some(FailureReason::PriorityBlocked);
                        }
                    }
                    Err(fault) => report_fault(HookKind::PriorityImmunity, *slot, &fault),
                }
            }
        }
    }

    None
}

/// Rewrite the user's element to its action's element if it carries an
/// adaptation trait. Documented to trigger on attempted use, so the
/// executor calls this on Stage-C failure as well as on success.
pub fn apply_element_adaptation(
    ctx: &mut BattleContext,
    catalogs: &Catalogs,
    action: &QueuedAction,
    bus: &mut crate::battle::events::EventBus,
) {
    let Some(spec) = catalogs.actions.get(action.action) else {
        return;
    };
    let adapts = trait_specs(ctx, catalogs, action.user)
        .iter()
        .any(|t| t.adapts_element);
    if !adapts {
        return;
    }
    let element = spec.element;
    if let Some(combatant) = ctx.combatant_mut(action.user) {
        if combatant.element != element {
            combatant.element = element;
            bus.push(BattleEvent::ElementAdapted {
                slot: action.user,
                element,
            });
        }
    }
}

fn specific_or_generic(spec: &ActionSpec) -> FailureReason {
    match &spec.failure_message {
        Some(message) => FailureReason::ActionSpecific((*message).to_string()),
        None => FailureReason::Generic,
    }
}
