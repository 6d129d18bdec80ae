use crate::actions::RedirectBypass;
use crate::battle::commands::{QueuedAction, TargetRef};
use crate::battle::conditions::{ConditionMarker, MarkerKind};
use crate::battle::state::BattleContext;
use crate::field::FieldSlot;
use crate::hooks::{is_powder_immune, report_fault, trait_specs, Catalogs, HookKind, ValueHolder};

/// Where a redirection came from, for bypass decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RedirectSource {
    None,
    Marker,
    Trait,
}

/// Resolve an action's written target references into concrete slots.
/// Returns None when a "retaliate against my last attacker" placeholder has
/// nobody to point at; the caller cancels the action without cost.
pub fn resolve_targets(
    ctx: &BattleContext,
    catalogs: &Catalogs,
    action: &QueuedAction,
) -> Option<Vec<FieldSlot>> {
    let mut targets = Vec::with_capacity(action.targets.len());
    for target in &action.targets {
        match target {
            TargetRef::Slot(slot) => targets.push(*slot),
            TargetRef::LastAttacker => {
                let attacker = ctx.combatant(action.user)?.last_attacker?;
                if !ctx.is_alive(attacker) {
                    return None;
                }
                targets.push(attacker);
            }
        }
    }

    // Redirection only ever rewrites single-target actions.
    if targets.len() == 1 {
        targets[0] = apply_redirection(ctx, catalogs, action, targets[0]);
    }
    Some(targets)
}

/// One redirection pass. Decoy markers outrank redirect traits; bypass
/// flags and a block-redirect trait on the user restore the original.
/// Running the pass twice lands on the same slot as running it once.
fn apply_redirection(
    ctx: &BattleContext,
    catalogs: &Catalogs,
    action: &QueuedAction,
    original: FieldSlot,
) -> FieldSlot {
    let mut target = original;
    let mut source = RedirectSource::None;

    // Center-of-attention markers, in field order; the first one wins. A
    // powder-based decoy cannot draw a powder-immune user.
    for slot in ctx.active_slots() {
        if slot == action.user {
            continue;
        }
        if let Some(ConditionMarker::CenterOfAttention { powder_based }) = ctx
            .combatant(slot)
            .and_then(|c| c.markers.get(MarkerKind::CenterOfAttention))
        {
            if *powder_based && is_powder_immune(ctx, catalogs, action.user) {
                continue;
            }
            target = slot;
            source = RedirectSource::Marker;
            break;
        }
    }

    // Redirect trait hooks run only when no decoy claimed the action.
    if source == RedirectSource::None {
        for slot in ctx.active_slots() {
            if slot == action.user {
                continue;
            }
            for spec in trait_specs(ctx, catalogs, slot) {
                let Some(hook) = spec.redirect else { continue };
                let mut holder = ValueHolder::new(target);
                match hook(ctx, slot, action.user, action.action, &mut holder) {
                    Ok(()) => {
                        if holder.value != target {
                            target = holder.value;
                            source = RedirectSource::Trait;
                        }
                    }
                    Err(fault) => report_fault(HookKind::Redirect, slot, &fault),
                }
            }
        }
    }

    if source == RedirectSource::None {
        return original;
    }

    // The user's own block-redirect trait restores the original outright.
    if trait_specs(ctx, catalogs, action.user)
        .iter()
        .any(|spec| spec.blocks_redirect)
    {
        return original;
    }

    match catalogs
        .actions
        .get(action.action)
        .map(|spec| spec.bypass_redirect)
        .unwrap_or(RedirectBypass::No)
    {
        RedirectBypass::Always => original,
        RedirectBypass::TraitRedirectsOnly if source == RedirectSource::Trait => original,
        _ => target,
    }
}
