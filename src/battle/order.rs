use crate::battle::commands::{CommandKind, TurnCommand};
use crate::battle::rng::TurnRng;
use crate::battle::state::BattleContext;
use crate::battle::stats::effective_speed;
use crate::field::FieldSlot;
use crate::hooks::{report_fault, trait_specs, Catalogs, HookKind};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug)]
struct OrderEntry {
    slot: FieldSlot,
    is_action: bool,
    priority: i8,
    bypass: bool,
    speed: u32,
}

/// Compute the order in which active slots act this turn.
///
/// The sequence of concerns, outermost first: non-action commands (switch,
/// flee, use-item) precede action commands outright; action commands sort by
/// priority bracket; within one bracket a speed-bypass effect wins; then
/// effective speed decides, flipped while priority is reversed; whatever
/// still ties keeps the order of the seeded shuffle, so replays break ties
/// identically.
pub fn resolve_turn_order(
    ctx: &BattleContext,
    catalogs: &Catalogs,
    commands: &HashMap<FieldSlot, TurnCommand>,
    rng: &mut TurnRng,
) -> Vec<FieldSlot> {
    let mut slots = ctx.active_slots();
    rng.shuffle(&mut slots, "turn order tie break");

    let reversed = ctx.field.priority_reversed();

    // Bypass rolls consume randomness in canonical field order, independent
    // of the shuffle, so the draw sequence is stable across replays.
    let mut bypass: HashMap<FieldSlot, bool> = HashMap::new();
    for slot in FieldSlot::all() {
        if !slots.contains(&slot) {
            continue;
        }
        let uses_action = commands
            .get(&slot)
            .is_some_and(|c| c.kind.is_use_action() && !c.skip);
        if uses_action {
            bypass.insert(slot, rolls_speed_bypass(ctx, catalogs, slot, rng));
        }
    }

    let mut entries: Vec<OrderEntry> = slots
        .into_iter()
        .map(|slot| {
            let command = commands.get(&slot).filter(|c| !c.skip);
            let (is_action, priority) = match command.map(|c| &c.kind) {
                Some(CommandKind::UseAction { action, .. }) => {
                    let bracket = catalogs.actions.get(*action).map(|s| s.priority).unwrap_or(0);
                    (true, bracket)
                }
                _ => (false, 0),
            };
            let speed = ctx.combatant(slot).map(effective_speed).unwrap_or(0);
            OrderEntry {
                slot,
                is_action,
                priority,
                bypass: bypass.get(&slot).copied().unwrap_or(false),
                speed,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        // Non-action commands always act first.
        let category = a.is_action.cmp(&b.is_action);
        if category != Ordering::Equal {
            return category;
        }
        if a.is_action {
            let bracket = b.priority.cmp(&a.priority);
            if bracket != Ordering::Equal {
                return bracket;
            }
            // A bypass only jumps same-bracket peers.
            let bypass = b.bypass.cmp(&a.bypass);
            if bypass != Ordering::Equal {
                return bypass;
            }
        }
        if reversed {
            a.speed.cmp(&b.speed)
        } else {
            b.speed.cmp(&a.speed)
        }
        // Equal keeps the shuffled order; the sort is stable.
    });

    entries.into_iter().map(|e| e.slot).collect()
}

/// Whether a slot's trait or held item grants it first strike within its
/// bracket this turn.
fn rolls_speed_bypass(
    ctx: &BattleContext,
    catalogs: &Catalogs,
    slot: FieldSlot,
    rng: &mut TurnRng,
) -> bool {
    for spec in trait_specs(ctx, catalogs, slot) {
        if let Some(hook) = spec.speed_bypass {
            match hook(ctx, slot, rng) {
                Ok(true) => return true,
                Ok(false) => {}
                Err(fault) => report_fault(HookKind::SpeedBypass, slot, &fault),
            }
        }
    }
    let item = ctx.combatant(slot).and_then(|c| c.held_item);
    if let Some(item) = item {
        if let Some(chance) = catalogs.items.get(item).and_then(|spec| spec.speed_bypass_chance) {
            return rng.next_outcome("held item speed bypass") <= chance;
        }
    }
    false
}
