use crate::battle::events::{BattleEvent, EventBus};
use crate::battle::rng::TurnRng;
use crate::battle::state::{BattleContext, EncounterOutcome, EncounterStatus};
use crate::battle::stats::side_speed_sum;
use crate::field::FieldSlot;
use crate::hooks::{report_fault, trait_specs, Catalogs, HookKind, ValueHolder};

const ESCAPE_BASE: f64 = 5.0;
const ESCAPE_SPEED_WEIGHT: f64 = 22.5;
const ESCAPE_ATTEMPT_WEIGHT: f64 = 10.0;
const ESCAPE_MIN: u8 = 5;
const ESCAPE_MAX: u8 = 95;

/// Percentage chance to disengage, linear in the speed ratio and the
/// attempt counter, clamped to [5, 95]. Monotone in both inputs.
pub fn escape_chance(speed_ratio: f64, attempts: u32) -> u8 {
    let raw = ESCAPE_BASE + ESCAPE_SPEED_WEIGHT * speed_ratio + ESCAPE_ATTEMPT_WEIGHT * attempts as f64;
    (raw.round() as i64).clamp(ESCAPE_MIN as i64, ESCAPE_MAX as i64) as u8
}

/// The chance for a specific slot, after trait hooks have had their say.
pub fn chance_for(ctx: &BattleContext, catalogs: &Catalogs, slot: FieldSlot) -> u8 {
    let fleeing = side_speed_sum(ctx, slot.side).max(1) as f64;
    let opposing = side_speed_sum(ctx, slot.side.opponent()).max(1) as f64;
    let mut chance = ValueHolder::new(escape_chance(fleeing / opposing, ctx.escape_attempts));

    for spec in trait_specs(ctx, catalogs, slot) {
        if let Some(hook) = spec.escape_chance {
            if let Err(fault) = hook(ctx, slot, &mut chance) {
                report_fault(HookKind::EscapeChance, slot, &fault);
            }
        }
    }
    chance.value.clamp(ESCAPE_MIN, ESCAPE_MAX)
}

/// Roll a flee attempt. On success the opposing side is cleared off the
/// field (held items stripped) and the encounter ends; the caller owes a
/// transition task to announce the ending. On failure the attempt is
/// recorded so later attempts get easier and other systems can see this
/// combatant spent its turn failing to flee.
pub fn attempt_escape(
    ctx: &mut BattleContext,
    catalogs: &Catalogs,
    slot: FieldSlot,
    rng: &mut TurnRng,
    bus: &mut EventBus,
) -> bool {
    let chance = chance_for(ctx, catalogs, slot);
    let escaped = rng.next_outcome("escape roll") <= chance;
    ctx.escape_attempts += 1;

    if escaped {
        bus.push(BattleEvent::FledSuccessfully { slot });
        let opposing = slot.side.opponent();
        for foe_slot in ctx.slots_for(opposing) {
            if let Some(combatant) = ctx.combatant_mut(foe_slot) {
                combatant.held_item = None;
            }
            ctx.vacate(foe_slot);
        }
        ctx.escape_attempts = 0;
        ctx.status = EncounterStatus::Ended {
            outcome: EncounterOutcome::Fled,
        };
    } else {
        bus.push(BattleEvent::EscapeFailed {
            slot,
            attempts: ctx.escape_attempts,
        });
        if let Some(combatant) = ctx.combatant_mut(slot) {
            combatant.turn_record.failed_flee = true;
            combatant.turn_record.acted = true;
        }
    }
    escaped
}
