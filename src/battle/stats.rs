use crate::combatant::{Combatant, StatKind, StatusAilment};
use crate::field::Side;
use crate::battle::state::BattleContext;

/// Stage multiplier as a (numerator, denominator) pair: +s gives (2+s)/2,
/// -s gives 2/(2+s). Integer math keeps results reproducible.
fn stage_multiplier(stage: i8) -> (u32, u32) {
    if stage >= 0 {
        ((2 + stage as u32), 2)
    } else {
        (2, (2 + (-stage) as u32))
    }
}

pub fn effective_stat(base: u16, stage: i8) -> u32 {
    let (num, den) = stage_multiplier(stage);
    (base as u32 * num) / den
}

/// Speed after stage modifiers and status penalties. Paralysis quarters it.
pub fn effective_speed(combatant: &Combatant) -> u32 {
    let mut speed = effective_stat(combatant.stats.speed, combatant.stat_stage(StatKind::Speed));
    if matches!(combatant.status, Some(StatusAilment::Paralysis)) {
        speed /= 4;
    }
    speed.max(1)
}

/// Combined effective speed of everyone a side currently fields. Feeds the
/// escape resolver's speed ratio.
pub fn side_speed_sum(ctx: &BattleContext, side: Side) -> u32 {
    ctx.slots_for(side)
        .into_iter()
        .filter_map(|slot| ctx.combatant(slot))
        .map(effective_speed)
        .sum()
}
