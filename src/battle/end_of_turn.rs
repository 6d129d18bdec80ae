//! The end-of-turn pipeline: a fixed sequence of field-wide passes run
//! after every action has resolved. Each pass recomputes the set of live
//! slots, so a faint during one pass keeps its victim out of the next.

use crate::battle::events::{BattleEvent, EventBus};
use crate::battle::conditions::{LapseTiming, MarkerKind};
use crate::battle::rng::TurnRng;
use crate::battle::scheduler::{Scheduler, TaskSink};
use crate::battle::state::{BattleContext, TerrainKind};
use crate::combatant::StatusAilment;
use crate::field::FieldSlot;
use crate::hooks::{report_fault, trait_specs, Catalogs, EffectEnv, HookKind, ValueHolder};

const WEATHER_DAMAGE_DENOM: u16 = 16;
const STATUS_DAMAGE_DENOM: u16 = 8;
const TRAP_DAMAGE_DENOM: u16 = 16;
const TERRAIN_HEAL_DENOM: u16 = 16;

pub fn run_end_of_turn(
    ctx: &mut BattleContext,
    catalogs: &Catalogs,
    scheduler: &mut Scheduler,
    rng: &mut TurnRng,
    bus: &mut EventBus,
) {
    weather_pass(ctx, catalogs, bus);
    status_residual_pass(ctx, bus);
    trap_residual_pass(ctx, bus);
    terrain_pass(ctx, bus);
    hook_pass(ctx, catalogs, scheduler, rng, bus);
    marker_lapse_pass(ctx, bus);
    tick_field_conditions(ctx, bus);
}

/// Damaging weather chips exposed combatants; a pre-weather-damage trait
/// hook may shield its owner.
fn weather_pass(ctx: &mut BattleContext, catalogs: &Catalogs, bus: &mut EventBus) {
    let Some(weather) = ctx.field.weather_kind() else {
        return;
    };
    if !weather.is_damaging() {
        return;
    }
    for slot in ctx.active_slots() {
        let mut shielded = ValueHolder::new(false);
        for spec in trait_specs(ctx, catalogs, slot) {
            if let Some(hook) = spec.pre_weather_damage {
                if let Err(fault) = hook(ctx, slot, weather, &mut shielded) {
                    report_fault(HookKind::PreWeatherDamage, slot, &fault);
                }
            }
        }
        if shielded.value {
            continue;
        }
        if let Some(combatant) = ctx.combatant_mut(slot) {
            let damage = (combatant.max_hp / WEATHER_DAMAGE_DENOM).max(1);
            let fainted = combatant.take_damage(damage);
            bus.push(BattleEvent::WeatherDamage {
                target: slot,
                weather,
                damage,
            });
            if fainted {
                bus.push(BattleEvent::CombatantFainted { slot });
            }
        }
    }
}

fn status_residual_pass(ctx: &mut BattleContext, bus: &mut EventBus) {
    for slot in ctx.active_slots() {
        let Some(combatant) = ctx.combatant_mut(slot) else {
            continue;
        };
        let status = match combatant.status {
            Some(status @ (StatusAilment::Poison | StatusAilment::Burn)) => status,
            _ => continue,
        };
        let damage = (combatant.max_hp / STATUS_DAMAGE_DENOM).max(1);
        let fainted = combatant.take_damage(damage);
        bus.push(BattleEvent::StatusDamage {
            target: slot,
            status,
            damage,
        });
        if fainted {
            bus.push(BattleEvent::CombatantFainted { slot });
        }
    }
}

fn trap_residual_pass(ctx: &mut BattleContext, bus: &mut EventBus) {
    for slot in ctx.active_slots() {
        let Some(combatant) = ctx.combatant_mut(slot) else {
            continue;
        };
        if !combatant.has_marker(MarkerKind::Trapped) {
            continue;
        }
        let damage = (combatant.max_hp / TRAP_DAMAGE_DENOM).max(1);
        let fainted = combatant.take_damage(damage);
        bus.push(BattleEvent::TrapDamage {
            target: slot,
            damage,
        });
        if fainted {
            bus.push(BattleEvent::CombatantFainted { slot });
        }
    }
}

/// Grassy terrain heals grounded combatants that are below full health.
fn terrain_pass(ctx: &mut BattleContext, bus: &mut EventBus) {
    let Some(terrain) = ctx.field.terrain_kind() else {
        return;
    };
    if terrain != TerrainKind::Grassy {
        return;
    }
    for slot in ctx.active_slots() {
        let Some(combatant) = ctx.combatant_mut(slot) else {
            continue;
        };
        if !combatant.grounded || combatant.current_hp() == combatant.max_hp {
            continue;
        }
        let amount = combatant.heal((combatant.max_hp / TERRAIN_HEAL_DENOM).max(1));
        if amount > 0 {
            bus.push(BattleEvent::TerrainHeal {
                target: slot,
                terrain,
                amount,
            });
        }
    }
}

/// Trait post-turn hooks, then held-item end-of-turn hooks, in field order.
/// Hooks get the full effect environment and may schedule follow-up tasks.
fn hook_pass(
    ctx: &mut BattleContext,
    catalogs: &Catalogs,
    scheduler: &mut Scheduler,
    rng: &mut TurnRng,
    bus: &mut EventBus,
) {
    for slot in ctx.active_slots() {
        let hooks: Vec<_> = trait_specs(ctx, catalogs, slot)
            .iter()
            .filter_map(|spec| spec.post_turn)
            .collect();
        for hook in hooks {
            if !ctx.is_alive(slot) {
                break;
            }
            let mut env = EffectEnv {
                ctx: &mut *ctx,
                rng: &mut *rng,
                bus: &mut *bus,
                tasks: TaskSink::new(&mut *scheduler),
            };
            if let Err(fault) = hook(&mut env, slot) {
                report_fault(HookKind::PostTurn, slot, &fault);
            }
        }
    }
    for slot in ctx.active_slots() {
        let item = ctx.combatant(slot).and_then(|c| c.held_item);
        let Some(hook) = item
            .and_then(|id| catalogs.items.get(id))
            .and_then(|spec| spec.end_of_turn)
        else {
            continue;
        };
        let mut env = EffectEnv {
            ctx: &mut *ctx,
            rng: &mut *rng,
            bus: &mut *bus,
            tasks: TaskSink::new(&mut *scheduler),
        };
        if let Err(fault) = hook(&mut env, slot) {
            report_fault(HookKind::PostTurn, slot, &fault);
        }
    }
}

/// The single end-of-turn lapse pass. Infatuation additionally drops when
/// its source has left the field.
fn marker_lapse_pass(ctx: &mut BattleContext, bus: &mut EventBus) {
    for slot in ctx.active_slots() {
        let stale_infatuation = match ctx
            .combatant(slot)
            .and_then(|c| c.markers.get(MarkerKind::Infatuated))
        {
            Some(crate::battle::conditions::ConditionMarker::Infatuated { source }) => {
                !ctx.is_alive(*source)
            }
            _ => false,
        };
        let Some(combatant) = ctx.combatant_mut(slot) else {
            continue;
        };
        if stale_infatuation {
            combatant.markers.remove(MarkerKind::Infatuated);
            bus.push(BattleEvent::MarkerExpired {
                target: slot,
                marker: MarkerKind::Infatuated,
            });
        }
        for kind in combatant.markers.lapse(LapseTiming::EndOfTurn) {
            bus.push(BattleEvent::MarkerExpired {
                target: slot,
                marker: kind,
            });
        }
    }
}

fn tick_field_conditions(ctx: &mut BattleContext, bus: &mut EventBus) {
    if let Some(weather) = &mut ctx.field.weather {
        if let Some(turns) = &mut weather.turns_remaining {
            *turns = turns.saturating_sub(1);
            if *turns == 0 {
                let kind = weather.kind;
                ctx.field.weather = None;
                bus.push(BattleEvent::WeatherEnded { weather: kind });
            }
        }
    }
    if let Some(terrain) = &mut ctx.field.terrain {
        if let Some(turns) = &mut terrain.turns_remaining {
            *turns = turns.saturating_sub(1);
            if *turns == 0 {
                let kind = terrain.kind;
                ctx.field.terrain = None;
                bus.push(BattleEvent::TerrainEnded { terrain: kind });
            }
        }
    }
    if let Some(turns) = &mut ctx.field.gravity {
        *turns = turns.saturating_sub(1);
        if *turns == 0 {
            ctx.field.gravity = None;
        }
    }
    if let Some(turns) = &mut ctx.field.reversed_priority {
        *turns = turns.saturating_sub(1);
        if *turns == 0 {
            ctx.field.reversed_priority = None;
        }
    }
}
