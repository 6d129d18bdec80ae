use crate::battle::commands::{TargetRef, TurnCommand};
use crate::battle::engine::{resolve_turn, submit_replacements};
use crate::battle::events::BattleEvent;
use crate::battle::state::{
    BattleContext, EncounterLayout, EncounterOutcome, EncounterStatus, Roster,
};
use crate::battle::tests::common::*;
use crate::errors::{CommandError, EncounterError, EngineError};
use crate::field::{FieldSlot, Side};

fn battle_with_ally_bench() -> BattleContext {
    let lead = TestCombatantBuilder::new("Arbel").with_hp(4).build();
    let bench = TestCombatantBuilder::new("Corven").build();
    let foe = TestCombatantBuilder::new("Molt").with_speed(50).build();
    let mut ctx = BattleContext::new(
        42,
        EncounterLayout::Single,
        Roster::new(vec![lead, bench]),
        Roster::new(vec![foe]),
    );
    ctx.switch_in(FieldSlot::ALLY_LEFT, 0);
    ctx.switch_in(FieldSlot::FOE_LEFT, 0);
    ctx
}

fn foe_strikes() -> TurnCommand {
    TurnCommand::use_action(
        FieldSlot::FOE_LEFT,
        STRIKE,
        vec![TargetRef::Slot(FieldSlot::ALLY_LEFT)],
    )
}

#[test]
fn a_faint_with_a_usable_bench_pauses_for_replacements() {
    let mut ctx = battle_with_ally_bench();
    let catalogs = test_catalogs();

    let bus = assert_ok(resolve_turn(
        &mut ctx,
        &catalogs,
        vec![foe_strikes()],
        predictable_rng(),
    ));

    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::CombatantFainted { slot: FieldSlot::ALLY_LEFT })));
    assert!(bus.events().iter().any(|e| matches!(
        e,
        BattleEvent::ReplacementsRequired { sides } if sides == &vec![Side::Ally]
    )));
    assert_eq!(
        ctx.status,
        EncounterStatus::AwaitingReplacements {
            sides: vec![Side::Ally]
        }
    );
    assert!(!ctx.is_occupied(FieldSlot::ALLY_LEFT), "the fainted lead left the field");

    // No further turns until the replacement arrives.
    let err = resolve_turn(&mut ctx, &catalogs, vec![], predictable_rng()).unwrap_err();
    assert_eq!(
        err,
        EngineError::Encounter(EncounterError::ReplacementsPending)
    );
}

#[test]
fn replacement_validation_and_resume() {
    let mut ctx = battle_with_ally_bench();
    let catalogs = test_catalogs();
    assert_ok(resolve_turn(
        &mut ctx,
        &catalogs,
        vec![foe_strikes()],
        predictable_rng(),
    ));

    // The foe side owes nothing.
    let err = submit_replacements(&mut ctx, &[(FieldSlot::FOE_LEFT, 0)]).unwrap_err();
    assert_eq!(
        err,
        EngineError::Encounter(EncounterError::NoReplacementDue(FieldSlot::FOE_LEFT))
    );

    // The fainted lead cannot come back in.
    let err = submit_replacements(&mut ctx, &[(FieldSlot::ALLY_LEFT, 0)]).unwrap_err();
    assert_eq!(
        err,
        EngineError::Command(CommandError::FaintedReplacement(0))
    );

    let err = submit_replacements(&mut ctx, &[(FieldSlot::ALLY_LEFT, 9)]).unwrap_err();
    assert_eq!(err, EngineError::Command(CommandError::InvalidRosterIndex(9)));

    assert_ok(submit_replacements(&mut ctx, &[(FieldSlot::ALLY_LEFT, 1)]));
    assert_eq!(ctx.status, EncounterStatus::InProgress);
    assert_eq!(ctx.combatant(FieldSlot::ALLY_LEFT).unwrap().name, "Corven");

    // The next turn runs normally.
    assert_ok(resolve_turn(&mut ctx, &catalogs, vec![], predictable_rng()));
}

#[test]
fn wiping_a_side_with_no_bench_ends_the_encounter() {
    let ally = TestCombatantBuilder::new("Arbel").with_hp(4).build();
    let foe = TestCombatantBuilder::new("Molt").with_speed(50).build();
    let mut ctx = create_test_battle(ally, foe);
    let catalogs = test_catalogs();

    let bus = assert_ok(resolve_turn(
        &mut ctx,
        &catalogs,
        vec![foe_strikes()],
        predictable_rng(),
    ));

    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::SideDefeated { side: Side::Ally })));
    assert!(bus.events().iter().any(|e| matches!(
        e,
        BattleEvent::EncounterEnded {
            outcome: EncounterOutcome::FoeVictory
        }
    )));
    assert_eq!(
        ctx.status,
        EncounterStatus::Ended {
            outcome: EncounterOutcome::FoeVictory
        }
    );
}

#[test]
fn a_fainted_combatant_forfeits_its_queued_command() {
    let mut ctx = battle_with_ally_bench();
    let catalogs = test_catalogs();

    // The slow lead dies to the fast foe before its own strike runs.
    let commands = vec![
        TurnCommand::use_action(
            FieldSlot::ALLY_LEFT,
            STRIKE,
            vec![TargetRef::Slot(FieldSlot::FOE_LEFT)],
        ),
        foe_strikes(),
    ];
    let bus = assert_ok(resolve_turn(&mut ctx, &catalogs, commands, predictable_rng()));

    let announced: Vec<FieldSlot> = bus
        .events()
        .iter()
        .filter_map(|e| match e {
            BattleEvent::ActionAnnounced { slot, .. } => Some(*slot),
            _ => None,
        })
        .collect();
    assert_eq!(announced, vec![FieldSlot::FOE_LEFT], "only the foe acted");
    let foe = ctx.combatant(FieldSlot::FOE_LEFT).unwrap();
    assert_eq!(foe.current_hp(), foe.max_hp);
}
