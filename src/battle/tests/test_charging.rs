use crate::battle::commands::{TargetRef, TurnCommand};
use crate::battle::conditions::MarkerKind;
use crate::battle::engine::resolve_turn;
use crate::battle::events::BattleEvent;
use crate::battle::tests::common::*;
use crate::field::FieldSlot;

#[test]
fn charge_up_actions_span_two_turns_and_pay_once() {
    let ally = TestCombatantBuilder::new("Arbel")
        .with_actions(vec![(SKY_CHARGE, 10)])
        .build();
    let foe = TestCombatantBuilder::new("Molt").build();
    let mut ctx = create_test_battle(ally, foe);
    let catalogs = test_catalogs();

    // Turn one: the action announces, begins charging, and defers its cost.
    let commands = vec![TurnCommand::use_action(
        FieldSlot::ALLY_LEFT,
        SKY_CHARGE,
        vec![TargetRef::Slot(FieldSlot::FOE_LEFT)],
    )];
    let bus = assert_ok(resolve_turn(&mut ctx, &catalogs, commands, predictable_rng()));

    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::ChargingBegan { .. })));
    {
        let ally = ctx.combatant(FieldSlot::ALLY_LEFT).unwrap();
        assert!(ally.has_marker(MarkerKind::Charging));
        assert_eq!(ally.action_instance(SKY_CHARGE).unwrap().pp, 10);
    }
    let foe_hp = ctx.combatant(FieldSlot::FOE_LEFT).unwrap().current_hp();
    assert_eq!(foe_hp, 40, "no damage while gathering");

    // Turn two: no command submitted; the release is forced, lands, and
    // spends the use.
    let bus = assert_ok(resolve_turn(&mut ctx, &catalogs, vec![], predictable_rng()));

    assert!(bus.events().iter().any(|e| matches!(
        e,
        BattleEvent::ActionAnnounced { action, .. } if *action == SKY_CHARGE
    )));
    let ally = ctx.combatant(FieldSlot::ALLY_LEFT).unwrap();
    assert!(!ally.has_marker(MarkerKind::Charging), "marker consumed on release");
    assert_eq!(ally.action_instance(SKY_CHARGE).unwrap().pp, 9);
    let foe = ctx.combatant(FieldSlot::FOE_LEFT).unwrap();
    assert_eq!(foe.current_hp(), foe.max_hp - SKY_CHARGE_DAMAGE);
}

#[test]
fn forced_release_overrides_a_submitted_command() {
    let ally = TestCombatantBuilder::new("Arbel")
        .with_actions(vec![(SKY_CHARGE, 10), (STRIKE, 10)])
        .build();
    let foe = TestCombatantBuilder::new("Molt").build();
    let mut ctx = create_test_battle(ally, foe);
    let catalogs = test_catalogs();

    let commands = vec![TurnCommand::use_action(
        FieldSlot::ALLY_LEFT,
        SKY_CHARGE,
        vec![TargetRef::Slot(FieldSlot::FOE_LEFT)],
    )];
    assert_ok(resolve_turn(&mut ctx, &catalogs, commands, predictable_rng()));

    // A strike is submitted mid-charge; the charged release preempts it.
    let commands = vec![TurnCommand::use_action(
        FieldSlot::ALLY_LEFT,
        STRIKE,
        vec![TargetRef::Slot(FieldSlot::FOE_LEFT)],
    )];
    let bus = assert_ok(resolve_turn(&mut ctx, &catalogs, commands, predictable_rng()));

    assert!(bus.events().iter().any(|e| matches!(
        e,
        BattleEvent::ActionAnnounced { action, .. } if *action == SKY_CHARGE
    )));
    assert!(!bus.events().iter().any(|e| matches!(
        e,
        BattleEvent::ActionAnnounced { action, .. } if *action == STRIKE
    )));
    let ally = ctx.combatant(FieldSlot::ALLY_LEFT).unwrap();
    assert_eq!(ally.action_instance(STRIKE).unwrap().pp, 10);
}
