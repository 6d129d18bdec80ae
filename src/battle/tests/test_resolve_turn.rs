#[cfg(test)]
mod tests {
    use crate::battle::engine::{resolve_turn, TurnRunner, TurnStatus};
    use crate::battle::events::BattleEvent;
    use crate::battle::scheduler::{CompletionHandle, EffectCue, Presenter};
    use crate::battle::state::{EncounterOutcome, EncounterStatus};
    use crate::battle::tests::common::*;
    use crate::battle::commands::{TargetRef, TurnCommand};
    use crate::errors::{CommandError, EncounterError, EngineError};
    use crate::field::FieldSlot;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_resolve_turn_basic_speed_order() {
        let ally = TestCombatantBuilder::new("Arbel").with_speed(30).build();
        let foe = TestCombatantBuilder::new("Molt").with_speed(20).build();
        let mut ctx = create_test_battle(ally, foe);
        let catalogs = test_catalogs();

        let commands = vec![
            TurnCommand::use_action(
                FieldSlot::ALLY_LEFT,
                STRIKE,
                vec![TargetRef::Slot(FieldSlot::FOE_LEFT)],
            ),
            TurnCommand::use_action(
                FieldSlot::FOE_LEFT,
                STRIKE,
                vec![TargetRef::Slot(FieldSlot::ALLY_LEFT)],
            ),
        ];

        let bus = assert_ok(resolve_turn(&mut ctx, &catalogs, commands, predictable_rng()));
        let events = bus.events();

        let announced: Vec<FieldSlot> = events
            .iter()
            .filter_map(|e| match e {
                BattleEvent::ActionAnnounced { slot, .. } => Some(*slot),
                _ => None,
            })
            .collect();
        assert_eq!(
            announced,
            vec![FieldSlot::ALLY_LEFT, FieldSlot::FOE_LEFT],
            "Faster combatant should act first."
        );

        // Both strikes landed and both users paid a use.
        let ally = ctx.combatant(FieldSlot::ALLY_LEFT).unwrap();
        let foe = ctx.combatant(FieldSlot::FOE_LEFT).unwrap();
        assert_eq!(ally.current_hp(), ally.max_hp - STRIKE_DAMAGE);
        assert_eq!(foe.current_hp(), foe.max_hp - STRIKE_DAMAGE);
        assert_eq!(ally.action_instance(STRIKE).unwrap().pp, 9);
        assert_eq!(foe.action_instance(STRIKE).unwrap().pp, 9);

        assert_eq!(ctx.turn_number, 2, "Turn number should increment");
        assert_eq!(ctx.status, EncounterStatus::InProgress);
        assert!(matches!(events.first(), Some(BattleEvent::TurnStarted { turn_number: 1 })));
        assert!(matches!(events.last(), Some(BattleEvent::TurnEnded)));
    }

    #[test]
    fn test_duplicate_commands_are_rejected() {
        let ally = TestCombatantBuilder::new("Arbel").build();
        let foe = TestCombatantBuilder::new("Molt").build();
        let mut ctx = create_test_battle(ally, foe);
        let catalogs = test_catalogs();

        let commands = vec![
            TurnCommand::flee(FieldSlot::ALLY_LEFT),
            TurnCommand::use_action(
                FieldSlot::ALLY_LEFT,
                STRIKE,
                vec![TargetRef::Slot(FieldSlot::FOE_LEFT)],
            ),
        ];

        let err = resolve_turn(&mut ctx, &catalogs, commands, predictable_rng()).unwrap_err();
        assert_eq!(
            err,
            EngineError::Command(CommandError::DuplicateSlot(FieldSlot::ALLY_LEFT))
        );
    }

    #[test]
    fn test_commands_for_empty_slots_are_rejected() {
        let ally = TestCombatantBuilder::new("Arbel").build();
        let foe = TestCombatantBuilder::new("Molt").build();
        let mut ctx = create_test_battle(ally, foe);
        let catalogs = test_catalogs();

        let commands = vec![TurnCommand::flee(FieldSlot::FOE_RIGHT)];
        let err = resolve_turn(&mut ctx, &catalogs, commands, predictable_rng()).unwrap_err();
        assert_eq!(
            err,
            EngineError::Command(CommandError::VacantSlot(FieldSlot::FOE_RIGHT))
        );
    }

    #[test]
    fn test_turns_cannot_run_after_the_encounter_ends() {
        let ally = TestCombatantBuilder::new("Arbel").build();
        let foe = TestCombatantBuilder::new("Molt").build();
        let mut ctx = create_test_battle(ally, foe);
        ctx.status = EncounterStatus::Ended {
            outcome: EncounterOutcome::Fled,
        };
        let catalogs = test_catalogs();

        let err = resolve_turn(&mut ctx, &catalogs, vec![], predictable_rng()).unwrap_err();
        assert_eq!(err, EngineError::Encounter(EncounterError::EncounterOver));
    }

    /// Presenter that never completes on its own; the test completes each
    /// issued handle by hand, mimicking an animation layer.
    struct ManualPresenter {
        issued: Rc<RefCell<Vec<CompletionHandle>>>,
    }

    impl Presenter for ManualPresenter {
        fn present(&mut self, _events: &[BattleEvent], _cues: &[EffectCue]) -> CompletionHandle {
            let handle = CompletionHandle::new();
            self.issued.borrow_mut().push(handle.clone());
            handle
        }
    }

    #[test]
    fn test_runner_suspends_until_presentation_completes() {
        let ally = TestCombatantBuilder::new("Arbel").with_speed(30).build();
        let foe = TestCombatantBuilder::new("Molt").with_speed(20).build();
        let mut ctx = create_test_battle(ally, foe);
        let catalogs = test_catalogs();

        let commands = vec![
            TurnCommand::use_action(
                FieldSlot::ALLY_LEFT,
                STRIKE,
                vec![TargetRef::Slot(FieldSlot::FOE_LEFT)],
            ),
            TurnCommand::use_action(
                FieldSlot::FOE_LEFT,
                STRIKE,
                vec![TargetRef::Slot(FieldSlot::ALLY_LEFT)],
            ),
        ];

        let issued = Rc::new(RefCell::new(Vec::new()));
        let mut presenter = ManualPresenter {
            issued: issued.clone(),
        };
        let mut runner = TurnRunner::new(
            &mut ctx,
            &catalogs,
            commands,
            predictable_rng(),
            &mut presenter,
        )
        .unwrap();

        let mut suspensions = 0;
        loop {
            match runner.run() {
                TurnStatus::Complete => break,
                TurnStatus::AwaitingPresentation => {
                    suspensions += 1;
                    assert!(suspensions < 64, "runner never completed");
                    issued.borrow_mut().last().unwrap().complete();
                }
            }
        }

        assert!(suspensions >= 2, "each output-producing task should suspend");
        assert!(!runner.events().is_empty());
        drop(runner);
        assert_eq!(ctx.turn_number, 2);
    }
}
