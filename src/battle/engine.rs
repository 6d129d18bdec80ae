//! The turn runner: builds the task queue for a turn from the submitted
//! commands, drains it through the scheduler, and suspends on presentation
//! completion between tasks.

use crate::battle::commands::{CommandKind, InvocationMode, QueuedAction, TargetRef, TurnCommand};
use crate::battle::conditions::{ConditionMarker, LapseTiming, MarkerKind};
use crate::battle::end_of_turn::run_end_of_turn;
use crate::battle::escape::attempt_escape;
use crate::battle::events::{BattleEvent, CancelReason, EventBus};
use crate::battle::legality::{apply_element_adaptation, stage_a, stage_b, stage_c};
use crate::battle::order::resolve_turn_order;
use crate::battle::rng::TurnRng;
use crate::battle::scheduler::{
    CompletionHandle, CueKind, EffectCue, NullPresenter, Presenter, Scheduler, Task, TaskSink,
};
use crate::battle::state::{BattleContext, EncounterOutcome, EncounterStatus};
use crate::battle::targeting::resolve_targets;
use crate::errors::{CommandError, EncounterError, EngineError, EngineResult};
use crate::field::{FieldSlot, Side};
use crate::hooks::{report_fault, Catalogs, EffectEnv, HookKind};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// A presentation request is outstanding; call `run` again once the
    /// completion handle fires.
    AwaitingPresentation,
    Complete,
}

pub struct TurnRunner<'a, P: Presenter> {
    ctx: &'a mut BattleContext,
    catalogs: &'a Catalogs,
    presenter: &'a mut P,
    scheduler: Scheduler,
    rng: TurnRng,
    bus: EventBus,
    pending: Option<CompletionHandle>,
    presented_upto: usize,
}

impl<'a, P: Presenter> TurnRunner<'a, P> {
    /// Validate the submitted commands and build the turn's task queue.
    /// A combatant mid charge-up has its command overridden by the forced
    /// release of its charged action.
    pub fn new(
        ctx: &'a mut BattleContext,
        catalogs: &'a Catalogs,
        commands: Vec<TurnCommand>,
        rng: TurnRng,
        presenter: &'a mut P,
    ) -> EngineResult<Self> {
        match &ctx.status {
            EncounterStatus::InProgress => {}
            EncounterStatus::AwaitingReplacements { .. } => {
                return Err(EncounterError::ReplacementsPending.into())
            }
            EncounterStatus::Ended { .. } => return Err(EncounterError::EncounterOver.into()),
        }

        let mut table: HashMap<FieldSlot, TurnCommand> = HashMap::new();
        for command in commands {
            let slot = command.slot;
            if !ctx.is_alive(slot) {
                return Err(CommandError::VacantSlot(slot).into());
            }
            if table.insert(slot, command).is_some() {
                return Err(CommandError::DuplicateSlot(slot).into());
            }
        }

        for slot in ctx.active_slots() {
            if let Some(c) = ctx.combatant_mut(slot) {
                c.turn_record.reset();
            }
        }

        // Forced releases preempt whatever was collected for the slot.
        for slot in ctx.active_slots() {
            let charging = ctx
                .combatant(slot)
                .and_then(|c| c.markers.get(MarkerKind::Charging))
                .cloned();
            if let Some(ConditionMarker::Charging { action, targets }) = charging {
                let refs = targets.into_iter().map(TargetRef::Slot).collect();
                table.insert(slot, TurnCommand::use_action(slot, action, refs));
            }
        }

        let mut rng = rng;
        let mut bus = EventBus::new();
        bus.push(BattleEvent::TurnStarted {
            turn_number: ctx.turn_number,
        });

        let order = resolve_turn_order(ctx, catalogs, &table, &mut rng);

        let mut scheduler = Scheduler::new();
        for slot in order {
            if let Some(command) = table.remove(&slot) {
                scheduler.schedule_at_end(Task::RunCommand(command));
            }
        }
        scheduler.schedule_at_end(Task::EndOfTurn);
        scheduler.schedule_at_end(Task::Finalize);

        Ok(TurnRunner {
            ctx,
            catalogs,
            presenter,
            scheduler,
            rng,
            bus,
            pending: None,
            presented_upto: 0,
        })
    }

    /// Drain the queue until it is empty or a presentation is outstanding.
    /// Re-entrant: call again after the pending handle completes.
    pub fn run(&mut self) -> TurnStatus {
        loop {
            if let Some(handle) = &self.pending {
                if !handle.is_complete() {
                    return TurnStatus::AwaitingPresentation;
                }
                self.pending = None;
            }

            let Some(task) = self.scheduler.pop_next() else {
                return TurnStatus::Complete;
            };
            self.execute_task(task);

            let new_events = &self.bus.events()[self.presented_upto..];
            if !new_events.is_empty() {
                let cues = cues_for(new_events);
                let handle = self.presenter.present(new_events, &cues);
                self.presented_upto = self.bus.len();
                if !handle.is_complete() {
                    self.pending = Some(handle);
                    return TurnStatus::AwaitingPresentation;
                }
            }
        }
    }

    pub fn events(&self) -> &[BattleEvent] {
        self.bus.events()
    }

    pub fn into_events(self) -> EventBus {
        self.bus
    }

    fn execute_task(&mut self, task: Task) {
        // Re-validate the world before anything touches it: the encounter
        // may have ended since this task was queued.
        if self.ctx.is_over() && !matches!(task, Task::EncounterTransition | Task::Finalize) {
            return;
        }
        match task {
            Task::RunCommand(command) => self.run_command(command),
            Task::RunAction(action) => self.run_action(action),
            Task::EndOfTurn => run_end_of_turn(
                self.ctx,
                self.catalogs,
                &mut self.scheduler,
                &mut self.rng,
                &mut self.bus,
            ),
            Task::EncounterTransition => self.run_transition(),
            Task::Finalize => self.finalize(),
        }
    }

    fn run_command(&mut self, command: TurnCommand) {
        if command.skip {
            return;
        }
        let slot = command.slot;
        if !self.ctx.is_alive(slot) {
            tracing::debug!(%slot, "command dropped; combatant left the field");
            return;
        }
        match command.kind {
            CommandKind::UseAction { action, targets } => {
                self.run_action(QueuedAction::direct(slot, action, targets));
            }
            CommandKind::Switch { roster_index } => self.run_switch(slot, roster_index),
            CommandKind::Flee => self.run_flee(slot),
            CommandKind::UseItem { item } => self.run_item(slot, item),
        }
    }

    fn run_switch(&mut self, slot: FieldSlot, roster_index: usize) {
        {
            let roster = self.ctx.roster(slot.side);
            if roster_index >= roster.members.len()
                || roster.members[roster_index].is_fainted()
                || roster.is_on_field(roster_index)
            {
                tracing::debug!(%slot, roster_index, "invalid switch dropped");
                return;
            }
        }
        if self
            .ctx
            .combatant(slot)
            .is_some_and(|c| c.has_marker(MarkerKind::Trapped))
        {
            self.bus.push(BattleEvent::ActionCancelled {
                slot,
                reason: CancelReason::Trapped,
            });
            return;
        }
        self.ctx.vacate(slot);
        self.ctx.switch_in(slot, roster_index);
        self.bus.push(BattleEvent::SwitchedIn { slot, roster_index });
        if let Some(c) = self.ctx.combatant_mut(slot) {
            c.turn_record.acted = true;
        }
    }

    fn run_flee(&mut self, slot: FieldSlot) {
        if self
            .ctx
            .combatant(slot)
            .is_some_and(|c| c.has_marker(MarkerKind::Trapped))
        {
            self.bus.push(BattleEvent::ActionCancelled {
                slot,
                reason: CancelReason::Trapped,
            });
            return;
        }
        let escaped = attempt_escape(self.ctx, self.catalogs, slot, &mut self.rng, &mut self.bus);
        if escaped {
            // Everyone else's turn is moot; the bookkeeping tasks remain.
            self.scheduler.skip_all_slot_tasks();
            self.scheduler.schedule_after_current(Task::EncounterTransition);
        }
    }

    /// Announce a mid-turn ending as its own presentation beat and hand
    /// off to whatever hosts the post-encounter flow.
    fn run_transition(&mut self) {
        if let EncounterStatus::Ended { outcome } = self.ctx.status {
            self.bus.push(BattleEvent::EncounterEnded { outcome });
        }
    }

    fn run_item(&mut self, slot: FieldSlot, item: crate::hooks::ItemId) {
        self.bus.push(BattleEvent::ItemUsed { slot, item });
        if let Some(hook) = self.catalogs.items.get(item).and_then(|spec| spec.on_use) {
            let mut env = EffectEnv {
                ctx: &mut *self.ctx,
                rng: &mut self.rng,
                bus: &mut self.bus,
                tasks: TaskSink::new(&mut self.scheduler),
            };
            if let Err(fault) = hook(&mut env, slot) {
                report_fault(HookKind::ItemUse, slot, &fault);
            }
        }
        if let Some(c) = self.ctx.combatant_mut(slot) {
            c.turn_record.acted = true;
        }
    }

    /// Drive one queued action through target resolution, the legality
    /// cascade, and (if it survives) its effect hook.
    fn run_action(&mut self, queued: QueuedAction) {
        let user = queued.user;
        if !self.ctx.is_alive(user) {
            return;
        }
        let releasing = matches!(
            self.ctx
                .combatant(user)
                .and_then(|c| c.markers.get(MarkerKind::Charging)),
            Some(ConditionMarker::Charging { action, .. }) if *action == queued.action
        );

        let Some(targets) = resolve_targets(self.ctx, self.catalogs, &queued) else {
            self.bus.push(BattleEvent::ActionCancelled {
                slot: user,
                reason: CancelReason::CounterTargetGone,
            });
            self.lapse_pre_action(user);
            return;
        };

        if let Some(reason) = stage_a(
            self.ctx,
            self.catalogs,
            &queued,
            &targets,
            &mut self.rng,
            &mut self.bus,
        ) {
            self.bus.push(BattleEvent::ActionCancelled { slot: user, reason });
            self.lapse_pre_action(user);
            return;
        }
        self.lapse_pre_action(user);

        self.bus.push(BattleEvent::ActionAnnounced {
            slot: user,
            action: queued.action,
        });
        if let Some(c) = self.ctx.combatant_mut(user) {
            c.turn_record.acted = true;
            c.turn_record.last_action = Some(queued.action);
        }

        // A charge-type action spends its first turn gathering and defers
        // the resource cost to the release turn.
        let charges = self
            .catalogs
            .actions
            .get(queued.action)
            .is_some_and(|spec| spec.charge_up);
        if charges && !releasing {
            if let Some(c) = self.ctx.combatant_mut(user) {
                c.markers.insert(ConditionMarker::Charging {
                    action: queued.action,
                    targets: targets.clone(),
                });
            }
            self.bus.push(BattleEvent::ChargingBegan {
                slot: user,
                action: queued.action,
            });
            return;
        }

        if queued.mode == InvocationMode::Direct {
            if let Some(instance) = self
                .ctx
                .combatant_mut(user)
                .and_then(|c| c.action_instance_mut(queued.action))
            {
                instance.spend();
            }
        }

        if let Some(reason) = stage_b(self.ctx, self.catalogs, &queued, &targets, &mut self.bus) {
            self.bus.push(BattleEvent::ActionFailed { slot: user, reason });
            self.consume_charging(user, releasing);
            return;
        }
        if let Some(reason) = stage_c(self.ctx, self.catalogs, &queued, &targets) {
            // Adaptation traits fire on attempted use, failure included.
            apply_element_adaptation(self.ctx, self.catalogs, &queued, &mut self.bus);
            self.bus.push(BattleEvent::ActionFailed { slot: user, reason });
            self.consume_charging(user, releasing);
            return;
        }

        apply_element_adaptation(self.ctx, self.catalogs, &queued, &mut self.bus);
        self.consume_charging(user, releasing);

        if let Some(effect) = self
            .catalogs
            .actions
            .get(queued.action)
            .and_then(|spec| spec.effect)
        {
            let mut env = EffectEnv {
                ctx: &mut *self.ctx,
                rng: &mut self.rng,
                bus: &mut self.bus,
                tasks: TaskSink::new(&mut self.scheduler),
            };
            if let Err(fault) = effect(&mut env, user, &targets) {
                report_fault(HookKind::OnActionEffect, user, &fault);
            }
        }
    }

    /// The one pre-action lapse pass for this combatant's turn.
    fn lapse_pre_action(&mut self, slot: FieldSlot) {
        if let Some(c) = self.ctx.combatant_mut(slot) {
            for kind in c.markers.lapse(LapseTiming::PreAction) {
                self.bus.push(BattleEvent::MarkerExpired {
                    target: slot,
                    marker: kind,
                });
            }
        }
    }

    fn consume_charging(&mut self, slot: FieldSlot, releasing: bool) {
        if !releasing {
            return;
        }
        if let Some(c) = self.ctx.combatant_mut(slot) {
            c.markers.lapse(LapseTiming::OnActionEffect);
        }
    }

    /// Close out the turn: defeat and replacement detection, counters.
    fn finalize(&mut self) {
        if !self.ctx.is_over() {
            let mut defeated = Vec::new();
            for side in [Side::Ally, Side::Foe] {
                if !self.ctx.roster(side).has_usable() {
                    self.bus.push(BattleEvent::SideDefeated { side });
                    defeated.push(side);
                }
            }
            if !defeated.is_empty() {
                let outcome = if defeated.len() == 2 {
                    EncounterOutcome::Draw
                } else if defeated[0] == Side::Ally {
                    EncounterOutcome::FoeVictory
                } else {
                    EncounterOutcome::AllyVictory
                };
                self.ctx.status = EncounterStatus::Ended { outcome };
                self.ctx.escape_attempts = 0;
                self.bus.push(BattleEvent::EncounterEnded { outcome });
            } else {
                let needing = self.vacate_fainted_and_collect_needs();
                if !needing.is_empty() {
                    self.bus.push(BattleEvent::ReplacementsRequired {
                        sides: needing.clone(),
                    });
                    self.ctx.status = EncounterStatus::AwaitingReplacements { sides: needing };
                }
            }
        }
        if !self.ctx.is_over() {
            self.ctx.turn_number += 1;
        }
        self.bus.push(BattleEvent::TurnEnded);
    }

    /// Empty every slot holding a fainted combatant; a side with a usable
    /// bench owes a replacement for each slot it should be filling.
    fn vacate_fainted_and_collect_needs(&mut self) -> Vec<Side> {
        let mut needing = Vec::new();
        for side in [Side::Ally, Side::Foe] {
            let mut owes = false;
            for position in self.ctx.layout.positions() {
                let slot = FieldSlot::new(side, *position);
                if self
                    .ctx
                    .combatant(slot)
                    .is_some_and(|c| c.is_fainted())
                {
                    self.ctx.vacate(slot);
                }
                if !self.ctx.is_occupied(slot)
                    && self.ctx.roster(side).first_benched().is_some()
                {
                    owes = true;
                }
            }
            if owes {
                needing.push(side);
            }
        }
        needing
    }
}

/// Map freshly produced events to animation/sound cues for the presenter.
fn cues_for(events: &[BattleEvent]) -> Vec<EffectCue> {
    let mut cues = Vec::new();
    for event in events {
        let cue = match event {
            BattleEvent::ActionAnnounced { slot, .. } => Some(EffectCue {
                kind: CueKind::ActionUse,
                source: Some(*slot),
                target: None,
            }),
            BattleEvent::DamageDealt { target, .. }
            | BattleEvent::WeatherDamage { target, .. }
            | BattleEvent::StatusDamage { target, .. }
            | BattleEvent::TrapDamage { target, .. } => Some(EffectCue {
                kind: CueKind::Damage,
                source: None,
                target: Some(*target),
            }),
            BattleEvent::CombatantFainted { slot } => Some(EffectCue {
                kind: CueKind::Faint,
                source: None,
                target: Some(*slot),
            }),
            BattleEvent::SwitchedIn { slot, .. } => Some(EffectCue {
                kind: CueKind::SwitchIn,
                source: Some(*slot),
                target: None,
            }),
            BattleEvent::StatusApplied { target, .. }
            | BattleEvent::StatusCleared { target, .. } => Some(EffectCue {
                kind: CueKind::StatusTrigger,
                source: None,
                target: Some(*target),
            }),
            BattleEvent::FledSuccessfully { slot } | BattleEvent::EscapeFailed { slot, .. } => {
                Some(EffectCue {
                    kind: CueKind::Escape,
                    source: Some(*slot),
                    target: None,
                })
            }
            _ => None,
        };
        if let Some(cue) = cue {
            cues.push(cue);
        }
    }
    cues
}

/// Resolve a whole turn headlessly. The null presenter completes every
/// request synchronously, so a stall here is a bug worth surfacing.
pub fn resolve_turn(
    ctx: &mut BattleContext,
    catalogs: &Catalogs,
    commands: Vec<TurnCommand>,
    rng: TurnRng,
) -> EngineResult<EventBus> {
    let mut presenter = NullPresenter;
    let mut runner = TurnRunner::new(ctx, catalogs, commands, rng, &mut presenter)?;
    match runner.run() {
        TurnStatus::Complete => Ok(runner.into_events()),
        TurnStatus::AwaitingPresentation => Err(EngineError::PresentationStalled),
    }
}

/// Fill slots owed a replacement after faints. Once every owed slot is
/// filled the encounter resumes.
pub fn submit_replacements(
    ctx: &mut BattleContext,
    replacements: &[(FieldSlot, usize)],
) -> EngineResult<()> {
    let owed = match &ctx.status {
        EncounterStatus::AwaitingReplacements { sides } => sides.clone(),
        EncounterStatus::Ended { .. } => return Err(EncounterError::EncounterOver.into()),
        EncounterStatus::InProgress => Vec::new(),
    };
    for (slot, roster_index) in replacements {
        if !owed.contains(&slot.side) {
            return Err(EncounterError::NoReplacementDue(*slot).into());
        }
        let roster = ctx.roster(slot.side);
        if *roster_index >= roster.members.len() {
            return Err(CommandError::InvalidRosterIndex(*roster_index).into());
        }
        if roster.members[*roster_index].is_fainted() {
            return Err(CommandError::FaintedReplacement(*roster_index).into());
        }
        if roster.is_on_field(*roster_index) {
            return Err(CommandError::AlreadyOnField(*roster_index).into());
        }
        ctx.switch_in(*slot, *roster_index);
    }

    let mut still_owed = Vec::new();
    for side in owed {
        let vacant = ctx.layout.positions().iter().any(|position| {
            let slot = FieldSlot::new(side, *position);
            !ctx.is_occupied(slot) && ctx.roster(side).first_benched().is_some()
        });
        if vacant {
            still_owed.push(side);
        }
    }
    ctx.status = if still_owed.is_empty() {
        EncounterStatus::InProgress
    } else {
        EncounterStatus::AwaitingReplacements { sides: still_owed }
    };
    Ok(())
}
