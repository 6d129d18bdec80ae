use crate::battle::commands::{QueuedAction, TurnCommand};
use crate::battle::events::BattleEvent;
use crate::field::FieldSlot;
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Atomic units of work the turn runner drains. Tasks are data, not
/// closures, so the queue can be inspected and skipped by later arrivals.
#[derive(Debug, Clone)]
pub enum Task {
    /// Resolve the turn command a slot selected during collection.
    RunCommand(TurnCommand),
    /// Resolve an action injected mid-turn (called, forced, or reactive).
    RunAction(QueuedAction),
    /// Run the fixed end-of-turn effect pipeline.
    EndOfTurn,
    /// Hand off to the post-encounter flow after a mid-turn ending, such
    /// as a successful flee.
    EncounterTransition,
    /// Close out the turn: win/replacement checks, counter resets.
    Finalize,
}

impl Task {
    /// The slot this task acts for, if it acts for one at all.
    fn slot(&self) -> Option<FieldSlot> {
        match self {
            Task::RunCommand(command) => Some(command.slot),
            Task::RunAction(action) => Some(action.user),
            Task::EndOfTurn | Task::EncounterTransition | Task::Finalize => None,
        }
    }
}

#[derive(Debug)]
struct ScheduledTask {
    task: Task,
    skip: bool,
}

/// Single-threaded cooperative task queue driving a turn. Two insertion
/// disciplines: `schedule_after_current` puts work immediately behind the
/// task currently executing (reactive and nested effects), and
/// `schedule_at_end` appends to the tail (strictly-after-the-action-loop
/// work). Tasks scheduled while another runs keep their insertion order.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: VecDeque<ScheduledTask>,
    /// After-current inserts since the last pop land here, so several
    /// inserts from one task run in the order they were made.
    head_inserts: usize,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        Scheduler::default()
    }

    pub fn schedule_after_current(&mut self, task: Task) {
        self.queue.insert(
            self.head_inserts.min(self.queue.len()),
            ScheduledTask { task, skip: false },
        );
        self.head_inserts += 1;
    }

    pub fn schedule_at_end(&mut self, task: Task) {
        self.queue.push_back(ScheduledTask { task, skip: false });
    }

    /// Next runnable task. Tasks flagged for skipping are discarded here,
    /// never run.
    pub fn pop_next(&mut self) -> Option<Task> {
        self.head_inserts = 0;
        while let Some(scheduled) = self.queue.pop_front() {
            if scheduled.skip {
                tracing::debug!(task = ?scheduled.task, "skipping voided task");
                continue;
            }
            return Some(scheduled.task);
        }
        None
    }

    /// Void every still-pending command/action task belonging to a slot.
    /// Used when an earlier task made the slot's turn moot.
    pub fn skip_pending_for(&mut self, slot: FieldSlot) {
        for scheduled in &mut self.queue {
            if scheduled.task.slot() == Some(slot) {
                scheduled.skip = true;
            }
        }
    }

    /// Void every pending per-slot task, leaving the turn's bookkeeping
    /// tasks (end-of-turn, finalize) in place.
    pub fn skip_all_slot_tasks(&mut self) {
        for scheduled in &mut self.queue {
            if scheduled.task.slot().is_some() {
                scheduled.skip = true;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.iter().all(|s| s.skip) || self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.iter().filter(|s| !s.skip).count()
    }
}

/// Scheduling facade handed to effect hooks. Hooks may queue follow-up work
/// and void pending tasks, but they can never drain the queue.
pub struct TaskSink<'a> {
    scheduler: &'a mut Scheduler,
}

impl<'a> TaskSink<'a> {
    pub fn new(scheduler: &'a mut Scheduler) -> TaskSink<'a> {
        TaskSink { scheduler }
    }

    pub fn schedule_after_current(&mut self, task: Task) {
        self.scheduler.schedule_after_current(task);
    }

    pub fn schedule_at_end(&mut self, task: Task) {
        self.scheduler.schedule_at_end(task);
    }

    pub fn skip_pending_for(&mut self, slot: FieldSlot) {
        self.scheduler.skip_pending_for(slot);
    }

    pub fn skip_all_slot_tasks(&mut self) {
        self.scheduler.skip_all_slot_tasks();
    }
}

/// Animation/sound trigger kinds sent to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    ActionUse,
    Damage,
    Faint,
    StatusTrigger,
    SwitchIn,
    WeatherTick,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectCue {
    pub kind: CueKind,
    pub source: Option<FieldSlot>,
    pub target: Option<FieldSlot>,
}

/// Completion callback for a presentation request. The presenter holds a
/// clone and calls `complete` when its animation (or nothing, headlessly)
/// finishes; the runner polls `is_complete` before draining further.
#[derive(Debug, Clone, Default)]
pub struct CompletionHandle(Rc<Cell<bool>>);

impl CompletionHandle {
    pub fn new() -> CompletionHandle {
        CompletionHandle::default()
    }

    pub fn complete(&self) {
        self.0.set(true);
    }

    pub fn is_complete(&self) -> bool {
        self.0.get()
    }
}

/// Outbound boundary to the (out of scope) presentation layer. The engine
/// issues one request per task that produced output and suspends until the
/// handle completes; it never blocks a thread waiting.
pub trait Presenter {
    fn present(&mut self, events: &[BattleEvent], cues: &[EffectCue]) -> CompletionHandle;
}

/// Headless presenter: every request completes synchronously, so a full
/// turn drains in one call.
#[derive(Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&mut self, _events: &[BattleEvent], _cues: &[EffectCue]) -> CompletionHandle {
        let handle = CompletionHandle::new();
        handle.complete();
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionId;
    use crate::battle::commands::TurnCommand;

    fn command_task(slot: FieldSlot) -> Task {
        Task::RunCommand(TurnCommand::use_action(slot, ActionId(1), vec![]))
    }

    #[test]
    fn after_current_inserts_keep_their_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at_end(Task::EndOfTurn);
        // Two reactive tasks queued while "some task" is running.
        scheduler.schedule_after_current(command_task(FieldSlot::ALLY_LEFT));
        scheduler.schedule_after_current(command_task(FieldSlot::FOE_LEFT));

        match scheduler.pop_next() {
            Some(Task::RunCommand(c)) => assert_eq!(c.slot, FieldSlot::ALLY_LEFT),
            other => panic!("unexpected task: {:?}", other),
        }
        match scheduler.pop_next() {
            Some(Task::RunCommand(c)) => assert_eq!(c.slot, FieldSlot::FOE_LEFT),
            other => panic!("unexpected task: {:?}", other),
        }
        assert!(matches!(scheduler.pop_next(), Some(Task::EndOfTurn)));
    }

    #[test]
    fn skipped_tasks_never_run() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at_end(command_task(FieldSlot::ALLY_LEFT));
        scheduler.schedule_at_end(command_task(FieldSlot::ALLY_RIGHT));
        scheduler.schedule_at_end(Task::EndOfTurn);

        scheduler.skip_pending_for(FieldSlot::ALLY_RIGHT);

        match scheduler.pop_next() {
            Some(Task::RunCommand(c)) => assert_eq!(c.slot, FieldSlot::ALLY_LEFT),
            other => panic!("unexpected task: {:?}", other),
        }
        assert!(matches!(scheduler.pop_next(), Some(Task::EndOfTurn)));
        assert!(scheduler.pop_next().is_none());
    }

    #[test]
    fn skip_all_preserves_bookkeeping_tasks() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at_end(command_task(FieldSlot::ALLY_LEFT));
        scheduler.schedule_at_end(Task::EncounterTransition);
        scheduler.schedule_at_end(command_task(FieldSlot::FOE_LEFT));
        scheduler.schedule_at_end(Task::EndOfTurn);
        scheduler.schedule_at_end(Task::Finalize);

        scheduler.skip_all_slot_tasks();

        assert!(matches!(scheduler.pop_next(), Some(Task::EncounterTransition)));
        assert!(matches!(scheduler.pop_next(), Some(Task::EndOfTurn)));
        assert!(matches!(scheduler.pop_next(), Some(Task::Finalize)));
        assert!(scheduler.pop_next().is_none());
    }

    #[test]
    fn completion_handle_is_shared() {
        let handle = CompletionHandle::new();
        let presenter_copy = handle.clone();
        assert!(!handle.is_complete());
        presenter_copy.complete();
        assert!(handle.is_complete());
    }
}
