//! Task-local identity association.
//!
//! The event entry points are called from arbitrary depths of arbitrary call
//! stacks with no identity parameter threaded through, so the identity
//! established at a task's first reporting call is stored against the task
//! itself and recovered from anywhere below that frame.

use std::cell::Cell;

use super::TaskId;

thread_local! {
    static CURRENT_TASK: Cell<Option<TaskId>> = const { Cell::new(None) };
}

/// The identity associated with the calling task's stack, or `None` if no
/// instrumented frame of this task has reported in yet.
pub fn current_task() -> Option<TaskId> {
    CURRENT_TASK.with(Cell::get)
}

/// Associates `id` with the calling task for the duration of `f` and
/// everything `f` transitively invokes on this task.
pub fn run_as<R>(id: TaskId, f: impl FnOnce() -> R) -> R {
    let _restore = Restore(CURRENT_TASK.with(|c| c.replace(Some(id))));
    f()
}

// Restores the previous association on unwind as well as normal return.
struct Restore(Option<TaskId>);

impl Drop for Restore {
    fn drop(&mut self) {
        CURRENT_TASK.with(|c| c.set(self.0));
    }
}
