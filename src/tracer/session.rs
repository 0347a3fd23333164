use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU8, Ordering};

use crate::registry::TaskId;

/// Run modes for the debugger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Free running; no task pays more than an identity check per event.
    Run = 0,
    /// Step over: pause again once control is back at the pause depth.
    Next = 1,
    /// Pause at every reported line of the followed task.
    Step = 2,
}

impl RunMode {
    fn from_raw(raw: u8) -> RunMode {
        match raw {
            0 => RunMode::Run,
            1 => RunMode::Next,
            _ => RunMode::Step,
        }
    }
}

/// Process-wide debugger state: the run mode, the followed task, and the
/// depth counters the pause decision is made from.
///
/// Every field is atomic so events reported by non-followed tasks can check
/// `followed` and `mode` without locking and bail out. The depth counters
/// and flags are only ever written from the followed task, which is
/// suspended while the operator holds the session, so their updates never
/// race each other.
pub(crate) struct Session {
    mode: AtomicU8,
    followed: AtomicU32,
    /// Call depth of the followed task.
    depth: AtomicI32,
    /// Depth at which step-over re-pauses.
    pause_depth: AtomicI32,
    /// The followed task returned from a frame and has not reached a
    /// traceable statement in the parent yet.
    just_left: AtomicBool,
    skip_next_else_if: AtomicBool,
}

impl Session {
    pub(crate) fn new() -> Self {
        Session {
            mode: AtomicU8::new(RunMode::Run as u8),
            followed: AtomicU32::new(0),
            depth: AtomicI32::new(0),
            pause_depth: AtomicI32::new(0),
            just_left: AtomicBool::new(false),
            skip_next_else_if: AtomicBool::new(false),
        }
    }

    pub(crate) fn mode(&self) -> RunMode {
        RunMode::from_raw(self.mode.load(Ordering::SeqCst))
    }

    pub(crate) fn set_mode(&self, mode: RunMode) {
        self.mode.store(mode as u8, Ordering::SeqCst);
    }

    /// Whether `task` is the one under interactive control. Meaningless
    /// until the first activation, so every caller also gates on `mode`.
    pub(crate) fn is_followed(&self, task: TaskId) -> bool {
        self.followed.load(Ordering::SeqCst) == task.0
    }

    pub(crate) fn depth(&self) -> i32 {
        self.depth.load(Ordering::SeqCst)
    }

    pub(crate) fn pause_depth(&self) -> i32 {
        self.pause_depth.load(Ordering::SeqCst)
    }

    /// Entry bookkeeping for a task the registry already knows.
    pub(crate) fn entered(&self, task: TaskId) {
        if !self.is_followed(task) || self.mode() == RunMode::Run {
            return;
        }
        if self.just_left.swap(false, Ordering::SeqCst) {
            // The task ran an exit followed by this entry with no traceable
            // statement in between, probably through an uninstrumented
            // intermediate frame. Repair the step-over target.
            self.pause_depth.fetch_add(1, Ordering::SeqCst);
        }
        self.depth.fetch_add(1, Ordering::SeqCst);
    }

    /// Exit bookkeeping; the mirror of [`Session::entered`].
    pub(crate) fn exited(&self, task: TaskId) {
        if !self.is_followed(task) {
            return;
        }
        let mode = self.mode();
        if mode == RunMode::Run {
            return;
        }
        if mode == RunMode::Next && self.depth() == self.pause_depth() {
            self.pause_depth.fetch_sub(1, Ordering::SeqCst);
            self.just_left.store(true, Ordering::SeqCst);
        }
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn should_pause(&self, task: TaskId) -> bool {
        if !self.is_followed(task) {
            return false;
        }
        match self.mode() {
            RunMode::Step => true,
            RunMode::Next => self.depth() == self.pause_depth(),
            RunMode::Run => false,
        }
    }

    /// A pause is being taken at the current depth; step-over will re-arm
    /// here.
    pub(crate) fn pausing_here(&self) {
        self.pause_depth.store(self.depth(), Ordering::SeqCst);
        self.just_left.store(false, Ordering::SeqCst);
    }

    /// Starts following `task` in step mode. Ignored unless the session is
    /// free-running, which also makes a repeated activation while paused a
    /// no-op.
    pub(crate) fn activate(&self, task: TaskId) {
        if self.mode() != RunMode::Run {
            return;
        }
        self.followed.store(task.0, Ordering::SeqCst);
        self.set_mode(RunMode::Step);
    }

    pub(crate) fn arm_else_if_skip(&self) {
        self.skip_next_else_if.store(true, Ordering::SeqCst);
    }

    /// Clears the else-if suppression flag and reports whether it was set.
    pub(crate) fn consume_else_if_skip(&self) -> bool {
        self.skip_next_else_if.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASK: TaskId = TaskId(0);
    const OTHER: TaskId = TaskId(7);

    #[test]
    fn no_pause_before_activation() {
        let session = Session::new();
        assert!(!session.should_pause(TASK));
        assert_eq!(session.mode(), RunMode::Run);
    }

    #[test]
    fn activation_follows_task_in_step_mode() {
        let session = Session::new();
        session.activate(OTHER);
        assert_eq!(session.mode(), RunMode::Step);
        assert!(session.should_pause(OTHER));
        assert!(!session.should_pause(TASK));

        // Already active: a second activation does not re-follow.
        session.activate(TASK);
        assert!(session.should_pause(OTHER));
        assert!(!session.should_pause(TASK));
    }

    #[test]
    fn depth_matches_net_nesting() {
        let session = Session::new();
        session.activate(TASK);

        session.entered(TASK);
        session.entered(TASK);
        session.entered(TASK);
        assert_eq!(session.depth(), 3);
        session.exited(TASK);
        session.entered(TASK);
        session.exited(TASK);
        session.exited(TASK);
        session.exited(TASK);
        assert_eq!(session.depth(), 0);
    }

    #[test]
    fn non_followed_task_never_moves_depth() {
        let session = Session::new();
        session.activate(TASK);

        session.entered(OTHER);
        session.exited(OTHER);
        assert_eq!(session.depth(), 0);
        assert!(!session.should_pause(OTHER));
    }

    #[test]
    fn step_over_skips_deeper_frames() {
        let session = Session::new();
        session.activate(TASK);
        session.pausing_here();
        session.set_mode(RunMode::Next);

        session.entered(TASK);
        assert!(!session.should_pause(TASK));
        session.exited(TASK);
        assert!(session.should_pause(TASK));
    }

    #[test]
    fn exit_at_pause_depth_rearms_in_parent() {
        let session = Session::new();
        session.activate(TASK);
        session.entered(TASK);
        session.pausing_here();
        session.set_mode(RunMode::Next);

        // Leaving the frame the pause was taken in: the next entry repairs
        // pause_depth so the parent frame still pauses.
        session.exited(TASK);
        assert_eq!(session.pause_depth(), 0);
        session.entered(TASK);
        assert_eq!(session.pause_depth(), 1);
        assert!(session.should_pause(TASK));
    }
}
