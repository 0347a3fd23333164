//! Event entry points: the call surface instrumented code is rewritten to
//! invoke around every function boundary, statement, and branch arm.

use std::io::Write;

use super::session::RunMode;
use super::{global, CaseMarker, Context, Tracer, WaitArm};
use crate::registry::{self, TaskId};
use crate::scope::Scope;

impl Tracer {
    /// Marks the beginning of an instrumented function. Calling `body` must
    /// be equivalent to running the function being entered.
    ///
    /// If the calling task has reported in before, its context is returned
    /// and the caller runs the activation body itself. Otherwise the task is
    /// registered, `body` is run on the caller's behalf under the fresh
    /// identity, and `None` tells the caller to return immediately rather
    /// than duplicate the body's effects.
    pub fn enter_fn(&self, body: impl FnOnce()) -> Option<Context> {
        match registry::current_task() {
            Some(task) => {
                self.session.entered(task);
                Some(Context { task })
            }
            None => {
                let id = self.registry.acquire();
                let _release = ReleaseOnDrop { tracer: self, id };
                registry::run_as(id, body);
                None
            }
        }
    }

    /// Like [`Tracer::enter_fn`], but for function literals: the fresh-task
    /// path hands the context to `body` instead of returning it.
    pub fn enter_fn_lit(&self, body: impl FnOnce(Context)) -> Option<Context> {
        match registry::current_task() {
            Some(task) => {
                self.session.entered(task);
                Some(Context { task })
            }
            None => {
                let id = self.registry.acquire();
                let _release = ReleaseOnDrop { tracer: self, id };
                registry::run_as(id, || body(Context { task: id }));
                None
            }
        }
    }

    /// Marks the end of an instrumented function.
    pub fn exit_fn(&self, ctx: Context) {
        self.session.exited(ctx.task);
    }

    /// Marks a normal line where the debugger might pause.
    pub fn line(&self, ctx: Context, scope: &Scope, line: u32) {
        self.line_with_prefix(ctx, scope, line, "");
    }

    /// Marks a deferred call finally running.
    pub fn defer_call(&self, ctx: Context, scope: &Scope, line: u32) {
        self.line_with_prefix(ctx, scope, line, "<Running deferred function>: ");
    }

    /// Marks a match arm. Intended to be inserted immediately before the arm
    /// it marks; the returned marker takes no part in arm selection.
    pub fn case_arm(&self, ctx: Context, scope: &Scope, line: u32) -> CaseMarker {
        self.line(ctx, scope, line);
        CaseMarker
    }

    /// Marks one arm of a concurrent wait construct. The returned arm's
    /// receiver never becomes ready, so adding it as an extra arm leaves
    /// the construct's own selection semantics untouched.
    pub fn comm_arm(&self, ctx: Context, scope: &Scope, line: u32) -> WaitArm {
        self.line(ctx, scope, line);
        WaitArm::new()
    }

    /// Marks the end of a concurrent wait construct.
    pub fn end_select(&self, ctx: Context, _scope: &Scope) -> WaitArm {
        if self.session.should_pause(ctx.task) {
            writeln!(
                self.out(),
                "< All channel expressions evaluated. Choosing case to proceed. >"
            )
            .ok();
        }
        WaitArm::new()
    }

    /// Marks entry into a concurrent wait construct.
    pub fn select_entry(&self, ctx: Context, scope: &Scope, line: u32) {
        if !self.session.should_pause(ctx.task) {
            return;
        }
        self.line(ctx, scope, line);
        // Assumes the operator has not switched the session to another task;
        // there is no way to do that from the command loop today.
        if self.session.mode() != RunMode::Run {
            writeln!(
                self.out(),
                "< Evaluating channel expressions and RHS of send expressions. >"
            )
            .ok();
        }
    }

    /// Marks a simple statement guarding an `else if` condition.
    pub fn else_if_simple_stmt(&self, ctx: Context, scope: &Scope, line: u32) {
        self.line(ctx, scope, line);
        if self.session.mode() == RunMode::Next {
            // The condition's own report would double-count this step.
            self.session.arm_else_if_skip();
        }
    }

    /// Marks an `else if` condition. Suppressed exactly once after its
    /// guarding simple statement fired in step-over mode.
    pub fn else_if_expr(&self, ctx: Context, scope: &Scope, line: u32) {
        if !self.session.is_followed(ctx.task) {
            return;
        }
        if self.session.consume_else_if_skip() {
            return;
        }
        self.line(ctx, scope, line);
    }

    /// The entry point into interactive control: start following the
    /// reporting task in step mode. Ignored while a session is already
    /// active, so calling it again from a paused program is a no-op.
    pub fn set_trace(&self, ctx: Context) {
        self.session.activate(ctx.task);
    }

    pub(crate) fn line_with_prefix(&self, ctx: Context, scope: &Scope, line: u32, prefix: &str) {
        if !self.session.should_pause(ctx.task) {
            return;
        }
        self.session.pausing_here();
        writeln!(self.out(), "-> {}{}", prefix, scope.source_line(line).trim()).ok();
        self.wait_for_input(scope, line);
    }
}

struct ReleaseOnDrop<'a> {
    tracer: &'a Tracer,
    id: TaskId,
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.tracer.registry.release(self.id);
    }
}

// Free-function forms over the process-wide tracer, the surface generated
// code actually calls.

pub fn enter_fn(body: impl FnOnce()) -> Option<Context> {
    global().enter_fn(body)
}

pub fn enter_fn_lit(body: impl FnOnce(Context)) -> Option<Context> {
    global().enter_fn_lit(body)
}

pub fn exit_fn(ctx: Context) {
    global().exit_fn(ctx);
}

pub fn line(ctx: Context, scope: &Scope, line: u32) {
    global().line(ctx, scope, line);
}

pub fn defer_call(ctx: Context, scope: &Scope, line: u32) {
    global().defer_call(ctx, scope, line);
}

pub fn case_arm(ctx: Context, scope: &Scope, line: u32) -> CaseMarker {
    global().case_arm(ctx, scope, line)
}

pub fn comm_arm(ctx: Context, scope: &Scope, line: u32) -> WaitArm {
    global().comm_arm(ctx, scope, line)
}

pub fn end_select(ctx: Context, scope: &Scope) -> WaitArm {
    global().end_select(ctx, scope)
}

pub fn select_entry(ctx: Context, scope: &Scope, line: u32) {
    global().select_entry(ctx, scope, line);
}

pub fn else_if_simple_stmt(ctx: Context, scope: &Scope, line: u32) {
    global().else_if_simple_stmt(ctx, scope, line);
}

pub fn else_if_expr(ctx: Context, scope: &Scope, line: u32) {
    global().else_if_expr(ctx, scope, line);
}

pub fn set_trace(ctx: Context) {
    global().set_trace(ctx);
}
