mod commands;
mod events;
mod session;

pub use events::{
    case_arm, comm_arm, defer_call, else_if_expr, else_if_simple_stmt, end_select, enter_fn,
    enter_fn_lit, exit_fn, line, select_entry, set_trace,
};
pub use session::RunMode;

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::registry::{TaskId, TaskRegistry};
use session::Session;

/// Debugging context for one activation, handed out by the enter events and
/// passed back with every later event from the same activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Context {
    pub(crate) task: TaskId,
}

impl Context {
    pub fn task(&self) -> TaskId {
        self.task
    }
}

/// Inert marker returned by [`Tracer::case_arm`]; it carries no selection
/// weight in the enclosing construct.
pub struct CaseMarker;

/// Wait-construct arm handed out by [`Tracer::comm_arm`] and
/// [`Tracer::end_select`]. The arm owns both ends of its channel, so the
/// receiver stays connected and unready exactly as long as the enclosing
/// construct holds the arm, and everything drops together with it.
pub struct WaitArm {
    rx: Receiver<()>,
    _tx: Sender<()>,
}

impl WaitArm {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        WaitArm { rx, _tx: tx }
    }

    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}

/// The debugger runtime: pause decisions, task identities, and the operator
/// command loop. Instrumented code talks to a `Tracer` exclusively through
/// the event entry points.
pub struct Tracer {
    session: Session,
    registry: TaskRegistry,
    input: Mutex<Box<dyn BufRead + Send>>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl Tracer {
    pub fn new(input: impl BufRead + Send + 'static, output: impl Write + Send + 'static) -> Self {
        Tracer {
            session: Session::new(),
            registry: TaskRegistry::new(),
            input: Mutex::new(Box::new(input)),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Tracer over the process's stdin/stdout, the operator command
    /// protocol's usual home.
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }

    pub fn mode(&self) -> RunMode {
        self.session.mode()
    }

    /// Call depth of the followed task; meaningful only while following.
    pub fn current_depth(&self) -> i32 {
        self.session.depth()
    }

    fn out(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The process-wide tracer generated code reports to.
pub fn global() -> &'static Tracer {
    static GLOBAL: OnceLock<Tracer> = OnceLock::new();
    GLOBAL.get_or_init(Tracer::stdio)
}
