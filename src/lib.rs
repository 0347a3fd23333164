//! Runtime core for an interactive, line-stepping debugger of instrumented
//! programs: code rewritten so that every statement, branch, and function
//! boundary reports itself here before and after executing.

pub mod registry;
pub mod scope;
pub mod tracer;

pub use registry::TaskId;
pub use scope::{Scope, Slot, SlotFn, Value, Watched};
pub use tracer::{global, CaseMarker, Context, RunMode, Tracer, WaitArm};
