use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use step_debugger::{RunMode, Scope, Tracer, Watched};

const SOURCE: &str = "line one\nline two\nline three\nline four\nline five\n\
line six\nline seven\nline eight\nline nine\nline ten\n";

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn tracer_with(commands: &str) -> (Tracer, Capture) {
    let out = Capture::default();
    let tracer = Tracer::new(Cursor::new(commands.to_string()), out.clone());
    (tracer, out)
}

// Pause once at `line` with `scope` in play and feed the scripted commands.
fn pause_with(commands: &str, line: u32, setup: impl Fn(&Arc<Scope>)) -> String {
    let (tracer, out) = tracer_with(commands);
    tracer.enter_fn(|| {
        let ctx = tracer.enter_fn(|| unreachable!()).unwrap();
        let scope = Scope::function_scope(SOURCE);
        setup(&scope);
        tracer.set_trace(ctx);
        tracer.line(ctx, &scope, line);
        tracer.exit_fn(ctx);
    });
    out.text()
}

#[test]
fn print_commands_resolve_variables() {
    let text = pause_with("count\nprint count\np count\nc\n", 1, |scope| {
        scope.declare("count", Arc::new(Watched::new(42)));
    });
    assert_eq!(text.matches("42").count(), 3);
}

#[test]
fn print_miss_reports_not_found() {
    let text = pause_with("print total\nc\n", 1, |_| {});
    assert!(text.contains("total: not found"));
}

#[test]
fn bare_unknown_input_is_not_recognized() {
    let text = pause_with("total\nc\n", 1, |_| {});
    assert!(text.contains("Command not recognized, sorry! You typed: \"total\""));
}

#[test]
fn help_prints_command_summary() {
    let text = pause_with("h\nc\n", 1, |_| {});
    assert!(text.contains("(p) print <var>: Print a variable."));
    assert!(text.contains("Commands may be given by their full name"));
}

#[test]
fn list_marks_current_line_and_clips_to_file() {
    let text = pause_with("l\nc\n", 2, |_| {});
    assert!(text.contains("--> line two"));
    assert!(text.contains("    line one"));
    assert!(text.contains("    line six"));
    // Four lines of context below line two end at line six.
    assert!(!text.contains("line seven"));
}

#[test]
fn list_clips_at_end_of_file() {
    let text = pause_with("l\nc\n", 10, |_| {});
    assert!(text.contains("--> line ten"));
    assert!(text.contains("    line six"));
}

#[test]
fn live_values_update_between_pauses() {
    let (tracer, out) = tracer_with("count\nn\ncount\nc\n");
    tracer.enter_fn(|| {
        let ctx = tracer.enter_fn(|| unreachable!()).unwrap();
        let scope = Scope::function_scope(SOURCE);
        let count = Watched::new(1);
        scope.declare("count", Arc::new(count.clone()));
        tracer.set_trace(ctx);

        tracer.line(ctx, &scope, 1); // print count (1), then "next"
        count.set(99);
        tracer.line(ctx, &scope, 2); // print count again (99)
        tracer.exit_fn(ctx);
    });
    let text = out.text();
    assert!(text.contains("1\n"));
    assert!(text.contains("99\n"));
}

#[test]
fn constants_do_not_change_between_pauses() {
    let (tracer, out) = tracer_with("limit\nn\nlimit\nc\n");
    tracer.enter_fn(|| {
        let ctx = tracer.enter_fn(|| unreachable!()).unwrap();
        let scope = Scope::function_scope(SOURCE);
        let mut limit = 10;
        scope.constant("limit", limit);
        tracer.set_trace(ctx);

        tracer.line(ctx, &scope, 1);
        limit += 5;
        let _ = limit;
        tracer.line(ctx, &scope, 2);
        tracer.exit_fn(ctx);
    });
    assert_eq!(out.text().matches("10").count(), 2);
}

#[test]
fn lookup_uses_innermost_scope_at_the_pause() {
    let (tracer, out) = tracer_with("x\nc\n");
    tracer.enter_fn(|| {
        let ctx = tracer.enter_fn(|| unreachable!()).unwrap();
        let scope = Scope::function_scope(SOURCE);
        scope.declare("x", Arc::new(Watched::new("outer")));
        let block = scope.child();
        block.declare("x", Arc::new(Watched::new("inner")));
        tracer.set_trace(ctx);

        tracer.line(ctx, &block, 1);
        tracer.exit_fn(ctx);
    });
    let text = out.text();
    assert!(text.contains("\"inner\""));
    assert!(!text.contains("\"outer\""));
}

#[test]
fn structs_print_through_the_value_formatter() {
    use serde::Serialize;

    #[derive(Serialize, Clone)]
    struct Point {
        x: i32,
        y: i32,
    }

    let text = pause_with("pt\nc\n", 1, |scope| {
        scope.declare("pt", Arc::new(Watched::new(Point { x: 3, y: -1 })));
    });
    assert!(text.contains(r#"{"x":3,"y":-1}"#));
}

#[test]
fn unrecognized_then_resume_leaves_state_clean() {
    let (tracer, out) = tracer_with("frobnicate 1 2\nnext\n");
    tracer.enter_fn(|| {
        let ctx = tracer.enter_fn(|| unreachable!()).unwrap();
        let scope = Scope::function_scope(SOURCE);
        tracer.set_trace(ctx);
        tracer.line(ctx, &scope, 1);
        assert_eq!(tracer.mode(), RunMode::Next);
        tracer.exit_fn(ctx);
    });
    assert!(out.text().contains("Command not recognized"));
}

#[test]
fn empty_input_just_reprompts() {
    let text = pause_with("\n\nc\n", 1, |_| {});
    assert!(!text.contains("Command not recognized"));
    assert_eq!(text.matches("(debug) ").count(), 3);
}
