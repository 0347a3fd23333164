// A hand-instrumented sample program, shaped the way the code generator
// rewrites source: each function re-enters itself through `enter_fn`, and
// every statement reports its line before running. Run it and type `help`
// at the `(debug) ` prompt.

use std::sync::Arc;

use step_debugger::{global, Scope, Watched};

const SOURCE: &str = "\
fn main() {
    let total = Watched::new(0i64);
    for n in 1..=3 {
        add(&total, n);
    }
    println!(\"total = {}\", total.get());
}

fn add(total: &Watched<i64>, n: i64) {
    total.update(|t| *t += n);
}
";

fn main() {
    traced_main();
}

fn traced_main() {
    let ctx = match global().enter_fn(traced_main) {
        Some(ctx) => ctx,
        None => return,
    };
    let scope = Scope::function_scope(SOURCE);

    global().set_trace(ctx);

    global().line(ctx, &scope, 2);
    let total = Watched::new(0i64);
    scope.declare("total", Arc::new(total.clone()));

    for n in 1..=3i64 {
        let scope = scope.child();
        scope.constant("n", n);
        global().line(ctx, &scope, 4);
        traced_add(&total, n);
    }

    global().line(ctx, &scope, 6);
    println!("total = {}", total.get());

    global().exit_fn(ctx);
}

fn traced_add(total: &Watched<i64>, n: i64) {
    let ctx = match global().enter_fn(|| traced_add(total, n)) {
        Some(ctx) => ctx,
        None => return,
    };
    let scope = Scope::function_scope(SOURCE);
    scope.declare("total", Arc::new(total.clone()));
    scope.constant("n", n);

    global().line(ctx, &scope, 10);
    total.update(|t| *t += n);

    global().exit_fn(ctx);
}
