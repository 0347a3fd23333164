//! The operator command loop, entered synchronously from a line report on
//! the paused task. Every other task keeps running while the operator
//! deliberates.

use std::io::{BufRead, Write};
use std::sync::PoisonError;

use super::session::RunMode;
use super::Tracer;
use crate::scope::Scope;

const HELP: &str = "
Commands:
    (h) help: Print this help.
    (n) next: Run the next line.
    (s) step: Run for one step.
    (c) continue: Run until the next breakpoint.
    (l) list: Show the current line in context of the code around it.
    (p) print <var>: Print a variable.

Commands may be given by their full name or by their parenthesized abbreviation.
Any input that is not one of the above commands is interpreted as a variable name.
";

impl Tracer {
    /// Blocks on the command stream until the operator resumes execution or
    /// the stream ends. Runs on the paused task only.
    pub(crate) fn wait_for_input(&self, scope: &Scope, line: u32) {
        loop {
            {
                let mut out = self.out();
                write!(out, "(debug) ").ok();
                out.flush().ok();
            }

            let mut buf = String::new();
            let read = self
                .input
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .read_line(&mut buf);
            match read {
                // Command stream exhausted: never pause again.
                Ok(0) | Err(_) => {
                    writeln!(self.out(), "quitting session").ok();
                    self.session.set_mode(RunMode::Run);
                    return;
                }
                Ok(_) => {}
            }

            let cmd = buf.trim();
            match cmd {
                "" => continue,
                "?" | "h" | "help" => {
                    writeln!(self.out(), "{}", HELP).ok();
                    continue;
                }
                "n" | "next" => {
                    self.session.set_mode(RunMode::Next);
                    return;
                }
                "s" | "step" => {
                    self.session.set_mode(RunMode::Step);
                    return;
                }
                "c" | "continue" => {
                    self.session.set_mode(RunMode::Run);
                    return;
                }
                "l" | "list" => {
                    self.print_listing(scope.file_text(), line, 4);
                    continue;
                }
                _ => {}
            }

            // Bare identifier first, then an explicit print command.
            if let Some(value) = scope.lookup(cmd) {
                writeln!(self.out(), "{}", value).ok();
                continue;
            }
            let words = shlex::split(cmd).unwrap_or_default();
            if words.len() == 2 && (words[0] == "p" || words[0] == "print") {
                match scope.lookup(&words[1]) {
                    Some(value) => writeln!(self.out(), "{}", value).ok(),
                    None => writeln!(self.out(), "{}: not found", words[1]).ok(),
                };
                continue;
            }

            writeln!(
                self.out(),
                "Command not recognized, sorry! You typed: {:?}",
                cmd
            )
            .ok();
        }
    }

    /// `list`: the current line with `context` lines either side, clipped to
    /// the file, current line marked.
    fn print_listing(&self, lines: &[String], line: u32, context: usize) {
        let mut out = self.out();
        // Reported lines are 1-based.
        let current = line.saturating_sub(1) as usize;

        writeln!(out).ok();
        let first = current.saturating_sub(context);
        for i in first..=current + context {
            if i >= lines.len() {
                break;
            }
            let prefix = if i == current { "--> " } else { "    " };
            writeln!(out, "{}", format!("{}{}", prefix, lines[i]).trim_end()).ok();
        }
        writeln!(out).ok();
    }
}
