mod slot;

pub use slot::{Slot, SlotFn, Value, Watched};

use slot::to_value_or_die;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

/// A lexical scope for variable bindings.
///
/// Scopes form a parent-linked chain; name resolution walks from the
/// innermost scope outward. Every child scope created inside one function
/// activation shares that activation's source text by reference.
pub struct Scope {
    vars: RwLock<HashMap<String, Arc<dyn Slot>>>,
    consts: RwLock<HashMap<String, Value>>,
    parent: Option<Arc<Scope>>,
    file_text: Arc<Vec<String>>,
}

impl Scope {
    /// Scope for a new function activation; snapshots a fresh line list from
    /// `source`.
    pub fn function_scope(source: &str) -> Arc<Scope> {
        Arc::new(Scope {
            vars: RwLock::new(HashMap::new()),
            consts: RwLock::new(HashMap::new()),
            parent: None,
            file_text: Arc::new(parse_lines(source)),
        })
    }

    /// Scope for a nested block; shares the parent's source text.
    pub fn child(self: &Arc<Self>) -> Arc<Scope> {
        Arc::new(Scope {
            vars: RwLock::new(HashMap::new()),
            consts: RwLock::new(HashMap::new()),
            parent: Some(Arc::clone(self)),
            file_text: Arc::clone(&self.file_text),
        })
    }

    /// Binds a live variable slot. The slot should reference the value in
    /// the program rather than a copy of it, so lookups track changes to it.
    pub fn declare(&self, name: &str, slot: Arc<dyn Slot>) {
        write_map(&self.vars).insert(name.to_string(), slot);
    }

    /// Like `declare`, but for constants. The value is copied now and never
    /// changes afterwards.
    pub fn constant<T: Serialize>(&self, name: &str, value: T) {
        let value = to_value_or_die(&value);
        write_map(&self.consts).insert(name.to_string(), value);
    }

    /// Resolves `name` against the chain, innermost scope first. Within one
    /// scope, variable slots are checked (and dereferenced to the live
    /// value) before constants.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self;
        loop {
            if let Some(slot) = read_map(&current.vars).get(name) {
                return Some(slot.current_value());
            }
            if let Some(value) = read_map(&current.consts).get(name) {
                return Some(value.clone());
            }
            match &current.parent {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    pub fn file_text(&self) -> &Arc<Vec<String>> {
        &self.file_text
    }

    /// The 1-based source line from this activation's snapshot. A line the
    /// snapshot does not contain is a code generator bug.
    pub(crate) fn source_line(&self, line: u32) -> &str {
        let text = (line as usize)
            .checked_sub(1)
            .and_then(|i| self.file_text.get(i));
        match text {
            Some(text) => text,
            None => panic!(
                "programming error: reported line {} outside source text ({} lines)",
                line,
                self.file_text.len()
            ),
        }
    }
}

fn parse_lines(text: &str) -> Vec<String> {
    // str::lines treats a trailing newline as a terminator, not as starting
    // an extra empty line.
    text.lines().map(str::to_string).collect()
}

fn read_map<T>(map: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    map.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_map<T>(map: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    map.write().unwrap_or_else(PoisonError::into_inner)
}
