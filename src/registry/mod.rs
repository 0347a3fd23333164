mod local;

pub use local::{current_task, run_as};

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Identity of one concurrently executing logical task, for the lifetime of
/// that task's participation in debugging. Identities are small integers and
/// may be reused after release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(pub u32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {}", self.0)
    }
}

/// Lowest-available-integer pool: released ids are handed out again before
/// the high-water mark advances.
struct IdPool {
    free: BinaryHeap<Reverse<u32>>,
    next: u32,
}

impl IdPool {
    fn new() -> Self {
        Self {
            free: BinaryHeap::new(),
            next: 0,
        }
    }

    fn acquire(&mut self) -> TaskId {
        match self.free.pop() {
            Some(Reverse(id)) => TaskId(id),
            None => {
                let id = self.next;
                self.next += 1;
                TaskId(id)
            }
        }
    }

    fn release(&mut self, id: TaskId) {
        self.free.push(Reverse(id.0));
    }
}

/// Hands out task identities. The pool lock is taken once per task lifetime
/// (first reporting call and its return), never per event.
pub struct TaskRegistry {
    pool: Mutex<IdPool>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            pool: Mutex::new(IdPool::new()),
        }
    }

    pub fn acquire(&self) -> TaskId {
        self.lock_pool().acquire()
    }

    pub fn release(&self, id: TaskId) {
        self.lock_pool().release(id);
    }

    fn lock_pool(&self) -> std::sync::MutexGuard<'_, IdPool> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_hands_out_lowest_available() {
        let registry = TaskRegistry::new();
        assert_eq!(registry.acquire(), TaskId(0));
        assert_eq!(registry.acquire(), TaskId(1));
        assert_eq!(registry.acquire(), TaskId(2));

        registry.release(TaskId(1));
        assert_eq!(registry.acquire(), TaskId(1));
        assert_eq!(registry.acquire(), TaskId(3));
    }

    #[test]
    fn released_ids_are_reused_before_fresh_ones() {
        let registry = TaskRegistry::new();
        let a = registry.acquire();
        let b = registry.acquire();
        registry.release(a);
        registry.release(b);

        assert_eq!(registry.acquire(), TaskId(0));
        assert_eq!(registry.acquire(), TaskId(1));
    }

    #[test]
    fn run_as_scopes_the_association() {
        assert_eq!(current_task(), None);
        let seen = run_as(TaskId(4), || {
            let inner = run_as(TaskId(9), current_task);
            assert_eq!(inner, Some(TaskId(9)));
            current_task()
        });
        assert_eq!(seen, Some(TaskId(4)));
        assert_eq!(current_task(), None);
    }

    #[test]
    fn run_as_restores_on_panic() {
        let result = std::panic::catch_unwind(|| {
            run_as(TaskId(2), || panic!("boom"));
        });
        assert!(result.is_err());
        assert_eq!(current_task(), None);
    }
}
