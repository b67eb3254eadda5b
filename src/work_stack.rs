//! Shared LIFO work stack drained by a fixed pool of worker loops.
//!
//! ```text
//! ┌──────────────┐  try_pop   ┌──────────┐
//! │  WorkStack   │◀──────────│ Worker 0 │──▶ outcome
//! │ Mutex<Vec<T>>│◀──────────│ Worker 1 │──▶ outcome
//! │              │◀──────────│ Worker N │──▶ outcome
//! └──────────────┘            └──────────┘
//! ```
//!
//! A pop that finds the lock busy reports [`Pop::Contended`] and the worker
//! retries; only [`Pop::Empty`] ends a worker loop.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, TryLockError};

use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};

/// Result of one non-blocking pop attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Pop<T> {
    /// An item was taken
    Item(T),
    /// Another worker holds the lock; try again
    Contended,
    /// The stack is drained
    Empty,
}

/// Mutex-guarded stack of pending work items.
#[derive(Debug, Default)]
pub struct WorkStack<T> {
    items: Mutex<Vec<T>>,
}

impl<T> WorkStack<T> {
    /// Create a stack holding `items`; the last item is popped first.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    /// Push one item.
    pub fn push(&self, item: T) {
        match self.items.lock() {
            Ok(mut items) => items.push(item),
            Err(poisoned) => poisoned.into_inner().push(item),
        }
    }

    /// Number of items still pending.
    pub fn len(&self) -> usize {
        match self.items.lock() {
            Ok(items) => items.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Whether the stack is drained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attempt to take the top item without blocking.
    pub fn try_pop(&self) -> Pop<T> {
        let mut items = match self.items.try_lock() {
            Ok(items) => items,
            Err(TryLockError::WouldBlock) => return Pop::Contended,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        match items.pop() {
            Some(item) => Pop::Item(item),
            None => Pop::Empty,
        }
    }

    /// Take the top item, retrying while the lock is contended.
    ///
    /// Returns `None` only once the stack is empty.
    pub fn pop(&self) -> Option<T> {
        let mut spins = 0u32;
        loop {
            match self.try_pop() {
                Pop::Item(item) => return Some(item),
                Pop::Empty => return None,
                Pop::Contended => {
                    spins += 1;
                    if spins < 64 {
                        std::hint::spin_loop();
                    } else {
                        std::thread::yield_now();
                    }
                }
            }
        }
    }
}

/// Drain `stack` with exactly `threads` worker loops on a dedicated pool.
///
/// Returns once every worker has seen the stack empty.
pub fn drain_with_pool<T, F>(
    threads: usize,
    stack: &WorkStack<T>,
    work: F,
) -> Result<(), ThreadPoolBuildError>
where
    T: Send,
    F: Fn(T) + Sync,
{
    let threads = threads.max(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("isomesh-worker-{i}"))
        .build()?;

    let work = &work;
    pool.scope(|scope| {
        for _ in 0..threads {
            scope.spawn(move |_| {
                while let Some(item) = stack.pop() {
                    work(item);
                }
            });
        }
    });
    Ok(())
}

/// Run one work item, turning a panic into an error message.
///
/// Keeps a single bad item from tearing down the whole pool.
pub fn catch_panic<R, F: FnOnce() -> R>(work: F) -> Result<R, String> {
    catch_unwind(AssertUnwindSafe(work)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
