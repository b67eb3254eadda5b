//! Shared progress map keyed by phase name.
//!
//! Workers of a phase report a percentage under the phase's name; callers
//! (the CLI, or a front-end polling the library) read snapshots.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

/// Phase key used while ingesting a source file.
pub const PHASE_PARSING: &str = "Parsing";

/// Phase key used while partitioning columns.
pub const PHASE_SPLITTING: &str = "Splitting";

/// Phase key used while building meshes.
pub const PHASE_MESHING: &str = "Creating Mesh";

/// Cloneable handle to a shared `phase -> percent` map.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<Mutex<BTreeMap<String, f64>>>,
}

impl ProgressTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, f64>> {
        // A worker that panicked mid-update leaves a valid map behind.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set the percentage for `phase`.
    pub fn update(&self, phase: &str, percent: f64) {
        debug!("{}: {:.2}%", phase, percent);
        self.lock().insert(phase.to_string(), percent);
    }

    /// Set `phase` to `done / total` as a percentage.
    pub fn update_fraction(&self, phase: &str, done: usize, total: usize) {
        let percent = if total == 0 {
            100.0
        } else {
            done as f64 / total as f64 * 100.0
        };
        self.update(phase, percent);
    }

    /// Current percentage of `phase`, if it has reported.
    pub fn get(&self, phase: &str) -> Option<f64> {
        self.lock().get(phase).copied()
    }

    /// Copy of the whole map.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_update_and_get() {
        let progress = ProgressTracker::new();
        assert_eq!(progress.get(PHASE_PARSING), None);

        progress.update(PHASE_PARSING, 12.5);
        progress.update_fraction(PHASE_MESHING, 1, 4);

        assert_eq!(progress.get(PHASE_PARSING), Some(12.5));
        assert_eq!(progress.get(PHASE_MESHING), Some(25.0));
        assert_eq!(progress.snapshot().len(), 2);
    }

    #[test]
    fn test_empty_phase_is_complete() {
        let progress = ProgressTracker::new();
        progress.update_fraction(PHASE_SPLITTING, 0, 0);
        assert_eq!(progress.get(PHASE_SPLITTING), Some(100.0));
    }

    #[test]
    fn test_shared_across_threads() {
        let progress = ProgressTracker::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let progress = progress.clone();
                thread::spawn(move || progress.update(&format!("phase-{i}"), i as f64))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(progress.snapshot().len(), 4);
    }
}
