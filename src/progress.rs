//! Extraction progress reporting and cooperative cancellation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Byte-level progress of an extraction, shareable by reference.
///
/// All state is atomic, so a `&Progress` can be observed from another thread
/// while an extraction runs. Within one extraction call the completed count
/// only ever grows.
///
/// Cancellation is cooperative: call [`cancel`](Progress::cancel) from any
/// thread and the extraction stops at the next chunk boundary with
/// [`Error::Cancelled`](crate::Error::Cancelled). Data decoded before the
/// flag was observed may already have reached the destination.
///
/// # Example
///
/// ```rust,ignore
/// let progress = runrar::Progress::new();
/// archive.extract_to_path(&entry, &dest, Some(&progress))?;
/// println!("{:.0}% done", progress.fraction() * 100.0);
/// ```
#[derive(Debug, Default)]
pub struct Progress {
    total: AtomicU64,
    completed: AtomicU64,
    cancelled: AtomicBool,
}

impl Progress {
    /// Creates a progress tracker with no total set yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of bytes expected, as currently known.
    ///
    /// Grows as entries are added to the operation; for a single-entry
    /// extraction it is set once, up front.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Number of bytes decoded so far.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Completed fraction in `0.0..=1.0`; `0.0` while no total is known.
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.completed() as f64 / total as f64).min(1.0)
    }

    /// Returns true once completed has reached the expected total.
    ///
    /// Trivially true for zero-size work.
    pub fn is_complete(&self) -> bool {
        self.completed() >= self.total()
    }

    /// Requests cancellation. Observed at the next chunk boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn add_total(&self, bytes: u64) {
        self.total.fetch_add(bytes, Ordering::AcqRel);
    }

    pub(crate) fn add_completed(&self, bytes: u64) {
        self.completed.fetch_add(bytes, Ordering::AcqRel);
    }
}
