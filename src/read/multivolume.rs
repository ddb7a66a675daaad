//! Continuation volume resolution.

use std::collections::VecDeque;
use std::path::PathBuf;

/// FIFO queue of pending continuation volumes for one extraction
/// operation.
///
/// Caller order is preserved verbatim: no sorting, no directory probing.
/// The queue is consumed across the whole operation, so two split entries
/// extracted in one walk draw from the same sequence.
#[derive(Debug)]
pub(crate) struct VolumeQueue {
    pending: VecDeque<PathBuf>,
}

impl VolumeQueue {
    pub(crate) fn new(volumes: &[PathBuf]) -> Self {
        VolumeQueue {
            pending: volumes.iter().cloned().collect(),
        }
    }

    /// Takes the next volume, or `None` when the queue is exhausted.
    pub(crate) fn pop_front(&mut self) -> Option<PathBuf> {
        self.pending.pop_front()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.pending.len()
    }
}
