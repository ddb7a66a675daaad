//! Extraction destinations and the callback context.
//!
//! During body processing the engine calls back into the session for three
//! things: decoded data chunks, the next continuation volume, and a
//! password it discovers it needs. [`CallbackContext`] answers all three
//! for one native call: it routes chunks into the selected [`Sink`], pops
//! volumes from the shared queue, replays the stored credential, and
//! captures the precise session-level error when it has to abort, so that
//! the generic abort code the engine returns can be replaced by the real
//! cause.

use std::path::{Path, PathBuf};

use crate::engine::{EngineCallback, Signal, MAX_VOLUME_PATH};
use crate::password::Password;
use crate::progress::Progress;
use crate::read::entry::Entry;
use crate::read::multivolume::VolumeQueue;
use crate::{Error, Result};

/// Per-entry decision returned by the closure given to
/// [`Archive::extract_where`](crate::Archive::extract_where).
pub enum ExtractionAction<'a> {
    /// Advance past this entry without decoding its body.
    Skip,
    /// Stop the walk; later entries are not visited.
    Stop,
    /// Extract into the given directory, keeping the entry's own path.
    ToDirectory(PathBuf),
    /// Extract to exactly the given file path.
    ToFile(PathBuf),
    /// Stream decoded chunks to the consumer; nothing is written to disk.
    ToConsumer(Box<dyn FnMut(&Entry, &[u8]) -> Result<()> + 'a>),
}

impl std::fmt::Debug for ExtractionAction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionAction::Skip => f.write_str("Skip"),
            ExtractionAction::Stop => f.write_str("Stop"),
            ExtractionAction::ToDirectory(p) => f.debug_tuple("ToDirectory").field(p).finish(),
            ExtractionAction::ToFile(p) => f.debug_tuple("ToFile").field(p).finish(),
            ExtractionAction::ToConsumer(_) => f.write_str("ToConsumer(..)"),
        }
    }
}

/// Where decoded chunks go during one `process` call.
pub(crate) enum Sink<'a> {
    /// Drop the bytes (skip walks, test decodes, file extraction where
    /// the engine writes the output itself).
    Discard,
    /// Collect into memory, guarding against output beyond the declared
    /// size.
    Memory {
        buf: &'a mut Vec<u8>,
        declared: u64,
    },
    /// Forward to a caller consumer.
    Consumer {
        entry: &'a Entry,
        consumer: &'a mut dyn FnMut(&Entry, &[u8]) -> Result<()>,
    },
}

/// Answers the engine's reentrant requests for one native call.
pub(crate) struct CallbackContext<'q, 's> {
    volumes: &'q mut VolumeQueue,
    password: Option<&'q Password>,
    progress: Option<&'q Progress>,
    sink: Sink<'s>,
    pending: Option<Error>,
}

impl<'q, 's> CallbackContext<'q, 's> {
    pub(crate) fn new(
        volumes: &'q mut VolumeQueue,
        password: Option<&'q Password>,
        progress: Option<&'q Progress>,
        sink: Sink<'s>,
    ) -> Self {
        CallbackContext {
            volumes,
            password,
            progress,
            sink,
            pending: None,
        }
    }

    fn abort_with(&mut self, error: Error) -> Signal {
        if self.pending.is_none() {
            self.pending = Some(error);
        }
        Signal::Abort
    }

    /// Replaces a generic engine abort error with the captured cause.
    ///
    /// The engine reports an aborted call with whatever code it has at
    /// hand; the context knows why it aborted.
    pub(crate) fn finish(mut self, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => match self.pending.take() {
                None => Ok(()),
                Some(error) => Err(error),
            },
            Err(engine_error) => Err(self.pending.take().unwrap_or(engine_error)),
        }
    }
}

impl EngineCallback for CallbackContext<'_, '_> {
    fn data_chunk(&mut self, chunk: &[u8]) -> Signal {
        if let Some(progress) = self.progress {
            progress.add_completed(chunk.len() as u64);
        }
        let failure = match &mut self.sink {
            Sink::Discard => None,
            Sink::Memory { buf, declared } => {
                let declared = *declared;
                if buf.len() as u64 + chunk.len() as u64 > declared {
                    Some(Error::BadData {
                        reason: format!(
                            "decoded output exceeds declared size of {declared} bytes"
                        ),
                    })
                } else {
                    buf.extend_from_slice(chunk);
                    None
                }
            }
            Sink::Consumer { entry, consumer } => consumer(entry, chunk).err(),
        };
        if let Some(error) = failure {
            return self.abort_with(error);
        }
        if self.progress.is_some_and(Progress::is_cancelled) {
            return self.abort_with(Error::Cancelled);
        }
        Signal::Continue
    }

    fn next_volume(&mut self, capacity: usize) -> Option<PathBuf> {
        let capacity = capacity.min(MAX_VOLUME_PATH);
        match self.volumes.pop_front() {
            Some(path) => {
                // Terminator included in the bound; never truncate.
                if path.as_os_str().len() + 1 > capacity {
                    self.abort_with(Error::SmallBuffer {
                        what: "volume path",
                    });
                    return None;
                }
                log::debug!("continuing into volume {}", path.display());
                Some(path)
            }
            None => {
                self.abort_with(Error::MissingVolume);
                None
            }
        }
    }

    fn volume_changed(&mut self, path: &Path) -> Signal {
        log::debug!("engine switched to volume {}", path.display());
        Signal::Continue
    }

    fn need_password(&mut self, capacity: usize) -> Option<Password> {
        match self.password {
            Some(password) => {
                if password.len() + 1 > capacity {
                    self.abort_with(Error::SmallBuffer { what: "password" });
                    return None;
                }
                Some(password.clone())
            }
            None => {
                self.abort_with(Error::MissingPassword);
                None
            }
        }
    }
}
