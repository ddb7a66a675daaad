//! Header iteration in list mode.

use std::path::PathBuf;

use crate::engine::{Engine, EngineCallback, EngineHandle, OpenMode, Operation, Signal};
use crate::password::Password;
use crate::read::{Archive, Entry};
use crate::Result;

/// Callback for walks that must not answer anything: list-mode skips
/// never decode bodies, so every request is refused.
struct IdleCallback;

impl EngineCallback for IdleCallback {
    fn data_chunk(&mut self, _chunk: &[u8]) -> Signal {
        Signal::Continue
    }

    fn next_volume(&mut self, _capacity: usize) -> Option<PathBuf> {
        None
    }

    fn need_password(&mut self, _capacity: usize) -> Option<Password> {
        None
    }
}

impl<E: Engine> Archive<E> {
    /// Lists every entry of the archive.
    ///
    /// Walks all headers in list mode, skipping each body. Split entries
    /// are merged into a single record. For header-encrypted archives
    /// this surfaces [`Error::MissingPassword`](crate::Error::MissingPassword)
    /// or [`Error::BadPassword`](crate::Error::BadPassword) when the
    /// session credential is absent or wrong.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        self.with_handle(OpenMode::List, 0, |opened| {
            let mut entries = Vec::new();
            let mut idle = IdleCallback;
            while let Some(raw) = opened.handle.read_header()? {
                entries.push(Entry::from_raw(raw));
                opened
                    .handle
                    .process(Operation::Skip, None, None, &mut idle)?;
            }
            Ok(entries)
        })
    }

    /// Total uncompressed size of all entries, computed by listing.
    pub fn uncompressed_size(&self) -> Result<u64> {
        Ok(self
            .entries()?
            .iter()
            .map(Entry::uncompressed_size)
            .sum())
    }

    /// Total compressed size of all entries, computed by listing.
    pub fn compressed_size(&self) -> Result<u64> {
        Ok(self.entries()?.iter().map(Entry::compressed_size).sum())
    }
}
