//! Extraction operations and integrity validation.

use std::path::Path;

use crate::checksum::Crc32;
use crate::engine::{Engine, EngineHandle, OpenMode, Operation};
use crate::progress::Progress;
use crate::read::destination::{CallbackContext, ExtractionAction, Sink};
use crate::read::multivolume::VolumeQueue;
use crate::read::{Archive, Entry};
use crate::{Error, Result};

/// Cap on in-memory extraction: 100 MiB.
///
/// [`Archive::extract`] refuses larger entries with
/// [`Error::TooLargeMemory`] before touching the engine; use
/// [`Archive::extract_to_path`] or [`Archive::extract_with`] for big
/// entries.
pub const MAX_IN_MEMORY_SIZE: u64 = 100 * 1024 * 1024;

impl<E: Engine> Archive<E> {
    /// Extracts one entry into memory.
    ///
    /// The entry is located by path within a fresh extract-mode walk, its
    /// body is decoded into a buffer, and the result is verified: the
    /// byte count must match the declared size, and (unless the entry is
    /// encrypted, the archive is a volume set, or verification was
    /// disabled at open time) the CRC32 must match the header.
    ///
    /// Zero-size entries return an empty buffer without opening a handle.
    pub fn extract(&self, entry: &Entry) -> Result<Vec<u8>> {
        check_entry_name(entry)?;
        let size = entry.uncompressed_size;
        if size > MAX_IN_MEMORY_SIZE {
            return Err(Error::TooLargeMemory {
                size,
                limit: MAX_IN_MEMORY_SIZE,
            });
        }
        if size == 0 {
            return Ok(Vec::new());
        }
        let mut buf = Vec::with_capacity(size as usize);
        self.run_single(
            entry,
            Operation::Test,
            None,
            None,
            None,
            Sink::Memory {
                buf: &mut buf,
                declared: size,
            },
        )?;
        self.validate_in_memory(entry, &buf)?;
        Ok(buf)
    }

    /// Extracts one entry to the exact path `dest`, creating parent
    /// directories as needed.
    ///
    /// `progress` (if given) has the entry size added to its total and
    /// the decoded byte count streamed into its completed count.
    pub fn extract_to_path(
        &self,
        entry: &Entry,
        dest: impl AsRef<Path>,
        progress: Option<&Progress>,
    ) -> Result<()> {
        check_entry_name(entry)?;
        let dest = dest.as_ref();
        if let Some(progress) = progress {
            progress.add_total(entry.uncompressed_size);
        }
        if entry.is_directory {
            std::fs::create_dir_all(dest)?;
            return Ok(());
        }
        if entry.uncompressed_size == 0 {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(dest)?;
            return Ok(());
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.run_single(
            entry,
            Operation::Extract,
            None,
            Some(dest),
            progress,
            Sink::Discard,
        )
    }

    /// Streams one entry through `on_chunk` without touching the
    /// filesystem.
    ///
    /// Each call receives the decoded chunk and the progress so far; the
    /// chunk is already counted when the consumer runs. Returning an
    /// error aborts the decode and surfaces that same error. Zero-size
    /// entries invoke the consumer exactly once with an empty chunk.
    pub fn extract_with(
        &self,
        entry: &Entry,
        mut on_chunk: impl FnMut(&[u8], &Progress) -> Result<()>,
    ) -> Result<()> {
        check_entry_name(entry)?;
        let progress = Progress::new();
        progress.add_total(entry.uncompressed_size);
        if entry.uncompressed_size == 0 {
            return on_chunk(&[], &progress);
        }
        let mut consumer = |_: &Entry, chunk: &[u8]| on_chunk(chunk, &progress);
        self.run_single(
            entry,
            Operation::Test,
            None,
            None,
            Some(&progress),
            Sink::Consumer {
                entry,
                consumer: &mut consumer,
            },
        )
    }

    /// Extracts every file entry into `dest_dir`, keeping archive paths.
    ///
    /// Directory entries are skipped; the engine materializes directories
    /// for the files extracted beneath them. A shared `progress` covers
    /// the whole operation, its total growing as entries are visited.
    pub fn extract_all(
        &self,
        dest_dir: impl AsRef<Path>,
        progress: Option<&Progress>,
    ) -> Result<()> {
        let dest = dest_dir.as_ref().to_path_buf();
        self.walk_extract(progress, move |entry| {
            Ok(if entry.is_directory() {
                ExtractionAction::Skip
            } else {
                ExtractionAction::ToDirectory(dest.clone())
            })
        })
    }

    /// Walks every entry, letting `decide` choose a destination per
    /// entry.
    ///
    /// The walk visits headers in archive order; each decision consumes
    /// the entry (skip, stop, extract to a directory or file, or stream
    /// to a consumer). A [`Stop`](ExtractionAction::Stop) ends the walk
    /// without an error; an error from `decide` or from a consumer aborts
    /// it and is surfaced unchanged.
    pub fn extract_where<'a, F>(&self, decide: F) -> Result<()>
    where
        F: FnMut(&Entry) -> Result<ExtractionAction<'a>>,
    {
        self.walk_extract(None, decide)
    }

    /// Checks whether the session credential can read archive content.
    ///
    /// Archives without password protection validate as `true`. For
    /// header-encrypted archives the headers are listed; for
    /// body-encrypted archives the first encrypted file entry is
    /// test-decoded. Any failure, including a missing credential, reads
    /// as `false`.
    pub fn validate_password(&self) -> bool {
        if !self.is_password_protected() {
            return true;
        }
        if self.is_header_encrypted() {
            return self.entries().is_ok();
        }
        self.test_decode_first_encrypted().is_ok()
    }

    /// Locates `entry` by path and runs one body operation on it.
    ///
    /// Entries before the match are skipped with the callback context
    /// attached, so a skip across a volume boundary can still draw from
    /// the volume queue. The queue is shared across the whole walk.
    fn run_single(
        &self,
        entry: &Entry,
        operation: Operation,
        dest_dir: Option<&Path>,
        dest_file: Option<&Path>,
        progress: Option<&Progress>,
        sink: Sink<'_>,
    ) -> Result<()> {
        self.with_handle(OpenMode::Extract, 0, |opened| {
            let mut queue = VolumeQueue::new(&self.volumes);
            loop {
                let Some(raw) = opened.handle.read_header()? else {
                    return Err(Error::InvalidInput {
                        reason: format!("entry '{}' not found in archive", entry.path),
                    });
                };
                if raw.file_name == entry.path {
                    break;
                }
                let mut ctx = CallbackContext::new(
                    &mut queue,
                    self.password.as_ref(),
                    progress,
                    Sink::Discard,
                );
                let result = opened.handle.process(Operation::Skip, None, None, &mut ctx);
                ctx.finish(result)?;
            }
            let mut ctx =
                CallbackContext::new(&mut queue, self.password.as_ref(), progress, sink);
            let result = opened
                .handle
                .process(operation, dest_dir, dest_file, &mut ctx);
            ctx.finish(result)
        })
    }

    fn walk_extract<'a, F>(&self, progress: Option<&Progress>, mut decide: F) -> Result<()>
    where
        F: FnMut(&Entry) -> Result<ExtractionAction<'a>>,
    {
        self.with_handle(OpenMode::Extract, 0, |opened| {
            let mut queue = VolumeQueue::new(&self.volumes);
            while let Some(raw) = opened.handle.read_header()? {
                let entry = Entry::from_raw(raw);
                match decide(&entry)? {
                    ExtractionAction::Stop => break,
                    ExtractionAction::Skip => {
                        let mut ctx = CallbackContext::new(
                            &mut queue,
                            self.password.as_ref(),
                            progress,
                            Sink::Discard,
                        );
                        let result =
                            opened.handle.process(Operation::Skip, None, None, &mut ctx);
                        ctx.finish(result)?;
                    }
                    ExtractionAction::ToDirectory(dir) => {
                        if let Some(progress) = progress {
                            progress.add_total(entry.uncompressed_size);
                        }
                        let mut ctx = CallbackContext::new(
                            &mut queue,
                            self.password.as_ref(),
                            progress,
                            Sink::Discard,
                        );
                        let result = opened.handle.process(
                            Operation::Extract,
                            Some(&dir),
                            None,
                            &mut ctx,
                        );
                        ctx.finish(result)?;
                    }
                    ExtractionAction::ToFile(file) => {
                        if let Some(progress) = progress {
                            progress.add_total(entry.uncompressed_size);
                        }
                        if let Some(parent) = file.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        let mut ctx = CallbackContext::new(
                            &mut queue,
                            self.password.as_ref(),
                            progress,
                            Sink::Discard,
                        );
                        let result = opened.handle.process(
                            Operation::Extract,
                            None,
                            Some(&file),
                            &mut ctx,
                        );
                        ctx.finish(result)?;
                    }
                    ExtractionAction::ToConsumer(mut consumer) => {
                        if let Some(progress) = progress {
                            progress.add_total(entry.uncompressed_size);
                        }
                        if entry.uncompressed_size == 0 {
                            consumer(&entry, &[])?;
                            let mut ctx = CallbackContext::new(
                                &mut queue,
                                self.password.as_ref(),
                                progress,
                                Sink::Discard,
                            );
                            let result =
                                opened.handle.process(Operation::Skip, None, None, &mut ctx);
                            ctx.finish(result)?;
                        } else {
                            let mut ctx = CallbackContext::new(
                                &mut queue,
                                self.password.as_ref(),
                                progress,
                                Sink::Consumer {
                                    entry: &entry,
                                    consumer: &mut *consumer,
                                },
                            );
                            let result =
                                opened.handle.process(Operation::Test, None, None, &mut ctx);
                            ctx.finish(result)?;
                        }
                    }
                }
            }
            Ok(())
        })
    }

    fn test_decode_first_encrypted(&self) -> Result<()> {
        self.with_handle(OpenMode::Extract, 0, |opened| {
            let mut queue = VolumeQueue::new(&self.volumes);
            while let Some(raw) = opened.handle.read_header()? {
                let entry = Entry::from_raw(raw);
                let operation = if entry.is_file() && entry.is_encrypted() {
                    Operation::Test
                } else {
                    Operation::Skip
                };
                let mut ctx = CallbackContext::new(
                    &mut queue,
                    self.password.as_ref(),
                    None,
                    Sink::Discard,
                );
                let result = opened.handle.process(operation, None, None, &mut ctx);
                ctx.finish(result)?;
                if operation == Operation::Test {
                    return Ok(());
                }
            }
            // Nothing encrypted found to test against.
            Ok(())
        })
    }

    fn validate_in_memory(&self, entry: &Entry, data: &[u8]) -> Result<()> {
        if data.len() as u64 != entry.uncompressed_size {
            return Err(Error::BadData {
                reason: format!(
                    "decoded {} bytes, header declares {}",
                    data.len(),
                    entry.uncompressed_size
                ),
            });
        }
        if entry.is_encrypted || self.flags.is_volume() || self.ignore_crc_mismatches {
            return Ok(());
        }
        let actual = Crc32::compute(data);
        if actual != entry.crc32 {
            return Err(Error::CrcMismatch {
                entry: entry.path.clone(),
                expected: entry.crc32,
                actual,
            });
        }
        Ok(())
    }
}

fn check_entry_name(entry: &Entry) -> Result<()> {
    if entry.path.is_empty() {
        return Err(Error::BadData {
            reason: "entry has an empty file name".into(),
        });
    }
    Ok(())
}
