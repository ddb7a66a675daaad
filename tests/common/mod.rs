//! Shared test helpers: a scripted engine driving the session layer.
//!
//! The scripted engine implements the decoder-engine traits over an
//! in-memory blueprint, so tests can exercise every session behavior
//! (header walks, volume requests, password negotiation, chunked data
//! delivery, abort paths) without a native library or binary fixtures.

// Not all helpers are used by every test binary.
#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use runrar::checksum::Crc32;
use runrar::engine::{
    header_flags, ArchiveFlags, CommentOutcome, Engine, EngineCallback, EngineHandle, OpenMode,
    OpenRequest, OpenedArchive, Operation, RawHeader,
};
use runrar::{Archive, Error, OpenOptions, Result};

/// Fixed modification time used for scripted entries:
/// 2009-02-13 23:31:30 UTC.
pub const FIXED_MTIME_TICKS: u64 = (1_234_567_890 + 11_644_473_600) * 10_000_000;

/// One entry of a scripted archive.
#[derive(Debug, Clone)]
pub struct ScriptedEntry {
    pub name: String,
    pub data: Vec<u8>,
    /// Unpacked size to declare in the header; defaults to `data.len()`.
    pub declared_size: Option<u64>,
    /// CRC to declare in the header; defaults to the CRC of `data`.
    pub crc_override: Option<u32>,
    pub encrypted: bool,
    pub directory: bool,
    pub split_before: bool,
    pub split_after: bool,
    /// Number of continuation volumes the body decode requests.
    pub volumes_needed: usize,
}

impl ScriptedEntry {
    pub fn file(name: &str, data: &[u8]) -> Self {
        ScriptedEntry {
            name: name.to_string(),
            data: data.to_vec(),
            declared_size: None,
            crc_override: None,
            encrypted: false,
            directory: false,
            split_before: false,
            split_after: false,
            volumes_needed: 0,
        }
    }

    pub fn directory(name: &str) -> Self {
        ScriptedEntry {
            directory: true,
            ..ScriptedEntry::file(name, b"")
        }
    }

    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    pub fn declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }

    pub fn crc(mut self, crc: u32) -> Self {
        self.crc_override = Some(crc);
        self
    }

    pub fn needs_volumes(mut self, count: usize) -> Self {
        self.volumes_needed = count;
        self.split_before = count > 0;
        self
    }

    fn size(&self) -> u64 {
        self.declared_size.unwrap_or(self.data.len() as u64)
    }

    fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.encrypted {
            flags |= header_flags::ENCRYPTED;
        }
        if self.directory {
            flags |= header_flags::DIRECTORY;
        }
        if self.split_before {
            flags |= header_flags::SPLIT_BEFORE;
        }
        if self.split_after {
            flags |= header_flags::SPLIT_AFTER;
        }
        flags
    }
}

/// Blueprint of a scripted archive.
#[derive(Debug, Clone)]
pub struct ScriptedArchive {
    pub entries: Vec<ScriptedEntry>,
    pub comment: Option<String>,
    pub comment_truncated: bool,
    /// The credential the engine accepts, when anything is encrypted.
    pub password: Option<String>,
    pub header_encrypted: bool,
    pub volume_set: bool,
    /// Chunk size for data delivery.
    pub chunk_size: usize,
}

impl Default for ScriptedArchive {
    fn default() -> Self {
        ScriptedArchive {
            entries: Vec::new(),
            comment: None,
            comment_truncated: false,
            password: None,
            header_encrypted: false,
            volume_set: false,
            chunk_size: 7,
        }
    }
}

impl ScriptedArchive {
    pub fn with_entries(entries: Vec<ScriptedEntry>) -> Self {
        ScriptedArchive {
            entries,
            ..ScriptedArchive::default()
        }
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.comment = Some(text.to_string());
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn header_encrypted(mut self) -> Self {
        self.header_encrypted = true;
        self
    }

    pub fn volume_set(mut self) -> Self {
        self.volume_set = true;
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    fn archive_flags(&self) -> ArchiveFlags {
        let mut bits = 0;
        if self.comment.is_some() || self.comment_truncated {
            bits |= ArchiveFlags::COMMENT;
        }
        if self.header_encrypted {
            bits |= ArchiveFlags::ENC_HEADERS;
        }
        if self.volume_set {
            bits |= ArchiveFlags::VOLUME | ArchiveFlags::FIRST_VOLUME;
        }
        ArchiveFlags::from_bits(bits)
    }
}

/// Counts of native calls, shared between the engine and the test.
#[derive(Debug, Default, Clone)]
pub struct Counters {
    pub opens: usize,
    pub closes: usize,
    pub processes: usize,
    pub data_calls: usize,
}

pub struct ScriptedEngine {
    archive: ScriptedArchive,
    counters: Rc<RefCell<Counters>>,
}

pub struct ScriptedHandle {
    archive: ScriptedArchive,
    archive_name: String,
    mode: OpenMode,
    cursor: usize,
    password: Option<String>,
    counters: Rc<RefCell<Counters>>,
}

impl Drop for ScriptedHandle {
    fn drop(&mut self) {
        self.counters.borrow_mut().closes += 1;
    }
}

impl Engine for ScriptedEngine {
    type Handle = ScriptedHandle;

    fn open(&self, request: &OpenRequest<'_>) -> Result<OpenedArchive<ScriptedHandle>> {
        self.counters.borrow_mut().opens += 1;
        let comment = if request.comment_capacity == 0 {
            CommentOutcome::None
        } else if self.archive.comment_truncated {
            CommentOutcome::Truncated
        } else {
            match &self.archive.comment {
                Some(text) => CommentOutcome::Present(text.clone()),
                None => CommentOutcome::None,
            }
        };
        Ok(OpenedArchive {
            handle: ScriptedHandle {
                archive: self.archive.clone(),
                archive_name: request.path.to_string_lossy().into_owned(),
                mode: request.mode,
                cursor: 0,
                password: None,
                counters: Rc::clone(&self.counters),
            },
            flags: self.archive.archive_flags(),
            comment,
        })
    }
}

impl EngineHandle for ScriptedHandle {
    fn set_password(&mut self, password: &runrar::Password) -> Result<()> {
        self.password = Some(password.as_str().to_string());
        Ok(())
    }

    fn read_header(&mut self) -> Result<Option<RawHeader>> {
        if self.archive.header_encrypted {
            match (&self.password, &self.archive.password) {
                (None, _) => return Err(Error::MissingPassword),
                (Some(supplied), Some(expected)) if supplied != expected => {
                    return Err(Error::BadPassword);
                }
                _ => {}
            }
        }
        let Some(entry) = self.archive.entries.get(self.cursor) else {
            return Ok(None);
        };
        Ok(Some(RawHeader {
            archive_name: self.archive_name.clone(),
            file_name: entry.name.clone(),
            flags: entry.flags(),
            pack_size: entry.data.len() as u32,
            pack_size_high: 0,
            unp_size: (entry.size() & 0xFFFF_FFFF) as u32,
            unp_size_high: (entry.size() >> 32) as u32,
            host_os: 3,
            file_crc: entry
                .crc_override
                .unwrap_or_else(|| Crc32::compute(&entry.data)),
            file_time: 0,
            unp_ver: 50,
            method: 0x33,
            file_attr: 0o644,
            dict_size: 1 << 22,
            hash_type: 1,
            hash: [0; 32],
            mtime_low: (FIXED_MTIME_TICKS & 0xFFFF_FFFF) as u32,
            mtime_high: (FIXED_MTIME_TICKS >> 32) as u32,
            ctime_low: 0,
            ctime_high: 0,
            comment: None,
        }))
    }

    fn process(
        &mut self,
        operation: Operation,
        dest_dir: Option<&std::path::Path>,
        dest_file: Option<&std::path::Path>,
        callback: &mut dyn EngineCallback,
    ) -> Result<()> {
        self.counters.borrow_mut().processes += 1;
        let Some(entry) = self.archive.entries.get(self.cursor).cloned() else {
            return Err(Error::BadData {
                reason: "process called past end of archive".into(),
            });
        };
        self.cursor += 1;

        // Continuation volumes are requested whenever the cursor crosses
        // a boundary, for skips and decodes alike. List mode merges split
        // entries and never leaves the first volume.
        let crosses_boundary = self.mode == OpenMode::Extract;
        let boundary_requests = if crosses_boundary {
            entry.volumes_needed
        } else {
            0
        };
        for _ in 0..boundary_requests {
            match callback.next_volume(2048) {
                Some(path) => {
                    let _ = callback.volume_changed(&path);
                }
                None => return Err(Error::Unknown { code: 21 }),
            }
        }

        if operation == Operation::Skip || entry.directory {
            return Ok(());
        }

        if entry.encrypted {
            let supplied = match self.password.clone() {
                Some(existing) => Some(existing),
                None => match callback.need_password(128) {
                    Some(password) => {
                        let text = password.as_str().to_string();
                        self.password = Some(text.clone());
                        Some(text)
                    }
                    None => return Err(Error::Unknown { code: 21 }),
                },
            };
            let accepted = matches!(
                (&supplied, &self.archive.password),
                (Some(given), Some(expected)) if given == expected
            );
            if !accepted {
                return Err(Error::BadPassword);
            }
        }

        let mut output = if operation == Operation::Extract {
            let target = match (dest_file, dest_dir) {
                (Some(file), _) => file.to_path_buf(),
                (None, Some(dir)) => dir.join(&entry.name),
                (None, None) => {
                    return Err(Error::CreateFailed);
                }
            };
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|_| Error::CreateFailed)?;
            }
            Some(std::fs::File::create(&target).map_err(|_| Error::CreateFailed)?)
        } else {
            None
        };

        let chunk_size = self.archive.chunk_size.max(1);
        for chunk in entry.data.chunks(chunk_size) {
            self.counters.borrow_mut().data_calls += 1;
            match callback.data_chunk(chunk) {
                runrar::engine::Signal::Continue => {}
                runrar::engine::Signal::Abort => return Err(Error::Unknown { code: 21 }),
            }
            if let Some(file) = output.as_mut() {
                file.write_all(chunk).map_err(|_| Error::WriteFailed)?;
            }
        }
        Ok(())
    }
}

/// An opened scripted session plus its observability handles.
pub struct Fixture {
    pub archive: Archive<ScriptedEngine>,
    pub counters: Rc<RefCell<Counters>>,
    // Keeps the backing file alive for the session's lifetime.
    pub file: tempfile::NamedTempFile,
}

impl Fixture {
    pub fn counters(&self) -> Counters {
        self.counters.borrow().clone()
    }
}

/// Creates a real temp file carrying a RAR5 signature, so path checks
/// and the signature probe both pass.
pub fn scripted_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"Rar!\x1A\x07\x01\x00scripted").unwrap();
    file.flush().unwrap();
    file
}

/// Builds a scripted engine without opening anything.
pub fn engine(blueprint: ScriptedArchive) -> (ScriptedEngine, Rc<RefCell<Counters>>) {
    let counters = Rc::new(RefCell::new(Counters::default()));
    let engine = ScriptedEngine {
        archive: blueprint,
        counters: Rc::clone(&counters),
    };
    (engine, counters)
}

/// Opens a session over a scripted archive.
pub fn open(blueprint: ScriptedArchive, options: OpenOptions) -> Result<Fixture> {
    let counters = Rc::new(RefCell::new(Counters::default()));
    let engine = ScriptedEngine {
        archive: blueprint,
        counters: Rc::clone(&counters),
    };
    let file = scripted_file();
    let archive = Archive::open_with(engine, file.path(), options)?;
    Ok(Fixture {
        archive,
        counters,
        file,
    })
}

/// Opens a session that is expected to succeed.
pub fn open_ok(blueprint: ScriptedArchive) -> Fixture {
    open(blueprint, OpenOptions::new()).unwrap()
}
