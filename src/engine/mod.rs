//! The decoder-engine contract.
//!
//! Everything above this module is a session layer: it owns handle
//! lifecycles, walks headers, answers mid-decode requests, and routes
//! decoded bytes. The decompression and decryption work itself is done by
//! an *engine* behind the traits defined here. The crate ships one engine,
//! [`ffi::NativeEngine`] over a system libunrar (feature `ffi`); tests run
//! against scripted engines implementing the same traits.
//!
//! The contract follows the unrar DLL API closely: the same open modes,
//! operations, result codes, header fields and flag words, but with the
//! raw function-pointer callback replaced by a trait object borrowed for
//! exactly one [`EngineHandle::process`] call, and manual handle closing
//! replaced by `Drop`.

use std::path::{Path, PathBuf};

use crate::password::Password;
use crate::Result;

#[cfg(feature = "ffi")]
pub mod ffi;

/// Native result codes, as the unrar DLL defines them.
///
/// These never appear in the public API;
/// [`Error::from_native`](crate::Error::from_native) maps them exactly
/// once at the engine boundary.
pub mod code {
    /// Operation succeeded.
    pub const SUCCESS: u32 = 0;
    /// No more headers. A sentinel, not an error.
    pub const END_ARCHIVE: u32 = 10;
    /// Engine out of memory.
    pub const NO_MEMORY: u32 = 11;
    /// Damaged archive data.
    pub const BAD_DATA: u32 = 12;
    /// Not a valid archive.
    pub const BAD_ARCHIVE: u32 = 13;
    /// Format not recognized.
    pub const UNKNOWN_FORMAT: u32 = 14;
    /// Could not open a volume file.
    pub const OPEN_FAILED: u32 = 15;
    /// Could not create an output file.
    pub const CREATE_FAILED: u32 = 16;
    /// Could not close the archive.
    pub const CLOSE_FAILED: u32 = 17;
    /// Could not read archive data.
    pub const READ_FAILED: u32 = 18;
    /// Could not write extracted data.
    pub const WRITE_FAILED: u32 = 19;
    /// A response buffer was too small.
    pub const SMALL_BUFFER: u32 = 20;
    /// Unclassified engine failure.
    pub const UNKNOWN: u32 = 21;
    /// Password required but not supplied.
    pub const MISSING_PASSWORD: u32 = 22;
    /// Reference entry cannot be processed alone.
    pub const REFERENCE: u32 = 23;
    /// Wrong password.
    pub const BAD_PASSWORD: u32 = 24;
}

/// Upper bound on a volume path response, in bytes (including terminator).
pub const MAX_VOLUME_PATH: usize = 65_536;

/// How an archive handle is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Header walking only; split entries are merged into one record.
    List,
    /// Headers plus body processing.
    Extract,
    /// Header walking that reports each split part separately.
    ListIncSplit,
}

impl OpenMode {
    /// The native mode constant.
    pub fn as_native(self) -> u32 {
        match self {
            OpenMode::List => 0,
            OpenMode::Extract => 1,
            OpenMode::ListIncSplit => 2,
        }
    }
}

/// What to do with the entry under the header cursor.
///
/// Every variant advances the cursor past the entry, including its
/// continuation parts on later volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Advance without decoding the body.
    Skip,
    /// Decode the body, emitting data callbacks, without writing files.
    Test,
    /// Decode the body and write the output file.
    Extract,
}

impl Operation {
    /// The native operation constant.
    pub fn as_native(self) -> u32 {
        match self {
            Operation::Skip => 0,
            Operation::Test => 1,
            Operation::Extract => 2,
        }
    }
}

/// Archive-level flag word reported at open time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveFlags {
    bits: u32,
}

impl ArchiveFlags {
    /// Part of a multi-volume set.
    pub const VOLUME: u32 = 0x0001;
    /// Archive carries a comment.
    pub const COMMENT: u32 = 0x0002;
    /// Archive is locked against modification.
    pub const LOCK: u32 = 0x0004;
    /// Solid compression.
    pub const SOLID: u32 = 0x0008;
    /// New-style volume numbering.
    pub const NEW_NUMBERING: u32 = 0x0010;
    /// Archive carries an authenticity signature.
    pub const SIGNED: u32 = 0x0020;
    /// Recovery record present.
    pub const RECOVERY: u32 = 0x0040;
    /// Headers are encrypted.
    pub const ENC_HEADERS: u32 = 0x0080;
    /// First volume of the set.
    pub const FIRST_VOLUME: u32 = 0x0100;

    /// Wraps a raw flag word.
    pub fn from_bits(bits: u32) -> Self {
        ArchiveFlags { bits }
    }

    /// The raw flag word.
    pub fn bits(self) -> u32 {
        self.bits
    }

    fn has(self, flag: u32) -> bool {
        self.bits & flag != 0
    }

    /// Part of a multi-volume set.
    pub fn is_volume(self) -> bool {
        self.has(Self::VOLUME)
    }

    /// Archive carries a comment.
    pub fn has_comment(self) -> bool {
        self.has(Self::COMMENT)
    }

    /// Locked against modification.
    pub fn is_locked(self) -> bool {
        self.has(Self::LOCK)
    }

    /// Solid compression.
    pub fn is_solid(self) -> bool {
        self.has(Self::SOLID)
    }

    /// New-style volume numbering.
    pub fn has_new_numbering(self) -> bool {
        self.has(Self::NEW_NUMBERING)
    }

    /// Carries an authenticity signature.
    pub fn is_signed(self) -> bool {
        self.has(Self::SIGNED)
    }

    /// Recovery record present.
    pub fn has_recovery_record(self) -> bool {
        self.has(Self::RECOVERY)
    }

    /// Headers are encrypted (listing requires the password).
    pub fn headers_encrypted(self) -> bool {
        self.has(Self::ENC_HEADERS)
    }

    /// First volume of the set.
    pub fn is_first_volume(self) -> bool {
        self.has(Self::FIRST_VOLUME)
    }
}

/// Per-entry header flag bits.
pub mod header_flags {
    /// Entry continues from the previous volume.
    pub const SPLIT_BEFORE: u32 = 0x01;
    /// Entry continues on the next volume.
    pub const SPLIT_AFTER: u32 = 0x02;
    /// Entry body is encrypted.
    pub const ENCRYPTED: u32 = 0x04;
    /// Entry belongs to a solid block.
    pub const SOLID: u32 = 0x10;
    /// Entry is a directory.
    pub const DIRECTORY: u32 = 0x20;
}

/// One header record exactly as the engine reports it.
///
/// Sizes and extended timestamps arrive as 32-bit halves; assembly into
/// 64-bit values is the session layer's job (see [`Entry`](crate::Entry)).
#[derive(Debug, Clone, Default)]
pub struct RawHeader {
    /// Name of the volume file the header was read from.
    pub archive_name: String,
    /// Entry path, with `/` separators.
    pub file_name: String,
    /// Per-entry flag bits ([`header_flags`]).
    pub flags: u32,
    /// Low half of the packed size.
    pub pack_size: u32,
    /// High half of the packed size.
    pub pack_size_high: u32,
    /// Low half of the unpacked size.
    pub unp_size: u32,
    /// High half of the unpacked size.
    pub unp_size_high: u32,
    /// Host operating system code.
    pub host_os: u32,
    /// CRC32 of the unpacked entry data.
    pub file_crc: u32,
    /// DOS-format modification time (legacy field).
    pub file_time: u32,
    /// Minimum engine version required, `major * 10 + minor`.
    pub unp_ver: u32,
    /// Compression method code (`0x30..=0x35`).
    pub method: u32,
    /// Host-OS-specific file attribute bits.
    pub file_attr: u32,
    /// Dictionary size used for compression, in bytes.
    pub dict_size: u32,
    /// Hash algorithm code for `hash`.
    pub hash_type: u32,
    /// Raw hash value (Blake2sp for RAR5 when enabled).
    pub hash: [u8; 32],
    /// Low half of the FILETIME modification time.
    pub mtime_low: u32,
    /// High half of the FILETIME modification time.
    pub mtime_high: u32,
    /// Low half of the FILETIME creation time.
    pub ctime_low: u32,
    /// High half of the FILETIME creation time.
    pub ctime_high: u32,
    /// Entry comment, if the engine surfaced one.
    pub comment: Option<String>,
}

/// Parameters for opening an archive handle.
#[derive(Debug)]
pub struct OpenRequest<'a> {
    /// Path of the first volume to open.
    pub path: &'a Path,
    /// Open mode.
    pub mode: OpenMode,
    /// Capacity of the comment buffer to offer, in bytes. Zero skips
    /// comment retrieval.
    pub comment_capacity: usize,
}

/// The archive comment as captured at open time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    /// No comment present, or none was requested.
    None,
    /// Comment retrieved in full.
    Present(String),
    /// A comment exists but did not fit the offered buffer.
    Truncated,
}

/// A successfully opened handle plus the open-time metadata.
#[derive(Debug)]
pub struct OpenedArchive<H> {
    /// The open handle. Closed on drop.
    pub handle: H,
    /// Archive-level flags.
    pub flags: ArchiveFlags,
    /// Archive comment outcome.
    pub comment: CommentOutcome,
}

/// Reply from a reentrant callback: keep decoding or abort the native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Keep going.
    Continue,
    /// Abort the in-flight native call.
    Abort,
}

/// The reentrant surface the engine calls back into mid-decode.
///
/// A callback is borrowed for exactly one [`EngineHandle::process`] call
/// and must not retain engine state beyond it.
pub trait EngineCallback {
    /// A chunk of decoded bytes. The slice is only valid for the duration
    /// of the call.
    fn data_chunk(&mut self, chunk: &[u8]) -> Signal;

    /// The engine needs the next volume. Return its path, or `None` to
    /// abort. `capacity` is the engine's response buffer size in bytes,
    /// including the terminator; a path that does not fit must not be
    /// returned truncated.
    fn next_volume(&mut self, capacity: usize) -> Option<PathBuf>;

    /// The engine switched to the named volume on its own.
    fn volume_changed(&mut self, path: &Path) -> Signal {
        let _ = path;
        Signal::Continue
    }

    /// The engine needs a password mid-decode. Return the credential, or
    /// `None` to abort. `capacity` bounds the response including the
    /// terminator.
    fn need_password(&mut self, capacity: usize) -> Option<Password>;
}

/// An open archive handle.
///
/// Implementations close the native handle in `Drop`, which therefore runs
/// on every exit path, including panics.
pub trait EngineHandle {
    /// Supplies the password for header decryption and for bodies
    /// processed without a callback attached.
    fn set_password(&mut self, password: &Password) -> Result<()>;

    /// Reads the header under the cursor. `Ok(None)` means end of archive.
    fn read_header(&mut self) -> Result<Option<RawHeader>>;

    /// Processes the entry under the cursor and advances past it.
    ///
    /// `dest_dir` and `dest_file` name the output location for
    /// [`Operation::Extract`]; both are ignored for `Skip` and `Test`.
    /// The callback stays attached for the whole call and receives data
    /// chunks, volume requests and password requests.
    fn process(
        &mut self,
        operation: Operation,
        dest_dir: Option<&Path>,
        dest_file: Option<&Path>,
        callback: &mut dyn EngineCallback,
    ) -> Result<()>;
}

/// A RAR decoding engine.
pub trait Engine {
    /// The handle type produced by [`Engine::open`].
    type Handle: EngineHandle;

    /// Opens an archive, returning the handle together with archive flags
    /// and the comment outcome.
    fn open(&self, request: &OpenRequest<'_>) -> Result<OpenedArchive<Self::Handle>>;
}
