//! Error types for RAR archive sessions.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with RAR archives, along with a convenient
//! [`Result<T>`] type alias.
//!
//! Native result codes reported by the decoding engine are mapped into
//! [`Error`] exactly once, at the engine boundary; an unrecognized code
//! becomes [`Error::Unknown`] rather than being swallowed.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`:
//!
//! ```rust,ignore
//! use runrar::{Archive, Error};
//!
//! match archive.extract(&entry) {
//!     Ok(bytes) => println!("{} bytes", bytes.len()),
//!     Err(Error::MissingPassword) => eprintln!("archive needs a password"),
//!     Err(Error::CrcMismatch { entry, expected, actual }) => {
//!         eprintln!("{entry}: expected {expected:#010x}, got {actual:#010x}");
//!     }
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use std::io;
use std::path::PathBuf;

use crate::engine::code;

/// The main error type for RAR archive operations.
///
/// Variants mirror the result codes of the underlying decoding engine plus
/// the failure modes introduced by this crate's own session layer (resource
/// limits, integrity checks, cancellation).
///
/// End-of-archive is *not* represented here: it is a loop sentinel, surfaced
/// as `Ok(None)` from header reads, never as an error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error from this crate's own filesystem operations
    /// (signature probe, empty-file creation, destination checks).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The decoding engine ran out of memory.
    #[error("decoding engine out of memory")]
    NoMemory,

    /// The archive data is damaged, inconsistent, or lies about itself.
    ///
    /// Also raised by the session layer when decoded output exceeds the
    /// size declared in the entry header, or when an entry record carries
    /// an empty file name.
    #[error("bad archive data: {reason}")]
    BadData {
        /// What was found to be inconsistent.
        reason: String,
    },

    /// The path does not refer to a readable archive.
    #[error("not a valid archive: {}", path.display())]
    BadArchive {
        /// The offending path.
        path: PathBuf,
    },

    /// The file is not in a format the engine recognizes.
    #[error("unknown archive format")]
    UnknownFormat,

    /// The engine could not open the archive or a volume file.
    #[error("engine failed to open a volume file")]
    OpenFailed,

    /// The engine could not create an output file.
    #[error("engine failed to create an output file")]
    CreateFailed,

    /// The engine could not close the archive file.
    #[error("engine failed to close the archive")]
    CloseFailed,

    /// The engine could not read from the archive file.
    #[error("engine failed to read archive data")]
    ReadFailed,

    /// The engine could not write an output file.
    #[error("engine failed to write extracted data")]
    WriteFailed,

    /// A response did not fit in the buffer provided for it.
    ///
    /// Raised for archive comments larger than the comment buffer, and for
    /// volume paths or passwords that exceed the engine's response buffer.
    /// Truncation is never performed silently.
    #[error("buffer too small for {what}")]
    SmallBuffer {
        /// What failed to fit.
        what: &'static str,
    },

    /// The archive requires a password and none was supplied.
    #[error("a password is required but none was supplied")]
    MissingPassword,

    /// The supplied password is wrong.
    #[error("wrong password")]
    BadPassword,

    /// The engine asked for the next volume and the queue was exhausted.
    #[error("next volume of the archive is not available")]
    MissingVolume,

    /// Extracted data does not match the CRC32 recorded in the header.
    #[error("CRC mismatch for '{entry}': expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        /// Path of the entry that failed verification.
        entry: String,
        /// CRC32 recorded in the entry header.
        expected: u32,
        /// CRC32 computed over the extracted bytes.
        actual: u32,
    },

    /// The entry is too large for in-memory extraction.
    #[error("entry too large for in-memory extraction: {size} bytes (limit {limit})")]
    TooLargeMemory {
        /// Declared uncompressed size of the entry.
        size: u64,
        /// The in-memory extraction limit, in bytes.
        limit: u64,
    },

    /// A caller-supplied argument was rejected.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Why the input was rejected.
        reason: String,
    },

    /// The operation was cancelled cooperatively via a progress flag.
    #[error("operation cancelled")]
    Cancelled,

    /// The engine returned a result code this crate does not recognize.
    ///
    /// Surfaced rather than swallowed so that new engine revisions fail
    /// loudly instead of corrupting output silently.
    #[error("unrecognized engine result code {code}")]
    Unknown {
        /// The raw native result code.
        code: u32,
    },
}

impl Error {
    /// Maps a non-success native result code into an [`Error`].
    ///
    /// `code::SUCCESS` and `code::END_ARCHIVE` must be handled by the caller
    /// before mapping; passing them here yields [`Error::Unknown`].
    pub fn from_native(native: u32) -> Self {
        match native {
            code::NO_MEMORY => Error::NoMemory,
            code::BAD_DATA => Error::BadData {
                reason: "engine reported damaged data".into(),
            },
            code::BAD_ARCHIVE => Error::BadArchive {
                path: PathBuf::new(),
            },
            code::UNKNOWN_FORMAT => Error::UnknownFormat,
            code::OPEN_FAILED => Error::OpenFailed,
            code::CREATE_FAILED => Error::CreateFailed,
            code::CLOSE_FAILED => Error::CloseFailed,
            code::READ_FAILED => Error::ReadFailed,
            code::WRITE_FAILED => Error::WriteFailed,
            code::SMALL_BUFFER => Error::SmallBuffer {
                what: "engine response",
            },
            code::MISSING_PASSWORD => Error::MissingPassword,
            code::BAD_PASSWORD => Error::BadPassword,
            other => Error::Unknown { code: other },
        }
    }
}

/// A specialized `Result` type for RAR archive operations.
pub type Result<T> = std::result::Result<T, Error>;
