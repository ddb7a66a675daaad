//! # runrar
//!
//! A session layer over the unrar decoding engine: list, extract and
//! verify RAR archives.
//!
//! The crate owns everything around the decoder: handle lifecycles,
//! header iteration, multi-volume continuation, password negotiation,
//! routing of decoded data to memory, files or caller consumers, progress
//! and cancellation, and CRC32 verification of in-memory extractions.
//! Decompression and decryption themselves are done by an engine behind
//! the [`engine`] traits; enable the `ffi` feature to link the stock
//! [`engine::ffi::NativeEngine`] against a system libunrar.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use runrar::{Archive, OpenOptions, Password};
//! use runrar::engine::ffi::NativeEngine;
//!
//! let archive = Archive::open_with(
//!     NativeEngine::new(),
//!     "backup.rar",
//!     OpenOptions::new().password(Password::new("secret")?),
//! )?;
//!
//! for entry in archive.entries()? {
//!     if entry.is_file() {
//!         let data = archive.extract(&entry)?;
//!         println!("{}: {} bytes", entry.path(), data.len());
//!     }
//! }
//! # Ok::<(), runrar::Error>(())
//! ```
//!
//! ## Sessions and handles
//!
//! An [`Archive`] keeps no file descriptor open between operations. Each
//! call opens a fresh native handle, runs to completion, and closes it on
//! every exit path. Archive-level facts (volume membership, comment,
//! encryption layout) are snapshotted once at open time and served
//! without further native calls. [`Entry`] values are plain records and
//! stay valid for the life of the session.
//!
//! ## Multi-volume sets and passwords
//!
//! Continuation volumes are supplied up front via
//! [`OpenOptions::volumes`] and handed to the engine first-in-first-out
//! whenever a decode crosses a volume boundary; an exhausted list aborts
//! with [`Error::MissingVolume`]. The password given via
//! [`OpenOptions::password`] serves both header decryption and mid-decode
//! requests; [`Archive::validate_password`] checks a credential without
//! extracting anything.

#![warn(missing_docs)]
// All unsafe lives in the libunrar binding.
#![cfg_attr(not(feature = "ffi"), forbid(unsafe_code))]

pub mod checksum;
pub mod engine;
mod error;
mod password;
mod progress;
mod read;
mod signature;
mod timestamp;

pub use error::{Error, Result};
pub use password::{Password, MAX_PASSWORD_BYTES};
pub use progress::Progress;
pub use read::{
    Archive, CompressionMethod, Entry, ExtractionAction, HashType, HostOs, OpenOptions,
    MAX_IN_MEMORY_SIZE,
};
pub use signature::{is_rar_archive, SIGNATURE_LEN};
pub use timestamp::Timestamp;
