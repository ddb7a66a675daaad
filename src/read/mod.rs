//! Reading RAR archives: sessions, listing and extraction.

mod destination;
mod entries;
mod entry;
mod extraction;
mod multivolume;
mod open;

pub use destination::ExtractionAction;
pub use entry::{CompressionMethod, Entry, HashType, HostOs};
pub use extraction::MAX_IN_MEMORY_SIZE;
pub use open::OpenOptions;

use std::path::PathBuf;

use crate::engine::{ArchiveFlags, Engine};
use crate::password::Password;

/// A RAR archive session.
///
/// An `Archive` holds the archive path and the credentials and volume list
/// needed to work with it; each operation (listing, extraction, password
/// validation) opens a fresh native handle scoped to that call and closes
/// it on every exit path. Holding an `Archive` or any [`Entry`] therefore
/// keeps no file descriptor open.
///
/// The cheap archive-level facts (volume membership, comment, encryption
/// layout, emptiness) are snapshotted once at open time and served from
/// the session without further native calls.
///
/// # Example
///
/// ```rust,ignore
/// use runrar::{Archive, OpenOptions};
/// use runrar::engine::ffi::NativeEngine;
///
/// let archive = Archive::open_with(NativeEngine::new(), "photos.rar", OpenOptions::new())?;
/// for entry in archive.entries()? {
///     println!("{} ({} bytes)", entry.path(), entry.uncompressed_size());
/// }
/// ```
pub struct Archive<E: Engine> {
    pub(crate) engine: E,
    pub(crate) path: PathBuf,
    pub(crate) volumes: Vec<PathBuf>,
    pub(crate) password: Option<Password>,
    pub(crate) ignore_crc_mismatches: bool,
    pub(crate) flags: ArchiveFlags,
    pub(crate) comment: Option<String>,
    pub(crate) body_encrypted: bool,
    pub(crate) empty: bool,
}

impl<E: Engine> Archive<E> {
    /// The path this session was opened on.
    pub fn filename(&self) -> &std::path::Path {
        &self.path
    }

    /// True if the archive is part of a multi-volume set.
    pub fn is_volume(&self) -> bool {
        self.flags.is_volume()
    }

    /// True if this is the first volume of its set.
    pub fn is_first_volume(&self) -> bool {
        self.flags.is_first_volume()
    }

    /// True if continuation volumes were supplied for this session.
    pub fn has_multiple_volumes(&self) -> bool {
        !self.volumes.is_empty()
    }

    /// True if the archive carries a comment.
    pub fn has_comment(&self) -> bool {
        self.flags.has_comment()
    }

    /// The archive comment, or the empty string when there is none.
    pub fn comment(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }

    /// True if the archive headers are encrypted (listing needs the
    /// password).
    pub fn is_header_encrypted(&self) -> bool {
        self.flags.headers_encrypted()
    }

    /// True if entry bodies are encrypted while headers are readable.
    pub fn is_body_encrypted(&self) -> bool {
        self.body_encrypted
    }

    /// True if any password is needed to read archive content.
    pub fn is_password_protected(&self) -> bool {
        self.is_header_encrypted() || self.is_body_encrypted()
    }

    /// True if the archive contains no entries.
    ///
    /// Always false for header-encrypted archives opened without a
    /// working password; emptiness cannot be probed there.
    pub fn is_empty_archive(&self) -> bool {
        self.empty
    }

    /// True if the archive is locked against modification.
    pub fn is_locked(&self) -> bool {
        self.flags.is_locked()
    }

    /// True if the archive uses solid compression.
    pub fn is_solid(&self) -> bool {
        self.flags.is_solid()
    }

    /// True if the volume set uses new-style numbering.
    pub fn has_new_numbering(&self) -> bool {
        self.flags.has_new_numbering()
    }

    /// True if the archive carries an authenticity signature.
    pub fn is_signed(&self) -> bool {
        self.flags.is_signed()
    }

    /// True if the archive carries a recovery record.
    pub fn has_recovery_record(&self) -> bool {
        self.flags.has_recovery_record()
    }
}

impl<E: Engine> std::fmt::Debug for Archive<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("volumes", &self.volumes.len())
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
