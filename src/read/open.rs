//! Session construction and the per-operation handle scope.

use std::path::{Path, PathBuf};

use crate::engine::{
    CommentOutcome, Engine, EngineHandle, OpenMode, OpenRequest, OpenedArchive,
};
use crate::password::Password;
use crate::read::Archive;
use crate::{Error, Result};

/// Comment buffer capacity offered at open time: 256 KiB plus the
/// terminator, the largest comment the format permits.
pub(crate) const COMMENT_CAPACITY: usize = 0x40001;

/// Options for opening an archive session.
///
/// # Example
///
/// ```rust,ignore
/// use runrar::{OpenOptions, Password};
///
/// let options = OpenOptions::new()
///     .password(Password::new("secret")?)
///     .volumes(vec!["set.part2.rar".into(), "set.part3.rar".into()]);
/// ```
#[derive(Debug, Default)]
pub struct OpenOptions {
    pub(crate) volumes: Vec<PathBuf>,
    pub(crate) password: Option<Password>,
    pub(crate) ignore_crc_mismatches: bool,
}

impl OpenOptions {
    /// Creates the default options: no continuation volumes, no password,
    /// CRC verification enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies continuation volumes, in the order the engine should
    /// receive them when an entry crosses a volume boundary.
    pub fn volumes(mut self, volumes: Vec<PathBuf>) -> Self {
        self.volumes = volumes;
        self
    }

    /// Supplies the password for encrypted headers or bodies.
    pub fn password(mut self, password: Password) -> Self {
        self.password = Some(password);
        self
    }

    /// Disables CRC verification of in-memory extractions.
    pub fn ignore_crc_mismatches(mut self, ignore: bool) -> Self {
        self.ignore_crc_mismatches = ignore;
        self
    }
}

impl<E: Engine> Archive<E> {
    /// Opens an archive session with the given engine.
    ///
    /// The path must refer to a regular file; anything else is
    /// [`Error::BadArchive`]. The archive-level metadata snapshot (flags,
    /// comment, encryption layout, emptiness) is taken here, through a
    /// short-lived list-mode handle.
    pub fn open_with(engine: E, path: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut archive = Archive {
            engine,
            path,
            volumes: options.volumes,
            password: options.password,
            ignore_crc_mismatches: options.ignore_crc_mismatches,
            flags: Default::default(),
            comment: None,
            body_encrypted: false,
            empty: false,
        };
        archive.snapshot()?;
        Ok(archive)
    }

    /// Runs `body` against a freshly opened handle.
    ///
    /// The handle is dropped (and the native side closed) on every exit
    /// path out of this function, success, error or unwind.
    pub(crate) fn with_handle<T>(
        &self,
        mode: OpenMode,
        comment_capacity: usize,
        body: impl FnOnce(&mut OpenedArchive<E::Handle>) -> Result<T>,
    ) -> Result<T> {
        if !self.path.is_file() {
            return Err(Error::BadArchive {
                path: self.path.clone(),
            });
        }
        let request = OpenRequest {
            path: &self.path,
            mode,
            comment_capacity,
        };
        let mut opened = self.engine.open(&request)?;
        if let Some(password) = &self.password {
            opened.handle.set_password(password)?;
        }
        body(&mut opened)
    }

    /// Captures the archive-level metadata that every later accessor
    /// serves without further native calls.
    fn snapshot(&mut self) -> Result<()> {
        let (flags, comment, body_encrypted, empty) =
            self.with_handle(OpenMode::List, COMMENT_CAPACITY, |opened| {
                let flags = opened.flags;
                let comment = match std::mem::replace(&mut opened.comment, CommentOutcome::None)
                {
                    CommentOutcome::None => None,
                    CommentOutcome::Present(text) => Some(text),
                    CommentOutcome::Truncated => {
                        return Err(Error::SmallBuffer {
                            what: "archive comment",
                        });
                    }
                };
                // Body encryption and emptiness are probed from the first
                // header, which is only readable when headers are not
                // themselves encrypted.
                let mut body_encrypted = false;
                let mut empty = false;
                if !flags.headers_encrypted() {
                    match opened.handle.read_header()? {
                        Some(raw) => {
                            body_encrypted =
                                raw.flags & crate::engine::header_flags::ENCRYPTED != 0;
                        }
                        None => empty = true,
                    }
                }
                Ok((flags, comment, body_encrypted, empty))
            })?;
        log::debug!(
            "opened {}: flags {:#06x}, comment {}",
            self.path.display(),
            flags.bits(),
            if comment.is_some() { "present" } else { "absent" },
        );
        self.flags = flags;
        self.comment = comment;
        self.body_encrypted = body_encrypted;
        self.empty = empty;
        Ok(())
    }
}

#[cfg(feature = "ffi")]
impl Archive<crate::engine::ffi::NativeEngine> {
    /// Opens an archive with the stock libunrar engine.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(crate::engine::ffi::NativeEngine::new(), path, OpenOptions::new())
    }

    /// Opens a password-protected archive with the stock libunrar engine.
    pub fn open_path_with_password(
        path: impl AsRef<Path>,
        password: Password,
    ) -> Result<Self> {
        Self::open_with(
            crate::engine::ffi::NativeEngine::new(),
            path,
            OpenOptions::new().password(password),
        )
    }

    /// Opens an archive with the stock libunrar engine and full options.
    pub fn open_path_with_options(
        path: impl AsRef<Path>,
        options: OpenOptions,
    ) -> Result<Self> {
        Self::open_with(crate::engine::ffi::NativeEngine::new(), path, options)
    }
}
