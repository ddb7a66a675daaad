//! Archive entry records.

use crate::engine::{header_flags, RawHeader};
use crate::timestamp::Timestamp;

/// Compression method recorded for an entry.
///
/// The codes mirror the archiver's dial from "store" to "best".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Stored without compression (`0x30`).
    Storage,
    /// Fastest compression (`0x31`).
    Fastest,
    /// Fast compression (`0x32`).
    Fast,
    /// Normal compression (`0x33`).
    Normal,
    /// Good compression (`0x34`).
    Good,
    /// Best compression (`0x35`).
    Best,
    /// A method code this crate does not know.
    Unknown(u32),
}

impl CompressionMethod {
    /// Decodes the native method code.
    pub fn from_code(code: u32) -> Self {
        match code {
            0x30 => CompressionMethod::Storage,
            0x31 => CompressionMethod::Fastest,
            0x32 => CompressionMethod::Fast,
            0x33 => CompressionMethod::Normal,
            0x34 => CompressionMethod::Good,
            0x35 => CompressionMethod::Best,
            other => CompressionMethod::Unknown(other),
        }
    }
}

/// Operating system the entry was archived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOs {
    /// MS-DOS.
    MsDos,
    /// OS/2.
    Os2,
    /// Windows.
    Windows,
    /// Unix-like.
    Unix,
    /// Classic Mac OS.
    MacOs,
    /// BeOS.
    BeOs,
    /// A host code this crate does not know.
    Unknown(u32),
}

impl HostOs {
    /// Decodes the native host-OS code.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => HostOs::MsDos,
            1 => HostOs::Os2,
            2 => HostOs::Windows,
            3 => HostOs::Unix,
            4 => HostOs::MacOs,
            5 => HostOs::BeOs,
            other => HostOs::Unknown(other),
        }
    }
}

/// Hash algorithm recorded for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashType {
    /// No separate hash recorded.
    None,
    /// CRC32 only (the `crc32` field is authoritative).
    Crc32,
    /// Blake2sp hash in the `hash` field (RAR5).
    Blake2,
    /// A hash code this crate does not know.
    Unknown(u32),
}

impl HashType {
    /// Decodes the native hash-type code.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => HashType::None,
            1 => HashType::Crc32,
            2 => HashType::Blake2,
            other => HashType::Unknown(other),
        }
    }
}

/// One entry of an archive, as captured during a header walk.
///
/// An `Entry` is a plain record: holding one does not keep any native
/// handle open. Equality considers only identity, the owning volume name
/// plus the entry path, so a record captured by one listing can select
/// the same entry in a later extraction walk.
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) archive_name: String,
    pub(crate) path: String,
    pub(crate) comment: Option<String>,
    pub(crate) uncompressed_size: u64,
    pub(crate) compressed_size: u64,
    pub(crate) is_encrypted: bool,
    pub(crate) is_directory: bool,
    pub(crate) is_split_before: bool,
    pub(crate) is_split_after: bool,
    pub(crate) is_solid: bool,
    pub(crate) modification_time: Option<Timestamp>,
    pub(crate) creation_time: Option<Timestamp>,
    pub(crate) crc32: u32,
    pub(crate) compression_method: CompressionMethod,
    pub(crate) host_os: HostOs,
    pub(crate) attributes: u32,
    pub(crate) dictionary_size: u32,
    pub(crate) hash_type: HashType,
    pub(crate) hash: [u8; 32],
}

impl Entry {
    pub(crate) fn from_raw(raw: RawHeader) -> Self {
        let join = |high: u32, low: u32| (u64::from(high) << 32) | u64::from(low);
        Entry {
            uncompressed_size: join(raw.unp_size_high, raw.unp_size),
            compressed_size: join(raw.pack_size_high, raw.pack_size),
            is_encrypted: raw.flags & header_flags::ENCRYPTED != 0,
            is_directory: raw.flags & header_flags::DIRECTORY != 0,
            is_split_before: raw.flags & header_flags::SPLIT_BEFORE != 0,
            is_split_after: raw.flags & header_flags::SPLIT_AFTER != 0,
            is_solid: raw.flags & header_flags::SOLID != 0,
            modification_time: Timestamp::from_halves(raw.mtime_high, raw.mtime_low),
            creation_time: Timestamp::from_halves(raw.ctime_high, raw.ctime_low),
            compression_method: CompressionMethod::from_code(raw.method),
            host_os: HostOs::from_code(raw.host_os),
            attributes: raw.file_attr,
            dictionary_size: raw.dict_size,
            hash_type: HashType::from_code(raw.hash_type),
            hash: raw.hash,
            crc32: raw.file_crc,
            archive_name: raw.archive_name,
            path: raw.file_name,
            comment: raw.comment,
        }
    }

    /// Entry path inside the archive, with `/` separators.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Entry comment, if one was recorded.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Uncompressed size in bytes.
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Compressed size in bytes.
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// True if the entry body is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.is_encrypted
    }

    /// True for directory entries.
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// True for regular file entries.
    pub fn is_file(&self) -> bool {
        !self.is_directory
    }

    /// True if the entry continues from the previous volume.
    pub fn is_split_before(&self) -> bool {
        self.is_split_before
    }

    /// True if the entry continues on the next volume.
    pub fn is_split_after(&self) -> bool {
        self.is_split_after
    }

    /// True if the entry belongs to a solid block.
    pub fn is_solid(&self) -> bool {
        self.is_solid
    }

    /// Modification time, if recorded.
    pub fn modification_time(&self) -> Option<Timestamp> {
        self.modification_time
    }

    /// Creation time, if recorded.
    pub fn creation_time(&self) -> Option<Timestamp> {
        self.creation_time
    }

    /// CRC32 of the uncompressed data, as recorded in the header.
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Compression method.
    pub fn compression_method(&self) -> CompressionMethod {
        self.compression_method
    }

    /// Host operating system the entry was archived on.
    pub fn host_os(&self) -> HostOs {
        self.host_os
    }

    /// Host-OS-specific attribute bits.
    pub fn attributes(&self) -> u32 {
        self.attributes
    }

    /// Dictionary size used for compression, in bytes.
    pub fn dictionary_size(&self) -> u32 {
        self.dictionary_size
    }

    /// Hash algorithm recorded for the entry.
    pub fn hash_type(&self) -> HashType {
        self.hash_type
    }

    /// Raw recorded hash value; meaningful for [`HashType::Blake2`].
    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.archive_name == other.archive_name && self.path == other.path
    }
}

impl Eq for Entry {}

impl std::hash::Hash for Entry {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.archive_name.hash(state);
        self.path.hash(state);
    }
}
