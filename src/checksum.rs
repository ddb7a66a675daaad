//! CRC32 checksum calculation.
//!
//! RAR headers record a CRC32 (the standard IEEE polynomial) for each entry;
//! in-memory extraction verifies decoded bytes against it.

/// Streaming CRC32 calculator.
///
/// # Example
///
/// ```rust
/// use runrar::checksum::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"hello ");
/// crc.update(b"world");
/// assert_eq!(crc.finalize(), Crc32::compute(b"hello world"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Crc32 {
    /// Creates a new calculator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds more data into the checksum.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Consumes the calculator and returns the checksum.
    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }

    /// One-shot checksum over a byte slice.
    pub fn compute(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}
