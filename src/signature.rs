//! RAR signature detection.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Length of the RAR signature probe, in bytes.
pub const SIGNATURE_LEN: usize = 7;

/// Common prefix of the RAR 4.x and RAR 5.x signatures.
const MAGIC_PREFIX: [u8; 6] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07];

/// Returns true if the file at `path` starts with a RAR signature.
///
/// Recognizes both the 4.x marker (`Rar!\x1A\x07\x00`) and the 5.x marker
/// (`Rar!\x1A\x07\x01`). Any I/O failure, including a file shorter than
/// the signature, reads as "not an archive"; this function never errors.
///
/// # Example
///
/// ```rust
/// assert!(!runrar::is_rar_archive("/no/such/file.rar"));
/// ```
pub fn is_rar_archive(path: impl AsRef<Path>) -> bool {
    let mut head = [0u8; SIGNATURE_LEN];
    let Ok(mut file) = File::open(path.as_ref()) else {
        return false;
    };
    if file.read_exact(&mut head).is_err() {
        return false;
    }
    head[..6] == MAGIC_PREFIX && (head[6] == 0x00 || head[6] == 0x01)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn probe(bytes: &[u8]) -> bool {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        is_rar_archive(file.path())
    }

    #[test]
    fn test_rar4_signature() {
        assert!(probe(b"Rar!\x1A\x07\x00rest of archive"));
    }

    #[test]
    fn test_rar5_signature() {
        assert!(probe(b"Rar!\x1A\x07\x01\x00rest of archive"));
    }

    #[test]
    fn test_future_version_byte_rejected() {
        assert!(!probe(b"Rar!\x1A\x07\x02"));
    }

    #[test]
    fn test_non_archive_rejected() {
        assert!(!probe(b"PK\x03\x04 not a rar"));
        assert!(!probe(b""));
    }

    #[test]
    fn test_short_file_rejected() {
        // Six of seven signature bytes present.
        assert!(!probe(b"Rar!\x1A\x07"));
    }

    #[test]
    fn test_missing_file_is_false() {
        assert!(!is_rar_archive("/nonexistent/path/archive.rar"));
    }
}
