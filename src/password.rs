//! Password handling for encrypted archives.
//!
//! Passwords are wrapped in [`Password`], which zeroizes the underlying
//! bytes on drop and redacts itself from `Debug` output so credentials do
//! not leak into logs or panic messages.

use zeroize::Zeroizing;

use crate::{Error, Result};

/// Maximum accepted password length, in bytes.
///
/// The decoding engine truncates longer credentials internally; rejecting
/// them up front keeps "accepted password" and "password the engine saw"
/// identical.
pub const MAX_PASSWORD_BYTES: usize = 128;

/// A password for an encrypted archive.
///
/// The inner string is zeroized when the value is dropped.
///
/// # Example
///
/// ```rust
/// use runrar::Password;
///
/// let password = Password::new("secret")?;
/// assert_eq!(password.len(), 6);
/// assert_eq!(format!("{:?}", password), "Password(<redacted>)");
/// # Ok::<(), runrar::Error>(())
/// ```
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Creates a password, rejecting credentials over
    /// [`MAX_PASSWORD_BYTES`] bytes with [`Error::InvalidInput`].
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.len() > MAX_PASSWORD_BYTES {
            return Err(Error::InvalidInput {
                reason: format!(
                    "password is {} bytes, limit is {MAX_PASSWORD_BYTES}",
                    value.len()
                ),
            });
        }
        Ok(Password(Zeroizing::new(value)))
    }

    /// Returns the password as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the password bytes (UTF-8, no terminator).
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the empty password.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Password {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let p = Password::new("hello").unwrap();
        assert_eq!(p.as_str(), "hello");
        assert_eq!(p.as_bytes(), b"hello");
        assert!(!p.is_empty());
    }

    #[test]
    fn test_password_length_limit() {
        let at_limit = "x".repeat(MAX_PASSWORD_BYTES);
        assert!(Password::new(at_limit).is_ok());

        let over = "x".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(
            Password::new(over),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_limit_counts_bytes_not_chars() {
        // 64 three-byte characters exceed the byte limit.
        let wide = "\u{3042}".repeat(64);
        assert_eq!(wide.len(), 192);
        assert!(Password::new(wide).is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let p = Password::new("topsecret").unwrap();
        let debug = format!("{p:?}");
        assert!(!debug.contains("topsecret"));
        assert_eq!(debug, "Password(<redacted>)");
    }

    #[test]
    fn test_equality() {
        let a = Password::new("same").unwrap();
        let b = Password::new("same").unwrap();
        let c = Password::new("other").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
