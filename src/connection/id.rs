//! Session identifier generation.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{Error, Result};

/// Capability for minting process-unique session identifiers.
///
/// Identifiers are used only for external correlation (logging, routing);
/// nothing in the protocol depends on their shape. Inject an implementation
/// via [`Connection::with_id_generator`](crate::Connection::with_id_generator)
/// to control the scheme.
pub trait IdGenerator: Send + Sync {
    /// Produce one identifier.
    ///
    /// # Errors
    ///
    /// Implementations may fail if their entropy source does.
    fn generate(&self) -> Result<String>;
}

/// Default generator: 16 random bytes, URL-safe unpadded base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomId;

impl IdGenerator for RandomId {
    fn generate(&self) -> Result<String> {
        let mut raw = [0u8; 16];
        getrandom::getrandom(&mut raw).map_err(|err| Error::Io(err.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_length() {
        // 16 bytes encode to 22 characters without padding.
        let id = RandomId.generate().unwrap();
        assert_eq!(id.len(), 22);
    }

    #[test]
    fn test_random_id_url_safe() {
        let id = RandomId.generate().unwrap();
        assert!(
            id.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_random_ids_are_distinct() {
        let a = RandomId.generate().unwrap();
        let b = RandomId.generate().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_custom_generator() {
        struct Fixed;
        impl IdGenerator for Fixed {
            fn generate(&self) -> Result<String> {
                Ok("fixed".into())
            }
        }
        assert_eq!(Fixed.generate().unwrap(), "fixed");
    }
}
