//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate. Use [`SecretString`] for any value
//! that must never appear in logs, which for Parley means the password carried
//! inside [`Credentials`](crate::types::Credentials).
//!
//! `SecretString` implements `Debug` with redaction, so structs that derive
//! `Debug` around a secret field stay safe to log via `{:?}` or tracing.
//! Reading the real value requires an explicit [`ExposeSecret::expose_secret`]
//! call, and the backing memory is zeroized on drop.
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct LoginForm {
//!     email: String,
//!     password: SecretString,
//! }
//!
//! let form = LoginForm {
//!     email: "alice@example.com".to_string(),
//!     password: SecretString::from("hunter2"),
//! };
//!
//! // Redacted: the Debug output never contains "hunter2".
//! assert!(!format!("{form:?}").contains("hunter2"));
//!
//! // Explicit access only.
//! assert_eq!(form.password.expose_secret(), "hunter2");
//! ```
//!
//! With secrecy's `serde` feature enabled (it is, workspace-wide), secrets
//! deserialize from plain strings, so stored credential files stay ordinary
//! JSON while the in-memory representation stays redacted.

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_output_is_redacted() {
        #[allow(dead_code)]
        #[derive(Debug)]
        struct LoginForm {
            email: String,
            password: SecretString,
        }

        let form = LoginForm {
            email: "alice@example.com".to_string(),
            password: SecretString::from("hunter2"),
        };
        let debug = format!("{form:?}");

        assert!(debug.contains("alice@example.com"));
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("password123");
        assert_eq!(secret.expose_secret(), "password123");
    }

    #[test]
    fn test_deserialized_secret_stays_redacted() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct StoredLogin {
            email: String,
            password: SecretString,
        }

        let json = r#"{"email": "bob@example.com", "password": "my-secret-value"}"#;
        let login: StoredLogin = serde_json::from_str(json).expect("deserialize");

        assert_eq!(login.password.expose_secret(), "my-secret-value");
        assert!(!format!("{login:?}").contains("my-secret-value"));
    }

    #[test]
    fn test_clone_preserves_value() {
        let secret = SecretString::from("cloneable");
        assert_eq!(secret.clone().expose_secret(), "cloneable");
    }
}
