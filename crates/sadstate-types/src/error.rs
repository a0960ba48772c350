//! Machine-readable error codes shared by every sadstate crate.
//!
//! Each error enum in the workspace implements [`ErrorCode`], so callers
//! (and the CLI's JSON output) can branch on a stable string instead of
//! on `Display` text.
//!
//! # Code Format
//!
//! - UPPER_SNAKE_CASE
//! - prefixed by the owning layer: `ID_`, `PERM_`, `CLIENT_`, `CONFIG_`,
//!   `TRANSPORT_`, `RESPONSE_`
//! - stable once published
//!
//! # Example
//!
//! ```
//! use sadstate_types::ErrorCode;
//!
//! enum FetchError {
//!     Offline,
//!     BadName,
//! }
//!
//! impl ErrorCode for FetchError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Offline => "FETCH_OFFLINE",
//!             Self::BadName => "FETCH_BAD_NAME",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Offline)
//!     }
//! }
//!
//! assert_eq!(FetchError::Offline.code(), "FETCH_OFFLINE");
//! assert!(!FetchError::BadName.is_recoverable());
//! ```

/// Stable, machine-readable identity of an error value.
pub trait ErrorCode {
    /// Returns the UPPER_SNAKE_CASE code for this error.
    fn code(&self) -> &'static str;

    /// Returns `true` when repeating the operation (possibly after the
    /// caller fixes its input or the network recovers) may succeed.
    ///
    /// Protocol breakage and invariant violations are not recoverable.
    fn is_recoverable(&self) -> bool;
}

/// Returns `true` if `code` is UPPER_SNAKE_CASE and starts with `prefix`.
///
/// Intended for tests that walk every variant of an error enum.
///
/// ```
/// use sadstate_types::is_valid_code;
///
/// assert!(is_valid_code("CLIENT_DECODE", "CLIENT_"));
/// assert!(!is_valid_code("client_decode", "CLIENT_"));
/// assert!(!is_valid_code("ID_EMPTY", "CLIENT_"));
/// ```
#[must_use]
pub fn is_valid_code(code: &str, prefix: &str) -> bool {
    !code.is_empty()
        && code.starts_with(prefix)
        && !code.ends_with('_')
        && !code.contains("__")
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdError;

    #[test]
    fn id_error_codes_follow_convention() {
        let all = [
            IdError::Base64 {
                input: "x".into(),
                reason: "bad".into(),
            },
            IdError::Empty,
            IdError::TicketFormat { input: "x".into() },
            IdError::ZeroTicket,
        ];
        for err in &all {
            assert!(is_valid_code(err.code(), "ID_"), "bad code {}", err.code());
            assert!(!err.is_recoverable());
        }
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(!is_valid_code("", ""));
        assert!(!is_valid_code("ID__EMPTY", "ID_"));
        assert!(!is_valid_code("ID_", "ID_"));
        assert!(!is_valid_code("ID_Empty", "ID_"));
    }
}
