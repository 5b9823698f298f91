/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recoverable synchronization errors
///
/// Only the non-panicking entry points (`try_*`, `RefCountedResource::with`)
/// surface these. Misuse through the panicking entry points (re-entrant
/// `with_lock`, `retain` after release) is a programming error and panics.
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", rename_all = "snake_case")]
pub enum SyncError {
    #[error("Mutex is already held by the calling thread")]
    #[diagnostic(
        code(sync::reentrant),
        help("Mutex is not re-entrant. Finish the outer critical section before locking again.")
    )]
    Reentrant,

    #[error("Mutex is held by another thread")]
    #[diagnostic(
        code(sync::would_block),
        help("Retry later or use with_lock to block until the holder releases.")
    )]
    WouldBlock,

    #[error("Resource has already been released")]
    #[diagnostic(
        code(sync::released),
        help("The reference count reached zero and cleanup ran. Keep a lease to extend its lifetime.")
    )]
    Released,
}

/// Result alias for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SyncError::Released.to_string(),
            "Resource has already been released"
        );
    }

    #[test]
    fn test_diagnostic_code() {
        let code = SyncError::WouldBlock.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("sync::would_block"));
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&SyncError::Reentrant).unwrap();
        assert_eq!(json, r#"{"error_type":"reentrant"}"#);

        let back: SyncError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SyncError::Reentrant);
    }
}
