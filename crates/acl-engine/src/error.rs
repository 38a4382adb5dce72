//! Error types for access-control operations

use acl_store::StoreError;
use thiserror::Error;

/// Access-control error types.
///
/// "Not found" is never an error: reading an unknown user, role or resource
/// yields an empty set. Index drift caused by concurrent mutations is not
/// reported either.
#[derive(Debug, Error)]
pub enum AclError {
    /// An identifier collides with a name reserved by storage backends.
    /// Raised before any store call.
    #[error("Invalid {kind}: `{value}` is a reserved name")]
    InvalidArgument {
        /// What the identifier was used as (role, permission, ...)
        kind: &'static str,
        /// The rejected identifier
        value: String,
    },

    /// The bucket store failed during a read or a batch.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for access-control operations.
pub type AclResult<T> = Result<T, AclError>;

impl AclError {
    /// Check if this error originated in the bucket store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, AclError::Store(_))
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AclError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            AclError::Store(err) => err.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let invalid = AclError::InvalidArgument {
            kind: "permission",
            value: "key".to_string(),
        };
        assert_eq!(invalid.error_code(), "INVALID_ARGUMENT");
        assert!(!invalid.is_store_error());
        assert_eq!(invalid.to_string(), "Invalid permission: `key` is a reserved name");

        let store: AclError = StoreError::Command("boom".to_string()).into();
        assert_eq!(store.error_code(), "STORE_COMMAND");
        assert!(store.is_store_error());
    }
}
