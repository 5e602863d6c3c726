//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Missing or malformed required argument (key, ttl, callback)
    #[error("InputArgumentsError: {0}")]
    InputArguments(String),

    /// Read or delete targeting a key that is not present
    #[error("NotExistKeyError: {0}")]
    NotExistKey(String),

    /// A deferred operation could not complete on the runtime
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true for the not-found condition governed by `error_or_null`.
    pub fn is_not_exist_key(&self) -> bool {
        matches!(self, CacheError::NotExistKey(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_taxonomy_name() {
        let err = CacheError::NotExistKey("missing".to_string());
        assert_eq!(err.to_string(), "NotExistKeyError: missing");

        let err = CacheError::InputArguments("key cannot be empty".to_string());
        assert!(err.to_string().starts_with("InputArgumentsError"));
    }

    #[test]
    fn test_is_not_exist_key() {
        assert!(CacheError::NotExistKey("k".into()).is_not_exist_key());
        assert!(!CacheError::InputArguments("k".into()).is_not_exist_key());
        assert!(!CacheError::Internal("k".into()).is_not_exist_key());
    }
}
