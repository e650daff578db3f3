//! Error types for the artifact cache

use std::fmt;

#[derive(Debug)]
pub enum CacheError {
    Io(Box<std::io::Error>),
    CorruptState(String),
    Serialization(String),
    Walk(String),
    TaskJoin(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Io(err) => write!(f, "IO error: {}", err),
            CacheError::CorruptState(msg) => write!(f, "Corrupt cache state: {}", msg),
            CacheError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            CacheError::Walk(msg) => write!(f, "Directory walk error: {}", msg),
            CacheError::TaskJoin(msg) => write!(f, "Blocking task failed: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

impl From<walkdir::Error> for CacheError {
    fn from(err: walkdir::Error) -> Self {
        CacheError::Walk(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        CacheError::TaskJoin(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_corrupt_state_display() {
        let err = CacheError::CorruptState("expected value at line 1".to_string());
        assert_eq!(
            format!("{}", err),
            "Corrupt cache state: expected value at line 1"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        let err = CacheError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(format!("{}", err).contains("denied"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_is_debug() {
        let err = CacheError::Walk("loop detected".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Walk"));
    }
}
