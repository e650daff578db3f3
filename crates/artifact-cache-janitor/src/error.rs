//! Error types for the artifact cache janitor

use std::fmt;

#[derive(Debug)]
pub enum JanitorError {
    Cache(artifact_lru_cache::CacheError),
    #[allow(dead_code)]
    Io(Box<std::io::Error>),
    Config(String),
    Report(String),
}

impl fmt::Display for JanitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JanitorError::Cache(err) => write!(f, "Cache error: {}", err),
            JanitorError::Io(err) => write!(f, "IO error: {}", err),
            JanitorError::Config(msg) => write!(f, "Configuration error: {}", msg),
            JanitorError::Report(msg) => write!(f, "Report encoding error: {}", msg),
        }
    }
}

impl std::error::Error for JanitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JanitorError::Cache(err) => Some(err),
            JanitorError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<artifact_lru_cache::CacheError> for JanitorError {
    fn from(err: artifact_lru_cache::CacheError) -> Self {
        JanitorError::Cache(err)
    }
}

impl From<std::io::Error> for JanitorError {
    fn from(err: std::io::Error) -> Self {
        JanitorError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for JanitorError {
    fn from(err: serde_json::Error) -> Self {
        JanitorError::Report(err.to_string())
    }
}

impl From<tracing_subscriber::filter::ParseError> for JanitorError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        JanitorError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JanitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_display() {
        let err = JanitorError::Cache(artifact_lru_cache::CacheError::CorruptState(
            "trailing characters".to_string(),
        ));
        assert!(format!("{}", err).contains("trailing characters"));
    }

    #[test]
    fn test_config_error_display() {
        let err = JanitorError::Config("bad LOG filter".to_string());
        assert_eq!(format!("{}", err), "Configuration error: bad LOG filter");
    }

    #[test]
    fn test_report_encoding_error() {
        let json_err = serde_json::from_str::<u64>("not a number").unwrap_err();
        let err = JanitorError::from(json_err);
        assert!(matches!(err, JanitorError::Report(_)));
        assert!(format!("{}", err).starts_with("Report encoding error: "));
    }

    #[test]
    fn test_error_is_debug() {
        let err = JanitorError::Config("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Config"));
    }
}
