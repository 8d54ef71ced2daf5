use std::path::PathBuf;
use std::{io, result};

use thiserror::Error;

/// The result type of the logger initialization.
pub type Result<T> = result::Result<T, LoggingError>;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("the insights logger has already been initialized")]
    AlreadyInitialized,
    #[error("logging config {0:?} does not exist")]
    NotFound(PathBuf),
    #[error("logging configuration is invalid, {0}")]
    InvalidConfig(String),
    #[error("failed to prepare the log file, {0}")]
    Io(#[from] io::Error),
}

impl PartialEq for LoggingError {
    fn eq(&self, other: &LoggingError) -> bool {
        match (self, other) {
            (LoggingError::AlreadyInitialized, LoggingError::AlreadyInitialized) => true,
            (LoggingError::NotFound(a), LoggingError::NotFound(b)) => a == b,
            (LoggingError::InvalidConfig(_), LoggingError::InvalidConfig(_)) => true,
            (LoggingError::Io(a), LoggingError::Io(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_eq() {
        assert_eq!(
            LoggingError::NotFound(PathBuf::from("log4.yml")),
            LoggingError::NotFound(PathBuf::from("log4.yml"))
        );
        assert_ne!(
            LoggingError::NotFound(PathBuf::from("log4.yml")),
            LoggingError::NotFound(PathBuf::from("log4.yaml"))
        );
        assert_eq!(
            LoggingError::InvalidConfig("Foo".to_string()),
            LoggingError::InvalidConfig("Bar".to_string())
        );
        assert_ne!(
            LoggingError::Io(io::Error::from(io::ErrorKind::PermissionDenied)),
            LoggingError::Io(io::Error::from(io::ErrorKind::NotFound))
        );
        assert_ne!(LoggingError::AlreadyInitialized, LoggingError::InvalidConfig("Foo".to_string()));
    }

    #[test]
    fn test_from_io() {
        let result = LoggingError::from(io::Error::from(io::ErrorKind::PermissionDenied));

        assert_eq!(
            LoggingError::Io(io::Error::from(io::ErrorKind::PermissionDenied)),
            result
        );
    }
}
