use crate::store::DecodeError;
use std::path::PathBuf;
use thiserror::Error;

/// msgflow error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Failed to decode message flow graph: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to encode message flow graph: {0}")]
    Encode(String),

    #[error("Invalid observation manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Render error: {0}")]
    Render(String),
}

/// Result type alias for msgflow operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a manifest error
    pub fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an encode error
    pub fn encode(msg: impl Into<String>) -> Self {
        Error::Encode(msg.into())
    }

    /// Create a render error
    pub fn render(msg: impl Into<String>) -> Self {
        Error::Render(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_input_not_found_display() {
        let err = Error::InputNotFound(PathBuf::from("/some/graph.dat"));
        assert_eq!(err.to_string(), "Input not found: /some/graph.dat");
    }

    #[test]
    fn test_decode_error_display() {
        let err: Error = DecodeError::BadMagic.into();
        assert!(err.to_string().starts_with("Failed to decode message flow graph"));
    }

    #[test]
    fn test_manifest_error_display() {
        let err = Error::manifest("/obs/shop.msgflow.json", "expected value at line 1");
        assert!(err.to_string().contains("/obs/shop.msgflow.json"));
        assert!(err.to_string().contains("expected value"));
    }

    #[test]
    fn test_config_validation_display() {
        let err = Error::config_validation("module_depth must be at least 1");
        assert_eq!(err.to_string(), "Config validation error: module_depth must be at least 1");
    }

    #[test]
    fn test_render_error() {
        let err = Error::render("dot exited with status 1");
        assert_eq!(err.to_string(), "Render error: dot exited with status 1");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
