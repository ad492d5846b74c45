use super::ModelRole;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an inventory scan, a dispatch run or a tracking call
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("{kind} folder not found at {}", .path.display())]
    MissingDirectory { kind: &'static str, path: PathBuf },

    #[error("Unexpected filename `{name}`: {reason}")]
    FilenameParse { name: String, reason: String },

    #[error("Invalid session timestamp `{value}` in `{name}`: {source}")]
    Timestamp {
        name: String,
        value: String,
        source: chrono::ParseError,
    },

    #[error("No model configured for session type `{0}`")]
    UnknownSessionType(String),

    #[error(
        "Expected exactly one {role} model for session type {session_type} in {}, found {count}",
        .models_dir.display()
    )]
    ModelResolution {
        session_type: String,
        role: ModelRole,
        models_dir: PathBuf,
        count: usize,
    },

    #[error("Job paths cannot contain whitespace: {}", .0.display())]
    JobPath(PathBuf),

    #[error("Failed to submit {}: {message}", .script.display())]
    Submission { script: PathBuf, message: String },

    #[error("Inference failed for {}: {message}", .video.display())]
    Engine { video: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackingError>;
