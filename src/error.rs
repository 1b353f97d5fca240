use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BashGenError {
    #[error("invalid format: {0}")]
    Format(String),

    #[error("could not find {pattern} in {input}")]
    NotFound { pattern: String, input: String },

    #[error("no \"{pattern}\" files in {dir}")]
    #[diagnostic(help("every session is expected to contain at least one matching sidecar"))]
    MissingData { pattern: String, dir: String },

    #[error("run {run} does not belong to any fieldmap group")]
    #[diagnostic(help("add the run to `fieldmap_groups` in the config file"))]
    Lookup { run: String },

    #[error("group size must be at least 1, got {0}")]
    InvalidGroupSize(usize),

    #[error("invalid pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid sidecar {path}: {message}")]
    Sidecar { path: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
