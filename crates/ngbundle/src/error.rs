//! Error taxonomy for the bundling pipeline.
//!
//! Every variant is fatal. There is no retry tier: a failure here means either
//! a misconfigured manifest or a defect in assembled source, and continuing
//! would publish an incomplete or stale artifact.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    /// A descriptor references a file that cannot be read
    #[error("missing source file {}", .path.display())]
    MissingSourceFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The minifier rejected the assembled text
    #[error("failed to minify {label}: {message}")]
    TransformFailure { label: String, message: String },

    /// Directory creation, write or copy failure
    #[error("failed to write {}", .path.display())]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("module `{module}` references unknown manifest group `{group}`")]
    UnknownGroup { module: String, group: String },

    #[error("manifest group reference cycle: {}", .chain.join(" -> "))]
    GroupCycle { chain: Vec<String> },

    #[error("module `{0}` resolves to an empty source list")]
    EmptySourceList(String),

    /// A projection names a module whose primary artifact does not exist
    #[error("artifact for module `{module}` was not produced at {}", .path.display())]
    MissingArtifact { module: String, path: PathBuf },
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;
