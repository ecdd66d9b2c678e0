use std::{io, path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error("{tool} exited with {}: {stderr}", code.map(|c| c.to_string()).unwrap_or("signal".to_string()))]
    Failed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("{tool} timed out after {}s", after.as_secs())]
    TimedOut { tool: String, after: Duration },
    #[error("{tool} was interrupted")]
    Cancelled { tool: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("unparsable probe output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no video stream")]
    NoVideoStream,
    #[error("probe returned no {0}")]
    MissingField(&'static str),
    #[error("invalid {field} {value:?}")]
    InvalidValue { field: &'static str, value: String },
    #[error("probe returned a zero bitrate")]
    ZeroBitrate,
}

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("failed to move {from} into place: {source}")]
    Finalize {
        from: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fatal errors raised before any file is touched.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("source directory {0} does not exist")]
    SourceMissing(PathBuf),
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("output directory name {0:?} must be a single plain path component")]
    OutputDirName(String),
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot list {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("target bitrate must be a positive number of Mbit/s, got {0}")]
    InvalidBitrate(f64),
}
