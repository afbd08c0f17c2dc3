use std::path::PathBuf;

use crate::foundation::core::FrameIndex;

pub type MorphResult<T> = Result<T, MorphError>;

#[derive(thiserror::Error, Debug)]
pub enum MorphError {
    #[error("io error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("mismatch in transform {transform} at '{path}': {reason}")]
    Mismatch {
        transform: usize,
        path: String,
        reason: String,
    },

    #[error("render error on frame {}: {detail}", .frame.0)]
    Render { frame: FrameIndex, detail: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MorphError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    pub fn mismatch(transform: usize, path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Mismatch {
            transform,
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn render(frame: FrameIndex, detail: impl Into<String>) -> Self {
        Self::Render {
            frame,
            detail: detail.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
