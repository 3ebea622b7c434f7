//! Video 领域错误

use thiserror::Error;

/// Video 领域错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VideoDomainError {
    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),
}
