use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImagesError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("{operation} returned unexpected status {actual} (expected {expected})")]
    UnexpectedStatus {
        operation: &'static str,
        expected: u16,
        actual: u16,
    },
}
