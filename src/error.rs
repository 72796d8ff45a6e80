// src/error.rs
// ISF Reader error types

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IsfError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unable to process ISF file")]
    UnsupportedFormat,

    #[error("Unrecognized byte order: {0:?}")]
    UnrecognizedByteOrder(String),

    #[error("Truncated payload: expected {expected} samples, found {available}")]
    TruncatedPayload { expected: usize, available: usize },

    #[error("Missing header field: {0}")]
    MissingField(&'static str),

    #[error("No '#' block marker found in header")]
    MissingBlockMarker,

    #[error("Invalid block header: {0}")]
    InvalidBlockHeader(String),
}

pub type Result<T> = std::result::Result<T, IsfError>;
