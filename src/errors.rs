/*!
 * Error types for the subtrans library.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::fmt;

use thiserror::Error;

use crate::encoding::SourceEncoding;
use crate::pipeline::DocumentMetadata;

/// Errors raised when bytes cannot be decoded under the declared encoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The byte sequence contains sequences that are invalid for the encoding
    #[error("Input is not valid {encoding}")]
    Malformed {
        /// Encoding the bytes were declared as
        encoding: SourceEncoding,
    },
}

/// Errors raised for a single malformed SRT block
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The block has no `start --> end` line
    #[error("Block {block} has no time range line")]
    MissingTimeRange { block: usize },

    /// The time range line could not be parsed
    #[error("Invalid time range at block {block}: {line}")]
    InvalidTimeRange { block: usize, line: String },

    /// A single timestamp could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// End time precedes start time
    #[error("Block {block} ends at {end_ms}ms before it starts at {start_ms}ms")]
    InvertedTimeRange {
        block: usize,
        start_ms: u64,
        end_ms: u64,
    },

    /// The block has a time range but no text lines
    #[error("Block {block} has no caption text")]
    MissingText { block: usize },
}

/// Errors reported by a document store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store refused the record because a field is invalid
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other backend failure
    #[error("Store backend error: {0:#}")]
    Backend(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Backend(error.into())
    }
}

/// All user-fixable problems found with a submission, with the submitted
/// fields echoed back so the caller can re-display them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    /// Human-readable messages, in the order they were detected
    pub messages: Vec<String>,

    /// Metadata exactly as submitted
    pub submitted: Option<DocumentMetadata>,
}

impl ValidationErrors {
    pub fn new(submitted: Option<DocumentMetadata>) -> Self {
        Self {
            messages: Vec::new(),
            submitted,
        }
    }

    pub fn single(message: impl Into<String>, submitted: Option<DocumentMetadata>) -> Self {
        Self {
            messages: vec![message.into()],
            submitted,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages.join("; "))
    }
}

/// Errors surfaced by the document pipeline to its callers
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The submission was rejected; every message is user-fixable
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The document does not exist or has no captions
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store failed; details are logged, not shown to callers
    #[error("Persistence error: {0:#}")]
    Persistence(anyhow::Error),
}

impl PipelineError {
    /// Message that is safe to show to the submitter
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors.to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::Persistence(_) => "Server error".to_string(),
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Validation { field, message } => Self::Validation(
                ValidationErrors::single(format!("Invalid {}: {}", field, message), None),
            ),
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Backend(e) => Self::Persistence(e),
        }
    }
}
