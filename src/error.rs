//! Error types for image loading

use thiserror::Error;

/// Errors raised while fetching pixel data from a WADO-RS store
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid retrieval URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status} for {uri}")]
    Status { status: http::StatusCode, uri: String },

    #[error("invalid response - {0}")]
    InvalidMultipart(String),
}

/// Errors raised while turning pixel data into an image
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Frame for {0} contains no pixel data")]
    EmptyFrame(String),

    #[error("Unsupported transfer syntax: {0}")]
    UnsupportedTransferSyntax(String),

    #[error("Decode failed: {0}")]
    Failed(String),
}

/// Errors surfaced by a load operation.
///
/// Fetch and decode failures are carried unmodified; the variant tells the
/// caller which stage produced them.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("invalid imageId {image_id}: shorter than prefix '{prefix}'")]
    InvalidImageId { image_id: String, prefix: String },

    #[error("no metadata for imageId {0}")]
    MetadataMissing(String),

    #[error(transparent)]
    Fetch(FetchError),

    #[error(transparent)]
    Decode(DecodeError),

    #[error("load of {0} was cancelled")]
    Cancelled(String),

    #[error("load task aborted: {0}")]
    Aborted(String),
}

impl LoadError {
    /// Short name of the pipeline stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            LoadError::InvalidImageId { .. } => "identifier",
            LoadError::MetadataMissing(_) => "metadata",
            LoadError::Fetch(_) => "fetch",
            LoadError::Decode(_) => "decode",
            LoadError::Cancelled(_) => "cancelled",
            LoadError::Aborted(_) => "aborted",
        }
    }
}
