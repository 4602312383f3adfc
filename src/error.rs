//! Error types for the idcheck library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`IdCheckError`] — **Fatal**: the verification cannot proceed at all
//!   (missing input file, unsupported extension, face comparison or document
//!   OCR unavailable). Returned as `Err(IdCheckError)` from [`crate::verify`].
//!
//! * [`ResidenceError`] — **Non-fatal**: the proof-of-residence stage failed
//!   (staging, job submission, polling) but the face verdict and document
//!   fields are still valid. Stored inside
//!   [`crate::output::ResidenceOutcome::Error`] and rendered to the user.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the idcheck library.
#[derive(Debug, Error)]
pub enum IdCheckError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is empty or otherwise unusable.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The file extension is not on the allowlist for this slot.
    #[error("Unsupported file '{input}' for {slot}: expected one of {allowed}")]
    UnsupportedExtension {
        input: String,
        slot: &'static str,
        allowed: String,
    },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// Reading a local input failed after it was found.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Service errors ────────────────────────────────────────────────────
    /// The face-comparison service returned an error.
    #[error("Face comparison failed: {detail}")]
    FaceComparison { detail: String },

    /// Synchronous or asynchronous text detection returned an error.
    #[error("Text detection failed: {detail}")]
    TextDetection { detail: String },

    /// Putting or deleting the staged object failed.
    #[error("Staging object '{key}' failed: {detail}")]
    Staging { key: String, detail: String },

    /// Querying the status of a text-detection job failed.
    #[error("Status query for job '{job_id}' failed: {detail}")]
    JobStatus { job_id: String, detail: String },

    /// The job was still pending after the configured attempt bound.
    #[error("Job '{job_id}' still pending after {attempts} status queries")]
    PollTimeout { job_id: String, attempts: u32 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of the proof-of-residence stage.
///
/// Carries the raw description of whatever went wrong so it can be shown to
/// the user verbatim. There is no retry: the user resubmits.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[error("Proof of residence could not be processed: {detail}")]
pub struct ResidenceError {
    pub detail: String,
}

impl From<IdCheckError> for ResidenceError {
    fn from(e: IdCheckError) -> Self {
        Self {
            detail: e.to_string(),
        }
    }
}
