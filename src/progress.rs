//! Progress-callback trait for verification stage events.
//!
//! Inject an [`Arc<dyn VerificationProgressCallback>`] via
//! [`crate::config::VerificationConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages. The CLI turns them into a
//! spinner; a web front end could forward them over a socket.
//!
//! # Example
//!
//! ```rust
//! use idcheck::{Stage, VerificationConfig, VerificationProgressCallback};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl VerificationProgressCallback for PrintStages {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{}…", stage.describe());
//!     }
//! }
//!
//! let config = VerificationConfig::builder()
//!     .progress_callback(Arc::new(PrintStages) as Arc<dyn VerificationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The stages of one verification, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    ReadInputs,
    CompareFaces,
    ExtractDocumentText,
    ProcessProofOfResidence,
}

impl Stage {
    /// Short human-readable label for spinners and logs.
    pub fn describe(self) -> &'static str {
        match self {
            Stage::ReadInputs => "Reading inputs",
            Stage::CompareFaces => "Comparing faces",
            Stage::ExtractDocumentText => "Extracting document text",
            Stage::ProcessProofOfResidence => "Processing proof of residence",
        }
    }
}

/// Called by the pipeline as it runs each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait VerificationProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes, whatever its outcome.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after every job-status query that found the job still pending.
    ///
    /// # Arguments
    /// * `job_id`  — the job being polled
    /// * `attempt` — 1-indexed number of the query that just returned
    fn on_job_pending(&self, job_id: &str, attempt: u32) {
        let _ = (job_id, attempt);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl VerificationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::VerificationConfig`].
pub type ProgressCallback = Arc<dyn VerificationProgressCallback>;
