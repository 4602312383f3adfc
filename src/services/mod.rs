//! Capability traits for the external collaborators.
//!
//! Every piece of actual computer vision happens behind one of these traits.
//! The pipeline receives them as `Arc<dyn Trait>` handles through
//! [`Services`], never as process-wide singletons, so tests can substitute
//! in-memory fakes and the AWS adapters in [`aws`] are just one
//! implementation.
//!
//! | Trait | Call | AWS adapter |
//! |-------|------|-------------|
//! | [`FaceComparer`] | two images + threshold → matches | Rekognition `CompareFaces` |
//! | [`TextDetector`] | one image → blocks | Textract `DetectDocumentText` |
//! | [`ObjectStager`] | put/delete a blob | S3 `PutObject` / `DeleteObject` |
//! | [`TextDetectionJobs`] | submit + status | Textract `Start/GetDocumentTextDetection` |

pub mod aws;

use crate::error::IdCheckError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ── Shapes returned by the services ──────────────────────────────────────

/// Discriminator of a recognised [`Block`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockType {
    Page,
    Line,
    Word,
    /// Any other type the OCR engine reports (tables, key-value sets, …).
    Other(String),
}

/// A unit of recognised content, in the order the OCR engine returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub block_type: BlockType,
    pub text: Option<String>,
}

impl Block {
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            block_type: BlockType::Line,
            text: Some(text.into()),
        }
    }

    pub fn word(text: impl Into<String>) -> Self {
        Self {
            block_type: BlockType::Word,
            text: Some(text.into()),
        }
    }

    pub fn page() -> Self {
        Self {
            block_type: BlockType::Page,
            text: None,
        }
    }
}

/// One face match reported by the face-comparison service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceMatch {
    /// Confidence in percent (0–100).
    pub similarity: f32,
}

/// Opaque handle of an asynchronous text-detection job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location of a staged object in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedObjectRef {
    pub bucket: String,
    pub key: String,
}

/// Status of an asynchronous text-detection job.
///
/// Transitions are `Pending → Succeeded` or `Pending → Failed`; the status is
/// only ever observed by polling.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    Succeeded(Vec<Block>),
    /// Terminal non-success. The string is the service's status, verbatim.
    Failed(String),
}

// ── Capability traits ────────────────────────────────────────────────────

/// Compares the face in `source` to the face in `target`.
#[async_trait]
pub trait FaceComparer: Send + Sync {
    /// Returns every match at or above `similarity_threshold` (percent).
    /// An empty list means the faces do not correspond.
    async fn compare_faces(
        &self,
        source: &[u8],
        target: &[u8],
        similarity_threshold: f32,
    ) -> Result<Vec<FaceMatch>, IdCheckError>;
}

/// Synchronous OCR of a single image.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect_text(&self, image: &[u8]) -> Result<Vec<Block>, IdCheckError>;
}

/// Temporary external storage for files the async OCR reads by reference.
#[async_trait]
pub trait ObjectStager: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<StagedObjectRef, IdCheckError>;
    async fn delete(&self, object: &StagedObjectRef) -> Result<(), IdCheckError>;
}

/// Job-based OCR of a staged document.
#[async_trait]
pub trait TextDetectionJobs: Send + Sync {
    async fn submit(&self, object: &StagedObjectRef) -> Result<JobId, IdCheckError>;
    async fn status(&self, job_id: &JobId) -> Result<JobStatus, IdCheckError>;
}

/// The set of collaborator handles one verification runs against.
#[derive(Clone)]
pub struct Services {
    pub faces: Arc<dyn FaceComparer>,
    pub text: Arc<dyn TextDetector>,
    pub staging: Arc<dyn ObjectStager>,
    pub jobs: Arc<dyn TextDetectionJobs>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("faces", &"<dyn FaceComparer>")
            .field("text", &"<dyn TextDetector>")
            .field("staging", &"<dyn ObjectStager>")
            .field("jobs", &"<dyn TextDetectionJobs>")
            .finish()
    }
}
