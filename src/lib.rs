//! # idcheck
//!
//! Identity verification on top of cloud vision services: compare a selfie
//! with the photo on an ID document, read the holder's name and identifier
//! off the document, and optionally read the address off a proof of
//! residence and check that the holder's name appears on it.
//!
//! The crate does no computer vision of its own. Face similarity comes from
//! a [`FaceComparer`], text from a [`TextDetector`] or an asynchronous
//! [`TextDetectionJobs`] pipeline fed through an [`ObjectStager`]. The AWS
//! adapters (Rekognition, Textract, S3) live in [`services::aws`]; tests
//! inject fakes through [`Services`].
//!
//! ## Pipeline Overview
//!
//! ```text
//! inputs (paths / URLs)
//!  │
//!  ├─ 1. Input     read files, extension allowlist
//!  ├─ 2. Faces     CompareFaces(selfie, document, threshold) → verdict
//!  ├─ 3. Document  DetectDocumentText → lines → NOME / CPF
//!  ├─ 4. Residence stage PDF → text job → poll → lines → address
//!  │               └─ name from step 3 checked against the PDF text
//!  └─ 5. Output    VerificationReport (text or JSON)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use idcheck::{verify_with_aws, VerificationConfig, VerificationInputs};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = VerificationConfig::builder()
//!         .staging_bucket("my-kyc-staging")
//!         .build()?;
//!     let inputs = VerificationInputs {
//!         selfie: "selfie.jpg".into(),
//!         document: "rg.png".into(),
//!         proof_of_residence: Some("conta_luz.pdf".into()),
//!     };
//!     let report = verify_with_aws(&inputs, &config).await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `idcheck` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod services;
pub mod verify;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{VerificationConfig, VerificationConfigBuilder};
pub use error::{IdCheckError, ResidenceError};
pub use output::{
    DocumentReport, ExtractedFields, FaceComparison, FaceVerdict, ResidenceOutcome,
    ResidenceReport, VerificationReport, VerificationStats,
};
pub use pipeline::fields::{locate_address, locate_field};
pub use pipeline::lines::extract_lines;
pub use pipeline::matcher::name_in_text;
pub use pipeline::poller::{JobOutcome, JobPoller, PollState, Sleeper, TokioSleeper};
pub use progress::{
    NoopProgressCallback, ProgressCallback, Stage, VerificationProgressCallback,
};
pub use services::{
    Block, BlockType, FaceComparer, FaceMatch, JobId, JobStatus, ObjectStager, Services,
    StagedObjectRef, TextDetectionJobs, TextDetector,
};
pub use verify::{
    read_inputs, verify, verify_files, verify_with_aws, VerificationFiles, VerificationInputs,
};
