//! Verification entry points.
//!
//! A verification is a strictly sequential chain of service calls:
//!
//! 1. read the inputs,
//! 2. compare the selfie with the document photo,
//! 3. OCR the document and locate name and identifier,
//! 4. optionally stage the proof of residence, run the text job, locate the
//!    address and check the document's name against it.
//!
//! Steps 1–3 are fatal on error. Step 4 never fails the verification: its
//! faults end up in [`ResidenceOutcome`] so the other results still reach
//! the user.

use crate::config::VerificationConfig;
use crate::error::{IdCheckError, ResidenceError};
use crate::output::{
    DocumentReport, FaceComparison, ResidenceOutcome, ResidenceReport, VerificationReport,
    VerificationStats,
};
use crate::pipeline::input::{self, InputFile, InputSlot};
use crate::pipeline::poller::{JobOutcome, JobPoller, Sleeper, TokioSleeper};
use crate::pipeline::{fields, lines, matcher, staging};
use crate::progress::Stage;
use crate::services::{self, Services};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Paths or URLs of the files to verify.
#[derive(Debug, Clone)]
pub struct VerificationInputs {
    pub selfie: String,
    pub document: String,
    pub proof_of_residence: Option<String>,
}

/// The files of a verification, already read into memory.
#[derive(Debug, Clone)]
pub struct VerificationFiles {
    pub selfie: InputFile,
    pub document: InputFile,
    pub proof_of_residence: Option<InputFile>,
}

/// Read every input, checking each against its slot's allowlist.
pub async fn read_inputs(
    inputs: &VerificationInputs,
    config: &VerificationConfig,
) -> Result<VerificationFiles, IdCheckError> {
    let timeout = config.download_timeout_secs;
    let selfie = input::read_input(&inputs.selfie, InputSlot::Selfie, timeout).await?;
    let document = input::read_input(&inputs.document, InputSlot::Document, timeout).await?;
    let proof_of_residence = match &inputs.proof_of_residence {
        Some(p) => Some(input::read_input(p, InputSlot::ProofOfResidence, timeout).await?),
        None => None,
    };
    Ok(VerificationFiles {
        selfie,
        document,
        proof_of_residence,
    })
}

/// Verify against the AWS services for `config.region`.
///
/// # Errors
/// Besides the errors of [`verify`], returns
/// [`IdCheckError::InvalidConfig`] when a proof of residence is supplied
/// without a staging bucket.
pub async fn verify_with_aws(
    inputs: &VerificationInputs,
    config: &VerificationConfig,
) -> Result<VerificationReport, IdCheckError> {
    if inputs.proof_of_residence.is_some() && config.staging_bucket.is_none() {
        return Err(IdCheckError::InvalidConfig(
            "a staging bucket is required to process a proof of residence".into(),
        ));
    }
    let services = services::aws::services(&config.region, config.staging_bucket.clone()).await;
    verify(inputs, &services, config).await
}

/// Verify the given inputs against injected services.
///
/// # Errors
/// Returns `Err` only for input problems and for faults of the face or
/// document stages. A face mismatch is a verdict, not an error.
pub async fn verify(
    inputs: &VerificationInputs,
    services: &Services,
    config: &VerificationConfig,
) -> Result<VerificationReport, IdCheckError> {
    info!(
        "Starting verification: selfie={} document={} residence={:?}",
        inputs.selfie, inputs.document, inputs.proof_of_residence
    );
    let files = stage(config, Stage::ReadInputs, read_inputs(inputs, config)).await?;
    verify_files(&files, services, config, &TokioSleeper).await
}

/// Verify files already in memory, waiting between job polls via `sleeper`.
pub async fn verify_files(
    files: &VerificationFiles,
    services: &Services,
    config: &VerificationConfig,
    sleeper: &dyn Sleeper,
) -> Result<VerificationReport, IdCheckError> {
    let total_start = Instant::now();

    // ── Step 1: Faces ────────────────────────────────────────────────────
    let start = Instant::now();
    let face = stage(
        config,
        Stage::CompareFaces,
        compare_faces(services, &files.selfie.bytes, &files.document.bytes, config),
    )
    .await?;
    let face_ms = start.elapsed().as_millis() as u64;

    // ── Step 2: Document text ────────────────────────────────────────────
    let start = Instant::now();
    let document = stage(
        config,
        Stage::ExtractDocumentText,
        extract_document(services, &files.document.bytes, config),
    )
    .await?;
    let document_ms = start.elapsed().as_millis() as u64;

    // ── Step 3: Proof of residence ───────────────────────────────────────
    let (residence, residence_ms) = match &files.proof_of_residence {
        Some(file) => {
            let start = Instant::now();
            let outcome = stage(
                config,
                Stage::ProcessProofOfResidence,
                process_proof_of_residence(services, file, document.name.as_deref(), config, sleeper),
            )
            .await;
            (Some(outcome), Some(start.elapsed().as_millis() as u64))
        }
        None => (None, None),
    };

    let stats = VerificationStats {
        face_ms,
        document_ms,
        residence_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!("Verification finished in {}ms", stats.total_duration_ms);

    Ok(VerificationReport {
        face,
        document,
        residence,
        stats,
    })
}

/// Compare the selfie with the document photo.
pub async fn compare_faces(
    services: &Services,
    selfie: &[u8],
    document: &[u8],
    config: &VerificationConfig,
) -> Result<FaceComparison, IdCheckError> {
    let matches = services
        .faces
        .compare_faces(selfie, document, config.similarity_threshold)
        .await?;
    let comparison = FaceComparison::from_matches(matches, config.similarity_threshold);
    info!("Face verdict: {:?}", comparison.verdict);
    Ok(comparison)
}

/// OCR the ID document and locate name and identifier.
pub async fn extract_document(
    services: &Services,
    document: &[u8],
    config: &VerificationConfig,
) -> Result<DocumentReport, IdCheckError> {
    let blocks = services.text.detect_text(document).await?;
    let doc_lines = lines::extract_lines(&blocks);
    debug!("Document: {} blocks, {} lines", blocks.len(), doc_lines.len());

    let extracted =
        fields::extract_document_fields(&doc_lines, &config.name_label, &config.identifier_label);
    if extracted.name.is_none() {
        warn!("No line after label '{}' on the ID document", config.name_label);
    }

    Ok(DocumentReport {
        lines: doc_lines,
        name: extracted.name,
        identifier: extracted.identifier,
    })
}

/// Stage the proof of residence, run the text job, and read the result.
///
/// Never returns an error: every fault is folded into
/// [`ResidenceOutcome::Error`] with its raw description.
pub async fn process_proof_of_residence(
    services: &Services,
    file: &InputFile,
    name: Option<&str>,
    config: &VerificationConfig,
    sleeper: &dyn Sleeper,
) -> ResidenceOutcome {
    match run_residence_job(services, file, config, sleeper).await {
        Ok(JobOutcome::Succeeded(blocks)) => {
            let residence_lines = lines::extract_lines(&blocks);
            let address = fields::locate_address(&residence_lines);
            let name_found = name.map(|n| {
                matcher::name_in_text(n, &lines::full_text(&residence_lines))
            });
            info!(
                "Proof of residence: address found={} name found={:?}",
                address.is_some(),
                name_found
            );
            ResidenceOutcome::Processed(ResidenceReport {
                lines: residence_lines,
                address,
                name_found,
            })
        }
        Ok(JobOutcome::Failed(status)) => {
            warn!("Text job for proof of residence ended with {}", status);
            ResidenceOutcome::JobFailed { status }
        }
        Err(e) => {
            warn!("Proof of residence failed: {}", e);
            ResidenceOutcome::Error(ResidenceError::from(e))
        }
    }
}

async fn run_residence_job(
    services: &Services,
    file: &InputFile,
    config: &VerificationConfig,
    sleeper: &dyn Sleeper,
) -> Result<JobOutcome, IdCheckError> {
    let key = staging::staging_key(&config.staging_prefix, &file.extension);
    let jobs = services.jobs.as_ref();

    staging::with_staged_object(
        services.staging.as_ref(),
        &key,
        file.bytes.clone(),
        |object| async move {
            let job_id = jobs.submit(&object).await?;
            info!("Submitted text job {} for {}", job_id, object.key);
            JobPoller::new(jobs, sleeper, config.poll_interval)
                .max_attempts(config.max_poll_attempts)
                .progress(config.progress.as_deref())
                .wait(&job_id)
                .await
        },
    )
    .await
}

/// Run `fut` bracketed by the progress callback's stage events.
async fn stage<T>(
    config: &VerificationConfig,
    which: Stage,
    fut: impl std::future::Future<Output = T>,
) -> T {
    if let Some(cb) = &config.progress {
        cb.on_stage_start(which);
    }
    let result = fut.await;
    if let Some(cb) = &config.progress {
        cb.on_stage_complete(which);
    }
    result
}
