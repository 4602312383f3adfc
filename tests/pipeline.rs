//! Whole-pipeline tests against in-memory fake services.
//!
//! No network and no real waiting: the fakes script every service answer and
//! a recording sleeper stands in for the poll interval.

use async_trait::async_trait;
use idcheck::pipeline::input::InputFile;
use idcheck::{
    verify, verify_files, Block, FaceComparer, FaceMatch, FaceVerdict, IdCheckError, JobId,
    JobStatus, ObjectStager, ResidenceOutcome, Services, Sleeper, Stage, StagedObjectRef,
    TextDetectionJobs, TextDetector, VerificationConfig, VerificationFiles, VerificationInputs,
    VerificationProgressCallback,
};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Fakes ────────────────────────────────────────────────────────────────────

struct FakeFaces {
    result: Result<Vec<FaceMatch>, String>,
    thresholds: Mutex<Vec<f32>>,
}

#[async_trait]
impl FaceComparer for FakeFaces {
    async fn compare_faces(
        &self,
        _source: &[u8],
        _target: &[u8],
        similarity_threshold: f32,
    ) -> Result<Vec<FaceMatch>, IdCheckError> {
        self.thresholds.lock().unwrap().push(similarity_threshold);
        self.result
            .clone()
            .map_err(|detail| IdCheckError::FaceComparison { detail })
    }
}

struct FakeText {
    blocks: Vec<Block>,
}

#[async_trait]
impl TextDetector for FakeText {
    async fn detect_text(&self, _image: &[u8]) -> Result<Vec<Block>, IdCheckError> {
        Ok(self.blocks.clone())
    }
}

#[derive(Default)]
struct FakeStager {
    refuse_put: Option<String>,
    live: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStager for FakeStager {
    async fn put(&self, key: &str, _bytes: Vec<u8>) -> Result<StagedObjectRef, IdCheckError> {
        if let Some(detail) = &self.refuse_put {
            return Err(IdCheckError::Staging {
                key: key.to_string(),
                detail: detail.clone(),
            });
        }
        self.live.lock().unwrap().push(key.to_string());
        Ok(StagedObjectRef {
            bucket: "kyc-staging".into(),
            key: key.to_string(),
        })
    }

    async fn delete(&self, object: &StagedObjectRef) -> Result<(), IdCheckError> {
        self.live.lock().unwrap().retain(|k| k != &object.key);
        self.deleted.lock().unwrap().push(object.key.clone());
        Ok(())
    }
}

struct FakeJobs {
    script: Mutex<VecDeque<JobStatus>>,
    submitted: Mutex<Vec<StagedObjectRef>>,
    queries: Mutex<u32>,
}

impl FakeJobs {
    fn new(script: Vec<JobStatus>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            submitted: Mutex::new(Vec::new()),
            queries: Mutex::new(0),
        }
    }
}

#[async_trait]
impl TextDetectionJobs for FakeJobs {
    async fn submit(&self, object: &StagedObjectRef) -> Result<JobId, IdCheckError> {
        self.submitted.lock().unwrap().push(object.clone());
        Ok(JobId("job-123".into()))
    }

    async fn status(&self, _job_id: &JobId) -> Result<JobStatus, IdCheckError> {
        *self.queries.lock().unwrap() += 1;
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            Ok(script.pop_front().unwrap())
        } else {
            Ok(script.front().cloned().unwrap_or(JobStatus::Pending))
        }
    }
}

#[derive(Default)]
struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[derive(Default)]
struct StageLog {
    events: Mutex<Vec<String>>,
}

impl VerificationProgressCallback for StageLog {
    fn on_stage_start(&self, stage: Stage) {
        self.events.lock().unwrap().push(format!("start {stage:?}"));
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.events.lock().unwrap().push(format!("done {stage:?}"));
    }

    fn on_job_pending(&self, _job_id: &str, attempt: u32) {
        self.events.lock().unwrap().push(format!("pending {attempt}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

struct Harness {
    faces: Arc<FakeFaces>,
    stager: Arc<FakeStager>,
    jobs: Arc<FakeJobs>,
    services: Services,
}

fn harness(
    faces: Result<Vec<FaceMatch>, String>,
    document_lines: &[&str],
    stager: FakeStager,
    job_script: Vec<JobStatus>,
) -> Harness {
    let faces = Arc::new(FakeFaces {
        result: faces,
        thresholds: Mutex::new(Vec::new()),
    });
    let text = Arc::new(FakeText {
        blocks: document_lines.iter().map(|l| Block::line(*l)).collect(),
    });
    let stager = Arc::new(stager);
    let jobs = Arc::new(FakeJobs::new(job_script));
    let services = Services {
        faces: faces.clone(),
        text,
        staging: stager.clone(),
        jobs: jobs.clone(),
    };
    Harness {
        faces,
        stager,
        jobs,
        services,
    }
}

fn rg_lines() -> Vec<&'static str> {
    vec![
        "REPUBLICA FEDERATIVA DO BRASIL",
        "NOME",
        "Maria Silva",
        "CPF",
        "111.222.333-44",
    ]
}

fn residence_blocks(lines: &[&str]) -> Vec<Block> {
    let mut blocks = vec![Block::page()];
    for line in lines {
        blocks.push(Block::line(*line));
        for word in line.split_whitespace() {
            blocks.push(Block::word(word));
        }
    }
    blocks
}

fn file(name: &str, extension: &str) -> InputFile {
    InputFile {
        source: name.to_string(),
        extension: extension.to_string(),
        bytes: name.as_bytes().to_vec(),
    }
}

fn files(with_residence: bool) -> VerificationFiles {
    VerificationFiles {
        selfie: file("selfie.jpg", "jpg"),
        document: file("rg.png", "png"),
        proof_of_residence: with_residence.then(|| file("conta_luz.pdf", "pdf")),
    }
}

fn matched() -> Result<Vec<FaceMatch>, String> {
    Ok(vec![FaceMatch { similarity: 99.5 }])
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_verification_with_proof_of_residence() {
    let h = harness(
        matched(),
        &rg_lines(),
        FakeStager::default(),
        vec![
            JobStatus::Pending,
            JobStatus::Pending,
            JobStatus::Succeeded(residence_blocks(&[
                "CONTA DE ENERGIA",
                "Titular: Maria Silva",
                "RUA das Flores, 123",
                "Bairro Centro",
            ])),
        ],
    );
    let sleeper = RecordingSleeper::default();
    let config = VerificationConfig::default();

    let report = verify_files(&files(true), &h.services, &config, &sleeper)
        .await
        .unwrap();

    assert_eq!(report.face.verdict, FaceVerdict::Match { similarity: 99.5 });
    assert_eq!(*h.faces.thresholds.lock().unwrap(), vec![80.0]);
    assert_eq!(report.document.name.as_deref(), Some("Maria Silva"));
    assert_eq!(report.document.identifier.as_deref(), Some("111.222.333-44"));

    match report.residence {
        Some(ResidenceOutcome::Processed(ref r)) => {
            assert_eq!(r.address.as_deref(), Some("RUA das Flores, 123 Bairro Centro"));
            assert_eq!(r.name_found, Some(true));
        }
        ref other => panic!("unexpected residence outcome: {other:?}"),
    }
    assert_eq!(
        report.fields().address.as_deref(),
        Some("RUA das Flores, 123 Bairro Centro")
    );

    assert_eq!(*h.jobs.queries.lock().unwrap(), 3);
    assert_eq!(
        *sleeper.sleeps.lock().unwrap(),
        vec![Duration::from_secs(1), Duration::from_secs(1)]
    );

    let submitted = h.jobs.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert!(submitted[0].key.starts_with("idcheck-tmp/"));
    assert!(submitted[0].key.ends_with(".pdf"));
    assert!(h.stager.live.lock().unwrap().is_empty());
    assert_eq!(*h.stager.deleted.lock().unwrap(), vec![submitted[0].key.clone()]);
}

#[tokio::test]
async fn face_mismatch_is_a_verdict_and_text_is_still_extracted() {
    let h = harness(Ok(vec![]), &rg_lines(), FakeStager::default(), vec![]);
    let report = verify_files(
        &files(false),
        &h.services,
        &VerificationConfig::default(),
        &RecordingSleeper::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.face.verdict, FaceVerdict::NoMatch);
    assert_eq!(report.document.lines.len(), 5);
    assert_eq!(report.document.name.as_deref(), Some("Maria Silva"));
    assert!(report.residence.is_none());
    assert!(h.jobs.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn name_check_is_case_sensitive() {
    let h = harness(
        matched(),
        &rg_lines(),
        FakeStager::default(),
        vec![JobStatus::Succeeded(residence_blocks(&[
            "MARIA SILVA",
            "AVENIDA Paulista, 1000",
        ]))],
    );
    let report = verify_files(
        &files(true),
        &h.services,
        &VerificationConfig::default(),
        &RecordingSleeper::default(),
    )
    .await
    .unwrap();

    match report.residence {
        Some(ResidenceOutcome::Processed(r)) => {
            assert_eq!(r.name_found, Some(false));
            assert_eq!(r.address.as_deref(), Some("AVENIDA Paulista, 1000"));
        }
        other => panic!("unexpected residence outcome: {other:?}"),
    }
}

#[tokio::test]
async fn missing_name_skips_the_name_check() {
    let h = harness(
        matched(),
        &["CARTEIRA DE IDENTIDADE", "CPF", "111.222.333-44"],
        FakeStager::default(),
        vec![JobStatus::Succeeded(residence_blocks(&["Maria Silva"]))],
    );
    let report = verify_files(
        &files(true),
        &h.services,
        &VerificationConfig::default(),
        &RecordingSleeper::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.document.name, None);
    match report.residence {
        Some(ResidenceOutcome::Processed(r)) => {
            assert_eq!(r.name_found, None);
            assert_eq!(r.address, None);
        }
        other => panic!("unexpected residence outcome: {other:?}"),
    }
}

#[tokio::test]
async fn failed_job_is_reported_verbatim_and_object_deleted() {
    let h = harness(
        matched(),
        &rg_lines(),
        FakeStager::default(),
        vec![JobStatus::Failed("FAILED: unsupported document format".into())],
    );
    let sleeper = RecordingSleeper::default();
    let report = verify_files(&files(true), &h.services, &VerificationConfig::default(), &sleeper)
        .await
        .unwrap();

    assert_eq!(
        report.residence,
        Some(ResidenceOutcome::JobFailed {
            status: "FAILED: unsupported document format".into()
        })
    );
    assert_eq!(*h.jobs.queries.lock().unwrap(), 1);
    assert!(sleeper.sleeps.lock().unwrap().is_empty());
    assert!(h.stager.live.lock().unwrap().is_empty());
    assert_eq!(h.stager.deleted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn staging_fault_is_non_fatal() {
    let h = harness(
        matched(),
        &rg_lines(),
        FakeStager {
            refuse_put: Some("NoSuchBucket".into()),
            ..Default::default()
        },
        vec![],
    );
    let report = verify_files(
        &files(true),
        &h.services,
        &VerificationConfig::default(),
        &RecordingSleeper::default(),
    )
    .await
    .unwrap();

    assert!(report.face.is_match());
    assert_eq!(report.document.name.as_deref(), Some("Maria Silva"));
    match report.residence {
        Some(ResidenceOutcome::Error(e)) => assert!(e.detail.contains("NoSuchBucket")),
        other => panic!("unexpected residence outcome: {other:?}"),
    }
    assert!(h.jobs.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stuck_job_hits_the_attempt_bound_and_object_is_deleted() {
    let h = harness(matched(), &rg_lines(), FakeStager::default(), vec![JobStatus::Pending]);
    let config = VerificationConfig::builder()
        .max_poll_attempts(5)
        .poll_interval(Duration::from_millis(250))
        .build()
        .unwrap();
    let sleeper = RecordingSleeper::default();

    let report = verify_files(&files(true), &h.services, &config, &sleeper)
        .await
        .unwrap();

    match report.residence {
        Some(ResidenceOutcome::Error(e)) => assert!(e.detail.contains("job-123"), "{e}"),
        other => panic!("unexpected residence outcome: {other:?}"),
    }
    assert_eq!(*h.jobs.queries.lock().unwrap(), 5);
    assert_eq!(
        *sleeper.sleeps.lock().unwrap(),
        vec![Duration::from_millis(250); 4]
    );
    assert!(h.stager.live.lock().unwrap().is_empty());
}

#[tokio::test]
async fn face_service_fault_is_fatal() {
    let h = harness(
        Err("InvalidParameterException: no face in source image".into()),
        &rg_lines(),
        FakeStager::default(),
        vec![],
    );
    let err = verify_files(
        &files(true),
        &h.services,
        &VerificationConfig::default(),
        &RecordingSleeper::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, IdCheckError::FaceComparison { .. }));
    assert!(err.to_string().contains("no face in source image"));
    assert!(h.stager.live.lock().unwrap().is_empty());
    assert!(h.jobs.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn progress_callback_sees_stages_in_order() {
    let h = harness(
        matched(),
        &rg_lines(),
        FakeStager::default(),
        vec![
            JobStatus::Pending,
            JobStatus::Succeeded(residence_blocks(&["RUA A, 1"])),
        ],
    );
    let log = Arc::new(StageLog::default());
    let config = VerificationConfig::builder()
        .progress_callback(log.clone())
        .build()
        .unwrap();

    verify_files(&files(true), &h.services, &config, &RecordingSleeper::default())
        .await
        .unwrap();

    assert_eq!(
        *log.events.lock().unwrap(),
        vec![
            "start CompareFaces",
            "done CompareFaces",
            "start ExtractDocumentText",
            "done ExtractDocumentText",
            "start ProcessProofOfResidence",
            "pending 1",
            "done ProcessProofOfResidence",
        ]
    );
}

// ── Through `verify`: real files on disk, real (paused) timer ───────────────

fn temp_input(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    f.write_all(contents).unwrap();
    f
}

#[tokio::test(start_paused = true)]
async fn verify_reads_files_from_disk() {
    let selfie = temp_input(".jpg", b"selfie");
    let document = temp_input(".PNG", b"document");
    let proof = temp_input(".pdf", b"%PDF-1.7");

    let h = harness(
        matched(),
        &rg_lines(),
        FakeStager::default(),
        vec![
            JobStatus::Pending,
            JobStatus::Succeeded(residence_blocks(&["Maria Silva", "Endereço", "Rua B, 2"])),
        ],
    );
    let inputs = VerificationInputs {
        selfie: selfie.path().to_str().unwrap().to_string(),
        document: document.path().to_str().unwrap().to_string(),
        proof_of_residence: Some(proof.path().to_str().unwrap().to_string()),
    };

    let report = verify(&inputs, &h.services, &VerificationConfig::default())
        .await
        .unwrap();

    match report.residence {
        Some(ResidenceOutcome::Processed(r)) => {
            assert_eq!(r.address.as_deref(), Some("Endereço Rua B, 2"));
            assert_eq!(r.name_found, Some(true));
        }
        other => panic!("unexpected residence outcome: {other:?}"),
    }
}

#[tokio::test]
async fn verify_rejects_wrong_extension_before_calling_services() {
    let selfie = temp_input(".gif", b"selfie");
    let document = temp_input(".png", b"document");

    let h = harness(matched(), &rg_lines(), FakeStager::default(), vec![]);
    let inputs = VerificationInputs {
        selfie: selfie.path().to_str().unwrap().to_string(),
        document: document.path().to_str().unwrap().to_string(),
        proof_of_residence: None,
    };

    let err = verify(&inputs, &h.services, &VerificationConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, IdCheckError::UnsupportedExtension { .. }), "got: {err}");
    assert!(h.faces.thresholds.lock().unwrap().is_empty());
}
