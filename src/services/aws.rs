//! AWS adapters for the capability traits.
//!
//! Rekognition compares faces, Textract reads text (synchronously for the ID
//! image, as a job for the staged PDF) and S3 holds the staged PDF while the
//! job runs. Clients are built once from the default credential chain for the
//! configured region and shared by every verification.

use super::{
    Block, BlockType, FaceComparer, FaceMatch, JobId, JobStatus, ObjectStager, Services,
    StagedObjectRef, TextDetectionJobs, TextDetector,
};
use crate::error::IdCheckError;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_rekognition::primitives::Blob as RekognitionBlob;
use aws_sdk_rekognition::types::Image;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_textract::error::DisplayErrorContext;
use aws_sdk_textract::operation::get_document_text_detection::GetDocumentTextDetectionOutput;
use aws_sdk_textract::primitives::Blob as TextractBlob;
use aws_sdk_textract::types::{
    Block as TextractBlock, BlockType as TextractBlockType, Document, DocumentLocation,
    JobStatus as TextractJobStatus, S3Object,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Build the full set of AWS-backed services for `region`.
///
/// `staging_bucket` may be `None` when no proof of residence will be
/// processed; staging then fails with [`IdCheckError::Staging`].
pub async fn services(region: &str, staging_bucket: Option<String>) -> Services {
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await;
    debug!("Loaded AWS config for region {}", region);

    let textract = aws_sdk_textract::Client::new(&config);

    Services {
        faces: Arc::new(RekognitionFaces::with_client(
            aws_sdk_rekognition::Client::new(&config),
        )),
        text: Arc::new(TextractText::with_client(textract.clone())),
        staging: Arc::new(S3Stager::with_client(
            aws_sdk_s3::Client::new(&config),
            staging_bucket,
        )),
        jobs: Arc::new(TextractJobs::with_client(textract)),
    }
}

// ── Rekognition ──────────────────────────────────────────────────────────

pub struct RekognitionFaces {
    client: aws_sdk_rekognition::Client,
}

impl RekognitionFaces {
    pub fn with_client(client: aws_sdk_rekognition::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FaceComparer for RekognitionFaces {
    #[instrument(skip(self, source, target), fields(source_len = source.len(), target_len = target.len()))]
    async fn compare_faces(
        &self,
        source: &[u8],
        target: &[u8],
        similarity_threshold: f32,
    ) -> Result<Vec<FaceMatch>, IdCheckError> {
        let response = self
            .client
            .compare_faces()
            .source_image(
                Image::builder()
                    .bytes(RekognitionBlob::new(source.to_vec()))
                    .build(),
            )
            .target_image(
                Image::builder()
                    .bytes(RekognitionBlob::new(target.to_vec()))
                    .build(),
            )
            .similarity_threshold(similarity_threshold)
            .send()
            .await
            .map_err(|e| IdCheckError::FaceComparison {
                detail: aws_sdk_rekognition::error::DisplayErrorContext(&e).to_string(),
            })?;

        let matches: Vec<FaceMatch> = response
            .face_matches()
            .iter()
            .map(|m| FaceMatch {
                similarity: m.similarity().unwrap_or(0.0),
            })
            .collect();
        debug!("CompareFaces returned {} matches", matches.len());
        Ok(matches)
    }
}

// ── Textract ─────────────────────────────────────────────────────────────

pub struct TextractText {
    client: aws_sdk_textract::Client,
}

impl TextractText {
    pub fn with_client(client: aws_sdk_textract::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextDetector for TextractText {
    #[instrument(skip(self, image), fields(image_len = image.len()))]
    async fn detect_text(&self, image: &[u8]) -> Result<Vec<Block>, IdCheckError> {
        let response = self
            .client
            .detect_document_text()
            .document(Document::builder().bytes(TextractBlob::new(image.to_vec())).build())
            .send()
            .await
            .map_err(|e| IdCheckError::TextDetection {
                detail: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(response.blocks().iter().map(convert_block).collect())
    }
}

pub struct TextractJobs {
    client: aws_sdk_textract::Client,
}

impl TextractJobs {
    pub fn with_client(client: aws_sdk_textract::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextDetectionJobs for TextractJobs {
    #[instrument(skip(self), fields(bucket = %object.bucket, key = %object.key))]
    async fn submit(&self, object: &StagedObjectRef) -> Result<JobId, IdCheckError> {
        let location = DocumentLocation::builder()
            .s3_object(
                S3Object::builder()
                    .bucket(&object.bucket)
                    .name(&object.key)
                    .build(),
            )
            .build();

        let response = self
            .client
            .start_document_text_detection()
            .document_location(location)
            .send()
            .await
            .map_err(|e| IdCheckError::TextDetection {
                detail: DisplayErrorContext(&e).to_string(),
            })?;

        response
            .job_id()
            .map(|id| JobId(id.to_string()))
            .ok_or_else(|| IdCheckError::TextDetection {
                detail: "StartDocumentTextDetection returned no JobId".into(),
            })
    }

    /// Query the job; on success, follow `NextToken` until every block of
    /// every page has been collected.
    #[instrument(skip(self), fields(job_id = %job_id))]
    async fn status(&self, job_id: &JobId) -> Result<JobStatus, IdCheckError> {
        collect_pages(job_id, |next_token| {
            let request = self
                .client
                .get_document_text_detection()
                .job_id(&job_id.0)
                .set_next_token(next_token);
            let id = job_id.0.clone();
            async move {
                request.send().await.map_err(|e| IdCheckError::JobStatus {
                    job_id: id,
                    detail: DisplayErrorContext(&e).to_string(),
                })
            }
        })
        .await
    }
}

/// What one `GetDocumentTextDetection` page says about the job.
#[derive(Debug, PartialEq)]
enum PageOutcome {
    Pending,
    Failed(String),
    Blocks {
        blocks: Vec<Block>,
        next_token: Option<String>,
    },
}

fn classify_page(
    job_id: &JobId,
    page: &GetDocumentTextDetectionOutput,
) -> Result<PageOutcome, IdCheckError> {
    match page.job_status() {
        Some(TextractJobStatus::InProgress) => return Ok(PageOutcome::Pending),
        Some(TextractJobStatus::Succeeded) => {}
        Some(TextractJobStatus::PartialSuccess) => {
            warn!("Job {} finished with PARTIAL_SUCCESS; using the blocks returned", job_id);
        }
        Some(other) => {
            let status = match page.status_message() {
                Some(message) => format!("{}: {}", other.as_str(), message),
                None => other.as_str().to_string(),
            };
            return Ok(PageOutcome::Failed(status));
        }
        None => {
            return Err(IdCheckError::JobStatus {
                job_id: job_id.0.clone(),
                detail: "response carried no JobStatus".into(),
            })
        }
    }

    Ok(PageOutcome::Blocks {
        blocks: page.blocks().iter().map(convert_block).collect(),
        next_token: page.next_token().map(str::to_string),
    })
}

/// Fetch pages with `fetch(next_token)` until the last one, merging blocks.
async fn collect_pages<F, Fut>(job_id: &JobId, mut fetch: F) -> Result<JobStatus, IdCheckError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<GetDocumentTextDetectionOutput, IdCheckError>>,
{
    let mut blocks = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = fetch(next_token.take()).await?;
        match classify_page(job_id, &page)? {
            PageOutcome::Pending => return Ok(JobStatus::Pending),
            PageOutcome::Failed(status) => return Ok(JobStatus::Failed(status)),
            PageOutcome::Blocks {
                blocks: page_blocks,
                next_token: token,
            } => {
                blocks.extend(page_blocks);
                match token {
                    Some(token) => next_token = Some(token),
                    None => break,
                }
            }
        }
    }

    debug!("Job {} succeeded with {} blocks", job_id, blocks.len());
    Ok(JobStatus::Succeeded(blocks))
}

fn convert_block(block: &TextractBlock) -> Block {
    let block_type = match block.block_type() {
        Some(TextractBlockType::Line) => BlockType::Line,
        Some(TextractBlockType::Word) => BlockType::Word,
        Some(TextractBlockType::Page) => BlockType::Page,
        Some(other) => BlockType::Other(other.as_str().to_string()),
        None => BlockType::Other(String::new()),
    };
    Block {
        block_type,
        text: block.text().map(str::to_string),
    }
}

// ── S3 ───────────────────────────────────────────────────────────────────

pub struct S3Stager {
    client: aws_sdk_s3::Client,
    bucket: Option<String>,
}

impl S3Stager {
    pub fn with_client(client: aws_sdk_s3::Client, bucket: Option<String>) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStager for S3Stager {
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<StagedObjectRef, IdCheckError> {
        let bucket = self.bucket.clone().ok_or_else(|| IdCheckError::Staging {
            key: key.to_string(),
            detail: "no staging bucket configured".into(),
        })?;

        self.client
            .put_object()
            .bucket(&bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| IdCheckError::Staging {
                key: key.to_string(),
                detail: aws_sdk_s3::error::DisplayErrorContext(&e).to_string(),
            })?;

        Ok(StagedObjectRef {
            bucket,
            key: key.to_string(),
        })
    }

    #[instrument(skip(self), fields(bucket = %object.bucket, key = %object.key))]
    async fn delete(&self, object: &StagedObjectRef) -> Result<(), IdCheckError> {
        self.client
            .delete_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| IdCheckError::Staging {
                key: object.key.clone(),
                detail: aws_sdk_s3::error::DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}
