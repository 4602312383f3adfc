//! Configuration types for an identity verification.
//!
//! All verification behaviour is controlled through [`VerificationConfig`],
//! built via its [`VerificationConfigBuilder`]. Every knob has a default that
//! reproduces the behaviour of the original web form, so
//! `VerificationConfig::default()` is a working configuration for the face
//! and document stages. Only the proof-of-residence stage needs more: a
//! staging bucket.

use crate::error::IdCheckError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::time::Duration;

/// Configuration for one verification.
///
/// # Example
/// ```rust
/// use idcheck::VerificationConfig;
/// use std::time::Duration;
///
/// let config = VerificationConfig::builder()
///     .similarity_threshold(90.0)
///     .staging_bucket("my-kyc-staging")
///     .poll_interval(Duration::from_secs(2))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct VerificationConfig {
    /// AWS region for every service client. Default: `us-east-1`.
    pub region: String,

    /// Minimum face-match confidence in percent. Range: 0–100. Default: 80.
    pub similarity_threshold: f32,

    /// Bucket where the proof of residence is staged while the text job runs.
    /// Required when a proof of residence is supplied.
    pub staging_bucket: Option<String>,

    /// Key prefix for staged objects. Default: `idcheck-tmp/`.
    pub staging_prefix: String,

    /// Wait between two job-status queries while the job is pending. Default: 1 s.
    pub poll_interval: Duration,

    /// Give up after this many status queries. Default: `None` (poll until
    /// the job leaves the pending state).
    pub max_poll_attempts: Option<u32>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Label preceding the holder's name on the ID document. Default: `NOME`.
    pub name_label: String,

    /// Label preceding the holder's identifier on the ID document. Default: `CPF`.
    pub identifier_label: String,

    /// Optional progress callback for stage and poll events.
    pub progress: Option<ProgressCallback>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            similarity_threshold: 80.0,
            staging_bucket: None,
            staging_prefix: "idcheck-tmp/".to_string(),
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: None,
            download_timeout_secs: 120,
            name_label: "NOME".to_string(),
            identifier_label: "CPF".to_string(),
            progress: None,
        }
    }
}

impl fmt::Debug for VerificationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationConfig")
            .field("region", &self.region)
            .field("similarity_threshold", &self.similarity_threshold)
            .field("staging_bucket", &self.staging_bucket)
            .field("staging_prefix", &self.staging_prefix)
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("name_label", &self.name_label)
            .field("identifier_label", &self.identifier_label)
            .field(
                "progress",
                &self.progress.as_ref().map(|_| "<dyn VerificationProgressCallback>"),
            )
            .finish()
    }
}

impl VerificationConfig {
    /// Create a new builder for `VerificationConfig`.
    pub fn builder() -> VerificationConfigBuilder {
        VerificationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`VerificationConfig`].
#[derive(Debug)]
pub struct VerificationConfigBuilder {
    config: VerificationConfig,
}

impl VerificationConfigBuilder {
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = region.into();
        self
    }

    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold.clamp(0.0, 100.0);
        self
    }

    pub fn staging_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.staging_bucket = Some(bucket.into());
        self
    }

    pub fn staging_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.staging_prefix = prefix.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn max_poll_attempts(mut self, attempts: u32) -> Self {
        self.config.max_poll_attempts = Some(attempts);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn name_label(mut self, label: impl Into<String>) -> Self {
        self.config.name_label = label.into();
        self
    }

    pub fn identifier_label(mut self, label: impl Into<String>) -> Self {
        self.config.identifier_label = label.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<VerificationConfig, IdCheckError> {
        let c = &self.config;
        if c.region.trim().is_empty() {
            return Err(IdCheckError::InvalidConfig("region must not be empty".into()));
        }
        if !(0.0..=100.0).contains(&c.similarity_threshold) {
            return Err(IdCheckError::InvalidConfig(format!(
                "similarity threshold must be 0–100, got {}",
                c.similarity_threshold
            )));
        }
        if c.max_poll_attempts == Some(0) {
            return Err(IdCheckError::InvalidConfig(
                "max poll attempts must be ≥ 1".into(),
            ));
        }
        if c.name_label.trim().is_empty() || c.identifier_label.trim().is_empty() {
            return Err(IdCheckError::InvalidConfig(
                "field labels must not be empty".into(),
            ));
        }
        if matches!(c.staging_bucket.as_deref(), Some(b) if b.trim().is_empty()) {
            return Err(IdCheckError::InvalidConfig(
                "staging bucket must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
