//! Input intake: read a user-supplied path or URL into memory.
//!
//! Each of the three upload slots has its own extension allowlist. The
//! extension is the only check: no content sniffing and no size limit. URL
//! inputs are downloaded into memory; the extension is taken from the last
//! segment of the URL path.

use crate::error::IdCheckError;
use std::path::PathBuf;
use tracing::{debug, info};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const RESIDENCE_EXTENSIONS: &[&str] = &["pdf"];

/// The upload slot an input fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSlot {
    Selfie,
    Document,
    ProofOfResidence,
}

impl InputSlot {
    pub fn name(self) -> &'static str {
        match self {
            InputSlot::Selfie => "selfie",
            InputSlot::Document => "ID document",
            InputSlot::ProofOfResidence => "proof of residence",
        }
    }

    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            InputSlot::Selfie | InputSlot::Document => IMAGE_EXTENSIONS,
            InputSlot::ProofOfResidence => RESIDENCE_EXTENSIONS,
        }
    }
}

/// An input read fully into memory.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// The path or URL the bytes came from.
    pub source: String,
    /// Lowercased extension that passed the allowlist.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Validate the extension of `input` against the slot's allowlist.
///
/// Returns the lowercased extension on success.
pub fn check_extension(input: &str, slot: InputSlot) -> Result<String, IdCheckError> {
    let extension = extension_of(input).map(|e| e.to_ascii_lowercase());
    match extension {
        Some(ext) if slot.allowed_extensions().contains(&ext.as_str()) => Ok(ext),
        _ => Err(IdCheckError::UnsupportedExtension {
            input: input.to_string(),
            slot: slot.name(),
            allowed: slot.allowed_extensions().join(", "),
        }),
    }
}

fn extension_of(input: &str) -> Option<String> {
    let file_name = if is_url(input) {
        let parsed = reqwest::Url::parse(input).ok()?;
        let mut segments = parsed.path_segments()?;
        segments.next_back()?.to_string()
    } else {
        PathBuf::from(input).file_name()?.to_str()?.to_string()
    };
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_string())
}

/// Read the input for `slot` from a local path or an HTTP/HTTPS URL.
pub async fn read_input(
    input: &str,
    slot: InputSlot,
    timeout_secs: u64,
) -> Result<InputFile, IdCheckError> {
    if input.trim().is_empty() {
        return Err(IdCheckError::InvalidInput {
            input: input.to_string(),
        });
    }

    let extension = check_extension(input, slot)?;
    let bytes = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };

    debug!("Read {} ({} bytes) for {}", input, bytes.len(), slot.name());
    Ok(InputFile {
        source: input.to_string(),
        extension,
        bytes,
    })
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, IdCheckError> {
    let path = PathBuf::from(path_str);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(IdCheckError::FileNotFound { path })
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(IdCheckError::PermissionDenied { path })
        }
        Err(source) => Err(IdCheckError::ReadFailed { path, source }),
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, IdCheckError> {
    info!("Downloading input from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| IdCheckError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            IdCheckError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            IdCheckError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(IdCheckError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| IdCheckError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    Ok(bytes.to_vec())
}
