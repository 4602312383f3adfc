//! Result types of a verification and their text rendering.
//!
//! Everything here is request-scoped: a [`VerificationReport`] is built by
//! [`crate::verify`], rendered or serialised, and dropped.

use crate::error::ResidenceError;
use crate::services::FaceMatch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields located in the recognised text of the documents.
///
/// Each field is `None` until located. `name` and `identifier` come from the
/// ID document, `address` from the proof of residence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub address: Option<String>,
}

/// Whether the selfie and the document photo show the same person.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FaceVerdict {
    /// At least one match at or above the threshold; `similarity` is the
    /// first match's score in percent.
    Match { similarity: f32 },
    NoMatch,
}

/// Outcome of the face comparison stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceComparison {
    pub verdict: FaceVerdict,
    /// Threshold the service was asked to apply, in percent.
    pub threshold: f32,
    /// Every match the service returned, in service order.
    pub matches: Vec<FaceMatch>,
}

impl FaceComparison {
    /// Build the verdict from the service's match list: the first match
    /// decides, an empty list means no match.
    pub fn from_matches(matches: Vec<FaceMatch>, threshold: f32) -> Self {
        let verdict = match matches.first() {
            Some(m) => FaceVerdict::Match {
                similarity: m.similarity,
            },
            None => FaceVerdict::NoMatch,
        };
        Self {
            verdict,
            threshold,
            matches,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self.verdict, FaceVerdict::Match { .. })
    }
}

/// Recognised text of the ID document and the fields found in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub lines: Vec<String>,
    pub name: Option<String>,
    pub identifier: Option<String>,
}

/// Address and name check from a processed proof of residence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidenceReport {
    pub lines: Vec<String>,
    pub address: Option<String>,
    /// Whether the ID document's name appears verbatim in this document.
    /// `None` when no name was found on the ID document.
    pub name_found: Option<bool>,
}

/// Outcome of the proof-of-residence stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResidenceOutcome {
    Processed(ResidenceReport),
    /// The text job reached a terminal non-success status.
    JobFailed { status: String },
    /// Staging, submission or polling failed.
    Error(ResidenceError),
}

/// Wall-clock timings of one verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationStats {
    pub face_ms: u64,
    pub document_ms: u64,
    pub residence_ms: Option<u64>,
    pub total_duration_ms: u64,
}

/// Everything a verification produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub face: FaceComparison,
    pub document: DocumentReport,
    /// `None` when no proof of residence was supplied.
    pub residence: Option<ResidenceOutcome>,
    pub stats: VerificationStats,
}

impl VerificationReport {
    /// All located fields, merged across both documents.
    pub fn fields(&self) -> ExtractedFields {
        let address = match &self.residence {
            Some(ResidenceOutcome::Processed(r)) => r.address.clone(),
            _ => None,
        };
        ExtractedFields {
            name: self.document.name.clone(),
            identifier: self.document.identifier.clone(),
            address,
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.face.verdict {
            FaceVerdict::Match { similarity } => {
                writeln!(f, "Face check:   same person (similarity {:.2}%)", similarity)?
            }
            FaceVerdict::NoMatch => writeln!(f, "Face check:   faces do not match")?,
        }

        writeln!(f)?;
        writeln!(f, "Document text:")?;
        if self.document.lines.is_empty() {
            writeln!(f, "  (no text recognised)")?;
        }
        for line in &self.document.lines {
            writeln!(f, "  {}", line)?;
        }

        writeln!(f)?;
        writeln!(f, "Name:         {}", or_not_found(&self.document.name))?;
        writeln!(f, "Identifier:   {}", or_not_found(&self.document.identifier))?;

        if let Some(residence) = &self.residence {
            writeln!(f)?;
            writeln!(f, "Proof of residence:")?;
            match residence {
                ResidenceOutcome::Processed(r) => {
                    writeln!(f, "  Address:    {}", or_not_found(&r.address))?;
                    match r.name_found {
                        Some(true) => writeln!(f, "  Name check: name found in proof of residence")?,
                        Some(false) => {
                            writeln!(f, "  Name check: name NOT found in proof of residence")?
                        }
                        None => writeln!(f, "  Name check: skipped (no name on ID document)")?,
                    }
                }
                ResidenceOutcome::JobFailed { status } => {
                    writeln!(f, "  Text extraction failed: {}", status)?
                }
                ResidenceOutcome::Error(e) => writeln!(f, "  {}", e)?,
            }
        }
        Ok(())
    }
}

fn or_not_found(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("not found")
}
