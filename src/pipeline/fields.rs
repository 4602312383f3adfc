//! Field and address location over an ordered list of text lines.
//!
//! Both scans are forward and stop at the first hit: a label that appears
//! twice only ever yields the line after its first occurrence, and only the
//! first address-like line is used.

use crate::output::ExtractedFields;

/// Keywords that mark a line as the start of an address.
pub const ADDRESS_KEYWORDS: &[&str] = &["ENDEREÇO", "RUA", "AVENIDA"];

/// The line right after the first line whose uppercased content equals the
/// uppercased `label`.
///
/// `None` if the label never appears or only appears as the last line. The
/// returned value keeps its original case.
pub fn locate_field(lines: &[String], label: &str) -> Option<String> {
    let label = label.to_uppercase();
    let position = lines.iter().position(|line| line.to_uppercase() == label)?;
    lines.get(position + 1).cloned()
}

/// The first line containing an address keyword, joined by a single space
/// with the line after it when there is one.
pub fn locate_address(lines: &[String]) -> Option<String> {
    let position = lines.iter().position(|line| {
        let upper = line.to_uppercase();
        ADDRESS_KEYWORDS.iter().any(|kw| upper.contains(kw))
    })?;

    let mut address = lines[position].clone();
    if let Some(next) = lines.get(position + 1) {
        address.push(' ');
        address.push_str(next);
    }
    Some(address)
}

/// Name and identifier from an ID document's lines.
pub fn extract_document_fields(
    lines: &[String],
    name_label: &str,
    identifier_label: &str,
) -> ExtractedFields {
    ExtractedFields {
        name: locate_field(lines, name_label),
        identifier: locate_field(lines, identifier_label),
        address: None,
    }
}
