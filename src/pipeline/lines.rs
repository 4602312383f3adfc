//! Line extraction: reduce an OCR block list to its ordered text lines.

use crate::services::{Block, BlockType};

/// Text of every `Line` block, in source order.
///
/// Blocks of any other type, and line blocks without text, are skipped.
pub fn extract_lines(blocks: &[Block]) -> Vec<String> {
    blocks
        .iter()
        .filter(|b| b.block_type == BlockType::Line)
        .filter_map(|b| b.text.clone())
        .collect()
}

/// Space-joined concatenation of a document's lines.
pub fn full_text(lines: &[String]) -> String {
    lines.join(" ")
}
