//! Plain-text input
//!
//! A text file becomes a document with a single paragraph style. A blank
//! line closes the current paragraph (so consecutive blank lines leave
//! empty paragraphs behind); every other line is trimmed and appended to
//! the current paragraph followed by one space.

use std::path::Path;

use crate::document::{push_text, Block, Document, Paragraph};
use crate::error::Result;
use crate::styles::{StyleRegistry, DISPLAY_NAME};
use crate::xml::Attributes;

/// Build a document from text
///
/// `body_style` names the single paragraph style; it should match the
/// renderer's body style so paragraphs come out as plain `<p>`.
pub fn parse_text(text: &str, body_style: &str) -> Result<Document> {
    let mut registry = StyleRegistry::new();
    let mut properties = Attributes::new();
    properties.insert(DISPLAY_NAME.to_string(), body_style.to_string());
    let style = registry.declare(body_style, None, properties, false)?;

    let mut doc = Document::new(registry);
    let mut current = Paragraph {
        style,
        runs: Vec::new(),
    };

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            let finished = std::mem::replace(
                &mut current,
                Paragraph {
                    style,
                    runs: Vec::new(),
                },
            );
            doc.blocks.push(Block::Paragraph(finished));
        } else {
            push_text(&mut current.runs, &format!("{} ", line), None);
        }
    }
    doc.blocks.push(Block::Paragraph(current));

    tracing::debug!("Parsed {} paragraphs from text", doc.blocks.len());
    Ok(doc)
}

/// Read a UTF-8 text file and build a document from it
pub fn read_text_file(path: &Path, body_style: &str) -> Result<Document> {
    let text = std::fs::read_to_string(path)?;
    parse_text(&text, body_style)
}
