//! # odt2epub-core
//!
//! OpenDocument text to EPUB / HTML conversion.
//!
//! This crate provides functionality to:
//! - Read ODT archives and resolve their cascading styles
//! - Build a content tree (headings, paragraphs, lists, notes)
//! - Split it into chapters with a table of contents
//! - Generate a deterministic stylesheet
//! - Assemble an EPUB package or a flat HTML page
//!
//! ## Example: Converting a Document
//!
//! ```no_run
//! use odt2epub_core::{html, parse_document, BookMetadata, EpubWriter, OdfArchive, RenderOptions};
//!
//! let archive = OdfArchive::open("novel.odt")?;
//! let document = parse_document(archive.styles_xml()?, archive.content_xml()?)?;
//! let rendered = html::render_paginated(&document, &RenderOptions::default())?;
//!
//! let epub = EpubWriter::new(BookMetadata::new("Novel", "en")).generate(&rendered)?;
//! std::fs::write("novel.epub", epub)?;
//! # Ok::<(), odt2epub_core::ConvertError>(())
//! ```

pub mod archive;
pub mod config;
pub mod content;
pub mod convert;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod html;
pub mod package;
pub mod styles;
pub mod stylesheet;
pub mod text;
pub mod toc;
mod xml;

#[cfg(test)]
pub(crate) mod test_utils;

pub use archive::OdfArchive;
pub use config::Config;
pub use content::{parse_content, parse_document, ContentBuilder};
pub use convert::{ConversionReport, Converter, InputKind, OutputKind};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use document::{Block, Document, Header, List, ListItem, ListKind, Note, NoteId, Paragraph, Run};
pub use error::{ConvertError, Result};
pub use html::{render_flat, render_paginated, FlatOutput, Page, PaginatedOutput, RenderOptions, StylesheetLink};
pub use package::{BookMetadata, Cover, EpubWriter};
pub use styles::{Style, StyleId, StyleRegistry};
pub use stylesheet::{StylesheetGenerator, UsedStyles};
pub use text::parse_text;
pub use toc::{TocElement, TocId, TocTree};
pub use xml::Attributes;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
