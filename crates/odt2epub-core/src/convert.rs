//! End-to-end conversion of an input file
//!
//! [`Converter`] reads an `.odt` or `.txt` file, renders it and writes the
//! result beside the input. Everything is produced in memory first; files
//! are only written once the whole conversion has succeeded.

use std::path::{Path, PathBuf};

use crate::archive::OdfArchive;
use crate::config::Config;
use crate::content::parse_document;
use crate::diagnostics::Diagnostic;
use crate::document::Document;
use crate::error::{ConvertError, Result};
use crate::html::{self, RenderOptions, StylesheetLink, PACKAGE_STYLESHEET_HREF};
use crate::package::{self, BookMetadata, Cover, EpubWriter};
use crate::text::read_text_file;

/// Kind of input document, from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// OpenDocument text (`.odt`)
    Odt,
    /// Plain UTF-8 text (`.txt`)
    Text,
}

impl InputKind {
    /// Detect the input kind from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "odt" => Ok(InputKind::Odt),
            "txt" => Ok(InputKind::Text),
            _ => Err(ConvertError::UnsupportedInput(path.display().to_string())),
        }
    }
}

/// What to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    /// EPUB package
    #[default]
    Epub,
    /// Single HTML page plus stylesheet
    Html,
}

/// Result of a finished conversion
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Files written, main output first
    pub outputs: Vec<PathBuf>,
    /// Number of pages rendered
    pub pages: usize,
    /// Recoverable findings from parsing and rendering
    pub diagnostics: Vec<Diagnostic>,
}

/// Converts input files according to a configuration
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: Config,
}

impl Converter {
    /// Create a converter
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse an input file into a document
    pub fn load_document(&self, input: &Path) -> Result<Document> {
        match InputKind::from_path(input)? {
            InputKind::Odt => {
                let archive = OdfArchive::open(input)?;
                if !archive.is_text_document() {
                    tracing::warn!(
                        "{} does not declare itself an OpenDocument text ({:?})",
                        input.display(),
                        archive.mimetype()
                    );
                }
                parse_document(archive.styles_xml()?, archive.content_xml()?)
            }
            InputKind::Text => read_text_file(input, &self.config.html.body_style),
        }
    }

    /// Convert an input file, writing the output beside it
    pub fn convert(&self, input: &Path, kind: OutputKind) -> Result<ConversionReport> {
        match kind {
            OutputKind::Epub => self.write_epub(input, &input.with_extension("epub")),
            OutputKind::Html => self.write_html(
                input,
                &input.with_extension("html"),
                &input.with_extension("css"),
            ),
        }
    }

    /// Build the EPUB package for an input file
    pub fn epub_bytes(&self, input: &Path) -> Result<(Vec<u8>, usize, Vec<Diagnostic>)> {
        let doc = self.load_document(input)?;
        let options = self.render_options(input, StylesheetLink::Href(PACKAGE_STYLESHEET_HREF.to_string()))?;
        let rendered = html::render_paginated(&doc, &options)?;

        let metadata = BookMetadata::new(options.title.clone(), self.config.book.language.clone())
            .with_author(self.config.book.author.clone());
        let bytes = EpubWriter::new(metadata)
            .with_cover(self.cover(input)?)
            .generate(&rendered)?;

        let mut diagnostics = doc.diagnostics;
        diagnostics.extend(rendered.diagnostics);
        Ok((bytes, rendered.pages.len(), diagnostics))
    }

    /// Convert to an EPUB package at `output`
    pub fn write_epub(&self, input: &Path, output: &Path) -> Result<ConversionReport> {
        let (bytes, pages, diagnostics) = self.epub_bytes(input)?;
        std::fs::write(output, bytes)?;
        tracing::info!("Wrote {} ({} pages)", output.display(), pages);
        Ok(ConversionReport {
            outputs: vec![output.to_path_buf()],
            pages,
            diagnostics,
        })
    }

    /// Convert to a flat HTML page at `html_path` with its stylesheet at `css_path`
    pub fn write_html(&self, input: &Path, html_path: &Path, css_path: &Path) -> Result<ConversionReport> {
        let doc = self.load_document(input)?;
        let link = if self.config.html.inline_css {
            StylesheetLink::Inline
        } else {
            let name = css_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            StylesheetLink::Href(format!("./{}", name))
        };
        let options = self.render_options(input, link)?;
        let rendered = html::render_flat(&doc, &options)?;

        package::write_flat(html_path, css_path, &rendered)?;
        tracing::info!("Wrote {}", html_path.display());

        let mut diagnostics = doc.diagnostics;
        diagnostics.extend(rendered.diagnostics);
        Ok(ConversionReport {
            outputs: vec![html_path.to_path_buf(), css_path.to_path_buf()],
            pages: 1,
            diagnostics,
        })
    }

    fn render_options(&self, input: &Path, stylesheet: StylesheetLink) -> Result<RenderOptions> {
        let baseline_css = match &self.config.stylesheet.baseline {
            Some(path) => Some(std::fs::read_to_string(resolve(input, path))?),
            None => None,
        };
        Ok(RenderOptions {
            title: self.title(input),
            keep_css_class: self.config.html.keep_css_class,
            insert_split_marker: self.config.html.insert_split_marker,
            body_style: self.config.html.body_style.clone(),
            stylesheet,
            baseline_css,
        })
    }

    fn title(&self, input: &Path) -> String {
        self.config.book.title.clone().unwrap_or_else(|| {
            input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    fn cover(&self, input: &Path) -> Result<Option<Cover>> {
        if !self.config.cover.enabled {
            return Ok(None);
        }
        let explicit = self.config.cover.path.as_ref().map(|p| resolve(input, p));
        match package::find_cover(input, explicit.as_deref()) {
            Some(path) => Ok(Some(Cover::load(&path)?)),
            None => Ok(None),
        }
    }
}

/// Resolve a configured path relative to the input's directory
fn resolve(input: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match input.parent() {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}
