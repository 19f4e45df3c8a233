//! Conversion configuration
//!
//! Read from `odt2epub.toml` beside the input (or an explicit path).
//! Every field has a default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name looked up beside the input document
pub const CONFIG_FILE_NAME: &str = "odt2epub.toml";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Book metadata
    pub book: BookSettings,
    /// HTML rendering
    pub html: HtmlSettings,
    /// Stylesheet generation
    pub stylesheet: StylesheetSettings,
    /// Cover image handling
    pub cover: CoverSettings,
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the configuration that applies to an input file
    ///
    /// An explicit path must exist. Without one, `odt2epub.toml` in the
    /// input's directory is used when present, defaults otherwise.
    pub fn discover(input: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = sibling(input, CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

/// Book metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BookSettings {
    /// Title; the input file stem when absent
    pub title: Option<String>,
    /// Language code written to the package metadata
    pub language: String,
    /// Author, written as `dc:creator`
    pub author: Option<String>,
}

impl Default for BookSettings {
    fn default() -> Self {
        Self {
            title: None,
            language: "en".to_string(),
            author: None,
        }
    }
}

/// HTML rendering settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HtmlSettings {
    /// Give non-body paragraphs a class derived from their style
    pub keep_css_class: bool,
    /// Embed the stylesheet in flat output instead of linking it
    pub inline_css: bool,
    /// Emit split markers before level-1 headings in flat output
    pub insert_split_marker: bool,
    /// Display name of the style mapped to plain `<p>`
    pub body_style: String,
}

impl Default for HtmlSettings {
    fn default() -> Self {
        Self {
            keep_css_class: true,
            inline_css: false,
            insert_split_marker: false,
            body_style: "Text body".to_string(),
        }
    }
}

/// Stylesheet settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StylesheetSettings {
    /// CSS file replacing the built-in baseline selectors
    pub baseline: Option<PathBuf>,
}

/// Cover settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoverSettings {
    /// Look for and embed a cover image
    pub enabled: bool,
    /// Explicit cover image, instead of the files beside the input
    pub path: Option<PathBuf>,
}

impl Default for CoverSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// A path next to `input`
pub(crate) fn sibling(input: &Path, file_name: &str) -> PathBuf {
    match input.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}
