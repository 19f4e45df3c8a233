//! Error types for conversion operations

use thiserror::Error;

/// Errors that abort a conversion
///
/// Content-level anomalies (text with no destination, unmodeled markers)
/// are not errors; they are recorded as [`crate::diagnostics::Diagnostic`]s.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Error reading the cover image
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Error parsing a configuration file
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Required file not found in archive
    #[error("Required file not found: {0}")]
    MissingFile(String),

    /// A paragraph, span or list references a style nobody declared
    #[error("Style not found: {0}")]
    UndeclaredStyle(String),

    /// The same style name was declared twice in one pass
    #[error("Unexpected duplicated style name: {0}")]
    DuplicateStyle(String),

    /// A style declaration opened inside another one
    #[error("Unexpected nested style declaration: {0}")]
    NestedStyle(String),

    /// A required attribute is absent
    #[error("Element <{element}> is missing required attribute {attribute}")]
    MissingAttribute {
        /// Qualified element name
        element: String,
        /// Qualified attribute name
        attribute: String,
    },

    /// A list kind outside the supported set
    #[error("Unknown content kind: {0}")]
    UnknownContentKind(String),

    /// Flat rendering produced something other than exactly one page
    #[error("Flat rendering must produce exactly one page, got {0}")]
    PageCount(usize),

    /// Input extension is not one the converter understands
    #[error("Unsupported input file: {0}")]
    UnsupportedInput(String),

    /// Cover image in a format EPUB readers are not required to support
    #[error("Unsupported cover image format: {0}")]
    UnsupportedCover(String),
}

impl ConvertError {
    /// Whether this error came from a broken style cascade or content structure
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ConvertError::UndeclaredStyle(_)
                | ConvertError::DuplicateStyle(_)
                | ConvertError::NestedStyle(_)
                | ConvertError::MissingAttribute { .. }
        )
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;
