//! Archive handling for ODT files
//!
//! ODT files are ZIP archives containing XML streams and resources. The
//! converter only needs two of them: `styles.xml` (named styles) and
//! `content.xml` (automatic styles and the document body).

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use zip::read::ZipArchive;

use crate::error::{ConvertError, Result};

/// Path of the named-styles stream inside the archive
pub const STYLES_XML: &str = "styles.xml";

/// Path of the content stream inside the archive
pub const CONTENT_XML: &str = "content.xml";

/// Media type stored in the `mimetype` entry of a text document
pub const ODT_MIMETYPE: &str = "application/vnd.oasis.opendocument.text";

/// Represents an unpacked OpenDocument archive
#[derive(Debug)]
pub struct OdfArchive {
    /// All files in the archive, keyed by path
    files: HashMap<String, Vec<u8>>,
}

impl OdfArchive {
    /// Open and unpack an ODT file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut files = HashMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            files.insert(name, contents);
        }

        Ok(Self { files })
    }

    /// Get a file's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }

    /// Get a required entry, failing with [`ConvertError::MissingFile`]
    pub fn entry(&self, path: &str) -> Result<&[u8]> {
        self.get(path)
            .ok_or_else(|| ConvertError::MissingFile(path.to_string()))
    }

    /// Get the named styles stream (styles.xml)
    pub fn styles_xml(&self) -> Result<&[u8]> {
        self.entry(STYLES_XML)
    }

    /// Get the content stream (content.xml)
    pub fn content_xml(&self) -> Result<&[u8]> {
        self.entry(CONTENT_XML)
    }

    /// The declared media type, if the archive carries a `mimetype` entry
    pub fn mimetype(&self) -> Option<&str> {
        self.get("mimetype")
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .map(str::trim)
    }

    /// Whether the archive declares itself an OpenDocument text
    pub fn is_text_document(&self) -> bool {
        self.mimetype() == Some(ODT_MIMETYPE)
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// List all files in the archive
    pub fn file_list(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|s| s.as_str())
    }
}
