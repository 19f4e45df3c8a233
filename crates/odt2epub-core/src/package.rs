//! Output assembly
//!
//! [`EpubWriter`] builds an EPUB 2 package in memory from paginated
//! output: the `mimetype` entry first and uncompressed, the container
//! descriptor, the OPF manifest/spine, the NCX navigation map, the
//! stylesheet and one XHTML file per page, plus an optional cover.
//! [`write_flat`] writes the single-page HTML and its stylesheet.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::sibling;
use crate::error::{ConvertError, Result};
use crate::html::{escape_html, FlatOutput, PaginatedOutput};
use crate::toc::{TocId, TocTree};

/// Media type stored in the `mimetype` entry
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// Archive path of the stylesheet
pub const STYLESHEET_PATH: &str = "OEBPS/Styles/stylesheet.css";

/// Archive path of the cover page
pub const COVER_PAGE_PATH: &str = "OEBPS/Text/cover.xhtml";

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
   </rootfiles>
</container>
"#;

/// Package metadata
#[derive(Debug, Clone)]
pub struct BookMetadata {
    /// Book title
    pub title: String,
    /// Language code
    pub language: String,
    /// Author, if known
    pub author: Option<String>,
    /// Package identifier
    pub identifier: Uuid,
}

impl BookMetadata {
    /// Metadata with a fresh random identifier
    pub fn new(title: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            language: language.into(),
            author: None,
            identifier: Uuid::new_v4(),
        }
    }

    /// Set the author
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }
}

/// A cover image with its pixel size
#[derive(Debug, Clone)]
pub struct Cover {
    /// Image bytes, copied verbatim into the package
    pub bytes: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Image format detected from the content
    pub format: ImageFormat,
}

impl Cover {
    /// Read a cover image file
    pub fn load(path: &Path) -> Result<Self> {
        let cover = Self::from_bytes(std::fs::read(path)?)?;
        tracing::debug!(
            "Cover {} is a {}x{} {:?} image",
            path.display(),
            cover.width,
            cover.height,
            cover.format
        );
        Ok(cover)
    }

    /// Use in-memory image bytes as the cover
    ///
    /// Only JPEG, PNG and GIF are accepted: the EPUB 2 core media types.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(&bytes)).with_guessed_format()?;
        let format = reader.format();
        let (width, height) = reader.into_dimensions()?;
        let format = match format {
            Some(f @ (ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif)) => f,
            Some(other) => return Err(ConvertError::UnsupportedCover(format!("{:?}", other))),
            None => return Err(ConvertError::UnsupportedCover("unknown format".to_string())),
        };
        Ok(Self {
            bytes,
            width,
            height,
            format,
        })
    }

    /// File name of the image inside the package (`cover.jpg`, `cover.png`, ...)
    pub fn file_name(&self) -> String {
        let extension = match self.format {
            ImageFormat::Jpeg => "jpg",
            other => other.extensions_str().first().copied().unwrap_or("img"),
        };
        format!("cover.{}", extension)
    }

    /// Archive path of the image
    pub fn archive_path(&self) -> String {
        format!("OEBPS/Images/{}", self.file_name())
    }

    /// Manifest media type of the image
    pub fn media_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Find the cover image for an input file
///
/// An explicit path is returned as is. Otherwise `<stem>.jpg` and then
/// `cover.jpg` are looked up in the input's directory.
pub fn find_cover(input: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let stem = input.file_stem()?.to_string_lossy();
    [format!("{}.jpg", stem), "cover.jpg".to_string()]
        .iter()
        .map(|name| sibling(input, name))
        .find(|path| path.is_file())
}

/// EPUB package builder
#[derive(Debug, Clone)]
pub struct EpubWriter {
    metadata: BookMetadata,
    cover: Option<Cover>,
}

impl EpubWriter {
    /// Create a writer
    pub fn new(metadata: BookMetadata) -> Self {
        Self {
            metadata,
            cover: None,
        }
    }

    /// Embed a cover
    pub fn with_cover(mut self, cover: Option<Cover>) -> Self {
        self.cover = cover;
        self
    }

    /// Package metadata
    pub fn metadata(&self) -> &BookMetadata {
        &self.metadata
    }

    /// Generate the package as bytes
    pub fn generate(&self, output: &PaginatedOutput) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // The mimetype entry must come first, uncompressed
        zip.start_file("mimetype", stored)?;
        zip.write_all(EPUB_MIMETYPE.as_bytes())?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML.as_bytes())?;

        let chapters: Vec<String> = output.pages.iter().map(|p| p.file_name()).collect();

        zip.start_file("OEBPS/content.opf", deflated)?;
        zip.write_all(self.generate_opf(&chapters).as_bytes())?;

        zip.start_file("OEBPS/toc.ncx", deflated)?;
        zip.write_all(self.generate_ncx(&output.toc).as_bytes())?;

        zip.start_file(STYLESHEET_PATH, deflated)?;
        zip.write_all(output.css.as_bytes())?;

        if let Some(cover) = &self.cover {
            zip.start_file(cover.archive_path(), stored)?;
            zip.write_all(&cover.bytes)?;
            zip.start_file(COVER_PAGE_PATH, deflated)?;
            zip.write_all(cover_page(cover).as_bytes())?;
        }

        for page in &output.pages {
            zip.start_file(format!("OEBPS/Text/{}", page.file_name()), deflated)?;
            zip.write_all(page.html.as_bytes())?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// Generate content.opf
    fn generate_opf(&self, chapters: &[String]) -> String {
        let meta = &self.metadata;
        let mut opf = String::new();

        opf.push_str(
            r#"<?xml version="1.0" encoding="utf-8"?>
<package version="2.0" unique-identifier="BookId" xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:opf="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
        );
        opf.push_str(&format!(
            "    <dc:identifier opf:scheme=\"UUID\" id=\"BookId\">urn:uuid:{}</dc:identifier>\n",
            meta.identifier
        ));
        opf.push_str(&format!("    <dc:title>{}</dc:title>\n", escape_html(&meta.title)));
        opf.push_str(&format!(
            "    <dc:language>{}</dc:language>\n",
            escape_html(&meta.language)
        ));
        if let Some(author) = &meta.author {
            opf.push_str(&format!(
                "    <dc:creator opf:role=\"aut\">{}</dc:creator>\n",
                escape_html(author)
            ));
        }
        if let Some(cover) = &self.cover {
            opf.push_str(&format!(
                "    <meta name=\"cover\" content=\"{}\" />\n",
                cover.file_name()
            ));
        }
        opf.push_str("  </metadata>\n  <manifest>\n");

        opf.push_str(
            "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
        );
        opf.push_str(
            "    <item id=\"stylesheet.css\" href=\"Styles/stylesheet.css\" media-type=\"text/css\"/>\n",
        );
        if let Some(cover) = &self.cover {
            opf.push_str(&format!(
                "    <item id=\"{0}\" href=\"Images/{0}\" media-type=\"{1}\"/>\n",
                cover.file_name(),
                cover.media_type()
            ));
            opf.push_str(
                "    <item id=\"cover.xhtml\" href=\"Text/cover.xhtml\" media-type=\"application/xhtml+xml\"/>\n",
            );
        }
        for chapter in chapters {
            opf.push_str(&format!(
                "    <item id=\"{}\" href=\"Text/{}\" media-type=\"application/xhtml+xml\"/>\n",
                chapter, chapter
            ));
        }
        opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");

        if self.cover.is_some() {
            opf.push_str("    <itemref idref=\"cover.xhtml\"/>\n");
        }
        for chapter in chapters {
            opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", chapter));
        }
        opf.push_str("  </spine>\n");

        if self.cover.is_some() {
            opf.push_str(
                "  <guide>\n    <reference type=\"cover\" title=\"Cover\" href=\"Text/cover.xhtml\"/>\n  </guide>\n",
            );
        }
        opf.push_str("</package>\n");
        opf
    }

    /// Generate toc.ncx
    fn generate_ncx(&self, toc: &TocTree) -> String {
        let meta = &self.metadata;
        let mut ncx = String::new();

        ncx.push_str(
            r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN"
   "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
"#,
        );
        ncx.push_str(&format!(
            "    <meta name=\"dtb:uid\" content=\"urn:uuid:{}\" />\n",
            meta.identifier
        ));
        ncx.push_str(&format!(
            "    <meta name=\"dtb:depth\" content=\"{}\" />\n",
            toc.depth()
        ));
        ncx.push_str("    <meta name=\"dtb:totalPageCount\" content=\"0\" />\n");
        ncx.push_str("    <meta name=\"dtb:maxPageNumber\" content=\"0\" />\n");
        ncx.push_str("  </head>\n");
        ncx.push_str(&format!(
            "  <docTitle>\n    <text>{}</text>\n  </docTitle>\n  <navMap>\n",
            escape_html(&meta.title)
        ));

        let mut play_order = 1;
        write_nav_points(&mut ncx, toc, toc.get(toc.root()).children(), &mut play_order, 2);

        ncx.push_str("  </navMap>\n</ncx>\n");
        ncx
    }
}

/// Write navPoint elements in pre-order, numbering them as they are written
fn write_nav_points(
    ncx: &mut String,
    toc: &TocTree,
    entries: &[TocId],
    play_order: &mut usize,
    indent: usize,
) {
    let indent_str = "  ".repeat(indent);

    for &id in entries {
        let entry = toc.get(id);
        ncx.push_str(&format!(
            "{}<navPoint id=\"navPoint-{}\" playOrder=\"{}\">\n",
            indent_str, play_order, play_order
        ));
        ncx.push_str(&format!(
            "{}  <navLabel><text>{}</text></navLabel>\n",
            indent_str,
            escape_html(&entry.label)
        ));
        ncx.push_str(&format!(
            "{}  <content src=\"Text/{}.xhtml#{}\" />\n",
            indent_str, entry.page, entry.anchor
        ));

        *play_order += 1;

        if !entry.children().is_empty() {
            write_nav_points(ncx, toc, entry.children(), play_order, indent + 1);
        }

        ncx.push_str(&format!("{}</navPoint>\n", indent_str));
    }
}

/// Cover page scaling the image by its exact dimensions
fn cover_page(cover: &Cover) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN"
  "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">

<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <title>Cover</title>
</head>
<body>
  <div style="text-align: center; padding: 0pt; margin: 0pt;">
    <svg xmlns="http://www.w3.org/2000/svg" height="100%" preserveAspectRatio="xMidYMid meet" version="1.1" viewBox="0 0 {w} {h}" width="100%" xmlns:xlink="http://www.w3.org/1999/xlink">
      <image width="{w}" height="{h}" xlink:href="../Images/{name}"/>
    </svg>
  </div>
</body>
</html>
"#,
        w = cover.width,
        h = cover.height,
        name = cover.file_name()
    )
}

/// Write flat output: the HTML page and its sibling stylesheet
///
/// The stylesheet goes first; if the page cannot be written the
/// stylesheet is removed again so no half of the pair is left behind.
pub fn write_flat(html_path: &Path, css_path: &Path, output: &FlatOutput) -> Result<()> {
    std::fs::write(css_path, &output.css)?;
    if let Err(e) = std::fs::write(html_path, &output.html) {
        if let Err(cleanup) = std::fs::remove_file(css_path) {
            tracing::warn!("Could not remove {}: {}", css_path.display(), cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}
