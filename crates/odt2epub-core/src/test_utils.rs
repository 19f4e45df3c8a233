//! Shared test utilities for odt2epub-core
//!
//! Builds small ODT archives and XML streams in memory.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// Namespace declarations shared by every fixture root element
pub const NAMESPACES: &str = concat!(
    r#"xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" "#,
    r#"xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" "#,
    r#"xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" "#,
    r#"xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0""#
);

/// Create an ODT archive from a styles stream and a content stream
pub fn create_odt(styles_xml: String, content_xml: String) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/vnd.oasis.opendocument.text")
        .unwrap();

    zip.start_file("META-INF/manifest.xml", deflated).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0">
  <manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.text"/>
  <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
  <manifest:file-entry manifest:full-path="styles.xml" manifest:media-type="text/xml"/>
</manifest:manifest>"#,
    )
    .unwrap();

    zip.start_file("styles.xml", deflated).unwrap();
    zip.write_all(styles_xml.as_bytes()).unwrap();

    zip.start_file("content.xml", deflated).unwrap();
    zip.write_all(content_xml.as_bytes()).unwrap();

    zip.finish().unwrap();
    buffer.into_inner()
}

/// Wrap style declarations in an `office:document-styles` root
pub fn styles_xml(styles: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-styles {}><office:styles>{}</office:styles></office:document-styles>"#,
        NAMESPACES, styles
    )
}

/// Wrap automatic styles and body markup in an `office:document-content` root
pub fn content_xml(automatic_styles: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content {}><office:automatic-styles>{}</office:automatic-styles><office:body><office:text>{}</office:text></office:body></office:document-content>"#,
        NAMESPACES, automatic_styles, body
    )
}

/// Named styles most fixtures rely on
pub fn minimal_styles_xml() -> String {
    styles_xml(concat!(
        r#"<style:style style:name="Standard" style:family="paragraph"/>"#,
        r#"<style:style style:name="Text_20_body" style:display-name="Text body" style:family="paragraph" style:parent-style-name="Standard">"#,
        r#"<style:paragraph-properties fo:text-align="justify"/>"#,
        r#"</style:style>"#,
        r#"<style:style style:name="Heading_20_1" style:display-name="Heading 1" style:family="paragraph" style:parent-style-name="Standard" style:default-outline-level="1">"#,
        r#"<style:text-properties fo:font-weight="bold"/>"#,
        r#"</style:style>"#,
        r#"<style:style style:name="Heading_20_2" style:display-name="Heading 2" style:family="paragraph" style:parent-style-name="Standard" style:default-outline-level="2"/>"#,
    ))
}

/// A one-paragraph document body
pub fn minimal_content_xml() -> String {
    content_xml(
        "",
        r#"<text:p text:style-name="Text_20_body">Hello world.</text:p>"#,
    )
}
