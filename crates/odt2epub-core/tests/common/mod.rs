//! Shared fixtures for odt2epub-core integration tests

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Named styles of a small novel template
pub const NOVEL_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0">
  <office:styles>
    <style:style style:name="Standard" style:family="paragraph" style:class="text"/>
    <style:style style:name="Heading" style:family="paragraph" style:parent-style-name="Standard" style:next-style-name="Text_20_body">
      <style:text-properties fo:font-weight="bold"/>
    </style:style>
    <style:style style:name="Text_20_body" style:display-name="Text body" style:family="paragraph" style:parent-style-name="Standard">
      <style:paragraph-properties fo:text-align="justify"/>
    </style:style>
    <style:style style:name="Heading_20_1" style:display-name="Heading 1" style:family="paragraph" style:parent-style-name="Heading" style:default-outline-level="1">
      <style:paragraph-properties fo:text-align="center" fo:break-before="page"/>
    </style:style>
    <style:style style:name="Heading_20_2" style:display-name="Heading 2" style:family="paragraph" style:parent-style-name="Heading" style:default-outline-level="2"/>
    <style:style style:name="Quotations" style:display-name="Block Quote" style:family="paragraph" style:parent-style-name="Standard">
      <style:paragraph-properties fo:text-align="end"/>
      <style:text-properties fo:font-style="italic"/>
    </style:style>
    <style:style style:name="Footnote" style:family="paragraph" style:parent-style-name="Standard"/>
    <style:style style:name="Emphasis" style:family="text">
      <style:text-properties fo:font-style="italic"/>
    </style:style>
    <text:list-style style:name="Numbering_20_123" style:display-name="Numbering 123">
      <text:list-level-style-number text:level="1" style:num-format="1"/>
      <text:list-level-style-number text:level="2" style:num-format="a"/>
    </text:list-style>
  </office:styles>
</office:document-styles>
"#;

/// Body of the novel: two chapters, a footnote, a list and spans
pub const NOVEL_CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0">
  <office:automatic-styles>
    <style:style style:name="P1" style:family="paragraph" style:parent-style-name="Heading_20_1">
      <style:paragraph-properties fo:break-before="auto"/>
    </style:style>
    <style:style style:name="T1" style:family="text" style:parent-style-name="Emphasis"/>
    <style:style style:name="T2" style:family="text">
      <style:text-properties fo:font-weight="bold"/>
    </style:style>
    <text:list-style style:name="L1">
      <text:list-level-style-bullet text:level="1" text:bullet-char="•"/>
    </text:list-style>
  </office:automatic-styles>
  <office:body>
    <office:text>
      <text:h text:style-name="P1" text:outline-level="1">Intro</text:h>
      <text:p text:style-name="Text_20_body">Hello <text:span text:style-name="T1">world</text:span>.<text:note text:id="ftn1" text:note-class="footnote"><text:note-citation>1</text:note-citation><text:note-body><text:p text:style-name="Footnote">A <text:span text:style-name="T2">first</text:span> note.</text:p></text:note-body></text:note></text:p>
      <text:p text:style-name="Text_20_body"/>
      <text:list text:style-name="L1">
        <text:list-item>
          <text:p text:style-name="Text_20_body">Bread</text:p>
        </text:list-item>
        <text:list-item>
          <text:p text:style-name="Text_20_body">Milk</text:p>
        </text:list-item>
      </text:list>
      <text:h text:style-name="Heading_20_2" text:outline-level="2">Details</text:h>
      <text:p text:style-name="Quotations">Quoted<text:line-break/>twice.</text:p>
      <text:h text:style-name="Heading_20_1" text:outline-level="1">Chapter Two</text:h>
      <text:p text:style-name="Text_20_body">Fin<text:s/>&amp; done.</text:p>
      <text:list text:style-name="Numbering_20_123" text:continue-numbering="true">
        <text:list-item>
          <text:p text:style-name="Text_20_body">Step</text:p>
        </text:list-item>
      </text:list>
    </office:text>
  </office:body>
</office:document-content>
"#;

/// Build an ODT archive in memory
pub fn odt_bytes(styles: &str, content: &str) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/vnd.oasis.opendocument.text").unwrap();
    zip.start_file("styles.xml", deflated).unwrap();
    zip.write_all(styles.as_bytes()).unwrap();
    zip.start_file("content.xml", deflated).unwrap();
    zip.write_all(content.as_bytes()).unwrap();

    zip.finish().unwrap();
    buffer.into_inner()
}

/// Write an ODT file into `dir`
pub fn write_odt(dir: &Path, name: &str, styles: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, odt_bytes(styles, content)).unwrap();
    path
}

/// Write the novel fixture into `dir`
pub fn write_novel(dir: &Path) -> PathBuf {
    write_odt(dir, "novel.odt", NOVEL_STYLES, NOVEL_CONTENT)
}

/// A small JPEG image
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Jpeg).unwrap();
    bytes.into_inner()
}
