//! HTML rendering with pagination and TOC derivation
//!
//! One pass over the top-level blocks renders every block into the
//! current page, splits pages on `fo:break-before="page"` (paginated mode
//! only), assigns heading anchors, grows the TOC tree and records the
//! styles the stylesheet has to cover. Notes referenced on a page are
//! written at the bottom of that same page.

use crate::diagnostics::Diagnostic;
use crate::document::{Block, Document, Header, List, NoteId, Paragraph, Run};
use crate::error::{ConvertError, Result};
use crate::stylesheet::{self, css_class_name, UsedStyles};
use crate::toc::TocTree;

/// Stylesheet reference used by package chapters
pub const PACKAGE_STYLESHEET_HREF: &str = "../Styles/stylesheet.css";

/// Placeholder body of a paragraph without content
pub const EMPTY_PARAGRAPH: &str = "&#160;";

/// Marker inserted before level-1 headings in flat mode when requested
pub const SPLIT_MARKER: &str = r#"<hr class="sigil_split_marker" />"#;

/// How a page refers to its stylesheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetLink {
    /// `<link>` to a stylesheet file
    Href(String),
    /// Stylesheet embedded in a `<style>` element
    Inline,
}

/// Rendering options
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Document title written into every page head
    pub title: String,
    /// Give non-body paragraphs a class attribute
    pub keep_css_class: bool,
    /// Emit split markers before level-1 headings (flat mode)
    pub insert_split_marker: bool,
    /// Display name of the style rendered as plain `<p>`
    pub body_style: String,
    /// Stylesheet reference
    pub stylesheet: StylesheetLink,
    /// Baseline stylesheet replacing the built-in one
    pub baseline_css: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            keep_css_class: true,
            insert_split_marker: false,
            body_style: "Text body".to_string(),
            stylesheet: StylesheetLink::Href(PACKAGE_STYLESHEET_HREF.to_string()),
            baseline_css: None,
        }
    }
}

/// A rendered chapter page
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based position in emission order
    pub index: usize,
    /// Page name (`chp001`, `chp002`, ...)
    pub name: String,
    /// Complete XHTML document
    pub html: String,
}

impl Page {
    /// File name of the page inside a package
    pub fn file_name(&self) -> String {
        format!("{}.xhtml", self.name)
    }
}

/// Output of paginated rendering
#[derive(Debug, Clone)]
pub struct PaginatedOutput {
    /// Pages in emission order
    pub pages: Vec<Page>,
    /// Generated stylesheet
    pub css: String,
    /// Heading hierarchy
    pub toc: TocTree,
    /// Findings recorded while rendering
    pub diagnostics: Vec<Diagnostic>,
}

/// Output of flat rendering
#[derive(Debug, Clone)]
pub struct FlatOutput {
    /// Complete XHTML document
    pub html: String,
    /// Generated stylesheet
    pub css: String,
    /// Findings recorded while rendering
    pub diagnostics: Vec<Diagnostic>,
}

/// Name of the page at a 1-based position
pub fn page_name(index: usize) -> String {
    format!("chp{:03}", index)
}

/// Render the whole document as a single page
pub fn render_flat(doc: &Document, options: &RenderOptions) -> Result<FlatOutput> {
    let mut renderer = Renderer::new(doc, options, false);
    renderer.run();
    let Rendered {
        bodies,
        used,
        diagnostics,
        ..
    } = renderer.finish();

    if bodies.len() != 1 {
        return Err(ConvertError::PageCount(bodies.len()));
    }

    let css = stylesheet::generate(
        &doc.registry,
        &used,
        &options.body_style,
        options.baseline_css.as_deref(),
    );
    let html = wrap_page(&options.title, &options.stylesheet, &css, &bodies[0]);

    Ok(FlatOutput {
        html,
        css,
        diagnostics,
    })
}

/// Render the document as chapter pages split on forced page breaks
///
/// A top-level block whose style declares `fo:break-before="page"` starts
/// a new page, unless the current page is still empty. A break on the
/// very first block therefore does not produce an empty `chp001`: N
/// breaks give N+1 pages only when content precedes the first break,
/// and N pages otherwise. Breaks inside list items are ignored.
pub fn render_paginated(doc: &Document, options: &RenderOptions) -> Result<PaginatedOutput> {
    let mut renderer = Renderer::new(doc, options, true);
    renderer.run();
    let Rendered {
        bodies,
        toc,
        used,
        diagnostics,
    } = renderer.finish();

    let css = stylesheet::generate(
        &doc.registry,
        &used,
        &options.body_style,
        options.baseline_css.as_deref(),
    );

    let pages = bodies
        .iter()
        .enumerate()
        .map(|(i, body)| Page {
            index: i + 1,
            name: page_name(i + 1),
            html: wrap_page(&options.title, &options.stylesheet, &css, body),
        })
        .collect::<Vec<_>>();

    tracing::info!("Rendered {} pages, {} headings", pages.len(), toc.len());

    Ok(PaginatedOutput {
        pages,
        css,
        toc,
        diagnostics,
    })
}

/// A page body being filled
#[derive(Debug, Default)]
struct PageBuffer {
    body: String,
    notes: Vec<NoteId>,
    blocks: usize,
}

struct Rendered {
    bodies: Vec<String>,
    toc: TocTree,
    used: UsedStyles,
    diagnostics: Vec<Diagnostic>,
}

struct Renderer<'a> {
    doc: &'a Document,
    options: &'a RenderOptions,
    paginated: bool,
    finished: Vec<String>,
    page: PageBuffer,
    anchors: usize,
    toc: TocTree,
    used: UsedStyles,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Renderer<'a> {
    fn new(doc: &'a Document, options: &'a RenderOptions, paginated: bool) -> Self {
        Self {
            doc,
            options,
            paginated,
            finished: Vec::new(),
            page: PageBuffer::default(),
            anchors: 0,
            toc: TocTree::new(),
            used: UsedStyles::new(),
            diagnostics: Vec::new(),
        }
    }

    fn run(&mut self) {
        let doc = self.doc;
        for block in &doc.blocks {
            if self.paginated && self.breaks_before(block) && self.page.blocks > 0 {
                self.close_page();
            }
            let html = self.render_block(block, false);
            self.page.body.push_str(&html);
            self.page.body.push('\n');
            self.page.blocks += 1;
        }
    }

    fn finish(mut self) -> Rendered {
        self.close_page();
        Rendered {
            bodies: self.finished,
            toc: self.toc,
            used: self.used,
            diagnostics: self.diagnostics,
        }
    }

    fn breaks_before(&self, block: &Block) -> bool {
        match block {
            Block::Header(_) | Block::Paragraph(_) => block
                .style()
                .is_some_and(|s| self.doc.registry.has_page_break_before(s)),
            Block::List(_) => false,
        }
    }

    fn current_page_name(&self) -> String {
        page_name(self.finished.len() + 1)
    }

    /// Flush the page's notes and start a new page
    fn close_page(&mut self) {
        let mut page = std::mem::take(&mut self.page);
        if !page.notes.is_empty() {
            page.body.push_str("<div class=\"footnotes\">\n");
            for id in &page.notes {
                let note = self.doc.note(*id);
                let anchor = escape_html(&note.id);
                page.body.push_str(&format!(
                    "<p class=\"{}\" id=\"fn_{}\"><a href=\"#fnref_{}\">{}</a> {}</p>\n",
                    escape_html(&note.class),
                    anchor,
                    anchor,
                    escape_html(&note.citation),
                    self.render_runs(&note.runs)
                ));
            }
            page.body.push_str("</div>\n");
        }
        self.finished.push(page.body);
    }

    fn render_block(&mut self, block: &Block, in_list: bool) -> String {
        match block {
            Block::Header(header) => self.render_header(header),
            Block::Paragraph(paragraph) => self.render_paragraph(paragraph, in_list),
            Block::List(list) => self.render_list(list),
        }
    }

    fn render_header(&mut self, header: &Header) -> String {
        self.anchors += 1;
        let anchor = format!("hid_{}", self.anchors);
        let doc = self.doc;
        let registry = &doc.registry;
        let display = registry.display_name(header.style, false).to_string();
        self.used.record_header(&display, header.style, header.level);

        let page = self.current_page_name();
        self.toc
            .insert(header.level, page, anchor.clone(), header.plain_text());

        let tag = header.level.clamp(1, 6);
        let mut html = String::new();
        if !self.paginated && self.options.insert_split_marker && header.level == 1 {
            html.push_str(SPLIT_MARKER);
            html.push('\n');
        }
        let content = self.render_content(&header.runs);
        html.push_str(&format!("<h{} id=\"{}\">{}</h{}>", tag, anchor, content, tag));
        html
    }

    fn render_paragraph(&mut self, paragraph: &Paragraph, in_list: bool) -> String {
        let doc = self.doc;
        let registry = &doc.registry;
        if in_list && self.paginated && registry.has_page_break_before(paragraph.style) {
            self.diagnostics.push(Diagnostic::unmodeled(format!(
                "Page break inside a list item ignored (style {})",
                registry.get(paragraph.style).name
            )));
        }

        let display = registry.display_name(paragraph.style, false).to_string();
        let italic = registry.is_italic(paragraph.style, false);
        let bold = registry.is_bold(paragraph.style, false);
        self.used.record_paragraph(&display, paragraph.style);

        let content = self.render_content(&paragraph.runs);
        if display == self.options.body_style {
            format!("<p>{}</p>", content)
        } else if self.options.keep_css_class {
            format!("<p class=\"{}\">{}</p>", css_class_name(&display), content)
        } else if paragraph.runs.is_empty() {
            format!("<p>{}</p>", content)
        } else {
            format!("<p>{}</p>", emphasize(&content, italic, bold))
        }
    }

    fn render_list(&mut self, list: &List) -> String {
        let tag = list.kind.tag();
        let mut html = format!("<{}>\n", tag);
        for item in &list.items {
            html.push_str("<li>");
            for (i, block) in item.blocks.iter().enumerate() {
                if i > 0 {
                    html.push('\n');
                }
                let rendered = self.render_block(block, true);
                html.push_str(&rendered);
            }
            html.push_str("</li>\n");
        }
        html.push_str(&format!("</{}>", tag));
        html
    }

    /// Runs of a heading or paragraph, with the empty placeholder
    fn render_content(&mut self, runs: &[Run]) -> String {
        if runs.is_empty() {
            return EMPTY_PARAGRAPH.to_string();
        }
        let mut html = String::new();
        for run in runs {
            if let Run::NoteRef(id) = run {
                self.page.notes.push(*id);
            }
        }
        html.push_str(&self.render_runs(runs));
        html
    }

    fn render_runs(&self, runs: &[Run]) -> String {
        let registry = &self.doc.registry;
        let mut html = String::new();
        for run in runs {
            match run {
                Run::Text { text, style } => {
                    let text = escape_html(text);
                    match style {
                        Some(s) => html.push_str(&emphasize(
                            &text,
                            registry.is_italic(*s, false),
                            registry.is_bold(*s, false),
                        )),
                        None => html.push_str(&text),
                    }
                }
                Run::LineBreak => html.push_str("<br />"),
                Run::NoteRef(id) => {
                    let note = self.doc.note(*id);
                    let anchor = escape_html(&note.id);
                    html.push_str(&format!(
                        "<sup><a id=\"fnref_{}\" href=\"#fn_{}\">{}</a></sup>",
                        anchor,
                        anchor,
                        escape_html(&note.citation)
                    ));
                }
            }
        }
        html
    }
}

fn emphasize(content: &str, italic: bool, bold: bool) -> String {
    match (italic, bold) {
        (true, true) => format!("<i><b>{}</b></i>", content),
        (true, false) => format!("<i>{}</i>", content),
        (false, true) => format!("<b>{}</b>", content),
        (false, false) => content.to_string(),
    }
}

/// Wrap a page body into a complete XHTML document
fn wrap_page(title: &str, link: &StylesheetLink, css: &str, body: &str) -> String {
    let stylesheet = match link {
        StylesheetLink::Href(href) => format!(
            "<link href=\"{}\" rel=\"stylesheet\" type=\"text/css\" />",
            escape_html(href)
        ),
        StylesheetLink::Inline => format!("<style type=\"text/css\">\n{}</style>", css),
    };
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN"
    "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">

<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title>{}</title>
{}
</head>
<body>
{}</body>
</html>
"#,
        escape_html(title),
        stylesheet,
        body
    )
}

/// Escape text for HTML/XML content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
