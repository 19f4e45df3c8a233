//! Document body parsing (content.xml)
//!
//! [`ContentBuilder`] consumes start/end/text events one at a time and
//! keeps the open containers explicitly: the open heading or paragraph,
//! a stack of open lists (each with its open item), a stack of span
//! styles and the open note. [`parse_content`] drives it from a
//! `quick-xml` reader.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::diagnostics::Diagnostic;
use crate::document::{
    push_text, Block, Document, Header, List, ListItem, ListKind, Note, NoteId, Paragraph, Run,
};
use crate::error::{ConvertError, Result};
use crate::styles::{StyleId, StyleRegistry};
use crate::xml::{collect_attrs, required, Attributes};

/// Parse a complete document from its two streams
///
/// The named styles come from `styles_xml`; the automatic styles and the
/// body both come from `content_xml`.
pub fn parse_document(styles_xml: &[u8], content_xml: &[u8]) -> Result<Document> {
    let mut registry = StyleRegistry::new();
    registry.parse_styles(styles_xml, false)?;
    registry.parse_styles(content_xml, true)?;
    parse_content(registry, content_xml)
}

/// Build the document tree from a content stream
///
/// `registry` must already hold every style the body references.
pub fn parse_content(registry: StyleRegistry, xml: &[u8]) -> Result<Document> {
    let mut reader = Reader::from_reader(xml);
    // Whitespace inside paragraphs is content
    reader.config_mut().trim_text(false);

    let mut builder = ContentBuilder::new(registry);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                builder.start_element(e.local_name().as_ref(), &collect_attrs(e))?;
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                builder.start_element(name.as_ref(), &collect_attrs(e))?;
                builder.end_element(name.as_ref());
            }
            Ok(Event::End(ref e)) => {
                builder.end_element(e.local_name().as_ref());
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape()?;
                builder.text(&text);
            }
            Ok(Event::CData(ref e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                builder.text(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ConvertError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(builder.finish())
}

/// A heading or paragraph being filled
#[derive(Debug)]
struct OpenBlock {
    style: StyleId,
    /// `Some(level)` for headings
    level: Option<u8>,
    runs: Vec<Run>,
}

impl OpenBlock {
    fn build(self) -> Block {
        match self.level {
            Some(level) => Block::Header(Header {
                style: self.style,
                level,
                runs: self.runs,
            }),
            None => Block::Paragraph(Paragraph {
                style: self.style,
                runs: self.runs,
            }),
        }
    }
}

/// Upper bound on the spaces a single `text:s` element expands to
const MAX_SPACE_RUN: usize = 1024;

/// A list being filled, with its currently open item
#[derive(Debug)]
struct OpenList {
    list: List,
    item: Option<ListItem>,
    /// Reopened after a heading split it; dropped if nothing follows
    resumed: bool,
    /// The open item continues one that a heading split
    continued: bool,
}

impl OpenList {
    fn new(list: List) -> Self {
        Self {
            list,
            item: None,
            resumed: false,
            continued: false,
        }
    }

    fn close_item(&mut self) {
        if let Some(item) = self.item.take() {
            if !(self.continued && item.blocks.is_empty()) {
                self.list.items.push(item);
            }
        }
        self.continued = false;
    }
}

/// A note being filled
#[derive(Debug)]
struct OpenNote {
    note: Note,
    /// Whether a paragraph was open when the note started
    anchored: bool,
    /// Paragraphs started inside the note body so far
    paragraphs: usize,
    /// Depth of currently open paragraphs inside the note body
    paragraph_depth: usize,
}

/// Streaming builder for the content tree
#[derive(Debug)]
pub struct ContentBuilder {
    registry: StyleRegistry,
    blocks: Vec<Block>,
    notes: Vec<Note>,
    diagnostics: Vec<Diagnostic>,
    /// Open headings/paragraphs; more than one only for paragraphs in frames
    open_blocks: Vec<OpenBlock>,
    lists: Vec<OpenList>,
    spans: Vec<Option<StyleId>>,
    note: Option<OpenNote>,
    in_citation: bool,
    /// Depth inside subtrees whose text is not document content
    skip_depth: usize,
}

impl ContentBuilder {
    /// Create a builder over a populated style registry
    pub fn new(registry: StyleRegistry) -> Self {
        Self {
            registry,
            blocks: Vec::new(),
            notes: Vec::new(),
            diagnostics: Vec::new(),
            open_blocks: Vec::new(),
            lists: Vec::new(),
            spans: Vec::new(),
            note: None,
            in_citation: false,
            skip_depth: 0,
        }
    }

    /// The style registry the builder resolves names against
    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    /// Handle an element start, by local name
    pub fn start_element(&mut self, name: &[u8], attrs: &Attributes) -> Result<()> {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return Ok(());
        }

        match name {
            b"annotation" | b"tracked-changes" => self.skip_depth = 1,
            b"h" if self.note.is_none() => self.start_header(attrs)?,
            b"p" | b"h" if self.note.is_some() => self.start_note_paragraph(),
            b"p" => self.start_paragraph(attrs)?,
            // Lists in a note body are flattened into the note's paragraphs
            b"list" | b"list-item" | b"list-header" if self.note.is_some() => {}
            b"list" => self.start_list(attrs)?,
            b"list-item" | b"list-header" => {
                if let Some(open) = self.lists.last_mut() {
                    open.item = Some(ListItem::default());
                    open.continued = false;
                }
            }
            b"span" => {
                let style = match attrs.get("text:style-name") {
                    Some(name) => Some(self.registry.require(name)?),
                    None => self.spans.last().copied().flatten(),
                };
                self.spans.push(style);
            }
            b"note" => self.start_note(attrs)?,
            b"note-citation" => self.in_citation = true,
            b"line-break" => self.line_break(),
            b"s" => {
                let count = attrs
                    .get("text:c")
                    .and_then(|c| c.parse::<usize>().ok())
                    .unwrap_or(1)
                    .min(MAX_SPACE_RUN);
                self.text(&" ".repeat(count));
            }
            b"tab" => self.text("\t"),
            _ => {}
        }
        Ok(())
    }

    /// Handle an element end, by local name
    pub fn end_element(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }

        match name {
            b"p" | b"h" if self.note.is_some() => {
                if let Some(open) = self.note.as_mut() {
                    open.paragraph_depth = open.paragraph_depth.saturating_sub(1);
                }
            }
            b"p" | b"h" => {
                if let Some(mut block) = self.open_blocks.pop() {
                    let is_header = block.level.is_some();
                    if !is_header {
                        if let Some(outer) = self.open_blocks.last_mut() {
                            outer.runs.append(&mut block.runs);
                            return;
                        }
                    }
                    let block = block.build();
                    if !is_header {
                        self.attach(block);
                    } else if self.lists.is_empty() {
                        self.blocks.push(block);
                    } else {
                        self.hoist_header(block);
                    }
                }
            }
            b"list" | b"list-item" | b"list-header" if self.note.is_some() => {}
            b"list" => {
                if let Some(open) = self.lists.pop() {
                    self.close_list(open);
                }
            }
            b"list-item" | b"list-header" => {
                if let Some(open) = self.lists.last_mut() {
                    open.close_item();
                }
            }
            b"span" => {
                self.spans.pop();
            }
            b"note" => self.end_note(),
            b"note-citation" => self.in_citation = false,
            _ => {}
        }
    }

    /// Route character data to its destination
    ///
    /// Priority: note citation, note body, open paragraph. Text with none
    /// of these is dropped; anything but whitespace leaves a diagnostic.
    pub fn text(&mut self, text: &str) {
        if self.skip_depth > 0 || text.is_empty() {
            return;
        }
        let span = self.spans.last().copied().flatten();

        if self.in_citation {
            if let Some(open) = self.note.as_mut() {
                open.note.citation = text.to_string();
                return;
            }
        }

        if let Some(open) = self.note.as_mut() {
            if open.paragraph_depth > 0 || !text.trim().is_empty() {
                push_text(&mut open.note.runs, text, span);
            }
            return;
        }

        if let Some(block) = self.open_blocks.last_mut() {
            push_text(&mut block.runs, text, span);
            return;
        }

        if !text.trim().is_empty() {
            self.diagnostics.push(Diagnostic::unroutable_text(text));
        }
    }

    /// Close anything left open and hand over the document
    pub fn finish(mut self) -> Document {
        if self.note.is_some() {
            self.end_note();
        }
        while let Some(block) = self.open_blocks.pop() {
            let block = block.build();
            self.attach(block);
        }
        while let Some(open) = self.lists.pop() {
            self.close_list(open);
        }

        tracing::debug!(
            "Parsed {} top-level blocks, {} notes",
            self.blocks.len(),
            self.notes.len()
        );

        Document {
            registry: self.registry,
            blocks: self.blocks,
            notes: self.notes,
            diagnostics: self.diagnostics,
        }
    }

    fn start_header(&mut self, attrs: &Attributes) -> Result<()> {
        let style_name = required(attrs, "text:h", "text:style-name")?;
        let style = self.registry.require(style_name)?;
        let level = attrs
            .get("text:outline-level")
            .and_then(|l| l.trim().parse::<u8>().ok())
            .filter(|l| *l > 0)
            .or_else(|| self.registry.header_level(style))
            .unwrap_or(1);

        if !self.lists.is_empty() {
            self.diagnostics.push(Diagnostic::unmodeled(format!(
                "Heading inside a list moved to the top level (style {})",
                style_name
            )));
        }

        self.open_blocks.push(OpenBlock {
            style,
            level: Some(level),
            runs: Vec::new(),
        });
        Ok(())
    }

    fn start_paragraph(&mut self, attrs: &Attributes) -> Result<()> {
        let style_name = required(attrs, "text:p", "text:style-name")?;
        let style = self.registry.require(style_name)?;

        if !self.open_blocks.is_empty() {
            self.diagnostics.push(Diagnostic::unmodeled(format!(
                "Paragraph nested in another paragraph flattened (style {})",
                style_name
            )));
        }

        self.open_blocks.push(OpenBlock {
            style,
            level: None,
            runs: Vec::new(),
        });
        Ok(())
    }

    fn start_note_paragraph(&mut self) {
        if let Some(open) = self.note.as_mut() {
            if open.paragraphs > 0 && !open.note.runs.is_empty() {
                open.note.runs.push(Run::LineBreak);
            }
            open.paragraphs += 1;
            open.paragraph_depth += 1;
        }
    }

    fn start_list(&mut self, attrs: &Attributes) -> Result<()> {
        let continues = attrs
            .get("text:continue-numbering")
            .is_some_and(|v| v == "true")
            || attrs.contains_key("text:continue-list");
        if continues {
            self.diagnostics.push(Diagnostic::unmodeled(
                "List continues the numbering of a previous list; numbered independently",
            ));
        }

        let style = match attrs.get("text:style-name") {
            Some(name) => Some(self.registry.require(name)?),
            None => self.lists.last().and_then(|open| open.list.style),
        };
        let depth = self.lists.len() + 1;
        let kind = match style {
            Some(id) => self.registry.list_kind(id, depth)?,
            None => ListKind::Unordered,
        };

        self.lists.push(OpenList::new(List {
            style,
            kind,
            items: Vec::new(),
        }));
        Ok(())
    }

    fn start_note(&mut self, attrs: &Attributes) -> Result<()> {
        let id = required(attrs, "text:note", "text:id")?.to_string();
        let class = attrs
            .get("text:note-class")
            .cloned()
            .unwrap_or_else(|| "footnote".to_string());

        self.note = Some(OpenNote {
            note: Note {
                id,
                class,
                citation: String::new(),
                runs: Vec::new(),
            },
            anchored: !self.open_blocks.is_empty(),
            paragraphs: 0,
            paragraph_depth: 0,
        });
        Ok(())
    }

    fn end_note(&mut self) {
        let Some(open) = self.note.take() else {
            return;
        };
        self.in_citation = false;

        let note_id = NoteId(self.notes.len());
        if open.anchored {
            if let Some(block) = self.open_blocks.last_mut() {
                block.runs.push(Run::NoteRef(note_id));
            }
        } else {
            self.diagnostics.push(Diagnostic::unmodeled(format!(
                "Note {} has no enclosing paragraph and is never referenced",
                open.note.id
            )));
        }
        self.notes.push(open.note);
    }

    fn line_break(&mut self) {
        if self.skip_depth > 0 {
            return;
        }
        if let Some(open) = self.note.as_mut() {
            open.note.runs.push(Run::LineBreak);
        } else if let Some(block) = self.open_blocks.last_mut() {
            block.runs.push(Run::LineBreak);
        } else {
            tracing::debug!("Line break outside any paragraph ignored");
        }
    }

    fn close_list(&mut self, mut open: OpenList) {
        open.close_item();
        if open.resumed && open.list.items.is_empty() {
            return;
        }
        self.attach(Block::List(open.list));
    }

    /// Put a heading found inside lists at the top level
    ///
    /// The open lists are closed with what they hold so far, the heading
    /// follows them, and the lists reopen for whatever comes after it.
    fn hoist_header(&mut self, header: Block) {
        let mut reopen = Vec::new();
        while let Some(mut open) = self.lists.pop() {
            let had_item = open.item.is_some();
            if open.item.as_ref().is_some_and(|item| item.blocks.is_empty()) {
                open.item = None;
            }
            reopen.push((open.list.style, open.list.kind, had_item));
            open.resumed = true;
            self.close_list(open);
        }

        self.blocks.push(header);

        for (style, kind, had_item) in reopen.into_iter().rev() {
            self.lists.push(OpenList {
                list: List {
                    style,
                    kind,
                    items: Vec::new(),
                },
                item: had_item.then(ListItem::default),
                resumed: true,
                continued: had_item,
            });
        }
    }

    /// Attach a finished block to the open list item, or the top level
    fn attach(&mut self, block: Block) {
        if let Some(open) = self.lists.last_mut() {
            match open.item.as_mut() {
                Some(item) => {
                    item.blocks.push(block);
                    return;
                }
                None => {
                    self.diagnostics.push(Diagnostic::unmodeled(
                        "Content directly inside a list without an item placed at the top level",
                    ));
                }
            }
        }
        self.blocks.push(block);
    }
}
