//! Content data model
//!
//! A [`Document`] owns its style registry, the ordered top-level blocks,
//! and the footnotes/endnotes collected while parsing. Notes live in a
//! document-level arena; paragraphs reference them through [`NoteId`].

use crate::diagnostics::Diagnostic;
use crate::styles::{StyleId, StyleRegistry};

/// A parsed document
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// All styles (named and automatic)
    pub registry: StyleRegistry,
    /// Top-level blocks in document order
    pub blocks: Vec<Block>,
    /// Notes in the order they were closed
    pub notes: Vec<Note>,
    /// Recoverable findings recorded while building the tree
    pub diagnostics: Vec<Diagnostic>,
}

/// Block-level elements
#[derive(Debug, Clone)]
pub enum Block {
    /// A heading
    Header(Header),
    /// A paragraph
    Paragraph(Paragraph),
    /// A bulleted or numbered list
    List(List),
}

impl Block {
    /// Paragraph style of the block, if it has one
    pub fn style(&self) -> Option<StyleId> {
        match self {
            Block::Header(h) => Some(h.style),
            Block::Paragraph(p) => Some(p.style),
            Block::List(l) => l.style,
        }
    }
}

/// A heading with its level and content
#[derive(Debug, Clone)]
pub struct Header {
    /// Paragraph style
    pub style: StyleId,
    /// Outline level (1-based)
    pub level: u8,
    /// Inline content
    pub runs: Vec<Run>,
}

impl Header {
    /// Heading text without markup, used for navigation labels
    pub fn plain_text(&self) -> String {
        plain_text(&self.runs)
    }
}

/// A paragraph with its style and content
#[derive(Debug, Clone)]
pub struct Paragraph {
    /// Paragraph style
    pub style: StyleId,
    /// Inline content
    pub runs: Vec<Run>,
}

/// Numbering kind of a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// Numbered list (`<ol>`)
    Ordered,
    /// Bulleted list (`<ul>`)
    Unordered,
}

impl ListKind {
    /// Map an ODF list level kind (`number`, `bullet`, `image`)
    pub fn from_odf(kind: &str) -> Option<Self> {
        match kind {
            "number" => Some(ListKind::Ordered),
            "bullet" | "image" => Some(ListKind::Unordered),
            _ => None,
        }
    }

    /// HTML element name
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Ordered => "ol",
            ListKind::Unordered => "ul",
        }
    }
}

/// A list
#[derive(Debug, Clone)]
pub struct List {
    /// List style, if one was declared or inherited
    pub style: Option<StyleId>,
    /// Numbering kind at this list's depth
    pub kind: ListKind,
    /// Items in order
    pub items: Vec<ListItem>,
}

/// A list item holding paragraphs and nested lists
#[derive(Debug, Clone, Default)]
pub struct ListItem {
    /// Child blocks
    pub blocks: Vec<Block>,
}

/// Index of a note in [`Document::notes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteId(pub usize);

/// A footnote or endnote
#[derive(Debug, Clone)]
pub struct Note {
    /// Document id (`text:id`)
    pub id: String,
    /// Note class (`footnote` or `endnote`)
    pub class: String,
    /// Citation marker shown in the text
    pub citation: String,
    /// Body content
    pub runs: Vec<Run>,
}

/// Inline content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    /// Text, optionally under an inline span style
    Text {
        /// The text content
        text: String,
        /// Span style active when the text arrived
        style: Option<StyleId>,
    },
    /// A forced line break
    LineBreak,
    /// Reference to a note
    NoteRef(NoteId),
}

/// Append text to a run sequence, extending the last run when the style matches
pub(crate) fn push_text(runs: &mut Vec<Run>, text: &str, style: Option<StyleId>) {
    if let Some(Run::Text {
        text: last,
        style: last_style,
    }) = runs.last_mut()
    {
        if *last_style == style {
            last.push_str(text);
            return;
        }
    }
    runs.push(Run::Text {
        text: text.to_string(),
        style,
    });
}

/// Concatenated text of a run sequence
pub fn plain_text(runs: &[Run]) -> String {
    let mut out = String::new();
    for run in runs {
        match run {
            Run::Text { text, .. } => out.push_str(text),
            Run::LineBreak => out.push(' '),
            Run::NoteRef(_) => {}
        }
    }
    out.trim().to_string()
}

impl Document {
    /// Create an empty document around an existing registry
    pub fn new(registry: StyleRegistry) -> Self {
        Self {
            registry,
            ..Default::default()
        }
    }

    /// Get a note by id
    pub fn note(&self, id: NoteId) -> &Note {
        &self.notes[id.0]
    }

    /// Number of headings in the document, including hoisted ones
    pub fn header_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Header(_)))
            .count()
    }

    /// Whether any diagnostic was recorded
    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_warning)
    }
}
