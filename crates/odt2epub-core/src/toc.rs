//! Table of contents tree
//!
//! Entries are stored in an arena; index 0 is a level-0 root. Insertion
//! keeps a cursor on the last inserted entry and climbs from it until it
//! finds an entry with a lower level, which becomes the parent.

/// Index of an entry in a [`TocTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TocId(usize);

/// A navigable heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocElement {
    /// Outline level (0 for the root)
    pub level: u8,
    /// Page holding the heading (e.g. `chp002`)
    pub page: String,
    /// Anchor id of the heading inside its page
    pub anchor: String,
    /// Heading text
    pub label: String,
    parent: Option<TocId>,
    children: Vec<TocId>,
}

impl TocElement {
    /// Child entries in document order
    pub fn children(&self) -> &[TocId] {
        &self.children
    }

    /// Parent entry, `None` for the root
    pub fn parent(&self) -> Option<TocId> {
        self.parent
    }
}

/// Heading hierarchy of a document
#[derive(Debug, Clone)]
pub struct TocTree {
    nodes: Vec<TocElement>,
    cursor: TocId,
}

impl Default for TocTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TocTree {
    /// Create a tree holding only the root
    pub fn new() -> Self {
        Self {
            nodes: vec![TocElement {
                level: 0,
                page: String::new(),
                anchor: String::new(),
                label: String::new(),
                parent: None,
                children: Vec::new(),
            }],
            cursor: TocId(0),
        }
    }

    /// The root entry
    pub fn root(&self) -> TocId {
        TocId(0)
    }

    /// Get an entry
    pub fn get(&self, id: TocId) -> &TocElement {
        &self.nodes[id.0]
    }

    /// Number of headings (the root is not counted)
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the tree holds no heading
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a heading after all previously inserted ones
    ///
    /// A level of 0 is treated as 1 so that the root stays unique.
    pub fn insert(
        &mut self,
        level: u8,
        page: impl Into<String>,
        anchor: impl Into<String>,
        label: impl Into<String>,
    ) -> TocId {
        let level = level.max(1);

        let mut parent = self.cursor;
        while self.nodes[parent.0].level >= level {
            match self.nodes[parent.0].parent {
                Some(up) => parent = up,
                None => break,
            }
        }

        let id = TocId(self.nodes.len());
        self.nodes.push(TocElement {
            level,
            page: page.into(),
            anchor: anchor.into(),
            label: label.into(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        self.cursor = id;
        id
    }

    /// Entries in pre-order, without the root, paired with their depth (1-based)
    pub fn pre_order(&self) -> Vec<(TocId, usize)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(TocId, usize)> = self.nodes[0]
            .children
            .iter()
            .rev()
            .map(|&c| (c, 1))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            stack.extend(self.nodes[id.0].children.iter().rev().map(|&c| (c, depth + 1)));
        }
        out
    }

    /// Depth of the deepest entry (0 for an empty tree)
    pub fn depth(&self) -> usize {
        self.pre_order()
            .into_iter()
            .map(|(_, depth)| depth)
            .max()
            .unwrap_or(0)
    }
}
