//! Style definitions parsing (styles.xml and content.xml automatic styles)
//!
//! This module stores every style declaration of a document in one
//! registry and answers cascading property queries through parent chains.
//!
//! # Cascade
//!
//! A property not set locally on a style is inherited from its parent,
//! transitively. Styles live in an arena and reference their parent by
//! [`StyleId`], so walking the chain is a loop over indices. A parent is
//! always declared before its children, which rules out cycles.
//!
//! # Scopes
//!
//! Named styles (from `styles.xml`) and automatic styles (from the
//! `office:automatic-styles` section of `content.xml`) share the arena but
//! have separate name tables. The same name may exist in both; lookups
//! coming from document content see the automatic one first.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::document::ListKind;
use crate::error::{ConvertError, Result};
use crate::xml::{collect_attrs, local_name, required, Attributes};

/// Local property holding a style's display name
pub const DISPLAY_NAME: &str = "style:display-name";
/// Local property holding a paragraph style's heading level
pub const OUTLINE_LEVEL: &str = "style:default-outline-level";
/// Paragraph alignment property
pub const TEXT_ALIGN: &str = "fo:text-align";
/// Font style property (`italic`, `normal`, ...)
pub const FONT_STYLE: &str = "fo:font-style";
/// Font weight property (`bold`, `normal`, ...)
pub const FONT_WEIGHT: &str = "fo:font-weight";
/// Forced break property (`page` starts a new chapter)
pub const BREAK_BEFORE: &str = "fo:break-before";
/// Numbering kind recorded on list styles
pub const LIST_STYLE: &str = "list-style";

/// Index of a style in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(usize);

impl StyleId {
    /// Position of the style in declaration order
    pub fn index(self) -> usize {
        self.0
    }
}

/// A style declaration
#[derive(Debug, Clone)]
pub struct Style {
    /// Style name (used in document references)
    pub name: String,
    /// Parent style, if declared and found
    pub parent: Option<StyleId>,
    /// Whether this style came from an automatic-styles pass
    pub automatic: bool,
    /// Raw properties declared on this style
    properties: Attributes,
}

impl Style {
    /// A property declared on this style itself
    pub fn local(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// All local properties
    pub fn properties(&self) -> &Attributes {
        &self.properties
    }
}

/// All styles of a document
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    /// Style arena, in declaration order
    styles: Vec<Style>,
    /// Named styles by name
    named: HashMap<String, StyleId>,
    /// Automatic styles by name
    automatic: HashMap<String, StyleId>,
}

impl StyleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a style
    ///
    /// The parent is looked up among already declared styles; an unknown
    /// parent leaves the style without one. Automatic styles resolve their
    /// parent among named styles first, as OpenDocument requires.
    pub fn declare(
        &mut self,
        name: &str,
        parent_name: Option<&str>,
        properties: Attributes,
        automatic: bool,
    ) -> Result<StyleId> {
        let table = if automatic {
            &self.automatic
        } else {
            &self.named
        };
        if table.contains_key(name) {
            return Err(ConvertError::DuplicateStyle(name.to_string()));
        }

        let parent = parent_name.and_then(|p| {
            let found = if automatic {
                self.named.get(p).or_else(|| self.automatic.get(p))
            } else {
                self.named.get(p)
            };
            if found.is_none() {
                tracing::debug!("Style {} has unknown parent {}, using local values only", name, p);
            }
            found.copied()
        });

        let id = StyleId(self.styles.len());
        self.styles.push(Style {
            name: name.to_string(),
            parent,
            automatic,
            properties,
        });
        if automatic {
            self.automatic.insert(name.to_string(), id);
        } else {
            self.named.insert(name.to_string(), id);
        }
        Ok(id)
    }

    /// Merge properties into a style; later values overwrite earlier ones
    pub fn set_properties<I>(&mut self, id: StyleId, properties: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.styles[id.0].properties.extend(properties);
    }

    /// Get a style by id
    pub fn get(&self, id: StyleId) -> &Style {
        &self.styles[id.0]
    }

    /// Number of declared styles
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether no style has been declared
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Iterate over all styles with their ids, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (StyleId, &Style)> {
        self.styles.iter().enumerate().map(|(i, s)| (StyleId(i), s))
    }

    /// Look up a named style
    pub fn named(&self, name: &str) -> Option<StyleId> {
        self.named.get(name).copied()
    }

    /// Look up an automatic style
    pub fn automatic(&self, name: &str) -> Option<StyleId> {
        self.automatic.get(name).copied()
    }

    /// Look up a style referenced from document content
    pub fn lookup(&self, name: &str) -> Option<StyleId> {
        self.automatic(name).or_else(|| self.named(name))
    }

    /// Look up a style referenced from document content, failing if absent
    pub fn require(&self, name: &str) -> Result<StyleId> {
        self.lookup(name)
            .ok_or_else(|| ConvertError::UndeclaredStyle(name.to_string()))
    }

    /// Resolve a property through the parent chain
    ///
    /// With `local_only` the chain is not followed.
    pub fn resolve(&self, id: StyleId, key: &str, local_only: bool) -> Option<&str> {
        let mut current = Some(id);
        while let Some(style_id) = current {
            let style = &self.styles[style_id.0];
            if let Some(value) = style.local(key) {
                return Some(value);
            }
            if local_only {
                return None;
            }
            current = style.parent;
        }
        None
    }

    /// Font style (`italic`, `normal`, ...)
    pub fn font_style(&self, id: StyleId, local_only: bool) -> Option<&str> {
        self.resolve(id, FONT_STYLE, local_only)
    }

    /// Font weight (`bold`, `normal`, ...)
    pub fn font_weight(&self, id: StyleId, local_only: bool) -> Option<&str> {
        self.resolve(id, FONT_WEIGHT, local_only)
    }

    /// Whether text in this style is italic
    pub fn is_italic(&self, id: StyleId, local_only: bool) -> bool {
        self.font_style(id, local_only) == Some("italic")
    }

    /// Whether text in this style is bold
    pub fn is_bold(&self, id: StyleId, local_only: bool) -> bool {
        self.font_weight(id, local_only) == Some("bold")
    }

    /// Paragraph alignment in CSS terms (`start` and `end` become `left`/`right`)
    pub fn alignment(&self, id: StyleId, local_only: bool) -> Option<&str> {
        self.resolve(id, TEXT_ALIGN, local_only).map(|a| match a {
            "start" => "left",
            "end" => "right",
            other => other,
        })
    }

    /// Whether a block in this style starts a new page
    pub fn has_page_break_before(&self, id: StyleId) -> bool {
        self.resolve(id, BREAK_BEFORE, false) == Some("page")
    }

    /// Display name of a style
    ///
    /// The local display name if declared. Otherwise an automatic style
    /// borrows its parent's display name unless `local_only` is set, and
    /// anything else falls back to the raw style name.
    pub fn display_name(&self, id: StyleId, local_only: bool) -> &str {
        let mut style = &self.styles[id.0];
        loop {
            if let Some(name) = style.local(DISPLAY_NAME) {
                return name;
            }
            match style.parent {
                Some(parent) if style.automatic && !local_only => {
                    style = &self.styles[parent.0];
                }
                _ => return &style.name,
            }
        }
    }

    /// Heading level of a style
    ///
    /// Taken from the outline level property, else from the number after
    /// `Heading` in the display name.
    pub fn header_level(&self, id: StyleId) -> Option<u8> {
        if let Some(level) = self.resolve(id, OUTLINE_LEVEL, false) {
            return level.trim().parse().ok().filter(|l| *l > 0);
        }
        self.display_name(id, false)
            .strip_prefix("Heading")
            .and_then(|suffix| suffix.trim().parse().ok())
            .filter(|l| *l > 0)
    }

    /// Numbering kind of a list style at a nesting depth (1-based)
    pub fn list_kind(&self, id: StyleId, depth: usize) -> Result<ListKind> {
        let kind = self
            .resolve(id, &format!("{}:{}", LIST_STYLE, depth), false)
            .or_else(|| self.resolve(id, LIST_STYLE, false))
            .ok_or_else(|| {
                ConvertError::UnknownContentKind(format!(
                    "list style {} declares no numbering kind",
                    self.styles[id.0].name
                ))
            })?;
        ListKind::from_odf(kind)
            .ok_or_else(|| ConvertError::UnknownContentKind(kind.to_string()))
    }

    /// Find the style a CSS class was derived from
    ///
    /// Named styles win over automatic ones; within a scope the first
    /// declared style wins.
    pub fn find_by_display_name(&self, display_name: &str) -> Option<StyleId> {
        let mut automatic_match = None;
        for (id, style) in self.iter() {
            if self.display_name(id, true) == display_name {
                if !style.automatic {
                    return Some(id);
                }
                automatic_match.get_or_insert(id);
            }
        }
        automatic_match
    }

    /// Resolved CSS properties of a style
    pub fn css_properties(&self, id: StyleId) -> Vec<(&'static str, String)> {
        let mut properties = Vec::new();
        if let Some(alignment) = self.alignment(id, false) {
            properties.push(("text-align", alignment.to_string()));
        }
        if let Some(font_style) = self.font_style(id, false) {
            properties.push(("font-style", font_style.to_string()));
        }
        if let Some(font_weight) = self.font_weight(id, false) {
            properties.push(("font-weight", font_weight.to_string()));
        }
        properties
    }

    /// Parse a style stream into this registry
    ///
    /// `automatic` marks every declaration of the pass as an automatic
    /// style. Call once with `styles.xml` (`false`) and once with
    /// `content.xml` (`true`).
    pub fn parse_styles(&mut self, xml: &[u8], automatic: bool) -> Result<()> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut current_style: Option<StyleId> = None;
        let mut in_list_level = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    self.start_style_element(e, automatic, &mut current_style, &mut in_list_level, false)?;
                }
                Ok(Event::Empty(ref e)) => {
                    self.start_style_element(e, automatic, &mut current_style, &mut in_list_level, true)?;
                }
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"style" | b"list-style" => current_style = None,
                    b"list-level-style-number" | b"list-level-style-bullet"
                    | b"list-level-style-image" => in_list_level = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(ConvertError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn start_style_element(
        &mut self,
        e: &BytesStart,
        automatic: bool,
        current_style: &mut Option<StyleId>,
        in_list_level: &mut bool,
        empty: bool,
    ) -> Result<()> {
        let name = e.local_name();
        match name.as_ref() {
            b"style" | b"list-style" => {
                let attrs = collect_attrs(e);
                let element = format!(
                    "{}:{}",
                    if name.as_ref() == b"style" { "style" } else { "text" },
                    local_name(name.as_ref())
                );
                let style_name = required(&attrs, &element, "style:name")?.to_string();
                if let Some(open) = *current_style {
                    return Err(ConvertError::NestedStyle(format!(
                        "{} inside {}",
                        style_name,
                        self.get(open).name
                    )));
                }
                let parent = if name.as_ref() == b"style" {
                    attrs.get("style:parent-style-name").cloned()
                } else {
                    None
                };
                let id = self.declare(&style_name, parent.as_deref(), attrs, automatic)?;
                if !empty {
                    *current_style = Some(id);
                }
            }
            b"paragraph-properties" | b"text-properties" if !*in_list_level => {
                if let Some(id) = *current_style {
                    self.set_properties(id, collect_attrs(e));
                }
            }
            b"list-level-style-number" | b"list-level-style-bullet" | b"list-level-style-image" => {
                if let Some(id) = *current_style {
                    let kind = match name.as_ref() {
                        b"list-level-style-number" => "number",
                        _ => "bullet",
                    };
                    let attrs = collect_attrs(e);
                    let level = attrs
                        .get("text:level")
                        .map(String::as_str)
                        .unwrap_or("1")
                        .to_string();
                    let mut properties = vec![(format!("{}:{}", LIST_STYLE, level), kind.to_string())];
                    if level == "1" {
                        properties.push((LIST_STYLE.to_string(), kind.to_string()));
                    }
                    self.set_properties(id, properties);
                }
                if !empty {
                    *in_list_level = true;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{content_xml, minimal_styles_xml, styles_xml};

    fn props(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_cascade_through_grandparent() {
        let mut registry = StyleRegistry::new();
        let g = registry
            .declare("G", None, props(&[(TEXT_ALIGN, "center")]), false)
            .unwrap();
        let p = registry.declare("P", Some("G"), Attributes::new(), false).unwrap();
        let c = registry.declare("C", Some("P"), Attributes::new(), false).unwrap();

        assert_eq!(registry.get(p).parent, Some(g));
        assert_eq!(registry.resolve(c, TEXT_ALIGN, false), Some("center"));
        assert_eq!(registry.resolve(c, TEXT_ALIGN, true), None);
        assert_eq!(registry.alignment(c, false), Some("center"));
    }

    #[test]
    fn test_missing_parent_falls_back_to_local() {
        let mut registry = StyleRegistry::new();
        let id = registry
            .declare("Orphan", Some("Nowhere"), props(&[(FONT_STYLE, "italic")]), false)
            .unwrap();

        assert_eq!(registry.get(id).parent, None);
        assert!(registry.is_italic(id, false));
        assert!(!registry.is_bold(id, false));
    }

    #[test]
    fn test_duplicate_in_same_pass() {
        let mut registry = StyleRegistry::new();
        registry.declare("X", None, Attributes::new(), false).unwrap();
        let err = registry
            .declare("X", None, Attributes::new(), false)
            .unwrap_err();
        assert!(matches!(err, ConvertError::DuplicateStyle(ref n) if n == "X"));
    }

    #[test]
    fn test_automatic_shadows_named() {
        let mut registry = StyleRegistry::new();
        let named = registry
            .declare("X", None, props(&[(TEXT_ALIGN, "end")]), false)
            .unwrap();
        let auto = registry
            .declare("X", None, props(&[(TEXT_ALIGN, "center")]), true)
            .unwrap();

        assert_ne!(named, auto);
        assert_eq!(registry.named("X"), Some(named));
        assert_eq!(registry.automatic("X"), Some(auto));
        assert_eq!(registry.lookup("X"), Some(auto));
        assert_eq!(registry.alignment(named, false), Some("right"));
        assert_eq!(registry.alignment(auto, false), Some("center"));
    }

    #[test]
    fn test_set_properties_overwrites() {
        let mut registry = StyleRegistry::new();
        let id = registry
            .declare("S", None, props(&[(FONT_WEIGHT, "normal")]), false)
            .unwrap();
        registry.set_properties(id, props(&[(FONT_WEIGHT, "bold")]));
        assert!(registry.is_bold(id, true));
    }

    #[test]
    fn test_alignment_mapping() {
        let mut registry = StyleRegistry::new();
        let start = registry
            .declare("A", None, props(&[(TEXT_ALIGN, "start")]), false)
            .unwrap();
        let justify = registry
            .declare("B", None, props(&[(TEXT_ALIGN, "justify")]), false)
            .unwrap();
        assert_eq!(registry.alignment(start, false), Some("left"));
        assert_eq!(registry.alignment(justify, false), Some("justify"));
    }

    #[test]
    fn test_display_name_rules() {
        let mut registry = StyleRegistry::new();
        let body = registry
            .declare("Text_20_body", None, props(&[(DISPLAY_NAME, "Text body")]), false)
            .unwrap();
        let p1 = registry
            .declare("P1", Some("Text_20_body"), Attributes::new(), true)
            .unwrap();
        let standard = registry.declare("Standard", None, Attributes::new(), false).unwrap();
        let child = registry
            .declare("Child", Some("Text_20_body"), Attributes::new(), false)
            .unwrap();

        assert_eq!(registry.display_name(body, false), "Text body");
        assert_eq!(registry.display_name(p1, false), "Text body");
        assert_eq!(registry.display_name(p1, true), "P1");
        assert_eq!(registry.display_name(standard, false), "Standard");
        // Named styles never borrow their parent's display name
        assert_eq!(registry.display_name(child, false), "Child");
    }

    #[test]
    fn test_header_level() {
        let mut registry = StyleRegistry::new();
        let explicit = registry
            .declare("H", None, props(&[(OUTLINE_LEVEL, "3")]), false)
            .unwrap();
        let by_name = registry
            .declare("Heading_20_2", None, props(&[(DISPLAY_NAME, "Heading 2")]), false)
            .unwrap();
        let auto = registry.declare("P7", Some("H"), Attributes::new(), true).unwrap();
        let plain = registry.declare("Standard", None, Attributes::new(), false).unwrap();

        assert_eq!(registry.header_level(explicit), Some(3));
        assert_eq!(registry.header_level(by_name), Some(2));
        assert_eq!(registry.header_level(auto), Some(3));
        assert_eq!(registry.header_level(plain), None);
    }

    #[test]
    fn test_page_break_cascades() {
        let mut registry = StyleRegistry::new();
        registry
            .declare("Chapter", None, props(&[(BREAK_BEFORE, "page")]), false)
            .unwrap();
        let p = registry.declare("P2", Some("Chapter"), Attributes::new(), true).unwrap();
        assert!(registry.has_page_break_before(p));
    }

    #[test]
    fn test_parse_named_styles() {
        let mut registry = StyleRegistry::new();
        registry
            .parse_styles(minimal_styles_xml().as_bytes(), false)
            .unwrap();

        let body = registry.named("Text_20_body").unwrap();
        assert_eq!(registry.display_name(body, false), "Text body");
        assert_eq!(registry.alignment(body, false), Some("justify"));
        assert!(!registry.get(body).automatic);

        let h1 = registry.named("Heading_20_1").unwrap();
        assert_eq!(registry.header_level(h1), Some(1));
        assert!(registry.is_bold(h1, false));
    }

    #[test]
    fn test_parse_automatic_styles() {
        let mut registry = StyleRegistry::new();
        registry
            .parse_styles(minimal_styles_xml().as_bytes(), false)
            .unwrap();
        let content = content_xml(
            concat!(
                r#"<style:style style:name="P1" style:family="paragraph" style:parent-style-name="Text_20_body">"#,
                r#"<style:paragraph-properties fo:text-align="center" fo:break-before="page"/>"#,
                r#"<style:text-properties fo:font-style="italic"/>"#,
                r#"</style:style>"#,
                r#"<style:style style:name="T1" style:family="text"><style:text-properties fo:font-weight="bold"/></style:style>"#,
            ),
            "",
        );
        registry.parse_styles(content.as_bytes(), true).unwrap();

        let p1 = registry.lookup("P1").unwrap();
        assert!(registry.get(p1).automatic);
        assert_eq!(registry.alignment(p1, false), Some("center"));
        assert!(registry.has_page_break_before(p1));
        assert!(registry.is_italic(p1, true));
        assert_eq!(registry.display_name(p1, false), "Text body");

        let t1 = registry.lookup("T1").unwrap();
        assert!(registry.is_bold(t1, false));
    }

    #[test]
    fn test_parse_list_styles() {
        let xml = styles_xml(concat!(
            r#"<text:list-style style:name="Numbering_20_123" style:display-name="Numbering 123">"#,
            r#"<text:list-level-style-number text:level="1" style:num-format="1"><style:list-level-properties/></text:list-level-style-number>"#,
            r#"<text:list-level-style-bullet text:level="2" text:bullet-char="-"><style:text-properties fo:font-weight="bold"/></text:list-level-style-bullet>"#,
            r#"</text:list-style>"#,
        ));
        let mut registry = StyleRegistry::new();
        registry.parse_styles(xml.as_bytes(), false).unwrap();

        let id = registry.named("Numbering_20_123").unwrap();
        assert_eq!(registry.list_kind(id, 1).unwrap(), ListKind::Ordered);
        assert_eq!(registry.list_kind(id, 2).unwrap(), ListKind::Unordered);
        assert_eq!(registry.list_kind(id, 5).unwrap(), ListKind::Ordered);
        // Text properties inside a list level do not leak into the list style
        assert!(!registry.is_bold(id, false));
    }

    #[test]
    fn test_list_kind_missing() {
        let mut registry = StyleRegistry::new();
        let id = registry.declare("L9", None, Attributes::new(), true).unwrap();
        assert!(matches!(
            registry.list_kind(id, 1),
            Err(ConvertError::UnknownContentKind(_))
        ));
    }

    #[test]
    fn test_parse_nested_style_is_error() {
        let xml = styles_xml(concat!(
            r#"<style:style style:name="Outer" style:family="paragraph">"#,
            r#"<style:style style:name="Inner" style:family="paragraph"/>"#,
            r#"</style:style>"#,
        ));
        let mut registry = StyleRegistry::new();
        let err = registry.parse_styles(xml.as_bytes(), false).unwrap_err();
        assert!(matches!(err, ConvertError::NestedStyle(_)));
    }

    #[test]
    fn test_parse_duplicate_is_error() {
        let xml = styles_xml(concat!(
            r#"<style:style style:name="Same" style:family="paragraph"/>"#,
            r#"<style:style style:name="Same" style:family="paragraph"/>"#,
        ));
        let mut registry = StyleRegistry::new();
        let err = registry.parse_styles(xml.as_bytes(), false).unwrap_err();
        assert!(matches!(err, ConvertError::DuplicateStyle(ref n) if n == "Same"));
    }

    #[test]
    fn test_parse_style_without_name() {
        let xml = styles_xml(r#"<style:style style:family="paragraph"/>"#);
        let mut registry = StyleRegistry::new();
        let err = registry.parse_styles(xml.as_bytes(), false).unwrap_err();
        assert!(matches!(err, ConvertError::MissingAttribute { .. }));
    }

    #[test]
    fn test_find_by_display_name_prefers_named() {
        let mut registry = StyleRegistry::new();
        let auto = registry
            .declare("A1", None, props(&[(DISPLAY_NAME, "Quote")]), true)
            .unwrap();
        let named = registry
            .declare("Quotations", None, props(&[(DISPLAY_NAME, "Quote")]), false)
            .unwrap();
        assert_ne!(auto, named);
        assert_eq!(registry.find_by_display_name("Quote"), Some(named));
        assert_eq!(registry.find_by_display_name("Missing"), None);
    }

    #[test]
    fn test_css_properties_order() {
        let mut registry = StyleRegistry::new();
        registry
            .declare("Base", None, props(&[(FONT_WEIGHT, "bold")]), false)
            .unwrap();
        let id = registry
            .declare(
                "Child",
                Some("Base"),
                props(&[(TEXT_ALIGN, "end"), (FONT_STYLE, "italic")]),
                false,
            )
            .unwrap();
        assert_eq!(
            registry.css_properties(id),
            vec![
                ("text-align", "right".to_string()),
                ("font-style", "italic".to_string()),
                ("font-weight", "bold".to_string()),
            ]
        );
    }
}
