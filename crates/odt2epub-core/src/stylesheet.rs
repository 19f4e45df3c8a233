//! Stylesheet generation
//!
//! Starts from a baseline selector table (the built-in `baseline.css`,
//! or a replacement supplied by configuration) and overlays the resolved
//! properties of every style the renderer actually used. Output order
//! does not depend on the order styles were discovered in.

use std::collections::BTreeMap;

use crate::styles::{StyleId, StyleRegistry};

/// Built-in baseline selectors
pub const BASELINE_CSS: &str = include_str!("baseline.css");

/// CSS class name derived from a style display name
///
/// Lowercase, with spaces replaced by `_`. Other characters are kept, so
/// `Drop-Cap` and `Drop Cap` stay distinct classes.
pub fn css_class_name(display_name: &str) -> String {
    display_name.to_lowercase().replace(' ', "_")
}

/// A style referenced while rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsedStyle {
    /// Style of the first block seen with this display name
    pub style: StyleId,
    /// Heading level, when the style was used by a heading
    pub header_level: Option<u8>,
}

/// Styles referenced while rendering, keyed by display name
#[derive(Debug, Clone, Default)]
pub struct UsedStyles {
    entries: BTreeMap<String, UsedStyle>,
}

impl UsedStyles {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a style used by a paragraph
    pub fn record_paragraph(&mut self, display_name: &str, style: StyleId) {
        self.entries
            .entry(display_name.to_string())
            .or_insert(UsedStyle {
                style,
                header_level: None,
            });
    }

    /// Record a style used by a heading
    pub fn record_header(&mut self, display_name: &str, style: StyleId, level: u8) {
        let entry = self
            .entries
            .entry(display_name.to_string())
            .or_insert(UsedStyle {
                style,
                header_level: None,
            });
        entry.header_level.get_or_insert(level);
    }

    /// Whether a display name was recorded
    pub fn contains(&self, display_name: &str) -> bool {
        self.entries.contains_key(display_name)
    }

    /// Number of distinct display names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in display-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UsedStyle)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Selector table being assembled
#[derive(Debug, Clone, Default)]
pub struct StylesheetGenerator {
    selectors: BTreeMap<String, BTreeMap<String, String>>,
}

impl StylesheetGenerator {
    /// Start from the built-in baseline
    pub fn new() -> Self {
        Self::from_baseline(BASELINE_CSS)
    }

    /// Start from a baseline stylesheet
    ///
    /// The format is line oriented: `selector {`, one `property: value;`
    /// per line, `}`. Lines that do not fit are skipped with a warning.
    pub fn from_baseline(css: &str) -> Self {
        let mut selectors: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (index, raw) in css.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with("/*") {
                continue;
            }

            if let Some(pos) = line.find('{').filter(|p| *p > 0) {
                let selector = line[..pos].trim().to_string();
                selectors.entry(selector.clone()).or_default();
                current = Some(selector);
            } else if line.contains('}') {
                current = None;
            } else if let Some(pos) = line.find(':').filter(|p| *p > 0) {
                let Some(selector) = current.as_ref() else {
                    tracing::warn!("Baseline stylesheet line {} outside a selector: {}", line_number, line);
                    continue;
                };
                let property = line[..pos].trim().to_string();
                let value = line[pos + 1..].trim();
                match value.strip_suffix(';') {
                    Some(value) => {
                        selectors
                            .entry(selector.clone())
                            .or_default()
                            .insert(property, value.trim().to_string());
                    }
                    None => {
                        tracing::warn!("Baseline stylesheet line {} lacks a semicolon: {}", line_number, line);
                    }
                }
            } else {
                tracing::warn!("Baseline stylesheet line {} not understood: {}", line_number, line);
            }
        }

        Self { selectors }
    }

    /// Overlay the used styles onto the baseline
    ///
    /// Headings map to `h<level>`, the body style to `p`, everything else
    /// to a class selector. Document values win over baseline values.
    pub fn merge(&mut self, registry: &StyleRegistry, used: &UsedStyles, body_style: &str) {
        if let Some(body) = registry.find_by_display_name(body_style) {
            self.overlay("p".to_string(), registry, body);
        }

        for (display_name, entry) in used.iter() {
            let style = registry
                .find_by_display_name(display_name)
                .unwrap_or(entry.style);

            let selector = match entry.header_level {
                Some(level) => {
                    let level = registry.header_level(style).unwrap_or(level).clamp(1, 6);
                    format!("h{}", level)
                }
                None if display_name == body_style => continue,
                None => format!(".{}", css_class_name(display_name)),
            };
            tracing::debug!("Style {:?} exported as {}", display_name, selector);
            self.overlay(selector, registry, style);
        }
    }

    fn overlay(&mut self, selector: String, registry: &StyleRegistry, style: StyleId) {
        let properties = self.selectors.entry(selector).or_default();
        for (property, value) in registry.css_properties(style) {
            properties.insert(property.to_string(), value);
        }
    }

    /// Properties of a selector, if present
    pub fn selector(&self, selector: &str) -> Option<&BTreeMap<String, String>> {
        self.selectors.get(selector)
    }

    /// Serialize the stylesheet
    pub fn render(&self) -> String {
        let mut ordered: Vec<&String> = self.selectors.keys().collect();
        ordered.sort_by(|a, b| (selector_rank(a), *a).cmp(&(selector_rank(b), *b)));

        let mut css = String::new();
        for selector in ordered {
            css.push_str(selector);
            css.push_str(" {\n");
            for (property, value) in &self.selectors[selector] {
                css.push_str(&format!("  {}: {};\n", property, value));
            }
            css.push_str("}\n\n");
        }
        css
    }
}

/// Heading selectors, then `p`, then element selectors, then classes
fn selector_rank(selector: &str) -> u8 {
    let is_heading = selector
        .strip_prefix('h')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()));
    if is_heading {
        0
    } else if selector == "p" {
        1
    } else if selector.starts_with('.') {
        3
    } else {
        2
    }
}

/// Generate the stylesheet for a rendered document
pub fn generate(
    registry: &StyleRegistry,
    used: &UsedStyles,
    body_style: &str,
    baseline: Option<&str>,
) -> String {
    let mut generator = match baseline {
        Some(css) => StylesheetGenerator::from_baseline(css),
        None => StylesheetGenerator::new(),
    };
    generator.merge(registry, used, body_style);
    generator.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styles::{DISPLAY_NAME, FONT_STYLE, OUTLINE_LEVEL, TEXT_ALIGN};
    use crate::xml::Attributes;

    fn props(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn registry() -> (StyleRegistry, StyleId, StyleId, StyleId) {
        let mut registry = StyleRegistry::new();
        let body = registry
            .declare(
                "Text_20_body",
                None,
                props(&[(DISPLAY_NAME, "Text body"), (TEXT_ALIGN, "justify")]),
                false,
            )
            .unwrap();
        let heading = registry
            .declare(
                "Heading_20_1",
                None,
                props(&[(DISPLAY_NAME, "Heading 1"), (OUTLINE_LEVEL, "1"), (TEXT_ALIGN, "start")]),
                false,
            )
            .unwrap();
        let quote = registry
            .declare(
                "Quotations",
                None,
                props(&[(DISPLAY_NAME, "Block Quote"), (FONT_STYLE, "italic")]),
                false,
            )
            .unwrap();
        (registry, body, heading, quote)
    }

    #[test]
    fn test_css_class_name() {
        assert_eq!(css_class_name("Text body"), "text_body");
        assert_eq!(css_class_name("Drop-Cap"), "drop-cap");
        assert_ne!(css_class_name("A-B"), css_class_name("A B"));
    }

    #[test]
    fn test_baseline_parsing() {
        let generator = StylesheetGenerator::from_baseline(
            "p {\n  margin: 0;\n  broken value\n  color: red\n}\nstray: 1;\n",
        );
        let p = generator.selector("p").unwrap();
        assert_eq!(p.get("margin").map(String::as_str), Some("0"));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_builtin_baseline_loads() {
        let generator = StylesheetGenerator::new();
        assert!(generator.selector("p").is_some());
        assert!(generator.selector(".footnotes").is_some());
    }

    #[test]
    fn test_document_values_override_baseline() {
        let (registry, body, heading, quote) = registry();
        let mut used = UsedStyles::new();
        used.record_header("Heading 1", heading, 1);
        used.record_paragraph("Text body", body);
        used.record_paragraph("Block Quote", quote);

        let mut generator = StylesheetGenerator::from_baseline("h1 {\n  text-align: center;\n  margin: 1em;\n}\n");
        generator.merge(&registry, &used, "Text body");

        let h1 = generator.selector("h1").unwrap();
        assert_eq!(h1.get("text-align").map(String::as_str), Some("left"));
        assert_eq!(h1.get("margin").map(String::as_str), Some("1em"));
        assert_eq!(
            generator.selector("p").unwrap().get("text-align").map(String::as_str),
            Some("justify")
        );
        assert_eq!(
            generator
                .selector(".block_quote")
                .unwrap()
                .get("font-style")
                .map(String::as_str),
            Some("italic")
        );
        assert!(generator.selector(".text_body").is_none());
    }

    #[test]
    fn test_selector_order() {
        let (registry, body, heading, quote) = registry();
        let mut used = UsedStyles::new();
        used.record_paragraph("Block Quote", quote);
        used.record_header("Heading 1", heading, 1);
        used.record_paragraph("Text body", body);

        let css = generate(&registry, &used, "Text body", Some("body {\n  margin: 0;\n}\n.zeta {\n}\n"));
        let order: Vec<&str> = css
            .lines()
            .filter(|l| l.ends_with('{'))
            .map(|l| l.trim_end_matches(" {"))
            .collect();
        assert_eq!(order, vec!["h1", "p", "body", ".block_quote", ".zeta"]);
    }

    #[test]
    fn test_discovery_order_does_not_matter() {
        let (registry, body, heading, quote) = registry();

        let mut first = UsedStyles::new();
        first.record_paragraph("Text body", body);
        first.record_paragraph("Block Quote", quote);
        first.record_header("Heading 1", heading, 1);

        let mut second = UsedStyles::new();
        second.record_header("Heading 1", heading, 1);
        second.record_paragraph("Block Quote", quote);
        second.record_paragraph("Text body", body);

        let a = generate(&registry, &first, "Text body", None);
        let b = generate(&registry, &second, "Text body", None);
        assert_eq!(a, b);
        assert_eq!(a, generate(&registry, &first, "Text body", None));
    }

    #[test]
    fn test_properties_sorted() {
        let (registry, _, _, quote) = registry();
        let mut used = UsedStyles::new();
        used.record_paragraph("Block Quote", quote);
        let css = generate(&registry, &used, "Text body", Some(".block_quote {\n  z-index: 1;\n  color: red;\n}\n"));
        assert!(css.contains(".block_quote {\n  color: red;\n  font-style: italic;\n  z-index: 1;\n}\n"));
    }
}
