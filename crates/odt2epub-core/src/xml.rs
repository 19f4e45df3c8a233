//! Small helpers shared by the streaming XML parsers

use std::collections::HashMap;

use quick_xml::events::BytesStart;

use crate::error::{ConvertError, Result};

/// Attributes of one element, keyed by qualified name (e.g. `fo:text-align`)
pub type Attributes = HashMap<String, String>;

/// Collect every attribute of an element, unescaping values
pub(crate) fn collect_attrs(e: &BytesStart) -> Attributes {
    e.attributes()
        .filter_map(|a| a.ok())
        .filter_map(|a| {
            let key = String::from_utf8(a.key.as_ref().to_vec()).ok()?;
            let value = a.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

/// Fetch an attribute that must be present
pub(crate) fn required<'a>(attrs: &'a Attributes, element: &str, attribute: &str) -> Result<&'a str> {
    attrs
        .get(attribute)
        .map(String::as_str)
        .ok_or_else(|| ConvertError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        })
}

/// Element local name as a string slice
pub(crate) fn local_name(name: &[u8]) -> &str {
    std::str::from_utf8(name).unwrap_or("")
}
