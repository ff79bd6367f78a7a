//! Semantic node model and normalization of raw classifier output.
//!
//! The classifier is an unreliable external collaborator: it may return
//! valid JSON describing a node tree, truncated JSON, a bare object, or
//! arbitrary text. Everything here parses defensively — malformed entries
//! and wrong-typed fields are dropped or treated as absent, never surfaced
//! as errors.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

lazy_static! {
    /// Leading label token of a flat list item: bullet glyph, dash, asterisk,
    /// or an alphanumeric marker such as "1." or "a.".
    static ref LIST_LABEL: Regex =
        Regex::new(r"^\s*([\u{2022}\-\*\dA-Za-z.]+)\s+(.*)$").unwrap();
}

/// Header cell scope for `TH` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// The cell heads its row
    Row,
    /// The cell heads its column
    Column,
}

impl Scope {
    /// The PDF name this scope is written as.
    pub fn as_pdf_name(&self) -> &'static str {
        match self {
            Scope::Row => "Row",
            Scope::Column => "Column",
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.as_str() {
            Some("Row") => Some(Scope::Row),
            Some("Column") => Some(Scope::Column),
            _ => None,
        }
    }
}

/// A canonical semantic node, as produced by normalization.
///
/// `tag` is always non-empty. Children are ordered. Nodes tagged "Artifact"
/// survive normalization but are excluded from the structure tree by the
/// builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SemanticNode {
    /// Structure tag (role name), non-empty
    pub tag: String,
    /// Inline text carried by the node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Replacement text read by assistive technology
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_text: Option<String>,
    /// BCP 47 language tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Alternate description (figures, links)
    #[serde(rename = "alt", skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    /// Link target for `Link` nodes
    #[serde(rename = "url", skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    /// Header scope for `TH` nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Explicit list label override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Ordered children
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SemanticNode>,
}

impl SemanticNode {
    /// Create a node with just a tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Create a node with a tag and inline text.
    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Whether the node carries non-empty trimmed inline text.
    pub fn has_inline_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// Parse raw classifier output into JSON node descriptors.
///
/// Non-JSON or non-array output becomes an empty list, never an error.
pub fn parse_classifier_output(raw: &str) -> Vec<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(nodes)) => nodes,
        Ok(other) => {
            log::warn!("classifier output is not an array (got {})", json_type_name(&other));
            Vec::new()
        },
        Err(err) => {
            log::warn!("classifier output is not valid JSON: {}", err);
            Vec::new()
        },
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalize a list of raw node descriptors, dropping unusable entries.
pub fn normalize(nodes: &[Value]) -> Vec<SemanticNode> {
    nodes.iter().filter_map(normalize_node).collect()
}

/// Normalize a single raw node descriptor.
///
/// Returns `None` for non-objects and entries with an empty or missing tag.
/// Wrong-typed fields are treated as absent. Flat `LI` nodes get synthesized
/// `Lbl`/`LBody` children; flat `L`/`Table`/`TR` nodes get a `Span` child so
/// their text is not lost inside a grouping element.
pub fn normalize_node(value: &Value) -> Option<SemanticNode> {
    let obj = value.as_object()?;

    let tag = obj.get("tag")?.as_str()?.trim();
    if tag.is_empty() {
        return None;
    }

    let mut text = str_field(obj, "text");
    let actual_text = str_field(obj, "actualText");
    let lang = trimmed_field(obj, "lang");
    let alt_text = str_field(obj, "alt");
    let link_url = trimmed_field(obj, "url");
    let scope = obj.get("scope").and_then(Scope::from_value);
    let label = str_field(obj, "label");

    let mut children = match obj.get("children").and_then(Value::as_array) {
        Some(raw) => normalize(raw),
        None => Vec::new(),
    };

    // When children are synthesized from a flat node's text, the text moves
    // into them; it must not survive on the parent as a second copy.
    if tag == "LI" && children.is_empty() {
        if let Some(flat) = text.as_deref().filter(|t| !t.is_empty()) {
            let (lbl, body) = split_list_label(flat, label.as_deref());
            children = vec![
                SemanticNode::with_text("Lbl", lbl),
                SemanticNode::with_text("LBody", body),
            ];
            text = None;
        }
    }

    if matches!(tag, "L" | "Table" | "TR") && children.is_empty() {
        if let Some(flat) = text.take().filter(|t| !t.is_empty()) {
            children = vec![SemanticNode::with_text("Span", flat)];
        }
    }

    Some(SemanticNode {
        tag: tag.to_string(),
        text,
        actual_text,
        lang,
        alt_text,
        link_url,
        scope,
        label,
        children,
    })
}

/// Split a flat list item's text into a label token and body.
///
/// Falls back to a bullet glyph when no marker pattern matches; an explicit
/// label always wins but still consumes the matched marker from the body.
fn split_list_label(text: &str, label: Option<&str>) -> (String, String) {
    match LIST_LABEL.captures(text) {
        Some(caps) => {
            let lbl = label.unwrap_or(&caps[1]).to_string();
            (lbl, caps[2].to_string())
        },
        None => {
            let lbl = label.unwrap_or("\u{2022}").to_string();
            (lbl, text.to_string())
        },
    }
}

/// Build the fallback paragraph used when a page yields no usable nodes.
///
/// Returns `None` when the raw text itself is empty; the page then gets a
/// structural container but no content items.
pub fn fallback_paragraph(raw_text: &str) -> Option<SemanticNode> {
    let trimmed = raw_text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(SemanticNode::with_text("P", trimmed))
    }
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn trimmed_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drops_non_objects_and_empty_tags() {
        let raw = vec![
            json!("just a string"),
            json!(42),
            json!(null),
            json!({"text": "no tag"}),
            json!({"tag": "   "}),
            json!({"tag": "P", "text": "kept"}),
        ];
        let nodes = normalize(&raw);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].tag, "P");
    }

    #[test]
    fn test_wrong_typed_fields_treated_as_absent() {
        let raw = json!({
            "tag": "P",
            "text": 42,
            "lang": ["en"],
            "alt": {"nested": true},
            "children": "not an array"
        });
        let node = normalize_node(&raw).unwrap();
        assert_eq!(node.tag, "P");
        assert!(node.text.is_none());
        assert!(node.lang.is_none());
        assert!(node.alt_text.is_none());
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_lang_and_url_trimmed() {
        let raw = json!({"tag": "Link", "lang": "  ", "url": " https://example.com "});
        let node = normalize_node(&raw).unwrap();
        assert!(node.lang.is_none());
        assert_eq!(node.link_url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_li_label_split_numbered() {
        let raw = json!({"tag": "LI", "text": "1. First item"});
        let node = normalize_node(&raw).unwrap();
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].tag, "Lbl");
        assert_eq!(node.children[0].text.as_deref(), Some("1."));
        assert_eq!(node.children[1].tag, "LBody");
        assert_eq!(node.children[1].text.as_deref(), Some("First item"));
    }

    #[test]
    fn test_li_label_defaults_to_bullet() {
        let raw = json!({"tag": "LI", "text": "~!~ odd marker"});
        let node = normalize_node(&raw).unwrap();
        assert_eq!(node.children[0].text.as_deref(), Some("\u{2022}"));
        assert_eq!(node.children[1].text.as_deref(), Some("~!~ odd marker"));
    }

    #[test]
    fn test_li_explicit_label_wins() {
        let raw = json!({"tag": "LI", "text": "2. Second", "label": "b."});
        let node = normalize_node(&raw).unwrap();
        assert_eq!(node.children[0].text.as_deref(), Some("b."));
        assert_eq!(node.children[1].text.as_deref(), Some("Second"));
    }

    #[test]
    fn test_li_with_children_untouched() {
        let raw = json!({
            "tag": "LI",
            "text": "1. ignored split",
            "children": [{"tag": "LBody", "text": "explicit"}]
        });
        let node = normalize_node(&raw).unwrap();
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].tag, "LBody");
    }

    #[test]
    fn test_grouping_tags_get_span_child() {
        for tag in ["L", "Table", "TR"] {
            let raw = json!({"tag": tag, "text": "stray text"});
            let node = normalize_node(&raw).unwrap();
            assert_eq!(node.children.len(), 1, "tag {}", tag);
            assert_eq!(node.children[0].tag, "Span");
            assert_eq!(node.children[0].text.as_deref(), Some("stray text"));
        }
    }

    #[test]
    fn test_order_preserved() {
        let raw = vec![
            json!({"tag": "H1", "text": "a"}),
            json!({"tag": "P", "text": "b"}),
            json!({"tag": "P", "text": "c"}),
        ];
        let tags: Vec<_> = normalize(&raw).into_iter().map(|n| n.tag).collect();
        assert_eq!(tags, ["H1", "P", "P"]);
    }

    #[test]
    fn test_renormalization_is_idempotent() {
        let raw = vec![
            json!({"tag": "LI", "text": "1. First item"}),
            json!({"tag": "L", "text": "loose"}),
            json!({"tag": "P", "text": "plain", "lang": "en"}),
        ];
        let first = normalize(&raw);
        let round_tripped = serde_json::to_value(&first).unwrap();
        let second = normalize(round_tripped.as_array().unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_garbage_output() {
        assert!(parse_classifier_output("I'm sorry, I can't do that").is_empty());
        assert!(parse_classifier_output("{\"tag\": \"P\"}").is_empty());
        assert!(parse_classifier_output("").is_empty());
        assert_eq!(parse_classifier_output("[{\"tag\":\"P\"}]").len(), 1);
    }

    #[test]
    fn test_fallback_paragraph() {
        let node = fallback_paragraph("  Some fallback text.  ").unwrap();
        assert_eq!(node.tag, "P");
        assert_eq!(node.text.as_deref(), Some("Some fallback text."));
        assert!(fallback_paragraph("   ").is_none());
    }

    #[test]
    fn test_scope_parsing() {
        let raw = json!({"tag": "TH", "scope": "Row"});
        assert_eq!(normalize_node(&raw).unwrap().scope, Some(Scope::Row));
        let raw = json!({"tag": "TH", "scope": "Diagonal"});
        assert_eq!(normalize_node(&raw).unwrap().scope, None);
    }
}
