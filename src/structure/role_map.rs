//! Role map construction.
//!
//! Every tag referenced by the structure tree must resolve to a standard
//! role (ISO 32000-1:2008 Section 14.8.4). Standard tags map to themselves
//! (with the one historical alias `Quote` → `BlockQuote`); anything the
//! classifier invented maps to the generic inline role.

use crate::object::{Object, ObjectRef};
use crate::store::DocumentStore;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Fallback role for non-standard tags.
const FALLBACK_ROLE: &str = "Span";

/// Standard structure types and the role each maps to.
const STANDARD_ROLES: &[(&str, &str)] = &[
    ("Document", "Document"),
    ("Sect", "Sect"),
    ("Part", "Part"),
    ("Div", "Div"),
    ("P", "P"),
    ("Span", "Span"),
    ("Quote", "BlockQuote"),
    ("Link", "Link"),
    ("Annot", "Annot"),
    ("Figure", "Figure"),
    ("Formula", "Formula"),
    ("Caption", "Caption"),
    ("L", "L"),
    ("LI", "LI"),
    ("Lbl", "Lbl"),
    ("LBody", "LBody"),
    ("Table", "Table"),
    ("TR", "TR"),
    ("TH", "TH"),
    ("TD", "TD"),
    ("THead", "THead"),
    ("TBody", "TBody"),
    ("TFoot", "TFoot"),
    ("H1", "H1"),
    ("H2", "H2"),
    ("H3", "H3"),
    ("H4", "H4"),
    ("H5", "H5"),
    ("H6", "H6"),
];

/// The standard role a tag maps to, if it is a standard tag.
pub fn standard_role(tag: &str) -> Option<&'static str> {
    STANDARD_ROLES
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, role)| *role)
}

/// Build the role map for every used tag.
///
/// Guarantees an entry per tag; unknown tags fall back to `Span`.
pub fn build_role_map(used_tags: &BTreeSet<String>) -> BTreeMap<String, String> {
    used_tags
        .iter()
        .map(|tag| {
            let role = standard_role(tag).unwrap_or(FALLBACK_ROLE);
            (tag.clone(), role.to_string())
        })
        .collect()
}

/// Register the role map as a dictionary of name-to-name entries.
pub fn register_role_map(
    store: &mut DocumentStore,
    role_map: &BTreeMap<String, String>,
) -> ObjectRef {
    let mut dict = HashMap::new();
    for (tag, role) in role_map {
        dict.insert(tag.clone(), Object::Name(role.clone()));
    }
    store.register(Object::Dictionary(dict))
}
