//! Document outline (bookmarks) maintenance.
//!
//! Heading elements promoted to bookmarks give navigation to documents that
//! never had any. Items are appended flat under the outline root in
//! document order, linked through `First`/`Last`/`Prev`/`Next` with a
//! running `Count` (ISO 32000-1:2008 Section 12.3.3). Destinations are
//! whole-page `Fit` views.

use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use crate::semantic::SemanticNode;
use crate::store::DocumentStore;
use std::collections::HashMap;

/// Append one bookmark pointing at a page.
///
/// Creates the outline root on first use and maintains the sibling links
/// and count as items accumulate.
pub fn add_outline(store: &mut DocumentStore, title: &str, page_ref: ObjectRef) -> Result<ObjectRef> {
    let root = ensure_outline_root(store)?;

    let mut item = HashMap::new();
    item.insert("Title".to_string(), Object::text_string(title));
    item.insert("Parent".to_string(), Object::Reference(root));
    item.insert(
        "Dest".to_string(),
        Object::Array(vec![
            Object::Reference(page_ref),
            Object::Name("Fit".to_string()),
        ]),
    );
    let item_ref = store.register(Object::Dictionary(item));

    match store.field(root, "Last")?.and_then(|o| o.as_reference()) {
        Some(prev) => {
            store.set_field(prev, "Next", Object::Reference(item_ref))?;
            store.set_field(item_ref, "Prev", Object::Reference(prev))?;
        },
        None => {
            store.set_field(root, "First", Object::Reference(item_ref))?;
        },
    }
    store.set_field(root, "Last", Object::Reference(item_ref))?;

    let count = store
        .field(root, "Count")?
        .and_then(|o| o.as_integer())
        .unwrap_or(0);
    store.set_field(root, "Count", Object::Integer(count + 1))?;

    log::debug!("outline: added bookmark {:?}", title);
    Ok(item_ref)
}

/// Find or create the outline root under the catalog.
fn ensure_outline_root(store: &mut DocumentStore) -> Result<ObjectRef> {
    let catalog = store.catalog_ref();
    if let Some(root) = store.field(catalog, "Outlines")?.and_then(|o| o.as_reference()) {
        return Ok(root);
    }

    let mut dict = HashMap::new();
    dict.insert("Type".to_string(), Object::Name("Outlines".to_string()));
    dict.insert("Count".to_string(), Object::Integer(0));
    let root = store.register(Object::Dictionary(dict));
    store.set_field(catalog, "Outlines", Object::Reference(root))?;
    Ok(root)
}

/// Collect bookmark titles from a page's semantic nodes.
///
/// Top-level headings (`H1` and `H2`) with non-empty text qualify, in
/// document order, at any nesting depth.
pub fn collect_outline_candidates(nodes: &[SemanticNode]) -> Vec<String> {
    let mut titles = Vec::new();
    for node in nodes {
        if let Some(level) = heading_level(&node.tag) {
            if level <= 2 {
                if let Some(text) = node.text.as_deref() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        titles.push(trimmed.to_string());
                    }
                }
            }
        }
        titles.extend(collect_outline_candidates(&node.children));
    }
    titles
}

fn heading_level(tag: &str) -> Option<u32> {
    tag.strip_prefix('H')?.parse().ok()
}

/// Number of bookmarks recorded on the outline root.
pub fn outline_count(store: &DocumentStore) -> Result<i64> {
    match outline_root(store)? {
        Some(root) => Ok(store
            .field(root, "Count")?
            .and_then(|o| o.as_integer())
            .unwrap_or(0)),
        None => Ok(0),
    }
}

/// Bookmark titles walking the `First`/`Next` chain.
pub fn outline_titles_forward(store: &DocumentStore) -> Result<Vec<String>> {
    walk_titles(store, "First", "Next")
}

/// Bookmark titles walking the `Last`/`Prev` chain.
pub fn outline_titles_backward(store: &DocumentStore) -> Result<Vec<String>> {
    walk_titles(store, "Last", "Prev")
}

fn outline_root(store: &DocumentStore) -> Result<Option<ObjectRef>> {
    let catalog = store.catalog_ref();
    Ok(store.field(catalog, "Outlines")?.and_then(|o| o.as_reference()))
}

fn walk_titles(store: &DocumentStore, head: &str, step: &str) -> Result<Vec<String>> {
    let mut titles = Vec::new();
    let Some(root) = outline_root(store)? else {
        return Ok(titles);
    };

    let mut cursor = store.field(root, head)?.and_then(|o| o.as_reference());
    while let Some(item) = cursor {
        let title = store
            .field(item, "Title")?
            .and_then(|o| o.to_text())
            .ok_or_else(|| Error::InvalidObjectType {
                expected: "String".to_string(),
                found: "missing Title".to_string(),
            })?;
        titles.push(title);
        cursor = store.field(item, step)?.and_then(|o| o.as_reference());
    }
    Ok(titles)
}
