//! Parent tree aggregation.
//!
//! The parent tree is the reverse index from content identifier to owning
//! structure element, one array per page, keyed by the page's
//! `StructParents` ordinal in a `/Nums` number tree
//! (ISO 32000-1:2008 Section 14.7.4.4).

use crate::object::{Object, ObjectRef};
use crate::store::DocumentStore;
use std::collections::HashMap;

/// Accumulates per-page parent arrays in document order.
#[derive(Debug, Default)]
pub struct ParentTreeIndex {
    entries: Vec<(usize, Vec<ObjectRef>)>,
}

impl ParentTreeIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page's parent array.
    ///
    /// `refs[k]` must be the element owning content identifier `k`; the
    /// array length equals the page's content-item count (zero is valid).
    pub fn push_page(&mut self, page_index: usize, refs: Vec<ObjectRef>) {
        self.entries.push((page_index, refs));
    }

    /// Number of pages indexed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any page has been indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The parent array recorded for a page, if any.
    pub fn page_refs(&self, page_index: usize) -> Option<&[ObjectRef]> {
        self.entries
            .iter()
            .find(|(idx, _)| *idx == page_index)
            .map(|(_, refs)| refs.as_slice())
    }

    /// Register the flattened `/Nums` number tree.
    pub fn register(&self, store: &mut DocumentStore) -> ObjectRef {
        let mut nums = Vec::with_capacity(self.entries.len() * 2);
        for (page_index, refs) in &self.entries {
            nums.push(Object::Integer(*page_index as i64));
            nums.push(Object::Array(
                refs.iter().map(|r| Object::Reference(*r)).collect(),
            ));
        }

        let mut dict = HashMap::new();
        dict.insert("Nums".to_string(), Object::Array(nums));
        store.register(Object::Dictionary(dict))
    }
}
