//! Structure tree builder.
//!
//! Walks canonical semantic nodes and materializes the logical structure
//! hierarchy in the document store: a StructTreeRoot holding a single
//! `Document` element, one `Sect` element per page, and the recursive
//! element tree beneath it. Content identifiers (MCIDs) are assigned from
//! one shared counter per page and recorded in the page context so the
//! parent tree can be built afterwards.
//!
//! PDF Spec: ISO 32000-1:2008, Section 14.7 (Logical Structure).

use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use crate::semantic::SemanticNode;
use crate::store::DocumentStore;
use std::collections::BTreeSet;

/// Layout parameters for the synthesized text column.
#[derive(Debug, Clone, Copy)]
pub struct TextLayout {
    /// Font size of the invisible text runs (points)
    pub font_size: f64,
    /// Distance between consecutive lines (points)
    pub line_height: f64,
    /// Left margin of the column (points)
    pub margin_x: f64,
    /// Distance from the top edge to the first baseline (points)
    pub top_margin: f64,
    /// Extra gap after each content item (points)
    pub item_gap: f64,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            line_height: 14.0,
            margin_x: 36.0,
            top_margin: 48.0,
            item_gap: 4.0,
        }
    }
}

/// One invisible text run bound to a structure element.
///
/// Exactly one content item exists per leaf text-bearing element; `lines`
/// always holds at least one entry.
#[derive(Debug, Clone)]
pub struct ContentItem {
    /// Content identifier, contiguous per page starting at 0
    pub mcid: u32,
    /// Structure tag of the owning element
    pub tag: String,
    /// Non-empty trimmed text lines (a single space when none remain)
    pub lines: Vec<String>,
    /// Replacement text for the whole run
    pub actual_text: String,
    /// Language, if known
    pub lang: Option<String>,
    /// Left edge of the run
    pub x: f64,
    /// Baseline of the first line
    pub y: f64,
    /// Font size
    pub font_size: f64,
    /// Line advance
    pub line_height: f64,
}

/// Per-page build state threaded through the recursive walk.
///
/// Holds the shared MCID counter, the descending vertical cursor, the
/// collected content items, and the element reference owning each MCID.
#[derive(Debug)]
pub struct PageContext {
    /// Index of the page in the document
    pub page_index: usize,
    /// Reference to the page object
    pub page_ref: ObjectRef,
    /// The page's `Sect` structure element
    pub elem_ref: ObjectRef,
    /// The kids array of the page element
    pub kids_ref: ObjectRef,
    /// Content items in identifier order
    pub items: Vec<ContentItem>,
    /// Element owning each MCID; index equals the identifier
    pub parent_refs: Vec<ObjectRef>,
    next_mcid: u32,
    next_y: f64,
    layout: TextLayout,
}

impl PageContext {
    /// Number of content items collected so far.
    pub fn content_count(&self) -> usize {
        self.items.len()
    }

    /// Record a content-bearing element and return its identifier.
    ///
    /// Identifiers index directly into `parent_refs`, so assignment and
    /// recording happen in one step to keep them contiguous.
    fn assign_mcid(&mut self, elem_ref: ObjectRef) -> u32 {
        let mcid = self.next_mcid;
        debug_assert_eq!(self.parent_refs.len() as u32, mcid);
        self.parent_refs.push(elem_ref);
        self.next_mcid += 1;
        mcid
    }

    /// Build the content item for a node at the current cursor position and
    /// advance the cursor past it.
    fn push_item(&mut self, node: &SemanticNode, mcid: u32) {
        let text = node
            .actual_text
            .clone()
            .or_else(|| node.text.clone())
            .unwrap_or_default();
        let mut lines: Vec<String> = text
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if lines.is_empty() {
            lines.push(" ".to_string());
        }

        let y = self.next_y;
        self.next_y -= self.layout.line_height * lines.len() as f64 + self.layout.item_gap;

        self.items.push(ContentItem {
            mcid,
            tag: node.tag.clone(),
            lines,
            actual_text: text,
            lang: node.lang.clone(),
            x: self.layout.margin_x,
            y,
            font_size: self.layout.font_size,
            line_height: self.layout.line_height,
        });
    }
}

/// Builds the logical structure tree for a document, page by page.
pub struct StructureTreeBuilder {
    root_ref: ObjectRef,
    document_ref: ObjectRef,
    document_kids: ObjectRef,
    used_tags: BTreeSet<String>,
}

impl StructureTreeBuilder {
    /// Create the structure tree root and `Document` element, and mark the
    /// catalog as tagged (`StructTreeRoot` + `MarkInfo`).
    pub fn new(store: &mut DocumentStore) -> Result<Self> {
        let root_kids = store.register_array();
        let root = store.register(Object::dict());
        store.set_field(root, "Type", Object::Name("StructTreeRoot".to_string()))?;
        store.set_field(root, "K", Object::Reference(root_kids))?;

        let document_kids = store.register_array();
        let document = store.register(Object::dict());
        store.set_field(document, "Type", Object::Name("StructElem".to_string()))?;
        store.set_field(document, "S", Object::Name("Document".to_string()))?;
        store.set_field(document, "P", Object::Reference(root))?;
        store.set_field(document, "K", Object::Reference(document_kids))?;
        store.push(root_kids, Object::Reference(document))?;

        let catalog = store.catalog_ref();
        store.set_field(catalog, "StructTreeRoot", Object::Reference(root))?;
        let mut mark_info = Object::dict();
        if let Some(dict) = mark_info.as_dict_mut() {
            dict.insert("Marked".to_string(), Object::Boolean(true));
        }
        store.set_field(catalog, "MarkInfo", mark_info)?;

        let mut used_tags = BTreeSet::new();
        used_tags.insert("Document".to_string());

        Ok(Self {
            root_ref: root,
            document_ref: document,
            document_kids,
            used_tags,
        })
    }

    /// Reference to the structure tree root.
    pub fn root_ref(&self) -> ObjectRef {
        self.root_ref
    }

    /// Tags referenced by the tree so far.
    pub fn used_tags(&self) -> &BTreeSet<String> {
        &self.used_tags
    }

    /// Mutable access for components that register tags themselves.
    pub fn used_tags_mut(&mut self) -> &mut BTreeSet<String> {
        &mut self.used_tags
    }

    /// Build the structure subtree for one page.
    ///
    /// Creates the page's `Sect` element under `Document`, stamps the page
    /// dict with `StructParents`, and walks the nodes in order.
    pub fn build_page(
        &mut self,
        store: &mut DocumentStore,
        page_index: usize,
        nodes: &[SemanticNode],
        layout: TextLayout,
    ) -> Result<PageContext> {
        let page_ref = store.page_ref(page_index)?;
        store.set_field(page_ref, "StructParents", Object::Integer(page_index as i64))?;

        let kids_ref = store.register_array();
        let elem_ref = store.register(Object::dict());
        store.set_field(elem_ref, "Type", Object::Name("StructElem".to_string()))?;
        store.set_field(elem_ref, "S", Object::Name("Sect".to_string()))?;
        store.set_field(elem_ref, "Pg", Object::Reference(page_ref))?;
        store.set_field(elem_ref, "P", Object::Reference(self.document_ref))?;
        store.set_field(elem_ref, "K", Object::Reference(kids_ref))?;
        store.push(self.document_kids, Object::Reference(elem_ref))?;
        self.used_tags.insert("Sect".to_string());

        let height = store.page_height(page_index)?;
        let mut ctx = PageContext {
            page_index,
            page_ref,
            elem_ref,
            kids_ref,
            items: Vec::new(),
            parent_refs: Vec::new(),
            next_mcid: 0,
            next_y: height - layout.top_margin,
            layout,
        };

        for node in nodes {
            self.build_node(store, node, elem_ref, kids_ref, &mut ctx)?;
        }

        Ok(ctx)
    }

    /// Recursively create a structure element for a node.
    ///
    /// Returns `None` for `Artifact` nodes, which produce neither an element
    /// nor a content item. An element holds either a kids array or a direct
    /// MCID, never both: when a node carries both children and inline text,
    /// the text moves into a synthesized leading `Span` child.
    fn build_node(
        &mut self,
        store: &mut DocumentStore,
        node: &SemanticNode,
        parent_ref: ObjectRef,
        parent_kids: ObjectRef,
        ctx: &mut PageContext,
    ) -> Result<Option<ObjectRef>> {
        if node.tag == "Artifact" {
            return Ok(None);
        }

        self.used_tags.insert(node.tag.clone());

        let mut dict = std::collections::HashMap::new();
        dict.insert("Type".to_string(), Object::Name("StructElem".to_string()));
        dict.insert("S".to_string(), Object::Name(node.tag.clone()));
        dict.insert("P".to_string(), Object::Reference(parent_ref));
        dict.insert("Pg".to_string(), Object::Reference(ctx.page_ref));

        if let Some(alt) = &node.alt_text {
            dict.insert("Alt".to_string(), Object::text_string(alt));
        }
        if let Some(lang) = &node.lang {
            dict.insert("Lang".to_string(), Object::String(lang.as_bytes().to_vec()));
        }
        if node.tag == "Link" {
            if let Some(url) = &node.link_url {
                let mut action = std::collections::HashMap::new();
                action.insert("S".to_string(), Object::Name("URI".to_string()));
                action.insert("URI".to_string(), Object::String(url.as_bytes().to_vec()));
                dict.insert("A".to_string(), Object::Dictionary(action));
            }
        }
        if node.tag == "TH" {
            if let Some(scope) = node.scope {
                dict.insert("Scope".to_string(), Object::Name(scope.as_pdf_name().to_string()));
            }
        }

        let has_children = !node.children.is_empty();
        let has_text = node.has_inline_text();

        let kids_ref = if has_children {
            let kids = store.register_array();
            dict.insert("K".to_string(), Object::Reference(kids));
            Some(kids)
        } else {
            None
        };

        let takes_content = has_text && kids_ref.is_none();
        if takes_content {
            dict.insert("K".to_string(), Object::Integer(ctx.next_mcid as i64));
        }

        let elem_ref = store.register(Object::Dictionary(dict));
        store.push(parent_kids, Object::Reference(elem_ref))?;

        if takes_content {
            let mcid = ctx.assign_mcid(elem_ref);
            ctx.push_item(node, mcid);
        }

        if let Some(kids) = kids_ref {
            if has_text {
                // The implicit Span absorbs the parent's inline text so it is
                // not lost; alt and scope stay on the parent.
                let span = SemanticNode {
                    tag: "Span".to_string(),
                    text: node.text.clone(),
                    actual_text: node.actual_text.clone(),
                    lang: node.lang.clone(),
                    link_url: node.link_url.clone(),
                    ..Default::default()
                };
                self.build_node(store, &span, elem_ref, kids, ctx)?;
            }
            for child in &node.children {
                self.build_node(store, child, elem_ref, kids, ctx)?;
            }
        }

        Ok(Some(elem_ref))
    }

    /// Install the parent tree and role map on the structure root.
    pub fn finish(
        self,
        store: &mut DocumentStore,
        parent_tree_ref: ObjectRef,
        role_map_ref: ObjectRef,
    ) -> Result<()> {
        store.set_field(self.root_ref, "ParentTree", Object::Reference(parent_tree_ref))?;
        store.set_field(self.root_ref, "RoleMap", Object::Reference(role_map_ref))?;
        Ok(())
    }
}

/// Read back the structure type of an element, for assertions and tooling.
pub fn element_tag(store: &DocumentStore, elem_ref: ObjectRef) -> Result<String> {
    let obj = store.get(elem_ref)?;
    obj.as_dict()
        .and_then(|d| d.get("S"))
        .and_then(Object::as_name)
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidObjectType {
            expected: "StructElem".to_string(),
            found: obj.type_name().to_string(),
        })
}
