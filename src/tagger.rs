//! Document tagging orchestrator.
//!
//! Drives the full accessibility pass over a document: one classifier call
//! per page, normalization of its output, structure-tree construction,
//! figure linking, content synthesis, and finally the parent tree and role
//! map. Pages must be applied strictly in document order because content
//! identifiers and the parent tree are keyed by page ordinal.

use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use crate::outline;
use crate::semantic;
use crate::store::DocumentStore;
use crate::structure::{
    build_role_map, link_page_figures, register_role_map, synthesize_page, ParentTreeIndex,
    StructureTreeBuilder, TextLayout,
};
use std::collections::HashMap;
use std::mem;

/// Resource name the invisible text layer draws its font under.
pub const FONT_RESOURCE: &str = "Helv";

/// Produces the semantic description of one page.
///
/// Implementations wrap whatever backend classifies the text (a model call,
/// a heuristic, a fixture). The return value is raw output; parsing and
/// recovery from malformed output belong to the tagger, not the classifier.
pub trait Classifier {
    /// Classify a page's extracted text into a node-tree description.
    fn classify_page(&self, page_text: &str) -> String;
}

/// Tuning knobs for a tagging run.
#[derive(Debug, Clone)]
pub struct TaggerConfig {
    /// Upper bound, in characters, on the excerpt sent to the classifier
    pub classifier_char_budget: usize,
    /// Maximum bookmark title length, in characters
    pub outline_title_max: usize,
    /// Layout of the synthesized text column
    pub layout: TextLayout,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            classifier_char_budget: 8000,
            outline_title_max: 60,
            layout: TextLayout::default(),
        }
    }
}

/// Clip text to the classifier budget without splitting a character.
pub fn classifier_excerpt(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Stateful tagging pass over one document.
///
/// Created once per document; pages are applied sequentially with
/// [`apply_page`](Self::apply_page) and the pass is sealed with
/// [`finish`](Self::finish).
pub struct DocumentTagger {
    builder: StructureTreeBuilder,
    parent_tree: ParentTreeIndex,
    font_ref: ObjectRef,
    config: TaggerConfig,
    next_page: usize,
}

impl DocumentTagger {
    /// Start a tagging pass: creates the structure root, marks the catalog,
    /// and registers the shared text-layer font.
    pub fn new(store: &mut DocumentStore, config: TaggerConfig) -> Result<Self> {
        let builder = StructureTreeBuilder::new(store)?;

        let mut font = HashMap::new();
        font.insert("Type".to_string(), Object::Name("Font".to_string()));
        font.insert("Subtype".to_string(), Object::Name("Type1".to_string()));
        font.insert("BaseFont".to_string(), Object::Name("Helvetica".to_string()));
        font.insert(
            "Encoding".to_string(),
            Object::Name("WinAnsiEncoding".to_string()),
        );
        let font_ref = store.register(Object::Dictionary(font));

        Ok(Self {
            builder,
            parent_tree: ParentTreeIndex::new(),
            font_ref,
            config,
            next_page: 0,
        })
    }

    /// Reference to the structure tree root.
    pub fn structure_root(&self) -> ObjectRef {
        self.builder.root_ref()
    }

    /// Number of pages applied so far.
    pub fn pages_applied(&self) -> usize {
        self.next_page
    }

    /// Apply the classifier's output to one page.
    ///
    /// Pages must arrive in document order starting at 0; anything else is a
    /// [`Error::PageOrder`]. `page_text` is the page's extracted raw text,
    /// used for the fallback paragraph when the classifier output yields no
    /// usable nodes. Errors from the inner pipeline come back tagged with
    /// the page index.
    pub fn apply_page(
        &mut self,
        store: &mut DocumentStore,
        page_index: usize,
        page_text: &str,
        classifier_output: &str,
    ) -> Result<()> {
        if page_index != self.next_page {
            return Err(Error::PageOrder {
                expected: self.next_page,
                found: page_index,
            });
        }
        self.apply_page_inner(store, page_index, page_text, classifier_output)
            .map_err(|e| e.on_page(page_index))?;
        self.next_page += 1;
        Ok(())
    }

    fn apply_page_inner(
        &mut self,
        store: &mut DocumentStore,
        page_index: usize,
        page_text: &str,
        classifier_output: &str,
    ) -> Result<()> {
        let raw = semantic::parse_classifier_output(classifier_output);
        let mut nodes = semantic::normalize(&raw);
        if nodes.is_empty() {
            let clipped = classifier_excerpt(page_text, self.config.classifier_char_budget);
            if let Some(fallback) = semantic::fallback_paragraph(clipped) {
                log::warn!(
                    "page {}: no usable nodes from classifier, falling back to a single paragraph",
                    page_index
                );
                nodes.push(fallback);
            }
        }

        let mut ctx = self
            .builder
            .build_page(store, page_index, &nodes, self.config.layout)?;
        link_page_figures(
            store,
            page_index,
            ctx.page_ref,
            ctx.elem_ref,
            ctx.kids_ref,
            self.builder.used_tags_mut(),
        )?;
        synthesize_page(store, &ctx, FONT_RESOURCE, self.font_ref)?;
        self.parent_tree
            .push_page(page_index, mem::take(&mut ctx.parent_refs));

        for title in outline::collect_outline_candidates(&nodes) {
            let clipped: String = title.chars().take(self.config.outline_title_max).collect();
            outline::add_outline(store, &clipped, ctx.page_ref)?;
        }

        log::info!(
            "page {}: tagged {} content items, {} nodes",
            page_index,
            ctx.content_count(),
            nodes.len()
        );
        Ok(())
    }

    /// Seal the pass: register the parent tree and role map and install them
    /// on the structure root. Returns the root reference.
    pub fn finish(self, store: &mut DocumentStore) -> Result<ObjectRef> {
        let parent_tree_ref = self.parent_tree.register(store);
        let role_map = build_role_map(self.builder.used_tags());
        let role_map_ref = register_role_map(store, &role_map);
        let root = self.builder.root_ref();
        self.builder.finish(store, parent_tree_ref, role_map_ref)?;
        log::info!("tagging finished: {} roles mapped", role_map.len());
        Ok(root)
    }
}

/// Classify and tag every page of a document in one call.
///
/// `page_texts[i]` is the extracted raw text of page `i`; each page's
/// excerpt goes to the classifier and the output is applied in order.
pub fn tag_document<C: Classifier>(
    store: &mut DocumentStore,
    page_texts: &[String],
    classifier: &C,
    config: TaggerConfig,
) -> Result<ObjectRef> {
    let budget = config.classifier_char_budget;
    let mut tagger = DocumentTagger::new(store, config)?;
    for (index, text) in page_texts.iter().enumerate() {
        let output = classifier.classify_page(classifier_excerpt(text, budget));
        tagger.apply_page(store, index, text, &output)?;
    }
    tagger.finish(store)
}
