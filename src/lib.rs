//! # pdf_tagger
//!
//! A library for synthesizing the logical structure (Tagged PDF) of
//! documents that were produced without one, following ISO 32000-1:2008
//! Sections 14.7 and 14.8.
//!
//! Given per-page extracted text and a [`Classifier`] that describes each
//! page's semantics, the library builds:
//!
//! - A structure tree (`StructTreeRoot` / `StructElem`) mirroring the
//!   page semantics, with a `Document` root and one section per page
//! - An invisible, selectable text layer bound to the tree through
//!   marked-content identifiers, with the original page content fenced
//!   off as an artifact
//! - The parent tree, role map, and `MarkInfo` entries readers need to
//!   consume the tree
//! - `Figure` elements for images carrying alternate text, and bookmarks
//!   for top-level headings
//!
//! ## Example
//!
//! ```ignore
//! use pdf_tagger::{tag_document, DocumentStore, TaggerConfig};
//!
//! let mut store = DocumentStore::new();
//! store.add_page(612.0, 792.0);
//!
//! let texts = vec!["Chapter 1\nIt was a dark and stormy night.".to_string()];
//! let root = tag_document(&mut store, &texts, &my_classifier, TaggerConfig::default())?;
//! # Ok::<(), pdf_tagger::Error>(())
//! ```
//!
//! The classifier is treated as unreliable: malformed output degrades to a
//! single paragraph per page, never to an error.

pub mod content_stream;
pub mod error;
pub mod object;
pub mod outline;
pub mod semantic;
pub mod store;
pub mod structure;
pub mod tagger;

pub use error::{Error, Result};
pub use object::{Object, ObjectRef};
pub use semantic::{Scope, SemanticNode};
pub use store::DocumentStore;
pub use tagger::{tag_document, Classifier, DocumentTagger, TaggerConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
