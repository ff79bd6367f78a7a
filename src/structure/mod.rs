//! PDF logical structure (Tagged PDF) synthesis.
//!
//! Builds the structure tree described by ISO 32000-1:2008 Section 14.7:
//! a `StructTreeRoot` with a single `Document` element, one section per
//! page, and a recursive element tree mirroring the page's semantics. The
//! submodules cover the pieces around the tree itself:
//!
//! - [`builder`]: the recursive tree builder and per-page context
//! - [`content`]: invisible text layer and artifact wrapping
//! - [`figures`]: `Figure` elements for images with alternate text
//! - [`parent_tree`]: the MCID-to-element reverse index (`/ParentTree`)
//! - [`role_map`]: mapping of used tags to standard roles (`/RoleMap`)

pub mod builder;
pub mod content;
pub mod figures;
pub mod parent_tree;
pub mod role_map;

pub use builder::{element_tag, ContentItem, PageContext, StructureTreeBuilder, TextLayout};
pub use content::synthesize_page;
pub use figures::link_page_figures;
pub use parent_tree::ParentTreeIndex;
pub use role_map::{build_role_map, register_role_map, standard_role};
