//! Content stream synthesis for tagged pages.
//!
//! Produces the invisible, selectable text layer bound to structure elements
//! through marked-content identifiers, and fences the page's original
//! drawing operators inside an `Artifact` region so assistive technology
//! ignores purely visual content. Ordering is mandatory: the artifact
//! brackets enclose only the original content, and the accessible layer is
//! appended after the closing bracket.

use crate::content_stream::{ContentOp, MarkedContentProps};
use crate::error::Result;
use crate::object::{Object, ObjectRef};
use crate::store::DocumentStore;
use crate::structure::builder::PageContext;

/// Text rendering mode 3: neither fill nor stroke (invisible).
const RENDER_MODE_INVISIBLE: i32 = 3;

/// Synthesize the accessible layer for one page.
///
/// Wraps the original content as an artifact (even when there are no
/// content items), appends the invisible text stream when there is one, and
/// registers the shared font under the page's resources.
pub fn synthesize_page(
    store: &mut DocumentStore,
    ctx: &PageContext,
    font_name: &str,
    font_ref: ObjectRef,
) -> Result<()> {
    let accessible = build_accessible_stream(store, ctx, font_name)?;
    wrap_page_content(store, ctx.page_index, accessible)?;
    store.set_page_font(ctx.page_index, font_name, font_ref)?;
    Ok(())
}

/// Build the marked-content stream for the page's content items.
///
/// Returns `None` when the page has no items; such a page keeps only its
/// artifact-wrapped original content.
fn build_accessible_stream(
    store: &mut DocumentStore,
    ctx: &PageContext,
    font_name: &str,
) -> Result<Option<ObjectRef>> {
    if ctx.items.is_empty() {
        return Ok(None);
    }

    let mut ops = Vec::new();
    for item in &ctx.items {
        ops.push(ContentOp::BeginMarkedContentProps {
            tag: item.tag.clone(),
            props: MarkedContentProps {
                mcid: item.mcid,
                actual_text: item.actual_text.clone(),
                lang: item.lang.clone(),
            },
        });

        for (line_index, line) in item.lines.iter().enumerate() {
            let y = item.y - line_index as f64 * item.line_height;
            ops.push(ContentOp::BeginText);
            ops.push(ContentOp::SetFont(font_name.to_string(), item.font_size));
            ops.push(ContentOp::SetTextRenderMode(RENDER_MODE_INVISIBLE));
            ops.push(ContentOp::SetTextMatrix(1.0, 0.0, 0.0, 1.0, item.x, y));
            ops.push(ContentOp::ShowTextUnicode(line.clone()));
            ops.push(ContentOp::EndText);
        }

        ops.push(ContentOp::EndMarkedContent);
    }

    log::debug!(
        "page {}: synthesized {} marked-content sequences",
        ctx.page_index,
        ctx.items.len()
    );
    Ok(Some(store.build_content_stream(&ops)?))
}

/// Rebuild the page's `Contents` array as
/// `[artifact-begin, original..., artifact-end, accessible?]`.
///
/// The original entry may be absent, a single stream reference, a direct
/// stream, or an array mixing both; direct streams are registered so the
/// final array holds only references.
fn wrap_page_content(
    store: &mut DocumentStore,
    page_index: usize,
    accessible: Option<ObjectRef>,
) -> Result<()> {
    let artifact_begin =
        store.build_content_stream(&[ContentOp::BeginMarkedContent("Artifact".to_string())])?;
    let artifact_end = store.build_content_stream(&[ContentOp::EndMarkedContent])?;

    let mut refs = vec![artifact_begin];
    match store.page_contents(page_index)? {
        Some(Object::Array(entries)) => {
            for entry in entries {
                match entry {
                    Object::Reference(r) => refs.push(r),
                    stream @ Object::Stream { .. } => refs.push(store.register(stream)),
                    other => {
                        log::debug!(
                            "page {}: dropping non-stream Contents entry ({})",
                            page_index,
                            other.type_name()
                        );
                    },
                }
            }
        },
        Some(Object::Reference(r)) => refs.push(r),
        Some(stream @ Object::Stream { .. }) => refs.push(store.register(stream)),
        Some(_) | None => {},
    }
    refs.push(artifact_end);
    if let Some(accessible) = accessible {
        refs.push(accessible);
    }

    let array = Object::Array(refs.into_iter().map(Object::Reference).collect());
    store.set_page_contents(page_index, array)
}
