//! Figure linking for described images.
//!
//! Images that already carry an `/Alt` description are attached to the
//! structure tree as `Figure` elements whose content link is an `OBJR`
//! (object reference) — images are drawables, not marked-content runs, so
//! they never receive a content identifier. Images without alternate text
//! are left unlinked on purpose: silently skipping them is the policy, not
//! an oversight.

use crate::error::Result;
use crate::object::{Object, ObjectRef};
use crate::store::DocumentStore;
use std::collections::BTreeSet;
use std::collections::HashMap;

/// Link every described image on a page into the structure tree.
///
/// Returns the number of `Figure` elements created.
pub fn link_page_figures(
    store: &mut DocumentStore,
    page_index: usize,
    page_ref: ObjectRef,
    parent_ref: ObjectRef,
    parent_kids: ObjectRef,
    used_tags: &mut BTreeSet<String>,
) -> Result<usize> {
    let images = store.page_image_xobjects(page_index)?;
    let mut linked = 0;

    for (name, image_ref) in images {
        let (alt, data_len) = match store.get(image_ref)? {
            Object::Stream { dict, data } => (dict.get("Alt").cloned(), data.len()),
            _ => continue,
        };

        if data_len == 0 {
            log::debug!("page {}: image /{} has no data, skipping", page_index, name);
            continue;
        }
        let alt = match alt {
            Some(alt) if alt.as_string().is_some_and(has_text_content) => alt,
            _ => {
                // Decorative or undescribed image, leave it out of the tree.
                log::debug!("page {}: image /{} has no alt text, skipping", page_index, name);
                continue;
            },
        };

        let mut objr = HashMap::new();
        objr.insert("Type".to_string(), Object::Name("OBJR".to_string()));
        objr.insert("Obj".to_string(), Object::Reference(image_ref));
        let objr_ref = store.register(Object::Dictionary(objr));

        let mut figure = HashMap::new();
        figure.insert("Type".to_string(), Object::Name("StructElem".to_string()));
        figure.insert("S".to_string(), Object::Name("Figure".to_string()));
        figure.insert("Alt".to_string(), alt);
        figure.insert("Pg".to_string(), Object::Reference(page_ref));
        figure.insert("P".to_string(), Object::Reference(parent_ref));
        figure.insert("K".to_string(), Object::Reference(objr_ref));
        let figure_ref = store.register(Object::Dictionary(figure));

        store.push(parent_kids, Object::Reference(figure_ref))?;
        used_tags.insert("Figure".to_string());
        linked += 1;
    }

    Ok(linked)
}

/// Whether a string object holds visible text (more than a bare UTF-16 BOM).
fn has_text_content(bytes: &[u8]) -> bool {
    match bytes {
        [] => false,
        [0xFE, 0xFF, rest @ ..] => !rest.is_empty(),
        _ => true,
    }
}
