//! Typed document-graph store.
//!
//! An arena of objects addressed by stable references, with typed accessors
//! for the small field set the structure synthesizer touches: allocation and
//! reference registration, dictionary field get/set, array append, catalog
//! access, page resources, and content-stream assembly. Byte-level
//! serialization and parsing of existing files are deliberately outside this
//! crate; the store is the seam to whichever component owns them.

use crate::content_stream::{ContentOp, ContentStreamBuilder};
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use std::collections::HashMap;

/// In-memory document object graph.
///
/// Objects are registered once and addressed by `ObjectRef` afterwards.
/// There is exactly one logical mutator; no interior locking.
#[derive(Debug)]
pub struct DocumentStore {
    /// Arena, 1-based: `ObjectRef { id: n }` lives at `objects[n - 1]`
    objects: Vec<Object>,
    catalog: ObjectRef,
    pages: Vec<ObjectRef>,
}

impl DocumentStore {
    /// Create an empty document with a catalog and no pages.
    pub fn new() -> Self {
        let mut store = Self {
            objects: Vec::new(),
            catalog: ObjectRef::new(0, 0),
            pages: Vec::new(),
        };
        let mut catalog = HashMap::new();
        catalog.insert("Type".to_string(), Object::Name("Catalog".to_string()));
        store.catalog = store.register(Object::Dictionary(catalog));
        store
    }

    /// Register an object and return its reference.
    pub fn register(&mut self, obj: Object) -> ObjectRef {
        self.objects.push(obj);
        ObjectRef::new(self.objects.len() as u32, 0)
    }

    /// Register an empty array object.
    pub fn register_array(&mut self) -> ObjectRef {
        self.register(Object::Array(Vec::new()))
    }

    /// Look up an object by reference.
    pub fn get(&self, r: ObjectRef) -> Result<&Object> {
        if r.gen != 0 {
            return Err(Error::ObjectNotFound(r.id, r.gen));
        }
        self.objects
            .get(r.id.checked_sub(1).ok_or(Error::ObjectNotFound(r.id, r.gen))? as usize)
            .ok_or(Error::ObjectNotFound(r.id, r.gen))
    }

    /// Look up an object mutably by reference.
    pub fn get_mut(&mut self, r: ObjectRef) -> Result<&mut Object> {
        if r.gen != 0 {
            return Err(Error::ObjectNotFound(r.id, r.gen));
        }
        let idx = r.id.checked_sub(1).ok_or(Error::ObjectNotFound(r.id, r.gen))? as usize;
        self.objects
            .get_mut(idx)
            .ok_or(Error::ObjectNotFound(r.id, r.gen))
    }

    /// Follow references until a direct object is reached.
    pub fn resolve<'a>(&'a self, mut obj: &'a Object) -> Result<&'a Object> {
        while let Object::Reference(r) = obj {
            obj = self.get(*r)?;
        }
        Ok(obj)
    }

    /// Reference to the document catalog.
    pub fn catalog_ref(&self) -> ObjectRef {
        self.catalog
    }

    /// Set a field on a registered dictionary (or stream dictionary).
    pub fn set_field(&mut self, target: ObjectRef, key: &str, value: Object) -> Result<()> {
        let dict = self.dict_of_mut(target)?;
        dict.insert(key.to_string(), value);
        Ok(())
    }

    /// Read a field from a registered dictionary, cloned.
    pub fn field(&self, target: ObjectRef, key: &str) -> Result<Option<Object>> {
        let obj = self.get(target)?;
        let dict = obj.as_dict().ok_or_else(|| Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: obj.type_name().to_string(),
        })?;
        Ok(dict.get(key).cloned())
    }

    /// Append a value to a registered array object.
    pub fn push(&mut self, target: ObjectRef, value: Object) -> Result<()> {
        let obj = self.get_mut(target)?;
        let found = obj.type_name();
        let arr = obj.as_array_mut().ok_or_else(|| Error::InvalidObjectType {
            expected: "Array".to_string(),
            found: found.to_string(),
        })?;
        arr.push(value);
        Ok(())
    }

    fn dict_of_mut(&mut self, target: ObjectRef) -> Result<&mut HashMap<String, Object>> {
        let obj = self.get_mut(target)?;
        let found = obj.type_name();
        obj.as_dict_mut().ok_or_else(|| Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: found.to_string(),
        })
    }

    // === Pages ===

    /// Add a page with the given media box dimensions (points).
    pub fn add_page(&mut self, width: f64, height: f64) -> ObjectRef {
        let mut dict = HashMap::new();
        dict.insert("Type".to_string(), Object::Name("Page".to_string()));
        dict.insert(
            "MediaBox".to_string(),
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ]),
        );
        dict.insert("Resources".to_string(), Object::dict());
        let page_ref = self.register(Object::Dictionary(dict));
        self.pages.push(page_ref);
        page_ref
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Reference to the page at the given index.
    pub fn page_ref(&self, index: usize) -> Result<ObjectRef> {
        self.pages
            .get(index)
            .copied()
            .ok_or(Error::PageOutOfRange(index))
    }

    /// Page height from the media box, defaulting to US Letter.
    pub fn page_height(&self, index: usize) -> Result<f64> {
        let page_ref = self.page_ref(index)?;
        let height = self
            .field(page_ref, "MediaBox")?
            .and_then(|b| b.as_array().and_then(|a| a.get(3).and_then(Object::as_number)));
        Ok(height.unwrap_or(792.0))
    }

    /// The page's `Contents` entry, cloned (may be absent).
    pub fn page_contents(&self, index: usize) -> Result<Option<Object>> {
        let page_ref = self.page_ref(index)?;
        self.field(page_ref, "Contents")
    }

    /// Replace the page's `Contents` entry.
    pub fn set_page_contents(&mut self, index: usize, contents: Object) -> Result<()> {
        let page_ref = self.page_ref(index)?;
        self.set_field(page_ref, "Contents", contents)
    }

    /// Register a font under the page's `/Font` resources.
    pub fn set_page_font(&mut self, index: usize, name: &str, font_ref: ObjectRef) -> Result<()> {
        let page_ref = self.page_ref(index)?;
        let resources = self.resources_of_mut(page_ref)?;
        let fonts = resources
            .entry("Font".to_string())
            .or_insert_with(Object::dict);
        match fonts.as_dict_mut() {
            Some(dict) => {
                dict.insert(name.to_string(), Object::Reference(font_ref));
                Ok(())
            },
            None => Err(Error::InvalidObjectType {
                expected: "Dictionary".to_string(),
                found: fonts.type_name().to_string(),
            }),
        }
    }

    /// Register an image XObject under the page's resources.
    ///
    /// `alt` attaches an `/Alt` text string to the image dictionary, the way
    /// an upstream description pass would have left it.
    pub fn add_page_image(
        &mut self,
        index: usize,
        name: &str,
        alt: Option<&str>,
        data: &[u8],
    ) -> Result<ObjectRef> {
        let mut dict = HashMap::new();
        dict.insert("Type".to_string(), Object::Name("XObject".to_string()));
        dict.insert("Subtype".to_string(), Object::Name("Image".to_string()));
        if let Some(alt) = alt {
            dict.insert("Alt".to_string(), Object::text_string(alt));
        }
        let image_ref = self.register(Object::Stream {
            dict,
            data: bytes::Bytes::copy_from_slice(data),
        });

        let page_ref = self.page_ref(index)?;
        let resources = self.resources_of_mut(page_ref)?;
        let xobjects = resources
            .entry("XObject".to_string())
            .or_insert_with(Object::dict);
        match xobjects.as_dict_mut() {
            Some(dict) => {
                dict.insert(name.to_string(), Object::Reference(image_ref));
                Ok(image_ref)
            },
            None => Err(Error::InvalidObjectType {
                expected: "Dictionary".to_string(),
                found: xobjects.type_name().to_string(),
            }),
        }
    }

    /// Enumerate image XObjects referenced by a page, in resource-name order.
    ///
    /// Image streams stored directly in the resource dictionary are promoted
    /// to indirect references first, so every returned entry is addressable.
    pub fn page_image_xobjects(&mut self, index: usize) -> Result<Vec<(String, ObjectRef)>> {
        let page_ref = self.page_ref(index)?;

        let entries: Vec<(String, Object)> = {
            let resources = self.resources_of_mut(page_ref)?;
            match resources.get("XObject").and_then(Object::as_dict) {
                Some(xobjects) => {
                    let mut entries: Vec<(String, Object)> =
                        xobjects.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                    entries.sort_by(|a, b| a.0.cmp(&b.0));
                    entries
                },
                None => return Ok(Vec::new()),
            }
        };

        let mut out = Vec::new();
        for (name, entry) in entries {
            let entry_ref = match entry {
                Object::Reference(r) => r,
                stream @ Object::Stream { .. } => {
                    // Promote a direct stream to an indirect reference so the
                    // OBJR built by the figure linker has something to point at.
                    let r = self.register(stream);
                    self.set_xobject_entry(page_ref, &name, r)?;
                    r
                },
                _ => continue,
            };
            let is_image = self
                .get(entry_ref)?
                .as_dict()
                .and_then(|d| d.get("Subtype"))
                .and_then(Object::as_name)
                == Some("Image");
            if is_image {
                out.push((name, entry_ref));
            } else {
                log::debug!("skipping non-image XObject /{} on page {}", name, index);
            }
        }
        Ok(out)
    }

    fn set_xobject_entry(&mut self, page_ref: ObjectRef, name: &str, r: ObjectRef) -> Result<()> {
        let resources = self.resources_of_mut(page_ref)?;
        let xobjects = resources
            .get_mut("XObject")
            .and_then(Object::as_dict_mut)
            .ok_or_else(|| Error::InvalidObjectType {
                expected: "Dictionary".to_string(),
                found: "Null".to_string(),
            })?;
        xobjects.insert(name.to_string(), Object::Reference(r));
        Ok(())
    }

    fn resources_of_mut(&mut self, page_ref: ObjectRef) -> Result<&mut HashMap<String, Object>> {
        let dict = self.dict_of_mut(page_ref)?;
        let resources = dict
            .entry("Resources".to_string())
            .or_insert_with(Object::dict);
        let found = resources.type_name();
        resources.as_dict_mut().ok_or_else(|| Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: found.to_string(),
        })
    }

    // === Content streams ===

    /// Serialize operators and register the resulting stream object.
    pub fn build_content_stream(&mut self, ops: &[ContentOp]) -> Result<ObjectRef> {
        let mut builder = ContentStreamBuilder::new();
        builder.ops(ops.iter().cloned());
        let data = builder.build()?;

        let mut dict = HashMap::new();
        dict.insert("Length".to_string(), Object::Integer(data.len() as i64));
        Ok(self.register(Object::Stream {
            dict,
            data: bytes::Bytes::from(data),
        }))
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
