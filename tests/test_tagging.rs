//! End-to-end tests for the tagging pipeline.
//!
//! Each test runs the full pass over an in-memory document and then reads
//! the resulting graph back through the store, checking the structural
//! invariants a conformant reader relies on.

use pdf_tagger::outline::{outline_count, outline_titles_backward, outline_titles_forward};
use pdf_tagger::structure::element_tag;
use pdf_tagger::{
    tag_document, Classifier, DocumentStore, DocumentTagger, Error, Object, ObjectRef,
    TaggerConfig,
};

/// Classifier returning canned output per page, in order.
struct ScriptedClassifier {
    pages: Vec<String>,
    cursor: std::cell::Cell<usize>,
}

impl ScriptedClassifier {
    fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|s| s.to_string()).collect(),
            cursor: std::cell::Cell::new(0),
        }
    }
}

impl Classifier for ScriptedClassifier {
    fn classify_page(&self, _page_text: &str) -> String {
        let i = self.cursor.get();
        self.cursor.set(i + 1);
        self.pages.get(i).cloned().unwrap_or_else(|| "[]".to_string())
    }
}

fn letter_pages(n: usize) -> DocumentStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut store = DocumentStore::new();
    for _ in 0..n {
        store.add_page(612.0, 792.0);
    }
    store
}

fn run_one_page(store: &mut DocumentStore, text: &str, output: &str) -> ObjectRef {
    let classifier = ScriptedClassifier::new(&[output]);
    tag_document(store, &[text.to_string()], &classifier, TaggerConfig::default()).unwrap()
}

/// Resolve `K` of an element as a list of child element refs.
fn kids_of(store: &DocumentStore, elem: ObjectRef) -> Vec<ObjectRef> {
    let kids_ref = store
        .field(elem, "K")
        .unwrap()
        .and_then(|k| k.as_reference())
        .expect("element K should be a kids array reference");
    store
        .get(kids_ref)
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Object::as_reference)
        .collect()
}

/// The page container (Sect) elements under the Document element.
fn page_containers(store: &DocumentStore, root: ObjectRef) -> Vec<ObjectRef> {
    let document = kids_of(store, root);
    assert_eq!(document.len(), 1, "root should hold exactly one Document");
    assert_eq!(element_tag(store, document[0]).unwrap(), "Document");
    kids_of(store, document[0])
}

/// Parent arrays from the parent tree, as (page ordinal, element refs).
fn parent_tree_entries(store: &DocumentStore, root: ObjectRef) -> Vec<(i64, Vec<ObjectRef>)> {
    let tree_ref = store
        .field(root, "ParentTree")
        .unwrap()
        .unwrap()
        .as_reference()
        .unwrap();
    let nums = store.field(tree_ref, "Nums").unwrap().unwrap();
    let nums = nums.as_array().unwrap().clone();
    nums.chunks(2)
        .map(|pair| {
            let key = pair[0].as_integer().unwrap();
            let refs = pair[1]
                .as_array()
                .unwrap()
                .iter()
                .filter_map(Object::as_reference)
                .collect();
            (key, refs)
        })
        .collect()
}

fn accessible_stream_text(store: &DocumentStore, page: usize) -> String {
    let contents = store.page_contents(page).unwrap().unwrap();
    let refs: Vec<ObjectRef> = contents
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Object::as_reference)
        .collect();
    let last = *refs.last().unwrap();
    match store.get(last).unwrap() {
        Object::Stream { data, .. } => String::from_utf8(data.to_vec()).unwrap(),
        other => panic!("expected stream, got {}", other.type_name()),
    }
}

#[test]
fn test_heading_and_paragraph_page() {
    let mut store = letter_pages(1);
    let root = run_one_page(
        &mut store,
        "Intro\nHello world",
        r#"[{"tag":"H1","text":"Intro"},{"tag":"P","text":"Hello world"}]"#,
    );

    let containers = page_containers(&store, root);
    assert_eq!(containers.len(), 1);
    assert_eq!(element_tag(&store, containers[0]).unwrap(), "Sect");

    let children = kids_of(&store, containers[0]);
    assert_eq!(children.len(), 2);
    assert_eq!(element_tag(&store, children[0]).unwrap(), "H1");
    assert_eq!(element_tag(&store, children[1]).unwrap(), "P");

    let entries = parent_tree_entries(&store, root);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, 0);
    assert_eq!(entries[0].1.len(), 2);

    assert_eq!(outline_count(&store).unwrap(), 1);
    assert_eq!(outline_titles_forward(&store).unwrap(), vec!["Intro"]);
}

#[test]
fn test_flat_list_item_split() {
    let mut store = letter_pages(1);
    let root = run_one_page(&mut store, "", r#"[{"tag":"LI","text":"1. First item"}]"#);

    let containers = page_containers(&store, root);
    let li = kids_of(&store, containers[0]);
    assert_eq!(li.len(), 1);
    assert_eq!(element_tag(&store, li[0]).unwrap(), "LI");

    let parts = kids_of(&store, li[0]);
    assert_eq!(parts.len(), 2);
    assert_eq!(element_tag(&store, parts[0]).unwrap(), "Lbl");
    assert_eq!(element_tag(&store, parts[1]).unwrap(), "LBody");

    // two content items at identifiers 0 and 1, owned by Lbl and LBody
    assert_eq!(store.field(parts[0], "K").unwrap().unwrap().as_integer(), Some(0));
    assert_eq!(store.field(parts[1], "K").unwrap().unwrap().as_integer(), Some(1));

    let entries = parent_tree_entries(&store, root);
    assert_eq!(entries[0].1, parts);

    let stream = accessible_stream_text(&store, 0);
    assert!(stream.contains("/Lbl <</MCID 0"));
    assert!(stream.contains("/LBody <</MCID 1"));
}

#[test]
fn test_invalid_output_falls_back_without_outline() {
    let mut store = letter_pages(1);
    let root = run_one_page(&mut store, "Some fallback text.", "certainly! here you go:");

    let containers = page_containers(&store, root);
    let children = kids_of(&store, containers[0]);
    assert_eq!(children.len(), 1);
    assert_eq!(element_tag(&store, children[0]).unwrap(), "P");

    let entries = parent_tree_entries(&store, root);
    assert_eq!(entries[0].1.len(), 1);
    assert_eq!(outline_count(&store).unwrap(), 0);
}

#[test]
fn test_described_image_becomes_figure() {
    let mut store = letter_pages(1);
    store
        .add_page_image(0, "Im1", Some("A bar chart of sales"), b"imagedata")
        .unwrap();
    let root = run_one_page(&mut store, "", "[]");

    let containers = page_containers(&store, root);
    let children = kids_of(&store, containers[0]);
    assert_eq!(children.len(), 1);
    assert_eq!(element_tag(&store, children[0]).unwrap(), "Figure");

    // linked through an object reference, never a content identifier
    let k = store.field(children[0], "K").unwrap().unwrap();
    let objr = k.as_reference().expect("Figure K must be a reference");
    let objr_dict = store.get(objr).unwrap().as_dict().unwrap().clone();
    assert_eq!(objr_dict["Type"].as_name(), Some("OBJR"));

    // and therefore absent from the page's parent array
    let entries = parent_tree_entries(&store, root);
    assert!(entries[0].1.is_empty());

    // role map still covers it
    let role_map_ref = store
        .field(root, "RoleMap")
        .unwrap()
        .unwrap()
        .as_reference()
        .unwrap();
    let role_map = store.get(role_map_ref).unwrap().as_dict().unwrap().clone();
    assert_eq!(role_map["Figure"].as_name(), Some("Figure"));
}

#[test]
fn test_outline_siblings_walk_both_directions() {
    let mut store = letter_pages(3);
    let classifier = ScriptedClassifier::new(&[
        r#"[{"tag":"H1","text":"One"}]"#,
        r#"[{"tag":"H2","text":"Two"}]"#,
        r#"[{"tag":"H1","text":"Three"}]"#,
    ]);
    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    tag_document(&mut store, &texts, &classifier, TaggerConfig::default()).unwrap();

    assert_eq!(outline_count(&store).unwrap(), 3);
    assert_eq!(outline_titles_forward(&store).unwrap(), vec!["One", "Two", "Three"]);
    assert_eq!(outline_titles_backward(&store).unwrap(), vec!["Three", "Two", "One"]);
}

#[test]
fn test_parent_array_indexes_match_mcids() {
    let mut store = letter_pages(2);
    let classifier = ScriptedClassifier::new(&[
        r#"[{"tag":"H1","text":"A"},{"tag":"P","text":"B"},{"tag":"P","text":"C"}]"#,
        r#"[{"tag":"P","text":"D"}]"#,
    ]);
    let texts = vec!["p1".to_string(), "p2".to_string()];
    let root = tag_document(&mut store, &texts, &classifier, TaggerConfig::default()).unwrap();

    let entries = parent_tree_entries(&store, root);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, 0);
    assert_eq!(entries[1].0, 1);
    assert_eq!(entries[0].1.len(), 3);
    assert_eq!(entries[1].1.len(), 1);

    // array[k] is the element whose K is the integer k, per page
    for (_, refs) in &entries {
        for (mcid, elem) in refs.iter().enumerate() {
            let k = store.field(*elem, "K").unwrap().unwrap();
            assert_eq!(k.as_integer(), Some(mcid as i64));
        }
    }

    // pages carry their ordinal as StructParents
    for page in 0..2 {
        let page_ref = store.page_ref(page).unwrap();
        let sp = store.field(page_ref, "StructParents").unwrap().unwrap();
        assert_eq!(sp.as_integer(), Some(page as i64));
    }
}

#[test]
fn test_no_element_holds_both_mcid_and_children() {
    let mut store = letter_pages(1);
    let root = run_one_page(
        &mut store,
        "",
        r#"[{"tag":"Div","text":"inline","children":[{"tag":"P","text":"child"}]}]"#,
    );

    let containers = page_containers(&store, root);
    let div = kids_of(&store, containers[0])[0];
    let k = store.field(div, "K").unwrap().unwrap();
    assert!(k.as_reference().is_some(), "container K must be a kids array");

    // text moved into a leading synthesized Span
    let inner = kids_of(&store, div);
    assert_eq!(inner.len(), 2);
    assert_eq!(element_tag(&store, inner[0]).unwrap(), "Span");
    assert_eq!(element_tag(&store, inner[1]).unwrap(), "P");
}

#[test]
fn test_every_used_tag_has_role_map_entry() {
    let mut store = letter_pages(1);
    let root = run_one_page(
        &mut store,
        "",
        r#"[
            {"tag":"H1","text":"t"},
            {"tag":"Quote","text":"q"},
            {"tag":"Chapter","text":"custom"},
            {"tag":"L","children":[{"tag":"LI","text":"- x"}]}
        ]"#,
    );

    let role_map_ref = store
        .field(root, "RoleMap")
        .unwrap()
        .unwrap()
        .as_reference()
        .unwrap();
    let role_map = store.get(role_map_ref).unwrap().as_dict().unwrap().clone();

    for tag in ["Document", "Sect", "H1", "Quote", "Chapter", "L", "LI", "Lbl", "LBody"] {
        assert!(role_map.contains_key(tag), "missing role map entry for {}", tag);
    }
    assert_eq!(role_map["Quote"].as_name(), Some("BlockQuote"));
    assert_eq!(role_map["Chapter"].as_name(), Some("Span"));
}

#[test]
fn test_artifact_wraps_original_content_only() {
    let mut store = letter_pages(1);
    let original = store
        .build_content_stream(&[pdf_tagger::content_stream::ContentOp::BeginText])
        .unwrap();
    store.set_page_contents(0, Object::Reference(original)).unwrap();

    run_one_page(&mut store, "", r#"[{"tag":"P","text":"hi"}]"#);

    let contents = store.page_contents(0).unwrap().unwrap();
    let refs: Vec<ObjectRef> = contents
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Object::as_reference)
        .collect();
    assert_eq!(refs.len(), 4);
    assert_eq!(refs[1], original);

    let first = match store.get(refs[0]).unwrap() {
        Object::Stream { data, .. } => data.clone(),
        _ => panic!("expected stream"),
    };
    assert_eq!(&first[..], b"/Artifact BMC\n");

    let accessible = accessible_stream_text(&store, 0);
    assert!(accessible.contains("/P <</MCID 0"));
    assert!(accessible.contains("3 Tr"));
    assert!(accessible.ends_with("EMC\n"));
}

#[test]
fn test_empty_page_gets_container_and_empty_parent_array() {
    let mut store = letter_pages(1);
    let root = run_one_page(&mut store, "   ", "[]");

    let containers = page_containers(&store, root);
    assert_eq!(containers.len(), 1);
    assert!(kids_of(&store, containers[0]).is_empty());

    let entries = parent_tree_entries(&store, root);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].1.is_empty());

    // no accessible stream; original content is still artifact-wrapped
    let contents = store.page_contents(0).unwrap().unwrap();
    assert_eq!(contents.as_array().unwrap().len(), 2);
}

#[test]
fn test_catalog_marked_as_tagged() {
    let mut store = letter_pages(1);
    let root = run_one_page(&mut store, "", "[]");

    let catalog = store.catalog_ref();
    let tree = store.field(catalog, "StructTreeRoot").unwrap().unwrap();
    assert_eq!(tree.as_reference(), Some(root));

    let mark_info = store.field(catalog, "MarkInfo").unwrap().unwrap();
    assert_eq!(
        mark_info.as_dict().unwrap()["Marked"],
        Object::Boolean(true)
    );
}

#[test]
fn test_out_of_order_page_rejected() {
    let mut store = letter_pages(2);
    let mut tagger = DocumentTagger::new(&mut store, TaggerConfig::default()).unwrap();
    tagger.apply_page(&mut store, 0, "", "[]").unwrap();
    let err = tagger.apply_page(&mut store, 2, "", "[]").unwrap_err();
    assert!(matches!(err, Error::PageOrder { expected: 1, found: 2 }));
}

#[test]
fn test_language_and_link_attributes_survive() {
    let mut store = letter_pages(1);
    let root = run_one_page(
        &mut store,
        "",
        r#"[{"tag":"Link","text":"docs","url":"https://example.org/docs","lang":"en"}]"#,
    );

    let containers = page_containers(&store, root);
    let link = kids_of(&store, containers[0])[0];
    assert_eq!(element_tag(&store, link).unwrap(), "Link");

    let action = store.field(link, "A").unwrap().unwrap();
    let action = action.as_dict().unwrap().clone();
    assert_eq!(action["S"].as_name(), Some("URI"));
    assert_eq!(action["URI"].as_string(), Some(&b"https://example.org/docs"[..]));

    let lang = store.field(link, "Lang").unwrap().unwrap();
    assert_eq!(lang.as_string(), Some(&b"en"[..]));

    let stream = accessible_stream_text(&store, 0);
    assert!(stream.contains("/Lang (en)"));
}
