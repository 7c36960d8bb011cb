//! Page assembly using lopdf
//!
//! Both the filler (copy page 0 of the template into a fresh document) and
//! the printer (append every page of every document) build their output the
//! same way: renumber each source so object ids don't collide, collect the
//! selected page ids, then hang them under a brand new Pages/Catalog pair.

use std::collections::BTreeMap;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;
use crate::error::{Error, Result};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed (cyclic) Parent chains
const MAX_TREE_DEPTH: usize = 64;

/// Which pages of a source document to take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    /// Only the first page
    First,
    /// Every page, in order
    All,
}

/// Build one document from the selected pages of each source, in order
pub fn assemble(sources: Vec<(Document, PageSelection)>) -> Result<Document> {
    if sources.is_empty() {
        return Err(Error::General("No input documents provided".to_string()));
    }

    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (index, (mut doc, selection)) in sources.into_iter().enumerate() {
        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(Error::General(format!("Document {} has no pages", index + 1)));
        }

        let selected: Vec<ObjectId> = match selection {
            PageSelection::First => pages.values().take(1).copied().collect(),
            PageSelection::All => pages.values().copied().collect(),
        };

        // Re-parenting loses anything inherited from the old page tree
        for &page_id in &selected {
            materialize_inherited_attributes(&mut doc, page_id)?;
        }

        debug!(document = index + 1, pages = selected.len(), "Collected pages");
        page_ids.extend(selected);
        objects.extend(doc.objects);
    }

    let mut merged_doc = Document::with_version("1.7");
    merged_doc.objects.extend(objects);

    // new_object_id() must not hand out ids that are already taken
    merged_doc.max_id = max_id - 1;

    let pages_id = merged_doc.new_object_id();

    let kids: Vec<Object> = page_ids
        .iter()
        .map(|&id| Object::Reference(id))
        .collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = merged_doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
    merged_doc.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_ids {
        let page = merged_doc.get_dictionary_mut(page_id)?;
        page.set("Parent", Object::Reference(pages_id));
    }

    // Drop old catalogs, page trees and any unselected pages
    let pruned = merged_doc.prune_objects();
    debug!(pruned = pruned.len(), pages = page_ids.len(), "Assembled document");
    merged_doc.renumber_objects();

    Ok(merged_doc)
}

/// Combine every page of every serialized PDF, in input order
pub fn combine_documents(inputs: &[&[u8]]) -> Result<Document> {
    let mut sources = Vec::with_capacity(inputs.len());
    for (index, bytes) in inputs.iter().enumerate() {
        let doc = Document::load_mem(bytes)
            .map_err(|e| Error::General(format!("Document {} could not be loaded: {}", index + 1, e)))?;
        sources.push((doc, PageSelection::All));
    }
    assemble(sources)
}

/// Serialize a document with compressed streams
pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Copy inheritable attributes from the page's ancestors onto the page itself
fn materialize_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();

    {
        let page = doc.get_dictionary(page_id)?;
        let mut missing: Vec<&[u8]> = INHERITABLE_KEYS
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();

        let mut parent = page.get(b"Parent").and_then(|p| p.as_reference()).ok();
        let mut depth = 0;

        while let Some(parent_id) = parent {
            if missing.is_empty() || depth >= MAX_TREE_DEPTH {
                break;
            }

            let node = match doc.get_dictionary(parent_id) {
                Ok(node) => node,
                Err(_) => break,
            };

            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((*key, value.clone()));
                    false
                }
                Err(_) => true,
            });

            parent = node.get(b"Parent").and_then(|p| p.as_reference()).ok();
            depth += 1;
        }
    }

    if !inherited.is_empty() {
        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key.to_vec(), value);
        }
    }

    Ok(())
}
