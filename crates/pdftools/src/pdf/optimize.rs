//! Structural clean-ups applied before saving a compressed document.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

/// Page entries that carry no rendering information.
pub const NON_ESSENTIAL_PAGE_KEYS: &[&[u8]] = &[b"Thumb", b"PieceInfo", b"LastModified", b"SpiderInfo", b"Metadata"];

/// Catalog entries dropped by the maximum profile.
pub const NON_ESSENTIAL_CATALOG_KEYS: &[&[u8]] = &[b"Metadata", b"StructTreeRoot", b"MarkInfo", b"SpiderInfo", b"PieceInfo"];

/// Info dictionary keys kept by the optimized profile.
pub const ESSENTIAL_INFO_KEYS: &[&[u8]] = &[b"Title", b"Author"];

fn is_structural_stream(dict: &Dictionary) -> bool {
    matches!(
        dict.get(b"Type"),
        Ok(Object::Name(name)) if name == b"XRef" || name == b"ObjStm" || name == b"Metadata"
    )
}

/// Merge byte-identical streams into a single object.
///
/// Two streams are identical when their dictionaries and raw contents match.
/// References to duplicates are rewritten to the first occurrence; the
/// duplicates themselves become orphans for `prune_objects` to collect.
/// Returns the number of duplicates found.
pub fn dedupe_identical_streams(doc: &mut Document) -> usize {
    let mut seen: HashMap<(String, &[u8]), ObjectId> = HashMap::new();
    let mut replacements: HashMap<ObjectId, ObjectId> = HashMap::new();

    for (id, object) in &doc.objects {
        let Object::Stream(stream) = object else {
            continue;
        };
        if is_structural_stream(&stream.dict) {
            continue;
        }
        let key = (format!("{:?}", stream.dict), stream.content.as_slice());
        match seen.get(&key) {
            Some(original) => {
                replacements.insert(*id, *original);
            }
            None => {
                seen.insert(key, *id);
            }
        }
    }

    drop(seen);

    if replacements.is_empty() {
        return 0;
    }

    for object in doc.objects.values_mut() {
        remap_references(object, &replacements);
    }
    for (_, value) in doc.trailer.iter_mut() {
        remap_references(value, &replacements);
    }

    replacements.len()
}

/// Rewrite every reference found in `replacements`, recursively.
pub fn remap_references(object: &mut Object, replacements: &HashMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            if let Some(new_id) = replacements.get(id) {
                *id = *new_id;
            }
        }
        Object::Array(items) => {
            for item in items {
                remap_references(item, replacements);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                remap_references(value, replacements);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                remap_references(value, replacements);
            }
        }
        _ => {}
    }
}

fn catalog_id(doc: &Document) -> Option<ObjectId> {
    doc.trailer.get(b"Root").and_then(Object::as_reference).ok()
}

fn info_id(doc: &Document) -> Option<ObjectId> {
    doc.trailer.get(b"Info").and_then(Object::as_reference).ok()
}

/// Remove entries that do not affect rendering from pages and the catalog.
pub fn strip_non_essential(doc: &mut Document) {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for page_id in page_ids {
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            for key in NON_ESSENTIAL_PAGE_KEYS {
                page.remove(key);
            }
        }
    }

    if let Some(root) = catalog_id(doc)
        && let Ok(catalog) = doc.get_object_mut(root).and_then(Object::as_dict_mut)
    {
        for key in NON_ESSENTIAL_CATALOG_KEYS {
            catalog.remove(key);
        }
    }
}

fn retain_essential_keys(info: &mut Dictionary) {
    let doomed: Vec<Vec<u8>> = info
        .iter()
        .map(|(key, _)| key.clone())
        .filter(|key| !ESSENTIAL_INFO_KEYS.contains(&key.as_slice()))
        .collect();
    for key in doomed {
        info.remove(&key);
    }
}

/// Keep only `Title` and `Author` in the document Info dictionary.
///
/// The trailer may hold `Info` either as a reference or inline.
pub fn keep_essential_info(doc: &mut Document) {
    if let Some(id) = info_id(doc) {
        if let Ok(info) = doc.get_object_mut(id).and_then(Object::as_dict_mut) {
            retain_essential_keys(info);
        }
    } else if let Ok(Object::Dictionary(info)) = doc.trailer.get_mut(b"Info") {
        retain_essential_keys(info);
    }
}

/// Drop the Info dictionary altogether.
pub fn remove_info(doc: &mut Document) {
    if let Some(id) = info_id(doc) {
        doc.objects.remove(&id);
    }
    doc.trailer.remove(b"Info");
}

/// Lossless clean-up shared by both fallback profiles, ending with Flate
/// compression of every stream that is not already filtered.
pub fn finalize(doc: &mut Document) -> usize {
    let duplicates = dedupe_identical_streams(doc);
    doc.delete_zero_length_streams();
    doc.prune_objects();
    doc.compress();
    doc.renumber_objects();
    duplicates
}
