//! Shared PDF object-graph helpers
//!
//! The detector and the remover both navigate the same structures: page
//! dictionaries, resource dictionaries (inline, indirect, or inherited via
//! Parent), XObject tables, and annotation arrays. Everything here is
//! read-mostly; the only mutation is pruning a single XObject entry.

use std::path::Path;

use lopdf::{Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

/// Load a document for inspection, mapping parse failures to our taxonomy
pub(crate) fn load_document(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path).map_err(|e| Error::Malformed(e.to_string()))?;

    if doc.is_encrypted() {
        return Err(Error::Encrypted(path.to_path_buf()));
    }

    Ok(doc)
}

/// Follow reference chains until a concrete object is reached
pub(crate) fn resolve<'a>(doc: &'a Document, mut object: &'a Object) -> &'a Object {
    // Bounded in case of a reference cycle in a damaged file
    for _ in 0..32 {
        match object {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(resolved) => object = resolved,
                Err(_) => return object,
            },
            _ => return object,
        }
    }
    object
}

/// Read an integer-valued entry, accepting Real since some writers emit
/// `/Width 150.0`
pub(crate) fn int_value(object: &Object) -> Option<i64> {
    match object {
        Object::Integer(n) => Some(*n),
        Object::Real(r) => Some(r.round() as i64),
        _ => None,
    }
}

/// Find the dictionary that carries this page's Resources entry
///
/// Resources may live on the page itself or be inherited from a Pages node
/// further up the tree.
pub(crate) fn resources_owner(doc: &Document, page_id: ObjectId) -> Option<ObjectId> {
    let mut current = page_id;
    for _ in 0..32 {
        let dict = doc.get_dictionary(current).ok()?;
        if dict.has(b"Resources") {
            return Some(current);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return None,
        }
    }
    None
}

/// List the XObject entries visible to a page, in dictionary order
///
/// Only indirect entries are returned; image XObjects are streams and
/// therefore always indirect in well-formed files.
pub(crate) fn page_xobjects(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, ObjectId)> {
    let mut entries = Vec::new();

    let Some(owner) = resources_owner(doc, page_id) else {
        return entries;
    };
    let Ok(owner_dict) = doc.get_dictionary(owner) else {
        return entries;
    };
    let Ok(resources) = owner_dict.get(b"Resources") else {
        return entries;
    };
    let Object::Dictionary(resources) = resolve(doc, resources) else {
        return entries;
    };
    let Ok(xobjects) = resources.get(b"XObject") else {
        return entries;
    };
    let Object::Dictionary(xobjects) = resolve(doc, xobjects) else {
        return entries;
    };

    for (name, value) in xobjects.iter() {
        if let Object::Reference(id) = value {
            entries.push((name.clone(), *id));
        }
    }

    entries
}

/// Extent of an XObject: pixel dimensions for images, BBox extent for forms
pub(crate) fn xobject_extent(doc: &Document, stream: &Stream) -> Option<(i64, i64)> {
    let subtype = stream.dict.get(b"Subtype").ok()?;
    match subtype {
        Object::Name(name) if name == b"Image" => {
            let width = int_value(resolve(doc, stream.dict.get(b"Width").ok()?))?;
            let height = int_value(resolve(doc, stream.dict.get(b"Height").ok()?))?;
            Some((width, height))
        }
        Object::Name(name) if name == b"Form" => {
            let bbox = resolve(doc, stream.dict.get(b"BBox").ok()?).as_array().ok()?;
            if bbox.len() != 4 {
                return None;
            }
            let coords: Vec<f64> = bbox
                .iter()
                .filter_map(|c| match resolve(doc, c) {
                    Object::Integer(n) => Some(*n as f64),
                    Object::Real(r) => Some(f64::from(*r)),
                    _ => None,
                })
                .collect();
            if coords.len() != 4 {
                return None;
            }
            Some(((coords[2] - coords[0]).abs().round() as i64,
                  (coords[3] - coords[1]).abs().round() as i64))
        }
        _ => None,
    }
}

/// Clone the entries of a page's Annots array (empty when absent)
pub(crate) fn page_annotation_entries(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    let Ok(annots) = page.get(b"Annots") else {
        return Vec::new();
    };
    match resolve(doc, annots) {
        Object::Array(entries) => entries.clone(),
        _ => Vec::new(),
    }
}

/// Extract the URI of a link annotation entry, if it is one
pub(crate) fn annotation_uri(doc: &Document, entry: &Object) -> Option<String> {
    let annot = match resolve(doc, entry) {
        Object::Dictionary(dict) => dict,
        _ => return None,
    };

    match annot.get(b"Subtype") {
        Ok(Object::Name(name)) if name == b"Link" => {}
        _ => return None,
    }

    let action = match resolve(doc, annot.get(b"A").ok()?) {
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    // Only URI actions carry an external target
    if let Ok(Object::Name(kind)) = action.get(b"S") {
        if kind != b"URI" {
            return None;
        }
    }
    let uri = resolve(doc, action.get(b"URI").ok()?);
    let bytes = uri.as_str().ok()?;
    Some(String::from_utf8_lossy(bytes).into_owned())
}

/// Remove one named entry from the XObject table a page sees
///
/// Handles the table living inline in the page, behind an indirect
/// Resources dictionary, behind an indirect XObject dictionary, or on an
/// ancestor Pages node. Returns whether an entry was actually removed; a
/// second call for the same shared table is a no-op.
pub(crate) fn remove_xobject_entry(
    doc: &mut Document,
    page_id: ObjectId,
    name: &[u8],
) -> Result<bool> {
    enum Table {
        /// Resources and XObject both inline in the owning dictionary
        OwnerInline(ObjectId),
        /// Resources is indirect, XObject inline within it
        ResourcesRef(ObjectId),
        /// The XObject table itself is an indirect dictionary
        XObjectRef(ObjectId),
    }

    let table = {
        let Some(owner) = resources_owner(doc, page_id) else {
            return Ok(false);
        };
        let owner_dict = doc.get_dictionary(owner)?;
        let resources = match owner_dict.get(b"Resources") {
            Ok(object) => object,
            Err(_) => return Ok(false),
        };
        match resources {
            Object::Dictionary(res) => match res.get(b"XObject") {
                Ok(Object::Dictionary(_)) => Table::OwnerInline(owner),
                Ok(Object::Reference(id)) => Table::XObjectRef(*id),
                _ => return Ok(false),
            },
            Object::Reference(res_id) => {
                let res = doc.get_dictionary(*res_id)?;
                match res.get(b"XObject") {
                    Ok(Object::Dictionary(_)) => Table::ResourcesRef(*res_id),
                    Ok(Object::Reference(id)) => Table::XObjectRef(*id),
                    _ => return Ok(false),
                }
            }
            _ => return Ok(false),
        }
    };

    let removed = match table {
        Table::OwnerInline(owner) => {
            let owner_dict = doc.get_object_mut(owner)?.as_dict_mut()?;
            let resources = owner_dict.get_mut(b"Resources")?.as_dict_mut()?;
            let xobjects = resources.get_mut(b"XObject")?.as_dict_mut()?;
            xobjects.remove(name).is_some()
        }
        Table::ResourcesRef(res_id) => {
            let resources = doc.get_object_mut(res_id)?.as_dict_mut()?;
            let xobjects = resources.get_mut(b"XObject")?.as_dict_mut()?;
            xobjects.remove(name).is_some()
        }
        Table::XObjectRef(table_id) => {
            let xobjects = doc.get_object_mut(table_id)?.as_dict_mut()?;
            xobjects.remove(name).is_some()
        }
    };

    Ok(removed)
}

/// Replace a page's Annots with the given entries, dropping the key when
/// the array empties
pub(crate) fn set_page_annotations(
    doc: &mut Document,
    page_id: ObjectId,
    entries: Vec<Object>,
) -> Result<()> {
    // The array may itself be an indirect object shared via reference.
    let array_ref = {
        let page = doc.get_dictionary(page_id)?;
        match page.get(b"Annots") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    match array_ref {
        Some(array_id) if !entries.is_empty() => {
            let array = doc.get_object_mut(array_id)?.as_array_mut()?;
            *array = entries;
        }
        _ => {
            let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
            if entries.is_empty() {
                page.remove(b"Annots");
            } else {
                page.set("Annots", Object::Array(entries));
            }
        }
    }

    Ok(())
}
