//! Watermark removal
//!
//! Re-parses the document from disk, re-derives the classification with the
//! same routine the detector uses, then prunes references object by object:
//! XObject table entries and their paint operators for images, Annots array
//! entries for links. Objects left unreachable are elided when the file is
//! serialized. Output is written atomically so a failing run never leaves a
//! partial file behind.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::config::CleanConfig;
use crate::error::{Error, Result};
use crate::pdf::detect::{classify_document, Classification};
use crate::pdf::graph;

/// Counts reported after a removal pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalStats {
    /// Distinct image objects removed (one per object, however many pages
    /// shared it)
    pub images_removed: u32,
    /// Link annotation entries removed
    pub links_removed: u32,
}

impl RemovalStats {
    pub fn total(&self) -> u32 {
        self.images_removed + self.links_removed
    }
}

/// Removes watermark artifacts from PDF files
#[derive(Debug, Clone, Default)]
pub struct WatermarkRemover {
    config: CleanConfig,
}

impl WatermarkRemover {
    /// Remover with the default issuer configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Remover with an explicit configuration
    pub fn with_config(config: CleanConfig) -> Self {
        Self { config }
    }

    /// Remove all watermark artifacts and write a cleaned PDF to `output`
    ///
    /// The input is re-parsed independently of any earlier detector run.
    /// A document with no artifacts produces zero counts and an output
    /// identical in structure to the input.
    pub fn clean_pdf_from_target_domain(&self, input: &Path, output: &Path) -> Result<RemovalStats> {
        let mut doc = graph::load_document(input)?;
        let classification = classify_document(&doc, &self.config)?;
        let page_count_before = doc.get_pages().len();

        let images_removed = remove_images(&mut doc, &classification)?;
        let links_removed = remove_links(&mut doc, &classification)?;
        let stats = RemovalStats { images_removed, links_removed };

        // The page tree must survive the surgery intact.
        let page_count_after = doc.get_pages().len();
        if page_count_after != page_count_before {
            return Err(Error::Inconsistency(format!(
                "page count changed during removal: {} -> {}",
                page_count_before, page_count_after
            )));
        }

        // Reachability pass: objects no page references anymore (the
        // watermark image, its SMask, removed annotations) drop out of the
        // serialized file. Objects still referenced elsewhere survive.
        doc.prune_objects();
        doc.compress();

        save_atomically(&mut doc, output)?;
        Ok(stats)
    }
}

/// Prune image references page by page, then strip their paint operators
fn remove_images(doc: &mut Document, classification: &Classification) -> Result<u32> {
    // Names to strip from each touched page's content stream
    let mut touched: BTreeMap<ObjectId, BTreeSet<Vec<u8>>> = BTreeMap::new();
    let mut removed = 0u32;

    for image in &classification.images {
        let mut any = false;
        for usage in &image.usages {
            graph::remove_xobject_entry(doc, usage.page_id, &usage.name)?;
            touched
                .entry(usage.page_id)
                .or_default()
                .insert(usage.name.clone());
            any = true;
        }
        if any {
            removed += 1;
        }
    }

    // Only the pages that lost a resource get their content rewritten;
    // every other page keeps its original stream bytes.
    for (page_id, names) in touched {
        strip_paint_operators(doc, page_id, &names)?;
    }

    Ok(removed)
}

/// Drop the `Do` operators that painted the removed resource names
///
/// Removing a resource entry without its paint operator leaves a content
/// stream referencing an undefined name, which some viewers render as a
/// broken-image glyph. The enclosing q/cm/Q state operators are harmless
/// and are left in place.
fn strip_paint_operators(
    doc: &mut Document,
    page_id: ObjectId,
    names: &BTreeSet<Vec<u8>>,
) -> Result<()> {
    let raw = doc.get_page_content(page_id)?;
    let content = Content::decode(&raw)?;

    let mut kept = Vec::with_capacity(content.operations.len());
    let mut changed = false;
    for operation in content.operations {
        if operation.operator == "Do" {
            if let Some(Object::Name(name)) = operation.operands.first() {
                if names.contains(name) {
                    changed = true;
                    continue;
                }
            }
        }
        kept.push(operation);
    }

    if changed {
        let encoded = Content { operations: kept }.encode()?;
        doc.change_page_content(page_id, encoded)?;
    }

    Ok(())
}

/// Rebuild each affected page's Annots array without the classified entries
fn remove_links(doc: &mut Document, classification: &Classification) -> Result<u32> {
    let mut per_page: BTreeMap<ObjectId, BTreeSet<usize>> = BTreeMap::new();
    for link in &classification.links {
        per_page.entry(link.page_id).or_default().insert(link.index);
    }

    let mut removed = 0u32;
    for (page_id, indices) in per_page {
        let entries = graph::page_annotation_entries(doc, page_id);
        if indices.iter().any(|&index| index >= entries.len()) {
            return Err(Error::Inconsistency(format!(
                "annotation index out of range on page object {} {}",
                page_id.0, page_id.1
            )));
        }
        let kept: Vec<Object> = entries
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !indices.contains(index))
            .map(|(_, entry)| entry)
            .collect();
        removed += indices.len() as u32;
        graph::set_page_annotations(doc, page_id, kept)?;
    }

    Ok(removed)
}

/// Serialize to memory, then move the finished bytes into place
///
/// Two concurrent runs with distinct output paths never collide: the temp
/// file lives next to the final path and carries a unique name.
fn save_atomically(doc: &mut Document, output: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
    temp.write_all(&buffer)?;
    temp.persist(output).map_err(|e| Error::Io(e.error))?;

    Ok(())
}
