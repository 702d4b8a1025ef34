//! Watermark detection
//!
//! Walks a document's page tree and classifies XObjects and link
//! annotations against the configured signature. The classification pass is
//! shared with the remover so that detect-then-remove on an unmodified file
//! always agrees with itself.

use std::collections::BTreeSet;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::config::CleanConfig;
use crate::error::{Error, Result};
use crate::pdf::graph;

/// What kind of artifact a removal target is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// An image or form XObject painted onto one or more pages
    Image,
    /// A link annotation pointing at a watermark domain
    Link,
}

/// One unit of removal work, produced by the detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalTarget {
    pub kind: TargetKind,
    /// The artifact's object id. For a link annotation stored directly
    /// inside the Annots array (no id of its own) this is the owning
    /// page's id.
    pub object_id: ObjectId,
    /// Every page that references the artifact
    pub page_ids: BTreeSet<ObjectId>,
}

/// Outcome of scanning a document
///
/// "Nothing found" is an expected result of a successful scan, not an
/// error, so it gets its own variant rather than an empty-vec convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Watermark artifacts were found; removal is worthwhile
    Found(Vec<RemovalTarget>),
    /// The document carries no recognizable watermark artifacts
    Clean,
}

impl ScanOutcome {
    /// Targets found by the scan (empty when clean)
    pub fn targets(&self) -> &[RemovalTarget] {
        match self {
            ScanOutcome::Found(targets) => targets,
            ScanOutcome::Clean => &[],
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, ScanOutcome::Clean)
    }
}

/// Scans PDF files for watermark artifacts
#[derive(Debug, Clone, Default)]
pub struct WatermarkDetector {
    config: CleanConfig,
}

impl WatermarkDetector {
    /// Detector with the default issuer configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector with an explicit configuration
    pub fn with_config(config: CleanConfig) -> Self {
        Self { config }
    }

    /// Scan a PDF for watermark artifacts
    ///
    /// Structural failures (unreadable, encrypted, not a PDF, zero pages)
    /// are returned as errors; a well-formed document with no artifacts
    /// yields `ScanOutcome::Clean`. Target order is image targets in
    /// first-appearance page order, then link targets in page order, and is
    /// deterministic for a fixed input.
    pub fn identify_watermarks(&self, path: &Path) -> Result<ScanOutcome> {
        let doc = graph::load_document(path)?;
        let classification = classify_document(&doc, &self.config)?;

        let mut targets = Vec::new();
        for image in &classification.images {
            targets.push(RemovalTarget {
                kind: TargetKind::Image,
                object_id: image.object_id,
                page_ids: image.usages.iter().map(|usage| usage.page_id).collect(),
            });
        }
        for link in &classification.links {
            targets.push(RemovalTarget {
                kind: TargetKind::Link,
                object_id: link.annot_id.unwrap_or(link.page_id),
                page_ids: BTreeSet::from([link.page_id]),
            });
        }

        if targets.is_empty() {
            Ok(ScanOutcome::Clean)
        } else {
            Ok(ScanOutcome::Found(targets))
        }
    }
}

/// One page's use of a watermark image, by resource name
#[derive(Debug, Clone)]
pub(crate) struct ImageUsage {
    pub page_id: ObjectId,
    pub name: Vec<u8>,
}

/// A distinct watermark-classified XObject and everywhere it is used
#[derive(Debug, Clone)]
pub(crate) struct ImageHit {
    pub object_id: ObjectId,
    pub usages: Vec<ImageUsage>,
}

/// A watermark-classified link annotation entry
#[derive(Debug, Clone)]
pub(crate) struct LinkHit {
    pub page_id: ObjectId,
    /// Index of the entry within the page's Annots array
    pub index: usize,
    /// The annotation's own id when the entry is an indirect reference
    pub annot_id: Option<ObjectId>,
}

/// Full classification of one document
#[derive(Debug, Clone, Default)]
pub(crate) struct Classification {
    pub images: Vec<ImageHit>,
    pub links: Vec<LinkHit>,
}

/// Classify every XObject and annotation in the document
///
/// This is the single source of truth for "is this a watermark": the
/// detector reports its output and the remover executes it.
pub(crate) fn classify_document(doc: &Document, config: &CleanConfig) -> Result<Classification> {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(Error::Malformed("document has no pages".to_string()));
    }
    let page_count = pages.len();

    // Collect XObject usage across pages, first-seen order, so that one
    // image object shared by N pages becomes one candidate with N usages.
    let mut candidates: Vec<ImageHit> = Vec::new();
    for (_, page_id) in pages.iter() {
        for (name, object_id) in graph::page_xobjects(doc, *page_id) {
            let usage = ImageUsage { page_id: *page_id, name };
            match candidates.iter_mut().find(|hit| hit.object_id == object_id) {
                Some(hit) => hit.usages.push(usage),
                None => candidates.push(ImageHit { object_id, usages: vec![usage] }),
            }
        }
    }

    let mut images = Vec::new();
    for candidate in candidates {
        let Ok(stream) = doc
            .get_object(candidate.object_id)
            .and_then(Object::as_stream)
        else {
            continue;
        };
        let extent = graph::xobject_extent(doc, stream);
        if extent.is_none() && stream.dict.get(b"Subtype").is_ok() {
            // Subtype present but neither Image nor Form
            continue;
        }
        let pages_using: BTreeSet<ObjectId> = candidate
            .usages
            .iter()
            .map(|usage| usage.page_id)
            .collect();
        // Match signatures against decoded bytes where a filter applies
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        if config
            .image
            .is_watermark(&content, extent, pages_using.len(), page_count)
        {
            images.push(candidate);
        }
    }

    let mut links = Vec::new();
    for (_, page_id) in pages.iter() {
        for (index, entry) in graph::page_annotation_entries(doc, *page_id)
            .iter()
            .enumerate()
        {
            let Some(uri) = graph::annotation_uri(doc, entry) else {
                continue;
            };
            if config.matches_uri(&uri) {
                links.push(LinkHit {
                    page_id: *page_id,
                    index,
                    annot_id: entry.as_reference().ok(),
                });
            }
        }
    }

    Ok(Classification { images, links })
}
