//! Classification configuration
//!
//! The watermark-issuing domain and the image heuristic are configuration,
//! not constants, so the same process can run several configurations side
//! by side (production domain, test fixture domain).

use url::Url;

/// Configuration shared by the detector and the remover
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Hosts whose link annotations are watermark artifacts.
    /// Matching is case-insensitive, exact host or any subdomain.
    pub domains: Vec<String>,
    /// Heuristic for classifying image/form XObjects as watermarks
    pub image: ImageHeuristic,
}

/// Heuristic signature for watermark images
///
/// An XObject is classified as a watermark when its raw stream bytes start
/// with one of `byte_signatures`, or when its extent fits within
/// `max_width` x `max_height` AND it appears on at least
/// `min_page_coverage` of the document's pages. The known issuer stamps the
/// same small badge image onto every page, which is what the defaults
/// encode.
#[derive(Debug, Clone)]
pub struct ImageHeuristic {
    /// Maximum width (image pixels, or form BBox units) of a candidate
    pub max_width: i64,
    /// Maximum height of a candidate
    pub max_height: i64,
    /// Fraction of pages that must reference the object (0.0..=1.0)
    pub min_page_coverage: f64,
    /// Raw stream prefixes that identify the issuer's embedded image
    pub byte_signatures: Vec<Vec<u8>>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            domains: vec!["gamma.app".to_string()],
            image: ImageHeuristic::default(),
        }
    }
}

impl Default for ImageHeuristic {
    fn default() -> Self {
        Self {
            // The issuer badge is a small strip in the page corner.
            max_width: 400,
            max_height: 120,
            min_page_coverage: 1.0,
            byte_signatures: Vec::new(),
        }
    }
}

impl CleanConfig {
    /// Create a configuration for a single watermark domain
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domains: vec![domain.into()],
            ..Self::default()
        }
    }

    /// Check whether a host belongs to one of the watermark domains
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.domains.iter().any(|domain| {
            let domain = domain.to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{}", domain))
        })
    }

    /// Check whether a link annotation URI points at a watermark domain
    pub fn matches_uri(&self, uri: &str) -> bool {
        match Url::parse(uri) {
            Ok(url) => url.host_str().is_some_and(|host| self.matches_host(host)),
            // Scheme-less URIs occasionally appear in the wild
            Err(_) => Url::parse(&format!("https://{}", uri))
                .ok()
                .and_then(|url| url.host_str().map(|host| self.matches_host(host)))
                .unwrap_or(false),
        }
    }
}

impl ImageHeuristic {
    /// Apply the heuristic to one distinct XObject
    pub(crate) fn is_watermark(
        &self,
        raw_content: &[u8],
        dimensions: Option<(i64, i64)>,
        pages_using: usize,
        page_count: usize,
    ) -> bool {
        if self
            .byte_signatures
            .iter()
            .any(|sig| !sig.is_empty() && raw_content.starts_with(sig))
        {
            return true;
        }

        let Some((width, height)) = dimensions else {
            return false;
        };
        if width > self.max_width || height > self.max_height {
            return false;
        }
        if page_count == 0 {
            return false;
        }
        (pages_using as f64) / (page_count as f64) >= self.min_page_coverage
    }
}
