//! Release catalog scraped from the mirror's directory listing.
//!
//! The mirror serves plain directory-index HTML at two levels: the root
//! lists major version folders (`Blender4.0/`), each folder lists archive
//! files (`blender-4.0.1-windows-x64.zip`). There is no API contract:
//! discovery parses anchor link text and filters by naming convention, so it
//! must tolerate unrelated anchors (parent links, readme files, checksums).
//!
//! The parsing strategy is isolated behind [`ReleaseCatalog`] so it can be
//! swapped without touching the rest of the engine.

mod http;

pub use http::{HttpClient, ReqwestClient};

use scraper::{Html, Selector};
use thiserror::Error;

/// Anchor-text prefix identifying a major version folder on the mirror.
const MAJOR_VERSION_PREFIX: &str = "Blender";

/// Archive-name template prefix; the major version's numeric suffix is
/// substituted in to filter minor version listings.
const ARCHIVE_NAME_PREFIX: &str = "blender-";

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while scraping the release mirror.
///
/// An empty listing is not an error: a reachable page without matching
/// anchors yields an empty sequence, which callers must treat as "nothing
/// available" rather than a failure.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The mirror answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },
}

/// Scrapes the release mirror into a selectable version catalog.
pub struct ReleaseCatalog<C: HttpClient> {
    client: C,
    base_url: String,
}

impl ReleaseCatalog<ReqwestClient> {
    /// Create a catalog over the live mirror.
    pub fn new(base_url: impl Into<String>) -> CatalogResult<Self> {
        Ok(Self::with_client(ReqwestClient::new()?, base_url))
    }
}

impl<C: HttpClient> ReleaseCatalog<C> {
    /// Create a catalog with an explicit HTTP client (used by tests).
    pub fn with_client(client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// List major version folders at the mirror root, in document order.
    pub fn list_major_versions(&self) -> CatalogResult<Vec<String>> {
        let url = format!("{}/", self.base_url);
        let body = self.client.get(&url)?;

        let majors: Vec<String> = anchor_texts(&body)
            .into_iter()
            .filter(|text| text.starts_with(MAJOR_VERSION_PREFIX))
            .map(|text| text.trim_end_matches('/').to_string())
            .collect();

        tracing::debug!("mirror root listed {} major version(s)", majors.len());
        Ok(majors)
    }

    /// List downloadable archives inside a major version folder.
    ///
    /// Keeps anchors whose text starts with the archive-name template
    /// instantiated with the major version's numeric suffix, so
    /// `Blender4.0` matches `blender-4.0.1-windows-x64.zip` but not
    /// `readme.txt` or archives of another release line.
    pub fn list_minor_versions(&self, major_version: &str) -> CatalogResult<Vec<String>> {
        let url = format!("{}/{}/", self.base_url, major_version);
        let body = self.client.get(&url)?;
        let prefix = archive_prefix(major_version);

        let minors: Vec<String> = anchor_texts(&body)
            .into_iter()
            .filter(|text| text.starts_with(&prefix))
            .map(|text| text.trim_end_matches('/').to_string())
            .collect();

        tracing::debug!(
            "{} listed {} minor version(s)",
            major_version,
            minors.len()
        );
        Ok(minors)
    }

    /// Download URL of a specific archive.
    pub fn archive_url(&self, major_version: &str, minor_version: &str) -> String {
        format!("{}/{}/{}", self.base_url, major_version, minor_version)
    }
}

/// Archive filename prefix for a major version folder.
///
/// `Blender4.0` → `blender-4.0`.
fn archive_prefix(major_version: &str) -> String {
    let numeric = major_version
        .strip_prefix(MAJOR_VERSION_PREFIX)
        .unwrap_or(major_version);
    format!("{}{}", ARCHIVE_NAME_PREFIX, numeric)
}

/// Extract the trimmed text of every anchor element in document order.
fn anchor_texts(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a").expect("anchor selector is valid");

    document
        .select(&selector)
        .map(|anchor| anchor.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}
