//! Trait seams for the download pipeline.
//!
//! The transport abstraction allows dependency injection and easier testing:
//! the chunked downloader's partitioning, progress accounting, and
//! completion checks are all exercised against in-memory transports.

use super::download::ByteRange;
use super::error::ManagerResult;

/// What a size probe learned about a remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceProbe {
    /// Total size in bytes, if the server advertised one.
    pub total_size: Option<u64>,
    /// Whether the server advertises byte-range support.
    pub accepts_ranges: bool,
}

/// Consumer of streamed response chunks.
pub type ChunkSink<'a> = dyn FnMut(&[u8]) -> ManagerResult<()> + 'a;

/// Transport for probing and fetching a remote resource, optionally by range.
pub trait RangeTransport: Send + Sync {
    /// Determine the resource's size and range support without fetching it.
    fn probe(&self, url: &str) -> ManagerResult<ResourceProbe>;

    /// Stream the resource (or the given byte range of it) into `sink`.
    ///
    /// With a range, the transport must fail with
    /// [`ManagerError::RangeNotSupported`] if the server ignores the header
    /// and answers with the full resource. Returns the number of bytes
    /// delivered, which may fall short of the request if the connection
    /// drops; completion accounting is the caller's job.
    ///
    /// [`ManagerError::RangeNotSupported`]: super::error::ManagerError::RangeNotSupported
    fn fetch(
        &self,
        url: &str,
        range: Option<ByteRange>,
        sink: &mut ChunkSink<'_>,
    ) -> ManagerResult<u64>;
}
