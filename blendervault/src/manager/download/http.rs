//! HTTP transport for the chunked downloader.
//!
//! Implements [`RangeTransport`] with a blocking reqwest client:
//! - size probe via HEAD, falling back to a GET whose body is never read
//! - ranged GET (`Range: bytes=start-end`) streamed chunk by chunk
//! - detection of servers that ignore the `Range` header

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;

use super::partition::ByteRange;
use crate::manager::error::{ManagerError, ManagerResult};
use crate::manager::traits::{ChunkSink, RangeTransport, ResourceProbe};

/// Default timeout for HTTP requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Buffer size for streaming reads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Blocking HTTP transport backed by reqwest.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the default timeout.
    pub fn new() -> ManagerResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a transport with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> ManagerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ManagerError::Network {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    /// Probe via a GET request, reading headers only.
    ///
    /// Used when the server rejects HEAD; the response body is dropped
    /// unread.
    fn probe_via_get(&self, url: &str) -> ManagerResult<ResourceProbe> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ManagerError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(probe_from_headers(response.headers()))
    }
}

impl RangeTransport for HttpTransport {
    fn probe(&self, url: &str) -> ManagerResult<ResourceProbe> {
        let head = self.client.head(url).send();

        match head {
            Ok(response) if response.status().is_success() => {
                Ok(probe_from_headers(response.headers()))
            }
            // HEAD unsupported or rejected: fall back to a GET probe.
            _ => self.probe_via_get(url),
        }
    }

    fn fetch(
        &self,
        url: &str,
        range: Option<ByteRange>,
        sink: &mut ChunkSink<'_>,
    ) -> ManagerResult<u64> {
        let mut request = self.client.get(url);
        if let Some(range) = range {
            request = request.header("Range", range.header_value());
        }

        let mut response = request.send().map_err(|e| ManagerError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        match range {
            Some(_) => {
                // A ranged request must be answered with 206 Partial Content;
                // 200 means the server ignored the header.
                if status.as_u16() == 200 {
                    return Err(ManagerError::RangeNotSupported {
                        url: url.to_string(),
                    });
                }
                if status.as_u16() != 206 {
                    return Err(ManagerError::Http {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
            }
            None => {
                if !status.is_success() {
                    return Err(ManagerError::Http {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
            }
        }

        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut delivered = 0u64;

        loop {
            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| ManagerError::Network {
                    url: url.to_string(),
                    reason: format!("read error: {}", e),
                })?;

            if bytes_read == 0 {
                break;
            }

            sink(&buffer[..bytes_read])?;
            delivered += bytes_read as u64;
        }

        Ok(delivered)
    }
}

fn probe_from_headers(headers: &reqwest::header::HeaderMap) -> ResourceProbe {
    let total_size = headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|size| *size > 0);

    let accepts_ranges = headers
        .get("accept-ranges")
        .map(|v| v.to_str().unwrap_or("") == "bytes")
        .unwrap_or(false);

    ResourceProbe {
        total_size,
        accepts_ranges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn test_probe_from_headers_full() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", HeaderValue::from_static("1024"));
        headers.insert("accept-ranges", HeaderValue::from_static("bytes"));

        let probe = probe_from_headers(&headers);
        assert_eq!(probe.total_size, Some(1024));
        assert!(probe.accepts_ranges);
    }

    #[test]
    fn test_probe_from_headers_zero_length_is_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", HeaderValue::from_static("0"));

        let probe = probe_from_headers(&headers);
        assert_eq!(probe.total_size, None);
        assert!(!probe.accepts_ranges);
    }

    #[test]
    fn test_probe_from_headers_none_advertised() {
        let headers = HeaderMap::new();

        let probe = probe_from_headers(&headers);
        assert_eq!(probe.total_size, None);
        assert!(!probe.accepts_ranges);
    }

    #[test]
    fn test_probe_rejects_non_byte_ranges() {
        let mut headers = HeaderMap::new();
        headers.insert("accept-ranges", HeaderValue::from_static("none"));

        let probe = probe_from_headers(&headers);
        assert!(!probe.accepts_ranges);
    }
}
