//! HTTP transport for version, checksum, and artefact requests.
//!
//! Provides a trait-based abstraction over the blocking HTTP client so the
//! pipeline can be exercised without network access. Every request is a
//! single unauthenticated GET bounded by one global timeout; there is no
//! retry.

use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::{KubefetchError, Result};

/// Default per-request timeout covering connect, headers, and body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for issuing outbound GET requests.
///
/// URLs passed to a transport have already been through the configured
/// [`UrlTransform`](crate::transform::UrlTransform).
///
/// # Examples
///
/// ```
/// use kubefetch::transport::{DEFAULT_TIMEOUT, UreqTransport};
///
/// let transport = UreqTransport::new(None, DEFAULT_TIMEOUT).expect("no proxy");
/// // Use transport.get_text("https://dl.k8s.io/release/stable.txt") in production
/// # let _ = transport;
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Fetch `url` and return the response body as text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Status`] for non-success responses and
    /// [`FetchError::Network`] for connection or read failures.
    fn get_text(&self, url: &str) -> std::result::Result<String, FetchError>;

    /// Fetch `url` and stream the response body into `dest`.
    ///
    /// `dest` is created or truncated. On failure it may hold a partial
    /// body; callers own its cleanup.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file write fails.
    fn download_to_file(&self, url: &str, dest: &Path) -> std::result::Result<(), FetchError>;
}

/// Errors arising from a single outbound request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be completed (DNS, connect, TLS, timeout, body read).
    #[error("request to {url} failed: {reason}")]
    Network {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The response status code.
        status: u16,
    },

    /// I/O error writing the response body to disk.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// Blocking HTTP transport using `ureq`.
///
/// The agent is built once per run with the optional forward proxy and the
/// fixed request timeout, and is never reconfigured afterwards.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Build a transport routing through `proxy` when given.
    ///
    /// # Errors
    ///
    /// Returns [`KubefetchError::InvalidProxy`] if the proxy URL cannot be
    /// parsed.
    pub fn new(proxy: Option<&str>, timeout: Duration) -> Result<Self> {
        let parsed = proxy
            .map(|url| {
                ureq::Proxy::new(url).map_err(|e| KubefetchError::InvalidProxy {
                    url: url.to_owned(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        let mut builder = ureq::Agent::config_builder().timeout_global(Some(timeout));
        if parsed.is_some() {
            builder = builder.proxy(parsed);
        }
        Ok(Self {
            agent: ureq::Agent::new_with_config(builder.build()),
        })
    }
}

impl Transport for UreqTransport {
    fn get_text(&self, url: &str) -> std::result::Result<String, FetchError> {
        log::debug!("GET {url}");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .into_body()
            .read_to_string()
            .map_err(|e| FetchError::Network {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }

    fn download_to_file(&self, url: &str, dest: &Path) -> std::result::Result<(), FetchError> {
        log::debug!("GET {url} -> {}", dest.display());
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        let written = copy_body(url, response.into_body().as_reader(), &mut file)?;
        file.sync_all()?;
        log::trace!("wrote {written} bytes to {}", dest.display());
        Ok(())
    }
}

/// Reader adapter remembering whether the underlying read failed.
struct BodyReader<R> {
    inner: R,
    failed: bool,
}

impl<R: Read> Read for BodyReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).inspect_err(|_| self.failed = true)
    }
}

/// Stream `body` into `sink`.
///
/// Body read failures become [`FetchError::Network`]; write failures on the
/// sink (for example a full disk) become [`FetchError::Io`].
fn copy_body(
    url: &str,
    body: impl Read,
    sink: &mut impl Write,
) -> std::result::Result<u64, FetchError> {
    let mut reader = BodyReader {
        inner: body,
        failed: false,
    };
    io::copy(&mut reader, sink).map_err(|e| {
        if reader.failed {
            FetchError::Network {
                url: url.to_owned(),
                reason: e.to_string(),
            }
        } else {
            FetchError::Io(e)
        }
    })
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(status) => FetchError::Status {
            url: url.to_owned(),
            status: *status,
        },
        other => FetchError::Network {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
