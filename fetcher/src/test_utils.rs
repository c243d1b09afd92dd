//! Shared test utilities for the kubefetch crate.

use crate::transport::{FetchError, Transport};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

/// A canned response served by [`StubTransport`].
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// A successful response with this body.
    Body(Vec<u8>),
    /// A non-success HTTP status.
    Status(u16),
    /// A connection failure before any body arrives.
    NetworkFailure,
    /// A body that is cut off after these bytes.
    Truncated(Vec<u8>),
}

/// Which trait method a recorded request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// [`Transport::get_text`].
    Text,
    /// [`Transport::download_to_file`].
    Download,
}

/// A stub implementation of [`Transport`] for testing.
///
/// Serves canned responses keyed by exact URL and records every request,
/// allowing tests to assert which URLs were fetched and how often.
/// Unrouted URLs answer HTTP 404.
#[derive(Debug, Default)]
pub struct StubTransport {
    routes: RefCell<HashMap<String, StubResponse>>,
    requests: RefCell<Vec<(RequestKind, String)>>,
}

impl StubTransport {
    /// Creates a stub with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `url` to a successful response with `body`.
    #[must_use]
    pub fn with_body(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.set(url, StubResponse::Body(body.into()));
        self
    }

    /// Route `url` to a non-success `status`.
    #[must_use]
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.set(url, StubResponse::Status(status));
        self
    }

    /// Route `url` to a connection failure.
    #[must_use]
    pub fn with_network_failure(self, url: &str) -> Self {
        self.set(url, StubResponse::NetworkFailure);
        self
    }

    /// Replace the response for `url`, e.g. between two runs.
    pub fn set(&self, url: &str, response: StubResponse) {
        self.routes.borrow_mut().insert(url.to_owned(), response);
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<(RequestKind, String)> {
        self.requests.borrow().clone()
    }

    /// Number of artefact downloads attempted so far.
    #[must_use]
    pub fn download_count(&self) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|(kind, _)| *kind == RequestKind::Download)
            .count()
    }

    /// Forget recorded requests, keeping routes.
    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }

    fn respond(&self, kind: RequestKind, url: &str) -> StubResponse {
        self.requests.borrow_mut().push((kind, url.to_owned()));
        self.routes
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or(StubResponse::Status(404))
    }
}

fn network_failure(url: &str) -> FetchError {
    FetchError::Network {
        url: url.to_owned(),
        reason: "stubbed connection failure".to_owned(),
    }
}

impl Transport for StubTransport {
    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        match self.respond(RequestKind::Text, url) {
            StubResponse::Body(body) => Ok(String::from_utf8_lossy(&body).into_owned()),
            StubResponse::Status(status) => Err(FetchError::Status {
                url: url.to_owned(),
                status,
            }),
            StubResponse::NetworkFailure | StubResponse::Truncated(_) => Err(network_failure(url)),
        }
    }

    fn download_to_file(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        match self.respond(RequestKind::Download, url) {
            StubResponse::Body(body) => std::fs::write(dest, body).map_err(FetchError::Io),
            StubResponse::Status(status) => Err(FetchError::Status {
                url: url.to_owned(),
                status,
            }),
            StubResponse::NetworkFailure => Err(network_failure(url)),
            StubResponse::Truncated(partial) => {
                std::fs::write(dest, partial)?;
                Err(network_failure(url))
            }
        }
    }
}

/// Lowercase hex SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Build a clear-signed checksum manifest listing `records` as
/// `(hash, filename)` pairs.
#[must_use]
pub fn clearsigned_manifest(records: &[(&str, &str)]) -> String {
    let mut body = String::from("-----BEGIN PGP SIGNED MESSAGE-----\nHash: SHA256\n\n");
    for (hash, filename) in records {
        body.push_str(hash);
        body.push_str("  ");
        body.push_str(filename);
        body.push('\n');
    }
    body.push_str("-----BEGIN PGP SIGNATURE-----\n\niQEzBAEBCAAdFiEE\n-----END PGP SIGNATURE-----\n");
    body
}

/// A GitHub release-API body carrying `tag`.
#[must_use]
pub fn release_json(tag: &str) -> String {
    format!(r#"{{"url":"https://api.github.com/x","tag_name":"{tag}","draft":false}}"#)
}
