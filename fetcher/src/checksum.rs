//! Checksum document retrieval and parsing.
//!
//! Upstream checksum documents come in two shapes:
//!
//! - A plain `sha256sum`-style file. The first whitespace-delimited token is
//!   the hash, whatever filename follows it.
//! - A clear-signed manifest listing many `hash  filename` records between
//!   the signed-message header and the signature block. The record whose
//!   filename equals the target exactly supplies the hash.
//!
//! The format is chosen by the presence of the signed-message header
//! anywhere in the body. The signature itself is never checked; the parser
//! only honours the textual markers.

use crate::transport::{FetchError, Transport};

/// Header line opening a clear-signed message.
pub const SIGNED_MESSAGE_HEADER: &str = "-----BEGIN PGP SIGNED MESSAGE-----";

/// Header line opening the detached signature block.
pub const SIGNATURE_HEADER: &str = "-----BEGIN PGP SIGNATURE-----";

/// Armor header naming the digest algorithm inside a signed message.
const HASH_ARMOR_PREFIX: &str = "Hash: ";

/// Errors arising from checksum retrieval.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// The checksum document could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A clear-signed manifest has no record for the target filename.
    #[error("hash not found for file: {target}")]
    NotFound {
        /// The filename that was looked up.
        target: String,
    },

    /// A plain checksum document contained no tokens.
    #[error("checksum document is empty")]
    EmptyDocument,
}

/// The two recognised checksum document shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumFormat {
    /// A single hash token, optionally followed by a filename.
    Plain,
    /// A clear-signed multi-record manifest.
    ClearSigned,
}

impl ChecksumFormat {
    /// Detect the format of `body`.
    #[must_use]
    pub fn detect(body: &str) -> Self {
        if body.contains(SIGNED_MESSAGE_HEADER) {
            Self::ClearSigned
        } else {
            Self::Plain
        }
    }
}

/// Fetch `url` and return the expected hash for `target`.
///
/// # Errors
///
/// Returns [`ChecksumError::Fetch`] on transport or status failures, and
/// the errors of [`parse_checksum_document`] otherwise.
pub fn fetch_expected_hash(
    transport: &dyn Transport,
    url: &str,
    target: &str,
) -> Result<String, ChecksumError> {
    let body = transport.get_text(url)?;
    let hash = parse_checksum_document(&body, target)?;
    log::debug!("expected hash for {target}: {hash}");
    Ok(hash.to_owned())
}

/// Parse a checksum document of either shape.
///
/// # Errors
///
/// Returns [`ChecksumError::NotFound`] when a clear-signed manifest lacks
/// `target` and [`ChecksumError::EmptyDocument`] when a plain document has
/// no tokens.
///
/// # Examples
///
/// ```
/// use kubefetch::checksum::parse_checksum_document;
///
/// let plain = "deadbeef  containerd-1.7.0-linux-amd64.tar.gz\n";
/// assert_eq!(parse_checksum_document(plain, "anything").ok(), Some("deadbeef"));
/// ```
pub fn parse_checksum_document<'a>(body: &'a str, target: &str) -> Result<&'a str, ChecksumError> {
    match ChecksumFormat::detect(body) {
        ChecksumFormat::ClearSigned => parse_clearsigned_manifest(body, target),
        ChecksumFormat::Plain => body
            .split_whitespace()
            .next()
            .ok_or(ChecksumError::EmptyDocument),
    }
}

/// Find the hash recorded for `target` in a clear-signed manifest.
///
/// Scanning is a single pass over lines. Nothing is considered before the
/// signed-message header, and scanning stops at the signature header.
/// Within the message, `Hash:` armor lines, blank lines, and lines with
/// fewer than two fields are skipped. The first record whose second field
/// equals `target` wins.
///
/// # Errors
///
/// Returns [`ChecksumError::NotFound`] if no record matches.
pub fn parse_clearsigned_manifest<'a>(
    body: &'a str,
    target: &str,
) -> Result<&'a str, ChecksumError> {
    let mut in_message = false;
    for line in body.lines() {
        if line.starts_with(SIGNED_MESSAGE_HEADER) {
            in_message = true;
            continue;
        }
        if line.starts_with(SIGNATURE_HEADER) {
            break;
        }
        if !in_message || line.starts_with(HASH_ARMOR_PREFIX) {
            continue;
        }
        let mut fields = line.split_whitespace();
        if let (Some(hash), Some(filename)) = (fields.next(), fields.next()) {
            if filename == target {
                return Ok(hash);
            }
        }
    }
    Err(ChecksumError::NotFound {
        target: target.to_owned(),
    })
}

#[cfg(test)]
#[path = "checksum_tests.rs"]
mod tests;
