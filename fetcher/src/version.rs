//! Latest-version discovery.
//!
//! Two upstream shapes are supported. GitHub release-API documents are
//! recognised by their host in the URL and scanned for the first
//! `"tag_name":` key; the quoted value after it is the version. Any other
//! URL is treated as a plain-text version file whose trimmed body is the
//! version. Neither path validates version syntax.
//!
//! The release-API scan is a substring search, not a JSON parse. Only the
//! bytes right after the first key matter.

use crate::transport::{FetchError, Transport};

/// URL substring identifying a release-API JSON document.
pub const RELEASE_API_MARKER: &str = "api.github.com";

/// Key token whose quoted value carries the release tag.
pub const TAG_KEY: &str = "\"tag_name\":";

/// Errors arising from version discovery.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The version document could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The document was fetched but no version could be extracted.
    #[error("no version found at {url}: {reason}")]
    Resolution {
        /// The version-discovery URL.
        url: String,
        /// Why extraction failed.
        reason: &'static str,
    },
}

/// Return true when `url` points at a release-API JSON document.
#[must_use]
pub fn is_release_api(url: &str) -> bool {
    url.contains(RELEASE_API_MARKER)
}

/// Fetch `url` and extract the latest version string.
///
/// # Errors
///
/// Returns [`ResolveError::Fetch`] if the request fails and
/// [`ResolveError::Resolution`] if the body yields no version.
pub fn resolve_version(transport: &dyn Transport, url: &str) -> Result<String, ResolveError> {
    let body = transport.get_text(url)?;
    let extracted = if is_release_api(url) {
        extract_tag_name(&body).map_err(|reason| ResolveError::Resolution {
            url: url.to_owned(),
            reason,
        })?
    } else {
        extract_plain_version(&body).ok_or_else(|| ResolveError::Resolution {
            url: url.to_owned(),
            reason: "version file is empty",
        })?
    };
    log::debug!("resolved {url} to {extracted}");
    Ok(extracted.to_owned())
}

/// Extract the quoted value immediately following the first [`TAG_KEY`].
///
/// # Errors
///
/// Returns a static reason when the key is absent, is not followed by a
/// double quote, the value is unterminated, or the value is empty.
///
/// # Examples
///
/// ```
/// use kubefetch::version::extract_tag_name;
///
/// let body = r#"{"tag_name":"v1.29.2","other":"x"}"#;
/// assert_eq!(extract_tag_name(body), Ok("v1.29.2"));
/// assert!(extract_tag_name(r#"{"name":"v1"}"#).is_err());
/// ```
pub fn extract_tag_name(body: &str) -> Result<&str, &'static str> {
    let (_, after_key) = body
        .split_once(TAG_KEY)
        .ok_or("tag_name key not present")?;
    let value = after_key
        .strip_prefix('"')
        .ok_or("tag_name value is not a string")?;
    let (tag, _) = value
        .split_once('"')
        .ok_or("tag_name value is unterminated")?;
    if tag.is_empty() {
        return Err("tag_name value is empty");
    }
    Ok(tag)
}

/// Return the trimmed body of a plain-text version file, if non-empty.
#[must_use]
pub fn extract_plain_version(body: &str) -> Option<&str> {
    let trimmed = body.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
