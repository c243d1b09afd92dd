//! SHA-256 file hashing and the local up-to-date check.
//!
//! One digest algorithm (SHA-256, lowercase hex) is used for every
//! component. Comparisons against upstream hashes are byte-exact: an
//! uppercase upstream digest never matches.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Compute the SHA-256 digest of a file as lowercase hex.
///
/// Reads the file in chunks to keep memory use bounded.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_sha256(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUF_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Return true when `path` is a regular file whose digest equals `expected`.
///
/// Missing paths and directories are not up to date. Hashing failures are
/// logged and reported as not up to date so that the caller re-downloads
/// rather than aborting.
///
/// # Examples
///
/// ```
/// use kubefetch::digest::is_up_to_date;
/// use std::path::Path;
///
/// assert!(!is_up_to_date(Path::new("/nonexistent/kubectl"), "abc123"));
/// ```
#[must_use]
pub fn is_up_to_date(path: &Path, expected: &str) -> bool {
    match fs::metadata(path) {
        Ok(meta) if !meta.is_dir() => {}
        _ => return false,
    }
    match compute_sha256(path) {
        Ok(actual) => actual == expected,
        Err(e) => {
            log::warn!("could not hash {}: {e}; treating as stale", path.display());
            false
        }
    }
}
