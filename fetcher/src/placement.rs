//! Promotion of verified artefacts to their final path.
//!
//! A staged file is renamed over the final path. When the rename fails
//! (typically because staging and output live on different filesystems),
//! the content is copied into a temporary file beside the final path and
//! that file is renamed into place. Either way the final name only ever
//! refers to the previous artefact or the complete new one.

use std::fs;
use std::io;
use std::path::Path;

/// How a staged artefact reached its final path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMethod {
    /// Same-filesystem rename.
    Renamed,
    /// Copy into a sibling temporary file, then rename.
    Copied,
}

/// Move `staged` to `final_path`, replacing any existing file.
///
/// # Errors
///
/// Returns an error if neither the rename nor the copy fallback succeeds.
/// On error `final_path` is left untouched; `staged` is left in place.
pub fn promote(staged: &Path, final_path: &Path) -> io::Result<PlacementMethod> {
    match fs::rename(staged, final_path) {
        Ok(()) => Ok(PlacementMethod::Renamed),
        Err(e) => {
            log::debug!(
                "rename {} -> {} failed ({e}); copying instead",
                staged.display(),
                final_path.display()
            );
            copy_then_replace(staged, final_path)?;
            if let Err(e) = fs::remove_file(staged) {
                log::warn!("could not remove staged file {}: {e}", staged.display());
            }
            Ok(PlacementMethod::Copied)
        }
    }
}

/// Copy `staged` into a temporary sibling of `final_path` and persist it.
fn copy_then_replace(staged: &Path, final_path: &Path) -> io::Result<()> {
    let parent = final_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut sibling = tempfile::NamedTempFile::new_in(parent)?;
    let mut source = fs::File::open(staged)?;
    io::copy(&mut source, sibling.as_file_mut())?;
    sibling.as_file().sync_all()?;
    copy_permissions(staged, sibling.path())?;
    sibling.persist(final_path).map_err(|e| e.error)?;
    Ok(())
}

fn copy_permissions(from: &Path, to: &Path) -> io::Result<()> {
    let permissions = fs::metadata(from)?.permissions();
    fs::set_permissions(to, permissions)
}
