//! Fetch-and-verify orchestration.
//!
//! For each component, strictly in order and one at a time:
//!
//! 1. Resolve the latest version.
//! 2. Render and transform the download and checksum URLs.
//! 3. Fetch the expected hash for the component's target filename.
//! 4. Skip when the artefact at the final path already has that hash.
//! 5. Download to the staging directory.
//! 6. Hash the staged file; discard it on mismatch.
//! 7. Promote the verified file to the final path.
//!
//! Every failure is scoped to its component. Nothing is placed at the final
//! path unless step 6 succeeded in the same run.

use camino::{Utf8Path, Utf8PathBuf};
use std::io;

use crate::checksum::{ChecksumError, fetch_expected_hash};
use crate::digest::{compute_sha256, is_up_to_date};
use crate::placement::promote;
use crate::registry::ComponentSpec;
use crate::transform::UrlTransform;
use crate::transport::{FetchError, Transport};
use crate::version::{ResolveError, resolve_version};

/// Directories and URL rewriting shared by every component in a run.
#[derive(Debug)]
pub struct FetchContext<'a> {
    /// Directory holding downloads pending verification.
    pub staging_dir: &'a Utf8Path,
    /// Directory holding verified artefacts at their final names.
    pub output_dir: &'a Utf8Path,
    /// Rewrite applied to every outbound URL.
    pub transform: &'a UrlTransform,
}

/// What happened to a component that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentOutcome {
    /// The final path already held the expected artefact; nothing was downloaded.
    Skipped {
        /// The final path that was checked.
        path: Utf8PathBuf,
        /// The digest that matched.
        digest: String,
    },
    /// A verified artefact was placed at the final path.
    Downloaded {
        /// The final path written.
        path: Utf8PathBuf,
        /// The verified digest.
        digest: String,
    },
}

/// Component-scoped failures.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The latest version could not be determined.
    #[error("version resolution failed: {0}")]
    Resolution(#[from] ResolveError),

    /// The expected hash could not be obtained; no download was attempted.
    #[error("failed to get remote hash: {0}")]
    HashRetrieval(#[from] ChecksumError),

    /// The artefact download failed; no file was promoted.
    #[error("download failed: {0}")]
    Download(#[source] FetchError),

    /// The downloaded artefact does not match the expected hash.
    #[error("hash mismatch: expected {expected}, got {actual}")]
    Integrity {
        /// The hash published upstream.
        expected: String,
        /// The hash of the downloaded bytes.
        actual: String,
    },

    /// Staging or placement on the local filesystem failed.
    #[error("failed to {operation} {path}: {source}")]
    Filesystem {
        /// What was being attempted.
        operation: &'static str,
        /// The path involved.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    /// A stable, machine-readable label for the failure class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Resolution(ResolveError::Fetch(fetch))
            | Self::HashRetrieval(ChecksumError::Fetch(fetch)) => fetch_kind(fetch),
            Self::Resolution(ResolveError::Resolution { .. }) => "resolution",
            Self::HashRetrieval(ChecksumError::NotFound { .. }) => "not_found",
            Self::HashRetrieval(ChecksumError::EmptyDocument) => "hash_retrieval",
            Self::Download(_) => "download",
            Self::Integrity { .. } => "integrity",
            Self::Filesystem { .. } => "filesystem",
        }
    }
}

const fn fetch_kind(err: &FetchError) -> &'static str {
    match err {
        FetchError::Network { .. } => "network",
        FetchError::Status { .. } => "http_status",
        FetchError::Io(_) => "filesystem",
    }
}

/// The result of processing one component.
#[derive(Debug)]
pub struct ComponentReport {
    /// The component identifier.
    pub component: &'static str,
    /// The resolved version, when resolution succeeded.
    pub version: Option<String>,
    /// The outcome or the failure.
    pub result: Result<ComponentOutcome, PipelineError>,
}

impl ComponentReport {
    /// Return true when the component failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// Per-component reports for one run, in processing order.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Reports in the order components were processed.
    pub components: Vec<ComponentReport>,
}

impl RunReport {
    /// Number of components downloaded and placed.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.count(|r| matches!(r.result, Ok(ComponentOutcome::Downloaded { .. })))
    }

    /// Number of components already up to date.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r.result, Ok(ComponentOutcome::Skipped { .. })))
    }

    /// Number of failed components.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(ComponentReport::is_failure)
    }

    fn count(&self, predicate: impl Fn(&ComponentReport) -> bool) -> usize {
        self.components.iter().filter(|r| predicate(r)).count()
    }
}

/// Process `specs` sequentially, invoking `on_report` after each one.
///
/// A failure never stops the remaining components.
pub fn run_all(
    context: &FetchContext<'_>,
    transport: &dyn Transport,
    specs: &[&ComponentSpec],
    on_report: &mut dyn FnMut(&ComponentReport),
) -> RunReport {
    let mut report = RunReport::default();
    for &spec in specs {
        let component = run_component(context, transport, spec);
        on_report(&component);
        report.components.push(component);
    }
    report
}

/// Resolve the latest version of `spec` and process it.
pub fn run_component(
    context: &FetchContext<'_>,
    transport: &dyn Transport,
    spec: &ComponentSpec,
) -> ComponentReport {
    let version_url = context.transform.apply(spec.version_url());
    match resolve_version(transport, &version_url) {
        Ok(version) => {
            let result = process_component(context, transport, spec, &version);
            if let Err(e) = &result {
                log::warn!("{spec} {version}: {e}");
            }
            ComponentReport {
                component: spec.id(),
                version: Some(version),
                result,
            }
        }
        Err(e) => {
            log::warn!("{spec}: {e}");
            ComponentReport {
                component: spec.id(),
                version: None,
                result: Err(e.into()),
            }
        }
    }
}

/// Fetch, verify, and place one component at an already-resolved `version`.
///
/// # Errors
///
/// Returns [`PipelineError::HashRetrieval`] before any download if the
/// expected hash cannot be obtained, [`PipelineError::Download`] or
/// [`PipelineError::Integrity`] if the staged file cannot be trusted, and
/// [`PipelineError::Filesystem`] if staging or placement fails. In every
/// error case the final path keeps its previous content.
pub fn process_component(
    context: &FetchContext<'_>,
    transport: &dyn Transport,
    spec: &ComponentSpec,
    version: &str,
) -> Result<ComponentOutcome, PipelineError> {
    let upstream = spec.release_urls(version);
    let download_url = context.transform.apply(&upstream.download);
    let checksum_url = context.transform.apply(&upstream.checksum);
    let target = spec.target_filename(version);
    let final_path = context.output_dir.join(spec.final_filename());
    log::info!("{spec} {version}: {download_url}");

    let expected = fetch_expected_hash(transport, &checksum_url, &target)?;

    if is_up_to_date(final_path.as_std_path(), &expected) {
        log::info!("{spec} {version}: already up to date");
        return Ok(ComponentOutcome::Skipped {
            path: final_path,
            digest: expected,
        });
    }

    let staged = context
        .staging_dir
        .join(staging_filename(&download_url, &target));
    if let Err(e) = transport.download_to_file(&download_url, staged.as_std_path()) {
        discard(&staged);
        return Err(PipelineError::Download(e));
    }

    let actual = match compute_sha256(staged.as_std_path()) {
        Ok(actual) => actual,
        Err(source) => {
            discard(&staged);
            return Err(PipelineError::Filesystem {
                operation: "hash",
                path: staged,
                source,
            });
        }
    };
    if actual != expected {
        discard(&staged);
        return Err(PipelineError::Integrity { expected, actual });
    }

    if let Err(source) = promote(staged.as_std_path(), final_path.as_std_path()) {
        discard(&staged);
        return Err(PipelineError::Filesystem {
            operation: "place",
            path: final_path,
            source,
        });
    }
    log::info!("{spec} {version}: placed at {final_path}");
    Ok(ComponentOutcome::Downloaded {
        path: final_path,
        digest: actual,
    })
}

/// Derive the staging filename from the last path segment of `url`.
///
/// Query strings and fragments are ignored. Falls back to `fallback` when
/// the segment is empty or a relative directory reference.
#[must_use]
pub fn staging_filename(url: &str, fallback: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some(segment) if !matches!(segment, "" | "." | "..") => segment.to_owned(),
        _ => fallback.to_owned(),
    }
}

/// Remove a staged file, ignoring absence.
fn discard(staged: &Utf8Path) {
    match std::fs::remove_file(staged) {
        Ok(()) => log::debug!("removed staged file {staged}"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("could not remove staged file {staged}: {e}"),
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
