//! Output formatting for run reports.
//!
//! Human-readable status and summary lines go to stderr as components
//! finish; `--json` renders the whole [`RunReport`] for machine consumers.

use serde::Serialize;
use std::fmt::Display;
use std::io::Write;

use crate::pipeline::{ComponentOutcome, ComponentReport, RunReport};

/// Placeholder shown when a component's version was never resolved.
const UNKNOWN_VERSION: &str = "?";

/// Write `message` and a newline to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; a closed stderr must not abort the run.
    }
}

/// Format the one-line status for a finished component.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use kubefetch::output::status_line;
/// use kubefetch::pipeline::{ComponentOutcome, ComponentReport};
///
/// let report = ComponentReport {
///     component: "kubectl",
///     version: Some("v1.29.2".to_owned()),
///     result: Ok(ComponentOutcome::Skipped {
///         path: Utf8PathBuf::from("bin/kubectl"),
///         digest: "abc123".to_owned(),
///     }),
/// };
/// assert_eq!(status_line(&report), "kubectl v1.29.2: up to date");
/// ```
#[must_use]
pub fn status_line(report: &ComponentReport) -> String {
    let version = report.version.as_deref().unwrap_or(UNKNOWN_VERSION);
    let status = match &report.result {
        Ok(ComponentOutcome::Downloaded { .. }) => "downloaded".to_owned(),
        Ok(ComponentOutcome::Skipped { .. }) => "up to date".to_owned(),
        Err(e) => format!("failed: {e}"),
    };
    format!("{} {version}: {status}", report.component)
}

/// Format the closing tally for a run.
#[must_use]
pub fn summary_line(report: &RunReport) -> String {
    format!(
        "{} downloaded, {} up to date, {} failed",
        report.downloaded(),
        report.skipped(),
        report.failed()
    )
}

/// Format a run report as pretty-printed JSON.
///
/// # Examples
///
/// ```
/// use kubefetch::output::format_json;
/// use kubefetch::pipeline::RunReport;
///
/// let json = format_json(&RunReport::default());
/// assert!(json.contains("\"components\""));
/// ```
#[must_use]
pub fn format_json(report: &RunReport) -> String {
    let json_data = RunReportJson::from_report(report);
    serde_json::to_string_pretty(&json_data).unwrap_or_else(|_| "{}".to_owned())
}

/// JSON-serializable representation of a run.
#[derive(Debug, Serialize)]
pub struct RunReportJson<'a> {
    /// One entry per processed component, in order.
    pub components: Vec<ComponentJson<'a>>,
    /// Count of components downloaded and placed.
    pub downloaded: usize,
    /// Count of components already up to date.
    pub up_to_date: usize,
    /// Count of failed components.
    pub failed: usize,
}

/// JSON-serializable representation of one component.
#[derive(Debug, Serialize)]
pub struct ComponentJson<'a> {
    /// Component identifier.
    pub component: &'a str,
    /// Resolved version, when known.
    pub version: Option<&'a str>,
    /// One of `downloaded`, `up_to_date`, or `failed`.
    pub status: &'static str,
    /// Final artefact path for successful components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Verified SHA-256 for successful components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<&'a str>,
    /// Failure class for failed components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    /// Failure message for failed components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> RunReportJson<'a> {
    /// Build the JSON view of `report`.
    #[must_use]
    pub fn from_report(report: &'a RunReport) -> Self {
        Self {
            components: report.components.iter().map(ComponentJson::from_report).collect(),
            downloaded: report.downloaded(),
            up_to_date: report.skipped(),
            failed: report.failed(),
        }
    }
}

impl<'a> ComponentJson<'a> {
    /// Build the JSON view of one component report.
    #[must_use]
    pub fn from_report(report: &'a ComponentReport) -> Self {
        let base = Self {
            component: report.component,
            version: report.version.as_deref(),
            status: "failed",
            path: None,
            sha256: None,
            error_kind: None,
            error: None,
        };
        match &report.result {
            Ok(ComponentOutcome::Downloaded { path, digest }) => Self {
                status: "downloaded",
                path: Some(path.to_string()),
                sha256: Some(digest.as_str()),
                ..base
            },
            Ok(ComponentOutcome::Skipped { path, digest }) => Self {
                status: "up_to_date",
                path: Some(path.to_string()),
                sha256: Some(digest.as_str()),
                ..base
            },
            Err(e) => Self {
                error_kind: Some(e.kind()),
                error: Some(e.to_string()),
                ..base
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineError;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    fn downloaded(component: &'static str, version: &str) -> ComponentReport {
        ComponentReport {
            component,
            version: Some(version.to_owned()),
            result: Ok(ComponentOutcome::Downloaded {
                path: Utf8PathBuf::from(format!("bin/{component}")),
                digest: "abc123".to_owned(),
            }),
        }
    }

    fn integrity_failure(component: &'static str) -> ComponentReport {
        ComponentReport {
            component,
            version: Some("v3.14.2".to_owned()),
            result: Err(PipelineError::Integrity {
                expected: "abc".to_owned(),
                actual: "def".to_owned(),
            }),
        }
    }

    #[test]
    fn downloaded_status_line() {
        assert_eq!(
            status_line(&downloaded("kubectl", "v1.29.2")),
            "kubectl v1.29.2: downloaded"
        );
    }

    #[test]
    fn failed_status_line_includes_reason() {
        assert_eq!(
            status_line(&integrity_failure("helm")),
            "helm v3.14.2: failed: hash mismatch: expected abc, got def"
        );
    }

    #[test]
    fn unresolved_version_is_shown_as_placeholder() {
        let report = ComponentReport {
            component: "runc",
            version: None,
            result: Err(PipelineError::Filesystem {
                operation: "place",
                path: Utf8PathBuf::from("bin/runc"),
                source: std::io::Error::other("denied"),
            }),
        };
        assert!(status_line(&report).starts_with("runc ?: failed: "));
    }

    #[rstest]
    #[case::empty(Vec::new(), "0 downloaded, 0 up to date, 0 failed")]
    #[case::mixed(
        vec![downloaded("kubeadm", "v1.29.2"), integrity_failure("helm")],
        "1 downloaded, 0 up to date, 1 failed"
    )]
    fn summary_line_counts(#[case] components: Vec<ComponentReport>, #[case] expected: &str) {
        assert_eq!(summary_line(&RunReport { components }), expected);
    }

    #[test]
    fn json_reports_status_and_error_kind() {
        let report = RunReport {
            components: vec![downloaded("kubeadm", "v1.29.2"), integrity_failure("helm")],
        };
        let value: serde_json::Value =
            serde_json::from_str(&format_json(&report)).expect("valid JSON");

        assert_eq!(value["downloaded"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["components"][0]["status"], "downloaded");
        assert_eq!(value["components"][0]["sha256"], "abc123");
        assert_eq!(value["components"][1]["status"], "failed");
        assert_eq!(value["components"][1]["error_kind"], "integrity");
        assert!(value["components"][1].get("path").is_none());
    }

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut buffer = Vec::new();
        write_stderr_line(&mut buffer, "kubectl v1.29.2: downloaded");
        assert_eq!(buffer, b"kubectl v1.29.2: downloaded\n");
    }
}
