//! Kubefetch CLI entrypoint.
//!
//! Resolves the latest release of each selected cluster component, verifies
//! it against the published SHA-256 checksum, and places it in the output
//! directory. Per-component status goes to stderr; `--json` writes the run
//! report to stdout.

use clap::Parser;
use std::io::Write;

use kubefetch::cli::Cli;
use kubefetch::config::Settings;
use kubefetch::error::{KubefetchError, Result};
use kubefetch::logging::init_logging;
use kubefetch::output::{format_json, status_line, summary_line, write_stderr_line};
use kubefetch::pipeline::{FetchContext, RunReport, run_all};
use kubefetch::transport::{Transport, UreqTransport};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let settings = Settings::load(cli)?;
    let transport = UreqTransport::new(settings.proxy.as_deref(), settings.timeout)?;
    settings.prepare_dirs()?;

    let report = fetch_components(cli, &settings, &transport, stderr);
    report_run(cli, &report, stdout, stderr)
}

/// Runs the pipeline over every selected component, streaming status lines.
fn fetch_components(
    cli: &Cli,
    settings: &Settings,
    transport: &dyn Transport,
    stderr: &mut dyn Write,
) -> RunReport {
    let context = FetchContext {
        staging_dir: &settings.staging_dir,
        output_dir: &settings.output_dir,
        transform: &settings.transform,
    };

    if !cli.quiet {
        write_stderr_line(
            stderr,
            format!(
                "Fetching {} component(s) into {}...",
                settings.components.len(),
                settings.output_dir
            ),
        );
    }

    run_all(&context, transport, &settings.components, &mut |component| {
        if !cli.quiet || component.is_failure() {
            write_stderr_line(stderr, status_line(component));
        }
    })
}

/// Writes the summary or JSON report and applies the strict exit policy.
fn report_run(
    cli: &Cli,
    report: &RunReport,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    if cli.json {
        writeln!(stdout, "{}", format_json(report))
            .map_err(|source| KubefetchError::WriteFailed { source })?;
    } else if !cli.quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, summary_line(report));
    }

    let failed = report.failed();
    if cli.strict && failed > 0 {
        return Err(KubefetchError::ComponentsFailed { failed });
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use kubefetch::config::ConfigFile;
    use kubefetch::test_utils::{StubTransport, sha256_hex};
    use rstest::rstest;

    const HELM_BYTES: &[u8] = b"helm tarball";

    fn helm_transport() -> StubTransport {
        StubTransport::new()
            .with_body(
                "https://api.github.com/repos/helm/helm/releases/latest",
                r#"{"tag_name":"v3.14.2"}"#,
            )
            .with_body(
                "https://get.helm.sh/helm-v3.14.2-linux-amd64.tar.gz.sha256sum",
                format!("{}  helm-v3.14.2-linux-amd64.tar.gz\n", sha256_hex(HELM_BYTES)),
            )
            .with_body(
                "https://get.helm.sh/helm-v3.14.2-linux-amd64.tar.gz",
                HELM_BYTES,
            )
    }

    fn settings_in(dir: &tempfile::TempDir, components: &[&str]) -> Settings {
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
        let cli = Cli {
            output_dir: Some(base.join("bin")),
            staging_dir: Some(base.join("temp")),
            components: components.iter().map(|c| (*c).to_owned()).collect(),
            ..Cli::default()
        };
        let settings = Settings::resolve(&cli, ConfigFile::default()).expect("resolve settings");
        settings.prepare_dirs().expect("prepare dirs");
        settings
    }

    fn text(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).expect("output was not UTF-8")
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = KubefetchError::UnknownComponent {
            name: "etcd".to_owned(),
            expected: "kubeadm".to_owned(),
        };
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);
        assert!(text(stderr).contains("unknown component etcd"));
    }

    #[test]
    fn fetch_components_streams_status_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = settings_in(&dir, &["helm", "kubectl"]);
        let mut stderr = Vec::new();

        let report = fetch_components(&Cli::default(), &settings, &helm_transport(), &mut stderr);

        assert_eq!(report.downloaded(), 1);
        assert_eq!(report.failed(), 1);
        let log = text(stderr);
        assert!(log.contains("helm v3.14.2: downloaded"), "stderr: {log}");
        assert!(log.contains("kubectl ?: failed: "), "stderr: {log}");
    }

    #[test]
    fn quiet_mode_still_reports_failures() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = settings_in(&dir, &["helm", "kubectl"]);
        let cli = Cli {
            quiet: true,
            ..Cli::default()
        };
        let mut stderr = Vec::new();

        fetch_components(&cli, &settings, &helm_transport(), &mut stderr);

        let log = text(stderr);
        assert!(!log.contains("helm"), "stderr: {log}");
        assert!(log.contains("kubectl ?: failed: "), "stderr: {log}");
    }

    #[rstest]
    #[case::lenient(false, true)]
    #[case::strict(true, false)]
    fn strict_mode_turns_failures_into_errors(#[case] strict: bool, #[case] expect_ok: bool) {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = settings_in(&dir, &["kubectl"]);
        let cli = Cli {
            strict,
            ..Cli::default()
        };
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let report = fetch_components(&cli, &settings, &StubTransport::new(), &mut stderr);
        let result = report_run(&cli, &report, &mut stdout, &mut stderr);

        assert_eq!(result.is_ok(), expect_ok);
        assert!(text(stderr).contains("0 downloaded, 0 up to date, 1 failed"));
    }

    #[test]
    fn json_report_goes_to_stdout() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = settings_in(&dir, &["helm"]);
        let cli = Cli {
            json: true,
            ..Cli::default()
        };
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let report = fetch_components(&cli, &settings, &helm_transport(), &mut stderr);
        report_run(&cli, &report, &mut stdout, &mut stderr).expect("report");

        let value: serde_json::Value =
            serde_json::from_str(&text(stdout)).expect("stdout is JSON");
        assert_eq!(value["components"][0]["component"], "helm");
        assert_eq!(value["components"][0]["status"], "downloaded");
        assert!(!text(stderr).contains("up to date,"));
    }
}
