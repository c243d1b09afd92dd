//! CLI argument definitions for kubefetch.
//!
//! Path and network options are optional here so that configuration-file
//! values can fill them in; defaults are applied in [`crate::config`].

use camino::Utf8PathBuf;
use clap::Parser;

/// Download and verify the latest cluster component binaries.
#[derive(Parser, Debug, Clone)]
#[command(name = "kubefetch")]
#[command(version, about)]
#[command(long_about = concat!(
    "Download and verify the latest cluster component binaries.\n\n",
    "For each component, kubefetch resolves the latest upstream release, fetches ",
    "the published SHA-256 checksum, and downloads the artefact only when the ",
    "local copy is missing or stale. Downloads are verified before they replace ",
    "anything in the output directory.",
))]
#[command(after_help = concat!(
    "COMPONENTS:\n",
    "  kubeadm kubelet kubectl runc containerd crictl cilium helm\n\n",
    "EXAMPLES:\n",
    "  Fetch everything into ./bin:\n",
    "    $ kubefetch\n\n",
    "  Fetch two components through a proxy:\n",
    "    $ kubefetch -c kubectl -c helm --proxy http://127.0.0.1:7890\n\n",
    "  Rewrite GitHub downloads to a mirror:\n",
    "    $ kubefetch --mirror https://ghproxy.example/https://github.com\n\n",
    "  Fail the process when any component fails:\n",
    "    $ kubefetch --strict",
))]
pub struct Cli {
    /// HTTP proxy used for every request.
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Replacement for the `https://github.com` prefix of GitHub URLs.
    #[arg(long, value_name = "URL")]
    pub mirror: Option<String>,

    /// Directory receiving verified artefacts [default: ./bin].
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Directory holding downloads pending verification [default: ./temp].
    #[arg(short, long, value_name = "DIR")]
    pub staging_dir: Option<Utf8PathBuf>,

    /// Fetch only this component (can be repeated) [default: all].
    #[arg(short, long = "component", value_name = "NAME")]
    pub components: Vec<String>,

    /// Read settings from a TOML file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Per-request timeout in seconds [default: 60].
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Exit with status 1 when any component fails.
    #[arg(long)]
    pub strict: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (failures still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Default for Cli {
    /// Creates a `Cli` with no overrides, equivalent to running `kubefetch`
    /// with no arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// use kubefetch::cli::Cli;
    ///
    /// let cli = Cli::default();
    /// assert!(cli.components.is_empty());
    /// assert!(!cli.strict);
    /// ```
    fn default() -> Self {
        Self {
            proxy: None,
            mirror: None,
            output_dir: None,
            staging_dir: None,
            components: Vec::new(),
            config: None,
            timeout: None,
            strict: false,
            json: false,
            verbosity: 0,
            quiet: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["kubefetch"]);
        assert!(cli.proxy.is_none());
        assert!(cli.mirror.is_none());
        assert!(cli.output_dir.is_none());
        assert!(cli.staging_dir.is_none());
        assert!(cli.components.is_empty());
        assert!(cli.config.is_none());
        assert!(cli.timeout.is_none());
        assert!(!cli.strict);
        assert!(!cli.json);
        assert_eq!(cli.verbosity, 0);
        assert!(!cli.quiet);
    }

    #[test]
    fn cli_parses_repeated_components() {
        let cli = Cli::parse_from(["kubefetch", "-c", "kubectl", "--component", "helm"]);
        assert_eq!(cli.components, ["kubectl", "helm"]);
    }

    #[test]
    fn cli_parses_network_options() {
        let cli = Cli::parse_from([
            "kubefetch",
            "--proxy",
            "http://127.0.0.1:7890",
            "--mirror",
            "https://mirror.example",
            "--timeout",
            "15",
        ]);
        assert_eq!(cli.proxy.as_deref(), Some("http://127.0.0.1:7890"));
        assert_eq!(cli.mirror.as_deref(), Some("https://mirror.example"));
        assert_eq!(cli.timeout, Some(15));
    }

    #[test]
    fn cli_parses_directories() {
        let cli = Cli::parse_from(["kubefetch", "-o", "/opt/bin", "-s", "/var/tmp/kf"]);
        assert_eq!(cli.output_dir, Some(Utf8PathBuf::from("/opt/bin")));
        assert_eq!(cli.staging_dir, Some(Utf8PathBuf::from("/var/tmp/kf")));
    }

    #[rstest]
    #[case::single(&["kubefetch", "-v"], 1)]
    #[case::double(&["kubefetch", "-vv"], 2)]
    #[case::long(&["kubefetch", "--verbose", "--verbose", "--verbose"], 3)]
    fn cli_counts_verbosity(#[case] args: &[&str], #[case] expected: u8) {
        let cli = Cli::parse_from(args);
        assert_eq!(cli.verbosity, expected);
    }

    #[test]
    fn cli_rejects_quiet_with_verbose() {
        let result = Cli::try_parse_from(["kubefetch", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_rejects_non_numeric_timeout() {
        let result = Cli::try_parse_from(["kubefetch", "--timeout", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
