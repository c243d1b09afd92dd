//! Configuration file loading and effective run settings.
//!
//! Settings come from three layers: command-line flags, an optional TOML
//! file named by `--config`, and built-in defaults. A flag always wins over
//! the file, and the file wins over the default.
//!
//! ```toml
//! components = ["kubectl", "helm"]
//!
//! [network]
//! proxy = "http://127.0.0.1:7890"
//! mirror = "https://ghproxy.example/https://github.com"
//! timeout_secs = 30
//!
//! [paths]
//! output_dir = "/opt/k8s/bin"
//! staging_dir = "/opt/k8s/temp"
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

use crate::cli::Cli;
use crate::error::{KubefetchError, Result};
use crate::registry::{self, ComponentSpec};
use crate::transform::UrlTransform;
use crate::transport::DEFAULT_TIMEOUT;

/// Output directory used when neither flag nor file names one.
pub const DEFAULT_OUTPUT_DIR: &str = "bin";

/// Staging directory used when neither flag nor file names one.
pub const DEFAULT_STAGING_DIR: &str = "temp";

/// Contents of a kubefetch TOML configuration file.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Components to fetch; absent means all.
    pub components: Option<Vec<String>>,
    /// Network settings.
    pub network: NetworkConfig,
    /// Directory settings.
    pub paths: PathsConfig,
}

/// The `[network]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Forward proxy for every request.
    pub proxy: Option<String>,
    /// Replacement for the GitHub origin.
    pub mirror: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// The `[paths]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory receiving verified artefacts.
    pub output_dir: Option<Utf8PathBuf>,
    /// Directory holding downloads pending verification.
    pub staging_dir: Option<Utf8PathBuf>,
}

impl ConfigFile {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`KubefetchError::ConfigParse`] for malformed TOML or unknown
    /// keys. `origin` only labels the error.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use kubefetch::config::ConfigFile;
    ///
    /// let file = ConfigFile::parse("[network]\ntimeout_secs = 5\n", Utf8Path::new("kf.toml"))
    ///     .expect("valid config");
    /// assert_eq!(file.network.timeout_secs, Some(5));
    /// assert!(ConfigFile::parse("colour = true", Utf8Path::new("kf.toml")).is_err());
    /// ```
    pub fn parse(source: &str, origin: &Utf8Path) -> Result<Self> {
        toml::from_str(source).map_err(|e| KubefetchError::ConfigParse {
            path: origin.to_owned(),
            reason: e.to_string(),
        })
    }

    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KubefetchError::ConfigRead`] if the file cannot be read and
    /// [`KubefetchError::ConfigParse`] if it is invalid.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| KubefetchError::ConfigRead {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        log::debug!("loaded configuration from {path}");
        Self::parse(&source, path)
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Forward proxy, if any.
    pub proxy: Option<String>,
    /// URL rewrite applied to every request.
    pub transform: UrlTransform,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Directory receiving verified artefacts.
    pub output_dir: Utf8PathBuf,
    /// Directory holding downloads pending verification.
    pub staging_dir: Utf8PathBuf,
    /// Components to process, in order.
    pub components: Vec<&'static ComponentSpec>,
}

impl Settings {
    /// Loads the file named by `--config`, if any, and merges it with `cli`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or names an unknown
    /// component.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merges `cli` over `file` over the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`KubefetchError::UnknownComponent`] if either layer names a
    /// component missing from the registry.
    pub fn resolve(cli: &Cli, file: ConfigFile) -> Result<Self> {
        let ConfigFile {
            components,
            network,
            paths,
        } = file;

        let requested = if cli.components.is_empty() {
            components.unwrap_or_default()
        } else {
            cli.components.clone()
        };
        let mirror = non_blank(cli.mirror.as_deref()).or(non_blank(network.mirror.as_deref()));
        let proxy = non_blank(cli.proxy.as_deref())
            .or(non_blank(network.proxy.as_deref()))
            .map(str::to_owned);
        let timeout = cli
            .timeout
            .or(network.timeout_secs)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Ok(Self {
            proxy,
            transform: UrlTransform::from_mirror(mirror),
            timeout,
            output_dir: cli
                .output_dir
                .clone()
                .or(paths.output_dir)
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR)),
            staging_dir: cli
                .staging_dir
                .clone()
                .or(paths.staging_dir)
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STAGING_DIR)),
            components: select_components(&requested)?,
        })
    }

    /// Creates the output and staging directories.
    ///
    /// # Errors
    ///
    /// Returns [`KubefetchError::DirectoryUnavailable`] if either directory
    /// cannot be created.
    pub fn prepare_dirs(&self) -> Result<()> {
        for dir in [&self.output_dir, &self.staging_dir] {
            std::fs::create_dir_all(dir).map_err(|e| KubefetchError::DirectoryUnavailable {
                path: dir.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Maps requested identifiers to registry entries.
///
/// An empty request selects every component in registry order. Otherwise the
/// requested order is kept and repeats are dropped.
///
/// # Errors
///
/// Returns [`KubefetchError::UnknownComponent`] for the first unknown name.
///
/// # Examples
///
/// ```
/// use kubefetch::config::select_components;
///
/// let all = select_components(&[]).expect("empty selects all");
/// assert_eq!(all.len(), 8);
///
/// let picked = select_components(&["helm".to_owned()]).expect("helm is known");
/// assert_eq!(picked[0].id(), "helm");
/// ```
pub fn select_components(names: &[String]) -> Result<Vec<&'static ComponentSpec>> {
    if names.is_empty() {
        return Ok(registry::all().iter().collect());
    }
    let mut selected: Vec<&'static ComponentSpec> = Vec::with_capacity(names.len());
    for name in names {
        let spec = registry::lookup(name.trim()).map_err(|_| KubefetchError::UnknownComponent {
            name: name.clone(),
            expected: registry::ids().join(", "),
        })?;
        if !selected.iter().any(|s| s.id() == spec.id()) {
            selected.push(spec);
        }
    }
    Ok(selected)
}
