//! Outbound URL rewriting for GitHub mirrors.
//!
//! Every URL the pipeline fetches passes through a [`UrlTransform`] first.
//! The only rewrite is a host-prefix swap: URLs that start with the GitHub
//! web origin are redirected to a configured mirror. Everything else,
//! including the GitHub API host, passes through untouched.

/// Upstream origin that a mirror replaces.
pub const GITHUB_ORIGIN: &str = "https://github.com";

/// A pure, pre-configured URL rewrite applied to all outbound requests.
///
/// # Examples
///
/// ```
/// use kubefetch::transform::UrlTransform;
///
/// let transform = UrlTransform::with_mirror("https://gh.example.cn");
/// assert_eq!(
///     transform.apply("https://github.com/helm/helm/releases"),
///     "https://gh.example.cn/helm/helm/releases"
/// );
/// assert_eq!(
///     transform.apply("https://dl.k8s.io/release/stable.txt"),
///     "https://dl.k8s.io/release/stable.txt"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlTransform {
    mirror: Option<MirrorRule>,
}

/// A single upstream-prefix to replacement-prefix rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRule {
    upstream: String,
    replacement: String,
}

impl MirrorRule {
    /// Create a rule rewriting `upstream` to `replacement`.
    #[must_use]
    pub fn new(upstream: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into(),
            replacement: replacement.into(),
        }
    }

    /// The prefix being replaced.
    #[must_use]
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// The prefix substituted in its place.
    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

impl UrlTransform {
    /// The identity transform.
    #[must_use]
    pub const fn identity() -> Self {
        Self { mirror: None }
    }

    /// Rewrite the GitHub origin to `mirror`.
    ///
    /// A trailing slash on `mirror` is dropped so that path joins stay
    /// single-slashed.
    #[must_use]
    pub fn with_mirror(mirror: &str) -> Self {
        Self::with_rule(MirrorRule::new(GITHUB_ORIGIN, mirror.trim_end_matches('/')))
    }

    /// Use an explicit rewrite rule.
    #[must_use]
    pub const fn with_rule(rule: MirrorRule) -> Self {
        Self { mirror: Some(rule) }
    }

    /// Build from an optional mirror prefix; `None` or blank is identity.
    #[must_use]
    pub fn from_mirror(mirror: Option<&str>) -> Self {
        match mirror.map(str::trim) {
            Some(prefix) if !prefix.is_empty() => Self::with_mirror(prefix),
            _ => Self::identity(),
        }
    }

    /// The active mirror rule, if any.
    #[must_use]
    pub const fn mirror(&self) -> Option<&MirrorRule> {
        self.mirror.as_ref()
    }

    /// Apply the transform to `url`.
    ///
    /// The matched prefix is replaced exactly once; the remainder of the URL
    /// is preserved byte for byte.
    #[must_use]
    pub fn apply(&self, url: &str) -> String {
        let Some(rule) = &self.mirror else {
            return url.to_owned();
        };
        match url.strip_prefix(rule.upstream.as_str()) {
            Some(rest) if is_origin_boundary(rest) => format!("{}{rest}", rule.replacement),
            _ => url.to_owned(),
        }
    }
}

/// True when `rest` starts a path, query, or nothing after an origin.
///
/// Prevents `https://github.com.evil.test` from matching `https://github.com`.
fn is_origin_boundary(rest: &str) -> bool {
    rest.is_empty() || rest.starts_with(['/', '?', '#'])
}
