//! Static component table and per-component naming rules.
//!
//! Each managed binary is described by one [`ComponentSpec`] record: where
//! to discover its latest version, how to build its download and checksum
//! URLs, what filename its checksum document keys the hash under, and what
//! name the verified artefact is placed at. The naming rules are data, so
//! the pipeline never branches on component identity.

use std::fmt;

/// Number of `%s` slots a component's URL templates carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotLayout {
    /// One slot: the canonical release tag.
    TagOnly,
    /// Two slots: the canonical tag, then the tag with any leading `v` removed.
    TagThenBare,
}

/// Rule for the filename a checksum document associates with the hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetNaming {
    /// The component identifier itself (e.g. `kubectl`).
    ComponentId,
    /// A fixed, version-independent name.
    Fixed(&'static str),
    /// `prefix` + bare version + `suffix`.
    BareVersioned {
        /// Text before the version.
        prefix: &'static str,
        /// Text after the version.
        suffix: &'static str,
    },
}

/// Rule for the durable filename inside the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalNaming {
    /// The component identifier itself.
    ComponentId,
    /// The component identifier followed by a fixed suffix.
    WithSuffix(&'static str),
}

/// Immutable description of one managed component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    id: &'static str,
    version_url: &'static str,
    download_template: &'static str,
    checksum_template: &'static str,
    slots: SlotLayout,
    target_naming: TargetNaming,
    final_naming: FinalNaming,
}

/// Download and checksum URLs rendered for one resolved version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseUrls {
    /// URL of the artefact itself.
    pub download: String,
    /// URL of the checksum document.
    pub checksum: String,
}

/// Errors arising from registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No component is registered under the identifier.
    #[error("component {0} not found")]
    NotFound(String),
}

const K8S_STABLE: &str = "https://dl.k8s.io/release/stable.txt";

static COMPONENTS: [ComponentSpec; 8] = [
    ComponentSpec {
        id: "kubeadm",
        version_url: K8S_STABLE,
        download_template: "https://dl.k8s.io/release/%s/bin/linux/amd64/kubeadm",
        checksum_template: "https://dl.k8s.io/release/%s/bin/linux/amd64/kubeadm.sha256",
        slots: SlotLayout::TagOnly,
        target_naming: TargetNaming::ComponentId,
        final_naming: FinalNaming::ComponentId,
    },
    ComponentSpec {
        id: "kubelet",
        version_url: K8S_STABLE,
        download_template: "https://dl.k8s.io/release/%s/bin/linux/amd64/kubelet",
        checksum_template: "https://dl.k8s.io/release/%s/bin/linux/amd64/kubelet.sha256",
        slots: SlotLayout::TagOnly,
        target_naming: TargetNaming::ComponentId,
        final_naming: FinalNaming::ComponentId,
    },
    ComponentSpec {
        id: "kubectl",
        version_url: K8S_STABLE,
        download_template: "https://dl.k8s.io/release/%s/bin/linux/amd64/kubectl",
        checksum_template: "https://dl.k8s.io/release/%s/bin/linux/amd64/kubectl.sha256",
        slots: SlotLayout::TagOnly,
        target_naming: TargetNaming::ComponentId,
        final_naming: FinalNaming::ComponentId,
    },
    ComponentSpec {
        id: "runc",
        version_url: "https://api.github.com/repos/opencontainers/runc/releases/latest",
        download_template: "https://github.com/opencontainers/runc/releases/download/%s/runc.amd64",
        checksum_template: "https://github.com/opencontainers/runc/releases/download/%s/runc.sha256sum",
        slots: SlotLayout::TagOnly,
        target_naming: TargetNaming::Fixed("runc.amd64"),
        final_naming: FinalNaming::ComponentId,
    },
    ComponentSpec {
        id: "containerd",
        version_url: "https://api.github.com/repos/containerd/containerd/releases/latest",
        download_template: "https://github.com/containerd/containerd/releases/download/%s/containerd-%s-linux-amd64.tar.gz",
        checksum_template: "https://github.com/containerd/containerd/releases/download/%s/containerd-%s-linux-amd64.tar.gz.sha256sum",
        slots: SlotLayout::TagThenBare,
        target_naming: TargetNaming::BareVersioned {
            prefix: "containerd-",
            suffix: "-linux-amd64.tar.gz",
        },
        final_naming: FinalNaming::WithSuffix(".tar.gz"),
    },
    ComponentSpec {
        id: "crictl",
        version_url: "https://api.github.com/repos/kubernetes-sigs/cri-tools/releases/latest",
        download_template: "https://github.com/kubernetes-sigs/cri-tools/releases/download/%s/crictl-v%s-linux-amd64.tar.gz",
        checksum_template: "https://github.com/kubernetes-sigs/cri-tools/releases/download/%s/crictl-v%s-linux-amd64.tar.gz.sha256",
        slots: SlotLayout::TagThenBare,
        target_naming: TargetNaming::BareVersioned {
            prefix: "crictl-v",
            suffix: "-linux-amd64.tar.gz",
        },
        final_naming: FinalNaming::ComponentId,
    },
    ComponentSpec {
        id: "cilium",
        version_url: "https://api.github.com/repos/cilium/cilium-cli/releases/latest",
        download_template: "https://github.com/cilium/cilium-cli/releases/download/%s/cilium-linux-amd64.tar.gz",
        checksum_template: "https://github.com/cilium/cilium-cli/releases/download/%s/cilium-linux-amd64.tar.gz.sha256sum",
        slots: SlotLayout::TagOnly,
        target_naming: TargetNaming::Fixed("cilium-linux-amd64.tar.gz"),
        final_naming: FinalNaming::ComponentId,
    },
    ComponentSpec {
        id: "helm",
        version_url: "https://api.github.com/repos/helm/helm/releases/latest",
        download_template: "https://get.helm.sh/helm-%s-linux-amd64.tar.gz",
        checksum_template: "https://get.helm.sh/helm-%s-linux-amd64.tar.gz.sha256sum",
        slots: SlotLayout::TagOnly,
        target_naming: TargetNaming::BareVersioned {
            prefix: "helm-v",
            suffix: "-linux-amd64.tar.gz",
        },
        final_naming: FinalNaming::ComponentId,
    },
];

/// Return every registered component in processing order.
#[must_use]
pub fn all() -> &'static [ComponentSpec] {
    &COMPONENTS
}

/// Return every registered identifier in processing order.
#[must_use]
pub fn ids() -> Vec<&'static str> {
    COMPONENTS.iter().map(ComponentSpec::id).collect()
}

/// Look up a component by identifier.
///
/// # Errors
///
/// Returns [`RegistryError::NotFound`] if `id` is not registered.
///
/// # Examples
///
/// ```
/// use kubefetch::registry;
///
/// let helm = registry::lookup("helm").expect("helm is registered");
/// assert_eq!(helm.final_filename(), "helm");
/// assert!(registry::lookup("etcd").is_err());
/// ```
pub fn lookup(id: &str) -> Result<&'static ComponentSpec, RegistryError> {
    COMPONENTS
        .iter()
        .find(|spec| spec.id == id)
        .ok_or_else(|| RegistryError::NotFound(id.to_owned()))
}

/// Strip one leading `v` from a release tag.
#[must_use]
pub fn bare_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Substitute `args` into the `%s` slots of `template`, left to right.
///
/// Surplus slots are left verbatim; surplus arguments are ignored.
#[must_use]
pub fn render_template(template: &str, args: &[&str]) -> String {
    let mut rendered = String::with_capacity(template.len() + 32);
    let mut pieces = template.split("%s");
    let mut args = args.iter();
    if let Some(first) = pieces.next() {
        rendered.push_str(first);
    }
    for piece in pieces {
        match args.next() {
            Some(arg) => rendered.push_str(arg),
            None => rendered.push_str("%s"),
        }
        rendered.push_str(piece);
    }
    rendered
}

impl ComponentSpec {
    /// The unique component identifier.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.id
    }

    /// Where the latest version is published.
    #[must_use]
    pub const fn version_url(&self) -> &'static str {
        self.version_url
    }

    /// The URL template slot layout.
    #[must_use]
    pub const fn slots(&self) -> SlotLayout {
        self.slots
    }

    /// Render download and checksum URLs for `version`.
    ///
    /// The result is the upstream URL; the pipeline applies the configured
    /// transform afterwards.
    #[must_use]
    pub fn release_urls(&self, version: &str) -> ReleaseUrls {
        let bare = bare_version(version);
        let args: &[&str] = match self.slots {
            SlotLayout::TagOnly => &[version],
            SlotLayout::TagThenBare => &[version, bare],
        };
        ReleaseUrls {
            download: render_template(self.download_template, args),
            checksum: render_template(self.checksum_template, args),
        }
    }

    /// The filename the checksum document lists for `version`.
    #[must_use]
    pub fn target_filename(&self, version: &str) -> String {
        match self.target_naming {
            TargetNaming::ComponentId => self.id.to_owned(),
            TargetNaming::Fixed(name) => name.to_owned(),
            TargetNaming::BareVersioned { prefix, suffix } => {
                format!("{prefix}{}{suffix}", bare_version(version))
            }
        }
    }

    /// The filename the verified artefact is placed at.
    #[must_use]
    pub fn final_filename(&self) -> String {
        match self.final_naming {
            FinalNaming::ComponentId => self.id.to_owned(),
            FinalNaming::WithSuffix(suffix) => format!("{}{suffix}", self.id),
        }
    }
}

impl fmt::Display for ComponentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id)
    }
}
