//! Kubefetch library.
//!
//! This crate resolves, downloads, and verifies the latest release artefacts
//! of a fixed set of Kubernetes node binaries (container runtime, CLI tools,
//! network plugin CLI, package manager). It is used by the `kubefetch` CLI
//! binary and can be driven programmatically with an injected transport for
//! testing.
//!
//! # Modules
//!
//! - [`checksum`] - Checksum document retrieval and clear-signed manifest parsing
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration file and effective settings
//! - [`digest`] - SHA-256 file hashing and the local up-to-date check
//! - [`error`] - Startup error types
//! - [`logging`] - Stderr log subscriber setup
//! - [`output`] - Per-component status lines and run summaries
//! - [`pipeline`] - Fetch-and-verify orchestration
//! - [`placement`] - Atomic promotion of verified artefacts
//! - [`registry`] - Static component table and naming rules
//! - [`transform`] - Outbound URL mirror rewriting
//! - [`transport`] - HTTP transport trait and `ureq` implementation
//! - [`version`] - Latest-version discovery

pub mod checksum;
pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod placement;
pub mod registry;
pub mod transform;
pub mod transport;
pub mod version;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
