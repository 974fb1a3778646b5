//! Build metadata
//!
//! Values are emitted by `build.rs`. Builds without a git checkout leave the
//! git fields as "unknown".

use serde::Serialize;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const UNKNOWN: &str = "unknown";

/// Build metadata reported at startup and on `GET /version`
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_sha: &'static str,
    pub git_branch: &'static str,
    pub git_dirty: bool,
    pub rustc: &'static str,
    pub target: &'static str,
    pub built_at: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            git_sha: option_env!("VERGEN_GIT_SHA").unwrap_or(UNKNOWN),
            git_branch: option_env!("VERGEN_GIT_BRANCH").unwrap_or(UNKNOWN),
            git_dirty: option_env!("VERGEN_GIT_DIRTY") == Some("true"),
            rustc: option_env!("VERGEN_RUSTC_SEMVER").unwrap_or(UNKNOWN),
            target: option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or(UNKNOWN),
            built_at: option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or(UNKNOWN),
        }
    }

    /// `<version> (<git_sha>[ dirty])`
    pub fn full_version(&self) -> String {
        let dirty = if self.git_dirty { " dirty" } else { "" };
        format!("{} ({}{dirty})", self.version, self.git_sha)
    }
}
