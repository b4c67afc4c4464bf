//! Jumbo icon resolution.
//!
//! Runs the classify / acquire list / copy icon pipeline against an
//! [`IconShell`] and hands the resulting icon to its new owner.

use super::shell::{IconShell, ShellImageList};
use super::types::{BlendMode, FileAttributes, IconError, ImageListTier};
use tracing::{debug, warn};

/// Resolver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Image list tier to copy the icon from
    pub tier: ImageListTier,

    /// Rendering mode for the copied icon
    pub blend: BlendMode,

    /// How the shell classifies the path
    pub attributes: FileAttributes,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tier: ImageListTier::Jumbo,
            blend: BlendMode::Transparent,
            attributes: FileAttributes::Normal,
        }
    }
}

/// Resolves the shell icon for a path. Holds no per-call state.
pub struct IconResolver<S> {
    shell: S,
    config: ResolverConfig,
}

impl<S: IconShell> IconResolver<S> {
    /// Create a resolver with the default (jumbo, transparent) config.
    pub fn new(shell: S) -> Self {
        Self::with_config(shell, ResolverConfig::default())
    }

    pub fn with_config(shell: S, config: ResolverConfig) -> Self {
        Self { shell, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    /// Resolve the icon for `path`.
    ///
    /// Every call yields a fresh handle owned by the caller.
    pub fn resolve(&self, path: &str) -> Result<S::Icon, IconError> {
        self.resolve_as(path, self.config.attributes)
    }

    /// Resolve the icon for `path`, classifying it with `attributes`
    /// instead of the configured default.
    pub fn resolve_as(&self, path: &str, attributes: FileAttributes) -> Result<S::Icon, IconError> {
        let index = self
            .shell
            .system_icon_index(path, attributes)
            .inspect_err(|e| warn!(path, error = %e, "icon classification failed"))?;
        debug!(path, index = index.get(), "classified path");

        let list = self
            .shell
            .image_list(self.config.tier)
            .inspect_err(|e| warn!(tier = %self.config.tier, error = %e, "image list unavailable"))?;

        let icon = list
            .icon(index, self.config.blend)
            .inspect_err(|e| warn!(path, index = index.get(), error = %e, "icon copy failed"))?;
        debug!(path, tier = %self.config.tier, "resolved icon");

        Ok(icon)
    }

    /// Resolve the icon for `path` and pass it to `on_resolved`.
    ///
    /// `on_resolved` runs at most once, before this returns, and only on
    /// success. A failure is returned instead and may be ignored.
    pub fn resolve_with<F>(&self, path: &str, on_resolved: F) -> Result<(), IconError>
    where
        F: FnOnce(S::Icon),
    {
        let icon = self.resolve(path)?;
        on_resolved(icon);
        Ok(())
    }
}
