//! Icon data models.
//!
//! Defines the index, tier and blend types handed between the resolver
//! and the shell, plus the error taxonomy for a resolution attempt.

use std::path::PathBuf;
use thiserror::Error;

/// Position of an icon inside the process-wide system image list.
///
/// Only meaningful against the list it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemIconIndex(pub i32);

impl SystemIconIndex {
    /// Raw index as passed to `IImageList::GetIcon`.
    pub fn get(self) -> i32 {
        self.0
    }
}

/// System image list resolution tier (maps to the Windows `SHIL_*` values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum ImageListTier {
    /// 32x32 by default, follows the large-icon system metric
    Large = 0,

    /// 16x16 by default, follows the small-icon system metric
    Small = 1,

    /// 48x48
    ExtraLarge = 2,

    /// Small icon as sized by GetSystemMetrics(SM_CXSMICON)
    SysSmall = 3,

    /// 256x256, the largest tier the shell exposes
    #[default]
    Jumbo = 4,
}

impl ImageListTier {
    /// The `SHIL_*` identifier passed to `SHGetImageList`.
    pub fn shil(self) -> i32 {
        self as i32
    }

    /// Parse a tier name as used in `EngineConfig` ("jumbo", "large", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "large" => Some(ImageListTier::Large),
            "small" => Some(ImageListTier::Small),
            "extralarge" | "extra_large" => Some(ImageListTier::ExtraLarge),
            "syssmall" | "sys_small" => Some(ImageListTier::SysSmall),
            "jumbo" => Some(ImageListTier::Jumbo),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageListTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ImageListTier::Large => "large",
            ImageListTier::Small => "small",
            ImageListTier::ExtraLarge => "extra-large",
            ImageListTier::SysSmall => "sys-small",
            ImageListTier::Jumbo => "jumbo",
        };
        f.write_str(name)
    }
}

/// How the image list renders the copied icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Keep the alpha channel (`ILD_TRANSPARENT`)
    #[default]
    Transparent,

    /// Composite against the list background color (`ILD_NORMAL`)
    Normal,
}

impl BlendMode {
    /// The `ILD_*` draw flags passed to `IImageList::GetIcon`.
    pub fn ild_flags(self) -> u32 {
        match self {
            BlendMode::Transparent => 0x0000_0001,
            BlendMode::Normal => 0x0000_0000,
        }
    }
}

impl BlendMode {
    /// Parse a blend name as used in `EngineConfig` ("transparent" or "normal").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "transparent" => Some(BlendMode::Transparent),
            "normal" => Some(BlendMode::Normal),
            _ => None,
        }
    }
}

/// How the shell classifies a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileAttributes {
    /// Treat the path as a plain file; only its extension matters
    #[default]
    Normal,

    /// Treat the path as a directory without touching it
    Directory,

    /// Let the shell inspect the real file or directory
    FromDisk,
}

/// Icon resolution error types.
#[derive(Debug, Error)]
pub enum IconError {
    #[error("Shell could not classify path: {path}")]
    ClassificationFailed { path: String },

    #[error("System image list unavailable for tier {tier}")]
    TierUnavailable {
        tier: ImageListTier,
        #[source]
        source: Option<PlatformError>,
    },

    #[error("No icon at index {index} in the {tier} image list")]
    IconLookupFailed {
        index: i32,
        tier: ImageListTier,
        #[source]
        source: Option<PlatformError>,
    },

    #[error("Path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Invalid icon handle")]
    InvalidHandle,

    #[error("Icon has no color bitmap")]
    NoColorBitmap,

    #[error("Failed to read icon bitmap: {0}")]
    BitmapReadFailed(String),

    #[error("Failed to encode icon image: {0}")]
    EncodeFailed(#[source] image::ImageError),

    #[error("Windows API error: {0}")]
    WindowsError(#[source] PlatformError),

    #[error("String conversion error: {0}")]
    StringConversion(String),
}

impl IconError {
    /// Which pipeline stage produced this error, if it came from one.
    pub fn stage(&self) -> Option<ResolveStage> {
        match self {
            IconError::ClassificationFailed { .. } => Some(ResolveStage::Classify),
            IconError::TierUnavailable { .. } => Some(ResolveStage::AcquireList),
            IconError::IconLookupFailed { .. } => Some(ResolveStage::CopyIcon),
            _ => None,
        }
    }
}

/// The three sequential OS queries behind one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStage {
    /// Path to system icon index
    Classify,

    /// Reference to the shared image list for the tier
    AcquireList,

    /// Owned icon copy out of the list
    CopyIcon,
}

/// Underlying OS error carried as a source.
#[cfg(windows)]
pub type PlatformError = windows::core::Error;

/// Underlying OS error carried as a source.
#[cfg(not(windows))]
pub type PlatformError = std::io::Error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_values_match_shil_constants() {
        assert_eq!(ImageListTier::Large.shil(), 0);
        assert_eq!(ImageListTier::ExtraLarge.shil(), 2);
        assert_eq!(ImageListTier::Jumbo.shil(), 4);
        assert_eq!(ImageListTier::default(), ImageListTier::Jumbo);
    }

    #[test]
    fn test_tier_from_name() {
        assert_eq!(ImageListTier::from_name("JUMBO"), Some(ImageListTier::Jumbo));
        assert_eq!(ImageListTier::from_name("extra_large"), Some(ImageListTier::ExtraLarge));
        assert_eq!(ImageListTier::from_name("huge"), None);
    }

    #[test]
    fn test_blend_flags() {
        assert_eq!(BlendMode::default(), BlendMode::Transparent);
        assert_eq!(BlendMode::Transparent.ild_flags(), 1);
        assert_eq!(BlendMode::Normal.ild_flags(), 0);
    }

    #[test]
    fn test_blend_from_name() {
        assert_eq!(BlendMode::from_name("Normal"), Some(BlendMode::Normal));
        assert_eq!(BlendMode::from_name("transparent"), Some(BlendMode::Transparent));
        assert_eq!(BlendMode::from_name("opaque"), None);
        assert_eq!(FileAttributes::default(), FileAttributes::Normal);
    }

    #[test]
    fn test_error_stage() {
        let err = IconError::TierUnavailable {
            tier: ImageListTier::Jumbo,
            source: None,
        };
        assert_eq!(err.stage(), Some(ResolveStage::AcquireList));
        assert_eq!(err.to_string(), "System image list unavailable for tier jumbo");
        assert_eq!(IconError::NoColorBitmap.stage(), None);
    }
}
