//! Jumbo Icon Resolver - Library
//!
//! Resolves the icon Windows uses for a file type at the largest
//! (jumbo, 256x256) image list tier.
//!
//! ## Features
//!
//! - Look up the system icon index by file-type association, without touching the file
//! - Copy an owned, alpha-preserving icon out of the shared jumbo image list
//! - Distinct errors for classification, tier and lookup failures
//! - Convert the icon to RGBA pixels or PNG bytes, optionally scaled
//! - Swappable shell backend for testing

pub mod icon;
#[cfg(windows)]
pub mod platform;

pub use icon::{
    BlendMode, EngineOptions, FileAttributes, IconEngine, IconError, IconResolver, IconShell,
    ImageListTier, RawBitmap, ResolveStage, ResolverConfig, ShellIcon, ShellImageList, SystemIconIndex,
};
#[cfg(windows)]
pub use platform::{resolve_icon, OwnedIcon, WindowsShell};
