//! Icon module for shell icon resolution.
//!
//! This module provides the OS-independent pipeline: the data types, the
//! shell capability traits, the resolver and pixel conversion.

pub mod engine;
pub mod pixels;
pub mod resolver;
pub mod shell;
pub mod types;

pub use engine::{EngineOptions, IconEngine};
pub use pixels::{encode_png, RawBitmap};
pub use resolver::{IconResolver, ResolverConfig};
pub use shell::{IconShell, ShellIcon, ShellImageList};
pub use types::{BlendMode, FileAttributes, IconError, ImageListTier, ResolveStage, SystemIconIndex};
