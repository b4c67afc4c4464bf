//! Platform-specific module for the Windows shell.
//!
//! This module contains the Windows implementation of the shell
//! capability traits, plus COM and icon handle management.

pub mod com;
pub mod handle;
pub mod shell;

pub use com::ComGuard;
pub use handle::{destroy_raw_icon, OwnedIcon};
pub use shell::{resolve_icon, WindowsImageList, WindowsShell};
