//! Shell capability traits.
//!
//! The resolver talks to the OS only through these traits, so the
//! Windows backend can be swapped for a test double.

use super::pixels::RawBitmap;
use super::types::{BlendMode, FileAttributes, IconError, ImageListTier, SystemIconIndex};
use std::ffi::c_void;

/// Access to the shell's file classification and shared image lists.
pub trait IconShell {
    /// Icon handle produced by this shell.
    type Icon: ShellIcon;

    /// Transient reference to one tier's image list.
    type List: ShellImageList<Icon = Self::Icon>;

    /// Map a path to its index in the system image list.
    ///
    /// Classification is by file-type association. Unless `attributes` is
    /// [`FileAttributes::FromDisk`] the path is never touched.
    fn system_icon_index(
        &self,
        path: &str,
        attributes: FileAttributes,
    ) -> Result<SystemIconIndex, IconError>;

    /// Acquire the shared image list for `tier`.
    fn image_list(&self, tier: ImageListTier) -> Result<Self::List, IconError>;
}

/// A shared, OS-owned image list.
pub trait ShellImageList {
    type Icon: ShellIcon;

    /// Copy out an owned icon at `index`.
    fn icon(&self, index: SystemIconIndex, blend: BlendMode) -> Result<Self::Icon, IconError>;
}

/// An owned icon handle.
///
/// Implementations release the handle on drop unless it has been
/// given away with [`ShellIcon::into_raw`].
pub trait ShellIcon: Send {
    /// Read the icon's color and mask planes.
    fn bitmap(&self) -> Result<RawBitmap, IconError>;

    /// Give up ownership, returning the raw handle.
    fn into_raw(self) -> *mut c_void;
}
