//! Windows shell backend using SHGetFileInfo and the system image lists.

use super::com::ComGuard;
use super::handle::OwnedIcon;
use crate::icon::{
    BlendMode, FileAttributes, IconError, IconResolver, IconShell, ImageListTier, ShellImageList, SystemIconIndex,
};
use std::mem::size_of;
use windows::core::PCWSTR;
use windows::Win32::Storage::FileSystem::{
    FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_NORMAL, FILE_FLAGS_AND_ATTRIBUTES,
};
use windows::Win32::UI::Controls::IImageList;
use windows::Win32::UI::Shell::{
    SHGetFileInfoW, SHGetImageList, SHFILEINFOW, SHGFI_SYSICONINDEX, SHGFI_USEFILEATTRIBUTES,
};

/// The real Windows shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsShell;

/// Reference to one of the shell's shared image lists.
pub struct WindowsImageList {
    // Released before COM is torn down
    list: IImageList,
    tier: ImageListTier,
    _com: ComGuard,
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

impl IconShell for WindowsShell {
    type Icon = OwnedIcon;
    type List = WindowsImageList;

    fn system_icon_index(
        &self,
        path: &str,
        attributes: FileAttributes,
    ) -> Result<SystemIconIndex, IconError> {
        let wide_path = to_wide(path);
        let mut file_info = SHFILEINFOW::default();

        let (attributes, flags) = match attributes {
            FileAttributes::Normal => {
                (FILE_ATTRIBUTE_NORMAL, SHGFI_SYSICONINDEX | SHGFI_USEFILEATTRIBUTES)
            }
            FileAttributes::Directory => {
                (FILE_ATTRIBUTE_DIRECTORY, SHGFI_SYSICONINDEX | SHGFI_USEFILEATTRIBUTES)
            }
            FileAttributes::FromDisk => (FILE_FLAGS_AND_ATTRIBUTES(0), SHGFI_SYSICONINDEX),
        };

        // With SHGFI_SYSICONINDEX the result is the system list handle, 0 on failure
        let result = unsafe {
            SHGetFileInfoW(
                PCWSTR::from_raw(wide_path.as_ptr()),
                attributes,
                Some(&mut file_info as *mut SHFILEINFOW),
                size_of::<SHFILEINFOW>() as u32,
                flags,
            )
        };

        if result == 0 {
            return Err(IconError::ClassificationFailed {
                path: path.to_string(),
            });
        }

        Ok(SystemIconIndex(file_info.iIcon))
    }

    fn image_list(&self, tier: ImageListTier) -> Result<WindowsImageList, IconError> {
        let com = ComGuard::new();
        let list: IImageList = unsafe { SHGetImageList(tier.shil()) }.map_err(|e| {
            IconError::TierUnavailable {
                tier,
                source: Some(e),
            }
        })?;

        Ok(WindowsImageList {
            list,
            tier,
            _com: com,
        })
    }
}

impl ShellImageList for WindowsImageList {
    type Icon = OwnedIcon;

    fn icon(&self, index: SystemIconIndex, blend: BlendMode) -> Result<OwnedIcon, IconError> {
        let lookup_failed = |source| IconError::IconLookupFailed {
            index: index.get(),
            tier: self.tier,
            source,
        };

        let icon = unsafe { self.list.GetIcon(index.get(), blend.ild_flags()) }
            .map_err(|e| lookup_failed(Some(e)))?;

        if icon.is_invalid() {
            return Err(lookup_failed(None));
        }

        Ok(unsafe { OwnedIcon::from_raw(icon.0) })
    }
}

/// Resolve the jumbo icon for `path` with the Windows shell.
///
/// `on_resolved` receives the icon at most once and only on success; it
/// owns the handle from then on.
pub fn resolve_icon<F>(path: &str, on_resolved: F) -> Result<(), IconError>
where
    F: FnOnce(OwnedIcon),
{
    IconResolver::new(WindowsShell).resolve_with(path, on_resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::{IconEngine, ShellIcon};
    use std::path::Path;

    #[test]
    fn test_text_file_resolves_once() {
        let mut icons = Vec::new();
        resolve_icon("readme.txt", |icon| icons.push(icon)).unwrap();
        assert_eq!(icons.len(), 1);
        assert!(!icons[0].as_raw().is_null());
    }

    #[test]
    fn test_nonexistent_path_resolves() {
        let path = r"C:\Path\To\NoWhere\fakefile.jpg";
        assert!(!Path::new(path).exists());
        let mut count = 0;
        resolve_icon(path, |_| count += 1).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_same_path_gives_distinct_handles() {
        let resolver = IconResolver::new(WindowsShell);
        let first = resolver.resolve("a.txt").unwrap();
        let second = resolver.resolve("a.txt").unwrap();
        assert_ne!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_jumbo_bitmap_dimensions() {
        let engine = IconEngine::new(IconResolver::new(WindowsShell));
        let img = engine.icon_image(Path::new("readme.txt")).unwrap();
        assert_eq!(img.dimensions(), (256, 256));
    }

    #[test]
    fn test_directory_attribute_gives_folder_icon() {
        let folder = WindowsShell
            .system_icon_index("C:\\Windows", FileAttributes::Directory)
            .unwrap();
        let file = WindowsShell
            .system_icon_index("C:\\Windows", FileAttributes::Normal)
            .unwrap();
        assert_ne!(folder, file);
    }

    #[test]
    fn test_concurrent_resolution() {
        let paths = ["a.txt", "b.png", "c.exe", "d.zip"];
        std::thread::scope(|s| {
            for path in paths {
                s.spawn(move || {
                    let expected = WindowsShell.system_icon_index(path, FileAttributes::Normal).unwrap();
                    let mut got = None;
                    resolve_icon(path, |icon| got = Some(icon.bitmap().is_ok())).unwrap();
                    assert_eq!(got, Some(true));
                    assert_eq!(WindowsShell.system_icon_index(path, FileAttributes::Normal).unwrap(), expected);
                });
            }
        });
    }
}
