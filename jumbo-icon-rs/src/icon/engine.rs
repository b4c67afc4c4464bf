//! Icon images for files.
//!
//! Builds on [`IconResolver`] to return decoded pixels or PNG bytes
//! instead of a raw handle.

use super::pixels::{encode_png, RawBitmap};
use super::resolver::IconResolver;
use super::shell::{IconShell, ShellIcon};
use super::types::{FileAttributes, IconError};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::path::Path;
use tracing::debug;

/// Engine options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Reject paths that do not exist before asking the shell
    pub require_existing: bool,
}

/// Produces icon images for file paths.
pub struct IconEngine<S> {
    resolver: IconResolver<S>,
    options: EngineOptions,
}

impl<S: IconShell> IconEngine<S> {
    pub fn new(resolver: IconResolver<S>) -> Self {
        Self::with_options(resolver, EngineOptions::default())
    }

    pub fn with_options(resolver: IconResolver<S>, options: EngineOptions) -> Self {
        Self { resolver, options }
    }

    pub fn resolver(&self) -> &IconResolver<S> {
        &self.resolver
    }

    /// Read the raw color and mask planes of the icon for `path`.
    ///
    /// The icon handle is released before this returns.
    pub fn icon_bitmap(&self, path: &Path) -> Result<RawBitmap, IconError> {
        if self.options.require_existing && !path.exists() {
            return Err(IconError::PathNotFound(path.to_path_buf()));
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| IconError::StringConversion(path.display().to_string()))?;

        // Extension-only classification cannot tell a directory from a file
        let attributes = match self.resolver.config().attributes {
            FileAttributes::Normal if path.is_dir() => FileAttributes::Directory,
            other => other,
        };

        let icon = self.resolver.resolve_as(path_str, attributes)?;
        let bitmap = icon.bitmap()?;
        debug!(path = path_str, width = bitmap.width, height = bitmap.height, "read icon bitmap");
        Ok(bitmap)
    }

    /// Icon for `path` as a top-down RGBA image.
    pub fn icon_image(&self, path: &Path) -> Result<RgbaImage, IconError> {
        self.icon_bitmap(path)?.into_rgba_image()
    }

    /// Icon for `path` scaled to `width` x `height`.
    ///
    /// A zero dimension keeps the icon's own size on that axis. With
    /// `preserve_ratio` the icon is fit inside the requested box; `smooth`
    /// selects Lanczos3 over nearest-neighbour filtering.
    pub fn icon_image_scaled(
        &self,
        path: &Path,
        width: u32,
        height: u32,
        preserve_ratio: bool,
        smooth: bool,
    ) -> Result<RgbaImage, IconError> {
        let image = self.icon_image(path)?;
        let width = if width == 0 { image.width() } else { width };
        let height = if height == 0 { image.height() } else { height };

        if image.dimensions() == (width, height) {
            return Ok(image);
        }

        let filter = if smooth {
            FilterType::Lanczos3
        } else {
            FilterType::Nearest
        };

        let scaled = if preserve_ratio {
            DynamicImage::ImageRgba8(image).resize(width, height, filter).to_rgba8()
        } else {
            imageops::resize(&image, width, height, filter)
        };
        Ok(scaled)
    }

    /// Icon for `path` encoded as PNG.
    pub fn icon_png(&self, path: &Path) -> Result<Vec<u8>, IconError> {
        encode_png(&self.icon_image(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::resolver::tests::MockShell;
    use crate::icon::types::ImageListTier;

    #[test]
    fn test_icon_image_from_mock() {
        let engine = IconEngine::new(IconResolver::new(MockShell::new()));
        let img = engine.icon_image(Path::new("notes.txt")).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        // Mock encodes the index (3 for .txt) in the blue channel
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 3, 255]);
    }

    #[test]
    fn test_icon_released_after_read() {
        let engine = IconEngine::new(IconResolver::new(MockShell::new()));
        engine.icon_bitmap(Path::new("a.exe")).unwrap();
        assert_eq!(engine.resolver().shell().released.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_require_existing_rejects_missing_path() {
        let options = EngineOptions {
            require_existing: true,
        };
        let engine = IconEngine::with_options(IconResolver::new(MockShell::new()), options);
        let err = engine
            .icon_png(Path::new("/Path/To/NoWhere/fakefile.jpg"))
            .unwrap_err();
        assert!(matches!(err, IconError::PathNotFound(_)));
        assert_eq!(
            engine.resolver().shell().calls.load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[test]
    fn test_missing_path_allowed_by_default() {
        let engine = IconEngine::new(IconResolver::new(MockShell::new()));
        let png = engine.icon_png(Path::new("/Path/To/NoWhere/fakefile.jpg")).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn test_scaled_to_requested_size() {
        let engine = IconEngine::new(IconResolver::new(MockShell::new()));
        let img = engine
            .icon_image_scaled(Path::new("notes.txt"), 4, 4, false, false)
            .unwrap();
        assert_eq!(img.dimensions(), (4, 4));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 3, 255]));
    }

    #[test]
    fn test_scaled_preserves_ratio() {
        let engine = IconEngine::new(IconResolver::new(MockShell::new()));
        let fitted = engine
            .icon_image_scaled(Path::new("notes.txt"), 8, 4, true, true)
            .unwrap();
        assert_eq!(fitted.dimensions(), (4, 4));

        let stretched = engine
            .icon_image_scaled(Path::new("notes.txt"), 8, 4, false, true)
            .unwrap();
        assert_eq!(stretched.dimensions(), (8, 4));
    }

    #[test]
    fn test_scaled_zero_keeps_size() {
        let engine = IconEngine::new(IconResolver::new(MockShell::new()));
        let img = engine
            .icon_image_scaled(Path::new("notes.txt"), 0, 0, true, false)
            .unwrap();
        assert_eq!(img.dimensions(), (2, 2));
    }

    #[test]
    fn test_directory_classified_as_directory() {
        let dir = std::env::temp_dir();
        let engine = IconEngine::new(IconResolver::new(MockShell::new()));
        engine.icon_image(&dir).unwrap();
        engine.icon_image(Path::new("/Path/To/NoWhere/fakefile.jpg")).unwrap();
        assert_eq!(
            *engine.resolver().shell().classified.lock().unwrap(),
            vec![FileAttributes::Directory, FileAttributes::Normal]
        );
    }

    #[test]
    fn test_from_disk_config_not_overridden_for_directory() {
        let config = crate::icon::ResolverConfig {
            attributes: FileAttributes::FromDisk,
            ..Default::default()
        };
        let engine = IconEngine::new(IconResolver::with_config(MockShell::new(), config));
        engine.icon_image(&std::env::temp_dir()).unwrap();
        assert_eq!(
            *engine.resolver().shell().classified.lock().unwrap(),
            vec![FileAttributes::FromDisk]
        );
    }

    #[test]
    fn test_tier_failure_propagates() {
        let shell = MockShell {
            unsupported_tier: Some(ImageListTier::Jumbo),
            ..MockShell::new()
        };
        let engine = IconEngine::new(IconResolver::new(shell));
        let err = engine.icon_image(Path::new("a.txt")).unwrap_err();
        assert!(matches!(err, IconError::TierUnavailable { .. }));
    }
}
