//! Icon pixel data.
//!
//! Holds the planes read back from an icon and turns them into an
//! [`RgbaImage`].

use super::types::IconError;
use image::RgbaImage;
use std::io::Cursor;

/// Color and mask planes of one icon, as returned by `GetDIBits`.
#[derive(Debug, Clone)]
pub struct RawBitmap {
    pub width: u32,
    pub height: u32,

    /// Rows are stored last-row-first (the DIB default)
    pub bottom_up: bool,

    /// 32bpp BGRA color plane
    pub color: Vec<u8>,

    /// AND mask read at 32bpp; a white pixel marks transparency
    pub mask: Option<Vec<u8>>,
}

impl RawBitmap {
    fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Convert to a top-down RGBA image.
    ///
    /// Icons with an all-zero alpha channel predate per-pixel alpha; their
    /// transparency is taken from the mask, or they are treated as opaque.
    pub fn into_rgba_image(self) -> Result<RgbaImage, IconError> {
        let expected = self.expected_len();
        if self.width == 0 || self.height == 0 || self.color.len() != expected {
            return Err(IconError::BitmapReadFailed(format!(
                "{}x{} bitmap with {} color bytes",
                self.width,
                self.height,
                self.color.len()
            )));
        }

        let mask = self.mask.filter(|m| m.len() == expected);
        let legacy_alpha = self.color.chunks_exact(4).all(|px| px[3] == 0);
        let row_len = self.width as usize * 4;
        let mut rgba = Vec::with_capacity(expected);

        for row in 0..self.height as usize {
            let src_row = if self.bottom_up {
                self.height as usize - 1 - row
            } else {
                row
            };
            let start = src_row * row_len;

            for x in (start..start + row_len).step_by(4) {
                let b = self.color[x];
                let g = self.color[x + 1];
                let r = self.color[x + 2];
                let a = if !legacy_alpha {
                    self.color[x + 3]
                } else {
                    match &mask {
                        Some(m) if m[x] != 0 || m[x + 1] != 0 || m[x + 2] != 0 => 0,
                        _ => 255,
                    }
                };
                rgba.extend_from_slice(&[r, g, b, a]);
            }
        }

        RgbaImage::from_raw(self.width, self.height, rgba)
            .ok_or_else(|| IconError::BitmapReadFailed("pixel buffer size mismatch".to_string()))
    }
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, IconError> {
    let mut png_data = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
        .map_err(IconError::EncodeFailed)?;
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(color: Vec<u8>, mask: Option<Vec<u8>>, bottom_up: bool) -> RawBitmap {
        RawBitmap {
            width: 2,
            height: 2,
            bottom_up,
            color,
            mask,
        }
    }

    #[test]
    fn test_bgra_to_rgba_top_down() {
        #[rustfmt::skip]
        let color = vec![
            1, 2, 3, 255,   4, 5, 6, 128,
            7, 8, 9, 64,    10, 11, 12, 0,
        ];
        let img = bitmap(color, None, false).into_rgba_image().unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [3, 2, 1, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [6, 5, 4, 128]);
        assert_eq!(img.get_pixel(1, 1).0, [12, 11, 10, 0]);
    }

    #[test]
    fn test_bottom_up_rows_are_flipped() {
        #[rustfmt::skip]
        let color = vec![
            0, 0, 255, 255,  0, 0, 255, 255,
            255, 0, 0, 255,  255, 0, 0, 255,
        ];
        let img = bitmap(color, None, true).into_rgba_image().unwrap();
        // Last stored row (blue) is the top of the image
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_legacy_icon_uses_mask() {
        let color = vec![50u8, 60, 70, 0].repeat(4);
        #[rustfmt::skip]
        let mask = vec![
            255, 255, 255, 0,  0, 0, 0, 0,
            0, 0, 0, 0,        255, 255, 255, 0,
        ];
        let img = bitmap(color, Some(mask), false).into_rgba_image().unwrap();
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
        assert_eq!(img.get_pixel(1, 0).0[3], 255);
        assert_eq!(img.get_pixel(0, 1).0[3], 255);
        assert_eq!(img.get_pixel(1, 1).0[3], 0);
    }

    #[test]
    fn test_legacy_icon_without_mask_is_opaque() {
        let color = vec![1u8, 2, 3, 0].repeat(4);
        let img = bitmap(color, None, false).into_rgba_image().unwrap();
        assert!(img.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let err = bitmap(vec![0; 8], None, false).into_rgba_image().unwrap_err();
        assert!(matches!(err, IconError::BitmapReadFailed(_)));
    }

    #[test]
    fn test_png_signature() {
        let img = RgbaImage::new(4, 4);
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
