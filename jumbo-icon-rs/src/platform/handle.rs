//! Owned HICON wrapper and bitmap read-back.

use crate::icon::{IconError, RawBitmap, ShellIcon};
use std::ffi::c_void;
use std::mem::size_of;
use windows::Win32::Graphics::Gdi::{
    DeleteObject, GetDC, GetDIBits, GetObjectW, ReleaseDC, BITMAP, BITMAPINFO, BITMAPINFOHEADER,
    BI_RGB, DIB_RGB_COLORS, HBITMAP, HDC,
};
use windows::Win32::UI::WindowsAndMessaging::{DestroyIcon, GetIconInfo, HICON, ICONINFO};

/// An icon handle owned by this process. Destroyed on drop.
#[derive(Debug)]
pub struct OwnedIcon(HICON);

// HICON is a session-wide USER object; any thread may use or destroy it.
unsafe impl Send for OwnedIcon {}

impl OwnedIcon {
    /// Take ownership of `icon`.
    ///
    /// # Safety
    /// `icon` must be a valid icon handle not owned by anything else.
    pub unsafe fn from_raw(icon: *mut c_void) -> Self {
        Self(HICON(icon))
    }

    pub fn as_raw(&self) -> *mut c_void {
        self.0 .0
    }

    pub fn handle(&self) -> HICON {
        self.0
    }
}

impl Drop for OwnedIcon {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            unsafe {
                let _ = DestroyIcon(self.0);
            }
        }
    }
}

impl ShellIcon for OwnedIcon {
    fn bitmap(&self) -> Result<RawBitmap, IconError> {
        unsafe {
            let mut icon_info = ICONINFO::default();
            GetIconInfo(self.0, &mut icon_info).map_err(IconError::WindowsError)?;

            // GetIconInfo hands us copies of both bitmaps
            let planes = IconPlanes {
                color: icon_info.hbmColor,
                mask: icon_info.hbmMask,
            };

            if planes.color.is_invalid() {
                return Err(IconError::NoColorBitmap);
            }

            let mut bitmap = BITMAP::default();
            let written = GetObjectW(
                planes.color,
                size_of::<BITMAP>() as i32,
                Some(&mut bitmap as *mut BITMAP as *mut c_void),
            );
            if written == 0 || bitmap.bmWidth <= 0 || bitmap.bmHeight <= 0 {
                return Err(IconError::BitmapReadFailed(
                    "color bitmap has no dimensions".to_string(),
                ));
            }

            let width = bitmap.bmWidth;
            let height = bitmap.bmHeight;

            let hdc = GetDC(None);
            let color = read_dib(hdc, planes.color, width, height);
            let mask = if planes.mask.is_invalid() {
                None
            } else {
                read_dib(hdc, planes.mask, width, height).ok()
            };
            ReleaseDC(None, hdc);

            Ok(RawBitmap {
                width: width as u32,
                height: height as u32,
                bottom_up: false,
                color: color?,
                mask,
            })
        }
    }

    fn into_raw(self) -> *mut c_void {
        let raw = self.0 .0;
        std::mem::forget(self);
        raw
    }
}

/// Bitmaps returned by GetIconInfo; deleted on drop.
struct IconPlanes {
    color: HBITMAP,
    mask: HBITMAP,
}

impl Drop for IconPlanes {
    fn drop(&mut self) {
        unsafe {
            if !self.color.is_invalid() {
                let _ = DeleteObject(self.color);
            }
            if !self.mask.is_invalid() {
                let _ = DeleteObject(self.mask);
            }
        }
    }
}

/// Read `bitmap` as top-down 32bpp BGRA.
unsafe fn read_dib(hdc: HDC, bitmap: HBITMAP, width: i32, height: i32) -> Result<Vec<u8>, IconError> {
    let mut bmi = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width,
            biHeight: -height,
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut pixels = vec![0u8; width as usize * height as usize * 4];
    let lines = GetDIBits(
        hdc,
        bitmap,
        0,
        height as u32,
        Some(pixels.as_mut_ptr() as *mut c_void),
        &mut bmi,
        DIB_RGB_COLORS,
    );

    if lines != height {
        return Err(IconError::BitmapReadFailed(format!(
            "GetDIBits copied {} of {} scan lines",
            lines, height
        )));
    }
    Ok(pixels)
}

/// Destroy an icon handle previously given away with `into_raw`.
///
/// # Safety
/// `icon` must be a valid icon handle owned by the caller.
pub unsafe fn destroy_raw_icon(icon: *mut c_void) -> Result<(), IconError> {
    if icon.is_null() {
        return Err(IconError::InvalidHandle);
    }
    DestroyIcon(HICON(icon)).map_err(IconError::WindowsError)
}
