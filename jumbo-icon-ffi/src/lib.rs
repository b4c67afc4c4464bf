//! FFI bindings for the jumbo icon resolver.
//!
//! This crate provides C ABI functions for native and managed hosts.
//! All functions use panic::catch_unwind to prevent Rust panics from
//! unwinding across the FFI boundary.

use jumbo_icon::{
    BlendMode, IconEngine, IconError, IconResolver, IconShell, ImageListTier, ResolverConfig,
    ShellIcon,
};
use serde::Deserialize;
use std::cell::RefCell;
use std::ffi::{c_char, c_void, CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::ptr;
use std::sync::RwLock;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[cfg(windows)]
use jumbo_icon::WindowsShell;

// ============================================================================
// Error Handling
// ============================================================================

/// Error codes returned by FFI functions.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    InvalidHandle = -1,
    InvalidArgument = -2,
    ClassificationFailed = -3,
    TierUnavailable = -4,
    IconLookupFailed = -5,
    BitmapError = -6,
    JsonError = -7,
    Panic = -99,
}

impl From<&IconError> for ErrorCode {
    fn from(err: &IconError) -> Self {
        match err {
            IconError::ClassificationFailed { .. } => ErrorCode::ClassificationFailed,
            IconError::TierUnavailable { .. } => ErrorCode::TierUnavailable,
            IconError::IconLookupFailed { .. } => ErrorCode::IconLookupFailed,
            IconError::InvalidHandle => ErrorCode::InvalidHandle,
            IconError::PathNotFound(_) | IconError::StringConversion(_) => {
                ErrorCode::InvalidArgument
            }
            IconError::NoColorBitmap
            | IconError::BitmapReadFailed(_)
            | IconError::EncodeFailed(_)
            | IconError::WindowsError(_) => ErrorCode::BitmapError,
        }
    }
}

/// Thread-local storage for the last error.
thread_local! {
    static LAST_ERROR: RefCell<Option<(ErrorCode, String)>> = const { RefCell::new(None) };
}

fn set_last_error(code: ErrorCode, message: impl Into<String>) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some((code, message.into()));
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Record `err` as the last error and return its code.
fn fail(err: &IconError) -> i32 {
    let code = ErrorCode::from(err);
    set_last_error(code, err.to_string());
    code as i32
}

// ============================================================================
// Configuration
// ============================================================================

/// Library configuration passed to `jumbo_icon_init` as JSON.
#[derive(Debug, Default, Deserialize)]
pub struct EngineConfig {
    /// Tracing filter directive, e.g. "debug" or "jumbo_icon=trace"
    #[serde(default)]
    pub log_level: Option<String>,

    /// Image list tier name: "jumbo" (default), "extra-large", "large", "small", "sys-small"
    #[serde(default)]
    pub tier: Option<String>,

    /// Blend mode name: "transparent" (default) or "normal"
    #[serde(default)]
    pub blend: Option<String>,
}

/// Resolver settings installed by `jumbo_icon_init`; `None` until then.
static RESOLVER_CONFIG: RwLock<Option<ResolverConfig>> = RwLock::new(None);

#[cfg_attr(not(windows), allow(dead_code))]
fn current_config() -> ResolverConfig {
    RESOLVER_CONFIG
        .read()
        .map(|config| config.unwrap_or_default())
        .unwrap_or_default()
}

impl EngineConfig {
    fn resolver_config(&self) -> Result<ResolverConfig, String> {
        let mut config = ResolverConfig::default();
        if let Some(name) = &self.tier {
            config.tier =
                ImageListTier::from_name(name).ok_or_else(|| format!("Unknown image list tier: {name}"))?;
        }
        if let Some(name) = &self.blend {
            config.blend =
                BlendMode::from_name(name).ok_or_else(|| format!("Unknown blend mode: {name}"))?;
        }
        Ok(config)
    }

    fn env_filter(&self) -> EnvFilter {
        match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        }
    }
}

// ============================================================================
// Callback Type
// ============================================================================

/// Receives a newly created icon handle (an `HICON`).
///
/// The receiver owns the handle and must release it, for example with
/// `jumbo_icon_destroy`.
pub type IconCallback = Option<unsafe extern "C" fn(icon: *mut c_void)>;

// ============================================================================
// Helper Functions
// ============================================================================

/// Allocate a C string from a Rust string. Caller must free with jumbo_icon_free_string.
fn alloc_c_string(s: &str) -> *mut c_char {
    match CString::new(s.replace('\0', "")) {
        Ok(cs) => cs.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Parse a C string to a Rust string slice.
unsafe fn parse_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Parse a null-terminated UTF-16 string.
#[cfg_attr(not(windows), allow(dead_code))]
unsafe fn parse_wide_str(ptr: *const u16) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let mut len = 0;
    while *ptr.add(len) != 0 {
        len += 1;
    }
    String::from_utf16(std::slice::from_raw_parts(ptr, len)).ok()
}

/// Resolve `path` with `shell` and hand the icon to `callback`.
#[cfg_attr(not(windows), allow(dead_code))]
fn get_icon_with<S: IconShell>(
    shell: S,
    config: ResolverConfig,
    path: Option<&str>,
    callback: IconCallback,
) -> i32 {
    let Some(callback) = callback else {
        set_last_error(ErrorCode::InvalidArgument, "Null callback");
        return ErrorCode::InvalidArgument as i32;
    };
    let Some(path) = path else {
        set_last_error(ErrorCode::InvalidArgument, "Invalid file path");
        return ErrorCode::InvalidArgument as i32;
    };

    match IconResolver::with_config(shell, config).resolve(path) {
        Ok(icon) => {
            let raw = icon.into_raw();
            debug!(path, "delivering icon to callback");
            unsafe { callback(raw) };
            ErrorCode::Success as i32
        }
        Err(e) => fail(&e),
    }
}

/// Resolve `path` with `shell` into a PNG buffer. Caller frees with jumbo_icon_free_buffer.
#[cfg_attr(not(windows), allow(dead_code))]
unsafe fn get_png_with<S: IconShell>(
    shell: S,
    config: ResolverConfig,
    path: Option<&str>,
    out_len: *mut usize,
) -> *mut u8 {
    if out_len.is_null() {
        set_last_error(ErrorCode::InvalidArgument, "Null length pointer");
        return ptr::null_mut();
    }
    *out_len = 0;

    let Some(path) = path else {
        set_last_error(ErrorCode::InvalidArgument, "Invalid file path");
        return ptr::null_mut();
    };

    match IconEngine::new(IconResolver::with_config(shell, config)).icon_png(Path::new(path)) {
        Ok(png) => {
            let boxed = png.into_boxed_slice();
            *out_len = boxed.len();
            Box::into_raw(boxed) as *mut u8
        }
        Err(e) => {
            fail(&e);
            ptr::null_mut()
        }
    }
}

fn guarded(what: &str, f: impl FnOnce() -> i32) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(code) => code,
        Err(_) => {
            set_last_error(ErrorCode::Panic, format!("Panic during {what}"));
            ErrorCode::Panic as i32
        }
    }
}

// ============================================================================
// FFI Functions - Lifecycle
// ============================================================================

/// Initialize logging and resolver settings.
///
/// # Arguments
/// * `config_json` - JSON configuration string (can be null for defaults)
///
/// # Returns
/// 0 on success, negative error code on failure. Calling it again is harmless.
#[no_mangle]
pub extern "C" fn jumbo_icon_init(config_json: *const c_char) -> i32 {
    clear_last_error();

    guarded("init", || {
        let config = if config_json.is_null() {
            EngineConfig::default()
        } else {
            let parsed = unsafe { parse_c_str(config_json) }
                .ok_or_else(|| "Config is not valid UTF-8".to_string())
                .and_then(|json| serde_json::from_str::<EngineConfig>(json).map_err(|e| e.to_string()));
            match parsed {
                Ok(config) => config,
                Err(message) => {
                    set_last_error(ErrorCode::JsonError, message);
                    return ErrorCode::JsonError as i32;
                }
            }
        };

        let resolver_config = match config.resolver_config() {
            Ok(resolver_config) => resolver_config,
            Err(message) => {
                set_last_error(ErrorCode::InvalidArgument, message);
                return ErrorCode::InvalidArgument as i32;
            }
        };

        // A subscriber installed earlier (by us or the host) stays in place
        let _ = tracing_subscriber::fmt()
            .with_env_filter(config.env_filter())
            .with_writer(std::io::stderr)
            .try_init();

        match RESOLVER_CONFIG.write() {
            Ok(mut slot) => *slot = Some(resolver_config),
            Err(_) => {
                set_last_error(ErrorCode::Panic, "Resolver configuration lock poisoned");
                return ErrorCode::Panic as i32;
            }
        }

        info!(tier = %resolver_config.tier, blend = ?resolver_config.blend, "jumbo icon initialized");
        ErrorCode::Success as i32
    })
}

// ============================================================================
// FFI Functions - Icon Operations
// ============================================================================

/// Resolve the jumbo icon for a file path.
///
/// # Arguments
/// * `file_path` - UTF-8 path or representative name such as "*.txt"; the file is not opened
/// * `callback` - Invoked at most once, before this returns, with a new HICON
///
/// # Returns
/// 0 if the callback was invoked, negative error code otherwise.
#[cfg(windows)]
#[no_mangle]
pub extern "C" fn jumbo_icon_get(file_path: *const c_char, callback: IconCallback) -> i32 {
    clear_last_error();

    guarded("icon resolution", || {
        let path = unsafe { parse_c_str(file_path) };
        get_icon_with(WindowsShell, current_config(), path, callback)
    })
}

/// Resolve the jumbo icon for a file path, without a status code.
///
/// Drop-in for hosts written against `void getIcon(const char*, Callback)`.
/// Failures are still recorded for jumbo_icon_last_error_code().
#[cfg(windows)]
#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn getIcon(file_path: *const c_char, callback: IconCallback) {
    let _ = jumbo_icon_get(file_path, callback);
}

/// Resolve the jumbo icon for a UTF-16 file path.
///
/// Same contract as jumbo_icon_get().
#[cfg(windows)]
#[no_mangle]
pub extern "C" fn jumbo_icon_get_wide(file_path: *const u16, callback: IconCallback) -> i32 {
    clear_last_error();

    guarded("icon resolution", || {
        let path = unsafe { parse_wide_str(file_path) };
        get_icon_with(WindowsShell, current_config(), path.as_deref(), callback)
    })
}

/// Resolve the jumbo icon for a file path as PNG bytes.
///
/// # Returns
/// Buffer of `*out_len` bytes. Caller must free with jumbo_icon_free_buffer().
/// Returns null on failure.
#[cfg(windows)]
#[no_mangle]
pub extern "C" fn jumbo_icon_get_png(file_path: *const c_char, out_len: *mut usize) -> *mut u8 {
    clear_last_error();

    let result = panic::catch_unwind(|| unsafe {
        let path = parse_c_str(file_path);
        get_png_with(WindowsShell, current_config(), path, out_len)
    });

    match result {
        Ok(buffer) => buffer,
        Err(_) => {
            set_last_error(ErrorCode::Panic, "Panic during PNG extraction");
            ptr::null_mut()
        }
    }
}

/// Destroy an icon handle delivered to a callback.
///
/// # Returns
/// 0 on success, negative error code on failure.
#[cfg(windows)]
#[no_mangle]
pub extern "C" fn jumbo_icon_destroy(icon: *mut c_void) -> i32 {
    clear_last_error();

    guarded("icon destroy", || match unsafe { jumbo_icon::platform::destroy_raw_icon(icon) } {
        Ok(()) => ErrorCode::Success as i32,
        Err(e) => fail(&e),
    })
}

// ============================================================================
// FFI Functions - Memory Management
// ============================================================================

/// Free a buffer returned by jumbo_icon_get_png().
///
/// # Safety
/// `ptr` and `len` must be exactly what jumbo_icon_get_png() returned.
#[no_mangle]
pub extern "C" fn jumbo_icon_free_buffer(ptr: *mut u8, len: usize) {
    if ptr.is_null() {
        return;
    }

    let _ = panic::catch_unwind(|| unsafe {
        let _ = Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len));
    });
}

/// Free a string allocated by this library.
///
/// # Safety
/// The pointer must have been returned by one of the jumbo_icon_* functions.
/// Do not call this on strings from other sources.
#[no_mangle]
pub extern "C" fn jumbo_icon_free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }

    let _ = panic::catch_unwind(|| unsafe {
        let _ = CString::from_raw(ptr);
    });
}

// ============================================================================
// FFI Functions - Error Handling
// ============================================================================

/// Get the last error code.
///
/// # Returns
/// The error code from the last failed operation, or 0 if no error.
#[no_mangle]
pub extern "C" fn jumbo_icon_last_error_code() -> i32 {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|(code, _)| *code as i32)
            .unwrap_or(0)
    })
}

/// Get the last error message.
///
/// # Returns
/// Error message string. Caller must free with jumbo_icon_free_string().
/// Returns null if no error.
#[no_mangle]
pub extern "C" fn jumbo_icon_last_error_message() -> *mut c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|(_, msg)| alloc_c_string(msg))
            .unwrap_or(ptr::null_mut())
    })
}

// ============================================================================
// FFI Functions - Utility
// ============================================================================

/// Get the library version.
///
/// # Returns
/// Version string. Caller must free with jumbo_icon_free_string().
#[no_mangle]
pub extern "C" fn jumbo_icon_version() -> *mut c_char {
    alloc_c_string(env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Tests
// ============================================================================
