//! Process elevation check
//!
//! Elevation is a point-in-time property: it is checked once, on first use, and the
//! answer is kept for the rest of the process lifetime even if privileges change.

use std::sync::OnceLock;

/// One-time cache for an elevation answer
#[derive(Debug, Default)]
pub struct ElevationCache {
    value: OnceLock<bool>,
}

impl ElevationCache {
    /// Create an empty cache
    pub const fn new() -> Self {
        Self {
            value: OnceLock::new(),
        }
    }

    /// Return the cached answer, running `check` only on the first call
    ///
    /// Concurrent first calls run `check` at most once.
    pub fn get_or_check(&self, check: impl FnOnce() -> bool) -> bool {
        *self.value.get_or_init(check)
    }
}

static PROCESS_ELEVATION: ElevationCache = ElevationCache::new();

/// Whether the current process token is elevated (cached)
pub fn is_process_elevated() -> bool {
    PROCESS_ELEVATION.get_or_check(query_token_elevation)
}

/// Query `TokenElevation` of the current process token
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Windows FFI to read the process token elevation"
)]
fn query_token_elevation() -> bool {
    use std::ffi::c_void;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation};
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    let mut token = HANDLE::default();
    // SAFETY: GetCurrentProcess returns a pseudo handle that is always valid
    if let Err(e) = unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &raw mut token) } {
        tracing::warn!("Failed to open process token, assuming not elevated: {}", e);
        return false;
    }

    let mut elevation = TOKEN_ELEVATION::default();
    let mut return_length = 0u32;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "size_of::<TOKEN_ELEVATION>() is a compile-time constant that fits in u32"
    )]
    let size = std::mem::size_of::<TOKEN_ELEVATION>() as u32;

    // SAFETY: the buffer is a TOKEN_ELEVATION of exactly `size` bytes
    let result = unsafe {
        GetTokenInformation(
            token,
            TokenElevation,
            Some((&raw mut elevation).cast::<c_void>()),
            size,
            &raw mut return_length,
        )
    };

    // SAFETY: token was opened above and is closed exactly once
    unsafe {
        let _ = CloseHandle(token);
    }

    match result {
        Ok(()) => elevation.TokenIsElevated != 0,
        Err(e) => {
            tracing::warn!("Failed to read token elevation, assuming not elevated: {}", e);
            false
        }
    }
}

#[cfg(not(windows))]
fn query_token_elevation() -> bool {
    false
}
