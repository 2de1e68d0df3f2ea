use std::sync::OnceLock;

use windows_sys::Win32::System::SystemInformation::{GetSystemInfo, SYSTEM_INFO};

/// Allocates `size` bytes from the CRT heap via `malloc`.
///
/// Returns null if the allocator could not satisfy the request. A zero-byte request is
/// rounded up to one byte.
pub fn malloc(size: usize) -> *mut u8 {
    unsafe { libc::malloc(size.max(1)) as *mut u8 }
}

/// Returns a block obtained from [`malloc`] to the CRT heap.
///
/// # Safety
///
/// `ptr` must have been returned by [`malloc`] and not freed since.
pub unsafe fn free(ptr: *mut u8) {
    unsafe { libc::free(ptr as *mut libc::c_void) }
}

/// Gets the system's page size in bytes, as reported by `GetSystemInfo`.
///
/// The value is cached after the first call.
pub fn get_page_size() -> usize {
    static SIZE: OnceLock<usize> = OnceLock::new();
    *SIZE.get_or_init(|| {
        let mut info: SYSTEM_INFO = unsafe { std::mem::zeroed() };
        unsafe { GetSystemInfo(&mut info) };
        let size = info.dwPageSize as usize;
        if size.is_power_of_two() {
            size
        } else {
            4 * 1024
        }
    })
}
