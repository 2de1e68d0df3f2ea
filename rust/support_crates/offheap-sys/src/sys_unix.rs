use std::sync::OnceLock;

/// Allocates `size` bytes from the process heap via `malloc`.
///
/// The returned block is aligned for any fundamental type (at least 8 bytes on
/// all supported targets) and its contents are uninitialized.
///
/// # Returns
///
/// A pointer to the block, or null if the allocator could not satisfy the request.
/// A zero-byte request is rounded up to one byte so that a successful call always
/// yields a unique, freeable pointer. The block must be released with [`free`]
/// exactly once.
pub fn malloc(size: usize) -> *mut u8 {
    unsafe { libc::malloc(size.max(1)) as *mut u8 }
}

/// Returns a block obtained from [`malloc`] to the process heap.
///
/// # Safety
///
/// - `ptr` must have been returned by [`malloc`] and not freed since
/// - No reference to the block may be used after this call
pub unsafe fn free(ptr: *mut u8) {
    unsafe { libc::free(ptr as *mut libc::c_void) }
}

/// Gets the system's standard page size in bytes.
///
/// The value is cached after the first call. If the page size cannot be determined,
/// returns a default value of 4KB (4,096 bytes).
pub fn get_page_size() -> usize {
    static SIZE: OnceLock<usize> = OnceLock::new();
    if let Some(&size) = SIZE.get() {
        size
    } else {
        match read_page_size() {
            Ok(size) => {
                let _ = SIZE.set(size);
                size
            }
            Err(_) => 4 * 1024,
        }
    }
}

/// Reads the standard page size from the system using `sysconf(_SC_PAGESIZE)`.
fn read_page_size() -> std::io::Result<usize> {
    let res = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    assert!(res < i32::MAX as _);
    Ok(res as usize)
}
