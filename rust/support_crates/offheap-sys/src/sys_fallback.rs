use std::alloc::{Layout, alloc, dealloc};

/// Size of the bookkeeping header placed in front of every block. Doubles as the
/// block alignment.
const HEADER: usize = 16;

/// Allocates `size` bytes using the global allocator (emulated `malloc`).
///
/// The requested size is stored in a header preceding the returned pointer, so that
/// [`free`] can reconstruct the layout. Returns null on failure.
pub fn malloc(size: usize) -> *mut u8 {
    let Some(total) = size.max(1).checked_add(HEADER) else {
        return std::ptr::null_mut();
    };
    let Ok(layout) = Layout::from_size_align(total, HEADER) else {
        return std::ptr::null_mut();
    };
    unsafe {
        let base = alloc(layout);
        if base.is_null() {
            return base;
        }
        (base as *mut usize).write(total);
        base.add(HEADER)
    }
}

/// Frees a block obtained from [`malloc`].
///
/// # Safety
///
/// `ptr` must have been returned by [`malloc`] and not freed since.
pub unsafe fn free(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        let base = ptr.sub(HEADER);
        let total = (base as *const usize).read();
        dealloc(base, Layout::from_size_align_unchecked(total, HEADER));
    }
}

/// Returns the "standard page" size in bytes.
pub fn get_page_size() -> usize {
    4 * 1024
}
