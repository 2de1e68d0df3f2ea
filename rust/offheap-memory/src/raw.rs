//! Raw native memory primitives: allocation, single-byte access, fills and bulk
//! copies between addresses and byte slices.
//!
//! All functions that dereference an [`Address`] are `unsafe`: the layer performs no
//! bounds or liveness tracking, and an invalid address is undefined behavior.
//! None of the copy functions support overlapping source and destination ranges.

use std::alloc::{Layout, handle_alloc_error};

use crate::{Address, CopyPolicy};

#[inline]
pub(crate) fn as_ptr(address: Address) -> *const u8 {
    address as usize as *const u8
}

#[inline]
pub(crate) fn as_mut_ptr(address: Address) -> *mut u8 {
    address as usize as *mut u8
}

/// Returns the size of a regular memory page, in bytes.
pub fn page_size() -> usize {
    offheap_sys::get_page_size()
}

/// Allocates `size` bytes of uninitialized native memory and returns the base address.
///
/// The memory must be released with [`free`] exactly once.
///
/// Allocation failure is not reported to the caller: it is logged and the process is
/// terminated through [`handle_alloc_error`]. This layer has no means of recovering
/// from a failed raw allocation.
pub fn allocate(size: usize) -> Address {
    let ptr = offheap_sys::malloc(size);
    if ptr.is_null() {
        log::error!("native allocation of {size} bytes failed");
        handle_alloc_error(
            Layout::from_size_align(size.max(1), 1).unwrap_or_else(|_| Layout::new::<u8>()),
        );
    }
    log::trace!("allocated {size} bytes at {ptr:p}");
    ptr as usize as Address
}

/// Releases a block previously returned by [`allocate`].
///
/// # Safety
///
/// - `address` must have been returned by [`allocate`] and not released since
/// - The block must not be accessed after this call, through any view or address
pub unsafe fn free(address: Address) {
    log::trace!("freeing native block at {address:#x}");
    unsafe { offheap_sys::free(as_mut_ptr(address)) }
}

/// Reads one byte.
///
/// # Safety
///
/// `address` must be valid for reads.
#[inline]
pub unsafe fn get_byte(address: Address) -> u8 {
    unsafe { as_ptr(address).read() }
}

/// Writes one byte.
///
/// # Safety
///
/// `address` must be valid for writes.
#[inline]
pub unsafe fn set_byte(address: Address, value: u8) {
    unsafe { as_mut_ptr(address).write(value) }
}

/// Fills `count` bytes starting at `address` with `value`.
///
/// # Safety
///
/// `[address, address + count)` must be valid for writes.
#[inline]
pub unsafe fn set_memory(address: Address, count: usize, value: u8) {
    unsafe { as_mut_ptr(address).write_bytes(value, count) }
}

/// Copies `count` bytes from native address `src` to native address `dst`.
///
/// # Safety
///
/// - `[src, src + count)` must be valid for reads
/// - `[dst, dst + count)` must be valid for writes
/// - The two ranges must not overlap
pub unsafe fn copy_memory(src: Address, dst: Address, count: usize, policy: CopyPolicy) {
    policy.for_each_chunk(count, |offset, len| unsafe {
        std::ptr::copy_nonoverlapping(
            as_ptr(src).add(offset),
            as_mut_ptr(dst).add(offset),
            len,
        );
    });
}

/// Copies all of `src` to native address `dst`.
///
/// # Safety
///
/// `[dst, dst + src.len())` must be valid for writes and must not overlap `src`.
pub unsafe fn copy_from_slice(src: &[u8], dst: Address, policy: CopyPolicy) {
    policy.for_each_chunk(src.len(), |offset, len| unsafe {
        std::ptr::copy_nonoverlapping(src.as_ptr().add(offset), as_mut_ptr(dst).add(offset), len);
    });
}

/// Fills all of `dst` from native address `src`.
///
/// # Safety
///
/// `[src, src + dst.len())` must be valid for reads and must not overlap `dst`.
pub unsafe fn copy_to_slice(src: Address, dst: &mut [u8], policy: CopyPolicy) {
    let target = dst.as_mut_ptr();
    policy.for_each_chunk(dst.len(), |offset, len| unsafe {
        std::ptr::copy_nonoverlapping(as_ptr(src).add(offset), target.add(offset), len);
    });
}
