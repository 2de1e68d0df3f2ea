//! Alignment arithmetic on raw addresses.

use crate::Address;

/// Checks if an address lies on a multiple of `width` bytes.
///
/// # Arguments
///
/// * `address` - The address to check
/// * `width` - The alignment boundary (must be a power of 2 and non-zero)
///
/// # Examples
///
/// ```
/// use offheap_memory::align::is_aligned;
///
/// assert!(is_aligned(0, 8));
/// assert!(!is_aligned(1, 8));
/// assert!(is_aligned(16, 8));
/// assert!(is_aligned(6, 2));
/// assert!(!is_aligned(6, 4));
/// ```
///
/// # Panics
///
/// Panics in debug builds if `width` is zero or not a power of 2.
#[inline]
pub fn is_aligned(address: Address, width: u64) -> bool {
    misalignment(address, width) == 0
}

/// Returns `address mod width`, i.e. how far the address is past the previous
/// `width`-byte boundary.
///
/// ```
/// use offheap_memory::align::misalignment;
///
/// assert_eq!(misalignment(0x1000, 8), 0);
/// assert_eq!(misalignment(0x1003, 8), 3);
/// assert_eq!(misalignment(0x1003, 2), 1);
/// ```
#[inline]
pub fn misalignment(address: Address, width: u64) -> u64 {
    debug_assert_ne!(width, 0);
    debug_assert!(width.is_power_of_two());
    address & (width - 1)
}
