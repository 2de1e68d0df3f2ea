//! Native-endian 16/32/64-bit access at arbitrary addresses.
//!
//! Values are always laid out in the platform's native byte order. This is fine for
//! in-memory structures and wrong for anything that is written to disk or sent over
//! the network, where a fixed byte order must be used instead.
//!
//! Each access takes one of two paths:
//!
//! 1. If the address is naturally aligned for the width, or the platform permits
//!    unaligned access, a single native-width load or store is issued.
//! 2. Otherwise the value is read or written one byte at a time and assembled in the
//!    platform's byte order (`*_by_byte` functions below).

use std::ptr;

use crate::{Address, ByteOrder, Platform, align::is_aligned, raw};

/// Stateless native-endian accessor, parameterized by the platform capabilities it
/// should assume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeEndianMemory {
    platform: Platform,
}

impl NativeEndianMemory {
    pub const fn new(platform: Platform) -> NativeEndianMemory {
        NativeEndianMemory { platform }
    }

    /// Accessor for the detected platform.
    pub fn native() -> NativeEndianMemory {
        NativeEndianMemory::new(Platform::detect())
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Whether an access of `width` bytes at `address` takes the single native-width
    /// path.
    #[inline]
    pub fn is_fast_path(&self, address: Address, width: u64) -> bool {
        self.platform.unaligned_access || is_aligned(address, width)
    }

    /// # Safety
    ///
    /// `[address, address + 2)` must be valid for reads.
    #[inline]
    pub unsafe fn get_u16(&self, address: Address) -> u16 {
        unsafe {
            if is_aligned(address, 2) {
                ptr::read(raw::as_ptr(address) as *const u16)
            } else if self.platform.unaligned_access {
                ptr::read_unaligned(raw::as_ptr(address) as *const u16)
            } else {
                get_short_by_byte(address, self.platform.endianness)
            }
        }
    }

    /// # Safety
    ///
    /// `[address, address + 4)` must be valid for reads.
    #[inline]
    pub unsafe fn get_u32(&self, address: Address) -> u32 {
        unsafe {
            if is_aligned(address, 4) {
                ptr::read(raw::as_ptr(address) as *const u32)
            } else if self.platform.unaligned_access {
                ptr::read_unaligned(raw::as_ptr(address) as *const u32)
            } else {
                get_int_by_byte(address, self.platform.endianness)
            }
        }
    }

    /// # Safety
    ///
    /// `[address, address + 8)` must be valid for reads.
    #[inline]
    pub unsafe fn get_u64(&self, address: Address) -> u64 {
        unsafe {
            if is_aligned(address, 8) {
                ptr::read(raw::as_ptr(address) as *const u64)
            } else if self.platform.unaligned_access {
                ptr::read_unaligned(raw::as_ptr(address) as *const u64)
            } else {
                get_long_by_byte(address, self.platform.endianness)
            }
        }
    }

    /// # Safety
    ///
    /// `[address, address + 2)` must be valid for writes.
    #[inline]
    pub unsafe fn set_u16(&self, address: Address, value: u16) {
        unsafe {
            if is_aligned(address, 2) {
                ptr::write(raw::as_mut_ptr(address) as *mut u16, value)
            } else if self.platform.unaligned_access {
                ptr::write_unaligned(raw::as_mut_ptr(address) as *mut u16, value)
            } else {
                put_short_by_byte(address, value, self.platform.endianness)
            }
        }
    }

    /// # Safety
    ///
    /// `[address, address + 4)` must be valid for writes.
    #[inline]
    pub unsafe fn set_u32(&self, address: Address, value: u32) {
        unsafe {
            if is_aligned(address, 4) {
                ptr::write(raw::as_mut_ptr(address) as *mut u32, value)
            } else if self.platform.unaligned_access {
                ptr::write_unaligned(raw::as_mut_ptr(address) as *mut u32, value)
            } else {
                put_int_by_byte(address, value, self.platform.endianness)
            }
        }
    }

    /// # Safety
    ///
    /// `[address, address + 8)` must be valid for writes.
    #[inline]
    pub unsafe fn set_u64(&self, address: Address, value: u64) {
        unsafe {
            if is_aligned(address, 8) {
                ptr::write(raw::as_mut_ptr(address) as *mut u64, value)
            } else if self.platform.unaligned_access {
                ptr::write_unaligned(raw::as_mut_ptr(address) as *mut u64, value)
            } else {
                put_long_by_byte(address, value, self.platform.endianness)
            }
        }
    }

    /// # Safety
    ///
    /// See [`NativeEndianMemory::get_u16`].
    #[inline]
    pub unsafe fn get_short(&self, address: Address) -> i16 {
        unsafe { self.get_u16(address) as i16 }
    }

    /// # Safety
    ///
    /// See [`NativeEndianMemory::get_u16`].
    #[inline]
    pub unsafe fn get_unsigned_short(&self, address: Address) -> u16 {
        unsafe { self.get_u16(address) }
    }

    /// # Safety
    ///
    /// See [`NativeEndianMemory::get_u32`].
    #[inline]
    pub unsafe fn get_int(&self, address: Address) -> i32 {
        unsafe { self.get_u32(address) as i32 }
    }

    /// # Safety
    ///
    /// See [`NativeEndianMemory::get_u64`].
    #[inline]
    pub unsafe fn get_long(&self, address: Address) -> i64 {
        unsafe { self.get_u64(address) as i64 }
    }

    /// # Safety
    ///
    /// See [`NativeEndianMemory::set_u16`].
    #[inline]
    pub unsafe fn set_short(&self, address: Address, value: i16) {
        unsafe { self.set_u16(address, value as u16) }
    }

    /// # Safety
    ///
    /// See [`NativeEndianMemory::set_u32`].
    #[inline]
    pub unsafe fn set_int(&self, address: Address, value: i32) {
        unsafe { self.set_u32(address, value as u32) }
    }

    /// # Safety
    ///
    /// See [`NativeEndianMemory::set_u64`].
    #[inline]
    pub unsafe fn set_long(&self, address: Address, value: i64) {
        unsafe { self.set_u64(address, value as u64) }
    }
}

impl Default for NativeEndianMemory {
    fn default() -> Self {
        NativeEndianMemory::native()
    }
}

/// Assembles a 16-bit value from the two bytes at `address`.
///
/// # Safety
///
/// `[address, address + 2)` must be valid for reads.
#[inline]
pub unsafe fn get_short_by_byte(address: Address, order: ByteOrder) -> u16 {
    let b0 = unsafe { raw::get_byte(address) } as u16;
    let b1 = unsafe { raw::get_byte(address + 1) } as u16;
    match order {
        ByteOrder::BigEndian => (b0 << 8) | b1,
        ByteOrder::LittleEndian => (b1 << 8) | b0,
    }
}

/// Assembles a 32-bit value from the four bytes at `address`.
///
/// # Safety
///
/// `[address, address + 4)` must be valid for reads.
#[inline]
pub unsafe fn get_int_by_byte(address: Address, order: ByteOrder) -> u32 {
    let b = |i: u64| unsafe { raw::get_byte(address + i) } as u32;
    match order {
        ByteOrder::BigEndian => (b(0) << 24) | (b(1) << 16) | (b(2) << 8) | b(3),
        ByteOrder::LittleEndian => (b(3) << 24) | (b(2) << 16) | (b(1) << 8) | b(0),
    }
}

/// Assembles a 64-bit value from the eight bytes at `address`.
///
/// # Safety
///
/// `[address, address + 8)` must be valid for reads.
#[inline]
pub unsafe fn get_long_by_byte(address: Address, order: ByteOrder) -> u64 {
    let b = |i: u64| unsafe { raw::get_byte(address + i) } as u64;
    match order {
        ByteOrder::BigEndian => {
            (b(0) << 56)
                | (b(1) << 48)
                | (b(2) << 40)
                | (b(3) << 32)
                | (b(4) << 24)
                | (b(5) << 16)
                | (b(6) << 8)
                | b(7)
        }
        ByteOrder::LittleEndian => {
            (b(7) << 56)
                | (b(6) << 48)
                | (b(5) << 40)
                | (b(4) << 32)
                | (b(3) << 24)
                | (b(2) << 16)
                | (b(1) << 8)
                | b(0)
        }
    }
}

/// Splits a 16-bit value into the two bytes at `address`.
///
/// # Safety
///
/// `[address, address + 2)` must be valid for writes.
#[inline]
pub unsafe fn put_short_by_byte(address: Address, value: u16, order: ByteOrder) {
    let (b0, b1) = match order {
        ByteOrder::BigEndian => ((value >> 8) as u8, value as u8),
        ByteOrder::LittleEndian => (value as u8, (value >> 8) as u8),
    };
    unsafe {
        raw::set_byte(address, b0);
        raw::set_byte(address + 1, b1);
    }
}

/// Splits a 32-bit value into the four bytes at `address`.
///
/// # Safety
///
/// `[address, address + 4)` must be valid for writes.
#[inline]
pub unsafe fn put_int_by_byte(address: Address, value: u32, order: ByteOrder) {
    for i in 0..4u64 {
        let shift = match order {
            ByteOrder::BigEndian => 24 - 8 * i,
            ByteOrder::LittleEndian => 8 * i,
        };
        unsafe { raw::set_byte(address + i, (value >> shift) as u8) };
    }
}

/// Splits a 64-bit value into the eight bytes at `address`.
///
/// # Safety
///
/// `[address, address + 8)` must be valid for writes.
#[inline]
pub unsafe fn put_long_by_byte(address: Address, value: u64, order: ByteOrder) {
    for i in 0..8u64 {
        let shift = match order {
            ByteOrder::BigEndian => 56 - 8 * i,
            ByteOrder::LittleEndian => 8 * i,
        };
        unsafe { raw::set_byte(address + i, (value >> shift) as u8) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DirectBuffer;

    const ORDERS: [ByteOrder; 2] = [ByteOrder::BigEndian, ByteOrder::LittleEndian];

    fn with_block(len: usize, f: impl FnOnce(Address)) {
        let buf = DirectBuffer::allocate_direct(len);
        f(buf.address());
    }

    #[test]
    fn test_documented_byte_assembly() {
        with_block(16, |address| unsafe {
            for (i, b) in [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
                .into_iter()
                .enumerate()
            {
                raw::set_byte(address + i as u64, b);
            }
            assert_eq!(get_short_by_byte(address, ByteOrder::BigEndian), 0x0102);
            assert_eq!(get_short_by_byte(address, ByteOrder::LittleEndian), 0x0201);
            assert_eq!(get_int_by_byte(address, ByteOrder::BigEndian), 0x01020304);
            assert_eq!(get_int_by_byte(address, ByteOrder::LittleEndian), 0x04030201);
            assert_eq!(
                get_long_by_byte(address, ByteOrder::BigEndian),
                0x0102030405060708
            );
            assert_eq!(
                get_long_by_byte(address, ByteOrder::LittleEndian),
                0x0807060504030201
            );
            // unaligned start
            assert_eq!(get_int_by_byte(address + 1, ByteOrder::BigEndian), 0x02030405);
            assert_eq!(get_int_by_byte(address + 1, ByteOrder::LittleEndian), 0x05040302);
        });
    }

    #[test]
    fn test_put_by_byte_layout() {
        with_block(16, |address| unsafe {
            put_long_by_byte(address, 0x0102030405060708, ByteOrder::BigEndian);
            let bytes = (0..8).map(|i| raw::get_byte(address + i)).collect::<Vec<_>>();
            assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6, 7, 8]);

            put_int_by_byte(address + 8, 0x0A0B0C0D, ByteOrder::LittleEndian);
            let bytes = (8..12).map(|i| raw::get_byte(address + i)).collect::<Vec<_>>();
            assert_eq!(bytes, vec![0x0D, 0x0C, 0x0B, 0x0A]);

            put_short_by_byte(address + 13, 0xBEEF, ByteOrder::BigEndian);
            assert_eq!(raw::get_byte(address + 13), 0xBE);
            assert_eq!(raw::get_byte(address + 14), 0xEF);
        });
    }

    #[test]
    fn test_by_byte_round_trip_random() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        with_block(64, |base| unsafe {
            for _ in 0..1000 {
                let order = ORDERS[rng.usize(0..2)];
                let address = base + rng.u64(0..56);
                let value = rng.u64(..);
                put_long_by_byte(address, value, order);
                assert_eq!(get_long_by_byte(address, order), value);

                let value = rng.u32(..);
                put_int_by_byte(address, value, order);
                assert_eq!(get_int_by_byte(address, order), value);

                let value = rng.u16(..);
                put_short_by_byte(address, value, order);
                assert_eq!(get_short_by_byte(address, order), value);
            }
        });
    }

    #[test]
    fn test_by_byte_matches_native_layout() {
        let order = ByteOrder::native();
        with_block(16, |address| unsafe {
            let value = 0x1122334455667788u64;
            put_long_by_byte(address + 3, value, order);
            let bytes = (0..8).map(|i| raw::get_byte(address + 3 + i)).collect::<Vec<_>>();
            assert_eq!(bytes, value.to_ne_bytes());
        });
    }

    #[test]
    fn test_fast_path_selection() {
        let strict = NativeEndianMemory::new(Platform::with_unaligned_access(false));
        assert!(strict.is_fast_path(0x1000, 8));
        assert!(!strict.is_fast_path(0x1004, 8));
        assert!(strict.is_fast_path(0x1004, 4));
        assert!(!strict.is_fast_path(0x1001, 2));

        let relaxed = NativeEndianMemory::new(Platform::with_unaligned_access(true));
        assert!(relaxed.is_fast_path(0x1001, 8));
    }

    #[test]
    fn test_signed_accessors() {
        let mem = NativeEndianMemory::new(Platform::with_unaligned_access(false));
        with_block(32, |address| unsafe {
            mem.set_short(address + 1, -2);
            assert_eq!(mem.get_short(address + 1), -2);
            assert_eq!(mem.get_unsigned_short(address + 1), 0xFFFE);

            mem.set_int(address + 3, i32::MIN);
            assert_eq!(mem.get_int(address + 3), i32::MIN);

            mem.set_long(address + 9, -1234567890123);
            assert_eq!(mem.get_long(address + 9), -1234567890123);
        });
    }
}
