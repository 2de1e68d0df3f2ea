//! Byte order of a buffer view.

use byteorder::ByteOrder as _;

/// The order in which the bytes of a multi-byte value are laid out in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most-significant byte at the lowest address.
    BigEndian,
    /// Least-significant byte at the lowest address.
    LittleEndian,
}

impl ByteOrder {
    /// The byte order of the target platform.
    #[inline]
    pub const fn native() -> ByteOrder {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    #[inline]
    pub fn is_native(self) -> bool {
        self == Self::native()
    }

    #[inline]
    pub fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            ByteOrder::BigEndian => byteorder::BigEndian::read_u16(buf),
            ByteOrder::LittleEndian => byteorder::LittleEndian::read_u16(buf),
        }
    }

    #[inline]
    pub fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            ByteOrder::BigEndian => byteorder::BigEndian::read_u32(buf),
            ByteOrder::LittleEndian => byteorder::LittleEndian::read_u32(buf),
        }
    }

    #[inline]
    pub fn read_u64(self, buf: &[u8]) -> u64 {
        match self {
            ByteOrder::BigEndian => byteorder::BigEndian::read_u64(buf),
            ByteOrder::LittleEndian => byteorder::LittleEndian::read_u64(buf),
        }
    }

    #[inline]
    pub fn write_u16(self, buf: &mut [u8], value: u16) {
        match self {
            ByteOrder::BigEndian => byteorder::BigEndian::write_u16(buf, value),
            ByteOrder::LittleEndian => byteorder::LittleEndian::write_u16(buf, value),
        }
    }

    #[inline]
    pub fn write_u32(self, buf: &mut [u8], value: u32) {
        match self {
            ByteOrder::BigEndian => byteorder::BigEndian::write_u32(buf, value),
            ByteOrder::LittleEndian => byteorder::LittleEndian::write_u32(buf, value),
        }
    }

    #[inline]
    pub fn write_u64(self, buf: &mut [u8], value: u64) {
        match self {
            ByteOrder::BigEndian => byteorder::BigEndian::write_u64(buf, value),
            ByteOrder::LittleEndian => byteorder::LittleEndian::write_u64(buf, value),
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::native()
    }
}
