//! Buffer views: lightweight descriptors that alias a region of native memory or a
//! byte array.
//!
//! A view never owns the memory it aliases unless it was created by
//! [`DirectBuffer::allocate_direct`]. Multiple views may alias the same memory.
//!
//! The view kinds are separate types:
//!
//! - [`DirectBuffer`]: native-backed, readable and writable; the only kind whose
//!   address can be extracted with [`MemoryUtil::get_address`](crate::MemoryUtil::get_address).
//! - [`ReadOnlyDirectBuffer`]: native-backed, read-only.
//! - [`HeapBuffer`]: backed by an owned byte array.
//!
//! [`ByteBuffer`] wraps any of them for operations that branch on the backing kind.

use offheap_common::{Result, error::Error, verify_arg};

use crate::{Address, ByteOrder};

pub mod direct;
pub mod heap;

pub use direct::{DirectBuffer, ReadOnlyDirectBuffer};
pub use heap::HeapBuffer;

/// Descriptor state shared by all buffer views.
///
/// Invariant maintained by the checked setters: `position <= limit <= capacity`.
/// [`MemoryUtil::set_byte_buffer_capacity`](crate::MemoryUtil::set_byte_buffer_capacity)
/// bypasses it on purpose.
pub trait BufferView {
    fn position(&self) -> usize;

    fn limit(&self) -> usize;

    fn capacity(&self) -> usize;

    fn order(&self) -> ByteOrder;

    /// Whether the view is backed by native memory.
    fn is_direct(&self) -> bool;

    fn is_read_only(&self) -> bool;

    /// Sets the position. Fails if `position > limit`.
    fn set_position(&mut self, position: usize) -> Result<()>;

    /// Sets the limit, moving the position back if it lies past the new limit.
    /// Fails if `limit > capacity`.
    fn set_limit(&mut self, limit: usize) -> Result<()>;

    /// Number of bytes between the position and the limit.
    #[inline]
    fn remaining(&self) -> usize {
        self.limit().saturating_sub(self.position())
    }

    #[inline]
    fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }
}

/// Absolute, bounds-checked reads through a view.
///
/// Indices are relative to the start of the view and checked against its limit.
/// Multi-byte values are decoded in the view's [`order`](BufferView::order).
pub trait ReadView: BufferView {
    /// Copies `dst.len()` bytes starting at `index` into `dst`, without bounds checks.
    ///
    /// Callers must have verified `index + dst.len() <= limit`.
    #[doc(hidden)]
    fn read_unchecked(&self, index: usize, dst: &mut [u8]);

    fn get(&self, index: usize) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.get_bytes(index, &mut buf)?;
        Ok(buf[0])
    }

    fn get_u16(&self, index: usize) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.get_bytes(index, &mut buf)?;
        Ok(self.order().read_u16(&buf))
    }

    fn get_u32(&self, index: usize) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.get_bytes(index, &mut buf)?;
        Ok(self.order().read_u32(&buf))
    }

    fn get_u64(&self, index: usize) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.get_bytes(index, &mut buf)?;
        Ok(self.order().read_u64(&buf))
    }

    /// Fills `dst` with the bytes starting at `index`.
    fn get_bytes(&self, index: usize, dst: &mut [u8]) -> Result<()> {
        check_index(self.limit(), index, dst.len())?;
        self.read_unchecked(index, dst);
        Ok(())
    }
}

/// Absolute, bounds-checked writes through a view.
pub trait WriteView: ReadView {
    /// Copies `src` to the bytes starting at `index`, without bounds checks.
    ///
    /// Callers must have verified `index + src.len() <= limit`.
    #[doc(hidden)]
    fn write_unchecked(&mut self, index: usize, src: &[u8]);

    fn put(&mut self, index: usize, value: u8) -> Result<()> {
        self.put_bytes(index, &[value])
    }

    fn put_u16(&mut self, index: usize, value: u16) -> Result<()> {
        let mut buf = [0u8; 2];
        self.order().write_u16(&mut buf, value);
        self.put_bytes(index, &buf)
    }

    fn put_u32(&mut self, index: usize, value: u32) -> Result<()> {
        let mut buf = [0u8; 4];
        self.order().write_u32(&mut buf, value);
        self.put_bytes(index, &buf)
    }

    fn put_u64(&mut self, index: usize, value: u64) -> Result<()> {
        let mut buf = [0u8; 8];
        self.order().write_u64(&mut buf, value);
        self.put_bytes(index, &buf)
    }

    /// Writes all of `src` starting at `index`.
    fn put_bytes(&mut self, index: usize, src: &[u8]) -> Result<()> {
        check_index(self.limit(), index, src.len())?;
        self.write_unchecked(index, src);
        Ok(())
    }
}

/// Verifies that `width` bytes at `index` lie below `limit`.
#[inline]
pub(crate) fn check_index(limit: usize, index: usize, width: usize) -> Result<()> {
    match index.checked_add(width) {
        Some(end) if end <= limit => Ok(()),
        _ => Err(Error::index_out_of_bounds(
            "index + width > limit",
            index as i64,
            width as i64,
            limit,
        )),
    }
}

/// A view backed by native memory.
pub trait NativeView: BufferView {
    /// The base address of the aliased region (the address of index 0).
    fn native_address(&self) -> Address;
}

/// Position, limit and capacity of a view, with the JDK buffer state transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Extents {
    pub position: usize,
    pub limit: usize,
    pub capacity: usize,
}

impl Extents {
    pub fn new(length: usize) -> Extents {
        Extents {
            position: 0,
            limit: length,
            capacity: length,
        }
    }

    pub fn set_position(&mut self, position: usize) -> Result<()> {
        verify_arg!(position, position <= self.limit);
        self.position = position;
        Ok(())
    }

    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        verify_arg!(limit, limit <= self.capacity);
        self.limit = limit;
        self.position = self.position.min(limit);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity;
    }

    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

/// Any buffer view, tagged by its backing kind.
#[derive(Debug)]
pub enum ByteBuffer {
    Direct(DirectBuffer),
    ReadOnly(ReadOnlyDirectBuffer),
    Heap(HeapBuffer),
}

impl ByteBuffer {
    /// Returns `true` only for a writable native-backed view.
    pub fn is_exactly_direct(&self) -> bool {
        matches!(self, ByteBuffer::Direct(_))
    }

    pub fn as_direct(&self) -> Option<&DirectBuffer> {
        match self {
            ByteBuffer::Direct(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn as_heap(&self) -> Option<&HeapBuffer> {
        match self {
            ByteBuffer::Heap(buf) => Some(buf),
            _ => None,
        }
    }

    fn view(&self) -> &dyn BufferView {
        match self {
            ByteBuffer::Direct(buf) => buf,
            ByteBuffer::ReadOnly(buf) => buf,
            ByteBuffer::Heap(buf) => buf,
        }
    }

    fn view_mut(&mut self) -> &mut dyn BufferView {
        match self {
            ByteBuffer::Direct(buf) => buf,
            ByteBuffer::ReadOnly(buf) => buf,
            ByteBuffer::Heap(buf) => buf,
        }
    }
}

impl BufferView for ByteBuffer {
    fn position(&self) -> usize {
        self.view().position()
    }

    fn limit(&self) -> usize {
        self.view().limit()
    }

    fn capacity(&self) -> usize {
        self.view().capacity()
    }

    fn order(&self) -> ByteOrder {
        self.view().order()
    }

    fn is_direct(&self) -> bool {
        self.view().is_direct()
    }

    fn is_read_only(&self) -> bool {
        self.view().is_read_only()
    }

    fn set_position(&mut self, position: usize) -> Result<()> {
        self.view_mut().set_position(position)
    }

    fn set_limit(&mut self, limit: usize) -> Result<()> {
        self.view_mut().set_limit(limit)
    }
}

impl From<DirectBuffer> for ByteBuffer {
    fn from(buf: DirectBuffer) -> Self {
        ByteBuffer::Direct(buf)
    }
}

impl From<ReadOnlyDirectBuffer> for ByteBuffer {
    fn from(buf: ReadOnlyDirectBuffer) -> Self {
        ByteBuffer::ReadOnly(buf)
    }
}

impl From<HeapBuffer> for ByteBuffer {
    fn from(buf: HeapBuffer) -> Self {
        ByteBuffer::Heap(buf)
    }
}
