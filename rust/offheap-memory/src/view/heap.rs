//! Array-backed buffer views.

use offheap_common::{Result, result::verify_range};

use crate::{
    ByteOrder,
    view::{BufferView, Extents, ReadView, WriteView},
};

/// A view over an owned byte array.
///
/// Index 0 of the view corresponds to `array[array_offset]`; the view spans
/// `capacity` bytes of the array from there.
#[derive(Debug, Clone)]
pub struct HeapBuffer {
    array: Vec<u8>,
    array_offset: usize,
    extents: Extents,
    order: ByteOrder,
}

impl HeapBuffer {
    /// Creates a zero-filled buffer of `capacity` bytes.
    pub fn allocate(capacity: usize) -> HeapBuffer {
        HeapBuffer::wrap(vec![0u8; capacity])
    }

    /// Creates a view over the whole of `array`.
    pub fn wrap(array: Vec<u8>) -> HeapBuffer {
        let len = array.len();
        HeapBuffer {
            array,
            array_offset: 0,
            extents: Extents::new(len),
            order: ByteOrder::native(),
        }
    }

    /// Creates a view over `array[offset..offset + length]`.
    pub fn wrap_range(array: Vec<u8>, offset: usize, length: usize) -> Result<HeapBuffer> {
        verify_range(offset as i64, length as i64, array.len())?;
        Ok(HeapBuffer {
            array,
            array_offset: offset,
            extents: Extents::new(length),
            order: ByteOrder::native(),
        })
    }

    /// The complete backing array, including bytes outside of the view.
    pub fn array(&self) -> &[u8] {
        &self.array
    }

    pub fn array_mut(&mut self) -> &mut [u8] {
        &mut self.array
    }

    /// Offset of the view's index 0 within the backing array.
    pub fn array_offset(&self) -> usize {
        self.array_offset
    }

    pub fn into_array(self) -> Vec<u8> {
        self.array
    }

    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    pub fn clear(&mut self) {
        self.extents.clear();
    }

    pub fn flip(&mut self) {
        self.extents.flip();
    }

    pub fn rewind(&mut self) {
        self.extents.rewind();
    }

    /// `len` bytes of the backing array starting at view index `index`.
    #[inline]
    pub(crate) fn window(&self, index: usize, len: usize) -> &[u8] {
        let start = self.array_offset + index;
        &self.array[start..start + len]
    }

    #[inline]
    pub(crate) fn window_mut(&mut self, index: usize, len: usize) -> &mut [u8] {
        let start = self.array_offset + index;
        &mut self.array[start..start + len]
    }
}

impl BufferView for HeapBuffer {
    #[inline]
    fn position(&self) -> usize {
        self.extents.position
    }

    #[inline]
    fn limit(&self) -> usize {
        self.extents.limit
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.extents.capacity
    }

    #[inline]
    fn order(&self) -> ByteOrder {
        self.order
    }

    fn is_direct(&self) -> bool {
        false
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn set_position(&mut self, position: usize) -> Result<()> {
        self.extents.set_position(position)
    }

    fn set_limit(&mut self, limit: usize) -> Result<()> {
        self.extents.set_limit(limit)
    }
}

impl ReadView for HeapBuffer {
    fn read_unchecked(&self, index: usize, dst: &mut [u8]) {
        dst.copy_from_slice(self.window(index, dst.len()));
    }
}

impl WriteView for HeapBuffer {
    fn write_unchecked(&mut self, index: usize, src: &[u8]) {
        self.window_mut(index, src.len()).copy_from_slice(src);
    }
}

impl From<Vec<u8>> for HeapBuffer {
    fn from(array: Vec<u8>) -> Self {
        HeapBuffer::wrap(array)
    }
}
