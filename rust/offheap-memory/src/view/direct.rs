//! Native-backed buffer views.

use std::{
    any::Any,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use offheap_common::{Result, result::verify_range};

use crate::{
    Address, ByteOrder, raw,
    view::{BufferView, Extents, NativeView, ReadView, WriteView},
};

/// An arbitrary object attached to a [`DirectBuffer`].
///
/// A view that carries an attachment is a *derived* view: it aliases memory owned by
/// someone else, and the attachment keeps that owner alive.
pub type Attachment = Arc<dyn Any + Send + Sync>;

/// A native allocation owned by a [`DirectBuffer`] created with
/// [`DirectBuffer::allocate_direct`].
///
/// The block is released either explicitly (through [`DirectBuffer::clean`]) or when
/// the last reference goes away, whichever comes first, and never more than once.
#[derive(Debug)]
pub struct NativeRegion {
    address: Address,
    size: usize,
    released: AtomicBool,
}

impl NativeRegion {
    fn allocate(size: usize) -> NativeRegion {
        let address = raw::allocate(size);
        unsafe { raw::set_memory(address, size, 0) };
        NativeRegion {
            address,
            size,
            released: AtomicBool::new(false),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Frees the block unless it has been freed already. Returns `true` if this call
    /// released it.
    fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        unsafe { raw::free(self.address) };
        true
    }
}

impl Drop for NativeRegion {
    fn drop(&mut self) {
        self.release();
    }
}

/// Attachment of a view derived from a view that owns nothing (e.g. a hollow view
/// bound with [`DirectBuffer::bind`]).
#[derive(Debug)]
pub struct UnownedRegion {
    pub address: Address,
    pub capacity: usize,
}

/// A view over a range of native memory.
///
/// The descriptor (address, position, limit, capacity, byte order) is plain data and
/// can be rebound to a different range at any time, see [`DirectBuffer::bind`].
pub struct DirectBuffer {
    address: Address,
    extents: Extents,
    order: ByteOrder,
    attachment: Option<Attachment>,
    cleaner: Option<Arc<NativeRegion>>,
}

impl DirectBuffer {
    /// Creates an empty view with no memory bound: address 0, position, limit and
    /// capacity all 0.
    pub fn hollow(order: ByteOrder) -> DirectBuffer {
        DirectBuffer {
            address: 0,
            extents: Extents::default(),
            order,
            attachment: None,
            cleaner: None,
        }
    }

    /// Allocates `capacity` bytes of zeroed native memory owned by the returned view.
    ///
    /// The memory is released by [`DirectBuffer::clean`], or when the view and every
    /// view derived from it have been dropped.
    pub fn allocate_direct(capacity: usize) -> DirectBuffer {
        let region = Arc::new(NativeRegion::allocate(capacity));
        DirectBuffer {
            address: region.address(),
            extents: Extents::new(capacity),
            order: ByteOrder::native(),
            attachment: None,
            cleaner: Some(region),
        }
    }

    /// Creates a view over `[address, address + length)`.
    ///
    /// # Safety
    ///
    /// The range must be valid for reads and writes for as long as the view (or any
    /// view derived from it) is used.
    pub unsafe fn from_raw(address: Address, length: usize, order: ByteOrder) -> DirectBuffer {
        let mut buf = DirectBuffer::hollow(order);
        unsafe { buf.bind(address, length) };
        buf
    }

    /// Rebinds this view to `[address, address + length)` with position 0 and both
    /// limit and capacity set to `length`.
    ///
    /// The attachment, cleaner and byte order are left untouched.
    ///
    /// # Safety
    ///
    /// The new range must be valid for reads and writes for as long as the view is
    /// used with this binding.
    pub unsafe fn bind(&mut self, address: Address, length: usize) {
        self.address = address;
        self.extents = Extents::new(length);
    }

    /// Overwrites the capacity without touching address, position or limit.
    ///
    /// # Safety
    ///
    /// `[address, address + capacity)` must be valid for the view's remaining use. A
    /// capacity below the current limit leaves the view with `limit > capacity`;
    /// reads and writes remain bounded by the limit.
    pub unsafe fn set_capacity(&mut self, capacity: usize) {
        self.extents.capacity = capacity;
    }

    /// Copies address, position, limit and capacity of a source view into this view,
    /// and makes `keep_alive` (the source's owner) its attachment.
    pub(crate) fn copy_descriptor(
        &mut self,
        address: Address,
        extents: (usize, usize, usize),
        keep_alive: Attachment,
    ) {
        let (position, limit, capacity) = extents;
        self.address = address;
        self.extents = Extents {
            position,
            limit,
            capacity,
        };
        self.attachment = Some(keep_alive);
    }

    /// Makes `keep_alive` the attachment of this view, so that the memory it aliases
    /// outlives it.
    pub(crate) fn retain(&mut self, keep_alive: Attachment) {
        self.attachment = Some(keep_alive);
    }

    /// The base address of the view.
    #[inline]
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    /// Replaces the attachment.
    ///
    /// # Safety
    ///
    /// The attachment of a derived view keeps the memory it aliases alive. If the
    /// previous attachment is dropped here, the caller guarantees that the memory
    /// stays valid for as long as the view is used.
    pub unsafe fn set_attachment(&mut self, attachment: Option<Attachment>) {
        self.attachment = attachment;
    }

    /// Returns `true` if this view was derived from another view (it has an
    /// attachment).
    pub fn is_derived(&self) -> bool {
        self.attachment.is_some()
    }

    /// Returns `true` if this view owns its native memory outright.
    pub fn owns_memory(&self) -> bool {
        self.attachment.is_none() && self.cleaner.is_some()
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

    /// Creates a view sharing this view's memory, descriptor and byte order.
    ///
    /// The duplicate is a derived view: its position and limit move independently,
    /// it keeps the owner of the memory alive, and cleaning it does not release the
    /// memory.
    pub fn duplicate(&self) -> DirectBuffer {
        DirectBuffer {
            address: self.address,
            extents: self.extents,
            order: self.order,
            attachment: Some(self.derived_attachment()),
            cleaner: None,
        }
    }

    /// Creates a derived view over `[offset, offset + length)` of this view.
    ///
    /// Fails if the range does not fit within the capacity.
    pub fn slice(&self, offset: usize, length: usize) -> Result<DirectBuffer> {
        verify_range(offset as i64, length as i64, self.extents.capacity)?;
        Ok(DirectBuffer {
            address: self.address + offset as u64,
            extents: Extents::new(length),
            order: self.order,
            attachment: Some(self.derived_attachment()),
            cleaner: None,
        })
    }

    /// Creates a read-only derived view of this view.
    pub fn as_read_only(&self) -> ReadOnlyDirectBuffer {
        ReadOnlyDirectBuffer(self.duplicate())
    }

    /// Releases the native memory owned by this view.
    ///
    /// Does nothing if the view is derived (has an attachment), if it does not own its
    /// memory, or if the memory was already released. Returns `true` if the memory was
    /// released by this call. On release the view is reset to an empty binding.
    ///
    /// # Safety
    ///
    /// No other view aliasing the released memory may be used afterwards.
    pub unsafe fn clean(&mut self) -> bool {
        if self.attachment.is_some() {
            log::debug!(
                "skipping clean of derived view at {:#x} (duplicate or slice)",
                self.address
            );
            return false;
        }
        let Some(region) = self.cleaner.take() else {
            return false;
        };
        let released = region.release();
        if released {
            log::debug!(
                "released {} bytes of native memory at {:#x}",
                region.size(),
                region.address()
            );
        }
        self.address = 0;
        self.extents = Extents::default();
        released
    }

    fn derived_attachment(&self) -> Attachment {
        if let Some(attachment) = &self.attachment {
            attachment.clone()
        } else if let Some(region) = &self.cleaner {
            region.clone() as Attachment
        } else {
            Arc::new(UnownedRegion {
                address: self.address,
                capacity: self.extents.capacity,
            }) as Attachment
        }
    }

    #[inline]
    pub(crate) fn extents(&self) -> (usize, usize, usize) {
        (
            self.extents.position,
            self.extents.limit,
            self.extents.capacity,
        )
    }
}

impl BufferView for DirectBuffer {
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
        true
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

impl NativeView for DirectBuffer {
    #[inline]
    fn native_address(&self) -> Address {
        self.address
    }
}

impl ReadView for DirectBuffer {
    fn read_unchecked(&self, index: usize, dst: &mut [u8]) {
        unsafe {
            std::ptr::copy_nonoverlapping(
                raw::as_ptr(self.address + index as u64),
                dst.as_mut_ptr(),
                dst.len(),
            )
        };
    }
}

impl WriteView for DirectBuffer {
    fn write_unchecked(&mut self, index: usize, src: &[u8]) {
        unsafe {
            std::ptr::copy_nonoverlapping(
                src.as_ptr(),
                raw::as_mut_ptr(self.address + index as u64),
                src.len(),
            )
        };
    }
}

impl Default for DirectBuffer {
    fn default() -> Self {
        DirectBuffer::hollow(ByteOrder::native())
    }
}

impl std::fmt::Debug for DirectBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectBuffer")
            .field("address", &format_args!("{:#x}", self.address))
            .field("position", &self.extents.position)
            .field("limit", &self.extents.limit)
            .field("capacity", &self.extents.capacity)
            .field("order", &self.order)
            .field("derived", &self.is_derived())
            .field("owned", &self.cleaner.is_some())
            .finish()
    }
}

/// A read-only view over a range of native memory.
///
/// Always derived from a [`DirectBuffer`]; it can be the source of duplicate and
/// slice operations but never exposes its address for writing.
#[derive(Debug)]
pub struct ReadOnlyDirectBuffer(DirectBuffer);

impl ReadOnlyDirectBuffer {
    pub fn duplicate(&self) -> ReadOnlyDirectBuffer {
        ReadOnlyDirectBuffer(self.0.duplicate())
    }

    pub fn slice(&self, offset: usize, length: usize) -> Result<ReadOnlyDirectBuffer> {
        Ok(ReadOnlyDirectBuffer(self.0.slice(offset, length)?))
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.0.attachment()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn flip(&mut self) {
        self.0.flip();
    }

    pub fn rewind(&mut self) {
        self.0.rewind();
    }

    #[inline]
    pub(crate) fn extents(&self) -> (usize, usize, usize) {
        self.0.extents()
    }
}

impl BufferView for ReadOnlyDirectBuffer {
    fn position(&self) -> usize {
        self.0.position()
    }

    fn limit(&self) -> usize {
        self.0.limit()
    }

    fn capacity(&self) -> usize {
        self.0.capacity()
    }

    fn order(&self) -> ByteOrder {
        self.0.order()
    }

    fn is_direct(&self) -> bool {
        true
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn set_position(&mut self, position: usize) -> Result<()> {
        self.0.set_position(position)
    }

    fn set_limit(&mut self, limit: usize) -> Result<()> {
        self.0.set_limit(limit)
    }
}

impl NativeView for ReadOnlyDirectBuffer {
    fn native_address(&self) -> Address {
        self.0.address()
    }
}

impl ReadView for ReadOnlyDirectBuffer {
    fn read_unchecked(&self, index: usize, dst: &mut [u8]) {
        self.0.read_unchecked(index, dst);
    }
}

/// A native-backed view that can serve as the source of a duplicate or slice.
pub trait DirectSource: NativeView {
    #[doc(hidden)]
    fn descriptor(&self) -> (usize, usize, usize);

    /// The attachment a view derived from this one must carry to keep the memory
    /// alive.
    #[doc(hidden)]
    fn keep_alive(&self) -> Attachment;
}

impl DirectSource for DirectBuffer {
    fn descriptor(&self) -> (usize, usize, usize) {
        self.extents()
    }

    fn keep_alive(&self) -> Attachment {
        self.derived_attachment()
    }
}

impl DirectSource for ReadOnlyDirectBuffer {
    fn descriptor(&self) -> (usize, usize, usize) {
        self.extents()
    }

    fn keep_alive(&self) -> Attachment {
        self.0.derived_attachment()
    }
}
