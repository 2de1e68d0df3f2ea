//! `MemoryUtil`: the facade over raw memory, buffer views and native-endian access.

use std::sync::OnceLock;

use offheap_common::{Result, error::Error, result::verify_range};

use crate::{
    Address, ByteOrder, CopyPolicy, MemoryConfig, NativeEndianMemory, Platform, raw,
    view::{
        BufferView, ByteBuffer, DirectBuffer, NativeView,
        direct::{Attachment, DirectSource},
    },
};

/// Entry point for native memory access.
///
/// A `MemoryUtil` carries the injected [`MemoryConfig`]: the platform capabilities
/// used by the multi-byte accessors and the copy policy used by every bulk transfer.
/// It holds no other state and is freely shareable between threads.
///
/// Functions taking an [`Address`] are `unsafe`: the caller guarantees that the
/// addressed ranges are valid, and that source and destination ranges of a transfer
/// do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUtil {
    config: MemoryConfig,
    native_endian: NativeEndianMemory,
}

impl MemoryUtil {
    pub fn new(config: MemoryConfig) -> MemoryUtil {
        MemoryUtil {
            config,
            native_endian: NativeEndianMemory::new(config.platform),
        }
    }

    /// The process-wide instance using the detected platform and the default copy
    /// policy.
    pub fn native() -> &'static MemoryUtil {
        static INSTANCE: OnceLock<MemoryUtil> = OnceLock::new();
        INSTANCE.get_or_init(|| MemoryUtil::new(MemoryConfig::default()))
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn platform(&self) -> Platform {
        self.config.platform
    }

    pub fn copy_policy(&self) -> CopyPolicy {
        self.config.copy_policy
    }

    pub fn native_endian(&self) -> &NativeEndianMemory {
        &self.native_endian
    }

    pub fn page_size(&self) -> usize {
        raw::page_size()
    }

    /// Allocates `size` bytes of uninitialized native memory. See [`raw::allocate`].
    pub fn allocate(&self, size: usize) -> Address {
        raw::allocate(size)
    }

    /// # Safety
    ///
    /// See [`raw::free`].
    pub unsafe fn free(&self, address: Address) {
        unsafe { raw::free(address) }
    }

    /// # Safety
    ///
    /// `address` must be valid for reads.
    #[inline]
    pub unsafe fn get_byte(&self, address: Address) -> u8 {
        unsafe { raw::get_byte(address) }
    }

    /// # Safety
    ///
    /// `address` must be valid for writes.
    #[inline]
    pub unsafe fn set_byte(&self, address: Address, value: u8) {
        unsafe { raw::set_byte(address, value) }
    }

    /// Fills `count` bytes at `address` with `value`.
    ///
    /// # Safety
    ///
    /// `[address, address + count)` must be valid for writes.
    #[inline]
    pub unsafe fn set_bytes_value(&self, address: Address, count: usize, value: u8) {
        unsafe { raw::set_memory(address, count, value) }
    }

    /// The base address of a writable native-backed view.
    #[inline]
    pub fn get_address(&self, buffer: &DirectBuffer) -> Address {
        buffer.address()
    }

    /// Creates an unbound view with the given byte order. No native memory is
    /// involved; bind it with [`MemoryUtil::set_direct_byte_buffer`].
    pub fn get_hollow_direct_byte_buffer(&self, order: ByteOrder) -> DirectBuffer {
        DirectBuffer::hollow(order)
    }

    /// [`MemoryUtil::get_hollow_direct_byte_buffer`] in the native byte order.
    pub fn get_hollow_native_byte_buffer(&self) -> DirectBuffer {
        DirectBuffer::hollow(ByteOrder::native())
    }

    /// Creates a view over `[address, address + length)` in the native byte order.
    ///
    /// # Safety
    ///
    /// See [`DirectBuffer::from_raw`].
    pub unsafe fn get_byte_buffer(&self, address: Address, length: usize) -> DirectBuffer {
        unsafe { self.get_byte_buffer_with_order(address, length, ByteOrder::native()) }
    }

    /// Creates a view over `[address, address + length)` with the given byte order.
    ///
    /// # Safety
    ///
    /// See [`DirectBuffer::from_raw`].
    pub unsafe fn get_byte_buffer_with_order(
        &self,
        address: Address,
        length: usize,
        order: ByteOrder,
    ) -> DirectBuffer {
        let mut instance = self.get_hollow_direct_byte_buffer(order);
        unsafe { self.set_direct_byte_buffer(&mut instance, address, length) };
        instance
    }

    /// Rebinds `instance` to `[address, address + length)`: position 0, limit and
    /// capacity `length`.
    ///
    /// # Safety
    ///
    /// See [`DirectBuffer::bind`].
    #[inline]
    pub unsafe fn set_direct_byte_buffer(
        &self,
        instance: &mut DirectBuffer,
        address: Address,
        length: usize,
    ) {
        unsafe { instance.bind(address, length) }
    }

    /// Copies address, position, limit and capacity of `source` into `hollow`.
    ///
    /// The two views alias the same memory afterwards but move independently.
    /// `hollow` becomes a derived view: it carries the owner of the source's memory as
    /// its attachment, so the memory stays valid after `source` is dropped.
    pub fn duplicate_direct_byte_buffer<'a, S: DirectSource>(
        &self,
        source: &S,
        hollow: &'a mut DirectBuffer,
    ) -> &'a mut DirectBuffer {
        hollow.copy_descriptor(
            source.native_address(),
            source.descriptor(),
            source.keep_alive(),
        );
        hollow
    }

    /// Binds `hollow` to `length` bytes starting `offset` bytes past the base address
    /// of `source`. Like [`MemoryUtil::duplicate_direct_byte_buffer`], `hollow` keeps
    /// the source's memory alive.
    ///
    /// # Safety
    ///
    /// `[offset, offset + length)` must lie within the memory aliased by `source`.
    pub unsafe fn slice_direct_byte_buffer<'a, S: DirectSource>(
        &self,
        source: &S,
        hollow: &'a mut DirectBuffer,
        offset: usize,
        length: usize,
    ) -> &'a mut DirectBuffer {
        unsafe {
            self.set_direct_byte_buffer(hollow, source.native_address() + offset as u64, length)
        };
        hollow.retain(source.keep_alive());
        hollow
    }

    /// Overwrites the capacity of `instance` only.
    ///
    /// # Safety
    ///
    /// See [`DirectBuffer::set_capacity`].
    #[inline]
    pub unsafe fn set_byte_buffer_capacity(&self, instance: &mut DirectBuffer, capacity: usize) {
        unsafe { instance.set_capacity(capacity) }
    }

    pub fn is_exactly_direct(&self, buffer: &ByteBuffer) -> bool {
        buffer.is_exactly_direct()
    }

    pub fn get_attachment<'a>(&self, instance: &'a DirectBuffer) -> Option<&'a Attachment> {
        instance.attachment()
    }

    /// # Safety
    ///
    /// See [`DirectBuffer::set_attachment`].
    pub unsafe fn set_attachment(&self, instance: &mut DirectBuffer, next: Option<Attachment>) {
        unsafe { instance.set_attachment(next) };
    }

    /// Copies `count` bytes from native address `src` to native address `dst`.
    ///
    /// # Safety
    ///
    /// See [`raw::copy_memory`].
    pub unsafe fn copy_memory(&self, src: Address, dst: Address, count: usize) {
        unsafe { raw::copy_memory(src, dst, count, self.config.copy_policy) }
    }

    /// Copies `count` bytes of `src`, starting at `offset`, to native address `dst`.
    ///
    /// The range within `src` is trusted; it is only checked by debug assertions (and
    /// by slice indexing, which panics rather than reading out of bounds).
    ///
    /// # Safety
    ///
    /// `[dst, dst + count)` must be valid for writes.
    pub unsafe fn set_bytes_from_array(&self, src: &[u8], offset: usize, dst: Address, count: usize) {
        debug_assert!(offset <= src.len() && count <= src.len() - offset);
        unsafe { raw::copy_from_slice(&src[offset..offset + count], dst, self.config.copy_policy) }
    }

    /// Transfers `count` bytes of `buffer`, starting at `buffer_offset`, to memory at
    /// `address`.
    ///
    /// # Safety
    ///
    /// `[address, address + count)` must be valid for writes.
    pub unsafe fn set_bytes(&self, address: Address, buffer: &[u8], buffer_offset: usize, count: usize) {
        unsafe { self.set_bytes_from_array(buffer, buffer_offset, address, count) }
    }

    /// Transfers `count` bytes from memory at `address` into `buffer` starting at
    /// `buffer_offset`.
    ///
    /// Arguments are validated in this order:
    ///
    /// 1. `buffer` is `None`: [`ErrorKind::NullBuffer`](offheap_common::error::ErrorKind::NullBuffer)
    /// 2. `buffer_offset < 0`, `count < 0`, or `count > buffer.len() - buffer_offset`:
    ///    [`ErrorKind::IndexOutOfBounds`](offheap_common::error::ErrorKind::IndexOutOfBounds)
    ///    naming the first violated condition
    /// 3. `count == 0`: returns `Ok(())` without touching memory
    ///
    /// # Safety
    ///
    /// `[address, address + count)` must be valid for reads whenever the arguments
    /// pass validation.
    pub unsafe fn get_bytes_checked(
        &self,
        address: Address,
        buffer: Option<&mut [u8]>,
        buffer_offset: i64,
        count: i64,
    ) -> Result<()> {
        let Some(buffer) = buffer else {
            return Err(Error::null_buffer("buffer"));
        };
        verify_range(buffer_offset, count, buffer.len())?;
        if count == 0 {
            return Ok(());
        }
        let start = buffer_offset as usize;
        let target = &mut buffer[start..start + count as usize];
        unsafe { raw::copy_to_slice(address, target, self.config.copy_policy) };
        Ok(())
    }

    /// Transfers the remaining bytes of `buffer` (from its position up to its limit)
    /// to memory at `address`. The buffer's position is not changed.
    ///
    /// # Safety
    ///
    /// `[address, address + buffer.remaining())` must be valid for writes and must
    /// not overlap the buffer's memory.
    pub unsafe fn set_bytes_from_buffer(&self, address: Address, buffer: &ByteBuffer) {
        let count = buffer.remaining();
        if count == 0 {
            return;
        }
        unsafe { self.transfer_from_buffer(address, buffer, buffer.position(), count) }
    }

    /// Transfers `count` bytes of `source`, starting `buffer_offset` bytes past its
    /// position, to memory at `target`.
    ///
    /// The source range is trusted: it is not checked against the buffer's limit.
    ///
    /// # Safety
    ///
    /// - `[target, target + count)` must be valid for writes
    /// - For a native-backed `source`, the source range must be valid for reads
    pub unsafe fn set_bytes_from_buffer_at(
        &self,
        target: Address,
        source: &ByteBuffer,
        buffer_offset: usize,
        count: usize,
    ) {
        if count == 0 {
            return;
        }
        let start = source.position() + buffer_offset;
        unsafe { self.transfer_from_buffer(target, source, start, count) }
    }

    /// Transfers `length` bytes from memory at `address` into `target`, starting
    /// `buffer_offset` bytes past its position. The buffer's position is not changed.
    ///
    /// Fails with `IndexOutOfBounds` if `length < 0`, `buffer_offset < 0`, or the range
    /// does not fit in `target.remaining()`, and with `InvalidOperation` if `target`
    /// is read-only. A zero `length` is a no-op.
    ///
    /// # Safety
    ///
    /// `[address, address + length)` must be valid for reads and must not overlap the
    /// buffer's memory.
    pub unsafe fn get_bytes_into_buffer(
        &self,
        address: Address,
        target: &mut ByteBuffer,
        buffer_offset: i64,
        length: i64,
    ) -> Result<()> {
        if length < 0 {
            return Err(Error::index_out_of_bounds(
                "length < 0",
                buffer_offset,
                length,
                target.remaining(),
            ));
        }
        verify_range(buffer_offset, length, target.remaining())?;
        if length == 0 {
            return Ok(());
        }
        let start = target.position() + buffer_offset as usize;
        let length = length as usize;
        match target {
            ByteBuffer::Direct(buf) => unsafe {
                raw::copy_memory(
                    address,
                    buf.address() + start as u64,
                    length,
                    self.config.copy_policy,
                )
            },
            ByteBuffer::Heap(buf) => unsafe {
                raw::copy_to_slice(address, buf.window_mut(start, length), self.config.copy_policy)
            },
            ByteBuffer::ReadOnly(_) => {
                return Err(Error::invalid_operation("get_bytes_into_buffer(read-only)"));
            }
        }
        Ok(())
    }

    /// [`MemoryUtil::get_bytes_into_buffer`] with a zero buffer offset.
    ///
    /// # Safety
    ///
    /// See [`MemoryUtil::get_bytes_into_buffer`].
    pub unsafe fn get_bytes_into_buffer_all(
        &self,
        address: Address,
        target: &mut ByteBuffer,
        length: i64,
    ) -> Result<()> {
        unsafe { self.get_bytes_into_buffer(address, target, 0, length) }
    }

    /// Releases the memory owned by `buffer`, unless it is a derived view (duplicate
    /// or slice) or owns nothing. Returns `true` if memory was released.
    ///
    /// # Safety
    ///
    /// See [`DirectBuffer::clean`].
    pub unsafe fn clean(&self, buffer: &mut DirectBuffer) -> bool {
        unsafe { buffer.clean() }
    }

    /// # Safety
    ///
    /// `[address, address + 2)` must be valid for reads.
    #[inline]
    pub unsafe fn get_short(&self, address: Address) -> i16 {
        unsafe { self.native_endian.get_short(address) }
    }

    /// # Safety
    ///
    /// `[address, address + 2)` must be valid for reads.
    #[inline]
    pub unsafe fn get_unsigned_short(&self, address: Address) -> u16 {
        unsafe { self.native_endian.get_unsigned_short(address) }
    }

    /// # Safety
    ///
    /// `[address, address + 4)` must be valid for reads.
    #[inline]
    pub unsafe fn get_int(&self, address: Address) -> i32 {
        unsafe { self.native_endian.get_int(address) }
    }

    /// # Safety
    ///
    /// `[address, address + 8)` must be valid for reads.
    #[inline]
    pub unsafe fn get_long(&self, address: Address) -> i64 {
        unsafe { self.native_endian.get_long(address) }
    }

    /// # Safety
    ///
    /// `[address, address + 2)` must be valid for writes.
    #[inline]
    pub unsafe fn set_short(&self, address: Address, value: i16) {
        unsafe { self.native_endian.set_short(address, value) }
    }

    /// # Safety
    ///
    /// `[address, address + 4)` must be valid for writes.
    #[inline]
    pub unsafe fn set_int(&self, address: Address, value: i32) {
        unsafe { self.native_endian.set_int(address, value) }
    }

    /// # Safety
    ///
    /// `[address, address + 8)` must be valid for writes.
    #[inline]
    pub unsafe fn set_long(&self, address: Address, value: i64) {
        unsafe { self.native_endian.set_long(address, value) }
    }

    unsafe fn transfer_from_buffer(
        &self,
        target: Address,
        source: &ByteBuffer,
        start: usize,
        count: usize,
    ) {
        let policy = self.config.copy_policy;
        match source {
            ByteBuffer::Direct(buf) => unsafe {
                raw::copy_memory(buf.address() + start as u64, target, count, policy)
            },
            ByteBuffer::ReadOnly(buf) => unsafe {
                raw::copy_memory(buf.native_address() + start as u64, target, count, policy)
            },
            ByteBuffer::Heap(buf) => unsafe {
                raw::copy_from_slice(buf.window(start, count), target, policy)
            },
        }
    }
}

impl Default for MemoryUtil {
    fn default() -> Self {
        *MemoryUtil::native()
    }
}
