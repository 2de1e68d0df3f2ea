//! Raw native (off-heap) memory access for storage engine buffers.
//!
//! The crate has two layers:
//!
//! - **Raw memory access** ([`raw`], [`view`]): allocation and release of native blocks,
//!   single-byte access, fills, chunked bulk copies between native memory, byte slices
//!   and buffer views, and zero-copy views over arbitrary native ranges.
//! - **Aligned multi-byte access** ([`native_endian`]): 16/32/64-bit reads and writes
//!   in the platform's native byte order at arbitrary (possibly unaligned) addresses.
//!
//! [`MemoryUtil`] ties both layers to one injected [`MemoryConfig`].
//!
//! Nothing here tracks ownership of raw addresses. Callers are responsible for
//! matching every allocation with exactly one release and for not touching memory
//! after it has been released.

pub mod align;
pub mod byte_order;
pub mod config;
pub mod memory_util;
pub mod native_endian;
pub mod platform;
pub mod raw;
pub mod view;

pub use byte_order::ByteOrder;
pub use config::{CopyPolicy, MemoryConfig};
pub use memory_util::MemoryUtil;
pub use native_endian::NativeEndianMemory;
pub use platform::Platform;
pub use view::{
    BufferView, ByteBuffer, NativeView, ReadView, WriteView,
    direct::{Attachment, DirectBuffer, DirectSource, ReadOnlyDirectBuffer},
    heap::HeapBuffer,
};

/// A byte offset in the process's native address space.
pub type Address = u64;

#[cfg(test)]
mod tests;
