//! Configuration of the memory access facade.

use std::num::NonZeroUsize;

use crate::Platform;

/// How bulk transfers are split into individual copies.
///
/// Large copies are issued as a sequence of bounded copies by default. Some
/// allocators and memory subsystems prefer bounded copy bursts for cache and TLB
/// locality; the result is identical to a single copy either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPolicy {
    /// One copy of the full length.
    SinglePass,
    /// Copies of at most the given number of bytes each.
    Chunked(NonZeroUsize),
}

impl CopyPolicy {
    /// Default upper bound of a single copy: 1 MiB.
    pub const DEFAULT_CHUNK: usize = 1024 * 1024;

    /// Chunked copies of at most `chunk_size` bytes. A zero size is treated as one.
    pub fn chunked(chunk_size: usize) -> CopyPolicy {
        CopyPolicy::Chunked(NonZeroUsize::new(chunk_size).unwrap_or(NonZeroUsize::MIN))
    }

    /// The maximum number of bytes moved by one copy.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        match self {
            CopyPolicy::SinglePass => usize::MAX,
            CopyPolicy::Chunked(size) => size.get(),
        }
    }

    /// Splits `count` bytes into consecutive `(offset, len)` pieces and invokes `f`
    /// for each of them, in ascending order.
    #[inline]
    pub fn for_each_chunk(&self, count: usize, mut f: impl FnMut(usize, usize)) {
        let chunk = self.chunk_size();
        let mut offset = 0;
        while offset < count {
            let len = std::cmp::min(count - offset, chunk);
            f(offset, len);
            offset += len;
        }
    }
}

impl Default for CopyPolicy {
    fn default() -> Self {
        CopyPolicy::chunked(Self::DEFAULT_CHUNK)
    }
}

/// Settings injected into [`MemoryUtil`](crate::MemoryUtil).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryConfig {
    pub platform: Platform,
    pub copy_policy: CopyPolicy,
}

impl MemoryConfig {
    pub fn new() -> MemoryConfig {
        MemoryConfig {
            platform: Platform::detect(),
            copy_policy: CopyPolicy::default(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> MemoryConfig {
        self.platform = platform;
        self
    }

    pub fn with_copy_policy(mut self, copy_policy: CopyPolicy) -> MemoryConfig {
        self.copy_policy = copy_policy;
        self
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig::new()
    }
}
