//! Process-wide platform capabilities relevant to raw memory access.

use std::sync::OnceLock;

use crate::ByteOrder;

/// Environment variable that overrides the detected unaligned-access capability.
///
/// Accepts `1`/`true`/`yes` and `0`/`false`/`no` (case-insensitive). Any other value
/// is ignored. The variable is read once, the first time [`Platform::detect`] runs.
pub const UNALIGNED_ACCESS_ENV: &str = "OFFHEAP_UNALIGNED_ACCESS";

/// Immutable description of what the platform permits for multi-byte memory access.
///
/// A `Platform` is a plain value: the detected one is cached for the process, and
/// components that depend on it receive it by value, so either capability can be
/// exercised in tests without recompiling.
///
/// Only the unaligned-access capability can be chosen. The byte order is always the
/// target's, since the native-width path and the byte-by-byte fallback of
/// [`NativeEndianMemory`](crate::NativeEndianMemory) must produce the same layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub(crate) unaligned_access: bool,
    pub(crate) endianness: ByteOrder,
}

impl Platform {
    /// The native platform with the given unaligned-access capability.
    pub const fn with_unaligned_access(unaligned_access: bool) -> Platform {
        Platform {
            unaligned_access,
            endianness: ByteOrder::native(),
        }
    }

    /// Whether native-width loads and stores at unaligned addresses are permitted.
    #[inline]
    pub fn unaligned_access(&self) -> bool {
        self.unaligned_access
    }

    /// The platform's native byte order.
    #[inline]
    pub fn endianness(&self) -> ByteOrder {
        self.endianness
    }

    /// Returns the platform the process runs on.
    ///
    /// Detection happens once; the result is cached and never changes afterwards.
    pub fn detect() -> Platform {
        static PLATFORM: OnceLock<Platform> = OnceLock::new();
        *PLATFORM.get_or_init(|| {
            let env = std::env::var(UNALIGNED_ACCESS_ENV).ok();
            let platform = Platform::from_override(env.as_deref());
            log::debug!(
                "native memory platform: unaligned_access={}, endianness={:?}",
                platform.unaligned_access,
                platform.endianness
            );
            platform
        })
    }

    /// Builds the native platform description, applying an optional textual override
    /// of the unaligned-access capability.
    pub fn from_override(value: Option<&str>) -> Platform {
        let unaligned_access = match value.map(parse_flag) {
            Some(Some(flag)) => flag,
            Some(None) => {
                log::warn!(
                    "ignoring unrecognized {UNALIGNED_ACCESS_ENV} value {:?}",
                    value.unwrap_or_default()
                );
                Self::arch_allows_unaligned()
            }
            None => Self::arch_allows_unaligned(),
        };
        Platform::with_unaligned_access(unaligned_access)
    }

    /// Whether the compilation target is known to support unaligned native-width
    /// access without faulting or a significant penalty.
    pub const fn arch_allows_unaligned() -> bool {
        cfg!(any(
            target_arch = "x86",
            target_arch = "x86_64",
            target_arch = "aarch64",
            target_arch = "s390x",
            all(target_arch = "powerpc64", target_endian = "little"),
        ))
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::detect()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
