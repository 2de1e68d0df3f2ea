//! Platform allocator shim for the offheap-* crates.
//!
//! Exposes the process allocator (`malloc`/`free`) and the OS page size behind one
//! interface, with the implementation selected per target.

#[cfg_attr(unix, path = "sys_unix.rs")]
#[cfg_attr(windows, path = "sys_win.rs")]
#[cfg_attr(not(any(unix, windows)), path = "sys_fallback.rs")]
pub mod sys;

pub use sys::{free, get_page_size, malloc};

#[cfg(test)]
mod tests;
