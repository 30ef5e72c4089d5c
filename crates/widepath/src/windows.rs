//! [Windows only] The Win32 implementation of [`Filesystem`](crate::Filesystem).

#[cfg(windows)]
mod sys;

#[cfg(windows)]
pub use sys::{FindHandle, SystemFs};
