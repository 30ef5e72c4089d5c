//! Long-path aware native paths for Windows filesystems.
//!
//! This crate sits between code that thinks in portable, `/`-separated text
//! paths and the Win32 filesystem. It:
//!
//! * turns text paths into absolute UTF-16 paths in the extended namespace
//!   (`\\?\C:\...`), so they're not subject to the legacy length limit;
//! * canonicalizes native paths in place, without touching the filesystem;
//! * resolves symbolic links and junctions to their targets;
//! * lists directories with POSIX-style metadata, sorted and optionally
//!   limited to a range of paths.
//!
//! # Canonicalizing
//!
//! ```
//! use widepath::canonicalize;
//!
//! let mut path: Vec<u16> = r"C:\path\.\to\..\file\".encode_utf16().collect();
//! let len = canonicalize(&mut path);
//! assert_eq!(String::from_utf16(&path[..len]).unwrap(), r"C:\path\file");
//! ```
//!
//! `..` can't climb above the root. At the root it's simply dropped:
//!
//! ```
//! use widepath::canonicalize;
//!
//! let mut path: Vec<u16> = r"\\server\share\..\..\file".encode_utf16().collect();
//! let len = canonicalize(&mut path);
//! assert_eq!(String::from_utf16(&path[..len]).unwrap(), r"\\server\share\file");
//! ```
//!
//! # Text paths
//!
//! Relative paths need a current directory. This is passed in explicitly as
//! a [`CurrentDir`] so it can be pinned or faked.
//!
//! ```
//! use widepath::{FixedCurrentDir, NativePath};
//!
//! let cwd = FixedCurrentDir::new(r"\\server\share\repo");
//! let path = NativePath::from_text("src/main.rs", &cwd).unwrap();
//! assert_eq!(path.to_string(), r"\\?\UNC\server\share\repo\src\main.rs");
//! assert_eq!(path.to_text().unwrap(), "//server/share/repo/src/main.rs");
//! ```
//!
//! # Listing
//!
//! [`list`] and [`resolve_link`] go through a [`Filesystem`]. On Windows
//! that's [`SystemFs`](windows::SystemFs).
#![allow(clippy::single_char_pattern)]

// Utility functions and macros.
#[macro_use]
mod util;

pub mod canonical;
pub mod dir;
mod error;
pub mod fs;
pub mod kind;
pub mod native;
pub mod reparse;
pub mod windows;

pub use canonical::canonicalize;
pub use dir::{list, DirEntry, FileType, ListFlags, Metadata};
pub use error::{Error, Result};
pub use fs::{short_name, Filesystem, RawEntry};
pub use kind::{classify, PrefixKind};
pub use native::{CurrentDir, FixedCurrentDir, NativePath, ProcessCurrentDir, MAX_PATH_LEN};
pub use reparse::{resolve_link, ReparseData, ReparseTarget};
