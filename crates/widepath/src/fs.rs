//! The boundary between path logic and the operating system.
//!
//! [`Filesystem`] is the only place the lister and the link resolver touch
//! the OS. [`SystemFs`](crate::windows::SystemFs) implements it with the
//! Win32 API; tests implement it in memory.

use crate::error::{Error, Result};
use crate::native::{CurrentDir, NativePath};
use crate::util::Unit;

/// Native file attribute flags, as reported by directory enumeration.
pub mod attributes {
	pub const READONLY: u32 = 0x0001;
	pub const DIRECTORY: u32 = 0x0010;
	pub const DEVICE: u32 = 0x0040;
	pub const REPARSE_POINT: u32 = 0x0400;
}

/// One record from a native directory enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
	/// The entry's file name, without a terminator.
	pub name: Vec<u16>,
	/// The native [`attributes`].
	pub attributes: u32,
	pub size_high: u32,
	pub size_low: u32,
	/// Timestamps in 100ns ticks since 1601-01-01 UTC.
	pub creation_time: u64,
	pub last_access_time: u64,
	pub last_write_time: u64,
}

impl RawEntry {
	/// The file size assembled from its two halves.
	pub fn size(&self) -> u64 {
		(u64::from(self.size_high) << 32) | u64::from(self.size_low)
	}

	pub fn has_attribute(&self, attribute: u32) -> bool {
		self.attributes & attribute != 0
	}

	/// Is this the `.` or `..` pseudo-entry.
	pub fn is_dot_or_dot_dot(&self) -> bool {
		const DOT: u16 = b'.' as u16;
		matches!(self.name[..], [DOT] | [DOT, DOT])
	}
}

/// Filesystem operations needed by [`list`](crate::dir::list) and
/// [`resolve_link`](crate::reparse::resolve_link).
///
/// Implementations must release any native handle when the value holding it
/// is dropped, so that an early return never leaks one.
pub trait Filesystem: CurrentDir {
	/// An open enumeration handle. Dropping it closes the handle.
	type ReadDir: Iterator<Item = Result<RawEntry>>;

	/// Start enumerating the entries of the directory `dir`.
	///
	/// Fails with [`Error::NotFound`] (or [`Error::PermissionDenied`]) if the
	/// directory can't be opened.
	fn read_dir(&self, dir: &NativePath) -> Result<Self::ReadDir>;

	/// Read the raw reparse data block of `path` without following it.
	///
	/// Fails with [`Error::NotFound`] if the path can't be opened and
	/// [`Error::InvalidLink`] if the block can't be read.
	fn read_reparse_data(&self, path: &NativePath) -> Result<Vec<u8>>;

	/// The 8.3 short form of `path`, as the OS reports it.
	fn short_path(&self, path: &NativePath) -> Result<NativePath>;
}

/// The 8.3 short name of the final component of `path`.
///
/// Returns `None` if the short name would be longer than an 8.3 name can
/// be, which means the volume has no short name for it.
pub fn short_name<F: Filesystem + ?Sized>(fs: &F, path: &str) -> Result<Option<String>> {
	let long = NativePath::from_text(path, fs)?;
	let short = fs.short_path(&long)?;

	let mut units = short.as_wide();
	while let [rest @ .., last] = units {
		if !last.is_separator() {
			break;
		}
		units = rest;
	}
	let start = units.iter().rposition(|u| u.is_separator());
	let name = &units[start.map_or(0, |i| i + 1)..];

	if name.is_empty() || name.len() > "FILENAME.EXT".len() {
		return Ok(None);
	}
	String::from_utf16(name).map(Some).map_err(|_| Error::Encoding)
}
