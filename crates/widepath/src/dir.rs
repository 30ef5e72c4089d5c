//! Directory listing with emulated POSIX metadata.

use core::cmp::Ordering;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bitflags::bitflags;
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::fs::{attributes, Filesystem, RawEntry};
use crate::kind;
use crate::native::NativePath;
use crate::reparse;
use crate::util;

bitflags! {
	/// Options for [`list`].
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct ListFlags: u32 {
		/// Compare paths ignoring ASCII case, both for the range filter and
		/// for sorting.
		const IGNORE_CASE = 1 << 0;
	}
}

/// POSIX file mode bits.
pub mod mode {
	pub const S_IFMT: u32 = 0o170000;
	pub const S_IFCHR: u32 = 0o020000;
	pub const S_IFDIR: u32 = 0o040000;
	pub const S_IFREG: u32 = 0o100000;
	pub const S_IFLNK: u32 = 0o120000;
	pub const S_IREAD: u32 = 0o400;
	pub const S_IWRITE: u32 = 0o200;
}

/// Windows counts 100ns ticks from 1601, Unix counts from 1970.
const UNIX_EPOCH_TICKS: u64 = 116_444_736_000_000_000;
const TICKS_PER_SECOND: u64 = 10_000_000;

/// The type encoded in a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
	Regular,
	Directory,
	Symlink,
	CharDevice,
	Other,
}

/// POSIX-style metadata emulated from native attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
	/// The file size, or for links the UTF-8 length of the target.
	pub size: u64,
	pub accessed: SystemTime,
	pub modified: SystemTime,
	pub created: SystemTime,
	/// Type and permission bits, see [`mode`].
	pub mode: u32,
	/// Zero based drive number of the listed directory.
	pub dev: u32,
	pub rdev: u32,
	/// Always 0. There's no cheap equivalent.
	pub ino: u64,
	pub nlink: u32,
	pub uid: u32,
	pub gid: u32,
}

impl Metadata {
	/// Emulate metadata from an enumeration record.
	pub fn from_raw(raw: &RawEntry, dev: u32) -> Self {
		let mut mode = mode::S_IREAD;
		mode |= if raw.has_attribute(attributes::DIRECTORY) {
			mode::S_IFDIR
		} else if raw.has_attribute(attributes::DEVICE) {
			mode::S_IFCHR
		} else {
			mode::S_IFREG
		};
		if !raw.has_attribute(attributes::READONLY) {
			mode |= mode::S_IWRITE;
		}
		Self {
			size: raw.size(),
			accessed: filetime_to_system_time(raw.last_access_time),
			modified: filetime_to_system_time(raw.last_write_time),
			created: filetime_to_system_time(raw.creation_time),
			mode,
			dev,
			rdev: dev,
			ino: 0,
			nlink: 1,
			uid: 0,
			gid: 0,
		}
	}

	pub fn file_type(&self) -> FileType {
		match self.mode & mode::S_IFMT {
			mode::S_IFREG => FileType::Regular,
			mode::S_IFDIR => FileType::Directory,
			mode::S_IFLNK => FileType::Symlink,
			mode::S_IFCHR => FileType::CharDevice,
			_ => FileType::Other,
		}
	}

	pub fn is_dir(&self) -> bool {
		self.file_type() == FileType::Directory
	}

	pub fn is_symlink(&self) -> bool {
		self.file_type() == FileType::Symlink
	}

	fn set_file_type(&mut self, file_type: u32) {
		self.mode = (self.mode & !mode::S_IFMT) | file_type;
	}
}

/// A listed entry: its path relative to the caller's prefix, and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
	path: String,
	metadata: Metadata,
}

impl DirEntry {
	/// The entry's path. Directories end with `/`.
	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn metadata(&self) -> &Metadata {
		&self.metadata
	}

	pub fn into_parts(self) -> (String, Metadata) {
		(self.path, self.metadata)
	}
}

/// List the directory `root`, returning entries sorted by path.
///
/// Each entry's path is `root[prefix_len..]` joined with the entry name, so
/// `prefix_len` chooses what the returned paths are relative to. `.` and
/// `..` are never returned. Directories get a trailing `/`. Anything that
/// isn't a file, directory or link is left out.
///
/// `start` and `end` bound the listing: an entry is skipped if its path
/// sorts before `start` or after `end`, comparing only as many bytes as the
/// shorter of the two. This lets a caller re-list part of a big directory.
///
/// Reparse points are resolved and reported as symlinks whose size is the
/// UTF-8 length of the target. If one can't be resolved the whole listing
/// fails rather than returning incomplete metadata.
///
/// # Errors
///
/// * [`Error::InvalidPrefix`] if `prefix_len` isn't a boundary within `root`.
/// * [`Error::NotFound`] if the directory can't be opened.
/// * Any error from enumerating or from [`reparse::resolve_link`].
pub fn list<F: Filesystem + ?Sized>(
	fs: &F,
	root: &str,
	prefix_len: usize,
	flags: ListFlags,
	start: Option<&str>,
	end: Option<&str>,
) -> Result<Vec<DirEntry>> {
	let relative = root
		.get(prefix_len..)
		.ok_or(Error::InvalidPrefix { prefix_len, len: root.len() })?;
	let dir = NativePath::from_text(root, fs)?;
	let dev = kind::drive_number(dir.as_wide()).unwrap_or(0);
	debug!("listing {dir}");

	let mut base = String::with_capacity(relative.len() + 1);
	base.push_str(relative);
	if !base.is_empty() && !base.ends_with(['/', '\\']) {
		base.push('/');
	}

	let mut entries = Vec::new();
	for raw in fs.read_dir(&dir)? {
		let raw = raw?;
		if raw.is_dot_or_dot_dot() {
			continue;
		}
		let name = String::from_utf16(&raw.name).map_err(|_| Error::Encoding)?;
		let mut path = String::with_capacity(base.len() + name.len() + 1);
		path.push_str(&base);
		path.push_str(&name);

		if !in_range(&path, start, end, flags) {
			trace!("{path} is out of range");
			continue;
		}

		let mut metadata = Metadata::from_raw(&raw, dev);
		if raw.has_attribute(attributes::REPARSE_POINT) {
			let target = reparse::resolve_link(fs, &dir.join(&raw.name)?).map_err(|e| {
				debug!("failed to resolve {path}: {e}");
				e
			})?;
			metadata.set_file_type(mode::S_IFLNK);
			let len = util::utf8_len(target.as_wide()).ok_or(Error::Encoding)?;
			metadata.size = len as u64;
		}

		match metadata.file_type() {
			FileType::Directory => path.push('/'),
			FileType::Regular | FileType::Symlink => {}
			_ => {
				trace!("{path} is not a file, directory or link");
				continue;
			}
		}
		entries.push(DirEntry { path, metadata });
	}

	// Sorting is stable, so equal paths keep enumeration order.
	entries.sort_by(|a, b| compare(&a.path, &b.path, flags));
	debug!("listed {} entries from {dir}", entries.len());
	Ok(entries)
}

/// Is `path` within the `start..=end` range, comparing prefixes.
fn in_range(path: &str, start: Option<&str>, end: Option<&str>, flags: ListFlags) -> bool {
	if let Some(start) = start {
		let len = start.len().min(path.len());
		if len > 0 && compare_prefix(path, start, len, flags) == Ordering::Less {
			return false;
		}
	}
	if let Some(end) = end {
		let len = end.len().min(path.len());
		if len > 0 && compare_prefix(path, end, len, flags) == Ordering::Greater {
			return false;
		}
	}
	true
}

/// Compare the first `len` bytes of two paths.
fn compare_prefix(a: &str, b: &str, len: usize, flags: ListFlags) -> Ordering {
	compare_bytes(&a.as_bytes()[..len], &b.as_bytes()[..len], flags)
}

fn compare(a: &str, b: &str, flags: ListFlags) -> Ordering {
	compare_bytes(a.as_bytes(), b.as_bytes(), flags)
}

fn compare_bytes(a: &[u8], b: &[u8], flags: ListFlags) -> Ordering {
	if flags.contains(ListFlags::IGNORE_CASE) {
		a.iter().map(u8::to_ascii_lowercase).cmp(b.iter().map(u8::to_ascii_lowercase))
	} else {
		a.cmp(b)
	}
}

/// Convert a FILETIME tick count to a `SystemTime`.
pub fn filetime_to_system_time(ticks: u64) -> SystemTime {
	let since_epoch = |ticks: u64| {
		Duration::new(ticks / TICKS_PER_SECOND, (ticks % TICKS_PER_SECOND) as u32 * 100)
	};
	if ticks >= UNIX_EPOCH_TICKS {
		UNIX_EPOCH + since_epoch(ticks - UNIX_EPOCH_TICKS)
	} else {
		UNIX_EPOCH - since_epoch(UNIX_EPOCH_TICKS - ticks)
	}
}
