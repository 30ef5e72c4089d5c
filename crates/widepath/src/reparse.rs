//! Reparse point decoding and link resolution.
//!
//! A reparse data block starts with a fixed header:
//!
//! ```text
//! u32 tag | u16 data length | u16 reserved | data...
//! ```
//!
//! For symbolic links and mount points the data holds the offsets and
//! lengths (in bytes) of two names inside a shared UTF-16 buffer:
//!
//! ```text
//! u16 substitute offset | u16 substitute length |
//! u16 print offset      | u16 print length      |
//! [u32 flags, symlinks only] | path buffer...
//! ```
//!
//! All integers are little-endian.

use log::trace;

use crate::error::{Error, Result};
use crate::fs::Filesystem;
use crate::kind;
use crate::native::NativePath;
use crate::util;

/// The reparse tag of a symbolic link.
pub const IO_REPARSE_TAG_SYMLINK: u32 = 0xA000_000C;
/// The reparse tag of a mount point (junction).
pub const IO_REPARSE_TAG_MOUNT_POINT: u32 = 0xA000_0003;
/// The largest reparse data block the OS will return.
pub const MAXIMUM_REPARSE_DATA_BUFFER_SIZE: usize = 16 * 1024;

/// Set in a symlink's flags when its target is relative to the link.
const SYMLINK_FLAG_RELATIVE: u32 = 0x1;

const HEADER_LEN: usize = 8;
const NAMES_LEN: usize = 8;
const SYMLINK_FLAGS_LEN: usize = 4;

/// Targets starting with this name a volume rather than a directory.
const VOLUME_PREFIX: &[u8] = br"\??\Volume{";
/// The NT object namespace prefix found on absolute targets.
const OBJECT_PREFIX: &[u8] = br"\??\";

/// A decoded reparse data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReparseData {
	Symlink {
		substitute_name: Vec<u16>,
		print_name: Vec<u16>,
		/// The target is relative to the directory containing the link.
		relative: bool,
	},
	MountPoint {
		substitute_name: Vec<u16>,
		print_name: Vec<u16>,
	},
}

impl ReparseData {
	/// Decode a raw reparse data block.
	///
	/// The tag is read first and decides how the rest is read. Every offset
	/// and length is checked against the block before it is used.
	pub fn parse(block: &[u8]) -> Result<Self> {
		let tag = read_u32(block, 0)?;
		let data_len = usize::from(read_u16(block, 4)?);
		let data = block
			.get(HEADER_LEN..HEADER_LEN + data_len)
			.ok_or(Error::invalid_link("reparse data is truncated"))?;

		match tag {
			IO_REPARSE_TAG_SYMLINK => {
				let names = Names::read(data)?;
				let flags = read_u32(data, NAMES_LEN)?;
				let buffer = &data[NAMES_LEN + SYMLINK_FLAGS_LEN..];
				Ok(Self::Symlink {
					substitute_name: names.substitute(buffer)?,
					print_name: names.print(buffer)?,
					relative: flags & SYMLINK_FLAG_RELATIVE != 0,
				})
			}
			IO_REPARSE_TAG_MOUNT_POINT => {
				let names = Names::read(data)?;
				let buffer = &data[NAMES_LEN..];
				Ok(Self::MountPoint {
					substitute_name: names.substitute(buffer)?,
					print_name: names.print(buffer)?,
				})
			}
			_ => Err(Error::invalid_link("unrecognized reparse tag")),
		}
	}

	/// The name the OS substitutes when following the reparse point.
	pub fn substitute_name(&self) -> &[u16] {
		match self {
			Self::Symlink { substitute_name, .. } | Self::MountPoint { substitute_name, .. } => {
				substitute_name
			}
		}
	}

	/// Extract the link target.
	///
	/// Volume mount points are reported as such. Any other target has its
	/// NT or extended prefix removed and is canonicalized. Relative symlink
	/// targets are returned as stored.
	pub fn target(&self) -> Result<ReparseTarget> {
		let name = self.substitute_name();
		if name.is_empty() {
			return Err(Error::invalid_link("reparse point has an empty target"));
		}
		if util::starts_with_ascii(name, VOLUME_PREFIX) {
			return Ok(ReparseTarget::VolumeMount(NativePath::from_wide(name)?));
		}

		let mut target = NativePath::new();
		let unprefixed = if util::starts_with_ascii(name, OBJECT_PREFIX) {
			Some(&name[OBJECT_PREFIX.len()..])
		} else {
			kind::strip_extended(name)
		};
		match unprefixed {
			Some(rest) => match kind::strip_unc_marker(rest) {
				// `UNC\server\share` is `\\server\share`.
				Some(share) => {
					target.push_wide(&util::wide::<2>(r"\\"))?;
					target.push_wide(share)?;
				}
				None => target.push_wide(rest)?,
			},
			None => target.push_wide(name)?,
		}
		if !matches!(self, Self::Symlink { relative: true, .. }) {
			target.canonicalize();
		}
		Ok(ReparseTarget::Link(target))
	}
}

/// The target of a reparse point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReparseTarget {
	/// A symbolic link or mount point target, in canonical user form.
	Link(NativePath),
	/// Another volume mounted here. This isn't a link.
	VolumeMount(NativePath),
}

/// Resolve the reparse point at `path` to its target.
///
/// # Errors
///
/// * [`Error::NotFound`] if the path can't be opened.
/// * [`Error::InvalidLink`] if the reparse data can't be read, has an
///   unrecognized tag, or is a volume mount point.
pub fn resolve_link<F: Filesystem + ?Sized>(fs: &F, path: &NativePath) -> Result<NativePath> {
	let block = fs.read_reparse_data(path)?;
	match ReparseData::parse(&block)?.target()? {
		ReparseTarget::Link(target) => {
			trace!("resolved link {path} -> {target}");
			Ok(target)
		}
		ReparseTarget::VolumeMount(_) => Err(Error::invalid_link("target is a volume mount point")),
	}
}

/// The name offsets and lengths shared by symlinks and mount points.
struct Names {
	substitute_offset: u16,
	substitute_len: u16,
	print_offset: u16,
	print_len: u16,
}
impl Names {
	fn read(data: &[u8]) -> Result<Self> {
		Ok(Self {
			substitute_offset: read_u16(data, 0)?,
			substitute_len: read_u16(data, 2)?,
			print_offset: read_u16(data, 4)?,
			print_len: read_u16(data, 6)?,
		})
	}

	fn substitute(&self, buffer: &[u8]) -> Result<Vec<u16>> {
		read_name(buffer, self.substitute_offset, self.substitute_len)
	}

	fn print(&self, buffer: &[u8]) -> Result<Vec<u16>> {
		read_name(buffer, self.print_offset, self.print_len)
	}
}

fn read_name(buffer: &[u8], offset: u16, len: u16) -> Result<Vec<u16>> {
	let (offset, len) = (usize::from(offset), usize::from(len));
	if offset % 2 != 0 || len % 2 != 0 {
		return Err(Error::invalid_link("reparse name is not UTF-16 aligned"));
	}
	let bytes = buffer
		.get(offset..offset + len)
		.ok_or(Error::invalid_link("reparse name is out of bounds"))?;
	Ok(bytes.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect())
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16> {
	match bytes.get(at..at + 2) {
		Some(&[a, b]) => Ok(u16::from_le_bytes([a, b])),
		_ => Err(Error::invalid_link("reparse data is truncated")),
	}
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32> {
	match bytes.get(at..at + 4) {
		Some(&[a, b, c, d]) => Ok(u32::from_le_bytes([a, b, c, d])),
		_ => Err(Error::invalid_link("reparse data is truncated")),
	}
}
