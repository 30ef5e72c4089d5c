//! Native (UTF-16) paths and conversion to and from text.

use core::fmt;
use std::env;

use crate::canonical::{self, SEPARATOR};
use crate::error::{Error, Result};
use crate::kind::{self, PrefixKind, EXTENDED_MARKER_LEN};
use crate::util::{self, Unit};

/// The capacity of a native path in UTF-16 code units, including the NUL
/// terminator the OS expects.
pub const MAX_PATH_LEN: usize = 32767;

/// The capacity of a text path in bytes.
///
/// Each UTF-16 code unit takes at most three bytes of UTF-8.
pub const MAX_TEXT_LEN: usize = MAX_PATH_LEN * 3;

const EXTENDED_MARKER: [u16; 4] = util::wide(r"\\?\");
const UNC_MARKER: [u16; 4] = util::wide(r"UNC\");

/// Source of the current directory, used to make relative paths absolute.
///
/// Passing this in, rather than asking the process, lets callers pin the
/// base directory and lets tests fake it.
pub trait CurrentDir {
	/// The current directory as UTF-16 without a terminator, as the OS
	/// reports it (it may or may not carry the `\\?\` marker).
	fn current_dir(&self) -> Result<Vec<u16>>;
}

impl<T: CurrentDir + ?Sized> CurrentDir for &T {
	fn current_dir(&self) -> Result<Vec<u16>> {
		(**self).current_dir()
	}
}

/// The current directory of this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessCurrentDir;

impl CurrentDir for ProcessCurrentDir {
	fn current_dir(&self) -> Result<Vec<u16>> {
		let dir = env::current_dir()?;
		#[cfg(windows)]
		{
			use std::os::windows::ffi::OsStrExt;
			Ok(dir.as_os_str().encode_wide().collect())
		}
		#[cfg(not(windows))]
		{
			let dir = dir.to_str().ok_or(Error::Encoding)?;
			Ok(dir.encode_utf16().collect())
		}
	}
}

/// A fixed current directory.
///
/// # Example
///
/// ```
/// use widepath::{FixedCurrentDir, NativePath};
///
/// let cwd = FixedCurrentDir::new(r"C:\work");
/// let path = NativePath::from_text("src/../lib.rs", &cwd).unwrap();
/// assert_eq!(path.to_string(), r"\\?\C:\work\lib.rs");
/// ```
#[derive(Debug, Clone)]
pub struct FixedCurrentDir {
	dir: String,
}
impl FixedCurrentDir {
	pub fn new(dir: impl Into<String>) -> Self {
		Self { dir: dir.into() }
	}
}
impl CurrentDir for FixedCurrentDir {
	fn current_dir(&self) -> Result<Vec<u16>> {
		Ok(self.dir.encode_utf16().collect())
	}
}

/// A UTF-16 path, bounded by [`MAX_PATH_LEN`].
///
/// Paths built from text are always absolute and in extended-namespace form
/// (`\\?\C:\...` or `\\?\UNC\server\share\...`) so they bypass the legacy
/// length limit.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct NativePath {
	units: Vec<u16>,
}

impl NativePath {
	/// An empty path.
	pub const fn new() -> Self {
		Self { units: Vec::new() }
	}

	/// Copy a path from UTF-16. The path ends at the first NUL, if any.
	pub fn from_wide(units: &[u16]) -> Result<Self> {
		let mut path = Self::new();
		path.push_wide(&units[..util::nul_len(units)])?;
		Ok(path)
	}

	/// Build a native path from a text path.
	///
	/// Accepts drive paths (`C:/dir`), extended paths (`\\?\C:\dir`), UNC
	/// paths (`//server/share/dir`), paths rooted on the current drive
	/// (`/dir`) and paths relative to the current directory. The result is
	/// absolute, extended-namespace and canonical.
	///
	/// # Errors
	///
	/// * [`Error::NameTooLong`] if the result won't fit.
	/// * [`Error::NotFound`] or [`Error::PermissionDenied`] if the current
	///   directory is needed but can't be had, or for a `/dir` path when the
	///   current directory isn't on a drive.
	/// * [`Error::Encoding`] if the text contains a NUL.
	pub fn from_text<C: CurrentDir + ?Sized>(text: &str, cwd: &C) -> Result<Self> {
		let mut path = Self::new();
		path.push_wide(&EXTENDED_MARKER)?;

		match kind::classify(text.as_bytes()) {
			(PrefixKind::DriveAbsolute, _) => path.push_str(text)?,
			// The buffer already carries the marker.
			(PrefixKind::ExtendedNamespace, _) => path.push_str(&text[EXTENDED_MARKER_LEN..])?,
			(PrefixKind::UncShare, _) => {
				path.push_wide(&UNC_MARKER)?;
				path.push_str(&text[2..])?;
			}
			(PrefixKind::Relative, _) if text.as_bytes().first().is_some_and(|b| b.is_separator()) => {
				let dir = current_dir_unmarked(cwd)?;
				if !kind::is_drive_absolute(&dir[..]) {
					return Err(Error::NotFound);
				}
				// Keep only the `C:` and root the text there.
				path.push_wide(&dir[..2])?;
				path.push_str(text)?;
			}
			(PrefixKind::Relative, _) => {
				let dir = current_dir_for_join(cwd)?;
				path.push_wide(&dir)?;
				path.push_wide(&[SEPARATOR])?;
				path.push_str(text)?;
			}
		}

		path.canonicalize();
		Ok(path)
	}

	/// Build a native path from bytes that should be UTF-8.
	///
	/// This is [`NativePath::from_text`] after validating the encoding.
	pub fn from_utf8<C: CurrentDir + ?Sized>(text: &[u8], cwd: &C) -> Result<Self> {
		let text = core::str::from_utf8(text).map_err(|_| Error::Encoding)?;
		Self::from_text(text, cwd)
	}

	/// Convert to a portable text path.
	///
	/// The extended marker is removed (`\\?\UNC\server\share` becomes
	/// `//server/share`) and every `\` becomes `/`.
	pub fn to_text(&self) -> Result<String> {
		let mut units = self.as_wide();
		let mut text = String::with_capacity(units.len());
		if let Some(rest) = kind::strip_extended(units) {
			units = rest;
			if let Some(share) = kind::strip_unc_marker(units) {
				units = share;
				text.push_str("//");
			}
		}
		for c in char::decode_utf16(units.iter().copied()) {
			match c.map_err(|_| Error::Encoding)? {
				'\\' => text.push('/'),
				c => text.push(c),
			}
		}
		if text.len() >= MAX_TEXT_LEN {
			return Err(Error::NameTooLong);
		}
		Ok(text)
	}

	/// Canonicalize the path in place. Returns the new length.
	pub fn canonicalize(&mut self) -> usize {
		let len = canonical::canonicalize(&mut self.units);
		self.units.truncate(len);
		len
	}

	/// Join a file name onto this path, adding a separator if needed.
	pub fn join(&self, name: &[u16]) -> Result<Self> {
		let mut path = self.clone();
		if !path.units.last().map_or(true, |u| u.is_separator()) {
			path.push_wide(&[SEPARATOR])?;
		}
		path.push_wide(name)?;
		Ok(path)
	}

	/// Append UTF-16 code units, checking capacity first.
	pub fn push_wide(&mut self, units: &[u16]) -> Result<()> {
		if self.units.len() + units.len() >= MAX_PATH_LEN {
			return Err(Error::NameTooLong);
		}
		self.units.extend_from_slice(units);
		Ok(())
	}

	/// Append text, encoded as UTF-16.
	pub fn push_str(&mut self, text: &str) -> Result<()> {
		for unit in text.encode_utf16() {
			if unit == 0 {
				return Err(Error::Encoding);
			}
			if self.units.len() + 1 >= MAX_PATH_LEN {
				return Err(Error::NameTooLong);
			}
			self.units.push(unit);
		}
		Ok(())
	}

	/// The path's code units, without a terminator.
	pub fn as_wide(&self) -> &[u16] {
		&self.units
	}

	/// The path's code units followed by a NUL, ready for the OS.
	pub fn to_wide_nul(&self) -> Vec<u16> {
		let mut units = Vec::with_capacity(self.units.len() + 1);
		units.extend_from_slice(&self.units);
		units.push(0);
		units
	}

	/// The length in UTF-16 code units, not counting a terminator.
	pub fn len(&self) -> usize {
		self.units.len()
	}

	pub fn is_empty(&self) -> bool {
		self.units.is_empty()
	}

	/// The kind of prefix this path has.
	pub fn kind(&self) -> PrefixKind {
		kind::classify(&self.units).0
	}
}

impl fmt::Display for NativePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for c in char::decode_utf16(self.units.iter().copied()) {
			fmt::Write::write_char(f, c.unwrap_or(char::REPLACEMENT_CHARACTER))?;
		}
		Ok(())
	}
}
impl fmt::Debug for NativePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.to_string(), f)
	}
}

/// The current directory without any `\\?\` marker.
///
/// Windows may or may not echo the marker back once it's been used.
fn current_dir_unmarked<C: CurrentDir + ?Sized>(cwd: &C) -> Result<Vec<u16>> {
	let mut dir = cwd.current_dir()?;
	if kind::strip_extended(&dir[..]).is_some() {
		dir.drain(..EXTENDED_MARKER_LEN);
	}
	Ok(dir)
}

/// The current directory, shaped to follow the `\\?\` marker.
///
/// A UNC directory (`\\server\share`) becomes `UNC\server\share`.
fn current_dir_for_join<C: CurrentDir + ?Sized>(cwd: &C) -> Result<Vec<u16>> {
	let dir = current_dir_unmarked(cwd)?;
	match kind::classify(&dir[..]) {
		(PrefixKind::UncShare, _) => Ok([&UNC_MARKER[..], &dir[2..]].concat()),
		_ => Ok(dir),
	}
}
