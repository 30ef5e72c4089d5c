//! Error types.
//!
//! Every OS failure is translated into one of these kinds as soon as it
//! happens. None of them are retried: they're local metadata operations
//! that fail the same way every time.

use std::io;

use thiserror::Error;

use crate::native::MAX_PATH_LEN;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from building, resolving or listing paths.
#[derive(Debug, Error)]
pub enum Error {
	/// The path would not fit in a native path buffer.
	#[error("path is longer than {} UTF-16 code units", MAX_PATH_LEN)]
	NameTooLong,

	/// The path, or the current directory, doesn't exist or can't be opened.
	#[error("path not found")]
	NotFound,

	/// The OS denied access to the path or the current directory.
	#[error("permission denied")]
	PermissionDenied,

	/// The reparse data couldn't be read or isn't a link we understand.
	#[error("invalid link: {reason}")]
	InvalidLink {
		/// What was wrong with the reparse point.
		reason: &'static str,
	},

	/// The path can't be converted between UTF-8 and UTF-16, or contains a NUL.
	#[error("path is not valid Unicode or contains a NUL")]
	Encoding,

	/// The prefix length given to the lister doesn't fall inside its root.
	#[error("prefix length {prefix_len} is not a boundary of a {len} byte root")]
	InvalidPrefix {
		/// The prefix length that was requested.
		prefix_len: usize,
		/// The length of the root path.
		len: usize,
	},

	/// Any other OS failure.
	#[error("I/O error: {0}")]
	Io(#[source] io::Error),
}

impl Error {
	pub(crate) const fn invalid_link(reason: &'static str) -> Self {
		Self::InvalidLink { reason }
	}

	/// Map a Windows error code.
	#[cfg(windows)]
	pub(crate) fn from_win32(code: u32) -> Self {
		io::Error::from_raw_os_error(code as i32).into()
	}
}

impl From<io::Error> for Error {
	fn from(error: io::Error) -> Self {
		match error.kind() {
			io::ErrorKind::NotFound => Self::NotFound,
			io::ErrorKind::PermissionDenied => Self::PermissionDenied,
			io::ErrorKind::InvalidData => Self::Encoding,
			_ => Self::Io(error),
		}
	}
}
