//! The path prefix grammar.
//!
//! Every absolute path syntax understood by this crate is recognised here
//! and nowhere else. Classification works on both text (`u8`) and native
//! (`u16`) paths so the two can never disagree.

use crate::util::{self, Unit};

/// The length of the extended-namespace marker (`\\?\`).
pub const EXTENDED_MARKER_LEN: usize = r"\\?\".len();
/// The length of the UNC marker that may follow the extended marker (`UNC\`).
pub const UNC_MARKER_LEN: usize = r"UNC\".len();
/// The length of a drive-absolute prefix (`C:\`).
pub const DRIVE_LEN: usize = r"C:\".len();

/// The kind of prefix a path starts with.
///
/// This does not do any validation so classifying a path never fails.
/// Anything that isn't recognised is `Relative`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefixKind {
	/// A traditional drive path such as `C:\` or `r:/`.
	DriveAbsolute,
	/// A path starting with `\\?\` (or `//?/`), which skips the length limit
	/// and most parsing. It may wrap a drive path or a `UNC\server\share`.
	ExtendedNamespace,
	/// A network share such as `\\server\share\`.
	UncShare,
	/// Anything else.
	Relative,
}

impl PrefixKind {
	/// Is the path absolute, i.e. it doesn't need joining to a base path.
	pub const fn is_absolute(self) -> bool {
		!matches!(self, Self::Relative)
	}
}

/// Classify a path and find its root boundary.
///
/// The returned offset is where the path's real content begins. Everything
/// before it (namespace marker, drive, UNC server and share) is the root and
/// must never be removed by canonicalization.
///
/// Parsing stops at the first NUL.
pub fn classify<U: Unit>(path: &[U]) -> (PrefixKind, usize) {
	let path = &path[..util::nul_len(path)];
	let (head, len) = util::ascii_head(path);
	// Warning: the order of these arms matters. The extended marker must be
	// tried before the UNC pattern it would otherwise also match.
	match_pattern! {
		&head[..len];
		[b'\\', b'\\', b'?', b'\\', ..] => (PrefixKind::ExtendedNamespace, extended_len(path)),
		[b'/', b'/', b'?', b'/', ..] => (PrefixKind::ExtendedNamespace, extended_len(path)),
		[A, b':', /, ..] => (PrefixKind::DriveAbsolute, DRIVE_LEN),
		[/, /, ..] => (PrefixKind::UncShare, 2 + share_len(&path[2..])),
		_ => (PrefixKind::Relative, 0)
	}
}

/// The root length of a path already known to start with the extended marker.
fn extended_len<U: Unit>(path: &[U]) -> usize {
	let rest = &path[EXTENDED_MARKER_LEN..];
	if let Some(share) = strip_unc_marker(rest) {
		EXTENDED_MARKER_LEN + UNC_MARKER_LEN + share_len(share)
	} else if is_drive_absolute(rest) {
		EXTENDED_MARKER_LEN + DRIVE_LEN
	} else {
		EXTENDED_MARKER_LEN
	}
}

/// Skip the server and share name.
///
/// This assumes the leading `\\` (or `UNC\`) has already been skipped. The
/// returned length includes the separator after the share, if there is one.
fn share_len<U: Unit>(path: &[U]) -> usize {
	let mut iter = path.iter();
	match iter.position(|u| u.is_separator()) {
		Some(server) => iter
			.position(|u| u.is_separator())
			.map(|share| server + share + 2)
			.unwrap_or(path.len()),
		None => path.len(),
	}
}

/// Does the path start with a drive letter, colon and separator.
pub fn is_drive_absolute<U: Unit>(path: &[U]) -> bool {
	let (head, len) = util::ascii_head(path);
	matches!(&head[..len], pattern!([A, b':', /, ..]))
}

/// Strip the extended-namespace marker from a path, if it has one.
pub fn strip_extended<U: Unit>(path: &[U]) -> Option<&[U]> {
	let (head, len) = util::ascii_head(path);
	match_pattern! {
		&head[..len];
		[b'\\', b'\\', b'?', b'\\', ..] => Some(&path[EXTENDED_MARKER_LEN..]),
		[b'/', b'/', b'?', b'/', ..] => Some(&path[EXTENDED_MARKER_LEN..]),
		_ => None
	}
}

/// Strip a `UNC\` marker (as found after the extended marker), if present.
pub fn strip_unc_marker<U: Unit>(path: &[U]) -> Option<&[U]> {
	let (head, len) = util::ascii_head(path);
	match_pattern! {
		&head[..len];
		[b'U', b'N', b'C', /, ..] => Some(&path[UNC_MARKER_LEN..]),
		_ => None
	}
}

/// The zero based drive number (`A:` is 0) of a drive-absolute path.
pub fn drive_number<U: Unit>(path: &[U]) -> Option<u32> {
	let path = strip_extended(path).unwrap_or(path);
	if is_drive_absolute(path) {
		let letter = path[0].to_ascii()?.to_ascii_uppercase();
		Some(u32::from(letter - b'A'))
	} else {
		None
	}
}
