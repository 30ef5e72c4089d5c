//! Lexical canonicalization of native paths.

use crate::kind::{self, PrefixKind};
use crate::util::{self, Unit};

/// The native path separator.
pub const SEPARATOR: u16 = b'\\' as u16;
const ALT_SEPARATOR: u16 = b'/' as u16;
const DOT: u16 = b'.' as u16;

/// Find the offset that canonicalization may never back up past.
///
/// This is the classifier's root boundary, except that a relative path
/// starting with a single separator keeps that separator: it's rooted on
/// the current drive and `\..` can't take it anywhere else.
pub fn root_boundary(path: &[u16]) -> usize {
	match kind::classify(path) {
		(PrefixKind::Relative, _) if path.first().is_some_and(|u| u.is_separator()) => 1,
		(_, offset) => offset,
	}
}

/// Canonicalize a native path in place and return its new length.
///
/// * Separators in the root are rewritten as `\`, but the root is otherwise
///   left alone.
/// * `.` segments are removed.
/// * `..` removes the previous segment. At the root there's nothing left to
///   remove so the `..` is silently dropped.
/// * Runs of separators are collapsed and trailing separators removed.
///
/// This is purely lexical so never fails. The path ends at the first NUL, or
/// at the end of the slice. If there's room after the new length a NUL is
/// written there.
pub fn canonicalize(path: &mut [u16]) -> usize {
	let end = util::nul_len(path);
	let root = root_boundary(&path[..end]);

	for unit in &mut path[..root] {
		if *unit == ALT_SEPARATOR {
			*unit = SEPARATOR;
		}
	}

	// `from` reads segments, `to` is where the next kept segment is written.
	let mut from = root;
	let mut to = root;
	while from < end {
		let mut next = from;
		while next < end {
			match path[next] {
				ALT_SEPARATOR => {
					path[next] = SEPARATOR;
					break;
				}
				SEPARATOR => break,
				_ => next += 1,
			}
		}
		let has_separator = next < end;
		let mut len = next - from;

		match Segment::of(&path[from..next]) {
			Segment::Current => {}
			Segment::Parent => {
				if to == root {
					// Already at the root, so eat the `..\`.
					if has_separator {
						len += 1;
					}
				} else {
					while to > root && path[to - 1] == SEPARATOR {
						to -= 1;
					}
					while to > root && path[to - 1] != SEPARATOR {
						to -= 1;
					}
				}
			}
			Segment::Normal => {
				if has_separator && len > 0 {
					len += 1;
				}
				if to != from {
					path.copy_within(from..from + len, to);
				}
				to += len;
			}
		}

		from += len;
		while from < end && path[from] == SEPARATOR {
			from += 1;
		}
	}

	while to > root && path[to - 1] == SEPARATOR {
		to -= 1;
	}
	if let Some(terminator) = path.get_mut(to) {
		*terminator = 0;
	}
	to
}

enum Segment {
	Current,
	Parent,
	Normal,
}
impl Segment {
	fn of(segment: &[u16]) -> Self {
		match segment {
			[DOT] => Self::Current,
			[DOT, DOT] => Self::Parent,
			_ => Self::Normal,
		}
	}
}
