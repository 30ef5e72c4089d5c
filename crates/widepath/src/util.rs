// Quick macro for matching the ASCII head of a path.
// `/` matches either separator and `A` matches any ASCII letter.
// Everything else is passed through as a plain pattern.
macro_rules! pattern {
	(!!**!! /) => { b'\\' | b'/' };
	(!!**!! A) => { b'a'..=b'z' | b'A'..=b'Z' };
	(!!**!! $pat:pat) => { $pat };
	([$($tt:tt),+]) => {
		[$(pattern!(!!**!! $tt)),+]
	};
}

macro_rules! match_pattern {
	($match:expr; $([$($tt:tt),+] => $expr:expr),+, _ => $final:expr) => {
		match $match {
			$(
				pattern!([$($tt),+]) => $expr
			),+,
			_ => $final,
		}
	};
}

/// The number of leading units inspected by the prefix grammar.
pub const HEAD_LEN: usize = 8;

/// A single code unit of a path: a UTF-8 byte or a UTF-16 code unit.
///
/// The path grammar only ever looks at ASCII, so both widths can share it.
pub trait Unit: Copy + Eq {
	/// The unit as an ASCII byte, or `None` if it's outside the ASCII range.
	fn to_ascii(self) -> Option<u8>;

	fn is_separator(self) -> bool {
		matches!(self.to_ascii(), Some(b'\\' | b'/'))
	}

	fn is_nul(self) -> bool {
		self.to_ascii() == Some(0)
	}
}
impl Unit for u8 {
	fn to_ascii(self) -> Option<u8> {
		self.is_ascii().then_some(self)
	}
}
impl Unit for u16 {
	fn to_ascii(self) -> Option<u8> {
		u8::try_from(self).ok().filter(u8::is_ascii)
	}
}

/// The length of a path up to (but not including) the first NUL, if any.
pub fn nul_len<U: Unit>(path: &[U]) -> usize {
	path.iter().position(|u| u.is_nul()).unwrap_or(path.len())
}

/// Copy the ASCII head of a path so it can be matched as bytes.
///
/// Non-ASCII units become `0x80`, which no pattern matches.
/// Returns the buffer and the number of units that were copied.
pub fn ascii_head<U: Unit>(path: &[U]) -> ([u8; HEAD_LEN], usize) {
	let mut head = [0; HEAD_LEN];
	let len = nul_len(path).min(HEAD_LEN);
	for (dest, unit) in head.iter_mut().zip(&path[..len]) {
		*dest = unit.to_ascii().unwrap_or(0x80);
	}
	(head, len)
}

/// Widen an ASCII string at compile time.
pub const fn wide<const N: usize>(ascii: &str) -> [u16; N] {
	let bytes = ascii.as_bytes();
	assert!(bytes.len() == N);
	let mut out = [0; N];
	let mut i = 0;
	while i < N {
		out[i] = bytes[i] as u16;
		i += 1;
	}
	out
}

/// Does `path` start with `prefix`, comparing each unit as ASCII.
pub fn starts_with_ascii<U: Unit>(path: &[U], prefix: &[u8]) -> bool {
	path.len() >= prefix.len()
		&& path.iter().zip(prefix).all(|(unit, &b)| unit.to_ascii() == Some(b))
}

/// The number of bytes `units` takes up once encoded as UTF-8.
///
/// Returns `None` if `units` contains an unpaired surrogate.
pub fn utf8_len(units: &[u16]) -> Option<usize> {
	char::decode_utf16(units.iter().copied())
		.try_fold(0, |len, c| c.ok().map(|c| len + c.len_utf8()))
}
