use proptest::prelude::*;
use widepath::{canonical::root_boundary, canonicalize, FixedCurrentDir, NativePath, PrefixKind};

fn wide(s: &str) -> Vec<u16> {
	s.encode_utf16().collect()
}

fn canon(path: &[u16]) -> Vec<u16> {
	let mut path = path.to_vec();
	let len = canonicalize(&mut path);
	path.truncate(len);
	path
}

// Roots of every kind, including none at all.
fn prefix_strategy() -> impl Strategy<Value = &'static str> {
	prop::sample::select(vec![
		"",
		r"\",
		r"C:\",
		r"z:\",
		r"\\server\share\",
		r"\\?\C:\",
		r"\\?\UNC\server\share\",
	])
}

// Paths built from segments that exercise every canonicalization rule.
fn path_strategy() -> impl Strategy<Value = String> {
	let segment = prop::sample::select(vec!["a", "bb", "c.d", "..x", ".", "..", ""]);
	let separator = prop::sample::select(vec![r"\", "/"]);
	(prefix_strategy(), prop::collection::vec((segment, separator), 0..12)).prop_map(
		|(prefix, parts)| {
			let mut path = String::from(prefix);
			for (segment, separator) in parts {
				path.push_str(segment);
				path.push_str(separator);
			}
			path
		},
	)
}

proptest! {
	#![proptest_config(ProptestConfig {
		cases: 2000,
		.. ProptestConfig::default()
	})]

	#[test]
	fn canonicalize_is_idempotent(path in path_strategy()) {
		let once = canon(&wide(&path));
		let twice = canon(&once);
		prop_assert_eq!(once, twice);
	}

	#[test]
	fn canonicalize_never_crosses_the_root(path in path_strategy()) {
		let input = wide(&path.replace('/', r"\"));
		let root = root_boundary(&input);
		let result = canon(&wide(&path));
		prop_assert!(result.len() >= root);
		prop_assert_eq!(&result[..root], &input[..root]);
	}

	#[test]
	fn canonical_paths_have_no_dot_segments(path in path_strategy()) {
		let result = canon(&wide(&path));
		let root = root_boundary(&result);
		let text = String::from_utf16(&result[root..]).unwrap();
		prop_assert!(!text.contains('/'));
		for segment in text.split('\\') {
			prop_assert!(segment != "." && segment != "..", "{:?} in {:?}", segment, text);
		}
		prop_assert!(!text.ends_with('\\'));
	}

	#[test]
	fn text_paths_become_extended(path in path_strategy()) {
		let cwd = FixedCurrentDir::new(r"D:\work");
		let native = NativePath::from_text(&path, &cwd).unwrap();
		prop_assert_eq!(native.kind(), PrefixKind::ExtendedNamespace);
		prop_assert_eq!(canon(native.as_wide()), native.as_wide().to_vec());
	}
}
