//! An in-memory filesystem for exercising the lister and link resolver.
#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

use widepath::fs::attributes;
use widepath::{CurrentDir, Error, Filesystem, NativePath, RawEntry, Result};

pub const UNIX_EPOCH_TICKS: u64 = 116_444_736_000_000_000;

/// One step of a fake enumeration.
pub enum Step {
	Entry(RawEntry),
	Fail,
}

#[derive(Default)]
pub struct MockFs {
	cwd: String,
	dirs: HashMap<String, Vec<RawEntry>>,
	failing_dirs: HashMap<String, usize>,
	links: HashMap<String, Vec<u8>>,
	short_paths: HashMap<String, String>,
	opened: Rc<Cell<usize>>,
	closed: Rc<Cell<usize>>,
}

impl MockFs {
	pub fn new(cwd: &str) -> Self {
		Self { cwd: cwd.into(), ..Self::default() }
	}

	/// Add a directory, keyed by its native path.
	pub fn dir(mut self, path: &str, entries: Vec<RawEntry>) -> Self {
		self.dirs.insert(path.into(), entries);
		self
	}

	/// Make enumeration of `path` fail after `after` entries.
	pub fn fail_after(mut self, path: &str, after: usize) -> Self {
		self.failing_dirs.insert(path.into(), after);
		self
	}

	pub fn link(mut self, path: &str, block: Vec<u8>) -> Self {
		self.links.insert(path.into(), block);
		self
	}

	pub fn short_path(mut self, long: &str, short: &str) -> Self {
		self.short_paths.insert(long.into(), short.into());
		self
	}

	pub fn opened(&self) -> usize {
		self.opened.get()
	}

	pub fn closed(&self) -> usize {
		self.closed.get()
	}
}

impl CurrentDir for MockFs {
	fn current_dir(&self) -> Result<Vec<u16>> {
		Ok(self.cwd.encode_utf16().collect())
	}
}

impl Filesystem for MockFs {
	type ReadDir = MockReadDir;

	fn read_dir(&self, dir: &NativePath) -> Result<MockReadDir> {
		let key = dir.to_string();
		let entries = self.dirs.get(&key).ok_or(Error::NotFound)?;
		let mut steps: Vec<Step> = entries.iter().cloned().map(Step::Entry).collect();
		if let Some(&after) = self.failing_dirs.get(&key) {
			steps.insert(after.min(steps.len()), Step::Fail);
		}
		self.opened.set(self.opened.get() + 1);
		Ok(MockReadDir { steps: steps.into_iter(), closed: Rc::clone(&self.closed) })
	}

	fn read_reparse_data(&self, path: &NativePath) -> Result<Vec<u8>> {
		self.links.get(&path.to_string()).cloned().ok_or(Error::NotFound)
	}

	fn short_path(&self, path: &NativePath) -> Result<NativePath> {
		let short = self.short_paths.get(&path.to_string()).ok_or(Error::NotFound)?;
		NativePath::from_wide(&short.encode_utf16().collect::<Vec<_>>())
	}
}

pub struct MockReadDir {
	steps: std::vec::IntoIter<Step>,
	closed: Rc<Cell<usize>>,
}

impl Iterator for MockReadDir {
	type Item = Result<RawEntry>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.steps.next()? {
			Step::Entry(entry) => Some(Ok(entry)),
			Step::Fail => Some(Err(Error::Io(io::Error::new(io::ErrorKind::Other, "enumeration failed")))),
		}
	}
}

impl Drop for MockReadDir {
	fn drop(&mut self) {
		self.closed.set(self.closed.get() + 1);
	}
}

pub fn entry(name: &str, attributes: u32) -> RawEntry {
	RawEntry { name: name.encode_utf16().collect(), attributes, ..RawEntry::default() }
}

pub fn file(name: &str) -> RawEntry {
	entry(name, 0)
}

pub fn directory(name: &str) -> RawEntry {
	entry(name, attributes::DIRECTORY)
}

/// Build a reparse data block for a symlink (`flags` is `Some`) or mount point.
pub fn reparse_block(tag: u32, substitute: &str, print: &str, flags: Option<u32>) -> Vec<u8> {
	let substitute: Vec<u8> = substitute.encode_utf16().flat_map(u16::to_le_bytes).collect();
	let print: Vec<u8> = print.encode_utf16().flat_map(u16::to_le_bytes).collect();

	let mut data = Vec::new();
	data.extend(0u16.to_le_bytes());
	data.extend((substitute.len() as u16).to_le_bytes());
	data.extend((substitute.len() as u16).to_le_bytes());
	data.extend((print.len() as u16).to_le_bytes());
	if let Some(flags) = flags {
		data.extend(flags.to_le_bytes());
	}
	data.extend(&substitute);
	data.extend(&print);

	let mut block = Vec::new();
	block.extend(tag.to_le_bytes());
	block.extend((data.len() as u16).to_le_bytes());
	block.extend(0u16.to_le_bytes());
	block.extend(data);
	block
}

pub fn symlink_block(target: &str) -> Vec<u8> {
	reparse_block(widepath::reparse::IO_REPARSE_TAG_SYMLINK, target, target, Some(0))
}

pub fn mount_point_block(target: &str) -> Vec<u8> {
	reparse_block(widepath::reparse::IO_REPARSE_TAG_MOUNT_POINT, target, target, None)
}
