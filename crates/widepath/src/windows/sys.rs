//! [Windows only] Use the Windows API to enumerate directories and read
//! reparse points.

use std::mem;
use std::ptr;

use log::trace;
use windows_sys::Win32::Foundation::{
	CloseHandle, GetLastError, ERROR_ACCESS_DENIED, ERROR_NO_MORE_FILES, FILETIME, GENERIC_READ,
	HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
	CreateFileW, FindClose, FindExInfoBasic, FindExSearchNameMatch, FindFirstFileExW,
	FindNextFileW, GetShortPathNameW, FILE_FLAG_BACKUP_SEMANTICS, FILE_FLAG_OPEN_REPARSE_POINT,
	FILE_SHARE_DELETE, FILE_SHARE_READ, OPEN_EXISTING, WIN32_FIND_DATAW,
};
use windows_sys::Win32::System::Environment::GetCurrentDirectoryW;
use windows_sys::Win32::System::Ioctl::FSCTL_GET_REPARSE_POINT;
use windows_sys::Win32::System::IO::DeviceIoControl;

use crate::error::{Error, Result};
use crate::fs::{Filesystem, RawEntry};
use crate::native::{CurrentDir, NativePath, MAX_PATH_LEN};
use crate::reparse::MAXIMUM_REPARSE_DATA_BUFFER_SIZE;
use crate::util;

/// [Windows only] The real filesystem, through the Win32 API.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFs;

impl CurrentDir for SystemFs {
	fn current_dir(&self) -> Result<Vec<u16>> {
		let mut buffer = vec![0u16; MAX_PATH_LEN];
		let len = unsafe { GetCurrentDirectoryW(buffer.len() as u32, buffer.as_mut_ptr()) } as usize;
		if len == 0 {
			return Err(open_error(unsafe { GetLastError() }));
		}
		// On success the length excludes the NUL, otherwise it's the size needed.
		if len >= buffer.len() {
			return Err(Error::NameTooLong);
		}
		buffer.truncate(len);
		Ok(buffer)
	}
}

impl Filesystem for SystemFs {
	type ReadDir = FindHandle;

	fn read_dir(&self, dir: &NativePath) -> Result<FindHandle> {
		let pattern = dir.join(&[u16::from(b'*')])?.to_wide_nul();
		// SAFETY: all zeroes is a valid WIN32_FIND_DATAW.
		let mut data: WIN32_FIND_DATAW = unsafe { mem::zeroed() };
		let handle = unsafe {
			FindFirstFileExW(
				pattern.as_ptr(),
				FindExInfoBasic,
				(&mut data as *mut WIN32_FIND_DATAW).cast(),
				FindExSearchNameMatch,
				ptr::null(),
				0,
			)
		};
		if handle == INVALID_HANDLE_VALUE {
			return Err(open_error(unsafe { GetLastError() }));
		}
		trace!("opened enumeration handle for {dir}");
		Ok(FindHandle { handle, pending: Some(raw_entry(&data)), done: false })
	}

	fn read_reparse_data(&self, path: &NativePath) -> Result<Vec<u8>> {
		let path = path.to_wide_nul();
		let handle = unsafe {
			CreateFileW(
				path.as_ptr(),
				GENERIC_READ,
				FILE_SHARE_READ | FILE_SHARE_DELETE,
				ptr::null(),
				OPEN_EXISTING,
				FILE_FLAG_OPEN_REPARSE_POINT | FILE_FLAG_BACKUP_SEMANTICS,
				ptr::null_mut(),
			)
		};
		if handle == INVALID_HANDLE_VALUE {
			return Err(open_error(unsafe { GetLastError() }));
		}
		let handle = OwnedHandle(handle);

		let mut buffer = vec![0u8; MAXIMUM_REPARSE_DATA_BUFFER_SIZE];
		let mut returned = 0u32;
		let ok = unsafe {
			DeviceIoControl(
				handle.0,
				FSCTL_GET_REPARSE_POINT,
				ptr::null(),
				0,
				buffer.as_mut_ptr().cast(),
				buffer.len() as u32,
				&mut returned,
				ptr::null_mut(),
			)
		};
		if ok == 0 {
			return Err(Error::invalid_link("could not read reparse data"));
		}
		buffer.truncate(returned as usize);
		Ok(buffer)
	}

	fn short_path(&self, path: &NativePath) -> Result<NativePath> {
		let path = path.to_wide_nul();
		let mut buffer = vec![0u16; MAX_PATH_LEN];
		let len = unsafe {
			GetShortPathNameW(path.as_ptr(), buffer.as_mut_ptr(), buffer.len() as u32)
		} as usize;
		if len == 0 {
			return Err(open_error(unsafe { GetLastError() }));
		}
		if len >= buffer.len() {
			return Err(Error::NameTooLong);
		}
		NativePath::from_wide(&buffer[..len])
	}
}

/// [Windows only] An open `FindFirstFileExW` handle.
///
/// Yields the first entry (returned by the open call) and then each entry
/// from `FindNextFileW`. The handle is closed on drop.
pub struct FindHandle {
	handle: HANDLE,
	pending: Option<RawEntry>,
	done: bool,
}

impl Iterator for FindHandle {
	type Item = Result<RawEntry>;

	fn next(&mut self) -> Option<Self::Item> {
		if let Some(entry) = self.pending.take() {
			return Some(Ok(entry));
		}
		if self.done {
			return None;
		}
		// SAFETY: all zeroes is a valid WIN32_FIND_DATAW.
		let mut data: WIN32_FIND_DATAW = unsafe { mem::zeroed() };
		if unsafe { FindNextFileW(self.handle, &mut data) } != 0 {
			return Some(Ok(raw_entry(&data)));
		}
		self.done = true;
		match unsafe { GetLastError() } {
			ERROR_NO_MORE_FILES => None,
			code => Some(Err(Error::from_win32(code))),
		}
	}
}

impl Drop for FindHandle {
	fn drop(&mut self) {
		unsafe {
			FindClose(self.handle);
		}
	}
}

/// A file handle that's closed on drop.
struct OwnedHandle(HANDLE);

impl Drop for OwnedHandle {
	fn drop(&mut self) {
		unsafe {
			CloseHandle(self.0);
		}
	}
}

/// Failing to open something is reported as not found, unless it was
/// access that was denied.
fn open_error(code: u32) -> Error {
	if code == ERROR_ACCESS_DENIED {
		Error::PermissionDenied
	} else {
		Error::NotFound
	}
}

fn raw_entry(data: &WIN32_FIND_DATAW) -> RawEntry {
	RawEntry {
		name: data.cFileName[..util::nul_len(&data.cFileName[..])].to_vec(),
		attributes: data.dwFileAttributes,
		size_high: data.nFileSizeHigh,
		size_low: data.nFileSizeLow,
		creation_time: filetime_ticks(&data.ftCreationTime),
		last_access_time: filetime_ticks(&data.ftLastAccessTime),
		last_write_time: filetime_ticks(&data.ftLastWriteTime),
	}
}

fn filetime_ticks(time: &FILETIME) -> u64 {
	(u64::from(time.dwHighDateTime) << 32) | u64::from(time.dwLowDateTime)
}
