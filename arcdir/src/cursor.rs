use std::{fs::File, io::{BufReader, Read, Seek, SeekFrom}, path::Path, sync::Arc};
use bytes::Bytes;
use crate::{error::CursorError, resource::SourceFile};

enum ByteSource {
	Memory {
		buf: Bytes,
		name: Option<Arc<Path>>
	},
	Stream {
		path: Arc<Path>,
		file: BufReader<File>,
		file_pos: u64
	}
}

/// Seekable reader over an archive, either on disk or in memory.
///
/// Every read is checked against the length first, so a hostile directory
/// can make a read fail but never makes it allocate or read past the end.
/// The underlying file is closed when the cursor is dropped.
pub struct Cursor {
	source: ByteSource,
	len: u64,
	pos: u64,
	mask: Option<u8>
}

macro_rules! impl_cursor_readers {
	($($t:ident),*) => {paste::paste! {$(
		pub fn [<read_ $t>](&mut self) -> Result<$t, CursorError> {
			Ok(<$t>::from_le_bytes(self.read_array::<{size_of::<$t>()}>()?))
		}
		pub fn [<read_ $t _be>](&mut self) -> Result<$t, CursorError> {
			Ok(<$t>::from_be_bytes(self.read_array::<{size_of::<$t>()}>()?))
		}
	)*}}
}

impl Cursor {
	pub fn open(path: impl AsRef<Path>) -> Result<Self, CursorError> {
		let path: Arc<Path> = Arc::from(path.as_ref());
		let file = File::open(&path)?;
		let len = file.metadata()?.len();
		Ok(Self {
			source: ByteSource::Stream {path, file: BufReader::new(file), file_pos: 0},
			len,
			pos: 0,
			mask: None
		})
	}

	pub fn from_bytes(buf: impl Into<Bytes>) -> Self {
		let buf = buf.into();
		Self {
			len: buf.len() as u64,
			source: ByteSource::Memory {buf, name: None},
			pos: 0,
			mask: None
		}
	}

	/// Give in-memory data a file name, so extension checks and companion
	/// lookups have something to work with.
	pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
		if let ByteSource::Memory {name, ..} = &mut self.source {
			*name = Some(Arc::from(path.as_ref()));
		}
		self
	}

	pub fn path(&self) -> Option<&Path> {
		match &self.source {
			ByteSource::Memory {name, ..} => name.as_deref(),
			ByteSource::Stream {path, ..} => Some(&**path)
		}
	}

	/// Lowercase extension of the file name, if any.
	pub fn extension(&self) -> Option<String> {
		self.path()?.extension()?.to_str().map(|x| x.to_ascii_lowercase())
	}

	/// The bytes this cursor reads, as a handle resources can keep.
	pub fn source(&self) -> SourceFile {
		match &self.source {
			ByteSource::Memory {buf, ..} => SourceFile::Memory {buf: buf.clone()},
			ByteSource::Stream {path, ..} => SourceFile::Path {path: path.clone(), len: self.len}
		}
	}

	pub fn len(&self) -> u64 {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn position(&self) -> u64 {
		self.pos
	}

	pub fn remaining(&self) -> u64 {
		self.len - self.pos
	}

	/// XOR every byte read from now on with `key`. Validation then only ever
	/// sees unmasked values.
	pub fn set_xor_mask(&mut self, key: Option<u8>) {
		self.mask = key;
	}

	/// Back to offset 0 with no mask, as the next plugin expects it.
	pub fn reset(&mut self) {
		self.pos = 0;
		self.mask = None;
	}

	pub fn seek(&mut self, target: u64) -> Result<(), CursorError> {
		if target > self.len {
			return Err(CursorError::BadSeek {target: target as i128, len: self.len});
		}
		self.pos = target;
		Ok(())
	}

	pub fn seek_relative(&mut self, delta: i64) -> Result<(), CursorError> {
		let target = self.pos as i128 + delta as i128;
		if target < 0 || target > self.len as i128 {
			return Err(CursorError::BadSeek {target, len: self.len});
		}
		self.pos = target as u64;
		Ok(())
	}

	pub fn skip(&mut self, count: u64) -> Result<(), CursorError> {
		let target = self.pos as i128 + count as i128;
		if target > self.len as i128 {
			return Err(CursorError::BadSeek {target, len: self.len});
		}
		self.pos = target as u64;
		Ok(())
	}

	/// Jump to `offset`, run `f`, then return to where the cursor was,
	/// whether `f` succeeded or not.
	pub fn with_position<T, E: From<CursorError>>(&mut self, offset: u64, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
		let saved = self.pos;
		self.seek(offset)?;
		let result = f(self);
		self.pos = saved;
		result
	}

	fn ensure(&self, wanted: u64) -> Result<(), CursorError> {
		match self.pos.checked_add(wanted) {
			Some(end) if end <= self.len => Ok(()),
			_ => Err(CursorError::OutOfBounds {offset: self.pos, wanted, len: self.len})
		}
	}

	pub fn read_exact_into(&mut self, out: &mut [u8]) -> Result<(), CursorError> {
		let wanted = out.len() as u64;
		self.ensure(wanted)?;
		match &mut self.source {
			ByteSource::Memory {buf, ..} => {
				let start = self.pos as usize;
				out.copy_from_slice(&buf[start..start + out.len()]);
			}
			ByteSource::Stream {file, file_pos, ..} => {
				if *file_pos != self.pos {
					if *file_pos == u64::MAX {
						file.seek(SeekFrom::Start(self.pos))?;
					} else {
						file.seek_relative(self.pos as i64 - *file_pos as i64)?;
					}
				}
				// unknown until the read completes
				*file_pos = u64::MAX;
				file.read_exact(out)?;
				*file_pos = self.pos + wanted;
			}
		}
		if let Some(key) = self.mask {
			out.iter_mut().for_each(|x| *x ^= key);
		}
		self.pos += wanted;
		Ok(())
	}

	fn read_array<const LEN: usize>(&mut self) -> Result<[u8; LEN], CursorError> {
		let mut buf = [0u8; LEN];
		self.read_exact_into(&mut buf)?;
		Ok(buf)
	}

	impl_cursor_readers!(u8, u16, u32, u64, i8, i16, i32, i64);

	pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, CursorError> {
		self.ensure(count as u64)?;
		let mut buf = vec![0u8; count];
		self.read_exact_into(&mut buf)?;
		Ok(buf)
	}

	/// Read exactly `count` bytes and keep what comes before the first NUL.
	pub fn read_fixed_string(&mut self, count: usize) -> Result<String, CursorError> {
		let buf = self.read_bytes(count)?;
		let end = buf.iter().position(|x| *x == 0).unwrap_or(buf.len());
		Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
	}

	/// Read up to and including a NUL terminator. Finding no terminator in
	/// `cap` bytes fails with [`CursorError::Unterminated`] and leaves the
	/// cursor where it started.
	pub fn read_null_string(&mut self, cap: usize) -> Result<String, CursorError> {
		let start = self.pos;
		let mut bytes = Vec::new();
		loop {
			if bytes.len() >= cap {
				self.pos = start;
				return Err(CursorError::Unterminated {offset: start, cap});
			}
			let c = self.read_u8()?;
			if c == 0 {
				break;
			}
			bytes.push(c);
		}
		Ok(String::from_utf8_lossy(&bytes).into_owned())
	}

	/// Read `chars` UTF-16LE code units, cut at the first NUL.
	pub fn read_utf16_string(&mut self, chars: usize) -> Result<String, CursorError> {
		let buf = self.read_bytes(chars.saturating_mul(2))?;
		let units = buf.chunks_exact(2)
			.map(|x| u16::from_le_bytes([x[0], x[1]]))
			.take_while(|x| *x != 0)
			.collect::<Vec<_>>();
		Ok(String::from_utf16_lossy(&units))
	}
}
