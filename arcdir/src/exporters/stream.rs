use std::{collections::VecDeque, io::{self, Read}};
use bytes::{Buf, Bytes};
use crate::{error::ExportError, resource::{Resource, SourceFile}};
use super::{apply_xor, read_raw, Block, Exporter};

enum Current {
	Idle,
	/// Undecoded bytes streamed straight from the source.
	Raw {
		reader: Box<dyn Read + Send>,
		remaining: u64,
		key: Option<u8>
	},
	Decoded(Bytes)
}

/// Byte-at-a-time view of a resource's decoded contents.
///
/// Block-composed resources are decoded one block at a time; the next block
/// is only read once the previous one has been drained.
pub struct ExportStream {
	source: Option<SourceFile>,
	inner: Exporter,
	pending: VecDeque<Block>,
	current: Current
}

impl Default for ExportStream {
	fn default() -> Self {
		Self::new()
	}
}

impl ExportStream {
	pub fn new() -> Self {
		Self {source: None, inner: Exporter::Identity, pending: VecDeque::new(), current: Current::Idle}
	}

	/// Start reading `resource`, dropping whatever was open before.
	pub fn open(&mut self, resource: &Resource) {
		self.close();
		let (inner, blocks) = match resource.exporter() {
			Exporter::Blocks(blocks) => (blocks.inner().clone(), blocks.blocks().to_vec()),
			exporter => (exporter.clone(), vec![Block {
				offset: resource.offset(),
				length: resource.length(),
				decompressed_length: resource.decompressed_length()
			}])
		};
		self.source = Some(resource.source().clone());
		self.inner = inner;
		self.pending = blocks.into();
	}

	pub fn close(&mut self) {
		self.source = None;
		self.pending.clear();
		self.current = Current::Idle;
	}

	fn current_has_data(&self) -> bool {
		match &self.current {
			Current::Idle => false,
			Current::Raw {remaining, ..} => *remaining > 0,
			Current::Decoded(buf) => buf.has_remaining()
		}
	}

	/// Whether another byte can be read, loading the next block if needed.
	pub fn available(&mut self) -> Result<bool, ExportError> {
		let Some(source) = &self.source else {
			return Ok(false);
		};
		while !self.current_has_data() {
			let Some(block) = self.pending.pop_front() else {
				self.current = Current::Idle;
				return Ok(false);
			};
			self.current = if self.inner.is_streaming() {
				let key = match self.inner {
					Exporter::Xor {key} => Some(key),
					_ => None
				};
				Current::Raw {reader: source.open_range(block.offset, block.length)?, remaining: block.length, key}
			} else {
				let raw = read_raw(source, block.offset, block.length)?;
				Current::Decoded(self.inner.decode(raw, block.decompressed_length)?.into())
			};
		}
		Ok(true)
	}

	pub fn read(&mut self) -> Result<u8, ExportError> {
		if self.source.is_none() {
			return Err(ExportError::NotOpen);
		}
		let mut byte = [0u8];
		match self.fill(&mut byte)? {
			1 => Ok(byte[0]),
			_ => Err(io::Error::from(io::ErrorKind::UnexpectedEof).into())
		}
	}

	fn fill(&mut self, out: &mut [u8]) -> Result<usize, ExportError> {
		let mut written = 0;
		while written < out.len() && self.available()? {
			let dest = &mut out[written..];
			let n = match &mut self.current {
				Current::Raw {reader, remaining, key} => {
					let want = dest.len().min(usize::try_from(*remaining).unwrap_or(usize::MAX));
					let n = reader.read(&mut dest[..want])?;
					if n == 0 {
						return Err(ExportError::Truncated {missing: *remaining});
					}
					if let Some(key) = key {
						apply_xor(&mut dest[..n], *key);
					}
					*remaining -= n as u64;
					n
				}
				Current::Decoded(buf) => {
					let n = dest.len().min(buf.remaining());
					buf.copy_to_slice(&mut dest[..n]);
					n
				}
				Current::Idle => 0
			};
			written += n;
		}
		Ok(written)
	}
}

impl Read for ExportStream {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.fill(buf).map_err(|e| match e {
			ExportError::Io(e) => e,
			e => io::Error::other(e)
		})
	}
}
