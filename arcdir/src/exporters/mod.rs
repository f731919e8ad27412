//! Exporters turn a resource's stored bytes into its real contents, and
//! (where the format allows writing) back again.

use std::{fmt, sync::Arc};
use crate::{error::ExportError, resource::{Resource, SourceFile}};

mod deflate;
mod block;
mod custom;
mod stream;
pub use block::{Block, BlockExporter};
pub use custom::{Codec, WavHeaderFix};
pub use stream::ExportStream;

#[derive(Clone)]
pub enum Exporter {
	Identity,
	/// Raw deflate stream without a zlib header.
	Deflate,
	Zlib,
	Xor {
		key: u8
	},
	/// XOR first, then raw deflate.
	DeflateXor {
		key: u8
	},
	/// Several separately-encoded extents, concatenated after decoding.
	Blocks(Arc<BlockExporter>),
	Custom(Arc<dyn Codec>)
}

impl fmt::Debug for Exporter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Xor {key} | Self::DeflateXor {key} => write!(f, "{}({key:#04x})", self.name()),
			Self::Blocks(blocks) => write!(f, "{}[{}]", self.name(), blocks.blocks().len()),
			_ => f.write_str(self.name())
		}
	}
}

impl Exporter {
	pub fn name(&self) -> &'static str {
		match self {
			Self::Identity => "identity",
			Self::Deflate => "deflate",
			Self::Zlib => "zlib",
			Self::Xor {..} => "xor",
			Self::DeflateXor {..} => "deflate-xor",
			Self::Blocks(_) => "blocks",
			Self::Custom(codec) => codec.name()
		}
	}

	/// Whether output can be produced while reading, without buffering a
	/// whole extent first.
	pub(crate) fn is_streaming(&self) -> bool {
		matches!(self, Self::Identity | Self::Xor {..})
	}

	/// Decode one extent's stored bytes into exactly `expected` bytes.
	pub(crate) fn decode(&self, mut raw: Vec<u8>, expected: u64) -> Result<Vec<u8>, ExportError> {
		let out = match self {
			Self::Identity => raw,
			Self::Deflate => deflate::inflate(&raw, expected, false)?,
			Self::Zlib => deflate::inflate(&raw, expected, true)?,
			Self::Xor {key} => {
				apply_xor(&mut raw, *key);
				raw
			}
			Self::DeflateXor {key} => {
				apply_xor(&mut raw, *key);
				deflate::inflate(&raw, expected, false)?
			}
			Self::Custom(codec) => codec.decode(raw, expected)?,
			Self::Blocks(_) => return Err(ExportError::Decode {codec: "blocks", msg: "nested block exporters".into()})
		};
		if self.is_streaming() {
			return Ok(out);
		}
		if out.len() as u64 != expected {
			return Err(ExportError::LengthMismatch {expected, actual: out.len() as u64});
		}
		Ok(out)
	}

	/// Encode decoded contents the way this exporter expects to find them.
	pub fn pack(&self, data: &[u8]) -> Result<Vec<u8>, ExportError> {
		match self {
			Self::Identity => Ok(data.to_vec()),
			Self::Deflate => deflate::deflate(data, false),
			Self::Zlib => deflate::deflate(data, true),
			Self::Xor {key} => {
				let mut out = data.to_vec();
				apply_xor(&mut out, *key);
				Ok(out)
			}
			Self::DeflateXor {key} => {
				let mut out = deflate::deflate(data, false)?;
				apply_xor(&mut out, *key);
				Ok(out)
			}
			Self::Custom(codec) => codec.encode(data),
			Self::Blocks(_) => Err(ExportError::PackUnsupported("blocks"))
		}
	}

	/// Read and decode a whole resource.
	pub fn export(&self, resource: &Resource) -> Result<Vec<u8>, ExportError> {
		match self {
			Self::Blocks(blocks) => blocks.export(resource.source()),
			_ => self.decode(read_raw(resource.source(), resource.offset(), resource.length())?, resource.decompressed_length())
		}
	}
}

pub(crate) fn apply_xor(buf: &mut [u8], key: u8) {
	buf.iter_mut().for_each(|x| *x ^= key);
}

pub(crate) fn read_raw(source: &SourceFile, offset: u64, length: u64) -> Result<Vec<u8>, ExportError> {
	source.read_range(offset, length).map_err(|e| match e.kind() {
		std::io::ErrorKind::UnexpectedEof => ExportError::Truncated {missing: (offset + length).saturating_sub(source.len())},
		_ => e.into()
	})
}
