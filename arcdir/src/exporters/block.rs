use crate::{error::ExportError, resource::SourceFile};
use super::{read_raw, Exporter};

/// One separately-encoded extent of a block-composed resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
	pub offset: u64,
	pub length: u64,
	pub decompressed_length: u64
}

/// A resource stored as several extents, each decoded with the same inner
/// exporter and concatenated in order.
#[derive(Debug)]
pub struct BlockExporter {
	inner: Exporter,
	blocks: Vec<Block>
}

impl BlockExporter {
	pub fn new(inner: Exporter, blocks: Vec<Block>) -> Self {
		Self {inner, blocks}
	}

	pub fn inner(&self) -> &Exporter {
		&self.inner
	}

	pub fn blocks(&self) -> &[Block] {
		&self.blocks
	}

	pub fn decompressed_length(&self) -> u64 {
		self.blocks.iter().map(|x| x.decompressed_length).sum()
	}

	pub(crate) fn export(&self, source: &SourceFile) -> Result<Vec<u8>, ExportError> {
		let mut out = Vec::with_capacity(self.decompressed_length().min(1 << 24) as usize);
		for block in &self.blocks {
			let raw = read_raw(source, block.offset, block.length)?;
			out.extend(self.inner.decode(raw, block.decompressed_length)?);
		}
		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use bytes::Bytes;
	use crate::resource::Resource;
	use super::*;

	#[test]
	fn blocks_decode_in_order() {
		let head = b"properties".to_vec();
		let body = vec![0x42u8; 500];
		let packed_head = Exporter::Zlib.pack(&head).unwrap();
		let packed_body = Exporter::Zlib.pack(&body).unwrap();
		let mut stored = vec![0u8; 4];
		stored.extend(&packed_body);
		let head_offset = stored.len() as u64;
		stored.extend(&packed_head);
		let blocks = vec![
			Block {offset: head_offset, length: packed_head.len() as u64, decompressed_length: head.len() as u64},
			Block {offset: 4, length: packed_body.len() as u64, decompressed_length: body.len() as u64}
		];
		let exporter = Exporter::Blocks(Arc::new(BlockExporter::new(Exporter::Zlib, blocks)));
		let total = stored.len() as u64;
		let res = Resource::new(SourceFile::Memory {buf: Bytes::from(stored)}, "x", 4, total - 4).with_exporter(exporter.clone(), 510);
		let out = exporter.export(&res).unwrap();
		assert_eq!(&out[..10], b"properties");
		assert_eq!(&out[10..], &body[..]);
	}
}
