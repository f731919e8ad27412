use std::sync::Arc;
use crate::{error::ParseError, exporters::{Block, BlockExporter, Exporter}, resource::{generate_name, Resource}, Capabilities, FormatPlugin, ReadContext};

const MAGIC: &[u8] = b"bnd2";
const EXTENSIONS: &[&str] = &["bundle", "bndl"];
const ENTRY_LEN: u64 = 64;

pub const PLUGIN_BND2: FormatPlugin = FormatPlugin {
	id: "bnd2",
	desc: "BND2 bundle with zlib-compressed property and data blocks",
	games: &["Burnout Paradise: The Ultimate Box"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::READ_ONLY,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		if cursor.read_bytes(4)? == MAGIC {
			rating += 50;
		}
		if cursor.read_u32()? == 2 {
			rating += 5;
		}
		if cursor.read_u32()? == 1 {
			rating += 5;
		}
		if cursor.read_u32()? == 48 {
			rating += 5;
		}
		if v.check_num_files(cursor.read_u32()?).is_ok() {
			rating += 5;
		}
		cursor.skip(12)?;
		if cursor.read_u32()? as u64 == cursor.len() {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_bnd2,
	// textures carry no header of their own
	guess_extension: |sample| (sample.bytes.len() >= 12 && sample.ints == [0; 3]).then_some("dxt"),
	write: None
};

/// Sizes whose top byte holds flags rather than size bits.
fn masked_length(raw: u32) -> u64 {
	(raw & 0x00FF_FFFF) as u64
}

fn read_bnd2(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	if ctx.cursor.read_bytes(4)? != MAGIC {
		return Err(ParseError::Mismatch("no bnd2 header"));
	}
	// version, unknown, header length
	ctx.cursor.skip(12)?;
	let declared = ctx.cursor.read_u32()?;
	ctx.cursor.skip(4)?;
	let properties_base = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size + 1)?;
	let data_base = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size + 1)?;
	// archive length, unknown, padding
	ctx.cursor.skip(16)?;
	let count = ctx.entry_count(declared, ENTRY_LEN)?;
	ctx.progress.set_maximum(count as u64);
	let mut resources = Vec::with_capacity(count);
	for i in 0..count {
		// hash, padding
		ctx.cursor.skip(16)?;
		let properties_decompressed = masked_length(ctx.cursor.read_u32()?);
		let data_decompressed = masked_length(ctx.cursor.read_u32()?);
		ctx.cursor.skip(4)?;
		let properties_length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		let data_length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		ctx.cursor.skip(4)?;
		let properties_offset = ctx.validator.check_offset(ctx.cursor.read_u32()? as u64 + properties_base, arc_size + 1)?;
		let data_offset = ctx.validator.check_offset(ctx.cursor.read_u32()? as u64 + data_base, arc_size + 1)?;
		ctx.cursor.skip(16)?;

		let name = generate_name(i);
		let res = match (properties_length, data_length) {
			(0, 0) => Resource::new(source.clone(), name, data_offset, 0),
			(0, _) => Resource::new(source.clone(), name, data_offset, data_length)
				.with_exporter(Exporter::Zlib, data_decompressed),
			(_, 0) => Resource::new(source.clone(), name, properties_offset, properties_length)
				.with_exporter(Exporter::Zlib, properties_decompressed),
			_ => {
				let blocks = BlockExporter::new(Exporter::Zlib, vec![
					Block {offset: properties_offset, length: properties_length, decompressed_length: properties_decompressed},
					Block {offset: data_offset, length: data_length, decompressed_length: data_decompressed}
				]);
				Resource::new(source.clone(), name, data_offset, data_length)
					.with_exporter(Exporter::Blocks(Arc::new(blocks)), properties_decompressed + data_decompressed)
			}
		};
		resources.push(res);
		ctx.progress.set_value(i as u64 + 1);
	}
	Ok(resources)
}
