use std::sync::Arc;
use crate::{error::ParseError, exporters::{Exporter, WavHeaderFix}, resource::{generate_name, Resource}, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["voc"];

pub const PLUGIN_VOC: FormatPlugin = FormatPlugin {
	id: "voc",
	desc: "VOC sound bank",
	games: &["The Incredible Machine 3"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::READ_ONLY,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		if v.check_num_files(cursor.read_i16()?).is_ok() {
			rating += 5;
		}
		if v.check_offset(cursor.read_u32()?, cursor.len()).is_ok() {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_voc,
	guess_extension: |_| None,
	write: None
};

// 2 - sound count
// 4 * n - offsets
// at each offset: 4-byte header length, header, 4-byte length, data
fn read_voc(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	let declared = ctx.cursor.read_i16()?;
	let count = ctx.entry_count(declared, 4)?;
	let mut offsets = Vec::with_capacity(count);
	for _ in 0..count {
		offsets.push(ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?);
	}
	ctx.progress.set_maximum(count as u64);

	let mut resources = Vec::with_capacity(count);
	for (i, entry) in offsets.into_iter().enumerate() {
		ctx.cursor.seek(entry)?;
		let header_len = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		ctx.cursor.skip(header_len)?;
		let length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		ctx.progress.set_value(i as u64 + 1);
		if length == 0 {
			continue;
		}
		let offset = ctx.cursor.position();
		let magic = ctx.cursor.read_bytes(length.min(4) as usize)?;
		let mut res = Resource::new(source.clone(), generate_name(i), offset, length);
		match &magic[..] {
			b"RIFF" => res.set_name(format!("{}.wav", generate_name(i))),
			// the first byte of RIFF blanked out
			b"\0IFF" => {
				res.set_name(format!("{}.wav", generate_name(i)));
				res.set_exporter(Exporter::Custom(Arc::new(WavHeaderFix)), length);
			}
			_ => {}
		}
		resources.push(res);
	}
	Ok(resources)
}
