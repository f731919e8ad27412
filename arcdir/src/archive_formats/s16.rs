use crate::{error::ParseError, resource::{generate_name, Resource}, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["s16"];
const ENTRY_LEN: u64 = 32;

pub const PLUGIN_S16: FormatPlugin = FormatPlugin {
	id: "s16",
	desc: "S16 sprite bank of 16-bit images",
	games: &["Warhammer 40K: Rites of War"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::READ_ONLY,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		if v.check_num_files(cursor.read_i32()?).is_ok() {
			rating += 5;
		}
		if v.check_width(cursor.read_i32()?).is_ok() {
			rating += 5;
		}
		if v.check_height(cursor.read_i32()?).is_ok() {
			rating += 5;
		}
		if cursor.read_u64()? == 0 {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_s16,
	guess_extension: |_| None,
	write: None
};

// 4 - image count
// 32 * n - width, height, 8 unknown, offset from the end of this table,
//          length, compressed flag, 4 unknown
fn read_s16(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	let declared = ctx.cursor.read_i32()?;
	let count = ctx.entry_count(declared, ENTRY_LEN)?;
	let data_start = 4 + count as u64 * ENTRY_LEN;
	ctx.progress.set_maximum(count as u64);

	let mut resources = Vec::with_capacity(count);
	for i in 0..count {
		let width = ctx.validator.check_width(ctx.cursor.read_i32()?)?;
		let height = ctx.validator.check_height(ctx.cursor.read_i32()?)?;
		ctx.cursor.skip(8)?;
		let offset = ctx.validator.check_offset(ctx.cursor.read_u32()? as u64 + data_start, arc_size)?;
		let length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		let compressed = ctx.cursor.read_u32()? == 1;
		ctx.cursor.skip(4)?;
		// decoding the pixels is left to image tools; only the size is known
		let mut res = Resource::new(source.clone(), format!("{}.s16image", generate_name(i)), offset, length);
		if compressed {
			res = res.with_decompressed_length(width as u64 * height as u64 * 2);
		}
		res.add_property("Width", width as i64);
		res.add_property("Height", height as i64);
		resources.push(res);
		ctx.progress.set_value(i as u64 + 1);
	}
	Ok(resources)
}
