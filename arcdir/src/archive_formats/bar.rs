use crate::{error::ParseError, resource::Resource, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["bar"];

pub const PLUGIN_BAR: FormatPlugin = FormatPlugin {
	id: "bar",
	desc: "BAR archive with an indirect directory",
	games: &["Age of Mythology"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::READ_ONLY,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		if cursor.read_bytes(4)? == [0; 4] {
			rating += 50;
		}
		if cursor.read_u32()? as u64 == cursor.len() {
			rating += 5;
		}
		cursor.skip(4)?;
		if v.check_num_files(cursor.read_u32()?).is_ok() {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_bar,
	guess_extension: |_| None,
	write: None
};

// 4 - null
// 4 - archive length
// 4 - unknown
// 4 - entry count
// 4 - directory length
// 4 - directory offset
//
// The directory is a table of entry pointers relative to its end, each
// pointing at offset, length, 12 unknown bytes and a null-terminated name.
fn read_bar(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	let cap = ctx.config.name_scan_cap;
	ctx.cursor.seek(12)?;
	let declared = ctx.cursor.read_u32()?;
	ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
	let dir_offset = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
	ctx.cursor.seek(dir_offset)?;
	let count = ctx.entry_count(declared, 4)?;
	let entries_base = dir_offset + count as u64 * 4;
	ctx.progress.set_maximum(count as u64);

	let mut resources = Vec::with_capacity(count);
	for i in 0..count {
		let entry = ctx.validator.check_offset(ctx.cursor.read_u32()? as u64 + entries_base, arc_size)?;
		let validator = ctx.validator;
		let res = ctx.cursor.with_position(entry, |c| {
			let offset = validator.check_offset(c.read_u32()?, arc_size)?;
			let length = validator.check_length(c.read_u32()?, arc_size)?;
			c.skip(12)?;
			let name = c.read_null_string(cap)?;
			validator.check_filename(&name)?;
			Ok::<_, ParseError>(Resource::new(source.clone(), name, offset, length))
		})?;
		resources.push(res);
		ctx.progress.set_value(i as u64 + 1);
	}
	Ok(resources)
}
