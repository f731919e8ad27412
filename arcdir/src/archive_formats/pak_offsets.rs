use crate::{directory::assign_lengths_from_offsets, error::{CursorError, ParseError}, resource::{FieldHook, ReplaceHooks, Resource}, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["pak"];

pub const PLUGIN_PAK_OFFSETS: FormatPlugin = FormatPlugin {
	id: "pak_offsets",
	desc: "PAK with interleaved offsets and names",
	games: &["Dune 2", "Eye of the Beholder"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::REPLACE,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		if v.check_offset(cursor.read_u32()?, cursor.len()).is_ok() {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_pak,
	guess_extension: |_| None,
	write: None
};

// Repeated up to the first file: 4-byte offset, null-terminated name. The
// directory ends with a zero offset, so it is 4 bytes short of the first
// file's offset.
fn read_pak(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	// names running past the cap mean the directory is something else
	let cap = ctx.config.name_scan_cap;
	let directory_end = ctx.validator.check_offset(ctx.cursor.read_u32()? as i64 - 4, arc_size)?;
	ctx.cursor.seek(0)?;
	ctx.progress.set_maximum(directory_end);

	let mut resources = Vec::new();
	while ctx.cursor.position() < directory_end {
		ctx.check_entry_budget(resources.len())?;
		let hook = FieldHook::new(ctx.cursor.position(), 4);
		let offset = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
		let name = match ctx.cursor.read_null_string(cap) {
			Ok(name) => name,
			Err(CursorError::Unterminated {..}) => return Err(ParseError::Mismatch("unterminated name")),
			Err(e) => return Err(e.into())
		};
		resources.push(Resource::new(source.clone(), name, offset, 0)
			.with_replace_hooks(ReplaceHooks {offset: hook, length: None}));
		ctx.progress.set_value(ctx.cursor.position());
	}
	assign_lengths_from_offsets(&mut resources, arc_size, ctx.validator)?;
	Ok(resources)
}
