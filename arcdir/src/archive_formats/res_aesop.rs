use crate::{error::ParseError, resource::{generate_name, Resource}, Capabilities, FormatPlugin, ReadContext};

const MAGIC: &[u8] = b"AESOP/16 V1.00";
const EXTENSIONS: &[&str] = &["res"];
/// Null padding and the entry table of a directory block, after its link.
const BLOCK_BODY_LEN: u64 = 640;

pub const PLUGIN_RES_AESOP: FormatPlugin = FormatPlugin {
	id: "res_aesop",
	desc: "AESOP resource file",
	games: &["Eye of the Beholder 3: Assault On Myth Drannor"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::READ_ONLY,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		if cursor.read_bytes(MAGIC.len())? == MAGIC {
			rating += 50;
		}
		cursor.skip(2)?;
		if v.check_equals(cursor.read_u32()?, cursor.len()).is_ok() {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_res,
	guess_extension: |_| None,
	write: None
};

// The directory blocks are scattered among the files and chained by offset,
// so the files are walked in storage order and a block is stepped over
// whenever the walk lands on the next one.
//
// 16 - magic, null padded
// 4 - archive length
// 4 - null
// 4 - first block offset (36)
// 8 - unknown
// 4 - next block offset
// 128 - null
// 4 - offset of the first file
//
// Each file is 8 unknown bytes, a 4-byte length, then the data.
fn read_res(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	ctx.cursor.seek(36)?;
	let mut next_block = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
	ctx.cursor.seek(168)?;
	let data_start = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
	ctx.cursor.seek(data_start)?;
	ctx.progress.set_maximum(arc_size);

	let mut resources = Vec::new();
	while ctx.cursor.position() < arc_size {
		ctx.check_entry_budget(resources.len())?;
		if ctx.cursor.position() == next_block {
			next_block = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
			ctx.cursor.skip(BLOCK_BODY_LEN)?;
		}
		ctx.cursor.skip(8)?;
		let length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		let offset = ctx.cursor.position();
		ctx.cursor.skip(length)?;
		resources.push(Resource::new(source.clone(), generate_name(resources.len()), offset, length));
		ctx.progress.set_value(ctx.cursor.position());
	}
	Ok(resources)
}
