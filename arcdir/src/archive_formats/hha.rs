use crate::{directory::NameTable, error::ParseError, exporters::Exporter, resource::Resource, Capabilities, FormatPlugin, ReadContext};

const MAGIC: &[u8] = &[79, 243, 47, 172];
const EXTENSIONS: &[&str] = &["hha"];
const ENTRY_LEN: u64 = 24;

pub const PLUGIN_HHA: FormatPlugin = FormatPlugin {
	id: "hha",
	desc: "HHA package with a shared name table",
	games: &[
		"Penny Arcade: On The Rain-Slick Precipice of Darkness: Episode 1",
		"Penny Arcade: On The Rain-Slick Precipice of Darkness: Episode 2",
		"The Maw"
	],
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
		if cursor.read_u32()? == 65536 {
			rating += 5;
		}
		if v.check_length(cursor.read_u32()?, cursor.len()).is_ok() {
			rating += 5;
		}
		if v.check_num_files(cursor.read_u32()?).is_ok() {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_hha,
	guess_extension: |_| None,
	write: None
};

struct PendingName {
	dir: Option<u64>,
	file: u64
}

fn read_hha(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	if ctx.cursor.read_bytes(4)? != MAGIC {
		return Err(ParseError::Mismatch("no HHA header"));
	}
	ctx.cursor.skip(4)?;
	let names_len = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
	let declared = ctx.cursor.read_u32()?;
	let names = NameTable::read(ctx.cursor, names_len as usize)?;
	let count = ctx.entry_count(declared, ENTRY_LEN)?;
	ctx.progress.set_maximum(count as u64);

	let mut resources = Vec::with_capacity(count);
	let mut pending = Vec::with_capacity(count);
	for i in 0..count {
		let dir = ctx.validator.check_offset(ctx.cursor.read_u32()?, names_len)?;
		let file = ctx.cursor.read_u32()? as u64;
		// entries with no folder keep their one name in the folder slot
		pending.push(if file < names_len {
			PendingName {dir: Some(dir), file}
		} else {
			PendingName {dir: None, file: dir}
		});
		let compression = ctx.cursor.read_u32()?;
		let mut offset = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
		let decompressed_length = ctx.validator.check_decompressed_length(ctx.cursor.read_u32()?)?;
		let length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		let res = match compression {
			1 => Resource::new(source.clone(), "", offset, length).with_exporter(Exporter::Deflate, decompressed_length),
			_ => {
				// undecoded compression behind an 8-byte header
				if compression == 2 {
					offset += 8;
				}
				Resource::new(source.clone(), "", offset, length).with_decompressed_length(decompressed_length)
			}
		};
		resources.push(res);
		ctx.progress.set_value(i as u64 + 1);
	}

	for (res, name) in resources.iter_mut().zip(&pending) {
		let file = names.name_at(name.file, ctx.validator)?;
		match name.dir {
			Some(dir) => res.set_name(format!("{}/{file}", names.name_at(dir, ctx.validator)?)),
			None => res.set_name(file)
		}
	}
	Ok(resources)
}
