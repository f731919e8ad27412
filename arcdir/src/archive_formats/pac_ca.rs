use crate::{error::ParseError, resource::{FieldHook, ReplaceHooks, Resource}, Capabilities, FormatPlugin, ReadContext};

const MAGIC: &[u8] = b" CA ";
const EXTENSIONS: &[&str] = &["pac"];
const GROUP_LEN: u64 = 40;
const FILE_LEN: u64 = 48;

pub const PLUGIN_PAC_CA: FormatPlugin = FormatPlugin {
	id: "pac_ca",
	desc: "CA package of named folders",
	games: &["Pac-Man: Adventures in Time"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::REPLACE,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		if cursor.read_bytes(4)? == MAGIC {
			rating += 50;
		}
		cursor.skip(4)?;
		if cursor.read_u32()? == 0 {
			rating += 5;
		}
		if cursor.read_u32()? == 16 {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_pac,
	guess_extension: |_| None,
	write: None
};

// 4 - magic
// 4 - version (100)
// 4 - null
// 4 - directory offset (16)
// 4 - folder count
// 40 * n - folders: file count, 32-byte name, unknown
// 48 * n - files: unknown, 32-byte name, unknown, offset, length
fn read_pac(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	ctx.cursor.seek(16)?;
	let declared = ctx.cursor.read_u32()?;
	let group_count = ctx.entry_count(declared, GROUP_LEN)?;
	let mut groups = Vec::with_capacity(group_count);
	let mut total = 0u64;
	for _ in 0..group_count {
		let files = ctx.validator.check_num_files(ctx.cursor.read_u32()?)?;
		let name = ctx.cursor.read_fixed_string(32)?;
		ctx.validator.check_filename(&name)?;
		ctx.cursor.skip(4)?;
		total += files as u64;
		groups.push((name, files));
	}
	let count = ctx.entry_count(total, FILE_LEN)?;
	ctx.progress.set_maximum(count as u64);

	let folders = groups.iter().flat_map(|(name, files)| std::iter::repeat_n(name, *files));
	let mut first_offset = None;
	let mut resources = Vec::with_capacity(count);
	for folder in folders {
		ctx.cursor.skip(4)?;
		let name = ctx.cursor.read_fixed_string(32)?;
		ctx.validator.check_filename(&name)?;
		ctx.cursor.skip(4)?;
		let offset_hook = FieldHook::new(ctx.cursor.position(), 4);
		let offset = ctx.cursor.read_u32()?;
		// the declared count can run past the directory into file data
		if first_offset.is_some_and(|first| ctx.cursor.position() >= first) {
			break;
		}
		let offset = ctx.validator.check_offset(offset, arc_size)?;
		first_offset.get_or_insert(offset);
		let length_hook = FieldHook::new(ctx.cursor.position(), 4);
		let length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		resources.push(Resource::new(source.clone(), format!("{folder}/{name}"), offset, length)
			.with_replace_hooks(ReplaceHooks {offset: offset_hook, length: Some(length_hook)}));
		ctx.progress.set_value(resources.len() as u64);
	}
	Ok(resources)
}

#[cfg(test)]
mod tests {
	use std::io::Cursor as IoCursor;
	use crate::{config::ParseConfig, cursor::Cursor, progress::NoProgress, validate::FieldValidator};
	use super::*;

	fn fixed(name: &str) -> Vec<u8> {
		let mut out = name.as_bytes().to_vec();
		out.resize(32, 0);
		out
	}

	fn file(name: &str, offset: u32, length: u32) -> Vec<u8> {
		let mut out = vec![0; 4];
		out.extend(fixed(name));
		out.extend([0; 4]);
		out.extend(offset.to_le_bytes());
		out.extend(length.to_le_bytes());
		out
	}

	fn archive() -> Vec<u8> {
		let mut data = b" CA ".to_vec();
		for x in [100u32, 0, 16, 2] {
			data.extend(x.to_le_bytes());
		}
		data.extend(1u32.to_le_bytes());
		data.extend(fixed("maps"));
		data.extend([0; 4]);
		data.extend(1u32.to_le_bytes());
		data.extend(fixed("sfx"));
		data.extend([0; 4]);
		let data_start = data.len() as u32 + 2 * FILE_LEN as u32;
		data.extend(file("level1.map", data_start, 3));
		data.extend(file("jump.wav", data_start + 3, 2));
		data.extend(b"abcde");
		data
	}

	#[test]
	fn files_are_named_after_their_folder() {
		let mut cursor = Cursor::from_bytes(archive()).with_path("game.pac");
		assert_eq!(PLUGIN_PAC_CA.rate(&mut cursor, &FieldValidator::default()), 85);
		let archive = PLUGIN_PAC_CA.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		let names = archive.resources.iter().map(|x| x.name()).collect::<Vec<_>>();
		assert_eq!(names, ["maps/level1.map", "sfx/jump.wav"]);
		assert_eq!(archive.export(1).unwrap().unwrap(), b"de");
	}

	#[test]
	fn hooks_point_at_directory_fields() {
		let data = archive();
		let mut cursor = Cursor::from_bytes(data.clone()).with_path("game.pac");
		let archive = PLUGIN_PAC_CA.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		let hooks = *archive.resources[1].replace_hooks().unwrap();
		let mut out = IoCursor::new(data);
		hooks.patch(&mut out, 0x1234, 9).unwrap();
		let out = out.into_inner();
		let at = hooks.offset.position as usize;
		assert_eq!(&out[at..at + 8], &[0x34, 0x12, 0, 0, 9, 0, 0, 0]);
	}
}
