use crate::{error::{CursorError, ParseError}, resource::Resource, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["pak"];
/// Shortest entry: one-character name, terminator, four u32s.
const MIN_ENTRY_LEN: u64 = 18;

pub const PLUGIN_PAK_NAMES: FormatPlugin = FormatPlugin {
	id: "pak_names",
	desc: "PAK with a trailing directory of named entries",
	games: &["Arx Fatalis"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::READ_ONLY,
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

// 4 - directory offset
// at the directory:
// 4 - tail start
// 5 - unknown, so the path starts 9 bytes into the directory
// X - base path (null)
// 4 - entry count
// then per entry: name (null), offset, compressed length, original length, length
fn read_pak(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	let cap = ctx.config.name_scan_cap;
	let dir_offset = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
	ctx.cursor.seek(dir_offset)?;
	ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
	ctx.cursor.skip(5)?;
	match ctx.cursor.read_null_string(cap) {
		Ok(_) => {}
		Err(CursorError::Unterminated {..}) => return Err(ParseError::Mismatch("unterminated base path")),
		Err(e) => return Err(e.into())
	}
	let declared = ctx.cursor.read_u32()?;
	let count = ctx.entry_count(declared, MIN_ENTRY_LEN)?;
	ctx.progress.set_maximum(count as u64);

	let mut resources = Vec::with_capacity(count);
	for i in 0..count {
		let name = ctx.cursor.read_null_string(cap)?;
		ctx.validator.check_filename(&name)?;
		let offset = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
		// compressed and original lengths
		ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		let length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		resources.push(Resource::new(source.clone(), name, offset, length));
		ctx.progress.set_value(i as u64 + 1);
	}
	Ok(resources)
}

#[cfg(test)]
mod tests {
	use crate::{config::ParseConfig, cursor::Cursor, progress::NoProgress};
	use super::*;

	#[test]
	fn directory_is_read_from_its_offset() {
		let mut data = 12u32.to_le_bytes().to_vec();
		data.extend(b"contents");
		data.extend(4u32.to_le_bytes());
		data.extend([0; 5]);
		data.extend(b"graph\\\0");
		data.extend(2u32.to_le_bytes());
		for (name, offset, length) in [("obj.ftl", 4u32, 3u32), ("map.dlf", 7, 5)] {
			data.extend(name.as_bytes());
			data.push(0);
			for x in [offset, length, length, length] {
				data.extend(x.to_le_bytes());
			}
		}
		let mut cursor = Cursor::from_bytes(data).with_path("data.pak");
		let archive = PLUGIN_PAK_NAMES.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		assert_eq!(archive.resources[1].name(), "map.dlf");
		assert_eq!(archive.export(0).unwrap().unwrap(), b"con");
		assert_eq!(archive.export(1).unwrap().unwrap(), b"tents");
	}

	#[test]
	fn base_path_is_relative_to_the_directory() {
		// a data area with no NUL in it: reading the path anywhere before
		// the directory runs into the name cap
		let mut data = 604u32.to_le_bytes().to_vec();
		data.resize(604, b'x');
		data.extend(4u32.to_le_bytes());
		data.extend([0; 5]);
		data.extend(b"\0");
		data.extend(1u32.to_le_bytes());
		data.extend(b"all.bin\0");
		for x in [4u32, 600, 600, 600] {
			data.extend(x.to_le_bytes());
		}
		let mut cursor = Cursor::from_bytes(data).with_path("level.pak");
		let archive = PLUGIN_PAK_NAMES.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		let res = &archive.resources[0];
		assert_eq!((res.name(), res.offset(), res.length()), ("all.bin", 4, 600));
	}
}
