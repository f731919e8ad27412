use crate::{error::ParseError, resource::Resource, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["fpk"];
const NAME_LEN: usize = 36;
const ENTRY_LEN: u64 = NAME_LEN as u64 + 12;
const PADDING: u32 = 16;

pub const PLUGIN_FPK: FormatPlugin = FormatPlugin {
	id: "fpk",
	desc: "FPK big-endian package",
	games: &["Tatsunoko vs. Capcom"],
	extensions: EXTENSIONS,
	platforms: &["Wii"],
	capabilities: Capabilities::READ_ONLY,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		cursor.skip(4)?;
		if v.check_num_files(cursor.read_i32_be()?).is_ok() {
			rating += 5;
		}
		if cursor.read_u32_be()? == PADDING {
			rating += 5;
		}
		if v.check_equals(cursor.read_u32_be()?, cursor.len()).is_ok() {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_fpk,
	guess_extension: |_| None,
	write: None
};

// All fields big endian.
// 4 - unknown
// 4 - entry count
// 4 - padding size (16)
// 4 - archive length
// 48 * n - name (36, null padded), offset, stored length, decoded length
//
// Files are PRS-compressed when the two lengths differ; no built-in exporter
// decodes them, so only the decoded size is kept.
fn read_fpk(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	ctx.cursor.skip(4)?;
	let declared = ctx.cursor.read_i32_be()?;
	ctx.cursor.skip(8)?;
	let count = ctx.entry_count(declared, ENTRY_LEN)?;
	ctx.progress.set_maximum(count as u64);

	let mut resources = Vec::with_capacity(count);
	for i in 0..count {
		let name = ctx.cursor.read_fixed_string(NAME_LEN)?;
		ctx.validator.check_filename(&name)?;
		let offset = ctx.validator.check_offset(ctx.cursor.read_u32_be()?, arc_size)?;
		let length = ctx.validator.check_length(ctx.cursor.read_u32_be()?, arc_size)?;
		let decompressed_length = ctx.validator.check_decompressed_length(ctx.cursor.read_u32_be()?)?;
		let mut res = Resource::new(source.clone(), name, offset, length);
		if decompressed_length != length {
			res = res.with_decompressed_length(decompressed_length);
		}
		resources.push(res);
		ctx.progress.set_value(i as u64 + 1);
	}
	Ok(resources)
}

#[cfg(test)]
mod tests {
	use crate::{config::ParseConfig, cursor::Cursor, progress::NoProgress, validate::FieldValidator};
	use super::*;

	fn be(values: &[u32]) -> Vec<u8> {
		values.iter().flat_map(|x| x.to_be_bytes()).collect()
	}

	fn entry(name: &str, offset: u32, length: u32, decompressed_length: u32) -> Vec<u8> {
		let mut out = name.as_bytes().to_vec();
		out.resize(NAME_LEN, 0);
		out.extend(be(&[offset, length, decompressed_length]));
		out
	}

	#[test]
	fn fields_are_big_endian() {
		let start = 16 + 2 * ENTRY_LEN as u32;
		let total = start + 8;
		let mut data = be(&[0, 2, PADDING, total]);
		data.extend(entry("chr/ryu.bin", start, 5, 12));
		data.extend(entry("stage.arc", start + 5, 3, 3));
		data.extend(b"prs!!arc");
		let mut cursor = Cursor::from_bytes(data).with_path("chr.fpk");
		assert_eq!(PLUGIN_FPK.rate(&mut cursor, &FieldValidator::default()), 40);
		let archive = PLUGIN_FPK.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		let res = &archive.resources;
		assert_eq!((res[0].name(), res[0].offset(), res[0].length()), ("chr/ryu.bin", start as u64, 5));
		assert_eq!(res[0].decompressed_length(), 12);
		assert_eq!(res[1].decompressed_length(), 3);
		assert_eq!(archive.export(1).unwrap().unwrap(), b"arc");
	}

	#[test]
	fn little_endian_counts_do_not_parse() {
		let mut data = vec![0; 4];
		data.extend(2u32.to_le_bytes());
		data.resize(16 + 2 * ENTRY_LEN as usize, 0);
		let mut cursor = Cursor::from_bytes(data).with_path("swapped.fpk");
		assert!(PLUGIN_FPK.read(&mut cursor, &ParseConfig::default(), &NoProgress).is_none());
	}
}
