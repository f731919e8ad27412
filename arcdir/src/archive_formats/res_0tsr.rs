use crate::{directory::{FlatLayout, RecordField}, error::ParseError, Capabilities, FormatPlugin};

const MAGIC: &[u8] = b"0TSR";
const EXTENSIONS: &[&str] = &["res"];
const HEADER_LEN: u64 = 20;

// 36 - name
// 4 - type code (GAMI, TYAL, PMTS, ...)
// 4 - unknown (1)
// 4 - length, not counting a 4-byte prefix
// 8 - null
const RECORD: FlatLayout = FlatLayout::new(&[
	RecordField::Name(36),
	RecordField::Skip(8),
	RecordField::Length,
	RecordField::Skip(8)
]);

pub const PLUGIN_RES_0TSR: FormatPlugin = FormatPlugin {
	id: "res_0tsr",
	desc: "0TSR resource archive",
	games: &["Nascar Heat"],
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
		if cursor.read_u32()? == 0 {
			rating += 5;
		}
		if v.check_num_files(cursor.read_u32()?).is_ok() {
			rating += 5;
		}
		if v.check_num_files(cursor.read_u32()?).is_ok() {
			rating += 5;
		}
		if v.check_equals(cursor.read_u32()?, cursor.len() as i64).is_ok() {
			rating += 5;
		}
		Ok(rating)
	},
	read: |ctx| {
		let arc_size = ctx.arc_size();
		let source = ctx.source();
		if ctx.cursor.read_bytes(4)? != MAGIC {
			return Err(ParseError::Mismatch("no 0TSR header"));
		}
		ctx.cursor.skip(4)?;
		let declared = ctx.cursor.read_u32()?;
		// repeated count, archive length
		ctx.cursor.skip(8)?;
		let count = ctx.entry_count(declared, RECORD.record_len())?;
		ctx.progress.set_maximum(count as u64);
		// files follow the directory back to back, each after 4 null bytes
		let mut offset = count as u64 * RECORD.record_len() + HEADER_LEN;
		let mut resources = Vec::with_capacity(count);
		for i in 0..count {
			let record = RECORD.read_record(ctx.cursor, ctx.validator, arc_size)?;
			let length = ctx.validator.check_length(record.length.unwrap_or(0) as i64 + 4, arc_size)?;
			let mut res = record.into_resource(&source, i);
			res.set_offset(offset);
			res.set_length(length);
			resources.push(res);
			offset += length + 4;
			ctx.progress.set_value(i as u64 + 1);
		}
		Ok(resources)
	},
	guess_extension: |_| None,
	write: None
};

#[cfg(test)]
mod tests {
	use crate::{config::ParseConfig, cursor::Cursor, progress::NoProgress, validate::FieldValidator};
	use super::*;

	fn entry(name: &[u8], length: u32) -> Vec<u8> {
		let mut rec = name.to_vec();
		rec.resize(36, 0);
		rec.extend(b"GAMI");
		rec.extend(1u32.to_le_bytes());
		rec.extend(length.to_le_bytes());
		rec.extend([0; 8]);
		rec
	}

	#[test]
	fn offsets_are_computed_after_the_directory() {
		let mut data = b"0TSR".to_vec();
		data.extend([0; 4]);
		data.extend(2u32.to_le_bytes());
		data.extend(2u32.to_le_bytes());
		data.extend(0u32.to_le_bytes());
		data.extend(entry(b"menu.img", 6));
		data.extend(entry(b"font.fnt", 2));
		let first = data.len() as u64;
		assert_eq!(first, 132);
		data.resize(first as usize + 10 + 4 + 6, 0);
		let total = data.len() as u32;
		data[16..20].copy_from_slice(&total.to_le_bytes());
		let mut cursor = Cursor::from_bytes(data).with_path("track.res");
		assert_eq!(PLUGIN_RES_0TSR.rate(&mut cursor, &FieldValidator::default()), 95);
		let archive = PLUGIN_RES_0TSR.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		let res = &archive.resources;
		assert_eq!((res[0].name(), res[0].offset(), res[0].length()), ("menu.img", 132, 10));
		assert_eq!((res[1].name(), res[1].offset(), res[1].length()), ("font.fnt", 146, 6));
	}
}
