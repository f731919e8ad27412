use crate::{error::ParseError, exporters::Exporter, resource::{Resource, SourceFile}, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["pak"];
const KEY: u8 = 171;
/// "PK" once masked.
const MASKED_SIGNATURE: i16 = -7941;

const LOCAL_FILE: i32 = 0x0014_0403;
const CENTRAL_FILE: i32 = 0x0000_0201;
const SHORT_FILE: i32 = 0x000A_0403;
const END_OF_DIRECTORY: i32 = 0x0000_0605;

pub const PLUGIN_PAK_XOR: FormatPlugin = FormatPlugin {
	id: "pak_xor",
	desc: "Zip-like PAK with every byte XOR-masked",
	games: &["Praetorians"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::READ_ONLY,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		if cursor.read_i16()? == MASKED_SIGNATURE {
			rating += 50;
		}
		Ok(rating)
	},
	read: read_pak,
	guess_extension: |_| None,
	write: None
};

/// Walks the records one after another instead of trusting the central
/// directory, so an archive cut short still yields what precedes the cut.
fn read_pak(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	ctx.cursor.set_xor_mask(Some(KEY));
	ctx.progress.set_maximum(arc_size);
	let mut resources = Vec::new();
	while ctx.cursor.position() < arc_size {
		ctx.check_entry_budget(resources.len())?;
		match read_record(ctx, &source) {
			Ok(Some(res)) => resources.push(res),
			Ok(None) => {}
			Err(e) => return ctx.tolerate_truncation(resources, e)
		}
		ctx.progress.set_value(ctx.cursor.position());
	}
	Ok(resources)
}

fn read_record(ctx: &mut ReadContext, source: &SourceFile) -> Result<Option<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let start = ctx.cursor.position();
	ctx.cursor.skip(2)?;
	match ctx.cursor.read_i32()? {
		LOCAL_FILE => {
			ctx.cursor.skip(2)?;
			let method = ctx.cursor.read_i16()?;
			// time, date, crc
			ctx.cursor.skip(8)?;
			let length = ctx.validator.check_length(ctx.cursor.read_i32()?, arc_size)?;
			let decompressed_length = ctx.validator.check_decompressed_length(ctx.cursor.read_i32()?)?;
			let name_len = ctx.validator.check_filename_length(ctx.cursor.read_i16()?)?;
			let extra_len = ctx.validator.check_length(ctx.cursor.read_i16()?, arc_size)?;
			let name = ctx.cursor.read_fixed_string(name_len)?;
			ctx.cursor.skip(extra_len)?;
			let offset = ctx.cursor.position();
			ctx.cursor.skip(length)?;
			Ok(Some(masked_resource(source, name, offset, length, method, decompressed_length)))
		}
		CENTRAL_FILE => {
			ctx.cursor.skip(22)?;
			let name_len = ctx.validator.check_filename_length(ctx.cursor.read_i16()?)?;
			// extra length, comment length, disk, attributes, local header offset
			ctx.cursor.skip(16)?;
			ctx.cursor.skip(name_len as u64)?;
			Ok(None)
		}
		SHORT_FILE => {
			ctx.cursor.skip(2)?;
			let method = ctx.cursor.read_i16()?;
			ctx.cursor.skip(8)?;
			let length = ctx.validator.check_length(ctx.cursor.read_i32()?, arc_size)?;
			let decompressed_length = ctx.validator.check_decompressed_length(ctx.cursor.read_i32()?)?;
			let name_len = ctx.validator.check_filename_length(ctx.cursor.read_i16()?)?;
			ctx.cursor.skip(2)?;
			let name = ctx.cursor.read_fixed_string(name_len)?;
			// folders have no data
			if length == 0 {
				return Ok(None);
			}
			let offset = ctx.cursor.position();
			ctx.cursor.skip(length)?;
			Ok(Some(masked_resource(source, name, offset, length, method, decompressed_length)))
		}
		END_OF_DIRECTORY => {
			ctx.cursor.skip(16)?;
			Ok(None)
		}
		kind => Err(ParseError::UnknownEntry {kind: kind as i64, offset: start})
	}
}

fn masked_resource(source: &SourceFile, name: String, offset: u64, length: u64, method: i16, decompressed_length: u64) -> Resource {
	let res = Resource::new(source.clone(), name, offset, length);
	match method {
		0 => res.with_exporter(Exporter::Xor {key: KEY}, length),
		_ => res.with_exporter(Exporter::DeflateXor {key: KEY}, decompressed_length)
	}
}

#[cfg(test)]
mod tests {
	use crate::{config::ParseConfig, cursor::Cursor, exporters::apply_xor, progress::NoProgress, validate::FieldValidator};
	use super::*;

	fn local_file(name: &str, contents: &[u8], deflate: bool) -> Vec<u8> {
		let stored = if deflate {
			Exporter::Deflate.pack(contents).unwrap()
		} else {
			contents.to_vec()
		};
		let mut out = b"PK".to_vec();
		out.extend(LOCAL_FILE.to_le_bytes());
		out.extend([0; 2]);
		out.extend((deflate as i16 * 8).to_le_bytes());
		out.extend([0; 8]);
		out.extend((stored.len() as i32).to_le_bytes());
		out.extend((contents.len() as i32).to_le_bytes());
		out.extend((name.len() as i16).to_le_bytes());
		out.extend(3i16.to_le_bytes());
		out.extend(name.as_bytes());
		out.extend(b"xyz");
		out.extend(stored);
		out
	}

	fn masked(mut data: Vec<u8>) -> Cursor {
		apply_xor(&mut data, KEY);
		Cursor::from_bytes(data).with_path("units.pak")
	}

	#[test]
	fn stored_and_deflated_entries() {
		let mut data = local_file("a.txt", b"plain", false);
		data.extend(local_file("b.txt", &[7; 300], true));
		data.extend(b"PK");
		data.extend(END_OF_DIRECTORY.to_le_bytes());
		data.extend([0; 16]);
		let mut cursor = masked(data);
		assert_eq!(PLUGIN_PAK_XOR.rate(&mut cursor, &FieldValidator::default()), 75);
		let archive = PLUGIN_PAK_XOR.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		assert_eq!(archive.resources.len(), 2);
		assert_eq!(archive.resources[1].name(), "b.txt");
		assert_eq!(archive.export(0).unwrap().unwrap(), b"plain");
		assert_eq!(archive.export(1).unwrap().unwrap(), vec![7; 300]);
	}

	#[test]
	fn unknown_record_keeps_enough_earlier_entries() {
		let garbage = b"PK\x09\x09\x09\x09 trailing junk";
		let mut data = Vec::new();
		for i in 0..5 {
			data.extend(local_file(&format!("{i}.dat"), b"data", false));
		}
		data.extend(garbage);
		let archive = PLUGIN_PAK_XOR.read(&mut masked(data), &ParseConfig::default(), &NoProgress).unwrap();
		assert_eq!(archive.resources.len(), 5);

		let mut data = local_file("only.dat", b"data", false);
		data.extend(garbage);
		assert!(PLUGIN_PAK_XOR.read(&mut masked(data), &ParseConfig::default(), &NoProgress).is_none());
	}
}
