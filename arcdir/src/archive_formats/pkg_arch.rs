use crate::{error::ParseError, exporters::Exporter, resource::Resource, Capabilities, FormatPlugin, ReadContext};

const MAGIC: &[u8] = b"ARCH";
const EXTENSIONS: &[&str] = &["pkg"];
/// Fixed part of an entry, ahead of its UTF-16 name.
const ENTRY_LEN: u64 = 24;

pub const PLUGIN_PKG_ARCH: FormatPlugin = FormatPlugin {
	id: "pkg_arch",
	desc: "ARCH package with a trailing directory and UTF-16 names",
	games: &["Metal Heart: Replicants Rampage"],
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
		cursor.skip(12)?;
		if v.check_equals(cursor.read_u32()?, cursor.len()).is_ok() {
			rating += 5;
		}
		if v.check_offset(cursor.read_u32()?, cursor.len()).is_ok() {
			rating += 5;
		}
		cursor.skip(4)?;
		if v.check_num_files(cursor.read_i16()?).is_ok() {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_pkg,
	guess_extension: |_| None,
	write: None
};

// 4 - magic
// 2 - version
// 10 - unknown
// 4 - archive length
// 4 - directory length, the directory ending the archive
// 4 - unknown
// 2 - entry count
fn read_pkg(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	ctx.cursor.skip(20)?;
	let dir_offset = ctx.validator.check_offset(arc_size as i64 - ctx.cursor.read_u32()? as i64, arc_size)?;
	ctx.cursor.skip(4)?;
	let declared = ctx.cursor.read_i16()?;
	ctx.cursor.seek(dir_offset)?;
	let count = ctx.entry_count(declared, ENTRY_LEN)?;
	ctx.progress.set_maximum(count as u64);

	let mut resources = Vec::with_capacity(count);
	for i in 0..count {
		ctx.cursor.skip(8)?;
		let length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		let decompressed_length = ctx.cursor.read_u32()? as u64;
		let offset = ctx.cursor.read_u32()?;
		let name_len = ctx.validator.check_filename_length(ctx.cursor.read_i16()?)?;
		ctx.cursor.skip(2)?;
		let name = ctx.cursor.read_utf16_string(name_len)?;
		ctx.validator.check_filename(&name)?;
		ctx.progress.set_value(i as u64 + 1);
		// folders have all-ones offsets and no data
		if length == 0 {
			continue;
		}
		let offset = ctx.validator.check_offset(offset, arc_size)?;
		let res = Resource::new(source.clone(), name, offset, length);
		resources.push(if length == decompressed_length {
			res
		} else {
			res.with_exporter(Exporter::Zlib, decompressed_length)
		});
	}
	Ok(resources)
}

#[cfg(test)]
mod tests {
	use crate::{config::ParseConfig, cursor::Cursor, progress::NoProgress, validate::FieldValidator};
	use super::*;

	fn entry(name: &str, length: u32, decompressed_length: u32, offset: u32) -> Vec<u8> {
		let mut out = vec![0; 8];
		for x in [length, decompressed_length, offset] {
			out.extend(x.to_le_bytes());
		}
		out.extend((name.len() as i16).to_le_bytes());
		out.extend([0; 2]);
		out.extend(name.encode_utf16().flat_map(|x| x.to_le_bytes()));
		out
	}

	#[test]
	fn folders_are_skipped_and_sizes_pick_the_exporter() {
		let packed = Exporter::Zlib.pack(&[1; 64]).unwrap();
		let mut data = b"ARCH".to_vec();
		data.resize(30, 0);
		data.extend(b"raw");
		data.extend(&packed);
		let mut dir = entry("maps", 0, 0, u32::MAX);
		dir.extend(entry("maps/x.raw", 3, 3, 30));
		dir.extend(entry("maps/y.bin", packed.len() as u32, 64, 33));
		data.extend(&dir);
		let total = data.len() as u32;
		data[16..20].copy_from_slice(&total.to_le_bytes());
		data[20..24].copy_from_slice(&(dir.len() as u32).to_le_bytes());
		data[28..30].copy_from_slice(&3i16.to_le_bytes());

		let mut cursor = Cursor::from_bytes(data).with_path("data.pkg");
		assert_eq!(PLUGIN_PKG_ARCH.rate(&mut cursor, &FieldValidator::default()), 95);
		let archive = PLUGIN_PKG_ARCH.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		assert_eq!(archive.resources.len(), 2);
		assert_eq!(archive.resources[0].exporter().name(), "identity");
		assert_eq!(archive.resources[1].name(), "maps/y.bin");
		assert_eq!(archive.export(0).unwrap().unwrap(), b"raw");
		assert_eq!(archive.export(1).unwrap().unwrap(), vec![1; 64]);
	}
}
