use std::io::Write;
use crate::{error::ParseError, exporters::Exporter, resource::Resource, Capabilities, FormatPlugin, ReadContext};

const MAGIC: &[u8] = b"ZGWH";
const EXTENSIONS: &[&str] = &["mng"];

pub const PLUGIN_MNG_ZGWH: FormatPlugin = FormatPlugin {
	id: "mng_zgwh",
	desc: "ZGWH archive of zlib-compressed files",
	games: &["Hostile Waters"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::FULL,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		if cursor.read_bytes(4)? == MAGIC {
			rating += 50;
		}
		if v.check_num_files(cursor.read_u32()?).is_ok() {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_mng,
	guess_extension: |_| None,
	write: Some(write_mng)
};

fn read_mng(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	let cap = ctx.config.name_scan_cap;
	if ctx.cursor.read_bytes(4)? != MAGIC {
		return Err(ParseError::Mismatch("no ZGWH header"));
	}
	// shortest entry: one-char name, terminator, three u32s
	let declared = ctx.cursor.read_u32()?;
	let count = ctx.entry_count(declared, 14)?;
	ctx.progress.set_maximum(count as u64);
	let mut resources = Vec::with_capacity(count);
	for i in 0..count {
		let name = ctx.cursor.read_null_string(cap)?;
		ctx.validator.check_filename(&name)?;
		let length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		let decompressed_length = ctx.validator.check_decompressed_length(ctx.cursor.read_u32()?)?;
		let offset = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
		resources.push(Resource::new(source.clone(), name, offset, length).with_exporter(Exporter::Zlib, decompressed_length));
		ctx.progress.set_value(i as u64 + 1);
	}
	Ok(resources)
}

/// Directory first (name, compressed size, decompressed size, offset), then
/// every file's zlib stream in the same order.
fn write_mng(resources: &[Resource], out: &mut dyn Write) -> Result<(), ParseError> {
	let mut packed = Vec::with_capacity(resources.len());
	for res in resources {
		packed.push(Exporter::Zlib.pack(&res.exporter().export(res)?)?);
	}
	let directory_len = 8 + resources.iter().map(|x| 13 + x.name().len() as u64).sum::<u64>();
	out.write_all(MAGIC)?;
	out.write_all(&u32_field(resources.len() as u64)?.to_le_bytes())?;
	let mut offset = directory_len;
	for (res, data) in resources.iter().zip(&packed) {
		out.write_all(res.name().as_bytes())?;
		out.write_all(&[0])?;
		out.write_all(&u32_field(data.len() as u64)?.to_le_bytes())?;
		out.write_all(&u32_field(res.decompressed_length())?.to_le_bytes())?;
		out.write_all(&u32_field(offset)?.to_le_bytes())?;
		offset += data.len() as u64;
	}
	for data in &packed {
		out.write_all(data)?;
	}
	Ok(())
}

fn u32_field(value: u64) -> Result<u32, ParseError> {
	u32::try_from(value).map_err(|_| ParseError::Validation(crate::error::ValidationError::Range {
		value: value as i64,
		min: 0,
		max: u32::MAX as i64
	}))
}
