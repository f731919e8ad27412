use crate::{error::ParseError, resource::Resource, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["pbo"];
/// Trailing fields of the empty entry closing the directory.
const TERMINATOR_LEN: u64 = 20;

pub const PLUGIN_PBO: FormatPlugin = FormatPlugin {
	id: "pbo",
	desc: "PBO mission and addon package",
	games: &["ArmA: Cold War Assault", "Operation Flashpoint"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::READ_ONLY,
	rate: |cursor, v| Ok(if v.check_extension(cursor, EXTENSIONS) { 25 } else { 0 }),
	read: read_pbo,
	guess_extension: |_| None,
	write: None
};

// Entries of: name (null), 16 unknown, 4 length. An empty name ends the
// directory and the files follow it in the same order.
fn read_pbo(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	let cap = ctx.config.name_scan_cap;
	ctx.progress.set_maximum(arc_size);
	let mut resources = Vec::new();
	let data_start = loop {
		let name = ctx.cursor.read_null_string(cap)?;
		if name.is_empty() {
			break ctx.cursor.position() + TERMINATOR_LEN;
		}
		ctx.check_entry_budget(resources.len())?;
		ctx.validator.check_filename(&name)?;
		ctx.cursor.skip(16)?;
		let length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		resources.push(Resource::new(source.clone(), name, 0, length));
		ctx.progress.set_value(ctx.cursor.position());
	};

	let mut offset = data_start;
	for res in &mut resources {
		res.set_offset(ctx.validator.check_offset(offset, arc_size + 1)?);
		offset += res.length();
	}
	Ok(resources)
}

#[cfg(test)]
mod tests {
	use crate::{config::ParseConfig, cursor::Cursor, progress::NoProgress};
	use super::*;

	#[test]
	fn offsets_accumulate_after_the_directory() {
		let mut data = Vec::new();
		for (name, length) in [("config.cpp", 3u32), ("mission.sqm", 4)] {
			data.extend(name.as_bytes());
			data.push(0);
			data.extend([0; 16]);
			data.extend(length.to_le_bytes());
		}
		data.push(0);
		data.extend([0; 20]);
		let start = data.len() as u64;
		data.extend(b"cppsqm!");
		let mut cursor = Cursor::from_bytes(data).with_path("mission.pbo");
		let archive = PLUGIN_PBO.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		assert_eq!(archive.resources[0].offset(), start);
		assert_eq!(archive.resources[1].offset(), start + 3);
		assert_eq!(archive.export(1).unwrap().unwrap(), b"sqm!");
	}

	#[test]
	fn lengths_past_the_end_fail() {
		let mut data = b"big.paa\0".to_vec();
		data.extend([0; 16]);
		data.extend(90u32.to_le_bytes());
		data.push(0);
		data.extend([0; 20]);
		data.extend([1; 80]);
		let mut cursor = Cursor::from_bytes(data).with_path("addon.pbo");
		assert!(PLUGIN_PBO.read(&mut cursor, &ParseConfig::default(), &NoProgress).is_none());
	}

	#[test]
	fn empty_entry_at_the_end_is_dropped() {
		let mut data = Vec::new();
		for (name, length) in [("init.sqs", 3u32), ("unused.sqs", 0)] {
			data.extend(name.as_bytes());
			data.push(0);
			data.extend([0; 16]);
			data.extend(length.to_le_bytes());
		}
		data.push(0);
		data.extend([0; 20]);
		data.extend(b"sqs");
		let mut cursor = Cursor::from_bytes(data).with_path("intro.pbo");
		let archive = PLUGIN_PBO.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		let names = archive.resources.iter().map(|x| x.name()).collect::<Vec<_>>();
		assert_eq!(names, ["init.sqs"]);
	}
}
