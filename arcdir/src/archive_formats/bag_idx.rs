use crate::{directory::companion_path, error::ParseError, resource::Resource, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["bag"];
const DIRECTORY_EXT: &str = "idx";
/// Length byte, one-character name, flags and two u32s.
const MIN_ENTRY_LEN: u64 = 12;

pub const PLUGIN_BAG_IDX: FormatPlugin = FormatPlugin {
	id: "bag_idx",
	desc: "BAG data file with its directory in a sibling IDX file",
	games: &["Nox"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::READ_ONLY,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		if cursor.path().is_some_and(|x| companion_path(x, DIRECTORY_EXT).is_ok()) {
			rating += 25;
		}
		Ok(rating)
	},
	read: read_bag,
	guess_extension: |_| None,
	write: None
};

// idx:
// 8 - unknown
// 4 - entry count
// 12 - unknown
// then groups of: 12 unknown, 4 entry count, entries of
//   1 - name length including this byte
//   X - name
//   2 - flags
//   4 - length
//   4 - length again
//
// The bag holds the files back to back in directory order.
fn read_bag(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	let mut idx = ctx.open_companion(DIRECTORY_EXT)?;
	idx.skip(8)?;
	let count = ctx.validator.check_num_files(idx.read_u32()?)?;
	idx.skip(12)?;
	ctx.validator.check_length(count as u64 * MIN_ENTRY_LEN, idx.remaining())?;
	ctx.progress.set_maximum(count as u64);

	let mut resources = Vec::with_capacity(count);
	let mut offset = 0;
	while resources.len() < count && idx.position() < idx.len() {
		idx.skip(12)?;
		let in_group = ctx.validator.check_range(idx.read_i32()?, 0, count as i64)?;
		for _ in 0..in_group {
			ctx.validator.check_index(resources.len() as i64, count)?;
			let name_len = ctx.validator.check_positive(idx.read_u8()? as i64 - 1)?;
			let name = idx.read_fixed_string(name_len as usize)?;
			idx.skip(2)?;
			let length = ctx.validator.check_length(idx.read_u32()?, arc_size)?;
			idx.skip(4)?;
			let start = ctx.validator.check_offset(offset, arc_size + 1)?;
			offset += length;
			resources.push(Resource::new(source.clone(), name, start, length));
			ctx.progress.set_value(resources.len() as u64);
		}
	}
	Ok(resources)
}

#[cfg(test)]
mod tests {
	use std::fs;
	use crate::{config::ParseConfig, progress::NoProgress};
	use super::*;

	fn entry(name: &str, length: u32) -> Vec<u8> {
		let mut out = vec![name.len() as u8 + 1];
		out.extend(name.as_bytes());
		out.extend([0; 2]);
		out.extend(length.to_le_bytes());
		out.extend(length.to_le_bytes());
		out
	}

	#[test]
	fn files_follow_each_other_in_directory_order() {
		let dir = tempfile::tempdir().unwrap();
		let mut idx = vec![0u8; 8];
		idx.extend(3u32.to_le_bytes());
		idx.extend([0; 12]);
		idx.extend([0; 12]);
		idx.extend(2u32.to_le_bytes());
		idx.extend(entry("intro.wav", 6));
		idx.extend(entry("click.wav", 0));
		idx.extend([0; 12]);
		idx.extend(1u32.to_le_bytes());
		idx.extend(entry("outro.wav", 4));
		fs::write(dir.path().join("audio.idx"), idx).unwrap();
		fs::write(dir.path().join("audio.bag"), b"aaaaaabbbb").unwrap();

		let archive = PLUGIN_BAG_IDX.read_path(dir.path().join("audio.bag"), &ParseConfig::default(), &NoProgress).unwrap();
		let res = &archive.resources;
		assert_eq!(res.len(), 3);
		assert_eq!((res[0].offset(), res[0].length()), (0, 6));
		assert_eq!((res[1].offset(), res[1].length()), (6, 0));
		assert_eq!((res[2].name(), res[2].offset(), res[2].length()), ("outro.wav", 6, 4));
		assert_eq!(archive.export(2).unwrap().unwrap(), b"bbbb");
	}

	#[test]
	fn missing_directory_file_is_not_a_match() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("lonely.bag");
		fs::write(&path, [0; 64]).unwrap();
		assert!(PLUGIN_BAG_IDX.read_path(&path, &ParseConfig::default(), &NoProgress).is_none());
	}

	#[test]
	fn empty_entry_at_the_end_is_dropped() {
		let dir = tempfile::tempdir().unwrap();
		let mut idx = vec![0u8; 8];
		idx.extend(2u32.to_le_bytes());
		idx.extend([0; 24]);
		idx.extend(2u32.to_le_bytes());
		idx.extend(entry("a.wav", 4));
		idx.extend(entry("gone.wav", 0));
		fs::write(dir.path().join("short.idx"), idx).unwrap();
		fs::write(dir.path().join("short.bag"), b"abcd").unwrap();

		let archive = PLUGIN_BAG_IDX.read_path(dir.path().join("short.bag"), &ParseConfig::default(), &NoProgress).unwrap();
		let summary = archive.resources.iter().map(|x| (x.name(), x.offset(), x.length())).collect::<Vec<_>>();
		assert_eq!(summary, [("a.wav", 0, 4)]);
	}
}
