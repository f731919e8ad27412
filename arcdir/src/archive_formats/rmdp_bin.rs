use crate::{directory::{companion_path, resolve_parent_paths, NameTable}, error::ParseError, resource::Resource, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["rmdp"];
const DIRECTORY_EXT: &str = "bin";
const TREE_START: u64 = 181;
const FOLDER_LEN: u64 = 28;
const FILE_LEN: u64 = 48;
/// Name of the folder every path starts from.
const ROOT: &str = "d:";

pub const PLUGIN_RMDP_BIN: FormatPlugin = FormatPlugin {
	id: "rmdp_bin",
	desc: "RMDP data file with its folder tree in a sibling BIN file",
	games: &["Alan Wake's American Nightmare"],
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
	read: read_rmdp,
	guess_extension: |_| None,
	write: None
};

// bin:
// 1 - version
// 4 - unknown
// 4 - folder count, including one not listed
// 4 - file count
// 8 - unknown
// 4 - name table length
// then from offset 181, folders, files and the name table.
//
// Folders and files both refer to their parent folder by index plus one.
fn read_rmdp(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	let mut bin = ctx.open_companion(DIRECTORY_EXT)?;
	bin.skip(5)?;
	let folder_count = ctx.validator.check_num_files(bin.read_i32()? as i64 - 1)?;
	let file_count = ctx.validator.check_num_files(bin.read_u32()?)?;
	bin.skip(8)?;
	let names_len = ctx.validator.check_length(bin.read_u32()?, bin.len())?;
	let names_start = TREE_START + (folder_count as u64 + 1) * FOLDER_LEN + file_count as u64 * FILE_LEN;
	let names = bin.with_position(names_start, |c| NameTable::read(c, names_len as usize))?;
	ctx.progress.set_maximum(file_count as u64);

	let parent = |raw: u32| raw.checked_sub(1).map(|x| x as usize).filter(|x| *x < folder_count);
	let mut paths = Vec::with_capacity(folder_count + file_count);
	let mut parents = Vec::with_capacity(folder_count + file_count);
	bin.seek(TREE_START)?;
	for _ in 0..folder_count {
		bin.skip(8)?;
		parents.push(parent(bin.read_u32()?));
		bin.skip(4)?;
		let name = names.name_at(bin.read_u32()? as u64, ctx.validator)?;
		paths.push(if name == ROOT { String::new() } else { name });
		bin.skip(8)?;
	}

	let mut resources = Vec::with_capacity(file_count);
	for i in 0..file_count {
		bin.skip(8)?;
		parents.push(parent(bin.read_u32()?));
		bin.skip(4)?;
		paths.push(names.name_at(bin.read_u32()? as u64, ctx.validator)?);
		let offset = ctx.validator.check_offset(bin.read_u64()?, arc_size + 1)?;
		let length = ctx.validator.check_length(bin.read_u64()?, arc_size)?;
		bin.skip(12)?;
		resources.push(Resource::new(source.clone(), "", offset, length));
		ctx.progress.set_value(i as u64 + 1);
	}

	let paths = resolve_parent_paths(&paths, &parents, "/")?;
	for (res, path) in resources.iter_mut().zip(paths.into_iter().skip(folder_count)) {
		res.set_name(path);
	}
	Ok(resources)
}

#[cfg(test)]
mod tests {
	use std::fs;
	use crate::{config::ParseConfig, progress::NoProgress};
	use super::*;

	fn record(parent: u32, name_offset: u32, tail: &[u8]) -> Vec<u8> {
		let mut out = vec![0; 8];
		out.extend(parent.to_le_bytes());
		out.extend([0; 4]);
		out.extend(name_offset.to_le_bytes());
		out.extend(tail);
		out
	}

	fn file(parent: u32, name_offset: u32, offset: u64, length: u64) -> Vec<u8> {
		let mut tail = offset.to_le_bytes().to_vec();
		tail.extend(length.to_le_bytes());
		tail.extend([0; 12]);
		record(parent, name_offset, &tail)
	}

	#[test]
	fn paths_are_built_from_the_folder_tree() {
		let names = b"d:\0data\0sfx\0menu.ogg\0readme.txt\0";
		let mut bin = vec![0u8; 5];
		bin.extend(4u32.to_le_bytes());
		bin.extend(2u32.to_le_bytes());
		bin.extend([0; 8]);
		bin.extend((names.len() as u32).to_le_bytes());
		bin.resize(TREE_START as usize, 0);
		bin.extend(record(0, 0, &[0; 8]));
		bin.extend(record(1, 3, &[0; 8]));
		bin.extend(record(2, 8, &[0; 8]));
		bin.extend(file(3, 12, 0, 4));
		bin.extend(file(1, 21, 4, 2));
		// unlisted folder
		bin.extend([0; FOLDER_LEN as usize]);
		bin.extend(names);

		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("game.bin"), bin).unwrap();
		fs::write(dir.path().join("game.rmdp"), b"OggSok").unwrap();
		let archive = PLUGIN_RMDP_BIN.read_path(dir.path().join("game.rmdp"), &ParseConfig::default(), &NoProgress).unwrap();
		let names = archive.resources.iter().map(|x| x.name()).collect::<Vec<_>>();
		assert_eq!(names, ["data/sfx/menu.ogg", "readme.txt"]);
		assert_eq!(archive.export(1).unwrap().unwrap(), b"ok");
	}

	#[test]
	fn empty_file_at_the_end_is_dropped() {
		let names = b"d:\0a.bin\0gone.bin\0";
		let mut bin = vec![0u8; 5];
		bin.extend(2u32.to_le_bytes());
		bin.extend(2u32.to_le_bytes());
		bin.extend([0; 8]);
		bin.extend((names.len() as u32).to_le_bytes());
		bin.resize(TREE_START as usize, 0);
		bin.extend(record(0, 0, &[0; 8]));
		bin.extend(file(1, 3, 0, 4));
		bin.extend(file(1, 9, 4, 0));
		bin.extend([0; FOLDER_LEN as usize]);
		bin.extend(names);

		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("tiny.bin"), bin).unwrap();
		fs::write(dir.path().join("tiny.rmdp"), b"abcd").unwrap();
		let archive = PLUGIN_RMDP_BIN.read_path(dir.path().join("tiny.rmdp"), &ParseConfig::default(), &NoProgress).unwrap();
		let summary = archive.resources.iter().map(|x| (x.name(), x.offset(), x.length())).collect::<Vec<_>>();
		assert_eq!(summary, [("a.bin", 0, 4)]);
	}
}
