use std::path::Path;
use crate::{error::ParseError, resource::{generate_name, Resource}, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["ifz"];
const STEM_PREFIX: &str = "RESOURCE";

pub const PLUGIN_IFZ: FormatPlugin = FormatPlugin {
	id: "ifz",
	desc: "IFZ resource archive",
	games: &["The Next Big Thing"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::READ_ONLY,
	rate: |cursor, v| {
		let mut rating = 0;
		if cursor.path().is_some_and(is_resource_file) {
			rating += 25;
		}
		if v.check_num_files(cursor.read_i32()?).is_ok() {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_ifz,
	guess_extension: |_| None,
	write: None
};

/// `RESOURCE.IFZ` and its numbered siblings: `.A##` and `.G##` below 99,
/// `.SP#` below 9.
fn is_resource_file(path: &Path) -> bool {
	let named = path.file_stem().and_then(|x| x.to_str()).is_some_and(|x| x.starts_with(STEM_PREFIX));
	let Some(ext) = path.extension().and_then(|x| x.to_str()).map(|x| x.to_ascii_lowercase()) else {
		return false;
	};
	let numbered = |digits: &str, limit: u32| digits.parse::<u32>().is_ok_and(|x| x < limit);
	named && (EXTENSIONS.contains(&ext.as_str()) || match ext.len() {
		3 if ext.starts_with("sp") => numbered(&ext[2..], 9),
		3 if ext.starts_with(['a', 'g']) => numbered(&ext[1..], 99),
		_ => false
	})
}

// 4 - directory length, four bytes per entry in each of two tables
// 4 * n - offsets
// 4 * n - lengths
//
// Slots can be empty, holding a zero length or an offset at the very end of
// the archive.
fn read_ifz(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	let declared = ctx.cursor.read_i32()? >> 2;
	let count = ctx.entry_count(declared, 8)?;
	ctx.progress.set_maximum(count as u64);
	let mut offsets = Vec::with_capacity(count);
	for _ in 0..count {
		let offset = ctx.cursor.read_u32()?;
		ctx.validator.check_offset(offset as i64 - 1, arc_size)?;
		offsets.push(offset as u64);
	}

	let mut resources = Vec::new();
	for (i, offset) in offsets.into_iter().enumerate() {
		let length = ctx.validator.check_length(ctx.cursor.read_u32()?, arc_size)?;
		ctx.progress.set_value(i as u64 + 1);
		if length == 0 || offset == arc_size {
			continue;
		}
		resources.push(Resource::new(source.clone(), generate_name(resources.len()), offset, length));
	}
	Ok(resources)
}
