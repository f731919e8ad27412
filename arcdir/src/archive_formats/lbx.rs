use crate::{directory::assign_lengths_from_offsets, error::ParseError, resource::{generate_name, Resource}, Capabilities, FormatPlugin, ReadContext};

const EXTENSIONS: &[&str] = &["lbx"];

/// The one archive whose directory points at a name table.
const NAMED_ARCHIVE: &str = "sound.lbx";
const NAME_LEN: usize = 20;

pub const PLUGIN_LBX: FormatPlugin = FormatPlugin {
	id: "lbx",
	desc: "LBX offset-table archive",
	games: &["Master of Orion", "Master of Magic"],
	extensions: EXTENSIONS,
	platforms: &["PC"],
	capabilities: Capabilities::READ_ONLY,
	rate: |cursor, v| {
		let mut rating = 0;
		if v.check_extension(cursor, EXTENSIONS) {
			rating += 25;
		}
		if v.check_num_files(cursor.read_u16()?).is_ok() {
			rating += 5;
		}
		cursor.skip(4)?;
		if cursor.read_u16()? == 0 {
			rating += 5;
		}
		if cursor.read_u32()? == 2048 {
			rating += 5;
		}
		Ok(rating)
	},
	read: read_lbx,
	guess_extension: |_| None,
	write: None
};

// 2 - entry count
// 2 - unknown
// 4 - null
// 4 * n - offsets
// 4 - archive length, or 0 for the file length
fn read_lbx(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
	let arc_size = ctx.arc_size();
	let source = ctx.source();
	let declared = ctx.cursor.read_u16()?;
	ctx.cursor.skip(6)?;
	let mut count = ctx.entry_count(declared, 4)?;
	let named = ctx.cursor.path()
		.and_then(|x| x.file_name())
		.is_some_and(|x| x.eq_ignore_ascii_case(NAMED_ARCHIVE));
	let names = if named {
		let table_offset = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
		let names = ctx.cursor.with_position(table_offset, |c| {
			(0..count).map(|_| c.read_fixed_string(NAME_LEN)).collect::<Result<Vec<_>, _>>()
		})?;
		// the first offset slot held the name table pointer
		count = count.saturating_sub(1);
		Some(names)
	} else {
		None
	};
	ctx.progress.set_maximum(count as u64);
	let mut resources = Vec::with_capacity(count);
	for i in 0..count {
		let offset = ctx.validator.check_offset(ctx.cursor.read_u32()?, arc_size)?;
		let name = match &names {
			Some(names) => names[i].clone(),
			None => generate_name(i)
		};
		resources.push(Resource::new(source.clone(), name, offset, 0));
		ctx.progress.set_value(i as u64 + 1);
	}
	let end = match ctx.cursor.read_u32()? {
		0 => arc_size,
		declared => ctx.validator.check_length(declared, arc_size)?
	};
	assign_lengths_from_offsets(&mut resources, end, ctx.validator)?;
	Ok(resources)
}

#[cfg(test)]
mod tests {
	use crate::{config::ParseConfig, cursor::Cursor, progress::NoProgress};
	use super::*;

	fn lbx(offsets: &[u32], total: u32) -> Vec<u8> {
		let mut data = Vec::new();
		data.extend((offsets.len() as u16).to_le_bytes());
		data.extend([0xAD, 0xFE, 0, 0, 0, 0]);
		for x in offsets {
			data.extend(x.to_le_bytes());
		}
		data.extend(total.to_le_bytes());
		data.resize(total as usize, 0);
		data
	}

	#[test]
	fn names_come_from_the_table_in_sound_lbx() {
		let mut data = vec![0u8; 200];
		data[0..2].copy_from_slice(&3u16.to_le_bytes());
		// name table pointer, two offsets, archive length
		for (i, x) in [100u32, 40, 70, 200].into_iter().enumerate() {
			data[8 + i * 4..12 + i * 4].copy_from_slice(&x.to_le_bytes());
		}
		data[100..105].copy_from_slice(b"boom\0");
		data[120..124].copy_from_slice(b"zap\0");
		let mut cursor = Cursor::from_bytes(data).with_path("GAME/SOUND.LBX");
		let archive = PLUGIN_LBX.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		let names = archive.resources.iter().map(|x| x.name()).collect::<Vec<_>>();
		assert_eq!(names, ["boom", "zap"]);
		assert_eq!(archive.resources[0].length(), 30);
		assert_eq!(archive.resources[1].length(), 130);
	}

	#[test]
	fn other_archives_get_generated_names() {
		let mut cursor = Cursor::from_bytes(lbx(&[20, 50], 90)).with_path("fonts.lbx");
		let archive = PLUGIN_LBX.read(&mut cursor, &ParseConfig::default(), &NoProgress).unwrap();
		assert_eq!(archive.resources[0].name(), "file_0");
		assert_eq!(archive.resources[1].length(), 40);
	}

	#[test]
	fn declared_length_past_end_is_rejected() {
		let mut data = lbx(&[40, 60], 100);
		data[16..20].copy_from_slice(&5000u32.to_le_bytes());
		let mut cursor = Cursor::from_bytes(data).with_path("x.lbx");
		assert!(PLUGIN_LBX.read(&mut cursor, &ParseConfig::default(), &NoProgress).is_none());
	}
}
