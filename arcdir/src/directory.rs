//! Directory shapes that recur across formats.

use std::path::{Path, PathBuf};
use bytes::Bytes;
use crate::{byte_slice::ByteSlice, cursor::Cursor, error::{ParseError, ValidationError}, resource::{Resource, SourceFile}, validate::FieldValidator};

/// One field of a fixed-width directory record. Integers are u32 LE.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordField {
	Offset,
	Length,
	DecompressedLength,
	/// Fixed-size name, cut at the first NUL.
	Name(usize),
	Skip(u64)
}

impl RecordField {
	const fn width(&self) -> u64 {
		match self {
			Self::Offset | Self::Length | Self::DecompressedLength => 4,
			Self::Name(len) => *len as u64,
			Self::Skip(len) => *len
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
	pub name: Option<String>,
	pub offset: Option<u64>,
	pub length: Option<u64>,
	pub decompressed_length: Option<u64>
}

impl Record {
	pub fn is_end_sentinel(&self, arc_size: u64) -> bool {
		self.offset == Some(arc_size) && self.length.unwrap_or(0) == 0
	}

	/// A plain resource; records without a name get a generated one and
	/// missing offsets or lengths read as zero.
	pub fn into_resource(self, source: &SourceFile, index: usize) -> Resource {
		Resource::new(
			source.clone(),
			self.name.unwrap_or_else(|| crate::resource::generate_name(index)),
			self.offset.unwrap_or(0),
			self.length.unwrap_or(0)
		)
	}
}

/// A directory made of identical fixed-width records, described as a table
/// of fields instead of hand-written reads.
#[derive(Clone, Copy, Debug)]
pub struct FlatLayout {
	fields: &'static [RecordField]
}

impl FlatLayout {
	pub const fn new(fields: &'static [RecordField]) -> Self {
		Self {fields}
	}

	pub fn record_len(&self) -> u64 {
		self.fields.iter().map(RecordField::width).sum()
	}

	/// Read one record at the cursor, validating every field against
	/// `arc_size` as it goes.
	pub fn read_record(&self, cursor: &mut Cursor, validator: &FieldValidator, arc_size: u64) -> Result<Record, ParseError> {
		let mut record = Record::default();
		for field in self.fields {
			match field {
				RecordField::Offset => record.offset = Some(validator.check_offset(cursor.read_u32()?, arc_size + 1)?),
				RecordField::Length => record.length = Some(validator.check_length(cursor.read_u32()?, arc_size)?),
				RecordField::DecompressedLength => record.decompressed_length = Some(validator.check_decompressed_length(cursor.read_u32()?)?),
				RecordField::Name(len) => {
					let name = cursor.read_fixed_string(*len)?;
					validator.check_filename(&name)?;
					record.name = Some(name);
				}
				RecordField::Skip(len) => cursor.skip(*len)?
			}
		}
		Ok(record)
	}

	/// Read `count` consecutive records, leaving out empty slots that point
	/// at the end of the archive. The whole table has to fit in what is left
	/// of the archive before anything is allocated for it.
	pub fn read_records(&self, cursor: &mut Cursor, validator: &FieldValidator, count: usize) -> Result<Vec<Record>, ParseError> {
		let arc_size = cursor.len();
		let table_len = self.record_len().saturating_mul(count as u64);
		validator.check_length(table_len, cursor.remaining())?;
		let mut records = Vec::with_capacity(count);
		for _ in 0..count {
			let record = self.read_record(cursor, validator, arc_size)?;
			if !record.is_end_sentinel(arc_size) {
				records.push(record);
			}
		}
		Ok(records)
	}
}

/// Lengths from successive offsets, for directories that only store where
/// each file starts. The last file runs to `end`.
pub fn assign_lengths_from_offsets(resources: &mut [Resource], end: u64, validator: &FieldValidator) -> Result<(), ValidationError> {
	let mut next = end;
	for res in resources.iter_mut().rev() {
		let length = validator.check_length(next as i64 - res.offset() as i64, end)?;
		res.set_length(length);
		next = res.offset();
	}
	Ok(())
}

/// Full paths for entries that name their parent by index. Empty names
/// (usually the root) add no component. A chain that comes back to an entry
/// it already passed through stops there.
pub fn resolve_parent_paths(names: &[String], parents: &[Option<usize>], sep: &str) -> Result<Vec<String>, ValidationError> {
	let mut out = Vec::with_capacity(names.len());
	// chain number that last visited each entry, plus one
	let mut seen = vec![0usize; names.len()];
	for i in 0..names.len() {
		let mut parts = Vec::new();
		let mut cur = Some(i);
		while let Some(idx) = cur {
			let name = names.get(idx).ok_or(ValidationError::Index {value: idx as i64, count: names.len()})?;
			if seen[idx] == i + 1 {
				break;
			}
			seen[idx] = i + 1;
			if !name.is_empty() {
				parts.push(name.as_str());
			}
			cur = parents.get(idx).copied().flatten();
		}
		parts.reverse();
		out.push(parts.join(sep));
	}
	Ok(out)
}

/// The file next to `path` with its extension swapped for `ext`, in either
/// case.
pub fn companion_path(path: &Path, ext: &str) -> Result<PathBuf, ParseError> {
	let lower = path.with_extension(ext.to_ascii_lowercase());
	if lower.is_file() {
		return Ok(lower);
	}
	let upper = path.with_extension(ext.to_ascii_uppercase());
	if upper.is_file() {
		return Ok(upper);
	}
	Err(ParseError::MissingCompanion(lower))
}

/// A buffered block of NUL-terminated names, looked up by offset once the
/// directory entries referring to it have all been read.
pub struct NameTable {
	buf: Bytes
}

impl NameTable {
	pub fn new(buf: impl Into<Bytes>) -> Self {
		Self {buf: buf.into()}
	}

	pub fn read(cursor: &mut Cursor, len: usize) -> Result<Self, ParseError> {
		Ok(Self::new(cursor.read_bytes(len)?))
	}

	pub fn len(&self) -> usize {
		self.buf.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buf.is_empty()
	}

	pub fn name_at(&self, offset: u64, validator: &FieldValidator) -> Result<String, ParseError> {
		let offset = validator.check_offset(offset as i64, self.buf.len() as u64)?;
		let name = self.buf.null_string_at(offset as usize, self.buf.len())?;
		validator.check_filename(&name)?;
		Ok(name)
	}
}
