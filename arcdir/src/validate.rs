//! Plausibility checks for fields read out of archive directories.
//!
//! Every check either hands back the value (converted to the type the caller
//! goes on to use) or a [`ValidationError`]. Failing a check only means "not
//! this format"; nothing here panics or allocates on behalf of the input.

use crate::{config::ParseConfig, cursor::Cursor, error::ValidationError};

/// Any integer read from a directory, widened for checking. Unsigned values
/// past `i64::MAX` saturate; no bound admits them anyway.
pub trait FieldValue: Copy {
	fn to_field(self) -> i64;
}

macro_rules! impl_field_value {
	($($t:ty),*) => {$(
		impl FieldValue for $t {
			fn to_field(self) -> i64 {
				i64::try_from(self).unwrap_or(i64::MAX)
			}
		}
	)*};
}

impl_field_value!(u8, u16, u32, u64, usize, i8, i16, i32, i64);

#[derive(Clone, Debug)]
pub struct FieldValidator {
	max_files: usize,
	max_filename_len: usize,
	max_dimension: u32
}

impl Default for FieldValidator {
	fn default() -> Self {
		Self::new(&ParseConfig::default())
	}
}

impl FieldValidator {
	pub fn new(config: &ParseConfig) -> Self {
		Self {
			max_files: config.max_files,
			max_filename_len: config.max_filename_len,
			max_dimension: config.max_image_dimension
		}
	}

	pub fn max_files(&self) -> usize {
		self.max_files
	}

	/// Case-insensitive extension match. Only ever worth points when rating.
	pub fn check_extension(&self, cursor: &Cursor, allowed: &[&str]) -> bool {
		cursor.extension().is_some_and(|ext| allowed.iter().any(|x| x.eq_ignore_ascii_case(&ext)))
	}

	pub fn check_num_files(&self, value: impl FieldValue) -> Result<usize, ValidationError> {
		let value = value.to_field();
		if value < 0 || value as u64 > self.max_files as u64 {
			return Err(ValidationError::NumFiles {value, max: self.max_files as u64});
		}
		Ok(value as usize)
	}

	/// `0 <= offset < bound`. Pass `arc_size + 1` to admit an offset sitting
	/// exactly at the end of the archive.
	pub fn check_offset(&self, value: impl FieldValue, bound: u64) -> Result<u64, ValidationError> {
		let value = value.to_field();
		if value < 0 || value as u64 >= bound {
			return Err(ValidationError::Offset {value, bound});
		}
		Ok(value as u64)
	}

	/// `0 <= length <= bound`.
	pub fn check_length(&self, value: impl FieldValue, bound: u64) -> Result<u64, ValidationError> {
		let value = value.to_field();
		if value < 0 || value as u64 > bound {
			return Err(ValidationError::Length {value, bound});
		}
		Ok(value as u64)
	}

	/// Decompressed sizes have no archive to be bounded by, only a sign.
	pub fn check_decompressed_length(&self, value: impl FieldValue) -> Result<u64, ValidationError> {
		let value = value.to_field();
		if value < 0 {
			return Err(ValidationError::Length {value, bound: i64::MAX as u64});
		}
		Ok(value as u64)
	}

	pub fn check_extent(&self, offset: u64, length: u64, bound: u64) -> Result<(), ValidationError> {
		match offset.checked_add(length) {
			Some(end) if end <= bound => Ok(()),
			_ => Err(ValidationError::Extent {offset, length, bound})
		}
	}

	/// `min <= value <= max`.
	pub fn check_range(&self, value: impl FieldValue, min: i64, max: i64) -> Result<i64, ValidationError> {
		let value = value.to_field();
		if value < min || value > max {
			return Err(ValidationError::Range {value, min, max});
		}
		Ok(value)
	}

	/// `0 <= value < count`, for indexing into tables read earlier.
	pub fn check_index(&self, value: impl FieldValue, count: usize) -> Result<usize, ValidationError> {
		let value = value.to_field();
		if value < 0 || value as u64 >= count as u64 {
			return Err(ValidationError::Index {value, count});
		}
		Ok(value as usize)
	}

	/// Rejects names that are empty, too long, or contain control characters,
	/// which is what binary data misread as a name tends to look like.
	pub fn check_filename(&self, name: &str) -> Result<(), ValidationError> {
		if name.is_empty() || name.len() > self.max_filename_len || name.chars().any(|c| c.is_control() || c == '\u{FFFD}') {
			return Err(ValidationError::Filename(name.chars().take(64).collect()));
		}
		Ok(())
	}

	pub fn check_filename_length(&self, value: impl FieldValue) -> Result<usize, ValidationError> {
		let value = value.to_field();
		if value <= 0 || value as u64 > self.max_filename_len as u64 {
			return Err(ValidationError::FilenameLength {value, max: self.max_filename_len});
		}
		Ok(value as usize)
	}

	pub fn check_width(&self, value: impl FieldValue) -> Result<u32, ValidationError> {
		self.check_dimension("width", value.to_field())
	}

	pub fn check_height(&self, value: impl FieldValue) -> Result<u32, ValidationError> {
		self.check_dimension("height", value.to_field())
	}

	fn check_dimension(&self, what: &'static str, value: i64) -> Result<u32, ValidationError> {
		if value <= 0 || value > self.max_dimension as i64 {
			return Err(ValidationError::Dimension {what, value, max: self.max_dimension});
		}
		Ok(value as u32)
	}

	pub fn check_equals(&self, found: impl FieldValue, expected: impl FieldValue) -> Result<(), ValidationError> {
		let (found, expected) = (found.to_field(), expected.to_field());
		if found != expected {
			return Err(ValidationError::NotEqual {expected, found});
		}
		Ok(())
	}

	pub fn check_positive(&self, value: impl FieldValue) -> Result<u64, ValidationError> {
		let value = value.to_field();
		if value <= 0 {
			return Err(ValidationError::NotPositive(value));
		}
		Ok(value as u64)
	}
}
