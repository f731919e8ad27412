use crate::error::CursorError;

// bounds-checked reads for tables that were buffered in one go

macro_rules! impl_byte_readers {
	($($t:ident),*) => {paste::paste! {$(
		fn [<get_ $t _at>](&self, offset: usize) -> Option<$t> {
			Some(<$t>::from_le_bytes(self.get(offset..offset.checked_add(size_of::<$t>())?)?.try_into().ok()?))
		}
	)*}}
}

fn out_of_bounds(offset: usize, wanted: usize, len: usize) -> CursorError {
	CursorError::OutOfBounds {offset: offset as u64, wanted: wanted as u64, len: len as u64}
}

pub trait ByteSlice {
	fn get_u32_at(&self, offset: usize) -> Option<u32>;
	fn get_i16_at(&self, offset: usize) -> Option<i16>;

	/// The NUL-terminated string starting at `offset`, looking at most `cap`
	/// bytes ahead for the terminator.
	fn null_string_at(&self, offset: usize, cap: usize) -> Result<String, CursorError>;
}

impl ByteSlice for [u8] {
	impl_byte_readers!(u32, i16);

	fn null_string_at(&self, offset: usize, cap: usize) -> Result<String, CursorError> {
		let tail = self.get(offset..).ok_or_else(|| out_of_bounds(offset, 1, self.len()))?;
		let window = &tail[..tail.len().min(cap)];
		match window.iter().position(|x| *x == 0) {
			Some(end) => Ok(String::from_utf8_lossy(&window[..end]).into_owned()),
			None if window.len() == cap => Err(CursorError::Unterminated {offset: offset as u64, cap}),
			None => Err(out_of_bounds(offset, window.len() + 1, self.len()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn field_reads_are_bounds_checked() {
		let buf: &[u8] = &[0x34, 0x12, 0xFF, 0xFF];
		assert_eq!(buf.get_u32_at(0), Some(0xFFFF_1234));
		assert_eq!(buf.get_i16_at(2), Some(-1));
		assert_eq!(buf.get_u32_at(1), None);
		assert_eq!(buf.get_u32_at(usize::MAX), None);
	}

	#[test]
	fn null_strings_in_tables() {
		let table: &[u8] = b"data\0sound\0tail";
		assert_eq!(table.null_string_at(0, 64).unwrap(), "data");
		assert_eq!(table.null_string_at(5, 64).unwrap(), "sound");
		assert!(matches!(table.null_string_at(11, 64), Err(CursorError::OutOfBounds {..})));
		assert!(matches!(table.null_string_at(5, 3), Err(CursorError::Unterminated {cap: 3, ..})));
		assert!(table.null_string_at(99, 8).is_err());
	}
}
