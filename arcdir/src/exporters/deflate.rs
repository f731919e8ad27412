use std::io::Write;
use flate2::{write::{DeflateEncoder, ZlibEncoder}, Compression};
use zune_inflate::{DeflateDecoder, DeflateOptions};
use crate::error::ExportError;

pub fn inflate(raw: &[u8], expected: u64, zlib: bool) -> Result<Vec<u8>, ExportError> {
	let limit = usize::try_from(expected).map_err(|_| ExportError::LengthMismatch {expected, actual: 0})?;
	// one past the expected size, so overlong streams show up as a mismatch
	let options = DeflateOptions::default().set_limit(limit.saturating_add(1)).set_size_hint(limit);
	let mut decoder = DeflateDecoder::new_with_options(raw, options);
	let result = if zlib {
		decoder.decode_zlib()
	} else {
		decoder.decode_deflate()
	};
	result.map_err(|e| ExportError::Decode {codec: if zlib {"zlib"} else {"deflate"}, msg: format!("{e:?}")})
}

pub fn deflate(data: &[u8], zlib: bool) -> Result<Vec<u8>, ExportError> {
	if zlib {
		let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(data)?;
		Ok(encoder.finish()?)
	} else {
		let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(data)?;
		Ok(encoder.finish()?)
	}
}
