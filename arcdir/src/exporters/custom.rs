use crate::error::ExportError;

/// Format-specific transform that doesn't fit the built-in exporters.
pub trait Codec: Send + Sync {
	fn name(&self) -> &'static str;

	/// Turn `raw` stored bytes into `expected_len` decoded bytes.
	fn decode(&self, raw: Vec<u8>, expected_len: u64) -> Result<Vec<u8>, ExportError>;

	fn encode(&self, _data: &[u8]) -> Result<Vec<u8>, ExportError> {
		Err(ExportError::PackUnsupported(self.name()))
	}
}

/// WAV files stored with the first byte of `RIFF` zeroed out.
pub struct WavHeaderFix;

impl Codec for WavHeaderFix {
	fn name(&self) -> &'static str {
		"wav-header-fix"
	}

	fn decode(&self, mut raw: Vec<u8>, _expected_len: u64) -> Result<Vec<u8>, ExportError> {
		if let Some(first) = raw.first_mut() {
			*first = b'R';
		}
		Ok(raw)
	}

	fn encode(&self, data: &[u8]) -> Result<Vec<u8>, ExportError> {
		let mut out = data.to_vec();
		if let Some(first) = out.first_mut() {
			*first = 0;
		}
		Ok(out)
	}
}
