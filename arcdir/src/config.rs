use std::{fs::File, io::BufReader, path::Path};
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// Limits and heuristics applied while rating and reading archives.
///
/// Archive headers are untrusted: every count, length and name goes through
/// these ceilings before anything is allocated for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
	/// Largest entry count a header may declare.
	pub max_files: usize,
	/// Longest filename accepted from a directory.
	pub max_filename_len: usize,
	/// Largest image width or height accepted from a directory.
	pub max_image_dimension: u32,
	/// Entries that must already be parsed before a mid-directory failure is
	/// tolerated and the partial set returned. `None` always fails the parse.
	///
	/// This is a heuristic: a damaged tail can still hide entries, and a
	/// wrong format can still produce a handful of plausible ones.
	pub partial_threshold: Option<usize>,
	/// Cap for null-terminated names that have no declared length.
	pub name_scan_cap: usize
}

impl Default for ParseConfig {
	fn default() -> Self {
		Self {
			max_files: 1_000_000,
			max_filename_len: 512,
			max_image_dimension: 16384,
			partial_threshold: Some(5),
			name_scan_cap: 512
		}
	}
}

impl ParseConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_files == 0 {
			return Err(ConfigError::Zero("max_files"));
		}
		if self.max_filename_len == 0 {
			return Err(ConfigError::Zero("max_filename_len"));
		}
		if self.max_image_dimension == 0 {
			return Err(ConfigError::Zero("max_image_dimension"));
		}
		if self.name_scan_cap == 0 {
			return Err(ConfigError::Zero("name_scan_cap"));
		}
		if self.partial_threshold == Some(0) {
			return Err(ConfigError::ZeroThreshold);
		}
		Ok(())
	}

	/// Parse a JSON config; missing keys keep their defaults.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
		config.validate()?;
		Ok(config)
	}
}
