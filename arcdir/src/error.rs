//! Error taxonomy shared by the cursor, the validator, exporters and plugins.
//!
//! Plugins never surface these to the registry: rating turns any error into a
//! score of zero and reading turns it into `None` after logging.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Failures of the byte cursor itself.
#[derive(Debug, Error)]
pub enum CursorError {
	#[error("read of {wanted} bytes at offset {offset} runs past end of data ({len} bytes)")]
	OutOfBounds {
		offset: u64,
		wanted: u64,
		len: u64
	},

	#[error("seek to {target} is outside of data ({len} bytes)")]
	BadSeek {
		target: i128,
		len: u64
	},

	#[error("no string terminator within {cap} bytes at offset {offset}")]
	Unterminated {
		offset: u64,
		cap: usize
	},

	#[error("io: {0}")]
	Io(#[from] io::Error)
}

/// A field read from an archive failed a plausibility check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	#[error("entry count {value} outside 0..={max}")]
	NumFiles {
		value: i64,
		max: u64
	},

	#[error("offset {value} outside 0..{bound}")]
	Offset {
		value: i64,
		bound: u64
	},

	#[error("length {value} outside 0..={bound}")]
	Length {
		value: i64,
		bound: u64
	},

	#[error("extent {offset}+{length} ends past {bound}")]
	Extent {
		offset: u64,
		length: u64,
		bound: u64
	},

	#[error("value {value} outside {min}..={max}")]
	Range {
		value: i64,
		min: i64,
		max: i64
	},

	#[error("index {value} outside 0..{count}")]
	Index {
		value: i64,
		count: usize
	},

	#[error("implausible filename {0:?}")]
	Filename(String),

	#[error("filename length {value} outside 1..={max}")]
	FilenameLength {
		value: i64,
		max: usize
	},

	#[error("{what} {value} outside 1..={max}")]
	Dimension {
		what: &'static str,
		value: i64,
		max: u32
	},

	#[error("expected {expected}, found {found}")]
	NotEqual {
		expected: i64,
		found: i64
	},

	#[error("expected a positive value, found {0}")]
	NotPositive(i64)
}

/// Failures while decoding or encoding resource bytes.
#[derive(Debug, Error)]
pub enum ExportError {
	#[error("{codec} decoding failed: {msg}")]
	Decode {
		codec: &'static str,
		msg: String
	},

	#[error("expected {expected} decoded bytes, got {actual}")]
	LengthMismatch {
		expected: u64,
		actual: u64
	},

	#[error("source ended {missing} bytes early")]
	Truncated {
		missing: u64
	},

	#[error("{0} cannot pack data")]
	PackUnsupported(&'static str),

	#[error("no resource is open")]
	NotOpen,

	#[error("io: {0}")]
	Io(#[from] io::Error)
}

/// Everything that can make a plugin abandon an archive.
#[derive(Debug, Error)]
pub enum ParseError {
	#[error("not this format: {0}")]
	Mismatch(&'static str),

	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error(transparent)]
	Cursor(#[from] CursorError),

	#[error("companion file {} not found", .0.display())]
	MissingCompanion(PathBuf),

	#[error("more than {0} entries")]
	TooManyEntries(usize),

	#[error("unknown entry type {kind} at offset {offset}")]
	UnknownEntry {
		kind: i64,
		offset: u64
	},

	#[error("format does not support writing")]
	WriteUnsupported,

	#[error(transparent)]
	Export(#[from] ExportError),

	#[error("io: {0}")]
	Io(#[from] io::Error)
}

impl ParseError {
	/// True when the failure came from the filesystem rather than from the
	/// archive contents.
	pub fn is_io(&self) -> bool {
		matches!(self, Self::Io(_) | Self::Cursor(CursorError::Io(_)) | Self::Export(ExportError::Io(_)))
	}
}

/// Invalid [`crate::config::ParseConfig`] values.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("{0} must be > 0")]
	Zero(&'static str),

	#[error("partial threshold must be > 0 when set")]
	ZeroThreshold,

	#[error("config: {0}")]
	Json(#[from] serde_json::Error),

	#[error("io: {0}")]
	Io(#[from] io::Error)
}
