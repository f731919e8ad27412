use std::{io::Write, path::Path};
use tracing::{debug, error, info, warn};
use config::ParseConfig;
use cursor::Cursor;
use error::{ExportError, ParseError};
use guess::HeaderSample;
use progress::{Progress, ProgressSink};
use resource::{Resource, SourceFile};
use validate::{FieldValidator, FieldValue};

pub mod config;
pub mod error;
pub mod cursor;
pub mod byte_slice;
pub mod validate;
pub mod resource;
pub mod exporters;
pub mod directory;
pub mod guess;
pub mod progress;
mod archive_formats;
pub use archive_formats::ARCHIVE_PLUGINS;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
	pub read: bool,
	pub write: bool,
	/// Resources can be swapped in place through their replace hooks.
	pub replace: bool,
	pub rename: bool
}

impl Capabilities {
	pub const READ_ONLY: Self = Self {read: true, write: false, replace: false, rename: false};
	pub const REPLACE: Self = Self {read: true, write: false, replace: true, rename: false};
	pub const FULL: Self = Self {read: true, write: true, replace: true, rename: true};
}

/// One archive format: static metadata plus the functions that recognize
/// and read it.
#[derive(Clone, Copy)]
pub struct FormatPlugin {
	id: &'static str,
	desc: &'static str,
	games: &'static [&'static str],
	extensions: &'static [&'static str],
	platforms: &'static [&'static str],
	capabilities: Capabilities,
	rate: fn(cursor: &mut Cursor, validator: &FieldValidator) -> Result<u32, ParseError>,
	read: fn(ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError>,
	guess_extension: fn(sample: &HeaderSample) -> Option<&'static str>,
	write: Option<fn(resources: &[Resource], out: &mut dyn Write) -> Result<(), ParseError>>
}

impl std::fmt::Debug for FormatPlugin {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.id)
	}
}

impl FormatPlugin {
	pub fn id(&self) -> &'static str {
		self.id
	}

	pub fn desc(&self) -> &'static str {
		self.desc
	}

	pub fn games(&self) -> &'static [&'static str] {
		self.games
	}

	pub fn extensions(&self) -> &'static [&'static str] {
		self.extensions
	}

	pub fn platforms(&self) -> &'static [&'static str] {
		self.platforms
	}

	pub fn capabilities(&self) -> Capabilities {
		self.capabilities
	}

	/// Confidence that the cursor holds this format. Anything going wrong
	/// while looking just means a score of zero. The cursor is left at
	/// offset 0 for whoever rates next.
	pub fn rate(&self, cursor: &mut Cursor, validator: &FieldValidator) -> u32 {
		cursor.reset();
		let score = match (self.rate)(cursor, validator) {
			Ok(score) => score,
			Err(e) => {
				debug!("{} ruled out: {e}", self.id);
				0
			}
		};
		cursor.reset();
		score
	}

	/// Parse the directory, keeping the reason for failure. Every resource
	/// handed back lies within its source; empty slots at the end of the
	/// file are left out.
	pub fn try_read(&self, ctx: &mut ReadContext) -> Result<Vec<Resource>, ParseError> {
		ctx.cursor.reset();
		let resources = (self.read)(ctx);
		ctx.cursor.reset();
		let mut resources = resources?;
		resources.retain(|x| !x.is_end_sentinel());
		for res in &resources {
			let bound = res.source().len();
			ctx.validator.check_extent(res.offset(), res.length(), bound)?;
			if let exporters::Exporter::Blocks(blocks) = res.exporter() {
				for block in blocks.blocks() {
					ctx.validator.check_extent(block.offset, block.length, bound)?;
				}
			}
		}
		Ok(resources)
	}

	/// Parse the directory, or log why not and give up.
	pub fn read(&self, cursor: &mut Cursor, config: &ParseConfig, progress: &dyn ProgressSink) -> Option<Archive> {
		let validator = FieldValidator::new(config);
		let mut ctx = ReadContext::new(cursor, &validator, config, progress);
		match self.try_read(&mut ctx) {
			Ok(resources) => {
				debug!("{} read {} resources", self.id, resources.len());
				Some(Archive {format: self.id, resources: resources.into()})
			}
			Err(e) if e.is_io() => {
				error!("could not read archive with {}: {e}", self.id);
				None
			}
			Err(e) => {
				warn!("{} abandoned archive: {e}", self.id);
				None
			}
		}
	}

	pub fn read_path(&self, path: impl AsRef<Path>, config: &ParseConfig, progress: &dyn ProgressSink) -> Option<Archive> {
		let path = path.as_ref();
		match Cursor::open(path) {
			Ok(mut cursor) => self.read(&mut cursor, config, progress),
			Err(e) => {
				error!("could not read archive {}: {e}", path.display());
				None
			}
		}
	}

	pub fn guess_extension(&self, sample: &HeaderSample) -> Option<&'static str> {
		(self.guess_extension)(sample)
	}

	/// Serialize `resources` as a new archive of this format.
	pub fn write(&self, resources: &[Resource], out: &mut dyn Write) -> Result<(), ParseError> {
		match self.write {
			Some(write) => write(resources, out),
			None => Err(ParseError::WriteUnsupported)
		}
	}
}

/// Everything a plugin's read function gets to work with, for one attempt.
pub struct ReadContext<'a> {
	pub cursor: &'a mut Cursor,
	pub validator: &'a FieldValidator,
	pub config: &'a ParseConfig,
	pub progress: Progress<'a>
}

impl<'a> ReadContext<'a> {
	pub fn new(cursor: &'a mut Cursor, validator: &'a FieldValidator, config: &'a ParseConfig, progress: &'a dyn ProgressSink) -> Self {
		Self {cursor, validator, config, progress: Progress::new(progress)}
	}

	pub fn arc_size(&self) -> u64 {
		self.cursor.len()
	}

	pub fn source(&self) -> SourceFile {
		self.cursor.source()
	}

	/// Open the sibling file holding this archive's directory or data.
	pub fn open_companion(&self, ext: &str) -> Result<Cursor, ParseError> {
		let Some(path) = self.cursor.path() else {
			return Err(ParseError::MissingCompanion(format!("*.{ext}").into()));
		};
		Ok(Cursor::open(directory::companion_path(path, ext)?)?)
	}

	/// Validate a declared entry count whose entries take at least
	/// `min_entry_len` bytes each from the cursor position on. Passing both
	/// checks makes the count safe to allocate for.
	pub fn entry_count(&self, value: impl FieldValue, min_entry_len: u64) -> Result<usize, ParseError> {
		let count = self.validator.check_num_files(value)?;
		let needed = (count as u64).saturating_mul(min_entry_len);
		self.validator.check_length(needed, self.cursor.remaining())?;
		Ok(count)
	}

	/// For directories without a declared count: fail once `parsed` entries
	/// reach the ceiling.
	pub fn check_entry_budget(&self, parsed: usize) -> Result<(), ParseError> {
		if parsed >= self.validator.max_files() {
			return Err(ParseError::TooManyEntries(self.validator.max_files()));
		}
		Ok(())
	}

	/// Keep what was read before `err` if there is enough of it to trust.
	pub fn tolerate_truncation(&self, found: Vec<Resource>, err: ParseError) -> Result<Vec<Resource>, ParseError> {
		match self.config.partial_threshold {
			Some(threshold) if found.len() >= threshold && !err.is_io() => {
				info!("keeping {} entries read before error: {err}", found.len());
				Ok(found)
			}
			_ => Err(err)
		}
	}
}

#[derive(Debug)]
pub struct Archive {
	pub format: &'static str,
	pub resources: Box<[Resource]>
}

impl Archive {
	/// Decode one of this archive's resources in full.
	pub fn export(&self, index: usize) -> Option<Result<Vec<u8>, ExportError>> {
		let res = self.resources.get(index)?;
		Some(res.exporter().export(res))
	}
}

/// Every plugin with a nonzero score, best first. Plugins scoring the same
/// keep their registry order.
pub fn identify(cursor: &mut Cursor, config: &ParseConfig) -> Vec<(FormatPlugin, u32)> {
	let validator = FieldValidator::new(config);
	let mut ranking = ARCHIVE_PLUGINS.iter()
		.map(|plugin| (*plugin, plugin.rate(cursor, &validator)))
		.filter(|(_, score)| *score > 0)
		.collect::<Vec<_>>();
	ranking.sort_by(|a, b| b.1.cmp(&a.1));
	for (plugin, score) in &ranking {
		debug!("{} scored {score}", plugin.id);
	}
	ranking
}

/// Try plugins in order of confidence until one reads the archive. `None`
/// when nothing recognizes it.
pub fn open(cursor: &mut Cursor, config: &ParseConfig, progress: &dyn ProgressSink) -> Option<Archive> {
	identify(cursor, config).into_iter().find_map(|(plugin, _)| plugin.read(cursor, config, progress))
}

pub fn open_archive(path: impl AsRef<Path>, config: &ParseConfig, progress: &dyn ProgressSink) -> Option<Archive> {
	let path = path.as_ref();
	match Cursor::open(path) {
		Ok(mut cursor) => open(&mut cursor, config, progress),
		Err(e) => {
			error!("could not read archive {}: {e}", path.display());
			None
		}
	}
}

pub fn find_plugin(id: &str) -> Option<FormatPlugin> {
	ARCHIVE_PLUGINS.iter().find(|x| x.id == id).copied()
}
