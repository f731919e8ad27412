use std::{fmt, fs::File, io::{self, BufReader, Read, Seek, SeekFrom, Write}, path::Path, sync::Arc};
use bytes::{Buf, Bytes};
use crate::exporters::Exporter;

/// The bytes a resource lives in. Cheap to clone; file handles are only
/// opened on demand by exporters.
#[derive(Clone)]
pub enum SourceFile {
	Path {
		path: Arc<Path>,
		len: u64
	},
	Memory {
		buf: Bytes
	}
}

impl fmt::Debug for SourceFile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Path {path, len} => write!(f, "{} ({len} bytes)", path.display()),
			Self::Memory {buf} => write!(f, "<memory> ({} bytes)", buf.len())
		}
	}
}

impl SourceFile {
	pub fn len(&self) -> u64 {
		match self {
			Self::Path {len, ..} => *len,
			Self::Memory {buf} => buf.len() as u64
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn path(&self) -> Option<&Path> {
		match self {
			Self::Path {path, ..} => Some(path),
			Self::Memory {..} => None
		}
	}

	/// A reader over `length` bytes starting at `offset`.
	pub fn open_range(&self, offset: u64, length: u64) -> io::Result<Box<dyn Read + Send>> {
		if offset.checked_add(length).is_none_or(|end| end > self.len()) {
			return Err(io::Error::new(io::ErrorKind::UnexpectedEof, format!("range {offset}+{length} outside source of {} bytes", self.len())));
		}
		match self {
			Self::Path {path, ..} => {
				let mut file = BufReader::new(File::open(path)?);
				file.seek(SeekFrom::Start(offset))?;
				Ok(Box::new(file.take(length)))
			}
			Self::Memory {buf} => Ok(Box::new(buf.slice(offset as usize..(offset + length) as usize).reader()))
		}
	}

	pub fn read_range(&self, offset: u64, length: u64) -> io::Result<Vec<u8>> {
		let mut out = Vec::with_capacity(length.min(1 << 24) as usize);
		self.open_range(offset, length)?.read_to_end(&mut out)?;
		if (out.len() as u64) < length {
			return Err(io::ErrorKind::UnexpectedEof.into());
		}
		Ok(out)
	}
}

/// Location of one integer field inside an archive directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldHook {
	pub position: u64,
	pub width: u8
}

impl FieldHook {
	pub const fn new(position: u64, width: u8) -> Self {
		Self {position, width}
	}

	fn write(&self, out: &mut (impl Write + Seek), value: u64) -> io::Result<()> {
		let width = self.width as usize;
		if !matches!(width, 1 | 2 | 4 | 8) {
			return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("unsupported field width {width}")));
		}
		if width < 8 && value >> (width * 8) != 0 {
			return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("{value} does not fit in {width} bytes")));
		}
		out.seek(SeekFrom::Start(self.position))?;
		out.write_all(&value.to_le_bytes()[..width])
	}
}

/// Where the directory stores a resource's offset and length, so a
/// replacement can be written back without re-serializing the directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplaceHooks {
	pub offset: FieldHook,
	pub length: Option<FieldHook>
}

impl ReplaceHooks {
	pub fn patch(&self, out: &mut (impl Write + Seek), offset: u64, length: u64) -> io::Result<()> {
		self.offset.write(out, offset)?;
		if let Some(hook) = &self.length {
			hook.write(out, length)?;
		}
		Ok(())
	}
}

/// One file inside an archive: where its bytes are and how to get them out.
#[derive(Clone, Debug)]
pub struct Resource {
	name: String,
	source: SourceFile,
	offset: u64,
	length: u64,
	decompressed_length: Option<u64>,
	exporter: Exporter,
	replace_hooks: Option<ReplaceHooks>,
	properties: Vec<(&'static str, i64)>
}

impl Resource {
	pub fn new(source: SourceFile, name: impl Into<String>, offset: u64, length: u64) -> Self {
		Self {
			name: name.into(),
			source,
			offset,
			length,
			decompressed_length: None,
			exporter: Exporter::Identity,
			replace_hooks: None,
			properties: Vec::new()
		}
	}

	/// Attach a decoding exporter; its output size always comes with it.
	pub fn with_exporter(mut self, exporter: Exporter, decompressed_length: u64) -> Self {
		self.set_exporter(exporter, decompressed_length);
		self
	}

	/// Record a decoded size for data no built-in exporter can decode.
	pub fn with_decompressed_length(mut self, decompressed_length: u64) -> Self {
		self.decompressed_length = Some(decompressed_length);
		self
	}

	pub fn with_replace_hooks(mut self, hooks: ReplaceHooks) -> Self {
		self.replace_hooks = Some(hooks);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn source(&self) -> &SourceFile {
		&self.source
	}

	pub fn offset(&self) -> u64 {
		self.offset
	}

	pub fn length(&self) -> u64 {
		self.length
	}

	/// Size after decoding; the stored length when nothing decodes it.
	pub fn decompressed_length(&self) -> u64 {
		self.decompressed_length.unwrap_or(self.length)
	}

	pub fn exporter(&self) -> &Exporter {
		&self.exporter
	}

	/// An empty entry pointing at the very end of its source, the way
	/// directories mark a slot with no file in it.
	pub fn is_end_sentinel(&self) -> bool {
		self.length == 0 && self.offset == self.source.len()
	}

	pub fn replace_hooks(&self) -> Option<&ReplaceHooks> {
		self.replace_hooks.as_ref()
	}

	pub fn properties(&self) -> &[(&'static str, i64)] {
		&self.properties
	}

	pub fn property(&self, key: &str) -> Option<i64> {
		self.properties.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
	}

	pub fn set_name(&mut self, name: impl Into<String>) {
		self.name = name.into();
	}

	pub fn set_offset(&mut self, offset: u64) {
		self.offset = offset;
	}

	pub fn set_length(&mut self, length: u64) {
		self.length = length;
	}

	pub fn set_exporter(&mut self, exporter: Exporter, decompressed_length: u64) {
		self.exporter = exporter;
		self.decompressed_length = Some(decompressed_length);
	}

	pub fn add_property(&mut self, key: &'static str, value: i64) {
		self.properties.push((key, value));
	}
}

/// Placeholder name for formats that store none.
pub fn generate_name(index: usize) -> String {
	format!("file_{index}")
}
