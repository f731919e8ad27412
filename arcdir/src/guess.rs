use std::io::Read;
use tracing::debug;
use crate::{byte_slice::ByteSlice, exporters::ExportStream, resource::Resource, FormatPlugin};

/// Bytes looked at when guessing an extension.
pub const SAMPLE_LEN: usize = 16;

/// Start of a resource's decoded contents, pre-split into the integers
/// extension guessers tend to compare against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderSample {
	pub bytes: Vec<u8>,
	pub ints: [u32; 3],
	pub shorts: [i16; 6]
}

impl HeaderSample {
	/// Missing bytes read as zero.
	pub fn from_prefix(prefix: &[u8]) -> Self {
		let bytes = prefix[..prefix.len().min(SAMPLE_LEN)].to_vec();
		let ints = std::array::from_fn(|i| bytes.get_u32_at(i * 4).unwrap_or(0));
		let shorts = std::array::from_fn(|i| bytes.get_i16_at(i * 2).unwrap_or(0));
		Self {bytes, ints, shorts}
	}

	pub fn starts_with(&self, magic: &[u8]) -> bool {
		self.bytes.starts_with(magic)
	}
}

/// First four bytes, read little endian, to the extension they announce.
static MAGIC_EXTENSIONS: phf::Map<u32, &'static str> = phf::phf_map! {
	0x4646_4952u32 => "wav",
	0x5367_674Fu32 => "ogg",
	0x2053_4444u32 => "dds",
	0x474E_5089u32 => "png",
	0x3846_4947u32 => "gif",
	0x0403_4B50u32 => "zip",
	0xE0FF_D8FFu32 => "jpg",
	0xE1FF_D8FFu32 => "jpg",
	0x4361_4C66u32 => "flac",
	0x694B_4942u32 => "bik",
	0x7047_4156u32 => "vag",
	0x6468_544Du32 => "mid",
	0x5350_4238u32 => "psd",
	0x6165_7243u32 => "voc"
};

pub fn guess_from_magic(sample: &HeaderSample) -> Option<&'static str> {
	if sample.bytes.len() < 4 {
		return None;
	}
	MAGIC_EXTENSIONS.get(&sample.ints[0]).copied()
}

/// The plugin's own guess first, then the common magic numbers. `None` when
/// the resource can't be read or nothing matches.
pub fn guess_resource_extension(plugin: &FormatPlugin, resource: &Resource) -> Option<&'static str> {
	let mut stream = ExportStream::new();
	stream.open(resource);
	let mut prefix = Vec::with_capacity(SAMPLE_LEN);
	if let Err(e) = (&mut stream).take(SAMPLE_LEN as u64).read_to_end(&mut prefix) {
		debug!("could not sample {}: {e}", resource.name());
		return None;
	}
	let sample = HeaderSample::from_prefix(&prefix);
	plugin.guess_extension(&sample).or_else(|| guess_from_magic(&sample))
}

#[cfg(test)]
mod tests {
	use bytes::Bytes;
	use crate::{exporters::Exporter, find_plugin, resource::SourceFile};
	use super::*;

	fn stored(data: &[u8]) -> Resource {
		let len = data.len() as u64;
		Resource::new(SourceFile::Memory {buf: Bytes::copy_from_slice(data)}, "file_0", 0, len)
	}

	#[test]
	fn sample_fields() {
		let sample = HeaderSample::from_prefix(b"RIFF\x10\0\0\0WAVEfmt \x01\x02");
		assert_eq!(sample.bytes.len(), 16);
		assert_eq!(sample.ints[1], 16);
		assert_eq!(sample.shorts[2], 16);
		assert_eq!(guess_from_magic(&sample), Some("wav"));
	}

	#[test]
	fn short_or_unknown_gives_nothing() {
		assert_eq!(guess_from_magic(&HeaderSample::from_prefix(b"RIF")), None);
		assert_eq!(guess_from_magic(&HeaderSample::from_prefix(b"\0\0\0\0\0")), None);
		let sample = HeaderSample::from_prefix(b"ab");
		assert_eq!(sample.ints, [0; 3]);
	}

	#[test]
	fn decoded_contents_are_sampled() {
		let plain = b"OggS\0\x02\0\0\0\0\0\0\0\0\0\0 and the rest of the stream".to_vec();
		let packed = Exporter::Zlib.pack(&plain).unwrap();
		let len = packed.len() as u64;
		let res = Resource::new(SourceFile::Memory {buf: Bytes::from(packed)}, "file_0", 0, len)
			.with_exporter(Exporter::Zlib, plain.len() as u64);
		let lbx = find_plugin("lbx").unwrap();
		assert_eq!(guess_resource_extension(&lbx, &res), Some("ogg"));
	}

	#[test]
	fn plugin_guess_comes_first() {
		let bnd2 = find_plugin("bnd2").unwrap();
		let lbx = find_plugin("lbx").unwrap();
		let blank = stored(&[0; 32]);
		assert_eq!(guess_resource_extension(&bnd2, &blank), Some("dxt"));
		assert_eq!(guess_resource_extension(&lbx, &blank), None);
		assert_eq!(guess_resource_extension(&bnd2, &stored(b"RIFF\x24\0\0\0WAVEfmt ")), Some("wav"));
	}

	#[test]
	fn unknown_or_unreadable_resources_give_nothing() {
		let lbx = find_plugin("lbx").unwrap();
		assert_eq!(guess_resource_extension(&lbx, &stored(b"just some text, nothing more")), None);
		let cut = Resource::new(SourceFile::Memory {buf: Bytes::from_static(b"short")}, "cut", 2, 10)
			.with_exporter(Exporter::Zlib, 100);
		assert_eq!(guess_resource_extension(&lbx, &cut), None);
	}
}
