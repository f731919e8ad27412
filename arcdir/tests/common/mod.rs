#![allow(dead_code)]

use bytes::Bytes;
use arcdir::{find_plugin, resource::{Resource, SourceFile}};

pub fn u32s(values: &[u32]) -> Vec<u8> {
	values.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// An LBX file: count, padding, offsets, total length, then zeroes up to
/// `total`.
pub fn lbx(offsets: &[u32], total: u32) -> Vec<u8> {
	let mut data = (offsets.len() as u16).to_le_bytes().to_vec();
	data.extend([0xAD, 0xFE, 0, 0, 0, 0]);
	data.extend(u32s(offsets));
	data.extend(total.to_le_bytes());
	data.resize(total as usize, 0);
	data
}

pub fn memory_resource(name: &str, data: &[u8]) -> Resource {
	Resource::new(SourceFile::Memory {buf: Bytes::copy_from_slice(data)}, name, 0, data.len() as u64)
}

/// A ZGWH archive holding `files`, through the format's own writer.
pub fn mng(files: &[(&str, &[u8])]) -> Vec<u8> {
	let resources = files.iter().map(|(name, data)| memory_resource(name, data)).collect::<Vec<_>>();
	let mut out = Vec::new();
	find_plugin("mng_zgwh").unwrap().write(&resources, &mut out).unwrap();
	out
}
