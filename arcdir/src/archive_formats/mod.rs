use std::sync::LazyLock;
use crate::FormatPlugin;

mod bag_idx;
mod bar;
mod bnd2;
mod fpk;
mod hha;
mod ifz;
mod lbx;
mod mng_zgwh;
mod pac_ca;
mod pak_offsets;
mod pak_names;
mod pak_xor;
mod pbo;
mod pkg_arch;
mod res_aesop;
mod res_0tsr;
mod rmdp_bin;
mod s16;
mod voc;

/// Every known format, in tie-break order: plugins with magic numbers come
/// before those recognized by extension and field plausibility alone.
pub static ARCHIVE_PLUGINS: LazyLock<Vec<FormatPlugin>> = LazyLock::new(|| [
	mng_zgwh::PLUGIN_MNG_ZGWH,
	hha::PLUGIN_HHA,
	bnd2::PLUGIN_BND2,
	pac_ca::PLUGIN_PAC_CA,
	pkg_arch::PLUGIN_PKG_ARCH,
	res_aesop::PLUGIN_RES_AESOP,
	res_0tsr::PLUGIN_RES_0TSR,
	pak_xor::PLUGIN_PAK_XOR,
	bar::PLUGIN_BAR,
	bag_idx::PLUGIN_BAG_IDX,
	rmdp_bin::PLUGIN_RMDP_BIN,
	s16::PLUGIN_S16,
	fpk::PLUGIN_FPK,
	lbx::PLUGIN_LBX,
	ifz::PLUGIN_IFZ,
	voc::PLUGIN_VOC,
	pbo::PLUGIN_PBO,
	pak_names::PLUGIN_PAK_NAMES,
	pak_offsets::PLUGIN_PAK_OFFSETS
].into());

#[cfg(test)]
mod tests {
	use std::collections::HashSet;
	use super::*;

	#[test]
	fn ids_are_unique() {
		let ids = ARCHIVE_PLUGINS.iter().map(|x| x.id()).collect::<HashSet<_>>();
		assert_eq!(ids.len(), ARCHIVE_PLUGINS.len());
		assert!(ARCHIVE_PLUGINS.iter().all(|x| x.capabilities().read && !x.extensions().is_empty()));
	}
}
