use crate::error::Error;
use crate::partition::{Subexperiment, SweepConfig};
use crate::utils::kilobytes;
use std::path::{Path, PathBuf};

/// Skylake-like single core RSIM configuration.
///
/// `{stlb_entry}`, `{l2cache_size}` and `{l3cache_size}` are substituted per subexperiment.
pub const SKYLAKE_TEMPLATE: &str = "\
; this is a configuration file based on the skylake processor.

[general]
ncore = 1
coreType = guest

;======================================================================
[dtlb]
entry = 64
nway = 4
; can be either true_lru or random
evictedPolicy = true_lru

[stlb]
entry = {stlb_entry}
nway = 4
evictedPolicy = true_lru

[ntlb]
entry = 16
nway = 16
evictedPolicy = true_lru
;======================================================================
[l1dcache]
sizeKiloByte = 32
nway = 8
lineSizeByte = 64
storeType = store_allocate
cachingPolicy = caching_top

[l2cache]
sizeKiloByte = {l2cache_size}
nway = 4
lineSizeByte = 64
storeType = store_allocate
cachingPolicy = caching_top

[l3cache]
sizeKiloByte = {l3cache_size}
nway = 4
lineSizeByte = 64
storeType = store_allocate
cachingPolicy = caching_inclusive

;======================================================================
[pscl4]
nentry = 2

[pscl3]
nentry = 4

[pscl2]
nentry = 32

;======================================================================
[dtlb_prefetch]
enable = false
nentry = 16

[stlb_prefetch]
enable = false
nentry = 16
";

pub fn render_configuration(
    template: &str,
    subex: &Subexperiment,
    config: &SweepConfig,
) -> Result<String, Error> {
    let stlb_entry = subex.l2_tlb_entry_count(config)?;
    let l2cache_size = kilobytes(subex.l2_cache_byte_capacity(config)?);
    let l3cache_size = kilobytes(subex.l3_cache_byte_capacity(config)?);
    Ok(template
        .replace("{stlb_entry}", &stlb_entry.to_string())
        .replace("{l2cache_size}", &l2cache_size.to_string())
        .replace("{l3cache_size}", &l3cache_size.to_string()))
}

pub fn write_configuration(
    template: &str,
    subex: &Subexperiment,
    config: &SweepConfig,
    output_dir: impl AsRef<Path>,
) -> Result<PathBuf, Error> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir).map_err(|source| Error::io(output_dir, source))?;
    let content = render_configuration(template, subex, config)?;
    let path = output_dir.join(subex.config_filename());
    log::info!("writing {}", path.display());
    std::fs::write(&path, content).map_err(|source| Error::io(&path, source))?;
    Ok(path)
}

/// Writes one configuration per enumerated partition, in enumeration order.
pub fn write_configurations(
    config: &SweepConfig,
    output_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, Error> {
    config
        .enumerate_partitions()
        .iter()
        .map(|subex| write_configuration(SKYLAKE_TEMPLATE, subex, config, output_dir.as_ref()))
        .collect()
}
