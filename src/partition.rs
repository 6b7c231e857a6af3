use crate::error::Error;
use crate::utils::{ComponentKind, Geometry, normalize};
use once_cell::sync::Lazy;
use regex::Regex;

pub const SLICE_OPTIONS: [u32; 6] = [0, 1, 2, 4, 8, 16];
pub const MAX_SLICE: u32 = 16;

/// Bytes implementing one core's L2 TLB, L2 cache and L3 cache share:
/// 1536 TLB entries of 8 bytes, 256KB of L2 and 2MB of L3.
pub const TOTAL_BYTES_PER_CORE: u64 = 1536 * 8 + 256 * 1024 + 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub slice_options: Vec<u32>,
    pub max_slice: u32,
    pub total_bytes_per_core: u64,
    pub cache_geometry: Geometry,
    pub tlb_geometry: Geometry,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            slice_options: SLICE_OPTIONS.to_vec(),
            max_slice: MAX_SLICE,
            total_bytes_per_core: TOTAL_BYTES_PER_CORE,
            cache_geometry: ComponentKind::Cache.geometry(),
            tlb_geometry: ComponentKind::Tlb.geometry(),
        }
    }
}

impl SweepConfig {
    pub fn geometry(&self, kind: ComponentKind) -> Geometry {
        match kind {
            ComponentKind::Cache => self.cache_geometry,
            ComponentKind::Tlb => self.tlb_geometry,
        }
    }

    /// Rejects budgets the enumerator cannot split into distinct partitions.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_slice == 0 {
            return Err(Error::InvalidConfiguration(
                "max_slice must be positive".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for &slices in &self.slice_options {
            if slices > self.max_slice {
                return Err(Error::InvalidConfiguration(format!(
                    "slice option {slices} exceeds max_slice {}",
                    self.max_slice
                )));
            }
            if !seen.insert(slices) {
                return Err(Error::InvalidConfiguration(format!(
                    "slice option {slices} is listed more than once"
                )));
            }
        }
        for geometry in [self.cache_geometry, self.tlb_geometry] {
            if geometry.bytes_per_set() == 0 {
                return Err(Error::InvalidConfiguration(format!(
                    "empty geometry {geometry:?}"
                )));
            }
        }
        Ok(())
    }

    /// Raw bytes backing `slices` out of the per-core budget.
    pub fn slice_bytes(&self, slices: u32) -> Result<u64, Error> {
        u64::from(slices)
            .checked_mul(self.total_bytes_per_core)
            .and_then(|bytes| bytes.checked_div(u64::from(self.max_slice)))
            .ok_or_else(|| {
                Error::InvalidConfiguration(format!(
                    "{slices} of {} slices of {} bytes",
                    self.max_slice, self.total_bytes_per_core
                ))
            })
    }

    pub fn normalized_bytes(&self, kind: ComponentKind, slices: u32) -> Result<u64, Error> {
        Ok(normalize(self.slice_bytes(slices)?, self.geometry(kind))?.bytes)
    }

    /// Enumerates every valid split of the slice budget.
    ///
    /// L3 slices form the outer loop and L2 slices the inner one; the TLB gets
    /// the remainder. Splits that overdraw the budget, or that give the L2 more
    /// than a present L3, are skipped.
    pub fn enumerate_partitions(&self) -> Vec<Subexperiment> {
        let mut subexperiments = Vec::new();
        for &l3cache_slices in &self.slice_options {
            for &l2cache_slices in &self.slice_options {
                let Some(l2tlb_slices) = self
                    .max_slice
                    .checked_sub(l2cache_slices)
                    .and_then(|rest| rest.checked_sub(l3cache_slices))
                else {
                    continue;
                };
                if l3cache_slices > 0 && l2cache_slices > l3cache_slices {
                    continue;
                }
                let subex = Subexperiment {
                    l2tlb_slices,
                    l2cache_slices,
                    l3cache_slices,
                };
                log::debug!(
                    "{:<3} l2tlb_slice {:<3} l2c_slice {:<3} l3c_slice {:<3}",
                    subexperiments.len(),
                    l2tlb_slices,
                    l2cache_slices,
                    l3cache_slices,
                );
                subexperiments.push(subex);
            }
        }
        log::info!("count {}", subexperiments.len());
        subexperiments
    }
}

/// One point of the partition sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subexperiment {
    pub l2tlb_slices: u32,
    pub l2cache_slices: u32,
    pub l3cache_slices: u32,
}

/// A component of a subexperiment that is actually present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub kind: ComponentKind,
    pub level: u8,
    pub slices: u32,
    pub size_bytes: u64,
}

impl Subexperiment {
    pub fn l2_tlb_entry_count(&self, config: &SweepConfig) -> Result<u64, Error> {
        let raw = config.slice_bytes(self.l2tlb_slices)?;
        let geometry = config.tlb_geometry;
        Ok(normalize(raw, geometry)?.sets * geometry.ways)
    }

    pub fn l2_tlb_byte_capacity(&self, config: &SweepConfig) -> Result<u64, Error> {
        Ok(self.l2_tlb_entry_count(config)? * config.tlb_geometry.bytes_per_way)
    }

    pub fn l2_cache_byte_capacity(&self, config: &SweepConfig) -> Result<u64, Error> {
        config.normalized_bytes(ComponentKind::Cache, self.l2cache_slices)
    }

    pub fn l3_cache_byte_capacity(&self, config: &SweepConfig) -> Result<u64, Error> {
        config.normalized_bytes(ComponentKind::Cache, self.l3cache_slices)
    }

    pub fn canonical_suffix(&self) -> String {
        format!(
            "l2tlbs{:02}_l2cs{:02}_l3cs{:02}",
            self.l2tlb_slices, self.l2cache_slices, self.l3cache_slices
        )
    }

    pub fn config_filename(&self) -> String {
        format!("skylake_{}.ini", self.canonical_suffix())
    }

    pub fn components(&self, config: &SweepConfig) -> Result<Vec<Component>, Error> {
        let candidates = [
            (ComponentKind::Tlb, 2, self.l2tlb_slices),
            (ComponentKind::Cache, 2, self.l2cache_slices),
            (ComponentKind::Cache, 3, self.l3cache_slices),
        ];
        let mut components = Vec::new();
        for (kind, level, slices) in candidates {
            if slices == 0 {
                log::info!("l{level}{kind} is ignored since its slice is zero");
                continue;
            }
            let size_bytes = match kind {
                ComponentKind::Tlb => self.l2_tlb_byte_capacity(config)?,
                ComponentKind::Cache => config.normalized_bytes(kind, slices)?,
            };
            components.push(Component {
                kind,
                level,
                slices,
                size_bytes,
            });
        }
        Ok(components)
    }
}

impl std::fmt::Display for Subexperiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical_suffix())
    }
}

static SUFFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^l2tlbs(\d{2,})_l2cs(\d{2,})_l3cs(\d{2,})$").unwrap());

impl std::str::FromStr for Subexperiment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidSuffix(s.to_string());
        let cap = SUFFIX_REGEX.captures(s).ok_or_else(invalid)?;
        let slices = |i: usize| cap[i].parse::<u32>().map_err(|_| invalid());
        Ok(Self {
            l2tlb_slices: slices(1)?,
            l2cache_slices: slices(2)?,
            l3cache_slices: slices(3)?,
        })
    }
}
