use crate::error::Error;

pub const KILO_BYTE: u64 = 1 << 10;

/// Per-way width and associativity of a set-associative structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Geometry {
    pub bytes_per_way: u64,
    pub ways: u64,
}

impl Geometry {
    pub const fn bytes_per_set(&self) -> u64 {
        self.bytes_per_way * self.ways
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Cache,
    Tlb,
}

impl ComponentKind {
    /// 64 byte lines for caches, 8 byte entries for TLBs, both 4-way.
    pub const fn geometry(&self) -> Geometry {
        match self {
            Self::Cache => Geometry {
                bytes_per_way: 64,
                ways: 4,
            },
            Self::Tlb => Geometry {
                bytes_per_way: 8,
                ways: 4,
            },
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Tlb => "tlb",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalized {
    pub sets: u64,
    pub bytes: u64,
}

/// Largest power of two not exceeding `n`. Exact powers of two map to themselves.
pub fn floor_power_of_two(n: u64) -> Option<u64> {
    match n {
        0 => None,
        n => Some(1 << (u64::BITS - 1 - n.leading_zeros())),
    }
}

/// Rounds `raw` bytes down to the largest capacity with a power of two number of sets.
///
/// A zero capacity stays zero. Anything that does not fill a single set is rejected.
pub fn normalize(raw: u64, geometry: Geometry) -> Result<Normalized, Error> {
    if raw == 0 {
        return Ok(Normalized::default());
    }
    let raw_sets = raw.checked_div(geometry.bytes_per_set()).ok_or_else(|| {
        Error::InvalidConfiguration(format!("empty geometry {geometry:?}"))
    })?;
    let sets = floor_power_of_two(raw_sets).ok_or(Error::CapacityTooSmall {
        raw,
        ways: geometry.ways,
        bytes_per_way: geometry.bytes_per_way,
    })?;
    Ok(Normalized {
        sets,
        bytes: sets * geometry.bytes_per_set(),
    })
}

pub fn kilobytes(bytes: u64) -> u64 {
    bytes.div_ceil(KILO_BYTE)
}

#[cfg(test)]
mod tests {
    use super::{ComponentKind, Geometry, Normalized, floor_power_of_two, kilobytes, normalize};
    use crate::error::Error;
    use color_eyre::eyre;
    use pretty_assertions_sorted as diff;

    const CACHE: Geometry = ComponentKind::Cache.geometry();
    const TLB: Geometry = ComponentKind::Tlb.geometry();

    #[test]
    fn test_floor_power_of_two() {
        assert_eq!(floor_power_of_two(0), None);
        assert_eq!(floor_power_of_two(1), Some(1));
        assert_eq!(floor_power_of_two(3), Some(2));
        assert_eq!(floor_power_of_two(4096), Some(4096));
        assert_eq!(floor_power_of_two(4632), Some(4096));
        assert_eq!(floor_power_of_two(u64::MAX), Some(1 << 63));
    }

    #[test]
    fn test_normalize_half_core() -> eyre::Result<()> {
        let raw = 8 * 2_371_584 / 16;
        assert_eq!(raw, 1_185_792);
        diff::assert_eq!(
            normalize(raw, CACHE)?,
            Normalized {
                sets: 4096,
                bytes: 1_048_576
            }
        );
        Ok(())
    }

    #[test]
    fn test_normalize_zero() -> eyre::Result<()> {
        diff::assert_eq!(normalize(0, CACHE)?, Normalized { sets: 0, bytes: 0 });
        diff::assert_eq!(normalize(0, TLB)?, Normalized { sets: 0, bytes: 0 });
        Ok(())
    }

    #[test]
    fn test_normalize_less_than_one_set() {
        assert!(matches!(
            normalize(255, CACHE),
            Err(Error::CapacityTooSmall { raw: 255, .. })
        ));
        assert!(matches!(
            normalize(31, TLB),
            Err(Error::CapacityTooSmall { raw: 31, .. })
        ));
        assert!(normalize(256, CACHE).is_ok());
        let empty = Geometry {
            bytes_per_way: 0,
            ways: 4,
        };
        assert!(matches!(
            normalize(256, empty),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_normalize_never_rounds_up() -> eyre::Result<()> {
        for geometry in [CACHE, TLB] {
            for raw in (geometry.bytes_per_set()..200_000).step_by(97) {
                let normalized = normalize(raw, geometry)?;
                assert!(normalized.bytes <= raw, "{raw} rounded up");
                // the next power of two would overshoot
                assert!(normalized.bytes * 2 > raw, "{raw} not the largest");
            }
        }
        Ok(())
    }

    #[test]
    fn test_normalize_idempotent() -> eyre::Result<()> {
        for geometry in [CACHE, TLB] {
            for raw in [32, 48, 256, 300, 1024, 148_224, 1_185_792, 2_371_584] {
                if raw < geometry.bytes_per_set() {
                    continue;
                }
                let once = normalize(raw, geometry)?;
                let twice = normalize(once.bytes, geometry)?;
                diff::assert_eq!(once, twice);
            }
        }
        Ok(())
    }

    #[test]
    fn test_kilobytes_rounds_up() {
        assert_eq!(kilobytes(0), 0);
        assert_eq!(kilobytes(256), 1);
        assert_eq!(kilobytes(1024), 1);
        assert_eq!(kilobytes(1_048_576), 1024);
    }
}
