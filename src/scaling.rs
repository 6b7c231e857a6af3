use crate::error::Error;
use itertools::Itertools;

pub const SCALING_FACTORS: [f64; 7] = [8.0, 4.0, 2.0, 1.0, 0.5, 0.25, 0.125];
pub const NEUTRAL_FACTOR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlbLevel {
    L1,
    L2,
}

impl TlbLevel {
    pub const fn number(&self) -> u8 {
        match self {
            Self::L1 => 1,
            Self::L2 => 2,
        }
    }
}

impl TryFrom<u8> for TlbLevel {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Self::L1),
            2 => Ok(Self::L2),
            other => Err(Error::InvalidConfiguration(format!(
                "tlb level {other} cannot be scaled"
            ))),
        }
    }
}

impl std::str::FromStr for TlbLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level: u8 = s
            .trim_start_matches(['l', 'L'])
            .parse()
            .map_err(|_| Error::InvalidConfiguration(format!("{s:?} is not a tlb level")))?;
        Self::try_from(level)
    }
}

/// Scaling factors applied to the L1 and L2 TLB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingPoint(pub f64, pub f64);

impl ScalingPoint {
    pub fn product(&self) -> f64 {
        self.0 * self.1
    }

    pub fn suffix(&self) -> String {
        [
            factor_string(TlbLevel::L1, self.0),
            factor_string(TlbLevel::L2, self.1),
        ]
        .join("_")
    }
}

/// `l1m4` for a factor of 4 on the L1 TLB, `l2d8` for a factor of 1/8 on the L2 TLB.
pub fn factor_string(level: TlbLevel, factor: f64) -> String {
    if factor >= 1.0 {
        format!("l{}m{}", level.number(), factor as u64)
    } else {
        format!("l{}d{}", level.number(), (1.0 / factor) as u64)
    }
}

fn factors(levels: &[TlbLevel], level: TlbLevel) -> &'static [f64] {
    if levels.contains(&level) {
        &SCALING_FACTORS
    } else {
        &[NEUTRAL_FACTOR]
    }
}

pub fn enumerate_scaling_points(levels: &[TlbLevel]) -> Result<Vec<ScalingPoint>, Error> {
    if levels.is_empty() {
        return Err(Error::InvalidConfiguration(
            "no tlb level selected for scaling".to_string(),
        ));
    }

    let mut points: Vec<ScalingPoint> = factors(levels, TlbLevel::L1)
        .iter()
        .cartesian_product(factors(levels, TlbLevel::L2))
        .map(|(&l1, &l2)| ScalingPoint(l1, l2))
        .unique_by(|point| (point.0.to_bits(), point.1.to_bits()))
        .collect();

    // stable, so equal products keep their generation order
    points.sort_by(|a, b| a.product().total_cmp(&b.product()));
    log::debug!("{} scaling points for {:?}", points.len(), levels);
    Ok(points)
}

pub fn folder_names(prefix: &str, levels: &[TlbLevel]) -> Result<Vec<String>, Error> {
    Ok(enumerate_scaling_points(levels)?
        .iter()
        .map(|point| format!("{}_{}", prefix, point.suffix()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{ScalingPoint, TlbLevel, enumerate_scaling_points, factor_string, folder_names};
    use crate::error::Error;
    use color_eyre::eyre;
    use pretty_assertions_sorted as diff;

    #[test]
    fn test_level_one_only() -> eyre::Result<()> {
        let points = enumerate_scaling_points(&[TlbLevel::L1])?;
        diff::assert_eq!(
            points,
            vec![
                ScalingPoint(0.125, 1.0),
                ScalingPoint(0.25, 1.0),
                ScalingPoint(0.5, 1.0),
                ScalingPoint(1.0, 1.0),
                ScalingPoint(2.0, 1.0),
                ScalingPoint(4.0, 1.0),
                ScalingPoint(8.0, 1.0),
            ]
        );
        assert!(points.iter().all(|point| point.1 == 1.0));
        Ok(())
    }

    #[test]
    fn test_level_two_only() -> eyre::Result<()> {
        let points = enumerate_scaling_points(&[TlbLevel::L2])?;
        assert_eq!(points.len(), 7);
        assert!(points.iter().all(|point| point.0 == 1.0));
        assert_eq!(points[0], ScalingPoint(1.0, 0.125));
        Ok(())
    }

    #[test]
    fn test_both_levels() -> eyre::Result<()> {
        let points = enumerate_scaling_points(&[TlbLevel::L1, TlbLevel::L2])?;
        assert_eq!(points.len(), 49);
        assert!(
            points
                .windows(2)
                .all(|pair| pair[0].product() <= pair[1].product())
        );
        assert_eq!(points.first(), Some(&ScalingPoint(0.125, 0.125)));
        assert_eq!(points.last(), Some(&ScalingPoint(8.0, 8.0)));

        // ties keep generation order: larger l1 factor first
        let unit: Vec<_> = points.iter().filter(|p| p.product() == 1.0).collect();
        diff::assert_eq!(
            unit,
            vec![
                &ScalingPoint(8.0, 0.125),
                &ScalingPoint(4.0, 0.25),
                &ScalingPoint(2.0, 0.5),
                &ScalingPoint(1.0, 1.0),
                &ScalingPoint(0.5, 2.0),
                &ScalingPoint(0.25, 4.0),
                &ScalingPoint(0.125, 8.0),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_duplicate_levels_do_not_matter() -> eyre::Result<()> {
        diff::assert_eq!(
            enumerate_scaling_points(&[TlbLevel::L1, TlbLevel::L1])?,
            enumerate_scaling_points(&[TlbLevel::L1])?
        );
        Ok(())
    }

    #[test]
    fn test_no_level_fails() {
        assert!(matches!(
            enumerate_scaling_points(&[]),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_parse_level() {
        assert!(matches!("1".parse::<TlbLevel>(), Ok(TlbLevel::L1)));
        assert!(matches!("l2".parse::<TlbLevel>(), Ok(TlbLevel::L2)));
        assert!("3".parse::<TlbLevel>().is_err());
        assert!("x".parse::<TlbLevel>().is_err());
    }

    #[test]
    fn test_factor_string() {
        assert_eq!(factor_string(TlbLevel::L1, 8.0), "l1m8");
        assert_eq!(factor_string(TlbLevel::L1, 1.0), "l1m1");
        assert_eq!(factor_string(TlbLevel::L2, 0.125), "l2d8");
        assert_eq!(factor_string(TlbLevel::L2, 0.5), "l2d2");
    }

    #[test]
    fn test_folder_names() -> eyre::Result<()> {
        assert_eq!(
            folder_names("canneal", &[TlbLevel::L1])?,
            vec![
                "canneal_l1d8_l2m1",
                "canneal_l1d4_l2m1",
                "canneal_l1d2_l2m1",
                "canneal_l1m1_l2m1",
                "canneal_l1m2_l2m1",
                "canneal_l1m4_l2m1",
                "canneal_l1m8_l2m1",
            ]
        );
        Ok(())
    }
}
