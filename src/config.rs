use crate::cacti::CactiConfig;
use crate::error::Error;
use crate::partition::SweepConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub sweep: SweepConfig,
    pub cacti: CactiConfig,
    pub rsim_dir: PathBuf,
    pub power_table: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep: SweepConfig::default(),
            cacti: CactiConfig::default(),
            rsim_dir: PathBuf::from("rsim_configs"),
            power_table: PathBuf::from("power_info.csv"),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::missing(path));
        }
        let file = std::fs::File::open(path).map_err(|source| Error::io(path, source))?;
        let config: Self = serde_yaml::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.sweep.validate()
    }
}
