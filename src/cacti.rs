use crate::error::Error;
use crate::partition::{Component, SweepConfig};
use crate::utils::ComponentKind;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

pub const NOT_AVAILABLE: &str = "N/A";

pub const CAPACITY: &str = "Capacity (bytes)";
pub const ACCESS_TIME: &str = "Access time (ns)";
pub const DYNAMIC_READ_ENERGY: &str = "Dynamic read energy (nJ)";
pub const DYNAMIC_WRITE_ENERGY: &str = "Dynamic write energy (nJ)";
pub const STANDBY_LEAKAGE_PER_BANK: &str = "Standby leakage per bank(mW)";
pub const NUMBER_OF_BANKS: &str = "Number of banks";
pub const AREA: &str = "Area (mm2)";

/// Result table CACTI writes next to its input config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CactiOutput {
    data: IndexMap<String, f64>,
}

fn strip_trailing_empty(record: &csv::StringRecord) -> Vec<&str> {
    let mut fields: Vec<&str> = record.iter().collect();
    while fields.last().is_some_and(|field| field.is_empty()) {
        fields.pop();
    }
    fields
}

impl CactiOutput {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::missing(path));
        }
        let file = std::fs::File::open(path).map_err(|source| Error::io(path, source))?;
        Self::parse(file).map_err(|err| match err {
            Error::MalformedTable { reason, .. } => Error::MalformedTable {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parses a header line and a value line of comma separated fields.
    ///
    /// `N/A` values become -1.
    pub fn parse(reader: impl std::io::Read) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = reader.records();
        let malformed = |reason: &str| Error::MalformedTable {
            path: PathBuf::new(),
            reason: reason.to_string(),
        };
        let header = records.next().ok_or_else(|| malformed("missing header"))??;
        let values = records.next().ok_or_else(|| malformed("missing values"))??;

        let header = strip_trailing_empty(&header);
        let values = strip_trailing_empty(&values);
        log::debug!("header: {:?}", header);
        log::debug!("value: {:?}", values);
        if header.len() != values.len() {
            return Err(malformed(&format!(
                "{} columns but {} values",
                header.len(),
                values.len()
            )));
        }

        let mut data = IndexMap::new();
        for (column, value) in header.into_iter().zip(values) {
            let value = if value == NOT_AVAILABLE {
                log::warn!("set {} from {} to {}", column, value, -1);
                -1.0
            } else {
                value.parse::<f64>().map_err(|source| Error::ParseValue {
                    column: column.to_string(),
                    value: value.to_string(),
                    source,
                })?
            };
            log::debug!("saving: {}: {}", column, value);
            data.insert(column.to_string(), value);
        }
        Ok(Self { data })
    }

    pub fn data(&self) -> &IndexMap<String, f64> {
        &self.data
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.data.get(column).copied()
    }

    fn field(&self, column: &str) -> Result<f64, Error> {
        self.get(column)
            .ok_or_else(|| Error::MissingField(column.to_string()))
    }

    pub fn capacity(&self) -> Result<f64, Error> {
        self.field(CAPACITY)
    }

    pub fn access_time(&self) -> Result<f64, Error> {
        self.field(ACCESS_TIME)
    }

    pub fn dynamic_read_energy(&self) -> Result<f64, Error> {
        self.field(DYNAMIC_READ_ENERGY)
    }

    pub fn dynamic_write_energy(&self) -> Result<f64, Error> {
        self.field(DYNAMIC_WRITE_ENERGY)
    }

    /// Leakage of all banks together.
    pub fn standby_leakage(&self) -> Result<f64, Error> {
        Ok(self.field(STANDBY_LEAKAGE_PER_BANK)? * self.field(NUMBER_OF_BANKS)?)
    }

    pub fn area(&self) -> Result<f64, Error> {
        self.field(AREA)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CactiConfig {
    pub binary: PathBuf,
    pub config_dir: PathBuf,
    pub tech_node_nm: u32,
    pub ncores: u32,
}

impl Default for CactiConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("cacti"),
            config_dir: PathBuf::from("configs"),
            tech_node_nm: 22,
            ncores: 1,
        }
    }
}

/// A single CACTI run for one component instance.
#[derive(Debug, Clone, PartialEq)]
pub struct CactiRequest {
    pub kind: ComponentKind,
    pub level: u8,
    pub slices: u32,
    pub size_bytes: u64,
    pub block_bytes: u64,
    pub associativity: u64,
    pub ncores: u32,
    pub tech_node_nm: u32,
}

impl CactiRequest {
    pub fn new(component: &Component, sweep: &SweepConfig, cacti: &CactiConfig) -> Self {
        let geometry = sweep.geometry(component.kind);
        Self {
            kind: component.kind,
            level: component.level,
            slices: component.slices,
            size_bytes: component.size_bytes,
            block_bytes: geometry.bytes_per_way,
            associativity: geometry.ways,
            ncores: cacti.ncores,
            tech_node_nm: cacti.tech_node_nm,
        }
    }

    pub fn config_filename(&self) -> String {
        format!("{}_l{}_s{}.cfg", self.kind, self.level, self.slices)
    }

    pub fn render(&self) -> String {
        let lines = [
            format!("# l{} {} with {} slices", self.level, self.kind, self.slices),
            format!("-size (bytes) {}", self.size_bytes),
            format!("-block size (bytes) {}", self.block_bytes),
            format!("-associativity {}", self.associativity),
            "-read-write port 1".to_string(),
            "-exclusive read port 0".to_string(),
            "-exclusive write port 0".to_string(),
            "-single ended read ports 0".to_string(),
            "-UCA bank count 1".to_string(),
            format!("-technology (u) {:.3}", f64::from(self.tech_node_nm) / 1000.0),
            "-Data array cell type - \"itrs-hp\"".to_string(),
            "-Tag array cell type - \"itrs-hp\"".to_string(),
            "-cache type \"cache\"".to_string(),
            "-tag size (b) \"default\"".to_string(),
            "-access mode (normal, sequential, fast) - \"normal\"".to_string(),
            format!("-output/input bus width {}", self.block_bytes * 8),
            format!("-Core count {}", self.ncores),
            format!("-Cache level (L2/L3) - \"L{}\"", self.level),
            "-design objective (weight delay, dynamic power, leakage power, cycle time, area) 0:0:0:100:0"
                .to_string(),
            "-deviate (delay, dynamic power, leakage power, cycle time, area) 20:100000:100000:100000:100000"
                .to_string(),
            "-Optimize ED or ED^2 (ED, ED^2, NONE): \"ED^2\"".to_string(),
            "-Print level (DETAILED, CONCISE) - \"CONCISE\"".to_string(),
        ];
        let mut content = lines.join("\n");
        content.push('\n');
        content
    }

    pub fn write_config(&self, config_dir: impl AsRef<Path>) -> Result<PathBuf, Error> {
        let config_dir = config_dir.as_ref();
        std::fs::create_dir_all(config_dir).map_err(|source| Error::io(config_dir, source))?;
        let path = config_dir.join(self.config_filename());
        log::info!("writing {}", path.display());
        std::fs::write(&path, self.render()).map_err(|source| Error::io(&path, source))?;
        Ok(path)
    }

    /// CACTI writes its table to `<config>.out`.
    pub fn output_path(config_path: &Path) -> PathBuf {
        let mut path = config_path.as_os_str().to_owned();
        path.push(".out");
        PathBuf::from(path)
    }

    /// Writes the config, runs CACTI on it and reads back its output.
    pub fn run(&self, cacti: &CactiConfig) -> Result<CactiOutput, Error> {
        let config_path = self.write_config(&cacti.config_dir)?;
        let mut cmd = std::process::Command::new(&cacti.binary);
        cmd.arg("-infile").arg(&config_path);
        log::debug!("{:?}", &cmd);
        let result = cmd
            .output()
            .map_err(|source| Error::io(&cacti.binary, source))?;
        if !result.status.success() {
            return Err(Error::Command {
                cmd: format!("{cmd:?}"),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        let output_path = Self::output_path(&config_path);
        log::info!("reading: {}", output_path.display());
        CactiOutput::from_path(output_path)
    }
}
