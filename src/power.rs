use crate::cacti::{CactiConfig, CactiOutput, CactiRequest};
use crate::error::Error;
use crate::partition::{Component, Subexperiment, SweepConfig};
use crate::utils::ComponentKind;
use indexmap::IndexMap;
use std::path::Path;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PowerKey {
    pub component: ComponentKind,
    pub level: u8,
    pub slice: u32,
}

impl From<&Component> for PowerKey {
    fn from(component: &Component) -> Self {
        Self {
            component: component.kind,
            level: component.level,
            slice: component.slices,
        }
    }
}

/// One row of the power table: the component key and its CACTI estimates.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PowerRecord {
    pub component: Option<ComponentKind>,
    pub level: u8,
    pub slice: u32,
    #[serde(rename = "Tech node (nm)")]
    pub tech_node: Option<f64>,
    #[serde(rename = "Capacity (bytes)")]
    pub capacity: Option<f64>,
    #[serde(rename = "Number of banks")]
    pub number_of_banks: Option<f64>,
    #[serde(rename = "Associativity")]
    pub associativity: Option<f64>,
    #[serde(rename = "Output width (bits)")]
    pub output_width: Option<f64>,
    #[serde(rename = "Access time (ns)")]
    pub access_time: Option<f64>,
    #[serde(rename = "Random cycle time (ns)")]
    pub random_cycle_time: Option<f64>,
    #[serde(rename = "Dynamic search energy (nJ)")]
    pub dynamic_search_energy: Option<f64>,
    #[serde(rename = "Dynamic read energy (nJ)")]
    pub dynamic_read_energy: Option<f64>,
    #[serde(rename = "Dynamic write energy (nJ)")]
    pub dynamic_write_energy: Option<f64>,
    #[serde(rename = "Standby leakage per bank(mW)")]
    pub standby_leakage_per_bank: Option<f64>,
    #[serde(rename = "Area (mm2)")]
    pub area: Option<f64>,
    #[serde(rename = "Ndwl")]
    pub ndwl: Option<f64>,
    #[serde(rename = "Ndbl")]
    pub ndbl: Option<f64>,
    #[serde(rename = "Nspd")]
    pub nspd: Option<f64>,
    #[serde(rename = "Ndcm")]
    pub ndcm: Option<f64>,
    #[serde(rename = "Ndsam_level_1")]
    pub ndsam_level_1: Option<f64>,
    #[serde(rename = "Ndsam_level_2")]
    pub ndsam_level_2: Option<f64>,
    #[serde(rename = "Data arrary area efficiency %")]
    pub data_array_area_efficiency: Option<f64>,
    #[serde(rename = "Ntwl")]
    pub ntwl: Option<f64>,
    #[serde(rename = "Ntbl")]
    pub ntbl: Option<f64>,
    #[serde(rename = "Ntspd")]
    pub ntspd: Option<f64>,
    #[serde(rename = "Ntcm")]
    pub ntcm: Option<f64>,
    #[serde(rename = "Ntsam_level_1")]
    pub ntsam_level_1: Option<f64>,
    #[serde(rename = "Ntsam_level_2")]
    pub ntsam_level_2: Option<f64>,
    #[serde(rename = "Tag arrary area efficiency %")]
    pub tag_array_area_efficiency: Option<f64>,
}

impl PowerRecord {
    pub fn new(key: PowerKey, output: &CactiOutput) -> Self {
        let get = |column| output.get(column);
        Self {
            component: Some(key.component),
            level: key.level,
            slice: key.slice,
            tech_node: get("Tech node (nm)"),
            capacity: get("Capacity (bytes)"),
            number_of_banks: get("Number of banks"),
            associativity: get("Associativity"),
            output_width: get("Output width (bits)"),
            access_time: get("Access time (ns)"),
            random_cycle_time: get("Random cycle time (ns)"),
            dynamic_search_energy: get("Dynamic search energy (nJ)"),
            dynamic_read_energy: get("Dynamic read energy (nJ)"),
            dynamic_write_energy: get("Dynamic write energy (nJ)"),
            standby_leakage_per_bank: get("Standby leakage per bank(mW)"),
            area: get("Area (mm2)"),
            ndwl: get("Ndwl"),
            ndbl: get("Ndbl"),
            nspd: get("Nspd"),
            ndcm: get("Ndcm"),
            ndsam_level_1: get("Ndsam_level_1"),
            ndsam_level_2: get("Ndsam_level_2"),
            data_array_area_efficiency: get("Data arrary area efficiency %"),
            ntwl: get("Ntwl"),
            ntbl: get("Ntbl"),
            ntspd: get("Ntspd"),
            ntcm: get("Ntcm"),
            ntsam_level_1: get("Ntsam_level_1"),
            ntsam_level_2: get("Ntsam_level_2"),
            tag_array_area_efficiency: get("Tag arrary area efficiency %"),
        }
    }

    pub fn key(&self) -> Option<PowerKey> {
        Some(PowerKey {
            component: self.component?,
            level: self.level,
            slice: self.slice,
        })
    }
}

/// Power estimates keyed by `(component, level, slice)`, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerTable {
    records: IndexMap<PowerKey, PowerRecord>,
}

impl PowerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record unless its key is already present.
    ///
    /// Returns whether the record was added.
    pub fn insert(&mut self, record: PowerRecord) -> bool {
        let Some(key) = record.key() else {
            log::warn!("dropping power record without component: {:?}", record);
            return false;
        };
        if self.records.contains_key(&key) {
            log::debug!("{:?} already present", key);
            return false;
        }
        self.records.insert(key, record);
        true
    }

    pub fn contains(&self, key: &PowerKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &PowerKey) -> Option<&PowerRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PowerRecord> {
        self.records.values()
    }

    pub fn sorted(&self) -> Vec<&PowerRecord> {
        let mut records: Vec<_> = self.records.iter().collect();
        records.sort_by_key(|(key, _)| **key);
        records.into_iter().map(|(_, record)| record).collect()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::missing(path));
        }
        let mut reader = csv::ReaderBuilder::new().from_path(path)?;
        let mut table = Self::new();
        for record in reader.deserialize() {
            table.insert(record?);
        }
        Ok(table)
    }

    /// Writes all rows sorted by key.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| Error::io(parent, source))?;
        }
        let mut writer = csv::WriterBuilder::new().from_path(path)?;
        for record in self.sorted() {
            writer.serialize(record)?;
        }
        writer.flush().map_err(|source| Error::io(path, source))?;
        log::info!("wrote {} rows to {}", self.len(), path.display());
        Ok(())
    }

    pub fn display(&self) {
        let fmt = |value: Option<f64>| value.map(|v| format!("{v}")).unwrap_or_default();
        println!(
            "{:<6} {:>5} {:>5} {:>12} {:>5} {:>8} {:>10} {:>10} {:>10} {:>10} {:>12} {:>10}",
            "comp", "level", "slice", "bytes", "assoc", "width", "access", "search", "read",
            "write", "leak/bank", "area"
        );
        for record in self.sorted() {
            println!(
                "{:<6} {:>5} {:>5} {:>12} {:>5} {:>8} {:>10} {:>10} {:>10} {:>10} {:>12} {:>10}",
                record.component.map(|c| c.name()).unwrap_or_default(),
                record.level,
                record.slice,
                fmt(record.capacity),
                fmt(record.associativity),
                fmt(record.output_width),
                fmt(record.access_time),
                fmt(record.dynamic_search_energy),
                fmt(record.dynamic_read_energy),
                fmt(record.dynamic_write_energy),
                fmt(record.standby_leakage_per_bank),
                fmt(record.area),
            );
        }
    }
}

/// Something that turns a CACTI request into its output.
pub trait Estimator {
    fn estimate(&mut self, request: &CactiRequest) -> Result<CactiOutput, Error>;
}

impl Estimator for CactiConfig {
    fn estimate(&mut self, request: &CactiRequest) -> Result<CactiOutput, Error> {
        request.run(self)
    }
}

/// Collects power estimates for every component of every subexperiment.
///
/// Components already in the table are not estimated again.
pub fn collect_power(
    sweep: &SweepConfig,
    cacti: &CactiConfig,
    subexperiments: &[Subexperiment],
    table: &mut PowerTable,
    estimator: &mut impl Estimator,
) -> Result<(), Error> {
    for subex in subexperiments {
        log::info!("subex {}", subex);
        for component in subex.components(sweep)? {
            let key = PowerKey::from(&component);
            if table.contains(&key) {
                log::debug!("{:?} already estimated", key);
                continue;
            }
            let request = CactiRequest::new(&component, sweep, cacti);
            let output = estimator.estimate(&request)?;
            table.insert(PowerRecord::new(key, &output));
        }
    }
    Ok(())
}

/// Builds the power table at `path`, reusing it unless `rerun` is set.
pub fn sweep_power(
    sweep: &SweepConfig,
    cacti: &CactiConfig,
    path: impl AsRef<Path>,
    rerun: bool,
    estimator: &mut impl Estimator,
) -> Result<PowerTable, Error> {
    let path = path.as_ref();
    if path.is_file() && !rerun {
        log::info!("{} already exists, so skip rerunning cacti", path.display());
        return PowerTable::load(path);
    }
    let subexperiments = sweep.enumerate_partitions();
    let mut table = PowerTable::new();
    collect_power(sweep, cacti, &subexperiments, &mut table, estimator)?;
    table.save(path)?;
    Ok(table)
}
