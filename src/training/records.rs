//! Labelled training records and the sources that supply them.
//!
//! A record is one profiled spectrum: its experiment id (the
//! cross-validation group), the feature values, the population flags and
//! whatever parameter values were determined for it. Record tables may hold
//! null cells; a null feature or parameter is simply absent, a null
//! population flag reads as "not present".
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    populations::{ParameterEstimate, ParameterKind, PopulationFlags, PopulationKind},
    profiling::{FeatureKey, FeatureVector},
    training::errors::{DataError, DataResult},
};

/// Cell contents treated as null in record tables.
pub const NULL_MARKERS: [&str; 5] = ["", "None", "NaN", "nan", "null"];

const EXPERIMENT_ID: &str = "experiment_id";

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub experiment_id: String,
    pub features: FeatureVector,
    pub flags: PopulationFlags,
    pub params: ParameterEstimate,
}

impl TrainingRecord {
    pub fn new(
        experiment_id: impl Into<String>, features: FeatureVector, flags: PopulationFlags,
        params: ParameterEstimate,
    ) -> Self {
        Self { experiment_id: experiment_id.into(), features, flags, params }
    }
}

/// Supplier of labelled records, such as a remote data service.
pub trait RecordSource {
    /// Records of every dataset in `dataset_ids`, concatenated in order.
    ///
    /// # Errors
    /// Implementations report unreadable or unknown datasets as [`DataError`].
    fn fetch_records(&self, dataset_ids: &[String]) -> DataResult<Vec<TrainingRecord>>;
}

/// Reads `<dir>/<dataset_id>.csv` per dataset.
///
/// Header: `experiment_id`, then any of the feature, population and
/// parameter names. Unknown columns are ignored.
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    dir: PathBuf,
}

impl CsvRecordSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Parse one record table.
    ///
    /// # Errors
    /// - [`DataError::Io`] if the file cannot be opened.
    /// - [`DataError::MissingColumn`] without an `experiment_id` column.
    /// - [`DataError::InvalidCell`] for unparsable values, a null
    ///   `experiment_id`, or a row flagged both unidentified and as
    ///   containing a scatterer.
    pub fn read_table(path: &Path) -> DataResult<Vec<TrainingRecord>> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| DataError::Io { path: path.display().to_string(), reason: e.to_string() })?;
        let columns: Vec<Column> = reader.headers()?.iter().map(Column::parse).collect();
        let id_col = columns
            .iter()
            .position(|c| matches!(c, Column::ExperimentId))
            .ok_or_else(|| DataError::MissingColumn { column: EXPERIMENT_ID.to_string() })?;

        let mut out = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;
            let mut features = FeatureVector::new();
            let mut params = ParameterEstimate::new();
            let mut present = BTreeMap::new();
            for (column, cell) in columns.iter().zip(record.iter()) {
                let cell = cell.trim();
                if NULL_MARKERS.contains(&cell) {
                    continue;
                }
                let invalid =
                    || DataError::InvalidCell { row, column: column.name(), value: cell.to_string() };
                match *column {
                    Column::Feature(k) => {
                        features.insert(k, cell.parse::<f64>().map_err(|_| invalid())?);
                    }
                    Column::Parameter(k) => {
                        params.insert(k, cell.parse::<f64>().map_err(|_| invalid())?);
                    }
                    Column::Population(p) => {
                        present.insert(p, parse_flag(cell).ok_or_else(invalid)?);
                    }
                    Column::ExperimentId | Column::Other => {}
                }
            }
            let flags = build_flags(&present).ok_or_else(|| DataError::InvalidCell {
                row,
                column: PopulationKind::Unidentified.name().to_string(),
                value: "contradicts a flagged population".to_string(),
            })?;
            let id_cell = record.get(id_col).unwrap_or_default().trim();
            if NULL_MARKERS.contains(&id_cell) {
                return Err(DataError::InvalidCell {
                    row,
                    column: EXPERIMENT_ID.to_string(),
                    value: id_cell.to_string(),
                });
            }
            let experiment_id = id_cell.to_string();
            out.push(TrainingRecord { experiment_id, features, flags, params });
        }
        Ok(out)
    }
}

impl RecordSource for CsvRecordSource {
    fn fetch_records(&self, dataset_ids: &[String]) -> DataResult<Vec<TrainingRecord>> {
        let mut out = Vec::new();
        for id in dataset_ids {
            out.extend(Self::read_table(&self.dir.join(format!("{id}.csv")))?);
        }
        Ok(out)
    }
}

/// Records held in memory, keyed by dataset id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSource {
    datasets: BTreeMap<String, Vec<TrainingRecord>>,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset_id: impl Into<String>, records: Vec<TrainingRecord>) {
        self.datasets.insert(dataset_id.into(), records);
    }
}

impl RecordSource for InMemoryRecordSource {
    fn fetch_records(&self, dataset_ids: &[String]) -> DataResult<Vec<TrainingRecord>> {
        let mut out = Vec::new();
        for id in dataset_ids {
            let records =
                self.datasets.get(id).ok_or_else(|| DataError::UnknownDataset { id: id.clone() })?;
            out.extend(records.iter().cloned());
        }
        Ok(out)
    }
}

/// Deterministic random permutation of `records`.
pub fn shuffle_records(mut records: Vec<TrainingRecord>, seed: u64) -> Vec<TrainingRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    records.shuffle(&mut rng);
    records
}

#[derive(Debug, Clone, Copy)]
enum Column {
    ExperimentId,
    Feature(FeatureKey),
    Population(PopulationKind),
    Parameter(ParameterKind),
    Other,
}

impl Column {
    fn parse(name: &str) -> Self {
        let name = name.trim();
        if name == EXPERIMENT_ID {
            Column::ExperimentId
        } else if let Ok(k) = name.parse::<FeatureKey>() {
            Column::Feature(k)
        } else if let Ok(p) = name.parse::<PopulationKind>() {
            Column::Population(p)
        } else if let Ok(k) = name.parse::<ParameterKind>() {
            Column::Parameter(k)
        } else {
            Column::Other
        }
    }

    fn name(&self) -> String {
        match self {
            Column::ExperimentId => EXPERIMENT_ID.to_string(),
            Column::Feature(k) => k.name().to_string(),
            Column::Population(p) => p.name().to_string(),
            Column::Parameter(k) => k.name().to_string(),
            Column::Other => String::new(),
        }
    }
}

fn parse_flag(cell: &str) -> Option<bool> {
    match cell.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}

/// `None` when `unidentified` and a scatterer are both set.
fn build_flags(present: &BTreeMap<PopulationKind, bool>) -> Option<PopulationFlags> {
    let is = |p: PopulationKind| present.get(&p).copied().unwrap_or(false);
    if is(PopulationKind::Unidentified) {
        if PopulationKind::SCATTERERS.into_iter().any(is) {
            return None;
        }
        return Some(PopulationFlags::unidentified());
    }
    let identified: Vec<PopulationKind> =
        PopulationKind::SCATTERERS.into_iter().filter(|&p| is(p)).collect();
    Some(PopulationFlags::with_populations(&identified))
}
