//! Spectrum input in JSON form.
//!
//! Either a JSON array of records or newline delimited JSON with one record
//! per line. A record looks like
//! `{"id": "scan=1", "precursor_mz": 500.2, "precursor_charge": 2, "rt": 12.5, "mz": [..], "intensity": [..]}`
//! where `precursor_charge` and `rt` are optional.

use crate::errors::{
    FragSeekError,
    Result,
};
use crate::models::Spectrum;
use serde::{
    Deserialize,
    Serialize,
};
use std::io::{
    BufRead,
    BufReader,
    Read,
};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpectrumRecord {
    pub id: String,
    pub precursor_mz: f64,
    #[serde(default)]
    pub precursor_charge: u8,
    #[serde(default)]
    pub rt: Option<f64>,
    pub mz: Vec<f64>,
    pub intensity: Vec<f32>,
}

impl TryFrom<SpectrumRecord> for Spectrum {
    type Error = FragSeekError;

    fn try_from(x: SpectrumRecord) -> Result<Self> {
        let mut spectrum = Spectrum::from_arrays(
            x.id,
            x.precursor_mz,
            x.precursor_charge,
            x.rt,
            &x.mz,
            &x.intensity,
        )?;
        if !spectrum.is_sorted_by_mz() {
            spectrum.sort_by_mz();
        }
        Ok(spectrum)
    }
}

impl From<&Spectrum> for SpectrumRecord {
    fn from(x: &Spectrum) -> Self {
        Self {
            id: x.id.clone(),
            precursor_mz: x.precursor_mz,
            precursor_charge: x.precursor_charge,
            rt: x.rt,
            mz: x.peaks.iter().map(|p| p.mz).collect(),
            intensity: x.peaks.iter().map(|p| p.intensity).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectraFormat {
    JsonArray,
    NdJson,
}

impl SpectraFormat {
    pub fn detect_from_path(path: &Path) -> Self {
        let path_str = path.to_string_lossy().to_lowercase();
        if path_str.ends_with(".ndjson") || path_str.ends_with(".jsonl") {
            SpectraFormat::NdJson
        } else {
            SpectraFormat::JsonArray
        }
    }
}

/// Reads spectra from a file, picking the format from its extension.
pub fn read_spectra(path: impl AsRef<Path>) -> Result<Vec<Spectrum>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| FragSeekError::io(e, path))?;
    let spectra = parse_spectra(file, SpectraFormat::detect_from_path(path))?;
    info!("Read {} spectra from {}", spectra.len(), path.display());
    Ok(spectra)
}

pub fn parse_spectra<R: Read>(reader: R, format: SpectraFormat) -> Result<Vec<Spectrum>> {
    let reader = BufReader::new(reader);
    let records: Vec<SpectrumRecord> = match format {
        SpectraFormat::JsonArray => serde_json::from_reader(reader)?,
        SpectraFormat::NdJson => {
            let mut records = Vec::new();
            for line in reader.lines() {
                let line = line.map_err(|e| FragSeekError::Io {
                    source: e,
                    path: None,
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                records.push(serde_json::from_str(&line)?);
            }
            records
        }
    };
    records.into_iter().map(Spectrum::try_from).collect()
}
