use crate::chemistry::mz_to_neutral_mass;
use crate::errors::{
    FragSeekError,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub mz: f64,
    pub intensity: f32,
}

/// A fragmentation spectrum with its precursor information.
///
/// A precursor charge of 0 means the charge is unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    pub id: String,
    pub precursor_mz: f64,
    pub precursor_charge: u8,
    pub rt: Option<f64>,
    pub peaks: Vec<Peak>,
}

impl Spectrum {
    pub fn new(
        id: impl Into<String>,
        precursor_mz: f64,
        precursor_charge: u8,
        rt: Option<f64>,
        peaks: Vec<Peak>,
    ) -> Self {
        Self {
            id: id.into(),
            precursor_mz,
            precursor_charge,
            rt,
            peaks,
        }
    }

    /// Builds a spectrum from parallel m/z and intensity arrays.
    pub fn from_arrays(
        id: impl Into<String>,
        precursor_mz: f64,
        precursor_charge: u8,
        rt: Option<f64>,
        mz: &[f64],
        intensity: &[f32],
    ) -> Result<Self> {
        if mz.len() != intensity.len() {
            return Err(FragSeekError::Parse {
                msg: format!(
                    "m/z and intensity arrays differ in length ({} vs {})",
                    mz.len(),
                    intensity.len()
                ),
            });
        }
        let peaks = mz
            .iter()
            .zip(intensity.iter())
            .map(|(mz, intensity)| Peak {
                mz: *mz,
                intensity: *intensity,
            })
            .collect();
        Ok(Self::new(id, precursor_mz, precursor_charge, rt, peaks))
    }

    pub fn has_known_charge(&self) -> bool {
        self.precursor_charge > 0
    }

    /// Neutral precursor mass at the given charge.
    pub fn precursor_mass(&self, charge: u8) -> f64 {
        mz_to_neutral_mass(self.precursor_mz, charge)
    }

    pub fn is_sorted_by_mz(&self) -> bool {
        self.peaks.windows(2).all(|w| w[0].mz <= w[1].mz)
    }

    pub fn sort_by_mz(&mut self) {
        self.peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
    }
}
