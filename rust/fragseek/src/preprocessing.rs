//! Spectrum cleanup before tagging and scoring.

use crate::errors::{
    FragSeekError,
    Result,
};
use crate::models::{
    Peak,
    Spectrum,
};
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Width of the jumping m/z windows of the window mower.
    pub window_size: f64,
    /// Most intense peaks kept per window.
    pub peaks_per_window: usize,
    /// Most intense peaks kept overall.
    pub max_peaks: usize,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            window_size: 100.0,
            peaks_per_window: 20,
            max_peaks: 400,
        }
    }
}

impl PreprocessingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.window_size.is_finite() && self.window_size > 0.0) {
            return Err(FragSeekError::config(
                "preprocessing.window_size",
                format!("must be positive, got {}", self.window_size),
            ));
        }
        if self.peaks_per_window == 0 || self.max_peaks == 0 {
            return Err(FragSeekError::config(
                "preprocessing",
                "peak limits must be positive",
            ));
        }
        Ok(())
    }
}

/// Returns a cleaned copy of `spectrum`: non-positive or non-finite peaks
/// dropped, intensities scaled to a maximum of 1, window-mowed, capped to
/// the `max_peaks` most intense and sorted by m/z.
pub fn preprocess(spectrum: &Spectrum, config: &PreprocessingConfig) -> Spectrum {
    let mut peaks: Vec<Peak> = spectrum
        .peaks
        .iter()
        .filter(|p| p.mz.is_finite() && p.intensity.is_finite() && p.intensity > 0.0)
        .copied()
        .collect();

    let max_intensity = peaks.iter().map(|p| p.intensity).fold(0.0f32, f32::max);
    if max_intensity > 0.0 {
        peaks.iter_mut().for_each(|p| p.intensity /= max_intensity);
    }

    peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
    let mut peaks = window_mower(peaks, config.window_size, config.peaks_per_window);
    keep_most_intense(&mut peaks, config.max_peaks);
    peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));

    Spectrum::new(
        spectrum.id.clone(),
        spectrum.precursor_mz,
        spectrum.precursor_charge,
        spectrum.rt,
        peaks,
    )
}

/// Keeps the `per_window` most intense peaks of each consecutive m/z window
/// of width `window`, starting at the first peak. Expects peaks sorted by m/z.
fn window_mower(peaks: Vec<Peak>, window: f64, per_window: usize) -> Vec<Peak> {
    let mut out = Vec::with_capacity(peaks.len());
    let mut start = 0;
    while start < peaks.len() {
        let window_end = peaks[start].mz + window;
        let len = peaks[start..]
            .partition_point(|p| p.mz < window_end)
            .max(1);
        let mut local = peaks[start..start + len].to_vec();
        keep_most_intense(&mut local, per_window);
        out.extend(local);
        start += len;
    }
    out
}

/// Stable: among equal intensities the earlier peak wins.
fn keep_most_intense(peaks: &mut Vec<Peak>, n: usize) {
    if peaks.len() <= n {
        return;
    }
    peaks.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
    peaks.truncate(n);
}
