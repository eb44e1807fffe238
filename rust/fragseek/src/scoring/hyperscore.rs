use crate::fragment_mass::IonSeriesTerminality;
use crate::models::tolerance::ppm_error;
use crate::models::{
    MassTolerance,
    Peak,
};
use crate::utils::math::{
    lnfact,
    median,
};
use crate::utils::ranges::search_range_by_key;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TheoreticalPeak {
    pub mz: f64,
    pub terminality: IonSeriesTerminality,
}

/// Match statistics of a theoretical spectrum against an observed one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PsmDetail {
    pub hyperscore: f64,
    pub matched_nterm: u16,
    pub matched_cterm: u16,
    /// Summed intensity of the matched observed peaks.
    pub dot_product: f64,
    pub mean_abs_error_ppm: f64,
    pub median_abs_error_ppm: f64,
}

/// From: PMC5409104
///
/// `ln(1 + dot) + ln(Nb!) + ln(Ny!)`, where every theoretical peak has unit
/// intensity and matches the closest observed peak within tolerance.
/// Zero when nothing matches. Both inputs have to be sorted by m/z.
///
/// ```
/// use fragseek::fragment_mass::IonSeriesTerminality;
/// use fragseek::models::{MassTolerance, Peak};
/// use fragseek::scoring::hyperscore::{hyperscore, TheoreticalPeak};
///
/// let observed = vec![
///     Peak { mz: 200.0, intensity: 1.0 },
///     Peak { mz: 300.0, intensity: 0.5 },
/// ];
/// let theoretical = vec![
///     TheoreticalPeak { mz: 200.0, terminality: IonSeriesTerminality::NTerm },
///     TheoreticalPeak { mz: 300.0, terminality: IonSeriesTerminality::CTerm },
/// ];
/// let detail = hyperscore(&observed, &theoretical, &MassTolerance::Ppm(10.0));
/// assert_eq!(detail.matched_nterm, 1);
/// assert_eq!(detail.matched_cterm, 1);
/// assert!((detail.hyperscore - 2.5f64.ln()).abs() < 1e-9);
/// ```
pub fn hyperscore(
    observed: &[Peak],
    theoretical: &[TheoreticalPeak],
    tolerance: &MassTolerance,
) -> PsmDetail {
    let mut detail = PsmDetail::default();
    let mut errors: Vec<f64> = Vec::new();

    for theo in theoretical.iter() {
        let (lo, hi) = tolerance.range(theo.mz);
        let candidates = search_range_by_key(observed, lo, hi, |p| p.mz);
        let closest = observed[candidates].iter().min_by(|a, b| {
            (a.mz - theo.mz)
                .abs()
                .total_cmp(&(b.mz - theo.mz).abs())
        });
        let Some(peak) = closest else {
            continue;
        };
        match theo.terminality {
            IonSeriesTerminality::NTerm => detail.matched_nterm += 1,
            IonSeriesTerminality::CTerm => detail.matched_cterm += 1,
        }
        detail.dot_product += peak.intensity as f64;
        errors.push(ppm_error(theo.mz, peak.mz).abs());
    }

    if errors.is_empty() {
        return detail;
    }
    detail.mean_abs_error_ppm = errors.iter().sum::<f64>() / errors.len() as f64;
    detail.median_abs_error_ppm = median(&errors).unwrap_or_default();
    detail.hyperscore = detail.dot_product.ln_1p()
        + lnfact(detail.matched_nterm)
        + lnfact(detail.matched_cterm);
    detail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_matches_scores_zero() {
        let observed = vec![Peak {
            mz: 500.0,
            intensity: 1.0,
        }];
        let theoretical = vec![TheoreticalPeak {
            mz: 200.0,
            terminality: IonSeriesTerminality::NTerm,
        }];
        let detail = hyperscore(&observed, &theoretical, &MassTolerance::Ppm(10.0));
        assert_eq!(detail, PsmDetail::default());
    }

    #[test]
    fn test_more_matches_score_higher() {
        let observed: Vec<Peak> = (1..=6)
            .map(|i| Peak {
                mz: 100.0 * i as f64,
                intensity: 1.0,
            })
            .collect();
        let theo = |n: usize| -> Vec<TheoreticalPeak> {
            (1..=n)
                .map(|i| TheoreticalPeak {
                    mz: 100.0 * i as f64,
                    terminality: IonSeriesTerminality::CTerm,
                })
                .collect()
        };
        let tol = MassTolerance::Absolute(0.01);
        let three = hyperscore(&observed, &theo(3), &tol);
        let six = hyperscore(&observed, &theo(6), &tol);
        assert_eq!(six.matched_cterm, 6);
        assert!(six.hyperscore > three.hyperscore);
        assert_eq!(six.median_abs_error_ppm, 0.0);
    }

    #[test]
    fn test_theoretical_peak_serializes() {
        let peak = TheoreticalPeak {
            mz: 250.5,
            terminality: IonSeriesTerminality::CTerm,
        };
        let json = serde_json::to_string(&peak).unwrap();
        assert_eq!(json, r#"{"mz":250.5,"terminality":"cterm"}"#);
    }
}
