use crate::errors::{
    FragSeekError,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Symmetric mass tolerance, either in daltons or parts-per-million.
///
/// Tolerances are expressed as positive values: a tolerance of 1 Da on a
/// mass of 10 is the closed window `[9, 11]`.
///
/// ```
/// use fragseek::models::MassTolerance;
///
/// let tol: MassTolerance = serde_json::from_str(r#"{"ppm": 10.0}"#).unwrap();
/// assert_eq!(tol, MassTolerance::Ppm(10.0));
/// let (lo, hi) = tol.range(1000.0);
/// assert!((lo - 999.99).abs() < 1e-9);
/// assert!((hi - 1000.01).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum MassTolerance {
    #[serde(rename = "da")]
    Absolute(f64),
    #[serde(rename = "ppm")]
    Ppm(f64),
}

impl MassTolerance {
    /// Half width of the window around `mass`, in daltons.
    pub fn width_at(&self, mass: f64) -> f64 {
        match self {
            MassTolerance::Absolute(da) => *da,
            MassTolerance::Ppm(ppm) => mass.abs() * ppm / 1e6,
        }
    }

    pub fn range(&self, mass: f64) -> (f64, f64) {
        let width = self.width_at(mass);
        (mass - width, mass + width)
    }

    pub fn contains(&self, reference: f64, observed: f64) -> bool {
        let (lo, hi) = self.range(reference);
        lo <= observed && observed <= hi
    }

    pub fn validate(&self, field: &'static str) -> Result<()> {
        let value = match self {
            MassTolerance::Absolute(x) => *x,
            MassTolerance::Ppm(x) => *x,
        };
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(FragSeekError::config(
                field,
                format!("tolerance must be finite and non-negative, got {value}"),
            ))
        }
    }
}

/// Signed error of `observed` relative to `reference`, in ppm.
pub fn ppm_error(reference: f64, observed: f64) -> f64 {
    (observed - reference) / reference * 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_bounds_are_inclusive() {
        let tol = MassTolerance::Absolute(0.5);
        assert!(tol.contains(100.0, 100.5));
        assert!(tol.contains(100.0, 99.5));
        assert!(!tol.contains(100.0, 100.5000001));
    }

    #[test]
    fn test_validate() {
        assert!(MassTolerance::Ppm(10.0).validate("tol").is_ok());
        assert!(MassTolerance::Absolute(0.0).validate("tol").is_ok());
        assert!(MassTolerance::Absolute(-0.1).validate("tol").is_err());
        assert!(MassTolerance::Ppm(f64::NAN).validate("tol").is_err());
    }

    #[test]
    fn test_ppm_error() {
        assert!((ppm_error(1000.0, 1000.01) - 10.0).abs() < 1e-6);
    }
}
