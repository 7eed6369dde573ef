use super::{smooth, CursorFilter};
use crate::{Error, Result};

/// Exponential smoothing filter over screen x/y
pub struct ExponentialFilter {
    alpha: f64,
    last_x: Option<f64>,
    last_y: Option<f64>,
}

impl ExponentialFilter {
    /// Create a filter; `alpha` weights the newest sample
    ///
    /// # Errors
    ///
    /// Returns `FilterError` if alpha is outside `[0, 1]`
    pub fn new(alpha: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(Error::FilterError(format!("Alpha must be in [0, 1], got {alpha}")));
        }
        Ok(Self {
            alpha,
            last_x: None,
            last_y: None,
        })
    }

    #[must_use]
    pub const fn last(&self) -> Option<(f64, f64)> {
        match (self.last_x, self.last_y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}

impl CursorFilter for ExponentialFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        let filtered_x = smooth(self.last_x, x, self.alpha);
        let filtered_y = smooth(self.last_y, y, self.alpha);

        self.last_x = Some(filtered_x);
        self.last_y = Some(filtered_y);

        (filtered_x, filtered_y)
    }

    fn reset(&mut self) {
        self.last_x = None;
        self.last_y = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_filter() {
        let mut filter = ExponentialFilter::new(0.5).unwrap();
        assert_eq!(filter.last(), None);

        // First value passes through
        assert_eq!(filter.apply(100.0, 200.0), (100.0, 200.0));

        // Second value is smoothed
        assert_eq!(filter.apply(200.0, 300.0), (150.0, 250.0));
        assert_eq!(filter.last(), Some((150.0, 250.0)));
    }

    #[test]
    fn test_default_smoothing_lags() {
        let mut filter = ExponentialFilter::new(0.2).unwrap();
        filter.apply(0.0, 0.0);
        let (x, y) = filter.apply(1000.0, 500.0);
        assert!((x - 200.0).abs() < 1e-9);
        assert!((y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_bootstraps_again() {
        let mut filter = ExponentialFilter::new(0.2).unwrap();
        filter.apply(10.0, 10.0);
        filter.reset();
        assert_eq!(filter.apply(960.0, 540.0), (960.0, 540.0));
    }

    #[test]
    fn test_alpha_bounds() {
        assert!(ExponentialFilter::new(0.0).is_ok());
        assert!(ExponentialFilter::new(1.0).is_ok());
        assert!(ExponentialFilter::new(-0.1).is_err());
        assert!(ExponentialFilter::new(f64::NAN).is_err());
    }
}
