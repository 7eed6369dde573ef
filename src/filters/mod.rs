//! Cursor smoothing.
//!
//! Mapped screen positions jitter with every landmark update; the filters
//! here damp that jitter before the cursor is moved.

/// Exponential moving average filter
pub mod exponential;

use crate::Result;

/// One exponential smoothing step.
///
/// The first sample passes through unchanged.
#[must_use]
pub fn smooth(prev: Option<f64>, new: f64, alpha: f64) -> f64 {
    match prev {
        Some(prev) => prev + (new - prev) * alpha,
        None => new,
    }
}

/// Trait for all cursor filters
pub trait CursorFilter: Send + Sync {
    /// Apply filter to a screen position
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64);

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl CursorFilter for NoFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a cursor filter from `none`, `exponential` or `exponential:<alpha>`
///
/// # Errors
///
/// Returns `FilterError` for unknown names or an alpha outside `[0, 1]`
pub fn create_filter(spec: &str, default_alpha: f64) -> Result<Box<dyn CursorFilter>> {
    let spec = spec.to_lowercase();
    let (name, param) = match spec.split_once(':') {
        Some((name, param)) => (name, Some(param)),
        None => (spec.as_str(), None),
    };

    match name {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "exponential" | "ema" => {
            let alpha = match param {
                Some(p) => p
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| crate::Error::FilterError(format!("Alpha '{p}' is not a number: {e}")))?,
                None => default_alpha,
            };
            Ok(Box::new(exponential::ExponentialFilter::new(alpha)?))
        }
        _ => Err(crate::Error::FilterError(format!("Unknown filter type: {spec}"))),
    }
}
