//! Descriptive statistics of a response.

use super::stats::{mean, min_max, sample_std};
use super::types::Summary;
use crate::error::{Error, Result};

/// Summarize the present values of a response.
///
/// # Errors
///
/// Returns [`Error::Statistic`] when the response has no values.
pub fn summarize(response: &[Option<f64>]) -> Result<Summary> {
    let values: Vec<f64> = response.iter().flatten().copied().collect();
    let (min, max) = min_max(&values).ok_or_else(|| Error::statistic("response has no values"))?;
    let mean = mean(&values);
    let std = if values.len() > 1 { sample_std(&values) } else { 0.0 };
    Ok(Summary {
        mean,
        std,
        min,
        max,
        range: max - min,
        cv: (mean != 0.0).then(|| std / mean * 100.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let s = summarize(&[Some(2.0), None, Some(4.0), Some(6.0)]).unwrap();
        assert_eq!(s.mean, 4.0);
        assert_eq!(s.std, 2.0);
        assert_eq!((s.min, s.max, s.range), (2.0, 6.0, 4.0));
        assert_eq!(s.cv, Some(50.0));
    }

    #[test]
    fn test_single_value_and_zero_mean() {
        let s = summarize(&[Some(3.0)]).unwrap();
        assert_eq!(s.std, 0.0);
        assert_eq!(s.range, 0.0);

        let s = summarize(&[Some(-1.0), Some(1.0)]).unwrap();
        assert_eq!(s.cv, None);
    }

    #[test]
    fn test_empty_response_fails() {
        assert!(matches!(summarize(&[None, None]), Err(Error::Statistic { .. })));
    }
}
