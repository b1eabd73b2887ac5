//! Statistical utilities for DOE analysis.
//!
//! Provides:
//! - F and Student-t tail probabilities and critical values (via `statrs`)
//! - Shapiro-Wilk normality test (Royston 1995, algorithm AS R94)
//! - Durbin-Watson statistic
//! - Descriptive helpers (mean, sample standard deviation)

use std::f64::consts::FRAC_1_SQRT_2;

use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};

/// Arithmetic mean. NaN for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator). NaN for fewer than 2 values.
#[must_use]
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Minimum and maximum of a slice, `None` when empty.
#[must_use]
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

/// Upper-tail probability P(F > f) for the F-distribution.
///
/// Returns 0 for `f = +∞` and NaN when `f` is NaN or either df is zero.
#[must_use]
pub fn f_distribution_p_value(f: f64, df1: usize, df2: usize) -> f64 {
    if f.is_nan() || df1 == 0 || df2 == 0 {
        return f64::NAN;
    }
    if f == f64::INFINITY {
        return 0.0;
    }
    if f <= 0.0 {
        return 1.0;
    }
    match FisherSnedecor::new(df1 as f64, df2 as f64) {
        Ok(dist) => (1.0 - dist.cdf(f)).max(0.0),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value for a t statistic with `df` degrees of freedom.
#[must_use]
pub fn t_two_sided_p_value(t: f64, df: usize) -> f64 {
    if t.is_nan() || df == 0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    match StudentsT::new(0.0, 1.0, df as f64) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Two-sided critical value t such that P(-t < T < t) = `confidence`.
#[must_use]
pub fn t_critical(confidence: f64, df: usize) -> f64 {
    if df == 0 || confidence <= 0.0 || confidence >= 1.0 {
        return f64::NAN;
    }
    match StudentsT::new(0.0, 1.0, df as f64) {
        Ok(dist) => dist.inverse_cdf(1.0 - (1.0 - confidence) / 2.0),
        Err(_) => f64::NAN,
    }
}

fn standard_normal() -> Option<Normal> {
    Normal::new(0.0, 1.0).ok()
}

/// Upper tail of N(mean, sd) at `x`.
fn normal_upper_tail(x: f64, mean: f64, sd: f64) -> f64 {
    match Normal::new(mean, sd) {
        Ok(dist) => 1.0 - dist.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Durbin-Watson statistic: Σ(eₜ − eₜ₋₁)² / Σeₜ².
///
/// NaN when the residuals are all zero or empty.
#[must_use]
pub fn durbin_watson(residuals: &[f64]) -> f64 {
    let num: f64 = residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    let den: f64 = residuals.iter().map(|e| e * e).sum();
    num / den
}

/// Result of a Shapiro-Wilk test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    /// W statistic in (0, 1].
    pub statistic: f64,
    /// p-value for the null hypothesis of normality.
    pub p_value: f64,
}

/// Evaluate c₀ + c₁x + c₂x² + …
fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Shapiro-Wilk test for normality.
///
/// Follows Royston's (1995) approximation of the weights and of the null
/// distribution of W. Returns `None` outside 3 ≤ n ≤ 5000, for non-finite
/// input, or when the sample has (numerically) zero range.
#[must_use]
pub fn shapiro_wilk(data: &[f64]) -> Option<ShapiroWilk> {
    const C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_19, 4.434_685, -2.706_056];
    const C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];
    const C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
    const C4: [f64; 4] = [1.3822, -0.778_57, 0.062_767, -0.002_032_2];
    const C5: [f64; 4] = [-1.5861, -0.310_82, -0.083_751, 0.003_891_5];
    const C6: [f64; 3] = [-0.4803, -0.082_676, 0.003_030_2];
    const G: [f64; 2] = [-2.273, 0.459];
    const SMALL: f64 = 1e-19;

    let n = data.len();
    if !(3..=5000).contains(&n) || data.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut x = data.to_vec();
    x.sort_by(f64::total_cmp);
    if x[n - 1] - x[0] < SMALL {
        return None;
    }

    let an = n as f64;
    let nn2 = n / 2;
    let mut a = vec![0.0; nn2];

    // Weights for the upper half; a[i] pairs x[n-1-i] with x[i]
    if n == 3 {
        a[0] = FRAC_1_SQRT_2;
    } else {
        let normal = standard_normal()?;
        let an25 = an + 0.25;
        let m: Vec<f64> = (1..=nn2)
            .map(|i| normal.inverse_cdf((i as f64 - 0.375) / an25))
            .collect();
        let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
        let ssumm2 = summ2.sqrt();
        let rsn = 1.0 / an.sqrt();
        let a1 = poly(&C1, rsn) - m[0] / ssumm2;

        let (first, fac) = if n > 5 {
            let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
            let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
                / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
                .sqrt();
            a[1] = a2;
            (2, fac)
        } else {
            let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
            (1, fac)
        };
        a[0] = a1;
        for i in first..nn2 {
            a[i] = -m[i] / fac;
        }
    }

    let xbar = mean(&x);
    let ssq: f64 = x.iter().map(|v| (v - xbar).powi(2)).sum();
    let numer: f64 = (0..nn2).map(|i| a[i] * (x[n - 1 - i] - x[i])).sum();
    let w = (numer * numer / ssq).min(1.0);

    let p_value = if n == 3 {
        const PI6: f64 = 1.909_859_317_102_74;
        const STQR: f64 = 1.047_197_551_196_6;
        (PI6 * (w.sqrt().asin() - STQR)).max(0.0)
    } else {
        let w1 = (1.0 - w).ln();
        if n <= 11 {
            let gamma = poly(&G, an);
            if w1 >= gamma {
                1e-99
            } else {
                let y = -(gamma - w1).ln();
                normal_upper_tail(y, poly(&C3, an), poly(&C4, an).exp())
            }
        } else {
            let ln_n = an.ln();
            normal_upper_tail(w1, poly(&C5, ln_n), poly(&C6, ln_n).exp())
        }
    };

    Some(ShapiroWilk {
        statistic: w,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&v) - 5.0).abs() < 1e-12);
        // sample variance = 32 / 7
        assert!((sample_std(&v) - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!(sample_std(&[1.0]).is_nan());
        assert!(mean(&[]).is_nan());
        assert_eq!(min_max(&v), Some((2.0, 9.0)));
        assert_eq!(min_max(&[]), None);
    }

    #[test]
    fn test_poly() {
        // 1 + 2x + 3x² at x = 2
        assert!((poly(&[1.0, 2.0, 3.0], 2.0) - 17.0).abs() < 1e-12);
    }

    #[test]
    fn test_f_distribution_p_value_bounds() {
        assert!((f_distribution_p_value(0.0, 3, 10) - 1.0).abs() < 1e-10);
        assert_eq!(f_distribution_p_value(f64::INFINITY, 1, 4), 0.0);
        assert!(f_distribution_p_value(f64::NAN, 1, 4).is_nan());
        assert!(f_distribution_p_value(2.0, 1, 0).is_nan());
        assert!(f_distribution_p_value(100.0, 3, 10) < 0.001);
    }

    #[test]
    fn test_f_distribution_p_value_typical() {
        // F(3, 10) critical value at alpha = 0.05 is 3.708
        let p = f_distribution_p_value(3.708, 3, 10);
        assert!((p - 0.05).abs() < 0.002, "got {p}");

        let p_low = f_distribution_p_value(2.0, 3, 10);
        let p_high = f_distribution_p_value(6.0, 3, 10);
        assert!(p_low > p && p > p_high);
    }

    #[test]
    fn test_t_values() {
        assert!((t_critical(0.95, 10) - 2.228).abs() < 0.001);
        assert!((t_critical(0.95, 1) - 12.706).abs() < 0.01);
        assert!((t_critical(0.99, 10) - 3.169).abs() < 0.001);
        assert!(t_critical(0.95, 0).is_nan());

        let p = t_two_sided_p_value(2.228, 10);
        assert!((p - 0.05).abs() < 0.001, "got {p}");
        assert!((t_two_sided_p_value(0.0, 5) - 1.0).abs() < 1e-12);
        assert_eq!(t_two_sided_p_value(f64::INFINITY, 5), 0.0);
    }

    #[test]
    fn test_durbin_watson() {
        // Alternating residuals: num = 3 * 4 = 12, den = 4
        let dw = durbin_watson(&[1.0, -1.0, 1.0, -1.0]);
        assert!((dw - 3.0).abs() < 1e-12);
        // Constant residuals: no change between neighbours
        assert_eq!(durbin_watson(&[1.0, 1.0, 1.0]), 0.0);
        assert!(durbin_watson(&[0.0, 0.0]).is_nan());
    }

    #[test]
    fn test_shapiro_wilk_rejects_degenerate_input() {
        assert!(shapiro_wilk(&[1.0, 2.0]).is_none());
        assert!(shapiro_wilk(&[3.0, 3.0, 3.0, 3.0]).is_none());
        assert!(shapiro_wilk(&[1.0, f64::NAN, 2.0]).is_none());
    }

    #[test]
    fn test_shapiro_wilk_three_points() {
        // Equally spaced triple is as normal as three points get: W = 1
        let sw = shapiro_wilk(&[1.0, 2.0, 3.0]).unwrap();
        assert!((sw.statistic - 1.0).abs() < 1e-12);
        assert!((sw.p_value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_shapiro_wilk_normal_like_sample() {
        let sample = [
            -1.2, -0.8, -0.5, -0.3, -0.1, 0.0, 0.1, 0.3, 0.5, 0.8, 1.2, -0.2, 0.2, 0.6, -0.6,
        ];
        let sw = shapiro_wilk(&sample).unwrap();
        assert!(sw.statistic > 0.9 && sw.statistic <= 1.0);
        assert!(sw.p_value > 0.05, "p = {}", sw.p_value);
    }

    #[test]
    fn test_shapiro_wilk_skewed_sample() {
        let sample = [1.0, 1.0, 1.1, 1.0, 1.2, 1.0, 1.1, 1.0, 1.0, 50.0];
        let sw = shapiro_wilk(&sample).unwrap();
        assert!(sw.statistic < 0.6);
        assert!(sw.p_value < 0.01, "p = {}", sw.p_value);
    }
}
