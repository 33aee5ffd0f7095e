use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::{validate_sample, FittedDist};
use crate::error::Result;

pub const CHI_SQUARE_BINS: usize = 20;
pub const MIN_EXPECTED: f64 = 5.0;

#[derive(Clone, Debug, Serialize)]
pub struct GoodnessOfFit {
    pub ks_statistic: f64,
    pub ks_p_value: f64,
    pub chi_square: Option<ChiSquareTest>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChiSquareTest {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
    pub bins_used: usize,
}

/// Kolmogorov-Smirnov and binned chi-square tests of a fitted distribution
/// against the sample it was fitted to. The chi-square part degenerates on
/// small or spreadless samples and is reported as `None` in that case.
pub fn goodness_of_fit(data: &[f64], fitted: &FittedDist) -> Result<GoodnessOfFit> {
    validate_sample(data)?;
    let mut sorted = data.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    let ks = ks_statistic(&sorted, fitted);
    Ok(GoodnessOfFit {
        ks_statistic: ks,
        ks_p_value: ks_p_value(sorted.len(), ks),
        chi_square: chi_square_test(&sorted, fitted),
    })
}

fn ks_statistic(sorted: &[f64], fitted: &FittedDist) -> f64 {
    let n = sorted.len() as f64;
    let mut d = 0.0_f64;
    for (i, &x) in sorted.iter().enumerate() {
        let cdf = fitted.cdf(x);
        d = d.max(cdf - i as f64 / n);
        d = d.max((i + 1) as f64 / n - cdf);
    }
    d
}

// Stephens' small-sample transform with the asymptotic series tail.
fn ks_p_value(n: usize, d: f64) -> f64 {
    let sqrt_n = (n as f64).sqrt();
    let t = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;
    if t < 0.05 {
        return 1.0;
    }
    let mut p = 0.0;
    for j in 1..=100 {
        let term = 2.0 * (-2.0 * (j as f64).powi(2) * t * t).exp();
        if j % 2 == 1 {
            p += term;
        } else {
            p -= term;
        }
        if term < 1e-10 {
            break;
        }
    }
    p.clamp(0.0, 1.0)
}

fn chi_square_test(sorted: &[f64], fitted: &FittedDist) -> Option<ChiSquareTest> {
    let lo = sorted[0];
    let hi = sorted[sorted.len() - 1];
    if hi <= lo {
        return None;
    }
    let n = sorted.len() as f64;
    let width = (hi - lo) / CHI_SQUARE_BINS as f64;

    let mut observed = [0usize; CHI_SQUARE_BINS];
    for &x in sorted {
        // x == hi lands in the last bin
        let idx = (((x - lo) / width) as usize).min(CHI_SQUARE_BINS - 1);
        observed[idx] += 1;
    }

    let mut statistic = 0.0;
    let mut bins_used = 0;
    for (idx, &obs) in observed.iter().enumerate() {
        let left = lo + idx as f64 * width;
        let right = lo + (idx + 1) as f64 * width;
        let expected = (fitted.cdf(right) - fitted.cdf(left)) * n;
        if expected > MIN_EXPECTED {
            statistic += (obs as f64 - expected).powi(2) / expected;
            bins_used += 1;
        }
    }
    if bins_used < 2 {
        return None;
    }

    let degrees_of_freedom = bins_used - 1;
    let dist = ChiSquared::new(degrees_of_freedom as f64).ok()?;
    Some(ChiSquareTest {
        statistic,
        p_value: 1.0 - dist.cdf(statistic),
        degrees_of_freedom,
        bins_used,
    })
}
