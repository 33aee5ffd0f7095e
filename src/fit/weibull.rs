use super::{FamilyParams, FitOutcome};
use crate::stats::{mean, std_dev};

const MAX_ITERATIONS: usize = 200;
const TOLERANCE: f64 = 1e-10;

pub(crate) fn fit(data: &[f64]) -> FitOutcome {
    let logs: Vec<f64> = data.iter().map(|x| x.ln()).collect();
    let log_mean = mean(&logs);
    let log_std = std_dev(&logs);
    if !log_std.is_finite() || log_std <= 0.0 {
        return Err("sample has no spread in log space".to_string());
    }

    // Menon moment start, then Newton on the profile likelihood equation
    let mut shape = std::f64::consts::PI / (log_std * 6.0_f64.sqrt());
    let n = data.len() as f64;
    for _ in 0..MAX_ITERATIONS {
        let mut sum_pow = 0.0;
        let mut sum_pow_log = 0.0;
        let mut sum_pow_log_sq = 0.0;
        for (&x, &lx) in data.iter().zip(logs.iter()) {
            let p = x.powf(shape);
            sum_pow += p;
            sum_pow_log += p * lx;
            sum_pow_log_sq += p * lx * lx;
        }
        let r = sum_pow_log / sum_pow;
        let g = r - 1.0 / shape - log_mean;
        let dg = sum_pow_log_sq / sum_pow - r * r + 1.0 / (shape * shape);
        let next = shape - g / dg;
        if !next.is_finite() || next <= 0.0 {
            return Err(format!("shape iteration diverged at {}", shape));
        }
        let done = (next - shape).abs() <= TOLERANCE * shape.max(1.0);
        shape = next;
        if done {
            break;
        }
    }

    if !shape.is_finite() || shape <= 0.0 {
        return Err(format!("shape estimate {} out of domain", shape));
    }
    let scale = (data.iter().map(|x| x.powf(shape)).sum::<f64>() / n).powf(1.0 / shape);
    if !scale.is_finite() || scale <= 0.0 {
        return Err(format!("scale estimate {} out of domain", scale));
    }
    Ok(FamilyParams::Weibull { shape, scale })
}
