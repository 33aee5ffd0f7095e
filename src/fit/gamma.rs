use statrs::function::gamma::digamma;

use super::{FamilyParams, FitOutcome};
use crate::stats::mean;

const MAX_ITERATIONS: usize = 200;
const TOLERANCE: f64 = 1e-10;

pub(crate) fn fit(data: &[f64]) -> FitOutcome {
    let m = mean(data);
    let log_mean = mean(&data.iter().map(|x| x.ln()).collect::<Vec<f64>>());
    let s = m.ln() - log_mean;
    if !s.is_finite() || s <= 0.0 {
        return Err("sample has no spread in log space".to_string());
    }

    // Greenwood-Durand starting point, then Newton on ln(k) - psi(k) - s
    let mut shape = (3.0 - s + ((s - 3.0).powi(2) + 24.0 * s).sqrt()) / (12.0 * s);
    for _ in 0..MAX_ITERATIONS {
        let f = shape.ln() - digamma(shape) - s;
        // psi' by central difference; statrs carries no trigamma
        let h = (shape * 1e-6).max(1e-12);
        let dpsi = (digamma(shape + h) - digamma(shape - h)) / (2.0 * h);
        let df = 1.0 / shape - dpsi;
        let next = shape - f / df;
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
    Ok(FamilyParams::Gamma {
        shape,
        rate: shape / m,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn gamma_sample(shape: f64, scale: f64, count: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let dist = rand_distr::Gamma::new(shape, scale).expect("valid parameters");
        (0..count).map(|_| rng.sample(dist)).collect()
    }

    #[test]
    fn recovers_shape_and_rate() {
        // scale 0.5 corresponds to rate 2
        let data = gamma_sample(3.0, 0.5, 5000, 42);
        let params = fit(&data).expect("fit should succeed");
        match params {
            FamilyParams::Gamma { shape, rate } => {
                assert!((shape - 3.0).abs() / 3.0 < 0.1, "shape {}", shape);
                assert!((rate - 2.0).abs() / 2.0 < 0.1, "rate {}", rate);
            }
            _ => panic!("wrong family"),
        }
    }

    #[test]
    fn estimate_is_a_stationary_point() {
        let data = [0.5, 1.0, 1.5, 2.0, 3.0, 4.5];
        let params = fit(&data).expect("fit should succeed");
        let shape = match params {
            FamilyParams::Gamma { shape, .. } => shape,
            _ => panic!("wrong family"),
        };
        let m = mean(&data);
        let log_mean = mean(&data.iter().map(|x| x.ln()).collect::<Vec<f64>>());
        let residual = shape.ln() - digamma(shape) - (m.ln() - log_mean);
        assert!(residual.abs() < 1e-8, "residual {}", residual);
    }

    #[test]
    fn exponential_data_gives_shape_near_one() {
        let mut rng = StdRng::seed_from_u64(9);
        let dist = rand_distr::Exp::new(1.0).expect("valid rate");
        let data: Vec<f64> = (0..5000).map(|_| rng.sample(dist)).collect();
        let params = fit(&data).expect("fit should succeed");
        match params {
            FamilyParams::Gamma { shape, .. } => {
                assert!(shape > 0.9 && shape < 1.1, "shape {}", shape);
            }
            _ => panic!("wrong family"),
        }
    }

    #[test]
    fn constant_sample_is_rejected() {
        assert!(fit(&[2.0; 40]).is_err());
    }
}
