use super::{FamilyParams, FitOutcome};
use crate::stats::mean;

pub(crate) fn fit(data: &[f64]) -> FitOutcome {
    let m = mean(data);
    if !m.is_finite() || m <= 0.0 {
        return Err(format!("sample mean {} out of domain", m));
    }
    Ok(FamilyParams::Exponential { rate: 1.0 / m })
}
