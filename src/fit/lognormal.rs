use super::{FamilyParams, FitOutcome};
use crate::stats::{mean, std_dev};

pub(crate) fn fit(data: &[f64]) -> FitOutcome {
    let logs: Vec<f64> = data.iter().map(|x| x.ln()).collect();
    let location = mean(&logs);
    let scale = std_dev(&logs);
    if !location.is_finite() || !scale.is_finite() {
        return Err("log moments are not finite".to_string());
    }
    if scale <= 0.0 {
        return Err("sample has no spread in log space".to_string());
    }
    Ok(FamilyParams::LogNormal { location, scale })
}
