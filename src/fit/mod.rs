mod exponential;
mod gamma;
mod gof;
mod lognormal;
mod weibull;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Exp, Gamma, LogNormal, Weibull};
use tracing::warn;

use crate::error::{Error, Result};
use crate::stats::{linspace, percentile};

pub use gof::{goodness_of_fit, ChiSquareTest, GoodnessOfFit, CHI_SQUARE_BINS, MIN_EXPECTED};

pub const QQ_POINTS: usize = 100;
pub const PDF_POINTS: usize = 1000;

/// Candidate distribution families for interarrival and service samples.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    Exponential,
    Gamma,
    LogNormal,
    Weibull,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Criterion {
    Aic,
    Bic,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FamilyParams {
    Exponential { rate: f64 },
    Gamma { shape: f64, rate: f64 },
    LogNormal { location: f64, scale: f64 },
    Weibull { shape: f64, scale: f64 },
}

/// A buildable fitted distribution: parameters plus the statrs object
/// answering pdf/cdf/quantile queries.
#[derive(Clone, Debug)]
pub struct FittedDist {
    family: Family,
    params: FamilyParams,
    dist: Dist,
}

#[derive(Clone, Debug)]
enum Dist {
    Exponential(Exp),
    Gamma(Gamma),
    LogNormal(LogNormal),
    Weibull(Weibull),
}

#[derive(Clone, Debug, Serialize)]
pub struct FitResult {
    pub family: Family,
    pub params: FamilyParams,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct FitFailure {
    pub family: Family,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct FitReport {
    pub sample_size: usize,
    pub fits: Vec<FitResult>,
    pub failures: Vec<FitFailure>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FitPlot {
    pub family: Family,
    pub params: FamilyParams,
    pub qq_theoretical: Vec<f64>,
    pub qq_sample: Vec<f64>,
    pub pdf_x: Vec<f64>,
    pub pdf_y: Vec<f64>,
}

pub(crate) type FitOutcome = std::result::Result<FamilyParams, String>;

impl Family {
    pub const ALL: [Family; 4] = [
        Family::Exponential,
        Family::Gamma,
        Family::LogNormal,
        Family::Weibull,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Family::Exponential => "exponential",
            Family::Gamma => "gamma",
            Family::LogNormal => "log-normal",
            Family::Weibull => "weibull",
        }
    }

    pub fn param_count(&self) -> usize {
        match self {
            Family::Exponential => 1,
            Family::Gamma | Family::LogNormal | Family::Weibull => 2,
        }
    }

    fn fit(&self, data: &[f64]) -> FitOutcome {
        match self {
            Family::Exponential => exponential::fit(data),
            Family::Gamma => gamma::fit(data),
            Family::LogNormal => lognormal::fit(data),
            Family::Weibull => weibull::fit(data),
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Criterion {
    pub fn name(&self) -> &'static str {
        match self {
            Criterion::Aic => "aic",
            Criterion::Bic => "bic",
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FamilyParams {
    pub fn family(&self) -> Family {
        match self {
            FamilyParams::Exponential { .. } => Family::Exponential,
            FamilyParams::Gamma { .. } => Family::Gamma,
            FamilyParams::LogNormal { .. } => Family::LogNormal,
            FamilyParams::Weibull { .. } => Family::Weibull,
        }
    }

    pub fn distribution(&self) -> Result<FittedDist> {
        let dist = match *self {
            FamilyParams::Exponential { rate } => Exp::new(rate)
                .map(Dist::Exponential)
                .map_err(|err| Error::InvalidDistribution(err.to_string()))?,
            FamilyParams::Gamma { shape, rate } => Gamma::new(shape, rate)
                .map(Dist::Gamma)
                .map_err(|err| Error::InvalidDistribution(err.to_string()))?,
            FamilyParams::LogNormal { location, scale } => LogNormal::new(location, scale)
                .map(Dist::LogNormal)
                .map_err(|err| Error::InvalidDistribution(err.to_string()))?,
            FamilyParams::Weibull { shape, scale } => Weibull::new(shape, scale)
                .map(Dist::Weibull)
                .map_err(|err| Error::InvalidDistribution(err.to_string()))?,
        };
        Ok(FittedDist {
            family: self.family(),
            params: *self,
            dist,
        })
    }
}

impl FittedDist {
    pub fn family(&self) -> Family {
        self.family
    }

    pub fn params(&self) -> FamilyParams {
        self.params
    }

    pub fn pdf(&self, x: f64) -> f64 {
        match &self.dist {
            Dist::Exponential(d) => d.pdf(x),
            Dist::Gamma(d) => d.pdf(x),
            Dist::LogNormal(d) => d.pdf(x),
            Dist::Weibull(d) => d.pdf(x),
        }
    }

    pub fn ln_pdf(&self, x: f64) -> f64 {
        match &self.dist {
            Dist::Exponential(d) => d.ln_pdf(x),
            Dist::Gamma(d) => d.ln_pdf(x),
            Dist::LogNormal(d) => d.ln_pdf(x),
            Dist::Weibull(d) => d.ln_pdf(x),
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        match &self.dist {
            Dist::Exponential(d) => d.cdf(x),
            Dist::Gamma(d) => d.cdf(x),
            Dist::LogNormal(d) => d.cdf(x),
            Dist::Weibull(d) => d.cdf(x),
        }
    }

    pub fn quantile(&self, p: f64) -> f64 {
        match &self.dist {
            Dist::Exponential(d) => d.inverse_cdf(p),
            Dist::Gamma(d) => d.inverse_cdf(p),
            Dist::LogNormal(d) => d.inverse_cdf(p),
            Dist::Weibull(d) => d.inverse_cdf(p),
        }
    }

    pub fn log_likelihood(&self, data: &[f64]) -> f64 {
        data.iter().map(|&x| self.ln_pdf(x)).sum()
    }
}

impl FitResult {
    pub fn criterion_value(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Aic => self.aic,
            Criterion::Bic => self.bic,
        }
    }

    pub fn distribution(&self) -> Result<FittedDist> {
        self.params.distribution()
    }
}

impl FitReport {
    pub fn best(&self, criterion: Criterion) -> Option<&FitResult> {
        self.fits.iter().min_by(|a, b| {
            a.criterion_value(criterion)
                .total_cmp(&b.criterion_value(criterion))
        })
    }
}

pub(crate) fn validate_sample(data: &[f64]) -> Result<()> {
    if data.is_empty() {
        return Err(Error::EmptySample);
    }
    for &x in data {
        if !x.is_finite() || x <= 0.0 {
            return Err(Error::InvalidSampleValue(x));
        }
    }
    Ok(())
}

/// Fit every requested family by maximum likelihood. Individual families
/// failing to converge are recorded and skipped, never fatal.
pub fn fit_all(data: &[f64], families: &[Family]) -> Result<FitReport> {
    validate_sample(data)?;
    let n = data.len() as f64;
    let mut fits = Vec::new();
    let mut failures = Vec::new();

    for &family in families {
        let outcome = family.fit(data).and_then(|params| {
            params
                .distribution()
                .map(|dist| (params, dist))
                .map_err(|err| err.to_string())
        });
        match outcome {
            Ok((params, dist)) => {
                let log_likelihood = dist.log_likelihood(data);
                if !log_likelihood.is_finite() {
                    warn!(family = %family, "log-likelihood is not finite, skipping");
                    failures.push(FitFailure {
                        family,
                        reason: "log-likelihood is not finite".to_string(),
                    });
                    continue;
                }
                let k = family.param_count() as f64;
                fits.push(FitResult {
                    family,
                    params,
                    log_likelihood,
                    aic: 2.0 * k - 2.0 * log_likelihood,
                    bic: k * n.ln() - 2.0 * log_likelihood,
                });
            }
            Err(reason) => {
                warn!(family = %family, reason = %reason, "fit failed, skipping");
                failures.push(FitFailure { family, reason });
            }
        }
    }

    Ok(FitReport {
        sample_size: data.len(),
        fits,
        failures,
    })
}

pub fn best_fit(
    data: &[f64],
    families: &[Family],
    criterion: Criterion,
) -> Result<Option<FitResult>> {
    Ok(fit_all(data, families)?.best(criterion).cloned())
}

/// Q-Q and density-overlay coordinates for the presentation layer.
pub fn plot_data(data: &[f64], fitted: &FittedDist) -> Result<FitPlot> {
    validate_sample(data)?;
    let mut sorted = data.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    let qq_theoretical: Vec<f64> = linspace(0.01, 0.99, QQ_POINTS)
        .iter()
        .map(|&p| fitted.quantile(p))
        .collect();
    let qq_sample: Vec<f64> = linspace(1.0, 99.0, QQ_POINTS)
        .iter()
        .map(|&pct| percentile(&sorted, pct))
        .collect();

    let lo = sorted[0];
    let hi = sorted[sorted.len() - 1];
    let pdf_x = linspace(lo, hi, PDF_POINTS);
    let pdf_y: Vec<f64> = pdf_x.iter().map(|&x| fitted.pdf(x)).collect();

    Ok(FitPlot {
        family: fitted.family(),
        params: fitted.params(),
        qq_theoretical,
        qq_sample,
        pdf_x,
        pdf_y,
    })
}
