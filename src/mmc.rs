use serde::Serialize;

use crate::error::{Error, Result};

/// Steady-state M/M/c model: Poisson arrivals at `lambda`, exponential
/// service at `mu`, `servers` identical servers behind one FCFS queue.
#[derive(Clone, Debug)]
pub struct MmcQueue {
    lambda: f64,
    mu: f64,
    servers: u32,
    rho: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct MmcMetrics {
    pub stable: bool,
    pub rho: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub steady_state: Option<SteadyState>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SteadyState {
    pub utilization_percent: f64,
    pub p0: f64,
    pub p_wait: f64,
    pub lq: f64,
    pub l: f64,
    pub wq: f64,
    pub w: f64,
    pub lambda: f64,
    pub mu: f64,
    pub servers: u32,
}

pub(crate) fn validate_rates(lambda: f64, mu: f64) -> Result<()> {
    if !lambda.is_finite() || lambda <= 0.0 {
        return Err(Error::InvalidArrivalRate(lambda));
    }
    if !mu.is_finite() || mu <= 0.0 {
        return Err(Error::InvalidServiceRate(mu));
    }
    Ok(())
}

impl MmcQueue {
    pub fn new(lambda: f64, mu: f64, servers: u32) -> Result<Self> {
        validate_rates(lambda, mu)?;
        if servers == 0 {
            return Err(Error::InvalidServerCount);
        }
        let rho = lambda / (servers as f64 * mu);
        Ok(Self {
            lambda,
            mu,
            servers,
            rho,
        })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn servers(&self) -> u32 {
        self.servers
    }

    pub fn utilization(&self) -> f64 {
        self.rho
    }

    pub fn is_stable(&self) -> bool {
        self.rho < 1.0
    }

    pub fn metrics(&self) -> MmcMetrics {
        if !self.is_stable() {
            return MmcMetrics {
                stable: false,
                rho: self.rho,
                message: Some(format!(
                    "unstable system: rho = {:.4} >= 1, needs more than {:.2} servers",
                    self.rho,
                    self.lambda / self.mu
                )),
                steady_state: None,
            };
        }

        let a = self.lambda / self.mu;
        // a^n/n! accumulated term by term; naive factorials overflow f64 past n = 170
        let mut term = 1.0;
        let mut sum = 1.0;
        for n in 1..self.servers {
            term *= a / n as f64;
            sum += term;
        }
        let erlang_term = term * a / self.servers as f64 / (1.0 - self.rho);
        let p0 = 1.0 / (sum + erlang_term);
        let p_wait = erlang_term * p0;
        let lq = p_wait * self.rho / (1.0 - self.rho);
        let wq = lq / self.lambda;
        let l = lq + a;
        let w = wq + 1.0 / self.mu;

        MmcMetrics {
            stable: true,
            rho: self.rho,
            message: None,
            steady_state: Some(SteadyState {
                utilization_percent: self.rho * 100.0,
                p0,
                p_wait,
                lq,
                l,
                wq,
                w,
                lambda: self.lambda,
                mu: self.mu,
                servers: self.servers,
            }),
        }
    }
}
