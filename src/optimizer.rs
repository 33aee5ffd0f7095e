use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::mmc::{validate_rates, MmcMetrics, MmcQueue};

/// Sentinel cost for infeasible server counts, strictly worse than any
/// feasible configuration.
pub const INFEASIBLE_COST: f64 = 1e10;
pub const DEFAULT_C_MIN: u32 = 1;
pub const DEFAULT_C_MAX: u32 = 50;
// Auto-range sweeps run from the stability floor through floor + span,
// inclusive on both ends.
const SENSITIVITY_SPAN: u32 = 20;

#[derive(Clone, Debug)]
pub struct CostOptimizer {
    lambda: f64,
    mu: f64,
    server_cost: f64,
    waiting_cost: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Evaluation {
    pub servers: u32,
    pub cost: f64,
    pub lq: f64,
    pub wq: f64,
    pub rho: f64,
    pub meets_sla: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Optimum {
    pub servers: u32,
    pub total_cost: f64,
    pub server_cost: f64,
    pub waiting_cost: f64,
    pub metrics: MmcMetrics,
}

#[derive(Clone, Debug, Serialize)]
pub struct OptimizationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimum: Option<Optimum>,
    pub evaluations: Vec<Evaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla_wq: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SensitivityReport {
    pub servers: Vec<u32>,
    pub total_cost: Vec<f64>,
    pub server_cost: Vec<f64>,
    pub waiting_cost: Vec<f64>,
    pub rho: Vec<f64>,
    pub wq: Vec<f64>,
    pub lq: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_servers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_cost: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Scenario {
    pub name: String,
    pub server_cost: f64,
    pub waiting_cost: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    #[serde(flatten)]
    pub result: OptimizationResult,
}

struct Best {
    servers: u32,
    cost: f64,
    lq: f64,
    metrics: MmcMetrics,
}

impl CostOptimizer {
    pub fn new(lambda: f64, mu: f64, server_cost: f64, waiting_cost: f64) -> Result<Self> {
        validate_rates(lambda, mu)?;
        Ok(Self {
            lambda,
            mu,
            server_cost,
            waiting_cost,
        })
    }

    /// Smallest server count with rho strictly below 1, saturating at
    /// u32::MAX for extreme rate ratios.
    fn stability_floor(&self) -> u32 {
        let offered_load = (self.lambda / self.mu).ceil();
        (offered_load as u32).saturating_add(1)
    }

    /// Total cost Z(c) = c * server_cost + Lq(c) * waiting_cost.
    pub fn objective(&self, servers: u32) -> f64 {
        if servers == 0 {
            return INFEASIBLE_COST;
        }
        let queue = match MmcQueue::new(self.lambda, self.mu, servers) {
            Ok(queue) => queue,
            Err(_) => return INFEASIBLE_COST,
        };
        match queue.metrics().steady_state {
            Some(state) => servers as f64 * self.server_cost + state.lq * self.waiting_cost,
            None => INFEASIBLE_COST,
        }
    }

    pub fn optimize(&self, c_min: u32, c_max: u32, sla_wq: Option<f64>) -> OptimizationResult {
        let start = c_min.max(self.stability_floor());
        let mut evaluations = Vec::new();
        let mut best: Option<Best> = None;

        for servers in start..=c_max {
            let queue = match MmcQueue::new(self.lambda, self.mu, servers) {
                Ok(queue) => queue,
                Err(_) => continue,
            };
            let metrics = queue.metrics();
            let rho = metrics.rho;
            let state = match metrics.steady_state.as_ref() {
                Some(state) => state.clone(),
                None => continue,
            };
            if let Some(cap) = sla_wq {
                if state.wq > cap {
                    continue;
                }
            }

            let cost = self.objective(servers);
            evaluations.push(Evaluation {
                servers,
                cost,
                lq: state.lq,
                wq: state.wq,
                rho,
                meets_sla: sla_wq.map_or(true, |cap| state.wq <= cap),
            });

            if best.as_ref().map_or(true, |b| cost < b.cost) {
                best = Some(Best {
                    servers,
                    cost,
                    lq: state.lq,
                    metrics,
                });
            }
        }

        debug!(
            from = start,
            to = c_max,
            feasible = evaluations.len(),
            "server count scan complete"
        );

        match best {
            Some(best) => OptimizationResult {
                success: true,
                message: None,
                optimum: Some(Optimum {
                    servers: best.servers,
                    total_cost: best.cost,
                    server_cost: best.servers as f64 * self.server_cost,
                    waiting_cost: best.lq * self.waiting_cost,
                    metrics: best.metrics,
                }),
                evaluations,
                sla_wq,
            },
            None => OptimizationResult {
                success: false,
                message: Some(format!(
                    "no feasible server count in range [{}, {}]; increase c_max or relax the SLA",
                    c_min, c_max
                )),
                optimum: None,
                evaluations,
                sla_wq,
            },
        }
    }

    pub fn sensitivity_analysis(&self, range: Option<(u32, u32)>) -> SensitivityReport {
        let (lo, hi) = range.unwrap_or_else(|| {
            let floor = self.stability_floor();
            (floor, floor.saturating_add(SENSITIVITY_SPAN))
        });

        let mut report = SensitivityReport {
            servers: Vec::new(),
            total_cost: Vec::new(),
            server_cost: Vec::new(),
            waiting_cost: Vec::new(),
            rho: Vec::new(),
            wq: Vec::new(),
            lq: Vec::new(),
            optimal_servers: None,
            optimal_cost: None,
        };

        for servers in lo..=hi {
            let queue = match MmcQueue::new(self.lambda, self.mu, servers) {
                Ok(queue) => queue,
                Err(_) => continue,
            };
            let metrics = queue.metrics();
            let state = match metrics.steady_state {
                Some(state) => state,
                None => continue,
            };
            let total = servers as f64 * self.server_cost + state.lq * self.waiting_cost;

            report.servers.push(servers);
            report.total_cost.push(total);
            report.server_cost.push(servers as f64 * self.server_cost);
            report.waiting_cost.push(state.lq * self.waiting_cost);
            report.rho.push(metrics.rho);
            report.wq.push(state.wq);
            report.lq.push(state.lq);

            if report.optimal_cost.map_or(true, |cost| total < cost) {
                report.optimal_servers = Some(servers);
                report.optimal_cost = Some(total);
            }
        }

        report
    }

    pub fn compare_scenarios(
        lambda: f64,
        mu: f64,
        scenarios: &[Scenario],
    ) -> Result<Vec<ScenarioOutcome>> {
        scenarios
            .iter()
            .map(|scenario| {
                let optimizer =
                    CostOptimizer::new(lambda, mu, scenario.server_cost, scenario.waiting_cost)?;
                let result = optimizer.optimize(DEFAULT_C_MIN, DEFAULT_C_MAX, None);
                Ok(ScenarioOutcome {
                    name: scenario.name.clone(),
                    result,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn optimizer(server_cost: f64, waiting_cost: f64) -> CostOptimizer {
        CostOptimizer::new(120.0, 30.0, server_cost, waiting_cost).expect("valid parameters")
    }

    #[test]
    fn optimum_matches_brute_force_table() {
        let result = optimizer(50.0, 20.0).optimize(5, 15, None);
        assert!(result.success);

        let optimum = result.optimum.expect("feasible search");
        assert_eq!(optimum.servers, 5);
        assert!((optimum.total_cost - 294.329).abs() < 1e-3);

        let argmin = result
            .evaluations
            .iter()
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
            .expect("non-empty table");
        assert_eq!(argmin.servers, optimum.servers);
        assert!((argmin.cost - optimum.total_cost).abs() < 1e-12);
    }

    #[test]
    fn evaluation_table_is_ascending_and_complete() {
        let result = optimizer(50.0, 20.0).optimize(5, 15, None);
        let counts: Vec<u32> = result.evaluations.iter().map(|e| e.servers).collect();
        assert_eq!(counts, (5..=15).collect::<Vec<u32>>());
        assert!(result.evaluations.iter().all(|e| e.rho < 1.0));
        assert!(result.evaluations.iter().all(|e| e.meets_sla));
    }

    #[test]
    fn scan_starts_at_stability_floor() {
        // lambda/mu = 4, so counts below 5 are never evaluated
        let result = optimizer(50.0, 20.0).optimize(1, 10, None);
        assert_eq!(result.evaluations[0].servers, 5);
    }

    #[test]
    fn infeasible_when_cmax_below_stability() {
        let result = optimizer(50.0, 20.0).optimize(1, 4, None);
        assert!(!result.success);
        assert!(result.optimum.is_none());
        assert!(result.evaluations.is_empty());
        assert!(result.message.expect("diagnostic").contains("[1, 4]"));
    }

    #[test]
    fn extreme_rate_ratio_is_infeasible() {
        // lambda / mu past u32 range must saturate the floor, not overflow
        let opt = CostOptimizer::new(1.0e10, 1.0, 50.0, 20.0).expect("valid parameters");

        let result = opt.optimize(1, 5, None);
        assert!(!result.success);
        assert!(result.optimum.is_none());
        assert!(result.evaluations.is_empty());

        let report = opt.sensitivity_analysis(None);
        assert!(report.servers.is_empty());
        assert_eq!(report.optimal_servers, None);
    }

    #[test]
    fn sla_excludes_slow_configurations() {
        let cap = 0.002;
        let result = optimizer(50.0, 20.0).optimize(5, 15, Some(cap));
        assert!(result.success);
        assert_eq!(result.optimum.expect("feasible search").servers, 7);
        assert!(result.evaluations.iter().all(|e| e.wq <= cap));
        assert_eq!(result.evaluations[0].servers, 7);
        assert_eq!(result.sla_wq, Some(cap));
    }

    #[test]
    fn objective_uses_sentinel_for_infeasible_counts() {
        let opt = optimizer(50.0, 20.0);
        assert_eq!(opt.objective(0), INFEASIBLE_COST);
        assert_eq!(opt.objective(3), INFEASIBLE_COST);
        assert_eq!(opt.objective(4), INFEASIBLE_COST); // rho exactly 1
        assert!(opt.objective(5) < INFEASIBLE_COST);
        assert!((opt.objective(5) - 294.329).abs() < 1e-3);
    }

    #[test]
    fn sensitivity_auto_range_spans_twenty_one_counts() {
        let report = optimizer(50.0, 20.0).sensitivity_analysis(None);
        assert_eq!(report.servers.len(), 21);
        assert_eq!(report.servers[0], 5);
        assert_eq!(*report.servers.last().expect("non-empty"), 25);
        assert_eq!(report.total_cost.len(), report.servers.len());
        assert_eq!(report.wq.len(), report.servers.len());
        assert_eq!(report.optimal_servers, Some(5));
        assert!((report.optimal_cost.expect("optimum") - 294.329).abs() < 1e-3);
    }

    #[test]
    fn sensitivity_skips_unstable_counts_in_explicit_range() {
        let report = optimizer(50.0, 20.0).sensitivity_analysis(Some((1, 8)));
        assert_eq!(report.servers, vec![5, 6, 7, 8]);
    }

    #[test]
    fn scenarios_optimize_independently() {
        let scenarios = vec![
            Scenario {
                name: "cheap servers".to_string(),
                server_cost: 10.0,
                waiting_cost: 100.0,
            },
            Scenario {
                name: "expensive servers".to_string(),
                server_cost: 100.0,
                waiting_cost: 10.0,
            },
        ];
        let outcomes = CostOptimizer::compare_scenarios(120.0, 30.0, &scenarios)
            .expect("valid scenarios");

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].name, "cheap servers");
        assert_eq!(
            outcomes[0].result.optimum.as_ref().expect("feasible").servers,
            8
        );
        assert_eq!(outcomes[1].name, "expensive servers");
        assert_eq!(
            outcomes[1].result.optimum.as_ref().expect("feasible").servers,
            5
        );
    }

    #[test]
    fn invalid_rates_are_rejected() {
        assert!(CostOptimizer::new(0.0, 30.0, 50.0, 20.0).is_err());
        assert!(CostOptimizer::new(120.0, -1.0, 50.0, 20.0).is_err());
    }
}
