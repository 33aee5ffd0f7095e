use clap::ValueEnum;
use serde::Serialize;

use crate::data::{LogSummary, SampleStats};
use crate::error::{Error, Result};
use crate::fit::{Criterion, FamilyParams, FitReport, GoodnessOfFit};
use crate::mmc::MmcMetrics;
use crate::optimizer::{OptimizationResult, ScenarioOutcome, SensitivityReport};
use crate::sim::SimulationResult;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum Format {
    #[default]
    Human,
    Json,
}

pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|err| Error::Render(err.to_string()))
}

pub fn render_metrics(metrics: &MmcMetrics) -> String {
    let mut out = String::from("M/M/c Analysis\n");
    match &metrics.steady_state {
        Some(state) => {
            out.push_str(&format!("servers: {}\n", state.servers));
            out.push_str(&format!("arrival rate: {:.4}\n", state.lambda));
            out.push_str(&format!("service rate: {:.4}\n", state.mu));
            out.push_str(&format!("utilization: {:.2}%\n", state.utilization_percent));
            out.push_str("stable: yes\n");
            out.push_str(&format!("P0: {:.4}\n", state.p0));
            out.push_str(&format!("P(wait): {:.4}\n", state.p_wait));
            out.push_str(&format!("Lq: {:.4}\n", state.lq));
            out.push_str(&format!("L: {:.4}\n", state.l));
            out.push_str(&format!("Wq: {:.4}\n", state.wq));
            out.push_str(&format!("W: {:.4}\n", state.w));
        }
        None => {
            out.push_str("stable: no\n");
            out.push_str(&format!("rho: {:.4}\n", metrics.rho));
            if let Some(message) = &metrics.message {
                out.push_str(&format!("note: {}\n", message));
            }
        }
    }
    out
}

pub fn render_simulation(sim: &SimulationResult, analytic: &MmcMetrics) -> String {
    let side = |value: f64, reference: Option<f64>| match reference {
        Some(r) => format!("{:.4} (analytic {:.4})", value, r),
        None => format!("{:.4} (analytic n/a)", value),
    };
    let state = analytic.steady_state.as_ref();

    let mut out = String::from("Simulation vs Analytic\n");
    out.push_str(&format!("customers: {}\n", sim.customer_count));
    out.push_str(&format!("horizon: {:.1}\n", sim.simulated_duration));
    out.push_str(&format!("seed: {}\n", sim.seed));
    out.push_str(&format!(
        "Wq: {}\n",
        side(sim.estimated_wq, state.map(|s| s.wq))
    ));
    out.push_str(&format!(
        "W: {}\n",
        side(sim.estimated_w, state.map(|s| s.w))
    ));
    out.push_str(&format!(
        "Lq: {}\n",
        side(sim.estimated_lq, state.map(|s| s.lq))
    ));
    out.push_str(&format!(
        "L: {}\n",
        side(sim.estimated_l, state.map(|s| s.l))
    ));
    if !analytic.stable {
        out.push_str(&format!(
            "note: rho = {:.4} >= 1, queue grows with the horizon\n",
            analytic.rho
        ));
    }
    out
}

fn optimum_lines(result: &OptimizationResult) -> String {
    let mut out = String::new();
    match &result.optimum {
        Some(opt) => {
            out.push_str("status: optimal\n");
            out.push_str(&format!("servers: {}\n", opt.servers));
            out.push_str(&format!("total cost: {:.2}\n", opt.total_cost));
            out.push_str(&format!("server cost: {:.2}\n", opt.server_cost));
            out.push_str(&format!("waiting cost: {:.2}\n", opt.waiting_cost));
            if let Some(state) = &opt.metrics.steady_state {
                out.push_str(&format!("rho: {:.4}\n", opt.metrics.rho));
                out.push_str(&format!("Lq: {:.4}\n", state.lq));
                out.push_str(&format!("Wq: {:.4}\n", state.wq));
            }
        }
        None => {
            out.push_str("status: infeasible\n");
            if let Some(message) = &result.message {
                out.push_str(&format!("note: {}\n", message));
            }
        }
    }
    if let Some(cap) = result.sla_wq {
        out.push_str(&format!("sla Wq cap: {:.4}\n", cap));
    }
    out
}

pub fn render_optimization(result: &OptimizationResult) -> String {
    let mut out = String::from("Cost Optimization\n");
    out.push_str(&optimum_lines(result));
    if !result.evaluations.is_empty() {
        out.push_str(&format!(
            "\n{:>4}  {:>10}  {:>8}  {:>8}  {:>6}  sla\n",
            "c", "Z(c)", "Lq", "Wq", "rho"
        ));
        for row in &result.evaluations {
            out.push_str(&format!(
                "{:>4}  {:>10.2}  {:>8.4}  {:>8.4}  {:>6.4}  {}\n",
                row.servers,
                row.cost,
                row.lq,
                row.wq,
                row.rho,
                if row.meets_sla { "yes" } else { "no" }
            ));
        }
    }
    out
}

pub fn render_sensitivity(report: &SensitivityReport) -> String {
    let mut out = String::from("Sensitivity Analysis\n");
    if report.servers.is_empty() {
        out.push_str("no stable server count in range\n");
        return out;
    }
    out.push_str(&format!(
        "{:>4}  {:>10}  {:>10}  {:>10}  {:>6}  {:>8}  {:>8}\n",
        "c", "total", "servers", "waiting", "rho", "Wq", "Lq"
    ));
    for i in 0..report.servers.len() {
        out.push_str(&format!(
            "{:>4}  {:>10.2}  {:>10.2}  {:>10.2}  {:>6.4}  {:>8.4}  {:>8.4}\n",
            report.servers[i],
            report.total_cost[i],
            report.server_cost[i],
            report.waiting_cost[i],
            report.rho[i],
            report.wq[i],
            report.lq[i]
        ));
    }
    if let (Some(servers), Some(cost)) = (report.optimal_servers, report.optimal_cost) {
        out.push_str(&format!("\noptimal servers: {}\n", servers));
        out.push_str(&format!("optimal cost: {:.2}\n", cost));
    }
    out
}

pub fn render_scenarios(outcomes: &[ScenarioOutcome]) -> String {
    let mut out = String::from("Scenario Comparison\n");
    for outcome in outcomes {
        out.push_str(&format!("\n--- {} ---\n", outcome.name));
        out.push_str(&optimum_lines(&outcome.result));
    }
    out
}

fn params_line(params: &FamilyParams) -> String {
    match *params {
        FamilyParams::Exponential { rate } => format!("rate: {:.4}", rate),
        FamilyParams::Gamma { shape, rate } => {
            format!("shape: {:.4}, rate: {:.4}", shape, rate)
        }
        FamilyParams::LogNormal { location, scale } => {
            format!("location: {:.4}, scale: {:.4}", location, scale)
        }
        FamilyParams::Weibull { shape, scale } => {
            format!("shape: {:.4}, scale: {:.4}", shape, scale)
        }
    }
}

pub fn render_fit(
    report: &FitReport,
    criterion: Criterion,
    gof: Option<&GoodnessOfFit>,
) -> String {
    let mut out = String::from("Distribution Fit\n");
    out.push_str(&format!("sample size: {}\n", report.sample_size));
    out.push_str(&format!("criterion: {}\n", criterion));

    for fit in &report.fits {
        out.push_str(&format!("\nfamily: {}\n", fit.family));
        out.push_str(&format!("  {}\n", params_line(&fit.params)));
        out.push_str(&format!("  log-likelihood: {:.2}\n", fit.log_likelihood));
        out.push_str(&format!("  AIC: {:.2}\n", fit.aic));
        out.push_str(&format!("  BIC: {:.2}\n", fit.bic));
    }

    if !report.failures.is_empty() {
        out.push_str("\nfailures:\n");
        for failure in &report.failures {
            out.push_str(&format!("  {}: {}\n", failure.family, failure.reason));
        }
    }

    match report.best(criterion) {
        Some(best) => out.push_str(&format!(
            "\nbest fit: {} ({} {:.2})\n",
            best.family,
            criterion,
            best.criterion_value(criterion)
        )),
        None => out.push_str("\nbest fit: none (every family failed)\n"),
    }

    if let Some(gof) = gof {
        out.push_str("\nGoodness of Fit\n");
        out.push_str(&format!("KS statistic: {:.4}\n", gof.ks_statistic));
        out.push_str(&format!("KS p-value: {:.4}\n", gof.ks_p_value));
        match &gof.chi_square {
            Some(chi) => out.push_str(&format!(
                "chi-square: {:.2} (df {}, bins {}, p {:.4})\n",
                chi.statistic, chi.degrees_of_freedom, chi.bins_used, chi.p_value
            )),
            None => out.push_str("chi-square: skipped (fewer than 2 bins with expected > 5)\n"),
        }
    }
    out
}

fn stats_lines(label: &str, stats: &SampleStats) -> String {
    format!(
        "{}:\n  count: {}\n  mean: {:.4}\n  std: {:.4}\n  min: {:.4}\n  max: {:.4}\n  median: {:.4}\n",
        label, stats.count, stats.mean, stats.std, stats.min, stats.max, stats.median
    )
}

pub fn render_summary(summary: &LogSummary) -> String {
    let mut out = String::from("Log Summary\n");
    out.push_str(&format!("records: {}\n", summary.records));
    out.push_str(&format!("arrival rate: {:.4}\n", summary.arrival_rate));
    out.push_str(&format!("service rate: {:.4}\n", summary.service_rate));
    out.push_str(&format!("offered load: {:.4}\n", summary.offered_load));
    out.push('\n');
    out.push_str(&stats_lines("interarrival", &summary.interarrival));
    out.push('\n');
    out.push_str(&stats_lines("service", &summary.service));
    out
}
