use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::config::load_config;
use crate::data;
use crate::error::Result;
use crate::fit::{self, Criterion, Family, FitPlot, FitReport, GoodnessOfFit};
use crate::mmc::{MmcMetrics, MmcQueue};
use crate::optimizer::{CostOptimizer, DEFAULT_C_MAX, DEFAULT_C_MIN};
use crate::output::{self, Format};
use crate::sim::{run_simulation, SimParams, SimulationResult, DEFAULT_HORIZON, DEFAULT_SEED};

#[derive(Parser, Debug)]
#[command(name = "queue-opt", version)]
#[command(about = "M/M/c queue analysis, simulation, and server-count optimization")]
pub struct Cli {
    /// Diagnostic verbosity on stderr (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: Format,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exact steady-state metrics for an M/M/c queue
    Analyze {
        #[arg(long)]
        arrival_rate: f64,
        #[arg(long)]
        service_rate: f64,
        #[arg(long)]
        servers: u32,
    },
    /// Seeded discrete-event run cross-checked against the analytic model
    Simulate {
        #[arg(long)]
        arrival_rate: f64,
        #[arg(long)]
        service_rate: f64,
        #[arg(long)]
        servers: u32,
        #[arg(long, default_value_t = DEFAULT_HORIZON)]
        horizon: f64,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Cheapest server count under a cost model, with the evaluation table
    Optimize {
        #[arg(long)]
        arrival_rate: f64,
        #[arg(long)]
        service_rate: f64,
        #[arg(long)]
        server_cost: f64,
        #[arg(long)]
        waiting_cost: f64,
        #[arg(long, default_value_t = DEFAULT_C_MIN)]
        c_min: u32,
        #[arg(long, default_value_t = DEFAULT_C_MAX)]
        c_max: u32,
        /// Reject server counts whose mean queue wait exceeds this bound
        #[arg(long)]
        sla_wq: Option<f64>,
    },
    /// Cost and wait sweep across a server-count range
    Sensitivity {
        #[arg(long)]
        arrival_rate: f64,
        #[arg(long)]
        service_rate: f64,
        #[arg(long)]
        server_cost: f64,
        #[arg(long)]
        waiting_cost: f64,
        #[arg(long, requires = "c_max")]
        c_min: Option<u32>,
        #[arg(long, requires = "c_min")]
        c_max: Option<u32>,
    },
    /// Optimize each cost scenario from a TOML or JSON config file
    Compare {
        #[arg(long)]
        config: PathBuf,
    },
    /// Fit distribution families to a sample column of an arrival log
    Fit {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value = "interarrival")]
        sample: SampleKind,
        /// Candidate family, repeatable; all four when omitted
        #[arg(long = "family", value_enum)]
        families: Vec<Family>,
        #[arg(long, value_enum, default_value = "aic")]
        criterion: Criterion,
        /// Test the best fit with KS and chi-square
        #[arg(long)]
        gof: bool,
        /// Include Q-Q and density coordinates (json output only)
        #[arg(long)]
        plot: bool,
    },
    /// Summary statistics and rate estimates for an arrival log
    Stats {
        #[arg(long)]
        input: PathBuf,
    },
    /// Write a synthetic arrival log
    Generate {
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        count: usize,
        #[arg(long)]
        arrival_rate: f64,
        #[arg(long)]
        service_rate: f64,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SampleKind {
    Interarrival,
    Service,
}

#[derive(Serialize)]
struct SimulationReport {
    simulation: SimulationResult,
    analytic: MmcMetrics,
}

#[derive(Serialize)]
struct FitOutput {
    #[serde(flatten)]
    report: FitReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    best: Option<Family>,
    #[serde(skip_serializing_if = "Option::is_none")]
    goodness_of_fit: Option<GoodnessOfFit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plot: Option<FitPlot>,
}

#[derive(Serialize)]
struct GenerateReport {
    path: String,
    records: usize,
    arrival_rate: f64,
    service_rate: f64,
    seed: u64,
}

pub fn run(cli: Cli) -> Result<String> {
    let format = cli.format;
    match cli.command {
        Command::Analyze {
            arrival_rate,
            service_rate,
            servers,
        } => {
            let metrics = MmcQueue::new(arrival_rate, service_rate, servers)?.metrics();
            match format {
                Format::Human => Ok(output::render_metrics(&metrics)),
                Format::Json => output::render_json(&metrics),
            }
        }
        Command::Simulate {
            arrival_rate,
            service_rate,
            servers,
            horizon,
            seed,
        } => {
            let params = SimParams {
                arrival_rate,
                service_rate,
                servers,
                horizon,
                seed,
            };
            let simulation = run_simulation(&params)?;
            let analytic = MmcQueue::new(arrival_rate, service_rate, servers)?.metrics();
            match format {
                Format::Human => Ok(output::render_simulation(&simulation, &analytic)),
                Format::Json => output::render_json(&SimulationReport {
                    simulation,
                    analytic,
                }),
            }
        }
        Command::Optimize {
            arrival_rate,
            service_rate,
            server_cost,
            waiting_cost,
            c_min,
            c_max,
            sla_wq,
        } => {
            let optimizer =
                CostOptimizer::new(arrival_rate, service_rate, server_cost, waiting_cost)?;
            let result = optimizer.optimize(c_min, c_max, sla_wq);
            match format {
                Format::Human => Ok(output::render_optimization(&result)),
                Format::Json => output::render_json(&result),
            }
        }
        Command::Sensitivity {
            arrival_rate,
            service_rate,
            server_cost,
            waiting_cost,
            c_min,
            c_max,
        } => {
            let optimizer =
                CostOptimizer::new(arrival_rate, service_rate, server_cost, waiting_cost)?;
            let range = match (c_min, c_max) {
                (Some(lo), Some(hi)) => Some((lo, hi)),
                _ => None,
            };
            let report = optimizer.sensitivity_analysis(range);
            match format {
                Format::Human => Ok(output::render_sensitivity(&report)),
                Format::Json => output::render_json(&report),
            }
        }
        Command::Compare { config: path } => {
            let config = load_config(&path)?;
            let outcomes = CostOptimizer::compare_scenarios(
                config.arrival_rate,
                config.service_rate,
                &config.scenarios,
            )?;
            match format {
                Format::Human => Ok(output::render_scenarios(&outcomes)),
                Format::Json => output::render_json(&outcomes),
            }
        }
        Command::Fit {
            input,
            sample,
            families,
            criterion,
            gof,
            plot,
        } => {
            let records = data::read_log_csv(&input)?;
            let values: Vec<f64> = match sample {
                SampleKind::Interarrival => {
                    let arrivals: Vec<f64> =
                        records.iter().map(|r| r.arrival_time).collect();
                    data::interarrival_times(&arrivals)
                }
                SampleKind::Service => records.iter().map(|r| r.service_time).collect(),
            };
            let families = if families.is_empty() {
                Family::ALL.to_vec()
            } else {
                families
            };

            let report = fit::fit_all(&values, &families)?;
            let best = report.best(criterion).cloned();
            let goodness_of_fit = match (&best, gof) {
                (Some(best), true) => {
                    Some(fit::goodness_of_fit(&values, &best.distribution()?)?)
                }
                _ => None,
            };

            match format {
                Format::Human => Ok(output::render_fit(
                    &report,
                    criterion,
                    goodness_of_fit.as_ref(),
                )),
                Format::Json => {
                    let plot = match (&best, plot) {
                        (Some(best), true) => {
                            Some(fit::plot_data(&values, &best.distribution()?)?)
                        }
                        _ => None,
                    };
                    output::render_json(&FitOutput {
                        best: best.map(|fit| fit.family),
                        report,
                        goodness_of_fit,
                        plot,
                    })
                }
            }
        }
        Command::Stats { input } => {
            let records = data::read_log_csv(&input)?;
            let summary = data::summarize(&records)?;
            match format {
                Format::Human => Ok(output::render_summary(&summary)),
                Format::Json => output::render_json(&summary),
            }
        }
        Command::Generate {
            output: path,
            count,
            arrival_rate,
            service_rate,
            seed,
        } => {
            let records = data::generate_log(count, arrival_rate, service_rate, seed)?;
            data::write_log_csv(&path, &records)?;
            match format {
                Format::Human => Ok(format!(
                    "wrote {} records to {}\n",
                    records.len(),
                    path.display()
                )),
                Format::Json => output::render_json(&GenerateReport {
                    path: path.display().to_string(),
                    records: records.len(),
                    arrival_rate,
                    service_rate,
                    seed,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("valid arguments")
    }

    #[test]
    fn analyze_defaults_fill_in() {
        let cli = parse(&[
            "queue-opt",
            "analyze",
            "--arrival-rate",
            "120",
            "--service-rate",
            "30",
            "--servers",
            "6",
        ]);
        assert_eq!(cli.format, Format::Human);
        assert_eq!(cli.log_level, tracing::Level::WARN);
        match cli.command {
            Command::Analyze { servers, .. } => assert_eq!(servers, 6),
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn simulate_defaults_fill_in() {
        let cli = parse(&[
            "queue-opt",
            "simulate",
            "--arrival-rate",
            "120",
            "--service-rate",
            "30",
            "--servers",
            "6",
        ]);
        match cli.command {
            Command::Simulate { horizon, seed, .. } => {
                assert_eq!(horizon, DEFAULT_HORIZON);
                assert_eq!(seed, DEFAULT_SEED);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn analyze_runs_end_to_end() {
        let cli = parse(&[
            "queue-opt",
            "analyze",
            "--arrival-rate",
            "120",
            "--service-rate",
            "30",
            "--servers",
            "6",
        ]);
        let text = run(cli).expect("stable parameters");
        assert!(text.starts_with("M/M/c Analysis\n"));
        assert!(text.contains("Lq: 0.5695\n"));
    }

    #[test]
    fn format_flag_is_global() {
        let cli = parse(&[
            "queue-opt",
            "analyze",
            "--arrival-rate",
            "120",
            "--service-rate",
            "30",
            "--servers",
            "6",
            "--format",
            "json",
        ]);
        let text = run(cli).expect("stable parameters");
        assert!(text.trim_start().starts_with('{'));
        assert!(text.contains("\"lq\""));
    }

    #[test]
    fn optimize_reports_the_optimum() {
        let cli = parse(&[
            "queue-opt",
            "optimize",
            "--arrival-rate",
            "120",
            "--service-rate",
            "30",
            "--server-cost",
            "50",
            "--waiting-cost",
            "20",
            "--c-min",
            "5",
            "--c-max",
            "15",
        ]);
        let text = run(cli).expect("valid parameters");
        assert!(text.contains("servers: 5\n"));
        assert!(text.contains("total cost: 294.33\n"));
    }

    #[test]
    fn sensitivity_bounds_require_each_other() {
        let outcome = Cli::try_parse_from([
            "queue-opt",
            "sensitivity",
            "--arrival-rate",
            "120",
            "--service-rate",
            "30",
            "--server-cost",
            "50",
            "--waiting-cost",
            "20",
            "--c-min",
            "5",
        ]);
        assert!(outcome.is_err());
    }

    #[test]
    fn fit_families_default_to_empty_list() {
        let cli = parse(&["queue-opt", "fit", "--input", "log.csv"]);
        match cli.command {
            Command::Fit {
                families,
                sample,
                criterion,
                gof,
                plot,
                ..
            } => {
                assert!(families.is_empty());
                assert_eq!(sample, SampleKind::Interarrival);
                assert_eq!(criterion, Criterion::Aic);
                assert!(!gof);
                assert!(!plot);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn invalid_servers_surface_as_errors() {
        let cli = parse(&[
            "queue-opt",
            "analyze",
            "--arrival-rate",
            "120",
            "--service-rate",
            "30",
            "--servers",
            "0",
        ]);
        assert!(run(cli).is_err());
    }
}
