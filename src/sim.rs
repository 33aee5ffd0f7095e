use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Exp;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use tracing::debug;

use crate::error::{Error, Result};
use crate::events::{Event, ScheduledEvent};
use crate::mmc::validate_rates;
use crate::stats::mean;

pub const DEFAULT_HORIZON: f64 = 10_000.0;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimParams {
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub servers: u32,
    #[serde(default = "default_horizon")]
    pub horizon: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_horizon() -> f64 {
    DEFAULT_HORIZON
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Empirical estimates from one simulation run. The sample vectors are
/// indexed by arrival order and excluded from serialization; JSON output
/// carries the summary fields only.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationResult {
    pub estimated_wq: f64,
    pub estimated_w: f64,
    pub estimated_lq: f64,
    pub estimated_l: f64,
    pub customer_count: usize,
    pub simulated_duration: f64,
    pub seed: u64,
    #[serde(skip)]
    pub arrival_times: Vec<f64>,
    #[serde(skip)]
    pub wait_times: Vec<f64>,
    #[serde(skip)]
    pub system_times: Vec<f64>,
    #[serde(skip)]
    pub queue_lengths: Vec<usize>,
}

#[derive(Clone, Copy)]
struct CustomerRecord {
    arrival: f64,
    wait: f64,
    system: f64,
}

struct SimEngine {
    params: SimParams,
    rng: StdRng,
    interarrival: Exp<f64>,
    service: Exp<f64>,
}

pub fn run_simulation(params: &SimParams) -> Result<SimulationResult> {
    Ok(SimEngine::new(params.clone())?.run())
}

fn validate_params(params: &SimParams) -> Result<()> {
    validate_rates(params.arrival_rate, params.service_rate)?;
    if params.servers == 0 {
        return Err(Error::InvalidServerCount);
    }
    if !params.horizon.is_finite() || params.horizon <= 0.0 {
        return Err(Error::InvalidHorizon(params.horizon));
    }
    Ok(())
}

impl SimEngine {
    fn new(params: SimParams) -> Result<Self> {
        validate_params(&params)?;
        let interarrival = Exp::new(params.arrival_rate)
            .map_err(|_| Error::InvalidArrivalRate(params.arrival_rate))?;
        let service = Exp::new(params.service_rate)
            .map_err(|_| Error::InvalidServiceRate(params.service_rate))?;
        let rng = StdRng::seed_from_u64(params.seed);
        Ok(Self {
            params,
            rng,
            interarrival,
            service,
        })
    }

    fn run(mut self) -> SimulationResult {
        let servers = self.params.servers as usize;
        let mut events: BinaryHeap<Reverse<ScheduledEvent>> = BinaryHeap::new();
        let mut waiting: VecDeque<usize> = VecDeque::new();
        let mut records: Vec<CustomerRecord> = Vec::new();
        let mut queue_lengths: Vec<usize> = Vec::new();
        let mut busy = 0usize;

        let first = self.rng.sample(self.interarrival);
        if first < self.params.horizon {
            records.push(CustomerRecord {
                arrival: first,
                wait: 0.0,
                system: 0.0,
            });
            events.push(Reverse(ScheduledEvent::new(
                first,
                Event::Arrival { customer: 0 },
            )));
        }

        // Arrivals stop once the clock reaches the horizon; the heap then
        // drains, so every spawned customer completes and is counted.
        while let Some(Reverse(scheduled)) = events.pop() {
            let now = scheduled.time;
            match scheduled.event {
                Event::Arrival { customer } => {
                    // queue length sampled before this customer joins
                    queue_lengths.push(waiting.len());

                    let next_time = now + self.rng.sample(self.interarrival);
                    if next_time < self.params.horizon {
                        let next = records.len();
                        records.push(CustomerRecord {
                            arrival: next_time,
                            wait: 0.0,
                            system: 0.0,
                        });
                        events.push(Reverse(ScheduledEvent::new(
                            next_time,
                            Event::Arrival { customer: next },
                        )));
                    }

                    if busy < servers {
                        busy += 1;
                        let service_time = self.rng.sample(self.service);
                        events.push(Reverse(ScheduledEvent::new(
                            now + service_time,
                            Event::Departure { customer },
                        )));
                    } else {
                        waiting.push_back(customer);
                    }
                }
                Event::Departure { customer } => {
                    records[customer].system = now - records[customer].arrival;
                    if let Some(next) = waiting.pop_front() {
                        records[next].wait = now - records[next].arrival;
                        let service_time = self.rng.sample(self.service);
                        events.push(Reverse(ScheduledEvent::new(
                            now + service_time,
                            Event::Departure { customer: next },
                        )));
                    } else {
                        busy -= 1;
                    }
                }
            }
        }

        let arrival_times: Vec<f64> = records.iter().map(|r| r.arrival).collect();
        let wait_times: Vec<f64> = records.iter().map(|r| r.wait).collect();
        let system_times: Vec<f64> = records.iter().map(|r| r.system).collect();

        let estimated_wq = mean(&wait_times);
        let estimated_w = mean(&system_times);
        let queue_samples: Vec<f64> = queue_lengths.iter().map(|&q| q as f64).collect();
        let estimated_lq = mean(&queue_samples);
        let estimated_l = estimated_lq + self.params.arrival_rate / self.params.service_rate;

        debug!(
            customers = records.len(),
            horizon = self.params.horizon,
            seed = self.params.seed,
            "simulation complete"
        );

        SimulationResult {
            estimated_wq,
            estimated_w,
            estimated_lq,
            estimated_l,
            customer_count: records.len(),
            simulated_duration: self.params.horizon,
            seed: self.params.seed,
            arrival_times,
            wait_times,
            system_times,
            queue_lengths,
        }
    }
}
