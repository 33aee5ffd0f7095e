use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Exp;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::mmc::validate_rates;
use crate::stats::{mean, median, std_dev};

const REQUEST_ID: &str = "request_id";
const ARRIVAL_TIME: &str = "arrival_time";
const SERVICE_TIME: &str = "service_time";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogRecord {
    pub request_id: u64,
    pub arrival_time: f64,
    pub service_time: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SampleStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

/// Summary of an arrival log: per-sample statistics plus the rate estimates
/// feeding the analytic model, in the time unit of the log itself.
#[derive(Clone, Debug, Serialize)]
pub struct LogSummary {
    pub records: usize,
    pub interarrival: SampleStats,
    pub service: SampleStats,
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub offered_load: f64,
}

impl SampleStats {
    pub fn from_sample(data: &[f64]) -> SampleStats {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &x in data {
            min = min.min(x);
            max = max.max(x);
        }
        SampleStats {
            count: data.len(),
            mean: mean(data),
            std: std_dev(data),
            min,
            max,
            median: median(data),
        }
    }
}

pub fn read_log_csv(path: impl AsRef<Path>) -> Result<Vec<LogRecord>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|err| Error::LogIo(format!("cannot read {}: {}", path.display(), err)))?;
    parse_log_csv(&raw)
}

fn parse_log_csv(raw: &str) -> Result<Vec<LogRecord>> {
    let mut lines = raw.lines();
    let header = lines
        .next()
        .ok_or_else(|| Error::MissingColumn(REQUEST_ID.to_string()))?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let column = |name: &str| {
        columns
            .iter()
            .position(|&c| c == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    };
    let id_idx = column(REQUEST_ID)?;
    let arrival_idx = column(ARRIVAL_TIME)?;
    let service_idx = column(SERVICE_TIME)?;

    let mut records = Vec::new();
    for (offset, line) in lines.enumerate() {
        let line_no = offset + 2;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |idx: usize| {
            fields.get(idx).copied().ok_or_else(|| Error::InvalidLogValue {
                line: line_no,
                value: line.to_string(),
            })
        };
        let parse_time = |idx: usize| -> Result<f64> {
            let text = field(idx)?;
            let value: f64 = text.parse().map_err(|_| Error::InvalidLogValue {
                line: line_no,
                value: text.to_string(),
            })?;
            if !value.is_finite() {
                return Err(Error::InvalidLogValue {
                    line: line_no,
                    value: text.to_string(),
                });
            }
            Ok(value)
        };

        let id_text = field(id_idx)?;
        let request_id: u64 = id_text.parse().map_err(|_| Error::InvalidLogValue {
            line: line_no,
            value: id_text.to_string(),
        })?;
        records.push(LogRecord {
            request_id,
            arrival_time: parse_time(arrival_idx)?,
            service_time: parse_time(service_idx)?,
        });
    }
    debug!(records = records.len(), "parsed log");
    Ok(records)
}

pub fn write_log_csv(path: impl AsRef<Path>, records: &[LogRecord]) -> Result<()> {
    let path = path.as_ref();
    let mut out = format!("{},{},{}\n", REQUEST_ID, ARRIVAL_TIME, SERVICE_TIME);
    for record in records {
        out.push_str(&format!(
            "{},{},{}\n",
            record.request_id, record.arrival_time, record.service_time
        ));
    }
    fs::write(path, out)
        .map_err(|err| Error::LogIo(format!("cannot write {}: {}", path.display(), err)))
}

/// First differences of an arrival-instant sequence, length n - 1.
pub fn interarrival_times(arrivals: &[f64]) -> Vec<f64> {
    arrivals.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

pub fn summarize(records: &[LogRecord]) -> Result<LogSummary> {
    if records.len() < 2 {
        return Err(Error::TooFewRecords(records.len()));
    }
    let arrivals: Vec<f64> = records.iter().map(|r| r.arrival_time).collect();
    let gaps = interarrival_times(&arrivals);
    let services: Vec<f64> = records.iter().map(|r| r.service_time).collect();

    let arrival_rate = 1.0 / mean(&gaps);
    let service_rate = 1.0 / mean(&services);
    Ok(LogSummary {
        records: records.len(),
        interarrival: SampleStats::from_sample(&gaps),
        service: SampleStats::from_sample(&services),
        arrival_rate,
        service_rate,
        offered_load: arrival_rate / service_rate,
    })
}

/// Synthetic log with Poisson arrivals and exponential service, 1-based ids.
/// A fixed seed reproduces the log exactly.
pub fn generate_log(
    count: usize,
    arrival_rate: f64,
    service_rate: f64,
    seed: u64,
) -> Result<Vec<LogRecord>> {
    if count == 0 {
        return Err(Error::RecordsZero);
    }
    validate_rates(arrival_rate, service_rate)?;
    let interarrival =
        Exp::new(arrival_rate).map_err(|_| Error::InvalidArrivalRate(arrival_rate))?;
    let service = Exp::new(service_rate).map_err(|_| Error::InvalidServiceRate(service_rate))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut clock = 0.0;
    let mut records = Vec::with_capacity(count);
    for id in 1..=count {
        clock += rng.sample(interarrival);
        records.push(LogRecord {
            request_id: id as u64,
            arrival_time: clock,
            service_time: rng.sample(service),
        });
    }
    debug!(count, seed, "generated synthetic log");
    Ok(records)
}
