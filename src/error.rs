use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("arrival rate must be > 0 (got {0})")]
    InvalidArrivalRate(f64),
    #[error("service rate must be > 0 (got {0})")]
    InvalidServiceRate(f64),
    #[error("server count must be >= 1")]
    InvalidServerCount,
    #[error("simulation horizon must be > 0 (got {0})")]
    InvalidHorizon(f64),
    #[error("sample must not be empty")]
    EmptySample,
    #[error("sample values must be positive and finite (got {0})")]
    InvalidSampleValue(f64),
    #[error("invalid distribution parameters: {0}")]
    InvalidDistribution(String),
    #[error("record count must be greater than 0")]
    RecordsZero,
    #[error("log must contain at least 2 records (got {0})")]
    TooFewRecords(usize),
    #[error("missing column '{0}' in log header")]
    MissingColumn(String),
    #[error("invalid value in log line {line}: '{value}'")]
    InvalidLogValue { line: usize, value: String },
    #[error("{0}")]
    LogIo(String),
    #[error("{0}")]
    ConfigIo(String),
    #[error("{0}")]
    ConfigParse(String),
    #[error("unsupported config format '{0}'")]
    UnsupportedConfigFormat(String),
    #[error("{0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
