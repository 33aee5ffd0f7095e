pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod fit;
pub mod mmc;
pub mod optimizer;
pub mod output;
pub mod sim;
pub mod stats;
