pub mod cli;
pub mod config;
pub mod cycle;
pub mod db;
pub mod metrics;
pub mod scheduler;
pub mod stock;

pub mod error;
pub mod logger;
pub mod time;
