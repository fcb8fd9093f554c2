//! Pure price-evolution core for the synthetic stock market.
//!
//! Nothing in this crate performs I/O. The service crate feeds it a snapshot
//! of stock records and a source of randomness, and gets back the next state
//! of every record.

pub mod history;
pub mod price;
pub mod random;
pub mod stock;
