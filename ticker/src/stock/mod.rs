pub mod repository;
pub mod repository_sqlx;

pub use engine::stock::{StockId, StockRecord, StockUpdate};
