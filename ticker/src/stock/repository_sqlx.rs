use std::collections::BTreeMap;

use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use engine::price::round_price;
use sqlx::{Any, AnyPool, Row, Transaction};

use crate::stock::repository::StockRepository;
use crate::stock::{StockId, StockRecord, StockUpdate};

/// SQLx-backed implementation of StockRepository.
/// Responsible only for persistence and row mapping.
pub struct SqlxStockRepository {
    pool: AnyPool,
}

impl SqlxStockRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockRepository for SqlxStockRepository {
    async fn list_all_stocks(&self) -> anyhow::Result<Vec<StockRecord>> {
        let rows = sqlx::query(
            r#"
SELECT id, current_price, supply, demand, history, last_updated_ms
FROM stocks
ORDER BY id;
"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            match row_to_stock(&r) {
                Ok(s) => out.push(s),
                Err(e) => {
                    // poison-row resilience: skip but don't fail the snapshot
                    tracing::warn!(error = %e, "skipping unreadable stock row");
                }
            }
        }

        Ok(out)
    }

    async fn batch_update(&self, updates: &BTreeMap<StockId, StockUpdate>) -> anyhow::Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.context("failed to open batch")?;

        if let Err(e) = apply_updates(&mut tx, updates).await {
            // Roll back eagerly so no reader can observe a half-applied batch.
            if let Err(rb) = tx.rollback().await {
                tracing::warn!(error = %rb, "rollback failed; connection drop will discard batch");
            }
            return Err(e);
        }

        tx.commit().await.context("failed to commit batch")?;
        Ok(())
    }
}

async fn apply_updates(
    tx: &mut Transaction<'_, Any>,
    updates: &BTreeMap<StockId, StockUpdate>,
) -> anyhow::Result<()> {
    for (id, u) in updates {
        let history = serde_json::to_string(&u.history).context("history encoding")?;

        let res = sqlx::query(
            r#"
UPDATE stocks
SET current_price = ?, history = ?, supply = ?, demand = ?, last_updated_ms = ?
WHERE id = ?;
"#,
        )
        .bind(u.current_price)
        .bind(history)
        .bind(u.supply)
        .bind(u.demand)
        .bind(u64_to_i64(u.last_updated_ms)?)
        .bind(id.to_string())
        .execute(&mut **tx)
        .await
        .with_context(|| format!("update failed for stock {id}"))?;

        if res.rows_affected() == 0 {
            bail!("stock {id} no longer exists");
        }
    }

    Ok(())
}

/* =========================
Row mapping
========================= */

fn row_to_stock(r: &sqlx::any::AnyRow) -> anyhow::Result<StockRecord> {
    let id: String = r.try_get("id").context("invalid stock id")?;
    if id.is_empty() {
        return Err(anyhow!("empty stock id"));
    }

    let last_updated_ms = opt_i64(r, "last_updated_ms", &id).and_then(|v| u64::try_from(v).ok());

    Ok(StockRecord {
        current_price: opt_i64(r, "current_price", &id),
        supply: opt_i64(r, "supply", &id),
        demand: opt_i64(r, "demand", &id),
        history: history_column(r, &id),
        last_updated_ms,
        id: StockId::new(id),
    })
}

/// Fractional values are rounded half away from zero. Absent and unreadable
/// values both map to `None`; the engine substitutes its defaults.
fn opt_i64(r: &sqlx::any::AnyRow, column: &'static str, id: &str) -> Option<i64> {
    let err = match r.try_get::<Option<i64>, _>(column) {
        Ok(v) => return v,
        Err(e) => e,
    };

    match r.try_get::<Option<f64>, _>(column) {
        Ok(v) => v.and_then(whole),
        Err(_) => {
            tracing::warn!(stock_id = %id, column, error = %err, "unreadable numeric column; using default");
            None
        }
    }
}

/// Anything that is not a JSON array of numbers reads as an empty history.
fn history_column(r: &sqlx::any::AnyRow, id: &str) -> Vec<i64> {
    let raw = match r.try_get::<Option<String>, _>("history") {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(stock_id = %id, error = %e, "unreadable history column; starting empty");
            return Vec::new();
        }
    };

    parse_history(&raw).unwrap_or_else(|e| {
        tracing::warn!(stock_id = %id, error = %e, "malformed history; starting empty");
        Vec::new()
    })
}

fn parse_history(raw: &str) -> anyhow::Result<Vec<i64>> {
    if let Ok(prices) = serde_json::from_str::<Vec<i64>>(raw) {
        return Ok(prices);
    }

    let prices = serde_json::from_str::<Vec<f64>>(raw)?;
    prices
        .into_iter()
        .map(|p| whole(p).ok_or_else(|| anyhow!("non-finite price in history: {p}")))
        .collect()
}

/* =========================
Numeric safety helpers
========================= */

fn whole(v: f64) -> Option<i64> {
    v.is_finite().then(|| round_price(v))
}

fn u64_to_i64(v: u64) -> anyhow::Result<i64> {
    if v > i64::MAX as u64 {
        return Err(anyhow!("u64 too large for i64: {v}"));
    }
    Ok(v as i64)
}
