use sqlx::AnyPool;

/// Creates the `stocks` table.
///
/// Numeric columns are nullable: rows are inserted by external tooling and
/// may be incomplete. `history` holds a JSON array of integers, oldest first.
pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS stocks (
  id TEXT PRIMARY KEY,
  current_price BIGINT,
  supply BIGINT,
  demand BIGINT,
  history TEXT,
  last_updated_ms BIGINT
);
"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
