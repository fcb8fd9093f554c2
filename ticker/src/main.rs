use std::sync::Arc;

use clap::Parser;
use ticker::{
    cli::{Cli, Command},
    config::AppConfig,
    cycle::runner::CycleRunner,
    db::Db,
    logger::init_tracing,
    metrics::counters::Counters,
    scheduler::run_cycle_loop,
    stock::repository_sqlx::SqlxStockRepository,
};

/// Connects to the database and makes sure the schema exists.
async fn init_db(cfg: &AppConfig) -> anyhow::Result<Db> {
    let db = Db::connect(&cfg.database_url, cfg.db_max_connections).await?;
    db.migrate().await?;
    Ok(db)
}

fn build_runner(db: &Db, cfg: &AppConfig) -> CycleRunner {
    let repo = Arc::new(SqlxStockRepository::new(db.pool.clone()));

    CycleRunner::new(repo, cfg.rng_factory(), cfg.workers, Counters::default())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        // Without a signal handler, keep running until killed.
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = AppConfig::from_env()?;
    if let Some(url) = cli.database_url.clone() {
        cfg.database_url = url;
    }

    init_tracing(cfg.json_logs);

    tracing::info!(command = ?cli.command(), "Starting stock ticker...");

    let db = init_db(&cfg).await?;

    match cli.command() {
        Command::Migrate => {
            tracing::info!("schema is up to date");
        }
        Command::Once => {
            let runner = build_runner(&db, &cfg);
            runner.run_cycle_within(cfg.cycle_timeout).await?;
        }
        Command::Run => {
            let runner = Arc::new(build_runner(&db, &cfg));
            run_cycle_loop(runner, cfg.cycle_interval, cfg.cycle_timeout, shutdown_signal()).await;
        }
    }

    db.pool.close().await;
    Ok(())
}
