
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use engine::random::{ScriptedRandom, SeededRandomFactory};
use engine::stock::MIN_PRICE;
use mock_repository::MockStockRepository;
use ticker::cycle::runner::CycleRunner;
use ticker::error::CycleError;
use ticker::metrics::counters::Counters;
use ticker::scheduler::run_cycle_loop;
use ticker::stock::{StockId, StockRecord};

// -----------------------
// helpers
// -----------------------

fn runner_with(repo: Arc<MockStockRepository>, rng: ScriptedRandom) -> CycleRunner {
    CycleRunner::new(repo, Arc::new(rng), 4, Counters::default())
}

fn seeded_runner(repo: Arc<MockStockRepository>, seed: u64) -> CycleRunner {
    CycleRunner::new(
        repo,
        Arc::new(SeededRandomFactory::new(seed)),
        4,
        Counters::default(),
    )
}

fn market() -> Vec<StockRecord> {
    vec![
        StockRecord::new("ACME", 100, 5, 5),
        StockRecord::new("BOLT", 250, 40, 12),
        StockRecord::new("CORE", 10, 1, 1).with_history(vec![9; 10]),
    ]
}

// -----------------------
// cycle behaviour
// -----------------------

#[tokio::test]
async fn empty_snapshot_is_a_successful_noop() {
    let repo = Arc::new(MockStockRepository::default());
    let runner = runner_with(repo.clone(), ScriptedRandom::silent());

    let report = runner.run_cycle().await.unwrap();

    assert_eq!(report.updated_count, 0);
    assert_eq!(repo.writes(), 0, "no batch for an empty snapshot");
    assert_eq!(repo.reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn zero_noise_cycle_appends_current_price() {
    let repo = Arc::new(MockStockRepository::with_stocks(market()));
    let runner = runner_with(repo.clone(), ScriptedRandom::silent());

    let report = runner.run_cycle().await.unwrap();
    assert_eq!(report.updated_count, 3);
    assert_eq!(repo.writes(), 1);

    let after = repo.snapshot().await;

    let acme = &after[&StockId::new("ACME")];
    assert_eq!(acme.current_price, Some(100));
    assert_eq!(acme.supply, Some(5));
    assert_eq!(acme.demand, Some(5));
    assert_eq!(acme.history, vec![100]);
    assert!(acme.last_updated_ms.is_some());

    let core = &after[&StockId::new("CORE")];
    assert_eq!(core.current_price, Some(10));
    assert_eq!(core.history, vec![9, 9, 9, 9, 9, 9, 9, 9, 9, 10]);
}

#[tokio::test]
async fn record_with_missing_fields_does_not_abort_cycle() {
    let blank = StockRecord {
        id: StockId::new("BLANK"),
        current_price: None,
        supply: None,
        demand: None,
        history: vec![],
        last_updated_ms: None,
    };
    let repo = Arc::new(MockStockRepository::with_stocks(
        market().into_iter().chain([blank]),
    ));
    let runner = runner_with(repo.clone(), ScriptedRandom::silent());

    let report = runner.run_cycle().await.unwrap();
    assert_eq!(report.updated_count, 4);

    let after = repo.snapshot().await;
    let blank = &after[&StockId::new("BLANK")];
    assert_eq!(blank.current_price, Some(MIN_PRICE));
    assert_eq!(blank.supply, Some(1));
    assert_eq!(blank.demand, Some(1));
    assert_eq!(blank.history, vec![MIN_PRICE]);
}

#[tokio::test]
async fn many_cycles_preserve_invariants() {
    let stocks = (0..50).map(|i| StockRecord::new(format!("S{i:02}"), 10 + i * 7, 1 + i, 1 + (i * 3) % 17));
    let repo = Arc::new(MockStockRepository::with_stocks(stocks));
    let runner = seeded_runner(repo.clone(), 77);

    for _ in 0..25 {
        assert_eq!(runner.run_cycle().await.unwrap().updated_count, 50);
    }

    for rec in repo.snapshot().await.values() {
        let price = rec.current_price.unwrap();
        assert!(price >= MIN_PRICE);
        assert!(rec.supply.unwrap() >= 1);
        assert!(rec.demand.unwrap() >= 1);
        assert_eq!(rec.history.len(), 10);
        assert_eq!(rec.history.last(), Some(&price));
    }

    assert_eq!(Counters::get(&runner.counters().records_updated), 50 * 25);
}

// -----------------------
// failures
// -----------------------

#[tokio::test]
async fn snapshot_failure_aborts_before_any_write() {
    let repo = Arc::new(MockStockRepository::with_stocks(market()));
    repo.fail_reads.store(true, Ordering::SeqCst);
    let runner = seeded_runner(repo.clone(), 1);

    let err = runner.run_cycle().await.unwrap_err();

    assert!(matches!(err, CycleError::SnapshotRead(_)));
    assert!(format!("{err}").contains("store unavailable"));
    assert_eq!(repo.writes(), 0);
    assert_eq!(Counters::get(&runner.counters().cycles_failed), 1);
}

#[tokio::test]
async fn rejected_batch_leaves_store_unchanged() {
    let repo = Arc::new(MockStockRepository::with_stocks(market()));
    let before = repo.snapshot().await;

    repo.fail_writes.store(true, Ordering::SeqCst);
    let runner = seeded_runner(repo.clone(), 5);

    let err = runner.run_cycle().await.unwrap_err();
    assert!(matches!(err, CycleError::BatchCommit(_)));
    assert_eq!(repo.writes(), 1, "committer does not retry");
    assert_eq!(repo.snapshot().await, before);

    // Next cycle proceeds from the untouched state.
    repo.fail_writes.store(false, Ordering::SeqCst);
    let report = runner.run_cycle().await.unwrap();
    assert_eq!(report.updated_count, 3);
    for rec in repo.snapshot().await.values() {
        assert!(rec.last_updated_ms.is_some());
    }
}

#[tokio::test]
async fn overlapping_trigger_is_refused() {
    let repo = Arc::new(MockStockRepository::with_stocks(market()));
    repo.gate_reads.store(true, Ordering::SeqCst);

    let runner = Arc::new(seeded_runner(repo.clone(), 3));

    let first = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.run_cycle().await })
    };

    // Wait until the first cycle is parked inside its snapshot read.
    repo.entered.notified().await;

    let second = runner.run_cycle().await;
    assert!(matches!(second, Err(CycleError::AlreadyRunning)));
    assert_eq!(repo.reads.load(Ordering::SeqCst), 1, "second trigger never read");

    repo.release.notify_one();
    let report = first.await.unwrap().unwrap();
    assert_eq!(report.updated_count, 3);

    assert_eq!(repo.writes(), 1);
    assert_eq!(Counters::get(&runner.counters().cycles_skipped), 1);
    assert_eq!(Counters::get(&runner.counters().cycles_ok), 1);
}

#[tokio::test(start_paused = true)]
async fn deadline_discards_uncommitted_work() {
    let repo = Arc::new(MockStockRepository::with_stocks(market()));
    let before = repo.snapshot().await;
    repo.gate_reads.store(true, Ordering::SeqCst);

    let runner = seeded_runner(repo.clone(), 8);

    let err = runner
        .run_cycle_within(Duration::from_secs(1))
        .await
        .unwrap_err();

    assert!(matches!(err, CycleError::DeadlineExceeded(d) if d == Duration::from_secs(1)));
    assert_eq!(repo.writes(), 0);
    assert_eq!(repo.snapshot().await, before);

    // The guard was released with the dropped cycle.
    repo.gate_reads.store(false, Ordering::SeqCst);
    assert_eq!(runner.run_cycle().await.unwrap().updated_count, 3);
}

// -----------------------
// scheduling loop
// -----------------------

#[tokio::test(start_paused = true)]
async fn loop_fires_immediately_then_every_interval() {
    let repo = Arc::new(MockStockRepository::default());
    let runner = Arc::new(seeded_runner(repo.clone(), 0));

    let triggered = run_cycle_loop(
        Arc::clone(&runner),
        Duration::from_secs(300),
        Duration::from_secs(60),
        tokio::time::sleep(Duration::from_secs(11 * 60)),
    )
    .await;

    // t = 0, 5 and 10 minutes
    assert_eq!(triggered, 3);
    assert_eq!(Counters::get(&runner.counters().cycles_ok), 3);
    assert_eq!(repo.reads.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn loop_survives_failing_cycles() {
    let repo = Arc::new(MockStockRepository::default());
    repo.fail_reads.store(true, Ordering::SeqCst);
    let runner = Arc::new(seeded_runner(repo.clone(), 0));

    let triggered = run_cycle_loop(
        Arc::clone(&runner),
        Duration::from_secs(300),
        Duration::from_secs(60),
        tokio::time::sleep(Duration::from_secs(16 * 60)),
    )
    .await;

    assert_eq!(triggered, 4);
    assert_eq!(Counters::get(&runner.counters().cycles_failed), 4);
    assert_eq!(repo.writes(), 0);
}
