
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chain_common::*;
use maxpain::error::ChainError;
use maxpain::fetch::Scheduler;
use maxpain::model::FetchRequest;

fn requests(n: u32) -> Vec<FetchRequest> {
    (0..n).map(|i| FetchRequest::new(&format!("S{i}"), 1 + i % 12, 2012)).collect()
}

fn source_for(reqs: &[FetchRequest]) -> MockSource {
    reqs.iter().fold(MockSource::new(), |src, r| {
        src.page(url(&r.symbol, r.month, r.year), default_page())
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_cap_is_respected() {
    let reqs = requests(12);
    let mut source = source_for(&reqs);
    for r in &reqs {
        source = source.delay(url(&r.symbol, r.month, r.year), Duration::from_millis(20));
    }
    let source = Arc::new(source);
    let (fetcher, _) = fetcher(source.clone());

    let units = Scheduler::new(fetcher, 3).run(reqs).await.unwrap();

    assert_eq!(units.len(), 12);
    let peak = source.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in flight = {peak}");
    assert!(peak >= 2, "fetches should overlap, peak = {peak}");
    assert_eq!(source.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(source.calls.load(Ordering::SeqCst), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_results_keep_input_order() {
    let reqs = requests(6);
    let mut source = source_for(&reqs);
    // Earlier requests finish last.
    for (i, r) in reqs.iter().enumerate() {
        let ms = 10 * (6 - i as u64);
        source = source.delay(url(&r.symbol, r.month, r.year), Duration::from_millis(ms));
    }
    let (fetcher, _) = fetcher(Arc::new(source));

    let units = Scheduler::new(fetcher, 6).run(reqs.clone()).await.unwrap();

    let got: Vec<&FetchRequest> = units.iter().map(|u| &u.request).collect();
    let want: Vec<&FetchRequest> = reqs.iter().collect();
    assert_eq!(got, want);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_failure_does_not_affect_siblings() {
    let reqs = requests(5);
    let bad = &reqs[2];
    let source = reqs
        .iter()
        .filter(|r| *r != bad)
        .fold(MockSource::new(), |src, r| {
            src.page(url(&r.symbol, r.month, r.year), default_page())
        });
    let (fetcher, _) = fetcher(Arc::new(source));

    let units = Scheduler::new(fetcher, 2).run(reqs.clone()).await.unwrap();

    assert_eq!(units.len(), 5);
    for (i, unit) in units.iter().enumerate() {
        assert_eq!(unit.request, reqs[i]);
        if i == 2 {
            assert!(!unit.is_available());
            assert_eq!(unit.failure.as_ref().unwrap().kind, "network");
        } else {
            let mp = unit.max_pain.price.unwrap();
            assert!((mp - EXPECTED_MAX_PAIN).abs() < 1e-6);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interrupt_aborts_run() {
    let reqs = requests(8);
    let mut source = source_for(&reqs);
    for r in &reqs {
        source = source.delay(url(&r.symbol, r.month, r.year), Duration::from_secs(30));
    }
    let (fetcher, interrupt) = fetcher(Arc::new(source));
    let scheduler = Scheduler::new(fetcher, 2);

    let trigger = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        interrupt.trigger();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), scheduler.run(reqs))
        .await
        .expect("run should stop promptly after interrupt");
    assert!(matches!(result, Err(ChainError::Interrupted)));
    trigger.await.unwrap();
}

#[tokio::test]
async fn test_empty_run() {
    let (fetcher, _) = fetcher(Arc::new(MockSource::new()));
    let units = Scheduler::new(fetcher, 4).run(Vec::new()).await.unwrap();
    assert!(units.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_zero_concurrency_runs_serially() {
    let reqs = requests(4);
    let source = Arc::new(source_for(&reqs));
    let (fetcher, _) = fetcher(source.clone());

    let units = Scheduler::new(fetcher, 0).run(reqs).await.unwrap();

    assert_eq!(units.len(), 4);
    assert!(units.iter().all(|u| u.is_available()));
    assert_eq!(source.peak.load(Ordering::SeqCst), 1);
}
