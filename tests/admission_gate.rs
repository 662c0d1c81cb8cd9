//! Admission gate behaviour against a scripted fleet.

use std::sync::Arc;
use std::time::Duration;

use scrapoxy_pipeline::config::GateConfig;
use scrapoxy_pipeline::health::{AdmissionGate, SnapshotCache};
use scrapoxy_pipeline::pipeline::{MemoryQueue, WorkItem};
use scrapoxy_pipeline::pool::{PoolError, ProjectMode};

mod common;
use common::{connector, starting_proxy, usable_proxy, Call, FakePool};

fn queue(n: usize) -> MemoryQueue {
    let mut queue = MemoryQueue::new();
    for i in 0..n {
        queue.push(WorkItem::new(format!("https://example.com/{}", i)));
    }
    queue
}

fn gate(pool: &Arc<FakePool>, config: GateConfig) -> AdmissionGate {
    AdmissionGate::new(pool.clone(), Arc::new(SnapshotCache::new()), config).unwrap()
}

fn restart_config(mode: ProjectMode) -> GateConfig {
    GateConfig {
        mode_restart: Some(mode),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_one_fetch_per_interval() {
    let pool = Arc::new(FakePool::healthy(3));
    let gate = gate(&pool, GateConfig::default());
    let mut source = queue(5);

    for _ in 0..5 {
        assert!(gate.try_advance(&mut source).await.unwrap().is_some());
    }
    assert_eq!(pool.listing_calls(), 1);
    assert!(source.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_after_interval() {
    let pool = Arc::new(FakePool::healthy(1));
    let gate = gate(&pool, GateConfig::default());
    let mut source = queue(3);

    gate.try_advance(&mut source).await.unwrap();
    tokio::time::advance(Duration::from_secs(10)).await;
    gate.try_advance(&mut source).await.unwrap();
    // exactly one interval old is still fresh
    assert_eq!(pool.listing_calls(), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    gate.try_advance(&mut source).await.unwrap();
    assert_eq!(pool.listing_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_empty_pool_holds_dispatch() {
    let pool = Arc::new(FakePool::new(vec![connector(
        true,
        vec![starting_proxy("p1"), {
            let mut draining = usable_proxy("p2");
            draining.removing = true;
            draining
        }],
    )]));
    let gate = gate(&pool, GateConfig::default());
    let mut source = queue(2);

    assert!(gate.try_advance(&mut source).await.unwrap().is_none());
    assert_eq!(source.len(), 2);
    // no restart mode configured: only the listing was requested
    assert_eq!(pool.calls(), vec![Call::Listing]);
}

#[tokio::test(start_paused = true)]
async fn test_restart_mode_requested_when_project_differs() {
    let pool = Arc::new(
        FakePool::new(vec![connector(false, Vec::new())])
            .with_project_status(ProjectMode::Cold),
    );
    let gate = gate(&pool, restart_config(ProjectMode::Warm));
    let mut source = queue(1);

    assert!(gate.try_advance(&mut source).await.unwrap().is_none());
    assert_eq!(
        pool.calls(),
        vec![Call::Listing, Call::GetProject, Call::SetStatus(ProjectMode::Warm)]
    );

    // fresh snapshot: nothing more until it goes stale
    pool.clear_calls();
    assert!(gate.try_advance(&mut source).await.unwrap().is_none());
    assert!(pool.calls().is_empty());

    // project already in the restart mode: no change requested
    tokio::time::advance(Duration::from_secs(11)).await;
    gate.try_advance(&mut source).await.unwrap();
    assert_eq!(pool.calls(), vec![Call::Listing, Call::GetProject]);

    // flipped back behind our back: requested again on the next stale cycle
    pool.clear_calls();
    pool.reset_project_status(ProjectMode::Cold);
    tokio::time::advance(Duration::from_secs(11)).await;
    gate.try_advance(&mut source).await.unwrap();
    assert_eq!(pool.status_calls(), vec![ProjectMode::Warm]);
}

#[tokio::test(start_paused = true)]
async fn test_restart_mode_requested_from_unknown_status() {
    let pool = Arc::new(
        FakePool::new(vec![connector(true, vec![starting_proxy("p1")])])
            .with_project_status("CALM"),
    );
    let gate = gate(&pool, restart_config(ProjectMode::Hot));
    let mut source = queue(1);

    assert!(gate.try_advance(&mut source).await.unwrap().is_none());
    assert_eq!(
        pool.calls(),
        vec![Call::Listing, Call::GetProject, Call::SetStatus(ProjectMode::Hot)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_listing_discarded_by_invalidation_skips_restart_mode() {
    let pool = Arc::new(
        FakePool::new(vec![connector(false, Vec::new())])
            .with_project_status(ProjectMode::Cold)
            .with_listing_delay(Duration::from_secs(1)),
    );
    let gate = Arc::new(gate(&pool, restart_config(ProjectMode::Warm)));

    let task = tokio::spawn({
        let gate = gate.clone();
        async move {
            let mut source = queue(1);
            gate.try_advance(&mut source).await
        }
    });

    // listing is in flight; invalidate underneath it
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(gate.cache().is_refreshing());
    gate.cache().invalidate();

    assert!(task.await.unwrap().unwrap().is_none());
    assert!(gate.cache().load().is_none());
    assert_eq!(pool.calls(), vec![Call::Listing]);
}

#[tokio::test(start_paused = true)]
async fn test_restart_mode_not_requested_while_pool_usable() {
    let pool = Arc::new(FakePool::healthy(2).with_project_status(ProjectMode::Cold));
    let gate = gate(&pool, restart_config(ProjectMode::Warm));
    let mut source = queue(1);

    assert!(gate.try_advance(&mut source).await.unwrap().is_some());
    assert_eq!(pool.calls(), vec![Call::Listing]);
}

#[tokio::test(start_paused = true)]
async fn test_invalidation_forces_single_fetch() {
    let pool = Arc::new(FakePool::healthy(1));
    let gate = gate(&pool, GateConfig::default());
    let mut source = queue(3);

    gate.try_advance(&mut source).await.unwrap();
    gate.cache().invalidate();
    gate.cache().invalidate();

    assert!(gate.try_advance(&mut source).await.unwrap().is_some());
    assert!(gate.try_advance(&mut source).await.unwrap().is_some());
    assert_eq!(pool.listing_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_refreshes_coalesce() {
    let pool = Arc::new(FakePool::healthy(1).with_listing_delay(Duration::from_secs(1)));
    let gate = Arc::new(gate(&pool, GateConfig::default()));

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..10 {
        let gate = gate.clone();
        tasks.spawn(async move {
            let mut source = queue(1);
            gate.try_advance(&mut source).await.unwrap()
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }
    assert_eq!(pool.listing_calls(), 1);

    let mut source = queue(1);
    assert!(gate.try_advance(&mut source).await.unwrap().is_some());
    assert_eq!(pool.listing_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_listing_failure_propagates_and_retries() {
    let pool = Arc::new(FakePool::healthy(1));
    pool.set_fail_listing(true);
    let gate = gate(&pool, GateConfig::default());
    let mut source = queue(1);

    let err = gate.try_advance(&mut source).await.unwrap_err();
    assert!(matches!(err, PoolError::Status { status: 500, .. }));
    assert!(gate.cache().load().is_none());
    assert!(!gate.cache().is_refreshing());
    assert_eq!(source.len(), 1);

    pool.set_fail_listing(false);
    assert!(gate.try_advance(&mut source).await.unwrap().is_some());
    assert_eq!(pool.listing_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_gate_never_asks_the_fleet() {
    let pool = Arc::new(FakePool::new(Vec::new()));
    let gate = gate(
        &pool,
        GateConfig {
            enabled: false,
            ..Default::default()
        },
    );
    let mut source = queue(1);

    assert!(gate.try_advance(&mut source).await.unwrap().is_some());
    assert!(pool.calls().is_empty());
}

#[tokio::test]
async fn test_job_start_and_end_modes() {
    let pool = Arc::new(FakePool::healthy(1));
    let gate = gate(
        &pool,
        GateConfig {
            mode_start: Some(ProjectMode::Hot),
            mode_stop: Some(ProjectMode::Off),
            ..Default::default()
        },
    );

    gate.on_job_start().await.unwrap();
    gate.on_job_end().await.unwrap();
    assert_eq!(pool.status_calls(), vec![ProjectMode::Hot, ProjectMode::Off]);
}

#[tokio::test]
async fn test_no_modes_configured() {
    let pool = Arc::new(FakePool::healthy(1));
    let gate = gate(&pool, GateConfig::default());

    gate.on_job_start().await.unwrap();
    gate.on_job_end().await.unwrap();
    assert!(pool.calls().is_empty());
}

#[test]
fn test_zero_refresh_interval_rejected() {
    let pool = Arc::new(FakePool::healthy(1));
    let result = AdmissionGate::new(
        pool,
        Arc::new(SnapshotCache::new()),
        GateConfig {
            refresh_interval_secs: 0,
            ..Default::default()
        },
    );
    assert!(result.is_err());
}
