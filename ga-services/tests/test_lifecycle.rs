//! Integration tests for the store lifecycle controller.
//!
//! Covers the startup sequence, the ready signal, degraded startup on an
//! unusable storage root or an incomplete seed, page-discard teardown
//! under both retention policies and past its deadline, and the events
//! published along the way.

mod common;

use ga_core::config::AppConfig;
use ga_services::event_bus::StoreEvent;
use ga_services::{LifecyclePhase, TeardownOutcome};
use ga_store::{DeleteOutcome, LocalStore, MessageQuery, SeedLoader};
use tempfile::TempDir;

fn persistent_config(dir: &TempDir) -> AppConfig {
    let mut config = common::create_test_config(dir);
    config.store.reset_on_load = false;
    config.store.delete_on_unload = false;
    config
}

// ---- Startup ----

#[tokio::test]
async fn startup_seeds_placeholders_and_becomes_ready() {
    let dir = TempDir::new().unwrap();
    let config = common::create_test_config(&dir);
    let (mut ctrl, _bus) = common::create_test_controller(&config);

    let report = ctrl.startup().await;
    assert!(report.opened);
    assert!(!report.degraded);
    assert_eq!(ctrl.phase(), LifecyclePhase::Ready);

    let query = ctrl.query().unwrap();
    assert_eq!(query.count("GaMessages").await.unwrap(), 20);
    let all = query.get_all("GaMessages").await.unwrap();
    assert_eq!(all[0].content, config.seed.messages[0]);
    assert_eq!(all[5].content, config.seed.messages[0]);
    assert_eq!(all[19].key, 19);
}

#[tokio::test]
async fn ready_signal_resolves_after_startup() {
    let dir = TempDir::new().unwrap();
    let config = common::create_test_config(&dir);
    let (mut ctrl, _bus) = common::create_test_controller(&config);

    let mut signal = ctrl.ready_signal();
    let waiter = tokio::spawn(async move { signal.wait().await });
    assert!(!ctrl.ready_signal().is_ready());

    ctrl.startup().await;

    let ready = waiter.await.unwrap();
    assert!(!ready.degraded);

    // Late subscribers resolve immediately.
    let mut late = ctrl.ready_signal();
    assert!(late.is_ready());
    assert!(!late.wait().await.degraded);
}

#[tokio::test]
async fn ready_signal_resolves_degraded_when_controller_dropped() {
    let dir = TempDir::new().unwrap();
    let config = common::create_test_config(&dir);
    let (ctrl, _bus) = common::create_test_controller(&config);

    let mut signal = ctrl.ready_signal();
    drop(ctrl);
    assert!(signal.wait().await.degraded);
}

#[tokio::test]
async fn unusable_root_starts_degraded() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let mut config = common::create_test_config(&dir);
    config.store.directory = blocker.join("store").display().to_string();
    let (mut ctrl, bus) = common::create_test_controller(&config);
    let mut rx = bus.subscribe();
    let mut signal = ctrl.ready_signal();

    let report = ctrl.startup().await;
    assert!(!report.opened);
    assert!(report.degraded);
    assert!(report.seed.is_none());
    assert_eq!(ctrl.phase(), LifecyclePhase::Ready);
    assert!(ctrl.query().is_none());
    assert!(signal.wait().await.degraded);

    let events = common::drain_events(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, StoreEvent::StartupDegraded { .. })));
}

#[tokio::test]
async fn reset_on_load_discards_previous_session() {
    let dir = TempDir::new().unwrap();
    let config = common::create_test_config(&dir);

    // A previous session left more records behind than the seed writes.
    let previous = LocalStore::new(dir.path(), config.store.clone());
    let db = previous
        .open("ChatMessages", 1, |up| up.create_partition("GaMessages"))
        .await
        .unwrap();
    let leftovers: Vec<String> = (0..30).map(|i| format!("old {i}")).collect();
    SeedLoader::new(db).seed("GaMessages", leftovers.as_slice()).await;
    previous.close_all();

    let (mut ctrl, _bus) = common::create_test_controller(&config);
    let report = ctrl.startup().await;
    assert_eq!(report.reset, Some(DeleteOutcome::Deleted));

    let query = ctrl.query().unwrap();
    assert_eq!(query.count("GaMessages").await.unwrap(), 20);
    assert!(query.get_one("GaMessages", 25).await.unwrap().is_none());
}

#[tokio::test]
async fn incomplete_seed_starts_degraded_with_store_open() {
    let dir = TempDir::new().unwrap();
    let config = persistent_config(&dir);
    let (mut first, _bus) = common::create_test_controller(&config);
    first.startup().await;
    assert_eq!(first.shutdown_sequence().await, TeardownOutcome::Closed);

    // Same version, so no upgrade runs and "Other" is never registered.
    let mut renamed = persistent_config(&dir);
    renamed.store.partition = "Other".into();
    let (mut ctrl, bus) = common::create_test_controller(&renamed);
    let mut rx = bus.subscribe();
    let mut signal = ctrl.ready_signal();

    let report = ctrl.startup().await;
    assert!(report.opened);
    assert!(report.degraded);
    let seed = report.seed.unwrap();
    assert_eq!(seed.written, 0);
    assert_eq!(seed.failed.len(), 20);

    assert_eq!(ctrl.phase(), LifecyclePhase::Ready);
    assert!(ctrl.is_degraded());
    let query = ctrl.query().unwrap();
    assert_eq!(query.count("GaMessages").await.unwrap(), 20);
    assert!(signal.wait().await.degraded);

    let events = common::drain_events(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        StoreEvent::Seeded { written: 0, failed: 20, .. }
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, StoreEvent::StartupDegraded { .. })));
}

#[tokio::test]
async fn seeding_disabled_leaves_partition_empty() {
    let dir = TempDir::new().unwrap();
    let mut config = common::create_test_config(&dir);
    config.seed.enabled = false;
    let (mut ctrl, _bus) = common::create_test_controller(&config);

    let report = ctrl.startup().await;
    assert!(report.seed.is_none());
    assert!(!report.degraded);
    assert_eq!(ctrl.query().unwrap().count("GaMessages").await.unwrap(), 0);
}

#[tokio::test]
async fn startup_publishes_phases_in_order() {
    let dir = TempDir::new().unwrap();
    let config = common::create_test_config(&dir);
    let (mut ctrl, bus) = common::create_test_controller(&config);
    let mut rx = bus.subscribe();

    ctrl.startup().await;

    let events = common::drain_events(&mut rx);
    let phases: Vec<LifecyclePhase> = events
        .iter()
        .filter_map(|e| match e {
            StoreEvent::PhaseChanged { phase } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![LifecyclePhase::Opening, LifecyclePhase::Seeding, LifecyclePhase::Ready]
    );
    assert!(events.iter().any(|e| matches!(
        e,
        StoreEvent::Seeded { written: 20, failed: 0, .. }
    )));
}

// ---- Teardown ----

#[tokio::test]
async fn page_discard_deletes_database() {
    let dir = TempDir::new().unwrap();
    let config = common::create_test_config(&dir);
    let (mut ctrl, bus) = common::create_test_controller(&config);
    let mut rx = bus.subscribe();

    ctrl.startup().await;
    let db = ctrl.database().cloned().unwrap();
    assert!(ctrl.store().exists("ChatMessages"));

    let teardown = ctrl.on_page_discard();
    assert!(ctrl.query().is_none());

    let outcome = teardown.await.unwrap();
    assert_eq!(outcome, TeardownOutcome::Delete(DeleteOutcome::Deleted));
    assert_eq!(ctrl.phase(), LifecyclePhase::Deleted);
    assert_eq!(ctrl.teardown_outcome(), Some(outcome));
    assert!(db.is_closed());
    assert!(!ctrl.store().exists("ChatMessages"));

    let events = common::drain_events(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, StoreEvent::DatabaseDeleted { .. })));
}

#[tokio::test]
async fn second_page_discard_is_skipped() {
    let dir = TempDir::new().unwrap();
    let config = common::create_test_config(&dir);
    let (mut ctrl, _bus) = common::create_test_controller(&config);

    ctrl.startup().await;
    ctrl.on_page_discard().await.unwrap();
    assert_eq!(ctrl.on_page_discard().await.unwrap(), TeardownOutcome::Skipped);
}

#[tokio::test]
async fn page_discard_before_startup_deletes_nothing_harmful() {
    let dir = TempDir::new().unwrap();
    let config = common::create_test_config(&dir);
    let (mut ctrl, _bus) = common::create_test_controller(&config);

    let outcome = ctrl.shutdown_sequence().await;
    assert_eq!(outcome, TeardownOutcome::Delete(DeleteOutcome::Absent));
    assert_eq!(ctrl.phase(), LifecyclePhase::Deleted);
}

#[tokio::test]
async fn delete_past_deadline_times_out_and_stays_closed() {
    let dir = TempDir::new().unwrap();
    let mut config = common::create_test_config(&dir);
    // Validation rejects 0; set it directly to force the deadline to lapse.
    config.store.teardown_deadline_ms = 0;
    let (mut ctrl, bus) = common::create_test_controller(&config);
    let mut rx = bus.subscribe();

    ctrl.startup().await;
    let db = ctrl.database().cloned().unwrap();

    let outcome = ctrl.shutdown_sequence().await;
    assert_eq!(outcome, TeardownOutcome::TimedOut);
    assert_eq!(ctrl.phase(), LifecyclePhase::Closed);
    assert_eq!(ctrl.teardown_outcome(), Some(TeardownOutcome::TimedOut));
    assert!(db.is_closed());

    let diagnostics = ctrl.diagnostics();
    assert_eq!(diagnostics.teardown, Some(TeardownOutcome::TimedOut));
    assert!(diagnostics.to_string().contains("teardown=TimedOut"));

    let phases: Vec<LifecyclePhase> = common::drain_events(&mut rx)
        .iter()
        .filter_map(|e| match e {
            StoreEvent::PhaseChanged { phase } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases.last(), Some(&LifecyclePhase::Closed));
    assert!(!phases.contains(&LifecyclePhase::Deleted));
}

#[tokio::test]
async fn persistent_policy_keeps_data_across_sessions() {
    let dir = TempDir::new().unwrap();
    let config = persistent_config(&dir);

    let (mut first, _bus) = common::create_test_controller(&config);
    let report = first.startup().await;
    assert!(report.reset.is_none());
    SeedLoader::new(first.database().cloned().unwrap())
        .put("GaMessages", 99, "kept")
        .await
        .unwrap();

    assert_eq!(first.shutdown_sequence().await, TeardownOutcome::Closed);
    assert_eq!(first.phase(), LifecyclePhase::Closed);
    assert_eq!(first.teardown_outcome(), Some(TeardownOutcome::Closed));
    assert!(first.store().exists("ChatMessages"));

    let (mut second, _bus) = common::create_test_controller(&config);
    second.startup().await;
    let query: MessageQuery = second.query().unwrap();
    // Reseeding upserts the same 20 keys; the extra record survives.
    assert_eq!(query.count("GaMessages").await.unwrap(), 21);
    assert_eq!(query.get_one("GaMessages", 99).await.unwrap().unwrap().content, "kept");
}
