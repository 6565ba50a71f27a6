use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lib_fgstock::configs::EngineConfig;
use lib_fgstock::core::{ChannelKind, MockBackend, RealtimeEngine};
use lib_fgstock::datasets::MockDataset;
use lib_fgstock::error::EngineError;
use lib_fgstock::models::{ConnectionStatus, InsightEvent, InsightSnapshot, MetricUpdate};

use ConnectionStatus::{Connected, Connecting, Disconnected};

type Log<T> = Arc<Mutex<Vec<T>>>;

fn recorder<T: Clone + Send + 'static>() -> (Log<T>, impl Fn(&T) + Send + Sync + 'static) {
    let log: Log<T> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    (log, move |event: &T| sink.lock().unwrap().push(event.clone()))
}

fn seen<T: Clone>(log: &Log<T>) -> Vec<T> {
    log.lock().unwrap().clone()
}

fn test_config() -> EngineConfig {
    EngineConfig {
        seed: Some(42),
        ..EngineConfig::default()
    }
}

fn engine() -> RealtimeEngine {
    RealtimeEngine::new(test_config(), &MockDataset::new()).unwrap()
}

async fn wait_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn assert_no_repeats(history: &[ConnectionStatus]) {
    for pair in history.windows(2) {
        assert_ne!(pair[0], pair[1], "repeated status in {:?}", history);
    }
}

#[test]
fn building_outside_a_runtime_fails() {
    let result = RealtimeEngine::new(test_config(), &MockDataset::new());
    assert!(matches!(result, Err(EngineError::NoRuntime(_))));
}

#[tokio::test(start_paused = true)]
async fn invalid_config_fails_fast() {
    let config = EngineConfig {
        metric_interval_ms: 0,
        ..test_config()
    };
    let result = RealtimeEngine::new(config, &MockDataset::new());
    assert!(matches!(result, Err(EngineError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn connect_reaches_connected_after_latency() {
    let engine = engine();
    let (statuses, observer) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(observer);
    assert_eq!(seen(&statuses), vec![Disconnected]);

    engine.connect();
    assert_eq!(seen(&statuses), vec![Disconnected, Connecting]);
    assert_eq!(engine.status(), Connecting);

    wait_ms(500).await;
    assert_eq!(engine.status(), Connecting);

    wait_ms(1_000).await;
    assert_eq!(seen(&statuses), vec![Disconnected, Connecting, Connected]);
}

#[tokio::test(start_paused = true)]
async fn double_connect_produces_one_transition() {
    let engine = engine();
    let (statuses, observer) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(observer);

    engine.connect();
    engine.connect();
    wait_ms(1_500).await;
    engine.connect();
    wait_ms(1_500).await;

    assert_eq!(seen(&statuses), vec![Disconnected, Connecting, Connected]);
}

#[tokio::test(start_paused = true)]
async fn repeated_calls_never_renotify() {
    let engine = engine();
    let (statuses, observer) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(observer);

    engine.disconnect();
    engine.connect();
    engine.disconnect();
    engine.disconnect();
    engine.connect();
    wait_ms(1_500).await;
    engine.connect();
    engine.disconnect();
    engine.disconnect();
    engine.connect();
    engine.connect();
    wait_ms(1_500).await;

    let history = seen(&statuses);
    assert_no_repeats(&history);
    assert_eq!(
        history,
        vec![
            Disconnected,
            Connecting,
            Disconnected,
            Connecting,
            Connected,
            Disconnected,
            Connecting,
            Connected
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn disconnect_while_connecting_never_connects() {
    let engine = engine();
    let (statuses, observer) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(observer);

    engine.connect();
    wait_ms(400).await;
    engine.disconnect();
    wait_ms(5_000).await;

    assert_eq!(seen(&statuses), vec![Disconnected, Connecting, Disconnected]);
    assert_eq!(engine.status(), Disconnected);
}

#[tokio::test(start_paused = true)]
async fn nothing_is_delivered_after_disconnect() {
    let engine = engine();
    let (metrics, on_metric) = recorder::<MetricUpdate>();
    let (insights, on_insight) = recorder::<InsightEvent>();
    engine.subscribe_metric_updates(on_metric);
    engine.subscribe_insight_events(on_insight);

    engine.connect();
    wait_ms(61_500).await;
    assert_eq!(seen(&metrics).len(), 3);
    assert_eq!(seen(&insights).len(), 2);

    engine.disconnect();
    wait_ms(300_000).await;
    assert_eq!(seen(&metrics).len(), 3);
    assert_eq!(seen(&insights).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn generator_is_silent_until_connected() {
    let engine = engine();
    let (metrics, on_metric) = recorder::<MetricUpdate>();
    engine.subscribe_metric_updates(on_metric);

    wait_ms(120_000).await;
    assert!(seen(&metrics).is_empty());
}

#[tokio::test(start_paused = true)]
async fn unsubscribed_observer_receives_nothing() {
    let engine = engine();
    let (dropped, on_dropped) = recorder::<MetricUpdate>();
    let (kept, on_kept) = recorder::<MetricUpdate>();
    let handle = engine.subscribe_metric_updates(on_dropped);
    engine.subscribe_metric_updates(on_kept);

    engine.unsubscribe(handle);
    engine.unsubscribe(handle);
    assert_eq!(engine.subscriber_count(ChannelKind::MetricUpdates), 1);

    engine.connect();
    wait_ms(45_000).await;

    assert!(seen(&dropped).is_empty());
    assert_eq!(seen(&kept).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn all_subscribers_see_the_same_sequence() {
    let engine = engine();
    let (first, on_first) = recorder::<MetricUpdate>();
    let (second, on_second) = recorder::<MetricUpdate>();
    engine.subscribe_metric_updates(on_first);
    engine.subscribe_metric_updates(on_second);

    engine.connect();
    wait_ms(201_500).await;

    let first = seen(&first);
    assert_eq!(first.len(), 10);
    assert_eq!(first, seen(&second));
}

#[tokio::test(start_paused = true)]
async fn ledger_keeps_the_ten_most_recent() {
    let engine = engine();
    let seeded: Vec<String> = engine.ledger_snapshot().iter().map(|e| e.id.clone()).collect();
    assert_eq!(seeded.len(), 6);

    let (insights, on_insight) = recorder::<InsightEvent>();
    engine.subscribe_insight_events(on_insight);

    engine.connect();
    wait_ms(211_500).await;

    let emitted = seen(&insights);
    assert_eq!(emitted.len(), 7);

    let ledger = engine.ledger_snapshot();
    let ids: Vec<&str> = ledger.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids.len(), 10);

    let newest_first: Vec<&str> = emitted.iter().rev().map(|e| e.id.as_str()).collect();
    assert_eq!(&ids[..7], newest_first.as_slice());
    assert_eq!(&ids[7..], &["insight-1", "insight-2", "insight-3"]);
    for evicted in &seeded[3..] {
        assert!(!ids.contains(&evicted.as_str()));
    }
}

#[tokio::test(start_paused = true)]
async fn ledger_channel_replays_then_leads_with_the_new_insight() {
    let engine = engine();
    let (snapshots, on_snapshot) = recorder::<InsightSnapshot>();
    let (insights, on_insight) = recorder::<InsightEvent>();
    engine.subscribe_insight_ledger(on_snapshot);
    engine.subscribe_insight_events(on_insight);

    assert_eq!(seen(&snapshots).len(), 1);
    assert_eq!(seen(&snapshots)[0].len(), 6);

    engine.connect();
    wait_ms(91_500).await;

    let snapshots = seen(&snapshots);
    let insights = seen(&insights);
    assert_eq!(insights.len(), 3);
    assert_eq!(snapshots.len(), 4);
    for (snapshot, insight) in snapshots[1..].iter().zip(&insights) {
        assert_eq!(snapshot[0].id, insight.id);
        assert!(snapshot.len() <= 10);
    }
}

#[tokio::test(start_paused = true)]
async fn late_status_subscriber_gets_the_current_value_only() {
    let engine = engine();
    engine.connect();
    wait_ms(1_500).await;

    let (statuses, observer) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(observer);
    assert_eq!(seen(&statuses), vec![Connected]);
}

#[tokio::test(start_paused = true)]
async fn metric_channel_has_no_replay() {
    let engine = engine();
    engine.connect();
    wait_ms(25_000).await;

    let (metrics, on_metric) = recorder::<MetricUpdate>();
    engine.subscribe_metric_updates(on_metric);
    assert!(seen(&metrics).is_empty());

    wait_ms(20_000).await;
    assert_eq!(seen(&metrics).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn panicking_observer_is_isolated() {
    let engine = engine();
    engine.subscribe_metric_updates(|_| panic!("broken dashboard widget"));
    let (metrics, on_metric) = recorder::<MetricUpdate>();
    engine.subscribe_metric_updates(on_metric);

    engine.connect();
    wait_ms(61_500).await;

    assert_eq!(seen(&metrics).len(), 3);
    assert_eq!(engine.status(), Connected);
}

#[tokio::test(start_paused = true)]
async fn observer_can_disconnect_from_inside_a_callback() {
    let engine = Arc::new(engine());
    let weak = Arc::downgrade(&engine);
    engine.subscribe_metric_updates(move |_| {
        if let Some(engine) = weak.upgrade() {
            engine.disconnect();
        }
    });
    let (after, on_after) = recorder::<MetricUpdate>();
    engine.subscribe_metric_updates(on_after);

    engine.connect();
    wait_ms(100_000).await;

    assert!(seen(&after).is_empty());
    assert_eq!(engine.status(), Disconnected);
}

#[tokio::test(start_paused = true)]
async fn teardown_silences_everything() {
    let engine = engine();
    let (statuses, on_status) = recorder::<ConnectionStatus>();
    let (metrics, on_metric) = recorder::<MetricUpdate>();
    engine.subscribe_connection_status(on_status);
    engine.subscribe_metric_updates(on_metric);

    engine.connect();
    wait_ms(21_500).await;
    assert_eq!(seen(&metrics).len(), 1);

    engine.teardown();
    assert!(engine.is_torn_down());
    assert_eq!(engine.status(), Disconnected);

    engine.connect();
    engine.disconnect();
    wait_ms(200_000).await;

    assert_eq!(seen(&metrics).len(), 1);
    assert_eq!(seen(&statuses), vec![Disconnected, Connecting, Connected]);

    let (late, on_late) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(on_late);
    assert!(seen(&late).is_empty());
    assert_eq!(engine.subscriber_count(ChannelKind::ConnectionStatus), 0);

    engine.teardown();
}

#[tokio::test(start_paused = true)]
async fn dropping_the_engine_stops_the_feed() {
    let engine = engine();
    let (metrics, on_metric) = recorder::<MetricUpdate>();
    engine.subscribe_metric_updates(on_metric);
    engine.connect();
    wait_ms(21_500).await;

    drop(engine);
    wait_ms(200_000).await;
    assert_eq!(seen(&metrics).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_handshakes_back_off_and_recover() {
    let engine = RealtimeEngine::builder(test_config())
        .backend(Arc::new(MockBackend::flaky(Duration::from_millis(1_000), 2)))
        .build()
        .unwrap();
    let (statuses, observer) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(observer);

    engine.connect();
    wait_ms(1_500).await;
    assert_eq!(engine.status(), Disconnected);
    assert_eq!(engine.reconnect_attempts(), 1);

    wait_ms(5_000).await;
    assert_eq!(
        seen(&statuses),
        vec![
            Disconnected,
            Connecting,
            Disconnected,
            Connecting,
            Disconnected,
            Connecting,
            Connected
        ]
    );
    assert_eq!(engine.reconnect_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn retries_stop_after_max_attempts() {
    let config = EngineConfig {
        max_reconnect_attempts: 2,
        reconnect_base_delay_ms: 1_000,
        reconnect_max_delay_ms: 1_500,
        ..test_config()
    };
    let engine = RealtimeEngine::builder(config)
        .backend(Arc::new(MockBackend::unreachable(Duration::from_millis(1_000))))
        .build()
        .unwrap();
    let (statuses, observer) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(observer);
    assert_eq!(engine.max_reconnect_attempts(), 2);

    engine.connect();
    wait_ms(60_000).await;

    let history = seen(&statuses);
    assert_no_repeats(&history);
    assert_eq!(
        history,
        vec![
            Disconnected,
            Connecting,
            Disconnected,
            Connecting,
            Disconnected,
            Connecting,
            Disconnected
        ]
    );
    assert_eq!(engine.reconnect_attempts(), 3);

    engine.connect();
    assert_eq!(engine.status(), Connecting);
    assert_eq!(engine.reconnect_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn disconnect_during_backoff_cancels_the_retry_quietly() {
    let engine = RealtimeEngine::builder(test_config())
        .backend(Arc::new(MockBackend::flaky(Duration::from_millis(1_000), 5)))
        .build()
        .unwrap();
    let (statuses, observer) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(observer);

    engine.connect();
    wait_ms(1_500).await;
    engine.disconnect();
    wait_ms(60_000).await;

    assert_eq!(seen(&statuses), vec![Disconnected, Connecting, Disconnected]);
}

#[tokio::test(start_paused = true)]
async fn connect_during_backoff_starts_a_fresh_attempt() {
    let engine = RealtimeEngine::builder(test_config())
        .backend(Arc::new(MockBackend::flaky(Duration::from_millis(1_000), 1)))
        .build()
        .unwrap();
    let (statuses, observer) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(observer);

    engine.connect();
    wait_ms(1_200).await;
    engine.connect();
    wait_ms(5_000).await;

    assert_eq!(
        seen(&statuses),
        vec![Disconnected, Connecting, Disconnected, Connecting, Connected]
    );
}

#[tokio::test(start_paused = true)]
async fn status_change_from_a_status_observer_queues_behind_the_current_one() {
    let engine = Arc::new(engine());
    let weak = Arc::downgrade(&engine);
    let (first, on_first) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(move |status| {
        on_first(status);
        if *status == Connecting {
            if let Some(engine) = weak.upgrade() {
                engine.disconnect();
            }
        }
    });
    let (second, on_second) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(on_second);

    engine.connect();
    wait_ms(2_000).await;

    assert_eq!(seen(&first), vec![Disconnected, Connecting, Disconnected]);
    assert_eq!(seen(&second), vec![Disconnected, Connecting, Disconnected]);
    assert_no_repeats(&seen(&second));
    assert_eq!(engine.status(), Disconnected);
}

#[tokio::test(start_paused = true)]
async fn reconnect_from_a_status_observer_keeps_order() {
    let engine = Arc::new(engine());
    let weak = Arc::downgrade(&engine);
    let bounced = AtomicBool::new(false);
    engine.subscribe_connection_status(move |status| {
        if *status == Connected && !bounced.swap(true, Ordering::SeqCst) {
            if let Some(engine) = weak.upgrade() {
                engine.disconnect();
                engine.connect();
            }
        }
    });
    let (statuses, observer) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(observer);

    engine.connect();
    wait_ms(5_000).await;

    assert_eq!(
        seen(&statuses),
        vec![Disconnected, Connecting, Connected, Disconnected, Connecting, Connected]
    );
}

#[tokio::test(start_paused = true)]
async fn panicking_status_observer_is_isolated() {
    let engine = engine();
    engine.subscribe_connection_status(|_| panic!("broken status badge"));
    let (statuses, observer) = recorder::<ConnectionStatus>();
    engine.subscribe_connection_status(observer);

    engine.connect();
    wait_ms(1_500).await;
    engine.disconnect();

    assert_eq!(seen(&statuses), vec![Disconnected, Connecting, Connected, Disconnected]);
}

#[tokio::test(start_paused = true)]
async fn panicking_ledger_observer_is_isolated() {
    let engine = engine();
    engine.subscribe_insight_ledger(|_| panic!("broken insight panel"));
    let (snapshots, on_snapshot) = recorder::<InsightSnapshot>();
    let (insights, on_insight) = recorder::<InsightEvent>();
    engine.subscribe_insight_ledger(on_snapshot);
    engine.subscribe_insight_events(on_insight);

    engine.connect();
    wait_ms(61_500).await;

    assert_eq!(seen(&insights).len(), 2);
    let snapshots = seen(&snapshots);
    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[2][0].id, seen(&insights)[1].id);
}

#[tokio::test(start_paused = true)]
async fn handle_from_another_engine_is_ignored() {
    let ours = engine();
    let theirs = engine();
    let (metrics, on_metric) = recorder::<MetricUpdate>();
    ours.subscribe_metric_updates(on_metric);

    let foreign = theirs.subscribe_metric_updates(|_| {});
    ours.unsubscribe(foreign);
    assert_eq!(ours.subscriber_count(ChannelKind::MetricUpdates), 1);

    ours.connect();
    wait_ms(45_000).await;
    assert_eq!(seen(&metrics).len(), 2);
}
