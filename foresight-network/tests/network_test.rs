use std::sync::Arc;
use std::time::Duration;

use foresight_core::models::{ConnectionSignals, EffectiveType, NetworkQuality};
use foresight_network::{meets_threshold, ManualConnectivity, NetworkMonitor, NetworkQualityClassifier};
use proptest::prelude::*;

fn monitor_with(signals: ConnectionSignals) -> (Arc<ManualConnectivity>, Arc<NetworkMonitor>) {
    let connectivity = Arc::new(ManualConnectivity::new(signals));
    let monitor = Arc::new(NetworkMonitor::new(
        NetworkQualityClassifier::default(),
        connectivity.clone(),
    ));
    (connectivity, monitor)
}

#[test]
fn monitor_classifies_on_construction() {
    let (_, monitor) = monitor_with(ConnectionSignals::broadband());
    assert_eq!(monitor.current(), NetworkQuality::Fast);
    assert!(monitor.is_online());
}

#[test]
fn refresh_publishes_changes_to_subscribers() {
    let (connectivity, monitor) = monitor_with(ConnectionSignals::broadband());
    let mut rx = monitor.subscribe();

    connectivity.set_online(false);
    assert_eq!(monitor.refresh(), NetworkQuality::Offline);
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), NetworkQuality::Offline);

    // Same tier again: no new notification.
    monitor.refresh();
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn polling_picks_up_connectivity_changes() {
    let (connectivity, monitor) = monitor_with(ConnectionSignals::broadband());
    let mut rx = monitor.subscribe();
    let handle = monitor.spawn_polling(Duration::from_secs(10));

    connectivity.set(ConnectionSignals {
        effective_type: Some(EffectiveType::TwoG),
        ..ConnectionSignals::broadband()
    });
    tokio::time::timeout(Duration::from_secs(30), rx.changed())
        .await
        .expect("poll should publish within one interval")
        .unwrap();
    assert_eq!(*rx.borrow(), NetworkQuality::Slow);
    handle.abort();
}

fn arb_quality() -> impl Strategy<Value = NetworkQuality> {
    prop_oneof![
        Just(NetworkQuality::Offline),
        Just(NetworkQuality::Slow),
        Just(NetworkQuality::Medium),
        Just(NetworkQuality::Fast),
    ]
}

proptest! {
    #[test]
    fn offline_never_meets_anything_above_offline(required in arb_quality()) {
        prop_assert_eq!(
            meets_threshold(NetworkQuality::Offline, required),
            required == NetworkQuality::Offline
        );
    }

    #[test]
    fn offline_flag_always_classifies_offline(
        downlink in 0.0f64..100.0,
        rtt in 0u32..2000,
        save_data in any::<bool>(),
    ) {
        let classifier = NetworkQualityClassifier::default();
        let signals = ConnectionSignals {
            effective_type: Some(EffectiveType::FourG),
            downlink_mbps: Some(downlink),
            rtt_ms: Some(rtt),
            save_data,
            online: false,
        };
        prop_assert_eq!(classifier.classify(&signals), NetworkQuality::Offline);
    }
}
