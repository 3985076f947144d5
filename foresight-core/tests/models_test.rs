use chrono::{Duration, TimeZone, Utc};
use foresight_core::models::*;
use proptest::prelude::*;

#[test]
fn network_quality_total_order() {
    assert!(NetworkQuality::Fast > NetworkQuality::Medium);
    assert!(NetworkQuality::Medium > NetworkQuality::Slow);
    assert!(NetworkQuality::Slow > NetworkQuality::Offline);
    assert!(NetworkQuality::Medium.meets(NetworkQuality::Slow));
    assert!(!NetworkQuality::Slow.meets(NetworkQuality::Medium));
}

#[test]
fn effective_type_parses_host_strings() {
    assert_eq!("4g".parse::<EffectiveType>().unwrap(), EffectiveType::FourG);
    assert_eq!("slow-2g".parse::<EffectiveType>().unwrap(), EffectiveType::Slow2g);
    assert!("5g".parse::<EffectiveType>().is_err());
    assert!(EffectiveType::TwoG.is_low_bandwidth());
    assert!(!EffectiveType::ThreeG.is_low_bandwidth());
}

#[test]
fn route_stats_ignores_self_loops() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let mut stats = RouteStats::new("/a", now);
    assert!(!stats.record_transition("/a"));
    assert!(stats.record_transition("/b"));
    assert!(stats.record_transition("/b"));
    assert!(stats.transitions.get("/a").is_none());
    assert_eq!(stats.transitions["/b"], 2);
    assert_eq!(stats.total_transitions(), 2);
}

#[test]
fn route_stats_staleness() {
    let now = Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap();
    let stats = RouteStats::new("/old", now - Duration::days(31));
    assert!(stats.is_stale(now, Duration::days(30)));
    assert!(!stats.is_stale(now, Duration::days(60)));
}

#[test]
fn resource_hint_serializes_with_wire_names() {
    let hint = ResourceHint::preload("/font.woff2", "font").with_cross_origin(CrossOrigin::Anonymous);
    let json = serde_json::to_value(&hint).unwrap();
    assert_eq!(json["type"], "preload");
    assert_eq!(json["as"], "font");
    assert_eq!(json["crossOrigin"], "anonymous");
    assert_eq!(HintType::DnsPrefetch.rel(), "dns-prefetch");
}

#[test]
fn cache_entry_serializes_camel_case() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let entry = CacheEntry::new(42u32, "v1", now, Duration::seconds(10), None);
    let json = serde_json::to_value(&entry).unwrap();
    assert!(json.get("createdAt").is_some());
    assert!(json.get("expiresAt").is_some());
    assert!(json.get("metadata").is_none());
}

#[test]
fn cache_entry_expiry_saturates_past_representable_range() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let entry = CacheEntry::new((), "v", now, Duration::days(100_000_000), None);
    assert_eq!(entry.expires_at, chrono::DateTime::<Utc>::MAX_UTC);
    assert!(!entry.is_expired(now));
}

proptest! {
    #[test]
    fn cache_entry_never_expires_before_creation(ttl_secs in -10_000i64..10_000) {
        let now = Utc::now();
        let entry = CacheEntry::new((), "v", now, Duration::seconds(ttl_secs), None);
        prop_assert!(entry.expires_at >= entry.created_at);
        prop_assert!(!entry.is_expired(now));
    }
}
