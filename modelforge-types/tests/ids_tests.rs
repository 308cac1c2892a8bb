use modelforge_types::{Timestamp, TrackingId};
use std::collections::HashSet;

// ── TrackingId ────────────────────────────────────────────────────

#[test]
fn tracking_id_new_is_unique() {
    let ids: HashSet<TrackingId> = (0..100).map(|_| TrackingId::new()).collect();
    assert_eq!(ids.len(), 100);
}

#[test]
fn tracking_id_records_its_start() {
    let before = Timestamp::now().as_micros() / 1_000;
    let id = TrackingId::new();
    let after = Timestamp::now().as_micros() / 1_000;

    let started = id.started_at().as_micros() / 1_000;
    assert!(before <= started && started <= after);
    assert_eq!(id.started_at().as_micros() % 1_000, 0);
}

#[test]
fn tracking_ids_sort_by_start() {
    let first = TrackingId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = TrackingId::new();
    assert!(first < second);
    assert!(first.started_at().is_before(&second.started_at()));
}

#[test]
fn tracking_id_display_is_prefixed() {
    let text = TrackingId::new().to_string();
    assert!(text.starts_with("trk-"));
    assert_eq!(text.len(), 4 + 32);
}

#[test]
fn tracking_id_serde_is_transparent() {
    let id = TrackingId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(serde_json::from_str::<TrackingId>(&json).unwrap(), id);
    assert!(json.starts_with('"') && json.contains('-'));
}

// ── Timestamp ─────────────────────────────────────────────────────

#[test]
fn timestamp_default_is_epoch() {
    assert_eq!(Timestamp::default(), Timestamp::EPOCH);
    assert_eq!(Timestamp::EPOCH.to_string(), "1970-01-01T00:00:00.000000Z");
}

#[test]
fn timestamp_le_bytes_roundtrip() {
    let ts = Timestamp::from_micros(-1);
    assert_eq!(ts.to_le_bytes(), [0xff; 8]);
    assert_eq!(Timestamp::from_le_bytes(ts.to_le_bytes()), ts);
}

#[test]
fn timestamp_parses_rfc3339_with_offset() {
    let ts = Timestamp::parse("1970-01-01T01:00:00+01:00").unwrap();
    assert_eq!(ts, Timestamp::EPOCH);
}

#[test]
fn timestamp_parses_raw_micros() {
    assert_eq!(Timestamp::parse(" 1500 ").unwrap().as_micros(), 1500);
}

#[test]
fn timestamp_rejects_garbage() {
    assert!(Timestamp::parse("yesterday").is_err());
}

#[test]
fn timestamp_ordering() {
    let a = Timestamp::from_micros(1);
    let b = Timestamp::from_micros(2);
    assert!(a.is_before(&b));
    assert!(b.is_after(&a));
}
