// ABOUTME: Tests for release identifier ordering guarantees.
// ABOUTME: Lexicographic order of rendered ids must equal chronological order.

use capstan::types::ReleaseId;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

#[test]
fn sequential_allocations_are_strictly_increasing() {
    let ids: Vec<ReleaseId> = (0..50).map(|_| ReleaseId::allocate()).collect();
    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1]);
        assert!(pair[0].to_string() < pair[1].to_string());
    }
}

#[test]
fn rendered_ids_sort_like_timestamps() {
    let early = ReleaseId::from_timestamp(Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap());
    let late = ReleaseId::from_timestamp(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());
    assert!(early < late);
    assert!(early.to_string() < late.to_string());
}

#[test]
fn parse_rejects_directory_noise() {
    assert!("current".parse::<ReleaseId>().is_err());
    assert!(".tmp".parse::<ReleaseId>().is_err());
    assert!("2025".parse::<ReleaseId>().is_err());
}

proptest! {
    /// Sorting rendered ids lexicographically equals sorting by creation time,
    /// for arbitrary sets of timestamps up to year ~2100.
    #[test]
    fn lexicographic_order_equals_chronological(millis in proptest::collection::vec(0i64..4_102_444_800_000, 2..20)) {
        let ids: Vec<ReleaseId> = millis
            .iter()
            .map(|ms| ReleaseId::from_timestamp(Utc.timestamp_millis_opt(*ms).unwrap()))
            .collect();

        let mut by_time = ids.clone();
        by_time.sort();

        let mut rendered: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        rendered.sort();

        let by_time_rendered: Vec<String> = by_time.iter().map(|id| id.to_string()).collect();
        prop_assert_eq!(rendered, by_time_rendered);
    }

    /// Every id round-trips through its rendered form.
    #[test]
    fn round_trip(ms in 0i64..4_102_444_800_000) {
        let id = ReleaseId::from_timestamp(Utc.timestamp_millis_opt(ms).unwrap());
        let parsed: ReleaseId = id.to_string().parse().unwrap();
        prop_assert_eq!(id, parsed);
    }
}
