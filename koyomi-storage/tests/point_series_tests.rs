//! Point-series store tests: upsert vs append, half-open ranges,
//! first/last/closest selection, key validation, persistence.

use tempfile::TempDir;

use koyomi_core::{Error, SeriesKey, StoreConfig};
use koyomi_storage::predicate::{CmpOp, Predicate};
use koyomi_storage::schema::{col, Value};
use koyomi_storage::TimeSeriesStore;

fn open_store(dir: &TempDir) -> TimeSeriesStore {
    TimeSeriesStore::open(StoreConfig::new(dir.path().join("series.koyomi"))).unwrap()
}

fn key(field: &str) -> SeriesKey {
    SeriesKey::new("60s", field, "host1")
}

#[test]
fn get_returns_not_found_for_missing_time() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let err = store.points().get(&key("load"), 100).unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");

    // Recoverable at the caller: translate to a default.
    let v = store.points().get_or(&key("load"), 100, 0.25).unwrap();
    assert_eq!(v, 0.25);
}

#[test]
fn put_twice_leaves_one_row_with_new_value() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let k = key("load");

    store.points().put(&k, 100, 1.0).unwrap();
    store.points().put(&k, 100, 2.0).unwrap();

    let rows = store.points().select_range(&k, 0, 1000).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, 2.0);
    assert_eq!(store.points().get(&k, 100).unwrap().value, 2.0);
}

#[test]
fn append_twice_keeps_two_rows() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let k = key("load");

    store.points().append(&k, 100, 1.0).unwrap();
    store.points().append(&k, 100, 2.0).unwrap();

    let rows = store.points().select_range(&k, 0, 1000).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn put_after_duplicate_appends_replaces_first_match_only() {
    // Known quirk: put replaces the first matching row and leaves later
    // duplicates untouched.
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let k = key("load");

    store.points().append(&k, 100, 1.0).unwrap();
    store.points().append(&k, 100, 2.0).unwrap();
    store.points().put(&k, 100, 9.0).unwrap();

    let rows = store.points().select_range(&k, 0, 1000).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].value, 9.0);
    assert_eq!(rows[1].value, 2.0);
}

#[test]
fn select_range_is_half_open() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let k = key("load");

    for t in [5, 6, 9, 10] {
        store.points().append(&k, t, t as f64).unwrap();
    }

    let rows = store.points().select_range(&k, 5, 10).unwrap();
    let times: Vec<i64> = rows.iter().map(|r| r.time).collect();
    assert_eq!(times, vec![5, 6, 9]);
}

#[test]
fn raw_select_uses_engine_predicates() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let k = key("load");

    store.points().append(&k, 1, 0.1).unwrap();
    store.points().append(&k, 2, 0.9).unwrap();
    store.points().append(&k, 3, 0.2).unwrap();

    let pred = Predicate::cmp(col::VALUE, CmpOp::Ge, Value::Float(0.5));
    let rows = store.points().select(&k, pred).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].time, 2);
}

#[test]
fn first_and_last_in_range() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let k = key("load");

    store.points().append(&k, 30, 3.0).unwrap();
    store.points().append(&k, 10, 1.0).unwrap();
    store.points().append(&k, 20, 2.0).unwrap();

    let first = store.points().first_in_range(&k, 0, 100).unwrap().unwrap();
    let last = store.points().last_in_range(&k, 0, 100).unwrap().unwrap();
    assert_eq!(first.time, 10);
    assert_eq!(last.time, 30);

    assert!(store.points().first_in_range(&k, 40, 100).unwrap().is_none());
}

#[test]
fn extreme_tie_break_is_insertion_order() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let k = key("load");

    store.points().append(&k, 10, 1.0).unwrap();
    store.points().append(&k, 10, 2.0).unwrap();

    // Deterministic rule: earliest-inserted row wins a tie.
    let first = store.points().first_in_range(&k, 0, 100).unwrap().unwrap();
    let last = store.points().last_in_range(&k, 0, 100).unwrap().unwrap();
    assert_eq!(first.value, 1.0);
    assert_eq!(last.value, 1.0);
}

mod closest_in_time {
    use super::*;

    #[test]
    fn exact_match_wins_even_with_neighbors() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let k = key("load");

        store.points().append(&k, 99, 1.0).unwrap();
        store.points().append(&k, 100, 2.0).unwrap();
        store.points().append(&k, 101, 3.0).unwrap();

        let row = store.points().closest_in_time(&k, 100, 50).unwrap().unwrap();
        assert_eq!(row.value, 2.0);
    }

    #[test]
    fn nearer_candidate_wins() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let k = key("load");

        store.points().append(&k, 90, 1.0).unwrap();
        store.points().append(&k, 103, 2.0).unwrap();

        let row = store.points().closest_in_time(&k, 100, 50).unwrap().unwrap();
        assert_eq!(row.time, 103);
    }

    #[test]
    fn equal_distance_resolves_to_earlier() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let k = key("load");

        store.points().append(&k, 95, 1.0).unwrap();
        store.points().append(&k, 105, 2.0).unwrap();

        let row = store.points().closest_in_time(&k, 100, 50).unwrap().unwrap();
        assert_eq!(row.time, 95);
    }

    #[test]
    fn single_sided_candidates() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let k = key("load");

        store.points().append(&k, 80, 1.0).unwrap();
        let row = store.points().closest_in_time(&k, 100, 50).unwrap().unwrap();
        assert_eq!(row.time, 80);

        store.points().append(&k, 220, 2.0).unwrap();
        let row = store.points().closest_in_time(&k, 210, 50).unwrap().unwrap();
        assert_eq!(row.time, 220);
    }

    #[test]
    fn window_clamps_at_timestamp_extremes() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let k = key("load");

        // A radius that would push the window past i64::MAX clamps
        // instead of overflowing.
        store.points().append(&k, 100, 1.0).unwrap();
        let row = store
            .points()
            .closest_in_time(&k, i64::MAX - 5, i64::MAX)
            .unwrap()
            .unwrap();
        assert_eq!(row.time, 100);

        // Same at the negative end.
        store.points().append(&k, -100, 2.0).unwrap();
        let row = store
            .points()
            .closest_in_time(&k, i64::MIN + 5, i64::MAX)
            .unwrap()
            .unwrap();
        assert_eq!(row.time, -100);
    }

    #[test]
    fn nothing_in_radius_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let k = key("load");

        store.points().append(&k, 0, 1.0).unwrap();
        assert!(store.points().closest_in_time(&k, 100, 50).unwrap().is_none());
    }
}

#[test]
fn reserved_suffix_rejected_on_every_entry_point() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let k = key("load_observation");

    let invalid = |e: Error| assert_eq!(e.error_code(), "INVALID_KEY");
    invalid(store.points().get(&k, 0).unwrap_err());
    invalid(store.points().put(&k, 0, 1.0).unwrap_err());
    invalid(store.points().append(&k, 0, 1.0).unwrap_err());
    invalid(store.points().select_range(&k, 0, 1).unwrap_err());
    invalid(store.points().first_in_range(&k, 0, 1).unwrap_err());
}

#[test]
fn points_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("series.koyomi");
    let k = key("load");

    {
        let store = TimeSeriesStore::open(StoreConfig::new(&path)).unwrap();
        store.points().put(&k, 100, 1.5).unwrap();
        store.close().unwrap();
    }

    let store = TimeSeriesStore::open(StoreConfig::new(&path)).unwrap();
    assert_eq!(store.points().get(&k, 100).unwrap().value, 1.5);
}

#[test]
fn metrics_track_reads_and_writes() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let k = key("load");

    store.points().put(&k, 1, 1.0).unwrap();
    store.points().append(&k, 2, 2.0).unwrap();
    let _ = store.points().get(&k, 1).unwrap();

    let snap = store.metrics();
    assert_eq!(snap.points_written, 2);
    assert!(snap.reads >= 1);
    assert!(snap.flushes >= 2);
}
