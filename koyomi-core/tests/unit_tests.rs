//! Unit tests for koyomi-core

use chrono::{TimeZone, Utc};

use koyomi_core::{
    config::{IndexFidelity, StoreConfig},
    error::Error,
    metrics::Metrics,
    types::{
        datetime_from_timestamp, timestamp_from_datetime, DurationKey, IntervalObservation,
        SeriesKey, RESERVED_FIELD_SUFFIX,
    },
};

mod key_tests {
    use super::*;

    #[test]
    fn duration_key_renderings_are_stable() {
        assert_eq!(DurationKey::from_seconds(172800).as_str(), "172800s");
        assert_eq!(
            DurationKey::from(chrono::Duration::days(2)),
            DurationKey::from_seconds(172800)
        );
        assert_eq!(DurationKey::from("daily").as_str(), "daily");
    }

    #[test]
    fn reserved_suffix_is_rejected_for_point_fields() {
        let key = SeriesKey::new("60s", "load_observation", "host1");
        let err = key.validate_point_field().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_KEY");

        let ok = SeriesKey::new("60s", "load", "host1");
        ok.validate_point_field().unwrap();
    }

    #[test]
    fn observation_key_appends_suffix() {
        let key = SeriesKey::new("60s", "load", "host1");
        let derived = key.observation_key();
        assert_eq!(derived.field, format!("load{}", RESERVED_FIELD_SUFFIX));
        assert_eq!(derived.duration, key.duration);
        assert_eq!(derived.item, key.item);
    }

    #[test]
    fn series_key_display() {
        let key = SeriesKey::new("60s", "load", "host1");
        assert_eq!(key.to_string(), "60s/load/host1");
    }
}

mod time_tests {
    use super::*;

    #[test]
    fn timestamp_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2012, 1, 5, 12, 30, 0).unwrap();
        let ts = timestamp_from_datetime(&dt);
        assert_eq!(datetime_from_timestamp(ts), Some(dt));
    }

    #[test]
    fn interval_overlap_is_half_open() {
        let obs = IntervalObservation::new(0, 10, 0);
        assert!(!obs.overlaps(10, 20));
        assert!(obs.overlaps(5, 15));
        assert!(obs.overlaps(0, 10));
        assert!(!obs.overlaps(-5, 0));
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn recoverability_classification() {
        assert!(Error::storage("boom").is_recoverable_fault());
        assert!(Error::Internal {
            message: "bug".into()
        }
        .is_recoverable_fault());
        assert!(!Error::Interrupted.is_recoverable_fault());
        assert!(!Error::InvalidKey {
            message: "bad".into()
        }
        .is_recoverable_fault());
        assert!(!Error::NotFound {
            duration: "60s".into(),
            field: "f".into(),
            item: "i".into(),
            time: 0,
        }
        .is_recoverable_fault());
    }

    #[test]
    fn io_errors_convert_and_recover() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err: Error = io.into();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(err.is_recoverable_fault());
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StoreConfig::new("/tmp/series.koyomi");
        assert_eq!(config.index_fidelity, IndexFidelity::Full);
        assert!(config.flush_on_write);
    }
}

mod metrics_tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = Metrics::new();
        metrics.record_point_write();
        metrics.record_point_write();
        metrics.record_recovered_fault();
        metrics.record_flush();

        let snap = metrics.snapshot();
        assert_eq!(snap.points_written, 2);
        assert_eq!(snap.recovered_faults, 1);
        assert_eq!(snap.flushes, 1);
        assert_eq!(snap.fatal_faults, 0);
    }
}
