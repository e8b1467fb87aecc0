use chrono::NaiveDate;
use core_types::RawObservation;
use price_cache::CsvPriceCache;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 3, day).unwrap()
}

#[test]
fn missing_markers_survive_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CsvPriceCache::new(dir.path().join("nested/raw"));
    let observations = vec![
        RawObservation::new(d(1), 101.25),
        RawObservation::missing(d(2)),
        RawObservation::new(d(3), 99.5),
    ];

    let path = cache.save("JPM", d(1), d(31), &observations).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("date,close\n"));
    assert!(text.contains("2023-03-02,\n"));

    let loaded = cache.load("JPM", d(1), d(31)).unwrap().unwrap();
    assert_eq!(loaded, observations);
}

#[test]
fn ranges_are_cached_independently() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CsvPriceCache::new(dir.path());
    cache
        .save("BAC", d(1), d(10), &[RawObservation::new(d(1), 30.0)])
        .unwrap();

    assert!(cache.load("BAC", d(1), d(10)).unwrap().is_some());
    assert!(cache.load("BAC", d(1), d(11)).unwrap().is_none());
}
