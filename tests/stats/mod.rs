use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use opcache_toolkit_stats::{HealthSample, MemoryStorage, SampleRepository};

mod forecast;

pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap() + ChronoDuration::days(n)
}

pub fn sample(n: i64, wasted: u64) -> HealthSample {
    HealthSample::new(day(n), 97.5, 1_200, wasted)
}

pub fn repository(storage: &MemoryStorage) -> SampleRepository<MemoryStorage> {
    SampleRepository::builder(storage.clone()).build().unwrap()
}
