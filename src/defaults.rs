use chrono::NaiveTime;

/// Hard cap on jobs per optimization request
pub const MAX_TOTAL_JOBS: usize = 20;

/// Default cap on jobs per working day
pub const DEFAULT_MAX_JOBS_PER_DAY: usize = 7;

/// Default cap on scheduled minutes per working day (8 hours)
pub const DEFAULT_MAX_MINUTES_PER_DAY: u32 = 480;

/// Mean cluster distance above which a job starts a new day bucket (km)
pub const CLUSTER_RADIUS_KM: f64 = 15.0;

/// Mean distance above which a bucket's outlier is moved during rebalancing (km)
pub const OUTLIER_RADIUS_KM: f64 = 10.0;

/// Travel estimate used when a matrix lookup has no entry (minutes)
pub const DEFAULT_TRAVEL_MINUTES: i64 = 15;

/// Randomized buffer added on top of every travel leg (minutes, inclusive)
pub const MIN_BUFFER_MINUTES: u32 = 15;
pub const MAX_BUFFER_MINUTES: u32 = 30;

pub fn default_day_start() -> NaiveTime {
    NaiveTime::from_hms_opt(7, 30, 0).expect("valid static default day start")
}
