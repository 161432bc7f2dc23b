//! Time layout engine
//!
//! Walks one day's ordered jobs and assigns concrete start/end timestamps:
//! the cursor opens at 07:30, every start is ceiled to a quarter-hour
//! boundary, and each travel leg gets a randomized 15-30 minute buffer on
//! top of the matrix travel time.
//!
//! Timestamps are wall-clock strings in the `YYYY-MM-DDTHH:MM:SS.000Z`
//! format the frontend expects. The `.000Z` suffix is literal: these are
//! local wall-clock fields, not a UTC conversion.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use rand::Rng;

use crate::defaults::{
    default_day_start, DEFAULT_TRAVEL_MINUTES, MAX_BUFFER_MINUTES, MIN_BUFFER_MINUTES,
};
use crate::services::travel_time::TravelMatrix;
use crate::types::Job;

/// Source of the per-leg buffer minutes.
///
/// Injected so tests can pin buffer values and assert exact timestamps.
pub trait BufferSource: Send {
    fn next_buffer_minutes(&mut self) -> u32;
}

/// Production buffer source: uniform 15-30 minutes inclusive
pub struct RandomBuffer<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomBuffer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomBuffer<rand::rngs::StdRng> {
    pub fn from_entropy() -> Self {
        use rand::SeedableRng;
        Self { rng: rand::rngs::StdRng::from_entropy() }
    }
}

impl<R: Rng + Send> BufferSource for RandomBuffer<R> {
    fn next_buffer_minutes(&mut self) -> u32 {
        self.rng.gen_range(MIN_BUFFER_MINUTES..=MAX_BUFFER_MINUTES)
    }
}

/// Render a wall-clock timestamp in the frontend's format
pub fn format_wall_clock(datetime: NaiveDateTime) -> String {
    format!("{}.000Z", datetime.format("%Y-%m-%dT%H:%M:%S"))
}

/// Ceiling to the next 0/15/30/45 minute boundary; exact boundaries stay put
fn ceil_to_quarter_hour(datetime: NaiveDateTime) -> NaiveDateTime {
    let mut result = datetime;

    let seconds = result.second();
    if seconds > 0 {
        result += Duration::seconds(60 - seconds as i64);
    }

    let remainder = result.minute() % 15;
    if remainder > 0 {
        result += Duration::minutes((15 - remainder) as i64);
    }

    result
        .with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(result)
}

/// Assign start/end timestamps to one day's jobs, in visiting order.
///
/// `matrix_indices[i]` is job i's column in `matrix` (the matrix is built
/// for the day's original job order, rows = [start] + jobs). A matrix miss
/// for a leg degrades to a fixed travel estimate rather than erroring.
pub fn lay_out_day(
    mut jobs: Vec<Job>,
    matrix_indices: &[usize],
    matrix: &TravelMatrix,
    date: NaiveDate,
    buffers: &mut dyn BufferSource,
) -> Vec<Job> {
    let mut cursor = date.and_time(default_day_start());
    let count = jobs.len();

    for i in 0..count {
        let minutes = jobs[i].estimated_minutes() as i64;

        let start = ceil_to_quarter_hour(cursor);
        let end = start + Duration::minutes(minutes);

        jobs[i].start_date = Some(format_wall_clock(start));
        jobs[i].end_date = Some(format_wall_clock(end));
        jobs[i].route_order = Some((i + 1) as i32);
        cursor = end;

        if i + 1 < count {
            let from = matrix_indices[i];
            let to = matrix_indices[i + 1];

            let travel_minutes = matrix
                .duration_seconds(from, to)
                .map(|seconds| (seconds as f64 / 60.0).ceil() as i64)
                .unwrap_or(DEFAULT_TRAVEL_MINUTES);
            jobs[i].travel_time_to_next = matrix.duration_text(from, to).map(str::to_string);

            let buffer_minutes = buffers.next_buffer_minutes() as i64;
            cursor = end + Duration::minutes(travel_minutes + buffer_minutes);
        }
    }

    jobs
}
