//! Route optimization payloads

use serde::{Deserialize, Serialize};

use super::{Job, Location};

/// Single-day optimization request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRouteRequest {
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub start_location: Option<Location>,
    /// `YYYY-MM-DD`; defaults to today when absent
    #[serde(default)]
    pub routing_date: Option<String>,
}

/// Multi-day optimization request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeMultiDayRequest {
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub start_location: Option<Location>,
    /// `YYYY-MM-DD` of the first working day
    pub start_from_date: String,
    /// Cap on jobs per working day; defaults to 7
    #[serde(default)]
    pub max_jobs_per_day: Option<usize>,
}

/// Visiting order produced by the reasoning service.
///
/// `optimized_route` holds 1-based indices into the day's job list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOrdering {
    pub optimized_route: Vec<usize>,
    #[serde(default)]
    pub total_travel_time: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Single-day optimization response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRouteResponse {
    pub date: String,
    pub jobs: Vec<Job>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_travel_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// One scheduled working day
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    /// Calendar date `YYYY-MM-DD`
    pub date: String,
    /// 1-based day number within the plan
    pub day_number: u32,
    /// Jobs in visiting order with resolved timestamps
    pub jobs: Vec<Job>,
    /// First job's start
    pub estimated_start_time: Option<String>,
    /// Last job's end
    pub estimated_end_time: Option<String>,
}

/// Date range covered by a multi-day schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

/// Multi-day optimization response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiDayScheduleResponse {
    pub days: Vec<DaySchedule>,
    pub total_jobs: usize,
    pub total_days: usize,
    pub date_range: DateRange,
    /// Rounded to one decimal place
    pub average_jobs_per_day: f64,
}
