//! Route optimization orchestrator
//!
//! Ties the pipeline together: validate the request, split jobs into day
//! buckets, and for each day fetch a travel matrix, ask the reasoning
//! service for a visiting order, and lay the day out on the clock.
//!
//! Days are scheduled sequentially so a failure can be attributed to a
//! specific day in the plan.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{Days, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::defaults::{DEFAULT_MAX_JOBS_PER_DAY, DEFAULT_MAX_MINUTES_PER_DAY, MAX_TOTAL_JOBS};
use crate::services::completion::CompletionService;
use crate::services::layout::{lay_out_day, RandomBuffer};
use crate::services::ordering::request_route_ordering;
use crate::services::planner::distribute_jobs;
use crate::services::travel_time::TravelTimeService;
use crate::types::{
    Coordinates, DateRange, DaySchedule, Job, Location, MultiDayScheduleResponse,
    OptimizeMultiDayRequest, OptimizeRouteRequest, OptimizeRouteResponse,
};

static DATE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid static regex"));

#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The request itself is unusable
    #[error("{0}")]
    Validation(String),
    /// One day of a plan could not be scheduled
    #[error("Failed to schedule day {day}: {message}")]
    Day { day: usize, message: String },
    /// A collaborator failed outside any specific day
    #[error("{message}")]
    Service { message: String },
}

impl OptimizeError {
    /// Stable error code for the response envelope
    pub fn code(&self) -> &'static str {
        match self {
            OptimizeError::Validation(_) => "VALIDATION_ERROR",
            OptimizeError::Day { .. } | OptimizeError::Service { .. } => "OPTIMIZATION_ERROR",
        }
    }
}

/// One scheduled day before response assembly
struct ScheduledDay {
    jobs: Vec<Job>,
    total_travel_time: Option<String>,
    explanation: Option<String>,
}

/// Route optimizer over a completion service and a travel-time service
pub struct RouteOptimizer {
    completion: Arc<dyn CompletionService>,
    travel_time: Arc<dyn TravelTimeService>,
}

impl RouteOptimizer {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        travel_time: Arc<dyn TravelTimeService>,
    ) -> Self {
        Self { completion, travel_time }
    }

    /// Optimize a single working day
    pub async fn optimize_single_day(
        &self,
        request: OptimizeRouteRequest,
    ) -> Result<OptimizeRouteResponse, OptimizeError> {
        validate_jobs(&request.jobs)?;

        let date = match request.routing_date.as_deref() {
            Some(raw) => parse_plan_date(raw)?,
            None => Local::now().date_naive(),
        };

        info!(
            "Optimizing single day: {} jobs on {}",
            request.jobs.len(),
            date
        );

        let day = self
            .schedule_day(request.jobs, request.start_location.as_ref(), date)
            .await
            .map_err(|err| OptimizeError::Service { message: format!("{:#}", err) })?;

        Ok(OptimizeRouteResponse {
            date: date.format("%Y-%m-%d").to_string(),
            jobs: day.jobs,
            total_travel_time: day.total_travel_time,
            explanation: day.explanation,
        })
    }

    /// Optimize a multi-day plan starting at `start_from_date`
    pub async fn optimize_multi_day(
        &self,
        request: OptimizeMultiDayRequest,
    ) -> Result<MultiDayScheduleResponse, OptimizeError> {
        validate_jobs(&request.jobs)?;
        let start_date = parse_plan_date(&request.start_from_date)?;
        let max_jobs_per_day = request.max_jobs_per_day.unwrap_or(DEFAULT_MAX_JOBS_PER_DAY);

        let total_jobs = request.jobs.len();
        info!(
            "Optimizing multi-day plan: {} jobs from {}, {} per day max",
            total_jobs, start_date, max_jobs_per_day
        );

        let buckets = distribute_jobs(request.jobs, max_jobs_per_day, DEFAULT_MAX_MINUTES_PER_DAY)
            .map_err(|err| OptimizeError::Validation(err.to_string()))?;
        debug!("Distributed {} jobs into {} days", total_jobs, buckets.len());

        let mut days = Vec::with_capacity(buckets.len());
        for (i, bucket) in buckets.into_iter().enumerate() {
            let date = start_date
                .checked_add_days(Days::new(i as u64))
                .ok_or_else(|| {
                    OptimizeError::Validation("Start date is out of calendar range".to_string())
                })?;

            let day = self
                .schedule_day(bucket, request.start_location.as_ref(), date)
                .await
                .map_err(|err| OptimizeError::Day {
                    day: i + 1,
                    message: format!("{:#}", err),
                })?;

            days.push(DaySchedule {
                date: date.format("%Y-%m-%d").to_string(),
                day_number: (i + 1) as u32,
                estimated_start_time: day.jobs.first().and_then(|j| j.start_date.clone()),
                estimated_end_time: day.jobs.last().and_then(|j| j.end_date.clone()),
                jobs: day.jobs,
            });
        }

        let total_days = days.len();
        let date_range = DateRange {
            from: days.first().map(|d| d.date.clone()).unwrap_or_default(),
            to: days.last().map(|d| d.date.clone()).unwrap_or_default(),
        };
        let average_jobs_per_day =
            ((total_jobs as f64 / total_days as f64) * 10.0).round() / 10.0;

        Ok(MultiDayScheduleResponse {
            days,
            total_jobs,
            total_days,
            date_range,
            average_jobs_per_day,
        })
    }

    /// Schedule one day's jobs: travel matrix, visiting order, time layout
    async fn schedule_day(
        &self,
        jobs: Vec<Job>,
        start_location: Option<&Location>,
        date: NaiveDate,
    ) -> Result<ScheduledDay> {
        let mut destinations: Vec<Coordinates> = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let coords = job
                .coordinates()
                .ok_or_else(|| anyhow!("Job '{}' is missing location coordinates", job.title))?;
            destinations.push(coords);
        }

        // Without an explicit start the route begins at the first job.
        let origin = start_location
            .and_then(Location::coordinates)
            .or_else(|| destinations.first().copied())
            .ok_or_else(|| anyhow!("No jobs to schedule"))?;

        let matrix = self
            .travel_time
            .distance_matrix(&origin, &destinations)
            .await?;

        let ordering = request_route_ordering(self.completion.as_ref(), &jobs, &matrix).await?;
        debug!(
            "Visiting order for {}: {:?}",
            date, ordering.optimized_route
        );

        // The reply's indices are 1-based positions in the day's job list.
        let matrix_indices: Vec<usize> =
            ordering.optimized_route.iter().map(|&n| n - 1).collect();
        let ordered_jobs: Vec<Job> = matrix_indices.iter().map(|&i| jobs[i].clone()).collect();

        let mut buffers = RandomBuffer::from_entropy();
        let scheduled = lay_out_day(ordered_jobs, &matrix_indices, &matrix, date, &mut buffers);

        Ok(ScheduledDay {
            jobs: scheduled,
            total_travel_time: ordering.total_travel_time,
            explanation: ordering.explanation,
        })
    }
}

fn validate_jobs(jobs: &[Job]) -> Result<(), OptimizeError> {
    if jobs.is_empty() {
        return Err(OptimizeError::Validation(
            "At least one job is required".to_string(),
        ));
    }
    if jobs.len() > MAX_TOTAL_JOBS {
        return Err(OptimizeError::Validation(format!(
            "Too many jobs: {} exceeds the limit of {}",
            jobs.len(),
            MAX_TOTAL_JOBS
        )));
    }
    for job in jobs {
        if job.coordinates().is_none() {
            return Err(OptimizeError::Validation(format!(
                "Job '{}' is missing location coordinates",
                job.title
            )));
        }
    }
    Ok(())
}

fn parse_plan_date(raw: &str) -> Result<NaiveDate, OptimizeError> {
    if !DATE_FORMAT.is_match(raw) {
        return Err(OptimizeError::Validation(format!(
            "Invalid date '{}', expected YYYY-MM-DD",
            raw
        )));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| OptimizeError::Validation(format!("Invalid date '{}'", raw)))
}
