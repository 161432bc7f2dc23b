//! Job types

use serde::{Deserialize, Serialize};

/// Geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Job type enum
///
/// The priority drives the day-distribution sort: on-site jobs are packed
/// before quote inspections, which are packed before office tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    Task,
    QuoteInspection,
    JobOnSite,
    /// Anything the frontend sends that we don't recognise.
    #[serde(other)]
    Unknown,
}

impl JobType {
    /// Packing priority, higher first
    pub const fn priority(self) -> u8 {
        match self {
            JobType::JobOnSite => 3,
            JobType::QuoteInspection => 2,
            JobType::Task => 1,
            JobType::Unknown => 1,
        }
    }
}

impl Default for JobType {
    fn default() -> Self {
        JobType::Task
    }
}

/// Job site location as supplied by the frontend.
///
/// Latitude/longitude may be absent when geocoding hasn't run yet; any
/// routing operation treats that as a validation error, never a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
}

impl Location {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }
}

/// Declared job duration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDuration {
    #[serde(default)]
    pub days: u32,
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
}

impl JobDuration {
    /// Total duration in minutes (a "day" counts as an 8-hour workday)
    pub fn total_minutes(&self) -> u32 {
        self.days * 8 * 60 + self.hours * 60 + self.minutes
    }
}

/// A unit of scheduled work
///
/// The caller supplies jobs fully formed; optimization only reads
/// location/duration and writes `start_date`, `end_date`,
/// `travel_time_to_next` and `route_order`. Timestamps are wall-clock
/// strings in the `YYYY-MM-DDTHH:MM:SS.000Z` format the frontend expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type", default)]
    pub job_type: JobType,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub duration: JobDuration,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub travel_time_to_next: Option<String>,
    #[serde(default)]
    pub route_order: Option<i32>,
}

impl Job {
    /// Coordinates, if the location has both latitude and longitude
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.as_ref().and_then(Location::coordinates)
    }

    /// Estimated duration in minutes, zero durations default to one hour
    pub fn estimated_minutes(&self) -> u32 {
        let minutes = self.duration.total_minutes();
        if minutes == 0 {
            60
        } else {
            minutes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_type_priority_ordering() {
        assert!(JobType::JobOnSite.priority() > JobType::QuoteInspection.priority());
        assert!(JobType::QuoteInspection.priority() > JobType::Task.priority());
        assert_eq!(JobType::Unknown.priority(), JobType::Task.priority());
    }

    #[test]
    fn test_unknown_job_type_deserializes() {
        let job: Job = serde_json::from_str(
            r#"{"id": 1, "title": "Mystery", "type": "SomethingNew"}"#,
        )
        .unwrap();
        assert_eq!(job.job_type, JobType::Unknown);
    }

    #[test]
    fn test_duration_total_minutes() {
        let duration = JobDuration { days: 1, hours: 2, minutes: 30 };
        assert_eq!(duration.total_minutes(), 8 * 60 + 150);
    }

    #[test]
    fn test_zero_duration_defaults_to_one_hour() {
        let job: Job = serde_json::from_str(r#"{"id": 1, "title": "Quick look"}"#).unwrap();
        assert_eq!(job.duration.total_minutes(), 0);
        assert_eq!(job.estimated_minutes(), 60);
    }

    #[test]
    fn test_coordinates_require_both_fields() {
        let mut job: Job = serde_json::from_str(
            r#"{"id": 1, "title": "Fence repair", "location": {"latitude": -33.77}}"#,
        )
        .unwrap();
        assert!(job.coordinates().is_none());

        job.location.as_mut().unwrap().longitude = Some(151.05);
        let coords = job.coordinates().unwrap();
        assert!((coords.lat + 33.77).abs() < 1e-9);
    }

    #[test]
    fn test_job_serializes_to_camel_case() {
        let job = Job {
            id: 7,
            title: "Deck build".to_string(),
            job_type: JobType::JobOnSite,
            location: None,
            duration: JobDuration::default(),
            start_date: Some("2024-03-01T07:30:00.000Z".to_string()),
            end_date: None,
            travel_time_to_next: Some("12 mins".to_string()),
            route_order: Some(1),
        };

        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"startDate\""));
        assert!(json.contains("\"travelTimeToNext\""));
        assert!(json.contains("\"routeOrder\""));
        assert!(json.contains("\"type\":\"JobOnSite\""));
        assert!(!json.contains("job_type"));
    }
}
