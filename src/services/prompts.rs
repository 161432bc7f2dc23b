//! Prompt templates for the completion service

use crate::services::travel_time::TravelMatrix;
use crate::types::Job;

/// System prompt for the route ordering step
pub const ORDERING_SYSTEM_PROMPT: &str = "You are a route planning assistant \
for a mobile trades business. Given a list of jobs and driving times between \
them, decide the most efficient visiting order. Respond with a single JSON \
object and nothing else.";

/// Build the route ordering prompt for one day's jobs.
///
/// Jobs are numbered from 1; the reply must reference them by those numbers.
pub fn route_ordering_prompt(jobs: &[Job], matrix: &TravelMatrix) -> String {
    let mut prompt = String::from("Order the following jobs into the most efficient driving route.\n\nJobs:\n");

    for (i, job) in jobs.iter().enumerate() {
        let address = job
            .location
            .as_ref()
            .and_then(|l| l.formatted_address.as_deref())
            .unwrap_or("(no address)");
        prompt.push_str(&format!(
            "{}. {} [{:?}] - {} min - {}\n",
            i + 1,
            job.title,
            job.job_type,
            job.estimated_minutes(),
            address,
        ));
    }

    prompt.push_str("\nDriving times in minutes (from -> to):\n");
    for from in 0..jobs.len() {
        for to in 0..jobs.len() {
            if from == to {
                continue;
            }
            if let Some(seconds) = matrix.duration_seconds(from, to) {
                prompt.push_str(&format!(
                    "{} -> {}: {}\n",
                    from + 1,
                    to + 1,
                    (seconds as f64 / 60.0).ceil() as i64,
                ));
            }
        }
    }

    prompt.push_str(
        "\nReply with JSON only, in this exact shape:\n\
         {\"optimizedRoute\": [job numbers in visiting order], \
         \"totalTravelTime\": \"human readable total\", \
         \"explanation\": \"one sentence\"}",
    );

    prompt
}

/// System prompt for the schedule chat assistant, with the current
/// schedule embedded as context
pub fn schedule_assistant_prompt(schedule: &[Job]) -> String {
    let schedule_json =
        serde_json::to_string_pretty(schedule).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are a scheduling assistant for a mobile trades business. You help \
the user modify their working day: moving jobs, changing durations, adding or \
removing jobs. Ask for any missing details (time, duration, location) before \
confirming a change, and point out conflicts with the existing schedule.\n\n\
Today's schedule:\n{}",
        schedule_json
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobDuration, JobType, Location};

    fn job(id: i64, title: &str) -> Job {
        Job {
            id,
            title: title.to_string(),
            job_type: JobType::JobOnSite,
            location: Some(Location {
                latitude: Some(-33.77),
                longitude: Some(151.05),
                formatted_address: Some(format!("{} Example St", id)),
            }),
            duration: JobDuration { days: 0, hours: 1, minutes: 30 },
            start_date: None,
            end_date: None,
            travel_time_to_next: None,
            route_order: None,
        }
    }

    #[test]
    fn test_ordering_prompt_numbers_jobs_from_one() {
        let jobs = vec![job(1, "Deck build"), job(2, "Gutter quote")];
        let prompt = route_ordering_prompt(&jobs, &TravelMatrix::empty());

        assert!(prompt.contains("1. Deck build"));
        assert!(prompt.contains("2. Gutter quote"));
        assert!(prompt.contains("90 min"));
        assert!(prompt.contains("optimizedRoute"));
    }

    #[test]
    fn test_ordering_prompt_includes_travel_times() {
        use crate::services::travel_time::MockTravelTimeService;
        use crate::services::travel_time::TravelTimeService;
        use crate::types::Coordinates;

        let jobs = vec![job(1, "A"), job(2, "B")];
        let origin = Coordinates { lat: -33.77, lng: 151.05 };
        let destinations = vec![
            Coordinates { lat: -33.77, lng: 151.05 },
            Coordinates { lat: -33.80, lng: 151.10 },
        ];
        let matrix = tokio_test::block_on(
            MockTravelTimeService::new().distance_matrix(&origin, &destinations),
        )
        .unwrap();

        let prompt = route_ordering_prompt(&jobs, &matrix);
        assert!(prompt.contains("1 -> 2:"));
        assert!(prompt.contains("2 -> 1:"));
    }

    #[test]
    fn test_assistant_prompt_embeds_schedule() {
        let prompt = schedule_assistant_prompt(&[job(1, "Fence repair")]);
        assert!(prompt.contains("Fence repair"));
        assert!(prompt.contains("scheduling assistant"));
    }
}
