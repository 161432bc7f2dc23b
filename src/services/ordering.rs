//! Route ordering via the reasoning service
//!
//! The completion model replies with JSON, usually wrapped in prose. We
//! extract the first JSON object and require a full 1-based permutation of
//! the day's jobs — anything else is rejected outright, never repaired.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::services::completion::CompletionService;
use crate::services::prompts::{route_ordering_prompt, ORDERING_SYSTEM_PROMPT};
use crate::services::travel_time::TravelMatrix;
use crate::types::{ChatMessage, Job, RouteOrdering};

static JSON_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid static regex"));

const ORDERING_MAX_TOKENS: u32 = 500;
const ORDERING_TEMPERATURE: f32 = 0.2;

/// Ask the reasoning service for a visiting order over `jobs`
pub async fn request_route_ordering(
    completion: &dyn CompletionService,
    jobs: &[Job],
    matrix: &TravelMatrix,
) -> Result<RouteOrdering> {
    let messages = [
        ChatMessage::system(ORDERING_SYSTEM_PROMPT),
        ChatMessage::user(route_ordering_prompt(jobs, matrix)),
    ];

    let reply = completion
        .complete(&messages, ORDERING_MAX_TOKENS, ORDERING_TEMPERATURE)
        .await
        .context("Route ordering request failed")?;

    parse_route_ordering(&reply, jobs.len())
}

/// Parse-or-reject: extract the JSON object from a possibly prose-wrapped
/// reply and validate it as a permutation of 1..=`job_count`
pub fn parse_route_ordering(reply: &str, job_count: usize) -> Result<RouteOrdering> {
    let block = JSON_BLOCK
        .find(reply)
        .context("Invalid AI response format")?;

    let ordering: RouteOrdering =
        serde_json::from_str(block.as_str()).context("Invalid AI response format")?;

    if ordering.optimized_route.len() != job_count {
        bail!(
            "Invalid AI response format: expected {} route entries, got {}",
            job_count,
            ordering.optimized_route.len()
        );
    }

    let mut seen = vec![false; job_count];
    for &index in &ordering.optimized_route {
        if index == 0 || index > job_count {
            bail!("Invalid AI response format: route index {} out of range", index);
        }
        if seen[index - 1] {
            bail!("Invalid AI response format: route index {} repeated", index);
        }
        seen[index - 1] = true;
    }

    Ok(ordering)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::completion::MockCompletionService;
    use crate::types::{JobDuration, JobType};

    fn job(id: i64) -> Job {
        Job {
            id,
            title: format!("Job {}", id),
            job_type: JobType::Task,
            location: None,
            duration: JobDuration { days: 0, hours: 1, minutes: 0 },
            start_date: None,
            end_date: None,
            travel_time_to_next: None,
            route_order: None,
        }
    }

    #[test]
    fn test_parse_plain_json() {
        let ordering = parse_route_ordering(
            r#"{"optimizedRoute":[2,1],"totalTravelTime":"25 mins","explanation":"nearest first"}"#,
            2,
        )
        .unwrap();
        assert_eq!(ordering.optimized_route, vec![2, 1]);
    }

    #[test]
    fn test_parse_json_embedded_in_prose() {
        let reply = "Sure! Here's the best order:\n\n\
            {\"optimizedRoute\": [1, 3, 2], \"totalTravelTime\": \"40 mins\", \
            \"explanation\": \"loops back west\"}\n\nLet me know if that works.";

        let ordering = parse_route_ordering(reply, 3).unwrap();
        assert_eq!(ordering.optimized_route, vec![1, 3, 2]);
        assert_eq!(ordering.explanation.as_deref(), Some("loops back west"));
    }

    #[test]
    fn test_no_json_rejected() {
        let err = parse_route_ordering("I can't help with that.", 2).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid AI response format"));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = parse_route_ordering(r#"{"optimizedRoute": [1, 2"#, 2).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid AI response format"));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = parse_route_ordering(r#"{"optimizedRoute":[1,2]}"#, 3).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid AI response format"));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let err = parse_route_ordering(r#"{"optimizedRoute":[1,4]}"#, 2).unwrap_err();
        assert!(format!("{:#}", err).contains("out of range"));
    }

    #[test]
    fn test_zero_index_rejected() {
        assert!(parse_route_ordering(r#"{"optimizedRoute":[0,1]}"#, 2).is_err());
    }

    #[test]
    fn test_repeated_index_rejected() {
        let err = parse_route_ordering(r#"{"optimizedRoute":[2,2]}"#, 2).unwrap_err();
        assert!(format!("{:#}", err).contains("repeated"));
    }

    #[tokio::test]
    async fn test_request_uses_completion_reply() {
        let mock = MockCompletionService::new([
            r#"{"optimizedRoute":[2,1],"totalTravelTime":"18 mins","explanation":"shorter"}"#,
        ]);
        let jobs = vec![job(1), job(2)];

        let ordering = request_route_ordering(&mock, &jobs, &TravelMatrix::empty())
            .await
            .unwrap();
        assert_eq!(ordering.optimized_route, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_request_surfaces_service_failure() {
        let mock = MockCompletionService::failing();
        let jobs = vec![job(1)];

        let err = request_route_ordering(&mock, &jobs, &TravelMatrix::empty())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Route ordering request failed"));
    }
}
