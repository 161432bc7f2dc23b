//! Day distribution planner
//!
//! Greedy bin-packing of jobs into calendar-day buckets. Jobs are sorted by
//! type priority then duration, packed while a day has capacity and the job
//! stays geographically close to the day's existing jobs, then a single
//! rebalancing pass moves one outlier between each adjacent bucket pair.
//!
//! Visiting order within a day is decided later by the reasoning service;
//! bucket order here is only the packing order.

use thiserror::Error;

use crate::defaults::{CLUSTER_RADIUS_KM, OUTLIER_RADIUS_KM};
use crate::services::geo::mean_distance;
use crate::types::{Coordinates, Job};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Job '{title}' is missing location coordinates")]
    MissingCoordinates { title: String },
}

/// Split `jobs` into day buckets.
///
/// Every input job appears in exactly one bucket. Bucket invariants: at most
/// `max_jobs_per_day` jobs and at most `max_minutes_per_day` estimated
/// minutes per bucket, except that a single job longer than the daily cap is
/// kept alone in its own bucket.
///
/// Job lists short enough to fit one day's count cap are returned as a
/// single bucket in input order, even when their total duration exceeds the
/// daily cap. Duration-triggered splitting under the count threshold is a
/// deliberate non-behavior.
pub fn distribute_jobs(
    jobs: Vec<Job>,
    max_jobs_per_day: usize,
    max_minutes_per_day: u32,
) -> Result<Vec<Vec<Job>>, PlanError> {
    let mut items: Vec<(Job, Coordinates)> = Vec::with_capacity(jobs.len());
    for job in jobs {
        match job.coordinates() {
            Some(coords) => items.push((job, coords)),
            None => {
                return Err(PlanError::MissingCoordinates { title: job.title });
            }
        }
    }

    if items.len() <= max_jobs_per_day {
        return Ok(vec![items.into_iter().map(|(job, _)| job).collect()]);
    }

    // Longer and higher-priority jobs are placed first to ease balancing.
    items.sort_by(|(a, _), (b, _)| {
        b.job_type
            .priority()
            .cmp(&a.job_type.priority())
            .then(b.estimated_minutes().cmp(&a.estimated_minutes()))
    });

    let mut buckets: Vec<Vec<(Job, Coordinates)>> = Vec::new();
    let mut current: Vec<(Job, Coordinates)> = Vec::new();
    let mut current_minutes: u32 = 0;

    for (job, coords) in items {
        let job_minutes = job.estimated_minutes();

        let fits = current.len() < max_jobs_per_day
            && current_minutes + job_minutes <= max_minutes_per_day
            && bucket_mean_distance(&coords, &current) <= CLUSTER_RADIUS_KM;

        // An empty bucket always accepts the job, including one whose
        // duration alone exceeds the daily cap (it then stays alone).
        if fits || current.is_empty() {
            current.push((job, coords));
            current_minutes += job_minutes;
        } else {
            buckets.push(std::mem::take(&mut current));
            current_minutes = job_minutes;
            current.push((job, coords));
        }
    }

    if !current.is_empty() {
        buckets.push(current);
    }

    rebalance(&mut buckets, max_jobs_per_day);

    Ok(buckets
        .into_iter()
        .map(|bucket| bucket.into_iter().map(|(job, _)| job).collect())
        .collect())
}

fn bucket_mean_distance(coords: &Coordinates, bucket: &[(Job, Coordinates)]) -> f64 {
    let cluster: Vec<Coordinates> = bucket.iter().map(|(_, c)| *c).collect();
    mean_distance(coords, &cluster)
}

/// Single rebalancing pass over adjacent bucket pairs.
///
/// When bucket i is over 80% full and bucket i+1 is under 60% full, the job
/// in bucket i farthest (by mean Haversine distance) from its bucket mates
/// moves to the front of bucket i+1, but only if that mean distance exceeds
/// the outlier radius. Runs once per pair, never to convergence.
fn rebalance(buckets: &mut [Vec<(Job, Coordinates)>], max_jobs_per_day: usize) {
    let high = 0.8 * max_jobs_per_day as f64;
    let low = 0.6 * max_jobs_per_day as f64;

    for i in 0..buckets.len().saturating_sub(1) {
        if (buckets[i].len() as f64) <= high || (buckets[i + 1].len() as f64) >= low {
            continue;
        }

        let mut outlier: Option<(usize, f64)> = None;
        for (idx, (_, coords)) in buckets[i].iter().enumerate() {
            let others: Vec<Coordinates> = buckets[i]
                .iter()
                .enumerate()
                .filter(|(other_idx, _)| *other_idx != idx)
                .map(|(_, (_, c))| *c)
                .collect();

            let mean = mean_distance(coords, &others);
            if outlier.map_or(true, |(_, worst)| mean > worst) {
                outlier = Some((idx, mean));
            }
        }

        if let Some((idx, mean)) = outlier {
            if mean > OUTLIER_RADIUS_KM {
                let moved = buckets[i].remove(idx);
                buckets[i + 1].insert(0, moved);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{DEFAULT_MAX_JOBS_PER_DAY, DEFAULT_MAX_MINUTES_PER_DAY};
    use crate::types::{JobDuration, JobType, Location};
    use std::collections::HashSet;

    fn job(id: i64, title: &str, job_type: JobType, minutes: u32, lat: f64, lng: f64) -> Job {
        Job {
            id,
            title: title.to_string(),
            job_type,
            location: Some(Location {
                latitude: Some(lat),
                longitude: Some(lng),
                formatted_address: None,
            }),
            duration: JobDuration { days: 0, hours: 0, minutes },
            start_date: None,
            end_date: None,
            travel_time_to_next: None,
            route_order: None,
        }
    }

    fn cluster_job(id: i64, job_type: JobType, minutes: u32) -> Job {
        // Jobs a few hundred metres apart around Epping
        job(
            id,
            &format!("Job {}", id),
            job_type,
            minutes,
            -33.77 + (id as f64) * 0.001,
            151.05,
        )
    }

    fn distribute(jobs: Vec<Job>) -> Vec<Vec<Job>> {
        distribute_jobs(jobs, DEFAULT_MAX_JOBS_PER_DAY, DEFAULT_MAX_MINUTES_PER_DAY).unwrap()
    }

    #[test]
    fn test_small_job_count_single_bucket_input_order() {
        let jobs = vec![
            cluster_job(3, JobType::Task, 30),
            cluster_job(1, JobType::JobOnSite, 90),
            cluster_job(2, JobType::QuoteInspection, 45),
        ];

        let buckets = distribute(jobs);

        assert_eq!(buckets.len(), 1);
        let ids: Vec<i64> = buckets[0].iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_small_count_not_split_even_when_duration_overflows() {
        // Two 5-hour jobs exceed the 8-hour day, but the count threshold
        // alone decides splitting.
        let jobs = vec![
            cluster_job(1, JobType::JobOnSite, 300),
            cluster_job(2, JobType::JobOnSite, 300),
        ];

        let buckets = distribute(jobs);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].len(), 2);
    }

    #[test]
    fn test_priority_scenario_on_site_before_task() {
        let jobs = vec![
            job(1, "JobA", JobType::JobOnSite, 90, -33.77, 151.05),
            job(2, "JobB", JobType::Task, 30, -33.80, 151.10),
        ];

        let buckets = distribute(jobs);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0][0].title, "JobA");
        assert_eq!(buckets[0][1].title, "JobB");
    }

    #[test]
    fn test_missing_coordinates_rejected_by_title() {
        let mut jobs = vec![cluster_job(1, JobType::Task, 30)];
        jobs.push(Job {
            location: Some(Location {
                latitude: Some(-33.77),
                longitude: None,
                formatted_address: None,
            }),
            ..job(2, "Ungeocoded fence quote", JobType::Task, 30, 0.0, 0.0)
        });

        let err = distribute_jobs(jobs, DEFAULT_MAX_JOBS_PER_DAY, DEFAULT_MAX_MINUTES_PER_DAY)
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("missing location coordinates"));
        assert!(message.contains("Ungeocoded fence quote"));
    }

    #[test]
    fn test_no_loss_no_duplication() {
        let jobs: Vec<Job> = (1..=12)
            .map(|id| cluster_job(id, JobType::Task, 60))
            .collect();

        let buckets = distribute(jobs);

        let mut seen = HashSet::new();
        let mut total = 0;
        for bucket in &buckets {
            for job in bucket {
                assert!(seen.insert(job.id), "duplicated job {}", job.id);
                total += 1;
            }
        }
        assert_eq!(total, 12);
    }

    #[test]
    fn test_ten_clustered_jobs_split_seven_three() {
        // All within ~1 km, so no rebalance migration (mean distances stay
        // well under the outlier radius).
        let jobs: Vec<Job> = (1..=10)
            .map(|id| cluster_job(id, JobType::Task, 60))
            .collect();

        let buckets = distribute(jobs);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].len(), 7);
        assert_eq!(buckets[1].len(), 3);
    }

    #[test]
    fn test_bucket_counts_respect_cap() {
        let jobs: Vec<Job> = (1..=18)
            .map(|id| cluster_job(id, JobType::Task, 45))
            .collect();

        let buckets = distribute(jobs);
        for bucket in &buckets {
            assert!(bucket.len() <= DEFAULT_MAX_JOBS_PER_DAY);
        }
    }

    #[test]
    fn test_sort_packs_on_site_first() {
        let mut jobs: Vec<Job> = (1..=3)
            .map(|id| cluster_job(id, JobType::Task, 30))
            .collect();
        jobs.extend((4..=6).map(|id| cluster_job(id, JobType::QuoteInspection, 45)));
        jobs.extend((7..=8).map(|id| cluster_job(id, JobType::JobOnSite, 60)));

        let buckets = distribute(jobs);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0][0].job_type, JobType::JobOnSite);
        assert_eq!(buckets[0][1].job_type, JobType::JobOnSite);
        assert_eq!(buckets[0][2].job_type, JobType::QuoteInspection);
        // Lowest-priority job spills to day two
        assert_eq!(buckets[1][0].job_type, JobType::Task);
    }

    #[test]
    fn test_oversized_job_kept_alone() {
        let mut jobs = vec![job(99, "Full reroof", JobType::JobOnSite, 600, -33.77, 151.05)];
        jobs.extend((1..=8).map(|id| cluster_job(id, JobType::JobOnSite, 60)));

        let buckets = distribute(jobs);

        // 600 min > 480 min cap: packed alone, remaining 8 split 7 + 1
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].len(), 1);
        assert_eq!(buckets[0][0].id, 99);
        assert_eq!(buckets[1].len(), 7);
        assert_eq!(buckets[2].len(), 1);
    }

    #[test]
    fn test_rebalance_moves_outlier_to_front_of_next_bucket() {
        // ~12 km north of the cluster: close enough to be packed with it
        // (within the 15 km cluster radius) but a rebalancing outlier.
        let mut jobs = vec![job(99, "Outlier", JobType::Task, 60, -33.662, 151.05)];
        jobs.extend((1..=9).map(|id| {
            job(id, &format!("Job {}", id), JobType::Task, 60, -33.77, 151.05)
        }));

        let buckets = distribute(jobs);

        // Packed 7 + 3, then the outlier migrates: 6 + 4
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].len(), 6);
        assert_eq!(buckets[1].len(), 4);
        assert_eq!(buckets[1][0].id, 99);
        assert!(buckets[0].iter().all(|j| j.id != 99));
    }

    #[test]
    fn test_distant_job_starts_new_bucket() {
        // 8 jobs force the packing path; the Newcastle job is ~115 km from
        // the Sydney cluster and sits mid-list so the cohesion rule, not the
        // count cap, is what isolates it.
        let mut jobs: Vec<Job> = (1..=3)
            .map(|id| cluster_job(id, JobType::Task, 30))
            .collect();
        jobs.push(job(8, "Newcastle strata audit", JobType::Task, 30, -32.9283, 151.7817));
        jobs.extend((4..=7).map(|id| cluster_job(id, JobType::Task, 30)));

        let buckets = distribute(jobs);

        let day_of_far = buckets.iter().find(|b| b.iter().any(|j| j.id == 8)).unwrap();
        assert_eq!(day_of_far.len(), 1, "distant job must not share a day");
        assert_eq!(buckets.iter().map(|b| b.len()).sum::<usize>(), 8);
    }
}
