//! Transient, process-lifetime status tracking for long-running parse or
//! classify runs. The tracker is a cache, not a source of truth: entries
//! expire on a TTL and the map is capped, so a restart simply loses
//! in-flight jobs and the caller resubmits.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Opaque handle for one tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct JobStatus {
    pub label: String,
    pub state: JobState,
    pub progress_pct: u8,
    started: Instant,
    touched: Instant,
}

pub struct JobTracker {
    ttl: Duration,
    max_jobs: usize,
    next_id: u64,
    jobs: HashMap<JobId, JobStatus>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::with_policy(Duration::from_secs(600), 256)
    }

    pub fn with_policy(ttl: Duration, max_jobs: usize) -> Self {
        Self {
            ttl,
            max_jobs: max_jobs.max(1),
            next_id: 0,
            jobs: HashMap::new(),
        }
    }

    pub fn start(&mut self, label: &str) -> JobId {
        self.evict();
        let id = JobId(self.next_id);
        self.next_id += 1;
        let now = Instant::now();
        self.jobs.insert(
            id,
            JobStatus {
                label: label.to_string(),
                state: JobState::Running,
                progress_pct: 0,
                started: now,
                touched: now,
            },
        );
        id
    }

    /// Progress only moves forward; a stale lower report is ignored.
    pub fn update(&mut self, id: JobId, progress_pct: u8) {
        if let Some(job) = self.jobs.get_mut(&id) {
            job.progress_pct = job.progress_pct.max(progress_pct.min(100));
            job.touched = Instant::now();
        }
    }

    pub fn complete(&mut self, id: JobId) {
        if let Some(job) = self.jobs.get_mut(&id) {
            job.state = JobState::Completed;
            job.progress_pct = 100;
            job.touched = Instant::now();
        }
    }

    pub fn fail(&mut self, id: JobId) {
        if let Some(job) = self.jobs.get_mut(&id) {
            job.state = JobState::Failed;
            job.touched = Instant::now();
        }
    }

    pub fn get(&mut self, id: JobId) -> Option<&JobStatus> {
        self.evict();
        self.jobs.get(&id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn evict(&mut self) {
        let ttl = self.ttl;
        self.jobs.retain(|_, job| job.touched.elapsed() < ttl);
        while self.jobs.len() >= self.max_jobs {
            // Cap hit: drop the oldest entry regardless of state.
            let oldest = self
                .jobs
                .iter()
                .min_by_key(|(_, job)| job.started)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => self.jobs.remove(&id),
                None => break,
            };
        }
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic() {
        let mut tracker = JobTracker::new();
        let id = tracker.start("parse statement.txt");
        tracker.update(id, 40);
        tracker.update(id, 20);
        assert_eq!(tracker.get(id).unwrap().progress_pct, 40);
        tracker.update(id, 90);
        assert_eq!(tracker.get(id).unwrap().progress_pct, 90);
    }

    #[test]
    fn test_progress_clamped_to_100() {
        let mut tracker = JobTracker::new();
        let id = tracker.start("parse");
        tracker.update(id, 250);
        assert_eq!(tracker.get(id).unwrap().progress_pct, 100);
    }

    #[test]
    fn test_complete_sets_terminal_state() {
        let mut tracker = JobTracker::new();
        let id = tracker.start("parse");
        tracker.update(id, 30);
        tracker.complete(id);
        let status = tracker.get(id).unwrap();
        assert_eq!(status.state, JobState::Completed);
        assert_eq!(status.progress_pct, 100);
    }

    #[test]
    fn test_max_size_evicts_oldest() {
        let mut tracker = JobTracker::with_policy(Duration::from_secs(60), 2);
        let first = tracker.start("a");
        let _second = tracker.start("b");
        let _third = tracker.start("c");
        assert!(tracker.len() <= 2);
        assert!(tracker.get(first).is_none());
    }

    #[test]
    fn test_ttl_expires_stale_jobs() {
        let mut tracker = JobTracker::with_policy(Duration::from_millis(5), 16);
        let id = tracker.start("parse");
        std::thread::sleep(Duration::from_millis(10));
        assert!(tracker.get(id).is_none());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut tracker = JobTracker::new();
        let id = tracker.start("parse");
        let mut other = JobTracker::new();
        other.update(id, 50);
        other.complete(id);
        assert!(other.get(id).is_none());
        assert_eq!(tracker.get(id).unwrap().progress_pct, 0);
    }
}
