//! Fixed-interval poll loop over a set of sync jobs.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::error::Error;
use crate::traits::RecordSource;
use crate::Result;

use super::ConvergenceEngine;

/// Time between the end of one cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// What the scheduler is doing right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchedulerState {
    #[default]
    Idle,
    Running,
    Sleeping,
}

/// Snapshot published after every state change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub cycles_completed: u64,
    pub last_cycle_failed: bool,
}

/// One source wired to the collection it mirrors into.
pub struct SyncJob {
    source: Arc<dyn RecordSource>,
    states: Option<Vec<String>>,
    engine: ConvergenceEngine,
}

impl SyncJob {
    pub fn new(source: Arc<dyn RecordSource>, engine: ConvergenceEngine) -> Self {
        Self {
            source,
            states: None,
            engine,
        }
    }

    /// Restrict the job to these states. An empty list means all states.
    pub fn with_states(mut self, states: Vec<String>) -> Self {
        self.states = (!states.is_empty()).then_some(states);
        self
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn engine(&self) -> &ConvergenceEngine {
        &self.engine
    }

    /// Fetch then reconcile. Reconcile only runs on a complete fetch.
    pub async fn run(&self) -> Result<SourceReport> {
        let records = self.source.fetch(self.states.as_deref()).await?;
        let reconciled = self.engine.reconcile(&records).await?;
        Ok(SourceReport {
            source: self.name().to_string(),
            fetched: records.len(),
            reconciled,
        })
    }
}

impl fmt::Debug for SyncJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncJob")
            .field("source", &self.source.name())
            .field("states", &self.states)
            .field("collection", self.engine.collection())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,
    pub fetched: usize,
    pub reconciled: usize,
}

#[derive(Debug)]
pub struct SourceFailure {
    pub source: String,
    pub error: Error,
}

/// Outcome of one cycle across all jobs.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub succeeded: Vec<SourceReport>,
    pub failed: Vec<SourceFailure>,
}

impl CycleReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn reconciled(&self) -> usize {
        self.succeeded.iter().map(|r| r.reconciled).sum()
    }
}

/// A cycle in which at least one source failed.
#[derive(Debug, thiserror::Error)]
#[error("{} of {} source(s) failed", .0.failed.len(), .0.total())]
pub struct CycleError(pub CycleReport);

impl CycleError {
    pub fn report(&self) -> &CycleReport {
        &self.0
    }
}

/// Runs every job, sleeps, and repeats until the task is dropped or aborted.
///
/// Sources are isolated: one failing source does not stop the others
/// within a cycle. No cycle failure, and no panic inside a cycle, ends
/// the loop.
pub struct PollScheduler {
    jobs: Vec<SyncJob>,
    interval: Duration,
    concurrent: bool,
    status: watch::Sender<SchedulerStatus>,
}

impl PollScheduler {
    pub fn new(jobs: Vec<SyncJob>, interval: Duration) -> Self {
        let (status, _) = watch::channel(SchedulerStatus::default());
        Self {
            jobs,
            interval,
            concurrent: false,
            status,
        }
    }

    /// Run the jobs of one cycle concurrently instead of in order.
    pub fn with_concurrent_sources(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn jobs(&self) -> &[SyncJob] {
        &self.jobs
    }

    /// Watch state transitions and cycle counts.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerStatus> {
        self.status.subscribe()
    }

    /// Run every job once.
    #[instrument(skip(self), fields(jobs = self.jobs.len(), concurrent = self.concurrent))]
    pub async fn run_cycle(&self) -> std::result::Result<CycleReport, CycleError> {
        let outcomes: Vec<(&str, Result<SourceReport>)> = if self.concurrent {
            join_all(
                self.jobs
                    .iter()
                    .map(|job| async move { (job.name(), job.run().await) }),
            )
            .await
        } else {
            let mut outcomes = Vec::with_capacity(self.jobs.len());
            for job in &self.jobs {
                outcomes.push((job.name(), job.run().await));
            }
            outcomes
        };

        let mut report = CycleReport::default();
        for (source, outcome) in outcomes {
            match outcome {
                Ok(source_report) => {
                    info!(
                        source,
                        fetched = source_report.fetched,
                        reconciled = source_report.reconciled,
                        "source synced"
                    );
                    report.succeeded.push(source_report);
                }
                Err(e) => {
                    warn!(source, error = %e, "source failed");
                    report.failed.push(SourceFailure {
                        source: source.to_string(),
                        error: e,
                    });
                }
            }
        }

        if report.failed.is_empty() {
            Ok(report)
        } else {
            Err(CycleError(report))
        }
    }

    /// Loop forever: cycle, log the outcome, sleep the interval.
    pub async fn run(&self) {
        info!(interval_secs = self.interval.as_secs(), jobs = self.jobs.len(), "poll loop started");

        loop {
            self.set_state(SchedulerState::Running);

            let failed = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
                Ok(Ok(report)) => {
                    info!(reconciled = report.reconciled(), "cycle complete");
                    false
                }
                Ok(Err(e)) => {
                    error!(error = %e, "cycle failed");
                    true
                }
                Err(panic) => {
                    error!(panic = panic_message(&*panic), "cycle panicked");
                    true
                }
            };

            self.status.send_modify(|status| {
                status.cycles_completed += 1;
                status.last_cycle_failed = failed;
                status.state = SchedulerState::Sleeping;
            });

            tokio::time::sleep(self.interval).await;
        }
    }

    /// Move the loop onto its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    fn set_state(&self, state: SchedulerState) {
        self.status.send_modify(|status| status.state = state);
    }
}

impl fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollScheduler")
            .field("jobs", &self.jobs)
            .field("interval", &self.interval)
            .field("concurrent", &self.concurrent)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RemoteRecord;
    use crate::sync::SourceAdapter;
    use crate::test_support::{MemoryStore, MockApi, record, transport_503};
    use crate::traits::MirrorStore;
    use crate::types::{Collection, ExternalId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn collection() -> Collection {
        Collection::new("mk_feature_requests").unwrap()
    }

    /// Fails (or panics) on the first call, then returns its records.
    struct FlakySource {
        calls: AtomicUsize,
        panic_first: bool,
        records: Vec<RemoteRecord>,
    }

    impl FlakySource {
        fn failing_once(records: Vec<RemoteRecord>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                panic_first: false,
                records,
            }
        }

        fn panicking_once(records: Vec<RemoteRecord>) -> Self {
            Self {
                panic_first: true,
                ..Self::failing_once(records)
            }
        }
    }

    #[async_trait]
    impl RecordSource for FlakySource {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn fetch(&self, _states: Option<&[String]>) -> Result<Vec<RemoteRecord>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                if self.panic_first {
                    panic!("source blew up");
                }
                return Err(transport_503());
            }
            Ok(self.records.clone())
        }
    }

    #[tokio::test]
    async fn runs_pipeline_end_to_end() {
        let store = Arc::new(MemoryStore::default());
        let source = SourceAdapter::new(
            "mk",
            MockApi::with_pages(vec![vec![101, 102], vec![103]]),
            "Feature Request",
        );
        let job = SyncJob::new(
            Arc::new(source),
            ConvergenceEngine::new(store.clone(), collection()),
        );
        let scheduler = PollScheduler::new(vec![job], DEFAULT_POLL_INTERVAL);

        let report = scheduler.run_cycle().await.unwrap();
        assert_eq!(report.reconciled(), 3);

        let docs = store.list(&collection()).await.unwrap();
        assert_eq!(
            docs.iter().map(|d| d.external_id).collect::<Vec<_>>(),
            vec![ExternalId::new(101), ExternalId::new(102), ExternalId::new(103)]
        );
        assert!(docs.iter().all(|d| d.title.starts_with("Item ")));
    }

    #[tokio::test]
    async fn failing_source_does_not_block_others() {
        let store = Arc::new(MemoryStore::default());
        let broken = SourceAdapter::new(
            "tm",
            MockApi::with_pages(vec![vec![1]]).failing_query_page(0),
            "Epic",
        );
        let healthy = SourceAdapter::new("mk", MockApi::with_pages(vec![vec![7, 8]]), "Feature Request");

        let jobs = vec![
            SyncJob::new(Arc::new(broken), ConvergenceEngine::new(store.clone(), collection())),
            SyncJob::new(Arc::new(healthy), ConvergenceEngine::new(store.clone(), collection())),
        ];

        for concurrent in [false, true] {
            let scheduler = PollScheduler::new(jobs_clone(&jobs), DEFAULT_POLL_INTERVAL)
                .with_concurrent_sources(concurrent);
            let err = scheduler.run_cycle().await.unwrap_err();
            assert_eq!(err.report().failed.len(), 1);
            assert_eq!(err.report().failed[0].source, "tm");
            assert_eq!(err.report().succeeded[0].reconciled, 2);
        }
        assert_eq!(store.len(), 2);
    }

    fn jobs_clone(jobs: &[SyncJob]) -> Vec<SyncJob> {
        jobs.iter()
            .map(|job| SyncJob {
                source: job.source.clone(),
                states: job.states.clone(),
                engine: job.engine.clone(),
            })
            .collect()
    }

    #[tokio::test]
    async fn projection_failures_are_not_source_failures() {
        let store = Arc::new(MemoryStore::default());
        let source = SourceAdapter::new(
            "mk",
            MockApi::with_pages(vec![vec![1, 2, 3]]).untitled(&[2]),
            "Feature Request",
        );
        let scheduler = PollScheduler::new(
            vec![SyncJob::new(
                Arc::new(source),
                ConvergenceEngine::new(store.clone(), collection()),
            )],
            DEFAULT_POLL_INTERVAL,
        );

        let report = scheduler.run_cycle().await.unwrap();
        assert_eq!(report.succeeded[0].fetched, 3);
        assert_eq!(report.succeeded[0].reconciled, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn survives_a_failed_cycle() {
        let store = Arc::new(MemoryStore::default());
        let source = FlakySource::failing_once(vec![record(42, "Dark mode", "New")]);
        let scheduler = PollScheduler::new(
            vec![SyncJob::new(
                Arc::new(source),
                ConvergenceEngine::new(store.clone(), collection()),
            )],
            DEFAULT_POLL_INTERVAL,
        );
        let mut status = scheduler.subscribe();
        let handle = scheduler.spawn();

        status.wait_for(|s| s.cycles_completed == 1).await.unwrap();
        assert!(status.borrow().last_cycle_failed);
        assert_eq!(store.len(), 0);

        tokio::time::sleep(DEFAULT_POLL_INTERVAL + Duration::from_secs(1)).await;

        assert!(!handle.is_finished());
        let current = status.borrow().clone();
        assert_eq!(current.cycles_completed, 2);
        assert!(!current.last_cycle_failed);
        assert_eq!(current.state, SchedulerState::Sleeping);
        assert!(store.get(&collection(), ExternalId::new(42)).await.unwrap().is_some());

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn survives_a_panicking_cycle() {
        let store = Arc::new(MemoryStore::default());
        let source = FlakySource::panicking_once(vec![record(5, "Retry", "Active")]);
        let scheduler = PollScheduler::new(
            vec![SyncJob::new(
                Arc::new(source),
                ConvergenceEngine::new(store.clone(), collection()),
            )],
            Duration::from_secs(10),
        );
        let mut status = scheduler.subscribe();
        let handle = scheduler.spawn();

        status.wait_for(|s| s.cycles_completed == 2).await.unwrap();
        assert!(!handle.is_finished());
        assert_eq!(store.len(), 1);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_the_interval_between_cycles() {
        let source = FlakySource::failing_once(vec![]);
        let scheduler = PollScheduler::new(
            vec![SyncJob::new(
                Arc::new(source),
                ConvergenceEngine::new(Arc::new(MemoryStore::default()), collection()),
            )],
            Duration::from_secs(60),
        );
        let status = scheduler.subscribe();
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(status.borrow().cycles_completed, 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(status.borrow().cycles_completed, 2);

        handle.abort();
    }

    #[test]
    fn empty_state_list_means_all_states() {
        let job = SyncJob::new(
            Arc::new(FlakySource::failing_once(vec![])),
            ConvergenceEngine::new(Arc::new(MemoryStore::default()), collection()),
        )
        .with_states(vec![]);
        assert!(job.states.is_none());
    }
}
