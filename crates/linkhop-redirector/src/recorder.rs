use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use linkhop_core::{LinkStore, Slug, Visit};
use tokio::sync::{Semaphore, TryAcquireError};
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_MAX_IN_FLIGHT: u32 = 1024;
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, TypedBuilder)]
pub struct RecorderConfig {
    /// Upper bound on click jobs running at once. Submissions beyond it are
    /// dropped. Zero is raised to one.
    #[builder(default = DEFAULT_MAX_IN_FLIGHT)]
    pub max_in_flight: u32,
    /// Deadline for the link lookup and for the click transaction, each.
    #[builder(default = DEFAULT_DEADLINE)]
    pub deadline: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A point-in-time copy of the recorder counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderStats {
    pub submitted: u64,
    pub recorded: u64,
    /// The slug no longer resolved to a link when the job ran.
    pub skipped: u64,
    /// Rejected at submission: saturated or shut down.
    pub dropped: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    recorded: AtomicU64,
    skipped: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RecorderStats {
        RecorderStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            recorded: self.recorded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

struct Inner<S: ?Sized> {
    store: Arc<S>,
    permits: Arc<Semaphore>,
    accepting: AtomicBool,
    config: RecorderConfig,
    counters: Counters,
}

/// Records clicks on detached tasks so redirects never wait on a write.
///
/// Every submitted visit becomes one job: look the slug up again, then ask
/// the store to increment the counter and append the click event as a single
/// unit bounded by the configured deadline. Failed jobs are logged and
/// forgotten. At most `max_in_flight` jobs run at once; a submission that
/// finds no free permit is dropped instead of queued.
///
/// Cloning is cheap and every clone shares the same jobs and counters.
pub struct ClickRecorder<S: ?Sized> {
    inner: Arc<Inner<S>>,
}

impl<S: ?Sized> Clone for ClickRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for ClickRecorder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickRecorder")
            .field("config", &self.inner.config)
            .field("available", &self.inner.permits.available_permits())
            .field("stats", &self.inner.counters.snapshot())
            .finish()
    }
}

impl<S: LinkStore + ?Sized> ClickRecorder<S> {
    pub fn new(store: Arc<S>, mut config: RecorderConfig) -> Self {
        config.max_in_flight = config.max_in_flight.max(1);
        let permits = Arc::new(Semaphore::new(config.max_in_flight as usize));
        Self {
            inner: Arc::new(Inner {
                store,
                permits,
                accepting: AtomicBool::new(true),
                config,
                counters: Counters::default(),
            }),
        }
    }

    /// Queues a click for `slug` and returns immediately.
    ///
    /// Returns `false` if the job was dropped because the recorder is
    /// saturated or shutting down. Must be called from within a tokio runtime.
    pub fn submit(&self, slug: Slug, visit: Visit) -> bool {
        let inner = &self.inner;
        Counters::bump(&inner.counters.submitted);

        if !inner.accepting.load(Ordering::Acquire) {
            Counters::bump(&inner.counters.dropped);
            debug!(slug = %slug, "Recorder is shutting down, click dropped");
            return false;
        }

        let permit = match Arc::clone(&inner.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                Counters::bump(&inner.counters.dropped);
                warn!(
                    slug = %slug,
                    max_in_flight = inner.config.max_in_flight,
                    "Click recorder saturated, click dropped"
                );
                return false;
            }
            Err(TryAcquireError::Closed) => {
                Counters::bump(&inner.counters.dropped);
                debug!(slug = %slug, "Recorder is closed, click dropped");
                return false;
            }
        };

        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            inner.run(slug, visit).await;
            drop(permit);
        });
        true
    }

    /// Waits until no job is in flight.
    ///
    /// Jobs submitted while waiting are waited for as well.
    pub async fn wait_idle(&self) {
        let inner = &self.inner;
        if let Ok(all) = inner.permits.acquire_many(inner.config.max_in_flight).await {
            drop(all);
        }
    }

    /// Stops accepting jobs and waits up to `grace` for in-flight ones.
    ///
    /// Returns `true` if every job finished in time. Jobs still running after
    /// the grace period keep running until their own deadline.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let inner = &self.inner;
        inner.accepting.store(false, Ordering::Release);
        info!(
            in_flight = self.in_flight(),
            grace_ms = grace.as_millis() as u64,
            "Draining click recorder"
        );

        let drained = matches!(
            tokio::time::timeout(grace, inner.permits.acquire_many(inner.config.max_in_flight))
                .await,
            Ok(Ok(_))
        );
        inner.permits.close();

        let stats = self.stats();
        if drained {
            info!(
                recorded = stats.recorded,
                failed = stats.failed,
                dropped = stats.dropped,
                "Click recorder drained"
            );
        } else {
            warn!(
                in_flight = self.in_flight(),
                "Click recorder grace period elapsed with jobs still running"
            );
        }
        drained
    }

    /// Number of jobs currently running.
    pub fn in_flight(&self) -> usize {
        let inner = &self.inner;
        (inner.config.max_in_flight as usize).saturating_sub(inner.permits.available_permits())
    }

    pub fn stats(&self) -> RecorderStats {
        self.inner.counters.snapshot()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.inner.config
    }
}

impl<S: LinkStore + ?Sized> Inner<S> {
    async fn run(&self, slug: Slug, visit: Visit) {
        let deadline = self.config.deadline;

        let link = match tokio::time::timeout(deadline, self.store.get_by_slug(&slug)).await {
            Ok(Ok(Some(link))) => link,
            Ok(Ok(None)) => {
                Counters::bump(&self.counters.skipped);
                debug!(slug = %slug, "Link vanished before its click was recorded");
                return;
            }
            Ok(Err(e)) => {
                Counters::bump(&self.counters.failed);
                warn!(slug = %slug, error = %e, "Click lookup failed, click abandoned");
                return;
            }
            Err(_) => {
                Counters::bump(&self.counters.failed);
                warn!(slug = %slug, deadline_ms = deadline.as_millis() as u64, "Click lookup timed out, click abandoned");
                return;
            }
        };

        match self.store.record_click(link.id, visit, deadline).await {
            Ok(()) => {
                Counters::bump(&self.counters.recorded);
                trace!(slug = %slug, link_id = %link.id, "Click recorded");
            }
            Err(e) => {
                Counters::bump(&self.counters.failed);
                warn!(slug = %slug, link_id = %link.id, error = %e, "Click recording failed, click abandoned");
            }
        }
    }
}
