//! Candidate validation for Sockpool
//!
//! Every structurally valid candidate gets its own task, and all tasks are
//! spawned up front. A semaphore with `concurrency` permits is the admission
//! gate: a task holds a permit for the whole duration of its probe, so no more
//! than `concurrency` probes are ever in flight. Live endpoints are sent down
//! a channel in completion order; the channel closes only after every task
//! has been joined. Dropping the [`Validation`] stream early aborts every
//! probe still queued or running.

mod probe;
mod stats;

pub use probe::{HttpProbe, Probe};
pub use stats::{InFlightGuard, ValidatorStats, ValidatorStatsSnapshot};

use crate::candidate::{parse_candidate, Endpoint};
use crate::config::ValidatorConfig;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info, trace, warn};

/// Live endpoints from one validation run, in completion order
///
/// Owns the run: dropping it aborts the probes that have not finished.
#[derive(Debug)]
pub struct Validation {
    live: ReceiverStream<Endpoint>,
    driver: JoinHandle<()>,
}

impl Stream for Validation {
    type Item = Endpoint;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Endpoint>> {
        Pin::new(&mut self.live).poll_next(cx)
    }
}

impl Drop for Validation {
    fn drop(&mut self) {
        // The driver owns the JoinSet; aborting it drops the set, which aborts every probe
        self.driver.abort();
    }
}

/// Bounded-concurrency proxy validator
#[derive(Debug, Clone)]
pub struct Validator {
    concurrency: usize,
    probe: Arc<dyn Probe>,
    stats: Arc<ValidatorStats>,
}

impl Validator {
    /// Create a validator with a custom probe
    ///
    /// A `concurrency` of zero is treated as one.
    pub fn new(concurrency: usize, probe: Arc<dyn Probe>) -> Self {
        Validator {
            concurrency: concurrency.max(1),
            probe,
            stats: Arc::new(ValidatorStats::new()),
        }
    }

    /// Create a validator that probes over HTTP as configured
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new(config.concurrency, Arc::new(HttpProbe::from_config(config)))
    }

    /// Admission limit
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Validator statistics
    pub fn stats(&self) -> &Arc<ValidatorStats> {
        &self.stats
    }

    /// Probe every candidate and stream back the live ones
    ///
    /// Malformed candidates are dropped before scheduling. The returned stream
    /// yields endpoints as their probes succeed and ends once every probe has
    /// finished. Must be called from within a Tokio runtime.
    pub fn validate<I, S>(&self, candidates: I) -> Validation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let endpoints: Vec<Endpoint> = candidates
            .into_iter()
            .filter_map(|raw| {
                let parsed = parse_candidate(raw.as_ref());
                if parsed.is_none() {
                    trace!("Dropping malformed candidate {:?}", raw.as_ref());
                }
                parsed
            })
            .collect();

        info!(
            "Validating {} candidates with concurrency {}",
            endpoints.len(),
            self.concurrency
        );

        // Room for every result, so a finished probe never waits on the consumer
        let (tx, rx) = mpsc::channel(endpoints.len().max(1));
        let gate = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for endpoint in endpoints {
            let gate = gate.clone();
            let probe = self.probe.clone();
            let stats = self.stats.clone();
            let tx = tx.clone();
            stats.record_launched();

            tasks.spawn(async move {
                let permit = match gate.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                let in_flight = stats.enter();
                let result = probe.check(&endpoint).await;
                drop(in_flight);
                drop(permit);

                match result {
                    Ok(()) => {
                        stats.record_result(true);
                        debug!("Proxy {} is live", endpoint);
                        let _ = tx.send(endpoint).await;
                    }
                    Err(e) => {
                        stats.record_result(false);
                        debug!("Proxy {} rejected: {:#}", endpoint, e);
                    }
                }
            });
        }

        let stats = self.stats.clone();
        let driver = tokio::spawn(async move {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    warn!("Probe task failed: {}", e);
                }
            }
            let summary = stats.snapshot();
            info!(
                "Validation finished: {} live, {} rejected, peak concurrency {}",
                summary.passed, summary.failed, summary.peak_in_flight
            );
            // Last sender goes away here; consumers see end-of-stream.
            drop(tx);
        });

        Validation {
            live: ReceiverStream::new(rx),
            driver,
        }
    }
}
