use super::cancel::CancellationToken;
use crate::domain::payment::{PaymentIntent, PaymentIntentId};
use crate::domain::ports::{IntentStatusQuery, IntentStatusQueryRef};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Interval between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Attempts before a poll gives up (three minutes at the default interval).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 90;
/// Shortest interval a poller accepts; shorter values are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How a poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The intent reached `Success` or `Failed`.
    Resolved(PaymentIntent),
    /// The attempt ceiling was reached while the intent was still pending.
    TimedOut { attempts: u32 },
    /// A status query failed; the intent's fate is unknown.
    Abandoned { attempts: u32, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// A non-terminal observation.
    Pending { attempt: u32, intent: PaymentIntent },
    /// Always the last event of a poll.
    Finished(PollOutcome),
}

/// Starts status polls for payment intents.
///
/// Every poll runs as its own tokio task, owned through the returned
/// [`PollHandle`]. The poller counts live tasks so callers can check that
/// no poll outlives its session.
#[derive(Clone)]
pub struct StatusPoller {
    source: IntentStatusQueryRef,
    interval: Duration,
    max_attempts: u32,
    live: Arc<AtomicUsize>,
}

impl StatusPoller {
    pub fn new(source: IntentStatusQueryRef) -> Self {
        Self {
            source,
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Number of poll tasks currently running.
    pub fn live_polls(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Spawns a poll for `intent_id`. The first query is issued one interval
    /// from now.
    pub fn start(&self, intent_id: PaymentIntentId) -> PollHandle {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(16);

        // Counted before spawning so the count never lags behind the handle.
        let guard = LiveGuard::acquire(self.live.clone());
        let task = PollTask {
            source: self.source.clone(),
            intent: PaymentIntent::new(intent_id.clone()),
            interval: self.interval,
            max_attempts: self.max_attempts,
            token: token.clone(),
            events: tx,
        };
        let join = tokio::spawn(async move {
            let _guard = guard;
            task.run().await;
        });

        PollHandle {
            intent_id,
            token,
            events: rx,
            join,
        }
    }
}

struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn acquire(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct PollTask {
    source: IntentStatusQueryRef,
    intent: PaymentIntent,
    interval: Duration,
    max_attempts: u32,
    token: CancellationToken,
    events: mpsc::Sender<PollEvent>,
}

impl PollTask {
    async fn run(mut self) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts = 0u32;

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            attempts += 1;
            debug!(intent = %self.intent.id, attempt = attempts, "querying payment status");
            let report = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                report = self.source.status(&self.intent.id) => report,
            };
            if self.token.is_cancelled() {
                break;
            }

            let event = match report {
                Ok(report) => {
                    self.intent.observe(&report);
                    if self.intent.is_terminal() {
                        info!(intent = %self.intent.id, status = ?self.intent.status, attempts, "payment resolved");
                        PollEvent::Finished(PollOutcome::Resolved(self.intent.clone()))
                    } else if attempts >= self.max_attempts {
                        warn!(intent = %self.intent.id, attempts, "payment still pending, giving up");
                        PollEvent::Finished(PollOutcome::TimedOut { attempts })
                    } else {
                        PollEvent::Pending {
                            attempt: attempts,
                            intent: self.intent.clone(),
                        }
                    }
                }
                Err(e) => {
                    warn!(intent = %self.intent.id, attempts, error = %e, "status query failed, stopping poll");
                    PollEvent::Finished(PollOutcome::Abandoned {
                        attempts,
                        error: e.to_string(),
                    })
                }
            };

            let finished = matches!(event, PollEvent::Finished(_));
            if self.token.is_cancelled() || self.events.send(event).await.is_err() {
                break;
            }
            if finished {
                break;
            }
        }

        if self.token.is_cancelled() {
            debug!(intent = %self.intent.id, "poll cancelled");
        }
    }
}

/// Owner's side of a running poll.
///
/// Dropping the handle cancels the poll.
#[derive(Debug)]
pub struct PollHandle {
    intent_id: PaymentIntentId,
    token: CancellationToken,
    events: mpsc::Receiver<PollEvent>,
    join: JoinHandle<()>,
}

impl PollHandle {
    pub fn intent_id(&self) -> &PaymentIntentId {
        &self.intent_id
    }

    /// Next event from the poll, or `None` once it has stopped.
    pub async fn next(&mut self) -> Option<PollEvent> {
        if self.token.is_cancelled() {
            return None;
        }
        self.events.recv().await
    }

    /// Stops the poll. Safe to call any number of times, including after the
    /// poll has finished on its own.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancels the poll and waits for its task to exit.
    pub async fn shutdown(mut self) {
        self.cancel();
        self.events.close();
        let _ = (&mut self.join).await;
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
