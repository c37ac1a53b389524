//! The refresh state machine.
//!
//! A 401 moves the coordinator from `Idle` to `Refreshing` and starts one
//! refresh flight on a spawned task. Every 401 seen while the flight is
//! outstanding only joins the [`PendingQueue`]. The flight settles the
//! whole queue: replayed in order on success, rejected on failure.
//!
//! Each flight is tagged with the session epoch it started in. Logout and
//! login bump the epoch through [`RefreshCoordinator::invalidate`], so a
//! flight that outlives its session finds a different epoch and drops its
//! result without touching the store or the queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use authwire_core::error::AppError;
use authwire_core::events::TeardownReason;
use authwire_core::result::AppResult;
use authwire_core::traits::Navigator;
use authwire_core::types::{ApiResponse, TokenPair};

use super::endpoint::RefreshEndpoint;
use super::queue::{PendingQueue, PendingRequest, Replay};
use super::state::RefreshState;
use crate::token::TokenStore;

/// State guarded by the coordinator lock. Never held across an await.
#[derive(Debug, Default)]
struct Machine {
    state: RefreshState,
    queue: PendingQueue,
    epoch: u64,
}

/// Lifetime counters.
#[derive(Debug, Default)]
struct RefreshMetrics {
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
    replayed: AtomicU64,
    rejected: AtomicU64,
    bypassed: AtomicU64,
}

impl RefreshMetrics {
    fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }
}

/// Serializable snapshot of the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStats {
    /// Current state.
    pub state: RefreshState,
    /// Requests waiting on the outstanding refresh.
    pub pending: usize,
    /// Refresh calls issued.
    pub refreshes_started: u64,
    /// Refresh calls that produced a new access token.
    pub refreshes_succeeded: u64,
    /// Refresh calls that tore the session down.
    pub refreshes_failed: u64,
    /// Refresh results dropped because the session ended meanwhile.
    pub refreshes_discarded: u64,
    /// Queued requests replayed with a new token.
    pub requests_replayed: u64,
    /// Queued requests rejected.
    pub requests_rejected: u64,
    /// 401s replayed directly because the token had already been refreshed.
    pub requests_bypassed: u64,
}

/// How a 401 enters the machine.
enum Admission {
    /// Token already refreshed since the request was sent.
    Bypass(String, Replay),
    /// Joined the outstanding flight.
    Queued(oneshot::Receiver<AppResult<ApiResponse>>),
    /// Started the flight.
    Leader(oneshot::Receiver<AppResult<ApiResponse>>, TokenPair, u64),
}

#[derive(Debug)]
struct Shared {
    machine: Mutex<Machine>,
    store: Arc<TokenStore>,
    endpoint: RefreshEndpoint,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    metrics: RefreshMetrics,
}

/// Single-flight refresh coordinator.
///
/// Cheap to clone; clones share one state machine.
#[derive(Debug, Clone)]
pub struct RefreshCoordinator {
    shared: Arc<Shared>,
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    pub fn new(
        store: Arc<TokenStore>,
        endpoint: RefreshEndpoint,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                machine: Mutex::new(Machine::default()),
                store,
                endpoint,
                navigator,
                login_route: login_route.into(),
                metrics: RefreshMetrics::default(),
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> RefreshState {
        self.shared.machine.lock().state
    }

    /// Number of requests waiting on the outstanding refresh.
    pub fn pending(&self) -> usize {
        self.shared.machine.lock().queue.len()
    }

    /// Snapshot of state and counters.
    pub fn stats(&self) -> CoordinatorStats {
        let (state, pending) = {
            let machine = self.shared.machine.lock();
            (machine.state, machine.queue.len())
        };
        let m = &self.shared.metrics;
        CoordinatorStats {
            state,
            pending,
            refreshes_started: m.started.load(Ordering::Relaxed),
            refreshes_succeeded: m.succeeded.load(Ordering::Relaxed),
            refreshes_failed: m.failed.load(Ordering::Relaxed),
            refreshes_discarded: m.discarded.load(Ordering::Relaxed),
            requests_replayed: m.replayed.load(Ordering::Relaxed),
            requests_rejected: m.rejected.load(Ordering::Relaxed),
            requests_bypassed: m.bypassed.load(Ordering::Relaxed),
        }
    }

    /// Handles a 401 for a request that has not been retried yet.
    ///
    /// `failed_access` is the token the rejected request carried and
    /// `replay` re-sends it with a given token. Resolves with the replayed
    /// response once a refresh settles.
    ///
    /// # Errors
    ///
    /// - `AuthExpired` if there is no session to refresh, or the session
    ///   ended while the request was waiting.
    /// - `RefreshFailed` if the refresh endpoint failed.
    /// - Whatever the replay itself returns.
    pub async fn on_unauthorized(
        &self,
        failed_access: Option<&str>,
        replay: Replay,
    ) -> AppResult<ApiResponse> {
        let admission = {
            let mut machine = self.shared.machine.lock();

            match machine.state {
                RefreshState::Failed => {
                    return Err(AppError::refresh_failed("Session refresh already failed"));
                }
                RefreshState::Refreshing => {
                    let (entry, rx) = PendingRequest::new(replay);
                    debug!(
                        request_id = %entry.id(),
                        pending = machine.queue.len() + 1,
                        "Queued request behind outstanding refresh"
                    );
                    machine.queue.push(entry);
                    Admission::Queued(rx)
                }
                RefreshState::Idle => {
                    let Some(tokens) = self.shared.store.get() else {
                        return Err(AppError::auth_expired("No session to refresh"));
                    };

                    if failed_access != Some(tokens.access_token.as_str()) {
                        Admission::Bypass(tokens.access_token, replay)
                    } else {
                        let (entry, rx) = PendingRequest::new(replay);
                        machine.queue.push(entry);
                        machine.state = RefreshState::Refreshing;
                        Admission::Leader(rx, tokens, machine.epoch)
                    }
                }
            }
        };

        let rx = match admission {
            Admission::Bypass(access_token, replay) => {
                RefreshMetrics::inc(&self.shared.metrics.bypassed);
                debug!("Access token already refreshed; replaying directly");
                return replay(access_token).await;
            }
            Admission::Queued(rx) => rx,
            Admission::Leader(rx, tokens, epoch) => {
                let shared = Arc::clone(&self.shared);
                tokio::spawn(async move { shared.fly(tokens, epoch).await });
                rx
            }
        };

        rx.await
            .map_err(|_| AppError::internal("Refresh coordinator dropped a pending request"))?
    }

    /// Ends the current session epoch.
    ///
    /// Rejects every queued request, returns to `Idle`, and makes any
    /// outstanding flight discard its result. Runs without awaiting, so no
    /// queued request can be replayed once this returns. Returns the number
    /// of rejected requests.
    pub fn invalidate(&self) -> usize {
        let entries = {
            let mut machine = self.shared.machine.lock();
            machine.epoch += 1;
            machine.state = RefreshState::Idle;
            machine.queue.drain()
        };

        let count = entries.len();
        for entry in entries {
            entry.reject(AppError::auth_expired(
                "Session ended while waiting for token refresh",
            ));
        }
        if count > 0 {
            RefreshMetrics::add(&self.shared.metrics.rejected, count);
            info!(rejected = count, "Invalidated pending refresh queue");
        }
        count
    }
}

impl Shared {
    /// One refresh flight for `tokens`, started in `epoch`.
    async fn fly(&self, tokens: TokenPair, epoch: u64) {
        RefreshMetrics::inc(&self.metrics.started);
        info!(endpoint = self.endpoint.url(), "Refreshing access token");

        let outcome = self.endpoint.exchange(&tokens.refresh_token).await;

        if self.machine.lock().epoch != epoch {
            RefreshMetrics::inc(&self.metrics.discarded);
            info!("Session ended during refresh; discarding result");
            return;
        }

        match outcome {
            Ok(grant) => {
                let access_token = grant.access_token.clone();
                let rotated = grant.refresh_token.is_some();
                let installed = self
                    .store
                    .rotate_if_current(&tokens, grant.access_token, grant.refresh_token)
                    .await;

                let entries = {
                    let mut machine = self.machine.lock();
                    if machine.epoch != epoch {
                        RefreshMetrics::inc(&self.metrics.discarded);
                        info!("Session ended during refresh; discarding result");
                        return;
                    }
                    machine.state = RefreshState::Idle;
                    machine.queue.drain()
                };

                if !installed {
                    RefreshMetrics::inc(&self.metrics.discarded);
                    warn!(
                        pending = entries.len(),
                        "Session changed during refresh; rejecting queued requests"
                    );
                    RefreshMetrics::add(&self.metrics.rejected, entries.len());
                    for entry in entries {
                        entry.reject(AppError::auth_expired(
                            "Session changed while waiting for token refresh",
                        ));
                    }
                    return;
                }

                RefreshMetrics::inc(&self.metrics.succeeded);
                info!(rotated, pending = entries.len(), "Access token refreshed");

                // Strictly sequential: each replay is sent after the previous one settled.
                // The epoch is rechecked before every replay, so a logout mid-drain
                // rejects everything not yet sent.
                let total = entries.len();
                let mut ended = false;
                for entry in entries {
                    if !ended && self.machine.lock().epoch != epoch {
                        ended = true;
                        warn!("Session ended while replaying; rejecting remaining requests");
                    }
                    if ended {
                        RefreshMetrics::inc(&self.metrics.rejected);
                        entry.reject(AppError::auth_expired(
                            "Session ended while waiting for token refresh",
                        ));
                        continue;
                    }
                    if entry.is_abandoned() {
                        debug!(request_id = %entry.id(), "Skipping abandoned request");
                        continue;
                    }
                    RefreshMetrics::inc(&self.metrics.replayed);
                    entry.replay(access_token.clone()).await;
                }
                debug!(total, "Drained refresh queue");
            }
            Err(e) => {
                let entries = {
                    let mut machine = self.machine.lock();
                    if machine.epoch != epoch {
                        RefreshMetrics::inc(&self.metrics.discarded);
                        info!("Session ended during refresh; discarding failure");
                        return;
                    }
                    machine.state = RefreshState::Failed;
                    machine.epoch += 1;
                    machine.queue.drain()
                };

                RefreshMetrics::inc(&self.metrics.failed);
                RefreshMetrics::add(&self.metrics.rejected, entries.len());

                let cleared = self
                    .store
                    .clear_if_current(&tokens, TeardownReason::RefreshFailed)
                    .await;

                if cleared {
                    warn!(
                        error = %e,
                        pending = entries.len(),
                        "Token refresh failed; ending session"
                    );
                    for entry in entries {
                        entry.reject(AppError::refresh_failed(e.message.clone()));
                    }
                    self.navigator.redirect(&self.login_route);
                } else {
                    warn!(
                        error = %e,
                        pending = entries.len(),
                        "Token refresh failed for a session that was already replaced"
                    );
                    for entry in entries {
                        entry.reject(AppError::auth_expired(
                            "Session changed while waiting for token refresh",
                        ));
                    }
                }

                let mut machine = self.machine.lock();
                if machine.state == RefreshState::Failed {
                    machine.state = RefreshState::Idle;
                }
            }
        }
    }
}
