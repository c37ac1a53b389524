//! FIFO queue of requests waiting on a refresh.

use std::collections::VecDeque;

use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tracing::trace;
use uuid::Uuid;

use authwire_core::error::AppError;
use authwire_core::result::AppResult;
use authwire_core::types::ApiResponse;

/// Re-sends a request with the access token it is given.
pub type Replay = Box<dyn FnOnce(String) -> BoxFuture<'static, AppResult<ApiResponse>> + Send>;

/// A request paused until the outstanding refresh settles.
///
/// Resolved by [`PendingRequest::replay`] or rejected by
/// [`PendingRequest::reject`]; both consume it, so each entry settles once.
/// An entry dropped without either is seen by its waiter as a closed channel.
pub struct PendingRequest {
    /// Identifier for logs.
    id: Uuid,
    /// Re-sends the original request.
    execute: Replay,
    /// Delivers the outcome to the waiting caller.
    responder: oneshot::Sender<AppResult<ApiResponse>>,
}

impl PendingRequest {
    /// Creates an entry and the receiver its caller awaits.
    pub fn new(execute: Replay) -> (Self, oneshot::Receiver<AppResult<ApiResponse>>) {
        let (responder, rx) = oneshot::channel();
        let entry = Self {
            id: Uuid::new_v4(),
            execute,
            responder,
        };
        (entry, rx)
    }

    /// Identifier for logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the caller stopped waiting.
    pub fn is_abandoned(&self) -> bool {
        self.responder.is_closed()
    }

    /// Replays the request with `access_token` and delivers the outcome.
    ///
    /// Skips the network call if the caller already gave up.
    pub async fn replay(self, access_token: String) {
        if self.is_abandoned() {
            trace!(request_id = %self.id, "Skipping replay for abandoned request");
            return;
        }
        let outcome = (self.execute)(access_token).await;
        let _ = self.responder.send(outcome);
    }

    /// Rejects the request with `error`.
    pub fn reject(self, error: AppError) {
        let _ = self.responder.send(Err(error));
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Requests waiting on the outstanding refresh, in arrival order.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: VecDeque<PendingRequest>,
}

impl PendingQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: PendingRequest) {
        self.entries.push_back(entry);
    }

    /// Number of waiting entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry, oldest first.
    pub fn drain(&mut self) -> Vec<PendingRequest> {
        self.entries.drain(..).collect()
    }
}
