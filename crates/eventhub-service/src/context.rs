//! Request context carrying the acting user, cancellation, and deadline.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use eventhub_core::error::AppError;
use eventhub_core::result::AppResult;
use eventhub_core::types::UserId;

/// Context for one orchestrator call.
///
/// Built by the caller (HTTP handler, CLI, scheduler) and passed into every
/// service method so that each operation knows *who* is acting, *when*
/// the request arrived, and when to give up.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The authenticated user performing the operation.
    pub actor_id: UserId,
    /// Wall-clock time used for every time-dependent rule in the operation.
    pub request_time: DateTime<Utc>,
    started: Instant,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// Creates a context with no deadline and a fresh cancellation token.
    pub fn new(actor_id: UserId) -> Self {
        Self {
            actor_id,
            request_time: Utc::now(),
            started: Instant::now(),
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Context for internal jobs that act on behalf of no user.
    pub fn system() -> Self {
        Self::new(UserId::from_uuid(uuid::Uuid::nil()))
    }

    /// Give up once `timeout` has elapsed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Tie the operation to the caller's cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Pin the request time (tests, replays).
    pub fn at(mut self, request_time: DateTime<Utc>) -> Self {
        self.request_time = request_time;
        self
    }

    /// The token observed by this context.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn effective_deadline(&self, fallback: Duration) -> Instant {
        self.deadline.unwrap_or(self.started + fallback)
    }

    /// Run a store call, aborting it on cancellation or deadline.
    ///
    /// `fallback` is the deadline measured from context creation when the
    /// caller did not set one.
    pub async fn guard<T, F>(&self, fallback: Duration, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let deadline = self.effective_deadline(fallback);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(AppError::cancelled("Operation cancelled by caller"))
            }
            outcome = tokio::time::timeout_at(deadline, fut) => match outcome {
                Ok(result) => result,
                Err(_) => Err(AppError::timeout("Operation deadline exceeded")),
            },
        }
    }

    /// Fail if the operation was cancelled or is past its deadline.
    ///
    /// Called once before the first write of an operation; later writes are
    /// not interrupted.
    pub fn ensure_active(&self, fallback: Duration) -> AppResult<()> {
        if self.cancel.is_cancelled() {
            return Err(AppError::cancelled("Operation cancelled by caller"));
        }
        if Instant::now() >= self.effective_deadline(fallback) {
            return Err(AppError::timeout("Operation deadline exceeded"));
        }
        Ok(())
    }
}
