//! Latest-request-wins bookkeeping shared by every fetching store.
//!
//! Each store owns one [`RequestSequence`]. Issuing a request cancels the
//! previous in-flight one and bumps the sequence number; a response is only
//! applied when its number is still the latest.

use crate::domain::errors::{ServiceError, ServiceResult};
use crate::domain::ports::time_service::TimeService;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Handle for one issued request
#[derive(Debug, Clone)]
pub struct Ticket {
    pub seq: u64,
    pub token: CancellationToken,
}

#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
    inflight: Option<CancellationToken>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new request, superseding (and cancelling) the previous one.
    /// The ticket's token is a child of `parent` so teardown cancels it too.
    pub fn issue(&mut self, parent: &CancellationToken) -> Ticket {
        if let Some(previous) = self.inflight.take() {
            previous.cancel();
        }
        self.latest += 1;
        let token = parent.child_token();
        self.inflight = Some(token.clone());
        Ticket {
            seq: self.latest,
            token,
        }
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }

    /// Mark `seq` as answered. Returns false for a stale response.
    pub fn complete(&mut self, seq: u64) -> bool {
        if !self.is_current(seq) {
            return false;
        }
        self.inflight = None;
        true
    }

    /// Cancel the in-flight request and invalidate any response still on its way
    pub fn cancel(&mut self) {
        if let Some(previous) = self.inflight.take() {
            previous.cancel();
        }
        self.latest += 1;
    }

    pub fn in_flight(&self) -> bool {
        self.inflight.is_some()
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}

/// Result of applying a response to a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer request was issued after this one; the response was dropped
    Stale,
    /// The response was applied but reported fewer pages than the current
    /// page; the page was clamped to `page` and needs a fetch of its own
    Clamped { page: u32 },
    /// The call failed; previous data is kept
    Failed(ServiceError),
}

/// How a bounded call ended
#[derive(Debug)]
pub enum Completion<T> {
    Done(ServiceResult<T>),
    Cancelled,
}

/// Run `call` until it finishes, `timeout` elapses, or `token` is cancelled.
pub async fn run_bounded<T, F>(
    time: &dyn TimeService,
    timeout: Duration,
    token: &CancellationToken,
    call: F,
) -> Completion<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Completion::Cancelled,
        result = with_timeout(time, timeout, call) => Completion::Done(result),
    }
}

/// Run `call`, failing with [`ServiceError::Timeout`] after `timeout`.
pub async fn with_timeout<T, F>(time: &dyn TimeService, timeout: Duration, call: F) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    tokio::select! {
        result = call => result,
        _ = time.sleep(timeout) => Err(ServiceError::Timeout(timeout)),
    }
}
