//! Shared state threaded through one submission's reconcilers

use crate::progress::{ProgressEvent, ProgressSink};
use crate::types::{ReconciliationOutcome, SubmissionId};
use lms_remote::{RemoteError, RemoteResourceClient};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Everything a reconciler needs besides the edit tree itself
#[derive(Clone)]
pub struct ReconcileContext {
    client: Arc<dyn RemoteResourceClient>,
    submission: SubmissionId,
    cancel: CancellationToken,
    progress: ProgressSink,
    call_timeout: Option<Duration>,
}

impl ReconcileContext {
    /// Context with no cancellation, progress or timeout
    #[must_use]
    pub fn new(client: Arc<dyn RemoteResourceClient>, submission: SubmissionId) -> Self {
        Self {
            client,
            submission,
            cancel: CancellationToken::new(),
            progress: ProgressSink::none(),
            call_timeout: None,
        }
    }

    /// With cancellation token
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// With progress sink
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// With per-call deadline
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Remote client
    #[inline]
    #[must_use]
    pub fn client(&self) -> &dyn RemoteResourceClient {
        self.client.as_ref()
    }

    /// Submission id for logs and events
    #[inline]
    #[must_use]
    pub fn submission(&self) -> SubmissionId {
        self.submission
    }

    /// Caller abandoned the submission
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn progress(&self) -> &ProgressSink {
        &self.progress
    }

    pub(crate) fn node_settled(&self, outcome: &ReconciliationOutcome) {
        self.progress.emit(ProgressEvent::NodeSettled {
            submission: self.submission,
            outcome: outcome.clone(),
        });
    }

    /// Await one remote call, enforcing the per-call deadline.
    ///
    /// Cancellation is not applied here: a call that was issued runs to
    /// completion.
    pub(crate) async fn call<T, F>(&self, call: F) -> Result<T, RemoteError>
    where
        F: Future<Output = Result<T, RemoteError>>,
    {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| {
                    Err(RemoteError::Timeout {
                        after_secs: limit.as_secs(),
                    })
                }),
            None => call.await,
        }
    }

    /// Like [`Self::call`], for create calls.
    ///
    /// An expired deadline leaves it unknown whether the backend stored the
    /// node, so the timeout is reported as [`RemoteError::Unconfirmed`].
    pub(crate) async fn create<T, F>(&self, call: F) -> Result<T, RemoteError>
    where
        F: Future<Output = Result<T, RemoteError>>,
    {
        self.call(call).await.map_err(RemoteError::unconfirmed_if_timeout)
    }
}

impl std::fmt::Debug for ReconcileContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileContext")
            .field("submission", &self.submission)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}
