//! Correlation table matching responses to outstanding requests.
//!
//! The transport does not promise FIFO delivery: a later request may
//! complete before an earlier one. Each outstanding id maps to a
//! single-resolution completion handle, resolved independently as its
//! response arrives. Responses whose id is no longer present (timed out
//! or never issued) are reported back to the caller for discarding.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::protocol::{RequestId, ResponseEnvelope};

/// The id is already outstanding; issuing it again would make the
/// response ambiguous.
#[derive(Debug, Clone, Error)]
#[error("correlation id already outstanding: {0}")]
pub struct DuplicateRequestId(pub RequestId);

/// Table of in-flight requests keyed by correlation id.
#[derive(Debug, Default)]
pub struct PendingRequests {
    inflight: Mutex<HashMap<RequestId, oneshot::Sender<ResponseEnvelope>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an outstanding id, returning the handle its response will
    /// be delivered on.
    pub fn register(
        &self,
        id: &RequestId,
    ) -> Result<oneshot::Receiver<ResponseEnvelope>, DuplicateRequestId> {
        let (tx, rx) = oneshot::channel();
        let mut inflight = self.lock();
        if inflight.contains_key(id) {
            return Err(DuplicateRequestId(id.clone()));
        }
        inflight.insert(id.clone(), tx);
        Ok(rx)
    }

    /// Deliver a response to its waiting caller.
    ///
    /// Returns false when no matching id is outstanding (late or unknown
    /// response) or the caller stopped waiting; the envelope is dropped.
    pub fn resolve(&self, envelope: ResponseEnvelope) -> bool {
        let sender = self.lock().remove(&envelope.id);
        match sender {
            Some(tx) => tx.send(envelope).is_ok(),
            None => false,
        }
    }

    /// Remove an outstanding id without resolving it, so a late response
    /// will be discarded. Returns whether the id was present.
    pub fn forget(&self, id: &RequestId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Drop every outstanding entry, waking all waiting callers with a
    /// closed-channel error. Used on dispose.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn outstanding(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RequestId, oneshot::Sender<ResponseEnvelope>>> {
        self.inflight.lock().expect("pending request table poisoned")
    }
}
