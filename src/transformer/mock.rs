//! Mock transformer for testing
//!
//! Returns configurable payloads or failures without making real API calls.
//! A gate can hold calls suspended until the test releases them, which is how
//! stale-completion handling is exercised.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use super::RemoteTransformer;
use crate::error::{Result, StudioError};

/// Payload returned when the queue is empty (base64 of "foo")
const DEFAULT_PAYLOAD: &str = "Zm9v";

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    pub payload: String,
    pub mime_type: String,
    pub instruction: String,
}

/// Mock transformer that returns predefined outcomes
pub struct MockTransformer {
    /// Queue of outcomes to return (FIFO); `Err` holds a failure message
    outcomes: Mutex<VecDeque<std::result::Result<String, String>>>,
    /// Payload when queue is empty
    default_payload: String,
    /// Every request made (for assertions)
    requests: Mutex<Vec<TransformRequest>>,
    /// When set, each call waits for one permit before answering
    gate: Option<Arc<Semaphore>>,
    called: Notify,
}

impl MockTransformer {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            default_payload: DEFAULT_PAYLOAD.to_string(),
            requests: Mutex::new(Vec::new()),
            gate: None,
            called: Notify::new(),
        }
    }

    /// Create with a queue of successful payloads
    pub fn with_responses(payloads: Vec<String>) -> Self {
        let mock = Self::new();
        mock.outcomes.lock().extend(payloads.into_iter().map(Ok));
        mock
    }

    /// Set the payload returned when the queue is empty
    pub fn with_default(mut self, payload: impl Into<String>) -> Self {
        self.default_payload = payload.into();
        self
    }

    /// Hold every call until [`MockTransformer::release`] hands out a permit
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn queue_response(&self, payload: impl Into<String>) {
        self.outcomes.lock().push_back(Ok(payload.into()));
    }

    /// Queue a failure; the message becomes the remote error message
    pub fn queue_failure(&self, message: impl Into<String>) {
        self.outcomes.lock().push_back(Err(message.into()));
    }

    /// Let `n` suspended (or future) calls complete
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn requests(&self) -> Vec<TransformRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<TransformRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Wait until at least `n` calls have started
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.called.notified();
            if self.call_count() >= n {
                return;
            }
            notified.await;
        }
    }
}

impl Default for MockTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteTransformer for MockTransformer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn process_image(
        &self,
        payload: &str,
        mime_type: &str,
        instruction: &str,
    ) -> Result<String> {
        self.requests.lock().push(TransformRequest {
            payload: payload.to_string(),
            mime_type: mime_type.to_string(),
            instruction: instruction.to_string(),
        });
        // Outcome is bound at call time so gated calls keep their order
        let outcome = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(self.default_payload.clone()));
        self.called.notify_waiters();

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| StudioError::remote("mock gate closed"))?;
            permit.forget();
        }

        outcome.map_err(StudioError::remote)
    }
}
