//! Workflow controller
//!
//! Owns the session state and applies the three intents (upload, select
//! option, trigger processing). State sits behind a mutex that is never held
//! across an `.await`, so a presentation layer can keep issuing intents
//! while an attempt is suspended on encoding or on the remote call.
//!
//! Every upload and every attempt start bumps a generation counter. An
//! attempt remembers the generation it started with and its completion is
//! only applied if that generation is still current; otherwise it is
//! discarded.

use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use tokio::sync::watch;

use super::state::WorkflowState;
use crate::encode::{encode, UploadedFile};
use crate::error::{Result, StudioError};
use crate::event::{Event, EventKind, EventLog};
use crate::instruction::{build_instruction, BackgroundOption};
use crate::reference::{ImageRef, RefStore};
use crate::transformer::RemoteTransformer;

/// What a single `trigger_process` call ended with
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Result stored in the state
    Succeeded { generation: u64, result: ImageRef },
    /// Failure message stored in the state
    Failed { generation: u64, error: StudioError },
    /// Refused before any work (no source image)
    Rejected { error: StudioError },
    /// Another attempt is running; state untouched
    Busy,
    /// Completed after a newer upload or attempt; outcome dropped
    Stale { generation: u64 },
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Collapse into the result handle or the error that explains its absence
    pub fn into_result(self) -> Result<ImageRef> {
        match self {
            Self::Succeeded { result, .. } => Ok(result),
            Self::Failed { error, .. } | Self::Rejected { error } => Err(error),
            Self::Busy => Err(StudioError::AttemptInProgress),
            Self::Stale { generation } => Err(StudioError::Superseded { generation }),
        }
    }
}

struct Session {
    state: WorkflowState,
    source: Option<UploadedFile>,
    generation: u64,
}

struct Inner {
    session: Mutex<Session>,
    transformer: Arc<dyn RemoteTransformer>,
    refs: RefStore,
    events: EventLog,
    updates: watch::Sender<WorkflowState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.refs.release_all();
    }
}

/// Cheap-clone handle to one session's workflow
#[derive(Clone)]
pub struct WorkflowController {
    inner: Arc<Inner>,
}

impl WorkflowController {
    /// New session with the default background option
    pub fn new(transformer: Arc<dyn RemoteTransformer>) -> Self {
        Self::with_option(transformer, BackgroundOption::default())
    }

    /// New session with `option` preselected
    pub fn with_option(transformer: Arc<dyn RemoteTransformer>, option: BackgroundOption) -> Self {
        let state = WorkflowState::new(option);
        let (updates, _) = watch::channel(state.clone());

        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(Session {
                    state,
                    source: None,
                    generation: 0,
                }),
                transformer,
                refs: RefStore::new(),
                events: EventLog::new(),
                updates,
            }),
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Read side
    // ═══════════════════════════════════════════════════════════════

    /// Snapshot of the current state
    pub fn state(&self) -> WorkflowState {
        self.inner.session.lock().state.clone()
    }

    pub fn can_process(&self) -> bool {
        self.inner.session.lock().state.can_process()
    }

    /// Current generation (bumped by every upload and attempt start)
    pub fn generation(&self) -> u64 {
        self.inner.session.lock().generation
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.inner.updates.subscribe()
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.events.events()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.inner.events
    }

    /// Registry of the handles this session has allocated
    pub fn refs(&self) -> &RefStore {
        &self.inner.refs
    }

    pub fn transformer_name(&self) -> &str {
        self.inner.transformer.name()
    }

    // ═══════════════════════════════════════════════════════════════
    // Intents
    // ═══════════════════════════════════════════════════════════════

    /// Replace the source image
    ///
    /// Sets the preview right away, clears result and error, and supersedes
    /// any in-flight attempt. Does not start processing.
    pub fn upload(&self, file: UploadedFile) -> ImageRef {
        let mut session = self.inner.session.lock();
        session.generation += 1;

        if let Some(old) = session.state.preview_ref.take() {
            self.inner.refs.release(&old);
        }
        if let Some(old) = session.state.result_ref.take() {
            self.inner.refs.release(&old);
        }

        let preview = self.inner.refs.allocate_preview(&file);
        self.inner.events.emit(EventKind::Uploaded {
            generation: session.generation,
            file_name: file.name().to_string(),
            mime_type: file.mime_type().to_string(),
        });
        tracing::info!(
            generation = session.generation,
            file = file.name(),
            mime_type = file.mime_type(),
            "image uploaded"
        );

        session.state.has_source = true;
        session.state.preview_ref = Some(preview.clone());
        session.state.last_error = None;
        session.state.is_processing = false;
        session.source = Some(file);

        self.publish(&session);
        preview
    }

    /// Change the background option for the next attempt
    ///
    /// An existing result or error is left as is.
    pub fn select_option(&self, option: BackgroundOption) {
        let mut session = self.inner.session.lock();
        session.state.selected_option = option;
        self.inner.events.emit(EventKind::OptionSelected { option });
        tracing::debug!(%option, "background option selected");
        self.publish(&session);
    }

    /// Run one processing attempt for the current upload
    pub async fn trigger_process(&self) -> AttemptOutcome {
        let (generation, file, option) = {
            let mut session = self.inner.session.lock();
            if session.state.is_processing {
                tracing::debug!(generation = session.generation, "attempt already running");
                return AttemptOutcome::Busy;
            }

            let Some(file) = session.source.clone() else {
                let error = StudioError::no_source();
                session.state.last_error = Some(error.user_message());
                self.inner.events.emit(EventKind::AttemptRejected {
                    reason: error.user_message(),
                });
                tracing::warn!("processing triggered without an upload");
                self.publish(&session);
                return AttemptOutcome::Rejected { error };
            };

            session.generation += 1;
            if let Some(old) = session.state.result_ref.take() {
                self.inner.refs.release(&old);
            }
            session.state.last_error = None;
            session.state.is_processing = true;

            self.inner.events.emit(EventKind::AttemptStarted {
                generation: session.generation,
                option: session.state.selected_option,
                transformer: self.inner.transformer.name().to_string(),
            });
            self.publish(&session);
            (session.generation, file, session.state.selected_option)
        };

        tracing::info!(
            generation,
            %option,
            transformer = self.inner.transformer.name(),
            "processing started"
        );
        let started = Instant::now();
        let mut guard = AttemptGuard {
            controller: self,
            generation,
            completed: false,
        };
        let result = self.run_attempt(&file, option).await;
        guard.completed = true;
        self.complete(generation, result, started.elapsed().as_millis() as u64)
    }

    /// Release every handle and drop the upload (component teardown)
    ///
    /// Any attempt still in flight completes as stale.
    pub fn teardown(&self) {
        let mut session = self.inner.session.lock();
        session.generation += 1;
        session.state = WorkflowState::new(session.state.selected_option);
        session.source = None;
        let released = self.inner.refs.release_all();
        tracing::debug!(released, "session torn down");
        self.publish(&session);
    }

    // ═══════════════════════════════════════════════════════════════
    // Attempt internals
    // ═══════════════════════════════════════════════════════════════

    async fn run_attempt(&self, file: &UploadedFile, option: BackgroundOption) -> Result<String> {
        let payload = encode(file).await?;
        let instruction = build_instruction(option);

        let result = self
            .inner
            .transformer
            .process_image(&payload.data, &payload.mime_type, instruction)
            .await?;

        if result.trim().is_empty() {
            return Err(StudioError::EmptyPayload);
        }
        STANDARD.decode(result.as_bytes()).map_err(|e| {
            StudioError::remote(format!("Image service returned an unusable image: {}", e))
        })?;
        Ok(result)
    }

    /// Clear `is_processing` for an attempt whose future was dropped mid-flight
    fn abandon(&self, generation: u64) {
        let mut session = self.inner.session.lock();
        if session.generation != generation || !session.state.is_processing {
            return;
        }

        session.state.is_processing = false;
        self.inner
            .events
            .emit(EventKind::AttemptAbandoned { generation });
        tracing::warn!(generation, "attempt dropped before completion");
        self.publish(&session);
    }

    fn complete(&self, generation: u64, result: Result<String>, duration_ms: u64) -> AttemptOutcome {
        let mut session = self.inner.session.lock();

        if session.generation != generation {
            self.inner.events.emit(EventKind::StaleCompletionDiscarded {
                attempt_generation: generation,
                current_generation: session.generation,
            });
            tracing::warn!(
                generation,
                current = session.generation,
                "discarding stale completion"
            );
            return AttemptOutcome::Stale { generation };
        }

        session.state.is_processing = false;
        let outcome = match result {
            Ok(payload) => {
                let image = self.inner.refs.allocate_result(payload.as_str());
                self.inner.events.emit(EventKind::AttemptSucceeded {
                    generation,
                    payload_len: payload.len(),
                    duration_ms,
                });
                tracing::info!(generation, duration_ms, "processing succeeded");
                session.state.result_ref = Some(image.clone());
                AttemptOutcome::Succeeded {
                    generation,
                    result: image,
                }
            }
            Err(error) => {
                let message = error.user_message();
                self.inner.events.emit(EventKind::AttemptFailed {
                    generation,
                    error: message.clone(),
                    duration_ms,
                });
                tracing::warn!(generation, code = error.code(), error = %message, "processing failed");
                session.state.last_error = Some(message);
                AttemptOutcome::Failed { generation, error }
            }
        };

        self.publish(&session);
        outcome
    }

    fn publish(&self, session: &Session) {
        self.inner.updates.send_replace(session.state.clone());
    }
}

/// Lives across the attempt's suspension points; fires only if the future is dropped there
struct AttemptGuard<'a> {
    controller: &'a WorkflowController,
    generation: u64,
    completed: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.controller.abandon(self.generation);
        }
    }
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.inner.session.lock();
        f.debug_struct("WorkflowController")
            .field("generation", &session.generation)
            .field("state", &session.state)
            .field("transformer", &self.inner.transformer.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::MockTransformer;
    use crate::util::NO_SOURCE_MESSAGE;

    fn controller(mock: &Arc<MockTransformer>) -> WorkflowController {
        WorkflowController::new(Arc::clone(mock) as Arc<dyn RemoteTransformer>)
    }

    fn jpeg(name: &str) -> UploadedFile {
        UploadedFile::from_bytes(name, "image/jpeg", b"jpeg-bytes".to_vec())
    }

    #[test]
    fn test_upload_sets_preview_and_clears_error() {
        let mock = Arc::new(MockTransformer::new());
        let ctl = controller(&mock);

        let preview = ctl.upload(jpeg("a.jpg"));
        let state = ctl.state();

        assert!(state.has_source);
        assert_eq!(state.preview_ref, Some(preview));
        assert!(state.result_ref.is_none());
        assert!(state.last_error.is_none());
        assert!(ctl.can_process());
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_new_upload_releases_previous_preview() {
        let mock = Arc::new(MockTransformer::new());
        let ctl = controller(&mock);

        let first = ctl.upload(jpeg("a.jpg"));
        let second = ctl.upload(jpeg("b.jpg"));

        assert!(!ctl.refs().is_live(&first));
        assert!(ctl.refs().is_live(&second));
        assert_eq!(ctl.refs().live_count(), 1);
    }

    #[test]
    fn test_select_option_updates_state() {
        let mock = Arc::new(MockTransformer::new());
        let ctl = WorkflowController::with_option(
            Arc::clone(&mock) as Arc<dyn RemoteTransformer>,
            BackgroundOption::Original,
        );
        assert_eq!(ctl.state().selected_option, BackgroundOption::Original);

        ctl.select_option(BackgroundOption::White);
        assert_eq!(ctl.state().selected_option, BackgroundOption::White);
    }

    #[tokio::test]
    async fn test_trigger_without_upload_is_rejected() {
        let mock = Arc::new(MockTransformer::new());
        let ctl = controller(&mock);

        let outcome = ctl.trigger_process().await;

        assert!(matches!(outcome, AttemptOutcome::Rejected { .. }));
        assert_eq!(ctl.state().last_error.as_deref(), Some(NO_SOURCE_MESSAGE));
        assert!(!ctl.state().is_processing);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_then_new_attempt_releases_old_result() {
        let mock = Arc::new(MockTransformer::with_responses(vec!["Zm9v".into(), "YmFy".into()]));
        let ctl = controller(&mock);
        ctl.upload(jpeg("a.jpg"));

        let first = match ctl.trigger_process().await {
            AttemptOutcome::Succeeded { result, .. } => result,
            other => panic!("expected success, got {:?}", other),
        };
        let second = match ctl.trigger_process().await {
            AttemptOutcome::Succeeded { result, .. } => result,
            other => panic!("expected success, got {:?}", other),
        };

        assert!(!ctl.refs().is_live(&first));
        assert_eq!(ctl.state().result_ref, Some(second));
        assert_eq!(ctl.refs().live_count(), 2); // preview + latest result
    }

    #[tokio::test]
    async fn test_empty_payload_is_failure() {
        let mock = Arc::new(MockTransformer::with_responses(vec!["  ".into()]));
        let ctl = controller(&mock);
        ctl.upload(jpeg("a.jpg"));

        let outcome = ctl.trigger_process().await;
        assert!(matches!(
            outcome,
            AttemptOutcome::Failed {
                error: StudioError::EmptyPayload,
                ..
            }
        ));
        assert!(ctl.state().result_ref.is_none());
        assert!(ctl.state().last_error.is_some());
    }

    #[tokio::test]
    async fn test_non_base64_payload_is_remote_failure() {
        let mock = Arc::new(MockTransformer::with_responses(vec![
            "<html>not an image</html>".into()
        ]));
        let ctl = controller(&mock);
        ctl.upload(jpeg("a.jpg"));

        let outcome = ctl.trigger_process().await;

        let error = match outcome {
            AttemptOutcome::Failed { error, .. } => error,
            other => panic!("expected failure, got {:?}", other),
        };
        assert!(matches!(error, StudioError::Remote { .. }));
        let state = ctl.state();
        assert!(state.result_ref.is_none());
        assert!(state
            .last_error
            .as_deref()
            .unwrap()
            .starts_with("Image service returned an unusable image"));
        assert_eq!(ctl.refs().live_count(), 1);
    }

    #[tokio::test]
    async fn test_into_result_maps_every_outcome() {
        let mock = Arc::new(MockTransformer::new());
        let ctl = controller(&mock);

        let rejected = ctl.trigger_process().await.into_result().unwrap_err();
        assert!(matches!(rejected, StudioError::Validation { .. }));

        ctl.upload(jpeg("a.jpg"));
        let image = ctl.trigger_process().await.into_result().unwrap();
        assert_eq!(ctl.state().result_ref, Some(image));

        assert!(matches!(
            AttemptOutcome::Busy.into_result(),
            Err(StudioError::AttemptInProgress)
        ));
        let stale = AttemptOutcome::Stale { generation: 3 }.into_result().unwrap_err();
        assert_eq!(stale.code(), "STUDIO-021");
        assert!(stale.user_message().contains("newer upload"));
    }

    #[tokio::test]
    async fn test_busy_while_processing() {
        let mock = Arc::new(MockTransformer::new().gated());
        let ctl = controller(&mock);
        ctl.upload(jpeg("a.jpg"));

        let running = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.trigger_process().await }
        });
        mock.wait_for_calls(1).await;

        assert!(!ctl.can_process());
        assert!(matches!(ctl.trigger_process().await, AttemptOutcome::Busy));
        assert_eq!(mock.call_count(), 1);

        mock.release(1);
        assert!(running.await.unwrap().is_success());
        assert!(ctl.can_process());
    }

    #[tokio::test]
    async fn test_teardown_releases_everything_and_discards_in_flight() {
        let mock = Arc::new(MockTransformer::new().gated());
        let ctl = controller(&mock);
        ctl.upload(jpeg("a.jpg"));

        let running = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.trigger_process().await }
        });
        mock.wait_for_calls(1).await;

        ctl.teardown();
        mock.release(1);

        assert!(matches!(running.await.unwrap(), AttemptOutcome::Stale { .. }));
        assert_eq!(ctl.refs().live_count(), 0);
        assert_eq!(ctl.state(), WorkflowState::default());
    }

    #[tokio::test]
    async fn test_subscribers_see_processing_transition() {
        let mock = Arc::new(MockTransformer::new());
        let ctl = controller(&mock);
        let mut rx = ctl.subscribe();

        ctl.upload(jpeg("a.jpg"));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().has_source);

        ctl.trigger_process().await;
        let state = rx.borrow_and_update().clone();
        assert!(!state.is_processing);
        assert!(state.result_ref.is_some());
    }
}
