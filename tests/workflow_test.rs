//! End-to-end workflow tests against the mock transformer
//!
//! Covers the upload → process → present pipeline: readiness, the
//! success/failure exclusivity of result and error, and discarding of
//! completions that arrive after a newer upload.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use studio_shot::event::EventKind;
use studio_shot::util::NO_SOURCE_MESSAGE;
use studio_shot::{
    build_instruction, AttemptOutcome, BackgroundOption, MockTransformer, Phase,
    RemoteTransformer, UploadedFile, WorkflowController,
};

// =============================================================================
// HELPERS
// =============================================================================

fn setup(mock: MockTransformer) -> (Arc<MockTransformer>, WorkflowController) {
    let mock = Arc::new(mock);
    let controller = WorkflowController::new(Arc::clone(&mock) as Arc<dyn RemoteTransformer>);
    (mock, controller)
}

fn jpeg(name: &str, content: &[u8]) -> UploadedFile {
    UploadedFile::from_bytes(name, "image/jpeg", content.to_vec())
}

/// Start an attempt on a background task and wait until it is suspended
/// inside the (gated) transformer
async fn start_suspended(
    controller: &WorkflowController,
    mock: &MockTransformer,
    calls_before: usize,
) -> tokio::task::JoinHandle<AttemptOutcome> {
    let handle = tokio::spawn({
        let controller = controller.clone();
        async move { controller.trigger_process().await }
    });
    mock.wait_for_calls(calls_before + 1).await;
    handle
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[tokio::test]
async fn scenario_a_white_background_success() {
    let (mock, controller) = setup(MockTransformer::with_responses(vec!["Zm9v".into()]));

    controller.upload(jpeg("shoe.jpg", b"\xFF\xD8\xFFjpeg"));
    controller.select_option(BackgroundOption::White);
    let outcome = controller.trigger_process().await;

    assert!(outcome.is_success());
    let state = controller.state();
    assert_eq!(
        state.result_ref.as_ref().map(|r| r.uri()),
        Some("data:image/png;base64,Zm9v".to_string())
    );
    assert_eq!(state.last_error, None);
    assert!(!state.is_processing);
    assert_eq!(state.phase(), Phase::Succeeded);

    let request = mock.last_request().unwrap();
    assert_eq!(request.mime_type, "image/jpeg");
    assert_eq!(request.instruction, build_instruction(BackgroundOption::White));
    assert_eq!(request.payload, "/9j/anBlZw==");
}

#[tokio::test]
async fn scenario_b_process_without_upload() {
    let (mock, controller) = setup(MockTransformer::new());

    let outcome = controller.trigger_process().await;

    assert!(matches!(outcome, AttemptOutcome::Rejected { .. }));
    assert_eq!(controller.state().last_error.as_deref(), Some("Please upload an image first."));
    assert!(!controller.state().is_processing);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn scenario_c_remote_failure_message_is_surfaced() {
    let mock = MockTransformer::new();
    mock.queue_failure("quota exceeded");
    let (_mock, controller) = setup(mock);

    controller.upload(jpeg("a.jpg", b"data"));
    let outcome = controller.trigger_process().await;

    assert!(matches!(outcome, AttemptOutcome::Failed { .. }));
    let state = controller.state();
    assert_eq!(state.last_error.as_deref(), Some("quota exceeded"));
    assert!(state.result_ref.is_none());
    assert!(!state.is_processing);
    assert_eq!(state.phase(), Phase::Failed);
}

#[tokio::test]
async fn scenario_d_upload_during_attempt_discards_stale_result() {
    let (mock, controller) = setup(
        MockTransformer::with_responses(vec!["QQ==".into(), "Qg==".into()]).gated(),
    );

    controller.upload(jpeg("a.jpg", b"A"));
    let attempt_a = start_suspended(&controller, &mock, 0).await;
    assert!(controller.state().is_processing);

    let preview_b = controller.upload(jpeg("b.jpg", b"B"));
    assert!(!controller.state().is_processing);
    assert!(controller.can_process());

    mock.release(1);
    let outcome = attempt_a.await.unwrap();

    assert!(matches!(outcome, AttemptOutcome::Stale { .. }));
    let state = controller.state();
    assert_eq!(state.preview_ref, Some(preview_b));
    assert!(state.result_ref.is_none());
    assert!(state.last_error.is_none());
    assert!(!state.is_processing);
    // Only B's preview is live; A's result was never allocated
    assert_eq!(controller.refs().live_count(), 1);
}

// =============================================================================
// PROPERTIES
// =============================================================================

#[tokio::test]
async fn no_upload_never_reaches_encoder_or_transformer() {
    let (mock, controller) = setup(MockTransformer::new());

    for _ in 0..3 {
        controller.trigger_process().await;
    }

    assert_eq!(mock.call_count(), 0);
    assert_eq!(controller.state().last_error.as_deref(), Some(NO_SOURCE_MESSAGE));
    assert!(controller
        .events()
        .iter()
        .all(|e| matches!(e.kind, EventKind::AttemptRejected { .. })));
}

#[tokio::test]
async fn exactly_one_of_result_or_error_after_each_attempt() {
    let mock = MockTransformer::new();
    mock.queue_response("Zm9v");
    mock.queue_failure("boom");
    mock.queue_failure("");
    mock.queue_response("YmFy");
    let (_mock, controller) = setup(mock);

    for option in [
        BackgroundOption::White,
        BackgroundOption::Original,
        BackgroundOption::White,
        BackgroundOption::Original,
    ] {
        controller.upload(jpeg("a.jpg", b"x"));
        controller.select_option(option);
        controller.trigger_process().await;

        let state = controller.state();
        assert!(
            state.result_ref.is_some() ^ state.last_error.is_some(),
            "result and error must be exclusive: {:?}",
            state
        );
    }
}

#[tokio::test]
async fn blank_remote_message_falls_back_to_generic() {
    let mock = MockTransformer::new();
    mock.queue_failure("   ");
    let (_mock, controller) = setup(mock);

    controller.upload(jpeg("a.jpg", b"x"));
    controller.trigger_process().await;

    assert_eq!(
        controller.state().last_error.as_deref(),
        Some(studio_shot::util::GENERIC_ERROR_MESSAGE)
    );
}

#[tokio::test]
async fn read_failure_is_reported_without_remote_call() {
    let dir = tempfile::TempDir::new().unwrap();
    let (mock, controller) = setup(MockTransformer::new());

    let missing = UploadedFile::from_path(dir.path().join("gone.png")).unwrap();
    controller.upload(missing);
    let outcome = controller.trigger_process().await;

    assert!(matches!(outcome, AttemptOutcome::Failed { .. }));
    assert!(controller.state().last_error.is_some());
    assert!(controller.state().result_ref.is_none());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn can_process_tracks_source_and_processing() {
    let (mock, controller) = setup(MockTransformer::new().gated());
    assert!(!controller.can_process());

    controller.upload(jpeg("a.jpg", b"x"));
    assert!(controller.can_process());

    let attempt = start_suspended(&controller, &mock, 0).await;
    assert!(controller.state().is_processing);
    assert!(!controller.can_process());

    mock.release(1);
    attempt.await.unwrap();
    assert!(controller.can_process());
}

#[tokio::test]
async fn aborted_attempt_does_not_leave_session_processing() {
    let (mock, controller) = setup(
        MockTransformer::with_responses(vec!["QQ==".into(), "Qg==".into()]).gated(),
    );

    controller.upload(jpeg("a.jpg", b"A"));
    let attempt = start_suspended(&controller, &mock, 0).await;
    assert!(!controller.can_process());

    attempt.abort();
    assert!(attempt.await.unwrap_err().is_cancelled());

    let state = controller.state();
    assert!(!state.is_processing);
    assert!(state.result_ref.is_none());
    assert!(state.last_error.is_none());
    assert!(controller.can_process());
    assert!(controller
        .events()
        .iter()
        .any(|e| matches!(e.kind, EventKind::AttemptAbandoned { .. })));

    let retry = start_suspended(&controller, &mock, 1).await;
    mock.release(1);
    assert!(retry.await.unwrap().is_success());
    assert_eq!(
        controller.state().result_ref.map(|r| r.uri()),
        Some("data:image/png;base64,Qg==".to_string())
    );
}

#[tokio::test]
async fn failure_during_stale_attempt_is_discarded_too() {
    let mock = MockTransformer::new().gated();
    mock.queue_failure("late failure");
    let (mock, controller) = setup(mock);

    controller.upload(jpeg("a.jpg", b"A"));
    let attempt = start_suspended(&controller, &mock, 0).await;
    controller.upload(jpeg("b.jpg", b"B"));

    mock.release(1);
    assert!(matches!(attempt.await.unwrap(), AttemptOutcome::Stale { .. }));
    assert!(controller.state().last_error.is_none());
}

#[tokio::test]
async fn new_attempt_after_stale_one_wins() {
    let (mock, controller) = setup(
        MockTransformer::with_responses(vec!["QQ==".into(), "Qg==".into()]).gated(),
    );

    controller.upload(jpeg("a.jpg", b"A"));
    let attempt_a = start_suspended(&controller, &mock, 0).await;

    controller.upload(jpeg("b.jpg", b"B"));
    let attempt_b = start_suspended(&controller, &mock, 1).await;

    // Both calls are suspended; let them finish in either order
    mock.release(2);
    let (a, b) = (attempt_a.await.unwrap(), attempt_b.await.unwrap());

    assert!(matches!(a, AttemptOutcome::Stale { .. }));
    assert!(b.is_success());
    assert_eq!(
        controller.state().result_ref.map(|r| r.uri()),
        Some("data:image/png;base64,Qg==".to_string())
    );
}

#[tokio::test]
async fn option_switch_after_result_keeps_result() {
    let (mock, controller) = setup(MockTransformer::new());

    controller.upload(jpeg("a.jpg", b"x"));
    controller.trigger_process().await;
    let result = controller.state().result_ref;
    assert!(result.is_some());

    controller.select_option(BackgroundOption::Original);
    assert_eq!(controller.state().result_ref, result);

    controller.trigger_process().await;
    assert_eq!(
        mock.last_request().unwrap().instruction,
        build_instruction(BackgroundOption::Original)
    );
}

#[tokio::test]
async fn repeated_uploads_and_attempts_do_not_accumulate_handles() {
    let (_mock, controller) = setup(MockTransformer::new());

    for i in 0..10 {
        controller.upload(jpeg(&format!("{}.jpg", i), b"x"));
        controller.trigger_process().await;
        controller.trigger_process().await;
        assert_eq!(controller.refs().live_count(), 2);
    }

    controller.teardown();
    assert_eq!(controller.refs().live_count(), 0);
}

#[tokio::test]
async fn event_log_records_attempt_lifecycle() {
    let (_mock, controller) = setup(MockTransformer::new());

    controller.upload(jpeg("a.jpg", b"x"));
    let generation = match controller.trigger_process().await {
        AttemptOutcome::Succeeded { generation, .. } => generation,
        other => panic!("expected success, got {:?}", other),
    };

    let events = controller.event_log().filter_generation(generation);
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0].kind, EventKind::AttemptStarted { .. }));
    assert!(matches!(events[1].kind, EventKind::AttemptSucceeded { .. }));
}
