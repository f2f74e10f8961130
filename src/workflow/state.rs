//! Observable workflow state
//!
//! [`WorkflowState`] is the read-only snapshot a presentation layer renders.
//! Only the controller produces new snapshots.

use crate::instruction::BackgroundOption;
use crate::reference::ImageRef;

/// Where the session stands, derived from the state fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing uploaded yet, or uploaded and not processed
    Idle,
    Processing,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    /// An upload is present
    pub has_source: bool,
    /// Handle to the raw upload, set as soon as it arrives
    pub preview_ref: Option<ImageRef>,
    /// Handle to the transformed image of the last successful attempt
    pub result_ref: Option<ImageRef>,
    pub selected_option: BackgroundOption,
    pub is_processing: bool,
    /// Display string of the last failure
    pub last_error: Option<String>,
}

impl WorkflowState {
    /// Fresh session state with `option` preselected
    pub fn new(option: BackgroundOption) -> Self {
        Self {
            has_source: false,
            preview_ref: None,
            result_ref: None,
            selected_option: option,
            is_processing: false,
            last_error: None,
        }
    }

    /// Processing may be triggered: a source is present and nothing is running
    pub fn can_process(&self) -> bool {
        self.has_source && !self.is_processing
    }

    pub fn phase(&self) -> Phase {
        if self.is_processing {
            Phase::Processing
        } else if self.result_ref.is_some() {
            Phase::Succeeded
        } else if self.last_error.is_some() {
            Phase::Failed
        } else {
            Phase::Idle
        }
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new(BackgroundOption::default())
    }
}
