//! Lifecycle of the coordinated workflow
use crate::state::StateMachine;
use serde::Serialize;

/// Whether the workflow has been seeded with its start URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WorkflowState {
    WaitingForActivation,
    Activated,
}

/// Commands accepted by the workflow state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowCommand {
    Activate,
    /// Only used to roll back a failed activation
    Deactivate,
}

/// Builds the workflow state machine, starting in `WaitingForActivation`
pub fn workflow_state_machine() -> StateMachine<WorkflowState, WorkflowCommand> {
    StateMachine::new(
        [
            (
                (WorkflowState::WaitingForActivation, WorkflowCommand::Activate),
                WorkflowState::Activated,
            ),
            (
                (WorkflowState::Activated, WorkflowCommand::Deactivate),
                WorkflowState::WaitingForActivation,
            ),
        ],
        WorkflowState::WaitingForActivation,
    )
}
