//! Lifecycle of a crawl session
use crate::state::StateMachine;
use serde::Serialize;
use std::fmt;

/// Represents the current state of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BotState {
    // ===== Active States =====
    WaitingForInitialization,
    WaitingToRun,
    Running,
    Paused,
    WaitingForStop,

    // ===== Stopped, outcome not decided yet =====
    Completed,

    // ===== Terminal States =====
    RanToCompletion,
    Cancelled,
    Faulted,
}

/// Commands accepted by the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BotCommand {
    Initialize,
    Run,
    Abort,
    Pause,
    Resume,
    Stop,
    MarkAsRanToCompletion,
    MarkAsCancelled,
    MarkAsFaulted,
}

impl BotState {
    /// Returns true once the session can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RanToCompletion | Self::Cancelled | Self::Faulted)
    }
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Builds the session state machine, starting in `WaitingForInitialization`
pub fn bot_state_machine() -> StateMachine<BotState, BotCommand> {
    use BotCommand::*;
    use BotState::*;

    StateMachine::new(
        [
            ((WaitingForInitialization, Stop), Completed),
            ((WaitingForInitialization, Initialize), WaitingToRun),
            ((WaitingToRun, Run), Running),
            ((WaitingToRun, Abort), WaitingForStop),
            ((WaitingForStop, Stop), Completed),
            ((Running, Stop), Completed),
            ((Running, Pause), Paused),
            ((Paused, Resume), Running),
            ((Paused, Stop), Completed),
            ((Completed, MarkAsRanToCompletion), RanToCompletion),
            ((Completed, MarkAsCancelled), Cancelled),
            ((Completed, MarkAsFaulted), Faulted),
        ],
        WaitingForInitialization,
    )
}
