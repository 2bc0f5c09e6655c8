//! State module for the crawl lifecycles
//!
//! # Components
//!
//! - `StateMachine`: transition-table automaton shared by every lifecycle
//! - `WorkflowState`: whether the coordinator has been seeded
//! - `BotState`: lifecycle of a whole crawl session
//! - `CrawlerState`: admission gate of the work queues

mod bot_state;
mod crawler_state;
mod machine;
mod workflow_state;

// Re-export main types
pub use bot_state::{bot_state_machine, BotCommand, BotState};
pub use crawler_state::{crawler_state_machine, CrawlerCommand, CrawlerState};
pub use machine::{log_transition_failure, StateMachine, Transit};
pub use workflow_state::{workflow_state_machine, WorkflowCommand, WorkflowState};
