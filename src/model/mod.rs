//! Data model shared by every pipeline stage
//!
//! - `Resource`: a discovered URL and its crawl metadata
//! - `ProcessingResult`: what a stage hands back to the coordinator
//! - `Event`: ordered notifications for loggers and front ends
//! - `StatusCode`: parse-time and HTTP outcome of a resource

mod event;
mod processing_result;
mod resource;
mod status_code;

pub use event::Event;
pub use processing_result::ProcessingResult;
pub use resource::{Resource, ResourceType};
pub use status_code::StatusCode;
