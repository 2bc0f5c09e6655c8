//! Output module for reporting crawl progress and results
//!
//! This module handles:
//! - Logging bot events at a level matching their importance
//! - Rendering events as JSON lines
//! - Collecting and printing the final crawl summary

pub mod stats;

pub use stats::{print_summary, BrokenLink, CrawlSummary};

use crate::model::Event;
use tracing::{debug, error, info, trace};

/// Logs one event
///
/// Per-resource events stay below info; broken links and progress reports
/// carrying a message are already logged where they are emitted.
pub fn log_event(event: &Event) {
    match event {
        Event::StartProgressReport { .. } | Event::StopProgressReport { .. } => {}
        Event::WorkingProgressReport {
            remaining_workload,
            verified_url_count,
            valid_url_count,
            broken_url_count,
        } => info!(
            remaining = remaining_workload,
            verified = verified_url_count,
            valid = valid_url_count,
            broken = broken_url_count,
            "Progress"
        ),
        Event::ResourceProcessed { remaining_workload } => {
            trace!(remaining = remaining_workload, "Resource processed")
        }
        Event::BrokenLinkFound { url, .. } => debug!(url = %url, "Broken link reported"),
        Event::RedirectHappenedAtStartUrl { final_url } => {
            error!(final_url = %final_url, "Start URL redirected")
        }
        Event::NoMoreWorkToDo => info!("Every discovered resource has been processed"),
        Event::WorkflowActivated => info!("Crawl started"),
        Event::WorkflowCompleted { final_state } => {
            info!(final_state = %final_state, "Crawl finished")
        }
    }
}

/// Serializes an event as a single JSON line
pub fn to_json_line(event: &Event) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BotState;

    #[test]
    fn test_to_json_line() {
        let line = to_json_line(&Event::WorkingProgressReport {
            remaining_workload: 2,
            verified_url_count: 5,
            valid_url_count: 4,
            broken_url_count: 1,
        })
        .unwrap();

        assert!(!line.contains('\n'));
        assert!(line.starts_with(r#"{"type":"WorkingProgressReport""#));
        assert!(line.contains(r#""broken_url_count":1"#));
    }

    #[test]
    fn test_log_event_accepts_every_variant() {
        for event in [
            Event::start_progress("Starting"),
            Event::NoMoreWorkToDo,
            Event::WorkflowActivated,
            Event::ResourceProcessed {
                remaining_workload: 0,
            },
            Event::BrokenLinkFound {
                url: "http://example.com/gone".to_string(),
                status_code: crate::model::StatusCode::Unreachable,
                parent_url: None,
            },
            Event::WorkflowCompleted {
                final_state: BotState::Faulted,
            },
        ] {
            log_event(&event);
        }
    }
}
