use crate::crawler::StatisticsSnapshot;
use crate::model::{Resource, StatusCode};
use crate::state::BotState;
use serde::Serialize;

/// Typed notification emitted while a crawl runs
///
/// Consumers must observe events in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    StartProgressReport {
        message: String,
    },
    StopProgressReport {
        message: String,
    },
    WorkingProgressReport {
        remaining_workload: u64,
        verified_url_count: u64,
        valid_url_count: u64,
        broken_url_count: u64,
    },
    ResourceProcessed {
        remaining_workload: u64,
    },
    /// A processed resource turned out broken
    BrokenLinkFound {
        url: String,
        status_code: StatusCode,
        /// Page the link was found on, none for the start URL
        parent_url: Option<String>,
    },
    RedirectHappenedAtStartUrl {
        final_url: String,
    },
    NoMoreWorkToDo,
    WorkflowActivated,
    WorkflowCompleted {
        final_state: BotState,
    },
}

impl Event {
    pub fn start_progress(message: impl Into<String>) -> Self {
        Self::StartProgressReport {
            message: message.into(),
        }
    }

    pub fn stop_progress(message: impl Into<String>) -> Self {
        Self::StopProgressReport {
            message: message.into(),
        }
    }

    /// Progress report built from a statistics snapshot
    pub fn working_progress(snapshot: StatisticsSnapshot) -> Self {
        Self::WorkingProgressReport {
            remaining_workload: snapshot.remaining_workload,
            verified_url_count: snapshot.verified_url_count,
            valid_url_count: snapshot.valid_url_count,
            broken_url_count: snapshot.broken_url_count,
        }
    }

    pub fn broken_link(resource: &Resource) -> Self {
        Self::BrokenLinkFound {
            url: resource.dedup_key().to_string(),
            status_code: resource.status_code,
            parent_url: resource.parent_uri().map(|uri| uri.to_string()),
        }
    }

    /// Human readable message carried by progress events
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::StartProgressReport { message } | Self::StopProgressReport { message } => {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}
