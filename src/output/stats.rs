//! Crawl summary built from the event stream
//!
//! The summary follows the last `WorkingProgressReport` and the terminal
//! `WorkflowCompleted` event, so it can be fed by an event subscriber.

use crate::model::{Event, StatusCode};
use crate::state::BotState;

/// A broken link, as reported during the crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    pub url: String,
    pub status_code: StatusCode,
    pub parent_url: Option<String>,
}

/// Final figures of a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Terminal state, once the crawl is over
    pub final_state: Option<BotState>,

    /// Resources discovered but never processed
    pub remaining_workload: u64,

    pub verified_url_count: u64,
    pub valid_url_count: u64,
    pub broken_url_count: u64,

    /// Final URL when the crawl aborted on a redirected start URL
    pub start_url_redirect: Option<String>,

    /// Broken links in the order they were found
    pub broken_links: Vec<BrokenLink>,
}

impl CrawlSummary {
    /// Updates the summary with one event
    pub fn record(&mut self, event: &Event) {
        match event {
            Event::WorkingProgressReport {
                remaining_workload,
                verified_url_count,
                valid_url_count,
                broken_url_count,
            } => {
                self.remaining_workload = *remaining_workload;
                self.verified_url_count = *verified_url_count;
                self.valid_url_count = *valid_url_count;
                self.broken_url_count = *broken_url_count;
            }
            Event::BrokenLinkFound {
                url,
                status_code,
                parent_url,
            } => self.broken_links.push(BrokenLink {
                url: url.clone(),
                status_code: *status_code,
                parent_url: parent_url.clone(),
            }),
            Event::RedirectHappenedAtStartUrl { final_url } => {
                self.start_url_redirect = Some(final_url.clone());
            }
            Event::WorkflowCompleted { final_state } => self.final_state = Some(*final_state),
            _ => {}
        }
    }

    /// Share of verified resources found broken, in percent
    pub fn broken_rate(&self) -> f64 {
        if self.verified_url_count == 0 {
            0.0
        } else {
            (self.broken_url_count as f64 / self.verified_url_count as f64) * 100.0
        }
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    match summary.final_state {
        Some(state) => println!("Final state: {}", state),
        None => println!("Final state: unknown (crawl did not complete)"),
    }
    if let Some(final_url) = &summary.start_url_redirect {
        println!("Start URL redirected to: {}", final_url);
    }
    println!();

    println!("Resources:");
    println!("  Verified: {}", summary.verified_url_count);
    println!("  Valid: {}", summary.valid_url_count);
    println!(
        "  Broken: {} ({:.1}%)",
        summary.broken_url_count,
        summary.broken_rate()
    );
    if summary.remaining_workload > 0 {
        println!("  Left unprocessed: {}", summary.remaining_workload);
    }

    if !summary.broken_links.is_empty() {
        println!("\nBroken links:");
        for link in &summary.broken_links {
            match &link.parent_url {
                Some(parent) => println!("  [{}] {} (on {})", link.status_code, link.url, parent),
                None => println!("  [{}] {}", link.status_code, link.url),
            }
        }
    }
}
