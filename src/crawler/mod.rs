//! Crawler module: the coordination engine and its pipeline stages
//!
//! This module contains the core crawling logic, including:
//! - Workload accounting and URL deduplication
//! - Bounded work queues gated by the crawler state
//! - The coordinator, single serialization point of a crawl
//! - Verification, rendering and extraction worker pools
//! - HTTP and HTML implementations of the stage collaborators

mod coordinator;
mod fetcher;
mod id_generator;
mod memory;
mod parser;
mod pipeline;
mod register;
mod statistics;
mod traits;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, HttpRenderer, HttpVerifier};
pub use id_generator::IdGenerator;
pub use memory::{HtmlDocument, Memory, MemoryError, RenderedResource, DEFAULT_QUEUE_CAPACITY};
pub use parser::AnchorExtractor;
pub use pipeline::{Pipeline, StageContext};
pub use register::ProcessedUrlRegister;
pub use statistics::{Statistics, StatisticsError, StatisticsSnapshot};
pub use traits::{Collaborators, Extractor, Renderer, Verifier};
