//! Integration tests for Linkscout
//!
//! Each module stands up its own wiremock site.

mod config_tests;
mod crawl_tests;
