//! Internly - job posting scraper and Discord distributor
//!
//! Scrapes job boards and structured listing feeds, stores each posting
//! once, and delivers new postings to guild channels and user
//! subscriptions without ever sending the same posting twice.

#![allow(missing_docs)]

pub mod app;
pub mod app_info;
pub mod boot;
pub mod cli;
pub mod commands;
pub mod config;
pub mod database;
pub mod destinations;
pub mod distribution;
pub mod duration;
pub mod environment;
pub mod ingest;
pub mod notifier;
pub mod schedulers;
pub mod setup_tracing;
pub mod sources;
pub mod task_pool;

#[cfg(any(test, feature = "test-utils"))]
pub mod tests;
