//! Taskify Library
//!
//! Per-user task lists with tags, due dates, subtasks, dependencies and
//! time tracking, kept in sync with a document store's change feed.
//! This module exports the core components for testing and integration.

pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod format;
pub mod identity;
pub mod logging;
pub mod manager;
pub mod session;
pub mod store;
pub mod types;
