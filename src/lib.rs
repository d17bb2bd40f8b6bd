//! PR reviewer assignment service.
//!
//! Keeps a roster of teams and users, assigns up to two active teammates as
//! reviewers when a pull request is opened, supports reassigning a single
//! reviewer and merging, and reports per-reviewer assignment counts. All
//! state lives in SQLite and is served over a JSON HTTP API.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
