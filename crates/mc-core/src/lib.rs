//! Read-only aggregation core for the OpenClaw mission-control dashboard.
//!
//! Task records are loose JSON files written by agents. This crate loads
//! them defensively, normalizes them into [`types::TaskRecord`], and derives
//! the dashboard views: status counts, token usage, the activity feed and the
//! agent roster.

pub mod config;
pub mod dashboard;
pub mod feed;
pub mod normalize;
pub mod roster;
pub mod settings;
pub mod stats;
pub mod task_store;
pub mod types;
