//! Application services.
//!
//! `TopicService` is the only entry point that mutates domain state; its
//! commands are split across the files below by entity level.

mod assignment_commands;
mod child_commands;
mod progress_commands;
mod topic_commands;
pub mod topic_service;
mod version_gate;

pub use topic_service::{FetchReport, GoalPath, TaskPath, TopicService};
