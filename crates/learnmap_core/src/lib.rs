//! Client-side domain state for LearnMap.
//! Keeps the Topic → Goal → Task hierarchy consistent, synchronizes it under
//! optimistic concurrency, and derives progress numbers on demand.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod progress;
pub mod repo;
pub mod service;
pub mod stats;
pub mod sync;

pub use clock::{CalendarPolicy, Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use error::{CoreError, CoreResult, EntityKind, ValidationError};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::goal::{Goal, GoalDraft, GoalId, GoalStatus};
pub use model::task::{
    ActionType, CycleConfig, CycleType, Task, TaskAction, TaskConfig, TaskDraft, TaskId, TaskStatus,
    TaskType,
};
pub use model::topic::{Topic, TopicDraft, TopicId, TopicStatus};
pub use model::user::{Permission, User, UserId, UserRef, UserRole};
pub use model::Priority;
pub use progress::TaskProgress;
pub use repo::{LinkIssue, Stores};
pub use service::{FetchReport, GoalPath, TaskPath, TopicService};
pub use stats::WeeklyStats;
pub use sync::memory_remote::MemoryRemote;
pub use sync::remote::{Mutation, RemoteError, RemoteErrorKind, RemoteSource, UserSource};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
