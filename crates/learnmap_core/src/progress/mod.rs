//! Progress / action recorder.
//!
//! Everything here is a pure function of a task's action log plus a calendar
//! day supplied by the caller. Persisting an edit is the service's job.

pub mod cycle;
pub mod recorder;
pub mod streak;

pub use cycle::CycleWindow;
pub use recorder::{LogEdit, TaskProgress};
