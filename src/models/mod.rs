//! Scheduling domain models.
//!
//! Provides the data types for the assembly scheduling problem and its
//! solutions. Times are integer units from a common origin (t=0).
//!
//! # Domain Mappings
//!
//! | u-formulate | Computer assembly |
//! |-------------|-------------------|
//! | Task | One physical unit of a model |
//! | Activity | Assembly step |
//! | Resource | Station |
//! | Schedule | Line plan |

mod activity;
mod resource;
mod schedule;
mod task;

pub use activity::Activity;
pub use resource::Resource;
pub use schedule::{Assignment, Schedule, Violation, ViolationType};
pub use task::Task;
