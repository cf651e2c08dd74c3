//! CP scheduling formulation and KPI evaluation.
//!
//! `ScheduleCpBuilder` turns tasks and resources into an interval model and
//! decodes solver output into a `Schedule`. `ScheduleKpi` summarises the
//! result.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

mod builder;
mod kpi;

pub use builder::ScheduleCpBuilder;
pub use kpi::ScheduleKpi;
