//! The three formulations.
//!
//! | Problem | Class | Engine |
//! |---------|-------|--------|
//! | [`location`] | MIP | [`crate::lp`] (`good_lp` + `microlp`) |
//! | [`production`] | LP | [`crate::lp`] (`good_lp` + `microlp`) |
//! | [`assembly`] | CP | [`crate::cp::PumpkinSolver`] via [`crate::scheduler`] |
//!
//! Each problem has a `reference()` instance, deserializes from JSON, and
//! returns a plan whose `Display` is the printed report.

pub mod assembly;
pub mod location;
pub mod production;

pub use assembly::{AssemblyPlan, AssemblyProblem};
pub use location::{LocationPlan, LocationProblem};
pub use production::{ProductionPlan, ProductionProblem};

/// Formats a report amount, dropping solver round-off. Whole amounts keep
/// one decimal (`3000.0`).
pub(crate) fn format_amount(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    // Avoid printing "-0".
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    if rounded.fract() == 0.0 {
        format!("{rounded:.1}")
    } else {
        format!("{rounded}")
    }
}
