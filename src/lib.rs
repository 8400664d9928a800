//! Sales-rep performance and KPI salary tracking for horeca venues.
//!
//! Tracks site visits and signed contracts per cafe, rolls them up into
//! per-month counters by size tier, and computes the monthly salary (base
//! plus threshold-gated KPI bonus) from configurable targets. The
//! [`tracker::SalaryTracker`] facade is the public entry point; the salary
//! math itself lives in [`salary`] as a pure function.

pub mod activity;
pub mod db;
pub mod error;
mod migrations;
pub mod performance;
pub mod salary;
pub mod tracker;
pub mod types;

pub use error::TrackerError;
pub use tracker::SalaryTracker;
