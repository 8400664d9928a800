//! Performance accumulator.
//!
//! Translates a cafe's status and size tier into deltas against a month's
//! counters, then re-runs the compensation engine on the result. Deltas are
//! strictly additive; a status transition is handled by the caller as
//! "reverse the old state, add the new state", never as a direct diff, so
//! Add followed by Reverse of the same cafe state is an exact no-op.
//!
//! `recompute_month_from_cafes` is the consistency backstop: it rebuilds a
//! month's counters by scanning the cafes created in that month instead of
//! trusting the incrementally-maintained row.

use crate::db::TrackerDb;
use crate::error::TrackerError;
use crate::salary::compute_compensation;
use crate::types::{Cafe, KpiSettings, MonthlyPerformance, PerformanceCounts};

/// Whether a cafe's contribution is being added or reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaDirection {
    Add,
    Reverse,
}

impl DeltaDirection {
    fn factor(self) -> i64 {
        match self {
            Self::Add => 1,
            Self::Reverse => -1,
        }
    }
}

/// Fetch the month row, lazily creating it seeded to zero counts and a
/// base-salary-only total.
pub fn get_or_create_month(
    db: &TrackerDb,
    settings: &KpiSettings,
    year: i32,
    month: u32,
) -> Result<MonthlyPerformance, TrackerError> {
    if let Some(performance) = db.get_month(year, month)? {
        return Ok(performance);
    }

    let counts = PerformanceCounts::default();
    let compensation = compute_compensation(&counts, settings);
    let performance = MonthlyPerformance {
        year,
        month,
        counts,
        base_salary: compensation.base_salary,
        kpi_bonus: compensation.kpi_bonus,
        total_salary: compensation.total_salary,
    };
    db.insert_month(&performance)?;
    log::debug!("Created performance row for {year}-{month:02}");
    Ok(performance)
}

/// Apply one cafe's contribution to the given month and recompute its salary.
///
/// Visited and contracted cafes each count one visit for their size tier;
/// contracted cafes additionally count one contract. Pending cafes contribute
/// nothing, but the salary is still recomputed so a settings change that
/// preceded this call lands in the row.
pub fn apply_cafe_delta(
    db: &TrackerDb,
    settings: &KpiSettings,
    cafe: &Cafe,
    direction: DeltaDirection,
    year: i32,
    month: u32,
) -> Result<MonthlyPerformance, TrackerError> {
    let size = cafe.size();
    let factor = direction.factor();
    let mut performance = get_or_create_month(db, settings, year, month)?;

    if cafe.status.counts_as_visit() {
        performance.counts.bump_visit(size, factor);
    }
    if cafe.status.counts_as_contract() {
        performance.counts.bump_contract(size, factor);
    }

    performance.apply(compute_compensation(&performance.counts, settings));
    db.update_month(&performance)?;
    Ok(performance)
}

/// Re-run the engine on a month's existing counters, e.g. after a settings
/// change.
pub fn recompute_month(
    db: &TrackerDb,
    settings: &KpiSettings,
    year: i32,
    month: u32,
) -> Result<MonthlyPerformance, TrackerError> {
    let mut performance = get_or_create_month(db, settings, year, month)?;
    performance.apply(compute_compensation(&performance.counts, settings));
    db.update_month(&performance)?;
    Ok(performance)
}

/// Rebuild a month's counters from the cafes created in that month.
///
/// The incremental path attributes every delta to the month the mutation
/// happened in, so a cafe edited months after creation can drift the two
/// views apart. This recompute is authoritative for "counts by creation
/// month" and exists to reconcile such drift.
pub fn recompute_month_from_cafes(
    db: &TrackerDb,
    settings: &KpiSettings,
    year: i32,
    month: u32,
) -> Result<MonthlyPerformance, TrackerError> {
    let mut counts = PerformanceCounts::default();
    for cafe in db.cafes_created_in(year, month)? {
        if cafe.status.counts_as_visit() {
            counts.bump_visit(cafe.size(), 1);
        }
        if cafe.status.counts_as_contract() {
            counts.bump_contract(cafe.size(), 1);
        }
    }

    let mut performance = get_or_create_month(db, settings, year, month)?;
    performance.counts = counts;
    performance.apply(compute_compensation(&counts, settings));
    db.update_month(&performance)?;
    Ok(performance)
}
