//! KPI compensation engine.
//!
//! Pure function from a month's counters plus the active settings to the
//! salary breakdown. Always recomputed from scratch when either input
//! changes; nothing in here is patched incrementally.
//!
//! The two bonus sides are deliberately asymmetric: the contract bonus is
//! capped at its share of the bonus pool, the visit bonus is not, so
//! over-target visit performance pays out beyond the nominal share. That is
//! the agreed compensation policy, not an oversight.

use crate::types::{Compensation, KpiSettings, PerformanceCounts};

/// Round half-up, matching how the payroll sheet rounds (2.5 -> 3).
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Completion percentage, with empty targets reading as 0% rather than
/// dividing by zero.
fn completion_pct(achieved: i64, target: i64) -> f64 {
    if target > 0 {
        achieved as f64 / target as f64 * 100.0
    } else {
        0.0
    }
}

/// Compute base salary, KPI bonus, and total salary for one month.
///
/// Thresholds are inclusive: hitting the threshold exactly pays the bonus.
pub fn compute_compensation(counts: &PerformanceCounts, settings: &KpiSettings) -> Compensation {
    let base_salary = round_half_up(
        settings.total_target_salary as f64 * settings.base_salary_percentage as f64 / 100.0,
    );

    // Everything above the base is the pool the two KPI sides draw from.
    let bonus_pool = (settings.total_target_salary - base_salary) as f64;

    // Visit side: proportional to completion, gated but uncapped.
    let visit_targets =
        settings.target_large_visit + settings.target_medium_visit + settings.target_small_visit;
    let visit_pct = completion_pct(counts.total_visits(), visit_targets);
    let visit_portion = bonus_pool * settings.visit_kpi_percentage as f64 / 100.0;
    let visit_bonus = if visit_pct >= settings.visit_threshold as f64 {
        round_half_up(visit_portion * visit_pct / 100.0)
    } else {
        0
    };

    // Contract side: per-contract flat bonuses, gated and capped at the
    // contract share of the pool.
    let contract_targets = settings.target_large_contract
        + settings.target_medium_contract
        + settings.target_small_contract;
    let contract_pct = completion_pct(counts.total_contracts(), contract_targets);
    let raw_contract_bonus = counts.large_contracts * settings.large_cafe_bonus
        + counts.medium_contracts * settings.medium_cafe_bonus
        + counts.small_contracts * settings.small_cafe_bonus;
    let contract_portion = bonus_pool * settings.contract_kpi_percentage as f64 / 100.0;
    let contract_bonus = if contract_pct >= settings.contract_threshold as f64 {
        round_half_up((raw_contract_bonus as f64).min(contract_portion))
    } else {
        0
    };

    let kpi_bonus = visit_bonus + contract_bonus;
    Compensation {
        base_salary,
        kpi_bonus,
        total_salary: base_salary + kpi_bonus,
    }
}
