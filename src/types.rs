//! Domain types for cafes, KPI settings, and monthly performance.
//!
//! Everything arriving from a caller goes through a `validate()` before it is
//! persisted; the salary engine itself assumes validated inputs and never
//! range-checks.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Lifecycle status of a cafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CafeStatus {
    Pending,
    Visited,
    Contracted,
}

impl CafeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Visited => "visited",
            Self::Contracted => "contracted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "visited" => Some(Self::Visited),
            "contracted" => Some(Self::Contracted),
            _ => None,
        }
    }

    /// A visited or contracted cafe counts as one qualifying visit.
    pub fn counts_as_visit(&self) -> bool {
        matches!(self, Self::Visited | Self::Contracted)
    }

    pub fn counts_as_contract(&self) -> bool {
        matches!(self, Self::Contracted)
    }
}

impl ToSql for CafeStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for CafeStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Self::parse(text).ok_or(FromSqlError::InvalidType)
    }
}

/// Size tier of a cafe, derived from its hookah count. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CafeSize {
    Small,
    Medium,
    Large,
}

impl CafeSize {
    /// Classify a hookah count: <=3 small, 4-7 medium, >=8 large.
    ///
    /// Upstream validation guarantees counts >= 1, but zero and negative
    /// values still classify as small rather than panicking.
    pub fn from_hookah_count(hookah_count: i64) -> Self {
        if hookah_count <= 3 {
            Self::Small
        } else if hookah_count <= 7 {
            Self::Medium
        } else {
            Self::Large
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// A venue being sold to by the representative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cafe {
    pub id: i64,
    pub name: String,
    pub area: String,
    pub owner_name: String,
    pub owner_number: String,
    pub hookah_count: i64,
    pub table_count: i64,
    pub status: CafeStatus,
    pub photo_url: Option<String>,
    pub created_at: String,
}

impl Cafe {
    pub fn size(&self) -> CafeSize {
        CafeSize::from_hookah_count(self.hookah_count)
    }
}

/// Caller-supplied cafe fields for create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCafe {
    pub name: String,
    pub area: String,
    pub owner_name: String,
    pub owner_number: String,
    pub hookah_count: i64,
    pub table_count: i64,
    pub status: CafeStatus,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl NewCafe {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::invalid("name", "must not be empty"));
        }
        if self.hookah_count < 1 {
            return Err(TrackerError::invalid("hookahCount", "must be at least 1"));
        }
        if self.table_count < 0 {
            return Err(TrackerError::invalid("tableCount", "must not be negative"));
        }
        Ok(())
    }
}

/// Singleton KPI configuration driving the salary computation.
///
/// The visit/contract KPI shares are each range-checked but deliberately not
/// forced to sum to 100; the settings form nudges users to keep them
/// complementary, the engine takes them as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSettings {
    pub target_large_visit: i64,
    pub target_medium_visit: i64,
    pub target_small_visit: i64,
    pub target_large_contract: i64,
    pub target_medium_contract: i64,
    pub target_small_contract: i64,
    /// Minimum visit completion percentage for any visit bonus to be paid.
    pub visit_threshold: i64,
    /// Minimum contract completion percentage for any contract bonus to be paid.
    pub contract_threshold: i64,
    pub large_cafe_bonus: i64,
    pub medium_cafe_bonus: i64,
    pub small_cafe_bonus: i64,
    pub base_salary_percentage: i64,
    pub total_target_salary: i64,
    pub visit_kpi_percentage: i64,
    pub contract_kpi_percentage: i64,
    #[serde(default)]
    pub representative_name: String,
}

impl Default for KpiSettings {
    fn default() -> Self {
        Self {
            target_large_visit: 15,
            target_medium_visit: 20,
            target_small_visit: 25,
            target_large_contract: 8,
            target_medium_contract: 12,
            target_small_contract: 10,
            visit_threshold: 80,
            contract_threshold: 80,
            large_cafe_bonus: 100,
            medium_cafe_bonus: 75,
            small_cafe_bonus: 50,
            base_salary_percentage: 30,
            total_target_salary: 3000,
            visit_kpi_percentage: 50,
            contract_kpi_percentage: 50,
            representative_name: String::new(),
        }
    }
}

impl KpiSettings {
    pub fn validate(&self) -> Result<(), TrackerError> {
        for (field, value) in [
            ("visitThreshold", self.visit_threshold),
            ("contractThreshold", self.contract_threshold),
            ("baseSalaryPercentage", self.base_salary_percentage),
            ("visitKpiPercentage", self.visit_kpi_percentage),
            ("contractKpiPercentage", self.contract_kpi_percentage),
        ] {
            if !(0..=100).contains(&value) {
                return Err(TrackerError::invalid(field, "must be between 0 and 100"));
            }
        }
        for (field, value) in [
            ("targetLargeVisit", self.target_large_visit),
            ("targetMediumVisit", self.target_medium_visit),
            ("targetSmallVisit", self.target_small_visit),
            ("targetLargeContract", self.target_large_contract),
            ("targetMediumContract", self.target_medium_contract),
            ("targetSmallContract", self.target_small_contract),
            ("largeCafeBonus", self.large_cafe_bonus),
            ("mediumCafeBonus", self.medium_cafe_bonus),
            ("smallCafeBonus", self.small_cafe_bonus),
            ("totalTargetSalary", self.total_target_salary),
        ] {
            if value < 0 {
                return Err(TrackerError::invalid(field, "must not be negative"));
            }
        }
        Ok(())
    }
}

/// Visit and contract counters for one calendar month, by size tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceCounts {
    pub large_visits: i64,
    pub medium_visits: i64,
    pub small_visits: i64,
    pub large_contracts: i64,
    pub medium_contracts: i64,
    pub small_contracts: i64,
}

impl PerformanceCounts {
    pub fn total_visits(&self) -> i64 {
        self.large_visits + self.medium_visits + self.small_visits
    }

    pub fn total_contracts(&self) -> i64 {
        self.large_contracts + self.medium_contracts + self.small_contracts
    }

    pub fn bump_visit(&mut self, size: CafeSize, factor: i64) {
        match size {
            CafeSize::Large => self.large_visits += factor,
            CafeSize::Medium => self.medium_visits += factor,
            CafeSize::Small => self.small_visits += factor,
        }
    }

    pub fn bump_contract(&mut self, size: CafeSize, factor: i64) {
        match size {
            CafeSize::Large => self.large_contracts += factor,
            CafeSize::Medium => self.medium_contracts += factor,
            CafeSize::Small => self.small_contracts += factor,
        }
    }
}

/// The computed salary for a month: base plus threshold-gated KPI bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compensation {
    pub base_salary: i64,
    pub kpi_bonus: i64,
    pub total_salary: i64,
}

/// One row per (year, month): raw counters and the computed salary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPerformance {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub counts: PerformanceCounts,
    pub base_salary: i64,
    pub kpi_bonus: i64,
    pub total_salary: i64,
}

impl MonthlyPerformance {
    pub fn apply(&mut self, compensation: Compensation) {
        self.base_salary = compensation.base_salary;
        self.kpi_bonus = compensation.kpi_bonus;
        self.total_salary = compensation.total_salary;
    }
}

/// Kind of audit-log entry recorded against a cafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Visit,
    Contract,
    Update,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visit => "visit",
            Self::Contract => "contract",
            Self::Update => "update",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "visit" => Some(Self::Visit),
            "contract" => Some(Self::Contract),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

impl ToSql for ActivityType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ActivityType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Self::parse(text).ok_or(FromSqlError::InvalidType)
    }
}

/// Append-only audit record describing what happened to a cafe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub cafe_id: i64,
    pub activity_type: ActivityType,
    pub description: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_boundaries() {
        assert_eq!(CafeSize::from_hookah_count(3), CafeSize::Small);
        assert_eq!(CafeSize::from_hookah_count(4), CafeSize::Medium);
        assert_eq!(CafeSize::from_hookah_count(7), CafeSize::Medium);
        assert_eq!(CafeSize::from_hookah_count(8), CafeSize::Large);
    }

    #[test]
    fn size_tolerates_zero_and_negative_counts() {
        assert_eq!(CafeSize::from_hookah_count(0), CafeSize::Small);
        assert_eq!(CafeSize::from_hookah_count(-5), CafeSize::Small);
    }

    #[test]
    fn size_tiers_are_totally_ordered() {
        assert!(CafeSize::Small < CafeSize::Medium);
        assert!(CafeSize::Medium < CafeSize::Large);
    }

    #[test]
    fn settings_validation_rejects_out_of_range_percentages() {
        let mut settings = KpiSettings::default();
        settings.visit_threshold = 101;
        assert!(settings.validate().is_err());

        let mut settings = KpiSettings::default();
        settings.base_salary_percentage = -1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn settings_validation_rejects_negative_targets() {
        let mut settings = KpiSettings::default();
        settings.target_medium_contract = -3;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn settings_validation_does_not_force_shares_to_sum_to_100() {
        let mut settings = KpiSettings::default();
        settings.visit_kpi_percentage = 70;
        settings.contract_kpi_percentage = 70;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn new_cafe_validation() {
        let cafe = NewCafe {
            name: "Golden Hookah".to_string(),
            area: "Centro".to_string(),
            owner_name: "Maria".to_string(),
            owner_number: "555-0101".to_string(),
            hookah_count: 5,
            table_count: 12,
            status: CafeStatus::Visited,
            photo_url: None,
        };
        assert!(cafe.validate().is_ok());

        let mut bad = cafe.clone();
        bad.hookah_count = 0;
        assert!(bad.validate().is_err());

        let mut bad = cafe;
        bad.name = "  ".to_string();
        assert!(bad.validate().is_err());
    }
}
