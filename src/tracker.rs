//! Service facade over the entity store.
//!
//! `SalaryTracker` owns the store behind a non-poisoning mutex; every cafe
//! mutation runs as one critical section (resolve old state, reverse its
//! contribution, apply the new state, recompute the month, append
//! activities), so two edits landing in the same month can never lose an
//! update to each other. Settings saves serialize through the same lock.

use std::path::PathBuf;

use chrono::{Datelike, Utc};
use parking_lot::Mutex;

use crate::activity;
use crate::db::TrackerDb;
use crate::error::TrackerError;
use crate::performance::{self, DeltaDirection};
use crate::types::{Activity, Cafe, KpiSettings, MonthlyPerformance, NewCafe};

/// Default number of months returned by the performance history feed.
pub const DEFAULT_HISTORY_MONTHS: usize = 12;

/// Default number of entries returned by the activity feed.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;

fn current_year_month() -> (i32, u32) {
    let now = Utc::now();
    (now.year(), now.month())
}

pub struct SalaryTracker {
    db: Mutex<TrackerDb>,
}

impl SalaryTracker {
    /// Open the tracker over the default database location.
    pub fn open() -> Result<Self, TrackerError> {
        Ok(Self::new(TrackerDb::open()?))
    }

    /// Open the tracker over a database at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, TrackerError> {
        Ok(Self::new(TrackerDb::open_at(path)?))
    }

    pub fn new(db: TrackerDb) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Read settings, materializing defaults on first access.
    fn ensure_settings(db: &TrackerDb) -> Result<KpiSettings, TrackerError> {
        if let Some(settings) = db.get_settings()? {
            return Ok(settings);
        }
        let settings = KpiSettings::default();
        db.save_settings(&settings)?;
        log::info!("No KPI settings found; created defaults");
        Ok(settings)
    }

    /// Drive the accumulator for a cafe transition.
    ///
    /// Covers create (`before` = None), update (both set), and delete
    /// (`after` = None). Transitions are applied as reverse-old then
    /// add-new, never as a direct diff. An update that touches neither
    /// status nor hookah count leaves the month untouched.
    fn record_cafe_change(
        db: &TrackerDb,
        settings: &KpiSettings,
        before: Option<&Cafe>,
        after: Option<&Cafe>,
    ) -> Result<(), TrackerError> {
        if let (Some(before), Some(after)) = (before, after) {
            if before.status == after.status && before.hookah_count == after.hookah_count {
                return Ok(());
            }
        }

        let (year, month) = current_year_month();
        if let Some(before) = before {
            performance::apply_cafe_delta(
                db,
                settings,
                before,
                DeltaDirection::Reverse,
                year,
                month,
            )?;
        }
        if let Some(after) = after {
            performance::apply_cafe_delta(db, settings, after, DeltaDirection::Add, year, month)?;
        }
        Ok(())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn settings(&self) -> Result<KpiSettings, TrackerError> {
        let db = self.db.lock();
        Self::ensure_settings(&db)
    }

    /// Replace the settings wholesale and recompute the current month's
    /// salary under the new rules.
    pub fn save_settings(&self, settings: KpiSettings) -> Result<KpiSettings, TrackerError> {
        settings.validate()?;

        let db = self.db.lock();
        db.save_settings(&settings)?;

        let (year, month) = current_year_month();
        let performance = performance::recompute_month(&db, &settings, year, month)?;
        log::info!(
            "Saved KPI settings; {year}-{month:02} recomputed to total {}",
            performance.total_salary
        );
        Ok(settings)
    }

    // =========================================================================
    // Cafes
    // =========================================================================

    pub fn cafe(&self, id: i64) -> Result<Cafe, TrackerError> {
        let db = self.db.lock();
        db.get_cafe(id)?.ok_or(TrackerError::CafeNotFound(id))
    }

    pub fn cafes(&self) -> Result<Vec<Cafe>, TrackerError> {
        let db = self.db.lock();
        db.list_cafes()
    }

    pub fn create_cafe(&self, new_cafe: NewCafe) -> Result<Cafe, TrackerError> {
        new_cafe.validate()?;

        let db = self.db.lock();
        let settings = Self::ensure_settings(&db)?;
        let cafe = db.create_cafe(&new_cafe)?;

        for entry in activity::entries_for_create(&cafe) {
            db.insert_activity(cafe.id, entry.activity_type, &entry.description)?;
        }
        Self::record_cafe_change(&db, &settings, None, Some(&cafe))?;

        log::info!("Created cafe {} ({})", cafe.id, cafe.name);
        Ok(cafe)
    }

    pub fn update_cafe(&self, id: i64, changes: NewCafe) -> Result<Cafe, TrackerError> {
        changes.validate()?;

        let db = self.db.lock();
        let settings = Self::ensure_settings(&db)?;
        let before = db.get_cafe(id)?.ok_or(TrackerError::CafeNotFound(id))?;
        let after = db.update_cafe(id, &changes)?;

        for entry in activity::entries_for_update(&before, &after) {
            db.insert_activity(after.id, entry.activity_type, &entry.description)?;
        }
        Self::record_cafe_change(&db, &settings, Some(&before), Some(&after))?;

        Ok(after)
    }

    /// Delete a cafe, reversing its contribution to the current month and
    /// dropping its activities.
    pub fn delete_cafe(&self, id: i64) -> Result<(), TrackerError> {
        let db = self.db.lock();
        let settings = Self::ensure_settings(&db)?;
        let cafe = db.get_cafe(id)?.ok_or(TrackerError::CafeNotFound(id))?;

        Self::record_cafe_change(&db, &settings, Some(&cafe), None)?;
        db.delete_cafe(id)?;

        log::info!("Deleted cafe {} ({})", id, cafe.name);
        Ok(())
    }

    // =========================================================================
    // Performance & activity feeds
    // =========================================================================

    pub fn month_performance(
        &self,
        year: i32,
        month: u32,
    ) -> Result<MonthlyPerformance, TrackerError> {
        let db = self.db.lock();
        let settings = Self::ensure_settings(&db)?;
        performance::get_or_create_month(&db, &settings, year, month)
    }

    pub fn current_month_performance(&self) -> Result<MonthlyPerformance, TrackerError> {
        let (year, month) = current_year_month();
        self.month_performance(year, month)
    }

    pub fn performance_history(
        &self,
        limit: usize,
    ) -> Result<Vec<MonthlyPerformance>, TrackerError> {
        let db = self.db.lock();
        db.month_history(limit)
    }

    pub fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>, TrackerError> {
        let db = self.db.lock();
        db.recent_activities(limit)
    }

    /// Consistency backstop: rebuild one month's counters from the cafes
    /// created in it and re-run the engine.
    pub fn reconcile_month(&self, year: i32, month: u32) -> Result<MonthlyPerformance, TrackerError> {
        let db = self.db.lock();
        let settings = Self::ensure_settings(&db)?;
        performance::recompute_month_from_cafes(&db, &settings, year, month)
    }

    /// Every month key present in the store, oldest first.
    pub fn month_keys(&self) -> Result<Vec<(i32, u32)>, TrackerError> {
        let db = self.db.lock();
        db.month_keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivityType, CafeStatus, PerformanceCounts};

    fn test_tracker() -> SalaryTracker {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tracker.db");
        std::mem::forget(dir);
        SalaryTracker::open_at(path).expect("open tracker")
    }

    fn sample_cafe(name: &str, hookah_count: i64, status: CafeStatus) -> NewCafe {
        NewCafe {
            name: name.to_string(),
            area: "Centro".to_string(),
            owner_name: "Maria".to_string(),
            owner_number: "555-0101".to_string(),
            hookah_count,
            table_count: 10,
            status,
            photo_url: None,
        }
    }

    #[test]
    fn settings_materialize_with_defaults() {
        let tracker = test_tracker();
        let settings = tracker.settings().expect("settings");
        assert_eq!(settings, KpiSettings::default());

        // A second read returns the persisted row.
        let again = tracker.settings().expect("settings");
        assert_eq!(again, settings);
    }

    #[test]
    fn save_settings_rejects_invalid_input() {
        let tracker = test_tracker();
        let mut settings = KpiSettings::default();
        settings.contract_kpi_percentage = 150;
        assert!(tracker.save_settings(settings).is_err());
    }

    #[test]
    fn save_settings_recomputes_current_month() {
        let tracker = test_tracker();

        // Seed the current month at the default base of 900.
        let before = tracker.current_month_performance().expect("month");
        assert_eq!(before.base_salary, 900);

        let mut settings = KpiSettings::default();
        settings.total_target_salary = 5000;
        tracker.save_settings(settings).expect("save");

        let after = tracker.current_month_performance().expect("month");
        assert_eq!(after.base_salary, 1500);
        assert_eq!(after.total_salary, 1500);
    }

    #[test]
    fn end_to_end_contracted_cafe_lifecycle() {
        let tracker = test_tracker();

        // New medium cafe created directly as contracted.
        let cafe = tracker
            .create_cafe(sample_cafe("Golden Hookah", 5, CafeStatus::Contracted))
            .expect("create");

        let month = tracker.current_month_performance().expect("month");
        assert_eq!(month.counts.medium_visits, 1);
        assert_eq!(month.counts.medium_contracts, 1);
        // 1/12 contracts and 1/60 visits are both far below the 80%
        // thresholds, so only the base is paid.
        assert_eq!(month.base_salary, 900);
        assert_eq!(month.kpi_bonus, 0);
        assert_eq!(month.total_salary, 900);

        // Deleting it restores the month to its empty state.
        tracker.delete_cafe(cafe.id).expect("delete");
        let month = tracker.current_month_performance().expect("month");
        assert_eq!(month.counts, PerformanceCounts::default());
        assert_eq!(month.total_salary, 900);
    }

    #[test]
    fn create_validates_input() {
        let tracker = test_tracker();
        let bad = sample_cafe("No Hookahs", 0, CafeStatus::Pending);
        assert!(tracker.create_cafe(bad).is_err());
        // Nothing was persisted.
        assert!(tracker.cafes().expect("list").is_empty());
    }

    #[test]
    fn update_moves_contribution_between_states() {
        let tracker = test_tracker();
        let cafe = tracker
            .create_cafe(sample_cafe("Oasis", 5, CafeStatus::Pending))
            .expect("create");

        let month = tracker.current_month_performance().expect("month");
        assert_eq!(month.counts.medium_visits, 0);

        // pending -> contracted adds both a visit and a contract.
        let mut changes = sample_cafe("Oasis", 5, CafeStatus::Contracted);
        changes.photo_url = cafe.photo_url.clone();
        tracker.update_cafe(cafe.id, changes).expect("update");

        let month = tracker.current_month_performance().expect("month");
        assert_eq!(month.counts.medium_visits, 1);
        assert_eq!(month.counts.medium_contracts, 1);

        // contracted -> pending removes both again.
        tracker
            .update_cafe(cafe.id, sample_cafe("Oasis", 5, CafeStatus::Pending))
            .expect("update");
        let month = tracker.current_month_performance().expect("month");
        assert_eq!(month.counts, PerformanceCounts::default());
    }

    #[test]
    fn update_without_counting_changes_leaves_month_alone() {
        let tracker = test_tracker();
        let cafe = tracker
            .create_cafe(sample_cafe("Oasis", 5, CafeStatus::Visited))
            .expect("create");
        let before = tracker.current_month_performance().expect("month");

        // Rename only; status and hookah count unchanged.
        let mut changes = sample_cafe("Oasis Lounge", 5, CafeStatus::Visited);
        changes.table_count = 14;
        tracker.update_cafe(cafe.id, changes).expect("update");

        let after = tracker.current_month_performance().expect("month");
        assert_eq!(after.counts, before.counts);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let tracker = test_tracker();
        assert!(tracker.cafe(99).expect_err("get").is_not_found());
        assert!(tracker
            .update_cafe(99, sample_cafe("Ghost", 2, CafeStatus::Pending))
            .expect_err("update")
            .is_not_found());
        assert!(tracker.delete_cafe(99).expect_err("delete").is_not_found());
    }

    #[test]
    fn activity_feed_reflects_lifecycle() {
        let tracker = test_tracker();
        let cafe = tracker
            .create_cafe(sample_cafe("Oasis", 5, CafeStatus::Visited))
            .expect("create");
        tracker
            .update_cafe(cafe.id, sample_cafe("Oasis", 5, CafeStatus::Contracted))
            .expect("update");

        let feed = tracker
            .recent_activities(DEFAULT_ACTIVITY_LIMIT)
            .expect("feed");
        // Newest first: contract entry, update entry, creation visit entry.
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].activity_type, ActivityType::Contract);
        assert_eq!(feed[1].activity_type, ActivityType::Update);
        assert_eq!(feed[2].activity_type, ActivityType::Visit);

        // Deleting the cafe drops its history with it.
        tracker.delete_cafe(cafe.id).expect("delete");
        assert!(tracker
            .recent_activities(DEFAULT_ACTIVITY_LIMIT)
            .expect("feed")
            .is_empty());
    }

    #[test]
    fn history_returns_newest_months_first() {
        let tracker = test_tracker();
        tracker.month_performance(2026, 5).expect("month");
        tracker.month_performance(2026, 7).expect("month");
        tracker.month_performance(2025, 12).expect("month");

        let history = tracker
            .performance_history(DEFAULT_HISTORY_MONTHS)
            .expect("history");
        assert_eq!(history.len(), 3);
        assert_eq!((history[0].year, history[0].month), (2026, 7));
        assert_eq!((history[2].year, history[2].month), (2025, 12));
    }

    #[test]
    fn reconcile_month_matches_facade_state() {
        let tracker = test_tracker();
        tracker
            .create_cafe(sample_cafe("Oasis", 5, CafeStatus::Contracted))
            .expect("create");
        tracker
            .create_cafe(sample_cafe("Dune", 9, CafeStatus::Visited))
            .expect("create");

        let (year, month) = current_year_month();
        let incremental = tracker.current_month_performance().expect("month");
        let rebuilt = tracker.reconcile_month(year, month).expect("reconcile");
        assert_eq!(rebuilt.counts, incremental.counts);
        assert_eq!(rebuilt.total_salary, incremental.total_salary);
    }
}
