//! SQLite-backed entity store for cafes, activities, KPI settings, and
//! monthly performance.
//!
//! The database lives at `~/.horeca/tracker.db`. Pure data access: no salary
//! math happens here beyond referential bookkeeping (deleting a cafe drops
//! its activities). The accumulator and engine own the computed fields.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::TrackerError;
use crate::migrations::run_migrations;
use crate::types::{
    Activity, ActivityType, Cafe, KpiSettings, MonthlyPerformance, NewCafe, PerformanceCounts,
};

const CAFE_COLUMNS: &str = "id, name, area, owner_name, owner_number, hookah_count, table_count,
             status, photo_url, created_at";

const MONTH_COLUMNS: &str = "year, month, large_visits, medium_visits, small_visits,
             large_contracts, medium_contracts, small_contracts,
             base_salary, kpi_bonus, total_salary";

/// SQLite connection wrapper for tracker state.
///
/// Intentionally NOT `Clone` or `Sync`; the service facade holds it behind a
/// mutex so every read-modify-write on a month row runs as one critical
/// section.
pub struct TrackerDb {
    conn: Connection,
}

fn map_cafe_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Cafe> {
    Ok(Cafe {
        id: row.get(0)?,
        name: row.get(1)?,
        area: row.get(2)?,
        owner_name: row.get(3)?,
        owner_number: row.get(4)?,
        hookah_count: row.get(5)?,
        table_count: row.get(6)?,
        status: row.get(7)?,
        photo_url: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn map_month_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MonthlyPerformance> {
    Ok(MonthlyPerformance {
        year: row.get(0)?,
        month: row.get(1)?,
        counts: PerformanceCounts {
            large_visits: row.get(2)?,
            medium_visits: row.get(3)?,
            small_visits: row.get(4)?,
            large_contracts: row.get(5)?,
            medium_contracts: row.get(6)?,
            small_contracts: row.get(7)?,
        },
        base_salary: row.get(8)?,
        kpi_bonus: row.get(9)?,
        total_salary: row.get(10)?,
    })
}

impl TrackerDb {
    /// Open (or create) the database at `~/.horeca/tracker.db` and apply
    /// pending migrations.
    pub fn open() -> Result<Self, TrackerError> {
        Self::open_at(Self::db_path()?)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, TrackerError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(TrackerError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        run_migrations(&conn).map_err(TrackerError::Migration)?;

        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.horeca/tracker.db`.
    fn db_path() -> Result<PathBuf, TrackerError> {
        let home = dirs::home_dir().ok_or(TrackerError::HomeDirNotFound)?;
        Ok(home.join(".horeca").join("tracker.db"))
    }

    // =========================================================================
    // KPI settings (singleton row)
    // =========================================================================

    /// Read the settings row, if one has been saved.
    pub fn get_settings(&self) -> Result<Option<KpiSettings>, TrackerError> {
        let settings = self
            .conn
            .query_row(
                "SELECT target_large_visit, target_medium_visit, target_small_visit,
                        target_large_contract, target_medium_contract, target_small_contract,
                        visit_threshold, contract_threshold,
                        large_cafe_bonus, medium_cafe_bonus, small_cafe_bonus,
                        base_salary_percentage, total_target_salary,
                        visit_kpi_percentage, contract_kpi_percentage,
                        representative_name
                 FROM kpi_settings WHERE id = 1",
                [],
                |row| {
                    Ok(KpiSettings {
                        target_large_visit: row.get(0)?,
                        target_medium_visit: row.get(1)?,
                        target_small_visit: row.get(2)?,
                        target_large_contract: row.get(3)?,
                        target_medium_contract: row.get(4)?,
                        target_small_contract: row.get(5)?,
                        visit_threshold: row.get(6)?,
                        contract_threshold: row.get(7)?,
                        large_cafe_bonus: row.get(8)?,
                        medium_cafe_bonus: row.get(9)?,
                        small_cafe_bonus: row.get(10)?,
                        base_salary_percentage: row.get(11)?,
                        total_target_salary: row.get(12)?,
                        visit_kpi_percentage: row.get(13)?,
                        contract_kpi_percentage: row.get(14)?,
                        representative_name: row.get(15)?,
                    })
                },
            )
            .optional()?;
        Ok(settings)
    }

    /// Replace the settings row wholesale.
    pub fn save_settings(&self, settings: &KpiSettings) -> Result<(), TrackerError> {
        self.conn.execute(
            "INSERT INTO kpi_settings (
                 id,
                 target_large_visit, target_medium_visit, target_small_visit,
                 target_large_contract, target_medium_contract, target_small_contract,
                 visit_threshold, contract_threshold,
                 large_cafe_bonus, medium_cafe_bonus, small_cafe_bonus,
                 base_salary_percentage, total_target_salary,
                 visit_kpi_percentage, contract_kpi_percentage,
                 representative_name
             ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(id) DO UPDATE SET
                 target_large_visit = excluded.target_large_visit,
                 target_medium_visit = excluded.target_medium_visit,
                 target_small_visit = excluded.target_small_visit,
                 target_large_contract = excluded.target_large_contract,
                 target_medium_contract = excluded.target_medium_contract,
                 target_small_contract = excluded.target_small_contract,
                 visit_threshold = excluded.visit_threshold,
                 contract_threshold = excluded.contract_threshold,
                 large_cafe_bonus = excluded.large_cafe_bonus,
                 medium_cafe_bonus = excluded.medium_cafe_bonus,
                 small_cafe_bonus = excluded.small_cafe_bonus,
                 base_salary_percentage = excluded.base_salary_percentage,
                 total_target_salary = excluded.total_target_salary,
                 visit_kpi_percentage = excluded.visit_kpi_percentage,
                 contract_kpi_percentage = excluded.contract_kpi_percentage,
                 representative_name = excluded.representative_name",
            params![
                settings.target_large_visit,
                settings.target_medium_visit,
                settings.target_small_visit,
                settings.target_large_contract,
                settings.target_medium_contract,
                settings.target_small_contract,
                settings.visit_threshold,
                settings.contract_threshold,
                settings.large_cafe_bonus,
                settings.medium_cafe_bonus,
                settings.small_cafe_bonus,
                settings.base_salary_percentage,
                settings.total_target_salary,
                settings.visit_kpi_percentage,
                settings.contract_kpi_percentage,
                settings.representative_name,
            ],
        )?;
        Ok(())
    }

    // =========================================================================
    // Cafes
    // =========================================================================

    /// Insert a cafe and return it with its assigned id.
    pub fn create_cafe(&self, cafe: &NewCafe) -> Result<Cafe, TrackerError> {
        let created_at = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO cafes (name, area, owner_name, owner_number, hookah_count,
                                table_count, status, photo_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                cafe.name,
                cafe.area,
                cafe.owner_name,
                cafe.owner_number,
                cafe.hookah_count,
                cafe.table_count,
                cafe.status,
                cafe.photo_url,
                created_at,
            ],
        )?;

        Ok(Cafe {
            id: self.conn.last_insert_rowid(),
            name: cafe.name.clone(),
            area: cafe.area.clone(),
            owner_name: cafe.owner_name.clone(),
            owner_number: cafe.owner_number.clone(),
            hookah_count: cafe.hookah_count,
            table_count: cafe.table_count,
            status: cafe.status,
            photo_url: cafe.photo_url.clone(),
            created_at,
        })
    }

    pub fn get_cafe(&self, id: i64) -> Result<Option<Cafe>, TrackerError> {
        let cafe = self
            .conn
            .query_row(
                &format!("SELECT {CAFE_COLUMNS} FROM cafes WHERE id = ?1"),
                params![id],
                map_cafe_row,
            )
            .optional()?;
        Ok(cafe)
    }

    pub fn list_cafes(&self) -> Result<Vec<Cafe>, TrackerError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CAFE_COLUMNS} FROM cafes ORDER BY id"))?;
        let rows = stmt.query_map([], map_cafe_row)?;

        let mut cafes = Vec::new();
        for row in rows {
            cafes.push(row?);
        }
        Ok(cafes)
    }

    /// Overwrite a cafe's mutable fields. `created_at` is preserved.
    pub fn update_cafe(&self, id: i64, cafe: &NewCafe) -> Result<Cafe, TrackerError> {
        let changed = self.conn.execute(
            "UPDATE cafes SET name = ?1, area = ?2, owner_name = ?3, owner_number = ?4,
                              hookah_count = ?5, table_count = ?6, status = ?7, photo_url = ?8
             WHERE id = ?9",
            params![
                cafe.name,
                cafe.area,
                cafe.owner_name,
                cafe.owner_number,
                cafe.hookah_count,
                cafe.table_count,
                cafe.status,
                cafe.photo_url,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(TrackerError::CafeNotFound(id));
        }
        self.get_cafe(id)?.ok_or(TrackerError::CafeNotFound(id))
    }

    /// Delete a cafe and its activities.
    pub fn delete_cafe(&self, id: i64) -> Result<(), TrackerError> {
        self.delete_activities_for_cafe(id)?;
        let deleted = self
            .conn
            .execute("DELETE FROM cafes WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(TrackerError::CafeNotFound(id));
        }
        Ok(())
    }

    /// Cafes whose `created_at` falls within the given calendar month.
    /// Used by the reconciliation recompute.
    pub fn cafes_created_in(&self, year: i32, month: u32) -> Result<Vec<Cafe>, TrackerError> {
        let prefix = format!("{:04}-{:02}", year, month);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CAFE_COLUMNS} FROM cafes
             WHERE substr(created_at, 1, 7) = ?1
             ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![prefix], map_cafe_row)?;

        let mut cafes = Vec::new();
        for row in rows {
            cafes.push(row?);
        }
        Ok(cafes)
    }

    // =========================================================================
    // Activities
    // =========================================================================

    /// Append an audit-log entry for a cafe.
    pub fn insert_activity(
        &self,
        cafe_id: i64,
        activity_type: ActivityType,
        description: &str,
    ) -> Result<Activity, TrackerError> {
        let timestamp = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO activities (cafe_id, activity_type, description, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![cafe_id, activity_type, description, timestamp],
        )?;

        Ok(Activity {
            id: self.conn.last_insert_rowid(),
            cafe_id,
            activity_type,
            description: description.to_string(),
            timestamp,
        })
    }

    /// Most recent activities first.
    pub fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>, TrackerError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, cafe_id, activity_type, description, timestamp
             FROM activities
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(Activity {
                id: row.get(0)?,
                cafe_id: row.get(1)?,
                activity_type: row.get(2)?,
                description: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?;

        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }

    pub fn delete_activities_for_cafe(&self, cafe_id: i64) -> Result<usize, TrackerError> {
        let deleted = self
            .conn
            .execute("DELETE FROM activities WHERE cafe_id = ?1", params![cafe_id])?;
        Ok(deleted)
    }

    // =========================================================================
    // Monthly performance
    // =========================================================================

    pub fn get_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Option<MonthlyPerformance>, TrackerError> {
        let performance = self
            .conn
            .query_row(
                &format!(
                    "SELECT {MONTH_COLUMNS} FROM monthly_performance
                     WHERE year = ?1 AND month = ?2"
                ),
                params![year, month],
                map_month_row,
            )
            .optional()?;
        Ok(performance)
    }

    /// Insert a fresh month row seeded with the given computed salary fields.
    pub fn insert_month(&self, performance: &MonthlyPerformance) -> Result<(), TrackerError> {
        self.conn.execute(
            "INSERT INTO monthly_performance (
                 year, month,
                 large_visits, medium_visits, small_visits,
                 large_contracts, medium_contracts, small_contracts,
                 base_salary, kpi_bonus, total_salary
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                performance.year,
                performance.month,
                performance.counts.large_visits,
                performance.counts.medium_visits,
                performance.counts.small_visits,
                performance.counts.large_contracts,
                performance.counts.medium_contracts,
                performance.counts.small_contracts,
                performance.base_salary,
                performance.kpi_bonus,
                performance.total_salary,
            ],
        )?;
        Ok(())
    }

    /// Persist updated counters and computed salary for an existing month.
    pub fn update_month(&self, performance: &MonthlyPerformance) -> Result<(), TrackerError> {
        self.conn.execute(
            "UPDATE monthly_performance SET
                 large_visits = ?3, medium_visits = ?4, small_visits = ?5,
                 large_contracts = ?6, medium_contracts = ?7, small_contracts = ?8,
                 base_salary = ?9, kpi_bonus = ?10, total_salary = ?11
             WHERE year = ?1 AND month = ?2",
            params![
                performance.year,
                performance.month,
                performance.counts.large_visits,
                performance.counts.medium_visits,
                performance.counts.small_visits,
                performance.counts.large_contracts,
                performance.counts.medium_contracts,
                performance.counts.small_contracts,
                performance.base_salary,
                performance.kpi_bonus,
                performance.total_salary,
            ],
        )?;
        Ok(())
    }

    /// Most recent months first, newest-by-calendar first.
    pub fn month_history(&self, limit: usize) -> Result<Vec<MonthlyPerformance>, TrackerError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MONTH_COLUMNS} FROM monthly_performance
             ORDER BY year DESC, month DESC
             LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit as i64], map_month_row)?;

        let mut months = Vec::new();
        for row in rows {
            months.push(row?);
        }
        Ok(months)
    }

    /// Every (year, month) key present in the store, oldest first.
    pub fn month_keys(&self) -> Result<Vec<(i32, u32)>, TrackerError> {
        let mut stmt = self
            .conn
            .prepare("SELECT year, month FROM monthly_performance ORDER BY year, month")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}
