//! Activity recorder.
//!
//! Decides which audit-log entries a cafe transition produces. The entries
//! feed the dashboard feed; they are bookkeeping alongside the accumulator
//! math, never an input to it.

use crate::types::{ActivityType, Cafe, CafeStatus};

/// A planned audit-log entry, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub activity_type: ActivityType,
    pub description: String,
}

impl ActivityEntry {
    fn new(activity_type: ActivityType, description: String) -> Self {
        Self {
            activity_type,
            description,
        }
    }
}

/// Entry for a newly created cafe. The type follows the created status, so a
/// cafe created directly as contracted shows up as a contract in the feed.
pub fn entries_for_create(cafe: &Cafe) -> Vec<ActivityEntry> {
    let activity_type = if cafe.status == CafeStatus::Contracted {
        ActivityType::Contract
    } else {
        ActivityType::Visit
    };
    vec![ActivityEntry::new(
        activity_type,
        format!("Added new cafe: {}", cafe.name),
    )]
}

/// Entries for an updated cafe: always an update entry, plus a visit or
/// contract entry when the status changed.
pub fn entries_for_update(before: &Cafe, after: &Cafe) -> Vec<ActivityEntry> {
    let mut entries = vec![ActivityEntry::new(
        ActivityType::Update,
        format!("Updated cafe: {}", after.name),
    )];

    if before.status != after.status {
        let entry = if after.status == CafeStatus::Contracted {
            ActivityEntry::new(
                ActivityType::Contract,
                format!("Contracted with cafe: {}", after.name),
            )
        } else {
            ActivityEntry::new(ActivityType::Visit, format!("Visited cafe: {}", after.name))
        };
        entries.push(entry);
    }

    entries
}
