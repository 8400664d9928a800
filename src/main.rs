//! Console dashboard: current month performance, salary breakdown, and the
//! recent activity feed, as JSON on stdout.

use horeca_tracker::tracker::{DEFAULT_ACTIVITY_LIMIT, DEFAULT_HISTORY_MONTHS};
use horeca_tracker::SalaryTracker;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = SalaryTracker::open()?;

    let settings = tracker.settings()?;
    let current = tracker.current_month_performance()?;
    let history = tracker.performance_history(DEFAULT_HISTORY_MONTHS)?;
    let activities = tracker.recent_activities(DEFAULT_ACTIVITY_LIMIT)?;

    let dashboard = serde_json::json!({
        "settings": settings,
        "currentMonth": current,
        "history": history,
        "recentActivities": activities,
    });
    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}
