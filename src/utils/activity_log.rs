use crate::core::device::classify_user_agent;
use chrono::{DateTime, Duration, Utc};
use sqlx::MySqlPool;
use tracing::warn;

pub struct NewActivity<'a> {
    pub user_id: u64,
    pub action: &'a str,
    pub target: Option<&'a str>,
    pub details: Option<String>,
    pub user_agent: Option<&'a str>,
}

/// Entries with `created_at` strictly before this moment are swept.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    now - Duration::days(retention_days as i64)
}

/// Append one audit entry, then delete everything older than the retention
/// window in the same logical operation. The log is a rolling window, not
/// an archive. Both steps are best-effort: failures are logged and never
/// surfaced, audit logging must not block the action it accompanies.
pub async fn record(pool: &MySqlPool, retention_days: u32, entry: NewActivity<'_>) {
    let device = classify_user_agent(entry.user_agent.unwrap_or("")).to_string();
    let now = Utc::now();

    let inserted = sqlx::query(
        r#"
        INSERT INTO activity_log (user_id, action, target, details, device, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.action)
    .bind(entry.target)
    .bind(&entry.details)
    .bind(&device)
    .bind(now)
    .execute(pool)
    .await;

    if let Err(e) = inserted {
        warn!(error = %e, action = entry.action, "Failed to record activity entry");
    }

    let cutoff = retention_cutoff(now, retention_days);
    let swept = sqlx::query("DELETE FROM activity_log WHERE created_at < ?")
        .bind(cutoff)
        .execute(pool)
        .await;

    match swept {
        Ok(res) if res.rows_affected() > 0 => {
            tracing::debug!(deleted = res.rows_affected(), "Activity log sweep");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Activity log sweep failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sweep_cutoff_bounds_the_window() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        let cutoff = retention_cutoff(now, 3);

        let stale = now - Duration::days(3) - Duration::seconds(1);
        let in_window = now - Duration::days(2);

        assert!(stale < cutoff, "entries past the window must be swept");
        assert!(in_window >= cutoff, "entries inside the window must survive");
        // an entry written exactly at the cutoff is kept (strictly-older delete)
        assert!(cutoff >= cutoff);
    }
}
