//! Budget governor - rolling daily and monthly spend windows.
//!
//! Windows reset lazily on calendar boundaries: the check runs before every
//! headroom read, there is no background timer. Mutation must happen under
//! the owner's write lock; reads work from snapshots.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Which calendar period a window rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Daily,
    Monthly,
}

/// One rolling spend window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetWindow {
    /// Spend ceiling in USD. Always > 0.
    pub limit: f64,
    /// Spend so far this period. Monotonically non-decreasing until reset.
    pub used: f64,
    pub last_reset: DateTime<Utc>,
}

impl BudgetWindow {
    pub fn new(limit: f64, now: DateTime<Utc>) -> Self {
        Self {
            limit,
            used: 0.0,
            last_reset: now,
        }
    }

    /// Whether `now` falls in a later calendar period than the last reset.
    fn period_elapsed(&self, kind: WindowKind, now: DateTime<Utc>) -> bool {
        let last = self.last_reset;
        match kind {
            WindowKind::Daily => {
                (now.day(), now.month(), now.year()) != (last.day(), last.month(), last.year())
            }
            WindowKind::Monthly => (now.month(), now.year()) != (last.month(), last.year()),
        }
    }

    /// Reset `used` if the period boundary has been crossed.
    ///
    /// Idempotent within a period: the first call after the boundary resets,
    /// later calls see matching calendars and do nothing.
    fn check_and_reset(&mut self, kind: WindowKind, now: DateTime<Utc>) -> bool {
        if self.period_elapsed(kind, now) {
            self.used = 0.0;
            self.last_reset = now;
            true
        } else {
            false
        }
    }

    pub fn remaining(&self) -> f64 {
        self.limit - self.used
    }
}

/// Budget-config record exchanged with the configuration store.
///
/// Shape matches the `budget_config` settings blob the dashboard reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub daily_limit: f64,
    pub daily_used: f64,
    pub daily_last_reset: DateTime<Utc>,
    pub monthly_limit: f64,
    pub monthly_used: f64,
    pub monthly_last_reset: DateTime<Utc>,
}

/// Point-in-time status of one window, for the status API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowStatus {
    pub limit: f64,
    pub used: f64,
    pub remaining: f64,
    pub percent_used: f64,
}

/// Point-in-time status of both windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub daily: WindowStatus,
    pub monthly: WindowStatus,
    pub last_update: DateTime<Utc>,
}

/// Both spend windows plus the reset logic. Owned by the selection engine
/// behind a write lock; every mutation yields a snapshot for the persistence
/// writer.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetTracker {
    daily: BudgetWindow,
    monthly: BudgetWindow,
}

impl BudgetTracker {
    pub fn new(daily_limit: f64, monthly_limit: f64, now: DateTime<Utc>) -> Self {
        Self {
            daily: BudgetWindow::new(daily_limit, now),
            monthly: BudgetWindow::new(monthly_limit, now),
        }
    }

    /// Rehydrate from a stored config record.
    pub fn from_config(config: &BudgetConfig) -> Self {
        Self {
            daily: BudgetWindow {
                limit: config.daily_limit,
                used: config.daily_used,
                last_reset: config.daily_last_reset,
            },
            monthly: BudgetWindow {
                limit: config.monthly_limit,
                used: config.monthly_used,
                last_reset: config.monthly_last_reset,
            },
        }
    }

    /// Snapshot for persistence.
    pub fn snapshot(&self) -> BudgetConfig {
        BudgetConfig {
            daily_limit: self.daily.limit,
            daily_used: self.daily.used,
            daily_last_reset: self.daily.last_reset,
            monthly_limit: self.monthly.limit,
            monthly_used: self.monthly.used,
            monthly_last_reset: self.monthly.last_reset,
        }
    }

    /// Lazy calendar reset of both windows. Returns whether anything changed
    /// and therefore needs persisting.
    pub fn check_and_reset(&mut self, now: DateTime<Utc>) -> bool {
        let daily_reset = self.daily.check_and_reset(WindowKind::Daily, now);
        let monthly_reset = self.monthly.check_and_reset(WindowKind::Monthly, now);
        if daily_reset {
            tracing::info!("Daily budget window reset (limit {:.2})", self.daily.limit);
        }
        if monthly_reset {
            tracing::info!(
                "Monthly budget window reset (limit {:.2})",
                self.monthly.limit
            );
        }
        daily_reset || monthly_reset
    }

    /// Headroom available for one more task: the tighter of the two windows.
    /// May be negative when a window is over its limit.
    pub fn available(&self) -> f64 {
        self.daily.remaining().min(self.monthly.remaining())
    }

    /// Record actual spend against both windows.
    pub fn record_spend(&mut self, cost: f64) {
        self.daily.used += cost;
        self.monthly.used += cost;
    }

    /// Replace both limits. Usage and reset timestamps are untouched.
    pub fn set_limits(&mut self, daily_limit: f64, monthly_limit: f64) {
        self.daily.limit = daily_limit;
        self.monthly.limit = monthly_limit;
    }

    /// Status report for the budget API. Callers run `check_and_reset` first.
    pub fn status(&self, now: DateTime<Utc>) -> BudgetStatus {
        let window_status = |w: &BudgetWindow| WindowStatus {
            limit: w.limit,
            used: w.used,
            remaining: w.remaining(),
            percent_used: (w.used / w.limit) * 100.0,
        };
        BudgetStatus {
            daily: window_status(&self.daily),
            monthly: window_status(&self.monthly),
            last_update: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_accumulation_within_period() {
        let now = at(2024, 7, 15, 9);
        let mut tracker = BudgetTracker::new(20.0, 300.0, now);
        tracker.record_spend(0.25);
        tracker.record_spend(0.75);
        let status = tracker.status(now);
        assert!((status.daily.used - 1.0).abs() < 1e-12);
        assert!((status.monthly.used - 1.0).abs() < 1e-12);
        assert!((tracker.available() - 19.0).abs() < 1e-12);
    }

    #[test]
    fn test_reset_is_idempotent_within_period() {
        let morning = at(2024, 7, 15, 8);
        let mut tracker = BudgetTracker::new(20.0, 300.0, morning);
        tracker.record_spend(5.0);

        let noon = at(2024, 7, 15, 12);
        assert!(!tracker.check_and_reset(noon));
        assert!(!tracker.check_and_reset(noon));
        let status = tracker.status(noon);
        assert!((status.daily.used - 5.0).abs() < 1e-12);
        assert_eq!(tracker.snapshot().daily_last_reset, morning);
    }

    #[test]
    fn test_day_boundary_resets_daily_only() {
        let july_15 = at(2024, 7, 15, 23);
        let mut tracker = BudgetTracker::new(20.0, 300.0, july_15);
        tracker.record_spend(12.0);

        let july_16 = at(2024, 7, 16, 0);
        assert!(tracker.check_and_reset(july_16));
        let status = tracker.status(july_16);
        assert_eq!(status.daily.used, 0.0);
        assert!((status.monthly.used - 12.0).abs() < 1e-12);

        // Exactly once: a second check the same day changes nothing.
        assert!(!tracker.check_and_reset(at(2024, 7, 16, 18)));
    }

    #[test]
    fn test_month_boundary_resets_both() {
        let july_31 = at(2024, 7, 31, 20);
        let mut tracker = BudgetTracker::new(20.0, 300.0, july_31);
        tracker.record_spend(18.0);

        let aug_1 = at(2024, 8, 1, 1);
        assert!(tracker.check_and_reset(aug_1));
        let status = tracker.status(aug_1);
        assert_eq!(status.daily.used, 0.0);
        assert_eq!(status.monthly.used, 0.0);
    }

    #[test]
    fn test_available_is_the_tighter_window() {
        let now = at(2024, 7, 15, 9);
        let mut tracker = BudgetTracker::new(20.0, 300.0, now);
        tracker.record_spend(19.5);
        // Daily has 0.5 left, monthly 280.5.
        assert!((tracker.available() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_available_may_go_negative() {
        let now = at(2024, 7, 15, 9);
        let mut tracker = BudgetTracker::new(20.0, 300.0, now);
        tracker.record_spend(21.0);
        assert!(tracker.available() < 0.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let now = at(2024, 7, 15, 9);
        let mut tracker = BudgetTracker::new(20.0, 300.0, now);
        tracker.record_spend(3.5);
        let restored = BudgetTracker::from_config(&tracker.snapshot());
        assert_eq!(restored, tracker);
    }

    #[test]
    fn test_set_limits_keeps_usage() {
        let now = at(2024, 7, 15, 9);
        let mut tracker = BudgetTracker::new(20.0, 300.0, now);
        tracker.record_spend(4.0);
        tracker.set_limits(50.0, 500.0);
        let status = tracker.status(now);
        assert_eq!(status.daily.limit, 50.0);
        assert!((status.daily.used - 4.0).abs() < 1e-12);
        assert!((status.daily.percent_used - 8.0).abs() < 1e-9);
    }
}
