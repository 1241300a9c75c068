//! Train/test labelling of feature rows by a trailing calendar window.

use crate::features::FeatureRow;
use chrono::NaiveDate;
use log::info;

/// Default holdout: the trailing 365 calendar days.
pub const DEFAULT_TEST_WINDOW_DAYS: u32 = 365;

/// Trailing-window train/test rule.
///
/// A date is test when it lies within `test_window_days` calendar days of the
/// latest date, counting the latest date itself; everything earlier is train.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPolicy {
    pub test_window_days: u32,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            test_window_days: DEFAULT_TEST_WINDOW_DAYS,
        }
    }
}

impl SplitPolicy {
    pub fn new(test_window_days: u32) -> Self {
        Self { test_window_days }
    }

    pub fn is_test(&self, date: NaiveDate, max_date: NaiveDate) -> bool {
        (max_date - date).num_days() < i64::from(self.test_window_days)
    }

    /// Label every row against the latest date among them.
    ///
    /// Rows must already sit on a gapless calendar, so the window is counted
    /// in days rather than in observations.
    pub fn label(&self, rows: &mut [FeatureRow]) {
        let Some(max_date) = rows.iter().map(FeatureRow::date).max() else {
            return;
        };
        for row in rows.iter_mut() {
            row.is_test = self.is_test(row.date(), max_date);
        }
        let test = rows.iter().filter(|r| r.is_test).count();
        info!(
            "Split {} rows into {} train / {} test (window {} days ending {})",
            rows.len(),
            rows.len() - test,
            test,
            self.test_window_days,
            max_date
        );
    }
}
