use chrono::{NaiveDate, TimeDelta};
use std::mem::replace;

/// A date range iterator that yields each date from the start date
/// through the end date (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    /// Number of days still to be yielded.
    pub fn num_days(&self) -> usize {
        let days = (self.1 - self.0).num_days() + 1;
        days.max(0) as usize
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0 + TimeDelta::days(1);
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.num_days();
        (n, Some(n))
    }
}

impl ExactSizeIterator for DateRange {}
