//! Strictly increasing date sequences for batch probability queries

use std::ops::Index;
use std::sync::Arc;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DecrementError, Result};

/// Non-empty, strictly increasing, duplicate-free sequence of dates.
///
/// Cloning is cheap: the dates are shared, so the sequence can sit inside a
/// cache key without copying.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<NaiveDate>", into = "Vec<NaiveDate>")]
pub struct OrderedDates(Arc<[NaiveDate]>);

impl OrderedDates {
    /// Validate and wrap a sequence of dates
    pub fn new(dates: Vec<NaiveDate>) -> Result<Self> {
        if dates.is_empty() {
            return Err(DecrementError::EmptyDates);
        }
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(DecrementError::UnorderedDates {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Self(dates.into()))
    }

    /// `count` anniversaries of `start`, beginning one year after it
    pub fn yearly(start: NaiveDate, count: u32) -> Result<Self> {
        Self::every(start, 12, count)
    }

    /// `count` monthly dates, beginning one month after `start`
    pub fn monthly(start: NaiveDate, count: u32) -> Result<Self> {
        Self::every(start, 1, count)
    }

    fn every(start: NaiveDate, months: u32, count: u32) -> Result<Self> {
        // Offsets are taken from `start` so month-end dates do not drift.
        let dates = (1..=count)
            .filter_map(|i| start.checked_add_months(Months::new(i * months)))
            .collect();
        Self::new(dates)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with slices
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> NaiveDate {
        self.0[0]
    }

    pub fn last(&self) -> NaiveDate {
        self.0[self.0.len() - 1]
    }

    pub fn as_slice(&self) -> &[NaiveDate] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.0.iter()
    }
}

impl Index<usize> for OrderedDates {
    type Output = NaiveDate;

    fn index(&self, index: usize) -> &NaiveDate {
        &self.0[index]
    }
}

impl TryFrom<Vec<NaiveDate>> for OrderedDates {
    type Error = DecrementError;

    fn try_from(dates: Vec<NaiveDate>) -> Result<Self> {
        Self::new(dates)
    }
}

impl From<OrderedDates> for Vec<NaiveDate> {
    fn from(dates: OrderedDates) -> Self {
        dates.0.to_vec()
    }
}
