//! In-memory decrement tables indexed by age nearest birthday
//!
//! Rates below the first age are those of the first age. Past the last age
//! the table has no data; the engines treat survival there as impossible.

use chrono::NaiveDate;

use super::DecrementTable;
use crate::error::{DecrementError, Result};
use crate::individual::{Gender, Gendered, Individual};

/// Annual decrement rates by age, identical for every individual of that age
#[derive(Debug, Clone)]
pub struct AgeRateTable {
    name: String,

    first_age: i32,

    /// Base year of the rates (origin of improvement)
    base_year: i32,

    /// Annual rates by age (index 0 = first age)
    rates: Vec<f64>,
}

impl AgeRateTable {
    /// Fails when `rates` is empty
    pub fn new(name: impl Into<String>, first_age: i32, base_year: i32, rates: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if rates.is_empty() {
            return Err(DecrementError::EmptyTable { name });
        }
        Ok(Self {
            name,
            first_age,
            base_year,
            rates,
        })
    }

    /// Same rate at every age from `first_age` to `last_age`
    pub fn flat(name: impl Into<String>, first_age: i32, last_age: i32, base_year: i32, rate: f64) -> Result<Self> {
        let len = (last_age - first_age + 1).max(0) as usize;
        Self::new(name, first_age, base_year, vec![rate; len])
    }

    /// Rate for an age already limited to the table
    pub fn rate_at_age(&self, age: i32) -> f64 {
        let idx = (age - self.first_age).max(0) as usize;
        self.rates.get(idx).copied().unwrap_or(1.0)
    }
}

impl<I: Individual> DecrementTable<I> for AgeRateTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn rate(&self, individual: &I, date: NaiveDate) -> f64 {
        self.rate_at_age(self.age_limited(individual, date))
    }

    fn first_age(&self) -> i32 {
        self.first_age
    }

    fn last_age(&self) -> i32 {
        self.first_age + self.rates.len() as i32 - 1
    }

    fn base_year(&self) -> i32 {
        self.base_year
    }
}

/// Annual decrement rates by age and gender
#[derive(Debug, Clone)]
pub struct GenderedRateTable {
    name: String,

    first_age: i32,

    /// Base year of the rates (origin of improvement)
    base_year: i32,

    /// Annual rates by age (index 0 = first age)
    /// Stored as (female_rate, male_rate)
    rates: Vec<(f64, f64)>,
}

impl GenderedRateTable {
    /// Fails when `rates` is empty
    pub fn new(name: impl Into<String>, first_age: i32, base_year: i32, rates: Vec<(f64, f64)>) -> Result<Self> {
        let name = name.into();
        if rates.is_empty() {
            return Err(DecrementError::EmptyTable { name });
        }
        Ok(Self {
            name,
            first_age,
            base_year,
            rates,
        })
    }

    /// Rate for an age already limited to the table
    pub fn rate_at_age(&self, age: i32, gender: Gender) -> f64 {
        let idx = (age - self.first_age).max(0) as usize;
        let Some(&(female_rate, male_rate)) = self.rates.get(idx) else {
            return 1.0;
        };
        match gender {
            Gender::Female => female_rate,
            Gender::Male => male_rate,
        }
    }
}

impl<I: Gendered> DecrementTable<I> for GenderedRateTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn rate(&self, individual: &I, date: NaiveDate) -> f64 {
        self.rate_at_age(self.age_limited(individual, date), individual.gender())
    }

    fn first_age(&self) -> i32 {
        self.first_age
    }

    fn last_age(&self) -> i32 {
        self.first_age + self.rates.len() as i32 - 1
    }

    fn base_year(&self) -> i32 {
        self.base_year
    }
}
