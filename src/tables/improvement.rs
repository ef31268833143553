//! In-memory improvement scales

use super::ImprovementTable;
use crate::error::{DecrementError, Result};
use crate::individual::{Gender, Gendered, Individual};

/// Improvement rates by calendar year and age, per gender
#[derive(Debug, Clone)]
pub struct GenderedImprovementTable {
    name: String,
    first_age: i32,
    first_year: i32,

    /// Rows by year (index 0 = first year), columns by age (index 0 = first age)
    /// Stored as (female_rate, male_rate)
    rates: Vec<Vec<(f64, f64)>>,
}

impl GenderedImprovementTable {
    /// Fails when there is no year or the first year has no age
    pub fn new(name: impl Into<String>, first_age: i32, first_year: i32, rates: Vec<Vec<(f64, f64)>>) -> Result<Self> {
        let name = name.into();
        if rates.first().map_or(true, |row| row.is_empty()) {
            return Err(DecrementError::EmptyTable { name });
        }
        Ok(Self {
            name,
            first_age,
            first_year,
            rates,
        })
    }

    /// Rates that vary by age only, repeated for every year of `[first_year, last_year]`
    pub fn by_age(
        name: impl Into<String>,
        first_age: i32,
        first_year: i32,
        last_year: i32,
        rates_by_age: Vec<(f64, f64)>,
    ) -> Result<Self> {
        let years = (last_year - first_year + 1).max(0) as usize;
        Self::new(name, first_age, first_year, vec![rates_by_age; years])
    }

    fn lookup(&self, age: i32, year: i32, gender: Gender) -> f64 {
        let row = (year - self.first_year).max(0) as usize;
        let col = (age - self.first_age).max(0) as usize;
        let Some(&(female_rate, male_rate)) = self.rates.get(row).and_then(|r| r.get(col)) else {
            return 0.0;
        };
        match gender {
            Gender::Female => female_rate,
            Gender::Male => male_rate,
        }
    }
}

impl<I: Gendered> ImprovementTable<I> for GenderedImprovementTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn improvement_rate(&self, individual: &I, age: i32, year: i32) -> f64 {
        self.lookup(age, year, individual.gender())
    }

    fn first_age(&self) -> i32 {
        self.first_age
    }

    fn last_age(&self) -> i32 {
        let ages = self.rates.first().map_or(0, |row| row.len()) as i32;
        self.first_age + ages - 1
    }

    fn first_year(&self) -> i32 {
        self.first_year
    }

    fn last_year(&self) -> i32 {
        self.first_year + self.rates.len() as i32 - 1
    }
}

/// Single improvement rate for every age and year of the scale
#[derive(Debug, Clone)]
pub struct UniformImprovementTable {
    name: String,
    rate: f64,
    first_year: i32,
    last_year: i32,
}

impl UniformImprovementTable {
    /// Fails when `last_year` is before `first_year`
    pub fn new(rate: f64, first_year: i32, last_year: i32) -> Result<Self> {
        let name = format!("uniform-improvement:{rate}:{first_year}-{last_year}");
        if last_year < first_year {
            return Err(DecrementError::EmptyTable { name });
        }
        Ok(Self {
            name,
            rate,
            first_year,
            last_year,
        })
    }
}

impl<I: Individual> ImprovementTable<I> for UniformImprovementTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn improvement_rate(&self, _individual: &I, _age: i32, _year: i32) -> f64 {
        self.rate
    }

    fn first_age(&self) -> i32 {
        0
    }

    fn last_age(&self) -> i32 {
        120
    }

    fn first_year(&self) -> i32 {
        self.first_year
    }

    fn last_year(&self) -> i32 {
        self.last_year
    }
}
