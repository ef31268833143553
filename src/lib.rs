//! Decrement Engine - survival and decrement probabilities from actuarial tables
//!
//! This library provides:
//! - Sub-year interpolation of annual rates (uniform distribution, constant force)
//! - Improvement of base rates over calendar years
//! - Single-cause survival and decrement probabilities, with unisex blending
//! - Multiple decrement probabilities for disability, lapse and mortality
//! - Memoization of batch computations in a bounded, thread-safe cache

pub mod cache;
pub mod dates;
pub mod decrement;
pub mod error;
pub mod individual;
pub mod schedule;
pub mod tables;

// Re-export commonly used types
pub use cache::{probability_cache, Cache, CacheConfig, EntryOptions, EntryPriority, MemoryCache, ProbabilityCache};
pub use decrement::{
    Adjustment, DecrementEngine, Improvement, ImprovementScale, Interpolation, MultipleDecrementEngine,
    MultipleDecrementProbability, SurvivalModel,
};
pub use error::{DecrementError, Result};
pub use individual::{Gender, Gendered, GenderedPerson, Individual, Person};
pub use schedule::OrderedDates;
pub use tables::{DecrementTable, ImprovementTable};
