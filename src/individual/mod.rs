//! Individuals whose survival is modeled

mod data;

pub use data::{Gender, Gendered, GenderedPerson, Individual, IndividualKey, Person};
