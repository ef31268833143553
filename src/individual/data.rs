//! Individual value types and the traits the engines consume

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Gender of the individual, used to pick a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// The opposite gender
    pub fn other(&self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

/// Structural identity of an individual for cache keys.
///
/// Two individuals with the same birth date and gender produce the same
/// probabilities from the same tables, so they share cached results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndividualKey {
    pub date_of_birth: NaiveDate,
    pub gender: Option<Gender>,
}

/// Anything with a date of birth can be run through a decrement table.
pub trait Individual: Send + Sync {
    fn date_of_birth(&self) -> NaiveDate;

    /// Attributes the probabilities depend on; override to add more.
    fn cache_key(&self) -> IndividualKey {
        IndividualKey {
            date_of_birth: self.date_of_birth(),
            gender: None,
        }
    }
}

/// An individual with a gender and a mirror of the opposite gender
pub trait Gendered: Individual + Clone {
    fn gender(&self) -> Gender;

    /// Same individual with the opposite gender
    fn as_other_gender(&self) -> Self;

    /// This individual if it already has `gender`, otherwise its mirror
    fn as_gender(&self, gender: Gender) -> Self {
        if self.gender() == gender {
            self.clone()
        } else {
            self.as_other_gender()
        }
    }
}

/// Individual known only by birth date (lapse or disability studies)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    pub date_of_birth: NaiveDate,
}

impl Person {
    pub fn new(date_of_birth: NaiveDate) -> Self {
        Self { date_of_birth }
    }
}

impl Individual for Person {
    fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }
}

/// Individual with a birth date and a gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenderedPerson {
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
}

impl GenderedPerson {
    pub fn new(date_of_birth: NaiveDate, gender: Gender) -> Self {
        Self {
            date_of_birth,
            gender,
        }
    }

    pub fn male(date_of_birth: NaiveDate) -> Self {
        Self::new(date_of_birth, Gender::Male)
    }

    pub fn female(date_of_birth: NaiveDate) -> Self {
        Self::new(date_of_birth, Gender::Female)
    }
}

impl Individual for GenderedPerson {
    fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    fn cache_key(&self) -> IndividualKey {
        IndividualKey {
            date_of_birth: self.date_of_birth,
            gender: Some(self.gender),
        }
    }
}

impl Gendered for GenderedPerson {
    fn gender(&self) -> Gender {
        self.gender
    }

    fn as_other_gender(&self) -> Self {
        Self::new(self.date_of_birth, self.gender.other())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_gender_mirror() {
        let dob = NaiveDate::from_ymd_opt(1965, 4, 12).unwrap();
        let man = GenderedPerson::male(dob);
        let woman = man.as_other_gender();

        assert_eq!(woman.gender, Gender::Female);
        assert_eq!(woman.date_of_birth, dob);
        assert_eq!(woman.as_other_gender(), man);
        assert_eq!(man.as_gender(Gender::Male), man);
        assert_eq!(man.as_gender(Gender::Female), woman);
    }

    #[test]
    fn test_cache_key_is_structural() {
        let dob = NaiveDate::from_ymd_opt(1965, 4, 12).unwrap();
        assert_eq!(GenderedPerson::male(dob).cache_key(), GenderedPerson::male(dob).cache_key());
        assert_ne!(GenderedPerson::male(dob).cache_key(), GenderedPerson::female(dob).cache_key());
        assert_eq!(Person::new(dob).cache_key().gender, None);
    }
}
