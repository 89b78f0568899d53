use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error_handling::types::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub postal_code: String,
    pub email: String,
    pub phone: String,
}

/// Owner fields as supplied by a create or full-replacement update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOwner {
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub postal_code: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            other => Err(ValidationError::InvalidVariant {
                field: "sex",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    pub id: i32,
    pub name: String,
    pub birth_date: NaiveDate,
    pub weight: f64,
    /// `None` once the owning record has been deleted.
    pub owner_id: Option<i32>,
    pub sex: Sex,
    pub sterilized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDog {
    pub name: String,
    pub birth_date: NaiveDate,
    pub weight: f64,
    pub owner_id: i32,
    pub sex: Sex,
    pub sterilized: bool,
}

/// Offset/limit window applied to list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 10 }
    }
}

/// Single equality predicate used by the dog search endpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum DogFilter {
    /// Dogs whose owner lives in the given city.
    City(String),
    /// Dogs whose owner has exactly this first and last name.
    OwnerName {
        first_name: String,
        last_name: String,
    },
    Sex(Sex),
    Sterilized(bool),
}
