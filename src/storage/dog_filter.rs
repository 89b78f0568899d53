//! Helpers for building `DogFilter` values.
//!
//! This module re-exports `DogFilter` and provides convenience builders for the
//! owner-based criteria, which take owned strings.

pub use crate::storage::types::DogFilter;

/// Build a `DogFilter` that matches dogs whose owner lives in `city`.
pub fn by_city<S: Into<String>>(city: S) -> DogFilter {
    DogFilter::City(city.into())
}

/// Build a `DogFilter` that matches dogs by their owner's full name.
pub fn by_owner_name<F: Into<String>, L: Into<String>>(first_name: F, last_name: L) -> DogFilter {
    DogFilter::OwnerName {
        first_name: first_name.into(),
        last_name: last_name.into(),
    }
}
