//! Storage Trait
//!
//! This module defines the `Storage` trait, the interface the web layer uses to
//! persist and query owners and dogs.
//!
//! Lookups by identity return `Ok(None)` (or `Ok(false)` for deletes) when the
//! record does not exist; only genuine storage failures and constraint
//! violations surface as `Err`.

use async_trait::async_trait;

use crate::error_handling::types::StorageError;
use crate::storage::types::{Dog, DogFilter, NewDog, NewOwner, Owner, Page};

#[async_trait]
pub trait Storage: Send + Sync {
    /// Inserts an owner and returns it with its assigned id.
    ///
    /// A duplicate email fails with `StorageError::ConstraintViolation`.
    async fn create_owner(&self, owner: &NewOwner) -> Result<Owner, StorageError>;

    async fn get_owner(&self, id: i32) -> Result<Option<Owner>, StorageError>;

    /// Owners ordered by id within the given window.
    async fn list_owners(&self, page: Page) -> Result<Vec<Owner>, StorageError>;

    /// Overwrites every field of an existing owner.
    async fn update_owner(&self, id: i32, owner: &NewOwner)
        -> Result<Option<Owner>, StorageError>;

    /// Deletes an owner. Dogs it owned stay in place with no owner.
    async fn delete_owner(&self, id: i32) -> Result<bool, StorageError>;

    /// Inserts a dog after checking its owner exists.
    ///
    /// Fails with `StorageError::MissingOwner` and writes nothing when it does not.
    async fn create_dog(&self, dog: &NewDog) -> Result<Dog, StorageError>;

    async fn get_dog(&self, id: i32) -> Result<Option<Dog>, StorageError>;

    async fn list_dogs(&self, page: Page) -> Result<Vec<Dog>, StorageError>;

    async fn update_dog(&self, id: i32, dog: &NewDog) -> Result<Option<Dog>, StorageError>;

    async fn delete_dog(&self, id: i32) -> Result<bool, StorageError>;

    /// Dogs ordered by id matching the filter exactly.
    async fn find_dogs(&self, filter: DogFilter) -> Result<Vec<Dog>, StorageError>;
}
