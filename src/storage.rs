//! Storage subsystem
//!
//! This module provides the abstractions and the SQLite implementation used to
//! persist owners and their dogs.
//!
//! Components:
//! - `storage_trait`: the Storage trait defining a uniform async API.
//! - `types`: records, inputs and query types shared with the web layer.
//! - `database_storage`: ORM-based SQLite implementation using SeaORM.
//! - `dog_filter`: helpers to build dog search filters.
//! - `db_entities`: SeaORM entity models for the database backend.

pub mod database_storage;
pub mod db_entities;
pub mod dog_filter;
pub mod storage_trait;
pub mod types;
