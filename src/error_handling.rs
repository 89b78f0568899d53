//! Error types shared across configuration, storage and the web interface.

pub mod types;
