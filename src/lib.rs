pub mod configuration;
pub use configuration::{CliArgs, Config};

pub mod error_handling;

pub mod storage;
pub use storage::database_storage::DatabaseStorage;
pub use storage::storage_trait::Storage;

pub mod web_interface;
pub use web_interface::WebServer;
