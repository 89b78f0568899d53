// Web Interface module root
pub mod handlers;
pub mod routes;
pub mod types;
pub mod validation;
pub mod web_server;


// Re-export commonly used items
pub use routes::routes;
pub use types::{ApiError, AppState};
pub use web_server::WebServer;
