use std::net::SocketAddr;
use std::sync::Arc;

use log::info;

use super::routes::routes;
use super::types::AppState;
use crate::configuration::Paging;
use crate::storage::storage_trait::Storage;

/// HTTP server exposing the owner and dog endpoints
pub struct WebServer {
    state: AppState,
}

impl WebServer {
    /// Create a new WebServer instance
    pub fn new(storage: Arc<dyn Storage>, paging: Paging) -> Self {
        Self {
            state: AppState::new(storage, paging),
        }
    }

    /// Serve requests on `addr` until the process stops
    pub async fn start(&self, addr: SocketAddr) {
        info!("Listening on http://{}", addr);
        warp::serve(routes(self.state.clone())).run(addr).await;
    }
}
