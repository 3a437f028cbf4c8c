//! Shared application state handed to the envelope server and the admin
//! API.

use std::sync::Arc;

use crate::config::HubConfig;
use crate::server::Dispatcher;
use crate::service::Hub;

/// Shared application state. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registry + credential context.
    pub hub: Arc<Hub>,
    /// Action dispatcher shared by all connection workers.
    pub dispatcher: Arc<Dispatcher>,
    /// Startup configuration.
    pub config: Arc<HubConfig>,
}

impl AppState {
    /// Builds the hub and dispatcher described by `config`.
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        let hub = Arc::new(Hub::new(config.max_connections, &config.admin_password));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&hub),
            config.server_id.as_str(),
            config.session_token.as_str(),
        ));
        Self {
            hub,
            dispatcher,
            config: Arc::new(config),
        }
    }
}
