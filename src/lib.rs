pub mod api;
pub mod cli;
pub mod config;
pub mod diagnosis;
pub mod session;

use anyhow::Result;
use std::sync::Arc;

/// Shared application state: configuration, the session store, and the API
/// client bound to it.
pub struct App {
    pub config: config::Config,
    pub session: Arc<session::SessionStore>,
    pub api: Arc<api::ApiClient>,
}

impl App {
    pub fn new(config: config::Config) -> Result<Self> {
        let session = Arc::new(session::SessionStore::open(&config.storage.data_dir)?);
        let api = Arc::new(api::ApiClient::new(&config.api, session.clone())?);
        Ok(Self {
            config,
            session,
            api,
        })
    }
}
