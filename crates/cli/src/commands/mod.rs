//! CLI command implementations.
//!
//! Commands print through `tracing::info!` so output and diagnostics share
//! one stream and one filter.

pub mod auth;
pub mod catalog;
pub mod products;
pub mod sales;
pub mod users;

use bookshop_client::{
    CatalogClient, ClientConfig, FileStore, SalesClient, Session, SessionState, SessionStore,
};
use bookshop_core::Route;

use crate::error::CliError;

/// Configuration and session store shared by every command.
pub struct Context {
    config: ClientConfig,
    sessions: SessionStore<FileStore>,
}

impl Context {
    /// Load configuration from the environment and open the session file.
    pub fn load() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let sessions = SessionStore::new(FileStore::new(config.session_file.clone()));
        Ok(Self { config, sessions })
    }

    pub fn catalog_url(&self) -> &str {
        self.config.catalog_url.as_str()
    }

    pub fn sales_url(&self) -> &str {
        self.config.sales_url.as_str()
    }

    pub const fn sessions(&self) -> &SessionStore<FileStore> {
        &self.sessions
    }

    /// The stored session, if any.
    pub fn session(&self) -> Result<Option<Session>, CliError> {
        Ok(match self.sessions.load()? {
            SessionState::LoggedIn(session) => Some(session),
            SessionState::LoggedOut => None,
        })
    }

    /// The stored session, provided its menu includes `route`.
    pub fn require(&self, route: Route) -> Result<Session, CliError> {
        let session = self.session()?.ok_or(CliError::NotLoggedIn)?;
        check_route(&session, route)?;
        Ok(session)
    }

    /// Like [`Context::require`], and the role must also be an editing role.
    pub fn require_editor(&self, route: Route) -> Result<Session, CliError> {
        let session = self.require(route)?;
        check_editor(&session)?;
        Ok(session)
    }

    pub fn catalog(&self, session: &Session) -> Result<CatalogClient, CliError> {
        Ok(CatalogClient::new(
            &self.config,
            Some(session.token().clone()),
        )?)
    }

    pub fn sales(&self, session: Option<&Session>) -> Result<SalesClient, CliError> {
        Ok(SalesClient::new(
            &self.config,
            session.map(|s| s.token().clone()),
        )?)
    }
}

fn check_route(session: &Session, route: Route) -> Result<(), CliError> {
    if session.allows(route) {
        Ok(())
    } else {
        Err(CliError::Forbidden {
            route,
            role: session.role().to_string(),
        })
    }
}

fn check_editor(session: &Session) -> Result<(), CliError> {
    if session.can_edit() {
        Ok(())
    } else {
        Err(CliError::ReadOnly {
            role: session.role().to_string(),
        })
    }
}
