use anyhow::{Result, bail};
use log::debug;
use std::sync::Arc;

use crate::api::client::BlueprintClient;
use crate::auth::{SessionContext, SessionStore};
use crate::config::Config;
use crate::notify::{ConsoleNotifier, Notifier};
use crate::routes::{Access, Route, check_access};

/// Everything a command handler needs, passed explicitly
pub struct AppContext {
    pub config: Config,
    pub session: SessionContext,
    pub notifier: Arc<dyn Notifier>,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let config = Config::load()?;
        let session = SessionContext::load(SessionStore::default_location()?);
        debug!(
            "Loaded context: api_url={}, authenticated={}",
            config.api_url(),
            session.is_authenticated()
        );
        Ok(Self {
            config,
            session,
            notifier: Arc::new(ConsoleNotifier),
        })
    }

    pub fn client(&self) -> Result<BlueprintClient> {
        self.session.client(&self.config)
    }

    /// Checks the route's guard and returns a client for it
    pub fn enter(&self, route: &Route) -> Result<BlueprintClient> {
        match check_access(route, self.session.current_user()) {
            Access::Granted => {
                debug!("Entering {}", route);
                self.client()
            }
            Access::RedirectToLogin => {
                bail!("Você não está autenticado. Execute `blueprint auth login`.")
            }
            Access::RedirectHome => {
                bail!("Acesso restrito a administradores. Use `blueprint home`.")
            }
        }
    }
}
