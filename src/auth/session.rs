//! Persisted login session
//!
//! The bearer token and the signed-in user live in `session.toml` next to the
//! configuration file. A missing or unreadable file means signed out.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::client::BlueprintClient;
use crate::api::models::User;
use crate::config::Config;

const SESSION_FILE: &str = "session.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the default configuration directory
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Config::config_dir()?.join(SESSION_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored session; a corrupt file is removed and treated as signed out
    pub fn load(&self) -> Option<Session> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match toml::from_str::<Session>(&contents) {
            Ok(session) if !session.token.is_empty() => Some(session),
            Ok(_) => None,
            Err(e) => {
                warn!("Discarding unreadable session file {}: {}", self.path.display(), e);
                if let Err(e) = self.clear() {
                    warn!("Failed to remove session file: {}", e);
                }
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(session).context("Failed to serialize session")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session file {}", self.path.display()))?;
        debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session file {}", self.path.display())),
        }
    }
}

/// The signed-in state shared by every command
#[derive(Debug)]
pub struct SessionContext {
    store: SessionStore,
    session: Option<Session>,
}

impl SessionContext {
    pub fn load(store: SessionStore) -> Self {
        let session = store.load();
        Self { store, session }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user().is_some_and(User::is_admin)
    }

    /// The signed-in user, or an error asking to log in
    pub fn require_user(&self) -> Result<&User> {
        match self.current_user() {
            Some(user) => Ok(user),
            None => bail!("Você não está autenticado. Execute `blueprint auth login`."),
        }
    }

    pub fn require_admin(&self) -> Result<&User> {
        let user = self.require_user()?;
        if !user.is_admin() {
            bail!("Acesso restrito a administradores");
        }
        Ok(user)
    }

    /// A client carrying the stored token
    pub fn client(&self, config: &Config) -> Result<BlueprintClient> {
        BlueprintClient::with_config(
            config.api_url(),
            self.token().map(str::to_string),
            crate::api::ResilienceConfig::from_settings(&config.settings),
        )
    }

    pub async fn login(&mut self, client: &mut BlueprintClient, email: &str, password: &str) -> Result<&User> {
        let response = client.login(email, password).await?;
        client.set_token(Some(response.access_token.clone()));

        let session = Session {
            token: response.access_token,
            user: response.user,
        };
        self.store.save(&session)?;
        info!("Logged in as {}", session.user.email);

        Ok(&self.session.insert(session).user)
    }

    /// Re-fetches the signed-in user from the server
    pub async fn refresh_me(&mut self, client: &BlueprintClient) -> Result<&User> {
        let Some(session) = self.session.as_mut() else {
            bail!("Você não está autenticado. Execute `blueprint auth login`.");
        };
        session.user = client.me().await?;
        self.store.save(session)?;
        Ok(&session.user)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session = None;
        self.store.clear()?;
        info!("Session cleared");
        Ok(())
    }

    /// Called when the server rejects the token
    pub fn handle_unauthorized(&mut self) -> Result<()> {
        warn!("Server rejected the session token, signing out");
        self.logout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Role;
    use tempfile::TempDir;

    fn session() -> Session {
        Session {
            token: "abc.def.ghi".into(),
            user: User {
                id: "u1".into(),
                name: "Ana".into(),
                email: "ana@example.com".into(),
                role: Role::Admin,
                is_active: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join(SESSION_FILE));
        assert!(store.load().is_none());

        store.save(&session()).unwrap();
        let context = SessionContext::load(store.clone());
        assert!(context.is_authenticated());
        assert!(context.is_admin());
        assert_eq!(context.token(), Some("abc.def.ghi"));
        assert_eq!(context.current_user().map(|u| u.name.as_str()), Some("Ana"));
    }

    #[test]
    fn test_corrupt_file_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SESSION_FILE);
        fs::write(&path, "token = [not valid").unwrap();

        let store = SessionStore::new(&path);
        assert!(store.load().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_unauthorized_signs_out() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join(SESSION_FILE));
        store.save(&session()).unwrap();

        let mut context = SessionContext::load(store.clone());
        context.handle_unauthorized().unwrap();
        assert!(!context.is_authenticated());
        assert!(context.require_user().is_err());
        assert!(!store.path().exists());

        // clearing twice is fine
        context.logout().unwrap();
    }

    #[test]
    fn test_client_role_is_not_admin() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join(SESSION_FILE));
        let mut s = session();
        s.user.role = Role::Client;
        store.save(&s).unwrap();

        let context = SessionContext::load(store);
        assert!(context.require_user().is_ok());
        assert!(context.require_admin().is_err());
    }
}
