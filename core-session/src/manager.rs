//! Session lifecycle: restore, sign-in, sign-up, sign-out, profile edits.
//!
//! Accounts are provisioned locally. Credentials are validated for shape
//! only and the password is never stored; a [`UserProfile`] is synthesized
//! on sign-in and persisted as JSON under a single key-value entry.

use std::sync::Arc;

use bridge_traits::storage::KvStore;
use bridge_traits::time::Clock;
use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, SessionError};
use crate::types::{ProfileUpdate, UserProfile};

/// Storage key the serialized profile lives under.
const SESSION_KEY: &str = "session.user";

/// Manages the signed-in user and its persistence.
///
/// Cloneable; clones share the in-memory session and the backing store.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    current: Arc<RwLock<Option<UserProfile>>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, events: EventBus) -> Self {
        Self {
            store,
            clock,
            events,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Restores a persisted session, if any.
    ///
    /// A record that fails to parse is treated as absent and removed from
    /// the store, so a corrupt entry cannot wedge startup into a half
    /// signed-in state.
    pub async fn restore(&self) -> Result<Option<UserProfile>> {
        let Some(raw) = self.store.get(SESSION_KEY).await? else {
            debug!("no persisted session");
            return Ok(None);
        };

        let profile: UserProfile = match serde_json::from_str(&raw) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "persisted session is malformed, discarding");
                self.store.remove(SESSION_KEY).await?;
                let _ = self.events.emit(CoreEvent::Session(SessionEvent::SessionError {
                    message: format!("discarded malformed session record: {e}"),
                }));
                return Ok(None);
            }
        };

        info!(email = %profile.email, "session restored");
        *self.current.write().await = Some(profile.clone());
        let _ = self.events.emit(CoreEvent::Session(SessionEvent::Restored {
            email: profile.email.clone(),
        }));
        Ok(Some(profile))
    }

    /// Signs in with an email and password, replacing any active session.
    ///
    /// The display name is derived from the email local part.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let email = validate_email(email)?;
        validate_password(password)?;

        let name = email
            .split('@')
            .next()
            .unwrap_or(&email)
            .to_string();
        let profile = self.provision(email, name).await?;

        info!(email = %profile.email, "user signed in");
        let _ = self.events.emit(CoreEvent::Session(SessionEvent::SignedIn {
            email: profile.email.clone(),
        }));
        Ok(profile)
    }

    /// Creates a new account with an explicit display name and signs it in.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> Result<UserProfile> {
        let email = validate_email(email)?;
        validate_password(password)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidCredentials("name is empty".into()));
        }

        let profile = self.provision(email, name.to_string()).await?;

        info!(email = %profile.email, "account created");
        let _ = self.events.emit(CoreEvent::Session(SessionEvent::SignedUp {
            email: profile.email.clone(),
        }));
        Ok(profile)
    }

    /// Clears the active session and its persisted record.
    pub async fn logout(&self) -> Result<()> {
        self.store.remove(SESSION_KEY).await?;
        *self.current.write().await = None;

        info!("user signed out");
        let _ = self.events.emit(CoreEvent::Session(SessionEvent::SignedOut));
        Ok(())
    }

    /// Applies a partial edit to the signed-in user's profile.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile> {
        let mut guard = self.current.write().await;
        let profile = guard.as_mut().ok_or(SessionError::NotSignedIn)?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(SessionError::InvalidCredentials("name is empty".into()));
            }
            profile.name = name;
        }
        if let Some(avatar_url) = update.avatar_url {
            profile.avatar_url = Some(avatar_url);
        }

        let profile = profile.clone();
        drop(guard);
        self.persist(&profile).await?;

        debug!(email = %profile.email, "profile updated");
        let _ = self.events.emit(CoreEvent::Session(SessionEvent::ProfileUpdated {
            email: profile.email.clone(),
        }));
        Ok(profile)
    }

    /// Snapshot of the signed-in user, if any.
    pub async fn current(&self) -> Option<UserProfile> {
        self.current.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    // ===== Internals =====

    async fn provision(&self, email: String, name: String) -> Result<UserProfile> {
        let profile = UserProfile {
            id: Uuid::new_v4().to_string(),
            email,
            name,
            avatar_url: None,
            created_at: self.clock.now(),
        };
        self.persist(&profile).await?;
        *self.current.write().await = Some(profile.clone());
        Ok(profile)
    }

    async fn persist(&self, profile: &UserProfile) -> Result<()> {
        let raw = serde_json::to_string(profile)
            .map_err(|e| SessionError::Serialize(e.to_string()))?;
        self.store.put(SESSION_KEY, &raw).await?;
        Ok(())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}

fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(SessionError::InvalidCredentials("email is empty".into()));
    }
    // Minimal shape check; there is no account backend to verify against.
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(SessionError::InvalidCredentials(format!(
            "not a valid email address: {email}"
        )));
    }
    Ok(email.to_string())
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(SessionError::InvalidCredentials("password is empty".into()));
    }
    Ok(())
}
