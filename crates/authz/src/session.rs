use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::warn;

use crate::actor::Actor;
use crate::error::SessionError;

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Identity/session collaborator boundary: persisted-session lookup,
/// credential authentication, and best-effort remote invalidation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load_persisted(&self) -> Result<Option<Actor>, SessionError>;

    async fn authenticate(&self, credentials: &Credentials) -> Result<Actor, SessionError>;

    async fn persist(&self, actor: &Actor) -> Result<(), SessionError>;

    async fn invalidate(&self) -> Result<(), SessionError>;
}

/// Holds the current actor with an explicit lifecycle: hydrate on startup,
/// replace on login, clear on logout. Injected where needed so tests can
/// construct arbitrary actors without touching process-wide state.
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    actor: RwLock<Option<Actor>>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            actor: RwLock::new(None),
        }
    }

    /// Load a persisted session if one exists. An absent, invalid or
    /// inactive session leaves the context unauthenticated; a store failure
    /// is logged and treated the same way.
    pub async fn hydrate(&self) {
        match self.store.load_persisted().await {
            Ok(Some(actor)) if actor.is_active => {
                *self.lock_write() = Some(actor);
            }
            Ok(_) => {}
            Err(error) => {
                warn!(error = %error, "persisted session could not be loaded; starting unauthenticated");
            }
        }
    }

    /// Authenticate and atomically swap in the new actor. The last
    /// successful login wins; a persist failure leaves the previous state
    /// untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<Actor, SessionError> {
        let actor = self.store.authenticate(credentials).await?;
        if !actor.is_active {
            return Err(SessionError::Inactive);
        }
        self.store.persist(&actor).await?;
        *self.lock_write() = Some(actor.clone());
        Ok(actor)
    }

    /// Clear the actor locally, then attempt remote invalidation. Local
    /// logout is authoritative: a remote failure is logged, never surfaced
    /// as blocking the user out of their own logout.
    pub async fn logout(&self) {
        *self.lock_write() = None;
        if let Err(error) = self.store.invalidate().await {
            warn!(error = %error, "remote session invalidation failed; local logout already applied");
        }
    }

    pub fn current(&self) -> Option<Actor> {
        self.actor
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Actor>> {
        self.actor.write().unwrap_or_else(|p| p.into_inner())
    }
}
