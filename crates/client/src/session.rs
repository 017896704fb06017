//! Session store: who is signed in and with which credential.
//!
//! The store holds zero or one [`Session`]. It persists the credential and the
//! identity under [`keys::AUTH_TOKEN`] and [`keys::USER`] and publishes the
//! current credential through a [`CredentialSlot`] that the HTTP gateway reads
//! when building requests. The gateway never sees the store itself.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use phoneplace_core::Identity;

use crate::observer::{Listeners, SubscriptionId};
use crate::storage::{SharedStore, StorageError, keys};

/// Shared, lock-free holder of the current bearer credential.
///
/// Cloning yields another handle to the same slot.
#[derive(Clone, Default)]
pub struct CredentialSlot(Arc<ArcSwapOption<SecretString>>);

impl CredentialSlot {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current credential, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<SecretString>> {
        self.0.load_full()
    }

    fn publish(&self, credential: Option<Arc<SecretString>>) {
        self.0.store(credential);
    }
}

impl std::fmt::Debug for CredentialSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.0.load().is_some() {
            "[REDACTED]"
        } else {
            "empty"
        };
        f.debug_tuple("CredentialSlot").field(&state).finish()
    }
}

/// An authenticated identity plus its bearer credential.
#[derive(Clone)]
pub struct Session {
    identity: Identity,
    credential: Arc<SecretString>,
}

impl Session {
    /// Build a session from a credential and identity.
    #[must_use]
    pub fn new(credential: SecretString, identity: Identity) -> Self {
        Self {
            identity,
            credential: Arc::new(credential),
        }
    }

    /// The signed-in user.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The bearer credential.
    #[must_use]
    pub fn credential(&self) -> &SecretString {
        &self.credential
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was created by login or signup.
    SignedIn,
    /// A persisted session was loaded at startup.
    Restored,
    /// The session was cleared.
    SignedOut,
}

/// Listener signature: the event and the identity after it settled.
pub type SessionListener = dyn FnMut(&SessionEvent, Option<&Identity>) + Send;

/// Holder of the current session.
pub struct SessionStore {
    storage: SharedStore,
    current: Option<Session>,
    slot: CredentialSlot,
    listeners: Listeners<SessionListener>,
}

impl SessionStore {
    /// An anonymous store persisting to `storage`. Call [`Self::restore`] to
    /// pick up a session saved by an earlier run.
    #[must_use]
    pub fn new(storage: SharedStore) -> Self {
        Self {
            storage,
            current: None,
            slot: CredentialSlot::new(),
            listeners: Listeners::new(),
        }
    }

    /// Handle the gateway uses to read the current credential.
    #[must_use]
    pub fn credential_slot(&self) -> CredentialSlot {
        self.slot.clone()
    }

    /// Register a listener called after sign-in, restore and sign-out.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&SessionEvent, Option<&Identity>) + Send + 'static,
    ) -> SubscriptionId {
        self.listeners.add(Box::new(listener))
    }

    /// Detach a listener.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    /// The current session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The signed-in identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.current.as_ref().map(Session::identity)
    }

    /// True iff an identity is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// True iff an identity is present and its role is admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity().is_some_and(Identity::is_admin)
    }

    /// Load a previously persisted session.
    ///
    /// Succeeds only when both the credential and a well-formed identity are
    /// stored. Anything else (a missing half, unparseable identity, unreadable
    /// storage) leaves the store anonymous and wipes the stored pair. Never
    /// fails. Returns whether a session was restored.
    pub fn restore(&mut self) -> bool {
        let token = self.read(keys::AUTH_TOKEN);
        let user = self.read(keys::USER);

        let (token, user) = match (token, user) {
            (Some(token), Some(user)) => (token, user),
            (None, None) => return false,
            _ => {
                warn!("Discarding incomplete persisted session");
                self.forget_persisted();
                return false;
            }
        };

        if token.trim().is_empty() {
            warn!("Discarding persisted session with blank credential");
            self.forget_persisted();
            return false;
        }

        let identity: Identity = match serde_json::from_str(&user) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Discarding malformed persisted identity");
                self.forget_persisted();
                return false;
            }
        };

        debug!(user_id = %identity.id, "Restored session");
        self.install(Session::new(SecretString::from(token), identity));
        self.notify(&SessionEvent::Restored);
        true
    }

    /// Replace the current session and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted. In that case the
    /// previous session (or anonymous state) is kept and any partially written
    /// values are removed.
    pub fn login(
        &mut self,
        credential: SecretString,
        identity: Identity,
    ) -> Result<(), StorageError> {
        let session = Session::new(credential, identity);
        if let Err(e) = self.persist(&session) {
            self.forget_persisted();
            if let Some(previous) = self.current.clone()
                && let Err(restore_err) = self.persist(&previous)
            {
                warn!(error = %restore_err, "Failed to re-persist previous session");
            }
            return Err(e);
        }

        info!(user_id = %session.identity.id, role = %session.identity.role, "Signed in");
        self.install(session);
        self.notify(&SessionEvent::SignedIn);
        Ok(())
    }

    /// Clear the in-memory session and the persisted copy.
    ///
    /// The in-memory session is always cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted copy could not be removed.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        let was_signed_in = self.current.take().is_some();
        self.slot.publish(None);

        let removed = self
            .storage
            .remove(keys::AUTH_TOKEN)
            .and_then(|()| self.storage.remove(keys::USER));

        if was_signed_in {
            info!("Signed out");
            self.notify(&SessionEvent::SignedOut);
        }
        removed
    }

    fn install(&mut self, session: Session) {
        self.slot.publish(Some(Arc::clone(&session.credential)));
        self.current = Some(session);
    }

    fn persist(&self, session: &Session) -> Result<(), StorageError> {
        let user = serde_json::to_string(&session.identity)?;
        self.storage
            .set(keys::AUTH_TOKEN, session.credential.expose_secret())?;
        self.storage.set(keys::USER, &user)
    }

    fn read(&self, key: &str) -> Option<String> {
        self.storage.get(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "Failed to read persisted session");
            None
        })
    }

    fn forget_persisted(&self) {
        for key in [keys::AUTH_TOKEN, keys::USER] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove persisted session value");
            }
        }
    }

    fn notify(&mut self, event: &SessionEvent) {
        let identity = self.current.as_ref().map(Session::identity);
        for listener in self.listeners.iter_mut() {
            listener(event, identity);
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("current", &self.current)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
