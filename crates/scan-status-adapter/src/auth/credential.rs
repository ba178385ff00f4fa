/*
[INPUT]:  Bearer tokens handed over by the login flow (external)
[OUTPUT]: Observable current credential with change notification
[POS]:    Auth layer - credential value and its lifecycle
[UPDATE]: When adding token metadata or changing how changes are observed
*/

use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

/// Opaque bearer value used to authenticate REST calls and the live-update stream.
///
/// Equality is by token value, so re-publishing the same token is recognised as
/// "no change" by consumers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    /// Raw token value.
    pub fn token(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(len={})", self.0.len())
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Thread-safe holder of the current credential.
///
/// Consumers subscribe to a `watch::Receiver` and are woken on every change,
/// including the transition to "no credential".
#[derive(Debug, Clone)]
pub struct CredentialSource {
    current: watch::Sender<Option<Credential>>,
    updated_at: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl CredentialSource {
    /// Create an empty credential source
    pub fn new() -> Self {
        Self::with_initial(None)
    }

    pub fn with_initial(initial: Option<Credential>) -> Self {
        let updated_at = initial.as_ref().map(|_| Utc::now());
        let (current, _rx) = watch::channel(initial);
        Self {
            current,
            updated_at: Arc::new(RwLock::new(updated_at)),
        }
    }

    /// Publish a credential. Re-publishing an equal credential does not wake subscribers.
    pub fn set(&self, credential: Credential) {
        let changed = self.current.send_if_modified(|current| {
            if current.as_ref() == Some(&credential) {
                return false;
            }
            *current = Some(credential);
            true
        });
        if changed {
            self.touch();
        }
    }

    /// Drop the current credential (logout or expiry).
    pub fn clear(&self) {
        let changed = self.current.send_if_modified(|current| current.take().is_some());
        if changed {
            self.touch();
        }
    }

    /// Get the current credential if available
    pub fn current(&self) -> Option<Credential> {
        self.current.borrow().clone()
    }

    /// When the credential last changed.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
            .read()
            .map(|guard| *guard)
            .unwrap_or_default()
    }

    /// Subscribe to credential changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.current.subscribe()
    }

    fn touch(&self) {
        if let Ok(mut guard) = self.updated_at.write() {
            *guard = Some(Utc::now());
        }
    }
}

impl Default for CredentialSource {
    fn default() -> Self {
        Self::new()
    }
}
