use std::sync::Arc;

use crate::{
    error::Result,
    identity::IdentityProvider,
    session::{Session, SessionStore},
};

/// Process-wide authentication state.
///
/// Single-writer container: the UI layer owns exactly one `AuthContext` and
/// passes it by reference. Session existence is probed opportunistically only
/// once, in [`AuthContext::initialize`]; everything after that is an explicit
/// user action.
pub struct AuthContext<P> {
    store: Arc<SessionStore<P>>,
    is_authenticated: bool,
    is_loading: bool,
    session: Option<Session>,
}

impl<P: IdentityProvider> AuthContext<P> {
    pub fn new(store: Arc<SessionStore<P>>) -> Self {
        Self {
            store,
            is_authenticated: false,
            is_loading: true,
            session: None,
        }
    }

    /// One-shot startup probe of the cached credential.
    ///
    /// Ends with `is_loading = false` regardless of outcome; any failure just
    /// means the user is not authenticated.
    pub fn initialize(&mut self) {
        match self.store.session() {
            Ok(session) => {
                tracing::debug!(email = %session.email, "restored cached session");
                self.session = Some(session);
                self.is_authenticated = true;
            }
            Err(err) => {
                tracing::debug!("no restorable session: {err}");
                self.is_authenticated = false;
            }
        }
        self.is_loading = false;
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<()> {
        let session = self.store.sign_in(email, password).await?;
        self.session = Some(session);
        self.is_authenticated = true;
        Ok(())
    }

    /// Registers an account. Takes `&self` on purpose: a sign-up never
    /// authenticates, the account must be verified first.
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<()> {
        self.store.sign_up(email, password, name).await
    }

    pub async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<()> {
        self.store.confirm_sign_up(email, code).await
    }

    pub async fn resend_confirmation_code(&self, email: &str) -> Result<()> {
        self.store.resend_confirmation_code(email).await
    }

    /// Always succeeds locally, whatever the provider thinks.
    pub fn sign_out(&mut self) {
        self.store.sign_out();
        self.session = None;
        self.is_authenticated = false;
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Shared handle for collaborators that need fresh tokens per call.
    pub fn store(&self) -> Arc<SessionStore<P>> {
        Arc::clone(&self.store)
    }
}
