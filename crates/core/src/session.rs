use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    identity::IdentityProvider,
};

/// Minimum password length enforced before the provider is ever contacted.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Length of the email verification code.
pub const VERIFICATION_CODE_LEN: usize = 6;

/// A locally cached credential bundle.
///
/// The id token is opaque to the client; only its expiry is inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub id_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Bridge to the external identity provider plus the local credential cache.
///
/// Holds no business state: the cached [`Session`] is the only thing it owns.
/// The cache survives restarts as a JSON file; a missing or unparsable file
/// simply means no session.
pub struct SessionStore<P> {
    provider: P,
    cache_path: PathBuf,
    current: Mutex<Option<Session>>,
}

impl<P: IdentityProvider> SessionStore<P> {
    pub fn new(provider: P, cache_path: impl Into<PathBuf>) -> Self {
        let cache_path = cache_path.into();
        let current = load_cached(&cache_path);
        Self {
            provider,
            cache_path,
            current: Mutex::new(current),
        }
    }

    /// Registers a new account. The account is NOT authenticated afterwards:
    /// the provider sends a verification code by email first.
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<()> {
        validate_email(email)?;
        if name.trim().is_empty() {
            return Err(Error::Validation("name must not be empty".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        self.provider.sign_up(email, password, name).await
    }

    /// Confirms a freshly registered account with the emailed code.
    pub async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<()> {
        validate_email(email)?;
        let code = code.trim();
        if code.len() != VERIFICATION_CODE_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Validation(format!(
                "verification code must be {VERIFICATION_CODE_LEN} digits"
            )));
        }
        self.provider.confirm_sign_up(email, code).await
    }

    pub async fn resend_confirmation_code(&self, email: &str) -> Result<()> {
        validate_email(email)?;
        self.provider.resend_confirmation_code(email).await
    }

    /// Authenticates and caches the resulting session, in memory and on disk.
    ///
    /// A disk write failure is logged but does not fail the sign-in; the
    /// in-memory session is already usable.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        validate_email(email)?;
        if password.is_empty() {
            return Err(Error::Validation("password must not be empty".into()));
        }

        let tokens = self.provider.sign_in(email, password).await?;
        let session = Session {
            email: email.trim().to_string(),
            id_token: tokens.id_token,
            expires_at: tokens.expires_at,
        };

        *self.lock_current() = Some(session.clone());
        if let Err(err) = persist(&self.cache_path, &session) {
            tracing::warn!("failed to persist session cache: {err}");
        }
        Ok(session)
    }

    /// Clears the local credential. Always succeeds, idempotent; the provider
    /// is not contacted.
    pub fn sign_out(&self) {
        *self.lock_current() = None;
        match fs::remove_file(&self.cache_path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => tracing::debug!("could not remove session cache: {err}"),
        }
    }

    /// Returns the cached session, failing with [`Error::NoSession`] when
    /// none is cached or the cached one has expired.
    pub fn session(&self) -> Result<Session> {
        let mut current = self.lock_current();
        match current.as_ref() {
            Some(session) if session.is_valid_at(Utc::now()) => Ok(session.clone()),
            Some(_) => {
                // Expired credentials are dropped so later probes fail fast.
                *current = None;
                Err(Error::NoSession)
            }
            None => Err(Error::NoSession),
        }
    }

    /// The bearer credential for API calls, fetched fresh per call.
    pub fn id_token(&self) -> Result<String> {
        self.session().map(|session| session.id_token)
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(Error::Validation("invalid email address".into()))
    }
}

fn load_cached(path: &Path) -> Option<Session> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::debug!("could not read session cache: {err}");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(session) => Some(session),
        Err(err) => {
            tracing::debug!("discarding unparsable session cache: {err}");
            None
        }
    }
}

fn persist(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let payload = serde_json::to_string_pretty(session)?;
    fs::write(path, payload)?;
    Ok(())
}
