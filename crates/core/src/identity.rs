use api_types::{
    ErrorResponse,
    auth::{ConfirmRequest, ResendCodeRequest, SessionTokens, SignInRequest, SignUpRequest},
};
use reqwest::Url;

use crate::error::{Error, Result};

/// The identity provider boundary: sign-up, verification, and sign-in.
///
/// The wire protocol is provider-defined; everything behind this trait is an
/// opaque external collaborator. Inputs are assumed already validated by the
/// session store.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<()>;
    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<()>;
    async fn resend_confirmation_code(&self, email: &str) -> Result<()>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionTokens>;
}

/// HTTP identity provider client.
///
/// Endpoints hang off a single base URL (`signup`, `confirm`, `resend`,
/// `signin`); every request carries the configured client id. Any non-2xx
/// response maps to [`Error::Auth`].
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    base_url: Url,
    client_id: String,
    http: reqwest::Client,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, client_id: &str) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self {
            base_url,
            client_id: client_id.to_string(),
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| Error::Validation(format!("invalid identity endpoint: {err}")))
    }

    async fn post<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let endpoint = self.endpoint(path)?;
        tracing::debug!(%endpoint, "identity provider request");
        let res = self.http.post(endpoint).json(body).send().await?;
        if res.status().is_success() {
            return Ok(res);
        }
        Err(auth_error(res).await)
    }
}

impl IdentityProvider for HttpIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<()> {
        let payload = SignUpRequest {
            client_id: self.client_id.clone(),
            email: email.trim().to_string(),
            password: password.to_string(),
            name: name.trim().to_string(),
        };
        self.post("signup", &payload).await?;
        Ok(())
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<()> {
        let payload = ConfirmRequest {
            client_id: self.client_id.clone(),
            email: email.trim().to_string(),
            code: code.trim().to_string(),
        };
        self.post("confirm", &payload).await?;
        Ok(())
    }

    async fn resend_confirmation_code(&self, email: &str) -> Result<()> {
        let payload = ResendCodeRequest {
            client_id: self.client_id.clone(),
            email: email.trim().to_string(),
        };
        self.post("resend", &payload).await?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionTokens> {
        let payload = SignInRequest {
            client_id: self.client_id.clone(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let res = self.post("signin", &payload).await?;
        res.json::<SessionTokens>().await.map_err(Error::Transport)
    }
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    // A trailing slash keeps Url::join from eating the last path segment.
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|err| Error::Validation(format!("invalid base url: {err}")))
}

async fn auth_error(res: reqwest::Response) -> Error {
    let status = res.status();
    let message = res
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("identity provider returned {status}"));
    Error::Auth(message)
}
