use std::sync::Arc;

use api_types::{
    ErrorResponse,
    budget::{Budget, BudgetUpdate},
    expense::{Expense, ExpenseNew, ExpenseUpdate},
    stats::ExpenseStats,
};
use reqwest::{StatusCode, Url, header::AUTHORIZATION};
use serde::de::DeserializeOwned;

use crate::{
    error::{Error, Result},
    identity::{IdentityProvider, parse_base_url},
    session::SessionStore,
};

/// The remote expense API, as consumed by the dashboard.
///
/// One method per endpoint; no retry, no backoff. A failed call surfaces
/// immediately to the caller.
#[allow(async_fn_in_trait)]
pub trait ExpenseApi {
    async fn expenses(&self) -> Result<Vec<Expense>>;
    async fn create_expense(&self, new: ExpenseNew) -> Result<Expense>;
    async fn update_expense(&self, id: &str, update: ExpenseUpdate) -> Result<Expense>;
    async fn delete_expense(&self, id: &str) -> Result<()>;
    /// `None` means the server has no budget record for this user; the
    /// caller decides what to fall back to.
    async fn budget(&self) -> Result<Option<Budget>>;
    async fn update_budget(&self, amount: f64) -> Result<Budget>;
    async fn stats(&self) -> Result<ExpenseStats>;
}

/// Authenticated HTTP client for the expense API.
///
/// The bearer token is fetched fresh from the session store on every call,
/// never cached in headers. A missing token fails the call before any
/// request is issued.
pub struct HttpGateway<P> {
    base_url: Url,
    http: reqwest::Client,
    sessions: Arc<SessionStore<P>>,
}

impl<P: IdentityProvider> HttpGateway<P> {
    pub fn new(base_url: &str, sessions: Arc<SessionStore<P>>) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http: reqwest::Client::new(),
            sessions,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| Error::Validation(format!("invalid api endpoint: {err}")))
    }

    fn bearer(&self) -> Result<String> {
        self.sessions.id_token()
    }

    async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T> {
        if res.status().is_success() {
            return res.json::<T>().await.map_err(Error::Transport);
        }
        Err(api_error(res).await)
    }
}

impl<P: IdentityProvider> ExpenseApi for HttpGateway<P> {
    async fn expenses(&self) -> Result<Vec<Expense>> {
        let token = self.bearer()?;
        let endpoint = self.endpoint("expenses")?;
        tracing::debug!(%endpoint, "fetching expenses");
        let res = self
            .http
            .get(endpoint)
            .header(AUTHORIZATION, token)
            .send()
            .await?;
        Self::decode(res).await
    }

    async fn create_expense(&self, new: ExpenseNew) -> Result<Expense> {
        if new.category.trim().is_empty() {
            return Err(Error::Validation("category must not be empty".into()));
        }
        if !(new.amount > 0.0) {
            return Err(Error::Validation("amount must be positive".into()));
        }

        let token = self.bearer()?;
        let endpoint = self.endpoint("expenses")?;
        tracing::debug!(%endpoint, category = %new.category, "creating expense");
        let res = self
            .http
            .post(endpoint)
            .header(AUTHORIZATION, token)
            .json(&new)
            .send()
            .await?;
        Self::decode(res).await
    }

    async fn update_expense(&self, id: &str, update: ExpenseUpdate) -> Result<Expense> {
        if let Some(amount) = update.amount
            && !(amount > 0.0)
        {
            return Err(Error::Validation("amount must be positive".into()));
        }

        let token = self.bearer()?;
        let endpoint = self.endpoint(&format!("expenses/{id}"))?;
        tracing::debug!(%endpoint, "updating expense");
        let res = self
            .http
            .put(endpoint)
            .header(AUTHORIZATION, token)
            .json(&update)
            .send()
            .await?;
        Self::decode(res).await
    }

    async fn delete_expense(&self, id: &str) -> Result<()> {
        let token = self.bearer()?;
        let endpoint = self.endpoint(&format!("expenses/{id}"))?;
        tracing::debug!(%endpoint, "deleting expense");
        let res = self
            .http
            .delete(endpoint)
            .header(AUTHORIZATION, token)
            .send()
            .await?;
        if res.status().is_success() {
            return Ok(());
        }
        Err(api_error(res).await)
    }

    async fn budget(&self) -> Result<Option<Budget>> {
        let token = self.bearer()?;
        let endpoint = self.endpoint("budget")?;
        tracing::debug!(%endpoint, "fetching budget");
        let res = self
            .http
            .get(endpoint)
            .header(AUTHORIZATION, token)
            .send()
            .await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        // The body may be `null` when no budget was ever set.
        Self::decode::<Option<Budget>>(res).await
    }

    async fn update_budget(&self, amount: f64) -> Result<Budget> {
        if !(amount > 0.0) {
            return Err(Error::Validation("budget must be positive".into()));
        }

        let token = self.bearer()?;
        let endpoint = self.endpoint("budget")?;
        tracing::debug!(%endpoint, amount, "updating budget");
        let res = self
            .http
            .put(endpoint)
            .header(AUTHORIZATION, token)
            .json(&BudgetUpdate { amount })
            .send()
            .await?;
        Self::decode(res).await
    }

    async fn stats(&self) -> Result<ExpenseStats> {
        let token = self.bearer()?;
        let endpoint = self.endpoint("stats")?;
        tracing::debug!(%endpoint, "fetching stats");
        let res = self
            .http
            .get(endpoint)
            .header(AUTHORIZATION, token)
            .send()
            .await?;
        Self::decode(res).await
    }
}

async fn api_error(res: reqwest::Response) -> Error {
    let status = res.status().as_u16();
    let message = res
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| "unknown error".to_string());
    Error::Api { status, message }
}
