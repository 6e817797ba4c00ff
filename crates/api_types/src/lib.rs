use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Error body returned by both the expense API and the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub mod expense {
    use super::*;

    /// A recorded expense, as returned by the server.
    ///
    /// Identity (`id`, `user_id`) and timestamps are server-assigned and
    /// immutable once created.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Expense {
        pub id: String,
        pub user_id: String,
        pub category: String,
        pub amount: f64,
        #[serde(default)]
        pub note: Option<String>,
        /// Calendar date the expense occurred on (not a timestamp).
        pub date: NaiveDate,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Request body for `POST /expenses`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseNew {
        pub category: String,
        pub amount: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub note: Option<String>,
        pub date: NaiveDate,
    }

    /// Request body for `PUT /expenses/{id}`. Absent fields are left as-is.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub category: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub note: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub date: Option<NaiveDate>,
    }
}

pub mod budget {
    use super::*;

    /// The per-user monthly budget. Singleton with upsert semantics; the
    /// server keeps no history.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Budget {
        pub user_id: String,
        pub amount: f64,
        #[serde(default)]
        pub updated_at: Option<DateTime<Utc>>,
    }

    /// Request body for `PUT /budget`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        pub amount: f64,
    }
}

pub mod stats {
    use super::*;

    /// Server-computed aggregate over the user's expenses.
    ///
    /// Never derived client-side; the client re-fetches after every mutation
    /// instead of duplicating the server's aggregation.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseStats {
        pub total_expenses: f64,
        pub expense_count: u64,
        /// category name -> summed amount
        pub category_breakdown: BTreeMap<String, f64>,
        /// month key (e.g. "2026-08") -> summed amount
        pub monthly_breakdown: BTreeMap<String, f64>,
        pub average_expense: f64,
    }
}

pub mod auth {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SignUpRequest {
        pub client_id: String,
        pub email: String,
        pub password: String,
        pub name: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ConfirmRequest {
        pub client_id: String,
        pub email: String,
        pub code: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResendCodeRequest {
        pub client_id: String,
        pub email: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SignInRequest {
        pub client_id: String,
        pub email: String,
        pub password: String,
    }

    /// Credential bundle issued by the identity provider on sign-in.
    ///
    /// The id token is sent as the bearer credential on every API call;
    /// lifetime is bounded by `expires_at`, there is no client-side refresh.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SessionTokens {
        pub id_token: String,
        pub expires_at: DateTime<Utc>,
    }
}
