//! Client core for the tally expense tracker.
//!
//! Layers, leaf-first:
//!
//! - [`session`]: credential cache plus the bridge to the identity provider.
//! - [`auth`]: process-wide `{is_authenticated, is_loading, session}` state.
//! - [`gateway`]: authenticated CRUD against the remote expense API.
//! - [`dashboard`]: derived view state and mutation orchestration.
//!
//! Everything network-facing is async on tokio; all failures follow the
//! taxonomy in [`error::Error`].

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod session;

pub use auth::AuthContext;
pub use dashboard::{BudgetAmount, BudgetLevel, Dashboard, FALLBACK_BUDGET, Phase};
pub use error::{Error, Result};
pub use gateway::{ExpenseApi, HttpGateway};
pub use identity::{HttpIdentityProvider, IdentityProvider};
pub use session::{Session, SessionStore};
