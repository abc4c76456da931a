pub mod client;
pub mod form;

use async_trait::async_trait;

use crate::models::{AuthError, AuthSession};

pub use client::HostedAuthClient;
pub use form::{AuthForm, AuthTab, FormOutcome};

pub type AuthResult = std::result::Result<AuthSession, AuthError>;

/// Email/password operations of an external authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult;
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult;
}
