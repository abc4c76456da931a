use serde::{Deserialize, Serialize};

/// Structured codes the hosted provider uses for an email that already has an account.
pub const USER_EXISTS_CODES: &[&str] = &[
    "user_already_exists",
    "email_exists",
    "identity_already_exists",
];

/// Only consulted when the provider sends no error code at all.
const USER_EXISTS_PHRASES: &[&str] = &[
    "already registered",
    "user already exists",
    "already been registered",
    "email already in use",
];

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorKind {
    UserAlreadyExists,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub message: String,
    pub code: Option<String>,
    pub status: Option<u16>,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            status: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn kind(&self) -> AuthErrorKind {
        match self.code.as_deref() {
            Some(code) if USER_EXISTS_CODES.contains(&code) => AuthErrorKind::UserAlreadyExists,
            Some(_) => AuthErrorKind::Other,
            None => {
                let message = self.message.to_lowercase();
                if USER_EXISTS_PHRASES.iter().any(|p| message.contains(p)) {
                    AuthErrorKind::UserAlreadyExists
                } else {
                    AuthErrorKind::Other
                }
            }
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AuthError {}

/// Success body of the token and signup endpoints. Signup with email
/// confirmation enabled returns the user object at the top level.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthProviderResponse {
    pub access_token: Option<String>,
    pub user: Option<AuthUser>,
    pub id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthUser {
    pub id: Option<String>,
    pub email: Option<String>,
}

impl From<AuthProviderResponse> for AuthSession {
    fn from(response: AuthProviderResponse) -> Self {
        let (user_id, email) = match response.user {
            Some(user) => (user.id, user.email),
            None => (response.id, response.email),
        };
        AuthSession {
            access_token: response.access_token,
            user_id,
            email,
        }
    }
}

/// Error body of the hosted provider. Older deployments use
/// `error`/`error_description`; newer ones `error_code`/`msg`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthProviderError {
    pub error_code: Option<String>,
    pub code: Option<serde_json::Value>,
    pub error: Option<String>,
    pub msg: Option<String>,
    pub message: Option<String>,
    pub error_description: Option<String>,
}

impl AuthProviderError {
    pub fn into_auth_error(self, status: u16) -> AuthError {
        let message = self
            .msg
            .or(self.error_description)
            .or(self.message)
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| format!("Authentication failed with status {}", status));

        // `code` is numeric (the HTTP status) on some versions, a string on others.
        let code = self
            .error_code
            .or_else(|| match self.code {
                Some(serde_json::Value::String(code)) => Some(code),
                _ => None,
            })
            .or(self.error);

        let mut err = AuthError::new(message).with_status(status);
        err.code = code;
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_uses_code_first() {
        let err = AuthError::new("whatever").with_code("user_already_exists");
        assert_eq!(err.kind(), AuthErrorKind::UserAlreadyExists);

        // a code that is not an exists code wins over a matching message
        let err = AuthError::new("User already registered").with_code("weak_password");
        assert_eq!(err.kind(), AuthErrorKind::Other);
    }

    #[test]
    fn test_kind_falls_back_to_message_without_code() {
        assert_eq!(
            AuthError::new("User Already Registered").kind(),
            AuthErrorKind::UserAlreadyExists
        );
        assert_eq!(
            AuthError::new("That email already in use").kind(),
            AuthErrorKind::UserAlreadyExists
        );
        assert_eq!(AuthError::new("Invalid login credentials").kind(), AuthErrorKind::Other);
    }

    #[test]
    fn test_provider_error_new_format() {
        let body: AuthProviderError = serde_json::from_str(
            r#"{"code": 422, "error_code": "user_already_exists", "msg": "User already registered"}"#,
        )
        .unwrap();
        let err = body.into_auth_error(422);
        assert_eq!(err.message, "User already registered");
        assert_eq!(err.code.as_deref(), Some("user_already_exists"));
        assert_eq!(err.status, Some(422));
    }

    #[test]
    fn test_provider_error_legacy_format() {
        let body: AuthProviderError = serde_json::from_str(
            r#"{"error": "invalid_grant", "error_description": "Invalid login credentials"}"#,
        )
        .unwrap();
        let err = body.into_auth_error(400);
        assert_eq!(err.message, "Invalid login credentials");
        assert_eq!(err.code.as_deref(), Some("invalid_grant"));
        assert_eq!(err.kind(), AuthErrorKind::Other);
    }

    #[test]
    fn test_session_from_signup_body() {
        let body: AuthProviderResponse =
            serde_json::from_str(r#"{"id": "u-1", "email": "a@b.co"}"#).unwrap();
        let session = AuthSession::from(body);
        assert_eq!(session.user_id.as_deref(), Some("u-1"));
        assert!(session.access_token.is_none());
    }
}
