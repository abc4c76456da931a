//! State behind the sign-in / sign-up dialog.
//!
//! The form owns the field values, the selected tab and the notice shown
//! above the sign-in tab. Submissions talk to an [`AuthProvider`] and report
//! what the dialog should do next as a [`FormOutcome`].

use super::AuthProvider;
use crate::models::AuthErrorKind;

pub const PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const FIELDS_REQUIRED: &str = "Please fill in all fields";
pub const USER_EXISTS_NOTICE: &str = "Account already exists! Please sign in instead.";
pub const CONFIRM_EMAIL_NOTICE: &str = "Check your email for the confirmation link!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthTab {
    #[default]
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// The provider accepted the request; the dialog has closed.
    Completed { notice: Option<String> },
    /// Show a blocking message; the dialog stays open.
    Alert(String),
    /// Sign-up hit an existing account; the sign-in tab is now active.
    RedirectedToSignIn,
}

#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    active_tab: AuthTab,
    loading: bool,
    open: bool,
    user_exists_message: Option<String>,
}

impl AuthForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tab(&self) -> AuthTab {
        self.active_tab
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn user_exists_message(&self) -> Option<&str> {
        self.user_exists_message.as_deref()
    }

    pub fn open(&mut self) {
        self.open = true;
        self.user_exists_message = None;
        self.active_tab = AuthTab::SignIn;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn select_tab(&mut self, tab: AuthTab) {
        self.active_tab = tab;
        self.user_exists_message = None;
    }

    fn missing_fields(&self) -> bool {
        self.email.trim().is_empty() || self.password.is_empty()
    }

    pub async fn submit_sign_in<P>(&mut self, provider: &P) -> FormOutcome
    where
        P: AuthProvider + ?Sized,
    {
        self.user_exists_message = None;
        if self.missing_fields() {
            return FormOutcome::Alert(FIELDS_REQUIRED.to_string());
        }

        self.loading = true;
        let result = provider.sign_in(self.email.trim(), &self.password).await;
        self.loading = false;

        match result {
            Ok(_) => {
                log::info!("Signed in {}", self.email.trim());
                self.close();
                FormOutcome::Completed { notice: None }
            }
            Err(err) => FormOutcome::Alert(err.message),
        }
    }

    pub async fn submit_sign_up<P>(&mut self, provider: &P) -> FormOutcome
    where
        P: AuthProvider + ?Sized,
    {
        if self.missing_fields() || self.confirm_password.is_empty() {
            return FormOutcome::Alert(FIELDS_REQUIRED.to_string());
        }
        if self.password != self.confirm_password {
            return FormOutcome::Alert(PASSWORD_MISMATCH.to_string());
        }

        self.user_exists_message = None;
        self.loading = true;
        let result = provider.sign_up(self.email.trim(), &self.password).await;
        self.loading = false;

        match result {
            Ok(_) => {
                self.close();
                FormOutcome::Completed {
                    notice: Some(CONFIRM_EMAIL_NOTICE.to_string()),
                }
            }
            Err(err) if err.kind() == AuthErrorKind::UserAlreadyExists => {
                log::info!("Sign-up for existing account, switching to sign-in");
                self.active_tab = AuthTab::SignIn;
                self.user_exists_message = Some(USER_EXISTS_NOTICE.to_string());
                self.password.clear();
                self.confirm_password.clear();
                FormOutcome::RedirectedToSignIn
            }
            Err(err) => FormOutcome::Alert(err.message),
        }
    }
}
