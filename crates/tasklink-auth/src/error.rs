//! Authentication failure causes.

use tasklink_browser::BrowserError;
use tasklink_captcha::CaptchaError;
use thiserror::Error;

/// Result alias for authentication.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Terminal failure of a login attempt.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Sign-in control missing or not clickable within the bound
    #[error("sign-in control not found")]
    LoginControlNotFound,

    /// The challenge widget was present but could not be solved
    #[error("challenge unsolved: {0}")]
    ChallengeUnsolved(#[source] CaptchaError),

    /// A credential input did not become interactable within the bound
    #[error("credential field not found: {field}")]
    CredentialFieldsNotFound {
        /// Which field (`email` or `password`)
        field: &'static str,
    },

    /// Submit control missing within the bound
    #[error("submit control not found")]
    SubmitControlNotFound,

    /// No authenticated marker after submitting
    #[error("credentials rejected or page changed unexpectedly")]
    CredentialsRejectedOrUnknown,

    /// The browser session itself failed
    #[error("browser session error: {0}")]
    Session(#[from] BrowserError),
}

impl AuthError {
    /// Whether the failure came from the captcha solver.
    #[must_use]
    pub fn is_challenge_failure(&self) -> bool {
        matches!(self, Self::ChallengeUnsolved(_))
    }
}
