//! Selectors for the sign-in page and modal.

use serde::{Deserialize, Serialize};

/// CSS selectors for the marketplace login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSelectors {
    /// Present only for a signed-in user
    pub profile_link: String,
    /// Opens the sign-in modal
    pub sign_in: String,
    /// reCAPTCHA widget carrying `data-sitekey`
    pub challenge: String,
    /// E-mail input
    pub email: String,
    /// Password input
    pub password: String,
    /// Submit button, possibly disabled until client-side validation runs
    pub submit: String,
    /// Element id of the hidden challenge response field
    pub response_field_id: String,
}

impl Default for LoginSelectors {
    fn default() -> Self {
        Self {
            profile_link: "a[href='/profile']".to_string(),
            sign_in: "a[href='/user/signIn'][rel='modal:open']".to_string(),
            challenge: "[data-sitekey]".to_string(),
            email: "input.js-email[name='e_mail']".to_string(),
            password: "input.js-password[name='password']".to_string(),
            submit: "button.js-send-sign-in[type='submit']".to_string(),
            response_field_id: "g-recaptcha-response".to_string(),
        }
    }
}
