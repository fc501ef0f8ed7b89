//! Marketplace sign-in.

use crate::error::{AuthError, Result};
use crate::outcome::{AuthOutcome, LoginState};
use crate::selectors::LoginSelectors;
use serde_json::Value;
use std::time::Duration;
use tasklink_browser::{BrowserError, BrowserSession, PageElement, WaitCondition};
use tasklink_captcha::{CaptchaSolver, SolveRequest};
use tasklink_core::{AppConfig, BrowserConfig, Credentials};

const ENABLE_AND_SCROLL_JS: &str = r"function() {
    this.removeAttribute('disabled');
    this.disabled = false;
    this.scrollIntoView(true);
}";

const SCRIPT_CLICK_JS: &str = "function() { this.click(); }";

/// Pauses and bounds of the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTimings {
    /// After loading the home page
    pub settle: Duration,
    /// After opening the sign-in modal
    pub modal_settle: Duration,
    /// After scrolling the submit control into view
    pub scroll_settle: Duration,
    /// After submitting, before verifying
    pub post_submit: Duration,
    /// Bound on every element wait
    pub wait_timeout: Duration,
}

impl From<&BrowserConfig> for LoginTimings {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            settle: Duration::from_millis(config.settle_ms),
            modal_settle: Duration::from_millis(config.modal_settle_ms),
            scroll_settle: Duration::from_millis(500),
            post_submit: Duration::from_millis(config.post_submit_ms),
            wait_timeout: config.wait_timeout(),
        }
    }
}

impl Default for LoginTimings {
    fn default() -> Self {
        Self::from(&BrowserConfig::default())
    }
}

/// Signs a browser session into the marketplace.
pub struct LoginOrchestrator {
    home_url: String,
    login_url: String,
    credentials: Credentials,
    solver: Box<dyn CaptchaSolver>,
    selectors: LoginSelectors,
    timings: LoginTimings,
}

impl LoginOrchestrator {
    /// Create an orchestrator with default selectors and timings.
    pub fn new(
        home_url: impl Into<String>,
        login_url: impl Into<String>,
        credentials: Credentials,
        solver: Box<dyn CaptchaSolver>,
    ) -> Self {
        Self {
            home_url: home_url.into(),
            login_url: login_url.into(),
            credentials,
            solver,
            selectors: LoginSelectors::default(),
            timings: LoginTimings::default(),
        }
    }

    /// Create an orchestrator from the application configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig, solver: Box<dyn CaptchaSolver>) -> Self {
        Self::new(
            &config.marketplace.home_url,
            &config.marketplace.login_url,
            config.credentials(),
            solver,
        )
        .with_timings(LoginTimings::from(&config.browser))
    }

    /// Override the selectors.
    #[must_use]
    pub fn with_selectors(mut self, selectors: LoginSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Override the timings.
    #[must_use]
    pub fn with_timings(mut self, timings: LoginTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Run the login flow once.
    pub async fn authenticate(&self, session: &dyn BrowserSession) -> Result<AuthOutcome> {
        tracing::info!(user = %self.credentials.masked_username(), "Authenticating");

        let mut state = LoginState::Start;
        let result = self.run(session, &mut state).await;

        match &result {
            Ok(outcome) => tracing::info!(?outcome, "Authentication finished"),
            Err(e) => {
                state.advance(LoginState::Failed);
                tracing::error!(error = %e, "Authentication failed");
            }
        }
        result
    }

    async fn run(&self, session: &dyn BrowserSession, state: &mut LoginState) -> Result<AuthOutcome> {
        tracing::debug!(url = %self.home_url, "Opening home page");
        session.navigate(&self.home_url).await?;
        tokio::time::sleep(self.timings.settle).await;

        if self.is_authenticated(session).await? {
            state.advance(LoginState::AlreadyAuthenticated);
            return Ok(AuthOutcome::AlreadyAuthenticated);
        }

        self.open_modal(session).await?;
        state.advance(LoginState::ModalOpened);
        tokio::time::sleep(self.timings.modal_settle).await;

        let token = match self.detect_site_key(session).await? {
            Some(site_key) => {
                state.advance(LoginState::ChallengeDetected);
                state.advance(LoginState::ChallengeSolving);
                let request = SolveRequest::new(&self.login_url, site_key);
                let token = self
                    .solver
                    .solve(&request)
                    .await
                    .map_err(AuthError::ChallengeUnsolved)?;
                Some(token)
            }
            None => {
                tracing::info!("No challenge on the login form");
                None
            }
        };

        self.fill_field(session, &self.selectors.email, "email", self.credentials.username())
            .await?;
        self.fill_field(
            session,
            &self.selectors.password,
            "password",
            self.credentials.password(),
        )
        .await?;
        state.advance(LoginState::FormFilled);

        if let Some(token) = &token {
            self.inject_token(session, token).await?;
        }

        self.submit(session).await?;
        state.advance(LoginState::Submitted);
        tokio::time::sleep(self.timings.post_submit).await;

        if self.is_authenticated(session).await? {
            state.advance(LoginState::Verified);
            Ok(AuthOutcome::Verified {
                challenge_solved: token.is_some(),
            })
        } else {
            Err(AuthError::CredentialsRejectedOrUnknown)
        }
    }

    async fn is_authenticated(&self, session: &dyn BrowserSession) -> Result<bool> {
        Ok(session
            .find_element(&self.selectors.profile_link)
            .await?
            .is_some())
    }

    async fn open_modal(&self, session: &dyn BrowserSession) -> Result<()> {
        let control = session
            .wait_until(
                &WaitCondition::clickable(&self.selectors.sign_in),
                self.timings.wait_timeout,
            )
            .await
            .map_err(|e| bounded(e, AuthError::LoginControlNotFound))?;

        control.click().await.map_err(|e| {
            tracing::warn!(error = %e, "Sign-in control did not accept the click");
            AuthError::LoginControlNotFound
        })
    }

    async fn detect_site_key(&self, session: &dyn BrowserSession) -> Result<Option<String>> {
        let Some(widget) = session.find_element(&self.selectors.challenge).await? else {
            return Ok(None);
        };

        let site_key = widget
            .attribute("data-sitekey")
            .await?
            .filter(|key| !key.trim().is_empty());
        if let Some(key) = &site_key {
            tracing::info!(site_key = %key.chars().take(20).collect::<String>(), "Challenge detected");
        }
        Ok(site_key)
    }

    async fn fill_field(
        &self,
        session: &dyn BrowserSession,
        selector: &str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        let input = session
            .wait_until(&WaitCondition::clickable(selector), self.timings.wait_timeout)
            .await
            .map_err(|e| bounded(e, AuthError::CredentialFieldsNotFound { field }))?;

        tracing::debug!(field, "Filling credential field");
        input.clear().await?;
        input.send_keys(value).await?;
        Ok(())
    }

    async fn inject_token(&self, session: &dyn BrowserSession, token: &str) -> Result<()> {
        let script = token_injection_script(&self.selectors.response_field_id, token);
        match session.execute_script(&script).await? {
            Value::Bool(true) => tracing::debug!("Challenge token injected"),
            _ => tracing::warn!(
                field = %self.selectors.response_field_id,
                "Challenge response field not found, submitting anyway"
            ),
        }
        Ok(())
    }

    async fn submit(&self, session: &dyn BrowserSession) -> Result<()> {
        let button: Box<dyn PageElement> = session
            .wait_until(
                &WaitCondition::present(&self.selectors.submit),
                self.timings.wait_timeout,
            )
            .await
            .map_err(|e| bounded(e, AuthError::SubmitControlNotFound))?;

        button.call_js(ENABLE_AND_SCROLL_JS).await?;
        tokio::time::sleep(self.timings.scroll_settle).await;

        tracing::debug!("Submitting login form");
        button.call_js(SCRIPT_CLICK_JS).await?;
        Ok(())
    }
}

/// A timeout becomes the step's own cause; anything else is a session fault.
fn bounded(error: BrowserError, cause: AuthError) -> AuthError {
    if error.is_timeout() {
        tracing::warn!(error = %error, "Login step timed out");
        cause
    } else {
        AuthError::Session(error)
    }
}

/// Script writing `token` into both `innerHTML` and `value` of the field with `field_id`.
///
/// Evaluates to `true` when the field exists.
fn token_injection_script(field_id: &str, token: &str) -> String {
    let id = Value::String(field_id.to_string());
    let token = Value::String(token.to_string());
    format!(
        "(function() {{ var field = document.getElementById({id}); \
         if (!field) {{ return false; }} \
         field.innerHTML = {token}; field.value = {token}; return true; }})()"
    )
}
