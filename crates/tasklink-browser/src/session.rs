use crate::error::{BrowserError, Result};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tasklink_core::PollPolicy;
use tokio::time::Instant;

/// Condition a bounded wait is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// At least one element matches the selector
    Present(String),
    /// A matching element exists and can be interacted with
    Clickable(String),
}

impl WaitCondition {
    /// Wait for presence of `selector`.
    pub fn present(selector: impl Into<String>) -> Self {
        Self::Present(selector.into())
    }

    /// Wait for `selector` to become clickable.
    pub fn clickable(selector: impl Into<String>) -> Self {
        Self::Clickable(selector.into())
    }

    /// Selector the condition is evaluated against.
    #[must_use]
    pub fn selector(&self) -> &str {
        match self {
            Self::Present(selector) | Self::Clickable(selector) => selector,
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(selector) => write!(f, "presence of '{selector}'"),
            Self::Clickable(selector) => write!(f, "clickable '{selector}'"),
        }
    }
}

/// An element on the current page.
#[async_trait::async_trait]
pub trait PageElement: Send + Sync {
    /// Rendered text of the element and its descendants
    async fn text(&self) -> Result<String>;

    /// Attribute value, `None` if the attribute is absent
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Simulated pointer click
    async fn click(&self) -> Result<()>;

    /// Clear an input's value
    async fn clear(&self) -> Result<()>;

    /// Type text into the element
    async fn send_keys(&self, text: &str) -> Result<()>;

    /// Visible and enabled
    async fn is_interactable(&self) -> Result<bool>;

    /// First descendant matching `selector`
    async fn find_element(&self, selector: &str) -> Result<Option<Box<dyn PageElement>>>;

    /// All descendants matching `selector`
    async fn find_elements(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>>;

    /// Run a JavaScript function declaration with `this` bound to the element.
    async fn call_js(&self, function: &str) -> Result<Value>;
}

/// Browser capability consumed by the authentication and scraping stages.
#[async_trait::async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to a URL and wait for the load event
    async fn navigate(&self, url: &str) -> Result<()>;

    /// URL of the current page
    async fn current_url(&self) -> Result<String>;

    /// First element matching `selector` on the current page
    async fn find_element(&self, selector: &str) -> Result<Option<Box<dyn PageElement>>>;

    /// All elements matching `selector` on the current page
    async fn find_elements(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>>;

    /// Evaluate a script in the page and return its JSON value
    async fn execute_script(&self, script: &str) -> Result<Value>;

    /// Probe interval used by [`BrowserSession::wait_until`]
    fn poll_policy(&self) -> PollPolicy;

    /// Release the session
    async fn close(&self) -> Result<()>;

    /// Poll until `condition` holds or `timeout` elapses.
    ///
    /// Returns the matching element; running out of time is
    /// [`BrowserError::Timeout`].
    async fn wait_until(
        &self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<Box<dyn PageElement>> {
        let policy = self.poll_policy().with_max_wait(timeout);
        let deadline = Instant::now() + policy.max_wait;

        loop {
            if let Some(element) = self.find_element(condition.selector()).await? {
                let ready = match condition {
                    WaitCondition::Present(_) => true,
                    WaitCondition::Clickable(_) => {
                        element.is_interactable().await.unwrap_or(false)
                    }
                };
                if ready {
                    return Ok(element);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "{condition} not reached within {timeout:?}"
                )));
            }
            tokio::time::sleep(policy.next_delay(deadline - now)).await;
        }
    }
}
