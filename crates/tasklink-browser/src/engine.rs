use crate::error::{BrowserError, Result};
use crate::fingerprint::LaunchProfile;
use crate::session::{BrowserSession, PageElement};
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use tasklink_core::{BrowserConfig, PollPolicy};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const INTERACTABLE_JS: &str = r"function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    return !this.disabled
        && style.visibility !== 'hidden'
        && style.display !== 'none'
        && rect.width > 0
        && rect.height > 0;
}";

const CLEAR_JS: &str = r"function() {
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
}";

/// Browser session backed by a Chrome instance over CDP.
pub struct ChromeSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    poll: PollPolicy,
    attached: bool,
}

impl ChromeSession {
    /// Launch Chrome, or attach to `remote_debugging_url` when configured.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let profile = LaunchProfile::from(config);

        let (browser, mut handler) = match &config.remote_debugging_url {
            Some(url) => {
                tracing::info!(url = %url, "Attaching to running browser");
                Browser::connect(url.as_str())
                    .await
                    .map_err(|e| BrowserError::ChromiumError(e.to_string()))?
            }
            None => {
                let mut builder = ChromeConfig::builder()
                    .no_sandbox()
                    .window_size(profile.viewport_width, profile.viewport_height)
                    .request_timeout(config.wait_timeout())
                    .args(profile.args());
                if !profile.headless {
                    builder = builder.with_head();
                }
                let chrome_config = builder.build().map_err(BrowserError::ChromiumError)?;

                tracing::info!(headless = profile.headless, "Launching browser");
                Browser::launch(chrome_config)
                    .await
                    .map_err(|e| BrowserError::ChromiumError(e.to_string()))?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "Browser handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            poll: PollPolicy::from(config),
            attached: config.remote_debugging_url.is_some(),
        })
    }
}

// chromiumoxide kills a launched child process when `Browser` drops.
impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn boxed(element: Element) -> Box<dyn PageElement> {
    Box::new(ChromeElement { element })
}

/// Lookup failures the browser itself answered. Anything else means the
/// connection is broken.
fn is_no_match(error: &CdpError) -> bool {
    matches!(error, CdpError::Chrome(_) | CdpError::NotFound)
}

fn lookup(
    result: std::result::Result<Element, CdpError>,
    selector: &str,
) -> Result<Option<Box<dyn PageElement>>> {
    match result {
        Ok(element) => Ok(Some(boxed(element))),
        Err(e) if is_no_match(&e) => {
            tracing::trace!(selector, error = %e, "No element matched");
            Ok(None)
        }
        Err(e) => Err(BrowserError::ChromiumError(format!("lookup {selector}: {e}"))),
    }
}

#[async_trait::async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        url::Url::parse(url)
            .map_err(|e| BrowserError::NavigationError(format!("invalid URL {url}: {e}")))?;

        tracing::debug!(url = %url, "Navigating");
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn find_element(&self, selector: &str) -> Result<Option<Box<dyn PageElement>>> {
        lookup(self.page.find_element(selector).await, selector)
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(elements.into_iter().map(boxed).collect())
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    async fn close(&self) -> Result<()> {
        if let Err(e) = self.page.clone().close().await {
            tracing::debug!(error = %e, "Page already gone");
        }

        // An attached browser belongs to whoever started it.
        if self.attached {
            self.handler.abort();
            tracing::info!("Detached from browser");
            return Ok(());
        }

        let mut browser = self.browser.lock().await;
        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::ChromiumError(e.to_string()));
        if closed.is_ok() {
            if let Err(e) = browser.wait().await {
                tracing::warn!(error = %e, "Browser process did not exit cleanly");
            }
        }
        self.handler.abort();

        tracing::info!("Browser closed");
        closed
    }
}

struct ChromeElement {
    element: Element,
}

impl ChromeElement {
    async fn run(&self, function: &str) -> Result<Value> {
        let returns = self
            .element
            .call_js_fn(function, false)
            .await
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?;
        Ok(returns.result.value.unwrap_or(Value::Null))
    }
}

#[async_trait::async_trait]
impl PageElement for ChromeElement {
    async fn text(&self) -> Result<String> {
        self.element
            .inner_text()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn click(&self) -> Result<()> {
        self.element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn clear(&self) -> Result<()> {
        self.run(CLEAR_JS).await.map(|_| ())
    }

    async fn send_keys(&self, text: &str) -> Result<()> {
        self.element
            .focus()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        self.element
            .type_str(text)
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn is_interactable(&self) -> Result<bool> {
        Ok(self.run(INTERACTABLE_JS).await?.as_bool().unwrap_or(false))
    }

    async fn find_element(&self, selector: &str) -> Result<Option<Box<dyn PageElement>>> {
        lookup(self.element.find_element(selector).await, selector)
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>> {
        let elements = self
            .element
            .find_elements(selector)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(elements.into_iter().map(boxed).collect())
    }

    async fn call_js(&self, function: &str) -> Result<Value> {
        self.run(function).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::WaitCondition;
    use std::time::Duration;

    #[test]
    fn test_lookup_separates_misses_from_broken_sessions() {
        let missing = CdpError::Chrome(chromiumoxide::types::Error {
            code: -32000,
            message: "Could not find node with given id".to_string(),
        });
        assert!(lookup(Err(missing), "#absent").expect("miss").is_none());
        assert!(lookup(Err(CdpError::NotFound), "#absent").expect("miss").is_none());

        for broken in [CdpError::NoResponse, CdpError::Timeout] {
            assert!(matches!(
                lookup(Err(broken), "#tasks"),
                Err(BrowserError::ChromiumError(_))
            ));
        }
    }

    fn local_page(html: &str) -> String {
        format!("data:text/html,{html}")
    }

    #[tokio::test]
    #[ignore = "requires a local Chrome installation"]
    async fn test_launch_and_navigate() {
        let session = ChromeSession::launch(&BrowserConfig::default())
            .await
            .expect("launch chrome");

        session
            .navigate(&local_page("<p id='greeting'>hello</p>"))
            .await
            .expect("navigate");
        let element = session
            .wait_until(&WaitCondition::present("#greeting"), Duration::from_secs(5))
            .await
            .expect("element present");
        assert_eq!(element.text().await.expect("text"), "hello");

        session.close().await.expect("close");
    }

    #[tokio::test]
    #[ignore = "requires a local Chrome installation"]
    async fn test_missing_element_is_none() {
        let session = ChromeSession::launch(&BrowserConfig::default())
            .await
            .expect("launch chrome");
        session
            .navigate(&local_page("<p>empty</p>"))
            .await
            .expect("navigate");

        assert!(session.find_element("#absent").await.expect("lookup").is_none());
        session.close().await.expect("close");
    }

    #[tokio::test]
    #[ignore = "requires a local Chrome installation"]
    async fn test_closing_attached_session_leaves_browser_running() {
        let owner = ChromeSession::launch(&BrowserConfig::default())
            .await
            .expect("launch chrome");
        let address = owner.browser.lock().await.websocket_address().clone();

        let config = BrowserConfig {
            remote_debugging_url: Some(address),
            ..BrowserConfig::default()
        };
        let attached = ChromeSession::launch(&config).await.expect("attach");
        attached.close().await.expect("detach");

        owner
            .navigate(&local_page("<p id='alive'>still here</p>"))
            .await
            .expect("owner still usable");
        assert!(owner.find_element("#alive").await.expect("lookup").is_some());
        owner.close().await.expect("close");
    }
}
