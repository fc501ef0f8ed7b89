//! Offline browser session over captured HTML.
//!
//! Pages are registered by URL and parsed with `scraper` on every lookup.
//! Clicks can be wired to page transitions with [`SnapshotSession::on_click`],
//! which is enough to replay the login modal and the task list without a
//! browser. Every interaction is appended to an action log.

use crate::error::{BrowserError, Result};
use crate::session::{BrowserSession, PageElement};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tasklink_core::PollPolicy;

/// Interaction recorded by a [`SnapshotSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotAction {
    Navigate(String),
    Click(String),
    Clear(String),
    SendKeys { target: String, text: String },
    Script(String),
}

#[derive(Debug, Default)]
struct SnapshotState {
    pages: HashMap<String, Arc<str>>,
    current: Option<String>,
    transitions: Vec<(String, String)>,
    actions: Vec<SnapshotAction>,
}

type SharedState = Arc<Mutex<SnapshotState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, SnapshotState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| BrowserError::InvalidSelector(selector.to_string()))
}

/// Position of an element in document order, stable across reparses of the same source.
fn node_index(document: &Html, element: ElementRef<'_>) -> Option<usize> {
    document
        .tree
        .root()
        .descendants()
        .position(|node| node.id() == element.id())
}

fn element_at(document: &Html, index: usize) -> Option<ElementRef<'_>> {
    document
        .tree
        .root()
        .descendants()
        .nth(index)
        .and_then(ElementRef::wrap)
}

fn describe(element: ElementRef<'_>) -> String {
    let value = element.value();
    let tag = value.name();
    if let Some(id) = value.id() {
        format!("{tag}#{id}")
    } else if let Some(name) = value.attr("name") {
        format!("{tag}[name='{name}']")
    } else if let Some(class) = value.classes().next() {
        format!("{tag}.{class}")
    } else {
        tag.to_string()
    }
}

/// Browser session replaying static HTML pages.
#[derive(Clone)]
pub struct SnapshotSession {
    state: SharedState,
    poll: PollPolicy,
}

impl std::fmt::Debug for SnapshotSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("SnapshotSession")
            .field("pages", &state.pages.keys().collect::<Vec<_>>())
            .field("current", &state.current)
            .finish_non_exhaustive()
    }
}

impl Default for SnapshotSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSession {
    /// Empty session with a 50 ms probe interval.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SharedState::default(),
            poll: PollPolicy::new(Duration::from_millis(50), Duration::from_secs(10)),
        }
    }

    /// Register the HTML served for `url`.
    #[must_use]
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        let html: String = html.into();
        lock(&self.state).pages.insert(url.into(), Arc::from(html));
        self
    }

    /// Load a page from an HTML file on disk.
    pub fn with_page_file(self, url: impl Into<String>, path: &Path) -> Result<Self> {
        let html = std::fs::read_to_string(path).map_err(|e| {
            BrowserError::SnapshotError(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(self.with_page(url, html))
    }

    /// Clicking an element matching `selector` moves the session to `target_url`.
    #[must_use]
    pub fn on_click(self, selector: impl Into<String>, target_url: impl Into<String>) -> Self {
        lock(&self.state)
            .transitions
            .push((selector.into(), target_url.into()));
        self
    }

    /// Override the probe interval used by bounded waits.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Interactions performed so far, oldest first.
    #[must_use]
    pub fn actions(&self) -> Vec<SnapshotAction> {
        lock(&self.state).actions.clone()
    }

    fn current_source(&self) -> Result<Arc<str>> {
        let state = lock(&self.state);
        let url = state
            .current
            .as_ref()
            .ok_or_else(|| BrowserError::NavigationError("no page loaded".to_string()))?;
        state
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| BrowserError::SnapshotError(format!("page vanished: {url}")))
    }

    fn select(&self, selector: &str, first_only: bool) -> Result<Vec<Box<dyn PageElement>>> {
        let selector = parse_selector(selector)?;
        let source = self.current_source()?;
        let document = Html::parse_document(&source);

        let matches = document.select(&selector).filter_map(|el| node_index(&document, el));
        let indices: Vec<usize> = if first_only {
            matches.take(1).collect()
        } else {
            matches.collect()
        };

        Ok(indices
            .into_iter()
            .map(|index| SnapshotElement::boxed(&self.state, &source, index))
            .collect())
    }
}

#[async_trait::async_trait]
impl BrowserSession for SnapshotSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.pages.contains_key(url) {
            return Err(BrowserError::NavigationError(format!("no snapshot for {url}")));
        }
        state.current = Some(url.to_string());
        state.actions.push(SnapshotAction::Navigate(url.to_string()));
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(lock(&self.state).current.clone().unwrap_or_default())
    }

    async fn find_element(&self, selector: &str) -> Result<Option<Box<dyn PageElement>>> {
        Ok(self.select(selector, true)?.into_iter().next())
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>> {
        self.select(selector, false)
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        lock(&self.state)
            .actions
            .push(SnapshotAction::Script(script.to_string()));
        Ok(Value::Null)
    }

    fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    async fn close(&self) -> Result<()> {
        lock(&self.state).current = None;
        Ok(())
    }
}

struct SnapshotElement {
    state: SharedState,
    source: Arc<str>,
    index: usize,
}

impl SnapshotElement {
    fn boxed(state: &SharedState, source: &Arc<str>, index: usize) -> Box<dyn PageElement> {
        Box::new(Self {
            state: Arc::clone(state),
            source: Arc::clone(source),
            index,
        })
    }

    fn with_element<R>(&self, f: impl FnOnce(&Html, ElementRef<'_>) -> R) -> Result<R> {
        let document = Html::parse_document(&self.source);
        let element = element_at(&document, self.index)
            .ok_or_else(|| BrowserError::SnapshotError("stale element".to_string()))?;
        Ok(f(&document, element))
    }

    fn record(&self, action: SnapshotAction) {
        lock(&self.state).actions.push(action);
    }

    fn select(&self, selector: &str, first_only: bool) -> Result<Vec<Box<dyn PageElement>>> {
        let selector = parse_selector(selector)?;
        let indices = self.with_element(|document, element| {
            let matches = element
                .select(&selector)
                .filter_map(|child| node_index(document, child));
            if first_only {
                matches.take(1).collect::<Vec<_>>()
            } else {
                matches.collect()
            }
        })?;

        Ok(indices
            .into_iter()
            .map(|index| Self::boxed(&self.state, &self.source, index))
            .collect())
    }

    fn follow_click(&self) -> Result<()> {
        let transitions = lock(&self.state).transitions.clone();
        let (label, target) = self.with_element(|_, element| {
            let target = transitions.iter().find_map(|(selector, url)| {
                Selector::parse(selector)
                    .ok()
                    .filter(|parsed| parsed.matches(&element))
                    .map(|_| url.clone())
            });
            (describe(element), target)
        })?;

        let mut state = lock(&self.state);
        state.actions.push(SnapshotAction::Click(label));
        if let Some(url) = target {
            if !state.pages.contains_key(&url) {
                return Err(BrowserError::NavigationError(format!("no snapshot for {url}")));
            }
            state.current = Some(url);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PageElement for SnapshotElement {
    async fn text(&self) -> Result<String> {
        self.with_element(|_, element| element.text().collect::<String>())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.with_element(|_, element| element.value().attr(name).map(str::to_string))
    }

    async fn click(&self) -> Result<()> {
        self.follow_click()
    }

    async fn clear(&self) -> Result<()> {
        let label = self.with_element(|_, element| describe(element))?;
        self.record(SnapshotAction::Clear(label));
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<()> {
        let target = self.with_element(|_, element| describe(element))?;
        self.record(SnapshotAction::SendKeys {
            target,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn is_interactable(&self) -> Result<bool> {
        self.with_element(|_, element| {
            let value = element.value();
            let hidden_input = value.name() == "input" && value.attr("type") == Some("hidden");
            let styled_hidden = value.attr("style").is_some_and(|style| {
                let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
                compact.contains("display:none") || compact.contains("visibility:hidden")
            });
            value.attr("disabled").is_none()
                && value.attr("hidden").is_none()
                && !hidden_input
                && !styled_hidden
        })
    }

    async fn find_element(&self, selector: &str) -> Result<Option<Box<dyn PageElement>>> {
        Ok(self.select(selector, true)?.into_iter().next())
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>> {
        self.select(selector, false)
    }

    async fn call_js(&self, function: &str) -> Result<Value> {
        self.record(SnapshotAction::Script(function.to_string()));
        if function.contains(".click()") {
            self.follow_click()?;
        }
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::WaitCondition;

    const HOME: &str = "https://market.test/";
    const MODAL: &str = "https://market.test/#modal";

    fn session() -> SnapshotSession {
        SnapshotSession::new()
            .with_page(
                HOME,
                r#"<html><body>
                    <a id="open" href="/user/signIn">Sign in</a>
                    <table>
                        <tr id="col_row_1"><td>one</td><td><a href="/c/1">Acme</a></td></tr>
                        <tr id="col_row_2"><td>two</td></tr>
                    </table>
                </body></html>"#,
            )
            .with_page(
                MODAL,
                r#"<html><body>
                    <input name="e_mail" class="js-email">
                    <input type="hidden" name="token">
                    <button disabled>Send</button>
                </body></html>"#,
            )
            .on_click("a#open", MODAL)
    }

    #[tokio::test]
    async fn test_navigate_requires_registered_page() {
        let session = session();
        assert!(session.navigate("https://elsewhere.test/").await.is_err());
        assert!(session.find_element("a").await.is_err());

        session.navigate(HOME).await.expect("navigate");
        assert_eq!(session.current_url().await.expect("url"), HOME);
    }

    #[tokio::test]
    async fn test_find_and_read_elements() {
        let session = session();
        session.navigate(HOME).await.expect("navigate");

        let rows = session.find_elements("tr").await.expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].attribute("id").await.expect("attr"),
            Some("col_row_1".to_string())
        );

        let cells = rows[0].find_elements("td").await.expect("cells");
        assert_eq!(cells[0].text().await.expect("text"), "one");

        let link = cells[1].find_element("a").await.expect("lookup").expect("link");
        assert_eq!(link.attribute("href").await.expect("attr"), Some("/c/1".to_string()));
        assert!(cells[0].find_element("a").await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn test_click_follows_transition() {
        let session = session();
        session.navigate(HOME).await.expect("navigate");

        let link = session.find_element("a#open").await.expect("lookup").expect("link");
        link.click().await.expect("click");
        assert_eq!(session.current_url().await.expect("url"), MODAL);

        let email = session
            .find_element("input.js-email")
            .await
            .expect("lookup")
            .expect("email field");
        email.send_keys("user@example.com").await.expect("type");

        assert_eq!(
            session.actions().last(),
            Some(&SnapshotAction::SendKeys {
                target: "input[name='e_mail']".to_string(),
                text: "user@example.com".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_script_click_follows_transition() {
        let session = session();
        session.navigate(HOME).await.expect("navigate");

        let link = session.find_element("a#open").await.expect("lookup").expect("link");
        link.call_js("function() { this.click(); }").await.expect("js click");
        assert_eq!(session.current_url().await.expect("url"), MODAL);
    }

    #[tokio::test]
    async fn test_interactable_rules() {
        let session = session();
        session.navigate(MODAL).await.expect("navigate");

        let visible = session.find_element("input.js-email").await.expect("lookup").expect("el");
        let hidden = session.find_element("input[name='token']").await.expect("lookup").expect("el");
        let disabled = session.find_element("button").await.expect("lookup").expect("el");

        assert!(visible.is_interactable().await.expect("check"));
        assert!(!hidden.is_interactable().await.expect("check"));
        assert!(!disabled.is_interactable().await.expect("check"));
    }

    #[tokio::test]
    async fn test_invalid_selector() {
        let session = session();
        session.navigate(HOME).await.expect("navigate");
        assert!(matches!(
            session.find_element("tr[[").await,
            Err(BrowserError::InvalidSelector(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_times_out() {
        let session = session();
        session.navigate(MODAL).await.expect("navigate");

        let started = tokio::time::Instant::now();
        let result = session
            .wait_until(&WaitCondition::clickable("button"), Duration::from_secs(3))
            .await;

        assert!(matches!(result, Err(BrowserError::Timeout(_))));
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_returns_present_element() {
        let session = session();
        session.navigate(MODAL).await.expect("navigate");

        let element = session
            .wait_until(&WaitCondition::present("button"), Duration::from_secs(3))
            .await
            .expect("present");
        assert_eq!(element.text().await.expect("text"), "Send");
    }
}
