//! One run: database, browser session, login, scrape, persist.

use crate::error::RunError;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tasklink_auth::LoginOrchestrator;
use tasklink_browser::{BrowserSession, ChromeSession, SnapshotSession};
use tasklink_captcha::{AntiCaptchaClient, PollingSolver};
use tasklink_core::{AppConfig, RunContext, TaskRecord};
use tasklink_db::{persist_batch, Database, PersistSummary};
use tasklink_scanner::TaskListScraper;
use tracing::Instrument;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Rows parsed from the listing
    pub scraped: usize,
    /// Storage counts
    pub persist: PersistSummary,
    /// Parsed tasks, in page order
    pub tasks: Vec<TaskRecord>,
}

/// Wires the stages of a run and owns its resources.
pub struct RunController {
    config: AppConfig,
    snapshot: Option<PathBuf>,
    context: RunContext,
}

impl RunController {
    /// Controller for a live run, or an offline one when `snapshot` is set.
    #[must_use]
    pub fn new(config: AppConfig, snapshot: Option<PathBuf>) -> Self {
        Self {
            config,
            snapshot,
            context: RunContext::new(),
        }
    }

    /// Context of this run.
    #[must_use]
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Run every stage. The database and browser session are closed on
    /// every path once acquired.
    pub async fn execute(&self) -> Result<RunReport, RunError> {
        self.execute_until(std::future::pending()).await
    }

    /// Like [`execute`](Self::execute), but stops with
    /// [`RunError::Interrupted`] once `shutdown` completes. Resources
    /// acquired so far are still closed.
    pub async fn execute_until<F>(&self, shutdown: F) -> Result<RunReport, RunError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let db = tokio::select! {
            db = Database::connect(&self.config.database) => db?,
            () = &mut shutdown => return Err(RunError::Interrupted),
        };
        let result = self.with_database(&db, shutdown.as_mut()).await;
        db.close().await;
        result
    }

    async fn with_database<F>(
        &self,
        db: &Database,
        mut shutdown: Pin<&mut F>,
    ) -> Result<RunReport, RunError>
    where
        F: Future<Output = ()>,
    {
        if let Some(path) = &self.snapshot {
            tracing::info!(path = %path.display(), "Scraping saved page, login skipped");
            let session = SnapshotSession::new()
                .with_page_file(&self.config.marketplace.task_list_url, path)?;
            let result = tokio::select! {
                result = self.drive(&session, None, db) => result,
                () = &mut shutdown => Err(RunError::Interrupted),
            };
            return close_session(&session, result).await;
        }

        let login = self.login_orchestrator()?;
        let session = tokio::select! {
            session = ChromeSession::launch(&self.config.browser) => session?,
            () = &mut shutdown => return Err(RunError::Interrupted),
        };
        let result = tokio::select! {
            result = self.drive(&session, Some(&login), db) => result,
            () = &mut shutdown => Err(RunError::Interrupted),
        };
        close_session(&session, result).await
    }

    fn login_orchestrator(&self) -> Result<LoginOrchestrator, RunError> {
        let client = AntiCaptchaClient::new(&self.config.captcha)
            .map_err(|e| RunError::Unexpected(format!("captcha client: {e}")))?;
        let solver = PollingSolver::from_config(client, &self.config.captcha);
        Ok(LoginOrchestrator::from_config(&self.config, Box::new(solver)))
    }

    /// Authenticate (when `login` is given), scrape and persist over an
    /// already acquired session and database.
    pub async fn drive(
        &self,
        session: &dyn BrowserSession,
        login: Option<&LoginOrchestrator>,
        db: &Database,
    ) -> Result<RunReport, RunError> {
        if let Some(login) = login {
            login
                .authenticate(session)
                .instrument(self.context.stage("auth"))
                .await?;
        }

        let tasks = TaskListScraper::from_config(&self.config)
            .scrape(session)
            .instrument(self.context.stage("scrape"))
            .await;
        if tasks.is_empty() {
            tracing::warn!("No tasks parsed");
        }

        let persist = persist_batch(db.pool(), &tasks)
            .instrument(self.context.stage("persist"))
            .await;
        if persist.all_failed() {
            return Err(RunError::NothingPersisted {
                attempted: persist.attempted,
            });
        }
        if persist.failed > 0 {
            tracing::warn!(
                succeeded = persist.succeeded(),
                attempted = persist.attempted,
                "Some tasks were not saved"
            );
        }

        Ok(RunReport {
            scraped: tasks.len(),
            persist,
            tasks,
        })
    }
}

async fn close_session(
    session: &dyn BrowserSession,
    result: Result<RunReport, RunError>,
) -> Result<RunReport, RunError> {
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "Error closing browser session");
    }
    result
}
