use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tasklink_auth::{AuthError, AuthOutcome, LoginOrchestrator};
use tasklink_browser::{SnapshotAction, SnapshotSession};
use tasklink_captcha::{
    ApiStatus, CaptchaApi, CaptchaError, CaptchaSolver, CreateTaskResponse, PollingSolver,
    SolveRequest, TaskResultResponse, TransportError,
};
use tasklink_core::{CaptchaConfig, Credentials};
use tokio::time::Instant;

const HOME: &str = "https://gogetlinks.net";
const LOGIN: &str = "https://gogetlinks.net/user/signIn";
const MODAL: &str = "https://gogetlinks.net/#sign-in";
const PROFILE: &str = "https://gogetlinks.net/webTask/index";
const SITE_KEY: &str = "6LcmVyQUAAAAAKqHmh1Lq3uSEV3f2X7d6uMFyPtJ";

const HOME_ANONYMOUS: &str = r#"<html><body>
    <nav><a href="/user/signIn" rel="modal:open">Войти</a></nav>
</body></html>"#;

const HOME_SIGNED_IN: &str = r#"<html><body>
    <nav><a href="/profile">Профиль</a></nav>
</body></html>"#;

const SIGNED_IN: &str = r#"<html><body>
    <nav><a href="/profile">Профиль</a></nav>
    <table id="tasks"></table>
</body></html>"#;

/// Parts of the sign-in form to render.
#[derive(Clone, Copy)]
struct Form {
    challenge: bool,
    email: bool,
    password: bool,
    submit: bool,
}

const FULL_FORM: Form = Form {
    challenge: true,
    email: true,
    password: true,
    submit: true,
};

const PLAIN_FORM: Form = Form {
    challenge: false,
    ..FULL_FORM
};

fn modal(form: Form) -> String {
    let challenge = if form.challenge {
        format!(
            r#"<div class="g-recaptcha" data-sitekey="{SITE_KEY}"></div>
               <textarea id="g-recaptcha-response" style="display: none"></textarea>"#
        )
    } else {
        String::new()
    };
    let email = if form.email {
        r#"<input class="form-control js-email" name="e_mail" type="text">"#
    } else {
        ""
    };
    let password = if form.password {
        r#"<input class="form-control js-password" name="password" type="password">"#
    } else {
        ""
    };
    let submit = if form.submit {
        r#"<button class="btn js-send-sign-in" type="submit" disabled>Войти</button>"#
    } else {
        r#"<button class="btn" type="button">Отмена</button>"#
    };
    format!(
        r#"<html><body><form class="sign-in">
            {email}
            {password}
            {challenge}
            {submit}
        </form></body></html>"#
    )
}

fn marketplace(home: &str, modal_html: &str, submit_target: &str) -> SnapshotSession {
    SnapshotSession::new()
        .with_page(HOME, home)
        .with_page(MODAL, modal_html)
        .with_page(PROFILE, SIGNED_IN)
        .on_click("a[rel='modal:open']", MODAL)
        .on_click("button.js-send-sign-in", submit_target)
}

#[derive(Clone, Default)]
struct RecordingSolver {
    requests: Arc<Mutex<Vec<SolveRequest>>>,
}

#[async_trait]
impl CaptchaSolver for RecordingSolver {
    async fn solve(&self, request: &SolveRequest) -> Result<String, CaptchaError> {
        self.requests.lock().expect("lock").push(request.clone());
        Ok("03AGdBq24-solved-token".to_string())
    }
}

struct NeverReadyApi;

#[async_trait]
impl CaptchaApi for NeverReadyApi {
    async fn create_task(&self, _: &str, _: &str) -> Result<CreateTaskResponse, TransportError> {
        Ok(CreateTaskResponse {
            error: ApiStatus::default(),
            task_id: Some(1),
        })
    }

    async fn get_task_result(&self, _: u64) -> Result<TaskResultResponse, TransportError> {
        Ok(TaskResultResponse {
            state: Some("processing".to_string()),
            ..TaskResultResponse::default()
        })
    }
}

struct RejectingApi;

#[async_trait]
impl CaptchaApi for RejectingApi {
    async fn create_task(&self, _: &str, _: &str) -> Result<CreateTaskResponse, TransportError> {
        Ok(CreateTaskResponse {
            error: ApiStatus {
                error_id: 1,
                error_code: Some("ERROR_KEY_DOES_NOT_EXIST".to_string()),
                error_description: Some("Account authorization key not found".to_string()),
            },
            task_id: None,
        })
    }

    async fn get_task_result(&self, _: u64) -> Result<TaskResultResponse, TransportError> {
        Ok(TaskResultResponse::default())
    }
}

struct OfflineApi;

#[async_trait]
impl CaptchaApi for OfflineApi {
    async fn create_task(&self, _: &str, _: &str) -> Result<CreateTaskResponse, TransportError> {
        Err(TransportError::Status {
            status: 503,
            body: "maintenance".to_string(),
        })
    }

    async fn get_task_result(&self, _: u64) -> Result<TaskResultResponse, TransportError> {
        Err(TransportError::Status {
            status: 503,
            body: "maintenance".to_string(),
        })
    }
}

fn orchestrator(solver: Box<dyn CaptchaSolver>) -> LoginOrchestrator {
    LoginOrchestrator::new(
        HOME,
        LOGIN,
        Credentials::new("user@example.com", "s3cret"),
        solver,
    )
}

fn typed_values(session: &SnapshotSession) -> Vec<(String, String)> {
    session
        .actions()
        .into_iter()
        .filter_map(|action| match action {
            SnapshotAction::SendKeys { target, text } => Some((target, text)),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_already_authenticated_short_circuits() {
    let session = marketplace(HOME_SIGNED_IN, &modal(FULL_FORM), PROFILE);
    let solver = RecordingSolver::default();

    let outcome = orchestrator(Box::new(solver.clone()))
        .authenticate(&session)
        .await
        .expect("authenticated");

    assert_eq!(outcome, AuthOutcome::AlreadyAuthenticated);
    assert!(solver.requests.lock().expect("lock").is_empty());
    assert!(typed_values(&session).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_login_without_challenge() {
    let session = marketplace(HOME_ANONYMOUS, &modal(PLAIN_FORM), PROFILE);
    let solver = RecordingSolver::default();

    let outcome = orchestrator(Box::new(solver.clone()))
        .authenticate(&session)
        .await
        .expect("authenticated");

    assert_eq!(
        outcome,
        AuthOutcome::Verified {
            challenge_solved: false
        }
    );
    assert!(solver.requests.lock().expect("lock").is_empty());
    assert_eq!(
        typed_values(&session),
        vec![
            ("input[name='e_mail']".to_string(), "user@example.com".to_string()),
            ("input[name='password']".to_string(), "s3cret".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_login_with_challenge_injects_token() {
    let session = marketplace(HOME_ANONYMOUS, &modal(FULL_FORM), PROFILE);
    let solver = RecordingSolver::default();

    let outcome = orchestrator(Box::new(solver.clone()))
        .authenticate(&session)
        .await
        .expect("authenticated");

    assert_eq!(
        outcome,
        AuthOutcome::Verified {
            challenge_solved: true
        }
    );

    let requests = solver.requests.lock().expect("lock").clone();
    assert_eq!(requests, vec![SolveRequest::new(LOGIN, SITE_KEY)]);

    let actions = session.actions();
    let injected = actions.iter().position(|action| {
        matches!(action, SnapshotAction::Script(script)
            if script.contains("g-recaptcha-response") && script.contains("03AGdBq24-solved-token"))
    });
    let submitted = actions
        .iter()
        .position(|action| matches!(action, SnapshotAction::Click(target) if target == "button.btn"));
    assert!(injected.is_some());
    assert!(submitted.is_some());
    assert!(injected < submitted);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_credentials() {
    let session = marketplace(HOME_ANONYMOUS, &modal(PLAIN_FORM), MODAL);

    let result = orchestrator(Box::new(RecordingSolver::default()))
        .authenticate(&session)
        .await;

    assert!(matches!(result, Err(AuthError::CredentialsRejectedOrUnknown)));
}

#[tokio::test(start_paused = true)]
async fn test_missing_sign_in_control() {
    let session = marketplace("<html><body><p>maintenance</p></body></html>", &modal(PLAIN_FORM), PROFILE);

    let started = Instant::now();
    let result = orchestrator(Box::new(RecordingSolver::default()))
        .authenticate(&session)
        .await;

    assert!(matches!(result, Err(AuthError::LoginControlNotFound)));
    assert!(started.elapsed() <= Duration::from_secs(13));
}

#[tokio::test(start_paused = true)]
async fn test_missing_password_field() {
    let form = Form {
        password: false,
        ..PLAIN_FORM
    };
    let session = marketplace(HOME_ANONYMOUS, &modal(form), PROFILE);

    let result = orchestrator(Box::new(RecordingSolver::default()))
        .authenticate(&session)
        .await;

    assert!(matches!(
        result,
        Err(AuthError::CredentialFieldsNotFound { field: "password" })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_home_is_session_error() {
    let session = SnapshotSession::new();

    let result = orchestrator(Box::new(RecordingSolver::default()))
        .authenticate(&session)
        .await;

    assert!(matches!(result, Err(AuthError::Session(_))));
}

#[tokio::test(start_paused = true)]
async fn test_captcha_timeout_is_bounded() {
    let session = marketplace(HOME_ANONYMOUS, &modal(FULL_FORM), PROFILE);
    let solver = PollingSolver::from_config(NeverReadyApi, &CaptchaConfig::default());

    let started = Instant::now();
    let result = orchestrator(Box::new(solver)).authenticate(&session).await;

    assert!(matches!(
        result,
        Err(AuthError::ChallengeUnsolved(CaptchaError::SolveTimeout(_)))
    ));
    // settle + modal settle + solver deadline
    assert!(started.elapsed() <= Duration::from_secs(2 + 2 + 120 + 1));
    assert!(typed_values(&session).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_email_field() {
    let form = Form {
        email: false,
        ..PLAIN_FORM
    };
    let session = marketplace(HOME_ANONYMOUS, &modal(form), PROFILE);

    let result = orchestrator(Box::new(RecordingSolver::default()))
        .authenticate(&session)
        .await;

    assert!(matches!(
        result,
        Err(AuthError::CredentialFieldsNotFound { field: "email" })
    ));
    assert!(typed_values(&session).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_submit_control() {
    let form = Form {
        submit: false,
        ..PLAIN_FORM
    };
    let session = marketplace(HOME_ANONYMOUS, &modal(form), PROFILE);

    let started = Instant::now();
    let result = orchestrator(Box::new(RecordingSolver::default()))
        .authenticate(&session)
        .await;

    assert!(matches!(result, Err(AuthError::SubmitControlNotFound)));
    // settle + modal settle + submit wait
    assert!(started.elapsed() <= Duration::from_secs(2 + 2 + 10 + 1));
    assert_eq!(typed_values(&session).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_provider_rejection_stops_login() {
    let session = marketplace(HOME_ANONYMOUS, &modal(FULL_FORM), PROFILE);
    let solver = PollingSolver::from_config(RejectingApi, &CaptchaConfig::default());

    let result = orchestrator(Box::new(solver)).authenticate(&session).await;

    assert!(matches!(
        result,
        Err(AuthError::ChallengeUnsolved(CaptchaError::ProviderRejected { ref code, .. }))
            if code == "ERROR_KEY_DOES_NOT_EXIST"
    ));
    assert!(typed_values(&session).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_solver_stops_login() {
    let session = marketplace(HOME_ANONYMOUS, &modal(FULL_FORM), PROFILE);
    let solver = PollingSolver::from_config(OfflineApi, &CaptchaConfig::default());

    let result = orchestrator(Box::new(solver)).authenticate(&session).await;

    assert!(matches!(
        result,
        Err(AuthError::ChallengeUnsolved(CaptchaError::SolverUnavailable { attempts: 3, .. }))
    ));
    assert!(typed_values(&session).is_empty());
}
