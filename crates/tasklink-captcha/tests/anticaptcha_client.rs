use serde_json::json;
use std::time::Duration;
use tasklink_captcha::{
    AntiCaptchaClient, CaptchaApi, CaptchaError, CaptchaSolver, PollingSolver, SolveRequest,
    TransportError,
};
use tasklink_core::{CaptchaConfig, PollPolicy, RetryPolicy};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "0123456789abcdef0123456789abcdef";
const SITE_URL: &str = "https://gogetlinks.net/user/signIn";
const SITE_KEY: &str = "6LcmVyQUAAAAAKqHmh1Lq3uSEV3f2X7d6uMFyPtJ";

fn config(server: &MockServer) -> CaptchaConfig {
    CaptchaConfig {
        api_key: API_KEY.to_string(),
        api_url: server.uri(),
        request_timeout_secs: 5,
        ..CaptchaConfig::default()
    }
}

fn fast_solver(client: AntiCaptchaClient) -> PollingSolver<AntiCaptchaClient> {
    PollingSolver::new(
        client,
        RetryPolicy::fixed(2, Duration::from_millis(10)),
        PollPolicy::new(Duration::from_millis(20), Duration::from_secs(2)),
    )
}

#[tokio::test]
async fn test_create_task_sends_expected_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/createTask"))
        .and(body_partial_json(json!({
            "clientKey": API_KEY,
            "task": {
                "type": "NoCaptchaTaskProxyless",
                "websiteURL": SITE_URL,
                "websiteKey": SITE_KEY
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorId": 0,
            "taskId": 7_654_321
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AntiCaptchaClient::new(&config(&server)).expect("client");
    let reply = client.create_task(SITE_URL, SITE_KEY).await.expect("reply");

    assert!(!reply.error.is_error());
    assert_eq!(reply.task_id, Some(7_654_321));
}

#[tokio::test]
async fn test_http_error_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getTaskResult"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = AntiCaptchaClient::new(&config(&server)).expect("client");
    let result = client.get_task_result(1).await;

    assert!(matches!(
        result,
        Err(TransportError::Status { status: 502, ref body }) if body == "bad gateway"
    ));
}

#[tokio::test]
async fn test_full_solve_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/createTask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorId": 0,
            "taskId": 42
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getTaskResult"))
        .and(body_partial_json(json!({ "clientKey": API_KEY, "taskId": 42 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorId": 0,
            "status": "ready",
            "solution": { "gRecaptchaResponse": "03AGdBq24PBCbwiDRaS_MJ7Z" }
        })))
        .mount(&server)
        .await;

    let solver = fast_solver(AntiCaptchaClient::new(&config(&server)).expect("client"));
    let token = solver
        .solve(&SolveRequest::new(SITE_URL, SITE_KEY))
        .await
        .expect("solved");

    assert_eq!(token, "03AGdBq24PBCbwiDRaS_MJ7Z");
}

#[tokio::test]
async fn test_rejected_key_surfaces_provider_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/createTask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorId": 1,
            "errorCode": "ERROR_KEY_DOES_NOT_EXIST",
            "errorDescription": "Account authorization key not found in the system"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let solver = fast_solver(AntiCaptchaClient::new(&config(&server)).expect("client"));
    let result = solver.solve(&SolveRequest::new(SITE_URL, SITE_KEY)).await;

    assert!(matches!(
        result,
        Err(CaptchaError::ProviderRejected { ref code, .. }) if code == "ERROR_KEY_DOES_NOT_EXIST"
    ));
}

#[tokio::test]
async fn test_unreachable_service_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/createTask"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let solver = fast_solver(AntiCaptchaClient::new(&config(&server)).expect("client"));
    let result = solver.solve(&SolveRequest::new(SITE_URL, SITE_KEY)).await;

    assert!(matches!(
        result,
        Err(CaptchaError::SolverUnavailable { attempts: 2, .. })
    ));
}
