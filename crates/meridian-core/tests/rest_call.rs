//! Behavior tests for the REST call engine against a mock controller.
//!
//! The engine is synchronous; calls run on the blocking pool while wiremock
//! serves from the test runtime.

use meridian_core::{RestRequest, Session};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_for(controller: &str) -> Session {
    Session::builder(controller)
        .update_check(false)
        .build()
        .expect("session should build")
}

#[tokio::test]
async fn success_response_parses_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.0/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "ops@example.com",
            "tenant_id": "110101"
        })))
        .mount(&server)
        .await;

    let base = server.uri();
    let url = format!("{base}/v2.0/api/profile");
    let response = tokio::task::spawn_blocking(move || {
        let session = session_for(&base);
        session.rest_call(RestRequest::get(&url))
    })
    .await
    .unwrap();

    assert!(response.success);
    assert_eq!(response.status.map(|s| s.as_u16()), Some(200));
    assert_eq!(response.content["email"], "ops@example.com");
}

#[tokio::test]
async fn empty_body_yields_empty_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.0/api/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let base = server.uri();
    let url = format!("{base}/v2.0/api/logout");
    let response = tokio::task::spawn_blocking(move || {
        let session = session_for(&base);
        session.rest_call(RestRequest::get(&url))
    })
    .await
    .unwrap();

    assert!(response.success);
    assert_eq!(response.content, json!({}));
}

#[tokio::test]
async fn non_json_body_becomes_error_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.0/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let base = server.uri();
    let url = format!("{base}/v2.0/api/profile");
    let response = tokio::task::spawn_blocking(move || {
        let session = session_for(&base);
        session.rest_call(RestRequest::get(&url))
    })
    .await
    .unwrap();

    // status is good, content is coerced
    assert!(response.success);
    assert_eq!(
        response.content["_error"][0]["data"],
        "<html>maintenance</html>"
    );
}

#[tokio::test]
async fn bad_status_without_retry_is_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.0/api/profile"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"_error": [{"message": "boom"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let url = format!("{base}/v2.0/api/profile");
    let response = tokio::task::spawn_blocking(move || {
        let session = session_for(&base);
        session.rest_call(RestRequest::get(&url))
    })
    .await
    .unwrap();

    assert!(!response.success);
    assert_eq!(response.status.map(|s| s.as_u16()), Some(500));
    assert_eq!(response.error_message(), Some("boom"));
}

#[tokio::test]
async fn retry_exhaustion_returns_last_response_after_exact_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.0/api/profile"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(3)
        .mount(&server)
        .await;

    let base = server.uri();
    let url = format!("{base}/v2.0/api/profile");
    let response = tokio::task::spawn_blocking(move || {
        let session = session_for(&base);
        session.rest_call(
            RestRequest::get(&url)
                .retry(true)
                .max_retry(3)
                .retry_sleep(Duration::ZERO),
        )
    })
    .await
    .unwrap();

    assert!(!response.success);
    assert_eq!(response.status.map(|s| s.as_u16()), Some(502));
    assert_eq!(response.content["_error"][0]["data"], "bad gateway");
    // .expect(3) on the mock verifies no fourth attempt happened
}

#[tokio::test]
async fn retry_recovers_once_controller_responds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.0/api/profile"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.0/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let base = server.uri();
    let url = format!("{base}/v2.0/api/profile");
    let response = tokio::task::spawn_blocking(move || {
        let session = session_for(&base);
        session.rest_call(
            RestRequest::get(&url)
                .retry(true)
                .max_retry(5)
                .retry_sleep(Duration::ZERO),
        )
    })
    .await
    .unwrap();

    assert!(response.success);
    assert_eq!(response.content["ok"], true);
}

#[tokio::test]
async fn transport_failure_synthesizes_error_response() {
    // grab a port nothing is listening on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base = format!("http://{addr}");
    let url = format!("{base}/v2.0/api/profile");
    let response = tokio::task::spawn_blocking(move || {
        let session = session_for(&base);
        session.rest_call(RestRequest::get(&url))
    })
    .await
    .unwrap();

    assert!(!response.success);
    assert!(response.status.is_none());
    let message = response.error_message().unwrap();
    assert!(message.starts_with("REST request exception:"));
}

#[tokio::test]
async fn post_sends_json_content_type_and_session_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4.5/api/tenants/110101/sites"))
        .and(header("content-type", "application/json"))
        .and(header("x-client-hint", "cli"))
        .and(body_json(json!({"name": "branch-3"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "s-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let url = format!("{base}/v4.5/api/tenants/110101/sites");
    let response = tokio::task::spawn_blocking(move || {
        let mut session = session_for(&base);
        let mut extra = reqwest::header::HeaderMap::new();
        extra.insert(
            "x-client-hint",
            reqwest::header::HeaderValue::from_static("cli"),
        );
        session.add_headers(extra);
        session.rest_call(RestRequest::post(&url).data(json!({"name": "branch-3"})))
    })
    .await
    .unwrap();

    assert!(response.success);
    assert_eq!(response.content["id"], "s-1");
}

#[tokio::test]
async fn get_does_not_send_json_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.0/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let base = server.uri();
    let url = format!("{base}/v2.0/api/profile");
    tokio::task::spawn_blocking(move || {
        let session = session_for(&base);
        session.rest_call(RestRequest::get(&url))
    })
    .await
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("content-type"));
}

#[tokio::test]
async fn raw_string_payload_passes_through_unchanged() {
    let raw = "name=branch-3&admin_state=active";
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2.0/api/login"))
        .and(body_string(raw))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let url = format!("{base}/v2.0/api/login");
    let response = tokio::task::spawn_blocking(move || {
        let session = session_for(&base);
        session.rest_call(RestRequest::post(&url).data(raw))
    })
    .await
    .unwrap();

    assert!(response.success);
}

#[tokio::test]
async fn redirect_is_reported_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2.0/api/profile"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "https://elsewhere.example.com/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let url = format!("{base}/v2.0/api/profile");
    let response = tokio::task::spawn_blocking(move || {
        let session = session_for(&base);
        session.rest_call(RestRequest::get(&url))
    })
    .await
    .unwrap();

    // redirects are part of the success set and surfaced to the caller
    assert!(response.success);
    assert_eq!(response.status.map(|s| s.as_u16()), Some(302));
    assert_eq!(
        response.headers.get("location").unwrap(),
        "https://elsewhere.example.com/"
    );
}

#[tokio::test]
async fn cookies_persist_across_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2.0/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "AUTH_TOKEN=r4nd0m-region%3Dusa; Path=/")
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.0/api/profile"))
        .and(header("cookie", "AUTH_TOKEN=r4nd0m-region%3Dusa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let response = tokio::task::spawn_blocking(move || {
        let session = session_for(&base);
        let login = session.rest_call(RestRequest::post(format!("{base}/v2.0/api/login")));
        assert!(login.success);
        session.rest_call(RestRequest::get(format!("{base}/v2.0/api/profile")))
    })
    .await
    .unwrap();

    assert!(response.success);
}
