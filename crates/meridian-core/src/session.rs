//! Session state and the REST call engine.
//!
//! A [`Session`] owns everything shared between calls: the blocking HTTP
//! client, cookie jar, persistent headers, the active controller URL with
//! its region bookkeeping, trust material, and retry defaults. The engine
//! ([`Session::rest_call`]) issues one request per attempt, normalizes every
//! outcome into an [`ApiResponse`], and never lets a transport or parse
//! failure escape to the caller.
//!
//! The session is built for one active call sequence at a time; concurrent
//! callers should create one session each.

use crate::config::{
    RetryPolicy, SessionConfig, TrustSetting, CONNECT_TIMEOUT_SECS, UPDATE_INFO_URL,
};
use crate::error::{Error, Result};
use crate::redact;
use crate::region;
use crate::response::ApiResponse;
use crate::token::parse_auth_token;
use crate::trust::TrustMaterial;
use crate::update;
use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, SET_COOKIE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("meridian-core/", env!("CARGO_PKG_VERSION"));

/// Whether a status counts as a successful controller response.
///
/// Redirects are in the set because the engine inspects them instead of
/// following them.
fn is_success(status: StatusCode) -> bool {
    matches!(status.as_u16(), 200 | 204 | 301 | 302)
}

/// Request payload for a REST call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured value, serialized to JSON before transmission.
    Json(Value),
    /// Raw string, transmitted byte-for-byte.
    Raw(String),
}

impl Payload {
    fn into_body(self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Raw(text) => text,
        }
    }
}

impl From<Value> for Payload {
    /// Structured values serialize to JSON; a `Value::String` passes its
    /// inner text through unchanged.
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Raw(text),
            other => Self::Json(other),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Raw(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Raw(text.to_string())
    }
}

/// A single REST call description.
///
/// Unset options fall back to the session defaults when the call executes.
#[derive(Debug, Clone)]
pub struct RestRequest {
    url: String,
    method: Method,
    body: Option<Payload>,
    sensitive: bool,
    content_json: bool,
    timeout: Option<Duration>,
    retry: Option<bool>,
    max_retry: Option<u32>,
    retry_sleep: Option<Duration>,
}

impl RestRequest {
    /// Create a request for the given method and fully-formed URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            body: None,
            sensitive: false,
            content_json: true,
            timeout: None,
            retry: None,
            max_retry: None,
            retry_sleep: None,
        }
    }

    /// GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// PUT request.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// PATCH request.
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    /// DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Attach a payload.
    #[must_use]
    pub fn data(mut self, payload: impl Into<Payload>) -> Self {
        self.body = Some(payload.into());
        self
    }

    /// Exclude request and response content from diagnostic output.
    #[must_use]
    pub const fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    /// Control whether a JSON content-type header is set for body-bearing
    /// methods (defaults to true).
    #[must_use]
    pub const fn content_json(mut self, content_json: bool) -> Self {
        self.content_json = content_json;
        self
    }

    /// Override the per-attempt timeout for this call.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override whether this call is retried on failure.
    #[must_use]
    pub const fn retry(mut self, retry: bool) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Override the maximum number of attempts for this call.
    #[must_use]
    pub const fn max_retry(mut self, attempts: u32) -> Self {
        self.max_retry = Some(attempts);
        self
    }

    /// Override the sleep between attempts for this call.
    #[must_use]
    pub const fn retry_sleep(mut self, sleep: Duration) -> Self {
        self.retry_sleep = Some(sleep);
        self
    }

    /// The URL this request targets.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The HTTP method of this request.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }
}

/// Identity details of the logged-in account.
///
/// Populated by callers after login from profile data; cleared on logout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Numeric tenant (account) id
    pub tenant_id: Option<String>,
    /// Tenant (account) name
    pub tenant_name: Option<String>,
    /// Email (username) for the session
    pub email: Option<String>,
    /// Role names granted to the session
    pub roles: Vec<String>,
    /// Whether the tenant is an ESP/MSP
    pub is_esp: Option<bool>,
    /// Logged-in client id, when operating on behalf of an ESP client
    pub client_id: Option<String>,
    /// True when the session uses a static auth token instead of a login
    pub token_session: Option<bool>,
}

/// Builder for [`Session`].
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    controller: String,
    trust: TrustSetting,
    ignore_region: bool,
    update_check: bool,
    update_info_url: String,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl SessionBuilder {
    fn new(controller: impl Into<String>) -> Self {
        let defaults = SessionConfig::default();
        Self {
            controller: controller.into(),
            trust: defaults.trust.clone(),
            ignore_region: defaults.ignore_region,
            update_check: defaults.update_check,
            update_info_url: UPDATE_INFO_URL.to_string(),
            timeout: defaults.timeout(),
            retry_policy: defaults.retry_policy(),
        }
    }

    /// Create a builder pre-populated from a [`SessionConfig`].
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            controller: config.controller_url.clone(),
            trust: config.trust.clone(),
            ignore_region: config.ignore_region,
            update_check: config.update_check,
            update_info_url: UPDATE_INFO_URL.to_string(),
            timeout: config.timeout(),
            retry_policy: config.retry_policy(),
        }
    }

    /// Set the TLS trust setting.
    #[must_use]
    pub fn trust(mut self, trust: TrustSetting) -> Self {
        self.trust = trust;
        self
    }

    /// Ignore regions returned by the controller.
    #[must_use]
    pub const fn ignore_region(mut self, ignore: bool) -> Self {
        self.ignore_region = ignore;
        self
    }

    /// Enable or disable the release update check.
    #[must_use]
    pub const fn update_check(mut self, check: bool) -> Self {
        self.update_check = check;
        self
    }

    /// Override the update-info URL consulted by the update check.
    #[must_use]
    pub fn update_info_url(mut self, url: impl Into<String>) -> Self {
        self.update_info_url = url.into();
        self
    }

    /// Set the default per-attempt timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default retry policy.
    #[must_use]
    pub const fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Build the session.
    ///
    /// # Errors
    ///
    /// Returns an error if trust material cannot be materialized or the
    /// HTTP client cannot be constructed.
    pub fn build(self) -> Result<Session> {
        let trust = TrustMaterial::materialize(&self.trust)?;
        let cookies = Arc::new(Jar::default());

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .cookie_provider(Arc::clone(&cookies))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS));

        if trust.is_disabled() {
            warn!("TLS verification disabled for controller session");
            builder = builder.danger_accept_invalid_certs(true);
        } else if let Some(pem) = trust.ca_pem()? {
            let certs = reqwest::Certificate::from_pem_bundle(&pem)
                .map_err(|err| Error::ConfigError(format!("Invalid CA bundle: {err}")))?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if self.update_check {
            update::notify_for_new_version(&self.update_info_url);
        }

        debug!(controller = %self.controller, "session created");

        Ok(Session {
            http,
            cookies,
            headers,
            controller: self.controller.clone(),
            controller_orig: self.controller,
            controller_region: None,
            ignore_region: self.ignore_region,
            trust,
            timeout: self.timeout,
            retry_policy: self.retry_policy,
            identity: SessionIdentity::default(),
        })
    }
}

/// Shared state for a controller API session.
pub struct Session {
    http: Client,
    cookies: Arc<Jar>,
    headers: HeaderMap,
    controller: String,
    controller_orig: String,
    controller_region: Option<String>,
    ignore_region: bool,
    trust: TrustMaterial,
    timeout: Duration,
    retry_policy: RetryPolicy,
    identity: SessionIdentity,
}

impl Session {
    /// Start a builder for the given controller URL.
    pub fn builder(controller: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(controller)
    }

    /// Build a session with default settings for the given controller URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be constructed.
    pub fn new(controller: impl Into<String>) -> Result<Self> {
        SessionBuilder::new(controller).build()
    }

    /// The active controller URL.
    #[must_use]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// The controller URL as originally configured, before any region
    /// rewrite.
    #[must_use]
    pub fn controller_orig(&self) -> &str {
        &self.controller_orig
    }

    /// The resolved controller region, if any.
    #[must_use]
    pub fn controller_region(&self) -> Option<&str> {
        self.controller_region.as_deref()
    }

    /// The materialized trust material for this session.
    #[must_use]
    pub fn trust(&self) -> &TrustMaterial {
        &self.trust
    }

    /// Identity details of the logged-in account.
    #[must_use]
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Mutable access to the identity details; callers populate these after
    /// login.
    pub fn identity_mut(&mut self) -> &mut SessionIdentity {
        &mut self.identity
    }

    /// Persistent session headers sent with every call.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Permanently add or overwrite session headers.
    pub fn add_headers(&mut self, headers: HeaderMap) {
        self.headers.extend(headers);
    }

    /// Permanently remove a single session header.
    pub fn remove_header(&mut self, name: &str) {
        self.headers.remove(name);
    }

    /// Add a cookie to the session jar for the given URL.
    ///
    /// Used for static auth-token sessions that never perform a login.
    pub fn add_cookie(&self, cookie: &str, url: &Url) {
        self.cookies.add_cookie_str(cookie, url);
    }

    /// The `Cookie` header the jar would send to the given URL, if any.
    #[must_use]
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        self.cookies
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Execute a REST call and normalize the outcome.
    ///
    /// Runs the retry loop when retry is in effect: each attempt issues the
    /// request and checks the status against the success set {200, 204,
    /// 301, 302}. Transport failures count against the same attempt limit
    /// as bad statuses. The final outcome - success, last bad-status body,
    /// or a synthesized transport-error record - is always returned as an
    /// [`ApiResponse`]; this method never returns an error and never
    /// mutates session state.
    #[must_use]
    pub fn rest_call(&self, request: RestRequest) -> ApiResponse {
        let timeout = request.timeout.unwrap_or(self.timeout);
        let retry = request.retry.unwrap_or(self.retry_policy.enabled);
        let max_retry = request.max_retry.unwrap_or(self.retry_policy.max_attempts);
        let retry_sleep = request.retry_sleep.unwrap_or(self.retry_policy.sleep);

        // JSON content-type first, then session headers; a session-level
        // content-type wins.
        let mut headers = HeaderMap::new();
        if request.content_json && !matches!(request.method, Method::GET | Method::DELETE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers.extend(self.headers.clone());

        let body = request.body.clone().map(Payload::into_body);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            debug!(url = %request.url, attempt, "REST call");
            self.log_request(&request, &headers, body.as_deref());

            let mut builder = self
                .http
                .request(request.method.clone(), request.url.as_str())
                .headers(headers.clone())
                .timeout(timeout);
            if let Some(text) = &body {
                builder = builder.body(text.clone());
            }

            match builder.send() {
                Ok(response) => {
                    let status = response.status();
                    let response_headers = response.headers().clone();
                    let text = response.text().unwrap_or_default();

                    if is_success(status) {
                        if attempt > 1 {
                            debug!(attempt, "good response after retries");
                        }
                        self.log_response(&request, status, &response_headers, &text);
                        return ApiResponse::from_http(
                            true,
                            status,
                            request.url.clone(),
                            response_headers,
                            &text,
                        );
                    }

                    debug!(status = %status, "non-success response received");
                    self.log_response(&request, status, &response_headers, &text);

                    if !retry || attempt >= max_retry {
                        if retry {
                            info!(max_retry, "max retries reached");
                        }
                        return ApiResponse::from_http(
                            false,
                            status,
                            request.url.clone(),
                            response_headers,
                            &text,
                        );
                    }
                }
                Err(err) => {
                    info!(error = %err, "REST call transport failure");

                    if !retry || attempt >= max_retry {
                        if retry {
                            info!(max_retry, "max retries reached");
                        }
                        return ApiResponse::from_transport_error(
                            request.url.clone(),
                            &err.to_string(),
                        );
                    }
                }
            }

            thread::sleep(retry_sleep);
        }
    }

    /// Return the region advertised by a successful login response, if any.
    ///
    /// Reads the `x_auth_token` field of the content and parses it; a
    /// missing field or region is not an error.
    #[must_use]
    pub fn parse_region(&self, login_response: &ApiResponse) -> Option<String> {
        let auth_token = login_response.content.get("x_auth_token")?.as_str()?;
        parse_auth_token(auth_token).remove("region")
    }

    /// Update the controller with dynamic region info.
    ///
    /// The rewritten controller keeps the `<name[-env]>.<region>.<domain>.
    /// <tld>` shape: the second dot-segment of the original controller
    /// string is replaced with `region` (appended for single-segment
    /// bases). No-op when `ignore_region` is set; when the region already
    /// appears as a segment of the original controller only the recorded
    /// region is updated.
    pub fn update_region(&mut self, region: &str) {
        if self.ignore_region {
            debug!("ignore_region set, not updating controller region");
            return;
        }

        debug!(
            controller = %self.controller,
            controller_orig = %self.controller_orig,
            region,
            "updating controller region"
        );

        if region::region_label_present(&self.controller_orig, region) {
            if self.controller_region.as_deref() != Some(region) {
                self.controller_region = Some(region.to_string());
            }
            return;
        }

        self.controller = region::rewrite_with_region(&self.controller_orig, region);
        self.controller_region = Some(region.to_string());

        debug!(controller = %self.controller, "controller region updated");
    }

    /// Re-extract login cookies against the region-rewritten controller.
    ///
    /// The login request was issued against the pre-rewrite controller;
    /// some backends scope auth cookies to the regional host. This rewrites
    /// the recorded login URL to the active controller and replays the
    /// response's `Set-Cookie` values into the session jar so domain
    /// matching succeeds against the new host.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewritten login URL cannot be parsed.
    pub fn rebind_login_cookies(&self, login_response: &ApiResponse) -> Result<()> {
        let rebased = login_response
            .url
            .replace(&self.controller_orig, &self.controller);
        debug!(original = %login_response.url, rebased = %rebased, "rebinding login cookies");

        let url = Url::parse(&rebased)?;
        for value in login_response.headers.get_all(SET_COOKIE) {
            if let Ok(cookie) = value.to_str() {
                self.cookies.add_cookie_str(cookie, &url);
            }
        }
        Ok(())
    }

    fn log_request(&self, request: &RestRequest, headers: &HeaderMap, body: Option<&str>) {
        if request.sensitive {
            debug!("request not logged (sensitive content)");
            return;
        }
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }

        let cookies = Url::parse(&request.url)
            .ok()
            .and_then(|url| self.cookie_header(&url))
            .unwrap_or_default();

        debug!(
            method = %request.method,
            url = %request.url,
            headers = %redact::headers(headers, false),
            cookies = %redact::cookie_header(&cookies, false),
            body = body.unwrap_or(""),
            "request"
        );
    }

    fn log_response(
        &self,
        request: &RestRequest,
        status: StatusCode,
        headers: &HeaderMap,
        body: &str,
    ) {
        if request.sensitive {
            debug!("response not logged (sensitive content)");
            return;
        }
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }

        debug!(
            status = %status,
            headers = %redact::headers(headers, false),
            body,
            "response"
        );
    }
}
