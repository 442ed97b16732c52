// Remote API client
//
// One reqwest::Client with a shared cookie jar carries the server session.
// URLs are built from the configured base origin plus named endpoint paths,
// unsafe verbs attach the anti-forgery token, and every response goes through
// the same content-type/status validation before JSON parsing.

pub mod csrf;
pub mod models;

use crate::config::Config;
use models::{
    AppEntry, DashboardData, Envelope, FeatureData, LoginRequest, PaymentStatusResponse,
    SentimentData, SignupOutcome, SignupRequest, UpdatePaymentRequest, ValidatePaymentRequest,
    ValidatePaymentResponse,
};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Response, StatusCode, Url};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Header carrying the anti-forgery token on unsafe requests
const CSRF_HEADER: &str = "X-CSRFToken";

/// Name of the session cookie holding the anti-forgery token
const CSRF_COOKIE: &str = "csrftoken";

/// Errors raised by the API client
#[derive(Debug)]
pub enum ApiError {
    /// Connectivity failure (DNS, refused connection, timeout)
    Network(String),
    /// Non-2xx response; message extracted from the body when available
    Http { status: u16, message: String },
    /// A 2xx response that was not the JSON we asked for
    InvalidResponse(String),
    /// No anti-forgery token could be obtained from any source
    CsrfUnavailable(String),
    /// An endpoint path was empty or the base URL is malformed
    InvalidEndpoint(String),
}

impl ApiError {
    /// Whether this error is a 403 (stale or missing anti-forgery token)
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Http { status: 403, .. })
    }

    /// Whether the session itself is the problem. These errors redirect to
    /// the sign-in flow instead of recovering inline.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::CsrfUnavailable(_) | ApiError::Http { status: 401 | 403, .. }
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Http { status, message } => write!(f, "{} (HTTP {})", message, status),
            Self::InvalidResponse(msg) => write!(f, "Invalid server response: {}", msg),
            Self::CsrfUnavailable(msg) => {
                write!(f, "Failed to establish secure connection: {}", msg)
            }
            Self::InvalidEndpoint(msg) => write!(f, "Invalid endpoint: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// HTTP client for the analytics service
///
/// Cloning is cheap: the underlying reqwest client and cookie jar are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base_url: String,
    endpoints: crate::config::Endpoints,
}

impl ApiClient {
    /// Create a client from the loaded configuration
    ///
    /// The timeout is the advisory value from config; there is no retry and
    /// no per-request override.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            jar,
            base_url: config.base_url.clone(),
            endpoints: config.endpoints.clone(),
        })
    }

    /// Build a complete URL from the base origin and an endpoint path
    ///
    /// Normalizes to exactly one slash between the two, so "/x/" and "x/"
    /// produce the same URL. Empty endpoints fail fast.
    pub fn build_url(&self, endpoint: &str) -> Result<String, ApiError> {
        if endpoint.is_empty() {
            return Err(ApiError::InvalidEndpoint("endpoint is required".into()));
        }

        let base = self.base_url.trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        Ok(format!("{}/{}", base, path))
    }

    /// Parse an already-built URL (needed for cookie jar lookups)
    fn parse_url(&self, url: &str) -> Result<Url, ApiError> {
        Url::parse(url).map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", url, e)))
    }

    /// Read the anti-forgery token from the cookie jar, if the server set one
    pub fn csrf_cookie(&self) -> Option<String> {
        let url = self.parse_url(&self.build_url("/").ok()?).ok()?;
        let header = self.jar.cookies(&url)?;
        cookie_value(&header, CSRF_COOKIE)
    }

    // ── Token acquisition ───────────────────────────────────────────────────

    /// Obtain an anti-forgery token: cookie jar first, then the token endpoint
    ///
    /// The endpoint may deliver the token in the JSON body (`csrfToken`), in
    /// the `X-CSRFToken` response header, or as a freshly set cookie. If no
    /// source yields a token this is a connectivity error.
    pub async fn acquire_csrf(&self) -> Result<String, ApiError> {
        // An existing session cookie wins; the endpoint is only a fallback
        if let Some(token) = self.csrf_cookie() {
            tracing::debug!("Using existing anti-forgery token from cookie");
            return Ok(token);
        }

        let url = self.build_url(&self.endpoints.csrf)?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::CsrfUnavailable(format!(
                "token endpoint returned HTTP {}",
                response.status().as_u16()
            )));
        }

        // Header is read before the body consumes the response
        let header_token = response
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body_token = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("csrfToken").and_then(|t| t.as_str()).map(String::from));

        body_token
            .or(header_token)
            // The GET above may have set the cookie even when neither the
            // body nor the header carried the token
            .or_else(|| self.csrf_cookie())
            .ok_or_else(|| {
                ApiError::CsrfUnavailable("token not found in body, headers, or cookies".into())
            })
    }

    // ── Session and payment ─────────────────────────────────────────────────

    /// Probe the authentication status endpoint; Ok means a live session
    pub async fn auth_status(&self) -> Result<(), ApiError> {
        let url = self.build_url(&self.endpoints.auth_status)?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Sign in; the session cookie is set by the server on success
    pub async fn login(&self, request: &LoginRequest, csrf: &str) -> Result<(), ApiError> {
        let url = self.build_url(&self.endpoints.login)?;
        let response = self
            .client
            .post(&url)
            .header(CSRF_HEADER, csrf)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        expect_json_success(response).await.map(|_| ())
    }

    /// Create an account; 400 responses carry per-field serializer errors
    pub async fn signup(
        &self,
        request: &SignupRequest,
        csrf: &str,
    ) -> Result<SignupOutcome, ApiError> {
        let url = self.build_url(&self.endpoints.signup)?;
        let response = self
            .client
            .post(&url)
            .header(CSRF_HEADER, csrf)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(SignupOutcome::Created);
        }

        // Field-level errors come back as {"field": ["msg", ...], ...}
        if status == StatusCode::BAD_REQUEST {
            if let Ok(body) = response.json::<serde_json::Value>().await {
                let fields = models::extract_field_errors(&body);
                if !fields.is_empty() {
                    return Ok(SignupOutcome::FieldErrors(fields));
                }
                return Err(ApiError::Http {
                    status: status.as_u16(),
                    message: extract_error_message(&body)
                        .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
                });
            }
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        Err(error_from_response(response).await)
    }

    /// Whether the signed-in user has completed payment
    pub async fn payment_status(&self) -> Result<bool, ApiError> {
        let url = self.build_url(&self.endpoints.payment_status)?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let value: PaymentStatusResponse =
            parse_json_body(expect_json_success(response).await?).await?;
        Ok(value.payment_successful)
    }

    /// Validate and process a card payment
    pub async fn validate_payment(
        &self,
        request: &ValidatePaymentRequest,
        csrf: &str,
    ) -> Result<ValidatePaymentResponse, ApiError> {
        let url = self.build_url(&self.endpoints.validate_payment)?;
        let response = self
            .client
            .post(&url)
            .header(CSRF_HEADER, csrf)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        parse_json_body(expect_json_success(response).await?).await
    }

    /// Persist the payment flag on the server side
    pub async fn update_payment(
        &self,
        request: &UpdatePaymentRequest,
        csrf: &str,
    ) -> Result<(), ApiError> {
        let url = self.build_url(&self.endpoints.update_payment)?;
        let response = self
            .client
            .post(&url)
            .header(CSRF_HEADER, csrf)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        expect_json_success(response).await.map(|_| ())
    }

    // ── App selection ───────────────────────────────────────────────────────

    /// Search the app catalog by name
    pub async fn search_apps(&self, query: &str) -> Result<Vec<AppEntry>, ApiError> {
        let url = self.build_url(&self.endpoints.playstore_search)?;
        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        parse_json_body(expect_json_success(response).await?).await
    }

    /// Register an app as the user's current app, replacing any previous one
    pub async fn add_user_app(&self, app: &AppEntry, csrf: &str) -> Result<(), ApiError> {
        let url = self.build_url(&self.endpoints.user_apps)?;
        let body = models::UserAppRequest::replace(app);
        let response = self
            .client
            .post(&url)
            .header(CSRF_HEADER, csrf)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        expect_json_success(response).await.map(|_| ())
    }

    /// Remove an app from the user's selection
    pub async fn remove_user_app(&self, app_id: i64, csrf: &str) -> Result<(), ApiError> {
        let url = self.build_url(&self.endpoints.user_apps)?;
        let response = self
            .client
            .delete(&url)
            .header(CSRF_HEADER, csrf)
            .json(&models::UserAppDeleteRequest { app_id })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        expect_json_success(response).await.map(|_| ())
    }

    // ── Analytics ───────────────────────────────────────────────────────────

    /// Fetch dashboard analytics for an app
    pub async fn dashboard(&self, app_id: i64) -> Result<DashboardData, ApiError> {
        self.analytics(&self.endpoints.dashboard, app_id).await
    }

    /// Fetch sentiment analytics for an app
    pub async fn sentiment(&self, app_id: i64) -> Result<SentimentData, ApiError> {
        self.analytics(&self.endpoints.sentiment_analysis, app_id)
            .await
    }

    /// Fetch feature-identification analytics for an app
    pub async fn feature_analysis(&self, app_id: i64) -> Result<FeatureData, ApiError> {
        self.analytics(&self.endpoints.feature_analysis, app_id)
            .await
    }

    /// Shared shape of the three analytics endpoints: POST {app_id},
    /// response wrapped in a {data: ...} envelope
    async fn analytics<T>(&self, endpoint: &str, app_id: i64) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let url = self.build_url(endpoint)?;
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "app_id": app_id }))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let envelope: Envelope<T> = parse_json_body(expect_json_success(response).await?).await?;
        Ok(envelope.data)
    }
}

/// Check status and content type, consuming error responses into ApiError
///
/// A non-JSON success response is treated as an error with the body text as
/// the message.
async fn expect_json_success(response: Response) -> Result<Response, ApiError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    if !is_json {
        let text = response.text().await.unwrap_or_default();
        return Err(ApiError::InvalidResponse(if text.is_empty() {
            "expected JSON body".to_string()
        } else {
            text
        }));
    }

    Ok(response)
}

/// Parse a validated JSON response body
async fn parse_json_body<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Build an ApiError from a non-2xx response
///
/// The message comes from the body's `message`/`error`/`detail` field (or the
/// joined `non_field_errors` list) when present, else "HTTP <status>".
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let message = match response.json::<serde_json::Value>().await {
        Ok(body) => extract_error_message(&body).unwrap_or_else(|| format!("HTTP {}", status)),
        Err(_) => format!("HTTP {}", status),
    };
    ApiError::Http { status, message }
}

/// Pull a human-readable message out of an error body
fn extract_error_message(body: &serde_json::Value) -> Option<String> {
    for key in ["message", "error", "detail"] {
        if let Some(msg) = body.get(key).and_then(|v| v.as_str()) {
            return Some(msg.to_string());
        }
    }
    // Django serializers report form-wide errors as a list
    if let Some(list) = body.get("non_field_errors").and_then(|v| v.as_array()) {
        let joined = list
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            return Some(joined);
        }
    }
    None
}

/// Extract a named cookie's value from a Cookie header produced by the jar
fn cookie_value(header: &HeaderValue, name: &str) -> Option<String> {
    let cookies = header.to_str().ok()?;
    for pair in cookies.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(name) {
            return parts.next().map(str::to_string);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client_with_base(base: &str) -> ApiClient {
        let mut config = Config::default();
        config.base_url = base.to_string();
        ApiClient::new(&config).expect("client")
    }

    #[test]
    fn build_url_normalizes_slashes() {
        let api = client_with_base("http://example.test:8000");
        // Leading slash and no leading slash must agree
        assert_eq!(
            api.build_url("/x/").unwrap(),
            api.build_url("x/").unwrap()
        );
        assert_eq!(
            api.build_url("/api/auth/login/").unwrap(),
            "http://example.test:8000/api/auth/login/"
        );
    }

    #[test]
    fn build_url_trims_trailing_base_slash() {
        let api = client_with_base("http://example.test:8000/");
        assert_eq!(
            api.build_url("api/main/dashboard/").unwrap(),
            "http://example.test:8000/api/main/dashboard/"
        );
    }

    #[test]
    fn build_url_rejects_empty_endpoint() {
        let api = client_with_base("http://example.test:8000");
        assert!(matches!(
            api.build_url(""),
            Err(ApiError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn error_message_prefers_message_field() {
        let body = serde_json::json!({"message": "bad credentials", "error": "other"});
        assert_eq!(
            extract_error_message(&body).as_deref(),
            Some("bad credentials")
        );
    }

    #[test]
    fn error_message_falls_back_to_error_and_detail() {
        let body = serde_json::json!({"error": "app already exists"});
        assert_eq!(
            extract_error_message(&body).as_deref(),
            Some("app already exists")
        );

        let body = serde_json::json!({"detail": "Authentication required"});
        assert_eq!(
            extract_error_message(&body).as_deref(),
            Some("Authentication required")
        );
    }

    #[test]
    fn error_message_joins_non_field_errors() {
        let body = serde_json::json!({"non_field_errors": ["Too short.", "Try again."]});
        assert_eq!(
            extract_error_message(&body).as_deref(),
            Some("Too short. Try again.")
        );
    }

    #[test]
    fn error_message_absent_for_unknown_shapes() {
        let body = serde_json::json!({"status": "nope"});
        assert_eq!(extract_error_message(&body), None);
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let header = HeaderValue::from_static("sessionid=abc123; csrftoken=tok456");
        assert_eq!(cookie_value(&header, "csrftoken").as_deref(), Some("tok456"));
        assert_eq!(cookie_value(&header, "sessionid").as_deref(), Some("abc123"));
        assert_eq!(cookie_value(&header, "missing"), None);
    }
}
