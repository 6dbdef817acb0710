//! Minimal HTTP client with safe logging and flexible auth.
//!
//! - Request options: `Auth`, query params, timeout
//! - Redacts sensitive query params and never logs secret values
//! - One attempt per call: failures are returned to the caller as-is
//! - Optional *raw* request/response logging via `FEDINBOX_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), fedinbox_http::HttpError> {
//! let client = fedinbox_http::HttpClient::new("https://mastodon.example")?;
//! let got: serde_json::Value = client
//!     .get_json("api/v1/timelines/public", fedinbox_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Security: `Auth::Bearer` values are sanitized before use, and logs only
//! ever include the auth kind (bearer/basic/none), not the secret.
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`) when `FEDINBOX_HTTP_RAW=1`.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use thiserror::Error;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "FEDINBOX_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(
    method: &Method,
    url: &Url,
    auth: Option<&Auth<'_>>,
    body: Option<&[u8]>,
) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    if matches!(auth, Some(Auth::Bearer(_) | Auth::Basic { .. })) {
        parts.push("-H 'authorization: <redacted>'".to_string());
    }
    if let Some(bytes) = body {
        parts.push("-H 'content-type: application/json'".to_string());
        if let Ok(s) = std::str::from_utf8(bytes) {
            let mut s = s.to_string();
            if s.len() > RAW_MAX_BODY {
                truncate_on_boundary(&mut s, RAW_MAX_BODY);
                s.push('…');
            }
            parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
        } else {
            parts.push(format!("--data-binary @- # ({} bytes)", bytes.len()));
        }
    }
    let (host_path, query) = redact_query(url);
    let query = query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let scheme = url.scheme();
    if query.is_empty() {
        parts.push(format!("'{scheme}://{host_path}'"));
    } else {
        parts.push(format!("'{scheme}://{host_path}?{query}'"));
    }
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

fn is_secret_param(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token" | "token" | "password"
    )
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
        /// The error body when the server answered with JSON.
        body: Option<serde_json::Value>,
    },
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use fedinbox_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Authorization: Basic base64(<username>:<password>)
    Basic {
        username: &'a str,
        password: &'a str,
    },
    None,
}

impl Auth<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::Basic { .. } => "basic",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use fedinbox_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     query: Some(vec![("limit", Cow::Borrowed("20"))]),
///     auth: Some(Auth::Bearer("demo")),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>, // e.g. [("limit", "20".into())]
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    /// Applied to every request that does not set its own timeout.
    /// `None` means the call waits for as long as the peer takes.
    pub default_timeout: Option<Duration>,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// A base without a trailing slash gets one, so relative paths are
    /// joined below it rather than replacing its last segment.
    ///
    /// ```no_run
    /// use fedinbox_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://mastodon.example")?;
    /// assert_eq!(client.default_timeout, None);
    /// assert_eq!(client.base().as_str(), "https://mastodon.example/");
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: None,
        })
    }

    /// Set a timeout for every request issued by this client.
    ///
    /// ```no_run
    /// use fedinbox_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://mastodon.example")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Some(Duration::from_secs(2)));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = Some(dur);
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET JSON with per-request options (query/auth/timeout).
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json_internal::<(), T>(Method::GET, path, None, opts)
            .await
    }

    /// POST a JSON body with per-request options.
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json_internal(Method::POST, path, Some(body), opts)
            .await
    }

    /// POST without a body (e.g. Mastodon's `favourite` actions) and decode JSON.
    pub async fn post_empty<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json_internal::<(), T>(Method::POST, path, None, opts)
            .await
    }

    fn resolve(&self, path: &str) -> Result<Url, HttpError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn request_json_internal<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.resolve(path)?;

        // ----- Build request -----
        let mut rb = self.inner.request(method.clone(), url.clone());

        let timeout = opts.timeout.or(self.default_timeout);
        if let Some(timeout) = timeout {
            rb = rb.timeout(timeout);
        }

        let query: Vec<(&str, Cow<'_, str>)> = opts.query.clone().unwrap_or_default();
        if !query.is_empty() {
            let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }

        // body (serialize here so we can log exact bytes)
        let mut request_body_bytes: Option<Vec<u8>> = None;
        if let Some(b) = body {
            let bytes = serde_json::to_vec(b).map_err(|e| HttpError::Build(e.to_string()))?;
            request_body_bytes = Some(bytes.clone());
            rb = rb
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes);
        }

        match &opts.auth {
            Some(Auth::Bearer(tok)) => {
                let tok = sanitize_api_key(tok)?;
                rb = rb.bearer_auth(tok);
            }
            Some(Auth::Basic { username, password }) => {
                rb = rb.basic_auth(username, Some(password));
            }
            Some(Auth::None) | None => {}
        }

        // ----- Safe request logging (pre-send) -----
        let auth_kind = opts.auth.as_ref().map(Auth::kind).unwrap_or("none");
        let redacted_q: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| {
                let v = if is_secret_param(k) {
                    "<redacted>".to_string()
                } else {
                    v.as_ref().to_string()
                };
                ((*k).to_string(), v)
            })
            .collect();

        let req_id = uuid::Uuid::new_v4().simple().to_string();

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query=?redacted_q,
            timeout_ms=?timeout.map(|t| t.as_millis() as u64),
            auth_kind,
            has_body=%body.is_some(),
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(
                &method,
                &url,
                opts.auth.as_ref(),
                request_body_bytes.as_deref(),
            );
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.send");
            HttpError::Network(message)
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.body");
            HttpError::Network(message)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let req_hdr_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        let remain = headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok());
        let reset = headers
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok());

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=content_len(&headers, bytes.len()),
            x_request_id=%req_hdr_id,
            rate_limit.remaining=?remain,
            rate_limit.reset=?reset,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let truncated = bytes.len() > RAW_MAX_BODY;
            let shown = if truncated {
                &bytes[..RAW_MAX_BODY]
            } else {
                &bytes[..]
            };
            let text = String::from_utf8_lossy(shown);
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        // ----- Success path -----
        if status.is_success() {
            return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(
                    req_id=%req_id,
                    serde_line=%e.line(),
                    serde_col=%e.column(),
                    serde_err=%e.to_string(),
                    body_snippet=%snippet,
                    "http.response.decode_error"
                );
                HttpError::Decode(e.to_string(), snippet)
            });
        }

        // ----- Final error -----
        let message = extract_error_message(&bytes);
        let body = serde_json::from_slice::<serde_json::Value>(&bytes).ok();
        tracing::warn!(
            req_id=%req_id,
            %status,
            message=%message,
            x_request_id=%req_hdr_id,
            body_snippet=%snippet,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id: req_hdr_id.to_string(),
            body,
        })
    }
}

// ==============================
// Helpers
// ==============================

/// Pull a human readable message out of an error body.
///
/// Understands Mastodon's `{"error": "...", "error_description": "..."}`,
/// the gateway's own `{"error": "...", "details": ...}` and the generic
/// `{"message": "..."}` / `{"detail": "..."}` shapes, falling back to a
/// snippet of the raw body.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        error_description: Option<String>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        detail: Option<String>,
    }

    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        let picked = [m.error_description, m.error, m.message, m.detail]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty());
        if let Some(msg) = picked {
            return msg;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        truncate_on_boundary(&mut snip, SNIPPET_MAX);
        snip.push_str("...");
    }
    snip
}

fn truncate_on_boundary(s: &mut String, max: usize) {
    let mut cut = max.min(s.len());
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    // 1) Trim outer spaces/quotes
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    // 2) Remove *all* ASCII whitespace (spaces, tabs, newlines, carriage returns)
    s.retain(|ch| !ch.is_ascii_whitespace());

    // 3) Ensure ASCII and no control chars
    if !s.is_ascii() {
        return Err(HttpError::Build("access token contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "access token contains control characters".into(),
        ));
    }
    if s.is_empty() {
        return Err(HttpError::Build("access token is empty".into()));
    }

    // 4) Validate header value upfront for clear errors
    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    // Return "host + path" string and redacted query list for logging
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let k = k.to_string();
            let v = if is_secret_param(&k) {
                "<redacted>".to_string()
            } else {
                v.to_string()
            };
            (k, v)
        })
        .collect::<Vec<_>>();
    (host_path, redacted)
}

fn content_len(headers: &HeaderMap, body_len: usize) -> usize {
    headers
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(body_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_quotes_and_whitespace() {
        let got = sanitize_api_key("  \"abc 123\n\"  ").unwrap();
        assert_eq!(got, "abc123");
    }

    #[test]
    fn sanitize_rejects_non_ascii_and_empty() {
        assert!(sanitize_api_key("tökén").is_err());
        assert!(sanitize_api_key("   ").is_err());
    }

    #[test]
    fn authorization_header_is_redacted() {
        let mut h = HeaderMap::new();
        h.insert("authorization", HeaderValue::from_static("Bearer s3cr3t"));
        h.insert("accept", HeaderValue::from_static("application/json"));
        let got = redact_headers(&h);
        assert!(got.iter().any(|(k, v)| k == "authorization" && v == "<redacted>"));
        assert!(got.iter().all(|(_, v)| !v.contains("s3cr3t")));
    }

    #[test]
    fn curl_output_hides_secret_query_params() {
        let url = Url::parse("https://mastodon.example/api?limit=5&access_token=zzz").unwrap();
        let curl = make_curl(&Method::GET, &url, Some(&Auth::Bearer("s3cr3t")), None);
        assert!(curl.contains("limit=5"));
        assert!(!curl.contains("zzz"));
        assert!(curl.contains("authorization: <redacted>"));
        assert!(!curl.contains("s3cr3t"));
    }

    #[test]
    fn error_message_prefers_mastodon_description() {
        let body = br#"{"error":"invalid_token","error_description":"The access token is invalid"}"#;
        assert_eq!(extract_error_message(body), "The access token is invalid");
        assert_eq!(
            extract_error_message(br#"{"error":"Record not found"}"#),
            "Record not found"
        );
        assert_eq!(extract_error_message(b"bad gateway"), "bad gateway");
    }

    #[test]
    fn snippets_are_capped_on_char_boundaries() {
        let long = "é".repeat(400);
        let snip = snip_body(long.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_MAX + 3);
    }

    #[test]
    fn base_gets_trailing_slash() {
        let client = HttpClient::new("https://mastodon.example/sub").unwrap();
        assert_eq!(client.base().as_str(), "https://mastodon.example/sub/");
        let url = client.resolve("/api/v1/favourites").unwrap();
        assert_eq!(url.as_str(), "https://mastodon.example/sub/api/v1/favourites");
    }
}
