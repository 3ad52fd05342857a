//! HTTP gateway to the Aliman backend.
//!
//! Every call goes through [`Client::request`], which attaches the bearer
//! token when one is set, sends the body as JSON and turns non-2xx responses
//! into [`ApiError::Api`] carrying the server's `detail` text.
//!
//! The gateway never retries and sets no timeout; callers decide what to do
//! with a failure.

use std::fmt;

use al_core::{
    ChatContext, ChatMessage, Credential, Dashboard, EndFocus, FocusBackend, FocusEnded,
    FocusStarted, PlannedMinutes, StartFocus,
};
use reqwest::{Method, RequestBuilder};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when a failed response carries no `detail`.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Gateway errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL is unusable.
    #[error("invalid API URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// HTTP status for [`ApiError::Api`].
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Backend client.
///
/// Cloning is cheap: clones share the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

/// Verdict of the backend's exit-reason analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitVerdict {
    Distracted,
    Valid,
    Unknown,
}

/// Response of `GET /api/focus/analyze-exit`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExitAnalysis {
    #[serde(rename = "type")]
    pub verdict: ExitVerdict,
    pub response: String,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PlanRequest<'a> {
    plan_text: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    context: ChatContext,
}

#[derive(Deserialize)]
struct ChatReply {
    reply: String,
}

#[derive(Deserialize)]
struct ChatHistory {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct Review {
    analysis: String,
}

impl Client {
    /// Creates a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let url = base_url.into();
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ApiError::InvalidBaseUrl {
                url,
                reason: "URL cannot be empty",
            });
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl {
                url,
                reason: "URL must start with http:// or https://",
            });
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: trimmed.to_string(),
            token: None,
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issues a request and decodes the JSON response.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.http.request(method, self.url(path));
        let builder = match body {
            Some(body) => builder.json(body),
            None => builder,
        };
        self.send(builder).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let builder = match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;
        tracing::debug!(%status, path = %url, "backend responded");

        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }

        serde_json::from_str(&body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<Credential, ApiError> {
        let body = AuthRequest { username, password };
        self.request(Method::POST, "/api/register", Some(&body)).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Credential, ApiError> {
        let body = AuthRequest { username, password };
        self.request(Method::POST, "/api/login", Some(&body)).await
    }

    pub async fn dashboard(&self) -> Result<Dashboard, ApiError> {
        self.request(Method::GET, "/api/dashboard", None::<&()>).await
    }

    pub async fn add_plan(&self, text: &str) -> Result<(), ApiError> {
        let body = PlanRequest { plan_text: text };
        let _: IgnoredAny = self.request(Method::POST, "/api/plans", Some(&body)).await?;
        Ok(())
    }

    pub async fn complete_plan(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("/api/plans/{id}/complete");
        let _: IgnoredAny = self.request(Method::PUT, &path, None::<&()>).await?;
        Ok(())
    }

    pub async fn start_focus(&self, planned: PlannedMinutes) -> Result<FocusStarted, ApiError> {
        let body = StartFocus {
            planned_minutes: planned,
        };
        self.request(Method::POST, "/api/focus/start", Some(&body))
            .await
    }

    pub async fn end_focus(&self, request: &EndFocus) -> Result<FocusEnded, ApiError> {
        self.request(Method::POST, "/api/focus/end", Some(request))
            .await
    }

    /// Asks the backend how it would judge an exit reason, without ending a
    /// session.
    pub async fn analyze_exit(&self, reason: &str) -> Result<ExitAnalysis, ApiError> {
        let builder = self
            .http
            .get(self.url("/api/focus/analyze-exit"))
            .query(&[("reason", reason)]);
        self.send(builder).await
    }

    /// Sends a chat message and returns the assistant's reply.
    pub async fn chat(&self, message: &str, context: ChatContext) -> Result<String, ApiError> {
        let body = ChatRequest { message, context };
        let reply: ChatReply = self.request(Method::POST, "/api/chat", Some(&body)).await?;
        Ok(reply.reply)
    }

    /// Recent chat messages, oldest first.
    pub async fn chat_history(&self, limit: Option<u32>) -> Result<Vec<ChatMessage>, ApiError> {
        let mut builder = self.http.get(self.url("/api/chat/history"));
        if let Some(limit) = limit {
            builder = builder.query(&[("limit", limit)]);
        }
        let history: ChatHistory = self.send(builder).await?;
        Ok(history.messages)
    }

    /// End-of-day analysis text.
    pub async fn review(&self) -> Result<String, ApiError> {
        let review: Review = self.request(Method::GET, "/api/review", None::<&()>).await?;
        Ok(review.analysis)
    }
}

impl FocusBackend for Client {
    type Error = ApiError;

    async fn start_focus(&self, planned: PlannedMinutes) -> Result<FocusStarted, ApiError> {
        Self::start_focus(self, planned).await
    }

    async fn end_focus(&self, request: &EndFocus) -> Result<FocusEnded, ApiError> {
        Self::end_focus(self, request).await
    }

    async fn dashboard(&self) -> Result<Dashboard, ApiError> {
        Self::dashboard(self).await
    }
}

/// Extracts the human-readable `detail` from an error body.
fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorPayload {
        detail: Option<serde_json::Value>,
    }

    let detail = serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.detail);
    match detail {
        Some(serde_json::Value::String(text)) if !text.trim().is_empty() => text,
        // Validation errors arrive as structured lists.
        Some(serde_json::Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| {
                item.get("msg")
                    .and_then(serde_json::Value::as_str)
                    .map_or_else(|| item.to_string(), ToString::to_string)
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => GENERIC_ERROR_MESSAGE.to_string(),
    }
}
