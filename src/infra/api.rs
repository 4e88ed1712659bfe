use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const EXECUTE_PATH: &str = "/api/commands/execute";
const HEALTH_PATH: &str = "/health";

/// Body of the command execution endpoint.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ExecuteRequest {
    pub command: String,
    pub args: Vec<String>,
}

/// Both the logical-success and logical-failure shapes of an HTTP-OK reply.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ExecuteResponse {
    /// Usernames listed under `data.users`, skipping entries without a name.
    pub fn usernames(&self) -> Vec<String> {
        let Some(users) = self
            .data
            .as_ref()
            .and_then(|data| data.get("users"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        users
            .iter()
            .filter_map(|user| user.get("username").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TransportError {
    #[error("unknown command")]
    NotFound,

    #[error("authentication required")]
    Unauthorized,

    #[error("access denied")]
    Forbidden,

    #[error("rate limited")]
    RateLimited,

    #[error("api error: {message}")]
    Api { message: String },

    #[error("server error (HTTP {status})")]
    Server { status: u16 },

    #[error("network failure: {0}")]
    Network(String),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Server { .. } | Self::Network(_)
        )
    }
}

/// Remote side of the dispatcher. Implementations block until the call resolves.
pub trait CommandTransport: Send + Sync {
    fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, TransportError>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Maps a non-success HTTP status (and its body, if any) to a transport error.
pub fn classify_status(status: u16, body: &str) -> TransportError {
    match status {
        404 => return TransportError::NotFound,
        401 => return TransportError::Unauthorized,
        429 => return TransportError::RateLimited,
        _ => {}
    }

    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = parsed.error.message.filter(|m| !m.trim().is_empty()) {
            return TransportError::Api { message };
        }
    }

    if status == 403 {
        return TransportError::Forbidden;
    }
    if status >= 500 {
        return TransportError::Server { status };
    }

    TransportError::Unexpected(format!("HTTP {status}"))
}

/// Decodes a reply body. 2xx must carry an [`ExecuteResponse`]; anything else is classified.
pub fn decode_execute_reply(status: u16, body: &str) -> Result<ExecuteResponse, TransportError> {
    if !(200..300).contains(&status) {
        return Err(classify_status(status, body));
    }

    serde_json::from_str::<ExecuteResponse>(body)
        .map_err(|error| TransportError::Unexpected(format!("invalid response body: {error}")))
}

#[derive(Clone, Debug)]
pub struct HttpCommandClient {
    agent: ureq::Agent,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpCommandClient {
    pub fn new(base_url: &str, auth_token: Option<String>, timeout: Duration) -> Self {
        Self {
            agent: make_agent(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.filter(|token| !token.trim().is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health(&self) -> Result<(), TransportError> {
        let url = format!("{}{HEALTH_PATH}", self.base_url);
        let mut response = self
            .agent
            .get(&url)
            .header("User-Agent", &user_agent())
            .call()
            .map_err(map_ureq_error)?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(());
        }
        let body = response.body_mut().read_to_string().unwrap_or_default();
        Err(classify_status(status, &body))
    }
}

impl CommandTransport for HttpCommandClient {
    fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, TransportError> {
        let url = format!("{}{EXECUTE_PATH}", self.base_url);
        let mut builder = self
            .agent
            .post(&url)
            .header("User-Agent", &user_agent())
            .header("Accept", "application/json");
        if let Some(token) = &self.auth_token {
            builder = builder.header("Authorization", &format!("Bearer {token}"));
        }

        let mut response = builder.send_json(request).map_err(map_ureq_error)?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(map_ureq_error)?;

        tracing::debug!(command = %request.command, status, "command endpoint replied");
        decode_execute_reply(status, &body)
    }
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();
    config.into()
}

fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn map_ureq_error(error: ureq::Error) -> TransportError {
    match error {
        ureq::Error::StatusCode(status) => classify_status(status, ""),
        ureq::Error::Io(_)
        | ureq::Error::Timeout(_)
        | ureq::Error::HostNotFound
        | ureq::Error::ConnectionFailed => TransportError::Network(error.to_string()),
        other => TransportError::Unexpected(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maps_well_known_statuses() {
        assert_eq!(classify_status(404, ""), TransportError::NotFound);
        assert_eq!(classify_status(401, ""), TransportError::Unauthorized);
        assert_eq!(classify_status(429, ""), TransportError::RateLimited);
        assert_eq!(classify_status(403, ""), TransportError::Forbidden);
        assert_eq!(
            classify_status(503, "<html>down</html>"),
            TransportError::Server { status: 503 }
        );
        assert_eq!(
            classify_status(418, ""),
            TransportError::Unexpected("HTTP 418".to_string())
        );
    }

    #[test]
    fn classify_surfaces_structured_error_message() {
        let body = r#"{"error":{"message":"Board is locked","code":"LOCKED"}}"#;
        assert_eq!(
            classify_status(400, body),
            TransportError::Api {
                message: "Board is locked".to_string()
            }
        );
        assert_eq!(
            classify_status(500, body),
            TransportError::Api {
                message: "Board is locked".to_string()
            }
        );
    }

    #[test]
    fn forbidden_with_structured_body_surfaces_server_message() {
        let body = r#"{"error":{"message":"Board is locked"}}"#;
        assert_eq!(
            classify_status(403, body),
            TransportError::Api {
                message: "Board is locked".to_string()
            }
        );
        assert_eq!(classify_status(403, "Forbidden"), TransportError::Forbidden);
        assert_eq!(
            classify_status(403, r#"{"error":{"message":"  "}}"#),
            TransportError::Forbidden
        );
    }

    #[test]
    fn status_wins_over_structured_body_for_rate_limit() {
        let body = r#"{"error":{"message":"slow down"}}"#;
        assert_eq!(classify_status(429, body), TransportError::RateLimited);
    }

    #[test]
    fn decode_reads_success_and_failure_shapes() {
        let ok = decode_execute_reply(200, r#"{"success":true,"message":"done"}"#).expect("ok");
        assert!(ok.success);
        assert_eq!(ok.message.as_deref(), Some("done"));

        let failed = decode_execute_reply(200, r#"{"success":false}"#).expect("failed");
        assert!(!failed.success);
        assert!(failed.message.is_none());

        let garbage = decode_execute_reply(200, "not json").expect_err("garbage");
        assert!(matches!(garbage, TransportError::Unexpected(_)));
    }

    #[test]
    fn usernames_skip_entries_without_names() {
        let response = decode_execute_reply(
            200,
            r#"{"success":true,"data":{"users":[{"username":"ghost"},{"id":"7"},{"username":"neo"}]}}"#,
        )
        .expect("decode");
        assert_eq!(response.usernames(), vec!["ghost".to_string(), "neo".to_string()]);
        assert!(ExecuteResponse::default().usernames().is_empty());
    }

    #[test]
    fn request_serializes_to_wire_shape() {
        let request = ExecuteRequest {
            command: "/read".to_string(),
            args: vec!["42".to_string()],
        };
        let json = serde_json::to_value(&request).expect("json");
        assert_eq!(json, serde_json::json!({"command": "/read", "args": ["42"]}));
    }

    #[test]
    fn client_trims_trailing_slash_and_blank_token() {
        let client = HttpCommandClient::new(
            "http://localhost:8000/",
            Some("  ".to_string()),
            Duration::from_secs(1),
        );
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert!(client.auth_token.is_none());
    }
}
