//! Wire-level domain types shared between the gateway and the client.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::session::PlannedMinutes;

/// Authenticated user credential, persisted across runs.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credential {
    pub token: String,
    pub username: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .finish()
    }
}

/// Opaque focus session identifier assigned by the backend.
///
/// The backend currently hands out integers, but nothing on the client side
/// depends on that, so the raw JSON value is echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(serde_json::Value);

impl SessionId {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// A daily plan entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    #[serde(rename = "plan_text")]
    pub text: String,
    #[serde(default, deserialize_with = "flag")]
    pub completed: bool,
}

/// Aggregate focus statistics for the current day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default, deserialize_with = "count")]
    pub total_minutes: u32,
    #[serde(default, deserialize_with = "count")]
    pub sessions: u32,
    #[serde(default, deserialize_with = "count")]
    pub distractions: u32,
}

/// Dashboard payload: daily question, stats and today's plans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub ai_question: String,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub plans: Vec<Plan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Where a chat message was sent from; the assistant answers differently
/// while a focus session is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatContext {
    #[default]
    Dashboard,
    Focus,
}

/// How a focus session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitType {
    Completed,
    Distracted,
}

impl ExitType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Distracted => "distracted",
        }
    }
}

impl fmt::Display for ExitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/focus/start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StartFocus {
    pub planned_minutes: PlannedMinutes,
}

/// Response of `POST /api/focus/start`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FocusStarted {
    pub session_id: SessionId,
}

/// Body of `POST /api/focus/end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndFocus {
    pub session_id: SessionId,
    pub exit_type: ExitType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<String>,
}

/// Response of `POST /api/focus/end`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FocusEnded {
    #[serde(default, deserialize_with = "count")]
    pub actual_minutes: u32,
    #[serde(default)]
    pub ai_response: Option<String>,
}

/// Accepts `true`/`false` as well as the `0`/`1` integers SQLite-backed
/// servers tend to emit.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Null(()),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
        Flag::Null(()) => false,
    })
}

/// Non-negative counter that tolerates `null`.
fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<i64>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| u32::try_from(v.max(0)).ok())
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_accepts_integer_completed_flag() {
        let plan: Plan =
            serde_json::from_str(r#"{"id":3,"plan_text":"Write report","completed":1}"#).unwrap();
        assert_eq!(plan.text, "Write report");
        assert!(plan.completed);

        let plan: Plan =
            serde_json::from_str(r#"{"id":4,"plan_text":"Read","completed":false}"#).unwrap();
        assert!(!plan.completed);
    }

    #[test]
    fn dashboard_defaults_missing_stats_to_zero() {
        let dashboard: Dashboard = serde_json::from_str(
            r#"{"ai_question":"What will you do today?","stats":{"sessions":2,"total_minutes":null},"plans":[]}"#,
        )
        .unwrap();
        assert_eq!(
            dashboard.stats,
            Stats {
                total_minutes: 0,
                sessions: 2,
                distractions: 0,
            }
        );
    }

    #[test]
    fn end_focus_omits_absent_reason() {
        let body = EndFocus {
            session_id: SessionId::new(7),
            exit_type: ExitType::Completed,
            exit_reason: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"session_id":7,"exit_type":"completed"}"#);
    }

    #[test]
    fn session_id_round_trips_opaque_value() {
        let started: FocusStarted = serde_json::from_str(r#"{"session_id":"abc-1"}"#).unwrap();
        assert_eq!(started.session_id.to_string(), "abc-1");
        assert_eq!(
            serde_json::to_string(&started.session_id).unwrap(),
            r#""abc-1""#
        );
    }

    #[test]
    fn credential_debug_redacts_token() {
        let credential = Credential {
            token: "secret-token".to_string(),
            username: "aziz".to_string(),
        };
        let debug = format!("{credential:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("aziz"));
    }
}
