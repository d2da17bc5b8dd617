//! Wire types for the remote gateway
//!
//! Responses are parsed into [`Reply`] at the boundary so malformed payloads
//! never reach UI state.

use super::timestamp;
use crate::messages::Message;
use crate::{DisolError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Fallback text when the gateway reports failure without an `error` field
pub const GENERIC_REJECTION: &str = "The request was rejected by the server";

/// Outcome of a gateway call that reached the server and returned JSON
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    /// The gateway accepted the request
    Accepted(T),
    /// The gateway reported `success: false` or an `error` field
    Rejected(String),
}

impl<T> Reply<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Reply::Accepted(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Reply::Accepted(value) => Reply::Accepted(f(value)),
            Reply::Rejected(error) => Reply::Rejected(error),
        }
    }

    pub fn accepted(self) -> Option<T> {
        match self {
            Reply::Accepted(value) => Some(value),
            Reply::Rejected(_) => None,
        }
    }
}

impl<T: DeserializeOwned> Reply<T> {
    /// Classify a JSON body into accepted payload or rejection
    pub fn from_value(value: Value) -> Result<Self> {
        if let Some(error) = rejection(&value) {
            return Ok(Reply::Rejected(error));
        }
        serde_json::from_value(value)
            .map(Reply::Accepted)
            .map_err(|e| DisolError::Parse(e.to_string()))
    }
}

fn rejection(value: &Value) -> Option<String> {
    let success = value.get("success").and_then(Value::as_bool);
    if success == Some(true) {
        return None;
    }

    let error = value.get("error").and_then(|error| match error {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    });

    match (success, error) {
        (_, Some(error)) => Some(error),
        (Some(false), None) => Some(GENERIC_REJECTION.to_string()),
        _ => None,
    }
}

/// Kind of generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Code,
    Image,
    Video,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Code, ContentKind::Image, ContentKind::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Code => "code",
            ContentKind::Image => "image",
            ContentKind::Video => "video",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Code => "Code",
            ContentKind::Image => "Image",
            ContentKind::Video => "Video",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
}

/// Successful login or registration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthGrant {
    pub user: User,
    /// Opaque token, stored but never interpreted
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub message: String,
    pub session_id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatSessionSummary {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Generation {
    #[serde(default, rename = "type")]
    pub kind: Option<ContentKind>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub project_id: Option<i64>,
}

impl Generation {
    /// Short text for an info notification
    pub fn summary(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        match (self.kind, self.project_id) {
            (Some(kind), Some(id)) => format!("Created {} project #{}", kind, id),
            (Some(kind), None) => format!("Generated {}", kind),
            (None, _) => "Generation complete".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedProject {
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub project: Option<Project>,
}

impl CreatedProject {
    pub fn id(&self) -> Option<i64> {
        self.project_id
            .or_else(|| self.project.as_ref().map(|project| project.id))
    }
}

#[derive(Deserialize)]
pub(crate) struct SessionList {
    pub sessions: Vec<ChatSessionSummary>,
}

#[derive(Deserialize)]
pub(crate) struct MessageList {
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
pub(crate) struct ProjectList {
    #[serde(deserialize_with = "readable_projects")]
    pub projects: Vec<Project>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rows that do not parse (unknown `type`, missing id) are skipped, not fatal
fn readable_projects<'de, D>(deserializer: D) -> std::result::Result<Vec<Project>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Vec::<Value>::deserialize(deserializer)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<Project>(row) {
            Ok(project) => Some(project),
            Err(e) => {
                warn!("skipping unreadable project: {}", e);
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AuthAction {
    Register,
    Login,
}

#[derive(Debug, Serialize)]
pub(crate) struct AuthRequest<'a> {
    pub action: AuthAction,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub user_id: i64,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub prompt: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateProjectRequest<'a> {
    pub user_id: i64,
    pub title: &'a str,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<&'a str>,
}
