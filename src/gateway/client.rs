//! Async HTTP client for the four gateway endpoints
//!
//! One method per remote capability. Every call issues exactly one request;
//! there are no retries, timeouts or caches.

use super::types::{
    AuthAction, AuthGrant, AuthRequest, ChatReply, ChatSessionSummary, ContentKind,
    CreateProjectRequest, CreatedProject, GenerateRequest, Generation, MessageList, Project,
    ProjectList, Reply, SendMessageRequest, SessionList,
};
use crate::config::GatewayConfig;
use crate::messages::Message;
use crate::{DisolError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<Reply<AuthGrant>> {
        debug!(email, "register");
        let body = AuthRequest {
            action: AuthAction::Register,
            email,
            password,
            name: Some(name),
        };
        self.post(&self.config.auth_url, &body).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Reply<AuthGrant>> {
        debug!(email, "login");
        let body = AuthRequest {
            action: AuthAction::Login,
            email,
            password,
            name: None,
        };
        self.post(&self.config.auth_url, &body).await
    }

    /// Send one chat message; `session_id` is `None` for the first message of a conversation
    pub async fn send_message(
        &self,
        user_id: i64,
        message: &str,
        session_id: Option<i64>,
    ) -> Result<Reply<ChatReply>> {
        debug!(user_id, ?session_id, "send message");
        let body = SendMessageRequest {
            user_id,
            message,
            session_id,
        };
        self.post(&self.config.chat_url, &body).await
    }

    pub async fn list_chat_sessions(&self, user_id: i64) -> Result<Reply<Vec<ChatSessionSummary>>> {
        debug!(user_id, "list chat sessions");
        let query = [("user_id", user_id.to_string())];
        let reply: Reply<SessionList> = self.get(&self.config.chat_url, &query).await?;
        Ok(reply.map(|list| list.sessions))
    }

    pub async fn list_chat_messages(
        &self,
        user_id: i64,
        session_id: i64,
    ) -> Result<Reply<Vec<Message>>> {
        debug!(user_id, session_id, "list chat messages");
        let query = [
            ("user_id", user_id.to_string()),
            ("session_id", session_id.to_string()),
        ];
        let reply: Reply<MessageList> = self.get(&self.config.chat_url, &query).await?;
        Ok(reply.map(|list| list.messages))
    }

    pub async fn generate_content(
        &self,
        user_id: i64,
        kind: ContentKind,
        prompt: &str,
    ) -> Result<Reply<Generation>> {
        debug!(user_id, %kind, "generate content");
        let body = GenerateRequest {
            user_id,
            kind,
            prompt,
        };
        self.post(&self.config.generate_url, &body).await
    }

    /// List projects, optionally filtered by kind
    pub async fn list_projects(
        &self,
        user_id: i64,
        kind: Option<ContentKind>,
    ) -> Result<Reply<Vec<Project>>> {
        debug!(user_id, ?kind, "list projects");
        let mut query = vec![("user_id", user_id.to_string())];
        if let Some(kind) = kind {
            query.push(("type", kind.as_str().to_string()));
        }
        let reply: Reply<ProjectList> = self.get(&self.config.projects_url, &query).await?;
        Ok(reply.map(|list| list.projects))
    }

    pub async fn create_project(
        &self,
        user_id: i64,
        title: &str,
        kind: ContentKind,
        content: &str,
        language: Option<&str>,
    ) -> Result<Reply<CreatedProject>> {
        debug!(user_id, %kind, "create project");
        let body = CreateProjectRequest {
            user_id,
            title,
            kind,
            content,
            language,
        };
        self.post(&self.config.projects_url, &body).await
    }

    async fn post<B, T>(&self, url: &str, body: &B) -> Result<Reply<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.http.post(url).json(body).send().await?;
        Self::read_reply(response).await
    }

    async fn get<T>(&self, url: &str, query: &[(&str, String)]) -> Result<Reply<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.http.get(url).query(query).send().await?;
        Self::read_reply(response).await
    }

    // The gateway reports validation failures as non-2xx JSON bodies, so the
    // status code alone does not decide success.
    async fn read_reply<T: DeserializeOwned>(response: reqwest::Response) -> Result<Reply<T>> {
        let status = response.status();
        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| DisolError::Parse(format!("HTTP {}: {}", status, e)))?;
        Reply::from_value(value)
    }
}
