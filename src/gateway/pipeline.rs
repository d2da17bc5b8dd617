//! Gateway worker with channel-based communication
//!
//! The UI thread sends [`GatewayCommand`]s and drains [`GatewayEvent`]s once
//! per frame. A dedicated thread owns the tokio runtime; each command runs
//! as its own task so a slow generation does not hold back a project reload.

use super::client::GatewayClient;
use super::types::{
    AuthGrant, ChatReply, ChatSessionSummary, ContentKind, CreatedProject, Generation, Project,
    Reply,
};
use crate::config::GatewayConfig;
use crate::messages::Message;
use crate::{DisolError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Callback invoked after every posted event, used to wake the UI
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Correlates a response with the request that caused it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    pub id: Uuid,
    /// Login generation the request was issued in
    pub epoch: u64,
}

impl RequestTag {
    pub fn new(epoch: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
        }
    }
}

/// Remote capability a command or event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Auth,
    SendMessage,
    ListChatSessions,
    ListChatMessages,
    Generate,
    ListProjects,
    CreateProject,
}

/// Commands that can be sent to the gateway worker
#[derive(Debug, Clone)]
pub enum GatewayCommand {
    Register {
        tag: RequestTag,
        email: String,
        password: String,
        name: String,
    },
    Login {
        tag: RequestTag,
        email: String,
        password: String,
    },
    SendMessage {
        tag: RequestTag,
        user_id: i64,
        message: String,
        session_id: Option<i64>,
    },
    ListChatSessions {
        tag: RequestTag,
        user_id: i64,
    },
    ListChatMessages {
        tag: RequestTag,
        user_id: i64,
        session_id: i64,
    },
    Generate {
        tag: RequestTag,
        user_id: i64,
        kind: ContentKind,
        prompt: String,
    },
    ListProjects {
        tag: RequestTag,
        user_id: i64,
        kind: Option<ContentKind>,
    },
    CreateProject {
        tag: RequestTag,
        user_id: i64,
        title: String,
        kind: ContentKind,
        content: String,
        language: Option<String>,
    },
    /// Stop the worker loop
    Shutdown,
}

impl GatewayCommand {
    pub fn tag(&self) -> Option<RequestTag> {
        match self {
            GatewayCommand::Register { tag, .. }
            | GatewayCommand::Login { tag, .. }
            | GatewayCommand::SendMessage { tag, .. }
            | GatewayCommand::ListChatSessions { tag, .. }
            | GatewayCommand::ListChatMessages { tag, .. }
            | GatewayCommand::Generate { tag, .. }
            | GatewayCommand::ListProjects { tag, .. }
            | GatewayCommand::CreateProject { tag, .. } => Some(*tag),
            GatewayCommand::Shutdown => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            GatewayCommand::Register { .. } | GatewayCommand::Login { .. } => Some(Operation::Auth),
            GatewayCommand::SendMessage { .. } => Some(Operation::SendMessage),
            GatewayCommand::ListChatSessions { .. } => Some(Operation::ListChatSessions),
            GatewayCommand::ListChatMessages { .. } => Some(Operation::ListChatMessages),
            GatewayCommand::Generate { .. } => Some(Operation::Generate),
            GatewayCommand::ListProjects { .. } => Some(Operation::ListProjects),
            GatewayCommand::CreateProject { .. } => Some(Operation::CreateProject),
            GatewayCommand::Shutdown => None,
        }
    }
}

/// Events emitted by the gateway worker
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Authenticated {
        tag: RequestTag,
        reply: Reply<AuthGrant>,
    },
    MessageAnswered {
        tag: RequestTag,
        reply: Reply<ChatReply>,
    },
    ChatSessionsListed {
        tag: RequestTag,
        reply: Reply<Vec<ChatSessionSummary>>,
    },
    ChatMessagesListed {
        tag: RequestTag,
        session_id: i64,
        reply: Reply<Vec<Message>>,
    },
    Generated {
        tag: RequestTag,
        reply: Reply<Generation>,
    },
    ProjectsListed {
        tag: RequestTag,
        reply: Reply<Vec<Project>>,
    },
    ProjectCreated {
        tag: RequestTag,
        reply: Reply<CreatedProject>,
    },
    /// Transport or parse failure; the request never produced a reply
    Failed {
        tag: RequestTag,
        operation: Operation,
        error: DisolError,
    },
    /// Worker has shut down
    Shutdown,
}

/// Gateway pipeline with channel-based communication
pub struct GatewayPipeline {
    config: GatewayConfig,
    command_tx: Sender<GatewayCommand>,
    command_rx: Receiver<GatewayCommand>,
    event_tx: Sender<GatewayEvent>,
    event_rx: Receiver<GatewayEvent>,
    waker: Option<Waker>,
}

impl GatewayPipeline {
    pub fn new(config: GatewayConfig) -> Self {
        let (command_tx, command_rx) = bounded(100);
        let (event_tx, event_rx) = bounded(100);

        Self {
            config,
            command_tx,
            command_rx,
            event_tx,
            event_rx,
            waker: None,
        }
    }

    /// Register a callback run after each event is posted
    pub fn with_waker(mut self, waker: Waker) -> Self {
        self.waker = Some(waker);
        self
    }

    pub fn command_sender(&self) -> Sender<GatewayCommand> {
        self.command_tx.clone()
    }

    pub fn event_receiver(&self) -> Receiver<GatewayEvent> {
        self.event_rx.clone()
    }

    /// Start the worker thread
    pub fn start_worker(self) -> Result<JoinHandle<()>> {
        let GatewayPipeline {
            config,
            command_rx,
            event_tx,
            waker,
            ..
        } = self;

        std::thread::Builder::new()
            .name("disol-gateway".to_string())
            .spawn(move || run_worker(config, command_rx, event_tx, waker))
            .map_err(|e| DisolError::Channel(format!("failed to spawn gateway worker: {}", e)))
    }
}

fn run_worker(
    config: GatewayConfig,
    command_rx: Receiver<GatewayCommand>,
    event_tx: Sender<GatewayEvent>,
    waker: Option<Waker>,
) {
    info!("Gateway worker starting");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("disol-gateway-io")
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            post(&event_tx, waker.as_ref(), GatewayEvent::Shutdown);
            return;
        }
    };

    let client = GatewayClient::new(config);
    info!("Gateway worker ready");

    loop {
        match command_rx.recv() {
            Ok(GatewayCommand::Shutdown) => {
                info!("Gateway worker shutting down");
                post(&event_tx, waker.as_ref(), GatewayEvent::Shutdown);
                break;
            }
            Ok(command) => {
                debug!(operation = ?command.operation(), "dispatching gateway command");
                let client = client.clone();
                let event_tx = event_tx.clone();
                let waker = waker.clone();
                runtime.spawn(async move {
                    let event = execute(&client, command).await;
                    post(&event_tx, waker.as_ref(), event);
                });
            }
            Err(e) => {
                error!("Command channel error: {}", e);
                break;
            }
        }
    }

    info!("Gateway worker stopped");
}

fn post(event_tx: &Sender<GatewayEvent>, waker: Option<&Waker>, event: GatewayEvent) {
    if event_tx.send(event).is_err() {
        debug!("event receiver dropped");
        return;
    }
    if let Some(waker) = waker {
        waker();
    }
}

/// Run one command against the client and wrap the result as an event
pub async fn execute(client: &GatewayClient, command: GatewayCommand) -> GatewayEvent {
    let (tag, operation) = match (command.tag(), command.operation()) {
        (Some(tag), Some(operation)) => (tag, operation),
        _ => return GatewayEvent::Shutdown,
    };

    let result = match command {
        GatewayCommand::Register {
            email,
            password,
            name,
            ..
        } => client
            .register(&email, &password, &name)
            .await
            .map(|reply| GatewayEvent::Authenticated { tag, reply }),
        GatewayCommand::Login {
            email, password, ..
        } => client
            .login(&email, &password)
            .await
            .map(|reply| GatewayEvent::Authenticated { tag, reply }),
        GatewayCommand::SendMessage {
            user_id,
            message,
            session_id,
            ..
        } => client
            .send_message(user_id, &message, session_id)
            .await
            .map(|reply| GatewayEvent::MessageAnswered { tag, reply }),
        GatewayCommand::ListChatSessions { user_id, .. } => client
            .list_chat_sessions(user_id)
            .await
            .map(|reply| GatewayEvent::ChatSessionsListed { tag, reply }),
        GatewayCommand::ListChatMessages {
            user_id,
            session_id,
            ..
        } => client
            .list_chat_messages(user_id, session_id)
            .await
            .map(|reply| GatewayEvent::ChatMessagesListed {
                tag,
                session_id,
                reply,
            }),
        GatewayCommand::Generate {
            user_id,
            kind,
            prompt,
            ..
        } => client
            .generate_content(user_id, kind, &prompt)
            .await
            .map(|reply| GatewayEvent::Generated { tag, reply }),
        GatewayCommand::ListProjects { user_id, kind, .. } => client
            .list_projects(user_id, kind)
            .await
            .map(|reply| GatewayEvent::ProjectsListed { tag, reply }),
        GatewayCommand::CreateProject {
            user_id,
            title,
            kind,
            content,
            language,
            ..
        } => client
            .create_project(user_id, &title, kind, &content, language.as_deref())
            .await
            .map(|reply| GatewayEvent::ProjectCreated { tag, reply }),
        GatewayCommand::Shutdown => return GatewayEvent::Shutdown,
    };

    result.unwrap_or_else(|error| {
        error!(?operation, "gateway request failed: {}", error);
        GatewayEvent::Failed {
            tag,
            operation,
            error,
        }
    })
}
