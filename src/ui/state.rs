//! Application state management
//!
//! [`AppState`] is the single state container for the UI. User actions are
//! turned into [`GatewayCommand`]s; [`GatewayEvent`]s are folded back in by
//! [`AppState::poll_events`] once per frame.

use crate::gateway::pipeline::Operation;
use crate::gateway::{
    ChatSessionSummary, ContentKind, GatewayCommand, GatewayEvent, Project, Reply, RequestTag,
    Waker,
};
use crate::messages::{Message, Transcript};
use crate::session::{Session, SessionStore};
use crate::speech::SpeechInput;
use crate::DisolError;
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Maximum number of notifications kept on screen
pub const MAX_NOTIFICATIONS: usize = 20;

/// Sidebar sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Chat,
    Projects,
    Profile,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Chat, Section::Projects, Section::Profile];

    pub fn label(&self) -> &'static str {
        match self {
            Section::Chat => "AI Chat",
            Section::Projects => "Projects",
            Section::Profile => "Profile",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Section::Chat => "💬",
            Section::Projects => "📁",
            Section::Profile => "👤",
        }
    }
}

/// Whether a user is signed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(Session),
}

/// Which form the auth screen shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Request class guarded by the busy flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyAction {
    Auth,
    SendMessage,
    Generate(ContentKind),
    CreateProject,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    tag: RequestTag,
    action: BusyAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Fields of the login / registration form
#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            email: String::new(),
            password: String::new(),
            name: String::new(),
        }
    }
}

/// Fields of the "New project" form
#[derive(Debug, Clone)]
pub struct ProjectForm {
    pub open: bool,
    pub title: String,
    pub kind: ContentKind,
    pub content: String,
    pub language: String,
}

impl Default for ProjectForm {
    fn default() -> Self {
        Self {
            open: false,
            title: String::new(),
            kind: ContentKind::Code,
            content: String::new(),
            language: String::new(),
        }
    }
}

/// Past conversations shown read-only on the profile page
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    pub sessions: Vec<ChatSessionSummary>,
    pub selected: Option<i64>,
    pub preview: Vec<Message>,
    pending_sessions: Option<RequestTag>,
    pending_messages: Option<RequestTag>,
}

impl ChatHistory {
    pub fn is_loading(&self) -> bool {
        self.pending_sessions.is_some() || self.pending_messages.is_some()
    }
}

/// Results delivered by the speech backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Transcript(String),
    Error(String),
}

/// Central application state
pub struct AppState {
    /// Signed-in user, if any
    pub auth: AuthState,

    /// Active sidebar section
    pub section: Section,

    /// Whether the sidebar shows labels
    pub sidebar_open: bool,

    /// Active conversation
    pub transcript: Transcript,

    /// Server conversation id; set once by the first answered message
    pub chat_session_id: Option<i64>,

    /// Last loaded project list
    pub projects: Vec<Project>,

    /// Type filter applied to project loads
    pub project_filter: Option<ContentKind>,

    /// Chat input, also used as the generation prompt
    pub input_text: String,

    pub auth_form: AuthForm,
    pub project_form: ProjectForm,
    pub history: ChatHistory,
    pub notifications: VecDeque<Notification>,

    /// Voice input
    pub speech: SpeechInput,

    /// Bumped on logout; responses tagged with an older epoch are dropped
    epoch: u64,

    in_flight: Option<InFlight>,
    pending_projects: Option<RequestTag>,

    store: Option<SessionStore>,
    gateway_tx: Option<Sender<GatewayCommand>>,
    gateway_rx: Option<Receiver<GatewayEvent>>,
    /// Speech results tagged with the epoch of the capture that produced them
    speech_tx: Sender<(u64, SpeechEvent)>,
    speech_rx: Receiver<(u64, SpeechEvent)>,
    waker: Option<Waker>,
    next_notification_id: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Create a new application state with no gateway, store or voice backend
    pub fn new() -> Self {
        let (speech_tx, speech_rx) = unbounded();
        Self {
            auth: AuthState::Unauthenticated,
            section: Section::Chat,
            sidebar_open: true,
            transcript: Transcript::new(),
            chat_session_id: None,
            projects: Vec::new(),
            project_filter: None,
            input_text: String::new(),
            auth_form: AuthForm::default(),
            project_form: ProjectForm::default(),
            history: ChatHistory::default(),
            notifications: VecDeque::with_capacity(MAX_NOTIFICATIONS),
            speech: SpeechInput::unsupported(),
            epoch: 0,
            in_flight: None,
            pending_projects: None,
            store: None,
            gateway_tx: None,
            gateway_rx: None,
            speech_tx,
            speech_rx,
            waker: None,
            next_notification_id: 0,
        }
    }

    /// Connect the gateway worker channels
    pub fn with_gateway(
        mut self,
        command_tx: Sender<GatewayCommand>,
        event_rx: Receiver<GatewayEvent>,
    ) -> Self {
        self.gateway_tx = Some(command_tx);
        self.gateway_rx = Some(event_rx);
        self
    }

    /// Attach the durable session store
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_speech(mut self, speech: SpeechInput) -> Self {
        self.speech = speech;
        self
    }

    /// Callback used to wake the UI when voice input finishes
    pub fn with_waker(mut self, waker: Waker) -> Self {
        self.waker = Some(waker);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.auth {
            AuthState::Authenticated(session) => Some(session),
            AuthState::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    fn user_id(&self) -> Option<i64> {
        self.session().map(|session| session.id)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn busy_action(&self) -> Option<BusyAction> {
        self.in_flight.map(|in_flight| in_flight.action)
    }

    pub fn projects_loading(&self) -> bool {
        self.pending_projects.is_some()
    }

    // ----- notifications -----

    pub fn notify(&mut self, level: NotificationLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            NotificationLevel::Info => info!("{}", text),
            NotificationLevel::Error => warn!("{}", text),
        }

        self.next_notification_id += 1;
        if self.notifications.len() >= MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(Notification {
            id: self.next_notification_id,
            level,
            text,
            created_at: Utc::now(),
        });
    }

    fn notify_error(&mut self, text: impl Into<String>) {
        self.notify(NotificationLevel::Error, text);
    }

    pub fn dismiss_notification(&mut self, id: u64) {
        self.notifications.retain(|notification| notification.id != id);
    }

    pub fn last_error(&self) -> Option<&str> {
        self.notifications
            .iter()
            .rev()
            .find(|notification| notification.level == NotificationLevel::Error)
            .map(|notification| notification.text.as_str())
    }

    // ----- dispatch -----

    fn new_tag(&self) -> RequestTag {
        RequestTag::new(self.epoch)
    }

    fn dispatch(&mut self, command: GatewayCommand) -> bool {
        let Some(tx) = &self.gateway_tx else {
            warn!(operation = ?command.operation(), "no gateway connected");
            self.notify_error(DisolError::Channel("gateway not connected".into()).user_message());
            return false;
        };

        debug!(operation = ?command.operation(), "dispatch");
        if let Err(e) = tx.send(command) {
            warn!("gateway channel closed: {}", e);
            self.notify_error(DisolError::Channel(e.to_string()).user_message());
            return false;
        }
        true
    }

    fn dispatch_busy(&mut self, action: BusyAction, command: GatewayCommand) -> bool {
        let Some(tag) = command.tag() else {
            return false;
        };
        if self.dispatch(command) {
            self.in_flight = Some(InFlight { tag, action });
            true
        } else {
            false
        }
    }

    // ----- session lifecycle -----

    /// Adopt a persisted session without re-validating it
    pub fn restore(&mut self) {
        let Some(store) = &self.store else {
            return;
        };

        match store.load() {
            Ok(Some(session)) => {
                info!(user_id = session.id, "restored session");
                self.auth = AuthState::Authenticated(session);
                self.load_projects();
            }
            Ok(None) => debug!("no stored session"),
            Err(e) => {
                warn!("failed to read stored session: {}", e);
                self.notify_error(e.user_message());
            }
        }
    }

    pub fn login(&mut self, email: &str, password: &str) {
        if self.is_authenticated() || self.is_busy() {
            return;
        }
        let command = GatewayCommand::Login {
            tag: self.new_tag(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        self.dispatch_busy(BusyAction::Auth, command);
    }

    pub fn register(&mut self, email: &str, password: &str, name: &str) {
        if self.is_authenticated() || self.is_busy() {
            return;
        }
        let command = GatewayCommand::Register {
            tag: self.new_tag(),
            email: email.trim().to_string(),
            password: password.to_string(),
            name: name.trim().to_string(),
        };
        self.dispatch_busy(BusyAction::Auth, command);
    }

    /// Submit the auth form in its current mode
    pub fn submit_auth(&mut self) {
        let form = self.auth_form.clone();
        if form.email.trim().is_empty() || form.password.is_empty() {
            self.notify_error("Enter your email and password");
            return;
        }
        match form.mode {
            AuthMode::Login => self.login(&form.email, &form.password),
            AuthMode::Register => {
                if form.name.trim().is_empty() {
                    self.notify_error("Enter your name");
                    return;
                }
                self.register(&form.email, &form.password, &form.name)
            }
        }
    }

    /// Sign out and drop everything tied to the session
    pub fn logout(&mut self) {
        if let Some(session) = self.session() {
            info!(user_id = session.id, "logout");
        }

        self.epoch += 1;
        self.in_flight = None;
        self.pending_projects = None;
        self.speech.stop();

        self.auth = AuthState::Unauthenticated;
        self.section = Section::Chat;
        self.transcript.clear();
        self.chat_session_id = None;
        self.projects.clear();
        self.project_filter = None;
        self.input_text.clear();
        self.project_form = ProjectForm::default();
        self.history = ChatHistory::default();
        self.auth_form.password.clear();

        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                warn!("failed to clear stored session: {}", e);
                let message = e.user_message();
                self.notify_error(message);
            }
        }
    }

    pub fn set_section(&mut self, section: Section) {
        self.section = section;
    }

    // ----- chat -----

    /// Send the chat input as a message
    pub fn send_message(&mut self) {
        let Some(user_id) = self.user_id() else {
            return;
        };
        let text = self.input_text.trim().to_string();
        if text.is_empty() {
            return;
        }
        if self.is_busy() {
            debug!("request in flight, ignoring send");
            return;
        }

        self.transcript.push(Message::user(text.clone()));
        self.input_text.clear();

        let command = GatewayCommand::SendMessage {
            tag: self.new_tag(),
            user_id,
            message: text,
            session_id: self.chat_session_id,
        };
        self.dispatch_busy(BusyAction::SendMessage, command);
    }

    // ----- generation and projects -----

    /// Generate content of `kind` from the chat input
    pub fn generate(&mut self, kind: ContentKind) {
        let Some(user_id) = self.user_id() else {
            return;
        };
        let prompt = self.input_text.trim().to_string();
        if prompt.is_empty() || self.is_busy() {
            return;
        }

        let command = GatewayCommand::Generate {
            tag: self.new_tag(),
            user_id,
            kind,
            prompt,
        };
        self.dispatch_busy(BusyAction::Generate(kind), command);
    }

    /// Reload the full project list with the current filter
    pub fn load_projects(&mut self) {
        let Some(user_id) = self.user_id() else {
            return;
        };
        let tag = self.new_tag();
        let command = GatewayCommand::ListProjects {
            tag,
            user_id,
            kind: self.project_filter,
        };
        if self.dispatch(command) {
            // supersedes any earlier load
            self.pending_projects = Some(tag);
        }
    }

    pub fn set_project_filter(&mut self, filter: Option<ContentKind>) {
        if self.project_filter == filter {
            return;
        }
        self.project_filter = filter;
        self.load_projects();
    }

    pub fn open_project_form(&mut self) {
        self.project_form = ProjectForm {
            open: true,
            ..ProjectForm::default()
        };
    }

    pub fn close_project_form(&mut self) {
        self.project_form.open = false;
    }

    /// Submit the "New project" form
    pub fn create_project(&mut self) {
        let Some(user_id) = self.user_id() else {
            return;
        };
        let form = self.project_form.clone();
        if form.title.trim().is_empty() {
            self.notify_error("Project title is required");
            return;
        }
        if self.is_busy() {
            return;
        }

        let language = Some(form.language.trim())
            .filter(|language| !language.is_empty())
            .map(str::to_string);
        let command = GatewayCommand::CreateProject {
            tag: self.new_tag(),
            user_id,
            title: form.title.trim().to_string(),
            kind: form.kind,
            content: form.content,
            language,
        };
        self.dispatch_busy(BusyAction::CreateProject, command);
    }

    // ----- conversation history -----

    pub fn refresh_history(&mut self) {
        let Some(user_id) = self.user_id() else {
            return;
        };
        let tag = self.new_tag();
        if self.dispatch(GatewayCommand::ListChatSessions { tag, user_id }) {
            self.history.pending_sessions = Some(tag);
        }
    }

    /// Load a past conversation into the read-only preview
    pub fn open_history_session(&mut self, session_id: i64) {
        let Some(user_id) = self.user_id() else {
            return;
        };
        let tag = self.new_tag();
        let command = GatewayCommand::ListChatMessages {
            tag,
            user_id,
            session_id,
        };
        if self.dispatch(command) {
            self.history.selected = Some(session_id);
            self.history.preview.clear();
            self.history.pending_messages = Some(tag);
        }
    }

    // ----- voice input -----

    /// Start voice capture, or stop it when already listening
    pub fn toggle_voice_input(&mut self) {
        if self.speech.is_listening() {
            self.speech.stop();
            return;
        }

        let result_tx = self.speech_tx.clone();
        let error_tx = self.speech_tx.clone();
        let result_waker = self.waker.clone();
        let error_waker = self.waker.clone();
        let epoch = self.epoch;

        self.speech.start(
            move |text| {
                let _ = result_tx.send((epoch, SpeechEvent::Transcript(text)));
                if let Some(waker) = result_waker {
                    waker();
                }
            },
            move |error| {
                let _ = error_tx.send((epoch, SpeechEvent::Error(error)));
                if let Some(waker) = error_waker {
                    waker();
                }
            },
        );
    }

    pub fn is_listening(&self) -> bool {
        self.speech.is_listening()
    }

    // ----- event folding -----

    /// Drain gateway and speech events
    pub fn poll_events(&mut self) {
        let gateway_events: Vec<GatewayEvent> = match &self.gateway_rx {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for event in gateway_events {
            self.apply_event(event);
        }

        let speech_events: Vec<(u64, SpeechEvent)> = self.speech_rx.try_iter().collect();
        for (epoch, event) in speech_events {
            if epoch != self.epoch {
                debug!("dropping voice result from an ended session");
                continue;
            }
            self.apply_speech_event(event);
        }
    }

    pub fn apply_speech_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::Transcript(text) => {
                debug!(chars = text.len(), "voice transcript");
                self.input_text = text;
            }
            SpeechEvent::Error(error) => {
                self.notify_error(format!("Voice input: {}", error));
            }
        }
    }

    fn is_stale(&self, tag: &RequestTag) -> bool {
        if tag.epoch != self.epoch {
            debug!(request = %tag.id, "dropping response from an ended session");
            return true;
        }
        false
    }

    /// Clear the busy flag if `tag` is the request it guards
    fn settle_in_flight(&mut self, tag: &RequestTag) -> bool {
        match self.in_flight {
            Some(in_flight) if in_flight.tag == *tag => {
                self.in_flight = None;
                true
            }
            _ => {
                debug!(request = %tag.id, "dropping response for unknown request");
                false
            }
        }
    }

    fn settle_slot(slot: &mut Option<RequestTag>, tag: &RequestTag) -> bool {
        if slot.as_ref() == Some(tag) {
            *slot = None;
            true
        } else {
            debug!(request = %tag.id, "dropping superseded response");
            false
        }
    }

    /// Fold one gateway event into state
    pub fn apply_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Authenticated { tag, reply } => {
                if self.is_stale(&tag) || !self.settle_in_flight(&tag) {
                    return;
                }
                match reply {
                    Reply::Accepted(grant) => {
                        let session = Session::from(grant.user);
                        info!(user_id = session.id, "signed in");
                        if let Some(store) = &self.store {
                            if let Err(e) = store.save(&session, &grant.token) {
                                warn!("failed to persist session: {}", e);
                                let message = e.user_message();
                                self.notify_error(message);
                            }
                        }
                        self.auth = AuthState::Authenticated(session);
                        self.auth_form.password.clear();
                        self.section = Section::Chat;
                        self.load_projects();
                    }
                    Reply::Rejected(error) => self.notify_error(error),
                }
            }

            GatewayEvent::MessageAnswered { tag, reply } => {
                if self.is_stale(&tag) || !self.settle_in_flight(&tag) {
                    return;
                }
                match reply {
                    Reply::Accepted(answer) => {
                        self.transcript.push(Message::assistant(answer.message));
                        match self.chat_session_id {
                            None => {
                                debug!(session_id = answer.session_id, "conversation started");
                                self.chat_session_id = Some(answer.session_id);
                            }
                            Some(current) if current != answer.session_id => {
                                warn!(
                                    current,
                                    returned = answer.session_id,
                                    "server returned a different conversation id, keeping current"
                                );
                            }
                            Some(_) => {}
                        }
                    }
                    Reply::Rejected(error) => self.notify_error(error),
                }
            }

            GatewayEvent::Generated { tag, reply } => {
                if self.is_stale(&tag) || !self.settle_in_flight(&tag) {
                    return;
                }
                match reply {
                    Reply::Accepted(generation) => {
                        self.notify(NotificationLevel::Info, generation.summary());
                        self.input_text.clear();
                        self.section = Section::Projects;
                        // the new artifact must be visible whatever filter was set
                        self.project_filter = None;
                        self.load_projects();
                    }
                    Reply::Rejected(error) => self.notify_error(error),
                }
            }

            GatewayEvent::ProjectCreated { tag, reply } => {
                if self.is_stale(&tag) || !self.settle_in_flight(&tag) {
                    return;
                }
                match reply {
                    Reply::Accepted(created) => {
                        let text = match created.id() {
                            Some(id) => format!("Project #{} created", id),
                            None => "Project created".to_string(),
                        };
                        self.notify(NotificationLevel::Info, text);
                        self.project_form = ProjectForm::default();
                        self.load_projects();
                    }
                    Reply::Rejected(error) => self.notify_error(error),
                }
            }

            GatewayEvent::ProjectsListed { tag, reply } => {
                if self.is_stale(&tag) || !Self::settle_slot(&mut self.pending_projects, &tag) {
                    return;
                }
                match reply {
                    Reply::Accepted(projects) => {
                        debug!(count = projects.len(), "projects loaded");
                        self.projects = projects;
                    }
                    Reply::Rejected(error) => self.notify_error(error),
                }
            }

            GatewayEvent::ChatSessionsListed { tag, reply } => {
                if self.is_stale(&tag)
                    || !Self::settle_slot(&mut self.history.pending_sessions, &tag)
                {
                    return;
                }
                match reply {
                    Reply::Accepted(sessions) => self.history.sessions = sessions,
                    Reply::Rejected(error) => self.notify_error(error),
                }
            }

            GatewayEvent::ChatMessagesListed {
                tag,
                session_id,
                reply,
            } => {
                if self.is_stale(&tag)
                    || !Self::settle_slot(&mut self.history.pending_messages, &tag)
                {
                    return;
                }
                match reply {
                    Reply::Accepted(messages) if self.history.selected == Some(session_id) => {
                        self.history.preview = messages;
                    }
                    Reply::Accepted(_) => {}
                    Reply::Rejected(error) => self.notify_error(error),
                }
            }

            GatewayEvent::Failed {
                tag,
                operation,
                error,
            } => {
                if self.is_stale(&tag) {
                    return;
                }
                let settled = match operation {
                    Operation::Auth
                    | Operation::SendMessage
                    | Operation::Generate
                    | Operation::CreateProject => self.settle_in_flight(&tag),
                    Operation::ListProjects => {
                        Self::settle_slot(&mut self.pending_projects, &tag)
                    }
                    Operation::ListChatSessions => {
                        Self::settle_slot(&mut self.history.pending_sessions, &tag)
                    }
                    Operation::ListChatMessages => {
                        Self::settle_slot(&mut self.history.pending_messages, &tag)
                    }
                };
                if settled {
                    warn!(?operation, "request failed: {}", error);
                    self.notify_error(error.user_message());
                }
            }

            GatewayEvent::Shutdown => {
                info!("gateway worker shut down");
            }
        }
    }
}
