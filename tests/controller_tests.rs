//! Controller scenarios
//!
//! Drives `AppState` through its public actions with plain channels standing
//! in for the gateway worker, then answers the dispatched commands by hand.

use chrono::Utc;
use crossbeam_channel::{unbounded, Receiver, Sender};
use disol::config::SpeechConfig;
use disol::gateway::pipeline::Operation;
use disol::gateway::{
    AuthGrant, ChatReply, ChatSessionSummary, ContentKind, CreatedProject, GatewayCommand,
    GatewayEvent, Generation, Project, Reply, RequestTag, User,
};
use disol::messages::{Message, Role};
use disol::session::{Session, SessionStore};
use disol::speech::{RecognitionBackend, RecognitionEvent, RecognitionSink, SpeechInput};
use disol::ui::{AppState, AuthState, BusyAction, NotificationLevel, Section};
use disol::DisolError;
use tempfile::TempDir;

struct Fixture {
    state: AppState,
    commands: Receiver<GatewayCommand>,
    events: Sender<GatewayEvent>,
    store: SessionStore,
    _dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self::with_store(SessionStore::new(dir.path()), dir)
    }

    fn with_store(store: SessionStore, dir: TempDir) -> Self {
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let state = AppState::new()
            .with_gateway(command_tx, event_rx)
            .with_store(store.clone());
        Self {
            state,
            commands: command_rx,
            events: event_tx,
            store,
            _dir: dir,
        }
    }

    fn with_voice(mut self, backend: impl RecognitionBackend + 'static) -> Self {
        self.state = self.state.with_speech(SpeechInput::new(
            SpeechConfig::default(),
            Some(Box::new(backend)),
        ));
        self
    }

    fn drain(&self) -> Vec<GatewayCommand> {
        self.commands.try_iter().collect()
    }

    fn single(&self) -> GatewayCommand {
        let mut commands = self.drain();
        assert_eq!(commands.len(), 1, "expected one command, got {:?}", commands);
        commands.remove(0)
    }

    /// Log in as user 1 and swallow the follow-up project load
    fn sign_in(&mut self) -> RequestTag {
        self.state.login("ann@example.com", "secret");
        let tag = self.single().tag().unwrap();
        self.state.apply_event(GatewayEvent::Authenticated {
            tag,
            reply: Reply::Accepted(grant()),
        });
        self.single().tag().unwrap()
    }

    fn send(&mut self, text: &str) -> GatewayCommand {
        self.state.input_text = text.to_string();
        self.state.send_message();
        self.single()
    }
}

fn grant() -> AuthGrant {
    AuthGrant {
        user: User {
            id: 1,
            email: "ann@example.com".to_string(),
            name: "Ann".to_string(),
        },
        token: "tok-123".to_string(),
    }
}

fn project(id: i64, title: &str, kind: ContentKind) -> Project {
    Project {
        id,
        title: title.to_string(),
        kind,
        content: String::new(),
        language: None,
        metadata: None,
        created_at: Utc::now(),
    }
}

fn answer(tag: RequestTag, message: &str, session_id: i64) -> GatewayEvent {
    GatewayEvent::MessageAnswered {
        tag,
        reply: Reply::Accepted(ChatReply {
            message: message.to_string(),
            session_id,
        }),
    }
}

fn contents(state: &AppState) -> Vec<(Role, String)> {
    state
        .transcript
        .get_all()
        .into_iter()
        .map(|message| (message.role, message.content))
        .collect()
}

#[test]
fn test_login_success_persists_and_loads_projects_once() {
    let mut fx = Fixture::new();
    fx.state.login("ann@example.com", "secret");

    let command = fx.single();
    assert!(matches!(
        &command,
        GatewayCommand::Login { email, password, .. } if email == "ann@example.com" && password == "secret"
    ));
    assert_eq!(fx.state.busy_action(), Some(BusyAction::Auth));

    fx.state.apply_event(GatewayEvent::Authenticated {
        tag: command.tag().unwrap(),
        reply: Reply::Accepted(grant()),
    });

    assert!(matches!(&fx.state.auth, AuthState::Authenticated(session) if session.id == 1));
    assert!(!fx.state.is_busy());
    assert_eq!(fx.state.section, Section::Chat);

    let commands = fx.drain();
    assert_eq!(commands.len(), 1);
    assert!(matches!(
        commands[0],
        GatewayCommand::ListProjects { user_id: 1, kind: None, .. }
    ));

    let stored = fx.store.load().unwrap().unwrap();
    assert_eq!(stored.name, "Ann");
    assert_eq!(fx.store.token().unwrap().as_deref(), Some("tok-123"));
}

#[test]
fn test_register_sends_name() {
    let mut fx = Fixture::new();
    fx.state.register(" bob@example.com ", "pw", "Bob");

    match fx.single() {
        GatewayCommand::Register {
            email,
            password,
            name,
            ..
        } => {
            assert_eq!(email, "bob@example.com");
            assert_eq!(password, "pw");
            assert_eq!(name, "Bob");
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_login_rejected_stays_unauthenticated() {
    let mut fx = Fixture::new();
    fx.state.login("ann@example.com", "wrong");
    let tag = fx.single().tag().unwrap();

    fx.state.apply_event(GatewayEvent::Authenticated {
        tag,
        reply: Reply::Rejected("Invalid credentials".to_string()),
    });

    assert_eq!(fx.state.auth, AuthState::Unauthenticated);
    assert!(!fx.state.is_busy());
    assert_eq!(fx.state.last_error(), Some("Invalid credentials"));
    assert!(fx.drain().is_empty());
    assert!(fx.store.load().unwrap().is_none());
}

#[test]
fn test_storage_failure_does_not_block_login() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let mut fx = Fixture::with_store(SessionStore::new(blocker.join("disol")), dir);

    fx.sign_in();

    assert!(fx.state.is_authenticated());
    assert_eq!(
        fx.state.last_error(),
        Some(DisolError::Storage(String::new()).user_message().as_str())
    );
}

#[test]
fn test_send_flow_adopts_session_id_once() {
    let mut fx = Fixture::new();
    fx.sign_in();

    let first = fx.send("hi");
    assert!(matches!(
        &first,
        GatewayCommand::SendMessage { user_id: 1, message, session_id: None, .. } if message == "hi"
    ));
    assert!(fx.state.input_text.is_empty());
    assert_eq!(contents(&fx.state), vec![(Role::User, "hi".to_string())]);

    fx.state.apply_event(answer(first.tag().unwrap(), "hello", 42));
    assert_eq!(
        contents(&fx.state),
        vec![
            (Role::User, "hi".to_string()),
            (Role::Assistant, "hello".to_string())
        ]
    );
    assert_eq!(fx.state.chat_session_id, Some(42));

    let second = fx.send("and then?");
    assert!(matches!(
        second,
        GatewayCommand::SendMessage { session_id: Some(42), .. }
    ));

    // a different id from the server never replaces the adopted one
    fx.state.apply_event(answer(second.tag().unwrap(), "later", 99));
    assert_eq!(fx.state.chat_session_id, Some(42));

    let third = fx.send("still there?");
    assert!(matches!(
        third,
        GatewayCommand::SendMessage { session_id: Some(42), .. }
    ));
}

#[test]
fn test_blank_input_is_not_sent() {
    let mut fx = Fixture::new();
    fx.sign_in();

    fx.state.input_text = "   ".to_string();
    fx.state.send_message();
    fx.state.generate(ContentKind::Code);

    assert!(fx.drain().is_empty());
    assert!(fx.state.transcript.is_empty());
}

#[test]
fn test_actions_while_busy_dispatch_nothing() {
    let mut fx = Fixture::new();
    fx.sign_in();
    fx.send("one");

    fx.state.input_text = "two".to_string();
    fx.state.send_message();
    fx.state.generate(ContentKind::Image);
    fx.state.project_form.title = "Landing".to_string();
    fx.state.create_project();

    assert!(fx.drain().is_empty());
    assert_eq!(fx.state.input_text, "two");
    assert_eq!(fx.state.transcript.len(), 1);
    assert_eq!(fx.state.busy_action(), Some(BusyAction::SendMessage));
}

#[test]
fn test_failed_send_keeps_user_message() {
    let mut fx = Fixture::new();
    fx.sign_in();
    let command = fx.send("hi");

    let error = DisolError::Transport("connection refused".to_string());
    fx.state.apply_event(GatewayEvent::Failed {
        tag: command.tag().unwrap(),
        operation: Operation::SendMessage,
        error: error.clone(),
    });

    assert_eq!(contents(&fx.state), vec![(Role::User, "hi".to_string())]);
    assert_eq!(fx.state.chat_session_id, None);
    assert!(!fx.state.is_busy());
    assert_eq!(fx.state.last_error(), Some(error.user_message().as_str()));
}

#[test]
fn test_rejected_send_surfaces_server_message() {
    let mut fx = Fixture::new();
    fx.sign_in();
    let command = fx.send("hi");

    fx.state.apply_event(GatewayEvent::MessageAnswered {
        tag: command.tag().unwrap(),
        reply: Reply::Rejected("AI service unavailable".to_string()),
    });

    assert_eq!(fx.state.transcript.len(), 1);
    assert_eq!(fx.state.last_error(), Some("AI service unavailable"));
}

#[test]
fn test_generate_rejected_leaves_projects_and_section() {
    let mut fx = Fixture::new();
    let list_tag = fx.sign_in();
    fx.state.apply_event(GatewayEvent::ProjectsListed {
        tag: list_tag,
        reply: Reply::Accepted(vec![project(1, "Old", ContentKind::Code)]),
    });

    fx.state.input_text = "a todo app".to_string();
    fx.state.generate(ContentKind::Code);
    let command = fx.single();
    assert!(matches!(
        &command,
        GatewayCommand::Generate { kind: ContentKind::Code, prompt, .. } if prompt == "a todo app"
    ));
    assert_eq!(
        fx.state.busy_action(),
        Some(BusyAction::Generate(ContentKind::Code))
    );

    fx.state.apply_event(GatewayEvent::Generated {
        tag: command.tag().unwrap(),
        reply: Reply::Rejected("quota exceeded".to_string()),
    });

    assert_eq!(fx.state.projects.len(), 1);
    assert_eq!(fx.state.projects[0].title, "Old");
    assert_eq!(fx.state.section, Section::Chat);
    assert_eq!(fx.state.input_text, "a todo app");
    assert_eq!(fx.state.last_error(), Some("quota exceeded"));
    assert!(fx.drain().is_empty());
    assert!(fx.state.transcript.is_empty());
}

#[test]
fn test_generate_success_shows_all_projects() {
    let mut fx = Fixture::new();
    fx.sign_in();
    fx.state.set_project_filter(Some(ContentKind::Image));
    fx.drain();

    fx.state.input_text = "a cat".to_string();
    fx.state.generate(ContentKind::Video);
    let tag = fx.single().tag().unwrap();

    fx.state.apply_event(GatewayEvent::Generated {
        tag,
        reply: Reply::Accepted(Generation {
            kind: Some(ContentKind::Video),
            message: Some("Video generation is in development".to_string()),
            code: None,
            language: None,
            url: None,
            project_id: None,
        }),
    });

    assert_eq!(fx.state.section, Section::Projects);
    assert!(fx.state.input_text.is_empty());
    let info = fx.state.notifications.back().unwrap();
    assert_eq!(info.level, NotificationLevel::Info);
    assert_eq!(info.text, "Video generation is in development");

    assert!(matches!(
        fx.single(),
        GatewayCommand::ListProjects { kind: None, .. }
    ));
    assert_eq!(fx.state.project_filter, None);
    assert!(fx.state.transcript.is_empty());
}

#[test]
fn test_logout_clears_everything() {
    let mut fx = Fixture::new();
    let list_tag = fx.sign_in();
    fx.state.apply_event(GatewayEvent::ProjectsListed {
        tag: list_tag,
        reply: Reply::Accepted(vec![project(1, "Site", ContentKind::Code)]),
    });
    let command = fx.send("hi");
    fx.state.apply_event(answer(command.tag().unwrap(), "hello", 42));
    fx.state.set_section(Section::Projects);
    let epoch = fx.state.epoch();

    fx.state.logout();

    assert_eq!(fx.state.auth, AuthState::Unauthenticated);
    assert!(fx.state.transcript.is_empty());
    assert!(fx.state.projects.is_empty());
    assert_eq!(fx.state.chat_session_id, None);
    assert_eq!(fx.state.section, Section::Chat);
    assert!(!fx.state.is_busy());
    assert_eq!(fx.state.epoch(), epoch + 1);
    assert!(fx.store.load().unwrap().is_none());
    assert!(fx.store.token().unwrap().is_none());
}

#[test]
fn test_responses_from_before_logout_are_ignored() {
    let mut fx = Fixture::new();
    let stale_list = fx.sign_in();
    let stale_send = fx.send("hi").tag().unwrap();

    fx.state.logout();
    fx.state.login("ann@example.com", "secret");
    let login_tag = fx.single().tag().unwrap();

    fx.state.apply_event(answer(stale_send, "hello", 42));
    fx.state.apply_event(GatewayEvent::ProjectsListed {
        tag: stale_list,
        reply: Reply::Accepted(vec![project(1, "Leaked", ContentKind::Code)]),
    });
    fx.state.apply_event(GatewayEvent::Failed {
        tag: stale_send,
        operation: Operation::SendMessage,
        error: DisolError::Transport("late".to_string()),
    });

    assert!(fx.state.transcript.is_empty());
    assert!(fx.state.projects.is_empty());
    assert_eq!(fx.state.chat_session_id, None);
    assert!(fx.state.last_error().is_none());
    // the new login is still the pending request
    assert_eq!(fx.state.busy_action(), Some(BusyAction::Auth));

    fx.state.apply_event(GatewayEvent::Authenticated {
        tag: login_tag,
        reply: Reply::Accepted(grant()),
    });
    assert!(fx.state.is_authenticated());
}

#[test]
fn test_only_latest_project_list_is_applied() {
    let mut fx = Fixture::new();
    let initial = fx.sign_in();

    fx.state.set_project_filter(Some(ContentKind::Code));
    let code = fx.single().tag().unwrap();
    fx.state.set_project_filter(Some(ContentKind::Image));
    let image = fx.single().tag().unwrap();
    assert!(fx.state.projects_loading());

    fx.state.apply_event(GatewayEvent::ProjectsListed {
        tag: image,
        reply: Reply::Accepted(vec![project(2, "Poster", ContentKind::Image)]),
    });
    fx.state.apply_event(GatewayEvent::ProjectsListed {
        tag: code,
        reply: Reply::Accepted(vec![project(1, "Script", ContentKind::Code)]),
    });
    fx.state.apply_event(GatewayEvent::ProjectsListed {
        tag: initial,
        reply: Reply::Accepted(vec![]),
    });

    assert_eq!(fx.state.projects.len(), 1);
    assert_eq!(fx.state.projects[0].title, "Poster");
    assert!(!fx.state.projects_loading());
}

#[test]
fn test_same_filter_does_not_reload() {
    let mut fx = Fixture::new();
    fx.sign_in();
    fx.state.set_project_filter(None);
    assert!(fx.drain().is_empty());
}

#[test]
fn test_restore_adopts_stored_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store
        .save(
            &Session {
                id: 7,
                email: "kim@example.com".to_string(),
                name: "Kim".to_string(),
            },
            "tok",
        )
        .unwrap();

    let mut fx = Fixture::with_store(store, dir);
    fx.state.restore();

    assert!(matches!(&fx.state.auth, AuthState::Authenticated(session) if session.id == 7));
    assert!(matches!(
        fx.single(),
        GatewayCommand::ListProjects { user_id: 7, .. }
    ));
}

#[test]
fn test_restore_without_record_stays_signed_out() {
    let mut fx = Fixture::new();
    std::fs::write(fx.store.dir().join("session.json"), b"{broken").unwrap();

    fx.state.restore();

    assert_eq!(fx.state.auth, AuthState::Unauthenticated);
    assert!(fx.drain().is_empty());
}

#[test]
fn test_create_project_flow() {
    let mut fx = Fixture::new();
    fx.sign_in();

    fx.state.open_project_form();
    fx.state.create_project();
    assert!(fx.drain().is_empty());
    assert_eq!(fx.state.last_error(), Some("Project title is required"));

    fx.state.project_form.title = "  Landing  ".to_string();
    fx.state.project_form.content = "<h1>Hi</h1>".to_string();
    fx.state.project_form.language = "   ".to_string();
    fx.state.create_project();

    let command = fx.single();
    match &command {
        GatewayCommand::CreateProject {
            user_id,
            title,
            kind,
            content,
            language,
            ..
        } => {
            assert_eq!(*user_id, 1);
            assert_eq!(title, "Landing");
            assert_eq!(*kind, ContentKind::Code);
            assert_eq!(content, "<h1>Hi</h1>");
            assert_eq!(*language, None);
        }
        other => panic!("unexpected command {:?}", other),
    }
    assert_eq!(fx.state.busy_action(), Some(BusyAction::CreateProject));

    fx.state.apply_event(GatewayEvent::ProjectCreated {
        tag: command.tag().unwrap(),
        reply: Reply::Accepted(CreatedProject {
            project_id: Some(5),
            project: None,
        }),
    });

    assert!(!fx.state.project_form.open);
    assert!(!fx.state.is_busy());
    assert_eq!(
        fx.state.notifications.back().map(|n| n.text.as_str()),
        Some("Project #5 created")
    );
    assert!(matches!(fx.single(), GatewayCommand::ListProjects { .. }));
}

#[test]
fn test_history_preview_leaves_active_chat_alone() {
    let mut fx = Fixture::new();
    fx.sign_in();
    let command = fx.send("current");
    fx.state.apply_event(answer(command.tag().unwrap(), "reply", 42));

    fx.state.refresh_history();
    let sessions_tag = fx.single().tag().unwrap();
    assert!(fx.state.history.is_loading());
    fx.state.apply_event(GatewayEvent::ChatSessionsListed {
        tag: sessions_tag,
        reply: Reply::Accepted(vec![ChatSessionSummary {
            id: 3,
            title: "Older chat".to_string(),
            created_at: Utc::now(),
        }]),
    });
    assert_eq!(fx.state.history.sessions.len(), 1);

    fx.state.open_history_session(3);
    let command = fx.single();
    assert!(matches!(
        command,
        GatewayCommand::ListChatMessages { user_id: 1, session_id: 3, .. }
    ));
    fx.state.apply_event(GatewayEvent::ChatMessagesListed {
        tag: command.tag().unwrap(),
        session_id: 3,
        reply: Reply::Accepted(vec![
            Message::user("old question"),
            Message::assistant("old answer"),
        ]),
    });

    assert_eq!(fx.state.history.preview.len(), 2);
    assert!(!fx.state.history.is_loading());
    assert_eq!(fx.state.chat_session_id, Some(42));
    assert_eq!(fx.state.transcript.len(), 2);
    assert_eq!(
        fx.state.transcript.last().map(|m| m.content),
        Some("reply".to_string())
    );
}

#[test]
fn test_events_are_applied_through_poll() {
    let mut fx = Fixture::new();
    fx.state.login("ann@example.com", "secret");
    let tag = fx.single().tag().unwrap();

    fx.events
        .send(GatewayEvent::Authenticated {
            tag,
            reply: Reply::Accepted(grant()),
        })
        .unwrap();
    assert!(!fx.state.is_authenticated());

    fx.state.poll_events();
    assert!(fx.state.is_authenticated());
}

#[test]
fn test_notifications_keep_most_recent() {
    let mut fx = Fixture::new();
    for i in 0..25 {
        fx.state.notify(NotificationLevel::Error, format!("error {i}"));
    }
    assert_eq!(fx.state.notifications.len(), disol::ui::MAX_NOTIFICATIONS);
    assert_eq!(fx.state.notifications[0].text, "error 5");
}

/// Recognizes a fixed phrase as soon as capture begins
struct InstantBackend {
    outcome: RecognitionEvent,
}

impl RecognitionBackend for InstantBackend {
    fn begin(&mut self, _config: &SpeechConfig, sink: RecognitionSink) -> disol::Result<()> {
        sink.deliver(self.outcome.clone());
        sink.deliver(RecognitionEvent::End);
        Ok(())
    }

    fn abort(&mut self) {}
}

#[test]
fn test_voice_result_replaces_input() {
    let backend = InstantBackend {
        outcome: RecognitionEvent::Result("сделай сайт".to_string()),
    };
    let mut state = AppState::new().with_speech(SpeechInput::new(
        SpeechConfig::default(),
        Some(Box::new(backend)),
    ));
    state.input_text = "typed".to_string();

    state.toggle_voice_input();
    assert!(!state.is_listening());
    state.poll_events();

    assert_eq!(state.input_text, "сделай сайт");
    assert!(state.notifications.is_empty());
}

#[test]
fn test_voice_error_notifies_and_keeps_input() {
    let backend = InstantBackend {
        outcome: RecognitionEvent::Error("not-allowed".to_string()),
    };
    let mut state = AppState::new().with_speech(SpeechInput::new(
        SpeechConfig::default(),
        Some(Box::new(backend)),
    ));
    state.input_text = "typed".to_string();

    state.toggle_voice_input();
    state.poll_events();

    assert_eq!(state.input_text, "typed");
    assert_eq!(state.last_error(), Some("Voice input: not-allowed"));
}

#[test]
fn test_voice_result_after_logout_is_discarded() {
    let mut fx = Fixture::new().with_voice(InstantBackend {
        outcome: RecognitionEvent::Result("secret dictation".to_string()),
    });
    fx.sign_in();

    // the result is already queued when the user signs out
    fx.state.toggle_voice_input();
    fx.state.logout();
    fx.state.poll_events();

    assert_eq!(fx.state.auth, AuthState::Unauthenticated);
    assert!(fx.state.input_text.is_empty());

    fx.sign_in();
    fx.state.poll_events();
    assert!(fx.state.input_text.is_empty());
    assert!(fx.state.notifications.is_empty());
}

#[test]
fn test_voice_works_again_after_relogin() {
    let mut fx = Fixture::new().with_voice(InstantBackend {
        outcome: RecognitionEvent::Result("новый проект".to_string()),
    });
    fx.sign_in();
    fx.state.logout();
    fx.sign_in();

    fx.state.toggle_voice_input();
    fx.state.poll_events();
    assert_eq!(fx.state.input_text, "новый проект");
}
