//! Gateway client and worker against a mock HTTP server

use disol::config::GatewayConfig;
use disol::gateway::pipeline::Operation;
use disol::gateway::{
    ContentKind, GatewayClient, GatewayCommand, GatewayEvent, GatewayPipeline, Reply, RequestTag,
};
use disol::messages::Role;
use disol::DisolError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GatewayClient {
    GatewayClient::new(GatewayConfig::with_base_url(&server.uri()))
}

#[tokio::test]
async fn test_login_body_and_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_json(json!({
            "action": "login",
            "email": "ann@example.com",
            "password": "secret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user": {"id": 1, "email": "ann@example.com", "name": "Ann"},
            "token": "abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .login("ann@example.com", "secret")
        .await
        .unwrap();
    let grant = reply.accepted().unwrap();
    assert_eq!(grant.user.id, 1);
    assert_eq!(grant.user.name, "Ann");
    assert_eq!(grant.token, "abc");
}

#[tokio::test]
async fn test_register_includes_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_json(json!({
            "action": "register",
            "email": "bob@example.com",
            "password": "pw",
            "name": "Bob"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user": {"id": 2, "email": "bob@example.com", "name": "Bob"},
            "token": "t"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .register("bob@example.com", "pw", "Bob")
        .await
        .unwrap();
    assert!(reply.is_accepted());
}

#[tokio::test]
async fn test_bad_request_body_is_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .login("ann@example.com", "nope")
        .await
        .unwrap();
    assert_eq!(reply, Reply::Rejected("Invalid credentials".to_string()));
}

#[tokio::test]
async fn test_first_message_omits_session_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"user_id": 1, "message": "hi"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "hello",
            "session_id": 42
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .send_message(1, "hi", None)
        .await
        .unwrap()
        .accepted()
        .unwrap();
    assert_eq!(reply.message, "hello");
    assert_eq!(reply.session_id, 42);
}

#[tokio::test]
async fn test_follow_up_message_carries_session_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"user_id": 1, "message": "more", "session_id": 42})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "sure",
            "session_id": 42
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .send_message(1, "more", Some(42))
        .await
        .unwrap();
    assert!(reply.is_accepted());
}

#[tokio::test]
async fn test_chat_history_queries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat"))
        .and(query_param("user_id", "1"))
        .and(query_param("session_id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"id": 10, "role": "user", "content": "q", "created_at": "2024-05-01T10:00:00.123456"},
                {"id": 11, "role": "assistant", "content": "a", "created_at": "2024-05-01T10:00:02"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chat"))
        .and(query_param("user_id", "1"))
        .and(query_param_is_missing("session_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessions": [
                {"id": 3, "title": "Landing page", "created_at": "2024-05-01T10:00:00"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let sessions = client.list_chat_sessions(1).await.unwrap().accepted().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].title, "Landing page");

    let messages = client
        .list_chat_messages(1, 3)
        .await
        .unwrap()
        .accepted()
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].id, Some(11));
    assert!(messages[1].created_at.is_some());
}

#[tokio::test]
async fn test_generate_body_uses_type_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_json(json!({"user_id": 1, "type": "code", "prompt": "a button"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "type": "code",
            "code": "<button>Hi</button>",
            "language": "html",
            "project_id": 9
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generation = client_for(&server)
        .generate_content(1, ContentKind::Code, "a button")
        .await
        .unwrap()
        .accepted()
        .unwrap();
    assert_eq!(generation.project_id, Some(9));
    assert_eq!(generation.language.as_deref(), Some("html"));
    assert_eq!(generation.summary(), "Created code project #9");
}

#[tokio::test]
async fn test_generate_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": "quota exceeded"})),
        )
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .generate_content(1, ContentKind::Image, "a cat")
        .await
        .unwrap();
    assert_eq!(reply, Reply::Rejected("quota exceeded".to_string()));
}

#[tokio::test]
async fn test_project_filter_only_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(query_param("user_id", "1"))
        .and(query_param("type", "image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [{
                "id": 2,
                "title": "Poster",
                "type": "image",
                "content": "https://cdn.example.com/poster.png",
                "language": null,
                "metadata": null,
                "created_at": "2024-06-01T08:00:00"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(query_param("user_id", "1"))
        .and(query_param_is_missing("type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"projects": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let filtered = client
        .list_projects(1, Some(ContentKind::Image))
        .await
        .unwrap()
        .accepted()
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].kind, ContentKind::Image);

    let all = client.list_projects(1, None).await.unwrap().accepted().unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_create_project_omits_missing_language() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects"))
        .and(body_json(json!({
            "user_id": 1,
            "title": "Notes",
            "type": "code",
            "content": "print(1)"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "project_id": 12})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = client_for(&server)
        .create_project(1, "Notes", ContentKind::Code, "print(1)", None)
        .await
        .unwrap()
        .accepted()
        .unwrap();
    assert_eq!(created.id(), Some(12));
}

#[tokio::test]
async fn test_non_json_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).send_message(1, "hi", None).await;
    assert!(matches!(result, Err(DisolError::Parse(ref e)) if e.contains("502")));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let client = GatewayClient::new(GatewayConfig::with_base_url("http://127.0.0.1:1"));
    let result = client.login("ann@example.com", "secret").await;
    assert!(matches!(result, Err(DisolError::Transport(_))));
}

#[tokio::test]
async fn test_worker_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"projects": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let pipeline = GatewayPipeline::new(GatewayConfig::with_base_url(&server.uri()));
    let tx = pipeline.command_sender();
    let rx = pipeline.event_receiver();
    let handle = pipeline.start_worker().unwrap();

    let list_tag = RequestTag::new(0);
    let send_tag = RequestTag::new(0);
    tx.send(GatewayCommand::ListProjects {
        tag: list_tag,
        user_id: 1,
        kind: None,
    })
    .unwrap();
    tx.send(GatewayCommand::SendMessage {
        tag: send_tag,
        user_id: 1,
        message: "hi".to_string(),
        session_id: None,
    })
    .unwrap();

    let events = tokio::task::spawn_blocking(move || {
        let first = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        tx.send(GatewayCommand::Shutdown).unwrap();
        let third = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        vec![first, second, third]
    })
    .await
    .unwrap();

    let listed = events.iter().any(|event| {
        matches!(event, GatewayEvent::ProjectsListed { tag, reply: Reply::Accepted(projects) }
            if *tag == list_tag && projects.is_empty())
    });
    let failed = events.iter().any(|event| {
        matches!(event, GatewayEvent::Failed { tag, operation: Operation::SendMessage, error: DisolError::Parse(_) }
            if *tag == send_tag)
    });
    assert!(listed, "missing project list event: {:?}", events);
    assert!(failed, "missing failure event: {:?}", events);
    assert!(matches!(events[2], GatewayEvent::Shutdown));

    tokio::task::spawn_blocking(move || handle.join().unwrap())
        .await
        .unwrap();
}
