//! End-to-end tests of the client against a mock console server

use futures::StreamExt;
use mockito::{Matcher, Server, ServerGuard};
use parking_lot::Mutex;
use rag_client::api::account::hash_password;
use rag_client::{
    AgentLogParams, AgentMessageParams, ApiClient, ClientConfig, ConversationMessageParams,
    ConversationUpdate, DocumentListParams, Error, KnowledgeListParams, LoginParams, MemoryStore,
    Message, Navigation, NoticeLevel, Notifier, ParseStatus, QuestionParams, RequestOptions, Role,
    SharedStore, StreamEvent, ThumbUpParams, TokenPair,
};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
    navigations: Mutex<Vec<Navigation>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().push((level, message.to_string()));
    }

    fn navigate(&self, target: Navigation) {
        self.navigations.lock().push(target);
    }
}

struct Harness {
    client: ApiClient,
    store: MemoryStore,
    notifier: Arc<RecordingNotifier>,
}

fn harness(server: &ServerGuard) -> Harness {
    let store = MemoryStore::new();
    store
        .save_token_pair(&TokenPair {
            access_token: "old".to_string(),
            refresh_token: "r1".to_string(),
        })
        .unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let config = ClientConfig {
        base_url: server.url(),
        request_timeout: Duration::from_secs(5),
        refresh_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
    };
    let client = ApiClient::new(config, Arc::new(store.clone()), notifier.clone()).unwrap();
    Harness {
        client,
        store,
        notifier,
    }
}

fn success(data: serde_json::Value) -> String {
    json!({"result": "success", "data": data}).to_string()
}

#[tokio::test]
async fn test_unwraps_envelope_and_sends_bearer() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rag/dialog/d1")
        .match_header("authorization", "Bearer old")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(json!({
            "id": "d1",
            "name": "Support",
            "prompt_config": {"prologue": "Hi! How can I help?"}
        })))
        .create_async()
        .await;

    let h = harness(&server);
    let dialog = h.client.get_dialog("d1").await.unwrap();

    assert_eq!(dialog.name, "Support");
    assert_eq!(dialog.prologue(), Some("Hi! How can I help?"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_sends_query_parameters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rag/conversation")
        .match_query(Matcher::UrlEncoded("dialog_id".into(), "d1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(json!([
            {"id": "c1", "dialog_id": "d1", "name": "First"},
            {"id": "c2", "dialog_id": "d1", "name": "Second"}
        ])))
        .create_async()
        .await;

    let h = harness(&server);
    let conversations = h.client.list_conversations("d1").await.unwrap();

    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[1].id, "c2");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_expired_token_refreshes_and_replays() {
    let mut server = Server::new_async().await;
    let expired = server
        .mock("GET", "/console/account/current-account")
        .match_header("authorization", "Bearer old")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "unauthorized", "message": "expired"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/console/account/refresh-token")
        .match_body(Matcher::Json(json!({"refresh_token": "r1"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": "new", "refresh_token": "r2"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let replay = server
        .mock("GET", "/console/account/current-account")
        .match_header("authorization", "Bearer new")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(json!({
            "account": {"id": "u1", "email": "a@example.com", "username": "alice"}
        })))
        .expect(1)
        .create_async()
        .await;

    let h = harness(&server);
    let info = h.client.current_account().await.unwrap();

    assert_eq!(info.account.username, "alice");
    assert_eq!(h.store.access_token().as_deref(), Some("new"));
    assert!(h.notifier.navigations.lock().is_empty());
    assert!(h.notifier.notices.lock().is_empty());
    expired.assert_async().await;
    refresh.assert_async().await;
    replay.assert_async().await;
}

#[tokio::test]
async fn test_second_unauthorized_sends_to_sign_in() {
    let mut server = Server::new_async().await;
    let denied = server
        .mock("GET", "/rag/dialog")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "unauthorized", "message": "expired"}).to_string())
        .expect(2)
        .create_async()
        .await;
    let _refresh = server
        .mock("POST", "/console/account/refresh-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": "new", "refresh_token": "r2"}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    let err = h.client.list_dialogs().await.unwrap_err();

    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(*h.notifier.navigations.lock(), vec![Navigation::SignIn]);
    denied.assert_async().await;
}

#[tokio::test]
async fn test_failed_refresh_sends_to_sign_in() {
    let mut server = Server::new_async().await;
    let _denied = server
        .mock("GET", "/rag/dialog")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "unauthorized", "message": "expired"}).to_string())
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/console/account/refresh-token")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "unknown", "message": "boom"}).to_string())
        .expect(3)
        .create_async()
        .await;

    let h = harness(&server);
    let err = h.client.list_dialogs().await.unwrap_err();

    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(*h.notifier.navigations.lock(), vec![Navigation::SignIn]);
    assert_eq!(h.store.access_token().as_deref(), Some("old"));
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_force_logout_clears_tokens() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/rag/dialog")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"error_code": "unauthorized_and_force_logout", "message": "bye"}).to_string(),
        )
        .create_async()
        .await;

    let h = harness(&server);
    let err = h.client.list_dialogs().await.unwrap_err();

    assert!(matches!(err, Error::ForcedLogout));
    assert!(h.store.access_token().is_none());
    assert!(h.store.get(rag_client::storage::REFRESH_TOKEN_KEY).is_none());
    assert_eq!(*h.notifier.navigations.lock(), vec![Navigation::Reload]);
}

#[tokio::test]
async fn test_agent_not_found_notifies_and_redirects() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/rag/dialog/missing")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "agent_not_found", "message": "no such agent"}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    let err = h.client.get_dialog("missing").await.unwrap_err();

    assert_eq!(err.error_code(), Some(rag_client::ErrorCode::AgentNotFound));
    assert_eq!(*h.notifier.navigations.lock(), vec![Navigation::Agents]);
    let notices = h.notifier.notices.lock();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, NoticeLevel::Error);
}

#[tokio::test]
async fn test_silent_request_suppresses_notices() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/rag/dialog/missing")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "agent_not_found", "message": "no such agent"}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    let result = h
        .client
        .request_value(
            Method::GET,
            "/rag/dialog/missing",
            json!({}),
            &RequestOptions::silent(),
        )
        .await;

    assert!(result.is_err());
    assert!(h.notifier.notices.lock().is_empty());
    assert!(h.notifier.navigations.lock().is_empty());
}

#[tokio::test]
async fn test_unknown_error_code_shows_server_message() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/rag/conversation")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "brand_new_code", "message": "Something broke"}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    let err = h
        .client
        .delete_conversations(&["c1".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Api { status: 500, .. }));
    let notices = h.notifier.notices.lock();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].1, "Something broke");
}

#[tokio::test]
async fn test_rejected_envelope_is_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/rag/conversation/question")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"result": "fail", "message": "not allowed"}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    let err = h
        .client
        .ask_question(&rag_client::QuestionParams {
            question: "why?".to_string(),
            kb_ids: vec![],
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rejected { .. }));
    assert_eq!(h.notifier.notices.lock()[0].1, "not allowed");
}

#[tokio::test]
async fn test_sign_in_hashes_password_and_stores_tokens() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/console/account/login")
        .match_body(Matcher::Json(json!({
            "email": "a@example.com",
            "password": hash_password("secret"),
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(json!({"access_token": "a2", "refresh_token": "r9"})))
        .create_async()
        .await;

    let h = harness(&server);
    let tokens = h
        .client
        .sign_in(&LoginParams::new("a@example.com", "secret"))
        .await
        .unwrap();

    assert_eq!(tokens.access_token, "a2");
    assert_eq!(h.store.access_token().as_deref(), Some("a2"));
    assert_eq!(
        h.store.get(rag_client::storage::REFRESH_TOKEN_KEY).as_deref(),
        Some("r9")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_logout_clears_tokens_even_on_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/console/account/logout")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({"message": "down"}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    assert!(h.client.logout().await.is_err());
    assert!(h.store.access_token().is_none());
}

#[tokio::test]
async fn test_text_to_speech_returns_bytes() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/rag/conversation/tts")
        .match_body(Matcher::Json(json!({"text": "hello"})))
        .with_status(200)
        .with_header("content-type", "audio/mpeg")
        .with_body(vec![1u8, 2, 3, 4])
        .create_async()
        .await;

    let h = harness(&server);
    let audio = h.client.text_to_speech("hello").await.unwrap();
    assert_eq!(audio, vec![1, 2, 3, 4]);
}

const COMPLETION_PATH: &str = "/rag/conversation/completion";

fn sse_body(frames: &[serde_json::Value]) -> String {
    frames
        .iter()
        .map(|f| format!("data:{}\n\n", f))
        .collect::<String>()
}

#[tokio::test]
async fn test_sse_streams_answers_then_completes() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", COMPLETION_PATH)
        .match_header("authorization", "Bearer old")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(&[
            json!({"code": 0, "message": "", "data": {"answer": "Hel", "id": "m1", "session_id": "c1"}}),
            json!({"code": 0, "message": "", "data": {"answer": "Hello", "id": "m1", "session_id": "c1"}}),
            json!({"code": 0, "message": "", "data": true}),
        ]))
        .create_async()
        .await;

    let h = harness(&server);
    let stream = h
        .client
        .sse_request(
            COMPLETION_PATH,
            json!({"conversation_id": "c1", "messages": []}),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    let events: Vec<StreamEvent> = stream.collect().await;

    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], StreamEvent::Data { answer, .. } if answer == "Hel"));
    match &events[1] {
        StreamEvent::Data { answer, extra } => {
            assert_eq!(answer, "Hello");
            assert_eq!(extra.id, "m1");
            assert_eq!(extra.session_id, "c1");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(events[2], StreamEvent::Completed);
}

#[tokio::test]
async fn test_sse_error_frame_is_reported() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", COMPLETION_PATH)
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(&[
            json!({"code": 500, "message": "model offline", "data": {"answer": "**ERROR**: model offline"}}),
            json!({"code": 0, "data": true}),
        ]))
        .create_async()
        .await;

    let h = harness(&server);
    let events: Vec<StreamEvent> = h
        .client
        .sse_request(COMPLETION_PATH, json!({}), CancellationToken::new())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Error {
                message: "model offline".to_string(),
                code: Some("500".to_string()),
            },
            StreamEvent::Completed,
        ]
    );
}

#[tokio::test]
async fn test_sse_error_status_yields_single_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", COMPLETION_PATH)
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "conversation_not_found", "message": "Conversation not found"}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    let events: Vec<StreamEvent> = h
        .client
        .sse_request(COMPLETION_PATH, json!({}), CancellationToken::new())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(
        events,
        vec![StreamEvent::Error {
            message: "Conversation not found".to_string(),
            code: Some("404".to_string()),
        }]
    );
}

#[tokio::test]
async fn test_sse_unauthorized_refreshes_and_retries() {
    let mut server = Server::new_async().await;
    let denied = server
        .mock("POST", COMPLETION_PATH)
        .match_header("authorization", "Bearer old")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "unauthorized"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let _refresh = server
        .mock("POST", "/console/account/refresh-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": "new", "refresh_token": "r2"}).to_string())
        .create_async()
        .await;
    let accepted = server
        .mock("POST", COMPLETION_PATH)
        .match_header("authorization", "Bearer new")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(&[
            json!({"code": 0, "data": {"answer": "ok"}}),
            json!({"code": 0, "data": true}),
        ]))
        .expect(1)
        .create_async()
        .await;

    let h = harness(&server);
    let events: Vec<StreamEvent> = h
        .client
        .sse_request(COMPLETION_PATH, json!({}), CancellationToken::new())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[1], StreamEvent::Completed);
    assert!(h.notifier.navigations.lock().is_empty());
    denied.assert_async().await;
    accepted.assert_async().await;
}

#[tokio::test]
async fn test_sse_cancelled_before_open_is_empty() {
    let server = Server::new_async().await;
    let h = harness(&server);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let events: Vec<StreamEvent> = h
        .client
        .sse_request(COMPLETION_PATH, json!({}), cancel)
        .await
        .unwrap()
        .collect()
        .await;

    assert!(events.is_empty());
}

#[tokio::test]
async fn test_sse_failed_refresh_sends_to_sign_in() {
    let mut server = Server::new_async().await;
    let denied = server
        .mock("POST", COMPLETION_PATH)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "unauthorized"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/console/account/refresh-token")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "unknown", "message": "boom"}).to_string())
        .expect(3)
        .create_async()
        .await;

    let h = harness(&server);
    let result = h
        .client
        .sse_request(COMPLETION_PATH, json!({}), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::Unauthorized)));
    assert_eq!(*h.notifier.navigations.lock(), vec![Navigation::SignIn]);
    assert_eq!(h.store.access_token().as_deref(), Some("old"));
    denied.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_sse_unauthorized_after_retry_sends_to_sign_in() {
    let mut server = Server::new_async().await;
    let denied = server
        .mock("POST", COMPLETION_PATH)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({"error_code": "unauthorized"}).to_string())
        .expect(2)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/console/account/refresh-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": "new", "refresh_token": "r2"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let h = harness(&server);
    let result = h
        .client
        .sse_request(COMPLETION_PATH, json!({}), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(Error::Unauthorized)));
    assert_eq!(*h.notifier.navigations.lock(), vec![Navigation::SignIn]);
    denied.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_sse_cancelled_mid_stream_ends_quietly() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", COMPLETION_PATH)
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(&[
            json!({"code": 0, "data": {"answer": "Hel"}}),
            json!({"code": 0, "data": {"answer": "Hello"}}),
            json!({"code": 0, "data": true}),
        ]))
        .create_async()
        .await;

    let h = harness(&server);
    let cancel = CancellationToken::new();
    let mut stream = h
        .client
        .sse_request(COMPLETION_PATH, json!({}), cancel.clone())
        .await
        .unwrap();

    let first = stream.next().await;
    assert!(matches!(first, Some(StreamEvent::Data { ref answer, .. }) if answer == "Hel"));

    cancel.cancel();
    let rest: Vec<StreamEvent> = stream.collect().await;

    assert!(rest.is_empty(), "unexpected events after cancel: {:?}", rest);
    assert!(h.notifier.notices.lock().is_empty());
    assert!(h.notifier.navigations.lock().is_empty());
}

#[tokio::test]
async fn test_update_conversation_puts_partial_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/rag/conversation/c1")
        .match_body(Matcher::Json(json!({"name": "Renamed"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(json!({"id": "c1", "dialog_id": "d1", "name": "Renamed"})))
        .create_async()
        .await;

    let h = harness(&server);
    let update = ConversationUpdate {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    let conversation = h.client.update_conversation("c1", &update).await.unwrap();

    assert_eq!(conversation.name, "Renamed");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_send_conversation_message_adds_conversation_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rag/conversation/c1")
        .match_body(Matcher::Json(json!({
            "conversation_id": "c1",
            "messages": [{"role": "user", "content": "hi"}],
            "stream": false
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(json!({"answer": "hello"})))
        .create_async()
        .await;

    let h = harness(&server);
    let params = ConversationMessageParams {
        messages: vec![Message::new(Role::User, "hi")],
        stream: Some(false),
    };
    let answer = h
        .client
        .send_conversation_message("c1", &params)
        .await
        .unwrap();

    assert_eq!(answer, json!({"answer": "hello"}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_question_endpoints_use_put_for_mind_map_and_post_for_terms() {
    let mut server = Server::new_async().await;
    let body = json!({"question": "what is rag", "kb_ids": ["kb1"]});
    let mind_map = server
        .mock("PUT", "/rag/conversation/question")
        .match_body(Matcher::Json(body.clone()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(json!({"id": "root", "children": []})))
        .create_async()
        .await;
    let terms = server
        .mock("POST", "/rag/conversation/question")
        .match_body(Matcher::Json(body))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(json!(["retrieval", "generation"])))
        .create_async()
        .await;

    let h = harness(&server);
    let params = QuestionParams {
        question: "what is rag".to_string(),
        kb_ids: vec!["kb1".to_string()],
    };
    let map = h.client.generate_mind_map(&params).await.unwrap();
    let related = h.client.generate_related_terms(&params).await.unwrap();

    assert_eq!(map["id"], "root");
    assert_eq!(related, vec!["retrieval", "generation"]);
    mind_map.assert_async().await;
    terms.assert_async().await;
}

#[tokio::test]
async fn test_message_feedback_and_delete_target_message_path() {
    let mut server = Server::new_async().await;
    let conversation = json!({"id": "c1", "dialog_id": "d1", "messages": []});
    let thumb = server
        .mock("POST", "/rag/conversation/c1/m2")
        .match_body(Matcher::Json(json!({"set": false, "feedback": "wrong source"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(conversation.clone()))
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/rag/conversation/c1/m2")
        .match_body(Matcher::Json(json!({})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(conversation))
        .create_async()
        .await;

    let h = harness(&server);
    let params = ThumbUpParams {
        set: false,
        feedback: Some("wrong source".to_string()),
    };
    let rated = h.client.thumb_up_message("c1", "m2", &params).await.unwrap();
    let trimmed = h.client.delete_message("c1", "m2").await.unwrap();

    assert_eq!(rated.id, "c1");
    assert!(trimmed.messages.is_empty());
    thumb.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_list_knowledge_bases_sends_filters_and_keeps_count() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rag/kb")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("keywords".into(), "faq".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("page_size".into(), "20".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "result": "success",
                "data": [{"id": "kb1", "name": "FAQ", "doc_num": 3, "chunk_num": 120}],
                "count": 41
            })
            .to_string(),
        )
        .create_async()
        .await;

    let h = harness(&server);
    let params = KnowledgeListParams {
        keywords: Some("faq".to_string()),
        page: Some(1),
        page_size: Some(20),
        ..Default::default()
    };
    let page = h.client.list_knowledge_bases(&params).await.unwrap();

    assert_eq!(page.count, 41);
    assert_eq!(page.data[0].name, "FAQ");
    assert_eq!(page.data[0].doc_num, 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_knowledge_base_accepts_bare_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rag/kb/kb1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": "kb1", "name": "FAQ", "parser_id": "naive"}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    let kb = h.client.get_knowledge_base("kb1").await.unwrap();

    assert_eq!(kb.parser_id, "naive");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_documents_without_result_key() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rag/document")
        .match_query(Matcher::UrlEncoded("kb_id".into(), "kb1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "count": 2,
                "data": [
                    {"id": "doc1", "name": "guide.pdf", "kb_id": "kb1", "run": "3", "progress": 1.0},
                    {"id": "doc2", "name": "faq.md", "kb_id": "kb1", "run": "4", "progress": -1.0,
                     "progress_msg": "parser crashed"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let h = harness(&server);
    let params = DocumentListParams {
        kb_id: "kb1".to_string(),
        ..Default::default()
    };
    let page = h.client.list_documents(&params).await.unwrap();

    assert_eq!(page.count, 2);
    assert!(page.result.is_empty());
    assert_eq!(page.data[0].parse_status(), Some(ParseStatus::Done));
    assert_eq!(page.data[1].parse_status(), Some(ParseStatus::Failed));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_run_documents_sends_run_code() {
    let mut server = Server::new_async().await;
    let start = server
        .mock("POST", "/rag/document/run")
        .match_body(Matcher::Json(json!({"doc_ids": ["doc1", "doc2"], "run": "1", "stop": false})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"result": "success", "count": 2}).to_string())
        .create_async()
        .await;
    let stop = server
        .mock("POST", "/rag/document/run")
        .match_body(Matcher::Json(json!({"doc_ids": ["doc1"], "run": "2", "stop": true})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"result": "success", "count": 1}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    let started = h
        .client
        .run_documents(&["doc1".to_string(), "doc2".to_string()], false)
        .await
        .unwrap();
    let stopped = h
        .client
        .run_documents(&["doc1".to_string()], true)
        .await
        .unwrap();

    assert_eq!(started.count, 2);
    assert_eq!(stopped.count, 1);
    start.assert_async().await;
    stop.assert_async().await;
}

#[tokio::test]
async fn test_delete_documents_sends_ids_in_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/rag/document")
        .match_body(Matcher::Json(json!({"doc_ids": ["doc1"]})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"result": "success", "count": 1}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    let deleted = h
        .client
        .delete_documents(&["doc1".to_string()])
        .await
        .unwrap();

    assert_eq!(deleted.count, 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_system_status_reports_each_service() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rag/sys/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "doc_engine": {"type": "elasticsearch", "status": "green", "elapsed": "2.1"},
                "storage": {"storage": "minio", "status": "green", "elapsed": "4.0"},
                "database": {"database": "mysql", "status": "red", "elapsed": "0.3", "error": "refused"},
                "redis": {"status": "green", "elapsed": "0.2"},
                "task_executor_heartbeats": {}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let h = harness(&server);
    let status = h.client.system_status().await.unwrap();

    assert!(status.doc_engine.is_healthy());
    assert!(!status.database.is_healthy());
    assert_eq!(status.database.error.as_deref(), Some("refused"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_agent_endpoints() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/rag/agent")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"id": "a1", "name": "Helpdesk", "status": "active"}]).to_string())
        .create_async()
        .await;
    let send = server
        .mock("POST", "/rag/agent/a1/send-message")
        .match_body(Matcher::Json(json!({"message": "hello", "stream": false})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success(json!({"result": "hi"})))
        .create_async()
        .await;
    let logs = server
        .mock("GET", "/rag/agent/a1/logs")
        .match_query(Matcher::UrlEncoded("page_size".into(), "5".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"count": 1, "data": [{"id": "t1", "agent_id": "a1", "state": "completed"}]}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    let agents = h.client.list_agents().await.unwrap();
    let reply = h
        .client
        .send_agent_message(
            "a1",
            &AgentMessageParams {
                message: "hello".to_string(),
                stream: false,
            },
        )
        .await
        .unwrap();
    let page = h
        .client
        .list_agent_logs(
            "a1",
            &AgentLogParams {
                page_size: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(agents[0].is_active());
    assert_eq!(reply["result"], "hi");
    assert_eq!(page.data[0].state.as_deref(), Some("completed"));
    list.assert_async().await;
    send.assert_async().await;
    logs.assert_async().await;
}

#[tokio::test]
async fn test_model_endpoints() {
    let mut server = Server::new_async().await;
    let mine = server
        .mock("GET", "/rag/llm")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"OpenAI": {"tags": "LLM", "llm": [{"name": "gpt-4o", "type": "chat", "used_token": 12}]}})
                .to_string(),
        )
        .create_async()
        .await;
    let catalog = server
        .mock("GET", "/rag/llm/list")
        .match_query(Matcher::UrlEncoded("model_type".into(), "embedding".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"BAAI": [{"llm_name": "bge-m3", "model_type": "embedding", "fid": "BAAI", "available": true}]})
                .to_string(),
        )
        .create_async()
        .await;
    let remove = server
        .mock("DELETE", "/rag/llm/factories")
        .match_body(Matcher::Json(json!({"llm_factory": "OpenAI"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"result": "success"}).to_string())
        .create_async()
        .await;

    let h = harness(&server);
    let models = h.client.list_my_models().await.unwrap();
    let offered = h.client.list_models(Some("embedding")).await.unwrap();
    h.client.delete_provider("OpenAI").await.unwrap();

    assert_eq!(models["OpenAI"].llm[0].model_type, "chat");
    assert!(offered["BAAI"][0].available);
    mine.assert_async().await;
    catalog.assert_async().await;
    remove.assert_async().await;
}
