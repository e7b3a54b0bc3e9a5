use std::sync::Arc;

use mockito::Matcher;
use serde_json::json;

use super::*;
use crate::{
    repository::{Baas, Local, MockAiRepository, RecordKind},
    storage::{LocalStore, Memory},
};

const USER: &str = "user-1";

fn local() -> Arc<Local> {
    Arc::new(Local::new(
        LocalStore::new(Arc::new(Memory::default())),
        USER,
        "google/gemini-2.5-flash",
    ))
}

fn offline() -> eyre::Report {
    eyre::eyre!("connection refused")
}

#[tokio::test]
async fn test_create_conversation_falls_back() {
    let mut remote = MockAiRepository::new();
    remote
        .expect_create_conversation()
        .times(1)
        .returning(|_| Err(offline()));

    let local = local();
    let repo = Fallback::new(Arc::new(remote), local.clone());

    let convo = repo
        .create_conversation(NewConversation::new().with_title("X"))
        .await
        .unwrap();
    assert_eq!(convo.title(), "X");
    assert_eq!(convo.user_id(), USER);

    // The record lives in local storage only
    let stored = local.get_conversation(convo.id()).await.unwrap();
    assert_eq!(stored, convo);
}

#[tokio::test]
async fn test_remote_success_skips_local() {
    let remote_convo = Conversation::new(USER, "remote", "openai/gpt-4");
    let expected = remote_convo.clone();

    let mut remote = MockAiRepository::new();
    remote
        .expect_list_conversations()
        .times(1)
        .returning(move || Ok(vec![remote_convo.clone()]));

    let local = local();
    local
        .create_conversation(NewConversation::new().with_title("local"))
        .await
        .unwrap();

    let repo = Fallback::new(Arc::new(remote), local);
    let list = repo.list_conversations().await.unwrap();
    assert_eq!(list, vec![expected]);
}

#[tokio::test]
async fn test_remote_not_found_falls_back() {
    let local = local();
    let convo = local
        .create_conversation(NewConversation::new())
        .await
        .unwrap();

    let mut remote = MockAiRepository::new();
    let id = convo.id().to_string();
    remote
        .expect_get_conversation()
        .times(1)
        .returning(move |_| Err(RepositoryError::not_found(RecordKind::Conversation, &id).into()));

    let repo = Fallback::new(Arc::new(remote), local);
    let got = repo.get_conversation(convo.id()).await.unwrap();
    assert_eq!(got, convo);
}

#[tokio::test]
async fn test_local_error_surfaces() {
    let mut remote = MockAiRepository::new();
    remote
        .expect_add_message()
        .times(1)
        .returning(|_, _, _| Err(offline()));

    let repo = Fallback::new(Arc::new(remote), local());
    let err = repo
        .add_message("ghost", Role::User, "hello")
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<RepositoryError>(),
        Some(&RepositoryError::not_found(RecordKind::Conversation, "ghost"))
    );
}

#[tokio::test]
async fn test_system_template_refusal_is_final() {
    let mut remote = MockAiRepository::new();
    remote
        .expect_delete_template()
        .times(1)
        .returning(|id| Err(RepositoryError::system_template(id).into()));

    let mut local = MockAiRepository::new();
    local.expect_delete_template().never();

    let repo = Fallback::new(Arc::new(remote), Arc::new(local));
    let err = repo.delete_template("t1").await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<RepositoryError>(),
        Some(&RepositoryError::system_template("t1"))
    );
}

#[tokio::test]
async fn test_templates_fall_back_to_seeded_local() {
    let mut remote = MockAiRepository::new();
    remote
        .expect_list_templates()
        .times(1)
        .returning(|| Err(offline()));

    let repo = Fallback::new(Arc::new(remote), local());
    let templates = repo.list_templates().await.unwrap();
    assert!(!templates.is_empty());
    assert!(templates.iter().all(|t| t.is_system()));
}

#[tokio::test]
async fn test_remote_insert_is_final_when_touch_fails() {
    let mut server = mockito::Server::new_async().await;
    let insert = server
        .mock("POST", "/rest/v1/ai_messages")
        .with_status(201)
        .with_body(
            json!([{
                "id": "m1",
                "conversation_id": "c1",
                "role": "user",
                "content": "hi",
                "timestamp": "2025-01-02T03:04:05Z",
            }])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    server
        .mock("PATCH", "/rest/v1/ai_conversations")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("unavailable")
        .create_async()
        .await;

    let local = local();
    let convo = local
        .create_conversation(NewConversation::new())
        .await
        .unwrap();
    let repo = Fallback::new(Arc::new(Baas::new(&server.url(), USER)), local.clone());

    let message = repo.add_message(convo.id(), Role::User, "hi").await.unwrap();
    assert_eq!(message.id(), "m1");
    insert.assert_async().await;
    assert!(local.list_messages(convo.id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_delete_is_final_when_cleanup_fails() {
    let mut server = mockito::Server::new_async().await;
    let conversation = server
        .mock("DELETE", "/rest/v1/ai_conversations")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!([{
                "id": "c1",
                "user_id": USER,
                "title": "Bye",
                "model_name": "openai/gpt-4",
                "created_at": "2025-01-02T03:04:05Z",
                "updated_at": "2025-01-02T03:04:05Z",
            }])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    server
        .mock("DELETE", "/rest/v1/ai_messages")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("unavailable")
        .create_async()
        .await;

    let local = local();
    let convo = local
        .create_conversation(NewConversation::new())
        .await
        .unwrap();
    let repo = Fallback::new(Arc::new(Baas::new(&server.url(), USER)), local.clone());

    repo.delete_conversation("c1").await.unwrap();
    conversation.assert_async().await;
    // Local storage was never touched
    assert!(local.get_conversation(convo.id()).await.is_ok());
}

#[test]
fn test_should_fallback() {
    assert!(should_fallback(&offline()));
    assert!(should_fallback(
        &RepositoryError::not_found(RecordKind::Note, "n").into()
    ));
    assert!(!should_fallback(
        &RepositoryError::system_template("t").into()
    ));
}
