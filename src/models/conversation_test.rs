use chrono::Duration;

use super::*;

#[test]
fn test_new_conversation_timestamps() {
    let convo = Conversation::new("user", "Hello", "model");
    assert_eq!(convo.created_at(), convo.updated_at());
    assert_eq!(convo.title(), "Hello");
    assert_eq!(convo.model_name(), "model");
    assert!(uuid::Uuid::parse_str(convo.id()).is_ok());
}

#[test]
fn test_touch_never_moves_backwards() {
    let mut convo = Conversation::new("user", "Hello", "model");
    let later = convo.updated_at() + Duration::seconds(10);
    convo.touch(later);
    assert_eq!(convo.updated_at(), later);

    convo.touch(later - Duration::seconds(60));
    assert_eq!(convo.updated_at(), later);
}

#[test]
fn test_update_apply() {
    let mut convo = Conversation::new("user", "Hello", "model");
    let now = convo.updated_at() + Duration::milliseconds(5);

    ConversationUpdate::new()
        .with_title("Renamed")
        .apply(&mut convo, now);
    assert_eq!(convo.title(), "Renamed");
    assert_eq!(convo.model_name(), "model");
    assert_eq!(convo.updated_at(), now);
}

#[test]
fn test_update_serializes_only_set_fields() {
    let update = ConversationUpdate::new().with_model_name("openai/gpt-4");
    let body = serde_json::to_value(&update).unwrap();
    assert_eq!(body, serde_json::json!({ "model_name": "openai/gpt-4" }));
}

#[test]
fn test_conversation_wire_shape() {
    let convo = Conversation::new("user", "Hello", "model").with_id("c1");
    let value = serde_json::to_value(&convo).unwrap();
    for field in [
        "id",
        "user_id",
        "title",
        "model_name",
        "created_at",
        "updated_at",
    ] {
        assert!(value.get(field).is_some(), "missing {field}");
    }

    let back: Conversation = serde_json::from_value(value).unwrap();
    assert_eq!(back, convo);
}

#[test]
fn test_parse_postgrest_timestamp() {
    let raw = r#"{
        "id": "c1",
        "user_id": "u1",
        "title": "Remote",
        "model_name": "m",
        "created_at": "2025-03-01T10:00:00.123456+00:00",
        "updated_at": "2025-03-01T10:05:00+00:00"
    }"#;
    let convo: Conversation = serde_json::from_str(raw).unwrap();
    assert!(convo.updated_at() > convo.created_at());
}
