use super::*;
use crate::backend::fake::FakeBackend;

fn generator(fake: FakeBackend) -> (std::sync::Arc<FakeBackend>, TitleGenerator) {
    let (fake, backend) = fake.shared();
    (fake, TitleGenerator::new(backend, "google/gemini-2.5-flash"))
}

#[test]
fn test_clean_title() {
    assert_eq!(clean_title("  \"Rust lifetimes\"\n"), Some("Rust lifetimes".to_string()));
    assert_eq!(clean_title("「Weekly plan」"), Some("Weekly plan".to_string()));
    assert_eq!(clean_title("Two\nlines   here"), Some("Two lines here".to_string()));
    assert_eq!(clean_title("x"), None);
    assert_eq!(clean_title("\"\""), None);

    let long = "a".repeat(40);
    assert_eq!(clean_title(&long), Some(format!("{}...", "a".repeat(25))));

    // Counted in characters, not bytes
    assert_eq!(clean_title("数据处理"), Some("数据处理".to_string()));
}

#[test]
fn test_fallback_title() {
    assert_eq!(fallback_title("  short one "), "short one");
    assert_eq!(fallback_title("line one\nline two"), "line one line t...");
    assert_eq!(fallback_title("ééééééééééééééééé"), "ééééééééééééééé...");
}

#[test]
fn test_note_fallback_title() {
    assert_eq!(note_fallback_title("Shopping\nmilk and eggs"), "Shopping");
    assert_eq!(
        note_fallback_title("A first line that is much too long\nrest"),
        "A first line th"
    );
    assert_eq!(note_fallback_title("\n\n"), DEFAULT_NOTE_TITLE);
}

#[test]
fn test_should_update_title() {
    assert!(should_update_title(DEFAULT_CONVERSATION_TITLE, ""));
    assert!(should_update_title(DEFAULT_NOTE_TITLE, ""));
    assert!(should_update_title("Untitled", ""));
    assert!(should_update_title("Hi", ""));
    assert!(should_update_title("Short", &"x".repeat(101)));
    assert!(!should_update_title("Short", &"x".repeat(100)));
    assert!(!should_update_title("Quarterly planning", &"x".repeat(500)));
}

#[tokio::test]
async fn test_conversation_title_from_gateway() {
    let (fake, titles) = generator(FakeBackend::replying("\"Sourdough basics\""));

    let history = (0..10)
        .map(|i| ChatMessage::user(format!("msg {i}")))
        .collect::<Vec<_>>();
    let title = titles
        .generate_conversation_title("How do I bake bread?", "Start with a starter.", &history)
        .await;
    assert_eq!(title, "Sourdough basics");

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0][0].content;
    assert!(prompt.contains("msg 9"));
    assert!(prompt.contains("msg 4"));
    assert!(!prompt.contains("msg 3"));
    assert!(prompt.contains("User: How do I bake bread?"));
}

#[tokio::test]
async fn test_conversation_title_falls_back() {
    let (_, titles) = generator(FakeBackend::failing());
    let title = titles
        .generate_conversation_title("Explain borrow checking please", "Sure", &[])
        .await;
    assert_eq!(title, "Explain borrow ...");

    let (_, titles) = generator(FakeBackend::replying("?"));
    let title = titles.generate_conversation_title("Hello", "Hi", &[]).await;
    assert_eq!(title, "Hello");
}

#[tokio::test]
async fn test_note_title_short_content_skips_gateway() {
    let (fake, titles) = generator(FakeBackend::replying("unused"));

    assert_eq!(
        titles.generate_note_title("   ", NoteCategory::Work).await,
        DEFAULT_NOTE_TITLE
    );
    assert_eq!(
        titles
            .generate_note_title("Call the\ndentist tomorrow", NoteCategory::Personal)
            .await,
        "Call the dentist tom"
    );
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn test_note_title_uses_category_hint() {
    let (fake, titles) = generator(FakeBackend::replying("Sprint retro notes"));
    let content = "Discussed the sprint outcome with the team. ".repeat(20);

    let title = titles.generate_note_title(&content, NoteCategory::Work).await;
    assert_eq!(title, "Sprint retro notes");

    let prompt = &fake.requests()[0][0].content;
    assert!(prompt.contains(NoteCategory::Work.hint()));
    assert!(prompt.contains("..."));
}

#[tokio::test]
async fn test_suggest_note_titles() {
    let (_, titles) = generator(FakeBackend::failing());
    let notes = vec![
        ("n1".to_string(), "Short note".to_string(), NoteCategory::Other),
        (
            "n2".to_string(),
            format!("Reading list\n{}", "book ".repeat(20)),
            NoteCategory::Study,
        ),
    ];

    let suggestions = titles.suggest_note_titles(&notes).await;
    assert_eq!(
        suggestions,
        vec![
            ("n1".to_string(), "Short note".to_string()),
            ("n2".to_string(), "Reading list".to_string()),
        ]
    );
}
