//! Integration tests for krishimitra-core
//!
//! Drive a full conversation through the public API with paused tokio time,
//! then run the scanner and weather generator the way the service does.

use std::sync::Arc;
use std::time::Duration;

use krishimitra_core::{
    Conversation, ConversationOptions, DiseaseScanner, Error, KeywordResponder, weather,
};
use krishimitra_types::{ConfidenceBand, Language, Sender};

fn shared_responder() -> Arc<KeywordResponder> {
    Arc::new(KeywordResponder::builtin())
}

#[tokio::test(start_paused = true)]
async fn test_bilingual_conversation() {
    let conversation = Conversation::new(
        shared_responder(),
        ConversationOptions::default().language(Language::Hindi),
    );

    let greeting = conversation.snapshot().await.turns[0].content.clone();
    assert!(greeting.starts_with("नमस्ते"));

    conversation.send("Subsidy for polyhouse?").await.unwrap();
    tokio::time::sleep(Duration::from_millis(1001)).await;

    let snapshot = conversation.snapshot().await;
    assert_eq!(snapshot.turns.len(), 3);
    assert!(snapshot.turns[2].content.starts_with("भारत सरकार"));

    let snapshot = conversation.set_language(Language::English).await.unwrap();
    assert!(snapshot.turns[0].content.starts_with("Hello!"));
    // Earlier replies are not translated.
    assert!(snapshot.turns[2].content.starts_with("भारत सरकार"));

    conversation.send("What about onion prices?").await.unwrap();
    tokio::time::sleep(Duration::from_millis(1001)).await;
    let snapshot = conversation.snapshot().await;
    assert!(snapshot.turns[4].content.starts_with("I don't have specific information"));
}

#[tokio::test(start_paused = true)]
async fn test_many_conversations_share_one_responder() {
    let responder = shared_responder();
    let conversations: Vec<Conversation> = (0..8)
        .map(|_| Conversation::new(Arc::clone(&responder), ConversationOptions::default()))
        .collect();

    for conversation in &conversations {
        conversation.send("Best fertilizer for wheat?").await.unwrap();
    }
    conversations[3].reset().await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    for (i, conversation) in conversations.iter().enumerate() {
        let snapshot = conversation.snapshot().await;
        let users = snapshot.turns.iter().filter(|t| t.sender == Sender::User).count();
        if i == 3 {
            assert_eq!(snapshot.turns.len(), 1);
        } else {
            assert_eq!(users, 1);
            assert_eq!(snapshot.turns.len(), 3);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_invalid_input_leaves_no_trace() {
    let conversation = Conversation::new(
        shared_responder(),
        ConversationOptions::default().max_message_len(10),
    );

    assert_eq!(conversation.send("   ").await, Err(Error::EmptyMessage));
    assert!(matches!(
        conversation.send("this message is too long").await,
        Err(Error::MessageTooLong { max: 10, .. })
    ));
    assert!(!conversation.is_awaiting_reply().await);
    assert_eq!(conversation.snapshot().await.turns.len(), 1);
}

#[test]
fn test_scanner_and_weather() {
    let scanner = DiseaseScanner::default();
    let result = scanner.scan("field_wheat_001.JPG", 120_000).unwrap();
    assert_eq!(result.disease, "Wheat Rust");
    assert_eq!(result.band(), ConfidenceBand::High);

    assert!(matches!(
        scanner.scan("huge.png", 6 * 1024 * 1024),
        Err(Error::ImageTooLarge { .. })
    ));

    let report = weather::generate(weather::DEFAULT_LOCATION);
    assert_eq!(report.forecast.len(), 5);
}
