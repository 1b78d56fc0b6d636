//! Extraction of uploads from Telegram messages
//!
//! Run with: cargo test --test telegram_media_test

use kruzhok::kruzhok::MediaKind;
use kruzhok::telegram::handlers::{remote_media, user_profile};
use teloxide::types::Message;

fn message(extra: serde_json::Value) -> Message {
    let mut json = serde_json::json!({
        "message_id": 1,
        "date": 1234567890,
        "chat": {
            "id": 555,
            "type": "private",
            "first_name": "Test"
        },
        "from": {
            "id": 555,
            "is_bot": false,
            "first_name": "Test",
            "username": "testuser"
        }
    });
    if let (Some(base), Some(extra)) = (json.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }
    serde_json::from_value(json).unwrap()
}

#[test]
fn test_video_message() {
    let msg = message(serde_json::json!({
        "video": {
            "file_id": "vid-1",
            "file_unique_id": "u-vid-1",
            "width": 1280,
            "height": 720,
            "duration": 42,
            "file_size": 3_000_000
        }
    }));

    let media = remote_media(&msg).unwrap();
    assert_eq!(media.kind, MediaKind::Video);
    assert_eq!(media.file_id, "vid-1");
    assert_eq!(media.duration_hint, Some(42.0));
    assert_eq!(media.file_size, Some(3_000_000));
}

#[test]
fn test_photo_message_uses_largest_size() {
    let msg = message(serde_json::json!({
        "photo": [
            { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 1000 },
            { "file_id": "large", "file_unique_id": "l", "width": 1280, "height": 960, "file_size": 90000 },
            { "file_id": "medium", "file_unique_id": "m", "width": 320, "height": 240, "file_size": 9000 }
        ]
    }));

    let media = remote_media(&msg).unwrap();
    assert_eq!(media.kind, MediaKind::Photo);
    assert_eq!(media.file_id, "large");
    assert_eq!(media.duration_hint, None);
}

#[test]
fn test_text_and_documents_are_not_uploads() {
    let text = message(serde_json::json!({ "text": "salom" }));
    assert!(remote_media(&text).is_none());

    let document = message(serde_json::json!({
        "document": { "file_id": "doc", "file_unique_id": "d", "file_size": 10 }
    }));
    assert!(remote_media(&document).is_none());
}

#[test]
fn test_user_profile_from_message() {
    let msg = message(serde_json::json!({ "text": "/start" }));
    let profile = user_profile(msg.from.as_ref().unwrap()).unwrap();
    assert_eq!(profile.id, 555);
    assert_eq!(profile.username.as_deref(), Some("testuser"));
    assert_eq!(profile.first_name.as_deref(), Some("Test"));
}
