//! End-to-end behaviour of the chat screen against in-memory collaborators.

mod common;

use chrono::Utc;
use common::{init_test_logging, wait_for_timeline, with_timeout, Harness};
use gochat_core::chat::store::KeyValueStore;
use gochat_core::memory::{MemoryIdentityProvider, StaticProbe};
use gochat_core::sync::RemoteMessageStore;
use gochat_core::{
    AttachmentAction, CaptureOutcome, CapturedImage, ChatScreen, Error, GeoPoint, LocalCache,
    Message, MessageDraft, MessageId, MessageRecord, Mode, ScreenStatus, Session,
};
use std::time::Duration;

fn stranger() -> Session {
    Session {
        user_id: "remote-user".to_string(),
        display_name: "Grace".to_string(),
        avatar_url: "https://placeimg.com/140/140/any".to_string(),
    }
}

async fn live_screen(harness: &Harness) -> ChatScreen {
    let screen = ChatScreen::start(&harness.ctx, "Ada").await.unwrap();
    with_timeout(screen.wait_for_session()).await.unwrap();
    // let the listener deliver its initial result set
    tokio::time::sleep(Duration::from_millis(20)).await;
    screen
}

async fn wait_for_remote(harness: &Harness, len: usize) {
    with_timeout(async {
        while harness.remote.records().len() < len {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

#[tokio::test]
async fn offline_start_shows_cached_snapshot() {
    init_test_logging();
    let harness = Harness::offline();
    harness
        .local_store
        .set(
            "messages",
            r#"[{"id":"1","text":"hi","createdAt":"2024-03-01T09:30:00Z",
                "author":{"id":"u1","displayName":"Ada","avatarUrl":""}}]"#
                .to_string(),
        )
        .await
        .unwrap();

    let screen = ChatScreen::start(&harness.ctx, "Ada").await.unwrap();

    assert_eq!(screen.mode(), Mode::Cached);
    let timeline = screen.timeline().snapshot();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].id, MessageId::from("1"));
    assert_eq!(timeline[0].text, "hi");
    assert_eq!(harness.remote.listener_count(), 0);
    assert_eq!(harness.identity.created_count(), 0);
}

#[tokio::test]
async fn probe_failure_halts_startup() {
    let harness = Harness::with_probe(
        StaticProbe::broken("connectivity check crashed"),
        MemoryIdentityProvider::new(),
    );

    let result = ChatScreen::start(&harness.ctx, "Ada").await;
    assert!(matches!(result, Err(Error::Startup(_))));
    assert_eq!(harness.remote.listener_count(), 0);
}

#[tokio::test]
async fn auth_failure_stalls_without_listener() {
    let harness = Harness::with_probe(StaticProbe::online(), MemoryIdentityProvider::failing());
    let mut screen = ChatScreen::start(&harness.ctx, "Ada").await.unwrap();

    let waited = tokio::time::timeout(Duration::from_millis(100), screen.wait_for_session()).await;
    assert!(waited.is_err());
    assert_eq!(screen.status(), ScreenStatus::LoggingIn);
    assert_eq!(harness.remote.listener_count(), 0);

    screen.close();
    screen.close();
}

#[tokio::test]
async fn returning_identity_is_reused() {
    let harness = Harness::with_probe(
        StaticProbe::online(),
        MemoryIdentityProvider::signed_in("uid-kept"),
    );
    let screen = live_screen(&harness).await;

    let session = screen.session().unwrap();
    assert_eq!(session.user_id, "uid-kept");
    assert_eq!(session.display_name, "Ada");
    assert_eq!(harness.identity.created_count(), 0);
}

#[tokio::test]
async fn remote_update_replaces_timeline() {
    let harness = Harness::online();
    let screen = live_screen(&harness).await;

    let grace = stranger();
    let first = grace.compose(MessageDraft::text("first"));
    harness.remote.add(MessageRecord::from(&first)).await.unwrap();
    wait_for_timeline(screen.timeline(), |t| t.len() == 1).await;

    let second = grace.compose(MessageDraft::text("second"));
    harness.remote.add(MessageRecord::from(&second)).await.unwrap();
    let timeline = wait_for_timeline(screen.timeline(), |t| t.len() == 2).await;

    let expected: Vec<Message> = harness
        .remote
        .records()
        .into_iter()
        .map(Message::from)
        .collect();
    assert_eq!(timeline, expected);
}

#[tokio::test]
async fn send_is_optimistic_and_cached() {
    let harness = Harness::online();
    let screen = live_screen(&harness).await;

    let m1 = screen.compose(MessageDraft::text("one")).unwrap();
    let m2 = screen.compose(MessageDraft::text("two")).unwrap();

    screen.send(m1.clone()).await;
    assert_eq!(screen.timeline().latest(), Some(m1.clone()));

    screen.send(m2.clone()).await;
    let timeline = screen.timeline().snapshot();
    assert_eq!(timeline[0], m2);
    assert_eq!(timeline[1], m1);

    let cache = LocalCache::new(harness.local_store.clone(), "messages");
    let cached = cache.load().await;
    assert_eq!(cached.first(), Some(&m2));

    wait_for_remote(&harness, 2).await;
}

#[tokio::test]
async fn failed_remote_write_keeps_message_visible() {
    let harness = Harness::online();
    harness.remote.set_failing_writes(true);
    let screen = live_screen(&harness).await;

    let hello = screen.send_draft(MessageDraft::text("hello")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(screen.timeline().latest(), Some(hello.clone()));
    let cached = LocalCache::new(harness.local_store.clone(), "messages")
        .load()
        .await;
    assert!(cached.contains(&hello));
    assert!(harness.remote.records().is_empty());
}

#[tokio::test]
async fn failed_cache_save_keeps_message_visible() {
    let harness = Harness::online();
    let screen = live_screen(&harness).await;
    harness.local_store.set_failing(true);

    let hello = screen.send_draft(MessageDraft::text("hello")).await.unwrap();

    assert_eq!(screen.timeline().latest(), Some(hello));
    wait_for_remote(&harness, 1).await;
}

#[tokio::test]
async fn sent_message_returns_through_remote_snapshot() {
    let harness = Harness::online();
    let screen = live_screen(&harness).await;

    let hello = screen.send_draft(MessageDraft::text("hello")).await.unwrap();
    wait_for_remote(&harness, 1).await;

    let timeline = wait_for_timeline(screen.timeline(), |t| t.len() == 1).await;
    assert_eq!(timeline, vec![hello]);
    assert!(timeline[0].created_at <= Utc::now());
}

#[tokio::test]
async fn denied_location_sends_nothing() {
    let harness = Harness::online();
    harness.location.push(CaptureOutcome::Denied);
    let screen = live_screen(&harness).await;
    let before = screen.timeline().snapshot();

    let sent = screen.capture(AttachmentAction::ShareLocation).await.unwrap();

    assert!(sent.is_none());
    assert_eq!(screen.timeline().snapshot(), before);
    assert!(LocalCache::new(harness.local_store.clone(), "messages")
        .load()
        .await
        .is_empty());
}

#[tokio::test]
async fn non_finite_location_keeps_cached_snapshot() {
    let harness = Harness::online();
    harness
        .location
        .push(CaptureOutcome::Captured(GeoPoint::new(f64::NAN, f64::INFINITY)));
    let screen = live_screen(&harness).await;
    let kept = screen.send_draft(MessageDraft::text("keep me")).await.unwrap();

    let sent = screen.capture(AttachmentAction::ShareLocation).await.unwrap();

    assert!(sent.is_none());
    let cached = LocalCache::new(harness.local_store.clone(), "messages")
        .load()
        .await;
    assert_eq!(cached, vec![kept]);
}

#[tokio::test]
async fn captured_location_is_sent() {
    let harness = Harness::online();
    harness
        .location
        .push(CaptureOutcome::Captured(GeoPoint::new(37.7749, -122.4194)));
    let screen = live_screen(&harness).await;

    let sent = screen
        .capture(AttachmentAction::ShareLocation)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(sent.location, Some(GeoPoint::new(37.7749, -122.4194)));
    assert!(sent.text.is_empty());
    assert_eq!(screen.timeline().latest(), Some(sent));
}

#[tokio::test]
async fn photo_is_uploaded_then_sent() {
    let harness = Harness::online();
    harness.images.push_camera(CaptureOutcome::Captured(CapturedImage {
        uri: "file:///tmp/ImagePicker/IMG_0001.jpg".to_string(),
        bytes: vec![1, 2, 3],
    }));
    let screen = live_screen(&harness).await;

    let sent = screen
        .capture(AttachmentAction::TakePhoto)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(sent.image.as_deref(), Some("memory://blobs/IMG_0001.jpg"));
    assert_eq!(harness.blobs.get("IMG_0001.jpg"), Some(vec![1, 2, 3]));
    wait_for_remote(&harness, 1).await;
    assert_eq!(harness.remote.records()[0].image, "memory://blobs/IMG_0001.jpg");
}

#[tokio::test]
async fn close_releases_both_listeners() {
    let harness = Harness::online();
    let mut screen = live_screen(&harness).await;
    assert_eq!(screen.active_subscriptions(), 2);

    screen.close();
    screen.close();
    assert_eq!(screen.active_subscriptions(), 0);

    let before = screen.timeline().snapshot();
    harness
        .remote
        .add(MessageRecord::from(&stranger().compose(MessageDraft::text("late"))))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(screen.timeline().snapshot(), before);
    assert_eq!(harness.remote.listener_count(), 0);
}

#[tokio::test]
async fn dropping_screen_releases_listener() {
    let harness = Harness::online();
    let screen = live_screen(&harness).await;
    assert_eq!(harness.remote.listener_count(), 1);

    drop(screen);
    with_timeout(async {
        while harness.remote.listener_count() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await;
}
