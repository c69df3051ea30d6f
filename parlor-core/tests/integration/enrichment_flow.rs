/*
    Enrichment integration tests

    Full loop through the service: post a message, let the worker pool
    resolve its link against canned bytes, and observe the persisted meta
    plus the channel-scoped MessageUpdated event.
*/

use std::sync::Arc;

use parlor_core::core_bus::ChatEvent;
use parlor_core::core_chat::ChatService;
use parlor_core::core_enrich::{EnrichmentRunner, StaticFetcher};
use parlor_core::core_store::{ChatStore, MetaKind};
use parlor_core::test_utils::{
    assert_no_event, create_request, member, next_event, test_config, DEFAULT_TEST_TIMEOUT,
    SHORT_TEST_TIMEOUT,
};

const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];

/// Service wired to a worker pool that fetches from `fetcher`.
fn enriched_service(fetcher: StaticFetcher) -> (Arc<ChatService>, EnrichmentRunner) {
    let store = ChatStore::memory().expect("memory store");
    let config = test_config();
    let (runner, jobs, notices) =
        EnrichmentRunner::start(store.clone(), Arc::new(fetcher), &config.enrichment);

    let service = Arc::new(ChatService::new(store, config.chat.clone()).with_enrichment(jobs));
    service.spawn_notice_listener(notices);
    (service, runner)
}

#[tokio::test]
async fn test_posted_image_link_gains_meta_and_updates_the_channel() {
    let fetcher =
        StaticFetcher::new().with_response("http://example.com/pic.jpg", JPEG_BYTES.to_vec());
    let (service, _runner) = enriched_service(fetcher);
    let alice = member("alice");
    let carol = member("carol");

    let watched = service
        .create_channel(create_request("picture room"), &alice)
        .await
        .expect("channel created");
    service
        .create_channel(create_request("quiet room"), &carol)
        .await
        .expect("channel created");

    let mut alice_join = service
        .join_channel("picture room", None, &alice)
        .await
        .expect("join resolves");
    let mut carol_join = service
        .join_channel("quiet room", None, &carol)
        .await
        .expect("join resolves");

    let message = service
        .post_message(
            &watched.id,
            "check http://example.com/pic.jpg".to_string(),
            &alice,
        )
        .await
        .expect("post succeeds");
    assert!(message.meta.is_none(), "enrichment never blocks the post");

    let event = next_event(&mut alice_join.subscription, DEFAULT_TEST_TIMEOUT).await;
    assert!(matches!(event, ChatEvent::MessagePosted { .. }));

    let event = next_event(&mut alice_join.subscription, DEFAULT_TEST_TIMEOUT).await;
    let ChatEvent::MessageUpdated { message: view, .. } = event else {
        panic!("expected MessageUpdated, got {:?}", event);
    };
    assert_eq!(view.id, message.id);
    let meta = view.meta.expect("meta on the update");
    assert_eq!(meta.kind, MetaKind::Image);
    assert_eq!(meta.url, "http://example.com/pic.jpg");

    // A subscriber on another channel sees none of it
    assert_no_event(&mut carol_join.subscription, SHORT_TEST_TIMEOUT).await;

    let stored = service
        .store()
        .get_message(&message.id)
        .expect("query succeeds")
        .expect("message exists");
    assert_eq!(stored.meta.expect("meta persisted").kind, MetaKind::Image);
}

#[tokio::test]
async fn test_page_link_announces_full_preview() {
    let html = r#"<head>
        <meta property="og:title" content="Weekly Notes">
        <meta name="description" content="What happened this week">
        </head>"#;
    let fetcher = StaticFetcher::new().with_response("https://example.com/notes", html.as_bytes());
    let (service, _runner) = enriched_service(fetcher);
    let alice = member("alice");

    let channel = service
        .create_channel(create_request("reading group"), &alice)
        .await
        .expect("channel created");
    let mut handle = service
        .join_channel("reading group", None, &alice)
        .await
        .expect("join resolves");

    service
        .post_message(
            &channel.id,
            "read https://example.com/notes please".to_string(),
            &alice,
        )
        .await
        .expect("post succeeds");

    let event = next_event(&mut handle.subscription, DEFAULT_TEST_TIMEOUT).await;
    assert!(matches!(event, ChatEvent::MessagePosted { .. }));

    let event = next_event(&mut handle.subscription, DEFAULT_TEST_TIMEOUT).await;
    let ChatEvent::MessageUpdated { message: view, .. } = event else {
        panic!("expected MessageUpdated, got {:?}", event);
    };
    let meta = view.meta.expect("meta on the update");
    assert_eq!(meta.kind, MetaKind::Page);
    assert_eq!(meta.title.as_deref(), Some("Weekly Notes"));
    assert_eq!(meta.description.as_deref(), Some("What happened this week"));
}

#[tokio::test]
async fn test_unreachable_link_never_updates() {
    // No canned responses at all: every fetch fails
    let (service, _runner) = enriched_service(StaticFetcher::new());
    let alice = member("alice");

    let channel = service
        .create_channel(create_request("dead links"), &alice)
        .await
        .expect("channel created");
    let mut handle = service
        .join_channel("dead links", None, &alice)
        .await
        .expect("join resolves");

    let message = service
        .post_message(
            &channel.id,
            "try https://example.com/gone".to_string(),
            &alice,
        )
        .await
        .expect("post succeeds");

    let event = next_event(&mut handle.subscription, DEFAULT_TEST_TIMEOUT).await;
    assert!(matches!(event, ChatEvent::MessagePosted { .. }));

    // No update, ever
    assert_no_event(&mut handle.subscription, SHORT_TEST_TIMEOUT).await;
    let stored = service
        .store()
        .get_message(&message.id)
        .expect("query succeeds")
        .expect("message exists");
    assert!(stored.meta.is_none(), "failed enrichment leaves meta unset");
}
