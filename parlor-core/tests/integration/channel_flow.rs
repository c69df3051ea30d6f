/*
    Channel lifecycle integration tests

    Tests:
    1. Create, join, post and list as one conversation
    2. Ghost-channel joins stay silent forever after their error
    3. Private channels gate both joining and history
    4. Presence changes reach every live subscription
*/

use parlor_core::core_bus::ChatEvent;
use parlor_core::core_chat::ChatError;
use parlor_core::test_utils::{
    assert_no_event, create_request, member, memory_service, next_event, private_request,
    DEFAULT_TEST_TIMEOUT, SHORT_TEST_TIMEOUT,
};

#[tokio::test]
async fn test_full_channel_roundtrip() {
    let service = memory_service();
    let alice = member("alice");
    let bob = member("bob");

    let channel = service
        .create_channel(create_request("general chat"), &alice)
        .await
        .expect("channel created");

    // The creator joins the channel they created
    let mut alice_join = service
        .join_channel("general chat", None, &alice)
        .await
        .expect("join resolves");
    assert!(!alice_join.is_rejected());
    let announcement = alice_join.take_announcement().expect("admitted join");
    assert!(!announcement.newly_added, "creator was already a member");
    service.announce_join(announcement);
    let mut alice_sub = alice_join.subscription;

    let event = next_event(&mut alice_sub, DEFAULT_TEST_TIMEOUT).await;
    let ChatEvent::MemberJoined {
        member: joined,
        channel: snapshot,
    } = event
    else {
        panic!("expected MemberJoined, got {:?}", event);
    };
    assert_eq!(joined.id, alice.id);
    assert_eq!(snapshot.members.len(), 1, "joiner sees the full roster");

    // Bob joins; alice sees the member set grow
    let mut bob_join = service
        .join_channel("general chat", None, &bob)
        .await
        .expect("join resolves");
    let announcement = bob_join.take_announcement().expect("admitted join");
    assert!(announcement.newly_added);
    service.announce_join(announcement);
    let mut bob_sub = bob_join.subscription;

    let event = next_event(&mut bob_sub, DEFAULT_TEST_TIMEOUT).await;
    let ChatEvent::MemberJoined {
        member: joined,
        channel: snapshot,
    } = event
    else {
        panic!("expected MemberJoined, got {:?}", event);
    };
    assert_eq!(joined.id, bob.id);
    assert_eq!(snapshot.members.len(), 2);

    let event = next_event(&mut alice_sub, DEFAULT_TEST_TIMEOUT).await;
    let ChatEvent::MemberAdded {
        member: added,
        channel: snapshot,
    } = event
    else {
        panic!("expected MemberAdded, got {:?}", event);
    };
    assert_eq!(added.id, bob.id);
    assert!(snapshot.members.is_empty(), "broadcasts are member-stripped");

    // Bob posts; every channel subscriber hears it
    let message = service
        .post_message(&channel.id, "hello everyone".to_string(), &bob)
        .await
        .expect("post succeeds");

    for sub in [&mut alice_sub, &mut bob_sub] {
        let event = next_event(sub, DEFAULT_TEST_TIMEOUT).await;
        let ChatEvent::MessagePosted { message: view, .. } = event else {
            panic!("expected MessagePosted, got {:?}", event);
        };
        assert_eq!(view.id, message.id);
        assert_eq!(view.author.display_name, "bob");
    }

    let page = service
        .list_messages(&channel.id, 0, 50, None)
        .await
        .expect("list succeeds");
    assert_eq!(page.total, 1);
    assert_eq!(page.messages[0].body, "hello everyone");
}

#[tokio::test]
async fn test_ghost_channel_join_stays_silent_forever() {
    let service = memory_service();
    let alice = member("alice");

    let mut handle = service
        .join_channel("ghost channel", None, &alice)
        .await
        .expect("join resolves");
    assert!(handle.is_rejected());
    assert!(handle.take_announcement().is_none());

    let event = next_event(&mut handle.subscription, DEFAULT_TEST_TIMEOUT).await;
    let ChatEvent::SubscriptionError { target, error } = event else {
        panic!("expected SubscriptionError, got {:?}", event);
    };
    assert_eq!(target, alice.id);
    assert_eq!(error, "Channel not found!");

    // Traffic that would have matched had the join succeeded
    let channel = service
        .create_channel(create_request("ghost channel"), &alice)
        .await
        .expect("channel created");
    service
        .post_message(&channel.id, "anyone here?".to_string(), &alice)
        .await
        .expect("post succeeds");

    assert!(
        handle.subscription.recv().await.is_none(),
        "a rejected stream ends after its error"
    );
}

#[tokio::test]
async fn test_private_channel_gates_join_and_history() {
    let service = memory_service();
    let alice = member("alice");
    let bob = member("bob");

    let channel = service
        .create_channel(private_request("secret lair", "hunter two"), &alice)
        .await
        .expect("channel created");
    service
        .post_message(&channel.id, "members only".to_string(), &alice)
        .await
        .expect("post succeeds");

    // Wrong password: targeted error, no membership change
    let mut handle = service
        .join_channel("secret lair", Some("guess"), &bob)
        .await
        .expect("join resolves");
    let event = next_event(&mut handle.subscription, DEFAULT_TEST_TIMEOUT).await;
    let ChatEvent::SubscriptionError { error, .. } = event else {
        panic!("expected SubscriptionError, got {:?}", event);
    };
    assert_eq!(error, "Wrong password.");

    let err = service
        .list_messages(&channel.id, 0, 50, Some("guess"))
        .await
        .expect_err("history stays closed");
    assert!(matches!(err, ChatError::Authentication(_)));

    // Right password opens both
    let mut handle = service
        .join_channel("secret lair", Some("hunter two"), &bob)
        .await
        .expect("join resolves");
    assert!(!handle.is_rejected());
    let announcement = handle.take_announcement().expect("admitted join");
    service.announce_join(announcement);

    let page = service
        .list_messages(&channel.id, 0, 50, Some("hunter two"))
        .await
        .expect("history opens");
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_status_changes_reach_all_subscriptions() {
    let service = memory_service();
    let alice = member("alice");
    let bob = member("bob");

    service
        .create_channel(create_request("room alpha"), &alice)
        .await
        .expect("channel created");
    service
        .create_channel(create_request("room omega"), &bob)
        .await
        .expect("channel created");

    let mut alice_join = service
        .join_channel("room alpha", None, &alice)
        .await
        .expect("join resolves");
    let mut bob_join = service
        .join_channel("room omega", None, &bob)
        .await
        .expect("join resolves");
    // Announcements are irrelevant to presence; skip them

    service
        .set_status(&alice.id, true)
        .await
        .expect("status flips");

    for handle in [&mut alice_join, &mut bob_join] {
        let event = next_event(&mut handle.subscription, DEFAULT_TEST_TIMEOUT).await;
        let ChatEvent::StatusChanged { member: changed } = event else {
            panic!("expected StatusChanged, got {:?}", event);
        };
        assert_eq!(changed.id, alice.id);
        assert!(changed.online);
    }

    // Unknown members change nothing
    service
        .set_status(&member("stranger").id, true)
        .await
        .expect("silently ignored");
    assert_no_event(&mut alice_join.subscription, SHORT_TEST_TIMEOUT).await;
}
