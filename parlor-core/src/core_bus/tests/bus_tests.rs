/*
    bus_tests.rs - Bus + subscription integration tests

    Exercises the full path from publish to filtered delivery across
    several concurrent subscribers.
*/

use crate::core_bus::bus::EventBus;
use crate::core_bus::events::{ChannelSnapshot, ChatEvent};
use crate::core_bus::filter::SubscriberContext;
use crate::core_bus::subscription::Subscription;
use crate::core_store::model::{Channel, MemberProfile, UserId};

fn member(name: &str) -> MemberProfile {
    MemberProfile::new(UserId::new(name.to_string()), name.to_string())
}

fn snapshot(name: &str) -> ChannelSnapshot {
    let channel = Channel::new(
        name.to_string(),
        "A perfectly ordinary test channel".to_string(),
        None,
        UserId::new("creator".to_string()),
    );
    ChannelSnapshot::stripped(&channel)
}

fn subscribe(bus: &EventBus, user: &str, channel: &str) -> Subscription {
    Subscription::attached(
        bus,
        SubscriberContext::new(UserId::new(user.to_string()), channel.to_string()),
    )
}

#[tokio::test]
async fn test_channel_scoped_events_fan_out_to_matching_subscribers() {
    let bus = EventBus::new(16);
    let mut alice = subscribe(&bus, "alice", "general");
    let mut bob = subscribe(&bus, "bob", "general");
    let mut carol = subscribe(&bus, "carol", "other room");

    bus.publish(ChatEvent::MemberAdded {
        member: member("alice"),
        channel: snapshot("general"),
    });
    // Terminate the streams so recv() cannot block forever
    drop(bus);

    // Bob shares the channel and is not the actor
    let event = bob.recv().await.unwrap();
    assert_eq!(event.kind(), "member_added");

    // Alice is the actor, Carol watches another channel
    assert!(alice.recv().await.is_none());
    assert!(carol.recv().await.is_none());
}

#[tokio::test]
async fn test_global_events_reach_every_subscriber() {
    let bus = EventBus::new(16);
    let mut alice = subscribe(&bus, "alice", "general");
    let mut carol = subscribe(&bus, "carol", "other room");

    bus.publish(ChatEvent::StatusChanged { member: member("dave") });
    drop(bus);

    assert_eq!(alice.recv().await.unwrap().kind(), "status_changed");
    assert_eq!(carol.recv().await.unwrap().kind(), "status_changed");
}

#[tokio::test]
async fn test_rejected_subscription_stays_silent_under_load() {
    let bus = EventBus::new(16);
    let ctx = SubscriberContext::new(UserId::new("alice".to_string()), "ghost".to_string());
    let mut rejected = Subscription::rejected(ctx, "Channel not found!".to_string());

    // Events that would match an attached subscriber change nothing
    for _ in 0..5 {
        bus.publish(ChatEvent::StatusChanged { member: member("dave") });
    }

    let first = rejected.recv().await.unwrap();
    assert!(first.is_error());
    assert!(rejected.recv().await.is_none());
}

#[tokio::test]
async fn test_subscriber_count_tracks_attached_receivers() {
    let bus = EventBus::new(16);
    assert_eq!(bus.subscriber_count(), 0);

    let alice = subscribe(&bus, "alice", "general");
    let bob = subscribe(&bus, "bob", "general");
    assert_eq!(bus.subscriber_count(), 2);

    drop(alice);
    drop(bob);
    assert_eq!(bus.subscriber_count(), 0);
}
