use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parlor_core::core_bus::{
    should_deliver, ChannelSnapshot, ChatEvent, EventBus, SubscriberContext, Subscription,
};
use parlor_core::core_store::{Channel, MemberProfile, UserId};
use tokio::runtime::Runtime;

fn profile(name: &str) -> MemberProfile {
    MemberProfile::new(UserId::new(name.to_string()), name.to_string())
}

fn posted_event(channel_name: &str) -> ChatEvent {
    let channel = Channel::new(
        channel_name.to_string(),
        "Benchmark fixture channel".to_string(),
        None,
        UserId::new("creator".to_string()),
    );
    ChatEvent::MemberAdded {
        member: profile("bob"),
        channel: ChannelSnapshot::stripped(&channel),
    }
}

fn bench_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("bus_fanout");

    let rt = Runtime::new().unwrap();

    // One event fanned out to n filtered subscribers, drained to the end
    for subscribers in [1usize, 8, 64, 256].iter() {
        group.throughput(Throughput::Elements(*subscribers as u64));
        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            subscribers,
            |b, &n| {
                b.to_async(&rt).iter(|| async move {
                    let bus = EventBus::new(1024);
                    let mut subs: Vec<Subscription> = (0..n)
                        .map(|i| {
                            Subscription::attached(
                                &bus,
                                SubscriberContext::new(
                                    UserId::new(format!("user{}", i)),
                                    "general".to_string(),
                                ),
                            )
                        })
                        .collect();

                    bus.publish(posted_event("general"));
                    drop(bus);

                    for sub in &mut subs {
                        while let Some(event) = sub.recv().await {
                            black_box(event);
                        }
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_publish_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("bus_publish_burst");

    let rt = Runtime::new().unwrap();

    // Bursts of events through one subscriber, mixing hits and misses
    for burst in [16usize, 128, 1024].iter() {
        group.throughput(Throughput::Elements(*burst as u64));
        group.bench_with_input(BenchmarkId::new("events", burst), burst, |b, &n| {
            b.iter(|| {
                rt.block_on(async {
                    let bus = EventBus::new(2048);
                    let mut sub = Subscription::attached(
                        &bus,
                        SubscriberContext::new(
                            UserId::new("alice".to_string()),
                            "general".to_string(),
                        ),
                    );

                    for i in 0..n {
                        let name = if i % 2 == 0 { "general" } else { "other room" };
                        bus.publish(posted_event(name));
                    }
                    drop(bus);

                    while let Some(event) = sub.recv().await {
                        black_box(event);
                    }
                })
            });
        });
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("delivery_filter");

    let hit = posted_event("general");
    let miss = posted_event("other room");
    let ctx = SubscriberContext::new(UserId::new("alice".to_string()), "general".to_string());

    group.bench_function("matching_event", |b| {
        b.iter(|| black_box(should_deliver(black_box(&hit), black_box(&ctx))))
    });
    group.bench_function("filtered_event", |b| {
        b.iter(|| black_box(should_deliver(black_box(&miss), black_box(&ctx))))
    });

    group.finish();
}

criterion_group!(benches, bench_fanout, bench_publish_burst, bench_filter);
criterion_main!(benches);
