//! Metric descriptions for observability
//!
//! Counters and histograms are recorded at the call sites with the
//! `metrics` macros; this module only registers their descriptions. Hosts
//! install whatever recorder they export through.

use metrics::{describe_counter, describe_histogram};

/// Register descriptions for every metric the engine emits.
pub fn init_metrics() {
    // Chat metrics
    describe_counter!("chat.channels.created", "Channels created");
    describe_counter!("chat.messages.posted", "Messages accepted into channels");
    describe_counter!(
        "chat.messages.updated",
        "Messages re-published after enrichment"
    );
    describe_counter!(
        "chat.joins.admitted",
        "Join attempts that produced a live subscription"
    );
    describe_counter!("chat.joins.rejected", "Join attempts turned away");

    // Enrichment metrics
    describe_counter!(
        "enrich.jobs.dropped",
        "Enrichment jobs discarded before queueing"
    );
    describe_counter!(
        "enrich.jobs.completed",
        "Enrichment jobs processed, by outcome"
    );
    describe_counter!("enrich.fetches.failed", "Link fetches that failed");
    describe_histogram!(
        "enrich.fetch.duration_ms",
        "Wall time of link fetches in milliseconds"
    );
    describe_counter!(
        "enrich.workers.restarted",
        "Workers replaced after a panic"
    );

    // Bus metrics
    describe_counter!("bus.events.published", "Events published to the bus");
    describe_counter!(
        "bus.events.delivered",
        "Events that passed a subscriber's filter"
    );
    describe_counter!(
        "bus.events.lagged",
        "Events a slow subscriber missed to backpressure"
    );
}
