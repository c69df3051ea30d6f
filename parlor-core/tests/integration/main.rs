/*
    Cross-subsystem integration tests

    Drives the engine through its public surface only: requests into the
    service, events and stored state out. Enrichment runs against canned
    fetches so the full post -> enrich -> update loop is observable.
*/

mod channel_flow;
mod enrichment_flow;
