/*
    Integration tests for core_store subsystem

    Test suite covering:
    - Channel and membership persistence
    - Message log pagination
    - Enrichment meta storage
    - Profile projection
    - Model wire shapes
    - Migration behavior through the store
*/
