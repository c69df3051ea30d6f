/*
    Tests for the enrichment pipeline
*/
