//! Integration Tests Module
//!
//! End-to-end tests for the Chorus orchestration engine. Tests cover the
//! deduplication cache, the message pipeline, the event bus, and full
//! orchestration rounds across every ordering policy.

// Deduplication cache and sweeper tests
mod dedup_test;


// Orchestration round tests (ordering, pacing, isolation, cancellation)
mod orchestrator_test;
