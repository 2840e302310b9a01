//! Sample data fixtures for testing.
//!
//! This module provides ready-made test data for other crates to use.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // plot-events = { path = "../plot-events", features = ["test-fixtures"] }
//!
//! use plot_events::fixtures;
//!
//! let story = fixtures::sample_story();
//! ```

use crate::Story;

/// Returns the two-event "burned map" scenario.
///
/// One character `a` starting calm with a map; event 0 removes the map,
/// event 1 turns the mood tense. Cumulative fields are not yet derived.
pub fn scenario_story() -> Story {
    let json = include_str!("../tests/fixtures/scenario_story.json");
    serde_json::from_str(json).expect("Failed to parse scenario_story.json")
}

/// Returns the lighthouse sample story.
///
/// Contains:
/// - 2 characters (`keeper`, `visitor`)
/// - 4 events given out of chronological order, two sharing time_step 2
/// - 2 connections
/// - a narrative with one section
pub fn sample_story() -> Story {
    let json = include_str!("../tests/fixtures/sample_story.json");
    serde_json::from_str(json).expect("Failed to parse sample_story.json")
}

/// Returns the raw sample story JSON text.
pub fn sample_story_json() -> &'static str {
    include_str!("../tests/fixtures/sample_story.json")
}
