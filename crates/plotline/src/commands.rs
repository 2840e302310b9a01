//! Subcommand implementations.
//!
//! Each command returns its output text; `main` decides where it goes.

use std::error::Error;
use std::fs;
use std::path::Path;

use extractor::{parse_response, ExtractedData, Normalizer};
use plot_core::TimelineStore;
use plot_events::Story;

use crate::config::PlotlineConfig;

type CommandResult = Result<String, Box<dyn Error>>;

/// Parses a raw model response and normalizes it into a story, using
/// `previous` for the story's id and title.
pub fn normalize(
    config: &PlotlineConfig,
    response: &Path,
    narrative: &Path,
    previous: Option<&Path>,
) -> CommandResult {
    let raw = fs::read_to_string(response)?;
    let narrative_text = fs::read_to_string(narrative)?;

    let mut store = match previous {
        Some(path) => {
            let mut store = TimelineStore::new(config.store.clone());
            store.load_story(&fs::read_to_string(path)?)?;
            store
        }
        None => TimelineStore::new(config.store.clone()),
    };

    let value = parse_response(&raw, config.extraction.diagnostic_window)?;
    let data = ExtractedData::from_value(&value);
    let normalizer = Normalizer::new(&config.extraction, config.store.palette.clone());
    let normalized = normalizer.normalize(&data, &narrative_text, store.story());

    tracing::debug!("Normalize report: {:?}", normalized.report);
    tracing::info!(
        "Normalized {} characters and {} events",
        normalized.story.characters.len(),
        normalized.story.events.len()
    );

    store.set_story(normalized.story);
    Ok(store.export_story()?)
}

/// Re-derives every cumulative field of a story file.
pub fn recompute(config: &PlotlineConfig, story: &Path) -> CommandResult {
    let mut store = TimelineStore::new(config.store.clone());
    store.load_story(&fs::read_to_string(story)?)?;
    Ok(store.export_story()?)
}

/// Summarizes a story file and lists broken references.
pub fn check(story: &Path) -> CommandResult {
    let story = Story::from_json(&fs::read_to_string(story)?)?;
    let mut lines = vec![
        format!("story: {} ({})", story.title, story.id),
        format!("characters: {}", story.characters.len()),
        format!("events: {}", story.events.len()),
        format!("connections: {}", story.connections.len()),
        format!("timeline steps: {}", story.timeline.len()),
    ];

    let orphans: Vec<&str> = story
        .events
        .iter()
        .filter(|e| story.character(&e.character_id).is_none())
        .map(|e| e.id.as_str())
        .collect();
    let dangling = story.dangling_connections();
    let missing_sections: Vec<&str> = story
        .events
        .iter()
        .filter_map(|e| e.primary_ref())
        .filter(|r| story.section(&r.section_id).is_none())
        .map(|r| r.section_id.as_str())
        .collect();

    for id in &orphans {
        lines.push(format!("event {} has no character", id));
    }
    for conn in &dangling {
        lines.push(format!(
            "connection {} is dangling ({} -> {})",
            conn.id, conn.source_event_id, conn.target_event_id
        ));
    }
    for id in &missing_sections {
        lines.push(format!("section {} is not in the narrative", id));
    }
    if orphans.is_empty() && dangling.is_empty() && missing_sections.is_empty() {
        lines.push("no broken references".to_string());
    }

    Ok(lines.join("\n"))
}

/// Default configuration as TOML.
pub fn default_config() -> CommandResult {
    Ok(PlotlineConfig::default().to_toml()?)
}
