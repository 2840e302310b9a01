//! Extraction normalizer.
//!
//! Turns an [`ExtractedData`] into a complete, derived [`Story`]:
//!
//! 1. characters get fresh ids and palette colors by array index
//! 2. events get `time_step` = array index and resolve their actor by name
//! 3. source excerpts become a single narrative reference per event
//! 4. cumulative state is derived
//! 5. the timeline gets one slot per step
//! 6. connections are resolved through narrative positions
//! 7. excerpts are located in the narrative to build sections
//!
//! Missing or malformed input degrades to defaults. Nothing here fails.

use std::collections::HashMap;

use plot_core::recompute;
use plot_events::{
    generate_id, Character, Connection, Event, Narrative, NarrativeRef, NarrativeSection, Palette,
    PaletteCursor, Story, TimeStep,
};

use crate::align::locate;
use crate::config::ExtractorConfig;
use crate::input::{ExtractedConnection, ExtractedData, ExtractedEvent};

/// Actor id used when an event names no known character and the story has
/// no characters to fall back on.
pub const UNKNOWN_CHARACTER_ID: &str = "unknown";

/// Counts of input the normalizer could not use as given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Events whose `who` matched no character name
    pub unresolved_actors: usize,
    /// Connections with an endpoint that resolved to no event
    pub dropped_connections: usize,
    /// Source excerpts not found in the narrative text
    pub unplaced_sections: usize,
}

impl NormalizeReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// A normalized story plus what was dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub story: Story,
    pub report: NormalizeReport,
}

/// Converts extraction results into stories.
#[derive(Debug, Clone)]
pub struct Normalizer {
    palette: Palette,
    source_confidence: f64,
    default_connection_type: String,
    default_title: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default(), Palette::default())
    }
}

impl Normalizer {
    pub fn new(config: &ExtractorConfig, palette: Palette) -> Self {
        Self {
            palette,
            source_confidence: config.source_confidence,
            default_connection_type: config.default_connection_type.clone(),
            default_title: config.default_title.clone(),
        }
    }

    /// Builds a story from `data`, keeping `previous`'s id and title when
    /// they are non-empty.
    pub fn normalize(&self, data: &ExtractedData, narrative_text: &str, previous: &Story) -> Normalized {
        let mut report = NormalizeReport::default();

        let mut cursor = PaletteCursor::default();
        let characters: Vec<Character> = data
            .characters
            .iter()
            .map(|c| Character {
                initial_location: c.initial_location.clone(),
                initial_state: c.initial_state.clone(),
                inventory: c.inventory.clone(),
                ..Character::new(generate_id(), c.name.clone(), cursor.next_color(&self.palette))
            })
            .collect();

        let ids_by_name: HashMap<&str, &str> = characters
            .iter()
            .map(|c| (c.name.as_str(), c.id.as_str()))
            .collect();
        let fallback_actor = characters
            .first()
            .map_or(UNKNOWN_CHARACTER_ID, |c| c.id.as_str());

        let events: Vec<Event> = data
            .events
            .iter()
            .enumerate()
            .map(|(index, extracted)| {
                let actor = match ids_by_name.get(extracted.who.as_str()) {
                    Some(id) => *id,
                    None => {
                        report.unresolved_actors += 1;
                        fallback_actor
                    }
                };
                self.build_event(index, actor, extracted)
            })
            .collect();

        let events = recompute(&characters, &events);
        let timeline = build_timeline(&events);
        let connections = self.resolve_connections(&events, &data.connections, &mut report);
        let sections = place_sections(&events, narrative_text, &mut report);

        if !report.is_clean() {
            tracing::debug!(
                "Normalized with {} unresolved actors, {} dropped connections, {} unplaced sections",
                report.unresolved_actors,
                report.dropped_connections,
                report.unplaced_sections
            );
        }

        let story = Story {
            id: if previous.id.is_empty() {
                generate_id()
            } else {
                previous.id.clone()
            },
            title: if previous.title.is_empty() {
                self.default_title.clone()
            } else {
                previous.title.clone()
            },
            characters,
            events,
            connections,
            timeline,
            narrative: Some(Narrative {
                text: narrative_text.to_string(),
                sections,
            }),
        };

        Normalized { story, report }
    }

    fn build_event(&self, index: usize, actor: &str, extracted: &ExtractedEvent) -> Event {
        let narrative_refs = extracted
            .source_text
            .as_ref()
            .filter(|text| !text.is_empty())
            .map(|text| {
                vec![NarrativeRef {
                    section_id: section_id(index),
                    confidence: self.source_confidence,
                    extracted_text: text.clone(),
                }]
            });

        Event {
            location: extracted.location.clone(),
            dialogue: extracted.dialogue.clone(),
            state_change: extracted.state_change.clone(),
            item_changes: extracted.item_changes.clone(),
            knowledge_changes: extracted.knowledge_changes.clone(),
            time_type: extracted.time_type,
            narrative_position: extracted.narrative_position,
            estimated_time: extracted.estimated_time.clone(),
            narrative_refs,
            ..Event::new(generate_id(), actor, index as i64, extracted.what.clone())
        }
    }

    fn resolve_connections(
        &self,
        events: &[Event],
        extracted: &[ExtractedConnection],
        report: &mut NormalizeReport,
    ) -> Vec<Connection> {
        // Later events win a shared position.
        let mut ids_by_position: HashMap<i64, &str> = HashMap::new();
        for event in events {
            if let Some(position) = event.narrative_position {
                ids_by_position.insert(position, event.id.as_str());
            }
        }
        let resolve = |position: Option<i64>| position.and_then(|p| ids_by_position.get(&p).copied());

        extracted
            .iter()
            .filter_map(|conn| match (resolve(conn.from), resolve(conn.to)) {
                (Some(source), Some(target)) => Some(Connection::new(
                    generate_id(),
                    source,
                    target,
                    conn.connection_type
                        .clone()
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| self.default_connection_type.clone()),
                )),
                _ => {
                    report.dropped_connections += 1;
                    None
                }
            })
            .collect()
    }
}

fn section_id(index: usize) -> String {
    format!("s{}", index)
}

/// One slot per step from 0 to the highest step, labelled with the first
/// matching event's time estimate or `Scene N`.
fn build_timeline(events: &[Event]) -> Vec<TimeStep> {
    let max_step = events.iter().map(|e| e.time_step).max().unwrap_or(0).max(0);
    (0..=max_step)
        .map(|step| {
            let label = events
                .iter()
                .find(|e| e.time_step == step)
                .and_then(|e| e.estimated_time.clone())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| format!("Scene {}", step + 1));
            TimeStep::new(step, label)
        })
        .collect()
}

fn place_sections(events: &[Event], narrative_text: &str, report: &mut NormalizeReport) -> Vec<NarrativeSection> {
    events
        .iter()
        .filter_map(Event::primary_ref)
        .filter_map(|r| match locate(narrative_text, &r.extracted_text) {
            Some(range) => Some(NarrativeSection {
                id: r.section_id.clone(),
                text: r.extracted_text.clone(),
                start_offset: range.start,
                end_offset: range.end,
            }),
            None => {
                tracing::trace!("Excerpt for section {} not found in narrative", r.section_id);
                report.unplaced_sections += 1;
                None
            }
        })
        .collect()
}
