//! Narrative extraction: from a generative model's raw answer to a story.
//!
//! ```text
//! narrative ──▶ ExtractionClient ──▶ raw text ──▶ sanitize/parse
//!                                                       │
//!            TimelineStore ◀── Normalizer ◀── ExtractedData
//! ```
//!
//! # Modules
//!
//! - [`sanitize`]: payload recovery, noise repair and diagnostic parsing
//! - [`input`]: lenient extraction input model
//! - [`align`]: locating excerpts in the narrative
//! - [`normalize`]: extraction to derived story
//! - [`limiter`]: minimum-interval request limiter
//! - [`client`]: key-guarded, rate-limited backend access
//! - [`pipeline`]: end-to-end story generation
//! - [`config`]: TOML extraction configuration

pub mod align;
pub mod client;
pub mod config;
pub mod input;
pub mod limiter;
pub mod normalize;
pub mod pipeline;
pub mod sanitize;

pub use align::locate;
pub use client::{
    BackendError, ExtractError, ExtractionBackend, ExtractionClient, ExtractionRequest, Language,
};
pub use config::{ConfigError, ExtractorConfig, DEFAULT_MODEL_ID};
pub use input::{ExtractedCharacter, ExtractedConnection, ExtractedData, ExtractedEvent};
pub use limiter::RateLimiter;
pub use normalize::{NormalizeReport, Normalized, Normalizer, UNKNOWN_CHARACTER_ID};
pub use pipeline::{generate_story, GenerateError};
pub use sanitize::{extract_payload, parse_response, sanitize, ParseError, DEFAULT_DIAGNOSTIC_WINDOW};
