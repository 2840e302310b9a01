//! Story generation: narrative text in, published story out.

use plot_core::TimelineStore;

use crate::client::{ExtractError, ExtractionBackend, ExtractionClient, Language};
use crate::normalize::{NormalizeReport, Normalizer};

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("narrative text is empty")]
    EmptyNarrative,
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Extracts a timeline from the store's narrative text, normalizes it
/// against the current story and publishes the result through
/// [`TimelineStore::set_story`].
///
/// On any failure the store is left untouched.
pub async fn generate_story<B: ExtractionBackend>(
    client: &mut ExtractionClient<B>,
    normalizer: &Normalizer,
    store: &mut TimelineStore,
    language: Language,
) -> Result<NormalizeReport, GenerateError> {
    let text = store
        .story()
        .narrative
        .as_ref()
        .map(|n| n.text.clone())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(GenerateError::EmptyNarrative);
    }

    let data = client.extract(&text, language).await?;
    let normalized = normalizer.normalize(&data, &text, store.story());
    tracing::info!(
        "Generated story with {} characters, {} events, {} connections",
        normalized.story.characters.len(),
        normalized.story.events.len(),
        normalized.story.connections.len()
    );
    store.set_story(normalized.story);
    Ok(normalized.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{BackendError, ExtractionRequest};
    use crate::config::ExtractorConfig;
    use std::future::Future;

    struct Canned(&'static str);

    impl ExtractionBackend for Canned {
        fn generate(
            &self,
            _request: ExtractionRequest,
        ) -> impl Future<Output = Result<String, BackendError>> + Send {
            let reply = self.0.to_string();
            async move { Ok(reply) }
        }
    }

    fn client(reply: &'static str) -> ExtractionClient<Canned> {
        let mut client = ExtractionClient::new(Canned(reply), &ExtractorConfig::default());
        client.set_api_key("key");
        client
    }

    #[tokio::test]
    async fn test_empty_narrative_rejected() {
        let mut store = TimelineStore::default();
        store.update_narrative("   \n");
        let before = store.story().clone();

        let err = generate_story(&mut client("{}"), &Normalizer::default(), &mut store, Language::Ja)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::EmptyNarrative));
        assert_eq!(store.story(), &before);
    }

    #[tokio::test]
    async fn test_publishes_story() {
        let mut store = TimelineStore::default();
        store.update_narrative("Ada woke.");

        let reply = r#"{"characters": [{"name": "Ada"}], "events": [{"who": "Ada", "what": "wakes", "source_text": "Ada woke."}]}"#;
        let report = generate_story(&mut client(reply), &Normalizer::default(), &mut store, Language::En)
            .await
            .unwrap();

        assert!(report.is_clean());
        let story = store.story();
        assert_eq!(story.id, "new-story");
        assert_eq!(story.events.len(), 1);
        assert_eq!(story.narrative.as_ref().unwrap().sections.len(), 1);
        assert!(store.can_undo());
    }

    #[tokio::test]
    async fn test_extract_failure_leaves_store() {
        let mut store = TimelineStore::default();
        store.update_narrative("Ada woke.");
        let before = store.story().clone();

        let err = generate_story(&mut client("no json here"), &Normalizer::default(), &mut store, Language::Ja)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Extract(ExtractError::Parse(_))));
        assert_eq!(store.story(), &before);
    }
}
