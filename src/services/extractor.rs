use crate::core::scene::BookScenes;
use crate::services::llm::LlmClient;
use crate::utils::json::find_json_object;
use anyhow::Result;
use log::{debug, error, info};
use serde::Deserialize;

const SYSTEM_PROMPT: &str = "You are a helpful assistant and an amazing storyteller with the ability to break down books into explainers.";

#[derive(Deserialize)]
struct SceneReply {
    #[serde(default)]
    scenes: Vec<SceneEntry>,
}

// `scene_number` from the model is ignored; scenes are renumbered by position.
#[derive(Deserialize)]
struct SceneEntry {
    explainer: String,
    image_prompt: String,
}

/// Asks the language model for a book's scenes and turns the reply into
/// `BookScenes`.
pub struct SceneExtractor<'a> {
    llm: &'a dyn LlmClient,
}

impl<'a> SceneExtractor<'a> {
    pub fn new(llm: &'a dyn LlmClient) -> Self {
        Self { llm }
    }

    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    pub fn user_prompt(&self, book_title: &str, num_scenes: usize) -> String {
        format!(
            "Divide the book '{}' into {} key scenes. For each scene, provide a summary (50-100 words of narration) and an image prompt describing the visual setting. Return the response in valid JSON format with 'scene_number', 'explainer', and 'image_prompt' as fields.",
            book_title, num_scenes
        )
    }

    /// `Ok(None)` when the reply holds no usable scenes. Errors only come
    /// from the language model call itself.
    pub async fn extract(&self, book_title: &str, num_scenes: usize) -> Result<Option<BookScenes>> {
        info!("Requesting {} scenes for '{}'", num_scenes, book_title);
        let prompt = self.user_prompt(book_title, num_scenes);
        let reply = self.llm.chat(self.system_prompt(), &prompt).await?;
        debug!("Model reply: {}", reply);

        let book = parse_scenes(book_title, &reply);
        if let Some(book) = &book {
            info!("Extracted {} scenes", book.len());
        }
        Ok(book)
    }
}

/// Parses the first JSON object in `reply` into scenes.
pub fn parse_scenes(book_title: &str, reply: &str) -> Option<BookScenes> {
    let Some(block) = find_json_object(reply) else {
        error!("Error: No valid JSON found in the response.");
        return None;
    };

    let parsed: SceneReply = match serde_json::from_str(block) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Error parsing JSON: {}", e);
            return None;
        }
    };

    if parsed.scenes.is_empty() {
        error!("Error: The response contained no scenes.");
        return None;
    }

    let book = BookScenes::from_parts(
        book_title,
        parsed
            .scenes
            .into_iter()
            .map(|s| (s.explainer, s.image_prompt)),
    );
    if book.is_none() {
        error!("Error: A scene has an empty explainer or image prompt.");
    }
    book
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct MockLlmClient {
        reply: String,
        prompts: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl MockLlmClient {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn chat(&self, system: &str, user: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            Ok(self.reply.clone())
        }
    }

    #[derive(Debug)]
    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn chat(&self, _: &str, _: &str) -> Result<String> {
            Err(anyhow::anyhow!("OpenAI API error: rate limited"))
        }
    }

    #[test]
    fn test_scenes_renumbered_by_position() {
        let reply = r#"Here you go:
{
  "scenes": [
    {"scene_number": 7, "explainer": "Paul arrives on Arrakis.", "image_prompt": "A desert palace"},
    {"scene_number": 7, "explainer": "The Harkonnens attack.", "image_prompt": "Night raid"},
    {"explainer": "Paul rides a sandworm.", "image_prompt": "Giant worm"}
  ]
}
Let me know if you need more."#;

        let book = parse_scenes("Dune", reply).unwrap();
        let numbers: Vec<usize> = book.scenes().iter().map(|s| s.scene_number()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(book.book_title(), "Dune");
        assert_eq!(book.scenes()[2].image_prompt(), "Giant worm");
    }

    #[test]
    fn test_braces_in_narration_do_not_truncate() {
        let reply = r#"{"scenes": [{"scene_number": 1, "explainer": "A note reads {beware}.", "image_prompt": "Parchment"}]} PS: {not json}"#;
        let book = parse_scenes("Dune", reply).unwrap();
        assert_eq!(book.scenes()[0].explainer(), "A note reads {beware}.");
    }

    #[test]
    fn test_no_brace_block() {
        assert!(parse_scenes("Dune", "I'm sorry, I can't do that.").is_none());
    }

    #[test]
    fn test_malformed_block() {
        assert!(parse_scenes("Dune", "{\"scenes\": [ {\"explainer\": } ]}").is_none());
        assert!(parse_scenes("Dune", "{\"scenes\": \"two\"}").is_none());
    }

    #[test]
    fn test_empty_or_missing_scenes() {
        assert!(parse_scenes("Dune", "{\"scenes\": []}").is_none());
        assert!(parse_scenes("Dune", "{\"book\": \"Dune\"}").is_none());
    }

    #[test]
    fn test_scene_missing_field() {
        let reply = r#"{"scenes": [{"scene_number": 1, "explainer": "Only narration"}]}"#;
        assert!(parse_scenes("Dune", reply).is_none());
    }

    #[tokio::test]
    async fn test_extract_sends_title_and_count() -> Result<()> {
        let llm = MockLlmClient::new(
            r#"{"scenes": [{"scene_number": 1, "explainer": "E", "image_prompt": "P"}]}"#,
        );
        let extractor = SceneExtractor::new(&llm);

        let book = extractor.extract("Dune", 4).await?;
        assert_eq!(book.map(|b| b.len()), Some(1));

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].0, SYSTEM_PROMPT);
        assert!(prompts[0].1.contains("'Dune' into 4 key scenes"));
        assert!(prompts[0].1.contains("'scene_number', 'explainer', and 'image_prompt'"));
        Ok(())
    }

    #[tokio::test]
    async fn test_extract_unusable_reply_is_none() -> Result<()> {
        let llm = MockLlmClient::new("No JSON here.");
        let extractor = SceneExtractor::new(&llm);
        assert!(extractor.extract("Dune", 2).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_extract_propagates_model_errors() {
        let extractor = SceneExtractor::new(&FailingLlm);
        assert!(extractor.extract("Dune", 2).await.is_err());
    }
}
