use crate::core::config::Config;
use crate::core::io::Storage;
use crate::core::layout::AssetLayout;
use crate::services::assets::AssetGenerator;
use crate::services::extractor::SceneExtractor;
use crate::services::image::ImageClient;
use crate::services::llm::LlmClient;
use crate::services::tts::TtsClient;
use crate::services::video::{MediaBackend, VideoAssembler};
use anyhow::{anyhow, Result};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const FAILURE_MESSAGE: &str = "Failed to generate video.";

/// Runs title → scenes → images → audio → video, stopping at the first
/// failed step.
pub struct WorkflowManager {
    config: Config,
    layout: AssetLayout,
    llm: Box<dyn LlmClient>,
    images: Box<dyn ImageClient>,
    tts: Box<dyn TtsClient>,
    media: Box<dyn MediaBackend>,
    storage: Arc<dyn Storage>,
}

impl WorkflowManager {
    pub fn new(
        config: Config,
        llm: Box<dyn LlmClient>,
        images: Box<dyn ImageClient>,
        tts: Box<dyn TtsClient>,
        media: Box<dyn MediaBackend>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let layout = config.layout();
        Self {
            config,
            layout,
            llm,
            images,
            tts,
            media,
            storage,
        }
    }

    /// Writes the video to the configured output path.
    pub async fn run(&self, book_title: &str, num_scenes: usize) -> Result<PathBuf> {
        let output = PathBuf::from(&self.config.output_video);
        self.run_to(book_title, num_scenes, &output).await
    }

    /// Every failure surfaces as the same error; the cause is only logged.
    pub async fn run_to(
        &self,
        book_title: &str,
        num_scenes: usize,
        output: &Path,
    ) -> Result<PathBuf> {
        match self.generate(book_title, num_scenes, output).await {
            Ok(Some(path)) => Ok(path),
            Ok(None) => Err(anyhow!(FAILURE_MESSAGE)),
            Err(e) => {
                error!("Pipeline aborted: {:#}", e);
                Err(anyhow!(FAILURE_MESSAGE))
            }
        }
    }

    async fn generate(
        &self,
        book_title: &str,
        num_scenes: usize,
        output: &Path,
    ) -> Result<Option<PathBuf>> {
        info!("Step 1/4: Generating scenes...");
        let extractor = SceneExtractor::new(self.llm.as_ref());
        let Some(book) = extractor.extract(book_title, num_scenes).await? else {
            error!("Failed to generate scenes for '{}'", book_title);
            return Ok(None);
        };

        let generator = AssetGenerator::new(
            self.images.as_ref(),
            self.tts.as_ref(),
            self.storage.as_ref(),
            &self.layout,
        );

        info!("Step 2/4: Generating images for {} scenes...", book.len());
        generator.generate_images(&book, &self.config.image.size).await?;

        info!("Step 3/4: Generating speech...");
        generator.generate_audio(&book, &self.config.audio.language).await?;

        info!("Step 4/4: Assembling final video...");
        let assembler = VideoAssembler::new(
            self.media.as_ref(),
            self.storage.as_ref(),
            &self.layout,
            &self.config.video,
            &self.config.temp_video,
        );
        Ok(assembler.create_video(&book, output).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::NativeStorage;
    use crate::services::assets::tests::{MockImageClient, MockTtsClient};
    use crate::services::video::tests::MockMedia;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const TWO_SCENES: &str = r#"Here is the breakdown you asked for.
```json
{
  "scenes": [
    {"scene_number": 1, "explainer": "On the desert planet Arrakis, young Paul Atreides arrives with his family to take control of spice production.", "image_prompt": "A vast golden desert under two moons with a great palace"},
    {"scene_number": 2, "explainer": "Betrayed and hunted, Paul and his mother flee into the deep desert and are taken in by the Fremen.", "image_prompt": "Two robed figures walking across dunes toward a sietch"}
  ]
}
```"#;

    #[derive(Debug)]
    struct MockLlmClient {
        reply: String,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockLlmClient {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                call_count: Arc::new(Mutex::new(0)),
            }
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn chat(&self, _system: &str, _user: &str) -> Result<String> {
            *self.call_count.lock().unwrap() += 1;
            Ok(self.reply.clone())
        }
    }

    fn test_config(root: &Path) -> Config {
        Config {
            image_folder: root.join("scene_images").to_string_lossy().to_string(),
            audio_folder: root.join("scene_audio").to_string_lossy().to_string(),
            output_video: root
                .join("static/generated_videos/final_video.mp4")
                .to_string_lossy()
                .to_string(),
            temp_video: root.join("temp_video.mp4").to_string_lossy().to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_two_scenes() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let config = test_config(temp_dir.path());

        let images = MockImageClient::default();
        let image_calls = images.calls.clone();
        let tts = MockTtsClient::default();
        let tts_calls = tts.calls.clone();
        let media = MockMedia::default();
        let composed = media.composed.clone();

        let workflow = WorkflowManager::new(
            config.clone(),
            Box::new(MockLlmClient::new(TWO_SCENES)),
            Box::new(images),
            Box::new(tts),
            Box::new(media),
            Arc::new(NativeStorage::new()),
        );

        let path = workflow.run("Dune", 2).await?;

        assert_eq!(path, PathBuf::from(&config.output_video));
        assert!(path.exists());
        assert_eq!(*composed.lock().unwrap(), vec![vec![1, 2]]);
        assert_eq!(image_calls.lock().unwrap().len(), 2);
        assert_eq!(tts_calls.lock().unwrap().len(), 2);

        let layout = config.layout();
        assert!(layout.image_path(1).exists());
        assert!(layout.audio_path(2).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_unparseable_scenes_stop_before_assets() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let config = test_config(temp_dir.path());

        let images = MockImageClient::default();
        let image_calls = images.calls.clone();
        let media = MockMedia::default();
        let reencodes = media.reencode_calls.clone();

        let workflow = WorkflowManager::new(
            config,
            Box::new(MockLlmClient::new("Sorry, I don't know that book.")),
            Box::new(images),
            Box::new(MockTtsClient::default()),
            Box::new(media),
            Arc::new(NativeStorage::new()),
        );

        let err = workflow.run("Unknown Book", 2).await.unwrap_err();

        assert_eq!(err.to_string(), FAILURE_MESSAGE);
        assert!(image_calls.lock().unwrap().is_empty());
        assert_eq!(*reencodes.lock().unwrap(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_speech_failure_aborts_without_video() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let config = test_config(temp_dir.path());

        let media = MockMedia::default();
        let composed = media.composed.clone();

        let workflow = WorkflowManager::new(
            config.clone(),
            Box::new(MockLlmClient::new(TWO_SCENES)),
            Box::new(MockImageClient::default()),
            Box::new(MockTtsClient {
                should_fail: true,
                ..Default::default()
            }),
            Box::new(media),
            Arc::new(NativeStorage::new()),
        );

        let err = workflow.run("Dune", 2).await.unwrap_err();

        assert_eq!(err.to_string(), FAILURE_MESSAGE);
        assert!(composed.lock().unwrap().is_empty());
        assert!(!Path::new(&config.output_video).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_encoder_failure_is_generic_failure() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let config = test_config(temp_dir.path());

        let workflow = WorkflowManager::new(
            config.clone(),
            Box::new(MockLlmClient::new(TWO_SCENES)),
            Box::new(MockImageClient::default()),
            Box::new(MockTtsClient::default()),
            Box::new(MockMedia {
                fail_reencode: true,
                ..Default::default()
            }),
            Arc::new(NativeStorage::new()),
        );

        let other_output = temp_dir.path().join("elsewhere.mp4");
        let err = workflow.run_to("Dune", 2, &other_output).await.unwrap_err();

        assert_eq!(err.to_string(), FAILURE_MESSAGE);
        assert!(!other_output.exists());
        Ok(())
    }
}
