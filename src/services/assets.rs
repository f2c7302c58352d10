use crate::core::io::Storage;
use crate::core::layout::AssetLayout;
use crate::core::scene::BookScenes;
use crate::services::image::ImageClient;
use crate::services::tts::TtsClient;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

/// Produces the per-scene image and audio files. Every call is awaited in
/// scene order and the first error aborts the step.
pub struct AssetGenerator<'a> {
    images: &'a dyn ImageClient,
    tts: &'a dyn TtsClient,
    storage: &'a dyn Storage,
    layout: &'a AssetLayout,
}

impl<'a> AssetGenerator<'a> {
    pub fn new(
        images: &'a dyn ImageClient,
        tts: &'a dyn TtsClient,
        storage: &'a dyn Storage,
        layout: &'a AssetLayout,
    ) -> Self {
        Self {
            images,
            tts,
            storage,
            layout,
        }
    }

    pub async fn generate_images(&self, book: &BookScenes, size: &str) -> Result<()> {
        self.storage.create_dir_all(self.layout.image_folder()).await?;
        let pb = progress_bar(book.len())?;

        for scene in book.scenes() {
            let number = scene.scene_number();
            let url = self
                .images
                .generate(scene.image_prompt(), size)
                .await
                .with_context(|| format!("Image generation failed for scene {}", number))?;
            let data = self
                .images
                .download(&url)
                .await
                .with_context(|| format!("Image download failed for scene {}", number))?;

            let path = self.layout.image_path(number);
            self.storage.write(&path, &data).await?;
            pb.inc(1);
            info!("Image saved as {}", path.display());
        }

        pb.finish_with_message("Images complete");
        Ok(())
    }

    pub async fn generate_audio(&self, book: &BookScenes, language: &str) -> Result<()> {
        self.storage.create_dir_all(self.layout.audio_folder()).await?;
        let pb = progress_bar(book.len())?;

        for scene in book.scenes() {
            let number = scene.scene_number();
            let data = self
                .tts
                .synthesize(scene.explainer(), language)
                .await
                .with_context(|| format!("Speech synthesis failed for scene {}", number))?;

            let path = self.layout.audio_path(number);
            self.storage.write(&path, &data).await?;
            pb.inc(1);
            info!("Audio saved as {}", path.display());
        }

        pb.finish_with_message("Audio complete");
        Ok(())
    }
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
