use crate::core::config::VideoConfig;
use crate::core::io::Storage;
use crate::core::layout::AssetLayout;
use crate::core::scene::BookScenes;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{error, info, warn};
use std::path::{Path, PathBuf};

/// One scene's image shown for as long as its narration plays.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub scene_number: usize,
    pub image: PathBuf,
    pub audio: PathBuf,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Length of an audio file in seconds.
    async fn audio_duration(&self, audio: &Path) -> Result<f64>;

    /// `(width, height)` of an image in pixels.
    async fn image_dimensions(&self, image: &Path) -> Result<(u32, u32)>;

    /// Renders `clips` in order, each centered on a `canvas` sized frame,
    /// and writes them as one video to `output`.
    async fn compose(
        &self,
        clips: &[Clip],
        canvas: (u32, u32),
        fps: u32,
        audio_codec: &str,
        output: &Path,
    ) -> Result<()>;

    /// Re-encodes `input` into `output` with the fixed compatibility codecs.
    async fn reencode(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Smallest frame every clip fits on, rounded up to even sides for yuv420p.
pub fn composed_canvas(clips: &[Clip]) -> (u32, u32) {
    let width = clips.iter().map(|c| c.width).max().unwrap_or(0);
    let height = clips.iter().map(|c| c.height).max().unwrap_or(0);
    (round_up_even(width), round_up_even(height))
}

fn round_up_even(v: u32) -> u32 {
    v + (v % 2)
}

pub struct VideoAssembler<'a> {
    media: &'a dyn MediaBackend,
    storage: &'a dyn Storage,
    layout: &'a AssetLayout,
    settings: &'a VideoConfig,
    temp_video: PathBuf,
}

impl<'a> VideoAssembler<'a> {
    pub fn new(
        media: &'a dyn MediaBackend,
        storage: &'a dyn Storage,
        layout: &'a AssetLayout,
        settings: &'a VideoConfig,
        temp_video: impl Into<PathBuf>,
    ) -> Self {
        Self {
            media,
            storage,
            layout,
            settings,
            temp_video: temp_video.into(),
        }
    }

    /// Builds the final video at `output`. Errors are logged, not returned.
    pub async fn create_video(&self, book: &BookScenes, output: &Path) -> Option<PathBuf> {
        match self.try_create_video(book, output).await {
            Ok(path) => path,
            Err(e) => {
                error!("Video assembly failed: {:#}", e);
                None
            }
        }
    }

    async fn try_create_video(
        &self,
        book: &BookScenes,
        output: &Path,
    ) -> Result<Option<PathBuf>> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                self.storage.create_dir_all(parent).await?;
            }
        }

        let clips = self.collect_clips(book).await?;
        if clips.is_empty() {
            error!("No clips were created, unable to generate video.");
            return Ok(None);
        }

        let canvas = composed_canvas(&clips);
        info!(
            "Composing {} clips on a {}x{} canvas at {} fps",
            clips.len(),
            canvas.0,
            canvas.1,
            self.settings.fps
        );
        self.media
            .compose(
                &clips,
                canvas,
                self.settings.fps,
                &self.settings.audio_codec,
                &self.temp_video,
            )
            .await?;
        info!("Intermediate video written to {}", self.temp_video.display());

        match self.media.reencode(&self.temp_video, output).await {
            Ok(()) => {
                info!("Re-encoded video saved as {}", output.display());
                Ok(Some(output.to_path_buf()))
            }
            Err(e) => {
                error!("Error during re-encoding: {:#}", e);
                // A failed encode can leave a truncated container behind.
                if let Err(e) = self.storage.delete(output).await {
                    warn!("Failed to remove partial video {}: {:#}", output.display(), e);
                }
                Ok(None)
            }
        }
    }

    /// Clips for every scene whose image and audio both exist, in scene order.
    pub async fn collect_clips(&self, book: &BookScenes) -> Result<Vec<Clip>> {
        let mut clips = Vec::with_capacity(book.len());
        let mut dropped = Vec::new();

        for scene in book.scenes() {
            let number = scene.scene_number();
            let image = self.layout.image_path(number);
            let audio = self.layout.audio_path(number);

            if !(self.storage.exists(&image).await? && self.storage.exists(&audio).await?) {
                warn!("Missing image or audio for scene {}", number);
                dropped.push(number);
                continue;
            }

            let duration = self.media.audio_duration(&audio).await?;
            let (width, height) = self.media.image_dimensions(&image).await?;
            clips.push(Clip {
                scene_number: number,
                image,
                audio,
                duration,
                width,
                height,
            });
        }

        if !dropped.is_empty() {
            warn!(
                "Dropped {} of {} scenes from the video: {:?}",
                dropped.len(),
                book.len(),
                dropped
            );
            if self.settings.strict_assets {
                return Err(anyhow!("Scenes {:?} are missing assets", dropped));
            }
        }

        Ok(clips)
    }
}
