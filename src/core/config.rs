use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::layout::AssetLayout;
use crate::services::image::ImageConfig;
use crate::services::llm::LlmConfig;
use crate::services::tts::edge::EdgeTtsConfig;

pub const CONFIG_PATH_ENV: &str = "BOOK2VIDEO_CONFIG";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_CONFIG_PATH: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_image_folder")]
    pub image_folder: String,

    #[serde(default = "default_audio_folder")]
    pub audio_folder: String,

    #[serde(default = "default_output_video")]
    pub output_video: String,

    #[serde(default = "default_temp_video")]
    pub temp_video: String,

    #[serde(default)]
    pub unattended: bool,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub video: VideoConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_tts_provider")]
    pub provider: String, // "google" or "edge-tts"
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(rename = "edge-tts")]
    pub edge_tts: Option<EdgeTtsConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VideoConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    /// Fail instead of dropping scenes whose image or audio is missing.
    #[serde(default)]
    pub strict_assets: bool,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_folder: default_image_folder(),
            audio_folder: default_audio_folder(),
            output_video: default_output_video(),
            temp_video: default_temp_video(),
            unattended: false,
            llm: LlmConfig::default(),
            image: ImageConfig::default(),
            audio: AudioConfig::default(),
            video: VideoConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            provider: default_tts_provider(),
            language: default_language(),
            edge_tts: None,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            audio_codec: default_audio_codec(),
            video_codec: default_video_codec(),
            strict_assets: false,
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

fn default_image_folder() -> String {
    "scene_images".to_string()
}
fn default_audio_folder() -> String {
    "scene_audio".to_string()
}
fn default_output_video() -> String {
    "static/generated_videos/final_video.mp4".to_string()
}
fn default_temp_video() -> String {
    "temp_video.mp4".to_string()
}
fn default_tts_provider() -> String {
    "google".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_fps() -> u32 {
    24
}
fn default_audio_codec() -> String {
    "aac".to_string()
}
fn default_video_codec() -> String {
    "libx264".to_string()
}
fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}
fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Config {
    /// Loads `config.yml` (or the file named by `BOOK2VIDEO_CONFIG`).
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found, using default configuration", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.image_folder)?;
        fs::create_dir_all(&self.audio_folder)?;
        Ok(())
    }

    pub fn layout(&self) -> AssetLayout {
        AssetLayout::new(&self.image_folder, &self.audio_folder)
    }
}

/// Uses the configured key if present, otherwise `OPENAI_API_KEY`.
pub fn resolve_api_key(configured: Option<&str>) -> Result<String> {
    if let Some(key) = configured.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }
    std::env::var(OPENAI_API_KEY_ENV).map_err(|_| {
        anyhow!(
            "No API key configured. Set it in config.yml or via the {} environment variable",
            OPENAI_API_KEY_ENV
        )
    })
}
