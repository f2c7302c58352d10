use crate::core::config::Config;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;

pub mod edge;
pub mod google;

#[async_trait]
pub trait TtsClient: Send + Sync {
    /// Narrates `text` in `language` and returns the encoded audio.
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;
}

pub fn create_tts_client(config: &Config) -> Result<Box<dyn TtsClient>> {
    info!("Initializing TTS Client for provider: {}", config.audio.provider);
    match config.audio.provider.as_str() {
        "google" => Ok(Box::new(google::GoogleTtsClient::new())),
        "edge-tts" => {
            let edge_config = config.audio.edge_tts.clone().unwrap_or_default();
            Ok(Box::new(edge::EdgeTtsClient::new(edge_config)))
        }
        _ => Err(anyhow!("Unknown TTS provider: {}", config.audio.provider)),
    }
}
