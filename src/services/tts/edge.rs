use super::TtsClient;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct EdgeTtsConfig {
    /// Voice short name, e.g. `en-US-AriaNeural`. Picked from the language
    /// when unset.
    pub voice: Option<String>,
}

pub struct EdgeTtsClient {
    config: EdgeTtsConfig,
}

impl EdgeTtsClient {
    pub fn new(config: EdgeTtsConfig) -> Self {
        Self { config }
    }

    fn resolve_voice(&self, language: &str) -> String {
        self.config
            .voice
            .clone()
            .unwrap_or_else(|| default_voice(language).to_string())
    }
}

fn default_voice(language: &str) -> &'static str {
    let lang = language.split(['-', '_']).next().unwrap_or_default();
    match lang.to_ascii_lowercase().as_str() {
        "zh" => "zh-TW-HsiaoChenNeural",
        "ja" => "ja-JP-NanamiNeural",
        "de" => "de-DE-KatjaNeural",
        "fr" => "fr-FR-DeniseNeural",
        "es" => "es-ES-ElviraNeural",
        _ => "en-US-AriaNeural",
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn build_ssml(voice: &str, language: &str, text: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        escape_xml(language),
        escape_xml(voice),
        escape_xml(text)
    )
}

#[async_trait]
impl TtsClient for EdgeTtsClient {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let voice = self.resolve_voice(language);
        let ssml = build_ssml(&voice, language, text);

        tokio::task::spawn_blocking(move || {
            edge_tts::request_audio(&ssml, OUTPUT_FORMAT)
                .map_err(|e| anyhow!("Edge TTS crate error: {:?}", e))
        })
        .await?
    }
}
