use super::TtsClient;
use crate::utils::audio::{merge_mp3_chunks, split_text};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use log::debug;
use url::Url;

const TRANSLATE_TTS_URL: &str = "https://translate.google.com/translate_tts";
/// Longest text the endpoint accepts per request.
const MAX_CHUNK_CHARS: usize = 100;

/// Google Translate's speech endpoint. Long narration is split into chunks
/// whose MP3 replies are joined in order.
pub struct GoogleTtsClient {
    client: reqwest::Client,
}

impl GoogleTtsClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for GoogleTtsClient {
    fn default() -> Self {
        Self::new()
    }
}

fn chunk_url(chunk: &str, language: &str, idx: usize, total: usize) -> Result<Url> {
    let total = total.to_string();
    let idx = idx.to_string();
    let textlen = chunk.chars().count().to_string();
    let url = Url::parse_with_params(
        TRANSLATE_TTS_URL,
        [
            ("ie", "UTF-8"),
            ("client", "tw-ob"),
            ("q", chunk),
            ("tl", language),
            ("total", total.as_str()),
            ("idx", idx.as_str()),
            ("textlen", textlen.as_str()),
        ],
    )?;
    Ok(url)
}

#[async_trait]
impl TtsClient for GoogleTtsClient {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            bail!("Nothing to synthesize");
        }

        let mut audio = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            let url = chunk_url(chunk, language, idx, chunks.len())?;
            debug!("Requesting TTS chunk {}/{}", idx + 1, chunks.len());

            let resp = self
                .client
                .get(url)
                .header("User-Agent", "Mozilla/5.0")
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(anyhow!("Google TTS error: {}", resp.status()));
            }
            audio.push(resp.bytes().await?.to_vec());
        }

        Ok(merge_mp3_chunks(&audio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_url_encodes_text() {
        let url = chunk_url("Paul & the Fremen?", "en", 0, 2).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("q".to_string(), "Paul & the Fremen?".to_string())));
        assert!(pairs.contains(&("tl".to_string(), "en".to_string())));
        assert!(pairs.contains(&("total".to_string(), "2".to_string())));
        assert!(pairs.contains(&("textlen".to_string(), "18".to_string())));
        assert_eq!(url.host_str(), Some("translate.google.com"));
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let client = GoogleTtsClient::new();
        assert!(client.synthesize("   ", "en").await.is_err());
    }
}
