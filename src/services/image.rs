use crate::core::config::{resolve_api_key, Config};
use crate::services::llm::openai::DEFAULT_BASE_URL;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_size")]
    pub size: String,
    pub openai: Option<OpenAIImageConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OpenAIImageConfig {
    pub api_key: Option<String>,
    /// Left unset, the service picks its default model.
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            size: default_size(),
            openai: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_size() -> String {
    "1024x1024".to_string()
}

#[async_trait]
pub trait ImageClient: Send + Sync {
    /// Requests one image and returns the URL it can be fetched from.
    async fn generate(&self, prompt: &str, size: &str) -> Result<String>;

    /// Fetches the image bytes behind a URL returned by `generate`.
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        fetch_url(&reqwest::Client::new(), url).await
    }
}

/// Reads `file://` URLs from disk and fetches everything else over HTTP.
pub async fn fetch_url(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid image URL: {}", url))?;

    if parsed.scheme() == "file" {
        let path = parsed
            .to_file_path()
            .map_err(|_| anyhow!("Invalid file URL: {}", url))?;
        return tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let resp = client.get(parsed).send().await?;
    if !resp.status().is_success() {
        return Err(anyhow!("Image download failed ({}): {}", resp.status(), url));
    }
    Ok(resp.bytes().await?.to_vec())
}

pub fn create_image_client(config: &Config) -> Result<Box<dyn ImageClient>> {
    match config.image.provider.as_str() {
        "openai" => {
            let cfg = config.image.openai.clone().unwrap_or_default();
            let configured_key = cfg
                .api_key
                .as_deref()
                .or_else(|| config.llm.openai.as_ref().and_then(|o| o.api_key.as_deref()));
            let api_key = resolve_api_key(configured_key)?;
            Ok(Box::new(OpenAIImageClient::new(
                &api_key,
                cfg.model.as_deref(),
                cfg.base_url.as_deref(),
            )))
        }
        _ => Err(anyhow!("Unknown image provider: {}", config.image.provider)),
    }
}

pub struct OpenAIImageClient {
    api_key: String,
    model: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIImageClient {
    pub fn new(api_key: &str, model: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.map(str::to_string),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

fn first_url(response: ImageResponse) -> Result<String> {
    response
        .data
        .into_iter()
        .find_map(|d| d.url)
        .ok_or_else(|| anyhow!("Image response contained no URL"))
}

#[async_trait]
impl ImageClient for OpenAIImageClient {
    async fn generate(&self, prompt: &str, size: &str) -> Result<String> {
        let url = format!("{}/images/generations", self.base_url);
        debug!("POST {} ({})", url, size);

        let request_body = ImageRequest {
            model: self.model.as_deref(),
            prompt,
            n: 1,
            size,
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Image generation API error: {}", error_text));
        }

        let result: ImageResponse = resp.json().await?;
        first_url(result)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        fetch_url(&self.client, url).await
    }
}
