use crate::core::config::{resolve_api_key, Config};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod ollama;
pub mod openai;

#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    async fn chat(&self, system: &str, user: &str) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String, // "openai" or "ollama"
    pub openai: Option<OpenAIConfig>,
    pub ollama: Option<OllamaConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OpenAIConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            openai: None,
            ollama: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_openai_model() -> String {
    "gpt-4".to_string()
}
fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

pub fn create_llm(config: &Config) -> Result<Box<dyn LlmClient>> {
    match config.llm.provider.as_str() {
        "openai" => {
            let cfg = config.llm.openai.clone().unwrap_or_else(|| OpenAIConfig {
                model: default_openai_model(),
                ..Default::default()
            });
            let api_key = resolve_api_key(cfg.api_key.as_deref())?;
            Ok(Box::new(openai::OpenAIClient::new(
                &api_key,
                &cfg.model,
                cfg.base_url.as_deref(),
            )))
        }
        "ollama" => {
            let cfg = config.llm.ollama.as_ref().context("Ollama config missing")?;
            Ok(Box::new(ollama::OllamaClient::new(&cfg.base_url, &cfg.model)))
        }
        _ => Err(anyhow!("Unknown LLM provider: {}", config.llm.provider)),
    }
}

/// Message shape shared by the OpenAI and Ollama chat endpoints.
#[derive(Serialize, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

fn chat_messages(system: &str, user: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: system.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: user.to_string(),
        },
    ]
}
