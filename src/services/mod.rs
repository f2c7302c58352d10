pub mod assets;
pub mod extractor;
pub mod image;
pub mod llm;
pub mod setup;
pub mod tts;
pub mod video;
pub mod workflow;
