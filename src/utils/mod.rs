pub mod audio;
pub mod ffmpeg;
pub mod json;
