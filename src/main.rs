use anyhow::Result;
use book2video::core::config::Config;
use book2video::core::io::NativeStorage;
use book2video::services::image::create_image_client;
use book2video::services::llm::create_llm;
use book2video::services::setup;
use book2video::services::tts::create_tts_client;
use book2video::services::workflow::WorkflowManager;
use book2video::utils::ffmpeg::FfmpegBackend;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load config (defaults when config.yml is absent)
    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            return Err(e);
        }
    };
    config.ensure_directories()?;

    // 2. Title and scene count
    let request = setup::collect_request(&config, std::env::args().skip(1))?;

    // 3. Capabilities
    let llm = create_llm(&config)?;
    let images = create_image_client(&config)?;
    let tts = create_tts_client(&config)?;
    let media = Box::new(FfmpegBackend::new(&config.video));
    let storage = Arc::new(NativeStorage::new());

    // 4. Run
    let manager = WorkflowManager::new(config, llm, images, tts, media, storage);
    match manager.run(&request.book_title, request.num_scenes).await {
        Ok(path) => {
            println!("Video ready: {}", path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
