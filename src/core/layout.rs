use std::path::{Path, PathBuf};

/// Where each scene's assets live. The asset generator writes these paths
/// and the video assembler reads them back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    image_folder: PathBuf,
    audio_folder: PathBuf,
}

impl AssetLayout {
    pub fn new(image_folder: impl AsRef<Path>, audio_folder: impl AsRef<Path>) -> Self {
        Self {
            image_folder: image_folder.as_ref().to_path_buf(),
            audio_folder: audio_folder.as_ref().to_path_buf(),
        }
    }

    pub fn image_folder(&self) -> &Path {
        &self.image_folder
    }

    pub fn audio_folder(&self) -> &Path {
        &self.audio_folder
    }

    pub fn image_path(&self, scene_number: usize) -> PathBuf {
        self.image_folder.join(format!("scene_{}.png", scene_number))
    }

    pub fn audio_path(&self, scene_number: usize) -> PathBuf {
        self.audio_folder.join(format!("scene_{}.mp3", scene_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_keyed_by_scene_number() {
        let layout = AssetLayout::new("scene_images", "scene_audio");
        assert_eq!(layout.image_path(3), Path::new("scene_images/scene_3.png"));
        assert_eq!(layout.audio_path(12), Path::new("scene_audio/scene_12.mp3"));
    }
}
