use serde::{Deserialize, Serialize};

/// One narrated unit of the final video.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Scene {
    scene_number: usize,
    explainer: String,
    image_prompt: String,
}

impl Scene {
    pub fn scene_number(&self) -> usize {
        self.scene_number
    }

    /// Narration text.
    pub fn explainer(&self) -> &str {
        &self.explainer
    }

    pub fn image_prompt(&self) -> &str {
        &self.image_prompt
    }
}

/// The ordered scenes of one title. Always holds at least one scene,
/// numbered 1..=len in order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BookScenes {
    book_title: String,
    scenes: Vec<Scene>,
}

impl BookScenes {
    /// Builds from `(explainer, image_prompt)` pairs, numbering them by
    /// position. Returns `None` when `parts` is empty or any text is blank.
    pub fn from_parts<I>(book_title: &str, parts: I) -> Option<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut scenes = Vec::new();
        for (idx, (explainer, image_prompt)) in parts.into_iter().enumerate() {
            if explainer.trim().is_empty() || image_prompt.trim().is_empty() {
                return None;
            }
            scenes.push(Scene {
                scene_number: idx + 1,
                explainer,
                image_prompt,
            });
        }

        if scenes.is_empty() {
            return None;
        }

        Some(Self {
            book_title: book_title.to_string(),
            scenes,
        })
    }

    pub fn book_title(&self) -> &str {
        &self.book_title
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}
