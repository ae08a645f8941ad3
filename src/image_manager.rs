// Reference images shown next to each emotion prompt

use crate::emotion::Emotion;
use crate::error::{ActingError, Result};
use image::DynamicImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Represents decoded image data ready for display
#[derive(Clone, Debug)]
pub struct ImageData {
    /// RGBA pixel data
    pub rgba: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Creates ImageData from a DynamicImage
    pub fn from_dynamic_image(img: DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            rgba: rgba.into_raw(),
            width,
            height,
        }
    }

    /// Loads an image from a file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|e| {
            ActingError::ImageLoad(format!(
                "Failed to load image from {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        Ok(Self::from_dynamic_image(img))
    }
}

/// Holds one reference image per emotion, falling back to a placeholder
pub struct ImageManager {
    images: HashMap<Emotion, ImageData>,
    /// Directory holding `<asset>.{png,jpg,jpeg}` files
    emotions_dir: PathBuf,
    placeholder: ImageData,
}

impl ImageManager {
    /// Creates an ImageManager for `<base_dir>/emotions`
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        let placeholder = ImageData::from_dynamic_image(DynamicImage::new_rgba8(300, 300));
        Self {
            images: HashMap::new(),
            emotions_dir: base_dir.as_ref().join("emotions"),
            placeholder,
        }
    }

    /// Loads every reference image that exists. Returns how many were found.
    pub fn load(&mut self) -> Result<usize> {
        if !self.emotions_dir.exists() {
            warn!("No reference images at {:?}", self.emotions_dir);
            return Ok(0);
        }

        let placeholder_path = self.emotions_dir.join("placeholder.jpg");
        if placeholder_path.exists() {
            self.placeholder = ImageData::load_from_path(&placeholder_path)?;
        }

        for emotion in Emotion::ALL {
            // Priority order
            let found = ["png", "jpg", "jpeg"]
                .iter()
                .map(|ext| self.emotions_dir.join(format!("{}.{ext}", emotion.asset())))
                .find(|path| path.exists());

            let Some(path) = found else {
                debug!("No reference image for {}", emotion);
                continue;
            };
            match ImageData::load_from_path(&path) {
                Ok(img) => {
                    self.images.insert(emotion, img);
                }
                Err(e) => warn!("Skipping reference image: {}", e),
            }
        }

        Ok(self.images.len())
    }

    /// Gets the reference image for an emotion
    pub fn image_for(&self, emotion: Emotion) -> &ImageData {
        self.images.get(&emotion).unwrap_or(&self.placeholder)
    }
}
