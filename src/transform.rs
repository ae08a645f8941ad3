// Center-crop, resize and tensor conversion for camera frames

use crate::error::{ActingError, Result};
use crate::models::Frame;
use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::Deserialize;

/// How the square crop is sized
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropPolicy {
    /// Centered square of side `min(width, height)`
    #[default]
    Clamp,
    /// Legacy sizing: side = width, intersected with the image bounds.
    /// Landscape frames come out non-square.
    WidthBased,
}

/// Pixel rectangle inside a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Computes the centered crop rectangle for a `width` x `height` frame
pub fn crop_region(width: u32, height: u32, policy: CropPolicy) -> CropRegion {
    let (target_w, target_h) = match policy {
        CropPolicy::Clamp => {
            let side = width.min(height);
            (side, side)
        }
        CropPolicy::WidthBased => (width, width.min(height)),
    };
    CropRegion {
        x: (width - target_w) / 2,
        y: (height - target_h) / 2,
        width: target_w,
        height: target_h,
    }
}

/// Crops the frame to its centered square
pub fn center_crop(frame: &Frame, policy: CropPolicy) -> Result<Frame> {
    let image = frame.to_rgb_image()?;
    let region = crop_region(frame.width, frame.height, policy);
    if region.width == frame.width && region.height == frame.height {
        return Ok(Frame::from_rgb_image(image));
    }
    let cropped = imageops::crop_imm(&image, region.x, region.y, region.width, region.height);
    Ok(Frame::from_rgb_image(cropped.to_image()))
}

/// Resizes a frame to a `side` x `side` model input
pub fn resize_square(frame: &Frame, side: u32) -> Result<RgbImage> {
    if side == 0 {
        return Err(ActingError::Preprocessing(
            "target size must be non-zero".to_string(),
        ));
    }
    let image = frame.to_rgb_image()?;
    Ok(imageops::resize(&image, side, side, FilterType::Triangle))
}

/// Mirrors a frame left to right (front-facing cameras)
pub fn mirror_horizontal(frame: Frame) -> Result<Frame> {
    let mut image = frame.to_rgb_image()?;
    imageops::flip_horizontal_in_place(&mut image);
    Ok(Frame::from_rgb_image(image))
}

/// Converts an RGB image (HWC, u8) into planar CHW floats in [0, 1]
pub fn to_chw_tensor(image: &RgbImage) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let plane = (width * height) as usize;
    let mut chw = vec![0.0f32; plane * 3];
    for (i, pixel) in image.pixels().enumerate() {
        for c in 0..3 {
            chw[c * plane + i] = pixel.0[c] as f32 / 255.0;
        }
    }
    chw
}
