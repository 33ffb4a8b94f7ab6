use crate::errors::{CaptureResult, DecodeError};
use base64::{engine::general_purpose, Engine as _};
use image::{ImageOutputFormat, RgbImage};
use std::io;
use std::sync::Arc;

const JPEG_QUALITY: u8 = 85;

/// Decoded picture detached from the decoder, cheap to clone and send across threads
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap(Arc<RgbImage>);

impl Bitmap {
    /// Copy a packed RGB8 buffer into a bitmap
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> CaptureResult<Self> {
        let image = RgbImage::from_raw(width, height, rgb).ok_or_else(|| {
            DecodeError::new(format!(
                "RGB buffer does not match {}x{} frame",
                width, height
            ))
        })?;
        Ok(Bitmap(Arc::new(image)))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.0
    }

    /// Scale down to fit within the bounds, keeping the aspect ratio
    pub fn fit_within(self, max_width: u32, max_height: u32) -> Self {
        let (width, height) = (self.width(), self.height());
        if width <= max_width && height <= max_height {
            return self;
        }

        let ratio = (max_width as f32 / width as f32).min(max_height as f32 / height as f32);
        let new_width = ((width as f32 * ratio) as u32).max(1);
        let new_height = ((height as f32 * ratio) as u32).max(1);

        Bitmap(Arc::new(image::imageops::resize(
            self.image(),
            new_width,
            new_height,
            image::imageops::FilterType::Lanczos3,
        )))
    }

    pub fn to_jpeg_bytes(&self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = io::Cursor::new(&mut buffer);
        self.0
            .write_to(&mut cursor, ImageOutputFormat::Jpeg(JPEG_QUALITY))
            .map_err(io::Error::other)?;
        Ok(buffer)
    }

    pub fn to_jpeg_data_uri(&self) -> io::Result<String> {
        let encoded = general_purpose::STANDARD.encode(self.to_jpeg_bytes()?);
        Ok(format!("data:image/jpeg;base64,{}", encoded))
    }
}
