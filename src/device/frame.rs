// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Captured still frames

use base64::Engine;
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::sync::Arc;

use super::CaptureError;

/// One still image pulled from the device, always JPEG encoded
#[derive(Debug, Clone)]
pub struct Frame {
    data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// Wrap bytes already known to be JPEG
    pub fn from_jpeg(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data: Arc::new(data),
            width,
            height,
            captured_at: Utc::now(),
        }
    }

    /// Decode a device response body, re-encoding to JPEG when needed
    pub async fn decode(body: Vec<u8>) -> Result<Self, CaptureError> {
        let (jpeg, width, height) = tokio::task::spawn_blocking(move || normalize(body))
            .await
            .map_err(|e| CaptureError::Decode(format!("decode worker failed: {}", e)))??;

        Ok(Self::from_jpeg(jpeg, width, height))
    }

    pub fn jpeg(&self) -> &[u8] {
        &self.data
    }

    /// Inline `data:` URL carrying the JPEG bytes
    pub fn to_data_url(&self) -> String {
        jpeg_data_url(&self.data)
    }
}

pub fn jpeg_data_url(jpeg: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(jpeg)
    )
}

fn normalize(body: Vec<u8>) -> Result<(Vec<u8>, u32, u32), CaptureError> {
    if body.is_empty() {
        return Err(CaptureError::Decode("empty response body".to_string()));
    }

    let format = image::guess_format(&body).map_err(|e| CaptureError::Decode(e.to_string()))?;
    let img = image::load_from_memory_with_format(&body, format)
        .map_err(|e| CaptureError::Decode(e.to_string()))?;
    let (width, height) = (img.width(), img.height());

    if format == ImageFormat::Jpeg {
        return Ok((body, width, height));
    }

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| CaptureError::Decode(format!("jpeg re-encode failed: {}", e)))?;

    Ok((out.into_inner(), width, height))
}

#[cfg(test)]
pub(crate) fn encode_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(width, height, image::Rgb([40, 90, 160])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_jpeg_passes_through() {
        let jpeg = encode_test_image(32, 24, ImageFormat::Jpeg);
        let frame = Frame::decode(jpeg.clone()).await.unwrap();

        assert_eq!((frame.width, frame.height), (32, 24));
        assert_eq!(frame.jpeg(), jpeg.as_slice());
    }

    #[tokio::test]
    async fn test_png_is_reencoded_as_jpeg() {
        let png = encode_test_image(16, 16, ImageFormat::Png);
        let frame = Frame::decode(png).await.unwrap();

        assert_eq!(image::guess_format(frame.jpeg()).unwrap(), ImageFormat::Jpeg);
        assert_eq!((frame.width, frame.height), (16, 16));
    }

    #[tokio::test]
    async fn test_garbage_is_a_decode_error() {
        let result = Frame::decode(b"<html>camera busy</html>".to_vec()).await;
        assert!(matches!(result, Err(CaptureError::Decode(_))));

        let result = Frame::decode(Vec::new()).await;
        assert!(matches!(result, Err(CaptureError::Decode(_))));
    }

    #[test]
    fn test_data_url_prefix() {
        let url = jpeg_data_url(&[0xff, 0xd8, 0xff]);
        assert_eq!(url, "data:image/jpeg;base64,/9j/");
    }
}
