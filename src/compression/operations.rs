//! Image resampling and preview encoding

use crate::compression::types::CompressionSpec;
use crate::error::{Result, UploadError};
use crate::upload::types::UploadUnit;
use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use log::debug;
use std::io::Cursor;

/// Fit `width`×`height` inside the `CompressionSpec` bounding box
///
/// Width is clamped first and height re-derived from it; the result is then
/// checked against the height bound and width re-derived if needed. Fractions
/// are truncated and no edge drops below one pixel. Images already inside the
/// box keep their size.
pub fn target_dimensions(width: u32, height: u32, spec: &CompressionSpec) -> (u32, u32) {
    let mut w = width as f64;
    let mut h = height as f64;

    if spec.max_width > 0 && w > spec.max_width as f64 {
        h *= spec.max_width as f64 / w;
        w = spec.max_width as f64;
    }

    if spec.max_height > 0 && h > spec.max_height as f64 {
        w *= spec.max_height as f64 / h;
        h = spec.max_height as f64;
    }

    ((w as u32).max(1), (h as u32).max(1))
}

/// Shrink an image unit to fit `spec`, keeping its name and declared type
///
/// # Errors
///
/// Returns `CompressionFailed` if the unit cannot be decoded, its declared
/// type has no encoder, or encoding produces no bytes.
pub async fn compress_image(unit: UploadUnit, spec: CompressionSpec) -> Result<UploadUnit> {
    spec.validate()?;

    tokio::task::spawn_blocking(move || compress_blocking(&unit, &spec)).await?
}

fn compress_blocking(unit: &UploadUnit, spec: &CompressionSpec) -> Result<UploadUnit> {
    let format = output_format(unit.content_type()).ok_or_else(|| {
        UploadError::compression_failed(
            unit.name(),
            format!("no encoder for {}", unit.content_type()),
        )
    })?;

    let img = image::load_from_memory(unit.data())
        .map_err(|e| UploadError::compression_failed(unit.name(), e.to_string()))?;

    let (width, height) = target_dimensions(img.width(), img.height(), spec);
    let resized = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
    };

    let encoded = encode(&resized, format, spec.encoder_quality())
        .map_err(|e| UploadError::compression_failed(unit.name(), e.to_string()))?;

    if encoded.is_empty() {
        return Err(UploadError::compression_failed(
            unit.name(),
            "encoder produced no output",
        ));
    }

    debug!(
        "Compressed {} to {}x{} ({} -> {} bytes)",
        unit.name(),
        width,
        height,
        unit.size(),
        encoded.len()
    );

    Ok(unit.with_data(encoded))
}

fn output_format(content_type: &str) -> Option<ImageFormat> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        "image/gif" => Some(ImageFormat::Gif),
        "image/webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
        }
        other => img.write_to(&mut Cursor::new(&mut buf), other)?,
    }
    Ok(buf)
}

/// `data:` URL of an image unit for local display
pub fn preview_data_url(unit: &UploadUnit) -> Result<String> {
    if !unit.is_image() {
        return Err(UploadError::preview_unavailable(unit.name()));
    }

    Ok(format!(
        "data:{};base64,{}",
        unit.content_type(),
        general_purpose::STANDARD.encode(unit.data())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::{Rgb, RgbImage};

    fn png_unit(name: &str, width: u32, height: u32) -> UploadUnit {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 255) as u8, (y % 255) as u8, 128])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        UploadUnit::new(name, "image/png", buf)
    }

    #[test]
    fn test_target_dimensions_landscape() {
        let spec = CompressionSpec::new(800, 800, 0.8);
        assert_eq!(target_dimensions(1600, 1200, &spec), (800, 600));
    }

    #[test]
    fn test_target_dimensions_portrait() {
        let spec = CompressionSpec::new(800, 800, 0.8);
        assert_eq!(target_dimensions(1200, 1600, &spec), (600, 800));
    }

    #[test]
    fn test_target_dimensions_sequential_clamps() {
        // width clamp leaves height at 1000, so the height clamp re-derives width
        let spec = CompressionSpec::new(1000, 500, 0.8);
        assert_eq!(target_dimensions(2000, 2000, &spec), (500, 500));
    }

    #[test]
    fn test_target_dimensions_inside_box() {
        let spec = CompressionSpec::new(1920, 1080, 0.8);
        assert_eq!(target_dimensions(640, 480, &spec), (640, 480));
    }

    #[test]
    fn test_target_dimensions_never_zero() {
        let spec = CompressionSpec::new(10, 10, 0.8);
        assert_eq!(target_dimensions(10_000, 1, &spec), (10, 1));
    }

    #[tokio::test]
    async fn test_compress_image_resizes_and_keeps_identity() {
        let unit = png_unit("banner.png", 1600, 1200);
        let spec = CompressionSpec::new(800, 800, 0.8);

        let compressed = compress_image(unit.clone(), spec).await.unwrap();
        assert_eq!(compressed.name(), "banner.png");
        assert_eq!(compressed.content_type(), "image/png");

        let decoded = image::load_from_memory(compressed.data()).unwrap();
        assert!(decoded.width() <= 800);
        assert!(decoded.height() <= 800);
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
    }

    #[tokio::test]
    async fn test_compress_image_jpeg_quality() {
        let png = png_unit("photo.jpg", 400, 300);
        let jpeg_source = {
            let img = image::load_from_memory(png.data()).unwrap();
            let mut buf = Vec::new();
            img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 100))
                .unwrap();
            UploadUnit::new("photo.jpg", "image/jpeg", buf)
        };

        let compressed = compress_image(jpeg_source.clone(), CompressionSpec::new(200, 200, 0.3))
            .await
            .unwrap();
        assert!(compressed.size() < jpeg_source.size());
        assert_eq!(compressed.content_type(), "image/jpeg");
    }

    #[tokio::test]
    async fn test_compress_image_rejects_garbage() {
        let unit = UploadUnit::new("broken.png", "image/png", vec![1u8, 2, 3, 4]);
        let err = compress_image(unit, CompressionSpec::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CompressionFailed);
    }

    #[tokio::test]
    async fn test_compress_image_rejects_svg() {
        let unit = UploadUnit::new("logo.svg", "image/svg+xml", b"<svg/>".to_vec());
        let err = compress_image(unit, CompressionSpec::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CompressionFailed);
    }

    #[test]
    fn test_preview_data_url() {
        let unit = UploadUnit::new("dot.png", "image/png", vec![0u8, 1, 2]);
        assert_eq!(preview_data_url(&unit).unwrap(), "data:image/png;base64,AAEC");

        let doc = UploadUnit::new("cv.pdf", "application/pdf", vec![0u8]);
        let err = preview_data_url(&doc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreviewUnavailable);
    }
}
