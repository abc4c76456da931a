//! Local image work on top of the `image` crate.
//!
//! | Operation | Function |
//! |---|---|
//! | Identify format, size, channels | [`inspect`] |
//! | Decode and re-encode in the source format | [`normalize`] |
//! | Substitute result when the model returns no image | [`reencode_jpeg`] |
//! | Width-bounded JPEG for the image optimizer | [`optimize`] |

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::error::Result;
use crate::models::ImageMetadata;

pub const FALLBACK_JPEG_QUALITY: u8 = 90;
pub const DEFAULT_OPTIMIZE_QUALITY: u8 = 75;
pub const MAX_OPTIMIZE_WIDTH: u32 = 3840;

fn decode(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat)> {
    let format = image::guess_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)?;
    Ok((img, format))
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| match *ext {
            "jpg" => "jpeg".to_string(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| format!("{:?}", format).to_lowercase())
}

fn metadata_of(img: &DynamicImage, format: ImageFormat) -> ImageMetadata {
    ImageMetadata {
        format: format_name(format),
        mime_type: format.to_mime_type().to_string(),
        width: img.width(),
        height: img.height(),
        channels: img.color().channel_count(),
    }
}

pub fn inspect(bytes: &[u8]) -> Result<ImageMetadata> {
    let (img, format) = decode(bytes)?;
    Ok(metadata_of(&img, format))
}

/// Decode and re-encode in the detected format, returning the new bytes and
/// what was learned about the image.
pub fn normalize(bytes: &[u8]) -> Result<(Vec<u8>, ImageMetadata)> {
    let (img, format) = decode(bytes)?;
    let metadata = metadata_of(&img, format);

    let mut out = Vec::with_capacity(bytes.len());
    img.write_to(&mut Cursor::new(&mut out), format)?;
    Ok((out, metadata))
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;
    Ok(out)
}

pub fn reencode_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>> {
    let (img, _) = decode(bytes)?;
    encode_jpeg(&img, quality)
}

/// Downscale to `width` (never upscale) keeping the aspect ratio, then
/// encode as JPEG.
pub fn optimize(bytes: &[u8], width: Option<u32>, quality: u8) -> Result<Vec<u8>> {
    let (img, _) = decode(bytes)?;
    let target = width
        .map(|w| w.clamp(1, MAX_OPTIMIZE_WIDTH))
        .unwrap_or(img.width());

    let img = if target < img.width() {
        let height = ((img.height() as u64 * target as u64) / img.width() as u64).max(1) as u32;
        img.resize_exact(target, height, FilterType::Lanczos3)
    } else {
        img
    };
    encode_jpeg(&img, quality)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::FixtralError;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 128, 200])
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 100, 50]));
        encode_jpeg(&DynamicImage::ImageRgb8(img), 85).unwrap()
    }

    pub(crate) fn tiff_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 120, 240]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Tiff)
            .unwrap();
        out
    }

    #[test]
    fn test_inspect_png() {
        let meta = inspect(&png_bytes(12, 8)).unwrap();
        assert_eq!(meta.format, "png");
        assert_eq!(meta.mime_type, "image/png");
        assert_eq!((meta.width, meta.height), (12, 8));
        assert_eq!(meta.channels, 4);
    }

    #[test]
    fn test_inspect_jpeg_name() {
        let meta = inspect(&jpeg_bytes(4, 4)).unwrap();
        assert_eq!(meta.format, "jpeg");
        assert_eq!(meta.channels, 3);
    }

    #[test]
    fn test_normalize_keeps_format() {
        let (out, meta) = normalize(&png_bytes(5, 5)).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
        assert_eq!(meta.width, 5);
    }

    #[test]
    fn test_reencode_jpeg_flattens_alpha() {
        let out = reencode_jpeg(&png_bytes(10, 6), FALLBACK_JPEG_QUALITY).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let meta = inspect(&out).unwrap();
        assert_eq!((meta.width, meta.height, meta.channels), (10, 6, 3));
    }

    #[test]
    fn test_reencode_jpeg_from_tiff() {
        let src = tiff_bytes(7, 5);
        assert_eq!(inspect(&src).unwrap().format, "tiff");

        let out = reencode_jpeg(&src, FALLBACK_JPEG_QUALITY).unwrap();
        let meta = inspect(&out).unwrap();
        assert_eq!((meta.format.as_str(), meta.width, meta.height), ("jpeg", 7, 5));
    }

    #[test]
    fn test_reencode_rejects_garbage() {
        let err = reencode_jpeg(b"definitely not an image", 90).unwrap_err();
        assert!(matches!(err, FixtralError::ImageError(_)));
    }

    #[test]
    fn test_optimize_downscales_only() {
        let src = png_bytes(40, 20);

        let small = inspect(&optimize(&src, Some(10), 75).unwrap()).unwrap();
        assert_eq!((small.width, small.height), (10, 5));

        let same = inspect(&optimize(&src, Some(400), 75).unwrap()).unwrap();
        assert_eq!((same.width, same.height), (40, 20));

        let unset = inspect(&optimize(&src, None, 75).unwrap()).unwrap();
        assert_eq!(unset.format, "jpeg");
        assert_eq!(unset.width, 40);
    }
}
