use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

use crate::config::TransformConfig;

/// Resolved resize/re-encode parameters for one payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformPlan {
    pub max_dimension: u32,
    pub quality: u8,
    pub aggressive: bool,
}

/// Payloads above the large-image threshold get the smaller target
/// dimension and the bandwidth-efficient quality.
pub fn plan_for(payload_len: usize, cfg: &TransformConfig) -> TransformPlan {
    if payload_len > cfg.large_image_bytes {
        TransformPlan {
            max_dimension: cfg.large_max_dimension,
            quality: cfg.large_quality,
            aggressive: true,
        }
    } else {
        TransformPlan {
            max_dimension: cfg.default_max_dimension,
            quality: cfg.default_quality,
            aggressive: false,
        }
    }
}

pub(crate) fn format_from_content_type(content_type: &str) -> Option<ImageFormat> {
    // Parameters like "; charset=..." are not part of the essence
    let essence = content_type.split(';').next().unwrap_or("").trim();
    match essence {
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        "image/webp" => Some(ImageFormat::WebP),
        "image/gif" => Some(ImageFormat::Gif),
        "image/bmp" => Some(ImageFormat::Bmp),
        "image/tiff" => Some(ImageFormat::Tiff),
        _ => None,
    }
}

pub struct TransformedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

fn decode(bytes: &[u8], declared_content_type: Option<&str>) -> Result<DynamicImage, String> {
    // Primary path trusts the declared content type; if that decode fails
    // (mislabelled upstream files are common) fall back to sniffing the
    // buffered payload once.
    if let Some(format) = declared_content_type.and_then(format_from_content_type) {
        if let Ok(img) = image::load_from_memory_with_format(bytes, format) {
            return Ok(img);
        }
        tracing::warn!(
            "Declared content type {:?} did not decode, re-sniffing buffer",
            declared_content_type
        );
    }

    let format = image::guess_format(bytes)
        .map_err(|e| format!("Unrecognized image payload: {}", e))?;
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| format!("Image decode error: {}", e))
}

/// Downscale + re-encode one fetched payload according to its size plan.
/// Output is always JPEG; alpha is flattened.
pub fn optimize_image(
    bytes: &[u8],
    declared_content_type: Option<&str>,
    cfg: &TransformConfig,
) -> Result<TransformedImage, String> {
    let plan = plan_for(bytes.len(), cfg);
    let img = decode(bytes, declared_content_type)?;

    let (w, h) = img.dimensions();
    let resized = if w.max(h) > plan.max_dimension {
        img.resize(
            plan.max_dimension,
            plan.max_dimension,
            image::imageops::FilterType::Lanczos3,
        )
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = resized.to_rgb8();
    let (out_w, out_h) = rgb.dimensions();

    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, plan.quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| format!("Image encode error: {}", e))?;

    tracing::info!(
        "Optimized image: {} bytes in, {} bytes out, {}x{}, aggressive={}",
        bytes.len(),
        out.get_ref().len(),
        out_w,
        out_h,
        plan.aggressive
    );

    Ok(TransformedImage {
        bytes: out.into_inner(),
        content_type: "image/jpeg",
        width: out_w,
        height: out_h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TransformConfig {
        TransformConfig {
            large_image_bytes: 10 * 1024 * 1024,
            large_max_dimension: 800,
            default_max_dimension: 1200,
            large_quality: 70,
            default_quality: 85,
        }
    }

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn payloads_over_the_threshold_get_the_aggressive_plan() {
        let cfg = test_config();
        let plan = plan_for(cfg.large_image_bytes + 1, &cfg);
        assert!(plan.aggressive);
        assert_eq!(plan.max_dimension, 800);
        assert_eq!(plan.quality, 70);
    }

    #[test]
    fn payloads_at_or_under_the_threshold_get_the_default_plan() {
        let cfg = test_config();
        let plan = plan_for(cfg.large_image_bytes, &cfg);
        assert!(!plan.aggressive);
        assert_eq!(plan.max_dimension, 1200);
        assert_eq!(plan.quality, 85);
    }

    #[test]
    fn content_type_mapping_ignores_parameters() {
        assert_eq!(
            format_from_content_type("image/png; charset=binary"),
            Some(ImageFormat::Png)
        );
        assert_eq!(format_from_content_type("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(format_from_content_type("text/html"), None);
    }

    #[test]
    fn png_with_alpha_is_flattened_to_jpeg() {
        let cfg = test_config();
        let png = png_fixture(64, 48);
        let result = optimize_image(&png, Some("image/png"), &cfg).unwrap();
        assert_eq!(result.content_type, "image/jpeg");
        assert_eq!((result.width, result.height), (64, 48));
        assert_eq!(
            image::guess_format(&result.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn oversized_dimensions_are_downscaled_preserving_aspect() {
        let mut cfg = test_config();
        cfg.default_max_dimension = 32;
        let png = png_fixture(64, 48);
        let result = optimize_image(&png, Some("image/png"), &cfg).unwrap();
        assert!(result.width <= 32 && result.height <= 32);
        // 4:3 aspect survives
        assert_eq!((result.width, result.height), (32, 24));
    }

    #[test]
    fn wrong_declared_type_falls_back_to_sniffing() {
        let cfg = test_config();
        let png = png_fixture(16, 16);
        let result = optimize_image(&png, Some("image/jpeg"), &cfg).unwrap();
        assert_eq!(result.content_type, "image/jpeg");
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let cfg = test_config();
        assert!(optimize_image(b"not an image at all", None, &cfg).is_err());
    }
}
