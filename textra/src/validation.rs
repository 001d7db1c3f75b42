use std::collections::HashMap;
use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::config::UploadConfig;
use crate::error::{Result, TextraError};
use crate::models::{ImageMetadata, UploadedImage};

/// Validates an uploaded image against the configured limits and extracts
/// its metadata.
///
/// Checks, in order: declared content type against the allow-list, non-empty
/// payload, size bound, and byte-level decodability. A mismatch between the
/// detected container format and the declared content type is reported as
/// corruption. The raw bytes are left untouched; callers keep ownership.
pub fn validate_image(upload: &UploadedImage, config: &UploadConfig) -> Result<ImageMetadata> {
    let declared = upload.content_type.as_deref().unwrap_or("unknown");
    if !config
        .allowed_content_types
        .iter()
        .any(|ct| ct == declared)
    {
        return Err(TextraError::InvalidImage(format!(
            "Unsupported format: {declared}. Supported: {}",
            config.allowed_content_types.join(", ")
        )));
    }

    if upload.bytes.is_empty() {
        return Err(TextraError::InvalidImage(
            "Uploaded file is empty or unreadable.".to_string(),
        ));
    }

    if upload.bytes.len() > config.max_file_size {
        return Err(TextraError::InvalidImage(
            "File exceeds size limit.".to_string(),
        ));
    }

    let reader = ImageReader::new(Cursor::new(&upload.bytes))
        .with_guessed_format()
        .map_err(|e| TextraError::InvalidImage(format!("Invalid or corrupted image: {e}")))?;

    let format = reader.format().ok_or_else(|| {
        TextraError::InvalidImage("Invalid or corrupted image: unrecognized format".to_string())
    })?;

    if format.to_mime_type() != declared {
        return Err(TextraError::InvalidImage(format!(
            "Invalid or corrupted image: content does not match declared type {declared}"
        )));
    }

    let img = reader
        .decode()
        .map_err(|e| TextraError::InvalidImage(format!("Invalid or corrupted image: {e}")))?;

    Ok(ImageMetadata {
        format: format_name(format),
        width: img.width(),
        height: img.height(),
        color_mode: color_mode_name(img.color()),
        exif: extract_exif(&upload.bytes),
    })
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        other => format!("{other:?}").to_uppercase(),
    }
}

fn color_mode_name(color: image::ColorType) -> String {
    match color {
        image::ColorType::L8 => "L".to_string(),
        image::ColorType::La8 => "LA".to_string(),
        image::ColorType::Rgb8 => "RGB".to_string(),
        image::ColorType::Rgba8 => "RGBA".to_string(),
        image::ColorType::L16 => "L16".to_string(),
        image::ColorType::La16 => "LA16".to_string(),
        image::ColorType::Rgb16 => "RGB16".to_string(),
        image::ColorType::Rgba16 => "RGBA16".to_string(),
        other => format!("{other:?}"),
    }
}

/// Reads EXIF tags from the primary image directory. Images without EXIF
/// (or with an unreadable EXIF segment) yield an empty map rather than an
/// error.
fn extract_exif(bytes: &[u8]) -> HashMap<String, String> {
    let mut cursor = Cursor::new(bytes);
    match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(data) => data
            .fields()
            .filter(|f| f.ifd_num == exif::In::PRIMARY)
            .map(|f| {
                (
                    f.tag.to_string(),
                    f.display_value().with_unit(&data).to_string(),
                )
            })
            .collect(),
        Err(_) => HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn test_config() -> UploadConfig {
        UploadConfig {
            max_file_size: 10 * 1024 * 1024,
            allowed_content_types: crate::config::DEFAULT_SUPPORTED_FORMATS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_batch_size: 10,
        }
    }

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), format).unwrap();
        out
    }

    fn upload(bytes: Vec<u8>, content_type: &str) -> UploadedImage {
        UploadedImage {
            bytes,
            content_type: Some(content_type.to_string()),
            filename: Some("test.img".to_string()),
        }
    }

    #[test]
    fn test_valid_images_across_formats() {
        let cases = [
            (ImageFormat::Png, "image/png", "PNG"),
            (ImageFormat::Jpeg, "image/jpeg", "JPEG"),
            (ImageFormat::Gif, "image/gif", "GIF"),
            (ImageFormat::Bmp, "image/bmp", "BMP"),
            (ImageFormat::Tiff, "image/tiff", "TIFF"),
        ];

        for (format, content_type, expected_name) in cases {
            let bytes = encode(40, 20, format);
            let metadata = validate_image(&upload(bytes, content_type), &test_config())
                .unwrap_or_else(|e| panic!("{content_type} should validate: {e}"));
            assert_eq!(metadata.format, expected_name);
            assert_eq!(metadata.width, 40);
            assert_eq!(metadata.height, 20);
        }
    }

    #[test]
    fn test_rejects_disallowed_content_type() {
        let bytes = encode(10, 10, ImageFormat::Png);
        let err = validate_image(&upload(bytes, "application/pdf"), &test_config()).unwrap_err();
        assert!(err.to_string().starts_with("Unsupported format: application/pdf"));
        assert!(err.to_string().contains("image/png"));
    }

    #[test]
    fn test_rejects_missing_content_type() {
        let mut img = upload(encode(10, 10, ImageFormat::Png), "image/png");
        img.content_type = None;
        let err = validate_image(&img, &test_config()).unwrap_err();
        assert!(err.to_string().contains("Unsupported format: unknown"));
    }

    #[test]
    fn test_rejects_empty_payload() {
        let err = validate_image(&upload(Vec::new(), "image/png"), &test_config()).unwrap_err();
        assert_eq!(err.to_string(), "Uploaded file is empty or unreadable.");
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let config = UploadConfig {
            max_file_size: 64,
            ..test_config()
        };
        // A real image well over 64 bytes; size is checked before decoding.
        let bytes = encode(100, 100, ImageFormat::Png);
        let err = validate_image(&upload(bytes, "image/png"), &config).unwrap_err();
        assert_eq!(err.to_string(), "File exceeds size limit.");
    }

    #[test]
    fn test_rejects_undecodable_bytes() {
        let err =
            validate_image(&upload(vec![0, 1, 2, 3, 4, 5], "image/png"), &test_config())
                .unwrap_err();
        assert!(err.to_string().starts_with("Invalid or corrupted image"));
    }

    #[test]
    fn test_rejects_declared_type_mismatch() {
        // PNG bytes declared as JPEG.
        let bytes = encode(10, 10, ImageFormat::Png);
        let err = validate_image(&upload(bytes, "image/jpeg"), &test_config()).unwrap_err();
        assert!(err
            .to_string()
            .contains("content does not match declared type image/jpeg"));
    }

    #[test]
    fn test_rejects_truncated_image() {
        let mut bytes = encode(64, 64, ImageFormat::Png);
        bytes.truncate(bytes.len() / 2);
        let err = validate_image(&upload(bytes, "image/png"), &test_config()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid or corrupted image"));
    }

    #[test]
    fn test_exif_absent_yields_empty_map() {
        let bytes = encode(10, 10, ImageFormat::Png);
        let metadata = validate_image(&upload(bytes, "image/png"), &test_config()).unwrap();
        assert!(metadata.exif.is_empty());
    }

    #[test]
    fn test_color_mode_reported() {
        let bytes = encode(10, 10, ImageFormat::Png);
        let metadata = validate_image(&upload(bytes, "image/png"), &test_config()).unwrap();
        assert_eq!(metadata.color_mode, "RGB");
    }
}
