use std::path::Path;

use crate::domain::{
    analysis::value_objects::UploadedImage,
    common::{UploadConfig, entities::app_errors::ValidationError},
};

pub const ALLOWED_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".webp", ".heic", ".heif"];

pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Lowercased extension of `filename`, including the leading dot.
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        ".jpg" | ".jpeg" => Some("image/jpeg"),
        ".png" => Some("image/png"),
        ".webp" => Some("image/webp"),
        ".heic" => Some("image/heic"),
        ".heif" => Some("image/heif"),
        _ => None,
    }
}

/// Content-level checks on an upload: extension and MIME allow-lists, size
/// limit and filename sanity.
pub fn validate_upload<'a>(
    upload: Option<&'a UploadedImage>,
    config: &UploadConfig,
) -> Result<&'a UploadedImage, ValidationError> {
    let upload = upload.ok_or(ValidationError::NoFile)?;

    let extension = file_extension(&upload.original_name);
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::InvalidExtension {
            extension,
            allowed: ALLOWED_EXTENSIONS.join(", "),
        });
    }

    let mime_type = mime_for_extension(&extension).unwrap_or(upload.mime_type.as_str());
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        return Err(ValidationError::InvalidMimeType {
            mime_type: mime_type.to_string(),
            allowed: ALLOWED_MIME_TYPES.join(", "),
        });
    }

    if upload.size > config.max_file_size {
        return Err(ValidationError::FileTooLarge {
            size_mb: upload.size as f64 / 1024.0 / 1024.0,
            limit_mb: config.max_file_size / 1024 / 1024,
        });
    }

    let name = &upload.original_name;
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(upload)
}
