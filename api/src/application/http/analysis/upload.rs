use std::path::Path;

use axum::extract::Multipart;
use nutriscan_core::domain::analysis::{
    validation::{ALLOWED_EXTENSIONS, file_extension},
    value_objects::{RequestContext, UploadedImage},
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::http::server::api_entities::api_error::ApiError;

pub const IMAGE_FIELD: &str = "image";

struct ImageField {
    file_name: String,
    content_type: String,
    data: Vec<u8>,
}

/// Drains the multipart body and writes the `image` field, if any, to a
/// uniquely named file under `upload_dir`.
///
/// Content checks are left to the analysis service, which also owns the file
/// from here on and removes it when the request completes.
pub async fn read_image_upload(
    mut multipart: Multipart,
    upload_dir: &Path,
    context: &RequestContext,
) -> Result<Option<UploadedImage>, ApiError> {
    let mut image: Option<ImageField> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        ApiError::BadRequest(
            context.clone(),
            format!("Failed to read multipart field: {}", e),
        )
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|e| {
            ApiError::BadRequest(context.clone(), format!("Failed to read image: {}", e))
        })?;

        image = Some(ImageField {
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }

    let Some(image) = image else {
        return Ok(None);
    };

    let extension = file_extension(&image.file_name);
    let stored_name = if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        format!("{}{}", Uuid::new_v4(), extension)
    } else {
        Uuid::new_v4().to_string()
    };
    let path = upload_dir.join(stored_name);

    tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
        ApiError::InternalServerError(context.clone(), format!("Failed to prepare upload: {}", e))
    })?;
    store_upload(&path, &image.data).await.map_err(|e| {
        ApiError::InternalServerError(context.clone(), format!("Failed to store upload: {}", e))
    })?;

    debug!(path = %path.display(), size = image.data.len(), "Stored upload");

    Ok(Some(UploadedImage {
        path,
        original_name: image.file_name,
        mime_type: image.content_type,
        size: image.data.len() as u64,
    }))
}

/// Writes `data` to `path`, removing whatever was written if the write fails.
async fn store_upload(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Err(e) = tokio::fs::write(path, data).await {
        match tokio::fs::remove_file(path).await {
            Err(remove_error) if remove_error.kind() != std::io::ErrorKind::NotFound => {
                warn!(
                    path = %path.display(),
                    error = %remove_error,
                    "Failed to remove partial upload"
                );
            }
            _ => {}
        }
        return Err(e);
    }
    Ok(())
}
