use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use serde_json::json;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::images::check_image_type;
use crate::AppState;

const FILE_FIELD: &str = "file";

/// Accepts one image in the multipart field `file`, hands it to the
/// configured image host and returns `{"url": ...}`.
pub async fn upload_image(
    admin: AdminUser,
    data: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    while let Some(field) = payload.next().await {
        let field = field.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let disposition = field.content_disposition();
        if disposition.get_name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = disposition.get_filename().unwrap_or_default().to_string();

        let mime = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();
        let ext = check_image_type(&mime, &filename)
            .ok_or_else(|| ApiError::BadRequest("Only image files are allowed".to_string()))?;

        let bytes = read_limited(field, data.max_upload_bytes).await?;
        let size = bytes.len();
        let url = data.images.upload(bytes, &mime, &ext).await.map_err(|e| {
            tracing::error!(error = %e, "image upload failed");
            ApiError::Internal(format!("Failed to upload image: {e}"))
        })?;
        tracing::info!(by = %admin.username, %url, size, "image uploaded");
        return Ok(HttpResponse::Ok().json(json!({ "url": url })));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

async fn read_limited(mut field: Field, limit: usize) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        if bytes.len() + chunk.len() > limit {
            return Err(ApiError::BadRequest(format!(
                "File size exceeds {}MB limit",
                limit / (1024 * 1024)
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    }
    Ok(bytes)
}
