use actix_web::{web, HttpResponse};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::models::UpdateSettingsRequest;
use crate::{blocking, AppState};

pub async fn get_settings(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let settings = blocking(&data, |storage| storage.get_site_settings()).await?;
    Ok(HttpResponse::Ok().json(settings))
}

pub async fn update_settings(
    admin: AdminUser,
    data: web::Data<AppState>,
    body: web::Json<UpdateSettingsRequest>,
) -> Result<HttpResponse, ApiError> {
    let changes = body.into_inner().into_changes().map_err(ApiError::BadRequest)?;
    let settings = blocking(&data, move |storage| storage.update_site_settings(changes)).await?;
    tracing::info!(by = %admin.username, "site settings updated");
    Ok(HttpResponse::Ok().json(settings))
}
