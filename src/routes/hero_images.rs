use actix_web::{web, HttpResponse};

use crate::auth::AdminUser;
use crate::db::models::NewHeroImage;
use crate::error::ApiError;
use crate::images::purge;
use crate::models::CreateImageRequest;
use crate::routes::deleted;
use crate::{blocking, AppState};

pub async fn list_hero_images(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let images = blocking(&data, |storage| storage.list_hero_images()).await?;
    Ok(HttpResponse::Ok().json(images))
}

pub async fn create_hero_image(
    _admin: AdminUser,
    data: web::Data<AppState>,
    body: web::Json<CreateImageRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate().map_err(ApiError::BadRequest)?;
    let image = NewHeroImage {
        url: body.url,
        sort_order: body.order.unwrap_or(0),
    };
    let created = blocking(&data, move |storage| storage.create_hero_image(image)).await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn delete_hero_image(
    _admin: AdminUser,
    data: web::Data<AppState>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let removed = blocking(&data, move |storage| storage.delete_hero_image(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Hero image"))?;
    purge(data.images.as_ref(), &removed.image_urls).await;
    Ok(deleted())
}
