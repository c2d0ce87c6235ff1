use actix_web::{web, HttpResponse};

use crate::auth::AdminUser;
use crate::db::models::NewCategoryImage;
use crate::error::ApiError;
use crate::images::purge;
use crate::models::{CreateCategoryRequest, CreateImageRequest, UpdateCategoryRequest};
use crate::routes::deleted;
use crate::{blocking, AppState};

pub async fn list_categories(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let categories = blocking(&data, |storage| storage.list_categories()).await?;
    Ok(HttpResponse::Ok().json(categories))
}

pub async fn get_category(
    data: web::Data<AppState>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    blocking(&data, move |storage| storage.get_category(id))
        .await?
        .map(|category| HttpResponse::Ok().json(category))
        .ok_or_else(|| ApiError::not_found("Category"))
}

pub async fn get_category_by_slug(
    data: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let slug = slug.into_inner();
    blocking(&data, move |storage| storage.get_category_by_slug(&slug))
        .await?
        .map(|category| HttpResponse::Ok().json(category))
        .ok_or_else(|| ApiError::not_found("Category"))
}

pub async fn create_category(
    _admin: AdminUser,
    data: web::Data<AppState>,
    body: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let (category, image_urls) = body.into_inner().into_new().map_err(ApiError::BadRequest)?;
    let created = blocking(&data, move |storage| {
        storage.create_category(category, image_urls)
    })
    .await?;
    tracing::info!(id = created.id, slug = %created.slug, "category created");
    Ok(HttpResponse::Created().json(created))
}

pub async fn update_category(
    _admin: AdminUser,
    data: web::Data<AppState>,
    id: web::Path<i32>,
    body: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let changes = body.into_inner().into_changes().map_err(ApiError::BadRequest)?;
    blocking(&data, move |storage| storage.update_category(id, changes))
        .await?
        .map(|category| HttpResponse::Ok().json(category))
        .ok_or_else(|| ApiError::not_found("Category"))
}

pub async fn delete_category(
    _admin: AdminUser,
    data: web::Data<AppState>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let removed = blocking(&data, move |storage| storage.delete_category(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;
    tracing::info!(id, images = removed.image_urls.len(), "category deleted");
    purge(data.images.as_ref(), &removed.image_urls).await;
    Ok(deleted())
}

pub async fn list_category_images(
    data: web::Data<AppState>,
    category_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let category_id = category_id.into_inner();
    let images = blocking(&data, move |storage| {
        storage.list_category_images(category_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(images))
}

pub async fn create_category_image(
    _admin: AdminUser,
    data: web::Data<AppState>,
    category_id: web::Path<i32>,
    body: web::Json<CreateImageRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate().map_err(ApiError::BadRequest)?;
    let image = NewCategoryImage {
        url: body.url,
        category_id: category_id.into_inner(),
        sort_order: body.order.unwrap_or(0),
    };
    let created = blocking(&data, move |storage| storage.create_category_image(image)).await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn delete_category_image(
    _admin: AdminUser,
    data: web::Data<AppState>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let removed = blocking(&data, move |storage| storage.delete_category_image(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Image"))?;
    purge(data.images.as_ref(), &removed.image_urls).await;
    Ok(deleted())
}
