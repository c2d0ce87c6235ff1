use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::AdminUser;
use crate::contact;
use crate::db::models::NewProductImage;
use crate::error::ApiError;
use crate::images::purge;
use crate::models::{CreateImageRequest, CreateProductRequest, UpdateProductRequest};
use crate::routes::deleted;
use crate::{blocking, AppState};

pub async fn list_products(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let products = blocking(&data, |storage| storage.list_products()).await?;
    Ok(HttpResponse::Ok().json(products))
}

pub async fn list_products_by_category(
    data: web::Data<AppState>,
    category_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let category_id = category_id.into_inner();
    let products = blocking(&data, move |storage| {
        storage.list_products_by_category(category_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(products))
}

pub async fn get_product(
    data: web::Data<AppState>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    blocking(&data, move |storage| storage.get_product(id))
        .await?
        .map(|product| HttpResponse::Ok().json(product))
        .ok_or_else(|| ApiError::not_found("Product"))
}

pub async fn get_product_by_slug(
    data: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let slug = slug.into_inner();
    blocking(&data, move |storage| storage.get_product_by_slug(&slug))
        .await?
        .map(|product| HttpResponse::Ok().json(product))
        .ok_or_else(|| ApiError::not_found("Product"))
}

pub async fn create_product(
    _admin: AdminUser,
    data: web::Data<AppState>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, ApiError> {
    let (product, image_urls) = body.into_inner().into_new().map_err(ApiError::BadRequest)?;
    let created = blocking(&data, move |storage| {
        storage.create_product(product, image_urls)
    })
    .await?;
    tracing::info!(id = created.id, slug = %created.slug, "product created");
    Ok(HttpResponse::Created().json(created))
}

pub async fn update_product(
    _admin: AdminUser,
    data: web::Data<AppState>,
    id: web::Path<i32>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let changes = body.into_inner().into_changes().map_err(ApiError::BadRequest)?;
    blocking(&data, move |storage| storage.update_product(id, changes))
        .await?
        .map(|product| HttpResponse::Ok().json(product))
        .ok_or_else(|| ApiError::not_found("Product"))
}

pub async fn delete_product(
    _admin: AdminUser,
    data: web::Data<AppState>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let removed = blocking(&data, move |storage| storage.delete_product(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    tracing::info!(id, images = removed.image_urls.len(), "product deleted");
    purge(data.images.as_ref(), &removed.image_urls).await;
    Ok(deleted())
}

/// Chat link for enquiring about a product over the store's WhatsApp number.
pub async fn whatsapp_link(
    data: web::Data<AppState>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let (product, settings) = blocking(&data, move |storage| {
        let product = storage.get_product(id)?;
        Ok((product, storage.get_site_settings()?))
    })
    .await?;
    let product = product.ok_or_else(|| ApiError::not_found("Product"))?;
    let url = contact::whatsapp_link(&settings.whatsapp, &product.product).ok_or_else(|| {
        ApiError::BadRequest("Store WhatsApp number is not configured".to_string())
    })?;
    Ok(HttpResponse::Ok().json(json!({ "url": url })))
}

pub async fn list_product_images(
    data: web::Data<AppState>,
    product_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let product_id = product_id.into_inner();
    let images = blocking(&data, move |storage| storage.list_product_images(product_id)).await?;
    Ok(HttpResponse::Ok().json(images))
}

pub async fn create_product_image(
    _admin: AdminUser,
    data: web::Data<AppState>,
    product_id: web::Path<i32>,
    body: web::Json<CreateImageRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate().map_err(ApiError::BadRequest)?;
    let image = NewProductImage {
        url: body.url,
        product_id: product_id.into_inner(),
        sort_order: body.order.unwrap_or(0),
    };
    let created = blocking(&data, move |storage| storage.create_product_image(image)).await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn delete_product_image(
    _admin: AdminUser,
    data: web::Data<AppState>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let removed = blocking(&data, move |storage| storage.delete_product_image(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Image"))?;
    purge(data.images.as_ref(), &removed.image_urls).await;
    Ok(deleted())
}
