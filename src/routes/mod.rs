use actix_files::Files;
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::config::UploadConfig;
use crate::error::ApiError;
use crate::{blocking, AppState};

pub mod auth;
pub mod categories;
pub mod hero_images;
pub mod products;
pub mod settings;
pub mod upload;

pub(crate) fn deleted() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true }))
}

async fn health(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    blocking(&data, |storage| storage.ping()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}

/// Request-shape failures use the same `{"message": ...}` body as handler
/// errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

/// Static files written by the local image host.
pub fn uploads_service(uploads: &UploadConfig) -> Files {
    Files::new(&uploads.public_path, &uploads.dir)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).app_data(path_config()).service(
        web::scope("/api")
            .route("/health", web::get().to(health))
            .route("/auth/login", web::post().to(auth::login))
            .route("/auth/me", web::get().to(auth::me))
            .route("/categories", web::get().to(categories::list_categories))
            .route("/categories", web::post().to(categories::create_category))
            .route(
                "/categories/slug/{slug}",
                web::get().to(categories::get_category_by_slug),
            )
            .route("/categories/{id}", web::get().to(categories::get_category))
            .route("/categories/{id}", web::patch().to(categories::update_category))
            .route("/categories/{id}", web::delete().to(categories::delete_category))
            .route(
                "/categories/{category_id}/images",
                web::get().to(categories::list_category_images),
            )
            .route(
                "/categories/{category_id}/images",
                web::post().to(categories::create_category_image),
            )
            .route(
                "/category-images/{id}",
                web::delete().to(categories::delete_category_image),
            )
            .route("/products", web::get().to(products::list_products))
            .route("/products", web::post().to(products::create_product))
            .route(
                "/products/slug/{slug}",
                web::get().to(products::get_product_by_slug),
            )
            .route(
                "/products/category/{category_id}",
                web::get().to(products::list_products_by_category),
            )
            .route("/products/{id}", web::get().to(products::get_product))
            .route("/products/{id}", web::patch().to(products::update_product))
            .route("/products/{id}", web::delete().to(products::delete_product))
            .route(
                "/products/{id}/whatsapp",
                web::get().to(products::whatsapp_link),
            )
            .route(
                "/products/{product_id}/images",
                web::get().to(products::list_product_images),
            )
            .route(
                "/products/{product_id}/images",
                web::post().to(products::create_product_image),
            )
            .route(
                "/product-images/{id}",
                web::delete().to(products::delete_product_image),
            )
            .route("/hero-images", web::get().to(hero_images::list_hero_images))
            .route("/hero-images", web::post().to(hero_images::create_hero_image))
            .route(
                "/hero-images/{id}",
                web::delete().to(hero_images::delete_hero_image),
            )
            .route("/settings", web::get().to(settings::get_settings))
            .route("/settings", web::patch().to(settings::update_settings))
            .route("/upload", web::post().to(upload::upload_image)),
    );
}
