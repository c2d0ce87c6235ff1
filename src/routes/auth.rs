use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::{create_token, verify_password, AdminUser};
use crate::error::ApiError;
use crate::models::LoginRequest;
use crate::{blocking, AppState};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { username, password } = body.into_inner();
    let lookup = username.clone();
    let verified = blocking(&data, move |storage| {
        Ok(storage
            .get_user_by_username(&lookup)?
            .is_some_and(|user| verify_password(&password, &user.password)))
    })
    .await?;

    if !verified {
        tracing::warn!(%username, "failed login");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = create_token(&username, &data.auth.jwt_secret, data.auth.token_ttl_hours)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    tracing::info!(%username, "admin logged in");
    Ok(HttpResponse::Ok().json(json!({ "token": token, "username": username })))
}

pub async fn me(admin: AdminUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "username": admin.username }))
}
