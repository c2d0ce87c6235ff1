use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use storefront::config::{AppConfig, UploadBackend};
use storefront::images::{CloudinaryHost, ImageHost, LocalDiskHost};
use storefront::{db, routes, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storefront=info,actix_web=info")),
        )
        .init();

    let settings = AppConfig::load().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let storage = db::open_storage(&settings).map_err(io::Error::other)?;

    let images: Arc<dyn ImageHost> = match settings.uploads.backend {
        UploadBackend::Local => Arc::new(LocalDiskHost::new(
            &settings.uploads.dir,
            &settings.uploads.public_path,
        )?),
        UploadBackend::Cloudinary => Arc::new(CloudinaryHost::new(settings.cloudinary.clone())),
    };

    let state = web::Data::new(AppState {
        storage,
        images,
        auth: settings.auth.clone(),
        max_upload_bytes: settings.uploads.max_bytes,
    });

    let uploads = settings.uploads.clone();
    let address = (settings.server.host.clone(), settings.server.port);
    tracing::info!(
        host = %address.0,
        port = address.1,
        storage = ?settings.storage,
        uploads = ?uploads.backend,
        "starting HTTP server"
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::configure)
            .configure(|cfg| {
                if uploads.backend == UploadBackend::Local {
                    cfg.service(routes::uploads_service(&uploads));
                }
            })
    })
    .bind(address)?
    .run()
    .await
}
