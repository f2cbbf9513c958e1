mod config;
mod csrf;
mod db;
mod entities;
mod error;
mod forms;
mod models;
mod movies;
mod posters;
mod routes;
mod templates;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, header},
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{config::Config, movies::MovieStore, posters::PosterStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub movies: MovieStore,
    pub posters: PosterStore,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,marquee=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = db::connect_and_migrate(config.database_url.as_str()).await?;
    let posters = PosterStore::new(&config.upload_folder);
    posters.ensure_dir().await?;

    tracing::info!(
        uploads = %posters.dir().display(),
        statics = %config.static_folder.display(),
        csrf = config.csrf_enabled,
        "storage ready"
    );

    let state = Arc::new(AppState { config: config.clone(), movies: MovieStore::new(db), posters });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/", get(routes::index))
        .route("/api/v1/csrf-token", get(routes::csrf_token))
        .route(
            "/api/v1/movies",
            get(routes::list_movies).post(routes::create_movie).layer(upload_limit),
        )
        .route("/api/v1/posters/{filename}", get(routes::poster))
        .route("/{file}", get(routes::text_file).fallback(routes::not_found))
        .fallback(routes::not_found)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-ua-compatible"),
            HeaderValue::from_static("IE=Edge,chrome=1"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=0"),
        ))
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
