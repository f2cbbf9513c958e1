use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info};

use crate::{
    AppState, csrf,
    error::{AppError, AppResult},
    forms::{self, CsrfCheck, FormRules, MovieForm},
    models::{CreatedMovie, CsrfToken, Greeting, MovieList, MovieSummary},
    posters::is_plain_filename,
    templates,
};

pub async fn index() -> Json<Greeting> {
    Json(Greeting { message: "This is the beginning of our API" })
}

pub async fn csrf_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<CsrfToken>) {
    let (jar, csrf_token) = csrf::issue(jar, state.config.csrf_time_limit_secs);
    (jar, Json(CsrfToken { csrf_token }))
}

pub async fn list_movies(State(state): State<Arc<AppState>>) -> AppResult<Json<MovieList>> {
    let movies = state.movies.list_all().await?;
    Ok(Json(MovieList { movies: movies.into_iter().map(MovieSummary::from).collect() }))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<CreatedMovie>)> {
    let multipart = multipart.map_err(|rejection| {
        AppError::Validation(vec![forms::field_error("Form", &rejection.body_text())])
    })?;

    let mut form = MovieForm::from_multipart(multipart).await?;
    if form.csrf_token.is_none() {
        form.csrf_token = csrf::header_token(&headers);
    }

    let csrf = if state.config.csrf_enabled {
        CsrfCheck::Enabled { session: csrf::session_token(&jar) }
    } else {
        CsrfCheck::Disabled
    };
    let rules = FormRules { allowed_extensions: &state.config.allowed_poster_extensions, csrf };

    let movie = forms::validate(form, rules).map_err(|errors| {
        debug!(?errors, "movie form rejected");
        AppError::Validation(errors)
    })?;

    debug!(
        poster = %movie.poster.filename,
        content_type = ?movie.poster.content_type,
        size = movie.poster.bytes.len(),
        "storing poster"
    );
    state.posters.save(&movie.poster.bytes, &movie.poster.filename).await?;

    let created = state
        .movies
        .insert(&movie.title, &movie.description, &movie.poster.filename, jiff::Timestamp::now())
        .await?;

    info!(movie_id = created.id, poster = %created.poster, "movie created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedMovie {
            message: "Movie Successfully added",
            title: created.title,
            poster: created.poster,
            description: created.description,
        }),
    ))
}

pub async fn poster(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let poster = state.posters.read(&filename).await?;
    Ok(([(header::CONTENT_TYPE, poster.content_type)], poster.bytes).into_response())
}

pub async fn text_file(State(state): State<Arc<AppState>>, Path(file): Path<String>) -> Response {
    if !file.ends_with(".txt") || !is_plain_filename(&file) {
        return not_found().await;
    }

    match tokio::fs::read(state.config.static_folder.join(&file)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], bytes).into_response(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => not_found().await,
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html(templates::not_found_page())).into_response()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::{
        Router,
        body::Body,
        http::{Method, Request},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::{config::Config, movies::MovieStore, posters::PosterStore};

    use super::*;

    const BOUNDARY: &str = "marquee-test-boundary";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

    struct TestApp {
        router: Router,
        uploads: TempDir,
        _static: TempDir,
    }

    async fn app_with(csrf_enabled: bool) -> TestApp {
        let uploads = TempDir::new().unwrap();
        let statics = TempDir::new().unwrap();
        std::fs::write(statics.path().join("humans.txt"), "Made by people.\n").unwrap();

        let config = Config {
            addr: "127.0.0.1:0".parse().unwrap(),
            database_url: "sqlite::memory:".to_string(),
            upload_folder: uploads.path().to_path_buf(),
            static_folder: PathBuf::from(statics.path()),
            max_upload_bytes: 1024 * 1024,
            allowed_poster_extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
            csrf_enabled,
            csrf_time_limit_secs: 3600,
        };
        let state = Arc::new(AppState {
            movies: MovieStore::new(crate::db::in_memory().await),
            posters: PosterStore::new(&config.upload_folder),
            config: Arc::new(config),
        });

        TestApp { router: crate::router(state), uploads, _static: statics }
    }

    async fn app() -> TestApp {
        app_with(false).await
    }

    fn multipart_body(fields: &[(&str, &str)], poster: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, bytes)) = poster {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"poster\"; filename=\"{filename}\"\r\nContent-Type: image/jpeg\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post_movie() -> axum::http::request::Builder {
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/movies")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
    }

    fn inception() -> Vec<u8> {
        multipart_body(
            &[("title", "Inception"), ("description", "A thief...")],
            Some(("valid.jpg", JPEG)),
        )
    }

    async fn send(router: &Router, req: Request<Body>) -> Response {
        router.clone().oneshot(req).await.unwrap()
    }

    async fn get(router: &Router, uri: &str) -> Response {
        send(router, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn create(router: &Router, body: Vec<u8>) -> Response {
        send(router, post_movie().body(Body::from(body)).unwrap()).await
    }

    async fn bytes(resp: Response) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    async fn json_body(resp: Response) -> Value {
        serde_json::from_slice(&bytes(resp).await).unwrap()
    }

    #[tokio::test]
    async fn index_greets_and_sets_common_headers() {
        let app = app().await;
        let resp = get(&app.router, "/").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-ua-compatible"], "IE=Edge,chrome=1");
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "public, max-age=0");
        assert_eq!(json_body(resp).await, json!({ "message": "This is the beginning of our API" }));
    }

    #[tokio::test]
    async fn create_returns_201_with_summary() {
        let app = app().await;
        let resp = create(&app.router, inception()).await;

        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(
            json_body(resp).await,
            json!({
                "message": "Movie Successfully added",
                "title": "Inception",
                "poster": "valid.jpg",
                "description": "A thief..."
            })
        );
        assert_eq!(std::fs::read(app.uploads.path().join("valid.jpg")).unwrap(), JPEG);
    }

    #[tokio::test]
    async fn created_movie_appears_in_listing() {
        let app = app().await;
        assert_eq!(create(&app.router, inception()).await.status(), StatusCode::CREATED);

        let resp = get(&app.router, "/api/v1/movies").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            json!({
                "movies": [{
                    "id": 1,
                    "title": "Inception",
                    "description": "A thief...",
                    "poster": "/api/v1/posters/valid.jpg"
                }]
            })
        );
    }

    #[tokio::test]
    async fn listing_is_stable_without_writes() {
        let app = app().await;
        create(&app.router, inception()).await;

        let first = bytes(get(&app.router, "/api/v1/movies").await).await;
        let second = bytes(get(&app.router, "/api/v1/movies").await).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let app = app().await;
        let body = multipart_body(
            &[("title", ""), ("description", "A thief...")],
            Some(("valid.jpg", JPEG)),
        );
        let resp = create(&app.router, body).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await,
            json!({ "errors": ["Error in the Title field - This field is required."] })
        );
    }

    #[tokio::test]
    async fn missing_title_mentions_title_and_stores_nothing() {
        let app = app().await;
        let body = multipart_body(&[("description", "A thief...")], Some(("valid.jpg", JPEG)));
        let resp = create(&app.router, body).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers()["x-ua-compatible"], "IE=Edge,chrome=1");
        let body = json_body(resp).await;
        let errors = body["errors"].as_array().unwrap();
        assert!(errors.iter().any(|e| e.as_str().unwrap().contains("Title field")));

        assert!(!app.uploads.path().join("valid.jpg").exists());
        let listing = json_body(get(&app.router, "/api/v1/movies").await).await;
        assert_eq!(listing, json!({ "movies": [] }));
    }

    #[tokio::test]
    async fn non_multipart_post_is_a_validation_error() {
        let app = app().await;
        let req = Request::post("/api/v1/movies")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = send(&app.router, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn poster_is_served_back() {
        let app = app().await;
        create(&app.router, inception()).await;

        let resp = get(&app.router, "/api/v1/posters/valid.jpg").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(bytes(resp).await, JPEG);
    }

    #[tokio::test]
    async fn missing_poster_is_plain_404() {
        let app = app().await;
        let resp = get(&app.router, "/api/v1/posters/missing.jpg").await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = String::from_utf8(bytes(resp).await).unwrap();
        assert!(!body.contains("<html"));
    }

    #[tokio::test]
    async fn unknown_route_renders_not_found_page() {
        let app = app().await;
        for uri in ["/nonexistent-route", "/api/v1/nothing/here"] {
            let resp = get(&app.router, uri).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            assert_eq!(resp.headers()[header::CACHE_CONTROL], "public, max-age=0");
            let body = String::from_utf8(bytes(resp).await).unwrap();
            assert!(body.contains("Page Not Found"), "{uri}");
        }
    }

    #[tokio::test]
    async fn other_methods_on_unknown_routes_render_not_found_page() {
        let app = app().await;
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let req = Request::builder()
                .method(method.clone())
                .uri("/nonexistent-route")
                .body(Body::empty())
                .unwrap();
            let resp = send(&app.router, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method}");
            let body = String::from_utf8(bytes(resp).await).unwrap();
            assert!(body.contains("Page Not Found"), "{method}");
        }
    }

    #[tokio::test]
    async fn text_files_are_served_from_static_folder() {
        let app = app().await;
        let resp = get(&app.router, "/humans.txt").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(bytes(resp).await, b"Made by people.\n");

        let resp = get(&app.router, "/robots.txt").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = String::from_utf8(bytes(resp).await).unwrap();
        assert!(body.contains("Page Not Found"));
    }

    #[tokio::test]
    async fn csrf_token_is_required_when_enabled() {
        let app = app_with(true).await;

        let resp = create(&app.router, inception()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await,
            json!({ "errors": ["Error in the CSRF Token field - The CSRF session token is missing."] })
        );

        let resp = get(&app.router, "/api/v1/csrf-token").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        let token = json_body(resp).await["csrf_token"].as_str().unwrap().to_string();
        assert_eq!(cookie, format!("csrf_token={token}"));

        let req = post_movie()
            .header(header::COOKIE, &cookie)
            .header("x-csrftoken", "forged")
            .body(Body::from(inception()))
            .unwrap();
        let resp = send(&app.router, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await,
            json!({ "errors": ["Error in the CSRF Token field - The CSRF tokens do not match."] })
        );

        let req = post_movie()
            .header(header::COOKIE, &cookie)
            .header("x-csrftoken", &token)
            .body(Body::from(inception()))
            .unwrap();
        assert_eq!(send(&app.router, req).await.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn csrf_token_can_travel_in_the_form() {
        let app = app_with(true).await;
        let resp = get(&app.router, "/api/v1/csrf-token").await;
        let token = json_body(resp).await["csrf_token"].as_str().unwrap().to_string();

        let body = multipart_body(
            &[("csrf_token", token.as_str()), ("title", "Heat"), ("description", "Cops and robbers")],
            Some(("heat.png", JPEG)),
        );
        let req = post_movie()
            .header(header::COOKIE, format!("csrf_token={token}"))
            .body(Body::from(body))
            .unwrap();
        assert_eq!(send(&app.router, req).await.status(), StatusCode::CREATED);
    }
}
