use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub upload_folder: PathBuf,
    pub static_folder: PathBuf,
    pub max_upload_bytes: usize,
    pub allowed_poster_extensions: Vec<String>,
    pub csrf_enabled: bool,
    pub csrf_time_limit_secs: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://marquee.db?mode=rwc".to_string());

        let upload_folder =
            std::env::var("UPLOAD_FOLDER").unwrap_or_else(|_| "uploads".to_string()).into();
        let static_folder =
            std::env::var("STATIC_FOLDER").unwrap_or_else(|_| "static".to_string()).into();

        let max_upload_bytes: usize = match std::env::var("MAX_UPLOAD_BYTES") {
            Ok(s) => s.parse().context("MAX_UPLOAD_BYTES")?,
            Err(_) => 16 * 1024 * 1024,
        };

        let allowed_poster_extensions = parse_extensions(
            &std::env::var("ALLOWED_POSTER_EXTENSIONS")
                .unwrap_or_else(|_| "jpg,jpeg,png".to_string()),
        );
        if allowed_poster_extensions.is_empty() {
            anyhow::bail!("ALLOWED_POSTER_EXTENSIONS must name at least one extension");
        }

        let csrf_enabled = match std::env::var("CSRF_ENABLED") {
            Ok(s) => parse_bool(&s).context("CSRF_ENABLED")?,
            Err(_) => true,
        };

        let csrf_time_limit_secs: i64 =
            std::env::var("CSRF_TIME_LIMIT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(3600);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            upload_folder,
            static_folder,
            max_upload_bytes,
            allowed_poster_extensions,
            csrf_enabled,
            csrf_time_limit_secs,
        })
    }
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}
