use serde::Serialize;

use crate::entities::movie;

pub const POSTER_URL_PREFIX: &str = "/api/v1/posters/";

#[derive(Debug, Serialize)]
pub struct Greeting {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CsrfToken {
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub poster: String,
}

impl From<movie::Model> for MovieSummary {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            poster: format!("{POSTER_URL_PREFIX}{}", m.poster),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovieList {
    pub movies: Vec<MovieSummary>,
}

#[derive(Debug, Serialize)]
pub struct CreatedMovie {
    pub message: &'static str,
    pub title: String,
    pub poster: String,
    pub description: String,
}
