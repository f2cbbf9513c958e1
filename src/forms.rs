//! Movie creation form: multipart decoding and field validation.
//!
//! Validation never fails the request cycle by itself. It hands back the
//! ordered list of messages so the handler can answer with a 400 body.

use std::path::Path;

use axum::{body::Bytes, extract::Multipart};

use crate::{error::AppError, posters::is_plain_filename};

const REQUIRED: &str = "This field is required.";

#[derive(Clone, Debug)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct MovieForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub poster: Option<Upload>,
    pub csrf_token: Option<String>,
}

#[derive(Debug)]
pub struct ValidMovie {
    pub title: String,
    pub description: String,
    pub poster: Upload,
}

#[derive(Clone, Copy, Debug)]
pub enum CsrfCheck<'a> {
    Disabled,
    /// Compare the submitted token with the one bound to the session cookie.
    Enabled { session: Option<&'a str> },
}

#[derive(Clone, Copy, Debug)]
pub struct FormRules<'a> {
    pub allowed_extensions: &'a [String],
    pub csrf: CsrfCheck<'a>,
}

pub fn field_error(label: &str, violation: &str) -> String {
    format!("Error in the {label} field - {violation}")
}

impl MovieForm {
    /// Reads the known fields out of a multipart body; unknown fields are skipped.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MovieForm::default();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match name.as_str() {
                "title" if form.title.is_none() => {
                    form.title = Some(field.text().await.map_err(malformed)?);
                },
                "description" if form.description.is_none() => {
                    form.description = Some(field.text().await.map_err(malformed)?);
                },
                "csrf_token" if form.csrf_token.is_none() => {
                    form.csrf_token = Some(field.text().await.map_err(malformed)?);
                },
                "poster" if form.poster.is_none() => {
                    // Browsers send an empty filename when no file was picked.
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_owned);
                    let bytes = field.bytes().await.map_err(malformed)?;
                    if !filename.is_empty() {
                        form.poster = Some(Upload { filename, content_type, bytes });
                    }
                },
                _ => {},
            }
        }

        Ok(form)
    }
}

fn malformed(err: axum::extract::multipart::MultipartError) -> AppError {
    tracing::warn!(error = %err, "unreadable multipart body");
    AppError::Validation(vec![field_error("Form", &err.body_text())])
}

pub fn validate(form: MovieForm, rules: FormRules<'_>) -> Result<ValidMovie, Vec<String>> {
    let mut errors = Vec::new();

    let title = required_text(form.title, "Title", &mut errors);
    let description = required_text(form.description, "Description", &mut errors);

    let poster = match form.poster {
        None => {
            errors.push(field_error("Poster", REQUIRED));
            None
        },
        Some(upload) => match poster_violation(&upload.filename, rules.allowed_extensions) {
            Some(violation) => {
                errors.push(field_error("Poster", &violation));
                None
            },
            None => Some(upload),
        },
    };

    // Checked after the declared fields, so its message comes last.
    if let CsrfCheck::Enabled { session } = rules.csrf {
        if let Some(violation) = csrf_violation(form.csrf_token.as_deref(), session) {
            errors.push(field_error("CSRF Token", violation));
        }
    }

    match (title, description, poster) {
        (Some(title), Some(description), Some(poster)) if errors.is_empty() => {
            Ok(ValidMovie { title, description, poster })
        },
        _ => Err(errors),
    }
}

fn required_text(value: Option<String>, label: &str, errors: &mut Vec<String>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            errors.push(field_error(label, REQUIRED));
            None
        },
    }
}

fn poster_violation(filename: &str, allowed: &[String]) -> Option<String> {
    if !is_plain_filename(filename) {
        return Some("Invalid file name.".to_string());
    }
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(ext) if allowed.iter().any(|a| *a == ext) => None,
        _ => Some(format!("File does not have an approved extension: {}", allowed.join(", "))),
    }
}

fn csrf_violation(submitted: Option<&str>, session: Option<&str>) -> Option<&'static str> {
    let Some(session) = session.filter(|s| !s.is_empty()) else {
        return Some("The CSRF session token is missing.");
    };
    match submitted.map(str::trim).filter(|s| !s.is_empty()) {
        None => Some("The CSRF token is missing."),
        Some(token) if token != session => Some("The CSRF tokens do not match."),
        Some(_) => None,
    }
}
