// HTTP request handlers for API endpoints

use crate::api::models::*;
use crate::database_ops::db::Db;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use std::time::Instant;
use url::Url;

/// Shared, read-only settings for handlers.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub started: Instant,
    /// URL prefix media files are served under, always ending in `/`.
    pub media_url: String,
}

impl ApiState {
    pub fn new(media_url: &str) -> Self {
        Self {
            started: Instant::now(),
            media_url: normalize_media_url(media_url),
        }
    }
}

/// `media` -> `/media/`; leaves absolute URLs untouched apart from the trailing slash.
pub fn normalize_media_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = if trimmed.contains("://") || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };
    if !out.ends_with('/') {
        out.push('/');
    }
    out
}

/// Absolute URL for a stored media path, resolved against the request host.
fn absolute_media_url(req: &HttpRequest, media_url: &str, relative: &str) -> String {
    let conn = req.connection_info();
    let origin = format!("{}://{}/", conn.scheme(), conn.host());
    Url::parse(&origin)
        .and_then(|base| base.join(media_url))
        .and_then(|media| media.join(relative))
        .map(String::from)
        .unwrap_or_else(|_| format!("{}{}", media_url, relative))
}

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>, state: web::Data<ApiState>) -> Result<HttpResponse> {
    let (database, sites) = if db.ping().await {
        ("connected", db.count_sites().await.ok())
    } else {
        ("disconnected", None)
    };

    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
        sites,
        uptime_seconds: state.started.elapsed().as_secs(),
    });

    Ok(HttpResponse::Ok().json(response))
}

/// All sites as a GeoJSON FeatureCollection
pub async fn sites_geojson(
    req: HttpRequest,
    db: web::Data<Db>,
    state: web::Data<ApiState>,
) -> Result<HttpResponse> {
    let sites = match db.list_sites_with_images().await {
        Ok(sites) => sites,
        Err(e) => {
            tracing::error!(error = %e, "failed to load sites");
            return Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("failed to load sites")));
        }
    };

    let features = sites
        .into_iter()
        .map(|entry| {
            SiteFeature::from_site(entry, |rel| absolute_media_url(&req, &state.media_url, rel))
        })
        .collect();

    Ok(HttpResponse::Ok().json(FeatureCollection::new(features)))
}
