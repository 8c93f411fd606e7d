// API server implementation using actix-web

use crate::api::handlers::{normalize_media_url, ApiState};
use crate::api::{middleware, routes};
use crate::database_ops::db::Db;
use crate::util::env as env_util;
use actix_files::Files;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DEFAULT_MEDIA_URL: &str = "/media/";

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    pub media_url: String,
    pub media_root: PathBuf,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        env_util::init_env();

        let host = env_util::env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match env_util::env_opt("API_PORT") {
            Some(raw) => raw.trim().parse().context("Invalid API_PORT")?,
            None => 8080,
        };
        let allowed_origins = env_util::env_opt("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://localhost:8000".to_string());
        let media_url = env_util::env_opt("MEDIA_URL")
            .map(|u| normalize_media_url(&u))
            .unwrap_or_else(|| DEFAULT_MEDIA_URL.to_string());

        Ok(Self {
            host,
            port,
            allowed_origins,
            media_url,
            media_root: env_util::media_root(),
        })
    }

    /// Start the HTTP server
    pub async fn run(self, db: Db) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            media_url = %self.media_url,
            media_root = %self.media_root.display(),
            "Starting siofieldmap API server"
        );

        let db_data = web::Data::new(db);
        let state = web::Data::new(ApiState::new(&self.media_url));
        let allowed_origins = self.allowed_origins.clone();
        // Only a path prefix can be mounted locally; absolute MEDIA_URLs point elsewhere.
        let mount = self
            .media_url
            .starts_with('/')
            .then(|| self.media_url.trim_end_matches('/').to_string());
        let media_root = self.media_root.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            let mut app = App::new()
                .app_data(db_data.clone())
                .app_data(state.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes);
            if let Some(prefix) = &mount {
                app = app.service(Files::new(prefix, &media_root));
            }
            app
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
