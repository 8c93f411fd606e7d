// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/api")
                // Map layer feed, with and without the trailing slash
                .route("/sites/", web::get().to(handlers::sites_geojson))
                .route("/sites", web::get().to(handlers::sites_geojson)),
        );
}
