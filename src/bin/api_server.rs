// HTTP API server binary: serves imported sites as GeoJSON plus their photos

use anyhow::Result;
use siofieldmap::api::ApiServer;
use siofieldmap::database_ops::db::Db;
use siofieldmap::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    siofieldmap::tracing::init_tracing("info,sqlx=warn")?;
    env_util::bootstrap_cli("api_server");

    env_util::preflight_check(
        "api_server",
        &[],
        &["API_HOST", "API_PORT", "ALLOWED_ORIGINS", "MEDIA_URL", "MEDIA_ROOT", "DATABASE_URL"],
    )?;

    let server = ApiServer::from_env()?;

    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 5u32);
    let db = Db::connect(&env_util::db_url(), max_connections).await?;
    tracing::info!("Database connected successfully");

    server.run(db).await?;

    Ok(())
}
