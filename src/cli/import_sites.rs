use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::orchestrator::{
    run_import, ImportConfig, ImportSummary, DEFAULT_MAX_IMAGES, DEFAULT_SHEET,
};
use crate::util::env as env_util;

/// Import SIO survey sites and their photos.
#[derive(Parser, Debug, Clone)]
#[command(name = "import_sites", version, about = "Import SIO survey sites and photos")]
pub struct ImportSitesArgs {
    /// Survey workbook (.xlsx/.xls/.ods) or delimited export (.csv/.tsv)
    #[arg(long)]
    pub excel: PathBuf,
    /// Directory whose subfolders hold per-site photos
    #[arg(long = "images-base")]
    pub images_base: PathBuf,
    #[arg(long, default_value = DEFAULT_SHEET)]
    pub sheet: String,
    /// Maximum photos attached per site
    #[arg(long = "max-images", default_value_t = DEFAULT_MAX_IMAGES)]
    pub max_images: usize,
    /// Overrides DATABASE_URL
    #[arg(long = "database-url")]
    pub database_url: Option<String>,
    /// Overrides MEDIA_ROOT
    #[arg(long = "media-root")]
    pub media_root: Option<PathBuf>,
    /// Print the run summary as JSON instead of the report lines
    #[arg(long)]
    pub json: bool,
}

impl ImportSitesArgs {
    pub fn into_config(self) -> ImportConfig {
        ImportConfig {
            excel: self.excel,
            images_base: self.images_base,
            sheet: self.sheet,
            max_images: self.max_images,
            database_url: self.database_url.unwrap_or_else(env_util::db_url),
            media_root: self.media_root.unwrap_or_else(env_util::media_root),
        }
    }
}

pub async fn run(args: ImportSitesArgs) -> Result<ImportSummary> {
    env_util::init_env();
    let json = args.json;
    let cfg = args.into_config();
    let summary = run_import(&cfg).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(summary)
}
