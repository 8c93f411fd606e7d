use anyhow::Result;
use clap::Parser;
use siofieldmap::cli::import_sites::{run, ImportSitesArgs};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    siofieldmap::tracing::init_tracing("info,sqlx=warn")?;
    siofieldmap::util::env::bootstrap_cli("import_sites");

    run(ImportSitesArgs::parse()).await?;
    Ok(())
}
