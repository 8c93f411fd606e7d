//! End-to-end survey import: sheet -> normalized records -> sites + photos.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::database_ops::db::Db;
use crate::database_ops::sites::UpsertOutcome;
use crate::media::{attach_images, list_images, FolderIndex};
use crate::normalization::{BilingualColumnMap, NormalizedRecord, Repair, RowReader};
use crate::table::load_table;

pub const DEFAULT_SHEET: &str = "SIO";
pub const DEFAULT_MAX_IMAGES: usize = 4;

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub excel: PathBuf,
    pub images_base: PathBuf,
    pub sheet: String,
    pub max_images: usize,
    pub database_url: String,
    pub media_root: PathBuf,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub dropped: usize,
    pub swapped: usize,
    pub created: usize,
    pub updated: usize,
    pub with_images: usize,
    pub without_images: usize,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Rows: {}, dropped (missing id/coords): {}, auto-swapped lat/lon: {}",
            self.rows, self.dropped, self.swapped
        )?;
        write!(
            f,
            "Done. Created: {}, Updated: {}, With images: {}, Without images: {}",
            self.created, self.updated, self.with_images, self.without_images
        )
    }
}

/// Load and normalize every row. Returns accepted records in sheet order.
fn collect_records(
    cfg: &ImportConfig,
    summary: &mut ImportSummary,
) -> Result<Vec<NormalizedRecord>> {
    let table = load_table(&cfg.excel, &cfg.sheet)?;
    let companions = BilingualColumnMap::resolve(&table.headers, &table.columns);
    let reader = RowReader::new(&table.columns, &companions);

    let mut records = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        summary.rows += 1;
        let outcome = reader.normalize(row);
        if outcome.repair == Repair::Swapped {
            summary.swapped += 1;
        }
        match outcome.record {
            Some(rec) => records.push(rec),
            None => {
                summary.dropped += 1;
                // +1 for the header row, +1 for 1-based sheet numbering
                let sheet_row = idx + table.header_row + 2;
                info!(sheet_row, "dropping row without id or coordinates");
            }
        }
    }
    Ok(records)
}

/// Upsert one site, replace its images, and return whether any were attached.
async fn import_site(
    db: &Db,
    folders: &FolderIndex,
    cfg: &ImportConfig,
    rec: &NormalizedRecord,
    summary: &mut ImportSummary,
) -> Result<bool> {
    match db.upsert_site(rec).await? {
        UpsertOutcome::Created => summary.created += 1,
        UpsertOutcome::Updated => summary.updated += 1,
    }
    db.clear_site_images(rec.id).await?;

    let Some(folder) = folders.best_match(&rec.region, &rec.governorate, rec.id) else {
        info!(
            site_id = rec.id,
            region = %rec.region,
            governorate = %rec.governorate,
            "no photo folder matched"
        );
        return Ok(false);
    };

    let sources = match list_images(&folder.path) {
        Ok(sources) => sources,
        Err(err) => {
            warn!(
                site_id = rec.id,
                folder = %folder.path.display(),
                error = %err,
                "cannot read photo folder"
            );
            return Ok(false);
        }
    };
    let attached = attach_images(
        &sources,
        &cfg.media_root,
        rec.id,
        &rec.region,
        &rec.governorate,
        cfg.max_images,
    )?;
    for image in &attached {
        db.insert_site_image(rec.id, &image.relative, image.sort_order)
            .await?;
    }
    info!(site_id = rec.id, folder = %folder.name, images = attached.len(), "attached photos");
    Ok(!attached.is_empty())
}

/// Run a full import. Fatal conditions surface before anything is written.
#[instrument(skip(cfg), fields(excel = %cfg.excel.display(), sheet = %cfg.sheet))]
pub async fn run_import(cfg: &ImportConfig) -> Result<ImportSummary> {
    if !cfg.excel.is_file() {
        bail!("Excel not found: {}", cfg.excel.display());
    }
    if !cfg.images_base.is_dir() {
        bail!("Images base not found: {}", cfg.images_base.display());
    }

    let mut summary = ImportSummary::default();
    let records = collect_records(cfg, &mut summary)?;
    let folders = FolderIndex::scan(&cfg.images_base).with_context(|| {
        format!("failed to scan images base {}", cfg.images_base.display())
    })?;
    info!(records = records.len(), folders = folders.len(), "starting site import");

    let db = Db::connect(&cfg.database_url, 1).await?;

    for rec in &records {
        let has_images = import_site(&db, &folders, cfg, rec, &mut summary)
            .await
            .with_context(|| format!("failed to import site {}", rec.id))?;
        if has_images {
            summary.with_images += 1;
        } else {
            summary.without_images += 1;
        }
    }

    info!(
        rows = summary.rows,
        dropped = summary.dropped,
        swapped = summary.swapped,
        created = summary.created,
        updated = summary.updated,
        with_images = summary.with_images,
        without_images = summary.without_images,
        "site import finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    struct Fixture {
        _dir: tempfile::TempDir,
        cfg: ImportConfig,
    }

    fn fixture(csv: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let excel = root.join("survey.csv");
        fs::write(&excel, csv).unwrap();

        let images = root.join("images");
        let eastern = images.join("1-Eastren_AlJandal");
        fs::create_dir_all(&eastern).unwrap();
        for name in ["img10.jpg", "img2.JPG", "img1.png", "readme.txt"] {
            fs::write(eastern.join(name), name.as_bytes()).unwrap();
        }
        fs::create_dir_all(images.join("northern_arar")).unwrap();

        let cfg = ImportConfig {
            excel,
            images_base: images,
            sheet: DEFAULT_SHEET.to_string(),
            max_images: 2,
            database_url: format!("sqlite://{}", root.join("sites.sqlite").display()),
            media_root: root.join("media"),
        };
        Fixture { _dir: dir, cfg }
    }

    const SURVEY: &str = "\
SIO survey,,,,,,
No.,Region,المنطقة,Governorate,Latitude,Longitude,Crop Type
1,Eastern,الشرقية,Al Jandal,39.1,29.8,Olive
2,Northern,الشمالية,Arar,30.97,41.03,Dates
3,Western,,Tabuk,,36.5,Olive
";

    async fn open(url: &str) -> Db {
        Db::connect(url, 1).await.unwrap()
    }

    fn exists(root: &Path, rel: &str) -> bool {
        root.join(rel).is_file()
    }

    #[tokio::test]
    async fn imports_sites_and_photos() {
        let fx = fixture(SURVEY);
        let summary = run_import(&fx.cfg).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                rows: 3,
                dropped: 1,
                swapped: 1,
                created: 2,
                updated: 0,
                with_images: 1,
                without_images: 1,
            }
        );

        let db = open(&fx.cfg.database_url).await;
        let site = db.get_site(1).await.unwrap().unwrap();
        assert_eq!(site.latitude, "29.800000");
        assert_eq!(site.longitude, "39.100000");
        assert_eq!(site.region_ar.as_deref(), Some("الشرقية"));

        let images = db.site_images(1).await.unwrap();
        let paths: Vec<&str> = images.iter().map(|i| i.image.as_str()).collect();
        assert_eq!(
            paths,
            vec!["photos/eastern_al_jandal/1_1.png", "photos/eastern_al_jandal/1_2.jpg"]
        );
        assert!(exists(&fx.cfg.media_root, paths[0]));
        assert_eq!(
            fs::read(fx.cfg.media_root.join(paths[1])).unwrap(),
            b"img2.JPG"
        );
        assert!(db.site_images(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn imports_from_workbook() {
        let mut fx = fixture(SURVEY);
        fx.cfg.excel = fx.cfg.excel.with_file_name("survey.xlsx");
        crate::table::testing::write_survey_xlsx(&fx.cfg.excel);

        let summary = run_import(&fx.cfg).await.unwrap();
        assert_eq!((summary.rows, summary.dropped, summary.swapped), (3, 1, 1));
        assert_eq!((summary.created, summary.with_images), (2, 1));

        let db = open(&fx.cfg.database_url).await;
        let site = db.get_site(1).await.unwrap().unwrap();
        assert_eq!(site.latitude, "29.800000");
        assert_eq!(site.region_ar.as_deref(), Some("الشرقية"));
        assert_eq!(db.site_images(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rerun_is_idempotent() {
        let fx = fixture(SURVEY);
        run_import(&fx.cfg).await.unwrap();
        let second = run_import(&fx.cfg).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 2);

        let db = open(&fx.cfg.database_url).await;
        assert_eq!(db.count_sites().await.unwrap(), 2);
        assert_eq!(db.count_site_images().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn missing_inputs_fail_before_writing() {
        let mut fx = fixture(SURVEY);
        fx.cfg.images_base = fx.cfg.images_base.join("nope");
        let err = run_import(&fx.cfg).await.unwrap_err();
        assert!(err.to_string().starts_with("Images base not found"));

        fx.cfg.excel = fx.cfg.excel.with_file_name("missing.xlsx");
        let err = run_import(&fx.cfg).await.unwrap_err();
        assert!(err.to_string().starts_with("Excel not found"));
        assert!(!fx.cfg.media_root.exists());
    }

    #[tokio::test]
    async fn missing_columns_abort_the_run() {
        let fx = fixture("Region,Latitude\nEastern,31\nNorthern,30\n");
        let err = run_import(&fx.cfg).await.unwrap_err();
        assert!(err.to_string().contains("missing required columns"));
    }

    #[test]
    fn summary_renders_report_lines() {
        let s = ImportSummary {
            rows: 5,
            dropped: 1,
            swapped: 2,
            created: 3,
            updated: 1,
            with_images: 2,
            without_images: 2,
        };
        assert_eq!(
            s.to_string(),
            "Rows: 5, dropped (missing id/coords): 1, auto-swapped lat/lon: 2\n\
             Done. Created: 3, Updated: 1, With images: 2, Without images: 2"
        );
    }
}
