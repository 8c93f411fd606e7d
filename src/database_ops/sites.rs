//! Site and SiteImage persistence.
//!
//! A site is replaced wholesale on every import; its images are deleted and
//! recreated so the stored set always mirrors the latest run.

use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::db::Db;
use crate::normalization::{decimal_text, NormalizedRecord, COORD_SCALE, MEASURE_SCALE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Persisted survey site. Decimal columns hold fixed-scale text.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Site {
    pub id: i64,
    pub farmer_name: String,
    pub farmer_name_ar: Option<String>,
    pub region: String,
    pub region_ar: Option<String>,
    pub governorate: String,
    pub governorate_ar: Option<String>,
    pub latitude: String,
    pub longitude: String,
    pub crop_type: String,
    pub crop_type_ar: Option<String>,
    pub water_source: String,
    pub water_source_ar: Option<String>,
    pub irrigation_system_type: String,
    pub irrigation_system_type_ar: Option<String>,
    pub distribution_uniformity_pct: Option<String>,
    pub number_of_trees: Option<i64>,
    pub area_m2: Option<String>,
    pub description: String,
    pub description_ar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SiteImage {
    pub id: i64,
    pub site_id: i64,
    /// Path relative to the media root.
    pub image: String,
    pub sort_order: i64,
}

/// A site with its images in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteWithImages {
    #[serde(flatten)]
    pub site: Site,
    pub images: Vec<SiteImage>,
}

const UPSERT_SITE_SQL: &str = r#"
INSERT INTO sites (
    id, farmer_name, farmer_name_ar, region, region_ar, governorate, governorate_ar,
    latitude, longitude, crop_type, crop_type_ar, water_source, water_source_ar,
    irrigation_system_type, irrigation_system_type_ar, distribution_uniformity_pct,
    number_of_trees, area_m2, description, description_ar
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (id) DO UPDATE SET
    farmer_name = excluded.farmer_name,
    farmer_name_ar = excluded.farmer_name_ar,
    region = excluded.region,
    region_ar = excluded.region_ar,
    governorate = excluded.governorate,
    governorate_ar = excluded.governorate_ar,
    latitude = excluded.latitude,
    longitude = excluded.longitude,
    crop_type = excluded.crop_type,
    crop_type_ar = excluded.crop_type_ar,
    water_source = excluded.water_source,
    water_source_ar = excluded.water_source_ar,
    irrigation_system_type = excluded.irrigation_system_type,
    irrigation_system_type_ar = excluded.irrigation_system_type_ar,
    distribution_uniformity_pct = excluded.distribution_uniformity_pct,
    number_of_trees = excluded.number_of_trees,
    area_m2 = excluded.area_m2,
    description = excluded.description,
    description_ar = excluded.description_ar
"#;

impl Db {
    /// Create or overwrite the site for `rec.id`.
    pub async fn upsert_site(&self, rec: &NormalizedRecord) -> Result<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM sites WHERE id = ?")
            .bind(rec.id)
            .fetch_optional(&mut *tx)
            .await?;

        sqlx::query(UPSERT_SITE_SQL)
            .bind(rec.id)
            .bind(&rec.farmer_name)
            .bind(&rec.farmer_name_ar)
            .bind(&rec.region)
            .bind(&rec.region_ar)
            .bind(&rec.governorate)
            .bind(&rec.governorate_ar)
            .bind(decimal_text(&rec.latitude, COORD_SCALE))
            .bind(decimal_text(&rec.longitude, COORD_SCALE))
            .bind(&rec.crop_type)
            .bind(&rec.crop_type_ar)
            .bind(&rec.water_source)
            .bind(&rec.water_source_ar)
            .bind(&rec.irrigation_system_type)
            .bind(&rec.irrigation_system_type_ar)
            .bind(
                rec.distribution_uniformity_pct
                    .as_ref()
                    .map(|d| decimal_text(d, MEASURE_SCALE)),
            )
            .bind(rec.number_of_trees)
            .bind(rec.area_m2.as_ref().map(|d| decimal_text(d, MEASURE_SCALE)))
            .bind(&rec.description)
            .bind(&rec.description_ar)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(if exists.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }

    /// Remove every image row of a site. Returns the number deleted.
    pub async fn clear_site_images(&self, site_id: i64) -> Result<u64> {
        let res = sqlx::query("DELETE FROM site_images WHERE site_id = ?")
            .bind(site_id)
            .execute(&self.pool)
            .await?;
        debug!(site_id, deleted = res.rows_affected(), "cleared site images");
        Ok(res.rows_affected())
    }

    pub async fn insert_site_image(
        &self,
        site_id: i64,
        image: &str,
        sort_order: i64,
    ) -> Result<i64> {
        let res = sqlx::query(
            "INSERT INTO site_images (site_id, image, sort_order) VALUES (?, ?, ?)",
        )
        .bind(site_id)
        .bind(image)
        .bind(sort_order)
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    /// Delete a site; its images go with it. Returns whether a row existed.
    pub async fn delete_site(&self, site_id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM sites WHERE id = ?")
            .bind(site_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn get_site(&self, site_id: i64) -> Result<Option<Site>> {
        let site = sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = ?")
            .bind(site_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(site)
    }

    pub async fn site_images(&self, site_id: i64) -> Result<Vec<SiteImage>> {
        let images = sqlx::query_as::<_, SiteImage>(
            "SELECT id, site_id, image, sort_order FROM site_images \
             WHERE site_id = ? ORDER BY sort_order, id",
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    /// Every site ordered by id, each with its images ordered by position.
    pub async fn list_sites_with_images(&self) -> Result<Vec<SiteWithImages>> {
        let sites = sqlx::query_as::<_, Site>("SELECT * FROM sites ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let images = sqlx::query_as::<_, SiteImage>(
            "SELECT id, site_id, image, sort_order FROM site_images \
             ORDER BY site_id, sort_order, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_site: HashMap<i64, Vec<SiteImage>> =
            images.into_iter().into_group_map_by(|img| img.site_id);

        Ok(sites
            .into_iter()
            .map(|site| {
                let images = by_site.remove(&site.id).unwrap_or_default();
                SiteWithImages { site, images }
            })
            .collect())
    }

    pub async fn count_sites(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM sites")
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn count_site_images(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM site_images")
            .fetch_one(&self.pool)
            .await?)
    }
}
