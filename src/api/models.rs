// API response models (DTOs)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database_ops::sites::{Site, SiteWithImages};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(Meta::now()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: Some(Meta::now()),
        }
    }
}

/// Metadata included in all enveloped responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub sites: Option<i64>,
    pub uptime_seconds: u64,
}

/// GeoJSON point; coordinates are `[lon, lat]`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ImageRef {
    /// Absolute URL of the stored photo.
    pub image: String,
    pub sort_order: i64,
}

/// Every site field except the coordinates, which live in the geometry.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SiteProperties {
    pub id: i64,
    pub farmer_name: String,
    pub farmer_name_ar: Option<String>,
    pub region: String,
    pub region_ar: Option<String>,
    pub governorate: String,
    pub governorate_ar: Option<String>,
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
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SiteFeature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: PointGeometry,
    pub properties: SiteProperties,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<SiteFeature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<SiteFeature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

impl SiteFeature {
    /// Build a feature, turning each stored image path into a URL with `image_url`.
    pub fn from_site(entry: SiteWithImages, image_url: impl Fn(&str) -> String) -> Self {
        let SiteWithImages { site, images } = entry;
        let Site {
            id,
            farmer_name,
            farmer_name_ar,
            region,
            region_ar,
            governorate,
            governorate_ar,
            latitude,
            longitude,
            crop_type,
            crop_type_ar,
            water_source,
            water_source_ar,
            irrigation_system_type,
            irrigation_system_type_ar,
            distribution_uniformity_pct,
            number_of_trees,
            area_m2,
            description,
            description_ar,
        } = site;

        // Stored values were validated decimals on the way in.
        let lon = longitude.parse::<f64>().unwrap_or(f64::NAN);
        let lat = latitude.parse::<f64>().unwrap_or(f64::NAN);

        Self {
            kind: "Feature".to_string(),
            geometry: PointGeometry {
                kind: "Point".to_string(),
                coordinates: [lon, lat],
            },
            properties: SiteProperties {
                id,
                farmer_name,
                farmer_name_ar,
                region,
                region_ar,
                governorate,
                governorate_ar,
                crop_type,
                crop_type_ar,
                water_source,
                water_source_ar,
                irrigation_system_type,
                irrigation_system_type_ar,
                distribution_uniformity_pct,
                number_of_trees,
                area_m2,
                description,
                description_ar,
                images: images
                    .into_iter()
                    .map(|img| ImageRef {
                        image: image_url(&img.image),
                        sort_order: img.sort_order,
                    })
                    .collect(),
            },
        }
    }
}
