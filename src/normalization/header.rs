//! Column header resolution for the survey sheet.
//!
//! Raw headers arrive in English, Arabic, or both, with punctuation noise
//! ("Latitude (N):", "Distribution uniformity %"). They are normalized and
//! looked up in a fixed alias table to produce a [`ColumnMap`]; a second pass
//! locates the Arabic companion column for the bilingual fields.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Internal field keys a sheet column can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Id,
    FarmerName,
    Region,
    Governorate,
    Longitude,
    Latitude,
    CropType,
    WaterSource,
    IrrigationSystemType,
    DistributionUniformityPct,
    NumberOfTrees,
    AreaM2,
    Description,
}

impl FieldKey {
    /// Every key, in alias-table declaration order.
    pub const ALL: [FieldKey; 13] = [
        FieldKey::Id,
        FieldKey::FarmerName,
        FieldKey::Region,
        FieldKey::Governorate,
        FieldKey::Longitude,
        FieldKey::Latitude,
        FieldKey::CropType,
        FieldKey::WaterSource,
        FieldKey::IrrigationSystemType,
        FieldKey::DistributionUniformityPct,
        FieldKey::NumberOfTrees,
        FieldKey::AreaM2,
        FieldKey::Description,
    ];

    /// Keys that must resolve for a sheet to be importable.
    pub const REQUIRED: [FieldKey; 5] = [
        FieldKey::Id,
        FieldKey::Region,
        FieldKey::Governorate,
        FieldKey::Longitude,
        FieldKey::Latitude,
    ];

    /// Keys that may carry an Arabic companion column.
    pub const BILINGUAL: [FieldKey; 7] = [
        FieldKey::FarmerName,
        FieldKey::Region,
        FieldKey::Governorate,
        FieldKey::CropType,
        FieldKey::WaterSource,
        FieldKey::IrrigationSystemType,
        FieldKey::Description,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::Id => "id",
            FieldKey::FarmerName => "farmer_name",
            FieldKey::Region => "region",
            FieldKey::Governorate => "governorate",
            FieldKey::Longitude => "longitude",
            FieldKey::Latitude => "latitude",
            FieldKey::CropType => "crop_type",
            FieldKey::WaterSource => "water_source",
            FieldKey::IrrigationSystemType => "irrigation_system_type",
            FieldKey::DistributionUniformityPct => "distribution_uniformity_pct",
            FieldKey::NumberOfTrees => "number_of_trees",
            FieldKey::AreaM2 => "area_m2",
            FieldKey::Description => "description",
        }
    }

    /// Accepted header spellings. Entries are normalized once on first use,
    /// so they may be written with the punctuation seen in real sheets.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            FieldKey::Id => &["no", "no.", "id"],
            FieldKey::FarmerName => &["farmer name"],
            FieldKey::Region => &["region"],
            FieldKey::Governorate => &["governorate"],
            FieldKey::Longitude => &["longitude", "lon", "long"],
            FieldKey::Latitude => &["latitude", "lat"],
            FieldKey::CropType => &["crop type"],
            FieldKey::WaterSource => &["water source"],
            FieldKey::IrrigationSystemType => &["irrigation system type"],
            FieldKey::DistributionUniformityPct => &[
                "distribution uniformity",
                "distribution uniformity %",
                "irrigation efficiency distribution uniformity",
                "irrigation efficiency percent distribution uniformity",
                "irrigation effecincy percent distribution uniformity",
                "irrgation effecincy distribution uniformity",
            ],
            FieldKey::NumberOfTrees => &["number of trees", "trees"],
            FieldKey::AreaM2 => &["area m2", "area"],
            FieldKey::Description => &["intervention description", "description"],
        }
    }

    /// Name of the companion field, e.g. `region_ar`.
    pub fn companion_key(self) -> String {
        format!("{}_ar", self.as_str())
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[()%.:;/,]+").expect("valid punctuation regex"));
static SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static ARABIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{0600}-\x{06FF}]").expect("valid arabic range regex"));
static AR_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\(ar\)|arabic|عرب|العربية)\b").expect("valid arabic marker regex")
});

static NORMALIZED_ALIASES: LazyLock<Vec<(FieldKey, Vec<String>)>> = LazyLock::new(|| {
    FieldKey::ALL
        .iter()
        .map(|key| {
            let aliases = key.aliases().iter().map(|a| normalize_header(a)).collect();
            (*key, aliases)
        })
        .collect()
});

/// Lowercase, turn `()%.:;/,` runs into spaces, collapse whitespace, trim.
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase().replace('\u{00A0}', " ");
    let depunct = PUNCT_RE.replace_all(&lowered, " ");
    SPACE_RE.replace_all(&depunct, " ").trim().to_string()
}

/// True when the header contains Arabic script.
pub fn is_arabic(header: &str) -> bool {
    ARABIC_RE.is_match(header)
}

fn looks_like_companion(header: &str) -> bool {
    is_arabic(header) || AR_MARKER_RE.is_match(header)
}

/// A header located in the table: its column index and verbatim text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub index: usize,
    pub header: String,
}

/// Internal field key -> sheet column. Built once per load.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: HashMap<FieldKey, ResolvedColumn>,
}

impl ColumnMap {
    pub fn resolve(headers: &[String]) -> Self {
        // The left-most of duplicate headers wins.
        let mut by_norm: HashMap<String, usize> = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            by_norm.entry(normalize_header(header)).or_insert(idx);
        }

        let mut columns = HashMap::new();
        for (key, aliases) in NORMALIZED_ALIASES.iter() {
            if let Some(&index) = aliases.iter().find_map(|alias| by_norm.get(alias)) {
                columns.insert(
                    *key,
                    ResolvedColumn {
                        index,
                        header: headers[index].clone(),
                    },
                );
            }
        }
        Self { columns }
    }

    pub fn get(&self, key: FieldKey) -> Option<&ResolvedColumn> {
        self.columns.get(&key)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.columns.contains_key(&key)
    }

    /// Required keys that did not resolve, in declaration order.
    pub fn missing_required(&self) -> Vec<FieldKey> {
        FieldKey::REQUIRED
            .iter()
            .copied()
            .filter(|k| !self.contains(*k))
            .collect()
    }

    pub fn has_required(&self) -> bool {
        self.missing_required().is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Bilingual field -> Arabic companion column (if one was found).
#[derive(Debug, Clone, Default)]
pub struct BilingualColumnMap {
    companions: HashMap<FieldKey, ResolvedColumn>,
}

impl BilingualColumnMap {
    /// Right neighbour first, then the first Arabic header anywhere in the
    /// table. The fallback is shared: every field without a right-hand match
    /// gets the same column.
    pub fn resolve(headers: &[String], primary: &ColumnMap) -> Self {
        let first_arabic = headers
            .iter()
            .position(|h| is_arabic(h))
            .map(|index| ResolvedColumn {
                index,
                header: headers[index].clone(),
            });

        let mut companions = HashMap::new();
        for key in FieldKey::BILINGUAL {
            let neighbour = primary.get(key).and_then(|col| {
                let right = col.index + 1;
                headers
                    .get(right)
                    .filter(|h| looks_like_companion(h))
                    .map(|h| ResolvedColumn {
                        index: right,
                        header: h.clone(),
                    })
            });
            if let Some(found) = neighbour.or_else(|| first_arabic.clone()) {
                companions.insert(key, found);
            }
        }
        Self { companions }
    }

    pub fn get(&self, key: FieldKey) -> Option<&ResolvedColumn> {
        self.companions.get(&key)
    }
}
