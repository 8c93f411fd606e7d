//! Per-row coercion of raw sheet cells into a [`NormalizedRecord`].
//!
//! Every field degrades independently: a bad cell becomes `None` (or an empty
//! string for primary display text) and never aborts the row. Only after all
//! fields are coerced is the row accepted or dropped on id/lat/lon.

use bigdecimal::num_bigint::Sign;
use bigdecimal::BigDecimal;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::str::FromStr;
use std::sync::LazyLock;

use super::coords::{repair_lat_lon, Repair};
use super::header::{BilingualColumnMap, ColumnMap, FieldKey};

/// Decimal places kept for latitude/longitude.
pub const COORD_SCALE: i64 = 6;
/// Decimal places kept for percentages and areas.
pub const MEASURE_SCALE: i64 = 2;

static INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+$").expect("valid integer regex"));

/// Map Arabic-Indic and Extended Arabic-Indic digits to ASCII.
fn fold_digits(raw: &str) -> Cow<'_, str> {
    let needs_fold = raw
        .chars()
        .any(|c| matches!(c, '\u{0660}'..='\u{0669}' | '\u{06F0}'..='\u{06F9}'));
    if !needs_fold {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(
        raw.chars()
            .map(|c| match c {
                '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
                '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
                other => other,
            })
            .collect(),
    )
}

/// Trimmed cell text, or `None` when the cell is missing or blank.
pub fn tidy(cell: Option<&str>) -> Option<String> {
    let trimmed = cell?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Optional sign followed by digits; anything else is absent.
pub fn safe_int(cell: Option<&str>) -> Option<i64> {
    let folded = fold_digits(cell?.trim());
    if !INT_RE.is_match(&folded) {
        return None;
    }
    folded.parse::<i64>().ok()
}

/// Largest power of ten an exponent may scale a cell to.
const MAX_EXPONENT: i64 = 18;

/// Fixed-point decimal with an optional trailing `%`. Blank and `nan` are absent.
///
/// Exponent notation is accepted only while the value stays within
/// `1e18` and keeps no more fractional digits than the cell has characters,
/// so rounding stays proportional to the cell's length.
pub fn safe_decimal(cell: Option<&str>) -> Option<BigDecimal> {
    let folded = fold_digits(cell?.trim());
    let s = folded.trim_end_matches('%').trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return None;
    }
    let value = BigDecimal::from_str(s).ok()?;
    let (_, scale) = value.as_bigint_and_exponent();
    if scale < -MAX_EXPONENT || scale > s.len() as i64 {
        return None;
    }
    Some(value)
}

fn fixed(value: BigDecimal, scale: i64) -> BigDecimal {
    value.round(scale).with_scale(scale)
}

/// Render with exactly `scale` fractional digits, zero included
/// (`0` -> `0.000000` at scale 6).
pub fn decimal_text(value: &BigDecimal, scale: i64) -> String {
    let (digits, _) = value.with_scale(scale).as_bigint_and_exponent();
    let negative = digits.sign() == Sign::Minus;
    let mut magnitude = digits.magnitude().to_string();
    let width = scale.max(0) as usize;
    if magnitude.len() <= width {
        magnitude = format!("{}{}", "0".repeat(width + 1 - magnitude.len()), magnitude);
    }
    let (int_part, frac_part) = magnitude.split_at(magnitude.len() - width);
    let sign = if negative { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{frac_part}")
    }
}

/// One accepted spreadsheet row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub id: i64,
    pub farmer_name: String,
    pub farmer_name_ar: Option<String>,
    pub region: String,
    pub region_ar: Option<String>,
    pub governorate: String,
    pub governorate_ar: Option<String>,
    pub latitude: BigDecimal,
    pub longitude: BigDecimal,
    pub crop_type: String,
    pub crop_type_ar: Option<String>,
    pub water_source: String,
    pub water_source_ar: Option<String>,
    pub irrigation_system_type: String,
    pub irrigation_system_type_ar: Option<String>,
    pub distribution_uniformity_pct: Option<BigDecimal>,
    pub number_of_trees: Option<i64>,
    pub area_m2: Option<BigDecimal>,
    pub description: String,
    pub description_ar: Option<String>,
}

/// Result of normalizing a single row.
#[derive(Debug, Clone)]
pub struct RowOutcome {
    /// `None` when id, latitude or longitude is missing after coercion.
    pub record: Option<NormalizedRecord>,
    pub repair: Repair,
}

/// Resolved column layout plus the cell accessors used per row.
#[derive(Debug, Clone)]
pub struct RowReader<'a> {
    columns: &'a ColumnMap,
    companions: &'a BilingualColumnMap,
}

impl<'a> RowReader<'a> {
    pub fn new(columns: &'a ColumnMap, companions: &'a BilingualColumnMap) -> Self {
        Self {
            columns,
            companions,
        }
    }

    fn cell<'r>(&self, row: &'r [String], key: FieldKey) -> Option<&'r str> {
        let col = self.columns.get(key)?;
        row.get(col.index).map(String::as_str)
    }

    fn companion<'r>(&self, row: &'r [String], key: FieldKey) -> Option<&'r str> {
        let col = self.companions.get(key)?;
        row.get(col.index).map(String::as_str)
    }

    fn text(&self, row: &[String], key: FieldKey) -> String {
        tidy(self.cell(row, key)).unwrap_or_default()
    }

    fn text_ar(&self, row: &[String], key: FieldKey) -> Option<String> {
        tidy(self.companion(row, key))
    }

    pub fn normalize(&self, row: &[String]) -> RowOutcome {
        let id = safe_int(self.cell(row, FieldKey::Id));
        let mut latitude = safe_decimal(self.cell(row, FieldKey::Latitude));
        let mut longitude = safe_decimal(self.cell(row, FieldKey::Longitude));
        let repair = repair_lat_lon(&mut latitude, &mut longitude);

        let record = match (id, latitude, longitude) {
            (Some(id), Some(lat), Some(lon)) => Some(NormalizedRecord {
                id,
                farmer_name: self.text(row, FieldKey::FarmerName),
                farmer_name_ar: self.text_ar(row, FieldKey::FarmerName),
                region: self.text(row, FieldKey::Region),
                region_ar: self.text_ar(row, FieldKey::Region),
                governorate: self.text(row, FieldKey::Governorate),
                governorate_ar: self.text_ar(row, FieldKey::Governorate),
                latitude: fixed(lat, COORD_SCALE),
                longitude: fixed(lon, COORD_SCALE),
                crop_type: self.text(row, FieldKey::CropType),
                crop_type_ar: self.text_ar(row, FieldKey::CropType),
                water_source: self.text(row, FieldKey::WaterSource),
                water_source_ar: self.text_ar(row, FieldKey::WaterSource),
                irrigation_system_type: self.text(row, FieldKey::IrrigationSystemType),
                irrigation_system_type_ar: self.text_ar(row, FieldKey::IrrigationSystemType),
                distribution_uniformity_pct: safe_decimal(
                    self.cell(row, FieldKey::DistributionUniformityPct),
                )
                .map(|v| fixed(v, MEASURE_SCALE)),
                number_of_trees: safe_int(self.cell(row, FieldKey::NumberOfTrees)),
                area_m2: safe_decimal(self.cell(row, FieldKey::AreaM2))
                    .map(|v| fixed(v, MEASURE_SCALE)),
                description: self.text(row, FieldKey::Description),
                description_ar: self.text_ar(row, FieldKey::Description),
            }),
            _ => None,
        };

        RowOutcome { record, repair }
    }
}
