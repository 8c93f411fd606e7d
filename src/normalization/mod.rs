pub mod coords;
pub mod header;
pub mod record;

pub use coords::{repair_lat_lon, Repair};
pub use header::{normalize_header, BilingualColumnMap, ColumnMap, FieldKey, ResolvedColumn};
pub use record::{
    decimal_text, safe_decimal, safe_int, tidy, NormalizedRecord, RowOutcome, RowReader,
    COORD_SCALE, MEASURE_SCALE,
};
