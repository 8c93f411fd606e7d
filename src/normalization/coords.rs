use bigdecimal::BigDecimal;

/// Latitudes above this are outside the surveyed area.
pub const LAT_SWAP_ABOVE: i64 = 35;
/// Longitudes below this are outside the surveyed area.
pub const LON_SWAP_BELOW: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    Unchanged,
    Swapped,
}

/// Swap a lat/lon pair that was entered transposed.
///
/// Only the exact `lat > 35 && lon < 30` signature is repaired; any other
/// pair, in range or not, is left as-is. Missing values are never touched.
pub fn repair_lat_lon(
    latitude: &mut Option<BigDecimal>,
    longitude: &mut Option<BigDecimal>,
) -> Repair {
    let transposed = match (latitude.as_ref(), longitude.as_ref()) {
        (Some(lat), Some(lon)) => {
            *lat > BigDecimal::from(LAT_SWAP_ABOVE) && *lon < BigDecimal::from(LON_SWAP_BELOW)
        }
        _ => false,
    };
    if transposed {
        std::mem::swap(latitude, longitude);
        Repair::Swapped
    } else {
        Repair::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Option<BigDecimal> {
        Some(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn leaves_plausible_pair_alone() {
        let (mut lat, mut lon) = (dec("31.2"), dec("34.8"));
        assert_eq!(repair_lat_lon(&mut lat, &mut lon), Repair::Unchanged);
        assert_eq!(lat, dec("31.2"));
        assert_eq!(lon, dec("34.8"));
    }

    #[test]
    fn swaps_transposed_pair() {
        let (mut lat, mut lon) = (dec("61.2"), dec("4.8"));
        assert_eq!(repair_lat_lon(&mut lat, &mut lon), Repair::Swapped);
        assert_eq!(lat, dec("4.8"));
        assert_eq!(lon, dec("61.2"));
    }

    #[test]
    fn boundaries_are_exclusive() {
        for (la, lo) in [("35", "29"), ("36", "30"), ("35.0", "30.0")] {
            let (mut lat, mut lon) = (dec(la), dec(lo));
            assert_eq!(repair_lat_lon(&mut lat, &mut lon), Repair::Unchanged);
            assert_eq!(lat, dec(la));
            assert_eq!(lon, dec(lo));
        }
    }

    #[test]
    fn out_of_range_without_signature_passes_through() {
        // Both values wrong, but not the transposition signature.
        let (mut lat, mut lon) = (dec("95.0"), dec("195.0"));
        assert_eq!(repair_lat_lon(&mut lat, &mut lon), Repair::Unchanged);
        assert_eq!(lat, dec("95.0"));
    }

    #[test]
    fn missing_value_never_swaps() {
        let (mut lat, mut lon) = (dec("61.2"), None);
        assert_eq!(repair_lat_lon(&mut lat, &mut lon), Repair::Unchanged);
        assert_eq!(lat, dec("61.2"));
        assert!(lon.is_none());
    }
}
