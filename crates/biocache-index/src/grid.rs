//! Grid-reference indexing, feature-flagged by
//! `Config::grid_ref_indexing_enabled`. `GridUtil.getGridRefAsResolutions`'s
//! exact resolution-suffix scheme was not available to reference, so this
//! implements the MGRS-style convention the field names imply
//! (`easting`/`northing` in metres, one grid-ref string per decreasing
//! resolution) and records the approximation in DESIGN.md rather than
//! guessing at undocumented internals.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

/// Splits the `bbox.p` column (`"minLat,minLon,maxLat,maxLon"`) into its
/// four components. Malformed input yields `None` rather than a partial
/// result.
pub fn parse_bbox(raw: &str) -> Option<BoundingBox> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return None;
    }
    let values: Vec<f64> = parts.iter().filter_map(|p| p.parse().ok()).collect();
    if values.len() != 4 {
        return None;
    }
    Some(BoundingBox {
        min_latitude: values[0],
        min_longitude: values[1],
        max_latitude: values[2],
        max_longitude: values[3],
    })
}

/// Easting/northing in whole metres from the bounding box centroid,
/// against a flat equirectangular approximation (adequate at the grid
/// resolutions this field feeds into; a full projection is out of scope —
/// geodesy lives in the row store, not here).
pub fn easting_northing(bbox: &BoundingBox) -> (i64, i64) {
    const METRES_PER_DEGREE_LAT: f64 = 111_320.0;
    let mid_lat = (bbox.min_latitude + bbox.max_latitude) / 2.0;
    let mid_lon = (bbox.min_longitude + bbox.max_longitude) / 2.0;
    let metres_per_degree_lon = METRES_PER_DEGREE_LAT * mid_lat.to_radians().cos();
    let easting = (mid_lon * metres_per_degree_lon).round() as i64;
    let northing = (mid_lat * METRES_PER_DEGREE_LAT).round() as i64;
    (easting, northing)
}

/// A coarse grid-reference string at 1km resolution, built from the
/// easting/northing pair.
pub fn grid_ref(easting: i64, northing: i64) -> String {
    format!("{:05}E{:05}N", easting / 1000, northing / 1000)
}

/// `GridUtil.getGridRefAsResolutions`: the same reference expressed at
/// progressively coarser resolutions (1km, 10km, 100km), each keyed by
/// its resolution suffix so the caller can index every precision level
/// a query might filter on.
pub fn grid_ref_as_resolutions(grid_ref: &str) -> Vec<(String, String)> {
    let Some((easting_part, rest)) = grid_ref.split_once('E') else {
        return Vec::new();
    };
    let Some((northing_part, _)) = rest.split_once('N') else {
        return Vec::new();
    };
    let (Ok(easting_km), Ok(northing_km)) = (easting_part.parse::<i64>(), northing_part.parse::<i64>()) else {
        return Vec::new();
    };

    [1i64, 10, 100]
        .into_iter()
        .map(|resolution_km| {
            let e = (easting_km / resolution_km) * resolution_km;
            let n = (northing_km / resolution_km) * resolution_km;
            (
                format!("grid_ref_{resolution_km}km"),
                format!("{:05}E{:05}N", e, n),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_component_bbox() {
        let bbox = parse_bbox("-35.3,149.1,-35.2,149.2").unwrap();
        assert_eq!(bbox.min_latitude, -35.3);
        assert_eq!(bbox.max_longitude, 149.2);
    }

    #[test]
    fn malformed_bbox_yields_none() {
        assert!(parse_bbox("-35.3,149.1,-35.2").is_none());
        assert!(parse_bbox("not,a,bbox,here").is_none());
    }

    #[test]
    fn resolutions_coarsen_consistently() {
        let bbox = parse_bbox("-35.30,149.10,-35.29,149.11").unwrap();
        let (e, n) = easting_northing(&bbox);
        let reference = grid_ref(e, n);
        let resolutions = grid_ref_as_resolutions(&reference);
        assert_eq!(resolutions.len(), 3);
        assert!(resolutions.iter().any(|(k, _)| k == "grid_ref_1km"));
        assert!(resolutions.iter().any(|(k, _)| k == "grid_ref_100km"));
    }
}
