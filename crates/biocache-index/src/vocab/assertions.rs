//! `AssertionCodes`: a closed enumeration mapping quality
//! assertion `code ↔ name`, partitioned by category. Two codes are
//! excluded from "unchecked" bookkeeping everywhere it appears:
//! `PROCESSING_ERROR` and `VERIFIED`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Missing,
    Taxonomic,
    Geospatial,
    Temporal,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertionCode {
    pub code: i64,
    pub name: &'static str,
    pub category: Category,
}

pub const PROCESSING_ERROR: i64 = 50000;
pub const VERIFIED: i64 = 50001;

/// The closed set of known assertion codes. New codes are added here,
/// never derived at runtime.
pub const ASSERTION_CODES: &[AssertionCode] = &[
    AssertionCode { code: 101, name: "MISSING_GEODETIC_DATUM", category: Category::Missing },
    AssertionCode { code: 102, name: "MISSING_COORDINATEPRECISION", category: Category::Missing },
    AssertionCode { code: 103, name: "MISSING_COLLECTION_DATE", category: Category::Missing },
    AssertionCode { code: 104, name: "MISSING_CATALOGUENUMBER", category: Category::Missing },
    AssertionCode { code: 50, name: "NAME_NOT_RECOGNISED", category: Category::Taxonomic },
    AssertionCode { code: 51, name: "HOMONYM_ISSUE", category: Category::Taxonomic },
    AssertionCode { code: 52, name: "INVALID_SCIENTIFIC_NAME", category: Category::Taxonomic },
    AssertionCode { code: 20, name: "COORDINATES_OUT_OF_RANGE", category: Category::Geospatial },
    AssertionCode { code: 21, name: "ZERO_COORDINATES", category: Category::Geospatial },
    AssertionCode { code: 22, name: "COUNTRY_COORDINATE_MISMATCH", category: Category::Geospatial },
    AssertionCode { code: 30, name: "INVALID_COLLECTION_DATE", category: Category::Temporal },
    AssertionCode { code: 31, name: "DATE_PRECISION_MISMATCH", category: Category::Temporal },
    AssertionCode { code: 40, name: "MULTIMEDIA_DATE_MISMATCH", category: Category::Other },
    AssertionCode { code: PROCESSING_ERROR, name: "PROCESSING_ERROR", category: Category::Other },
    AssertionCode { code: VERIFIED, name: "VERIFIED", category: Category::Other },
];

pub fn get_by_code(code: i64) -> Option<&'static AssertionCode> {
    ASSERTION_CODES.iter().find(|a| a.code == code)
}

pub fn get_by_name(name: &str) -> Option<&'static AssertionCode> {
    ASSERTION_CODES.iter().find(|a| a.name == name)
}

/// Codes in `all` that are not in `seen`, excluding `PROCESSING_ERROR`
/// and `VERIFIED`.
pub fn get_missing_by_code(seen: &[i64]) -> Vec<&'static AssertionCode> {
    ASSERTION_CODES
        .iter()
        .filter(|a| a.code != PROCESSING_ERROR && a.code != VERIFIED)
        .filter(|a| !seen.contains(&a.code))
        .collect()
}
