mod date;
mod json_scan;

pub use date::{parse_date, EventDate};
pub use json_scan::{scan_object_shallow, scan_quality_assertions};
