//! The occurrence record data model: a sparse column-name -> raw-value map,
//! plus the eligibility rule and the multi-valued field vocabulary.

use std::collections::BTreeMap;
use time::OffsetDateTime;

/// One raw occurrence row as read from the row store: column name -> raw
/// string value. `BTreeMap` gives deterministic iteration order, which
/// matters for the "header order" guarantee in the engine when no explicit
/// header contract is supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceRecord(pub BTreeMap<String, String>);

impl OccurrenceRecord {
    pub fn new() -> Self {
        OccurrenceRecord(BTreeMap::new())
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The "privileged" value for `column`: the processed column (`column.p`)
    /// if present and non-empty, else the raw column.
    pub fn processed_or_raw(&self, column: &str) -> Option<&str> {
        let processed_key = format!("{column}.p");
        match self.0.get(&processed_key).map(String::as_str) {
            Some(v) if !v.is_empty() => Some(v),
            _ => self.get(column).filter(|v| !v.is_empty()),
        }
    }
}

/// Multi-valued business fields: in the raw record these
/// arrive pipe-joined (`a|b|c`) and are split into one document value per
/// non-empty part on emit.
pub const MULTI_VALUED_FIELDS: &[&str] = &[
    "duplicate_inst",
    "establishment_means",
    "species_group",
    "assertions",
    "data_hub_uid",
    "interactions",
    "outlier_layer",
    "species_habitats",
    "multimedia",
    "all_image_url",
    "collectors",
    "duplicate_record",
    "duplicate_type",
    "taxonomic_issue",
    "species_list_uid",
];

pub fn is_multi_valued(field: &str) -> bool {
    MULTI_VALUED_FIELDS.contains(&field)
}

/// Splits a pipe-joined raw value into its non-empty parts, in order.
pub fn split_multi_valued(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('|').filter(|part| !part.is_empty())
}

/// A record is eligible for indexing iff
/// its `deleted` column is empty and the map has more than one entry; if a
/// `startDate` reindex watermark is supplied, the record is additionally
/// eligible only if `alaModified`/`alaModified.p` parses to a date at or
/// after that watermark.
pub fn is_eligible(
    record: &OccurrenceRecord,
    start_date: Option<OffsetDateTime>,
    parse_date: impl Fn(&str) -> Option<OffsetDateTime>,
) -> bool {
    let deleted = record.get("deleted").unwrap_or("");
    if !deleted.is_empty() {
        return false;
    }
    if record.len() <= 1 {
        return false;
    }

    let Some(watermark) = start_date else {
        return true;
    };

    let modified = record
        .get("alaModified.p")
        .filter(|v| !v.is_empty())
        .or_else(|| record.get("alaModified").filter(|v| !v.is_empty()));

    match modified.and_then(&parse_date) {
        Some(modified) => modified >= watermark,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn rec(pairs: &[(&str, &str)]) -> OccurrenceRecord {
        let mut r = OccurrenceRecord::new();
        for (k, v) in pairs {
            r.insert(*k, *v);
        }
        r
    }

    #[test]
    fn deleted_record_is_ineligible() {
        let r = rec(&[("deleted", "T"), ("a", "1")]);
        assert!(!is_eligible(&r, None, |_| None));
    }

    #[test]
    fn single_entry_record_is_ineligible() {
        let r = rec(&[("a", "1")]);
        assert!(!is_eligible(&r, None, |_| None));
    }

    #[test]
    fn eligible_without_watermark() {
        let r = rec(&[("a", "1"), ("b", "2")]);
        assert!(is_eligible(&r, None, |_| None));
    }

    #[test]
    fn watermark_gates_on_modified_date() {
        let r = rec(&[
            ("a", "1"),
            ("alaModified.p", "2020-01-01T00:00:00Z"),
        ]);
        let watermark = datetime!(2019-01-01 0:00 UTC);
        assert!(is_eligible(&r, Some(watermark), |s| {
            time::OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339).ok()
        }));

        let watermark = datetime!(2021-01-01 0:00 UTC);
        assert!(!is_eligible(&r, Some(watermark), |s| {
            time::OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339).ok()
        }));
    }

    #[test]
    fn split_multi_valued_skips_empty_parts() {
        let parts: Vec<_> = split_multi_valued("a||b|c").collect();
        assert_eq!(parts, vec!["a", "b", "c"]);
    }
}
