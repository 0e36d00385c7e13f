//! The indexing engine: `index_from_map` transforms a raw per-record
//! key/value map plus auxiliary lookups into an indexed document,
//! driving the batch/commit protocol on the way out.

use crate::builder::DocumentBuilder;
use crate::context::IndexingContext;
use crate::grid;
use crate::record::{self, split_multi_valued, OccurrenceRecord};
use crate::row_store::RowStore;
use crate::vocab::assertions::{self, Category};
use crate::Error;
use std::sync::Mutex;
use std::time::Instant;
use time::OffsetDateTime;

const SUITABLE_MODELLING_EXCLUSIONS: &[&str] = &["invalid", "historic", "vagrant", "irruptive"];

pub struct IndexOptions<'a> {
    pub start_date: Option<OffsetDateTime>,
    pub commit: bool,
    pub misc_index_properties: &'a [String],
    pub user_provided_type_misc_index_properties: &'a [String],
    pub additional_fields_to_index: &'a [String],
    pub batch_id: Option<&'a str>,
    /// Lock acquired around publishing, for the embedded-mode shared
    /// index path; `None` for lock-free remote/cluster paths.
    pub shared_index_lock: Option<&'a Mutex<()>>,
}

impl<'a> Default for IndexOptions<'a> {
    fn default() -> Self {
        IndexOptions {
            start_date: None,
            commit: false,
            misc_index_properties: &[],
            user_provided_type_misc_index_properties: &[],
            additional_fields_to_index: &[],
            batch_id: None,
            shared_index_lock: None,
        }
    }
}

/// `indexFromMap`. Returns elapsed nanoseconds spent on an eligible
/// record, or `0` if the record was skipped outright.
#[allow(clippy::too_many_arguments)]
pub fn index_from_map(
    ctx: &IndexingContext,
    row_store: &dyn RowStore,
    builder: &mut DocumentBuilder,
    row_key: &str,
    header: &[String],
    values: &[String],
    record: &OccurrenceRecord,
    parse_date: impl Fn(&str) -> Option<OffsetDateTime>,
    options: &IndexOptions,
) -> Result<u64, Error> {
    // 1. Eligibility.
    if !record::is_eligible(record, options.start_date, &parse_date) {
        return Ok(0);
    }

    let started = Instant::now();

    // Schema drift aborts the record: the caller's positional header/value
    // arrays must agree in length before any field is touched.
    if header.len() != values.len() {
        return Err(Error::SchemaDrift {
            declared: header.len(),
            actual: values.len(),
        });
    }

    builder.new_doc(row_key);

    let result = (|| -> Result<(), Error> {
        // Canonical Darwin Core header/value pairs, in header order.
        for (h, v) in header.iter().zip(values.iter()) {
            if h.is_empty() || v.is_empty() {
                continue;
            }
            if record::is_multi_valued(h) {
                for part in split_multi_valued(v) {
                    builder.add_field(h, part);
                }
            } else {
                builder.add_field(h, v);
            }
        }

        // Misc-property expansion.
        index_misc_properties(builder, record, options);

        // Assertions.
        index_assertions(builder, record);

        // Species lists.
        if let Some(taxon_concept_id) = record.processed_or_raw("taxonConceptID") {
            for list_uid in ctx.species_list_dao.lists_for_lsid(taxon_concept_id) {
                builder.add_field("species_list_uid", &list_uid);
            }
        }

        // Grid references (feature-flagged).
        if ctx.config.grid_ref_indexing_enabled {
            index_grid_references(builder, record);
        }

        // User assertions.
        let user_assertions = record.get("userQualityAssertion").unwrap_or("");
        if !user_assertions.is_empty() {
            for user_id in row_store.get_user_ids_for_assertions(row_key) {
                builder.add_field("assertion_user_id", &user_id);
            }
        }

        // Query assertions.
        index_query_assertions(builder, record);

        // Environmental/contextual layers.
        if let Some(el) = record.processed_or_raw("el") {
            crate::parse::scan_object_shallow(el, |k, v| builder.add_field(k, v));
        }
        if let Some(cl) = record.processed_or_raw("cl") {
            crate::parse::scan_object_shallow(cl, |k, v| builder.add_field(k, v));
        }

        // Species groups.
        if let (Some(left), Some(right)) = (
            record.processed_or_raw("left").and_then(|v| v.parse::<i64>().ok()),
            record.processed_or_raw("right").and_then(|v| v.parse::<i64>().ok()),
        ) {
            for group in ctx.species_groups.get_species_groups(
                ctx.name_index.as_ref(),
                ctx.subgroup_source.as_ref(),
                left,
                right,
            ) {
                builder.add_field("species_group", &group);
            }
            for subgroup in ctx.species_groups.get_species_subgroups(
                ctx.name_index.as_ref(),
                ctx.subgroup_source.as_ref(),
                left,
                right,
            ) {
                builder.add_field("species_subgroup", &subgroup);
            }
        }

        // Batch id.
        if let Some(batch_id) = options.batch_id {
            if !batch_id.is_empty() {
                builder.add_field("batch_id_s", batch_id);
            }
        }

        Ok(())
    })();

    // Terminate: publish or release, under the caller-supplied lock if
    // the deployment needs one; surface any error from the body above
    // only after the builder has been brought back to a well-defined
    // state.
    if let Err(err) = result {
        builder.release();
        return Err(err);
    }

    let publish = |doc: &crate::builder::RecycleDoc| {
        let submitted = crate::backend::SubmittedDoc::from(doc);
        if let Err(err) = ctx.backend.submit(submitted, options.commit) {
            tracing::error!(row_key, error = ?err, "backend transient failure on publish");
        }
    };

    match options.shared_index_lock {
        Some(lock) => {
            let _guard = lock.lock().expect("shared index lock poisoned");
            builder.index(publish);
        }
        None => builder.index(publish),
    }

    Ok(started.elapsed().as_nanos() as u64)
}

fn index_misc_properties(builder: &mut DocumentBuilder, record: &OccurrenceRecord, options: &IndexOptions) {
    let Some(misc_properties) = record.get("miscProperties") else {
        return;
    };
    crate::parse::scan_object_shallow(misc_properties, |name, value| {
        if options.misc_index_properties.iter().any(|f| f == name) {
            index_typed_misc_field(builder, name, value, true);
        } else if options
            .user_provided_type_misc_index_properties
            .iter()
            .any(|f| f == name)
        {
            index_typed_misc_field(builder, name, value, false);
        } else if options.additional_fields_to_index.iter().any(|f| f == name) {
            builder.add_field(name, value);
        }
    });
}

/// `append_s_when_untyped` mirrors the "miscIndexProperties pathway
/// appends `_s` when no typed suffix applies" rule; the user-provided
/// pathway keeps the name verbatim instead.
fn index_typed_misc_field(builder: &mut DocumentBuilder, name: &str, value: &str, append_s_when_untyped: bool) {
    if name.ends_with("_i") {
        if value.parse::<i64>().is_err() {
            tracing::debug!(name, value, "misc property failed int parse, skipping");
            return;
        }
        builder.add_field(name, value);
    } else if name.ends_with("_d") {
        if value.parse::<f64>().is_err() {
            tracing::debug!(name, value, "misc property failed double parse, skipping");
            return;
        }
        builder.add_field(name, value);
    } else if name.ends_with("_dt") {
        let current_year = OffsetDateTime::now_utc().year();
        match crate::parse::parse_date(value, current_year, None) {
            Some(parsed) => {
                let formatted = parsed
                    .parsed_start_date
                    .format(&time::format_description::well_known::Rfc3339)
                    .unwrap_or_else(|_| parsed.parsed_start_date.to_string());
                builder.add_field(name, &formatted);
            }
            None => tracing::debug!(name, value, "misc property failed date parse, skipping"),
        }
    } else if name.ends_with("_s") {
        builder.add_field(name, value);
    } else if append_s_when_untyped {
        builder.add_field(&format!("{name}_s"), value);
    } else {
        builder.add_field(name, value);
    }
}

fn index_assertions(builder: &mut DocumentBuilder, record: &OccurrenceRecord) {
    let Some(quality_assertions) = record.get("qualityAssertions") else {
        return;
    };

    let mut seen = Vec::new();
    let mut system_assertions = false;
    crate::parse::scan_quality_assertions(quality_assertions, |code, qa_status| {
        seen.push(code);
        let Some(assertion) = assertions::get_by_code(code) else {
            tracing::debug!(code, "unknown assertion code, skipping");
            return;
        };
        match qa_status {
            1 => builder.add_field("assertions_passed", assertion.name),
            0 => {
                system_assertions = true;
                if assertion.category == Category::Missing {
                    builder.add_field("assertions_missing", assertion.name);
                } else {
                    builder.add_field("assertions", assertion.name);
                }
            }
            other => tracing::debug!(code, qa_status = other, "unexpected qaStatus, skipping"),
        }
    });

    if system_assertions {
        builder.add_field("system_assertions", "true");
    }

    for unchecked in assertions::get_missing_by_code(&seen) {
        builder.add_field("assertions_unchecked", unchecked.name);
    }
}

fn index_query_assertions(builder: &mut DocumentBuilder, record: &OccurrenceRecord) {
    let mut suitable_modelling = true;

    if let Some(query_assertion) = record.get("queryAssertion") {
        crate::parse::scan_object_shallow(query_assertion, |k, v| {
            builder.add_field("query_assertion_uuid", k);
            builder.add_field("query_assertion_type_s", v);
            if SUITABLE_MODELLING_EXCLUSIONS.contains(&v) {
                suitable_modelling = false;
            }
        });
    }

    builder.add_field(
        "suitable_modelling",
        if suitable_modelling { "true" } else { "false" },
    );
}

fn index_grid_references(builder: &mut DocumentBuilder, record: &OccurrenceRecord) {
    let Some(bbox_raw) = record.processed_or_raw("bbox") else {
        return;
    };
    let Some(bbox) = grid::parse_bbox(bbox_raw) else {
        tracing::debug!(bbox_raw, "failed to parse bbox, skipping grid references");
        return;
    };

    builder.add_field("min_latitude", &bbox.min_latitude.to_string());
    builder.add_field("min_longitude", &bbox.min_longitude.to_string());
    builder.add_field("max_latitude", &bbox.max_latitude.to_string());
    builder.add_field("max_longitude", &bbox.max_longitude.to_string());

    let (easting, northing) = grid::easting_northing(&bbox);
    builder.add_field("easting", &easting.to_string());
    builder.add_field("northing", &northing.to_string());

    let grid_ref = grid::grid_ref(easting, northing);
    builder.add_field("grid_ref", &grid_ref);
    for (resolution_field, value) in grid::grid_ref_as_resolutions(&grid_ref) {
        builder.add_field(&resolution_field, &value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HttpIndexBackend, IndexBackend};
    use crate::builder::{DocumentBuilder, RecyclePool};
    use crate::config::Config;
    use crate::context::IndexingContext;
    use crate::schema::Schema;
    use crate::vocab::{InMemorySpeciesListDAO, NameIndex, NameMatch, NameMatchError};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct NoopNameIndex;
    impl NameIndex for NoopNameIndex {
        fn search(&self, name: &str, _rank: Option<&str>) -> Result<NameMatch, NameMatchError> {
            Err(NameMatchError::NotFound(name.to_string()))
        }
    }

    struct NoopRowStore;
    impl RowStore for NoopRowStore {
        fn get(&self, _row_key: &str) -> Option<OccurrenceRecord> {
            None
        }
        fn page_by_time_range(&self, _since: Option<OffsetDateTime>, _on_row: &mut dyn FnMut(&str, &OccurrenceRecord) -> bool) {}
        fn get_user_ids_for_assertions(&self, _row_key: &str) -> Vec<String> {
            vec!["user-1".to_string()]
        }
    }

    fn make_ctx() -> IndexingContext {
        let backend = HttpIndexBackend::open_remote("http://127.0.0.1:1/solr/biocache", 500, 5000).unwrap();
        IndexingContext::new(
            Config::default(),
            Arc::new(backend) as Arc<dyn IndexBackend>,
            Arc::new(NoopNameIndex) as Arc<dyn crate::vocab::NameIndex>,
            Arc::new(InMemorySpeciesListDAO::new()) as Arc<dyn crate::vocab::TaxonSpeciesListDAO>,
            "/nonexistent/checklist.txt",
        )
    }

    fn rec(pairs: &[(&str, &str)]) -> OccurrenceRecord {
        let mut r = OccurrenceRecord::new();
        for (k, v) in pairs {
            r.insert(*k, *v);
        }
        r
    }

    #[test]
    fn ineligible_record_returns_zero_without_touching_builder() {
        let ctx = make_ctx();
        let row_store = NoopRowStore;
        let schema = Schema::new();
        let pool = RecyclePool::new(1);
        let mut builder = DocumentBuilder::new(&schema, &pool);

        let record = rec(&[("deleted", "T"), ("a", "1")]);
        let elapsed = index_from_map(
            &ctx,
            &row_store,
            &mut builder,
            "row-1",
            &[],
            &[],
            &record,
            |_| None,
            &IndexOptions::default(),
        )
        .unwrap();
        assert_eq!(elapsed, 0);
    }

    #[test]
    fn schema_drift_is_fatal() {
        let ctx = make_ctx();
        let row_store = NoopRowStore;
        let schema = Schema::new();
        let pool = RecyclePool::new(1);
        let mut builder = DocumentBuilder::new(&schema, &pool);

        let record = rec(&[("a", "1"), ("b", "2")]);
        let header = vec!["collectors".to_string()];
        let values = vec!["a".to_string(), "b".to_string()];
        let err = index_from_map(
            &ctx,
            &row_store,
            &mut builder,
            "row-1",
            &header,
            &values,
            &record,
            |_| None,
            &IndexOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaDrift { .. }));
    }

    #[test]
    fn missing_datum_and_name_recognised_assertions_are_split_by_status() {
        let ctx = make_ctx();
        let row_store = NoopRowStore;
        let schema = Schema::new();
        let pool = RecyclePool::new(1);
        let mut builder = DocumentBuilder::new(&schema, &pool);

        let record = rec(&[
            ("a", "1"),
            ("b", "2"),
            (
                "qualityAssertions",
                r#"[{"code":101,"name":"MISSING_GEODETIC_DATUM","qaStatus":0},
                   {"code":50,"name":"NAME_NOT_RECOGNISED","qaStatus":1}]"#,
            ),
        ]);

        let mut published: Option<HashMap<String, Vec<String>>> = None;
        builder.new_doc("row-1");
        index_assertions(&mut builder, &record);
        builder.index(|doc| {
            published = Some(doc.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect());
        });

        let published = published.unwrap();
        assert_eq!(
            published.get("assertions_missing"),
            Some(&vec!["MISSING_GEODETIC_DATUM".to_string()])
        );
        assert_eq!(
            published.get("assertions_passed"),
            Some(&vec!["NAME_NOT_RECOGNISED".to_string()])
        );
        assert_eq!(published.get("system_assertions"), Some(&vec!["true".to_string()]));
        assert!(published.contains_key("assertions_unchecked"));
        let unchecked = &published["assertions_unchecked"];
        assert!(!unchecked.contains(&"PROCESSING_ERROR".to_string()));
        assert!(!unchecked.contains(&"VERIFIED".to_string()));
    }

    #[test]
    fn collectors_multi_value_emits_in_order() {
        let schema = Schema::new();
        let pool = RecyclePool::new(1);
        let mut builder = DocumentBuilder::new(&schema, &pool);
        builder.new_doc("row-1");

        for part in split_multi_valued("Meelis Liivarand|Jane Doe") {
            builder.add_field("collectors", part);
        }

        let mut published = None;
        builder.index(|doc| published = Some(doc.field_values("collectors").to_vec()));
        assert_eq!(
            published.unwrap(),
            vec!["Meelis Liivarand".to_string(), "Jane Doe".to_string()]
        );
    }
}
