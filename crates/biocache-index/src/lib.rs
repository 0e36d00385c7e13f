//! Occurrence record indexing: a map of raw Darwin Core columns in,
//! an enriched search document out, over a pluggable Solr-class backend.
//!
//! [`engine::index_from_map`] is the entry point most callers want; it
//! composes the document builder, schema, vocabularies, and backend
//! adapter behind [`context::IndexingContext`].

mod backend;
mod builder;
mod config;
mod context;
mod csv_out;
mod engine;
mod error;
mod grid;
mod parse;
mod record;
mod row_store;
mod schema;
mod stream;
mod vocab;

pub use backend::{
    AddDocThreadPool, BackendTarget, FacetBucket, HttpIndexBackend, IndexBackend, SubmitOutcome,
    SubmittedDoc, DEFAULT_CLUSTER_COLLECTION, FACET_PAGE_SIZE, INDEX_READ_PAGE_SIZE,
    WRITE_FIELD_PAGE_SIZE,
};
pub use builder::{DocumentBuilder, RecycleDoc, RecyclePool};
pub use config::Config;
pub use context::IndexingContext;
pub use csv_out::{write_header, write_row, CsvHeader};
pub use engine::{index_from_map, IndexOptions};
pub use error::{Error, Result};
pub use grid::{easting_northing, grid_ref, grid_ref_as_resolutions, parse_bbox, BoundingBox};
pub use parse::{parse_date, scan_object_shallow, scan_quality_assertions, EventDate};
pub use record::{is_eligible, is_multi_valued, split_multi_valued, OccurrenceRecord};
pub use row_store::RowStore;
pub use schema::{CopyField, FieldSchema, FieldType, Schema};
pub use stream::{page_over_facet, page_over_index, stream_index, write_field_to_stream, PageStats};
pub use vocab::{
    get_by_code, get_by_name, get_missing_by_code, resolve, AssertionCode, Category,
    ChecklistCache, InMemorySpeciesListDAO, Interval, NameIndex, NameMatch, NameMatchError,
    NoSubgroups, SpeciesGroup, SpeciesGroups, SubgroupSource, TaxonSpeciesListDAO,
    PROCESSING_ERROR, VERIFIED,
};
