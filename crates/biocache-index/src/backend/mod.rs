mod client;
mod config;
mod worker_pool;

pub use client::{
    FacetBucket, HttpIndexBackend, IndexBackend, SubmitOutcome, SubmittedDoc, FACET_PAGE_SIZE,
    INDEX_READ_PAGE_SIZE, WRITE_FIELD_PAGE_SIZE,
};
pub use config::{BackendTarget, DEFAULT_CLUSTER_COLLECTION};
pub use worker_pool::AddDocThreadPool;
