//! The index backend adapter: one `IndexBackend` trait,
//! one `HttpIndexBackend` implementation with three constructors. The
//! indexing engine talks only to the trait object and never branches on
//! deployment mode.
//!
//! A real embedded (in-process JVM core) deployment has no Rust
//! equivalent; `open_embedded` assumes a sidecar index process already
//! listening on loopback and otherwise behaves exactly like
//! `open_remote`. This simplification is recorded in DESIGN.md.

use crate::backend::config::{BackendTarget, DEFAULT_CLUSTER_COLLECTION};
use crate::builder::RecycleDoc;
use crate::Error;
use reqwest::blocking::Client as HttpClient;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

pub const FACET_PAGE_SIZE: usize = 1000;
pub const INDEX_READ_PAGE_SIZE: usize = 5000;
pub const WRITE_FIELD_PAGE_SIZE: usize = 100;

/// One indexed row, detached from the builder's recycled storage —
/// what actually crosses the wire in a flush.
#[derive(Debug, Clone)]
pub struct SubmittedDoc {
    pub id: String,
    pub fields: Vec<(String, Vec<String>)>,
}

impl From<&RecycleDoc> for SubmittedDoc {
    fn from(doc: &RecycleDoc) -> Self {
        SubmittedDoc {
            id: doc.id().to_string(),
            fields: doc
                .iter()
                .map(|(name, values)| (name.to_string(), values.to_vec()))
                .collect(),
        }
    }
}

pub struct FacetBucket {
    pub value: String,
    pub count: u64,
}

/// Uniform façade over embedded/remote/cluster deployments. Implementors
/// must serialize access to their batch buffer with a mutex —
/// `HttpIndexBackend` is the only implementation and owns that mutex
/// internally.
pub trait IndexBackend: Send + Sync {
    fn add(&self, doc: SubmittedDoc) -> Result<(), Error>;
    fn add_batch(&self, docs: Vec<SubmittedDoc>) -> Result<(), Error>;
    fn commit(&self) -> Result<(), Error>;
    fn hard_commit(&self) -> Result<(), Error>;
    fn delete_by_query(&self, query: &str) -> Result<(), Error>;
    fn delete_by_field(&self, field: &str, value: &str) -> Result<(), Error>;
    fn empty_index(&self) -> Result<(), Error> {
        self.delete_by_query("*:*")
    }
    fn optimize(&self) -> Result<(), Error>;
    fn shutdown(&self) -> Result<(), Error>;
    fn reload(&self) -> Result<(), Error>;

    /// Pages `facet.offset` by `FACET_PAGE_SIZE` until an empty page.
    fn page_over_facet(
        &self,
        facet_field: &str,
        query: &str,
        filters: &[String],
        on_bucket: &mut dyn FnMut(&str, u64),
    ) -> Result<(), Error>;

    /// Pages by `INDEX_READ_PAGE_SIZE`, materializing each hit as a field
    /// map (declared multi-valued fields arrive as multi-element lists).
    fn page_over_index(
        &self,
        fields: &[String],
        query: &str,
        filters: &[String],
        sort: Option<&str>,
        dir: Option<&str>,
        multi_valued_fields: &[String],
        on_hit: &mut dyn FnMut(&HashMap<String, Vec<String>>),
    ) -> Result<(), Error>;

    /// Streams the full result set. `on_hit` returns `true` to continue,
    /// `false` to stop early. `on_total` is invoked once, before the
    /// first row, so callers can report progress.
    fn stream_index(
        &self,
        fields: &[String],
        query: &str,
        filters: &[String],
        sort: Option<&str>,
        multi_valued_fields: &[String],
        on_total: &mut dyn FnMut(u64),
        on_hit: &mut dyn FnMut(&HashMap<String, Vec<String>>) -> bool,
    ) -> Result<(), Error>;

    fn write_field_to_stream(
        &self,
        field: &str,
        query: &str,
        out: &mut dyn Write,
    ) -> Result<(), Error>;

    /// The batch/commit protocol: enqueue under the batch
    /// mutex; flush when the batch fills or the caller requests a commit
    /// point; hard-commit when `currentCommitSize` crosses the threshold
    /// or the caller requests one.
    fn submit(&self, doc: SubmittedDoc, commit_requested: bool) -> Result<SubmitOutcome, Error>;

    /// Flushes any residual batch, hard-commits, and optionally optimizes
    /// and shuts down.
    fn finalise(&self, optimise: bool, shutdown: bool) -> Result<(), Error>;
}

struct BatchState {
    buffer: Vec<SubmittedDoc>,
    current_commit_size: usize,
}

/// The single backend implementation; `open_embedded`/`open_remote`/
/// `open_cluster` differ only in how `base_url` and `collection` are
/// derived, never in the request logic below.
pub struct HttpIndexBackend {
    client: HttpClient,
    base_url: Url,
    collection: String,
    batch_size: usize,
    hard_commit_size: usize,
    state: Mutex<BatchState>,
}

/// Outcome of one `submit` call: how many documents were flushed to the
/// backend (0 if the batch wasn't yet full) and whether a hard commit
/// fired as a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub flushed: usize,
    pub hard_committed: bool,
}

impl HttpIndexBackend {
    fn build(base_url: Url, collection: String, batch_size: usize, hard_commit_size: usize) -> Result<Self, Error> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|source| Error::BackendInit {
                url: base_url.to_string(),
                source: Box::new(source),
            })?;
        Ok(HttpIndexBackend {
            client,
            base_url,
            collection,
            batch_size,
            hard_commit_size,
            state: Mutex::new(BatchState {
                buffer: Vec::new(),
                current_commit_size: 0,
            }),
        })
    }

    pub fn open_embedded(path: &str, batch_size: usize, hard_commit_size: usize) -> Result<Self, Error> {
        tracing::warn!(path, "embedded mode has no in-process core container in this port; assuming a loopback index process");
        let url = Url::parse("http://127.0.0.1:8983/solr/").map_err(|source| Error::BackendInit {
            url: path.to_string(),
            source: Box::new(source),
        })?;
        Self::build(url, "biocache".to_string(), batch_size, hard_commit_size)
    }

    pub fn open_remote(url: &str, batch_size: usize, hard_commit_size: usize) -> Result<Self, Error> {
        let parsed = Url::parse(url).map_err(|source| Error::BackendInit {
            url: url.to_string(),
            source: Box::new(source),
        })?;
        Self::build(parsed, "biocache".to_string(), batch_size, hard_commit_size)
    }

    pub fn open_cluster(hosts: &str, batch_size: usize, hard_commit_size: usize) -> Result<Self, Error> {
        let first_host = hosts.split(',').next().unwrap_or(hosts);
        let url = Url::parse(&format!("http://{first_host}/solr/")).map_err(|source| Error::BackendInit {
            url: hosts.to_string(),
            source: Box::new(source),
        })?;
        Self::build(url, DEFAULT_CLUSTER_COLLECTION.to_string(), batch_size, hard_commit_size)
    }

    pub fn open(target: &BackendTarget, batch_size: usize, hard_commit_size: usize) -> Result<Self, Error> {
        match target {
            BackendTarget::Embedded { path } => Self::open_embedded(path, batch_size, hard_commit_size),
            BackendTarget::Remote { url, .. } => Self::open_remote(url, batch_size, hard_commit_size),
            BackendTarget::Cluster { hosts, .. } => Self::open_cluster(hosts, batch_size, hard_commit_size),
        }
    }

    fn endpoint(&self, path: &str) -> Url {
        self.base_url
            .join(&format!("{}/{}", self.collection, path))
            .unwrap_or_else(|_| self.base_url.clone())
    }

    fn flush_batch(&self, batch: Vec<SubmittedDoc>) -> Result<(), Error> {
        self.add_batch(batch)
    }
}

impl IndexBackend for HttpIndexBackend {
    fn add(&self, doc: SubmittedDoc) -> Result<(), Error> {
        self.add_batch(vec![doc])
    }

    fn add_batch(&self, docs: Vec<SubmittedDoc>) -> Result<(), Error> {
        if docs.is_empty() {
            return Ok(());
        }
        let body: Vec<HashMap<&str, Vec<String>>> = docs
            .iter()
            .map(|doc| {
                let mut fields: HashMap<&str, Vec<String>> = doc
                    .fields
                    .iter()
                    .map(|(name, values)| (name.as_str(), values.clone()))
                    .collect();
                fields.insert("id", vec![doc.id.clone()]);
                fields.insert("row_key", vec![doc.id.clone()]);
                fields
            })
            .collect();
        let response = self
            .client
            .post(self.endpoint("update"))
            .json(&body)
            .send();
        match response {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => {
                tracing::error!(status = %resp.status(), "backend rejected add batch");
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "backend transient failure on add batch");
                Ok(())
            }
        }
    }

    fn commit(&self) -> Result<(), Error> {
        self.send_command("commit", false)
    }

    fn hard_commit(&self) -> Result<(), Error> {
        self.send_command("commit", true)
    }

    fn delete_by_query(&self, query: &str) -> Result<(), Error> {
        self.send_delete(serde_json::json!({ "query": query }))
    }

    fn delete_by_field(&self, field: &str, value: &str) -> Result<(), Error> {
        self.send_delete(serde_json::json!({ "query": format!("{field}:{value}") }))
    }

    fn optimize(&self) -> Result<(), Error> {
        self.send_command("optimize", true)
    }

    fn shutdown(&self) -> Result<(), Error> {
        match self.client.post(self.endpoint("admin/shutdown")).send() {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::error!(error = %err, "backend transient failure on shutdown");
                Ok(())
            }
        }
    }

    fn reload(&self) -> Result<(), Error> {
        match self.client.post(self.endpoint("admin/reload")).send() {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::error!(error = %err, "backend transient failure on reload");
                Ok(())
            }
        }
    }

    fn page_over_facet(
        &self,
        facet_field: &str,
        query: &str,
        filters: &[String],
        on_bucket: &mut dyn FnMut(&str, u64),
    ) -> Result<(), Error> {
        let mut offset = 0usize;
        loop {
            let buckets = self.fetch_facet_page(facet_field, query, filters, offset)?;
            if buckets.is_empty() {
                return Ok(());
            }
            for bucket in &buckets {
                on_bucket(&bucket.value, bucket.count);
            }
            offset += FACET_PAGE_SIZE;
        }
    }

    fn page_over_index(
        &self,
        fields: &[String],
        query: &str,
        filters: &[String],
        sort: Option<&str>,
        dir: Option<&str>,
        multi_valued_fields: &[String],
        on_hit: &mut dyn FnMut(&HashMap<String, Vec<String>>),
    ) -> Result<(), Error> {
        let mut offset = 0usize;
        loop {
            let hits = self.fetch_index_page(
                fields,
                query,
                filters,
                sort,
                dir,
                multi_valued_fields,
                offset,
                INDEX_READ_PAGE_SIZE,
            )?;
            if hits.is_empty() {
                return Ok(());
            }
            for hit in &hits {
                on_hit(hit);
            }
            offset += INDEX_READ_PAGE_SIZE;
        }
    }

    fn stream_index(
        &self,
        fields: &[String],
        query: &str,
        filters: &[String],
        sort: Option<&str>,
        multi_valued_fields: &[String],
        on_total: &mut dyn FnMut(u64),
        on_hit: &mut dyn FnMut(&HashMap<String, Vec<String>>) -> bool,
    ) -> Result<(), Error> {
        let total = self.fetch_total_count(query, filters)?;
        on_total(total);

        let mut offset = 0usize;
        let mut seen = 0u64;
        loop {
            let hits = self.fetch_index_page(
                fields,
                query,
                filters,
                sort,
                None,
                multi_valued_fields,
                offset,
                INDEX_READ_PAGE_SIZE,
            )?;
            if hits.is_empty() {
                return Ok(());
            }
            for hit in &hits {
                seen += 1;
                if seen % 10_000 == 0 {
                    tracing::info!(rows = seen, total, "streaming index progress");
                }
                if !on_hit(hit) {
                    return Ok(());
                }
            }
            offset += INDEX_READ_PAGE_SIZE;
        }
    }

    fn write_field_to_stream(
        &self,
        field: &str,
        query: &str,
        out: &mut dyn Write,
    ) -> Result<(), Error> {
        let fields = vec![field.to_string()];
        let mut offset = 0usize;
        loop {
            let hits = self.fetch_index_page(&fields, query, &[], None, None, &[], offset, WRITE_FIELD_PAGE_SIZE)?;
            if hits.is_empty() {
                return Ok(());
            }
            for hit in &hits {
                if let Some(values) = hit.get(field) {
                    for value in values {
                        let _ = writeln!(out, "{value}");
                    }
                }
            }
            offset += WRITE_FIELD_PAGE_SIZE;
        }
    }

    fn submit(&self, doc: SubmittedDoc, commit_requested: bool) -> Result<SubmitOutcome, Error> {
        let mut state = self.state.lock().expect("batch mutex poisoned");
        state.buffer.push(doc);

        let should_flush = state.buffer.len() >= self.batch_size || commit_requested;
        let mut flushed = 0;
        if should_flush {
            let batch = std::mem::take(&mut state.buffer);
            flushed = batch.len();
            drop(state);
            self.flush_batch(batch)?;
            state = self.state.lock().expect("batch mutex poisoned");
            state.current_commit_size += flushed;
        }

        let should_hard_commit = state.current_commit_size >= self.hard_commit_size || commit_requested;
        let mut hard_committed = false;
        if should_hard_commit {
            state.current_commit_size = 0;
            drop(state);
            self.hard_commit()?;
            hard_committed = true;
        }

        Ok(SubmitOutcome {
            flushed,
            hard_committed,
        })
    }

    /// Acquires the batch mutex for the residual flush.
    fn finalise(&self, optimise: bool, shutdown: bool) -> Result<(), Error> {
        let residual = {
            let mut state = self.state.lock().expect("batch mutex poisoned");
            std::mem::take(&mut state.buffer)
        };
        if !residual.is_empty() {
            self.flush_batch(residual)?;
        }
        self.hard_commit()?;
        {
            let mut state = self.state.lock().expect("batch mutex poisoned");
            state.current_commit_size = 0;
        }
        if optimise {
            self.optimize()?;
        }
        if shutdown {
            self.shutdown()?;
        }
        Ok(())
    }
}

impl HttpIndexBackend {
    fn send_command(&self, command: &str, hard: bool) -> Result<(), Error> {
        let body = serde_json::json!({ command: { "waitSearcher": hard } });
        match self.client.post(self.endpoint("update")).json(&body).send() {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::error!(error = %err, command, "backend transient failure");
                Ok(())
            }
        }
    }

    fn send_delete(&self, delete_body: serde_json::Value) -> Result<(), Error> {
        let body = serde_json::json!({ "delete": delete_body });
        match self.client.post(self.endpoint("update")).json(&body).send() {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::error!(error = %err, "backend transient failure on delete");
                Ok(())
            }
        }
    }

    fn fetch_facet_page(
        &self,
        facet_field: &str,
        query: &str,
        filters: &[String],
        offset: usize,
    ) -> Result<Vec<FacetBucket>, Error> {
        let response = self
            .client
            .get(self.endpoint("select"))
            .query(&[
                ("q", query),
                ("facet", "true"),
                ("facet.field", facet_field),
                ("facet.offset", &offset.to_string()),
                ("facet.limit", &FACET_PAGE_SIZE.to_string()),
                ("fq", &filters.join(" AND ")),
                ("rows", "0"),
            ])
            .send();
        let response = match response {
            Ok(r) => r,
            Err(err) => {
                tracing::error!(error = %err, "backend transient failure on facet page");
                return Ok(Vec::new());
            }
        };
        let parsed: FacetResponse = match response.json() {
            Ok(v) => v,
            Err(_) => return Ok(Vec::new()),
        };
        Ok(parsed.into_buckets())
    }

    #[allow(clippy::too_many_arguments)]
    fn fetch_index_page(
        &self,
        fields: &[String],
        query: &str,
        filters: &[String],
        sort: Option<&str>,
        dir: Option<&str>,
        multi_valued_fields: &[String],
        offset: usize,
        page_size: usize,
    ) -> Result<Vec<HashMap<String, Vec<String>>>, Error> {
        let sort_param = sort.map(|s| format!("{s} {}", dir.unwrap_or("asc")));
        let mut query_pairs = vec![
            ("q".to_string(), query.to_string()),
            ("fl".to_string(), fields.join(",")),
            ("fq".to_string(), filters.join(" AND ")),
            ("start".to_string(), offset.to_string()),
            ("rows".to_string(), page_size.to_string()),
        ];
        if let Some(sort_param) = &sort_param {
            query_pairs.push(("sort".to_string(), sort_param.clone()));
        }

        let response = self.client.get(self.endpoint("select")).query(&query_pairs).send();
        let response = match response {
            Ok(r) => r,
            Err(err) => {
                tracing::error!(error = %err, "backend transient failure on index page");
                return Ok(Vec::new());
            }
        };
        let parsed: SelectResponse = match response.json() {
            Ok(v) => v,
            Err(_) => return Ok(Vec::new()),
        };
        Ok(parsed.into_hits(multi_valued_fields))
    }

    fn fetch_total_count(&self, query: &str, filters: &[String]) -> Result<u64, Error> {
        let response = self
            .client
            .get(self.endpoint("select"))
            .query(&[("q", query), ("fq", &filters.join(" AND ")), ("rows", "0")])
            .send();
        let response = match response {
            Ok(r) => r,
            Err(err) => {
                tracing::error!(error = %err, "backend transient failure on count");
                return Ok(0);
            }
        };
        let parsed: SelectResponse = match response.json() {
            Ok(v) => v,
            Err(_) => return Ok(0),
        };
        Ok(parsed.response.num_found)
    }
}

#[derive(serde::Deserialize)]
struct FacetResponse {
    #[serde(default)]
    facet_counts: Option<FacetCounts>,
}

#[derive(serde::Deserialize)]
struct FacetCounts {
    #[serde(default)]
    facet_fields: HashMap<String, Vec<serde_json::Value>>,
}

impl FacetResponse {
    fn into_buckets(self) -> Vec<FacetBucket> {
        let Some(counts) = self.facet_counts else {
            return Vec::new();
        };
        let mut buckets = Vec::new();
        for values in counts.facet_fields.into_values() {
            let mut iter = values.into_iter();
            while let (Some(value), Some(count)) = (iter.next(), iter.next()) {
                let value = value.as_str().unwrap_or_default().to_string();
                let count = count.as_u64().unwrap_or(0);
                buckets.push(FacetBucket { value, count });
            }
        }
        buckets
    }
}

#[derive(serde::Deserialize)]
struct SelectResponse {
    response: SelectBody,
}

#[derive(serde::Deserialize)]
struct SelectBody {
    #[serde(rename = "numFound", default)]
    num_found: u64,
    #[serde(default)]
    docs: Vec<HashMap<String, serde_json::Value>>,
}

impl SelectResponse {
    fn into_hits(self, multi_valued_fields: &[String]) -> Vec<HashMap<String, Vec<String>>> {
        self.response
            .docs
            .into_iter()
            .map(|doc| {
                doc.into_iter()
                    .map(|(field, value)| {
                        let values = json_value_to_strings(&value, multi_valued_fields.contains(&field));
                        (field, values)
                    })
                    .collect()
            })
            .collect()
    }
}

fn json_value_to_strings(value: &serde_json::Value, multi_valued: bool) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items.iter().filter_map(json_scalar_to_string).collect(),
        other if multi_valued => vec![json_scalar_to_string(other).unwrap_or_default()],
        other => json_scalar_to_string(other).into_iter().collect(),
    }
}

fn json_scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_target_selects_the_right_base_url() {
        let target = BackendTarget::parse("http://solr:8983/solr/biocache", 4);
        let backend = HttpIndexBackend::open(&target, 500, 5000).expect("build backend");
        assert_eq!(backend.base_url.scheme(), "http");
    }

    #[test]
    fn submit_flushes_at_batch_size_without_network() {
        // A batch_size of 0 means every submission is immediately "full";
        // flush will attempt a network call and fail softly, which is the
        // documented backend-transient behavior rather than
        // a hard error.
        let target = BackendTarget::parse("http://127.0.0.1:1/solr/biocache", 1);
        let backend = HttpIndexBackend::open(&target, 1, 1).expect("build backend");
        let outcome = backend
            .submit(
                SubmittedDoc {
                    id: "row-1".to_string(),
                    fields: vec![],
                },
                false,
            )
            .expect("submit tolerates backend-transient failures");
        assert_eq!(outcome.flushed, 1);
    }
}
