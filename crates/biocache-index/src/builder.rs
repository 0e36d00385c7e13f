//! The document builder: a schema-aware, reusable
//! per-document accumulator with copy-field expansion and field-object
//! recycling. Not safe for concurrent mutation by multiple producers —
//! each worker owns one builder and feeds a shared backend adapter.

use crate::schema::{FieldSchema, Schema};
use fxhash::FxHashMap;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

/// A reusable document: field name -> accumulated values. Recycled
/// between documents so the hot path avoids per-document allocation of
/// the backing map; `clear()` empties the value vectors but keeps their
/// capacity.
#[derive(Debug, Default)]
pub struct RecycleDoc {
    id: String,
    fields: FxHashMap<String, Vec<String>>,
}

impl RecycleDoc {
    fn clear(&mut self) {
        self.id.clear();
        for values in self.fields.values_mut() {
            values.clear();
        }
    }

    fn set_id(&mut self, id: impl Into<String>) {
        self.id.push_str(&id.into());
    }

    /// Appends `value` to `field`, reusing the existing `Vec` storage for
    /// that field name if this document already touched it.
    fn push(&mut self, field: &str, value: String) {
        self.fields.entry(field.to_string()).or_default().push(value);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn field_values(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// What `newDoc` does when the previous document was left unterminated
/// (neither `index()`-ed nor `release()`-ed): the builder discards it and
/// logs, rather than corrupting pool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    Idle,
    Open,
}

/// The bounded pool of `RecycleDoc`s is the builder's backpressure
/// surface: `acquire` blocks until a document is checked back in by
/// `release`/`index`.
pub struct RecyclePool {
    acquire_rx: Receiver<RecycleDoc>,
    release_tx: SyncSender<RecycleDoc>,
}

impl RecyclePool {
    pub fn new(capacity: usize) -> Self {
        let (fill_tx, acquire_rx) = sync_channel(capacity);
        let (release_tx, refill_rx) = sync_channel(capacity);
        for _ in 0..capacity {
            fill_tx
                .send(RecycleDoc::default())
                .expect("pool channel just created, cannot be full");
        }
        // Route released documents back into the acquire channel. A
        // dedicated forwarding thread keeps both directions bounded
        // without requiring producers and the pool to share a lock.
        std::thread::spawn(move || {
            while let Ok(doc) = refill_rx.recv() {
                if fill_tx.send(doc).is_err() {
                    break;
                }
            }
        });
        RecyclePool {
            acquire_rx,
            release_tx,
        }
    }

    pub fn acquire(&self) -> RecycleDoc {
        self.acquire_rx
            .recv()
            .expect("recycle pool forwarding thread outlives all builders")
    }

    fn release(&self, mut doc: RecycleDoc) {
        doc.clear();
        let _ = self.release_tx.send(doc);
    }
}

/// Schema-aware accumulator driving one document's lifecycle:
/// `new_doc` -> zero-or-more `add_field` -> exactly one of `index`/`release`.
pub struct DocumentBuilder<'a> {
    schema: &'a Schema,
    pool: &'a RecyclePool,
    current: Option<RecycleDoc>,
    state: BuilderState,
    field_cache: FxHashMap<String, FieldSchema>,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(schema: &'a Schema, pool: &'a RecyclePool) -> Self {
        DocumentBuilder {
            schema,
            pool,
            current: None,
            state: BuilderState::Idle,
            field_cache: FxHashMap::default(),
        }
    }

    /// Starts a new document. If the previous one was left unterminated,
    /// it is discarded (logged) rather than silently leaking or corrupting
    /// the pool — the builder always recovers to a well-defined state.
    pub fn new_doc(&mut self, id: impl Into<String>) {
        if self.state == BuilderState::Open {
            tracing::error!(
                doc_id = self.current.as_ref().map(RecycleDoc::id).unwrap_or(""),
                "newDoc called with a previous document neither indexed nor released; discarding"
            );
            if let Some(doc) = self.current.take() {
                self.pool.release(doc);
            }
        }
        let mut doc = self.pool.acquire();
        doc.set_id(id);
        self.current = Some(doc);
        self.state = BuilderState::Open;
    }

    /// No-op on an empty value. Emits to the primary field and to every
    /// copy-field destination, truncating each destination independently
    /// when it specifies `max_chars`. Unknown fields still resolve (via
    /// the dynamic-suffix fallback in `Schema::lookup`) so this never
    /// fails the document.
    pub fn add_field(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        let Some(doc) = self.current.as_mut() else {
            tracing::error!(field, "addField called with no open document");
            return;
        };
        let resolved = if let Some(cached) = self.field_cache.get(field) {
            cached.clone()
        } else {
            let r = self.schema.lookup(field);
            self.field_cache.insert(field.to_string(), r.clone());
            r
        };

        doc.push(&resolved.name, value.to_string());
        for copy_field in &resolved.copy_fields {
            let copied = match copy_field.max_chars {
                Some(max) => truncate_chars(value, max),
                None => value.to_string(),
            };
            doc.push(&copy_field.destination, copied);
        }
    }

    /// Publishes the current document and returns the builder to idle.
    /// Must follow `new_doc`; calling without an open document is a
    /// logged error, not a panic.
    pub fn index(&mut self, publish: impl FnOnce(&RecycleDoc)) {
        match self.current.take() {
            Some(doc) => {
                publish(&doc);
                self.pool.release(doc);
                self.state = BuilderState::Idle;
            }
            None => tracing::error!("index() called with no open document"),
        }
    }

    /// Discards the current document without publishing it.
    pub fn release(&mut self) {
        match self.current.take() {
            Some(doc) => {
                self.pool.release(doc);
                self.state = BuilderState::Idle;
            }
            None => tracing::error!("release() called with no open document"),
        }
    }

    #[cfg(test)]
    fn is_open(&self) -> bool {
        self.state == BuilderState::Open
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CopyField, FieldType};

    fn schema_with_copy_field() -> Schema {
        let mut schema = Schema::new();
        schema.declare(
            FieldSchema::declared("scientific_name", FieldType::Str, false)
                .with_copy_field(CopyField::truncated("text", 5)),
        );
        schema
    }

    #[test]
    fn add_field_expands_to_copy_field_with_truncation() {
        let schema = schema_with_copy_field();
        let pool = RecyclePool::new(2);
        let mut builder = DocumentBuilder::new(&schema, &pool);

        builder.new_doc("row-1");
        builder.add_field("scientific_name", "Eucalyptus regnans");
        let mut published = None;
        builder.index(|doc| published = Some((doc.field_values("scientific_name").to_vec(), doc.field_values("text").to_vec())));

        let (primary, copy) = published.unwrap();
        assert_eq!(primary, vec!["Eucalyptus regnans".to_string()]);
        assert_eq!(copy, vec!["Eucal".to_string()]);
    }

    #[test]
    fn empty_value_is_a_no_op() {
        let schema = Schema::new();
        let pool = RecyclePool::new(1);
        let mut builder = DocumentBuilder::new(&schema, &pool);
        builder.new_doc("row-1");
        builder.add_field("collectors", "");
        builder.index(|doc| assert_eq!(doc.field_values("collectors").len(), 0));
    }

    #[test]
    fn unterminated_doc_is_discarded_on_next_new_doc() {
        let schema = Schema::new();
        let pool = RecyclePool::new(1);
        let mut builder = DocumentBuilder::new(&schema, &pool);
        builder.new_doc("row-1");
        builder.add_field("collectors", "Jane Doe");
        builder.new_doc("row-2");
        assert!(builder.is_open());
        builder.index(|doc| assert_eq!(doc.id(), "row-2"));
    }

    #[test]
    fn recycled_doc_does_not_leak_values_across_documents() {
        let schema = Schema::new();
        let pool = RecyclePool::new(1);
        let mut builder = DocumentBuilder::new(&schema, &pool);

        builder.new_doc("row-1");
        builder.add_field("collectors", "Jane Doe");
        builder.index(|_| {});

        builder.new_doc("row-2");
        builder.index(|doc| assert_eq!(doc.field_values("collectors").len(), 0));
    }

    #[test]
    fn release_discards_without_publishing() {
        let schema = Schema::new();
        let pool = RecyclePool::new(1);
        let mut builder = DocumentBuilder::new(&schema, &pool);
        builder.new_doc("row-1");
        builder.add_field("collectors", "Jane Doe");
        builder.release();
        assert!(!builder.is_open());
    }
}
