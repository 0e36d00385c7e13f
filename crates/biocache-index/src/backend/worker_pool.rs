//! `AddDocThread` workers: a bounded queue of document
//! batches consumed by a fixed pool of OS threads. Only worker 0 issues
//! hard commits; the others flush batches and stop there. Workers exit
//! once told to stop and their own queue is drained.

use crate::backend::client::{IndexBackend, SubmittedDoc};
use crate::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const IDLE_POLL: Duration = Duration::from_millis(250);

enum WorkItem {
    Batch(Vec<SubmittedDoc>),
    Stop,
}

/// A bounded-queue multi-threaded writer for bulk loads. Each worker
/// owns its own bounded queue; `enqueue` round-robins batches across
/// workers so "worker 0" names a fixed thread, not whichever thread
/// happens to win a race on a shared queue — that fixed identity is what
/// lets only worker 0 issue hard commits.
pub struct AddDocThreadPool {
    senders: Vec<SyncSender<WorkItem>>,
    next_worker: AtomicUsize,
    handles: Vec<JoinHandle<()>>,
}

impl AddDocThreadPool {
    pub fn spawn(backend: Arc<dyn IndexBackend>, worker_count: usize, queue_capacity: usize) -> Self {
        let worker_count = worker_count.max(1);
        let mut senders = Vec::with_capacity(worker_count);
        let mut handles = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let (sender, receiver) = sync_channel::<WorkItem>(queue_capacity);
            let backend = Arc::clone(&backend);
            handles.push(thread::spawn(move || loop {
                match receiver.recv_timeout(IDLE_POLL) {
                    Ok(WorkItem::Batch(batch)) => {
                        if let Err(err) = backend.add_batch(batch) {
                            tracing::error!(worker_id, error = ?err, "add-doc worker failed to flush batch");
                        }
                        if worker_id == 0 {
                            if let Err(err) = backend.hard_commit() {
                                tracing::error!(worker_id, error = ?err, "worker 0 failed to hard commit");
                            }
                        }
                    }
                    Ok(WorkItem::Stop) => return,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }));
            senders.push(sender);
        }

        AddDocThreadPool {
            senders,
            next_worker: AtomicUsize::new(0),
            handles,
        }
    }

    pub fn enqueue(&self, batch: Vec<SubmittedDoc>) -> Result<(), Error> {
        let worker = self.next_worker.fetch_add(1, Ordering::Relaxed) % self.senders.len();
        self.senders[worker]
            .send(WorkItem::Batch(batch))
            .map_err(|_| Error::Configuration("add-doc worker pool has already shut down".to_string()))
    }

    /// Tells every worker to stop once its own queue drains, then joins
    /// them all.
    pub fn stop(mut self) {
        for sender in &self.senders {
            let _ = sender.send(WorkItem::Stop);
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::client::SubmitOutcome;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize as Counter;

    struct CountingBackend {
        batches: Counter,
        hard_commits: Counter,
    }

    impl IndexBackend for CountingBackend {
        fn add(&self, _doc: SubmittedDoc) -> Result<(), Error> {
            Ok(())
        }
        fn add_batch(&self, _docs: Vec<SubmittedDoc>) -> Result<(), Error> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn commit(&self) -> Result<(), Error> {
            Ok(())
        }
        fn hard_commit(&self) -> Result<(), Error> {
            self.hard_commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn delete_by_query(&self, _query: &str) -> Result<(), Error> {
            Ok(())
        }
        fn delete_by_field(&self, _field: &str, _value: &str) -> Result<(), Error> {
            Ok(())
        }
        fn optimize(&self) -> Result<(), Error> {
            Ok(())
        }
        fn shutdown(&self) -> Result<(), Error> {
            Ok(())
        }
        fn reload(&self) -> Result<(), Error> {
            Ok(())
        }
        fn page_over_facet(
            &self,
            _facet_field: &str,
            _query: &str,
            _filters: &[String],
            _on_bucket: &mut dyn FnMut(&str, u64),
        ) -> Result<(), Error> {
            Ok(())
        }
        fn page_over_index(
            &self,
            _fields: &[String],
            _query: &str,
            _filters: &[String],
            _sort: Option<&str>,
            _dir: Option<&str>,
            _multi_valued_fields: &[String],
            _on_hit: &mut dyn FnMut(&HashMap<String, Vec<String>>),
        ) -> Result<(), Error> {
            Ok(())
        }
        fn stream_index(
            &self,
            _fields: &[String],
            _query: &str,
            _filters: &[String],
            _sort: Option<&str>,
            _multi_valued_fields: &[String],
            _on_total: &mut dyn FnMut(u64),
            _on_hit: &mut dyn FnMut(&HashMap<String, Vec<String>>) -> bool,
        ) -> Result<(), Error> {
            Ok(())
        }
        fn write_field_to_stream(
            &self,
            _field: &str,
            _query: &str,
            _out: &mut dyn std::io::Write,
        ) -> Result<(), Error> {
            Ok(())
        }
        fn submit(&self, _doc: SubmittedDoc, _commit_requested: bool) -> Result<SubmitOutcome, Error> {
            Ok(SubmitOutcome {
                flushed: 0,
                hard_committed: false,
            })
        }
        fn finalise(&self, _optimise: bool, _shutdown: bool) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test]
    fn only_worker_zero_hard_commits() {
        let backend = Arc::new(CountingBackend {
            batches: Counter::new(0),
            hard_commits: Counter::new(0),
        });
        let pool = AddDocThreadPool::spawn(backend.clone() as Arc<dyn IndexBackend>, 3, 8);

        // 6 batches round-robin over 3 workers: worker 0 gets exactly 2.
        for _ in 0..6 {
            pool.enqueue(vec![]).expect("enqueue");
        }
        pool.stop();

        assert_eq!(backend.batches.load(Ordering::SeqCst), 6);
        assert_eq!(backend.hard_commits.load(Ordering::SeqCst), 2);
    }
}
