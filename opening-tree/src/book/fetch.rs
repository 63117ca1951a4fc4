use std::collections::HashMap;
use std::sync::Arc;

use chess::{MoveRules, PositionKey};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

use super::{BookError, BookMove, BookQuery, BookSource};
use crate::error::TreeResult;
use crate::explorer::OpeningExplorer;

/// Lookup state of one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FetchStatus {
    Pending,
    Failed(String),
    Ready,
}

struct Completion {
    key: PositionKey,
    generation: u64,
    outcome: Result<Vec<BookMove>, BookError>,
}

struct InFlight {
    generation: u64,
    handle: JoinHandle<()>,
    lookup: AbortHandle,
}

impl InFlight {
    fn abort(&self) {
        self.lookup.abort();
        self.handle.abort();
    }
}

/// Runs book lookups in the background, one per position key.
///
/// Requesting a key that is already being fetched aborts the earlier task.
/// Results are merged into the explorer only through [`apply_ready`] or
/// [`apply_next`], and only if they belong to the latest request for their
/// key; anything cancelled or superseded is dropped.
///
/// [`apply_ready`]: BookFetcher::apply_ready
/// [`apply_next`]: BookFetcher::apply_next
pub struct BookFetcher<S> {
    source: Arc<S>,
    in_flight: HashMap<PositionKey, InFlight>,
    status: HashMap<PositionKey, FetchStatus>,
    next_generation: u64,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<S: BookSource> BookFetcher<S> {
    pub fn new(source: S) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            source: Arc::new(source),
            in_flight: HashMap::new(),
            status: HashMap::new(),
            next_generation: 0,
            completion_tx,
            completion_rx,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Start a lookup for `key`, cancelling any lookup already running for it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn request(&mut self, key: PositionKey, query: BookQuery) {
        self.cancel(&key);

        self.next_generation += 1;
        let generation = self.next_generation;
        let source = Arc::clone(&self.source);
        let tx = self.completion_tx.clone();
        let task_key = key.clone();

        // The lookup runs in its own task so a panicking source still
        // settles the request as a failure.
        let lookup = tokio::spawn(async move { source.fetch(query).await });
        let lookup_abort = lookup.abort_handle();
        let handle = tokio::spawn(async move {
            let outcome = match lookup.await {
                Ok(outcome) => outcome,
                Err(err) if err.is_cancelled() => return,
                Err(err) => Err(BookError::Lookup(format!("lookup task failed: {err}"))),
            };
            // Receiver gone means the fetcher was dropped.
            let _ = tx.send(Completion {
                key: task_key,
                generation,
                outcome,
            });
        });

        tracing::debug!(position = %key, generation, "book lookup started");
        self.in_flight.insert(
            key.clone(),
            InFlight {
                generation,
                handle,
                lookup: lookup_abort,
            },
        );
        self.status.insert(key, FetchStatus::Pending);
    }

    /// Abort the lookup for `key`. Returns whether one was running.
    pub fn cancel(&mut self, key: &PositionKey) -> bool {
        let Some(in_flight) = self.in_flight.remove(key) else {
            return false;
        };
        in_flight.abort();
        self.status.remove(key);
        tracing::debug!(position = %key, generation = in_flight.generation, "book lookup cancelled");
        true
    }

    pub fn cancel_all(&mut self) {
        for (key, in_flight) in self.in_flight.drain() {
            in_flight.abort();
            self.status.remove(&key);
        }
    }

    pub fn status(&self, key: &PositionKey) -> Option<&FetchStatus> {
        self.status.get(key)
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Merge every completion that has already arrived. Returns the keys
    /// whose lookups settled, successfully or not.
    pub fn apply_ready<R: MoveRules>(
        &mut self,
        explorer: &mut OpeningExplorer<R>,
    ) -> TreeResult<Vec<PositionKey>> {
        let mut settled = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            if let Some(key) = self.apply(completion, explorer)? {
                settled.push(key);
            }
        }
        Ok(settled)
    }

    /// Wait until a current lookup settles and merge it. Returns `None` when
    /// nothing is in flight.
    pub async fn apply_next<R: MoveRules>(
        &mut self,
        explorer: &mut OpeningExplorer<R>,
    ) -> TreeResult<Option<PositionKey>> {
        while !self.in_flight.is_empty() {
            let Some(completion) = self.completion_rx.recv().await else {
                break;
            };
            if let Some(key) = self.apply(completion, explorer)? {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn apply<R: MoveRules>(
        &mut self,
        completion: Completion,
        explorer: &mut OpeningExplorer<R>,
    ) -> TreeResult<Option<PositionKey>> {
        let current = self.in_flight.get(&completion.key).map(|f| f.generation);
        if current != Some(completion.generation) {
            tracing::debug!(
                position = %completion.key,
                generation = completion.generation,
                "discarding superseded book result"
            );
            return Ok(None);
        }
        self.in_flight.remove(&completion.key);

        match completion.outcome {
            Ok(moves) => {
                explorer.merge_book_result(completion.key.as_str(), &moves)?;
                self.status.insert(completion.key.clone(), FetchStatus::Ready);
            }
            Err(err) => {
                tracing::warn!(position = %completion.key, error = %err, "book lookup failed");
                self.status
                    .insert(completion.key.clone(), FetchStatus::Failed(err.to_string()));
            }
        }
        Ok(Some(completion.key))
    }
}

impl<S> Drop for BookFetcher<S> {
    fn drop(&mut self) {
        for (_, in_flight) in self.in_flight.drain() {
            in_flight.abort();
        }
    }
}
