//! Search scheduler: cancellable, double-buffered execution of searches
//! triggered by rapid-fire input.
//!
//! Every query change schedules a new search generation. Searches run on the
//! blocking pool and write their per-record outcomes into one of two buffers
//! (see [`BufferId`]). Ownership of the buffers follows these rules:
//!
//! - A new search takes buffer 0 if no search owns it, otherwise buffer 1.
//! - If a search still owns buffer 1 when the next one arrives, it is
//!   cancelled and awaited before the newcomer starts, so at most two
//!   searches are ever in flight and no two share a buffer.
//! - A search that completes releases its buffer, marks it as the last
//!   finished one and delivers its ranking on the outcome channel.
//! - A search that was cancelled releases its buffer and delivers nothing,
//!   even if it had already finished scoring.
//!
//! Buffer ownership is the only shared mutable state; it sits behind a mutex
//! that is held for ownership transitions only, never while scoring.
//!
//! ```text
//!   S1 ──► buf 0 ─────────────────────────────► deliver S1
//!   S2 ──► buf 1 ──x cancelled by S3
//!   S3 ──────────── wait S2 ──► buf 1 ──► deliver S3
//! ```

use crate::matcher::BufferId;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Anything that can rank records for a query into a given buffer.
pub trait Searcher: Send + Sync + 'static {
    /// Rank candidates for `query`, writing scratch state into `buffer` only.
    ///
    /// Must check `cancel` periodically and return `None` once it fires.
    fn search(&self, query: &str, buffer: BufferId, cancel: &CancellationToken) -> Option<Vec<usize>>;
}

/// A completed, non-stale search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub generation: u64,
    pub query: String,
    /// Buffer whose scratch slots hold this ranking's scores.
    pub buffer: BufferId,
    /// Matching record indices, best first.
    pub results: Vec<usize>,
}

/// Where a freshly scheduled search ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub generation: u64,
    pub buffer: BufferId,
}

#[derive(Debug, Clone)]
struct Ticket {
    generation: u64,
    cancel: CancellationToken,
}

impl Ticket {
    fn is(&self, other: &Ticket) -> bool {
        self.generation == other.generation
    }
}

#[derive(Debug)]
struct Ownership {
    /// Search owning buffer 0.
    first: Option<Ticket>,
    /// Most recently scheduled search still in flight.
    last: Option<Ticket>,
    last_finished: BufferId,
}

impl Ownership {
    fn release(&mut self, ticket: &Ticket) {
        if self.first.as_ref().is_some_and(|t| t.is(ticket)) {
            self.first = None;
        }
        if self.last.as_ref().is_some_and(|t| t.is(ticket)) {
            self.last = None;
        }
    }

    /// The search holding buffer 1, if any.
    fn overlapped(&self) -> Option<&Ticket> {
        let last = self.last.as_ref()?;
        match &self.first {
            Some(first) if first.is(last) => None,
            _ => Some(last),
        }
    }
}

/// Releases a search's buffer when its job ends, panicking or not.
struct Release {
    ownership: Arc<Mutex<Ownership>>,
    ticket: Ticket,
}

impl Drop for Release {
    fn drop(&mut self) {
        lock(&self.ownership).release(&self.ticket);
    }
}

fn lock(ownership: &Mutex<Ownership>) -> MutexGuard<'_, Ownership> {
    // A panicking search cannot leave ownership half-updated: every
    // transition is a single assignment.
    ownership.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives searches for one search session.
///
/// Scheduling takes `&mut self`, so a session has a single issuing side.
pub struct SearchScheduler<S> {
    searcher: Arc<S>,
    ownership: Arc<Mutex<Ownership>>,
    outcomes: mpsc::UnboundedSender<SearchOutcome>,
    primary: Option<JoinHandle<()>>,
    overlapped: Option<JoinHandle<()>>,
    next_generation: u64,
}

impl<S: Searcher> SearchScheduler<S> {
    /// Create a scheduler and the receiving end of its outcome channel.
    pub fn new(searcher: Arc<S>) -> (Self, mpsc::UnboundedReceiver<SearchOutcome>) {
        let (outcomes, rx) = mpsc::unbounded_channel();
        let scheduler = SearchScheduler {
            searcher,
            ownership: Arc::new(Mutex::new(Ownership {
                first: None,
                last: None,
                last_finished: BufferId::FIRST,
            })),
            outcomes,
            primary: None,
            overlapped: None,
            next_generation: 1,
        };
        (scheduler, rx)
    }

    /// Buffer written by the most recently delivered search.
    pub fn last_finished(&self) -> BufferId {
        lock(&self.ownership).last_finished
    }

    /// Number of searches currently owning a buffer.
    pub fn in_flight(&self) -> usize {
        let own = lock(&self.ownership);
        usize::from(own.first.is_some()) + usize::from(own.overlapped().is_some())
    }

    /// Schedule a search for `query`.
    ///
    /// Returns as soon as the search is running, except when a previous
    /// search still owns buffer 1: that one is cancelled first and this call
    /// waits for it to release the buffer.
    pub async fn schedule(&mut self, query: impl Into<String>) -> anyhow::Result<Scheduled> {
        let query = query.into();
        let generation = self.next_generation;
        self.next_generation += 1;

        // Cancel under the lock: a search checks its token under the same
        // lock before delivering, so a cancelled search never delivers.
        let stale = {
            let own = lock(&self.ownership);
            own.overlapped().inspect(|t| t.cancel.cancel()).cloned()
        };
        if let Some(stale) = stale {
            tracing::debug!(generation, stale = stale.generation, "cancelling overlapped search");
            if let Some(handle) = self.overlapped.take() {
                handle.await?;
            }
            lock(&self.ownership).release(&stale);
        }

        let ticket = Ticket {
            generation,
            cancel: CancellationToken::new(),
        };
        let buffer = {
            let mut own = lock(&self.ownership);
            own.last = Some(ticket.clone());
            if own.first.is_none() {
                own.first = Some(ticket.clone());
                BufferId::FIRST
            } else {
                BufferId::SECOND
            }
        };
        tracing::debug!(generation, %buffer, query = %query, "search scheduled");

        let searcher = Arc::clone(&self.searcher);
        let ownership = Arc::clone(&self.ownership);
        let outcomes = self.outcomes.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let release = Release {
                ownership,
                ticket: ticket.clone(),
            };
            let results = searcher.search(&query, buffer, &ticket.cancel);

            // Release and deliver under one lock; the guard's own release
            // afterwards is a no-op.
            let mut own = lock(&release.ownership);
            own.release(&ticket);
            match results {
                Some(results) if !ticket.cancel.is_cancelled() => {
                    own.last_finished = buffer;
                    tracing::debug!(generation, %buffer, hits = results.len(), "search delivered");
                    // The receiver going away just means nobody is listening.
                    let _ = outcomes.send(SearchOutcome {
                        generation,
                        query,
                        buffer,
                        results,
                    });
                }
                _ => tracing::debug!(generation, %buffer, "stale search dropped"),
            }
        });

        if buffer == BufferId::FIRST {
            self.primary = Some(handle);
        } else {
            self.overlapped = Some(handle);
        }

        Ok(Scheduled { generation, buffer })
    }

    /// Let the searches in flight run to completion, then close the session.
    ///
    /// The outcome channel closes once every delivered outcome is received.
    pub async fn finish(mut self) -> anyhow::Result<()> {
        for handle in [self.primary.take(), self.overlapped.take()].into_iter().flatten() {
            handle.await?;
        }
        Ok(())
    }

    /// Cancel every search in flight and wait for all of them to stop.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        {
            let own = lock(&self.ownership);
            for ticket in own.first.iter().chain(own.last.iter()) {
                ticket.cancel.cancel();
            }
        }
        for handle in [self.primary.take(), self.overlapped.take()].into_iter().flatten() {
            handle.await?;
        }
        Ok(())
    }
}
