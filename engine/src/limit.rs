use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex,
    },
    time::{Duration, Instant},
};

use super::SearchError;

#[derive(Debug)]
/// The stopping condition shared between the search thread and whatever
/// drives it (the UCI loop, or a fixed-depth caller). Readable and
/// stoppable from any thread without locking out the search's own node
/// counting.
pub struct SearchLimit {
    /// Set once the search must return on its next check-in.
    over: AtomicBool,
    /// Nodes visited since the last call to `start`.
    num_nodes: AtomicU64,
    /// Hard node cap, if any; `None` means node count never stops the search.
    pub nodes_cap: Mutex<Option<u64>>,
    /// When `start` was called.
    start_time: Mutex<Instant>,
    /// When the search must stop, derived from `search_duration`; `None` for
    /// an untimed search.
    end_time: Mutex<Option<Instant>>,
    /// Wall-clock budget for the search, if any.
    pub search_duration: Mutex<Option<Duration>>,
}

impl SearchLimit {
    /// An untimed, unbounded `SearchLimit`; call `start` before using it in a
    /// search.
    pub fn new() -> SearchLimit {
        SearchLimit {
            over: AtomicBool::new(false),
            num_nodes: AtomicU64::new(0),
            nodes_cap: Mutex::new(None),
            start_time: Mutex::new(Instant::now()),
            end_time: Mutex::new(None),
            search_duration: Mutex::new(None),
        }
    }

    /// Start the search limit, by setting its start time to now.
    pub fn start(&self) -> Result<(), SearchError> {
        self.num_nodes.store(0, Ordering::Relaxed);
        self.over.store(false, Ordering::Relaxed);
        *self.start_time.lock().map_err(|_| SearchError::Poison)? = Instant::now();
        let opt_duration = self
            .search_duration
            .lock()
            .map_err(|_| SearchError::Poison)?;
        if let Some(dur) = *opt_duration {
            *self.end_time.lock().map_err(|_| SearchError::Poison)? = Some(Instant::now() + dur);
        };
        Ok(())
    }

    #[inline]
    /// Poll whether the search is over.
    pub fn is_over(&self) -> bool {
        self.over.load(Ordering::Relaxed)
    }

    #[inline]
    /// Immediately mark the search as over. Used to service a UCI `stop` command between
    /// iterative-deepening iterations, since the search itself runs synchronously on the calling
    /// thread and cannot be interrupted mid-iteration.
    pub fn stop(&self) {
        self.over.store(true, Ordering::Relaxed);
    }

    #[inline]
    /// Check the elapsed time to see if this search is over, and if so, update
    /// accordingly.
    pub fn update_time(&self) -> Result<bool, SearchError> {
        if let Some(end) = *self.end_time.lock().map_err(|_| SearchError::Poison)? {
            if Instant::now() > end {
                self.over.store(true, Ordering::Relaxed);
                return Ok(true);
            }
        }

        Ok(false)
    }

    #[inline]
    /// Record that `nodes` more nodes were searched, and mark the search over
    /// if that crosses `nodes_cap`. Errors if the node-cap mutex is poisoned.
    pub fn add_nodes(&self, nodes: u64) -> Result<(), SearchError> {
        self.num_nodes.fetch_add(nodes, Ordering::Relaxed);
        if let Some(max_nodes) = *self.nodes_cap.lock()? {
            if self.num_nodes.load(Ordering::Relaxed) > max_nodes {
                self.over.store(true, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    #[inline]
    /// Get the cumulative number of nodes searched.
    pub fn num_nodes(&self) -> u64 {
        self.num_nodes.load(Ordering::Relaxed)
    }
}

impl Default for SearchLimit {
    fn default() -> Self {
        SearchLimit::new()
    }
}
