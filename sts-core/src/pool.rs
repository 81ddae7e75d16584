//! Fixed-slot worker pool for the kernels that run bitstreams in parallel.
//!
//! The pool holds up to `threads` pending bitstreams, each with disjoint
//! working state. Once every slot is occupied, all of them run at the same
//! time on a private rayon pool and the results are handed back in slot
//! order, which is submission order. With a single slot the work runs
//! inline, so `thread count = 1` is bit-identical to the sequential path.

use crate::bitstream::Bitstream;
use crate::Error;
use rayon::prelude::*;

/// Upper bound for the `thread count` kernel parameter.
pub(crate) const MAX_THREADS: u64 = 128;

/// A bitstream captured for deferred execution. The driver releases its own
/// buffer after every execute call, so queued slots keep a copy.
pub(crate) struct PendingStream {
    pub test_id: u64,
    pub bits: Box<[u8]>,
}

impl PendingStream {
    pub fn capture(stream: &Bitstream) -> Self {
        Self {
            test_id: stream.id(),
            bits: stream.bits().into(),
        }
    }
}

pub(crate) struct SlotPool<T> {
    slots: Vec<T>,
    capacity: usize,
    pool: Option<rayon::ThreadPool>,
}

impl<T: Send + Sync> SlotPool<T> {
    pub fn new(threads: u64) -> Result<Self, Error> {
        if !(1..=MAX_THREADS).contains(&threads) {
            return Err(Error::InvalidParameter(format!(
                "thread count must be within [1, {MAX_THREADS}], is {threads}"
            )));
        }

        let pool = if threads > 1 {
            // more workers than cores buys nothing for CPU-bounded kernels;
            // the slot count stays at the configured thread count either way
            let workers = (threads as usize).min(num_cpus::get().max(1));
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| {
                    Error::InvalidParameter(format!("failed to build the worker pool: {e}"))
                })?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            slots: Vec::with_capacity(threads as usize),
            capacity: threads as usize,
            pool,
        })
    }

    /// Queue one item. When this fills the last free slot, every queued
    /// item runs and the results come back in submission order; otherwise
    /// the returned list is empty.
    pub fn submit<R, F>(&mut self, item: T, work: F) -> Vec<R>
    where
        R: Send,
        F: Fn(&T) -> R + Send + Sync,
    {
        self.slots.push(item);
        if self.slots.len() == self.capacity {
            self.drain(work)
        } else {
            Vec::new()
        }
    }

    /// Run every queued slot, join, and hand back the results in slot
    /// order. Used by submit on a full pool and by the kernels at finalize.
    pub fn drain<R, F>(&mut self, work: F) -> Vec<R>
    where
        R: Send,
        F: Fn(&T) -> R + Send + Sync,
    {
        let results = match &self.pool {
            Some(pool) => pool.install(|| self.slots.par_iter().map(&work).collect()),
            None => self.slots.iter().map(&work).collect(),
        };
        self.slots.clear();
        results
    }
}
