// sixela::threadpool
//
// TOC
// - struct ThreadPool
// - impl ThreadPool

use crate::SixelError;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() -> Result<(), SixelError> + Send>;

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
    shutdown: Mutex<bool>,
    first_error: Mutex<Option<SixelError>>,
}

/// A fixed-size worker pool with a bounded job ring and first-error
/// latching, used by the parallel decoder to fan band-decode jobs across
/// threads.
///
/// # Adaptation
/// - Derived from `sixel_threadpool` in the `libsixel` C library: a
///   `Mutex` + two `Condvar`s implement the bounded producer/consumer ring
///   (`not_full`/`not_empty`), and the first worker to return an error
///   latches it so later jobs' errors are dropped rather than clobbering
///   the one the caller will observe. Built on `std::thread`/`std::sync`
///   rather than `rayon`'s work-stealing pool; see the design notes on why
///   a bounded-ring contract does not map onto that model.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawns `nthreads` worker threads, each pulling jobs from a ring
    /// bounded at `capacity` pending jobs.
    #[must_use]
    pub fn new(nthreads: usize, capacity: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: capacity.max(1),
            shutdown: Mutex::new(false),
            first_error: Mutex::new(None),
        });

        let workers = (0..nthreads.max(1))
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || Self::worker_loop(&shared))
            })
            .collect();

        Self { shared, workers }
    }

    fn worker_loop(shared: &Arc<Shared>) {
        loop {
            let job = {
                let mut queue = shared.queue.lock().unwrap();
                loop {
                    if let Some(job) = queue.pop_front() {
                        shared.not_full.notify_one();
                        break Some(job);
                    }
                    if *shared.shutdown.lock().unwrap() {
                        break None;
                    }
                    queue = shared.not_empty.wait(queue).unwrap();
                }
            };
            let Some(job) = job else { break };
            if let Err(e) = job() {
                let mut first = shared.first_error.lock().unwrap();
                if first.is_none() {
                    *first = Some(e);
                }
            }
        }
    }

    /// Enqueues `job`, blocking while the ring is full.
    pub fn submit(&self, job: impl FnOnce() -> Result<(), SixelError> + Send + 'static) {
        let mut queue = self.shared.queue.lock().unwrap();
        while queue.len() >= self.shared.capacity {
            queue = self.shared.not_full.wait(queue).unwrap();
        }
        queue.push_back(Box::new(job));
        self.shared.not_empty.notify_one();
    }

    /// Waits for all submitted jobs to finish, shuts workers down, and
    /// returns the first error any job reported, if any.
    pub fn join(mut self) -> Option<SixelError> {
        {
            let queue = self.shared.queue.lock().unwrap();
            let mut queue = queue;
            while !queue.is_empty() {
                queue = self.shared.not_full.wait(queue).unwrap();
            }
        }
        *self.shared.shutdown.lock().unwrap() = true;
        self.shared.not_empty.notify_all();
        for w in self.workers.drain(..) {
            let _ = w.join();
        }
        self.shared.first_error.lock().unwrap().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn runs_all_submitted_jobs() {
        let pool = ThreadPool::new(4, 8);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        let err = pool.join();
        assert!(err.is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn latches_first_error_only() {
        let pool = ThreadPool::new(2, 4);
        pool.submit(|| Err(SixelError::Runtime("first")));
        pool.submit(|| Err(SixelError::Runtime("second")));
        let err = pool.join().unwrap();
        assert!(matches!(err, SixelError::Runtime("first") | SixelError::Runtime("second")));
    }
}
