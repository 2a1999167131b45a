//! Several directory scans at once.
//!
//! A [`MultiProcessor`] owns a fixed pool of worker threads pulling scan
//! requests from an unbuffered queue. Each request runs a complete pipeline
//! for its directory, and the request's callback receives the result on the
//! worker thread once that pipeline has drained.

use std::mem;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, warn};

use crate::error::PolylocError;
use crate::language::feature::LanguageDatabase;
use crate::limits::fit_config;
use crate::options::ScanConfig;
use crate::pipeline::Pipeline;
use crate::stats::ScanResult;
use crate::Result;

type OnResult = Box<dyn FnOnce(Result<ScanResult>) + Send>;

struct ProcessInput {
    dir: PathBuf,
    on_result: OnResult,
}

/// Pool running independent directory scans concurrently.
pub struct MultiProcessor {
    work_queue: Option<Sender<ProcessInput>>,
    workers: Vec<JoinHandle<()>>,
    processed: Arc<AtomicUsize>,
}

impl MultiProcessor {
    /// Start `in_parallel` workers sharing one language database.
    ///
    /// Worker counts in `config` apply to each scan and are scaled down
    /// when the open file limit cannot cover all scans at once.
    pub fn new(in_parallel: usize, config: ScanConfig) -> Result<Self> {
        let in_parallel = in_parallel.max(1);
        let config = fit_config(config, in_parallel);
        let database = Arc::new(LanguageDatabase::configured(&config)?);
        let pipeline = Pipeline::with_database(config, database);

        let (sender, receiver) = bounded(0);
        let processed = Arc::new(AtomicUsize::new(0));

        let workers = (1..=in_parallel)
            .map(|id| {
                let pipeline = pipeline.clone();
                let receiver = receiver.clone();
                let processed = processed.clone();
                thread::spawn(move || worker(id, pipeline, receiver, processed))
            })
            .collect();

        Ok(Self {
            work_queue: Some(sender),
            workers,
            processed,
        })
    }

    /// Queue a scan of `dir`. Blocks until a worker accepts it.
    pub fn process(
        &self,
        dir: impl Into<PathBuf>,
        on_result: impl FnOnce(Result<ScanResult>) + Send + 'static,
    ) -> Result<()> {
        let input = ProcessInput {
            dir: dir.into(),
            on_result: Box::new(on_result),
        };
        info!("queue processing {}", input.dir.display());

        let queue = self.work_queue.as_ref().ok_or(PolylocError::WorkersStopped)?;
        queue.send(input).map_err(|_| PolylocError::WorkersStopped)
    }

    /// Number of scans started so far.
    pub fn processed_count(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    /// Close the queue and wait for every accepted scan to finish.
    pub fn complete(mut self) {
        info!("completing multi processor");
        self.shutdown();
        info!("multi processor is finished");
    }

    fn shutdown(&mut self) {
        drop(self.work_queue.take());
        for handle in mem::take(&mut self.workers) {
            if handle.join().is_err() {
                warn!("multi processor worker panicked");
            }
        }
    }
}

impl Drop for MultiProcessor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker(id: usize, pipeline: Pipeline, queue: Receiver<ProcessInput>, processed: Arc<AtomicUsize>) {
    info!("started worker {id}");
    for input in queue {
        let number = processed.fetch_add(1, Ordering::SeqCst) + 1;
        info!("start processing {number}: {}", input.dir.display());

        let result = pipeline.scan(&[input.dir.clone()]);
        match &result {
            Ok(result) => info!(
                "completed processing {number}: {}: {}",
                input.dir.display(),
                result.total
            ),
            Err(e) => warn!("processing {number} failed: {e}"),
        }
        (input.on_result)(result);
    }
    debug!("worker {id} is done");
}
