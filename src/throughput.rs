use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

use crate::barrier::Barrier;
use crate::config::BenchmarkConfig;
use crate::connection::Connection;
use crate::error::{BenchError, Phase, Result};
use crate::random::RandomSource;
use crate::workload::{CumulativeMix, Operation, WorkloadMix, KIND_ORDER};

/// What one worker did: counts plus the instants bracketing its timed loop.
#[derive(Debug)]
pub struct WorkerStats {
    pub worker_id: u32,
    pub completed: u64,
    /// Indexed by `OpKind::index()`.
    pub per_kind: [u64; 4],
    released_at: Instant,
    finished_at: Instant,
}

impl WorkerStats {
    pub fn elapsed(&self) -> Duration {
        self.finished_at - self.released_at
    }
}

/// Aggregate of a throughput run. The window spans from the first worker's
/// release to the last worker's finish; workers start together (barrier), so
/// the window reflects uniform concurrency from its first sample.
#[derive(Debug)]
pub struct ThroughputSummary {
    pub total_ops: u64,
    pub per_kind: [u64; 4],
    pub elapsed: Duration,
    pub workers: Vec<WorkerStats>,
    /// Workers that died mid-run, with their errors. Their completed calls
    /// are not part of the summary; siblings' results still are.
    pub failures: Vec<(u32, BenchError)>,
}

impl ThroughputSummary {
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total_ops as f64 / secs
    }
}

/// Orchestrates N shared-nothing workers, each with its own connection and
/// generator, synchronized to a common start.
pub struct ThroughputBenchmark {
    config: Arc<BenchmarkConfig>,
}

impl ThroughputBenchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub async fn run(&self, mix: WorkloadMix, num_clients: u32) -> Result<ThroughputSummary> {
        mix.validate()?;
        if num_clients == 0 {
            return Err(BenchError::Config("num_clients must be at least 1".into()));
        }
        if mix.consumes_keys() && self.config.load_keys == 0 {
            return Err(BenchError::Config(
                "mix targets existing keys but load_keys is 0".into(),
            ));
        }

        info!(
            num_clients,
            get = mix.get,
            search = mix.search,
            append = mix.append,
            delete = mix.delete,
            "starting throughput benchmark"
        );

        let barrier = Arc::new(Barrier::new(num_clients));
        let (stop_tx, stop_rx) = watch::channel(false);

        let mut handles = Vec::with_capacity(num_clients as usize);
        for worker_id in 0..num_clients {
            let config = Arc::clone(&self.config);
            let barrier = Arc::clone(&barrier);
            let stop = stop_rx.clone();
            handles.push(tokio::spawn(async move {
                worker(worker_id, config, mix, barrier, stop).await
            }));
        }

        if let Some(limit) = self.config.time_limit() {
            tokio::spawn(async move {
                time::sleep(limit).await;
                let _ = stop_tx.send(true);
            });
        }

        let mut workers = Vec::new();
        let mut failures = Vec::new();
        for (worker_id, handle) in handles.into_iter().enumerate() {
            let worker_id = worker_id as u32;
            match handle.await {
                Ok(Ok(stats)) => workers.push(stats),
                Ok(Err(err)) => failures.push((worker_id, err)),
                // workers are never cancelled, a join error is a panic
                Err(join_err) => std::panic::resume_unwind(join_err.into_panic()),
            }
        }

        for (worker_id, err) in &failures {
            warn!(worker_id, error = %err, "worker failed, reporting partial results");
        }

        let total_ops = workers.iter().map(|w| w.completed).sum();
        let mut per_kind = [0u64; 4];
        for w in &workers {
            for kind in KIND_ORDER {
                per_kind[kind.index()] += w.per_kind[kind.index()];
            }
        }
        let elapsed = match (
            workers.iter().map(|w| w.released_at).min(),
            workers.iter().map(|w| w.finished_at).max(),
        ) {
            (Some(start), Some(end)) => end - start,
            _ => Duration::ZERO,
        };

        let summary = ThroughputSummary {
            total_ops,
            per_kind,
            elapsed,
            workers,
            failures,
        };
        info!(
            total_ops = summary.total_ops,
            elapsed = ?summary.elapsed,
            ops_per_sec = summary.ops_per_sec(),
            failed_workers = summary.failures.len(),
            "throughput benchmark finished"
        );
        Ok(summary)
    }
}

/// One worker: own connection, own generator, own cumulative mix table.
/// Draws a kind per iteration, issues the call, and only checks the stop
/// signal between calls; an issued call always runs to completion.
async fn worker(
    worker_id: u32,
    config: Arc<BenchmarkConfig>,
    mix: WorkloadMix,
    barrier: Arc<Barrier>,
    stop: watch::Receiver<bool>,
) -> Result<WorkerStats> {
    let mut conn = Connection::open(&config.host, config.port).await?;
    let mut rng = RandomSource::from_entropy();
    let table = CumulativeMix::new(&mix);

    barrier.wait().await;
    let released_at = Instant::now();
    debug!(worker_id, "released");

    let mut per_kind = [0u64; 4];
    let mut completed = 0u64;
    while completed < config.thread_request_count && !*stop.borrow() {
        let kind = table.pick(rng.uniform_real(0.0, 1.0));
        let op = Operation::synthesize(kind, &mut rng, config.load_keys, config.append_value_len);
        conn.issue(op).await.map_err(|status| BenchError::Operation {
            phase: Phase::Throughput,
            kind,
            status,
        })?;
        per_kind[kind.index()] += 1;
        completed += 1;
    }
    let finished_at = Instant::now();

    debug!(worker_id, completed, elapsed = ?(finished_at - released_at), "worker done");
    Ok(WorkerStats {
        worker_id,
        completed,
        per_kind,
        released_at,
        finished_at,
    })
}
