use std::time::Instant;

use tracing::{debug, info};

use crate::config::{BenchmarkConfig, PhaseLimits};
use crate::connection::Connection;
use crate::error::{BenchError, Phase, Result};
use crate::random::RandomSource;
use crate::workload::{OpKind, Operation};

/// Elapsed microseconds per call, in issue order, for one operation kind.
pub type SampleLog = Vec<u64>;

/// Single-connection phased sampler: warmup calls discard timings to shake
/// out cold caches and a cold connection, the measure phase records one
/// elapsed delta per call, cooldown drains queued server-side effects so the
/// measured tail stays clean.
pub struct LatencyBenchmark {
    config: BenchmarkConfig,
    conn: Connection,
    rng: RandomSource,
}

impl LatencyBenchmark {
    /// Opens the benchmark's dedicated connection.
    pub async fn new(config: BenchmarkConfig) -> Result<Self> {
        let conn = Connection::open(&config.host, config.port).await?;
        Ok(Self {
            config,
            conn,
            rng: RandomSource::from_entropy(),
        })
    }

    pub async fn benchmark_get_latency(&mut self) -> Result<SampleLog> {
        self.run(OpKind::Get).await
    }

    pub async fn benchmark_search_latency(&mut self) -> Result<SampleLog> {
        self.run(OpKind::Search).await
    }

    pub async fn benchmark_append_latency(&mut self) -> Result<SampleLog> {
        self.run(OpKind::Append).await
    }

    pub async fn benchmark_delete_latency(&mut self) -> Result<SampleLog> {
        self.run(OpKind::Delete).await
    }

    async fn run(&mut self, kind: OpKind) -> Result<SampleLog> {
        if kind.consumes_key() && self.config.load_keys == 0 {
            return Err(BenchError::Config(format!(
                "{kind} latency benchmark needs preloaded keys, load_keys is 0"
            )));
        }
        info!(%kind, "starting latency benchmark");

        self.run_phase(Phase::Warmup, self.config.warmup, kind, None)
            .await?;

        let mut samples = SampleLog::with_capacity(self.config.measure.ops.min(1 << 20) as usize);
        self.run_phase(Phase::Measure, self.config.measure, kind, Some(&mut samples))
            .await?;

        self.run_phase(Phase::Cooldown, self.config.cooldown, kind, None)
            .await?;

        info!(%kind, samples = samples.len(), "latency benchmark finished");
        Ok(samples)
    }

    /// Issues calls until either ceiling is reached. An in-flight call runs
    /// to completion; the time ceiling is only checked between calls.
    async fn run_phase(
        &mut self,
        phase: Phase,
        limits: PhaseLimits,
        kind: OpKind,
        mut samples: Option<&mut SampleLog>,
    ) -> Result<()> {
        let started = Instant::now();
        let mut ops = 0u64;
        while ops < limits.ops && started.elapsed() < limits.time() {
            let op = Operation::synthesize(
                kind,
                &mut self.rng,
                self.config.load_keys,
                self.config.append_value_len,
            );
            let begin = Instant::now();
            self.conn
                .issue(op)
                .await
                .map_err(|status| BenchError::Operation { phase, kind, status })?;
            if let Some(samples) = samples.as_mut() {
                samples.push(begin.elapsed().as_micros() as u64);
            }
            ops += 1;
        }
        debug!(%phase, %kind, ops, elapsed = ?started.elapsed(), "phase done");
        Ok(())
    }
}
