use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{BenchError, Result};
use crate::workload::WorkloadMix;

/// Bounds for one latency phase. A phase ends when EITHER ceiling is
/// reached, whichever comes first, so a degenerate slow service cannot make
/// a run open-ended.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PhaseLimits {
    pub ops: u64,
    pub time_ms: u64,
}

impl PhaseLimits {
    pub fn time(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }
}

fn default_warmup() -> PhaseLimits {
    PhaseLimits {
        ops: 1_000,
        time_ms: 5_000,
    }
}

fn default_measure() -> PhaseLimits {
    PhaseLimits {
        ops: 100_000,
        time_ms: 10_000,
    }
}

fn default_cooldown() -> PhaseLimits {
    PhaseLimits {
        ops: 1_000,
        time_ms: 5_000,
    }
}

fn default_num_clients() -> u32 {
    1
}

fn default_thread_request_count() -> u64 {
    75_000
}

fn default_append_value_len() -> usize {
    128
}

fn default_mix() -> WorkloadMix {
    WorkloadMix {
        get: 0.25,
        search: 0.25,
        append: 0.25,
        delete: 0.25,
    }
}

/// Immutable per-run settings, shared read-only by every worker.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkConfig {
    pub host: String,
    pub port: u16,

    /// Newline-delimited records preloaded into the store. Only used to
    /// derive `load_keys` when that field is not given explicitly.
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Number of preloaded keys available for Get/Search/Delete sampling.
    #[serde(default)]
    pub load_keys: u64,

    #[serde(default = "default_num_clients")]
    pub num_clients: u32,

    #[serde(default = "default_warmup")]
    pub warmup: PhaseLimits,
    #[serde(default = "default_measure")]
    pub measure: PhaseLimits,
    #[serde(default = "default_cooldown")]
    pub cooldown: PhaseLimits,

    /// Operations each throughput worker issues before stopping.
    #[serde(default = "default_thread_request_count")]
    pub thread_request_count: u64,

    #[serde(default = "default_append_value_len")]
    pub append_value_len: usize,

    /// Optional overall throughput cutoff; fires the stop signal workers
    /// check between calls. No cutoff by default: the per-worker request
    /// count is the primary stop mechanism.
    #[serde(default)]
    pub time_limit_ms: Option<u64>,

    #[serde(default = "default_mix")]
    pub mix: WorkloadMix,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11002,
            data_path: None,
            load_keys: 0,
            num_clients: default_num_clients(),
            warmup: default_warmup(),
            measure: default_measure(),
            cooldown: default_cooldown(),
            thread_request_count: default_thread_request_count(),
            append_value_len: default_append_value_len(),
            time_limit_ms: None,
            mix: default_mix(),
        }
    }
}

impl BenchmarkConfig {
    pub fn new(file: &str) -> Result<Self> {
        let raw = fs::read_to_string(file)
            .map_err(|e| BenchError::Config(format!("reading {file}: {e}")))?;
        let mut cfg: Self =
            toml::from_str(&raw).map_err(|e| BenchError::Config(format!("parsing {file}: {e}")))?;
        if cfg.load_keys == 0 {
            if let Some(path) = cfg.data_path.clone() {
                cfg.load_keys = count_records(&path)?;
            }
        }
        Ok(cfg)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// The data file's only role here: one record per line, its line count is
/// the preloaded key count.
pub fn count_records(path: &Path) -> Result<u64> {
    let file = fs::File::open(path)
        .map_err(|e| BenchError::Config(format!("opening {}: {e}", path.display())))?;
    let mut count = 0u64;
    for line in BufReader::new(file).lines() {
        line.map_err(|e| BenchError::Config(format!("reading {}: {e}", path.display())))?;
        count += 1;
    }
    Ok(count)
}
