use std::fmt;

use thiserror::Error;

use crate::workload::OpKind;

/// Which part of a benchmark an operation was issued from. Carried on
/// operation errors so a failed run names the window it died in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Warmup,
    Measure,
    Cooldown,
    Throughput,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Warmup => "warmup",
            Phase::Measure => "measure",
            Phase::Cooldown => "cooldown",
            Phase::Throughput => "throughput",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum BenchError {
    /// The session could not be established. Never retried here; retry
    /// policy belongs to the caller.
    #[error("connecting to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// A single RPC failed. Fatal to a latency run, fatal only to the
    /// issuing worker in throughput mode.
    #[error("{kind} failed during {phase}: {status}")]
    Operation {
        phase: Phase,
        kind: OpKind,
        #[source]
        status: tonic::Status,
    },

    /// Rejected before any worker is spawned.
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BenchError>;
