use std::fmt;

use serde::Deserialize;

use crate::error::{BenchError, Result};
use crate::random::RandomSource;

/// Fixed kind order. The cumulative mix table and all per-kind counters are
/// indexed in this order.
pub const KIND_ORDER: [OpKind; 4] = [OpKind::Get, OpKind::Search, OpKind::Append, OpKind::Delete];

/// How far the four fractions may drift from summing to exactly 1.0.
const MIX_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Get,
    Search,
    Append,
    Delete,
}

impl OpKind {
    pub fn index(self) -> usize {
        match self {
            OpKind::Get => 0,
            OpKind::Search => 1,
            OpKind::Append => 2,
            OpKind::Delete => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Get => "get",
            OpKind::Search => "search",
            OpKind::Append => "append",
            OpKind::Delete => "delete",
        }
    }

    /// Get, Search and Delete all target an existing key; Append does not.
    pub fn consumes_key(self) -> bool {
        !matches!(self, OpKind::Append)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative proportions of the four operation kinds in a throughput run.
/// A discrete probability distribution: every fraction in [0, 1], summing
/// to 1.0 within tolerance.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WorkloadMix {
    pub get: f64,
    pub search: f64,
    pub append: f64,
    pub delete: f64,
}

impl WorkloadMix {
    pub fn new(get: f64, search: f64, append: f64, delete: f64) -> Result<Self> {
        let mix = Self {
            get,
            search,
            append,
            delete,
        };
        mix.validate()?;
        Ok(mix)
    }

    pub fn fraction(&self, kind: OpKind) -> f64 {
        match kind {
            OpKind::Get => self.get,
            OpKind::Search => self.search,
            OpKind::Append => self.append,
            OpKind::Delete => self.delete,
        }
    }

    /// True when the mix issues any operation that targets an existing key.
    pub fn consumes_keys(&self) -> bool {
        KIND_ORDER
            .iter()
            .any(|k| k.consumes_key() && self.fraction(*k) > 0.0)
    }

    pub fn validate(&self) -> Result<()> {
        for kind in KIND_ORDER {
            let f = self.fraction(kind);
            if !(0.0..=1.0).contains(&f) {
                return Err(BenchError::Config(format!(
                    "{kind} fraction {f} outside [0, 1]"
                )));
            }
        }
        let sum = self.get + self.search + self.append + self.delete;
        if (sum - 1.0).abs() > MIX_SUM_TOLERANCE {
            return Err(BenchError::Config(format!(
                "workload fractions sum to {sum}, expected 1.0"
            )));
        }
        Ok(())
    }
}

/// Cumulative distribution over the four kinds, built once per worker.
/// `pick` maps a uniform draw in [0, 1) to the first kind whose cumulative
/// upper bound reaches the draw, ties broken by the fixed kind order.
pub struct CumulativeMix {
    bounds: [f64; 4],
}

impl CumulativeMix {
    pub fn new(mix: &WorkloadMix) -> Self {
        let mut bounds = [0.0; 4];
        let mut sum = 0.0;
        for kind in KIND_ORDER {
            sum += mix.fraction(kind);
            bounds[kind.index()] = sum;
        }
        Self { bounds }
    }

    pub fn pick(&self, draw: f64) -> OpKind {
        for kind in KIND_ORDER {
            if self.bounds[kind.index()] >= draw {
                return kind;
            }
        }
        // rounding left the last bound a hair under the draw
        OpKind::Delete
    }
}

/// One fully synthesized call, ready to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Get { key: i64 },
    Search { query: String },
    Append { value: Vec<u8> },
    Delete { key: i64 },
}

impl Operation {
    /// Draw operands for one call of `kind`: a random existing key index for
    /// Get/Search/Delete, random bytes for Append. Callers must have
    /// rejected key-consuming kinds when `load_keys` is zero.
    pub fn synthesize(
        kind: OpKind,
        rng: &mut RandomSource,
        load_keys: u64,
        append_value_len: usize,
    ) -> Operation {
        match kind {
            OpKind::Get => Operation::Get {
                key: rng.random_index(load_keys.saturating_sub(1)) as i64,
            },
            OpKind::Search => Operation::Search {
                query: rng.random_index(load_keys.saturating_sub(1)).to_string(),
            },
            OpKind::Append => Operation::Append {
                value: rng.fill_value(append_value_len),
            },
            OpKind::Delete => Operation::Delete {
                key: rng.random_index(load_keys.saturating_sub(1)) as i64,
            },
        }
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Get { .. } => OpKind::Get,
            Operation::Search { .. } => OpKind::Search,
            Operation::Append { .. } => OpKind::Append,
            Operation::Delete { .. } => OpKind::Delete,
        }
    }
}
