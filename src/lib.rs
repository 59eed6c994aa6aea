//! Load-generation and measurement harness for a remote log-store service
//! speaking the `LogStore` gRPC interface (Get / Search / Append / Delete).
//!
//! Two modes: [`latency::LatencyBenchmark`] samples per-call latency of one
//! operation kind over a dedicated connection with a warmup/measure/cooldown
//! discipline; [`throughput::ThroughputBenchmark`] drives a weighted-random
//! operation mix from N barrier-synchronized workers and reports aggregate
//! completed operations per second.

pub mod api;
pub mod barrier;
pub mod config;
pub mod connection;
pub mod error;
pub mod latency;
pub mod random;
pub mod throughput;
pub mod workload;
