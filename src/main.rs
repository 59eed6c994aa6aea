use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hdrhistogram::Histogram;
use logbench::config::{count_records, BenchmarkConfig};
use logbench::latency::{LatencyBenchmark, SampleLog};
use logbench::throughput::{ThroughputBenchmark, ThroughputSummary};
use logbench::workload::{OpKind, WorkloadMix, KIND_ORDER};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML benchmark configuration; flags below override it
    #[arg(short, long)]
    config: Option<String>,
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    /// Preloaded key count; overrides counting the data file
    #[arg(long)]
    load_keys: Option<u64>,
    /// Newline-delimited data file; its line count is the preloaded key count
    #[arg(long)]
    data_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Phased (warmup/measure/cooldown) per-call latency of one operation kind
    Latency {
        #[arg(long, value_enum, default_value = "all")]
        op: OpArg,
    },
    /// Aggregate ops/sec under a weighted operation mix
    Throughput {
        #[arg(long)]
        get: Option<f64>,
        #[arg(long)]
        search: Option<f64>,
        #[arg(long)]
        append: Option<f64>,
        #[arg(long)]
        delete: Option<f64>,
        #[arg(long)]
        clients: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OpArg {
    Get,
    Search,
    Append,
    Delete,
    All,
}

impl OpArg {
    fn kinds(self) -> Vec<OpKind> {
        match self {
            OpArg::Get => vec![OpKind::Get],
            OpArg::Search => vec![OpKind::Search],
            OpArg::Append => vec![OpKind::Append],
            OpArg::Delete => vec![OpKind::Delete],
            OpArg::All => KIND_ORDER.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logbench=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = build_config(&args)?;

    match args.command {
        Command::Latency { op } => {
            for kind in op.kinds() {
                // fresh connection per operation kind
                let mut bench = LatencyBenchmark::new(config.clone())
                    .await
                    .context("opening benchmark connection")?;
                let samples = match kind {
                    OpKind::Get => bench.benchmark_get_latency().await,
                    OpKind::Search => bench.benchmark_search_latency().await,
                    OpKind::Append => bench.benchmark_append_latency().await,
                    OpKind::Delete => bench.benchmark_delete_latency().await,
                }
                .with_context(|| format!("{kind} latency benchmark"))?;
                report_latency(kind, &samples)?;
            }
        }
        Command::Throughput {
            get,
            search,
            append,
            delete,
            clients,
        } => {
            let mix = WorkloadMix::new(
                get.unwrap_or(config.mix.get),
                search.unwrap_or(config.mix.search),
                append.unwrap_or(config.mix.append),
                delete.unwrap_or(config.mix.delete),
            )?;
            let clients = clients.unwrap_or(config.num_clients);
            let summary = ThroughputBenchmark::new(config).run(mix, clients).await?;
            report_throughput(&summary);
        }
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<BenchmarkConfig> {
    let mut config = match &args.config {
        Some(path) => BenchmarkConfig::new(path)?,
        None => BenchmarkConfig::default(),
    };
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(path) = &args.data_path {
        config.data_path = Some(path.clone());
        config.load_keys = count_records(path)?;
    }
    if let Some(load_keys) = args.load_keys {
        config.load_keys = load_keys;
    }
    Ok(config)
}

fn report_latency(kind: OpKind, samples: &SampleLog) -> Result<()> {
    if samples.is_empty() {
        println!("{kind}: no samples recorded");
        return Ok(());
    }
    let mut hist = Histogram::<u64>::new(3).context("building histogram")?;
    for &us in samples {
        hist.record(us).context("recording sample")?;
    }
    let mean = samples.iter().sum::<u64>() as f64 / samples.len() as f64;
    println!(
        "{kind}: samples={} mean={:.1}us p50={}us p95={}us p99={}us max={}us",
        samples.len(),
        mean,
        hist.value_at_quantile(0.50),
        hist.value_at_quantile(0.95),
        hist.value_at_quantile(0.99),
        hist.max(),
    );
    Ok(())
}

fn report_throughput(summary: &ThroughputSummary) {
    println!(
        "throughput: {:.2} ops/sec ({} ops in {:.2?}, {} workers)",
        summary.ops_per_sec(),
        summary.total_ops,
        summary.elapsed,
        summary.workers.len(),
    );
    for kind in KIND_ORDER {
        let count = summary.per_kind[kind.index()];
        if count > 0 {
            println!("  {kind}: {count} ops");
        }
    }
    for w in &summary.workers {
        println!(
            "  worker {}: {} ops in {:.2?}",
            w.worker_id,
            w.completed,
            w.elapsed()
        );
    }
    for (worker_id, err) in &summary.failures {
        println!("  worker {worker_id} FAILED: {err} (results are partial)");
    }
}
