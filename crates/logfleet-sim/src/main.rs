//! logfleet - synthetic log traffic generator
//!
//! Usage:
//!   logfleet run --url http://localhost:3100/loki/api/v1/push --tenant-id 29
//!   logfleet run --dry
//!   logfleet list

use clap::Parser;
use logfleet_sim::sink::{LokiPush, OtlpLogs};
use logfleet_sim::{Cli, Commands, LokiSink, Orchestrator, OtlpSink, Registry, RunArgs, Sinks};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::List => {
            run_list();
            Ok(())
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    init_tracing(&args.log_level);

    let fleet = args.fleet_config()?;
    let batch = args.batch_config()?;

    let cancel = CancellationToken::new();
    let sink_shutdown = CancellationToken::new();
    let mut workers = Vec::new();

    let sinks = if args.dry {
        info!("dry run, printing to stdout");
        Sinks::console()
    } else {
        let (loki, loki_worker) = LokiSink::spawn(
            LokiPush::new(&args.url, args.tenant_id.clone())?,
            batch.clone(),
            sink_shutdown.clone(),
        )?;
        let (otlp, otlp_worker) = OtlpSink::spawn(
            OtlpLogs::new(&args.otlp_endpoint)?,
            batch,
            sink_shutdown.clone(),
        )?;
        workers.push(loki_worker);
        workers.push(otlp_worker);
        Sinks {
            primary: Arc::new(loki),
            otel: Some(Arc::new(otlp)),
        }
    };

    let orchestrator =
        Orchestrator::new(Registry::builtin(), fleet, args.orchestrator_config(), sinks)?;

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
        info!("interrupt received");
        interrupt.cancel();
    });

    let delivered = orchestrator.run(cancel).await;

    sink_shutdown.cancel();
    for worker in workers {
        if let Err(e) = worker.await {
            error!(error = %e, "push worker panicked");
        }
    }

    info!(delivered, "done");
    Ok(())
}

fn run_list() {
    let registry = Registry::builtin();

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                   Simulated Components                       ║");
    println!("╠══════════════════════════════════════════════════════════════╣");

    for entry in registry.iter() {
        println!(
            "║ {:16} {:22} {:12} {:>6} ║",
            entry.namespace,
            entry.service,
            entry.profile.kind(),
            entry.profile.stream_count()
        );
    }

    println!("╚══════════════════════════════════════════════════════════════╝");
    println!("\nUsage: logfleet run [--dry] [--url <LOKI_PUSH_URL>] [--tenant-id <ID>]");
}
