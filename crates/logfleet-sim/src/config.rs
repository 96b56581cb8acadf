//! Command line
//!
//! Usage:
//!   logfleet run --url http://localhost:3100/loki/api/v1/push
//!   logfleet run --dry
//!   logfleet list

use crate::error::{Error, Result};
use crate::fleet::{FleetConfig, PINNED_POD_COUNT, PINNED_SERVICE};
use crate::orchestrator::OrchestratorConfig;
use crate::sink::{BatchConfig, loki, otlp};
use clap::{Args, Parser, Subcommand};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "logfleet")]
#[command(about = "Synthetic multi-tenant log traffic for Loki and OTLP backends")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the fleet until interrupted
    Run(RunArgs),

    /// List simulated components
    List,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Loki push endpoint
    #[arg(long, default_value = loki::DEFAULT_PUSH_URL)]
    pub url: String,

    /// Print to stdout instead of pushing anywhere
    #[arg(long)]
    pub dry: bool,

    /// Tenant sent as X-Scope-OrgID
    #[arg(long)]
    pub tenant_id: Option<String>,

    /// OTLP/HTTP collector base URL for `-otel` services
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", default_value = otlp::DEFAULT_ENDPOINT)]
    pub otlp_endpoint: String,

    /// Clusters every component is replicated across
    #[arg(long, value_delimiter = ',', default_values = logfleet_core::values::CLUSTERS)]
    pub clusters: Vec<String>,

    /// Service with a fixed replica count
    #[arg(long, default_value = PINNED_SERVICE)]
    pub fixed_pod_service: String,

    /// Replicas per cluster for --fixed-pod-service
    #[arg(long, default_value_t = PINNED_POD_COUNT)]
    pub fixed_pod_count: usize,

    /// Services whose pod names are `<service>-hc-<index>...`
    #[arg(long, value_delimiter = ',', default_value = PINNED_SERVICE)]
    pub stable_pod_names: Vec<String>,

    /// Skip the always-failing ingester
    #[arg(long)]
    pub no_failing_pod: bool,

    /// Records per push
    #[arg(long, default_value_t = 1000)]
    pub batch_size: usize,

    /// Longest a partial batch waits before it is pushed
    #[arg(long, default_value_t = 1000)]
    pub batch_wait_ms: u64,

    /// Default filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl RunArgs {
    pub fn fleet_config(&self) -> Result<FleetConfig> {
        let clusters: Vec<String> = self
            .clusters
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if clusters.is_empty() {
            return Err(Error::Config("at least one cluster is required".into()));
        }
        if self.fixed_pod_count == 0 {
            return Err(Error::Config("--fixed-pod-count must be at least 1".into()));
        }

        let fleet = FleetConfig {
            clusters,
            pod_count_overrides: HashMap::from([(
                self.fixed_pod_service.clone(),
                self.fixed_pod_count,
            )]),
            stable_pod_names: self
                .stable_pod_names
                .iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect::<HashSet<_>>(),
            ..FleetConfig::default()
        };
        fleet.validate()?;
        Ok(fleet)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            failing_pod: !self.no_failing_pod,
            ..OrchestratorConfig::default()
        }
    }

    pub fn batch_config(&self) -> Result<BatchConfig> {
        if self.batch_size == 0 {
            return Err(Error::Config("--batch-size must be at least 1".into()));
        }
        let batch = BatchConfig {
            batch_size: self.batch_size,
            batch_wait: Duration::from_millis(self.batch_wait_ms.max(1)),
            ..BatchConfig::default()
        };
        batch.validate()?;
        Ok(batch)
    }
}
