//! # logfleet-sim
//!
//! Simulates a fleet of services (gateways, ingesters, distributors, syslog
//! daemons, databases) replicated across clusters, each emitting realistic
//! log lines to Loki or an OTLP collector until told to stop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌───────────────────┐
//! │ Registry │───►│ Orchestrator │───►│ FleetConfig::     │
//! │ (ns,svc) │    │              │    │ enumerate → Pods  │
//! └──────────┘    └──────┬───────┘    └───────────────────┘
//!                        │ per pod: AppLogger + ComponentProfile::start
//!                        ▼
//!               ┌─────────────────┐   deliver   ┌──────────────────────┐
//!               │ EmissionLoop ×N │────────────►│ LokiSink / OtlpSink  │
//!               │ (one per stream)│             │ / ConsoleSink        │
//!               └─────────────────┘             └──────────────────────┘
//! ```
//!
//! Every loop watches one [`CancellationToken`](tokio_util::sync::CancellationToken);
//! cancelling it winds the whole fleet down.

pub mod config;
pub mod emission;
pub mod error;
pub mod fleet;
pub mod orchestrator;
pub mod profile;
pub mod registry;
pub mod sink;

pub use config::{Cli, Commands, RunArgs};
pub use emission::{EmissionLoop, MetadataSource, Pacing};
pub use error::{Error, Result};
pub use fleet::{FleetConfig, Pod};
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunningFleet, Sinks};
pub use profile::ComponentProfile;
pub use registry::Registry;
pub use sink::{BatchConfig, LokiSink, OtlpSink};
