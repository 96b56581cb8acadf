//! Orchestrator
//!
//! Walks the registry, fabricates pods for every entry, binds each pod to a
//! logger on the right sink and starts its profile. Everything it spawns
//! shares one cancellation token.

use crate::error::Result;
use crate::fleet::FleetConfig;
use crate::profile;
use crate::registry::Registry;
use logfleet_core::labels::{self, LabelSet};
use logfleet_core::metadata::TraceAffinity;
use logfleet_core::{AppLogger, ConsoleSink, Metadata, Sink, values};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const OTEL_MARKER: &str = "-otel";
pub const FAILING_POD_NAMESPACE: &str = "mimir";
pub const FAILING_POD_SERVICE: &str = "mimir-ingester";

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Services whose records carry no structured metadata
    pub metadata_free_services: HashSet<String>,
    /// Services whose name contains this go to the OTLP sink when one is set
    pub otel_marker: String,
    /// Also run one always-failing ingester pod
    pub failing_pod: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            metadata_free_services: HashSet::from(["nginx".to_string()]),
            otel_marker: OTEL_MARKER.to_string(),
            failing_pod: true,
        }
    }
}

#[derive(Clone)]
pub struct Sinks {
    pub primary: Arc<dyn Sink>,
    pub otel: Option<Arc<dyn Sink>>,
}

impl Sinks {
    /// Everything to stdout
    pub fn console() -> Self {
        Self {
            primary: Arc::new(ConsoleSink),
            otel: None,
        }
    }
}

pub struct Orchestrator {
    registry: Registry,
    fleet: FleetConfig,
    config: OrchestratorConfig,
    sinks: Sinks,
}

/// Handles of every loop the orchestrator started
pub struct RunningFleet {
    handles: Vec<JoinHandle<u64>>,
    pods: usize,
}

impl RunningFleet {
    pub fn pods(&self) -> usize {
        self.pods
    }

    pub fn loops(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every loop to finish; returns the total lines delivered.
    pub async fn join(self) -> u64 {
        let mut delivered = 0;
        for handle in self.handles {
            match handle.await {
                Ok(n) => delivered += n,
                Err(e) => warn!(error = %e, "emission loop panicked"),
            }
        }
        delivered
    }
}

impl Orchestrator {
    /// Fails with a config error when `fleet` has an unusable replica count.
    pub fn new(
        registry: Registry,
        fleet: FleetConfig,
        config: OrchestratorConfig,
        sinks: Sinks,
    ) -> Result<Self> {
        fleet.validate()?;
        Ok(Self {
            registry,
            fleet,
            config,
            sinks,
        })
    }

    fn sink_for(&self, service: &str) -> Arc<dyn Sink> {
        match &self.sinks.otel {
            Some(otel) if service.contains(self.config.otel_marker.as_str()) => otel.clone(),
            _ => self.sinks.primary.clone(),
        }
    }

    /// Labels of the failing ingester: first configured cluster (a random
    /// known one if none is configured), no level.
    pub fn failing_pod_labels(&self) -> LabelSet {
        let cluster = match self.fleet.clusters.first() {
            Some(cluster) => cluster.clone(),
            None => values::random_cluster(&mut rand::rng()).to_string(),
        };
        LabelSet::new()
            .with(labels::CLUSTER, cluster)
            .with(labels::NAMESPACE, FAILING_POD_NAMESPACE)
            .with(labels::SERVICE_NAME, FAILING_POD_SERVICE)
    }

    /// Spawns every loop and returns immediately. Must be called from
    /// within a Tokio runtime.
    pub fn start(&self, cancel: &CancellationToken) -> RunningFleet {
        let mut rng = rand::rng();
        let mut affinity = TraceAffinity::new();
        let mut handles = Vec::new();
        let mut pods = 0;

        for entry in self.registry.iter() {
            let sink = self.sink_for(entry.service);
            let strip_metadata = self.config.metadata_free_services.contains(entry.service);

            let mut started = 0;
            for pod in self
                .fleet
                .enumerate(entry.namespace, entry.service, &mut rng, &mut affinity)
            {
                let metadata = if strip_metadata {
                    Metadata::new()
                } else {
                    pod.metadata
                };
                let logger = AppLogger::new(pod.labels, sink.clone());
                handles.extend(entry.profile.start(cancel, logger, metadata));
                started += 1;
            }
            pods += started;

            debug!(
                namespace = entry.namespace,
                service = entry.service,
                profile = entry.profile.kind(),
                pods = started,
                "component started"
            );
        }

        if self.config.failing_pod {
            let sink = self.sink_for(FAILING_POD_SERVICE);
            let logger = AppLogger::new(self.failing_pod_labels(), sink);
            let profile = profile::failing_pod(FAILING_POD_SERVICE);
            handles.extend(profile.start(cancel, logger, Metadata::new()));
            pods += 1;
        }

        info!(
            components = self.registry.len(),
            pods,
            loops = handles.len(),
            "fleet started"
        );

        RunningFleet { handles, pods }
    }

    /// Starts the fleet, blocks until `cancel` fires, then waits for every
    /// loop to wind down.
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        let fleet = self.start(&cancel);
        cancel.cancelled().await;
        info!(loops = fleet.loops(), "stopping fleet");
        let delivered = fleet.join().await;
        info!(delivered, "fleet stopped");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{AccessFormat, ComponentProfile};
    use logfleet_core::{DeliveryError, Entry, FnSink};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    fn recording() -> (Arc<dyn Sink>, Arc<Mutex<Vec<Entry>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let record = move |entry: Entry| -> Result<(), DeliveryError> {
            sink_seen.lock().unwrap().push(entry);
            Ok(())
        };
        let sink: Arc<dyn Sink> = Arc::new(FnSink::new(record));
        (sink, seen)
    }

    fn single_pod_fleet() -> FleetConfig {
        FleetConfig {
            clusters: vec!["eu-west-1".to_string()],
            pod_count: 1..=1,
            pod_count_overrides: HashMap::new(),
            ..FleetConfig::default()
        }
    }

    #[tokio::test]
    async fn test_start_counts_pods_and_loops() {
        let (sink, _) = recording();
        let orchestrator = Orchestrator::new(
            Registry::builtin(),
            single_pod_fleet(),
            OrchestratorConfig::default(),
            Sinks { primary: sink, otel: None },
        )
        .unwrap();

        let cancel = CancellationToken::new();
        let fleet = orchestrator.start(&cancel);
        let registry = Registry::builtin();
        let expected_loops: usize = registry
            .iter()
            .map(|r| r.profile.stream_count())
            .sum::<usize>()
            + 2;

        assert_eq!(fleet.pods(), registry.len() + 1);
        assert_eq!(fleet.loops(), expected_loops);

        cancel.cancel();
        fleet.join().await;
    }

    #[tokio::test]
    async fn test_otel_services_use_otel_sink() {
        let (primary, primary_seen) = recording();
        let (otel, otel_seen) = recording();
        let mut registry = Registry::new();
        registry
            .register("gateway", "nginx-otel", ComponentProfile::AccessLog(AccessFormat::Json))
            .register("gateway", "nginx", ComponentProfile::AccessLog(AccessFormat::CommonLog));
        let config = OrchestratorConfig {
            failing_pod: false,
            ..OrchestratorConfig::default()
        };
        let sinks = Sinks {
            primary,
            otel: Some(otel),
        };
        let orchestrator = Orchestrator::new(registry, single_pod_fleet(), config, sinks).unwrap();

        // The first access-log line goes out before the first sleep
        let cancel = CancellationToken::new();
        let fleet = orchestrator.start(&cancel);
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        fleet.join().await;

        let primary_seen = primary_seen.lock().unwrap();
        let otel_seen = otel_seen.lock().unwrap();
        assert!(!primary_seen.is_empty());
        assert!(!otel_seen.is_empty());
        assert!(primary_seen
            .iter()
            .all(|e| e.labels.get(labels::SERVICE_NAME) == Some("nginx")));
        assert!(otel_seen
            .iter()
            .all(|e| e.labels.get(labels::SERVICE_NAME) == Some("nginx-otel")));
        // nginx carries no metadata, everything else does
        assert!(primary_seen.iter().all(|e| e.metadata.is_empty()));
        assert!(otel_seen.iter().all(|e| e.metadata.trace_id().is_some()));
    }

    #[tokio::test]
    async fn test_otel_services_fall_back_to_primary() {
        let (primary, primary_seen) = recording();
        let mut registry = Registry::new();
        registry.register("gateway", "nginx-otel", ComponentProfile::AccessLog(AccessFormat::Json));
        let config = OrchestratorConfig {
            failing_pod: false,
            ..OrchestratorConfig::default()
        };
        let sinks = Sinks {
            primary,
            otel: None,
        };
        let orchestrator = Orchestrator::new(registry, single_pod_fleet(), config, sinks).unwrap();

        let cancel = CancellationToken::new();
        let fleet = orchestrator.start(&cancel);
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        fleet.join().await;

        assert!(!primary_seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failing_pod_labels() {
        let (sink, _) = recording();
        let orchestrator = Orchestrator::new(
            Registry::new(),
            FleetConfig::default(),
            OrchestratorConfig::default(),
            Sinks { primary: sink, otel: None },
        )
        .unwrap();
        let set = orchestrator.failing_pod_labels();
        assert_eq!(set.get(labels::CLUSTER), Some("us-west-1"));
        assert_eq!(set.get(labels::NAMESPACE), Some(FAILING_POD_NAMESPACE));
        assert_eq!(set.get(labels::SERVICE_NAME), Some(FAILING_POD_SERVICE));
        assert!(!set.contains(labels::LEVEL));
    }

    #[test]
    fn test_failing_pod_without_clusters_picks_a_known_one() {
        let (sink, _) = recording();
        let fleet = FleetConfig {
            clusters: Vec::new(),
            ..FleetConfig::default()
        };
        let orchestrator = Orchestrator::new(
            Registry::new(),
            fleet,
            OrchestratorConfig::default(),
            Sinks { primary: sink, otel: None },
        )
        .unwrap();
        let set = orchestrator.failing_pod_labels();
        assert!(values::CLUSTERS.contains(&set.get(labels::CLUSTER).unwrap()));
    }

    #[test]
    fn test_new_rejects_empty_pod_range() {
        let (sink, _) = recording();
        let (start, end) = (3, 2);
        let fleet = FleetConfig {
            pod_count: start..=end,
            ..FleetConfig::default()
        };
        let result = Orchestrator::new(
            Registry::builtin(),
            fleet,
            OrchestratorConfig::default(),
            Sinks { primary: sink, otel: None },
        );
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[tokio::test]
    async fn test_console_sinks_smoke() {
        let mut registry = Registry::new();
        registry.register(
            "gateway",
            "apache",
            ComponentProfile::AccessLog(AccessFormat::ApacheCommon),
        );
        let config = OrchestratorConfig {
            failing_pod: false,
            ..OrchestratorConfig::default()
        };
        let orchestrator =
            Orchestrator::new(registry, single_pod_fleet(), config, Sinks::console()).unwrap();

        let cancel = CancellationToken::new();
        let fleet = orchestrator.start(&cancel);
        assert_eq!(fleet.pods(), 1);
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        // The first line goes out before the first sleep
        assert!(fleet.join().await >= 1);
    }
}
