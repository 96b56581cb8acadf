//! Label-Set Fabricator
//!
//! Expands one (namespace, service) pair into the simulated pods that run it:
//! every configured cluster gets the same number of replicas, and every
//! replica gets a full label set plus a structured-metadata bundle.

use crate::error::{Error, Result};
use logfleet_core::labels::{self, LabelSet};
use logfleet_core::metadata::{self, Metadata, TraceAffinity};
use logfleet_core::values;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

/// Service whose cardinality and pod names are pinned by default so
/// end-to-end queries can rely on them.
pub const PINNED_SERVICE: &str = "tempo-ingester";
pub const PINNED_POD_COUNT: usize = 8;

#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub clusters: Vec<String>,
    /// Replica count drawn per (namespace, service) when no override applies
    pub pod_count: RangeInclusive<usize>,
    /// Services with a fixed replica count
    pub pod_count_overrides: HashMap<String, usize>,
    /// Services whose pod names use the `<service>-hc-<index>` form
    pub stable_pod_names: HashSet<String>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            clusters: values::CLUSTERS.iter().map(|c| c.to_string()).collect(),
            pod_count: 1..=10,
            pod_count_overrides: HashMap::from([(PINNED_SERVICE.to_string(), PINNED_POD_COUNT)]),
            stable_pod_names: HashSet::from([PINNED_SERVICE.to_string()]),
        }
    }
}

/// One simulated replica
#[derive(Debug, Clone)]
pub struct Pod {
    pub labels: LabelSet,
    pub metadata: Metadata,
}

/// Shard label for a cluster: character-sum checksum modulo the shard pool.
/// The same cluster always lands on the same shard.
pub fn shard_for(cluster: &str) -> &'static str {
    let checksum: usize = cluster.chars().map(|c| c as usize).sum();
    values::SHARDS[checksum % values::SHARDS.len()]
}

/// Metadata bundle for one pod: `traceID`, `pod`, `user`, in that order.
pub fn structured_metadata<R: Rng + ?Sized>(
    rng: &mut R,
    affinity: &mut TraceAffinity,
    service: &str,
    index: usize,
    stable_name: bool,
) -> Metadata {
    let trace_id = affinity.next(rng);
    let pod = if stable_name {
        format!("{}-hc-{}{}", service, index, values::random_sequence(rng, 3))
    } else {
        format!("{}-{}", service, values::random_sequence(rng, 5))
    };

    Metadata::new()
        .with(metadata::TRACE_ID, trace_id)
        .with(metadata::POD, pod)
        .with(metadata::USER, values::random_user_id(rng))
}

impl FleetConfig {
    /// Rejects replica counts that cannot be drawn. An empty cluster list is
    /// allowed and simply fabricates no pods.
    pub fn validate(&self) -> Result<()> {
        if self.pod_count.is_empty() || *self.pod_count.start() == 0 {
            return Err(Error::Config(format!(
                "pod count range {}..={} must be non-empty and start at 1 or more",
                self.pod_count.start(),
                self.pod_count.end()
            )));
        }
        if let Some((service, _)) = self.pod_count_overrides.iter().find(|(_, n)| **n == 0) {
            return Err(Error::Config(format!("{} needs at least one pod", service)));
        }
        Ok(())
    }

    /// An empty `pod_count` range yields zero pods; [`validate`](Self::validate)
    /// rejects it up front.
    pub fn pod_count_for<R: Rng + ?Sized>(&self, service: &str, rng: &mut R) -> usize {
        match self.pod_count_overrides.get(service) {
            Some(count) => *count,
            None if self.pod_count.is_empty() => 0,
            None => rng.random_range(self.pod_count.clone()),
        }
    }

    /// Lazily yields `clusters × pod_count` pods. The replica count is drawn
    /// once per call and shared by every cluster; calling again reshuffles.
    pub fn enumerate<'a, R: Rng + ?Sized>(
        &'a self,
        namespace: &'a str,
        service: &'a str,
        rng: &'a mut R,
        affinity: &'a mut TraceAffinity,
    ) -> Pods<'a, R> {
        let pod_count = self.pod_count_for(service, rng);
        Pods {
            config: self,
            namespace,
            service,
            rng,
            affinity,
            pod_count,
            cluster: 0,
            index: 0,
        }
    }
}

pub struct Pods<'a, R: ?Sized> {
    config: &'a FleetConfig,
    namespace: &'a str,
    service: &'a str,
    rng: &'a mut R,
    affinity: &'a mut TraceAffinity,
    pod_count: usize,
    cluster: usize,
    index: usize,
}

impl<R: ?Sized> Pods<'_, R> {
    pub fn pod_count(&self) -> usize {
        self.pod_count
    }
}

impl<R: Rng + ?Sized> Iterator for Pods<'_, R> {
    type Item = Pod;

    fn next(&mut self) -> Option<Pod> {
        if self.pod_count == 0 {
            return None;
        }
        if self.index == self.pod_count {
            self.cluster += 1;
            self.index = 0;
        }
        let cluster = self.config.clusters.get(self.cluster)?;
        let index = self.index;
        self.index += 1;

        let labels = LabelSet::new()
            .with(labels::ENV, values::random_namespace(self.rng))
            .with(labels::CLUSTER, cluster.as_str())
            .with(labels::STREAM_SHARD, shard_for(cluster))
            .with(labels::NAMESPACE, self.namespace)
            .with(labels::SERVICE_NAME, self.service)
            .with(labels::FILE, format!("C:\\Grafana\\logs\\{}.txt", self.namespace));

        let stable = self.config.stable_pod_names.contains(self.service);
        let metadata = structured_metadata(self.rng, self.affinity, self.service, index, stable);

        Some(Pod { labels, metadata })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let clusters = self.config.clusters.len();
        let remaining = if self.pod_count == 0 || self.cluster >= clusters {
            0
        } else {
            (clusters - self.cluster) * self.pod_count - self.index
        };
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logfleet_core::labels::{CLUSTER, NAMESPACE, SERVICE_NAME, STREAM_SHARD};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pods_with_trace_ids(seed: u64) -> Vec<String> {
        let config = FleetConfig {
            pod_count: 10..=10,
            ..FleetConfig::default()
        };
        collect(&config, "gateway", "apache", seed)
            .iter()
            .map(|p| p.metadata.trace_id().unwrap().to_string())
            .collect()
    }

    fn collect(config: &FleetConfig, ns: &str, svc: &str, seed: u64) -> Vec<Pod> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut affinity = TraceAffinity::new();
        config.enumerate(ns, svc, &mut rng, &mut affinity).collect()
    }

    #[test]
    fn test_required_labels_present() {
        let config = FleetConfig::default();
        for pod in collect(&config, "gateway", "nginx", 1) {
            for key in [CLUSTER, NAMESPACE, SERVICE_NAME] {
                assert!(!pod.labels.get(key).unwrap_or("").is_empty(), "missing {}", key);
            }
            assert!(!pod.labels.contains(labels::LEVEL));
            assert_eq!(pod.labels.get(labels::FILE), Some("C:\\Grafana\\logs\\gateway.txt"));
            assert!(pod.metadata.trace_id().is_some());
            assert!(pod.metadata.get(metadata::POD).unwrap().starts_with("nginx-"));
            assert!(pod.metadata.get(metadata::USER).is_some());
        }
    }

    #[test]
    fn test_shard_is_deterministic_per_cluster() {
        let config = FleetConfig::default();
        let mut seen: HashMap<String, String> = HashMap::new();
        for seed in 0..20 {
            for pod in collect(&config, "mimir-dev", "mimir-querier", seed) {
                let cluster = pod.labels.get(CLUSTER).unwrap().to_string();
                let shard = pod.labels.get(STREAM_SHARD).unwrap().to_string();
                assert_eq!(shard, shard_for(&cluster));
                let prior = seen.entry(cluster).or_insert_with(|| shard.clone());
                assert_eq!(*prior, shard);
            }
        }
        // "us-west-1" sums to 822, 822 % 7 == 3
        assert_eq!(shard_for("us-west-1"), "3");
    }

    #[test]
    fn test_pinned_service_has_eight_pods_per_cluster() {
        let config = FleetConfig::default();
        for seed in 0..10 {
            let pods = collect(&config, "tempo-dev", PINNED_SERVICE, seed);
            assert_eq!(pods.len(), PINNED_POD_COUNT * config.clusters.len());
            for cluster in &config.clusters {
                let per_cluster = pods
                    .iter()
                    .filter(|p| p.labels.get(CLUSTER) == Some(cluster.as_str()))
                    .count();
                assert_eq!(per_cluster, PINNED_POD_COUNT);
            }
        }
    }

    #[test]
    fn test_stable_pod_names() {
        let config = FleetConfig::default();
        let pods = collect(&config, "tempo-prod", PINNED_SERVICE, 3);
        for (i, pod) in pods.iter().take(PINNED_POD_COUNT).enumerate() {
            let name = pod.metadata.get(metadata::POD).unwrap();
            let prefix = format!("tempo-ingester-hc-{}", i);
            assert!(name.starts_with(&prefix), "{}", name);
            assert_eq!(name.len(), prefix.len() + 3);
        }
    }

    #[test]
    fn test_pod_count_shared_across_clusters() {
        let config = FleetConfig::default();
        let mut counts = HashSet::new();
        for seed in 0..200 {
            let pods = collect(&config, "gateway", "apache", seed);
            let clusters = config.clusters.len();
            assert_eq!(pods.len() % clusters, 0);
            let per_cluster = pods.len() / clusters;
            assert!((1..=10).contains(&per_cluster));
            for cluster in &config.clusters {
                let n = pods
                    .iter()
                    .filter(|p| p.labels.get(CLUSTER) == Some(cluster.as_str()))
                    .count();
                assert_eq!(n, per_cluster);
            }
            counts.insert(per_cluster);
        }
        // Uniform over [1, 10]: 200 draws hit every value
        assert_eq!(counts.len(), 10);
    }

    #[test]
    fn test_size_hint_is_exact() {
        let config = FleetConfig::default();
        let mut rng = StdRng::seed_from_u64(12);
        let mut affinity = TraceAffinity::new();
        let mut pods = config.enumerate("db", "mysql", &mut rng, &mut affinity);
        let total = pods.pod_count() * config.clusters.len();
        assert_eq!(pods.size_hint(), (total, Some(total)));
        pods.next();
        assert_eq!(pods.size_hint(), (total - 1, Some(total - 1)));
        assert_eq!(pods.count(), total - 1);
    }

    #[test]
    fn test_validate_rejects_unusable_configs() {
        assert!(FleetConfig::default().validate().is_ok());

        let (start, end) = (5, 1);
        let empty_range = FleetConfig {
            pod_count: start..=end,
            ..FleetConfig::default()
        };
        assert!(matches!(empty_range.validate(), Err(Error::Config(_))));
        assert_eq!(collect(&empty_range, "gateway", "apache", 1).len(), 0);

        let zero_pods = FleetConfig {
            pod_count: 0..=0,
            ..FleetConfig::default()
        };
        assert!(matches!(zero_pods.validate(), Err(Error::Config(_))));

        let no_clusters = FleetConfig {
            clusters: Vec::new(),
            ..FleetConfig::default()
        };
        assert!(no_clusters.validate().is_ok());
        assert_eq!(collect(&no_clusters, "gateway", "apache", 1).len(), 0);

        let zero_override = FleetConfig {
            pod_count_overrides: HashMap::from([("nginx".to_string(), 0)]),
            ..FleetConfig::default()
        };
        assert!(matches!(zero_override.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_consecutive_pods_reuse_trace_half_the_time() {
        let mut reused = 0;
        let mut minted = 0;
        for seed in 0..20 {
            let trace_ids = pods_with_trace_ids(seed);
            let mut seen: HashSet<&str> = HashSet::new();
            seen.insert(&trace_ids[0]);
            for pair in trace_ids.windows(2) {
                if pair[0] == pair[1] {
                    reused += 1;
                } else {
                    // A changed trace is always a new one, never an older one
                    assert!(seen.insert(&pair[1]), "trace {} came back", pair[1]);
                    assert_eq!(pair[1].len(), 36);
                    assert_eq!(pair[1].matches('-').count(), 4);
                    minted += 1;
                }
            }
        }

        let total = reused + minted;
        let ratio = reused as f64 / total as f64;
        assert!((0.4..=0.6).contains(&ratio), "reused {} of {}", reused, total);
    }
}
