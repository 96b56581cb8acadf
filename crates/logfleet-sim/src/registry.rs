//! Generator registry
//!
//! Maps every simulated (namespace, service) pair to the profile its pods run.

use crate::profile::{self, AccessFormat, ComponentProfile, TextFormat};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<(String, String), ComponentProfile>,
}

/// Borrowed view of one registry entry
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub namespace: &'a str,
    pub service: &'a str,
    pub profile: &'a ComponentProfile,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the profile for `(namespace, service)`
    pub fn register(
        &mut self,
        namespace: impl Into<String>,
        service: impl Into<String>,
        profile: ComponentProfile,
    ) -> &mut Self {
        self.entries.insert((namespace.into(), service.into()), profile);
        self
    }

    /// Profile registered for `(namespace, service)`, if any
    pub fn get(&self, namespace: &str, service: &str) -> Option<&ComponentProfile> {
        self.entries
            .get(&(namespace.to_string(), service.to_string()))
    }

    /// Entries ordered by namespace, then service
    pub fn iter(&self) -> impl Iterator<Item = Registration<'_>> {
        self.entries.iter().map(|((namespace, service), profile)| Registration {
            namespace,
            service,
            profile,
        })
    }

    pub fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<&str> = self.entries.keys().map(|(ns, _)| ns.as_str()).collect();
        namespaces.dedup();
        namespaces
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The built-in fleet
    pub fn builtin() -> Self {
        let mut registry = Registry::new();

        let gateway = [
            ("apache", AccessFormat::ApacheCommon),
            ("httpd", AccessFormat::ApacheCombined),
            ("nginx", AccessFormat::CommonLog),
            ("nginx-json", AccessFormat::Json),
            ("nginx-json-mixed", AccessFormat::JsonMixed),
            ("nginx-otel", AccessFormat::Json),
        ];
        for (service, format) in gateway {
            registry.register("gateway", service, ComponentProfile::AccessLog(format));
        }

        for service in ["mimir-ingester", "mimir-distributor", "mimir-querier", "mimir-ruler"] {
            registry.register("mimir-dev", service, profile::mimir_pod());
        }
        registry.register("mimir-prod", "mimir-ingester", profile::mimir_pod());

        for namespace in ["tempo-prod", "tempo-dev"] {
            registry
                .register(namespace, "tempo-ingester", profile::noisy_tempo())
                .register(namespace, "tempo-distributor", profile::noisy_tempo());
        }

        let text = [
            ("infra", "rsyslog", TextFormat::Rfc3164),
            ("infra", "journald", TextFormat::Rfc5424),
            ("infra", "apache-error", TextFormat::ApacheError),
            ("pyroscope-dev", "pyroscope-ingester", TextFormat::Application),
            ("db", "mysql", TextFormat::Mysql),
        ];
        for (namespace, service, format) in text {
            registry.register(namespace, service, ComponentProfile::Text(format));
        }

        registry
    }
}
