//! OTLP/HTTP logs exporter (JSON encoding)
//!
//! Each batch becomes one `ExportLogsServiceRequest` with a resource per
//! `service_name`. Labels and structured metadata both become record
//! attributes; the `level` label drives the severity (info when absent).

use super::batch::{BatchingSink, PushProtocol};
use crate::error::{Result, parse_endpoint};
use logfleet_core::labels::{LEVEL, SERVICE_NAME};
use logfleet_core::{Entry, Level};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:4318";
pub const LOGS_PATH: &str = "/v1/logs";
pub const SCOPE_NAME: &str = "log-generator";
pub const SERVICE_VERSION: &str = "1.0.0";

pub type OtlpSink = BatchingSink<OtlpLogs>;

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExportLogs {
    pub resource_logs: Vec<ResourceLogs>,
}

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLogs {
    pub resource: Resource,
    pub scope_logs: Vec<ScopeLogs>,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
}

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScopeLogs {
    pub scope: Scope,
    pub log_records: Vec<LogRecord>,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct Scope {
    pub name: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub time_unix_nano: String,
    pub observed_time_unix_nano: String,
    pub severity_number: u32,
    pub severity_text: String,
    pub body: AnyValue,
    pub attributes: Vec<KeyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

impl KeyValue {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: AnyValue::string(value),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AnyValue {
    String {
        #[serde(rename = "stringValue")]
        string_value: String,
    },
}

impl AnyValue {
    pub fn string(s: impl Into<String>) -> Self {
        AnyValue::String {
            string_value: s.into(),
        }
    }
}

/// OTLP wants 16 raw bytes as 32 hex digits; trace ids here are UUIDs.
fn otlp_trace_id(trace_id: &str) -> Option<String> {
    let hex: String = trace_id.chars().filter(|c| *c != '-').collect();
    let valid = hex.len() == 32 && hex.chars().all(|c| c.is_ascii_hexdigit());
    valid.then(|| hex.to_ascii_lowercase())
}

fn log_record(entry: &Entry) -> LogRecord {
    let level = entry
        .labels
        .get(LEVEL)
        .and_then(|l| l.parse::<Level>().ok())
        .unwrap_or(Level::Info);
    let nanos = entry
        .timestamp
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .to_string();

    let trace_id = entry.metadata.trace_id();
    let attributes = entry
        .labels
        .iter()
        .chain(entry.metadata.iter())
        .chain(trace_id.map(|t| ("trace_id", t)))
        .map(|(k, v)| KeyValue::string(k, v))
        .collect();

    LogRecord {
        time_unix_nano: nanos.clone(),
        observed_time_unix_nano: nanos,
        severity_number: level.severity_number(),
        severity_text: level.as_str().to_uppercase(),
        body: AnyValue::string(entry.message.as_str()),
        attributes,
        trace_id: trace_id.and_then(otlp_trace_id),
    }
}

pub fn encode(batch: &[Entry]) -> ExportLogs {
    let mut by_service: BTreeMap<&str, Vec<LogRecord>> = BTreeMap::new();
    for entry in batch {
        let service = entry.labels.get(SERVICE_NAME).unwrap_or("unknown_service");
        by_service.entry(service).or_default().push(log_record(entry));
    }

    ExportLogs {
        resource_logs: by_service
            .into_iter()
            .map(|(service, log_records)| ResourceLogs {
                resource: Resource {
                    attributes: vec![
                        KeyValue::string("service.name", service),
                        KeyValue::string("service.version", SERVICE_VERSION),
                    ],
                },
                scope_logs: vec![ScopeLogs {
                    scope: Scope {
                        name: SCOPE_NAME.to_string(),
                    },
                    log_records,
                }],
            })
            .collect(),
    }
}

#[derive(Debug, Clone)]
pub struct OtlpLogs {
    url: String,
}

impl OtlpLogs {
    /// `endpoint` is the collector base URL; `/v1/logs` is appended.
    pub fn new(endpoint: &str) -> Result<Self> {
        let base = parse_endpoint(endpoint)?;
        let url = format!("{}{}", base.as_str().trim_end_matches('/'), LOGS_PATH);
        Ok(Self { url })
    }
}

impl PushProtocol for OtlpLogs {
    const NAME: &'static str = "otlp";

    fn endpoint(&self) -> &str {
        &self.url
    }

    fn request(&self, client: &Client, batch: &[Entry]) -> RequestBuilder {
        client.post(&self.url).json(&encode(batch))
    }
}
