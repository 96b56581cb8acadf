//! Loki push API (JSON)

use super::batch::{BatchingSink, PushProtocol};
use crate::error::{Result, parse_endpoint};
use logfleet_core::{Entry, LabelSet, Metadata};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_PUSH_URL: &str = "http://localhost:3100/loki/api/v1/push";
pub const TENANT_HEADER: &str = "X-Scope-OrgID";

pub type LokiSink = BatchingSink<LokiPush>;

#[derive(Debug, Clone)]
pub struct LokiPush {
    url: String,
    tenant_id: Option<String>,
}

impl LokiPush {
    pub fn new(url: &str, tenant_id: Option<String>) -> Result<Self> {
        let url = parse_endpoint(url)?;
        Ok(Self {
            url: url.into(),
            tenant_id: tenant_id.filter(|t| !t.is_empty()),
        })
    }
}

#[derive(Serialize, Debug)]
pub struct PushRequest<'a> {
    pub streams: Vec<PushStream<'a>>,
}

#[derive(Serialize, Debug)]
pub struct PushStream<'a> {
    pub stream: &'a LabelSet,
    pub values: Vec<PushValue<'a>>,
}

/// `[ "<unix ns>", "<line>" ]`, plus a metadata object when there is any
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum PushValue<'a> {
    Line(String, &'a str),
    WithMetadata(String, &'a str, &'a Metadata),
}

/// Groups a batch by stream, keeping entry order within each stream
pub fn encode(batch: &[Entry]) -> PushRequest<'_> {
    let mut streams: BTreeMap<&LabelSet, Vec<PushValue<'_>>> = BTreeMap::new();
    for entry in batch {
        let ts = entry
            .timestamp
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_string();
        let value = if entry.metadata.is_empty() {
            PushValue::Line(ts, &entry.message)
        } else {
            PushValue::WithMetadata(ts, &entry.message, &entry.metadata)
        };
        streams.entry(&entry.labels).or_default().push(value);
    }

    PushRequest {
        streams: streams
            .into_iter()
            .map(|(stream, values)| PushStream { stream, values })
            .collect(),
    }
}

impl PushProtocol for LokiPush {
    const NAME: &'static str = "loki";

    fn endpoint(&self) -> &str {
        &self.url
    }

    fn request(&self, client: &Client, batch: &[Entry]) -> RequestBuilder {
        let request = client.post(&self.url).json(&encode(batch));
        match &self.tenant_id {
            Some(tenant) => request.header(TENANT_HEADER, tenant),
            None => request,
        }
    }
}
