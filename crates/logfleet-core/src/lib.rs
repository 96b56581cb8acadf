//! # logfleet-core
//!
//! Data model and collaborators for the logfleet traffic generator:
//!
//! - [`labels`] - immutable label sets (stream identity)
//! - [`metadata`] - per-record structured metadata and trace affinity
//! - [`level`] - log levels and their HTTP status bands
//! - [`values`] - value pools and fake-data providers
//! - [`render`] - line renderers for every simulated format
//! - [`sink`] - the delivery capability
//! - [`logger`] - [`AppLogger`], a base label set bound to a sink
//!
//! ```text
//!   render(rng, t) ──► Line { level, message }
//!                          │
//!                          ▼
//!   AppLogger ── labels_for(level) ──► Entry ──► dyn Sink
//! ```

pub mod error;
pub mod labels;
pub mod level;
pub mod logger;
pub mod metadata;
pub mod render;
pub mod sink;
pub mod values;

pub use error::{DeliveryError, UnknownLevel};
pub use labels::LabelSet;
pub use level::Level;
pub use logger::AppLogger;
pub use metadata::{Metadata, TraceAffinity};
pub use render::Line;
pub use sink::{ConsoleSink, Entry, FnSink, Sink};
