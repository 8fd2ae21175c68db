//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Connector and observer loop produce:
//!     → tracing events (connect, retry, reconnect, loop exit)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers (installed by the hosting binary):
//!     → logging.rs (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The library only emits; subscribers and exporters are the host's choice
//! - Metrics are cheap (atomic increments behind the `metrics` facade)

pub mod logging;
pub mod metrics;
