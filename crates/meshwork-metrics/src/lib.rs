//! Metrics for the Meshwork control plane.
//!
//! Re-exports the `metrics` crate and declares every metric the route cache
//! and the serial protocols record as a [`Metric`] constant, so call sites
//! never spell a metric name by hand.
//!
//! Nothing is recorded unless the embedding application installs a recorder.
//!
//! ```rust
//! use meshwork_metrics::{metric_defs, MetricKind};
//!
//! assert_eq!(metric_defs::SERIAL_MESSAGES.kind, MetricKind::Counter);
//! metrics::counter!(metric_defs::SERIAL_MESSAGES.name, "protocol" => "operational").increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

/// A metric declaration with its metadata, built in `const` context.
///
/// ```rust
/// use meshwork_metrics::{Metric, MetricKind};
/// use meshwork_metrics::metrics::Unit;
///
/// const FRAMES: Metric = Metric::counter("example.frames")
///     .with_description("Frames seen")
///     .with_unit(Unit::Count);
///
/// assert_eq!(FRAMES.kind, MetricKind::Counter);
/// FRAMES.describe();
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// Name passed to the `metrics` macros.
    pub name: &'static str,
    pub kind: MetricKind,
    /// Human-readable description registered with the recorder.
    pub description: &'static str,
    pub unit: Option<Unit>,
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
        }
    }

    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(self.name, unit, self.description),
            (MetricKind::Counter, None) => describe_counter!(self.name, self.description),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(self.name, unit, self.description),
            (MetricKind::Gauge, None) => describe_gauge!(self.name, self.description),
            (MetricKind::Histogram, Some(unit)) => describe_histogram!(self.name, unit, self.description),
            (MetricKind::Histogram, None) => describe_histogram!(self.name, self.description),
        }
    }
}

pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Serial protocols
    // ========================================================================

    /// Labelled by `protocol`.
    pub const SERIAL_MESSAGES: Metric = Metric::counter("meshwork.serial.messages")
        .with_description("Serial messages dispatched to a handler")
        .with_unit(Unit::Count);

    /// Labelled by `protocol`.
    pub const SERIAL_NOK: Metric = Metric::counter("meshwork.serial.nok")
        .with_description("NOK responses written to the host")
        .with_unit(Unit::Count);

    /// Labelled by `protocol`.
    pub const SERIAL_UNKNOWN: Metric = Metric::counter("meshwork.serial.unknown")
        .with_description("Messages answered with the unknown code")
        .with_unit(Unit::Count);

    pub const SERIAL_DISCARDED_BYTES: Metric = Metric::counter("meshwork.serial.discarded_bytes")
        .with_description("Unconsumed payload bytes dropped to realign the stream")
        .with_unit(Unit::Bytes);

    pub const SERIAL_ACK_WAIT: Metric = Metric::histogram("meshwork.serial.ack_wait_ms")
        .with_description("Time spent waiting for the host to supply a receive acknowledgement")
        .with_unit(Unit::Milliseconds);

    // ========================================================================
    // Route cache
    // ========================================================================

    pub const ROUTE_CACHE_ADMITTED: Metric = Metric::counter("meshwork.route_cache.admitted")
        .with_description("Routes admitted into the cache")
        .with_unit(Unit::Count);

    pub const ROUTE_CACHE_EVICTED: Metric = Metric::counter("meshwork.route_cache.evicted")
        .with_description("Routes evicted to make room for a forced admission")
        .with_unit(Unit::Count);

    pub const ROUTE_CACHE_REMOVED: Metric = Metric::counter("meshwork.route_cache.removed")
        .with_description("Routes removed explicitly")
        .with_unit(Unit::Count);

    pub const ROUTE_CACHE_ENTRIES: Metric = Metric::gauge("meshwork.route_cache.entries")
        .with_description("Active route entries")
        .with_unit(Unit::Count);

    // ========================================================================
    // Zero-configuration
    // ========================================================================

    /// Labelled by `aspect`: device, network, reporting or serial.
    pub const ZEROCONF_CONFIG_UPDATES: Metric = Metric::counter("meshwork.zeroconf.config_updates")
        .with_description("Configuration aspects changed through provisioning")
        .with_unit(Unit::Count);

    pub const ALL: &[Metric] = &[
        SERIAL_MESSAGES,
        SERIAL_NOK,
        SERIAL_UNKNOWN,
        SERIAL_DISCARDED_BYTES,
        SERIAL_ACK_WAIT,
        ROUTE_CACHE_ADMITTED,
        ROUTE_CACHE_EVICTED,
        ROUTE_CACHE_REMOVED,
        ROUTE_CACHE_ENTRIES,
        ZEROCONF_CONFIG_UPDATES,
    ];
}

/// Describe every metric. Call once, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
