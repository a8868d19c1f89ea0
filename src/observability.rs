use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Endpoints of the audit record persistence API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditEndpoint {
    CreateRecord,
    GetRecord,
    KeyExists,
    ListRecords,
    StorageStats,
    Health,
}

impl AuditEndpoint {
    pub const ALL: [AuditEndpoint; 6] = [
        AuditEndpoint::CreateRecord,
        AuditEndpoint::GetRecord,
        AuditEndpoint::KeyExists,
        AuditEndpoint::ListRecords,
        AuditEndpoint::StorageStats,
        AuditEndpoint::Health,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AuditEndpoint::CreateRecord => "create_record",
            AuditEndpoint::GetRecord => "get_record",
            AuditEndpoint::KeyExists => "key_exists",
            AuditEndpoint::ListRecords => "list_records",
            AuditEndpoint::StorageStats => "storage_stats",
            AuditEndpoint::Health => "health",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AuditEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single audit API call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    /// 404; an unknown key is an answer, not a fault
    NotFound,
    /// Transport failure or any other non-2xx status
    Failed,
}

impl CallOutcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => CallOutcome::Success,
            404 => CallOutcome::NotFound,
            _ => CallOutcome::Failed,
        }
    }
}

#[derive(Debug, Default)]
struct EndpointCounters {
    calls: AtomicU64,
    not_found: AtomicU64,
    failures: AtomicU64,
    latency_ms: AtomicU64,
}

/// Per-endpoint call counters for the audit persistence API, plus the lookup cache
#[derive(Debug, Default)]
pub struct AuditApiMetrics {
    endpoints: [EndpointCounters; AuditEndpoint::ALL.len()],
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl AuditApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing a call; the outcome is recorded by [`CallTimer::finish`]
    pub fn start(&self, endpoint: AuditEndpoint) -> CallTimer<'_> {
        CallTimer {
            metrics: self,
            endpoint,
            start: Instant::now(),
        }
    }

    pub fn record(&self, endpoint: AuditEndpoint, outcome: CallOutcome, elapsed: Duration) {
        let counters = &self.endpoints[endpoint.slot()];
        counters.calls.fetch_add(1, Ordering::Relaxed);
        counters
            .latency_ms
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
        match outcome {
            CallOutcome::Success => {}
            CallOutcome::NotFound => {
                counters.not_found.fetch_add(1, Ordering::Relaxed);
            }
            CallOutcome::Failed => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AuditApiSnapshot {
        let endpoints = AuditEndpoint::ALL
            .iter()
            .map(|&endpoint| {
                let counters = &self.endpoints[endpoint.slot()];
                EndpointStats {
                    endpoint,
                    calls: counters.calls.load(Ordering::Relaxed),
                    not_found: counters.not_found.load(Ordering::Relaxed),
                    failures: counters.failures.load(Ordering::Relaxed),
                    latency_ms: counters.latency_ms.load(Ordering::Relaxed),
                }
            })
            .collect();

        AuditApiSnapshot {
            endpoints,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let snapshot = self.snapshot();
        for stats in snapshot.used_endpoints() {
            info!(
                endpoint = %stats.endpoint,
                calls = stats.calls,
                not_found = stats.not_found,
                failures = stats.failures,
                mean_latency_ms = stats.mean_latency_ms(),
                "Audit API endpoint usage"
            );
        }
        info!(
            cache_hits = snapshot.cache_hits,
            cache_misses = snapshot.cache_misses,
            "Audit record lookup cache"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointStats {
    pub endpoint: AuditEndpoint,
    pub calls: u64,
    pub not_found: u64,
    pub failures: u64,
    /// Summed over all calls
    pub latency_ms: u64,
}

impl EndpointStats {
    pub fn mean_latency_ms(&self) -> u64 {
        if self.calls == 0 {
            0
        } else {
            self.latency_ms / self.calls
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditApiSnapshot {
    /// One entry per endpoint, in `AuditEndpoint::ALL` order
    pub endpoints: Vec<EndpointStats>,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl AuditApiSnapshot {
    pub fn endpoint(&self, endpoint: AuditEndpoint) -> &EndpointStats {
        &self.endpoints[endpoint.slot()]
    }

    pub fn used_endpoints(&self) -> impl Iterator<Item = &EndpointStats> {
        self.endpoints.iter().filter(|stats| stats.calls > 0)
    }

    pub fn total_failures(&self) -> u64 {
        self.endpoints.iter().map(|stats| stats.failures).sum()
    }
}

/// Global metrics instance
static AUDIT_API_METRICS: std::sync::LazyLock<AuditApiMetrics> =
    std::sync::LazyLock::new(AuditApiMetrics::new);

pub fn audit_api_metrics() -> &'static AuditApiMetrics {
    &AUDIT_API_METRICS
}

/// Measures one audit API call
#[must_use = "a call is only counted once finished"]
pub struct CallTimer<'a> {
    metrics: &'a AuditApiMetrics,
    endpoint: AuditEndpoint,
    start: Instant,
}

impl CallTimer<'_> {
    pub fn finish(self, outcome: CallOutcome) {
        let elapsed = self.start.elapsed();
        self.metrics.record(self.endpoint, outcome, elapsed);
        debug!(
            endpoint = %self.endpoint,
            ?outcome,
            duration_ms = elapsed.as_millis(),
            "Audit API call finished"
        );
    }
}
