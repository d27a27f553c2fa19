use std::collections::BTreeMap;
use std::fmt::Write;

use parking_lot::Mutex;

use super::exposition;
use super::MetricsError;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe request metrics.
/// The instrumentation middleware calls `observe()`, `GET /metrics` calls `render()`.
pub struct MetricsStore {
    /// Histogram upper bounds in seconds, strictly ascending.
    boundaries: Vec<f64>,
    inner: Mutex<Inner>,
}

/// Consistent copy of every aggregate, taken under the store lock.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    /// route → status → request count
    pub requests: BTreeMap<String, BTreeMap<u16, u64>>,
    pub boundaries: Vec<f64>,
    /// Non-cumulative count per boundary (same length as `boundaries`)
    pub buckets: Vec<u64>,
    /// Observations above the largest boundary
    pub overflow: u64,
    pub sum: f64,
    pub count: u64,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    requests: BTreeMap<String, BTreeMap<u16, u64>>,

    // One slot per boundary plus the trailing overflow slot
    bucket_counts: Vec<u64>,

    sum: f64,
    count: u64,
}

// ─── MetricsStore impl ───────────────────────────────────────────

impl MetricsStore {
    /// Build a store for the given histogram boundaries (seconds).
    ///
    /// Boundaries must be non-empty, finite, positive and strictly ascending.
    pub fn new(boundaries: Vec<f64>) -> Result<Self, MetricsError> {
        validate_boundaries(&boundaries)?;

        Ok(Self {
            inner: Mutex::new(Inner::new(boundaries.len())),
            boundaries,
        })
    }

    /// Fold one completed request (route, final status, wall time) into
    /// the aggregates. Observations are not retained individually.
    pub fn observe(&self, route: &str, status: u16, duration_secs: f64) {
        let bucket = self.bucket_index(duration_secs);
        self.inner.lock().apply(route, status, duration_secs, bucket);
    }

    /// Current count for one (route, status) pair; 0 if never observed.
    pub fn count(&self, route: &str, status: u16) -> u64 {
        self.inner
            .lock()
            .requests
            .get(route)
            .and_then(|statuses| statuses.get(&status))
            .copied()
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock();
        let n = self.boundaries.len();

        MetricsSnapshot {
            requests: inner.requests.clone(),
            boundaries: self.boundaries.clone(),
            buckets: inner.bucket_counts[..n].to_vec(),
            overflow: inner.bucket_counts[n],
            sum: inner.sum,
            count: inner.count,
        }
    }

    /// Render every aggregate in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let inner = self.inner.lock();
        let mut out = String::with_capacity(512 + inner.requests.len() * 96);

        // ── Counters ────────────────────────────────────────────
        let _ = writeln!(out, "# HELP http_requests_total Total HTTP requests");
        let _ = writeln!(out, "# TYPE http_requests_total counter");
        for (route, statuses) in &inner.requests {
            for (status, value) in statuses {
                let _ = writeln!(
                    out,
                    "http_requests_total{{route=\"{}\",status=\"{}\"}} {}",
                    exposition::escape_label(route),
                    status,
                    value
                );
            }
        }

        // ── Latency histogram (cumulative) ──────────────────────
        let _ = writeln!(
            out,
            "# HELP http_request_duration_seconds Request latency in seconds"
        );
        let _ = writeln!(out, "# TYPE http_request_duration_seconds histogram");
        let mut cumulative = 0u64;
        for (boundary, count) in self.boundaries.iter().zip(&inner.bucket_counts) {
            cumulative += count;
            let _ = writeln!(
                out,
                "http_request_duration_seconds_bucket{{le=\"{}\"}} {}",
                exposition::format_boundary(*boundary),
                cumulative
            );
        }
        cumulative += inner.bucket_counts[self.boundaries.len()];
        let _ = writeln!(
            out,
            "http_request_duration_seconds_bucket{{le=\"+Inf\"}} {cumulative}"
        );
        let _ = writeln!(out, "http_request_duration_seconds_sum {:.6}", inner.sum);
        let _ = writeln!(out, "http_request_duration_seconds_count {}", inner.count);

        out
    }

    /// Linear scan: first boundary >= duration, else the overflow slot.
    /// A duration equal to a boundary lands in that boundary's bucket.
    fn bucket_index(&self, duration_secs: f64) -> usize {
        self.boundaries
            .iter()
            .position(|&b| duration_secs <= b)
            .unwrap_or(self.boundaries.len())
    }
}

// ─── Inner impl ──────────────────────────────────────────────────

impl Inner {
    fn new(num_boundaries: usize) -> Self {
        Self {
            requests: BTreeMap::new(),
            bucket_counts: vec![0; num_boundaries + 1],
            sum: 0.0,
            count: 0,
        }
    }

    fn apply(&mut self, route: &str, status: u16, duration_secs: f64, bucket: usize) {
        // Avoid allocating the route key once it exists
        match self.requests.get_mut(route) {
            Some(statuses) => *statuses.entry(status).or_insert(0) += 1,
            None => {
                self.requests
                    .insert(route.to_owned(), BTreeMap::from([(status, 1)]));
            }
        }

        self.sum += duration_secs;
        self.count += 1;

        self.bucket_counts[bucket] += 1;
    }
}

fn validate_boundaries(boundaries: &[f64]) -> Result<(), MetricsError> {
    if boundaries.is_empty() {
        return Err(MetricsError::EmptyBuckets);
    }
    for (index, &value) in boundaries.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(MetricsError::InvalidBoundary { index, value });
        }
        if index > 0 && value <= boundaries[index - 1] {
            return Err(MetricsError::NotAscending {
                index,
                previous: boundaries[index - 1],
                value,
            });
        }
    }
    Ok(())
}
