//! Metrics collection for facility-admin.
//!
//! Provides application-level counters for request handling, datastore
//! access and the moderation paths that degrade instead of failing, so
//! those degradations are visible without reading response bodies.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get the global metrics instance.
pub fn get_metrics() -> &'static Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new()))
}

/// Application metrics collector.
#[derive(Debug)]
pub struct Metrics {
    // === Request Metrics ===
    /// Total HTTP requests received
    pub http_requests_total: AtomicU64,
    /// Active HTTP requests
    pub http_requests_active: AtomicU64,
    /// HTTP requests by status code category (2xx, 4xx, 5xx)
    pub http_requests_2xx: AtomicU64,
    pub http_requests_4xx: AtomicU64,
    pub http_requests_5xx: AtomicU64,
    /// Total request latency in microseconds
    pub http_request_latency_us_total: AtomicU64,
    /// Request count for average calculation
    pub http_request_latency_count: AtomicU64,

    // === Datastore Metrics ===
    /// Total datastore requests issued
    pub datastore_requests_total: AtomicU64,
    /// Datastore requests that failed
    pub datastore_errors_total: AtomicU64,
    /// Total datastore request time in microseconds
    pub datastore_time_us_total: AtomicU64,

    // === Comment Metrics ===
    /// Comment trees built
    pub comment_trees_built: AtomicU64,
    /// Replies promoted to top level because their parent was missing
    pub orphaned_replies_promoted: AtomicU64,
    /// Threads served with zeroed like counts after a like fetch failure
    pub likes_degraded: AtomicU64,

    // === Moderation Metrics ===
    /// Name or metadata lookups that failed during report enrichment
    pub enrichment_failures: AtomicU64,
    /// Report status transitions applied
    pub report_transitions_applied: AtomicU64,
    /// Report status transitions rejected by the transition table
    pub report_transitions_rejected: AtomicU64,
    /// Comment and post status changes applied
    pub content_status_changes: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            http_requests_total: AtomicU64::new(0),
            http_requests_active: AtomicU64::new(0),
            http_requests_2xx: AtomicU64::new(0),
            http_requests_4xx: AtomicU64::new(0),
            http_requests_5xx: AtomicU64::new(0),
            http_request_latency_us_total: AtomicU64::new(0),
            http_request_latency_count: AtomicU64::new(0),

            datastore_requests_total: AtomicU64::new(0),
            datastore_errors_total: AtomicU64::new(0),
            datastore_time_us_total: AtomicU64::new(0),

            comment_trees_built: AtomicU64::new(0),
            orphaned_replies_promoted: AtomicU64::new(0),
            likes_degraded: AtomicU64::new(0),

            enrichment_failures: AtomicU64::new(0),
            report_transitions_applied: AtomicU64::new(0),
            report_transitions_rejected: AtomicU64::new(0),
            content_status_changes: AtomicU64::new(0),
        }
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, status_code: u16, latency: Duration) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);

        match status_code {
            200..=299 => self.http_requests_2xx.fetch_add(1, Ordering::Relaxed),
            400..=499 => self.http_requests_4xx.fetch_add(1, Ordering::Relaxed),
            500..=599 => self.http_requests_5xx.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };

        self.http_request_latency_us_total
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.http_request_latency_count
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Start tracking an active request.
    pub fn start_request(&self) {
        self.http_requests_active.fetch_add(1, Ordering::Relaxed);
    }

    /// End tracking an active request.
    pub fn end_request(&self) {
        self.http_requests_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a datastore request.
    pub fn record_datastore_request(&self, duration: Duration, is_error: bool) {
        self.datastore_requests_total.fetch_add(1, Ordering::Relaxed);
        self.datastore_time_us_total
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if is_error {
            self.datastore_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a comment tree build and how many orphans it promoted.
    pub fn record_tree_built(&self, orphans_promoted: u64) {
        self.comment_trees_built.fetch_add(1, Ordering::Relaxed);
        self.orphaned_replies_promoted
            .fetch_add(orphans_promoted, Ordering::Relaxed);
    }

    /// Record a thread served with zeroed like counts.
    pub fn record_likes_degraded(&self) {
        self.likes_degraded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed enrichment lookup.
    pub fn record_enrichment_failure(&self) {
        self.enrichment_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a report status transition attempt.
    pub fn record_report_transition(&self, applied: bool) {
        if applied {
            self.report_transitions_applied
                .fetch_add(1, Ordering::Relaxed);
        } else {
            self.report_transitions_rejected
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a comment or post status change.
    pub fn record_content_status_change(&self) {
        self.content_status_changes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            http_requests_total: self.http_requests_total.load(Ordering::Relaxed),
            http_requests_active: self.http_requests_active.load(Ordering::Relaxed),
            http_requests_2xx: self.http_requests_2xx.load(Ordering::Relaxed),
            http_requests_4xx: self.http_requests_4xx.load(Ordering::Relaxed),
            http_requests_5xx: self.http_requests_5xx.load(Ordering::Relaxed),
            http_request_latency_avg_us: self.average_latency_us(),

            datastore_requests_total: self.datastore_requests_total.load(Ordering::Relaxed),
            datastore_errors_total: self.datastore_errors_total.load(Ordering::Relaxed),
            datastore_avg_time_us: self.average_datastore_time_us(),

            comment_trees_built: self.comment_trees_built.load(Ordering::Relaxed),
            orphaned_replies_promoted: self.orphaned_replies_promoted.load(Ordering::Relaxed),
            likes_degraded: self.likes_degraded.load(Ordering::Relaxed),

            enrichment_failures: self.enrichment_failures.load(Ordering::Relaxed),
            report_transitions_applied: self
                .report_transitions_applied
                .load(Ordering::Relaxed),
            report_transitions_rejected: self
                .report_transitions_rejected
                .load(Ordering::Relaxed),
            content_status_changes: self.content_status_changes.load(Ordering::Relaxed),
        }
    }

    /// Calculate average HTTP request latency.
    fn average_latency_us(&self) -> u64 {
        let total = self.http_request_latency_us_total.load(Ordering::Relaxed);
        let count = self.http_request_latency_count.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Calculate average datastore request time.
    fn average_datastore_time_us(&self) -> u64 {
        let total = self.datastore_time_us_total.load(Ordering::Relaxed);
        let count = self.datastore_requests_total.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Export metrics in Prometheus format.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut output = String::new();

        let mut push = |name: &str, kind: &str, help: &str, value: u64| {
            output.push_str(&format!("# HELP facility_admin_{name} {help}\n"));
            output.push_str(&format!("# TYPE facility_admin_{name} {kind}\n"));
            output.push_str(&format!("facility_admin_{name} {value}\n"));
        };

        // HTTP metrics
        push(
            "http_requests_total",
            "counter",
            "Total HTTP requests",
            snapshot.http_requests_total,
        );
        push(
            "http_requests_active",
            "gauge",
            "Active HTTP requests",
            snapshot.http_requests_active,
        );
        push(
            "http_request_latency_avg_us",
            "gauge",
            "Average request latency",
            snapshot.http_request_latency_avg_us,
        );

        // Datastore metrics
        push(
            "datastore_requests_total",
            "counter",
            "Total datastore requests",
            snapshot.datastore_requests_total,
        );
        push(
            "datastore_errors_total",
            "counter",
            "Datastore request failures",
            snapshot.datastore_errors_total,
        );

        // Comment metrics
        push(
            "comment_trees_built",
            "counter",
            "Comment trees built",
            snapshot.comment_trees_built,
        );
        push(
            "orphaned_replies_promoted",
            "counter",
            "Replies promoted to top level",
            snapshot.orphaned_replies_promoted,
        );
        push(
            "likes_degraded",
            "counter",
            "Threads served without like counts",
            snapshot.likes_degraded,
        );

        // Moderation metrics
        push(
            "enrichment_failures",
            "counter",
            "Failed report enrichment lookups",
            snapshot.enrichment_failures,
        );
        push(
            "report_transitions_applied",
            "counter",
            "Report status transitions applied",
            snapshot.report_transitions_applied,
        );
        push(
            "report_transitions_rejected",
            "counter",
            "Report status transitions rejected",
            snapshot.report_transitions_rejected,
        );
        push(
            "content_status_changes",
            "counter",
            "Comment and post status changes",
            snapshot.content_status_changes,
        );

        output.push_str("# HELP facility_admin_http_requests_by_status HTTP requests by status\n");
        output.push_str("# TYPE facility_admin_http_requests_by_status counter\n");
        output.push_str(&format!(
            "facility_admin_http_requests_by_status{{status=\"2xx\"}} {}\n",
            snapshot.http_requests_2xx
        ));
        output.push_str(&format!(
            "facility_admin_http_requests_by_status{{status=\"4xx\"}} {}\n",
            snapshot.http_requests_4xx
        ));
        output.push_str(&format!(
            "facility_admin_http_requests_by_status{{status=\"5xx\"}} {}\n",
            snapshot.http_requests_5xx
        ));

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of all metrics at a point in time.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    // HTTP
    pub http_requests_total: u64,
    pub http_requests_active: u64,
    pub http_requests_2xx: u64,
    pub http_requests_4xx: u64,
    pub http_requests_5xx: u64,
    pub http_request_latency_avg_us: u64,

    // Datastore
    pub datastore_requests_total: u64,
    pub datastore_errors_total: u64,
    pub datastore_avg_time_us: u64,

    // Comments
    pub comment_trees_built: u64,
    pub orphaned_replies_promoted: u64,
    pub likes_degraded: u64,

    // Moderation
    pub enrichment_failures: u64,
    pub report_transitions_applied: u64,
    pub report_transitions_rejected: u64,
    pub content_status_changes: u64,
}

/// Timer guard for measuring operation duration.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.http_requests_total.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.comment_trees_built.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_http_request() {
        let metrics = Metrics::new();

        metrics.record_http_request(200, Duration::from_millis(50));
        metrics.record_http_request(404, Duration::from_millis(10));
        metrics.record_http_request(500, Duration::from_millis(100));

        assert_eq!(metrics.http_requests_total.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.http_requests_2xx.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.http_requests_4xx.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.http_requests_5xx.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_active_request_tracking() {
        let metrics = Metrics::new();

        metrics.start_request();
        metrics.start_request();
        assert_eq!(metrics.http_requests_active.load(Ordering::Relaxed), 2);

        metrics.end_request();
        assert_eq!(metrics.http_requests_active.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_datastore_request() {
        let metrics = Metrics::new();

        metrics.record_datastore_request(Duration::from_micros(500), false);
        metrics.record_datastore_request(Duration::from_micros(1500), true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.datastore_requests_total, 2);
        assert_eq!(snapshot.datastore_errors_total, 1);
        assert_eq!(snapshot.datastore_avg_time_us, 1000);
    }

    #[test]
    fn test_moderation_counters() {
        let metrics = Metrics::new();

        metrics.record_tree_built(2);
        metrics.record_tree_built(0);
        metrics.record_likes_degraded();
        metrics.record_enrichment_failure();
        metrics.record_report_transition(true);
        metrics.record_report_transition(false);
        metrics.record_report_transition(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.comment_trees_built, 2);
        assert_eq!(snapshot.orphaned_replies_promoted, 2);
        assert_eq!(snapshot.likes_degraded, 1);
        assert_eq!(snapshot.enrichment_failures, 1);
        assert_eq!(snapshot.report_transitions_applied, 1);
        assert_eq!(snapshot.report_transitions_rejected, 2);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.record_http_request(200, Duration::from_millis(50));
        metrics.record_likes_degraded();

        let prometheus = metrics.to_prometheus();
        assert!(prometheus.contains("facility_admin_http_requests_total 1"));
        assert!(prometheus.contains("facility_admin_http_requests_by_status{status=\"2xx\"} 1"));
        assert!(prometheus.contains("facility_admin_likes_degraded 1"));
    }

    #[test]
    fn test_average_latency() {
        let metrics = Metrics::new();
        assert_eq!(metrics.average_latency_us(), 0);

        metrics.record_http_request(200, Duration::from_micros(100));
        metrics.record_http_request(200, Duration::from_micros(200));
        assert_eq!(metrics.average_latency_us(), 150);
    }
}
