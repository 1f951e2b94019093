//! The fixed metric table: one descriptor per pixel of the 53x11 grid.
//!
//! Layout (53 columns x 11 rows):
//! - Row 0:    critical alerts (service health, error counts, certs, disk,
//!             replication, legacy cutover, heartbeats)
//! - Rows 1-2: billing service, US and EU
//! - Rows 3-4: proxy service, US and EU
//! - Row 5:    lens and shared infrastructure
//! - Row 6:    agents, managers, covenant metrics
//! - Rows 7-10: reserved for expansion
//!
//! The two region row pairs are emitted by one parameterized function each,
//! so the US and EU layouts cannot drift apart.

use crate::policy::{MetricKind, Thresholds};
use crate::{GRID_HEIGHT, GRID_WIDTH};

// ── Descriptors ─────────────────────────────────────────────────────

/// One grid cell's metric binding.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricDescriptor {
    /// Unique identifier across the grid.
    pub name: String,
    pub kind: MetricKind,
    /// Logical origin tag; drives which store keys are consulted.
    pub source: String,
    /// Payload field to read. Health cells resolve through the
    /// `<source>_health` convention instead; a key they carry is not
    /// consulted by the renderer.
    pub key: Option<String>,
}

impl MetricDescriptor {
    fn health(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Health,
            source: source.into(),
            key: None,
        }
    }

    fn gauge(
        name: impl Into<String>,
        source: impl Into<String>,
        key: impl Into<String>,
        warn: f64,
        crit: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Gauge {
                thresholds: Some(Thresholds::new(warn, crit)),
                invert: false,
            },
            source: source.into(),
            key: Some(key.into()),
        }
    }

    /// Gauge where lower values are worse (cert days remaining, success
    /// rate, uptime since last restart).
    fn gauge_inverted(
        name: impl Into<String>,
        source: impl Into<String>,
        key: impl Into<String>,
        warn: f64,
        crit: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Gauge {
                thresholds: Some(Thresholds::new(warn, crit)),
                invert: true,
            },
            source: source.into(),
            key: Some(key.into()),
        }
    }

    fn boolean(
        name: impl Into<String>,
        source: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Boolean,
            source: source.into(),
            key: Some(key.into()),
        }
    }

    fn counter(
        name: impl Into<String>,
        source: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: MetricKind::Counter,
            source: source.into(),
            key: Some(key.into()),
        }
    }

    fn reserved(x: usize, y: usize) -> Self {
        Self {
            name: format!("reserved_{x}_{y}"),
            kind: MetricKind::Reserved,
            source: "none".into(),
            key: None,
        }
    }

    pub fn is_reserved(&self) -> bool {
        self.kind == MetricKind::Reserved
    }
}

// ── Map ─────────────────────────────────────────────────────────────

/// Row-major index of a grid coordinate.
pub fn index(x: usize, y: usize) -> usize {
    y * GRID_WIDTH + x
}

/// The coordinate→descriptor table. Built once at startup, immutable
/// thereafter; total over the whole grid by construction.
pub struct MetricMap {
    cells: Vec<MetricDescriptor>,
}

impl MetricMap {
    /// Build the full 583-cell table.
    pub fn build() -> Self {
        let mut b = Builder::new();

        critical_alerts_row(&mut b);
        service_rows(&mut b, 1, 2, billing_row);
        service_rows(&mut b, 3, 4, proxy_row);
        lens_infrastructure_row(&mut b, 5);
        agents_covenant_row(&mut b, 6);

        Self {
            cells: b.finish_with_reserved(),
        }
    }

    pub fn get(&self, x: usize, y: usize) -> &MetricDescriptor {
        &self.cells[index(x, y)]
    }

    /// All cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &MetricDescriptor)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, d)| (i % GRID_WIDTH, i / GRID_WIDTH, d))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

struct Builder {
    cells: Vec<Option<MetricDescriptor>>,
}

impl Builder {
    fn new() -> Self {
        Self {
            cells: vec![None; GRID_WIDTH * GRID_HEIGHT],
        }
    }

    fn set(&mut self, x: usize, y: usize, desc: MetricDescriptor) {
        let slot = &mut self.cells[index(x, y)];
        assert!(
            slot.is_none(),
            "cell ({x}, {y}) assigned twice: {} over {}",
            desc.name,
            slot.as_ref().map(|d| d.name.as_str()).unwrap_or("?"),
        );
        *slot = Some(desc);
    }

    /// Fill every unassigned cell with a reserved placeholder so the map
    /// is total.
    fn finish_with_reserved(self) -> Vec<MetricDescriptor> {
        self.cells
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.unwrap_or_else(|| MetricDescriptor::reserved(i % GRID_WIDTH, i / GRID_WIDTH))
            })
            .collect()
    }
}

// ── Row 0: critical alerts ──────────────────────────────────────────

fn critical_alerts_row(b: &mut Builder) {
    use MetricDescriptor as D;
    let row = 0;

    // Columns 0-7: service health
    b.set(0, row, D::health("billing_us_health", "billing_us"));
    b.set(1, row, D::health("billing_eu_health", "billing_eu"));
    b.set(2, row, D::health("proxy_us_health", "proxy_us"));
    b.set(3, row, D::health("proxy_eu_health", "proxy_eu"));
    b.set(4, row, D::health("lens_health", "lens"));
    b.set(5, row, D::health("postgres_us_health", "db_us"));
    b.set(6, row, D::health("postgres_eu_health", "db_eu"));
    b.set(7, row, D::health("replication_health", "replication"));

    // Columns 8-15: error counts
    b.set(8, row, D::gauge("billing_errors_1h", "lens_stats", "billing_errors_1h", 5.0, 20.0));
    b.set(9, row, D::gauge("proxy_errors_1h", "lens_stats", "proxy_errors_1h", 5.0, 20.0));
    b.set(10, row, D::gauge("lens_errors_1h", "lens_stats", "lens_errors_1h", 5.0, 20.0));
    b.set(11, row, D::gauge("db_errors_1h", "lens_stats", "db_errors_1h", 1.0, 5.0));
    b.set(12, row, D::gauge("total_errors_1h", "lens_stats", "total_errors_1h", 10.0, 50.0));
    b.set(13, row, D::gauge("total_errors_24h", "lens_stats", "total_errors_24h", 50.0, 200.0));
    b.set(14, row, D::gauge("warnings_1h", "lens_stats", "warnings_1h", 20.0, 100.0));
    b.set(15, row, D::gauge("warnings_24h", "lens_stats", "warnings_24h", 100.0, 500.0));

    // Columns 16-23: certificate days remaining
    for (i, (name, key)) in [
        ("cert_billing_us", "billing_us_days"),
        ("cert_billing_eu", "billing_eu_days"),
        ("cert_proxy_us", "proxy_us_days"),
        ("cert_proxy_eu", "proxy_eu_days"),
        ("cert_lens", "lens_days"),
        ("cert_agents", "agents_days"),
        ("cert_root_us", "root_us_days"),
        ("cert_root_eu", "root_eu_days"),
    ]
    .into_iter()
    .enumerate()
    {
        b.set(16 + i, row, D::gauge_inverted(name, "certs", key, 30.0, 14.0));
    }

    // Columns 24-31: disk usage percentages
    b.set(24, row, D::gauge("disk_us_root", "system", "disk_us_pct", 70.0, 85.0));
    b.set(25, row, D::gauge("disk_eu_root", "system", "disk_eu_pct", 70.0, 85.0));
    b.set(26, row, D::gauge("disk_us_docker", "system", "disk_us_docker_pct", 70.0, 85.0));
    b.set(27, row, D::gauge("disk_eu_docker", "system", "disk_eu_docker_pct", 70.0, 85.0));
    b.set(28, row, D::gauge("disk_us_postgres", "system", "disk_us_pg_pct", 60.0, 80.0));
    b.set(29, row, D::gauge("disk_eu_postgres", "system", "disk_eu_pg_pct", 60.0, 80.0));
    b.set(30, row, D::gauge("disk_us_logs", "system", "disk_us_logs_pct", 50.0, 75.0));
    b.set(31, row, D::gauge("disk_eu_logs", "system", "disk_eu_logs_pct", 50.0, 75.0));

    // Columns 32-39: replication status
    b.set(32, row, D::boolean("repl_us_to_eu_active", "replication", "us_to_eu_active"));
    b.set(33, row, D::boolean("repl_eu_to_us_active", "replication", "eu_to_us_active"));
    b.set(34, row, D::gauge("repl_us_to_eu_lag", "replication", "us_to_eu_lag_sec", 30.0, 120.0));
    b.set(35, row, D::gauge("repl_eu_to_us_lag", "replication", "eu_to_us_lag_sec", 30.0, 120.0));
    b.set(36, row, D::boolean("repl_slot_us_active", "replication", "slot_us_active"));
    b.set(37, row, D::boolean("repl_slot_eu_active", "replication", "slot_eu_active"));
    b.set(38, row, D::gauge("repl_wal_us_mb", "replication", "wal_us_mb", 100.0, 200.0));
    b.set(39, row, D::gauge("repl_wal_eu_mb", "replication", "wal_eu_mb", 100.0, 200.0));

    // Columns 40-47: legacy server cutover
    b.set(40, row, D::health("legacy_llm_health", "legacy_llm"));
    b.set(41, row, D::health("legacy_billing_health", "legacy_billing"));
    b.set(42, row, D::boolean("legacy_llm_traffic", "legacy", "llm_has_traffic"));
    b.set(43, row, D::boolean("legacy_billing_traffic", "legacy", "billing_has_traffic"));
    b.set(44, row, D::boolean("legacy_cirisnode0", "legacy", "cirisnode0_stopped"));
    b.set(45, row, D::boolean("dns_cutover_ready", "legacy", "dns_cutover_ready"));
    b.set(46, row, D::boolean("legacy_decom_safe", "legacy", "decom_safe"));
    b.set(47, row, D::boolean("migration_complete", "legacy", "migration_complete"));

    // Columns 48-52: heartbeat and scheduler liveness
    b.set(48, row, D::boolean("heartbeat_us_ok", "heartbeat", "us_ok"));
    b.set(49, row, D::boolean("heartbeat_eu_ok", "heartbeat", "eu_ok"));
    b.set(50, row, D::boolean("scheduler_us_ok", "scheduler", "us_ok"));
    b.set(51, row, D::boolean("scheduler_eu_ok", "scheduler", "eu_ok"));
    b.set(52, row, D::boolean("alerting_ok", "alerting", "ok"));
}

// ── Region row pairs ────────────────────────────────────────────────

/// Emit a US row and a structurally identical EU row from one rule.
fn service_rows(b: &mut Builder, us_row: usize, eu_row: usize, emit: fn(&mut Builder, usize, &str)) {
    emit(b, us_row, "us");
    emit(b, eu_row, "eu");
}

/// Thresholds for per-level log volume gauges.
fn log_level_thresholds(level: &str) -> (f64, f64) {
    match level {
        "debug" => (100.0, 500.0),
        "info" => (50.0, 200.0),
        "warning" => (10.0, 50.0),
        // error and critical
        _ => (1.0, 5.0),
    }
}

const LOG_LEVELS: [&str; 5] = ["debug", "info", "warning", "error", "critical"];

/// Rows 1-2: billing service metrics for one region.
fn billing_row(b: &mut Builder, row: usize, region: &str) {
    use MetricDescriptor as D;
    let svc = format!("billing_{region}");

    // Request metrics (columns 0-7)
    b.set(0, row, D::gauge(format!("{svc}_requests_1m"), &svc, "requests_1m", 100.0, 500.0));
    b.set(1, row, D::gauge(format!("{svc}_requests_5m"), &svc, "requests_5m", 500.0, 2000.0));
    b.set(2, row, D::gauge(format!("{svc}_requests_1h"), &svc, "requests_1h", 5000.0, 20000.0));
    b.set(3, row, D::gauge_inverted(format!("{svc}_success_rate"), &svc, "success_rate", 95.0, 99.0));
    b.set(4, row, D::gauge(format!("{svc}_latency_p50"), &svc, "latency_p50_ms", 100.0, 500.0));
    b.set(5, row, D::gauge(format!("{svc}_latency_p95"), &svc, "latency_p95_ms", 500.0, 2000.0));
    b.set(6, row, D::gauge(format!("{svc}_latency_p99"), &svc, "latency_p99_ms", 1000.0, 5000.0));
    b.set(7, row, D::gauge(format!("{svc}_errors_1m"), &svc, "errors_1m", 1.0, 5.0));

    // Database metrics (columns 8-15)
    b.set(8, row, D::boolean(format!("{svc}_db_connected"), &svc, "db_connected"));
    b.set(9, row, D::gauge(format!("{svc}_db_pool_used"), &svc, "db_pool_used", 80.0, 95.0));
    b.set(10, row, D::gauge(format!("{svc}_db_queries_1m"), &svc, "db_queries_1m", 1000.0, 5000.0));
    b.set(11, row, D::gauge(format!("{svc}_db_slow_queries"), &svc, "db_slow_queries", 5.0, 20.0));
    b.set(12, row, D::counter(format!("{svc}_accounts_total"), &svc, "accounts_total"));
    b.set(13, row, D::counter(format!("{svc}_accounts_active"), &svc, "accounts_active"));
    b.set(14, row, D::counter(format!("{svc}_credits_total"), &svc, "credits_total"));
    b.set(15, row, D::counter(format!("{svc}_charges_today"), &svc, "charges_today"));

    // Endpoint health (columns 16-31)
    let endpoints = [
        "health", "credit_check", "charge", "balance", "signup", "oauth", "admin", "metrics",
        "webhook", "refund", "history", "products", "verify", "status", "config", "keys",
    ];
    for (i, ep) in endpoints.into_iter().enumerate() {
        let mut d = D::health(format!("{svc}_ep_{ep}"), format!("{svc}_endpoints"));
        d.key = Some(ep.to_string());
        b.set(16 + i, row, d);
    }

    // Container metrics (columns 32-39)
    let ctr = format!("container_{region}");
    b.set(32, row, D::boolean(format!("{svc}_container_running"), &ctr, "billing_running"));
    b.set(33, row, D::boolean(format!("{svc}_container_healthy"), &ctr, "billing_healthy"));
    b.set(34, row, D::gauge(format!("{svc}_cpu_pct"), &ctr, "billing_cpu", 70.0, 90.0));
    b.set(35, row, D::gauge(format!("{svc}_mem_pct"), &ctr, "billing_mem", 70.0, 90.0));
    b.set(36, row, D::gauge(format!("{svc}_restarts"), &ctr, "billing_restarts", 1.0, 3.0));
    b.set(37, row, D::gauge_inverted(format!("{svc}_uptime_hours"), &ctr, "billing_uptime_h", 1.0, 0.5));
    b.set(38, row, D::boolean(format!("{svc}_image_latest"), &ctr, "billing_latest"));
    b.set(39, row, D::boolean(format!("{svc}_network_ok"), &ctr, "billing_network"));

    // Log metrics (columns 40-47)
    let logs = format!("logs_{region}");
    for (i, level) in LOG_LEVELS.into_iter().enumerate() {
        let (warn, crit) = log_level_thresholds(level);
        b.set(
            40 + i,
            row,
            D::gauge(format!("{svc}_log_{level}_1h"), &logs, format!("billing_{level}_1h"), warn, crit),
        );
    }
    b.set(45, row, D::gauge(format!("{svc}_log_rate"), &logs, "billing_rate_per_min", 100.0, 500.0));
    // Trend is -1 falling, 0 flat, 1 rising.
    b.set(46, row, D::gauge(format!("{svc}_log_errors_trend"), &logs, "billing_error_trend", 0.0, 1.0));
    b.set(47, row, D::boolean(format!("{svc}_log_anomaly"), &logs, "billing_anomaly"));

    // Feature flags and config (columns 48-52)
    let cfg = format!("{svc}_config");
    b.set(48, row, D::boolean(format!("{svc}_stripe_ok"), &cfg, "stripe_connected"));
    b.set(49, row, D::boolean(format!("{svc}_google_ok"), &cfg, "google_connected"));
    b.set(50, row, D::boolean(format!("{svc}_oauth_ok"), &cfg, "oauth_configured"));
    b.set(51, row, D::boolean(format!("{svc}_migrations_ok"), &cfg, "migrations_current"));
    b.set(52, row, D::boolean(format!("{svc}_version_ok"), &cfg, "version_match"));
}

/// Rows 3-4: proxy service metrics for one region.
fn proxy_row(b: &mut Builder, row: usize, region: &str) {
    use MetricDescriptor as D;
    let svc = format!("proxy_{region}");

    // Request metrics (columns 0-7)
    b.set(0, row, D::gauge(format!("{svc}_requests_1m"), &svc, "requests_1m", 50.0, 200.0));
    b.set(1, row, D::gauge(format!("{svc}_requests_5m"), &svc, "requests_5m", 200.0, 800.0));
    b.set(2, row, D::gauge(format!("{svc}_requests_1h"), &svc, "requests_1h", 2000.0, 8000.0));
    b.set(3, row, D::gauge_inverted(format!("{svc}_success_rate"), &svc, "success_rate", 95.0, 99.0));
    b.set(4, row, D::gauge(format!("{svc}_latency_p50"), &svc, "latency_p50_ms", 1000.0, 5000.0));
    b.set(5, row, D::gauge(format!("{svc}_latency_p95"), &svc, "latency_p95_ms", 5000.0, 15000.0));
    b.set(6, row, D::gauge(format!("{svc}_latency_p99"), &svc, "latency_p99_ms", 10000.0, 30000.0));
    b.set(7, row, D::gauge(format!("{svc}_errors_1m"), &svc, "errors_1m", 1.0, 5.0));

    // Upstream LLM providers (columns 8-23): availability, then latency
    let providers = [
        "groq", "together", "openrouter", "anthropic", "openai", "google", "mistral", "cohere",
    ];
    let prov_source = format!("{svc}_providers");
    for (i, provider) in providers.into_iter().enumerate() {
        b.set(
            8 + i,
            row,
            D::boolean(format!("{svc}_{provider}_ok"), &prov_source, format!("{provider}_available")),
        );
        b.set(
            16 + i,
            row,
            D::gauge(
                format!("{svc}_{provider}_latency"),
                &prov_source,
                format!("{provider}_latency_ms"),
                2000.0,
                10000.0,
            ),
        );
    }

    // Billing integration (columns 24-31)
    b.set(24, row, D::boolean(format!("{svc}_billing_ok"), &svc, "billing_connected"));
    b.set(25, row, D::gauge(format!("{svc}_credit_checks_1m"), &svc, "credit_checks_1m", 50.0, 200.0));
    b.set(26, row, D::gauge(format!("{svc}_credit_check_latency"), &svc, "credit_check_latency_ms", 100.0, 500.0));
    b.set(27, row, D::gauge(format!("{svc}_charges_1m"), &svc, "charges_1m", 50.0, 200.0));
    b.set(28, row, D::gauge(format!("{svc}_charge_latency"), &svc, "charge_latency_ms", 100.0, 500.0));
    b.set(29, row, D::gauge(format!("{svc}_billing_errors"), &svc, "billing_errors_1h", 1.0, 5.0));
    b.set(30, row, D::gauge(format!("{svc}_insufficient_credits"), &svc, "insufficient_credits_1h", 10.0, 50.0));
    // Fetched as "closed = true = good"; no inversion here.
    b.set(31, row, D::boolean(format!("{svc}_circuit_breaker"), &svc, "circuit_closed"));

    // Container metrics (columns 32-39)
    let ctr = format!("container_{region}");
    b.set(32, row, D::boolean(format!("{svc}_container_running"), &ctr, "proxy_running"));
    b.set(33, row, D::boolean(format!("{svc}_container_healthy"), &ctr, "proxy_healthy"));
    b.set(34, row, D::gauge(format!("{svc}_cpu_pct"), &ctr, "proxy_cpu", 70.0, 90.0));
    b.set(35, row, D::gauge(format!("{svc}_mem_pct"), &ctr, "proxy_mem", 70.0, 90.0));
    b.set(36, row, D::gauge(format!("{svc}_restarts"), &ctr, "proxy_restarts", 1.0, 3.0));
    b.set(37, row, D::gauge_inverted(format!("{svc}_uptime_hours"), &ctr, "proxy_uptime_h", 1.0, 0.5));
    b.set(38, row, D::boolean(format!("{svc}_image_latest"), &ctr, "proxy_latest"));
    b.set(39, row, D::boolean(format!("{svc}_network_ok"), &ctr, "proxy_network"));

    // Log metrics (columns 40-47)
    let logs = format!("logs_{region}");
    for (i, level) in LOG_LEVELS.into_iter().enumerate() {
        let (warn, crit) = log_level_thresholds(level);
        b.set(
            40 + i,
            row,
            D::gauge(format!("{svc}_log_{level}_1h"), &logs, format!("proxy_{level}_1h"), warn, crit),
        );
    }
    b.set(45, row, D::gauge(format!("{svc}_log_rate"), &logs, "proxy_rate_per_min", 100.0, 500.0));
    b.set(46, row, D::gauge(format!("{svc}_log_errors_trend"), &logs, "proxy_error_trend", 0.0, 1.0));
    b.set(47, row, D::boolean(format!("{svc}_log_anomaly"), &logs, "proxy_anomaly"));

    // Log shipper (columns 48-52)
    let shipper = format!("{svc}_shipper");
    b.set(48, row, D::boolean(format!("{svc}_shipper_ok"), &shipper, "shipper_healthy"));
    b.set(49, row, D::boolean(format!("{svc}_shipper_circuit"), &shipper, "circuit_closed"));
    b.set(50, row, D::gauge(format!("{svc}_shipper_buffer"), &shipper, "buffer_pct", 50.0, 80.0));
    b.set(51, row, D::gauge(format!("{svc}_shipper_dropped"), &shipper, "dropped_1h", 10.0, 100.0));
    b.set(52, row, D::gauge(format!("{svc}_shipper_backoff"), &shipper, "backoff_sec", 30.0, 300.0));
}

// ── Row 5: lens and infrastructure ──────────────────────────────────

fn lens_infrastructure_row(b: &mut Builder, row: usize) {
    use MetricDescriptor as D;

    // Lens service (columns 0-10)
    b.set(0, row, D::health("lens_api_health", "lens"));
    b.set(1, row, D::health("lens_grafana_health", "grafana"));
    b.set(2, row, D::health("lens_db_health", "lens_db"));
    b.set(3, row, D::gauge("lens_requests_1m", "lens", "requests_1m", 100.0, 500.0));
    b.set(4, row, D::gauge("lens_log_ingestion_rate", "lens", "log_ingestion_per_min", 1000.0, 5000.0));
    b.set(5, row, D::counter("lens_total_logs", "lens", "total_logs"));
    b.set(6, row, D::counter("lens_total_agents", "lens", "total_agents"));
    b.set(7, row, D::counter("lens_active_agents", "lens", "active_agents"));
    b.set(8, row, D::counter("lens_total_managers", "lens", "total_managers"));
    b.set(9, row, D::gauge("lens_db_size_gb", "lens", "db_size_gb", 5.0, 10.0));
    b.set(10, row, D::gauge_inverted("lens_retention_days", "lens", "retention_days", 7.0, 3.0));

    // Grafana dashboards (columns 11-20)
    let dashboards = [
        "main", "services", "billing", "errors", "logs", "managers", "traces", "service_logs",
        "public", "telemetry",
    ];
    for (i, dash) in dashboards.into_iter().enumerate() {
        b.set(
            11 + i,
            row,
            D::boolean(format!("grafana_dash_{dash}"), "grafana", format!("dash_{dash}_ok")),
        );
    }

    // Alerting (columns 21-26)
    b.set(21, row, D::boolean("alerting_enabled", "alerting", "enabled"));
    b.set(22, row, D::gauge("alerts_firing", "alerting", "firing_count", 1.0, 5.0));
    b.set(23, row, D::gauge("alerts_pending", "alerting", "pending_count", 3.0, 10.0));
    b.set(24, row, D::boolean("alert_heartbeat_us", "alerting", "heartbeat_us_ok"));
    b.set(25, row, D::boolean("alert_heartbeat_eu", "alerting", "heartbeat_eu_ok"));
    b.set(26, row, D::boolean("alert_notification_ok", "alerting", "notification_channel_ok"));

    // Caddy and TLS (columns 27-34)
    b.set(27, row, D::health("caddy_us_health", "caddy_us"));
    b.set(28, row, D::health("caddy_eu_health", "caddy_eu"));
    b.set(29, row, D::gauge("caddy_us_requests_1m", "caddy_us", "requests_1m", 500.0, 2000.0));
    b.set(30, row, D::gauge("caddy_eu_requests_1m", "caddy_eu", "requests_1m", 500.0, 2000.0));
    b.set(31, row, D::gauge("caddy_us_errors_1m", "caddy_us", "errors_1m", 5.0, 20.0));
    b.set(32, row, D::gauge("caddy_eu_errors_1m", "caddy_eu", "errors_1m", 5.0, 20.0));
    b.set(33, row, D::gauge("tls_handshake_us", "caddy_us", "tls_handshake_ms", 100.0, 500.0));
    b.set(34, row, D::gauge("tls_handshake_eu", "caddy_eu", "tls_handshake_ms", 100.0, 500.0));

    // DNS and redis (columns 35-42)
    b.set(35, row, D::health("dns_us_health", "dns_us"));
    b.set(36, row, D::health("dns_eu_health", "dns_eu"));
    b.set(37, row, D::gauge("dns_queries_1m", "dns", "queries_1m", 100.0, 500.0));
    b.set(38, row, D::gauge_inverted("dns_cache_hit_rate", "dns", "cache_hit_pct", 80.0, 95.0));
    b.set(39, row, D::gauge("dns_resolution_time", "dns", "resolution_ms", 50.0, 200.0));
    b.set(40, row, D::health("redis_us_health", "redis_us"));
    b.set(41, row, D::gauge("redis_us_memory_pct", "redis_us", "memory_pct", 70.0, 90.0));
    b.set(42, row, D::gauge("redis_us_connections", "redis_us", "connections", 50.0, 100.0));

    // PgBouncer (columns 43-48)
    b.set(43, row, D::health("pgbouncer_us_health", "pgbouncer_us"));
    b.set(44, row, D::health("pgbouncer_eu_health", "pgbouncer_eu"));
    b.set(45, row, D::gauge("pgbouncer_us_active", "pgbouncer_us", "active_conns", 20.0, 40.0));
    b.set(46, row, D::gauge("pgbouncer_eu_active", "pgbouncer_eu", "active_conns", 20.0, 40.0));
    b.set(47, row, D::gauge("pgbouncer_us_waiting", "pgbouncer_us", "waiting_conns", 5.0, 15.0));
    b.set(48, row, D::gauge("pgbouncer_eu_waiting", "pgbouncer_eu", "waiting_conns", 5.0, 15.0));

    // System load (columns 49-52)
    b.set(49, row, D::gauge("load_us_1m", "system_us", "load_1m", 2.0, 4.0));
    b.set(50, row, D::gauge("load_eu_1m", "system_eu", "load_1m", 2.0, 4.0));
    b.set(51, row, D::gauge("memory_us_pct", "system_us", "memory_pct", 70.0, 85.0));
    b.set(52, row, D::gauge("memory_eu_pct", "system_eu", "memory_pct", 70.0, 85.0));
}

// ── Row 6: agents, managers, covenant ───────────────────────────────

fn agents_covenant_row(b: &mut Builder, row: usize) {
    use MetricDescriptor as D;

    // Agent fleet (columns 0-26)
    for i in 0..27 {
        let mut d = D::health(format!("agent_{i}_health"), "agents");
        d.key = Some(format!("agent_{i}"));
        b.set(i, row, d);
    }

    // Managers (columns 27-36)
    for i in 0..10 {
        let mut d = D::health(format!("manager_{i}_health"), "managers");
        d.key = Some(format!("manager_{i}"));
        b.set(27 + i, row, d);
    }

    // Covenant and compliance (columns 37-52)
    b.set(37, row, D::gauge("wbd_pending", "covenant", "wbd_pending", 5.0, 20.0));
    b.set(38, row, D::counter("wbd_total", "covenant", "wbd_total"));
    b.set(39, row, D::gauge("pdma_pending", "covenant", "pdma_pending", 3.0, 10.0));
    b.set(40, row, D::counter("pdma_total", "covenant", "pdma_total"));
    b.set(41, row, D::gauge("pdma_avg_risk", "covenant", "pdma_avg_risk", 0.5, 0.8));
    b.set(42, row, D::counter("creator_ledger_entries", "covenant", "creator_entries"));
    b.set(43, row, D::gauge("sunset_pending", "covenant", "sunset_pending", 1.0, 5.0));
    b.set(44, row, D::gauge("sunset_deferred", "covenant", "sunset_deferred", 3.0, 10.0));
    b.set(45, row, D::gauge_inverted("compliance_score", "covenant", "avg_compliance", 0.9, 0.95));
    b.set(46, row, D::counter("agents_covenant_enabled", "covenant", "agents_enabled"));
    b.set(47, row, D::counter("agents_wbd_enabled", "covenant", "wbd_enabled"));
    b.set(48, row, D::counter("agents_pdma_enabled", "covenant", "pdma_enabled"));
    b.set(49, row, D::gauge("principle_conflicts", "covenant", "conflicts_24h", 5.0, 20.0));
    b.set(50, row, D::counter("stakeholder_impacts", "covenant", "stakeholder_impacts"));
    b.set(51, row, D::counter("covenant_version", "covenant", "version_count"));
    b.set(52, row, D::health("covenant_health", "covenant"));
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn map_is_total_over_the_grid() {
        let map = MetricMap::build();
        assert_eq!(map.len(), GRID_WIDTH * GRID_HEIGHT);
        for y in 0..GRID_HEIGHT {
            for x in 0..GRID_WIDTH {
                // get() panics on a hole, so touching every cell is the check
                let d = map.get(x, y);
                assert!(!d.name.is_empty());
            }
        }
    }

    #[test]
    fn non_reserved_names_are_unique() {
        let map = MetricMap::build();
        let mut seen = HashSet::new();
        for (x, y, d) in map.iter() {
            if !d.is_reserved() {
                assert!(seen.insert(d.name.clone()), "duplicate name {} at ({x},{y})", d.name);
            }
        }
        // Rows 0-6 are fully mapped.
        assert_eq!(seen.len(), GRID_WIDTH * 7);
    }

    #[test]
    fn reserved_band_fills_rows_7_to_10() {
        let map = MetricMap::build();
        for y in 7..GRID_HEIGHT {
            for x in 0..GRID_WIDTH {
                let d = map.get(x, y);
                assert!(d.is_reserved(), "({x},{y}) is {}", d.name);
                assert_eq!(d.name, format!("reserved_{x}_{y}"));
            }
        }
    }

    #[test]
    fn region_row_pairs_are_structurally_identical() {
        let map = MetricMap::build();
        for (us_row, eu_row) in [(1usize, 2usize), (3, 4)] {
            for x in 0..GRID_WIDTH {
                let us = map.get(x, us_row);
                let eu = map.get(x, eu_row);
                assert_eq!(us.kind, eu.kind, "kind differs at column {x}");
                assert_eq!(
                    us.name.replace("_us", "_eu"),
                    eu.name,
                    "name shape differs at column {x}"
                );
            }
        }
    }

    #[rstest]
    #[case(0, 0, "billing_us_health")]
    #[case(7, 0, "replication_health")]
    #[case(16, 0, "cert_billing_us")]
    #[case(3, 1, "billing_us_success_rate")]
    #[case(31, 4, "proxy_eu_circuit_breaker")]
    #[case(10, 5, "lens_retention_days")]
    #[case(52, 6, "covenant_health")]
    fn spot_check_cell_names(#[case] x: usize, #[case] y: usize, #[case] name: &str) {
        let map = MetricMap::build();
        assert_eq!(map.get(x, y).name, name);
    }

    #[test]
    fn error_count_cell_has_expected_thresholds() {
        let map = MetricMap::build();
        let d = map.get(8, 0);
        assert_eq!(
            d.kind,
            MetricKind::Gauge {
                thresholds: Some(Thresholds::new(5.0, 20.0)),
                invert: false,
            }
        );
        assert_eq!(d.key.as_deref(), Some("billing_errors_1h"));
        assert_eq!(d.source, "lens_stats");
    }

    #[test]
    fn inverted_gauges_all_mean_lower_is_worse() {
        // Every inverted gauge in the table frames its value as "distance
        // from trouble": days remaining, success percentage, uptime hours.
        let map = MetricMap::build();
        let mut inverted = Vec::new();
        for (_, _, d) in map.iter() {
            if let MetricKind::Gauge { invert: true, thresholds } = &d.kind {
                assert!(thresholds.is_some(), "{}: inverted gauge without thresholds", d.name);
                inverted.push(d.name.clone());
            }
        }
        for name in &inverted {
            assert!(
                name.starts_with("cert_")
                    || name.ends_with("_success_rate")
                    || name.ends_with("_uptime_hours")
                    || name.ends_with("retention_days")
                    || name.ends_with("cache_hit_rate")
                    || name.ends_with("compliance_score"),
                "unexpected inverted gauge {name}"
            );
        }
        // 8 certs, 4 success rates, 4 uptimes, retention, cache hit, compliance
        assert_eq!(inverted.len(), 19);
    }

    #[test]
    fn counters_never_carry_thresholds() {
        let map = MetricMap::build();
        for (_, _, d) in map.iter() {
            if d.kind == MetricKind::Counter {
                // The variant itself has no threshold slot; assert the key
                // exists so the counter can be read at all.
                assert!(d.key.is_some(), "{} has no payload key", d.name);
            }
        }
    }

    #[test]
    fn health_cells_leave_payload_key_to_the_source_convention() {
        let map = MetricMap::build();
        let d = map.get(4, 0);
        assert_eq!(d.name, "lens_health");
        assert_eq!(d.source, "lens");
        assert_eq!(d.key, None);
    }
}
