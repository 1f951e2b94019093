//! Data fetching: bounded-timeout probes of the fleet's endpoints,
//! normalized into the status store.
//!
//! Transport never leaks past this module. Every request failure is caught
//! here and converted into either a "service is down" reading or a
//! leave-stale outcome, so the scheduler only ever sees a `FetchOutcome`.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::store::{StatusStore, Value};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const STATS_TIMEOUT: Duration = Duration::from_secs(10);

// ── Endpoints ───────────────────────────────────────────────────────

/// Service base URLs and credentials, consumed at process start.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub billing_us: String,
    pub billing_eu: String,
    pub proxy_us: String,
    pub proxy_eu: String,
    /// Lens base URL; also serves the consolidated stats endpoint.
    pub lens: String,
    pub lens_token: String,
    /// Complete URL of the coarse status document (bubble mode).
    pub status_url: String,
}

// ── Outcome ─────────────────────────────────────────────────────────

/// Summary of one refresh cycle, for logging and error-frame decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Every request completed.
    Success,
    /// Some requests failed; their keys were left stale or marked down.
    Partial,
    /// Nothing could be fetched at all.
    Failed,
}

impl FetchOutcome {
    fn from_counts(ok: usize, failed: usize) -> Self {
        if failed == 0 {
            FetchOutcome::Success
        } else if ok > 0 {
            FetchOutcome::Partial
        } else {
            FetchOutcome::Failed
        }
    }

    pub fn is_failure(&self) -> bool {
        *self == FetchOutcome::Failed
    }
}

// ── Payload interpretation (pure) ───────────────────────────────────

/// Body of a `GET {base}/health` response.
#[derive(Debug, Default, Deserialize)]
pub struct HealthBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

/// Health policy: 200 with `status == "healthy"` or `database ==
/// "connected"` is up; 401 means the service is up but requires auth;
/// any other answer is down.
pub fn interpret_health(code: u16, body: Option<&HealthBody>) -> bool {
    match code {
        200 => body.is_some_and(|b| {
            b.status.as_deref() == Some("healthy") || b.database.as_deref() == Some("connected")
        }),
        401 => true,
        _ => false,
    }
}

/// Merge every scalar top-level field of a stats payload into the store
/// under a source-prefixed key. Nested structures are skipped.
pub fn merge_stats(
    store: &mut StatusStore,
    prefix: &str,
    payload: &serde_json::Map<String, serde_json::Value>,
) {
    for (key, raw) in payload {
        if let Some(value) = Value::from_json(raw) {
            store.set(format!("{prefix}_{key}"), value);
        }
    }
}

/// One entry of the coarse status document.
#[derive(Debug, Default, Deserialize)]
pub struct StatusEntry {
    #[serde(default)]
    pub status: String,
}

/// The coarse status document consumed by bubble mode.
#[derive(Debug, Default, Deserialize)]
pub struct OverviewBody {
    #[serde(default)]
    pub regions: BTreeMap<String, StatusEntry>,
    #[serde(default)]
    pub infrastructure: BTreeMap<String, StatusEntry>,
    #[serde(default)]
    pub llm_providers: BTreeMap<String, StatusEntry>,
    #[serde(default)]
    pub database_providers: BTreeMap<String, StatusEntry>,
    #[serde(default)]
    pub auth_providers: BTreeMap<String, StatusEntry>,
    #[serde(default)]
    pub internal_providers: BTreeMap<String, StatusEntry>,
}

/// Normalize a region key (`us-east-1`, `EU-Central`) to the store key
/// `region_us` / `region_eu` by substring match.
fn region_key(raw: &str) -> Option<&'static str> {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("us") {
        Some("region_us")
    } else if lower.contains("eu") {
        Some("region_eu")
    } else {
        None
    }
}

/// Truncate a dotted provider name (`lens.postgresql`) at the first dot.
fn provider_key(raw: &str) -> &str {
    raw.split('.').next().unwrap_or(raw)
}

/// Merge the coarse status document into the store. Status words are
/// stored lowercased so the renderer's vocabulary match is exact.
pub fn merge_overview(store: &mut StatusStore, body: &OverviewBody) {
    for (name, entry) in &body.regions {
        if let Some(key) = region_key(name) {
            store.set(key, entry.status.to_ascii_lowercase());
        }
    }

    let groups = [
        &body.infrastructure,
        &body.llm_providers,
        &body.database_providers,
        &body.auth_providers,
        &body.internal_providers,
    ];
    for group in groups {
        for (name, entry) in group {
            store.set(provider_key(name), entry.status.to_ascii_lowercase());
        }
    }
}

// ── Fetcher ─────────────────────────────────────────────────────────

/// Polls the fleet's endpoints and writes normalized readings into the
/// store. One instance, one shared HTTP client.
pub struct Fetcher {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl Fetcher {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    /// Probe `{base}/health`. A transport error is a reading too: an
    /// unreachable service is reported down, not blank.
    async fn probe_health(&self, base: &str) -> Result<bool, reqwest::Error> {
        let url = format!("{base}/health");
        let response = self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await?;
        let code = response.status().as_u16();
        let body = if code == 200 {
            // A malformed body reads as "not healthy", never as an error.
            response.json::<HealthBody>().await.ok()
        } else {
            None
        };
        Ok(interpret_health(code, body.as_ref()))
    }

    /// Fetch the consolidated stats payload from the lens API.
    async fn fetch_stats(
        &self,
    ) -> Result<serde_json::Map<String, serde_json::Value>, reqwest::Error> {
        let url = format!("{}/lens-api/api/admin/stats", self.endpoints.lens);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.endpoints.lens_token)
            .timeout(STATS_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        response.json().await
    }

    /// One grid-mode refresh cycle: the five health probes plus the stats
    /// merge. Failed probes mark their service down; a failed stats fetch
    /// leaves the previous `lens_*` values untouched.
    pub async fn refresh(&self, store: &mut StatusStore) -> FetchOutcome {
        let mut ok = 0usize;
        let mut failed = 0usize;

        let probes = [
            ("billing_us_health", self.endpoints.billing_us.as_str()),
            ("billing_eu_health", self.endpoints.billing_eu.as_str()),
            ("proxy_us_health", self.endpoints.proxy_us.as_str()),
            ("proxy_eu_health", self.endpoints.proxy_eu.as_str()),
            ("lens_health", self.endpoints.lens.as_str()),
        ];
        for (key, base) in probes {
            match self.probe_health(base).await {
                Ok(healthy) => {
                    store.set(key, healthy);
                    ok += 1;
                }
                Err(e) => {
                    tracing::warn!("health check failed for {base}: {e}");
                    store.set(key, false);
                    failed += 1;
                }
            }
        }

        match self.fetch_stats().await {
            Ok(payload) => {
                merge_stats(store, "lens", &payload);
                ok += 1;
            }
            Err(e) => {
                tracing::warn!("lens stats fetch failed: {e}");
                failed += 1;
            }
        }

        store.mark_updated();
        let outcome = FetchOutcome::from_counts(ok, failed);
        tracing::debug!("refresh complete: {outcome:?}, {} keys", store.len());
        outcome
    }

    /// One bubble-mode refresh cycle: fetch and merge the coarse status
    /// document. On failure every bound status stays as it was.
    pub async fn refresh_overview(&self, store: &mut StatusStore) -> FetchOutcome {
        let result = async {
            self.client
                .get(&self.endpoints.status_url)
                .timeout(STATS_TIMEOUT)
                .send()
                .await?
                .error_for_status()?
                .json::<OverviewBody>()
                .await
        }
        .await;

        match result {
            Ok(body) => {
                merge_overview(store, &body);
                store.mark_updated();
                FetchOutcome::Success
            }
            Err(e) => {
                tracing::warn!("status overview fetch failed: {e}");
                FetchOutcome::Failed
            }
        }
    }

    /// Startup gate: wait until the lens endpoint answers anything at all,
    /// retrying once a second up to `deadline`. Any HTTP answer proves the
    /// network is up.
    pub async fn wait_for_network(&self, deadline: Duration) -> bool {
        let url = format!("{}/health", self.endpoints.lens);
        let started = Instant::now();
        loop {
            match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
                Ok(_) => return true,
                Err(e) => {
                    if started.elapsed() >= deadline {
                        tracing::error!("network bring-up failed: {e}");
                        return false;
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}

// ── Scheduler seam ──────────────────────────────────────────────────

/// One refresh cycle, abstracted so the scheduler loop can be driven in
/// tests without a network.
pub trait StatusSource {
    fn refresh_cycle(
        &mut self,
        store: &mut StatusStore,
    ) -> impl std::future::Future<Output = FetchOutcome>;
}

/// Grid-mode adapter: full health probes plus the stats merge.
pub struct GridSource<'a>(pub &'a Fetcher);

impl StatusSource for GridSource<'_> {
    async fn refresh_cycle(&mut self, store: &mut StatusStore) -> FetchOutcome {
        self.0.refresh(store).await
    }
}

/// Bubble-mode adapter: the coarse status overview only.
pub struct OverviewSource<'a>(pub &'a Fetcher);

impl StatusSource for OverviewSource<'_> {
    async fn refresh_cycle(&mut self, store: &mut StatusStore) -> FetchOutcome {
        self.0.refresh_overview(store).await
    }
}

// ── Tests ───────────────────────────────────────────────────────────
