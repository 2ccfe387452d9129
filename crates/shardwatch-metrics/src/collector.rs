//! Cluster health collector — one fetch per collect cycle.
//!
//! Implements the registry pull protocol: `desc()` lists everything the
//! collector can emit, `collect()` fetches a snapshot and emits samples.
//! A failed fetch never surfaces as an error; it degrades the scrape to
//! the three bookkeeping metrics with `up` at 0.
//!
//! `up` belongs to the collector, not to the shared counters: it reports
//! this cycle only, so concurrent scrapes cannot see each other's value.

use std::sync::Arc;

use prometheus::{GaugeVec, IntGauge};
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use shardwatch_health::{ClusterHealth, FetchError, HealthFetcher, HealthSource};

use crate::counters::ScrapeCounters;
use crate::definitions::{FIELD_METRICS, STATUS_METRIC, opts};

/// What a single collect cycle observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// Snapshot fetched; field and status samples emitted.
    Healthy { cluster: String },
    /// Fetch failed; only bookkeeping emitted.
    Unreachable,
}

/// Collector bound to one health source for the lifetime of a registry.
///
/// `collect()` is synchronous, as the registry requires, and drives the
/// async fetch on `runtime`. Call the registry from a blocking thread
/// (e.g. `spawn_blocking`), never from inside an async task.
pub struct HealthCollector<S = HealthFetcher> {
    source: Arc<S>,
    counters: ScrapeCounters,
    runtime: Handle,
    up: IntGauge,
    /// Parallel to `FIELD_METRICS`.
    fields: Vec<GaugeVec>,
    status: GaugeVec,
}

impl<S: HealthSource> HealthCollector<S> {
    /// Create a collector. Metric families are built from the static table
    /// under `namespace`; `counters` are shared with other collectors.
    pub fn new(
        source: Arc<S>,
        counters: ScrapeCounters,
        namespace: &str,
        runtime: Handle,
    ) -> prometheus::Result<Self> {
        let fields = FIELD_METRICS
            .iter()
            .map(|metric| metric.gauge_vec(namespace))
            .collect::<prometheus::Result<Vec<_>>>()?;
        let status = STATUS_METRIC.gauge_vec(namespace)?;
        let up = IntGauge::with_opts(opts(
            namespace,
            "up",
            "Was the last scrape of the cluster health endpoint successful.",
        ))?;

        Ok(Self {
            source,
            counters,
            runtime,
            up,
            fields,
            status,
        })
    }

    /// Run one cycle: count it, fetch, and append the resulting samples.
    pub fn scrape(&self, families: &mut Vec<MetricFamily>) -> ScrapeOutcome {
        self.counters.scrape_started();

        let outcome = match self.runtime.block_on(self.source.fetch()) {
            Ok(health) => {
                self.up.set(1);
                families.extend(self.emit(&health));
                ScrapeOutcome::Healthy {
                    cluster: health.cluster_name,
                }
            }
            Err(err) => {
                self.record_failure(&err);
                ScrapeOutcome::Unreachable
            }
        };

        families.extend(self.up.collect());
        families.extend(self.counters.families());
        outcome
    }

    /// Field and status samples for one snapshot.
    fn emit(&self, health: &ClusterHealth) -> Vec<MetricFamily> {
        let cluster = health.cluster_name.as_str();
        let mut families = Vec::with_capacity(self.fields.len() + 1);

        for (metric, gauge) in FIELD_METRICS.iter().zip(&self.fields) {
            gauge.reset();
            gauge.with_label_values(&[cluster]).set((metric.value)(health));
            families.extend(gauge.collect());
        }

        self.status.reset();
        for color in STATUS_METRIC.colors {
            self.status
                .with_label_values(&[cluster, color])
                .set(STATUS_METRIC.value(health, color));
        }
        families.extend(self.status.collect());

        families
    }

    fn record_failure(&self, err: &FetchError) {
        self.up.set(0);
        self.counters.scrape_failed(err.is_decode());
        warn!(
            error = %err,
            kind = err.kind(),
            "failed to fetch and decode cluster health"
        );
    }
}

impl<S: HealthSource> Collector for HealthCollector<S> {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs: Vec<&Desc> = self.fields.iter().flat_map(|g| g.desc()).collect();
        descs.extend(self.status.desc());
        descs.extend(self.up.desc());
        descs.extend(self.counters.descs());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut families = Vec::with_capacity(self.fields.len() + 4);
        let outcome = self.scrape(&mut families);
        debug!(?outcome, families = families.len(), "cluster health collected");
        families
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::time::Duration;

    use prometheus::proto::MetricType;
    use shardwatch_health::ClientError;

    use super::*;

    struct Canned(fn() -> Result<ClusterHealth, FetchError>);

    impl HealthSource for Canned {
        fn fetch(&self) -> impl Future<Output = Result<ClusterHealth, FetchError>> + Send {
            std::future::ready((self.0)())
        }
    }

    fn prod_yellow() -> Result<ClusterHealth, FetchError> {
        Ok(ClusterHealth {
            cluster_name: "prod".to_string(),
            status: "yellow".to_string(),
            active_primary_shards: 12,
            active_shards: 24,
            number_of_nodes: 3,
            ..Default::default()
        })
    }

    fn unknown_status() -> Result<ClusterHealth, FetchError> {
        Ok(ClusterHealth {
            cluster_name: "lab".to_string(),
            status: "unknown".to_string(),
            ..Default::default()
        })
    }

    fn transport_error() -> Result<ClusterHealth, FetchError> {
        Err(FetchError::Transport {
            url: "http://localhost:9200/_cluster/health".to_string(),
            source: ClientError::Timeout(Duration::from_secs(5)),
        })
    }

    fn status_503() -> Result<ClusterHealth, FetchError> {
        Err(FetchError::UnexpectedStatus {
            url: "http://localhost:9200/_cluster/health".to_string(),
            status: http::StatusCode::SERVICE_UNAVAILABLE,
        })
    }

    fn garbage_body() -> Result<ClusterHealth, FetchError> {
        Err(FetchError::Decode {
            url: "http://localhost:9200/_cluster/health".to_string(),
            source: serde_json::from_str::<ClusterHealth>("{oops").unwrap_err(),
        })
    }

    fn truncated_body() -> Result<ClusterHealth, FetchError> {
        Err(FetchError::Body {
            url: "http://localhost:9200/_cluster/health".to_string(),
            source: ClientError::Timeout(Duration::from_secs(5)),
        })
    }

    struct Harness {
        rt: tokio::runtime::Runtime,
        counters: ScrapeCounters,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                rt: tokio::runtime::Runtime::new().unwrap(),
                counters: ScrapeCounters::new("elasticsearch").unwrap(),
            }
        }

        fn collector(&self, source: fn() -> Result<ClusterHealth, FetchError>) -> HealthCollector<Canned> {
            HealthCollector::new(
                Arc::new(Canned(source)),
                self.counters.clone(),
                "elasticsearch",
                self.rt.handle().clone(),
            )
            .unwrap()
        }
    }

    fn family<'a>(families: &'a [MetricFamily], field: &str) -> Option<&'a MetricFamily> {
        let name = format!("elasticsearch_cluster_health_{field}");
        families.iter().find(|f| f.get_name() == name)
    }

    fn gauge_samples(families: &[MetricFamily], field: &str) -> Vec<(Vec<(String, String)>, f64)> {
        family(families, field)
            .map(|f| {
                f.get_metric()
                    .iter()
                    .map(|m| {
                        let labels = m
                            .get_label()
                            .iter()
                            .map(|l| (l.get_name().to_string(), l.get_value().to_string()))
                            .collect();
                        (labels, m.get_gauge().get_value())
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn field_sample_count(families: &[MetricFamily]) -> usize {
        FIELD_METRICS
            .iter()
            .map(|m| gauge_samples(families, m.name).len())
            .sum()
    }

    fn status_of(families: &[MetricFamily], color: &str) -> f64 {
        gauge_samples(families, "status")
            .into_iter()
            .find(|(labels, _)| labels.iter().any(|(k, v)| k == "color" && v == color))
            .map(|(_, v)| v)
            .unwrap()
    }

    fn up_of(families: &[MetricFamily]) -> f64 {
        family(families, "up").unwrap().get_metric()[0].get_gauge().get_value()
    }

    #[test]
    fn describe_is_stable_and_complete() {
        let h = Harness::new();
        let ok = h.collector(prod_yellow);
        let failing = h.collector(transport_error);

        // Fields, status, up, then the two shared counters.
        assert_eq!(ok.desc().len(), FIELD_METRICS.len() + 1 + 1 + 2);
        assert_eq!(failing.desc().len(), ok.desc().len());
        // Describing never fetches.
        assert_eq!(h.counters.total_scrapes(), 0);
    }

    #[test]
    fn successful_scrape_emits_every_field() {
        let h = Harness::new();
        let families = h.collector(prod_yellow).collect();

        assert_eq!(field_sample_count(&families), FIELD_METRICS.len());
        for metric in FIELD_METRICS.iter() {
            let samples = gauge_samples(&families, metric.name);
            assert_eq!(samples.len(), 1, "{}", metric.name);
            assert_eq!(samples[0].0, vec![("cluster".to_string(), "prod".to_string())]);
        }
        assert_eq!(gauge_samples(&families, "active_primary_shards")[0].1, 12.0);
        assert_eq!(gauge_samples(&families, "active_shards")[0].1, 24.0);
        assert_eq!(up_of(&families), 1.0);
    }

    #[test]
    fn status_is_one_hot_over_colors() {
        let h = Harness::new();
        let families = h.collector(prod_yellow).collect();

        let status = gauge_samples(&families, "status");
        assert_eq!(status.len(), 3);
        assert!(status.iter().all(|(labels, _)| labels.contains(&("cluster".to_string(), "prod".to_string()))));
        assert_eq!(status_of(&families, "green"), 0.0);
        assert_eq!(status_of(&families, "yellow"), 1.0);
        assert_eq!(status_of(&families, "red"), 0.0);
        assert_eq!(family(&families, "status").unwrap().get_field_type(), MetricType::GAUGE);
    }

    #[test]
    fn unknown_status_is_all_zero() {
        let h = Harness::new();
        let families = h.collector(unknown_status).collect();

        let status = gauge_samples(&families, "status");
        assert_eq!(status.len(), 3);
        assert!(status.iter().all(|(_, v)| *v == 0.0));
        assert_eq!(up_of(&families), 1.0);
    }

    #[test]
    fn failed_scrape_emits_only_bookkeeping() {
        let sources: [fn() -> Result<ClusterHealth, FetchError>; 4] =
            [transport_error, status_503, truncated_body, garbage_body];
        for source in sources {
            let h = Harness::new();
            let collector = h.collector(source);

            let mut families = Vec::new();
            assert_eq!(collector.scrape(&mut families), ScrapeOutcome::Unreachable);

            assert_eq!(field_sample_count(&families), 0);
            assert!(family(&families, "status").is_none());
            assert_eq!(families.len(), 3);
            assert_eq!(up_of(&families), 0.0);
            assert_eq!(h.counters.total_scrapes(), 1);
        }
    }

    #[test]
    fn parse_failures_count_only_decode_errors() {
        let h = Harness::new();
        h.collector(transport_error).collect();
        h.collector(status_503).collect();
        assert_eq!(h.counters.json_parse_failures(), 0);

        h.collector(garbage_body).collect();
        assert_eq!(h.counters.json_parse_failures(), 1);
        h.collector(prod_yellow).collect();
        assert_eq!(h.counters.json_parse_failures(), 1);
    }

    #[test]
    fn unreadable_body_counts_parse_failure() {
        let h = Harness::new();
        let families = h.collector(truncated_body).collect();
        assert_eq!(up_of(&families), 0.0);
        assert_eq!(h.counters.json_parse_failures(), 1);
    }

    #[test]
    fn total_scrapes_counts_every_collect() {
        let h = Harness::new();
        let collector = h.collector(prod_yellow);
        collector.collect();
        collector.collect();
        h.collector(status_503).collect();
        assert_eq!(h.counters.total_scrapes(), 3);
    }

    #[test]
    fn up_follows_latest_outcome() {
        let h = Harness::new();
        assert_eq!(up_of(&h.collector(prod_yellow).collect()), 1.0);
        assert_eq!(up_of(&h.collector(status_503).collect()), 0.0);
        assert_eq!(up_of(&h.collector(unknown_status).collect()), 1.0);
    }

    #[test]
    fn up_is_per_collector() {
        let h = Harness::new();
        let ok = h.collector(prod_yellow);
        let failing = h.collector(transport_error);

        let healthy = ok.collect();
        let broken = failing.collect();
        assert_eq!(up_of(&healthy), 1.0);
        assert_eq!(up_of(&broken), 0.0);
        assert_eq!(up_of(&ok.collect()), 1.0);
    }

    #[test]
    fn concurrent_mixed_scrapes_report_their_own_up() {
        const THREADS: usize = 4;
        const CYCLES: usize = 2_000;

        let h = Harness::new();
        let inconsistent = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..THREADS)
                .map(|i| {
                    let h = &h;
                    scope.spawn(move || {
                        let mut bad = 0;
                        for _ in 0..CYCLES {
                            let source: fn() -> Result<ClusterHealth, FetchError> =
                                if i % 2 == 0 { prod_yellow } else { transport_error };
                            let families = h.collector(source).collect();
                            let has_status = family(&families, "status").is_some();
                            if (up_of(&families) == 1.0) != has_status {
                                bad += 1;
                            }
                        }
                        bad
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).sum::<usize>()
        });

        assert_eq!(inconsistent, 0);
        assert_eq!(h.counters.total_scrapes(), (THREADS * CYCLES) as u64);
        assert_eq!(h.counters.json_parse_failures(), 0);
    }

    #[test]
    fn healthy_outcome_names_cluster() {
        let h = Harness::new();
        let mut families = Vec::new();
        let outcome = h.collector(prod_yellow).scrape(&mut families);
        assert_eq!(
            outcome,
            ScrapeOutcome::Healthy {
                cluster: "prod".to_string()
            }
        );
    }

    #[test]
    fn repeated_collect_does_not_accumulate_labels() {
        let h = Harness::new();
        let collector = h.collector(prod_yellow);
        collector.collect();
        let families = collector.collect();
        assert_eq!(field_sample_count(&families), FIELD_METRICS.len());
        assert_eq!(gauge_samples(&families, "status").len(), 3);
    }
}
