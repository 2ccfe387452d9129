//! Cumulative exporter bookkeeping: `total_scrapes`, `json_parse_failures`.
//!
//! Created once at startup and shared by every per-scrape collector, so
//! the counters keep climbing across requests instead of restarting at
//! zero each time. Both are atomics. `up` describes a single cycle and
//! lives on the collector instead.

use prometheus::IntCounter;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;

use crate::definitions::opts;

/// Process-wide scrape counters.
#[derive(Clone, Debug)]
pub struct ScrapeCounters {
    total_scrapes: IntCounter,
    json_parse_failures: IntCounter,
}

impl ScrapeCounters {
    pub fn new(namespace: &str) -> prometheus::Result<Self> {
        Ok(Self {
            total_scrapes: IntCounter::with_opts(opts(
                namespace,
                "total_scrapes",
                "Current total cluster health scrapes.",
            ))?,
            json_parse_failures: IntCounter::with_opts(opts(
                namespace,
                "json_parse_failures",
                "Number of errors while parsing JSON.",
            ))?,
        })
    }

    pub(crate) fn scrape_started(&self) {
        self.total_scrapes.inc();
    }

    pub(crate) fn scrape_failed(&self, decode: bool) {
        if decode {
            self.json_parse_failures.inc();
        }
    }

    pub fn total_scrapes(&self) -> u64 {
        self.total_scrapes.get()
    }

    pub fn json_parse_failures(&self) -> u64 {
        self.json_parse_failures.get()
    }

    pub(crate) fn descs(&self) -> Vec<&Desc> {
        let mut descs = self.total_scrapes.desc();
        descs.extend(self.json_parse_failures.desc());
        descs
    }

    pub(crate) fn families(&self) -> Vec<MetricFamily> {
        let mut families = self.total_scrapes.collect();
        families.extend(self.json_parse_failures.collect());
        families
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let counters = ScrapeCounters::new("test").unwrap();
        assert_eq!(counters.total_scrapes(), 0);
        assert_eq!(counters.json_parse_failures(), 0);
    }

    #[test]
    fn decode_failure_counts_parse_failure() {
        let counters = ScrapeCounters::new("test").unwrap();
        counters.scrape_started();

        counters.scrape_started();
        counters.scrape_failed(true);
        assert_eq!(counters.json_parse_failures(), 1);

        counters.scrape_started();
        counters.scrape_failed(false);
        assert_eq!(counters.json_parse_failures(), 1);
        assert_eq!(counters.total_scrapes(), 3);
    }

    #[test]
    fn clones_share_values() {
        let counters = ScrapeCounters::new("test").unwrap();
        let other = counters.clone();
        other.scrape_started();
        assert_eq!(counters.total_scrapes(), 1);
    }

    #[test]
    fn names_and_families() {
        let counters = ScrapeCounters::new("elasticsearch").unwrap();
        let names: Vec<_> = counters.descs().iter().map(|d| d.fq_name.clone()).collect();
        assert_eq!(
            names,
            vec![
                "elasticsearch_cluster_health_total_scrapes",
                "elasticsearch_cluster_health_json_parse_failures",
            ]
        );
        assert_eq!(counters.families().len(), 2);
    }
}
