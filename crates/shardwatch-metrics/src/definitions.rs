//! Static mapping from health fields to metrics.

use prometheus::{GaugeVec, Opts};

use shardwatch_health::{ClusterHealth, STATUS_COLORS};

/// Subsystem segment of every metric name.
pub const SUBSYSTEM: &str = "cluster_health";

/// Label carried by every field and status sample.
pub const CLUSTER_LABEL: &str = "cluster";

/// Extra label on the status metric.
pub const COLOR_LABEL: &str = "color";

/// One gauge derived from a single health field.
pub struct FieldMetric {
    pub name: &'static str,
    pub help: &'static str,
    pub value: fn(&ClusterHealth) -> f64,
}

impl FieldMetric {
    /// Build the gauge family for this field under `namespace`.
    pub fn gauge_vec(&self, namespace: &str) -> prometheus::Result<GaugeVec> {
        GaugeVec::new(opts(namespace, self.name, self.help), &[CLUSTER_LABEL])
    }
}

/// The one-hot status gauge.
pub struct StatusMetric {
    pub name: &'static str,
    pub help: &'static str,
    pub colors: [&'static str; 3],
}

impl StatusMetric {
    pub fn gauge_vec(&self, namespace: &str) -> prometheus::Result<GaugeVec> {
        GaugeVec::new(opts(namespace, self.name, self.help), &[CLUSTER_LABEL, COLOR_LABEL])
    }

    /// 1 when the snapshot reports `color`, else 0.
    pub fn value(&self, health: &ClusterHealth, color: &str) -> f64 {
        if health.is_status(color) { 1.0 } else { 0.0 }
    }
}

pub(crate) fn opts(namespace: &str, name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(namespace).subsystem(SUBSYSTEM)
}

pub static STATUS_METRIC: StatusMetric = StatusMetric {
    name: "status",
    help: "Whether all primary and replica shards are allocated.",
    colors: STATUS_COLORS,
};

pub static FIELD_METRICS: [FieldMetric; 12] = [
    FieldMetric {
        name: "active_primary_shards",
        help: "The number of primary shards in your cluster. This is an aggregate total across all indices.",
        value: |h| h.active_primary_shards as f64,
    },
    FieldMetric {
        name: "active_shards",
        help: "Aggregate total of all shards across all indices, which includes replica shards.",
        value: |h| h.active_shards as f64,
    },
    FieldMetric {
        name: "delayed_unassigned_shards",
        help: "Shards delayed to reduce reallocation overhead.",
        value: |h| h.delayed_unassigned_shards as f64,
    },
    FieldMetric {
        name: "initializing_shards",
        help: "Count of shards that are being freshly created.",
        value: |h| h.initializing_shards as f64,
    },
    FieldMetric {
        name: "number_of_data_nodes",
        help: "Number of data nodes in the cluster.",
        value: |h| h.number_of_data_nodes as f64,
    },
    FieldMetric {
        name: "number_of_in_flight_fetch",
        help: "The number of ongoing shard info requests.",
        value: |h| h.number_of_in_flight_fetch as f64,
    },
    FieldMetric {
        name: "task_max_waiting_in_queue_millis",
        help: "Tasks max time waiting in queue.",
        value: |h| h.task_max_waiting_in_queue_millis as f64,
    },
    FieldMetric {
        name: "number_of_nodes",
        help: "Number of nodes in the cluster.",
        value: |h| h.number_of_nodes as f64,
    },
    FieldMetric {
        name: "number_of_pending_tasks",
        help: "Cluster level changes which have not yet been executed.",
        value: |h| h.number_of_pending_tasks as f64,
    },
    FieldMetric {
        name: "relocating_shards",
        help: "The number of shards that are currently moving from one node to another node.",
        value: |h| h.relocating_shards as f64,
    },
    FieldMetric {
        name: "unassigned_shards",
        help: "The number of shards that exist in the cluster state, but cannot be found in the cluster itself.",
        value: |h| h.unassigned_shards as f64,
    },
    FieldMetric {
        name: "active_shards_percent_as_number",
        help: "Percentage of active shards in the cluster.",
        value: |h| h.active_shards_percent_as_number,
    },
];
