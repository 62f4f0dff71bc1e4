use std::collections::HashMap;

use prometheus::{
    core::Desc,
    proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType},
};

use crate::plex::ServerIdentity;

pub const SERVER_TYPE: &str = "plex";

/// Labels attached to every exported series.
pub const SERVER_LABELS: [&str; 3] = ["server_type", "server", "server_id"];

pub type Labels = Vec<(&'static str, String)>;

pub fn server_labels(identity: &ServerIdentity) -> Labels {
    vec![
        ("server_type", SERVER_TYPE.to_string()),
        ("server", identity.name.clone()),
        ("server_id", identity.id.clone()),
    ]
}

pub fn desc(name: &str, help: &str, extra_labels: &[&str]) -> prometheus::Result<Desc> {
    let labels = SERVER_LABELS
        .iter()
        .chain(extra_labels)
        .map(|l| l.to_string())
        .collect();
    Desc::new(name.to_string(), help.to_string(), labels, HashMap::new())
}

fn label_pairs(labels: Labels) -> Vec<LabelPair> {
    let mut pairs: Vec<LabelPair> = labels
        .into_iter()
        .map(|(name, value)| {
            let mut lp = LabelPair::default();
            lp.set_name(name.to_string());
            lp.set_value(value);
            lp
        })
        .collect();
    // Registry::gather orders series assuming sorted label pairs.
    pairs.sort_by(|a, b| a.get_name().cmp(b.get_name()));
    pairs
}

pub fn gauge(value: f64, labels: Labels) -> Metric {
    let mut metric = Metric::default();
    metric.set_label(label_pairs(labels).into());
    let mut gauge = Gauge::default();
    gauge.set_value(value);
    metric.set_gauge(gauge);
    metric
}

pub fn counter(value: f64, labels: Labels) -> Metric {
    let mut metric = Metric::default();
    metric.set_label(label_pairs(labels).into());
    let mut counter = Counter::default();
    counter.set_value(value);
    metric.set_counter(counter);
    metric
}

pub fn family(name: &str, help: &str, kind: MetricType, metrics: Vec<Metric>) -> MetricFamily {
    let mut family = MetricFamily::default();
    family.set_name(name.to_string());
    family.set_help(help.to_string());
    family.set_field_type(kind);
    for metric in metrics {
        family.mut_metric().push(metric);
    }
    family
}
