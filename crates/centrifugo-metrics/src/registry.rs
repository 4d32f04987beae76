//! Collector registry.
//!
//! Collectors declare their descriptors up front via [`Collector::describe`];
//! the registry validates them on registration and invokes
//! [`Collector::collect`] once per scrape.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::descriptor::{MetricDescriptor, MetricSample};
use crate::prometheus;

/// Boxed future returned by [`Collector::collect`].
pub type CollectFuture<'a> = Pin<Box<dyn Future<Output = Vec<MetricSample>> + Send + 'a>>;

/// A pull-based source of metric samples.
pub trait Collector: Send + Sync {
    /// Every descriptor this collector can emit. Must not change between calls.
    fn describe(&self) -> Vec<&'static MetricDescriptor>;

    /// Produce the samples for one scrape. `timeout` is the scrape's
    /// remaining budget, if the caller knows it.
    fn collect(&self, timeout: Option<Duration>) -> CollectFuture<'_>;
}

/// Errors returned when a collector is rejected at registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid metric name: {0}")]
    InvalidName(String),

    #[error("invalid label name {label:?} on metric {metric}")]
    InvalidLabel { metric: String, label: String },

    #[error("duplicate metric name: {0}")]
    Duplicate(String),

    #[error("name pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// All samples of one descriptor gathered in a scrape.
#[derive(Debug)]
pub struct MetricFamily {
    pub descriptor: &'static MetricDescriptor,
    pub samples: Vec<MetricSample>,
}

/// Holds registered collectors and gathers them on demand.
#[derive(Default)]
pub struct Registry {
    collectors: Vec<Box<dyn Collector>>,
    names: HashSet<&'static str>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collector after validating its descriptors.
    ///
    /// On error the registry is left unchanged.
    pub fn register<C: Collector + 'static>(&mut self, collector: C) -> Result<(), RegistryError> {
        let metric_re = Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$")?;
        let label_re = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$")?;

        let descriptors = collector.describe();
        let mut seen = HashSet::with_capacity(descriptors.len());

        for desc in &descriptors {
            if !metric_re.is_match(desc.name) {
                return Err(RegistryError::InvalidName(desc.name.to_string()));
            }
            for label in desc.labels {
                // Names starting with `__` are reserved by Prometheus.
                if !label_re.is_match(label) || label.starts_with("__") {
                    return Err(RegistryError::InvalidLabel {
                        metric: desc.name.to_string(),
                        label: label.to_string(),
                    });
                }
            }
            if self.names.contains(desc.name) || !seen.insert(desc.name) {
                return Err(RegistryError::Duplicate(desc.name.to_string()));
            }
        }

        self.names.extend(seen);
        self.collectors.push(Box::new(collector));
        debug!(metrics = descriptors.len(), "collector registered");
        Ok(())
    }

    /// Descriptors of all registered collectors, in registration order.
    pub fn descriptors(&self) -> Vec<&'static MetricDescriptor> {
        self.collectors.iter().flat_map(|c| c.describe()).collect()
    }

    /// Number of registered collectors.
    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Run every collector once and group the samples by descriptor.
    ///
    /// Families follow describe order. Samples for undeclared descriptors or
    /// with the wrong number of label values are dropped.
    pub async fn gather(&self, timeout: Option<Duration>) -> Vec<MetricFamily> {
        let mut families = Vec::new();

        for collector in &self.collectors {
            let mut collected: Vec<MetricFamily> = collector
                .describe()
                .into_iter()
                .map(|descriptor| MetricFamily {
                    descriptor,
                    samples: Vec::new(),
                })
                .collect();

            for sample in collector.collect(timeout).await {
                let Some(family) = collected
                    .iter_mut()
                    .find(|f| f.descriptor.name == sample.name())
                else {
                    warn!(metric = sample.name(), "dropping sample for undeclared metric");
                    continue;
                };
                if sample.label_values.len() != family.descriptor.labels.len() {
                    warn!(
                        metric = sample.name(),
                        expected = family.descriptor.labels.len(),
                        got = sample.label_values.len(),
                        "dropping sample with mismatched labels"
                    );
                    continue;
                }
                family.samples.push(sample);
            }

            families.extend(collected);
        }

        families
    }

    /// Gather and render in the Prometheus text format.
    pub async fn render(&self, timeout: Option<Duration>) -> String {
        prometheus::render(&self.gather(timeout).await)
    }
}
