use std::fmt::{Display, Formatter};

use log::{debug, info, trace};

use crate::core::metrics::{InsightsError, MetricsProvider, Result};
use crate::core::records::{field_name, field_value, resolve_graph_id, InsightsRecord, InsightsSchema};

/// Collects insights metrics into the fields of a record.
///
/// The graph id of the record is resolved once, when the [Insights] is created.
#[derive(Debug)]
pub struct Insights<R: InsightsRecord> {
    record: R,
    graph_id: String,
    schema: InsightsSchema,
}

impl<R: InsightsRecord> Insights<R> {
    /// Create a new [Insights] for the given record.
    ///
    /// It returns an error when the graph id can't be resolved,
    /// or when the record lacks a field for one of its default metrics.
    pub fn new(record: R) -> Result<Self> {
        let schema = InsightsSchema::of::<R>()?;
        let graph_id = resolve_graph_id(&record)?;

        trace!("Created insights of {} for graph id {}", R::NAME, graph_id);
        Ok(Self {
            record,
            graph_id,
            schema,
        })
    }

    /// The graph id of the object for which metrics are collected.
    pub fn graph_id(&self) -> &str {
        self.graph_id.as_str()
    }

    pub fn schema(&self) -> &InsightsSchema {
        &self.schema
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut R {
        &mut self.record
    }

    pub fn into_inner(self) -> R {
        self.record
    }

    /// Fetch metrics and put them into the corresponding fields of the record.
    ///
    /// When `metrics` is [None] or empty, the default metrics of the record are fetched.
    /// Fetching a subset can be used to refresh some metrics more often than others.
    ///
    /// Fields are assigned one metric at a time, so on failure the fields of the metrics
    /// processed before the failing one keep their new values.
    /// The record is not persisted.
    pub async fn fetch(&mut self, provider: &dyn MetricsProvider, metrics: Option<&[String]>) -> Result<()> {
        let metrics = match metrics {
            Some(metrics) if !metrics.is_empty() => metrics,
            _ => self.schema.default_metrics(),
        };
        if metrics.is_empty() {
            return Err(InsightsError::MetricsNotSpecified);
        }

        debug!("Fetching {} metrics for {}", metrics.len(), self);
        let fetched_metrics = provider.fetch_metrics(self.graph_id.as_str(), metrics).await?;

        for metric in fetched_metrics.values() {
            let value = field_value(metric)?;
            let field = self.schema.field_for(metric.name())?;

            trace!("Storing metric {} into field {} as {:?}", metric.name(), field, value);
            self.record.set_field(field, value);
        }

        info!("Fetched a total of {} metrics for {}", fetched_metrics.len(), self);
        Ok(())
    }

    /// Get the name of the field which should store the given metric name.
    pub fn field_name<'a>(&self, metric: &'a str) -> &'a str {
        field_name(metric, R::REMOVE_PREFIX)
    }
}

impl<R: InsightsRecord> Display for Insights<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}: {}>", R::NAME, self.graph_id)
    }
}
