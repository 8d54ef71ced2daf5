use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::core::metrics::{Metric, Result};

/// The fetched metrics of an object, keyed by metric name.
pub type Metrics = BTreeMap<String, Metric>;

/// The metrics provider is responsible for retrieving the insights [Metric]'s of a Graph API object.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MetricsProvider: Debug + Send + Sync {
    /// Fetch the given metrics for the object with the given graph id.
    ///
    /// It returns one [Metric] per distinct metric name present in the response,
    /// or [crate::core::metrics::InsightsError::MetricsNotSpecified] when `metrics` is empty.
    async fn fetch_metrics(&self, graph_id: &str, metrics: &[String]) -> Result<Metrics>;
}
