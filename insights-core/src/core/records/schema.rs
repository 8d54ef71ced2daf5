use crate::core::metrics::{InsightsError, Result};
use crate::core::records::{field_name, InsightsRecord};

/// The mapping between the metrics and the fields of a record type.
///
/// The default metrics are validated when the schema is created,
/// so a record type which lacks a field for one of its default metrics is rejected up front.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightsSchema {
    record: &'static str,
    metrics: Vec<String>,
    fields: &'static [&'static str],
    remove_prefix: bool,
}

impl InsightsSchema {
    /// Create the schema of the given record type.
    pub fn of<R: InsightsRecord>() -> Result<Self> {
        Self::new(R::NAME, R::METRICS, R::FIELDS, R::REMOVE_PREFIX)
    }

    pub fn new(
        record: &'static str,
        metrics: &[&str],
        fields: &'static [&'static str],
        remove_prefix: bool,
    ) -> Result<Self> {
        let schema = Self {
            record,
            metrics: metrics.iter().map(|e| e.to_string()).collect(),
            fields,
            remove_prefix,
        };

        for metric in schema.metrics.iter() {
            schema.field_for(metric)?;
        }

        Ok(schema)
    }

    /// The name of the record type.
    pub fn record(&self) -> &str {
        self.record
    }

    /// The metrics which are fetched by default.
    pub fn default_metrics(&self) -> &[String] {
        self.metrics.as_slice()
    }

    pub fn remove_prefix(&self) -> bool {
        self.remove_prefix
    }

    /// Get the field which stores the given metric.
    ///
    /// It returns [InsightsError::MissingField] when the record has no such field.
    pub fn field_for(&self, metric: &str) -> Result<&'static str> {
        let name = field_name(metric, self.remove_prefix);

        self.fields
            .iter()
            .find(|field| **field == name)
            .copied()
            .ok_or_else(|| InsightsError::MissingField {
                metric: metric.to_string(),
                field: name.to_string(),
            })
    }
}
