use std::fmt::Debug;

use crate::core::metrics::{InsightsError, Result};
use crate::core::records::FieldValue;

/// An object known by the Graph API, such as a page or a post.
pub trait GraphObject {
    /// The Facebook id of the object.
    fn graph_id(&self) -> &str;
}

/// The location of the graph id of a record.
#[derive(Clone, Copy)]
pub enum GraphObjectRef<'a> {
    /// The record stores the graph id itself.
    Own(&'a str),
    /// The graph id is stored on a related object, [None] when the relation hasn't been set.
    Related(Option<&'a dyn GraphObject>),
}

/// A record which stores insights metrics within its fields.
///
/// The record declares which metrics it collects by default and which fields it has.
/// Each metric is stored within the field named after the metric, minus the object prefix
/// when [InsightsRecord::REMOVE_PREFIX] is set.
pub trait InsightsRecord: Debug + Send {
    /// The name of the record type.
    const NAME: &'static str;
    /// The metrics which are fetched when no explicit metrics are given.
    const METRICS: &'static [&'static str];
    /// The fields of the record which can store a metric.
    const FIELDS: &'static [&'static str];
    /// Remove the object prefix (`page_`, `post_`, `domain_`) from the metric name to get the field name.
    const REMOVE_PREFIX: bool = true;

    /// Get the location of the graph id of the object for which metrics are collected.
    fn graph_object(&self) -> GraphObjectRef<'_>;

    /// Store the value within the given field.
    /// The field is always one of [InsightsRecord::FIELDS].
    fn set_field(&mut self, field: &str, value: FieldValue);
}

/// Get the graph id of the object for which metrics are to be collected.
pub fn resolve_graph_id<R: InsightsRecord>(record: &R) -> Result<String> {
    match record.graph_object() {
        GraphObjectRef::Own(graph_id) => Ok(graph_id.to_string()),
        GraphObjectRef::Related(Some(related)) => Ok(related.graph_id().to_string()),
        GraphObjectRef::Related(None) => Err(InsightsError::GraphIdUnavailable(R::NAME.to_string())),
    }
}
