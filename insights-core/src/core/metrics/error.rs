use std::fmt::{Display, Formatter};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// The specialized insights result.
pub type Result<T> = std::result::Result<T, InsightsError>;

/// Represents the errors which can occur while fetching or mapping insights metrics.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InsightsError {
    /// No metrics have been requested.
    #[error("specify the metrics you want to fetch")]
    MetricsNotSpecified,
    /// The response contains key "data", but the associated array is empty.
    /// This happens when the object has too small of an audience, or when the access token
    /// lacks the permissions for the metric.
    #[error("received empty data for metric {0}")]
    EmptyData(String),
    /// The record doesn't define a field for one of the fetched metrics.
    #[error("can't find a field for metric '{metric}', expected field name '{field}'")]
    MissingField { metric: String, field: String },
    /// The period was omitted for a metric which doesn't have exactly one period.
    #[error("period can only be omitted for metrics with one period, {metric} has {periods}")]
    AmbiguousPeriod { metric: String, periods: usize },
    /// The requested period is not present on the metric.
    #[error("metric {metric} has no values for period {period}")]
    UnknownPeriod { metric: String, period: String },
    /// The requested sample index is outside the available samples.
    #[error("sample index {index} is out of range for {metric} ({period}), {len} samples available")]
    IndexOutOfRange {
        metric: String,
        period: String,
        index: isize,
        len: usize,
    },
    /// The Graph API responded with an error body.
    #[error("graph api error: {0}")]
    Api(ApiError),
    /// The graph id of the record could not be resolved.
    #[error("unable to resolve the graph id of {0}")]
    GraphIdUnavailable(String),
    /// The outbound request failed.
    #[error("insights request failed, {0}")]
    Request(String),
    /// The response could not be parsed.
    #[error("failed to parse insights response, {0}")]
    Parsing(String),
    /// The metrics provider could not be created.
    #[error("failed to create new instance: {0}")]
    Creation(String),
}

/// An error object returned by the Graph API, kept verbatim in [ApiError::raw].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub message: String,
    pub error_type: Option<String>,
    pub code: Option<i64>,
    pub error_subcode: Option<i64>,
    pub fbtrace_id: Option<String>,
    /// The complete response body which contained the error.
    pub raw: Value,
}

#[derive(Debug, Deserialize)]
struct ApiErrorObject {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<i64>,
    error_subcode: Option<i64>,
    fbtrace_id: Option<String>,
}

impl ApiError {
    /// Create a new [ApiError] from a response body containing the `error` key.
    pub fn from_body(body: Value) -> Self {
        let object = body
            .get("error")
            .cloned()
            .and_then(|e| serde_json::from_value::<ApiErrorObject>(e).ok());

        match object {
            Some(object) => Self {
                message: object.message.unwrap_or_default(),
                error_type: object.error_type,
                code: object.code,
                error_subcode: object.error_subcode,
                fbtrace_id: object.fbtrace_id,
                raw: body,
            },
            None => Self {
                message: body
                    .get("error")
                    .map(|e| e.to_string())
                    .unwrap_or_default(),
                error_type: None,
                code: None,
                error_subcode: None,
                fbtrace_id: None,
                raw: body,
            },
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(error_type) = &self.error_type {
            write!(f, " (type: {}", error_type)?;
            if let Some(code) = self.code {
                write!(f, ", code: {}", code)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
