use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::metrics::{InsightsError, Result};

/// The index of the most recent sample within a period.
pub const LATEST_SAMPLE: isize = -1;

const END_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// The samples of a metric grouped by their period.
pub type PeriodValues = BTreeMap<Period, Vec<Sample>>;

/// The time granularity of the samples of a metric.
///
/// Periods are ordered as `day`, `week`, `days_28`, `lifetime`, the unspecified period,
/// followed by any other period.
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Period {
    #[display("day")]
    Day,
    #[display("week")]
    Week,
    #[display("days_28")]
    Days28,
    #[display("lifetime")]
    Lifetime,
    /// The period was omitted by the Graph API, which happens for single-period metrics.
    #[display("null")]
    Unspecified,
    /// A period which isn't known by the collector, kept verbatim.
    Other(String),
}

impl Period {
    /// Returns the period identifier as used by the Graph API.
    pub fn as_str(&self) -> &str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Days28 => "days_28",
            Period::Lifetime => "lifetime",
            Period::Unspecified => "null",
            Period::Other(e) => e.as_str(),
        }
    }
}

impl From<&str> for Period {
    fn from(value: &str) -> Self {
        match value {
            "day" => Period::Day,
            "week" => Period::Week,
            "days_28" => Period::Days28,
            "lifetime" => Period::Lifetime,
            "null" => Period::Unspecified,
            _ => Period::Other(value.to_string()),
        }
    }
}

impl From<Option<Period>> for Period {
    fn from(value: Option<Period>) -> Self {
        value.unwrap_or(Period::Unspecified)
    }
}

impl From<String> for Period {
    fn from(value: String) -> Self {
        Period::from(value.as_str())
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.as_str().to_string()
    }
}

/// A single measurement of a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// The measured value, either a number or an arbitrary JSON structure.
    pub value: Value,
    /// The end of the time bucket of the sample, as returned by the Graph API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl Sample {
    pub fn new<V: Into<Value>>(value: V) -> Self {
        Self {
            value: value.into(),
            end_time: None,
        }
    }

    pub fn with_end_time<V: Into<Value>, S: Into<String>>(value: V, end_time: S) -> Self {
        Self {
            value: value.into(),
            end_time: Some(end_time.into()),
        }
    }

    /// Parse the end time of the sample.
    ///
    /// It returns [None] when the sample has no end time, or when it couldn't be parsed.
    pub fn end_time_utc(&self) -> Option<DateTime<Utc>> {
        let end_time = self.end_time.as_deref()?;

        DateTime::parse_from_str(end_time, END_TIME_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(end_time))
            .ok()
            .map(|e| e.with_timezone(&Utc))
    }
}

/// An insights metric with its samples per period.
///
/// Post metrics are typically available for one period only:
///
/// ```json
/// {"lifetime": [{"value": 1000}]}
/// ```
///
/// While page metrics hold three consecutive samples for several periods:
///
/// ```json
/// {"day": [
///     {"end_time": "2016-11-15T08:00:00+0000", "value": 0},
///     {"end_time": "2016-11-16T08:00:00+0000", "value": 1},
///     {"end_time": "2016-11-17T08:00:00+0000", "value": 2}
///  ],
///  "week": [...],
///  "days_28": [...]}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    name: String,
    values: PeriodValues,
}

impl Metric {
    pub fn new<S: Into<String>>(name: S, values: PeriodValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// The name of the metric, e.g. `page_engaged_users`.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The samples of the metric per period.
    pub fn values(&self) -> &PeriodValues {
        &self.values
    }

    /// The number of periods for which the metric has samples.
    pub fn period_count(&self) -> usize {
        self.values.len()
    }

    pub fn periods(&self) -> impl Iterator<Item = &Period> {
        self.values.keys()
    }

    /// Get the sample of the metric for the given period.
    ///
    /// The `period` can only be omitted for metrics which have exactly one period.
    /// The `index` supports negative values, counting back from the most recent sample
    /// ([LATEST_SAMPLE]).
    pub fn get_value(&self, period: Option<&Period>, index: isize) -> Result<&Sample> {
        let (period, samples) = match period {
            Some(period) => self.values.get_key_value(period).ok_or_else(|| {
                InsightsError::UnknownPeriod {
                    metric: self.name.clone(),
                    period: period.to_string(),
                }
            })?,
            None if self.values.len() == 1 => {
                self.values
                    .iter()
                    .next()
                    .ok_or_else(|| InsightsError::AmbiguousPeriod {
                        metric: self.name.clone(),
                        periods: 0,
                    })?
            }
            None => {
                return Err(InsightsError::AmbiguousPeriod {
                    metric: self.name.clone(),
                    periods: self.values.len(),
                })
            }
        };

        Self::sample_position(index, samples.len())
            .and_then(|position| samples.get(position))
            .ok_or_else(|| InsightsError::IndexOutOfRange {
                metric: self.name.clone(),
                period: period.to_string(),
                index,
                len: samples.len(),
            })
    }

    /// Get only the value of the sample for the given period.
    /// See [Metric::get_value] for the meaning of the arguments.
    pub fn extract_value(&self, period: Option<&Period>, index: isize) -> Result<&Value> {
        self.get_value(period, index).map(|e| &e.value)
    }

    /// Get the samples at the given index for all periods.
    pub fn get_all_values(&self, index: isize) -> Result<BTreeMap<Period, &Sample>> {
        self.values
            .keys()
            .map(|period| {
                self.get_value(Some(period), index)
                    .map(|sample| (period.clone(), sample))
            })
            .collect()
    }

    /// Get the sample values at the given index for all periods.
    pub fn extract_all_values(&self, index: isize) -> Result<BTreeMap<Period, &Value>> {
        self.values
            .keys()
            .map(|period| {
                self.extract_value(Some(period), index)
                    .map(|value| (period.clone(), value))
            })
            .collect()
    }

    fn sample_position(index: isize, len: usize) -> Option<usize> {
        if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            let index = index as usize;
            (index < len).then_some(index)
        }
    }
}
