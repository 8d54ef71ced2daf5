use std::io;

use derive_more::Display;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Serializer, Value};

use crate::core::metrics::{InsightsError, Metric, Result, LATEST_SAMPLE};

/// The prefixes of metric names which are removed to get the field name.
pub const METRIC_PREFIXES: [&str; 3] = ["page_", "post_", "domain_"];

/// The value which is stored within the field of a record.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum FieldValue {
    /// An integer metric value, stored natively.
    Integer(i64),
    /// Any other metric value, serialized into JSON.
    Json(String),
}

impl FieldValue {
    /// Returns the integer value, if the metric value was an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(e) => Some(*e),
            FieldValue::Json(_) => None,
        }
    }

    /// Returns the serialized JSON value, if the metric value wasn't an integer.
    pub fn as_json(&self) -> Option<&str> {
        match self {
            FieldValue::Integer(_) => None,
            FieldValue::Json(e) => Some(e.as_str()),
        }
    }
}

/// Get the name of the field which should store the given metric.
///
/// All metrics are prepended with the name of the object they correspond to,
/// e.g. `page_` in `page_engaged_users`. When `remove_prefix` is set, this prefix is removed.
pub fn field_name(metric_name: &str, remove_prefix: bool) -> &str {
    if !remove_prefix {
        return metric_name;
    }

    METRIC_PREFIXES
        .iter()
        .find_map(|prefix| metric_name.strip_prefix(prefix))
        .unwrap_or(metric_name)
}

/// Get the value of the field which should store the given metric.
///
/// Metrics with one period store the value of their latest sample,
/// other metrics store the latest value of every period as a JSON object.
/// Values which aren't integers are serialized into JSON, floats included.
pub fn field_value(metric: &Metric) -> Result<FieldValue> {
    if metric.period_count() == 1 {
        match metric.extract_value(None, LATEST_SAMPLE)? {
            Value::Bool(value) => Ok(FieldValue::Integer(*value as i64)),
            value => match value.as_i64() {
                Some(integer) => Ok(FieldValue::Integer(integer)),
                None => to_json(value).map(FieldValue::Json),
            },
        }
    } else {
        to_json(&metric.extract_all_values(LATEST_SAMPLE)?).map(FieldValue::Json)
    }
}

/// Serialize the value with `", "` and `": "` separators, escaping non-ASCII characters as `\uXXXX`.
fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, SpacedFormatter);

    value
        .serialize(&mut serializer)
        .map_err(|e| InsightsError::Parsing(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| InsightsError::Parsing(e.to_string()))
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;

        for (index, c) in fragment.char_indices().filter(|(_, c)| !c.is_ascii()) {
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + c.len_utf8();
        }

        writer.write_all(fragment[start..].as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::core::metrics::{Period, PeriodValues, Sample};

    use super::*;

    fn single_value_metric(name: &str, value: Value) -> Metric {
        let mut values = PeriodValues::new();
        values.insert(Period::Lifetime, vec![Sample::new(value)]);

        Metric::new(name, values)
    }

    #[test]
    fn test_field_name() {
        assert_eq!("stories", field_name("post_stories", true));
        assert_eq!("feed_clicks", field_name("domain_feed_clicks", true));
        assert_eq!("engaged_users", field_name("page_engaged_users", true));
        assert_eq!("posts_impressions", field_name("page_posts_impressions", true));
        assert_eq!("fans", field_name("fans", true));
    }

    #[test]
    fn test_field_name_keep_prefix() {
        assert_eq!("post_stories", field_name("post_stories", false));
        assert_eq!("domain_feed_clicks", field_name("domain_feed_clicks", false));
        assert_eq!("page_engaged_users", field_name("page_engaged_users", false));
        assert_eq!("page_posts_impressions", field_name("page_posts_impressions", false));
    }

    #[test]
    fn test_field_name_removes_only_leading_prefix() {
        assert_eq!("post_impressions", field_name("page_post_impressions", true));
        assert_eq!("video_page_views", field_name("video_page_views", true));
    }

    #[test]
    fn test_field_value_integer() {
        let metric = single_value_metric("post_impressions", json!(1));

        let result = field_value(&metric).unwrap();

        assert_eq!(FieldValue::Integer(1), result);
        assert_eq!(Some(1), result.as_integer());
    }

    #[test]
    fn test_field_value_object() {
        let metric = single_value_metric("post_interests_impressions", json!({}));

        let result = field_value(&metric).unwrap();

        assert_eq!(FieldValue::Json("{}".to_string()), result);
        assert_eq!(Some("{}"), result.as_json());
    }

    #[test]
    fn test_field_value_nested_object() {
        let metric = single_value_metric(
            "post_stories_by_action_type",
            json!({"like": 3, "share": [1, 2]}),
        );

        let result = field_value(&metric).unwrap();

        assert_eq!(
            FieldValue::Json(r#"{"like": 3, "share": [1, 2]}"#.to_string()),
            result
        );
    }

    #[test]
    fn test_field_value_float_is_serialized() {
        let metric = single_value_metric("post_video_avg_time_watched", json!(1.5));

        let result = field_value(&metric).unwrap();

        assert_eq!(FieldValue::Json("1.5".to_string()), result);
    }

    #[test]
    fn test_field_value_string_is_serialized() {
        let metric = single_value_metric("page_name", json!("lorem"));

        let result = field_value(&metric).unwrap();

        assert_eq!(FieldValue::Json("\"lorem\"".to_string()), result);
    }

    #[test]
    fn test_field_value_escapes_non_ascii() {
        let metric = single_value_metric(
            "page_fans_city",
            json!({"café": "ü", "Zürich": 3, "emoji": "😀", "plain": "a\"b"}),
        );

        let result = field_value(&metric).unwrap();

        assert_eq!(
            FieldValue::Json(
                r#"{"caf\u00e9": "\u00fc", "Z\u00fcrich": 3, "emoji": "\ud83d\ude00", "plain": "a\"b"}"#.to_string()
            ),
            result
        );
    }

    #[test]
    fn test_field_value_bool_is_integer() {
        let metric = single_value_metric("page_is_verified", json!(true));

        let result = field_value(&metric).unwrap();

        assert_eq!(FieldValue::Integer(1), result);
    }

    #[test]
    fn test_field_value_several_periods() {
        let mut values = PeriodValues::new();
        values.insert(
            Period::Days28,
            vec![
                Sample::with_end_time(100, "2016-11-15T08:00:00+0000"),
                Sample::with_end_time(101, "2016-11-16T08:00:00+0000"),
                Sample::with_end_time(102, "2016-11-17T08:00:00+0000"),
            ],
        );
        values.insert(
            Period::Day,
            vec![
                Sample::with_end_time(0, "2016-11-15T08:00:00+0000"),
                Sample::with_end_time(1, "2016-11-16T08:00:00+0000"),
                Sample::with_end_time(2, "2016-11-17T08:00:00+0000"),
            ],
        );
        values.insert(
            Period::Week,
            vec![
                Sample::with_end_time(10, "2016-11-15T08:00:00+0000"),
                Sample::with_end_time(11, "2016-11-16T08:00:00+0000"),
                Sample::with_end_time(12, "2016-11-17T08:00:00+0000"),
            ],
        );
        let metric = Metric::new("post_engaged_users", values);

        let result = field_value(&metric).unwrap();

        assert_eq!(
            FieldValue::Json(r#"{"day": 2, "week": 12, "days_28": 102}"#.to_string()),
            result
        );
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!("13", FieldValue::Integer(13).to_string());
        assert_eq!("{}", FieldValue::Json("{}".to_string()).to_string());
    }
}
