use serde::{Deserialize, Serialize};

use insights_core::core::metrics::{Period, Sample};

/// A single sub-request of a Graph API batch call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRequest {
    pub method: String,
    pub relative_url: String,
}

impl BatchRequest {
    /// Create the request for the insights of the given metric.
    pub fn insights(graph_id: &str, metric: &str) -> Self {
        Self {
            method: "GET".to_string(),
            relative_url: format!("{}/insights/{}/", graph_id, metric),
        }
    }
}

/// The response of a single sub-request within a batch call.
/// The `body` is the raw JSON text returned for the sub-request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InsightsResponse {
    pub data: Vec<InsightsDatum>,
}

/// The samples of one metric for one period.
/// The period is [None] when the Graph API omitted it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InsightsDatum {
    pub name: String,
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub values: Vec<Sample>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_batch_request_insights() {
        let result = BatchRequest::insights("111111111_22222222", "post_impressions");

        assert_eq!(
            json!({"method": "GET", "relative_url": "111111111_22222222/insights/post_impressions/"}),
            serde_json::to_value(&result).unwrap()
        );
    }

    #[test]
    fn test_insights_datum_deserialize() {
        let value = json!({
            "name": "page_engaged_users",
            "period": "days_28",
            "values": [{"value": 3, "end_time": "2016-11-17T08:00:00+0000"}],
            "title": "28 Days Page Engaged Users",
            "id": "327730534261730/insights/page_engaged_users/days_28"
        });

        let result = serde_json::from_value::<InsightsDatum>(value).unwrap();

        assert_eq!(
            InsightsDatum {
                name: "page_engaged_users".to_string(),
                period: Some(Period::Days28),
                values: vec![Sample::with_end_time(3, "2016-11-17T08:00:00+0000")],
            },
            result
        );
    }
}
