use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use async_trait::async_trait;
use derive_more::Display;
use log::{debug, info, trace, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use insights_core::core::config::InsightsProperties;
use insights_core::core::metrics::{
    ApiError, InsightsError, Metric, Metrics, MetricsProvider, Period, PeriodValues, Result,
};

use crate::graph::models::{BatchRequest, BatchResponse, InsightsResponse};

const BATCH_FIELD: &str = "batch";
const INCLUDE_HEADERS_FIELD: &str = "include_headers";

/// The Graph API client which fetches insights metrics through a single batch call.
///
/// The url, access token and api version are fixed for the lifetime of the client,
/// which can be shared between concurrent fetches.
#[derive(Display)]
#[display("Graph API insights client {}", endpoint)]
pub struct GraphClient {
    endpoint: Url,
    access_token: String,
    client: Client,
}

impl GraphClient {
    /// Returns a new [GraphClientBuilder] to configure a [GraphClient].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use insights_graph::graph::GraphClient;
    ///
    /// let client = GraphClient::builder()
    ///     .access_token("MyAccessToken")
    ///     .api_version("2.3")
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn builder() -> GraphClientBuilder {
        GraphClientBuilder::default()
    }

    /// The url to which the batch calls are sent.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Normalize the api version into the `v<major>.<minor>` path segment.
    fn normalize_version(version: &str) -> Option<String> {
        let version = version.trim();
        let version = version.strip_prefix('v').unwrap_or(version);

        if version.is_empty() {
            None
        } else {
            Some(format!("v{}", version))
        }
    }

    fn parse_batch(status: StatusCode, body: &str) -> Result<Vec<Option<BatchResponse>>> {
        let value = serde_json::from_str::<Value>(body).map_err(|e| {
            InsightsError::Parsing(format!("invalid batch response (status {}), {}", status, e))
        })?;

        if value.get("error").is_some() {
            return Err(InsightsError::Api(ApiError::from_body(value)));
        }

        serde_json::from_value::<Vec<Option<BatchResponse>>>(value).map_err(|e| {
            InsightsError::Parsing(format!("expected a batch response array (status {}), {}", status, e))
        })
    }

    fn extract_metrics(requested: &[String], responses: Vec<Option<BatchResponse>>) -> Result<Metrics> {
        let mut values: BTreeMap<String, PeriodValues> = BTreeMap::new();

        for (index, response) in responses.into_iter().enumerate() {
            let requested_metric = requested.get(index).map(|e| e.as_str()).unwrap_or_default();
            let body = response
                .and_then(|e| e.body)
                .ok_or_else(|| {
                    InsightsError::Parsing(format!("no response received for metric {}", requested_metric))
                })?;
            let body = serde_json::from_str::<Value>(body.as_str()).map_err(|e| {
                InsightsError::Parsing(format!("invalid response body for metric {}, {}", requested_metric, e))
            })?;

            if body.get("error").is_some() {
                return Err(InsightsError::Api(ApiError::from_body(body)));
            }

            let response = serde_json::from_value::<InsightsResponse>(body).map_err(|e| {
                InsightsError::Parsing(format!("invalid insights data for metric {}, {}", requested_metric, e))
            })?;
            if response.data.is_empty() {
                return Err(InsightsError::EmptyData(requested_metric.to_string()));
            }

            for datum in response.data {
                let period = Period::from(datum.period);
                trace!("Received {} samples for {} ({})", datum.values.len(), datum.name, period);
                values.entry(datum.name).or_default().insert(period, datum.values);
            }
        }

        Ok(values
            .into_iter()
            .map(|(name, values)| (name.clone(), Metric::new(name, values)))
            .collect())
    }
}

#[async_trait]
impl MetricsProvider for GraphClient {
    async fn fetch_metrics(&self, graph_id: &str, metrics: &[String]) -> Result<Metrics> {
        if metrics.is_empty() {
            return Err(InsightsError::MetricsNotSpecified);
        }

        let batch: Vec<BatchRequest> = metrics
            .iter()
            .map(|metric| BatchRequest::insights(graph_id, metric))
            .collect();
        let batch = serde_json::to_string(&batch).map_err(|e| InsightsError::Parsing(e.to_string()))?;

        debug!("Requesting {} insights metrics of {} from {}", metrics.len(), graph_id, self.endpoint);
        trace!("Sending insights batch {}", batch);
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.access_token)
            .form(&[(BATCH_FIELD, batch.as_str()), (INCLUDE_HEADERS_FIELD, "false")])
            .send()
            .await
            .map_err(|e| InsightsError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InsightsError::Request(e.to_string()))?;
        trace!("Received insights batch response ({}) {}", status, body);

        let responses = Self::parse_batch(status, body.as_str())?;
        let result = Self::extract_metrics(metrics, responses)?;

        info!("Fetched {} insights metrics of {}", result.len(), graph_id);
        Ok(result)
    }
}

impl Debug for GraphClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("endpoint", &self.endpoint)
            .field("access_token", &"***")
            .field("client", &self.client)
            .finish()
    }
}

/// Builder for creating a new [GraphClient].
#[derive(Debug, Default)]
pub struct GraphClientBuilder {
    url: Option<String>,
    access_token: Option<String>,
    api_version: Option<String>,
}

impl GraphClientBuilder {
    /// Use the url, access token and api version of the given properties.
    pub fn properties(mut self, properties: &InsightsProperties) -> Self {
        self.url = Some(properties.url().clone());
        self.access_token = Some(properties.access_token().clone());
        self.api_version = properties.api_version().cloned();
        self
    }

    /// Set the base url of the Graph API.
    pub fn url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn access_token<S: Into<String>>(mut self, access_token: S) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Set the api version, either `2.3` or `v2.3`.
    pub fn api_version<S: Into<String>>(mut self, api_version: S) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Build the [GraphClient].
    ///
    /// It returns [InsightsError::Creation] when the access token is missing or the url is invalid.
    pub fn build(self) -> Result<GraphClient> {
        let access_token = self
            .access_token
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| InsightsError::Creation("access token is required".to_string()))?;
        let url = self
            .url
            .unwrap_or_else(|| InsightsProperties::default().url().clone());
        let endpoint = match self.api_version.as_deref().and_then(GraphClient::normalize_version) {
            Some(version) => format!("{}/{}/", url.trim_end_matches('/'), version),
            None => {
                warn!("No Graph API version specified, using the unversioned api");
                format!("{}/", url.trim_end_matches('/'))
            }
        };
        let endpoint = Url::parse(endpoint.as_str())
            .map_err(|e| InsightsError::Creation(format!("invalid url {}, {}", endpoint, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| InsightsError::Creation(e.to_string()))?;

        debug!("Created Graph API client for {}", endpoint);
        Ok(GraphClient {
            endpoint,
            access_token,
            client,
        })
    }
}
