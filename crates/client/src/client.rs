use reqwest::multipart::{Form, Part};
use reqwest::{header, RequestBuilder, Response};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::detection::DetectionResult;
use crate::error::ApiError;
use crate::insights::{canonicalize_insights, InsightsResponse};
use crate::types::{
    EmailNotification, MutationResponse, RuleSuggestion, RuleSuggestionsEnvelope, TicketRequest,
    UploadKind, UploadResponse,
};

/// Detection and insight generation run model inference on the backend and
/// can take minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Async client for the reconciliation backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    openai_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            openai_key: None,
        })
    }

    /// Forwarded as the `openai_key` query parameter on detection and
    /// insight requests. Blank keys are ignored.
    pub fn with_openai_key(mut self, key: Option<String>) -> Self {
        self.openai_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_key(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.openai_key {
            Some(key) => req.query(&[("openai_key", key)]),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Backend returned an error status");
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    pub async fn detect_anomalies(&self) -> Result<DetectionResult, ApiError> {
        let req = self.with_key(self.http.get(self.url("/test")));
        let response = self.send(req).await?;

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        let body = response.text().await?;

        let result = DetectionResult::from_body(&body, is_json)?;
        tracing::info!(rows = result.rows.len(), json = is_json, "Anomaly detection finished");
        Ok(result)
    }

    pub async fn fetch_insights(&self, req: u32) -> Result<InsightsResponse, ApiError> {
        let request = self.with_key(self.http.get(self.url("/insights")).query(&[("req", req)]));
        let value: Value = self.send(request).await?.json().await?;

        let insights = canonicalize_insights(&value)?;
        tracing::info!(buckets = insights.buckets.len(), "Fetched insights");
        Ok(insights)
    }

    pub async fn upload(
        &self,
        kind: UploadKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        let size = bytes.len();
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .send(self.http.post(self.url(kind.path())).multipart(form))
            .await?;
        let body = response.text().await?;
        tracing::info!(file = file_name, kind = %kind, bytes = size, "Uploaded file");

        if body.trim().is_empty() {
            return Ok(UploadResponse::default());
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn rule_suggestions(&self, filename: &str) -> Result<Vec<RuleSuggestion>, ApiError> {
        let req = self
            .http
            .get(self.url("/rule-suggestions"))
            .query(&[("filename", filename)]);
        let envelope: RuleSuggestionsEnvelope = self.send(req).await?.json().await?;
        Ok(envelope.data)
    }

    pub async fn update_row(
        &self,
        source: &str,
        trade_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<MutationResponse, ApiError> {
        let req = self
            .http
            .post(self.url("/update-row"))
            .query(&[("source", source), ("trade_id", trade_id)])
            .json(fields);
        self.mutation(req).await
    }

    pub async fn raise_ticket(&self, ticket: &TicketRequest) -> Result<MutationResponse, ApiError> {
        let req = self.http.post(self.url("/raise-ticket")).json(ticket);
        self.mutation(req).await
    }

    pub async fn send_email_notification(
        &self,
        email: &EmailNotification,
    ) -> Result<MutationResponse, ApiError> {
        let req = self.http.post(self.url("/send-email-notification")).form(email);
        self.mutation(req).await
    }

    /// Mutation endpoints answer with `{"message": ...}` or, from some
    /// handlers, an empty body.
    async fn mutation(&self, req: RequestBuilder) -> Result<MutationResponse, ApiError> {
        let body = self.send(req).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(MutationResponse::default());
        }
        Ok(serde_json::from_str(&body)?)
    }
}
