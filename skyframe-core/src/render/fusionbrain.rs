use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder,
    multipart::{Form, Part},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{error::RenderError, provider::truncate_body};

use super::{JobParams, JobStatusReport, PipelineInfo, RemoteStatus, RenderPipeline};

/// Fusion Brain (Kandinsky) key-based API.
#[derive(Debug, Clone)]
pub struct FusionBrainClient {
    base_url: String,
    api_key: String,
    secret_key: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    uuid: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    result: Option<StatusResult>,
    /// Older API revisions returned images at the top level.
    #[serde(default)]
    images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    #[serde(default)]
    files: Vec<String>,
}

impl FusionBrainClient {
    pub fn new(
        base_url: String,
        api_key: String,
        secret_key: String,
        timeout: Duration,
    ) -> Result<Self, RenderError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            api_key,
            secret_key,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/key/api/v1/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("X-Key", format!("Key {}", self.api_key))
            .header("X-Secret", format!("Secret {}", self.secret_key))
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, RenderError> {
        let res = self.authorize(req).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(RenderError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| RenderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl RenderPipeline for FusionBrainClient {
    #[instrument(skip(self))]
    async fn list_pipelines(&self) -> Result<Vec<PipelineInfo>, RenderError> {
        let pipelines: Vec<PipelineInfo> =
            self.send_json(self.http.get(self.url("pipelines"))).await?;
        debug!(count = pipelines.len(), "Listed rendering pipelines");
        Ok(pipelines)
    }

    #[instrument(skip(self, prompt))]
    async fn submit_job(
        &self,
        pipeline_id: &str,
        prompt: &str,
        params: JobParams,
    ) -> Result<String, RenderError> {
        let generation = serde_json::json!({
            "type": "GENERATE",
            "numImages": params.count,
            "width": params.width,
            "height": params.height,
            "generateParams": { "query": prompt },
        });

        let form = Form::new()
            .text("pipeline_id", pipeline_id.to_string())
            .part(
                "params",
                Part::text(generation.to_string()).mime_str("application/json")?,
            );

        let req = self.http.post(self.url("pipeline/run")).multipart(form);
        let run: RunResponse = self.send_json(req).await?;

        debug!(job_id = %run.uuid, "Submitted generation job");
        Ok(run.uuid)
    }

    #[instrument(skip(self))]
    async fn get_job_status(&self, job_id: &str) -> Result<JobStatusReport, RenderError> {
        let path = format!("pipeline/status/{job_id}");
        let res: StatusResponse = self.send_json(self.http.get(self.url(&path))).await?;

        debug!(status = %res.status, "Generation status");

        let result_images = res
            .result
            .map(|r| r.files)
            .filter(|files| !files.is_empty())
            .or(res.images)
            .unwrap_or_default();

        Ok(JobStatusReport {
            status: RemoteStatus::from(res.status.as_str()),
            result_images,
        })
    }
}
