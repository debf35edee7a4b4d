//! Text-to-image rendering pipeline.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Debug;
use std::sync::Arc;

use crate::{Config, error::RenderError};

pub mod fusionbrain;

pub use fusionbrain::FusionBrainClient;

/// A pipeline advertised by the service. Only the id is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineInfo {
    pub id: String,
}

/// Output geometry for a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobParams {
    pub width: u32,
    pub height: u32,
    pub count: u32,
}

impl Default for JobParams {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            count: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Done,
    Failed,
    /// Anything else ("INITIAL", "PROCESSING", ...) means keep waiting.
    Other(String),
}

impl From<&str> for RemoteStatus {
    fn from(value: &str) -> Self {
        match value {
            "DONE" => RemoteStatus::Done,
            "FAILED" => RemoteStatus::Failed,
            other => RemoteStatus::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusReport {
    pub status: RemoteStatus,
    /// Base64-encoded images; empty until the job is done.
    pub result_images: Vec<String>,
}

#[async_trait]
pub trait RenderPipeline: Send + Sync + Debug {
    async fn list_pipelines(&self) -> Result<Vec<PipelineInfo>, RenderError>;

    /// Submit a job and return its opaque id.
    async fn submit_job(
        &self,
        pipeline_id: &str,
        prompt: &str,
        params: JobParams,
    ) -> Result<String, RenderError>;

    async fn get_job_status(&self, job_id: &str) -> Result<JobStatusReport, RenderError>;
}

/// Construct the rendering pipeline client from config.
pub fn pipeline_from_config(config: &Config) -> anyhow::Result<Arc<dyn RenderPipeline>> {
    let (key, secret) = config.render_credentials()?;

    let client = FusionBrainClient::new(
        config.render_base_url.clone(),
        key.to_owned(),
        secret.to_owned(),
        config.http_timeout(),
    )?;

    Ok(Arc::new(client))
}
