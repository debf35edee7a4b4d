//! Image generation workflow: pipeline discovery, job submission and
//! bounded polling.
//!
//! Every call to [`ImageGenerator::start`] spawns one job and hands back a
//! [`GenerationHandle`]. The handle owns the job: cancelling or dropping it
//! stops polling, and the job resolves exactly once.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::Config;
use crate::error::{FailureReason, GenerationError, RenderError};
use crate::model::GeneratedImage;
use crate::render::{JobParams, JobStatusReport, RemoteStatus, RenderPipeline, pipeline_from_config};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    DiscoveringPipeline,
    Submitting,
    Polling { job_id: String },
    Succeeded,
    Failed(FailureReason),
    /// The owning handle was cancelled or dropped.
    Cancelled,
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationState::Succeeded | GenerationState::Failed(_) | GenerationState::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Done,
    Failed,
}

/// One submitted job as seen by the polling loop.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub id: String,
    pub status: JobStatus,
    pub result_image: Option<GeneratedImage>,
}

impl GenerationJob {
    fn new(id: String) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            result_image: None,
        }
    }

    /// Apply a status report. Returns the outcome once the job is terminal.
    fn apply(
        &mut self,
        report: JobStatusReport,
    ) -> Option<Result<GeneratedImage, GenerationError>> {
        if self.status != JobStatus::Pending {
            return None;
        }

        match report.status {
            RemoteStatus::Done => {
                self.status = JobStatus::Done;
                let Some(encoded) = report
                    .result_images
                    .into_iter()
                    .find(|f| !f.trim().is_empty())
                else {
                    return Some(Err(GenerationError::EmptyResult));
                };
                let outcome = GeneratedImage::from_base64(&encoded).map_err(|e| {
                    GenerationError::PollTransport(format!("result image is not valid base64: {e}"))
                });
                if let Ok(image) = &outcome {
                    self.result_image = Some(image.clone());
                }
                Some(outcome)
            }
            RemoteStatus::Failed => {
                self.status = JobStatus::Failed;
                Some(Err(GenerationError::GenerationFailed))
            }
            RemoteStatus::Other(status) => {
                debug!(job_id = %self.id, status = %status, "Generation still pending");
                None
            }
        }
    }
}

/// Timing and geometry for generation jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Absolute limit measured from submission.
    pub ceiling: Duration,
    pub params: JobParams,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            ceiling: Duration::from_secs(30),
            params: JobParams::default(),
        }
    }
}

impl From<&Config> for PollSettings {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.poll_interval(),
            ceiling: config.poll_ceiling(),
            params: JobParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageGenerator {
    pipeline: Arc<dyn RenderPipeline>,
    settings: PollSettings,
}

impl ImageGenerator {
    pub fn new(pipeline: Arc<dyn RenderPipeline>, settings: PollSettings) -> Self {
        Self { pipeline, settings }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(pipeline_from_config(config)?, PollSettings::from(config)))
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Spawn a generation job for `description`. Must be called from within
    /// a Tokio runtime.
    pub fn start(&self, description: &str) -> GenerationHandle {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(GenerationState::Idle);

        let task = tokio::spawn(run_job(
            Arc::clone(&self.pipeline),
            self.settings,
            description.to_string(),
            cancel.clone(),
            state_tx,
        ));

        GenerationHandle {
            cancel,
            state: state_rx,
            task: Some(task),
        }
    }

    /// Run a job to completion.
    pub async fn generate_image(
        &self,
        description: &str,
    ) -> Result<GeneratedImage, GenerationError> {
        self.start(description).outcome().await
    }
}

/// Owned handle to a running job. Dropping it cancels the job.
#[derive(Debug)]
pub struct GenerationHandle {
    cancel: CancellationToken,
    state: watch::Receiver<GenerationState>,
    task: Option<JoinHandle<Result<GeneratedImage, GenerationError>>>,
}

impl GenerationHandle {
    /// Stop the job. Any response arriving afterwards is ignored and the
    /// outcome becomes [`GenerationError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn watch_state(&self) -> watch::Receiver<GenerationState> {
        self.state.clone()
    }

    pub async fn outcome(mut self) -> Result<GeneratedImage, GenerationError> {
        let Some(task) = self.task.take() else {
            return Err(GenerationError::Cancelled);
        };

        match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => Err(GenerationError::Cancelled),
            Err(e) => Err(GenerationError::PollTransport(format!("generation task failed: {e}"))),
        }
    }
}

impl Drop for GenerationHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_job(
    pipeline: Arc<dyn RenderPipeline>,
    settings: PollSettings,
    description: String,
    cancel: CancellationToken,
    state: watch::Sender<GenerationState>,
) -> Result<GeneratedImage, GenerationError> {
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GenerationError::Cancelled),
        outcome = drive(pipeline.as_ref(), settings, &description, &state) => outcome,
    };

    match &outcome {
        Ok(image) => {
            info!(bytes = image.bytes().len(), "Image generation succeeded");
            transition(&state, GenerationState::Succeeded);
        }
        Err(GenerationError::Cancelled) => {
            debug!("Image generation cancelled");
            transition(&state, GenerationState::Cancelled);
        }
        Err(e) => {
            warn!(reason = %e.reason(), error = %e, "Image generation failed");
            transition(&state, GenerationState::Failed(e.reason()));
        }
    }

    outcome
}

fn transition(state: &watch::Sender<GenerationState>, next: GenerationState) {
    debug!(state = ?next, "Generation state");
    state.send_replace(next);
}

async fn drive(
    pipeline: &dyn RenderPipeline,
    settings: PollSettings,
    description: &str,
    state: &watch::Sender<GenerationState>,
) -> Result<GeneratedImage, GenerationError> {
    transition(state, GenerationState::DiscoveringPipeline);
    let pipeline_id = pipeline
        .list_pipelines()
        .await
        .map_err(|e| GenerationError::PipelineUnavailable(e.to_string()))?
        .into_iter()
        .next()
        .map(|p| p.id)
        .ok_or_else(|| {
            GenerationError::PipelineUnavailable("no pipelines available".to_string())
        })?;

    transition(state, GenerationState::Submitting);
    let job_id = pipeline
        .submit_job(&pipeline_id, description, settings.params)
        .await
        .map_err(|e| GenerationError::SubmissionRejected(e.to_string()))?;
    if job_id.is_empty() {
        return Err(GenerationError::SubmissionRejected("empty job id".to_string()));
    }
    let submitted_at = Instant::now();

    info!(job_id = %job_id, pipeline_id = %pipeline_id, "Generation job submitted");
    transition(
        state,
        GenerationState::Polling {
            job_id: job_id.clone(),
        },
    );

    poll(pipeline, GenerationJob::new(job_id), submitted_at, settings).await
}

type StatusFuture<'a> =
    Pin<Box<dyn Future<Output = Result<JobStatusReport, RenderError>> + Send + 'a>>;

/// Poll until the job is terminal or the ceiling passes.
///
/// A tick that fires while the previous status request is still outstanding
/// is skipped. Returning drops the interval, the deadline and any in-flight
/// request together.
async fn poll(
    pipeline: &dyn RenderPipeline,
    mut job: GenerationJob,
    submitted_at: Instant,
    settings: PollSettings,
) -> Result<GeneratedImage, GenerationError> {
    let deadline = sleep_until(submitted_at + settings.ceiling);
    tokio::pin!(deadline);

    let mut ticks = interval_at(submitted_at + settings.interval, settings.interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let job_id = job.id.clone();
    let mut in_flight: Option<StatusFuture<'_>> = None;

    loop {
        tokio::select! {
            biased;
            _ = &mut deadline => {
                return Err(GenerationError::Timeout(settings.ceiling));
            }
            report = next_report(&mut in_flight), if in_flight.is_some() => {
                in_flight = None;
                let report = report.map_err(|e| GenerationError::PollTransport(e.to_string()))?;
                if let Some(outcome) = job.apply(report) {
                    return outcome;
                }
            }
            _ = ticks.tick() => {
                if in_flight.is_some() {
                    debug!(job_id = %job_id, "Previous status check still running, skipping tick");
                } else {
                    in_flight = Some(pipeline.get_job_status(&job_id));
                }
            }
        }
    }
}

async fn next_report(
    in_flight: &mut Option<StatusFuture<'_>>,
) -> Result<JobStatusReport, RenderError> {
    match in_flight.as_mut() {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}
