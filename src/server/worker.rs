use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, anyhow};
use burn::tensor::backend::Backend;
use image::RgbImage;
use indexmap::IndexMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::config::ArtifactPaths;
use crate::generation::{GenerationError, TextureGenerator};
use crate::metadata::TextureMetadata;

type Reply<T> = oneshot::Sender<Result<T, GenerationError>>;

enum Job {
    All {
        reply: Reply<IndexMap<String, RgbImage>>,
    },
    One {
        name: String,
        reply: Reply<RgbImage>,
    },
    Mix {
        first: String,
        second: String,
        ratio: f32,
        reply: Reply<RgbImage>,
    },
}

impl Job {
    fn run<B: Backend>(self, generator: &TextureGenerator<B>) {
        // A dropped receiver means the request was cancelled; nothing to report.
        match self {
            Job::All { reply } => {
                let _ = reply.send(generator.generate_all());
            }
            Job::One { name, reply } => {
                let _ = reply.send(generator.generate(&name));
            }
            Job::Mix {
                first,
                second,
                ratio,
                reply,
            } => {
                let _ = reply.send(generator.mix(&first, &second, ratio));
            }
        }
    }
}

/// Cloneable handle to the thread that owns the model.
///
/// All inference runs on that one thread, so the model never needs to be
/// shared between tasks. Requests queue on a bounded channel.
#[derive(Clone)]
pub struct GeneratorHandle {
    jobs: mpsc::Sender<Job>,
    metadata: Arc<TextureMetadata>,
}

impl GeneratorHandle {
    /// Load the artifacts on a new worker thread and wait until it is ready.
    pub async fn spawn<B>(
        artifacts: ArtifactPaths,
        device: B::Device,
        queue_capacity: usize,
    ) -> Result<Self>
    where
        B: Backend,
    {
        Self::spawn_with(queue_capacity, move || {
            TextureGenerator::<B>::load(&artifacts, &device)
        })
        .await
    }

    /// Like [`GeneratorHandle::spawn`] with a caller-supplied constructor.
    pub async fn spawn_with<B, F>(queue_capacity: usize, build: F) -> Result<Self>
    where
        B: Backend,
        F: FnOnce() -> Result<TextureGenerator<B>> + Send + 'static,
    {
        let (jobs_tx, mut jobs_rx) = mpsc::channel::<Job>(queue_capacity.max(1));
        let (ready_tx, ready_rx) = oneshot::channel::<Result<TextureMetadata>>();

        thread::Builder::new()
            .name("texture-generator".to_string())
            .spawn(move || {
                let generator = match build() {
                    Ok(generator) => generator,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                if ready_tx.send(Ok(generator.metadata().clone())).is_err() {
                    return;
                }
                while let Some(job) = jobs_rx.blocking_recv() {
                    if !run_isolated(|| job.run(&generator)) {
                        error!("generation job panicked; its request was dropped");
                    }
                }
                debug!("generation worker stopped");
            })
            .context("failed to spawn generation worker")?;

        let metadata = ready_rx
            .await
            .map_err(|_| anyhow!("generation worker exited during startup"))??;
        info!(classes = ?metadata.classes, "generator ready");

        Ok(Self {
            jobs: jobs_tx,
            metadata: Arc::new(metadata),
        })
    }

    pub fn metadata(&self) -> &TextureMetadata {
        &self.metadata
    }

    /// False once the worker thread has exited.
    pub fn is_alive(&self) -> bool {
        !self.jobs.is_closed()
    }

    /// A handle whose worker has already stopped.
    #[cfg(test)]
    pub(super) fn stopped(metadata: TextureMetadata) -> Self {
        let (jobs, _) = mpsc::channel(1);
        Self {
            jobs,
            metadata: Arc::new(metadata),
        }
    }

    pub async fn generate_all(&self) -> Result<IndexMap<String, RgbImage>, GenerationError> {
        self.submit(|reply| Job::All { reply }).await
    }

    pub async fn generate(&self, name: &str) -> Result<RgbImage, GenerationError> {
        let name = name.to_string();
        self.submit(|reply| Job::One { name, reply }).await
    }

    pub async fn mix(
        &self,
        first: &str,
        second: &str,
        ratio: f32,
    ) -> Result<RgbImage, GenerationError> {
        let (first, second) = (first.to_string(), second.to_string());
        self.submit(|reply| Job::Mix {
            first,
            second,
            ratio,
            reply,
        })
        .await
    }

    async fn submit<T>(&self, job: impl FnOnce(Reply<T>) -> Job) -> Result<T, GenerationError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.jobs
            .send(job(reply_tx))
            .await
            .map_err(|_| worker_gone())?;
        reply_rx.await.map_err(|_| worker_gone())?
    }
}

fn worker_gone() -> GenerationError {
    GenerationError::Internal(anyhow!("generation worker unavailable"))
}

/// Runs `job`, returning false if it panicked. Replies owned by the job are
/// dropped during unwinding, so the waiting request sees [`worker_gone`].
fn run_isolated(job: impl FnOnce()) -> bool {
    panic::catch_unwind(AssertUnwindSafe(job)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panicking_job_drops_its_reply_and_later_jobs_run() {
        let (reply, mut pending) = oneshot::channel::<Result<(), GenerationError>>();
        assert!(!run_isolated(move || {
            let _reply = reply;
            panic!("decoder failure");
        }));
        assert!(pending.try_recv().is_err());

        let (reply, mut pending) = oneshot::channel::<Result<(), GenerationError>>();
        assert!(run_isolated(move || {
            let _ = reply.send(Ok(()));
        }));
        assert!(matches!(pending.try_recv(), Ok(Ok(()))));
    }

    #[tokio::test]
    async fn stopped_worker_is_reported() {
        let handle = GeneratorHandle::stopped(TextureMetadata::new(vec!["dirt".into()], 4, 8));
        assert!(!handle.is_alive());
        assert!(matches!(
            handle.generate("dirt").await,
            Err(GenerationError::Internal(_))
        ));
    }
}
