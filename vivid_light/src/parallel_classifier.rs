// THEORY:
// Classification is pure and frame-local, so a stream or batch of frames can be
// spread over several workers with no shared state to coordinate. The pool below
// is a single dispatcher task feeding a fixed set of workers round-robin; each
// frame carries a oneshot sender for its verdict. Workers push the CPU-bound
// scoring onto tokio's blocking pool so the async runtime stays responsive.
//
// Frame ids are handed out in submission order, and `classify_batch` returns
// verdicts in the order the frames were given, regardless of which worker
// finished first.

use crate::classifier::{BgrImage, ClassifierConfig, ColorCounts, VividColorRatioClassifier};
use crate::error::{ClassifierError, Result};
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Configuration for the ParallelClassifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelConfig {
    pub classifier: ClassifierConfig,
    /// Number of worker tasks. Zero is treated as one.
    pub worker_count: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            worker_count: num_cpus::get(),
        }
    }
}

/// The verdict for one submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameVerdict {
    pub frame_id: u64,
    pub counts: ColorCounts,
}

impl FrameVerdict {
    pub fn is_red_light(&self) -> bool {
        self.counts.is_red_light
    }
}

pub struct FrameTask {
    pub frame_id: u64,
    pub image: BgrImage,
    pub result_sender: oneshot::Sender<FrameVerdict>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FrameTask>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the dispatcher and workers. Must be called inside a tokio runtime.
    pub fn new(classifier: VividColorRatioClassifier, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FrameTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<FrameTask>())
            .unzip();

        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    tracing::warn!(worker = worker_idx, "worker stopped; dropping frame");
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        let workers = worker_receivers
            .into_iter()
            .enumerate()
            .map(|(worker_idx, mut worker_receiver)| {
                let classifier = classifier.clone();
                tokio::spawn(async move {
                    while let Some(task) = worker_receiver.recv().await {
                        Self::process_frame_worker(worker_idx, &classifier, task).await;
                    }
                })
            })
            .collect();

        Self {
            task_sender,
            dispatcher,
            workers,
        }
    }

    async fn process_frame_worker(worker_idx: usize, classifier: &VividColorRatioClassifier, task: FrameTask) {
        let FrameTask {
            frame_id,
            image,
            result_sender,
        } = task;
        let classifier = classifier.clone();

        match tokio::task::spawn_blocking(move || classifier.analyze(&image)).await {
            Ok(counts) => {
                tracing::trace!(worker = worker_idx, frame_id, "frame classified");
                // The submitter may have given up waiting; nothing to do then.
                let _ = result_sender.send(FrameVerdict { frame_id, counts });
            }
            Err(e) => {
                tracing::warn!(worker = worker_idx, frame_id, error = %e, "classification task failed");
            }
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub async fn submit(&self, frame_id: u64, image: BgrImage) -> Result<FrameVerdict> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = FrameTask {
            frame_id,
            image,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| ClassifierError::WorkerPoolClosed("failed to send frame to worker pool"))?;

        result_receiver
            .await
            .map_err(|_| ClassifierError::WorkerPoolClosed("failed to receive verdict from worker"))
    }

    /// Closes the queue and waits for in-flight frames to finish.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        if let Err(e) = self.dispatcher.await {
            tracing::warn!(error = %e, "dispatcher exited abnormally");
        }
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "worker exited abnormally");
            }
        }
    }
}

/// Classifies independent frames concurrently on a pool of workers.
pub struct ParallelClassifier {
    config: ParallelConfig,
    worker_pool: WorkerPool,
    frame_counter: AtomicU64,
}

impl ParallelClassifier {
    pub fn new(config: ParallelConfig) -> Self {
        Self::with_classifier(VividColorRatioClassifier::new(config.classifier.clone()), config)
    }

    /// Uses a prepared classifier, e.g. one with an observer attached.
    /// `config.classifier` is kept for reporting only.
    pub fn with_classifier(classifier: VividColorRatioClassifier, config: ParallelConfig) -> Self {
        let worker_pool = WorkerPool::new(classifier, config.worker_count);
        tracing::debug!(workers = worker_pool.worker_count(), "parallel classifier started");
        Self {
            config,
            worker_pool,
            frame_counter: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }

    fn next_frame_id(&self) -> u64 {
        self.frame_counter.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn classify_frame(&self, image: BgrImage) -> Result<FrameVerdict> {
        let frame_id = self.next_frame_id();
        self.worker_pool.submit(frame_id, image).await
    }

    /// Classifies every frame and returns the verdicts in input order.
    pub async fn classify_batch(&self, images: Vec<BgrImage>) -> Result<Vec<FrameVerdict>> {
        let total = images.len();
        let submissions = images.into_iter().map(|image| {
            let frame_id = self.next_frame_id();
            self.worker_pool.submit(frame_id, image)
        });

        let verdicts = join_all(submissions).await.into_iter().collect::<Result<Vec<_>>>()?;

        tracing::info!(
            frames = total,
            red_lights = verdicts.iter().filter(|v| v.is_red_light()).count(),
            "batch classified"
        );
        Ok(verdicts)
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}
