//! Export request queue consumers.
//!
//! The broker transport itself lives outside this crate; anything that can
//! hand over raw message bodies implements [`ExportQueue`]. Two transports are
//! provided: an in-process channel and a JSON-lines reader (stdin or a spool
//! file).

use crate::findchips::ExportRequest;
use crate::pipeline::{ExportPipeline, RunReport};
use async_trait::async_trait;
use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Source of raw export request messages.
#[async_trait]
pub trait ExportQueue: Send {
    /// Waits for the next message body. `None` means the queue is closed.
    async fn next(&mut self) -> Option<Vec<u8>>;
}

/// Publishing half of the in-process queue.
#[derive(Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelPublisher {
    /// Serializes and enqueues a request.
    pub async fn publish(&self, request: &ExportRequest) -> anyhow::Result<()> {
        let body = request.to_json()?;
        self.tx.send(body).await.map_err(|_| anyhow::anyhow!("export queue is closed"))?;
        debug!("Published export request for {}", request.part_number);
        Ok(())
    }

    /// Enqueues a raw message body as-is.
    pub async fn publish_raw(&self, body: Vec<u8>) -> anyhow::Result<()> {
        self.tx.send(body).await.map_err(|_| anyhow::anyhow!("export queue is closed"))
    }
}

/// Consuming half of the in-process queue.
pub struct ChannelQueue {
    rx: mpsc::Receiver<Vec<u8>>,
}

/// Creates a bounded in-process queue.
pub fn channel(capacity: usize) -> (ChannelPublisher, ChannelQueue) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelPublisher { tx }, ChannelQueue { rx })
}

#[async_trait]
impl ExportQueue for ChannelQueue {
    async fn next(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}

/// Reads one JSON message per line; blank lines are skipped.
pub struct LineQueue<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> LineQueue<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines() }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> ExportQueue for LineQueue<R> {
    async fn next(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(line.into_bytes()),
                Ok(None) => return None,
                Err(e) => {
                    error!("Failed to read from request stream: {}", e);
                    return None;
                }
            }
        }
    }
}

/// Counters for one worker session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub received: usize,
    pub completed: usize,
    pub failed: usize,
    /// Messages that could not be decoded as an export request.
    pub rejected: usize,
}

impl WorkerStats {
    fn record(&mut self, report: &RunReport) {
        if report.is_completed() {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Consumes a queue and runs one pipeline per request.
pub struct Worker {
    pipeline: Arc<ExportPipeline>,
    concurrency: usize,
}

impl Worker {
    /// Creates a worker running at most `concurrency` requests at once.
    pub fn new(pipeline: Arc<ExportPipeline>, concurrency: usize) -> Self {
        Self { pipeline, concurrency: concurrency.max(1) }
    }

    /// Processes messages until the queue closes, then waits for in-flight runs.
    pub async fn run(&self, queue: &mut dyn ExportQueue) -> WorkerStats {
        self.run_until(queue, std::future::pending()).await
    }

    /// Like [`Worker::run`], but stops taking messages once `shutdown` resolves.
    ///
    /// Runs still in flight at shutdown are abandoned; the returned stats
    /// cover everything that finished before that.
    pub async fn run_until<F>(&self, queue: &mut dyn ExportQueue, shutdown: F) -> WorkerStats
    where
        F: Future<Output = ()>,
    {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<RunReport> = JoinSet::new();
        let mut stats = WorkerStats::default();
        let mut shutdown = pin!(shutdown);
        let mut interrupted = false;

        info!("Worker started ({} concurrent)", self.concurrency);

        loop {
            let permit = tokio::select! {
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = &mut shutdown => {
                    interrupted = true;
                    break;
                }
            };

            let body = tokio::select! {
                body = queue.next() => match body {
                    Some(body) => body,
                    None => break,
                },
                _ = &mut shutdown => {
                    interrupted = true;
                    break;
                }
            };
            stats.received += 1;

            // Reap finished runs so reports don't pile up
            while let Some(done) = tasks.try_join_next() {
                Self::collect(&mut stats, done);
            }

            let request = match ExportRequest::from_json(&body) {
                Ok(request) => request,
                Err(e) => {
                    warn!("Rejecting malformed message ({}): {}", e, String::from_utf8_lossy(&body));
                    stats.rejected += 1;
                    continue;
                }
            };

            let pipeline = self.pipeline.clone();
            tasks.spawn(async move {
                let report = pipeline.run(&request).await;
                drop(permit);
                report
            });
        }

        if interrupted {
            while let Some(done) = tasks.try_join_next() {
                Self::collect(&mut stats, done);
            }
            warn!("Shutdown requested, abandoning {} in-flight exports", tasks.len());
            tasks.shutdown().await;
        } else {
            while let Some(done) = tasks.join_next().await {
                Self::collect(&mut stats, done);
            }
        }

        info!(
            "Worker finished: {} received, {} completed, {} failed, {} rejected",
            stats.received, stats.completed, stats.failed, stats.rejected
        );

        stats
    }

    fn collect(stats: &mut WorkerStats, done: Result<RunReport, tokio::task::JoinError>) {
        match done {
            Ok(report) => stats.record(&report),
            Err(e) => {
                error!("Export task panicked: {}", e);
                stats.failed += 1;
            }
        }
    }
}
