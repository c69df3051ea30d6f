//! Supervised worker pool that enriches posted messages.
//!
//! Workers pull jobs off a shared bounded queue, resolve the first link in
//! the message body and persist whatever metadata comes back. Each worker
//! runs under a guardian task that replaces it if it panics; the job being
//! processed at the time is lost, so delivery is at most once.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle as TaskHandle;
use tracing::{debug, error, info, warn};

use crate::config::EnrichmentConfig;
use crate::core_store::{ChatStore, MessageId, MessageMeta};

use super::extract;
use super::fetch::Fetcher;
use super::page;
use super::sniff;

/// Unit of work queued when a message is posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentJob {
    pub message_id: MessageId,
    pub body: String,
}

/// Emitted after metadata has been persisted for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentNotice {
    pub message_id: MessageId,
}

type SharedJobs = Arc<Mutex<mpsc::Receiver<EnrichmentJob>>>;

/// Handle over the running pool. Dropping every job sender closes the
/// queue and lets the workers drain and exit on their own.
pub struct EnrichmentRunner {
    guardians: Vec<TaskHandle<()>>,
}

impl EnrichmentRunner {
    /// Starts the pool and hands back the job entrance and notice exit.
    pub fn start(
        store: ChatStore,
        fetcher: Arc<dyn Fetcher>,
        config: &EnrichmentConfig,
    ) -> (
        Self,
        mpsc::Sender<EnrichmentJob>,
        mpsc::Receiver<EnrichmentNotice>,
    ) {
        let workers = config.workers.max(1);
        let capacity = config.queue_capacity.max(1);

        let (job_tx, job_rx) = mpsc::channel(capacity);
        let (notice_tx, notice_rx) = mpsc::channel(capacity);
        let jobs: SharedJobs = Arc::new(Mutex::new(job_rx));

        let guardians = (0..workers)
            .map(|slot| {
                spawn_guardian(
                    slot,
                    store.clone(),
                    Arc::clone(&fetcher),
                    Arc::clone(&jobs),
                    notice_tx.clone(),
                )
            })
            .collect();

        info!(workers, queue_capacity = capacity, "enrichment pool started");
        (Self { guardians }, job_tx, notice_rx)
    }

    /// A runner with no workers, for deployments with enrichment turned off.
    pub fn disabled() -> Self {
        Self {
            guardians: Vec::new(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.guardians.len()
    }

    /// Waits for every worker to finish. Drop all job senders first or
    /// this never returns.
    pub async fn join(self) {
        for guardian in self.guardians {
            let _ = guardian.await;
        }
    }

    pub fn abort(&self) {
        for guardian in &self.guardians {
            guardian.abort();
        }
    }
}

/// Keeps one worker slot occupied, replacing the worker after a panic.
fn spawn_guardian(
    slot: usize,
    store: ChatStore,
    fetcher: Arc<dyn Fetcher>,
    jobs: SharedJobs,
    notices: mpsc::Sender<EnrichmentNotice>,
) -> TaskHandle<()> {
    tokio::spawn(async move {
        loop {
            let worker = tokio::spawn(worker_loop(
                slot,
                store.clone(),
                Arc::clone(&fetcher),
                Arc::clone(&jobs),
                notices.clone(),
            ));
            match worker.await {
                // Clean exit: the job queue closed
                Ok(()) => break,
                Err(err) if err.is_panic() => {
                    error!(slot, "enrichment worker panicked, spawning replacement");
                    counter!("enrich.workers.restarted").increment(1);
                }
                // Aborted during shutdown
                Err(_) => break,
            }
        }
    })
}

async fn worker_loop(
    slot: usize,
    store: ChatStore,
    fetcher: Arc<dyn Fetcher>,
    jobs: SharedJobs,
    notices: mpsc::Sender<EnrichmentNotice>,
) {
    debug!(slot, "enrichment worker running");
    loop {
        // The lock is held only while waiting for a job, never across
        // the processing of one.
        let job = jobs.lock().await.recv().await;
        match job {
            Some(job) => handle_job(&store, fetcher.as_ref(), &notices, job).await,
            None => {
                debug!(slot, "job queue closed, enrichment worker exiting");
                break;
            }
        }
    }
}

async fn handle_job(
    store: &ChatStore,
    fetcher: &dyn Fetcher,
    notices: &mpsc::Sender<EnrichmentNotice>,
    job: EnrichmentJob,
) {
    let Some(meta) = build_meta(fetcher, &job.body).await else {
        counter!("enrich.jobs.completed", "outcome" => "no_op").increment(1);
        return;
    };

    if let Err(err) = store.set_message_meta(&job.message_id, &meta) {
        warn!(message_id = %job.message_id, error = %err, "failed to persist enrichment");
        counter!("enrich.jobs.completed", "outcome" => "store_error").increment(1);
        return;
    }

    debug!(message_id = %job.message_id, kind = ?meta.kind, "message enriched");
    counter!("enrich.jobs.completed", "outcome" => "enriched").increment(1);

    let notice = EnrichmentNotice {
        message_id: job.message_id,
    };
    if notices.send(notice).await.is_err() {
        debug!("notice receiver dropped, enrichment continues unannounced");
    }
}

/// Runs a message body through the enrichment pipeline.
///
/// Returns `None` when the body has no link, the fetch fails, or the
/// fetched page lacks a usable title. Every failure is a logged no-op.
pub(crate) async fn build_meta(fetcher: &dyn Fetcher, body: &str) -> Option<MessageMeta> {
    let link = extract::first_link(body)?;
    if link.len() > extract::MAX_URL_LEN {
        debug!(url_len = link.len(), "link too long to store as meta");
        return None;
    }

    let started = Instant::now();
    let fetched = fetcher.fetch(&link).await;
    histogram!("enrich.fetch.duration_ms").record(started.elapsed().as_secs_f64() * 1000.0);

    let bytes = match fetched {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(url = %link, error = %err, "enrichment fetch failed");
            counter!("enrich.fetches.failed").increment(1);
            return None;
        }
    };

    if let Some(format) = sniff::sniff_image(&bytes) {
        debug!(url = %link, format = ?format, "link resolved to an image");
        return Some(MessageMeta::image(link));
    }

    // Not a known image, so read the same bytes as an HTML document.
    let html = String::from_utf8_lossy(&bytes);
    let meta = page::extract_page_meta(&html);

    let Some(title) = meta.title else {
        debug!(url = %link, "page has no usable title");
        return None;
    };
    let preview = meta
        .image
        .filter(|candidate| extract::is_absolute_http_url(candidate));

    Some(MessageMeta::page(link, title, meta.description, preview))
}
