//! Write-behind queue for records produced by event listeners.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use witness_proto::{keys, DataWrapper};

use crate::error::Error;
use crate::handler::RecordHandler;

/// Records waiting to be written, in submission order.
#[derive(Debug, Default)]
pub struct EntryQueue {
    pending: Mutex<Vec<DataWrapper>>,
}

impl EntryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a record for `event`, stamping its event name and creation time.
    pub fn submit(&self, event: &str, mut wrapper: DataWrapper) {
        wrapper.set(&keys::event_name(), event);
        if !wrapper.contains(&keys::created()) {
            wrapper.set(&keys::created(), Utc::now());
        }
        self.pending.lock().push(wrapper);
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Hand everything queued so far to `handler` as one batch.
    ///
    /// Returns the number of records taken from the queue. Taken records are
    /// not requeued when the write fails.
    pub async fn flush(&self, handler: &dyn RecordHandler) -> Result<usize, Error> {
        let batch = std::mem::take(&mut *self.pending.lock());
        if batch.is_empty() {
            return Ok(0);
        }
        let taken = batch.len();
        handler.write(batch).await?;
        Ok(taken)
    }
}

/// Handle for the background flush task.
pub struct FlushTask {
    handle: JoinHandle<()>,
    stop_flag: Arc<AtomicBool>,
}

impl FlushTask {
    /// Flush `queue` into `handler` every `interval`.
    pub fn start(
        queue: Arc<EntryQueue>,
        handler: Arc<dyn RecordHandler>,
        interval: Duration,
    ) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&stop_flag);

        let handle = tokio::spawn(async move {
            info!(interval_ms = interval.as_millis() as u64, "Record flush task started");

            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let stopping = stop.load(Ordering::SeqCst);

                match queue.flush(handler.as_ref()).await {
                    Ok(0) => {}
                    Ok(written) => debug!(records = written, "Flushed queued records"),
                    Err(e) => warn!(error = %e, "Failed to flush queued records"),
                }

                if stopping {
                    info!("Record flush task stopping");
                    break;
                }
            }
        });

        Self { handle, stop_flag }
    }

    /// Signal the task to stop after one last flush.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Stop and wait for the final flush.
    pub async fn join(self) {
        self.stop();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Record flush task panicked");
        }
    }
}
