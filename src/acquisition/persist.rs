// PersistWorker - saves force-stopped sessions off the acquisition thread
//
// Sessions are finalized in submission order on a thread named `persist`.
// Dropping the worker closes the queue and waits until every queued session
// has been handled.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::context::AcquisitionContext;
use crate::recording::FinishedSession;

enum PersistJob {
    Session(FinishedSession),
    Flush(mpsc::Sender<()>),
}

pub struct PersistWorker {
    jobs: Option<mpsc::Sender<PersistJob>>,
    thread: Option<JoinHandle<()>>,
}

impl PersistWorker {
    pub fn spawn(context: Arc<AcquisitionContext>) -> std::io::Result<Self> {
        let (jobs_tx, jobs_rx) = mpsc::channel::<PersistJob>();
        let thread = thread::Builder::new()
            .name("persist".to_string())
            .spawn(move || {
                for job in jobs_rx {
                    match job {
                        PersistJob::Session(finished) => {
                            context.finalize(finished);
                        }
                        PersistJob::Flush(done) => {
                            // Waiter may have given up.
                            let _ = done.send(());
                        }
                    }
                }
                tracing::debug!("[PersistWorker] Queue closed, exiting");
            })?;

        Ok(Self {
            jobs: Some(jobs_tx),
            thread: Some(thread),
        })
    }

    /// Queue a finished session without waiting for the store
    ///
    /// Hands the session back when the worker thread is gone.
    pub fn submit(&self, finished: FinishedSession) -> Result<(), FinishedSession> {
        let Some(jobs) = &self.jobs else {
            return Err(finished);
        };
        match jobs.send(PersistJob::Session(finished)) {
            Ok(()) => Ok(()),
            Err(mpsc::SendError(PersistJob::Session(finished))) => Err(finished),
            Err(mpsc::SendError(PersistJob::Flush(_))) => Ok(()),
        }
    }

    /// Block until every session submitted so far has been finalized
    ///
    /// Returns `false` if the worker thread is gone.
    pub fn flush(&self) -> bool {
        let Some(jobs) = &self.jobs else {
            return false;
        };
        let (done_tx, done_rx) = mpsc::channel();
        jobs.send(PersistJob::Flush(done_tx)).is_ok() && done_rx.recv().is_ok()
    }
}

impl Drop for PersistWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("[PersistWorker] Persist thread panicked");
            }
        }
    }
}
