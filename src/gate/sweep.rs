//! Cancellable periodic background task.

use flume::{RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Runs a callback on its own thread once per `period` until stopped.
///
/// Dropping the handle stops the task and joins its thread.
#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn `tick` on a thread named `name`. The first call happens one
    /// `period` after spawning.
    pub fn spawn<F>(name: impl Into<String>, period: Duration, mut tick: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let name = name.into();
        let (stop_tx, stop_rx) = flume::bounded::<()>(1);
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            let mut next = Instant::now() + period;
            loop {
                match stop_rx.recv_deadline(next) {
                    Err(RecvTimeoutError::Timeout) => {
                        tick();
                        next += period;
                        // Skip missed ticks rather than firing them back to back.
                        let now = Instant::now();
                        if next <= now {
                            next = now + period;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })?;
        debug!(task = %name, ?period, "periodic task started");
        Ok(Self {
            name,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the task and wait for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(task = %self.name, "periodic task panicked");
            } else {
                debug!(task = %self.name, "periodic task stopped");
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn ticks_repeatedly_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let task = PeriodicTask::spawn("test-ticker", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("spawn");
        let deadline = Instant::now() + Duration::from_secs(5);
        while ticks.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(ticks.load(Ordering::SeqCst) >= 3);
        assert!(task.is_running());
        task.stop();
        let after_stop = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn stop_does_not_wait_for_the_period() {
        let task = PeriodicTask::spawn("test-slow", Duration::from_secs(3600), || {}).expect("spawn");
        let started = Instant::now();
        task.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn drop_stops_the_thread() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        {
            let _task = PeriodicTask::spawn("test-drop", Duration::from_millis(5), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("spawn");
        }
        let after_drop = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after_drop);
    }
}
