//! Delayed callbacks with cancellation handles
//!
//! A [`Scheduled`] task waits on its own thread until either the delay
//! elapses (the task runs) or the handle cancels it (the task is dropped
//! without running). Dropping the handle cancels and joins, so a task can
//! never outlive whatever owns its handle.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct Scheduled {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<bool>>,
}

impl Scheduled {
    /// Run `task` once `delay` has passed, unless cancelled first
    pub fn after<F>(delay: Duration, task: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let handle = thread::spawn(move || match cancelled.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => {
                task();
                true
            }
            // explicit cancel, or the handle went away
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        });

        Self {
            cancel: Some(cancel),
            handle: Some(handle),
        }
    }

    /// Cancel the task; returns true if it had already run
    pub fn cancel(mut self) -> bool {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        self.join()
    }

    /// Block until the delay elapses and the task has run
    pub fn wait(mut self) -> bool {
        self.join()
    }

    fn join(&mut self) -> bool {
        self.handle
            .take()
            .map(|handle| handle.join().unwrap_or(false))
            .unwrap_or(false)
    }
}

impl Drop for Scheduled {
    fn drop(&mut self) {
        // disconnecting the channel cancels a task that hasn't fired yet
        self.cancel.take();
        self.join();
    }
}
