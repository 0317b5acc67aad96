//! Stoppable command producer threads

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

/// Cooperative stop signal handed to a producer body
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A named thread that only builds and enqueues commands
#[derive(Debug)]
pub struct Producer {
    name: String,
    stop: StopFlag,
    handle: Option<JoinHandle<()>>,
}

impl Producer {
    /// Start `body` on its own thread; it should return once the flag is raised
    pub fn spawn<F>(name: &str, body: F) -> std::io::Result<Self>
    where
        F: FnOnce(StopFlag) + Send + 'static,
    {
        let stop = StopFlag::default();
        let flag = stop.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(flag))?;
        debug!(producer = %name, "started");
        Ok(Self {
            name: name.to_string(),
            stop,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signal the thread and wait for it. Returns false if it panicked.
    pub fn stop(mut self) -> bool {
        self.shutdown()
    }

    fn shutdown(&mut self) -> bool {
        self.stop.raise();
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(()) => {
                    debug!(producer = %self.name, "joined");
                    true
                }
                Err(_) => {
                    warn!(producer = %self.name, "producer thread panicked");
                    false
                }
            },
            None => true,
        }
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
