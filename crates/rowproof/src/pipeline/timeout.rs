//! Caller-side deadlines for blocking collaborator calls.
//!
//! The call runs on a helper thread and the caller waits on a channel with
//! `recv_timeout`. A call that overruns is abandoned, not cancelled: its
//! thread is leaked and keeps running until the collaborator returns, which
//! may be never. Its result is dropped.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CallError {
    TimedOut,
    /// The helper thread panicked or could not be spawned.
    Aborted(String),
}

pub(crate) fn run_with_timeout<T, F>(name: &str, timeout: Duration, f: F) -> Result<T, CallError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = bounded(1);
    thread::Builder::new()
        .name(format!("rowproof-{}", name))
        .spawn(move || {
            // The receiver is gone if the caller already timed out.
            let _ = tx.send(f());
        })
        .map_err(|e| CallError::Aborted(format!("failed to spawn {} thread: {}", name, e)))?;

    match rx.recv_timeout(timeout) {
        Ok(value) => Ok(value),
        Err(RecvTimeoutError::Timeout) => Err(CallError::TimedOut),
        Err(RecvTimeoutError::Disconnected) => {
            Err(CallError::Aborted(format!("{} call panicked", name)))
        }
    }
}
